use std::fmt;

use crate::utils::get_bit_u32;

/// @see https://docs.mongodb.com/manual/reference/mongodb-wire-protocol/#op-query
pub const OP_QUERY_FLAG_TAILABLE_CURSOR: u32 = 1 << 1;
pub const OP_QUERY_FLAG_SECONDARY_OK: u32 = 1 << 2;
pub const OP_QUERY_FLAG_OPLOG_REPLAY: u32 = 1 << 3;
pub const OP_QUERY_FLAG_NO_CURSOR_TIMEOUT: u32 = 1 << 4;
pub const OP_QUERY_FLAG_AWAIT_DATA: u32 = 1 << 5;
pub const OP_QUERY_FLAG_EXHAUST: u32 = 1 << 6;
pub const OP_QUERY_FLAG_PARTIAL: u32 = 1 << 7;

/// @see https://docs.mongodb.com/manual/reference/mongodb-wire-protocol/#op-insert
pub const OP_INSERT_FLAG_CONTINUE_ON_ERROR: u32 = 1 << 0;

/// @see https://docs.mongodb.com/manual/reference/mongodb-wire-protocol/#op-update
pub const OP_UPDATE_FLAG_UPSERT: u32 = 1 << 0;
pub const OP_UPDATE_FLAG_MULTI_UPDATE: u32 = 1 << 1;

/// @see https://docs.mongodb.com/manual/reference/mongodb-wire-protocol/#op-delete
pub const OP_DELETE_FLAG_SINGLE_REMOVE: u32 = 1 << 0;

/// @see https://docs.mongodb.com/manual/reference/mongodb-wire-protocol/#op-msg
pub const OP_MSG_FLAG_CHECKSUM_PRESENT: u32 = 1 << 0;
pub const OP_MSG_FLAG_MORE_TO_COME: u32 = 1 << 1;
pub const OP_MSG_FLAG_EXHAUST_ALLOWED: u32 = 1 << 16;

/// Appends the symbolic names of the set bits in ascending bit order,
/// joined by `|`; a zero bit vector renders as the literal `0`.
fn write_flag_names(f: &mut fmt::Formatter, bits: u32, names: &[(u32, &str)]) -> fmt::Result {
    if bits == 0 {
        return f.write_str("0");
    }
    let mut begun = false;
    for (flag, name) in names {
        if bits & flag != 0 {
            if begun {
                f.write_str("|")?;
            }
            f.write_str(name)?;
            begun = true;
        }
    }
    Ok(())
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OpQueryFlags(pub u32);

impl OpQueryFlags {
    pub fn tailable_cursor(self) -> bool {
        get_bit_u32(self.0, 1)
    }

    pub fn secondary_ok(self) -> bool {
        get_bit_u32(self.0, 2)
    }

    pub fn oplog_replay(self) -> bool {
        get_bit_u32(self.0, 3)
    }

    pub fn no_cursor_timeout(self) -> bool {
        get_bit_u32(self.0, 4)
    }

    pub fn await_data(self) -> bool {
        get_bit_u32(self.0, 5)
    }

    pub fn exhaust(self) -> bool {
        get_bit_u32(self.0, 6)
    }

    pub fn partial(self) -> bool {
        get_bit_u32(self.0, 7)
    }
}

impl fmt::Display for OpQueryFlags {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write_flag_names(
            f,
            self.0,
            &[
                (OP_QUERY_FLAG_TAILABLE_CURSOR, "TAILABLE"),
                (OP_QUERY_FLAG_SECONDARY_OK, "SECONDARY_OK"),
                (OP_QUERY_FLAG_OPLOG_REPLAY, "OPLOG_REPLAY"),
                (OP_QUERY_FLAG_NO_CURSOR_TIMEOUT, "NO_TIMEOUT"),
                (OP_QUERY_FLAG_AWAIT_DATA, "AWAIT_DATA"),
                (OP_QUERY_FLAG_EXHAUST, "EXHAUST"),
                (OP_QUERY_FLAG_PARTIAL, "PARTIAL"),
            ],
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OpInsertFlags(pub u32);

impl OpInsertFlags {
    pub fn continue_on_error(self) -> bool {
        get_bit_u32(self.0, 0)
    }
}

impl fmt::Display for OpInsertFlags {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write_flag_names(
            f,
            self.0,
            &[(OP_INSERT_FLAG_CONTINUE_ON_ERROR, "CONTINUE_ON_ERROR")],
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OpUpdateFlags(pub u32);

impl OpUpdateFlags {
    pub fn upsert(self) -> bool {
        get_bit_u32(self.0, 0)
    }

    pub fn multi_update(self) -> bool {
        get_bit_u32(self.0, 1)
    }
}

impl fmt::Display for OpUpdateFlags {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write_flag_names(
            f,
            self.0,
            &[
                (OP_UPDATE_FLAG_UPSERT, "UPSERT"),
                (OP_UPDATE_FLAG_MULTI_UPDATE, "MULTI"),
            ],
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OpDeleteFlags(pub u32);

impl OpDeleteFlags {
    pub fn single_remove(self) -> bool {
        get_bit_u32(self.0, 0)
    }
}

impl fmt::Display for OpDeleteFlags {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write_flag_names(
            f,
            self.0,
            &[(OP_DELETE_FLAG_SINGLE_REMOVE, "SINGLE_REMOVE")],
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OpMsgFlags(pub u32);

impl OpMsgFlags {
    pub fn checksum_present(self) -> bool {
        get_bit_u32(self.0, 0)
    }

    pub fn more_to_come(self) -> bool {
        get_bit_u32(self.0, 1)
    }

    pub fn exhaust_allowed(self) -> bool {
        get_bit_u32(self.0, 16)
    }
}

impl fmt::Display for OpMsgFlags {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write_flag_names(
            f,
            self.0,
            &[
                (OP_MSG_FLAG_CHECKSUM_PRESENT, "CHECKSUM_PRESENT"),
                (OP_MSG_FLAG_MORE_TO_COME, "MORE_TO_COME"),
                (OP_MSG_FLAG_EXHAUST_ALLOWED, "EXHAUST_ALLOWED"),
            ],
        )
    }
}

#[cfg(test)]
mod flags_tests {
    use crate::wire::flags::*;

    #[test]
    fn test_query_flags_empty() {
        assert_eq!(OpQueryFlags(0).to_string(), "0");
    }

    #[test]
    fn test_query_flags_joined_in_bit_order() {
        let flags = OpQueryFlags(OP_QUERY_FLAG_AWAIT_DATA | OP_QUERY_FLAG_TAILABLE_CURSOR);
        assert_eq!(flags.to_string(), "TAILABLE|AWAIT_DATA");
        assert!(flags.tailable_cursor());
        assert!(flags.await_data());
        assert!(!flags.exhaust());
    }

    #[test]
    fn test_query_flags_all() {
        let flags = OpQueryFlags(0b1111_1110);
        assert_eq!(
            flags.to_string(),
            "TAILABLE|SECONDARY_OK|OPLOG_REPLAY|NO_TIMEOUT|AWAIT_DATA|EXHAUST|PARTIAL"
        );
    }

    #[test]
    fn test_insert_flags() {
        assert_eq!(OpInsertFlags(0).to_string(), "0");
        assert_eq!(
            OpInsertFlags(OP_INSERT_FLAG_CONTINUE_ON_ERROR).to_string(),
            "CONTINUE_ON_ERROR"
        );
    }

    #[test]
    fn test_update_flags() {
        assert_eq!(OpUpdateFlags(0).to_string(), "0");
        assert_eq!(
            OpUpdateFlags(OP_UPDATE_FLAG_UPSERT | OP_UPDATE_FLAG_MULTI_UPDATE).to_string(),
            "UPSERT|MULTI"
        );
        assert!(OpUpdateFlags(OP_UPDATE_FLAG_MULTI_UPDATE).multi_update());
    }

    #[test]
    fn test_delete_flags() {
        assert_eq!(
            OpDeleteFlags(OP_DELETE_FLAG_SINGLE_REMOVE).to_string(),
            "SINGLE_REMOVE"
        );
    }

    #[test]
    fn test_msg_flags() {
        let flags = OpMsgFlags(OP_MSG_FLAG_CHECKSUM_PRESENT | OP_MSG_FLAG_EXHAUST_ALLOWED);
        assert_eq!(flags.to_string(), "CHECKSUM_PRESENT|EXHAUST_ALLOWED");
        assert!(flags.checksum_present());
        assert!(!flags.more_to_come());
        assert!(flags.exhaust_allowed());
    }
}
