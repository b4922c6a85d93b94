use crate::wire::error::WireParserError;

/// @see https://docs.mongodb.com/manual/reference/mongodb-wire-protocol/#request-opcodes
pub const OP_REPLY_CODE: u32 = 1;
pub const OP_UPDATE_CODE: u32 = 2001;
pub const OP_INSERT_CODE: u32 = 2002;
pub const OP_QUERY_CODE: u32 = 2004;
pub const OP_GET_MORE_CODE: u32 = 2005;
pub const OP_DELETE_CODE: u32 = 2006;
pub const OP_KILL_CURSORS_CODE: u32 = 2007;
pub const OP_COMPRESSED_CODE: u32 = 2012;
pub const OP_MSG_CODE: u32 = 2013;

#[derive(Clone, Copy, Debug, PartialEq)]
#[repr(u32)]
pub enum OpCode {
    OpReply = OP_REPLY_CODE,
    OpUpdate = OP_UPDATE_CODE,
    OpInsert = OP_INSERT_CODE,
    //    RESERVED = 2003
    OpQuery = OP_QUERY_CODE,
    OpGetMore = OP_GET_MORE_CODE,
    OpDelete = OP_DELETE_CODE,
    OpKillCursors = OP_KILL_CURSORS_CODE,
    OpCompressed = OP_COMPRESSED_CODE,
    OpMsg = OP_MSG_CODE,
}

pub fn pick_op_code(op: u32) -> Result<OpCode, WireParserError> {
    match op {
        OP_REPLY_CODE => Ok(OpCode::OpReply),
        OP_UPDATE_CODE => Ok(OpCode::OpUpdate),
        OP_INSERT_CODE => Ok(OpCode::OpInsert),
        OP_QUERY_CODE => Ok(OpCode::OpQuery),
        OP_GET_MORE_CODE => Ok(OpCode::OpGetMore),
        OP_DELETE_CODE => Ok(OpCode::OpDelete),
        OP_KILL_CURSORS_CODE => Ok(OpCode::OpKillCursors),
        OP_COMPRESSED_CODE => Ok(OpCode::OpCompressed),
        OP_MSG_CODE => Ok(OpCode::OpMsg),
        _ => Err(WireParserError::UnknownOpCode(op)),
    }
}

#[cfg(test)]
mod opcodes_tests {
    use crate::wire::error::WireParserError;
    use crate::wire::opcodes::{pick_op_code, OpCode};

    #[test]
    fn test_pick_op_code() {
        assert_eq!(pick_op_code(2004).unwrap(), OpCode::OpQuery);
        assert_eq!(pick_op_code(2013).unwrap(), OpCode::OpMsg);
        assert_eq!(pick_op_code(2012).unwrap(), OpCode::OpCompressed);
    }

    #[test]
    fn test_pick_op_code_unknown() {
        match pick_op_code(2010) {
            Err(WireParserError::UnknownOpCode(2010)) => (),
            other => panic!("expected UnknownOpCode, got {:?}", other),
        }
    }
}
