use crate::wire::error::WireParserError;
use crate::wire::utils::{parse_i32, parse_i64, parse_u32};

/// @see https://docs.mongodb.com/manual/reference/mongodb-wire-protocol/#op-kill-cursors
#[derive(Debug)]
pub struct OpKillCursors {
    // 0 - reserved for future use
    pub zero: u32,

    // number of cursorIDs in message
    pub number_of_cursor_ids: i32,

    // sequence of cursorIDs to close
    pub cursor_ids: Vec<i64>,
}

pub fn parse_op_kill_cursors(buffer: &[u8]) -> Result<OpKillCursors, WireParserError> {
    let (zero, next_buffer) = parse_u32(buffer)?;
    let (number_of_cursor_ids, mut next_buffer) = parse_i32(next_buffer)?;
    if number_of_cursor_ids < 0 {
        return Err(WireParserError::InputBufferError);
    }
    let mut cursor_ids = Vec::with_capacity(number_of_cursor_ids as usize);
    for _ in 0..number_of_cursor_ids {
        let (cursor_id, rest) = parse_i64(next_buffer)?;
        cursor_ids.push(cursor_id);
        next_buffer = rest;
    }
    Ok(OpKillCursors {
        zero,
        number_of_cursor_ids,
        cursor_ids,
    })
}
