use crate::wire::error::WireParserError;
use crate::wire::utils::{parse_cstring, parse_i32, parse_i64, parse_u32};

/// @see https://docs.mongodb.com/manual/reference/mongodb-wire-protocol/#op-get-more
#[derive(Debug)]
pub struct OpGetMore {
    // 0 - reserved for future use
    pub zero: u32,

    // "dbname.collectionname"
    pub full_collection_name: String,

    // number of documents to return
    pub number_to_return: i32,

    // cursorID from the OP_REPLY
    pub cursor_id: i64,
}

pub fn parse_op_get_more(buffer: &[u8]) -> Result<OpGetMore, WireParserError> {
    let (zero, next_buffer) = parse_u32(buffer)?;
    let (full_collection_name, next_buffer) = parse_cstring(next_buffer)?;
    let (number_to_return, next_buffer) = parse_i32(next_buffer)?;
    let (cursor_id, _next_buffer) = parse_i64(next_buffer)?;
    Ok(OpGetMore {
        zero,
        full_collection_name,
        number_to_return,
        cursor_id,
    })
}
