use bson::Document;

use crate::wire::error::WireParserError;
use crate::wire::flags::OpDeleteFlags;
use crate::wire::utils::{parse_bson_document, parse_cstring, parse_u32};

/// @see https://docs.mongodb.com/manual/reference/mongodb-wire-protocol/#op-delete
#[derive(Debug)]
pub struct OpDelete {
    // 0 - reserved for future use
    pub zero: u32,

    // "dbname.collectionname"
    pub full_collection_name: String,

    // bit vector
    pub flags: OpDeleteFlags,

    // query object
    pub selector: Document,
}

pub fn parse_op_delete(buffer: &[u8]) -> Result<OpDelete, WireParserError> {
    let (zero, next_buffer) = parse_u32(buffer)?;
    let (full_collection_name, next_buffer) = parse_cstring(next_buffer)?;
    let (flags, next_buffer) = parse_u32(next_buffer)?;
    let (selector, _next_buffer) = parse_bson_document(next_buffer)?;
    Ok(OpDelete {
        zero,
        full_collection_name,
        flags: OpDeleteFlags(flags),
        selector,
    })
}
