use bson::Document;

use crate::wire::error::WireParserError;
use crate::wire::flags::OpUpdateFlags;
use crate::wire::utils::{parse_bson_document, parse_cstring, parse_u32};

/// @see https://docs.mongodb.com/manual/reference/mongodb-wire-protocol/#op-update
#[derive(Debug)]
pub struct OpUpdate {
    // 0 - reserved for future use
    pub zero: u32,

    // "dbname.collectionname"
    pub full_collection_name: String,

    // bit vector
    pub flags: OpUpdateFlags,

    // the query to select the document
    pub selector: Document,

    // specification of the update to perform
    pub update: Document,
}

pub fn parse_op_update(buffer: &[u8]) -> Result<OpUpdate, WireParserError> {
    let (zero, next_buffer) = parse_u32(buffer)?;
    let (full_collection_name, next_buffer) = parse_cstring(next_buffer)?;
    let (flags, next_buffer) = parse_u32(next_buffer)?;
    let (selector, next_buffer) = parse_bson_document(next_buffer)?;
    let (update, _next_buffer) = parse_bson_document(next_buffer)?;
    Ok(OpUpdate {
        zero,
        full_collection_name,
        flags: OpUpdateFlags(flags),
        selector,
        update,
    })
}
