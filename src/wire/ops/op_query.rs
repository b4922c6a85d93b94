use bson::Document;

use crate::wire::error::WireParserError;
use crate::wire::flags::OpQueryFlags;
use crate::wire::utils::{parse_bson_document, parse_cstring, parse_i32, parse_u32};

/// @see https://docs.mongodb.com/manual/reference/mongodb-wire-protocol/#op-query
#[derive(Debug)]
pub struct OpQuery {
    // bit vector of query options
    pub flags: OpQueryFlags,

    // "dbname.collectionname"
    pub full_collection_name: String,

    // number of documents to skip
    pub number_to_skip: i32,

    // number of documents to return in the first OP_REPLY batch
    pub number_to_return: i32,

    // query object
    pub query: Document,

    // Optional. Selector indicating the fields to return.
    pub return_fields_selector: Option<Document>,
}

pub fn parse_op_query(buffer: &[u8]) -> Result<OpQuery, WireParserError> {
    let (flags, next_buffer) = parse_u32(buffer)?;
    let (full_collection_name, next_buffer) = parse_cstring(next_buffer)?;
    let (number_to_skip, next_buffer) = parse_i32(next_buffer)?;
    let (number_to_return, next_buffer) = parse_i32(next_buffer)?;
    let (query, next_buffer) = parse_bson_document(next_buffer)?;
    let return_fields_selector = if next_buffer.is_empty() {
        None
    } else {
        Some(parse_bson_document(next_buffer)?.0)
    };
    Ok(OpQuery {
        flags: OpQueryFlags(flags),
        full_collection_name,
        number_to_skip,
        number_to_return,
        query,
        return_fields_selector,
    })
}
