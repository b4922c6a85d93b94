use bson::Document;

use crate::wire::error::WireParserError;
use crate::wire::flags::OpInsertFlags;
use crate::wire::utils::{parse_bson_document, parse_cstring, parse_u32};

/// @see https://docs.mongodb.com/manual/reference/mongodb-wire-protocol/#op-insert
#[derive(Debug)]
pub struct OpInsert {
    // bit vector
    pub flags: OpInsertFlags,

    // "dbname.collectionname"
    pub full_collection_name: String,

    // one or more documents to insert into the collection
    pub documents: Vec<Document>,
}

pub fn parse_op_insert(buffer: &[u8]) -> Result<OpInsert, WireParserError> {
    let (flags, next_buffer) = parse_u32(buffer)?;
    let (full_collection_name, mut next_buffer) = parse_cstring(next_buffer)?;
    let mut documents = Vec::new();
    while !next_buffer.is_empty() {
        let (document, rest) = parse_bson_document(next_buffer)?;
        documents.push(document);
        next_buffer = rest;
    }
    if documents.is_empty() {
        return Err(WireParserError::NotEnoughBufferSize);
    }
    Ok(OpInsert {
        flags: OpInsertFlags(flags),
        full_collection_name,
        documents,
    })
}
