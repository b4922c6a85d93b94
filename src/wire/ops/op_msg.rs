use std::mem::size_of;

use bson::Document;

use crate::wire::error::WireParserError;
use crate::wire::flags::OpMsgFlags;
use crate::wire::utils::{parse_bson_document, parse_cstring, parse_i32, parse_u32};

pub const SECTION_KIND_BODY: u8 = 0;
pub const SECTION_KIND_DOCUMENT_SEQUENCE: u8 = 1;

/// @see https://docs.mongodb.com/manual/reference/mongodb-wire-protocol/#kind-1-document-sequence
#[derive(Debug)]
pub struct DocumentSequence {
    pub size: i32,

    // names the field the sequence members belong to, e.g. "documents"
    pub identifier: String,

    pub documents: Vec<Document>,
}

/// @see https://docs.mongodb.com/manual/reference/mongodb-wire-protocol/#wire-msg-sections
#[derive(Debug)]
pub enum Section {
    Body(Document),
    Sequence(DocumentSequence),
}

/// @see https://docs.mongodb.com/manual/reference/mongodb-wire-protocol/#op-msg
#[derive(Debug)]
pub struct OpMsg {
    // message flags
    pub flag_bits: OpMsgFlags,

    // data sections
    pub sections: Vec<Section>,

    // optional CRC-32C checksum
    pub checksum: Option<u32>,
}

pub fn parse_op_msg(buffer: &[u8]) -> Result<OpMsg, WireParserError> {
    let (flag_bits, next_buffer) = parse_u32(buffer)?;
    let flag_bits = OpMsgFlags(flag_bits);

    let mut body = next_buffer;
    let mut checksum = None;
    if flag_bits.checksum_present() {
        if body.len() < size_of::<u32>() {
            return Err(WireParserError::NotEnoughBufferSize);
        }
        let (value, _) = parse_u32(&body[body.len() - size_of::<u32>()..])?;
        checksum = Some(value);
        body = &body[..body.len() - size_of::<u32>()];
    }

    let mut sections = Vec::new();
    while !body.is_empty() {
        let kind = body[0];
        body = &body[1..];
        match kind {
            SECTION_KIND_BODY => {
                let (document, rest) = parse_bson_document(body)?;
                sections.push(Section::Body(document));
                body = rest;
            }
            SECTION_KIND_DOCUMENT_SEQUENCE => {
                let (sequence, rest) = parse_document_sequence(body)?;
                sections.push(Section::Sequence(sequence));
                body = rest;
            }
            _ => return Err(WireParserError::UnknownSectionKind(kind)),
        }
    }
    if sections.is_empty() {
        return Err(WireParserError::NotEnoughBufferSize);
    }

    Ok(OpMsg {
        flag_bits,
        sections,
        checksum,
    })
}

/// The declared section size covers its own 4-byte prefix, the identifier
/// with its NUL, and the sequence documents; whatever the identifier leaves
/// over is parsed as back-to-back documents.
fn parse_document_sequence(buffer: &[u8]) -> Result<(DocumentSequence, &[u8]), WireParserError> {
    let (size, _) = parse_i32(buffer)?;
    if (size as usize) < size_of::<i32>() || size as usize > buffer.len() {
        return Err(WireParserError::NotEnoughBufferSize);
    }
    let section = &buffer[size_of::<i32>()..size as usize];
    let remaining = &buffer[size as usize..];

    let (identifier, mut documents_buffer) = parse_cstring(section)?;
    let mut documents = Vec::new();
    while !documents_buffer.is_empty() {
        let (document, rest) = parse_bson_document(documents_buffer)?;
        documents.push(document);
        documents_buffer = rest;
    }

    Ok((
        DocumentSequence {
            size,
            identifier,
            documents,
        },
        remaining,
    ))
}

#[cfg(test)]
mod op_msg_tests {
    use bson::doc;

    use crate::wire::error::WireParserError;
    use crate::wire::flags::OP_MSG_FLAG_CHECKSUM_PRESENT;
    use crate::wire::ops::op_msg::{parse_op_msg, Section, SECTION_KIND_DOCUMENT_SEQUENCE};
    use crate::utils::u32_to_u8_array;

    fn document_bytes(document: &bson::Document) -> Vec<u8> {
        let mut bytes = Vec::new();
        document.to_writer(&mut bytes).unwrap();
        bytes
    }

    fn sequence_section(identifier: &str, documents: &[bson::Document]) -> Vec<u8> {
        let mut payload = Vec::new();
        payload.extend_from_slice(identifier.as_bytes());
        payload.push(0);
        for document in documents {
            payload.extend_from_slice(&document_bytes(document));
        }
        let mut section = vec![SECTION_KIND_DOCUMENT_SEQUENCE];
        section.extend_from_slice(&u32_to_u8_array(payload.len() as u32 + 4));
        section.extend_from_slice(&payload);
        section
    }

    #[test]
    fn test_parse_op_msg_single_body() {
        let body_document = doc! { "ping": 1, "$db": "admin" };
        let mut buffer = vec![0, 0, 0, 0, 0];
        buffer.extend_from_slice(&document_bytes(&body_document));

        let op_msg = parse_op_msg(&buffer).unwrap();
        assert_eq!(op_msg.flag_bits.0, 0);
        assert_eq!(op_msg.sections.len(), 1);
        assert!(op_msg.checksum.is_none());
        match &op_msg.sections[0] {
            Section::Body(document) => assert_eq!(document, &body_document),
            other => panic!("expected a body section, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_op_msg_document_sequence() {
        let body_document = doc! { "insert": "fruits", "$db": "test" };
        let first = doc! { "_id": 1 };
        let second = doc! { "_id": 2 };

        let mut buffer = vec![0, 0, 0, 0, 0];
        buffer.extend_from_slice(&document_bytes(&body_document));
        buffer.extend_from_slice(&sequence_section("documents", &[first.clone(), second.clone()]));

        let op_msg = parse_op_msg(&buffer).unwrap();
        assert_eq!(op_msg.sections.len(), 2);
        match &op_msg.sections[1] {
            Section::Sequence(sequence) => {
                assert_eq!(sequence.identifier, "documents");
                assert_eq!(sequence.documents, vec![first, second]);
            }
            other => panic!("expected a document sequence, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_op_msg_sequence_size_overruns_buffer() {
        let mut buffer = vec![0, 0, 0, 0, 0];
        buffer.extend_from_slice(&document_bytes(&doc! { "ping": 1 }));
        let mut section = sequence_section("documents", &[doc! { "_id": 1 }]);
        // declare four bytes more than the section actually carries
        let declared = section[1] as u32 + 4;
        section[1..5].copy_from_slice(&u32_to_u8_array(declared));
        buffer.extend_from_slice(&section);

        match parse_op_msg(&buffer) {
            Err(WireParserError::NotEnoughBufferSize) => (),
            other => panic!("expected NotEnoughBufferSize, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_op_msg_unknown_section_kind() {
        let mut buffer = vec![0, 0, 0, 0, 9];
        buffer.extend_from_slice(&document_bytes(&doc! { "ping": 1 }));

        match parse_op_msg(&buffer) {
            Err(WireParserError::UnknownSectionKind(9)) => (),
            other => panic!("expected UnknownSectionKind, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_op_msg_retains_checksum() {
        let mut buffer = Vec::new();
        buffer.extend_from_slice(&u32_to_u8_array(OP_MSG_FLAG_CHECKSUM_PRESENT));
        buffer.push(0);
        buffer.extend_from_slice(&document_bytes(&doc! { "ping": 1 }));
        buffer.extend_from_slice(&u32_to_u8_array(0xdead_beef));

        let op_msg = parse_op_msg(&buffer).unwrap();
        assert_eq!(op_msg.checksum, Some(0xdead_beef));
        assert_eq!(op_msg.sections.len(), 1);
    }
}
