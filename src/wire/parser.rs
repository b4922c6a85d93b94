use std::mem::size_of;

use crate::declarations::errors::MockResult;
use crate::wire::error::WireParserError;
use crate::wire::flags::OpMsgFlags;
use crate::wire::msg_header::{parse_msg_header, MSG_HEADER_SIZE};
use crate::wire::opcodes::OpCode;
use crate::wire::request::Request;
use crate::wire::utils::parse_u32;

/// Parses one whole wire message, header included. The buffer must hold
/// exactly the bytes the header declares.
pub fn parse_incoming_bytes(buffer: &[u8]) -> MockResult<Request> {
    let (header, body) = parse_msg_header(buffer)?;
    if header.message_length as usize != buffer.len() {
        return Err(WireParserError::InputBufferError.into());
    }
    if let OpCode::OpMsg = header.op_code {
        verify_op_msg_checksum(buffer, body)?;
    }
    let request = Request::decode(header, body)?;
    Ok(request)
}

/// The CRC-32C trailer, when flag bit 0 is set, covers the entire message
/// except its own four bytes.
fn verify_op_msg_checksum(message: &[u8], body: &[u8]) -> Result<(), WireParserError> {
    let (flag_bits, _) = parse_u32(body)?;
    if !OpMsgFlags(flag_bits).checksum_present() {
        return Ok(());
    }
    if message.len() < MSG_HEADER_SIZE + 2 * size_of::<u32>() {
        return Err(WireParserError::NotEnoughBufferSize);
    }
    let (declared, _) = parse_u32(&message[message.len() - size_of::<u32>()..])?;
    let actual = crc32c::crc32c(&message[..message.len() - size_of::<u32>()]);
    if declared != actual {
        return Err(WireParserError::OpMsgChecksumMismatch);
    }
    Ok(())
}

#[cfg(test)]
mod parser_tests {
    use bson::doc;

    use crate::declarations::errors::MockError;
    use crate::utils::u32_to_u8_array;
    use crate::wire::error::WireParserError;
    use crate::wire::flags::OP_MSG_FLAG_CHECKSUM_PRESENT;
    use crate::wire::msg_header::MSG_HEADER_SIZE;
    use crate::wire::opcodes::{OpCode, OP_MSG_CODE, OP_QUERY_CODE};
    use crate::wire::parser::parse_incoming_bytes;

    fn build_message(op_code: u32, body: &[u8]) -> Vec<u8> {
        let mut message = Vec::new();
        message.extend_from_slice(&u32_to_u8_array((MSG_HEADER_SIZE + body.len()) as u32));
        message.extend_from_slice(&u32_to_u8_array(1));
        message.extend_from_slice(&u32_to_u8_array(0));
        message.extend_from_slice(&u32_to_u8_array(op_code));
        message.extend_from_slice(body);
        message
    }

    fn op_msg_body(flag_bits: u32, document: &bson::Document) -> Vec<u8> {
        let mut body = Vec::new();
        body.extend_from_slice(&u32_to_u8_array(flag_bits));
        body.push(0);
        document.to_writer(&mut body).unwrap();
        body
    }

    #[test]
    fn test_parse_incoming_bytes_op_msg() {
        let message = build_message(OP_MSG_CODE, &op_msg_body(0, &doc! { "ping": 1 }));
        let request = parse_incoming_bytes(&message).unwrap();
        assert_eq!(request.opcode(), OpCode::OpMsg);
        assert!(request.is_command());
        assert_eq!(request.command_name(), Some("ping"));
    }

    #[test]
    fn test_parse_incoming_bytes_length_mismatch() {
        let mut message = build_message(OP_MSG_CODE, &op_msg_body(0, &doc! { "ping": 1 }));
        message.push(0);
        match parse_incoming_bytes(&message) {
            Err(MockError::WireParser(WireParserError::InputBufferError)) => (),
            other => panic!("expected InputBufferError, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_incoming_bytes_verifies_checksum() {
        let mut body = op_msg_body(OP_MSG_FLAG_CHECKSUM_PRESENT, &doc! { "ping": 1 });
        body.extend_from_slice(&[0, 0, 0, 0]);
        let mut message = build_message(OP_MSG_CODE, &body);
        let checksum = crc32c::crc32c(&message[..message.len() - 4]);
        let end = message.len();
        message[end - 4..].copy_from_slice(&u32_to_u8_array(checksum));

        let request = parse_incoming_bytes(&message).unwrap();
        assert_eq!(request.command_name(), Some("ping"));
    }

    #[test]
    fn test_parse_incoming_bytes_rejects_bad_checksum() {
        let mut body = op_msg_body(OP_MSG_FLAG_CHECKSUM_PRESENT, &doc! { "ping": 1 });
        body.extend_from_slice(&[1, 2, 3, 4]);
        let message = build_message(OP_MSG_CODE, &body);

        match parse_incoming_bytes(&message) {
            Err(MockError::WireParser(WireParserError::OpMsgChecksumMismatch)) => (),
            other => panic!("expected OpMsgChecksumMismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_incoming_bytes_truncated_query() {
        let mut body = Vec::new();
        body.extend_from_slice(&u32_to_u8_array(0));
        body.extend_from_slice(b"db.coll\0");
        let message = build_message(OP_QUERY_CODE, &body);
        match parse_incoming_bytes(&message) {
            Err(MockError::WireParser(WireParserError::NotEnoughBufferSize)) => (),
            other => panic!("expected NotEnoughBufferSize, got {:?}", other),
        }
    }
}
