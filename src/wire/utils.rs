use std::mem::size_of;

use bson::Document;

use crate::utils::{u8_array_to_u32, u8_array_to_u64};
use crate::wire::error::WireParserError;

pub fn parse_u32(buffer: &[u8]) -> Result<(u32, &[u8]), WireParserError> {
    let field_size = size_of::<u32>();
    if buffer.len() < field_size {
        return Err(WireParserError::NotEnoughBufferSize);
    }
    let value = u8_array_to_u32(&[buffer[0], buffer[1], buffer[2], buffer[3]]);
    Ok((value, &buffer[field_size..]))
}

pub fn parse_i32(buffer: &[u8]) -> Result<(i32, &[u8]), WireParserError> {
    let (value, next_buffer) = parse_u32(buffer)?;
    Ok((value as i32, next_buffer))
}

pub fn parse_i64(buffer: &[u8]) -> Result<(i64, &[u8]), WireParserError> {
    let field_size = size_of::<i64>();
    if buffer.len() < field_size {
        return Err(WireParserError::NotEnoughBufferSize);
    }
    let value = u8_array_to_u64(&[
        buffer[0], buffer[1], buffer[2], buffer[3], buffer[4], buffer[5], buffer[6], buffer[7],
    ]);
    Ok((value as i64, &buffer[field_size..]))
}

pub fn parse_cstring(buffer: &[u8]) -> Result<(String, &[u8]), WireParserError> {
    match buffer.iter().position(|&byte| byte == b'\0') {
        None => Err(WireParserError::NoZeroTrailingInCstringBuffer),
        Some(terminal_index) => match std::str::from_utf8(&buffer[..terminal_index]) {
            Err(_utf8_error) => Err(WireParserError::CstringContainsInvalidUtf8),
            Ok(value) => Ok((value.to_string(), &buffer[terminal_index + 1..])),
        },
    }
}

/// Copies one length-prefixed document out of the buffer. The declared
/// length must fit in the remaining bytes; the returned document owns its
/// data independently of the input buffer.
pub fn parse_bson_document(buffer: &[u8]) -> Result<(Document, &[u8]), WireParserError> {
    let (declared_size, _next_buffer) = parse_u32(buffer)?;
    let declared_size = declared_size as usize;
    if declared_size < size_of::<u32>() + 1 || declared_size > buffer.len() {
        return Err(WireParserError::NotEnoughBufferSize);
    }
    match Document::from_reader(&buffer[..declared_size]) {
        Err(error) => Err(WireParserError::ParseBsonError(error)),
        Ok(document) => Ok((document, &buffer[declared_size..])),
    }
}

#[cfg(test)]
mod wire_utils_tests {
    use bson::doc;

    use crate::wire::error::WireParserError;
    use crate::wire::utils::{parse_bson_document, parse_cstring, parse_i64, parse_u32};

    #[test]
    fn test_parse_u32() {
        let (value, rest) = parse_u32(&[0x0d, 0x01, 0x00, 0x00, 0xff]).unwrap();
        assert_eq!(value, 269);
        assert_eq!(rest, &[0xff]);
    }

    #[test]
    #[should_panic]
    fn test_parse_u32_error() {
        parse_u32(&[0x0d]).unwrap();
    }

    #[test]
    fn test_parse_i64() {
        let (value, rest) = parse_i64(&[0x0d, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00]).unwrap();
        assert_eq!(value, 269);
        assert!(rest.is_empty());
    }

    #[test]
    fn test_parse_i64_negative() {
        let (value, _) = parse_i64(&[0xff; 8]).unwrap();
        assert_eq!(value, -1);
    }

    #[test]
    fn test_parse_cstring() {
        let (value, rest) = parse_cstring(b"admin.$cmd\0rest").unwrap();
        assert_eq!(value, "admin.$cmd");
        assert_eq!(rest, b"rest");
    }

    #[test]
    fn test_parse_cstring_empty() {
        let (value, rest) = parse_cstring(b"\0").unwrap();
        assert_eq!(value, "");
        assert!(rest.is_empty());
    }

    #[test]
    #[should_panic]
    fn test_parse_cstring_error() {
        parse_cstring(&[0x70, 0x70, 0x6c, 0x69]).unwrap();
    }

    #[test]
    fn test_parse_bson_document() {
        let document = doc! { "ping": 1 };
        let mut buffer = Vec::new();
        document.to_writer(&mut buffer).unwrap();
        buffer.extend_from_slice(b"tail");

        let (parsed, rest) = parse_bson_document(&buffer).unwrap();
        assert_eq!(parsed, document);
        assert_eq!(rest, b"tail");
    }

    #[test]
    fn test_parse_bson_document_truncated() {
        let document = doc! { "ping": 1 };
        let mut buffer = Vec::new();
        document.to_writer(&mut buffer).unwrap();
        buffer.truncate(buffer.len() - 2);

        match parse_bson_document(&buffer) {
            Err(WireParserError::NotEnoughBufferSize) => (),
            other => panic!("expected NotEnoughBufferSize, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_bson_document_declared_length_overruns_buffer() {
        // declares 64 bytes but only 8 are available
        let buffer = [0x40, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00];
        match parse_bson_document(&buffer) {
            Err(WireParserError::NotEnoughBufferSize) => (),
            other => panic!("expected NotEnoughBufferSize, got {:?}", other),
        }
    }
}
