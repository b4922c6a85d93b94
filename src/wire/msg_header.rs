// @see https://docs.mongodb.com/manual/reference/mongodb-wire-protocol/#standard-message-header

use crate::wire::error::WireParserError;
use crate::wire::opcodes::{pick_op_code, OpCode};
use crate::wire::utils::parse_u32;

pub const MSG_HEADER_SIZE: usize = 16;

#[derive(Clone, Debug)]
pub struct MsgHeader {
    // total message size, including this
    pub message_length: u32,

    // identifier for this message
    pub request_id: u32,

    // requestID from the original request (used in responses from db)
    pub response_to: u32,

    // request type
    pub op_code: OpCode,
}

pub fn parse_msg_header(buffer: &[u8]) -> Result<(MsgHeader, &[u8]), WireParserError> {
    let (message_length, next_buffer) = parse_u32(buffer)?;
    let (request_id, next_buffer) = parse_u32(next_buffer)?;
    let (response_to, next_buffer) = parse_u32(next_buffer)?;
    let (op_code_u32, next_buffer) = parse_u32(next_buffer)?;
    let op_code = pick_op_code(op_code_u32)?;
    Ok((
        MsgHeader {
            message_length,
            request_id,
            response_to,
            op_code,
        },
        next_buffer,
    ))
}
