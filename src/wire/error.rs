use crate::wire::opcodes::OpCode;

#[derive(Debug)]
pub enum WireParserError {
    NotEnoughBufferSize,
    NoZeroTrailingInCstringBuffer,
    CstringContainsInvalidUtf8,
    ParseBsonError(bson::de::Error),
    UnknownOpCode(u32),
    UnimplementedOpCode(OpCode),
    UnknownSectionKind(u8),
    OpMsgChecksumMismatch,
    InputBufferError,
}
