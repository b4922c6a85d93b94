use crate::matcher::json::PatternError;
use crate::wire::error::WireParserError;

#[derive(Debug)]
pub enum MockError {
    WireParser(WireParserError),
    Pattern(PatternError),
}

impl std::convert::From<WireParserError> for MockError {
    fn from(error: WireParserError) -> MockError {
        MockError::WireParser(error)
    }
}

impl std::convert::From<PatternError> for MockError {
    fn from(error: PatternError) -> MockError {
        MockError::Pattern(error)
    }
}

pub type MockResult<T> = Result<T, MockError>;
