use thiserror::Error;

#[derive(Debug, Error)]
pub enum MessageError {
    #[error("Parsing error: {0}")]
    ParsingError(String),

    #[error("Encoding error: {0}")]
    EncodingError(String),

    #[error("Circular reference - name pointer {0} was already followed")]
    CircularReference(u16),

    #[error("Name pointer {0} is outside of the message")]
    PointerOutOfBounds(u16),

    #[error("OpCode {0} does not fit in 4 bits")]
    ReservedOpCode(u8),

    #[error("Label of length {0} exceeds 63 bytes: {1}")]
    NameLengthExceeded(usize, String),

    #[error("Invalid {rtype} rdata: expected {expected} bytes, found {found}")]
    InvalidRData {
        rtype: &'static str,
        expected: usize,
        found: usize,
    },
}

impl<E: std::fmt::Debug> From<nom::Err<E>> for MessageError {
    fn from(error: nom::Err<E>) -> Self {
        MessageError::ParsingError(format!("{}", error))
    }
}
