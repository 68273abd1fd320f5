use dns_message::{MessageError, RCode};
use std::net::SocketAddr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HostMapError {
    #[error("No next handler in the chain after {0}")]
    NoNextHandler(&'static str),

    #[error("Message has no question section")]
    NoQuestion,

    #[error("Invalid message: {0}")]
    Message(#[from] MessageError),

    #[error("Failed to write response: {0}")]
    Write(#[source] std::io::Error),

    #[error("Upstream I/O error: {0}")]
    Upstream(#[from] std::io::Error),

    #[error("Upstream {0} did not answer in time")]
    UpstreamTimeout(SocketAddr),
}

impl HostMapError {
    /// The response code a host should answer with when a chain fails with
    /// this error.
    pub fn rcode(&self) -> RCode {
        match self {
            HostMapError::NoQuestion | HostMapError::Message(_) => RCode::FormatError,
            _ => RCode::ServerFailure,
        }
    }
}
