mod builder;
mod error;
mod header;
mod message;
mod parser;
mod question;
mod resource_record;

use tracing::instrument;

pub use builder::{MessageBuilder, QuestionBuilder, ResourceRecordBuilder};
pub use error::MessageError;
pub use header::{Header, OpCode, RCode};
pub use message::Message;
pub use question::{Class, Question, Type};
pub use resource_record::{RData, ResourceRecord};

pub type Result<T> = std::result::Result<T, MessageError>;

/// Writes `name` as a sequence of length-prefixed labels terminated by the
/// root label. Empty labels are skipped, so `"host.example."`,
/// `"host.example"` and `"."` all encode as expected.
#[instrument(skip(buf))]
pub(crate) fn encode_name(name: &str, buf: &mut Vec<u8>) -> Result<usize> {
    let mut byte_count = 0;
    for label in name.split('.').filter(|l| !l.is_empty()) {
        if label.len() > 63 {
            return Err(MessageError::NameLengthExceeded(
                label.len(),
                label.to_string(),
            ));
        }
        buf.push(label.len() as u8);
        buf.extend_from_slice(label.as_bytes());
        byte_count += 1 + label.len();
    }
    buf.push(0);
    Ok(byte_count + 1)
}

#[cfg(test)]
mod test {
    use std::sync::Once;

    static INIT: Once = Once::new();

    pub fn setup() {
        INIT.call_once(|| {
            tracing_subscriber::fmt()
                .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
                .with_test_writer()
                .init();
        });
    }

    #[test]
    fn test_encode_name_ignores_trailing_dot() {
        let mut with_dot = Vec::new();
        let mut without_dot = Vec::new();
        super::encode_name("host.example.com.", &mut with_dot).unwrap();
        super::encode_name("host.example.com", &mut without_dot).unwrap();

        assert_eq!(with_dot, without_dot);
        assert_eq!(
            with_dot,
            b"\x04host\x07example\x03com\x00".to_vec()
        );
    }

    #[test]
    fn test_encode_root_name() {
        let mut buf = Vec::new();
        let len = super::encode_name(".", &mut buf).unwrap();
        assert_eq!(len, 1);
        assert_eq!(buf, vec![0]);
    }

    #[test]
    fn test_encode_name_rejects_long_label() {
        let label = "a".repeat(64);
        let mut buf = Vec::new();
        assert!(matches!(
            super::encode_name(&label, &mut buf),
            Err(super::MessageError::NameLengthExceeded(64, _))
        ));
    }
}
