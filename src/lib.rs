//! A handler stage that answers A and AAAA queries from a small JSON table of
//! name to address mappings, and hands every other query to the next stage
//! of the chain.

pub mod config;
mod error;
mod handler;
mod hostmap;
pub mod metrics;
mod query;
mod reply;
pub mod store;
mod table;

pub use config::{parse_directives, setup, ConfigError, Directive, DIRECTIVE};
pub use error::HostMapError;
pub use handler::{client_write, Chain, Context, Handler, Next, ResponseWriter};
pub use hostmap::HostMap;
pub use metrics::RequestCounter;
pub use query::{leftmost_label, Query, QueryKind};
pub use reply::{address_reply, strict_failure, ANSWER_TTL};
pub use store::{FileStore, RecordStore, RefreshPolicy, StaticStore};
pub use table::{AddressMap, Record, RecordSet, TableError};

pub type Result<T> = std::result::Result<T, HostMapError>;

#[cfg(test)]
pub(crate) mod test {
    use crate::{HostMapError, ResponseWriter};
    use async_trait::async_trait;
    use dns_message::Message;
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

    /// Keeps every message written to it.
    #[derive(Debug, Default)]
    pub struct RecordingWriter {
        pub written: Vec<Message>,
    }

    #[async_trait]
    impl ResponseWriter for RecordingWriter {
        async fn write_msg(&mut self, message: &Message) -> Result<(), HostMapError> {
            self.written.push(message.clone());
            Ok(())
        }
    }
}
