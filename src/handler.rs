use crate::{HostMapError, Result};
use async_trait::async_trait;
use dns_message::{Message, RCode};
use std::fmt;
use std::sync::Arc;
use tracing::trace;

/// Per-request information handed down the chain.
#[derive(Debug, Clone)]
pub struct Context {
    server: String,
}

impl Context {
    /// `server` identifies the serving instance, e.g. `dns://127.0.0.1:8053`.
    pub fn new(server: impl Into<String>) -> Self {
        Self {
            server: server.into(),
        }
    }

    pub fn server(&self) -> &str {
        &self.server
    }
}

/// Where a handler writes its reply to the client.
#[async_trait]
pub trait ResponseWriter: Send {
    async fn write_msg(&mut self, message: &Message) -> Result<()>;
}

/// One stage of a [`Chain`].
///
/// A handler either writes a reply itself and returns, or calls
/// [`Next::serve`] with the unchanged request and returns whatever the rest of
/// the chain returns. The returned [`RCode`] follows the host convention: a
/// code for which [`client_write`] is true means a reply has been written.
#[async_trait]
pub trait Handler: Send + Sync {
    fn name(&self) -> &'static str;

    async fn serve(
        &self,
        ctx: &Context,
        writer: &mut dyn ResponseWriter,
        request: &Message,
        next: Next<'_>,
    ) -> Result<RCode>;
}

/// The handlers after the current one.
#[derive(Clone, Copy)]
pub struct Next<'a> {
    previous: &'static str,
    handlers: &'a [Arc<dyn Handler>],
}

impl<'a> Next<'a> {
    /// Hands the request to the next handler, or fails with
    /// [`HostMapError::NoNextHandler`] when the chain ends here.
    pub async fn serve(
        self,
        ctx: &Context,
        writer: &mut dyn ResponseWriter,
        request: &Message,
    ) -> Result<RCode> {
        match self.handlers.split_first() {
            Some((handler, rest)) => {
                trace!(from = self.previous, to = handler.name(), "next handler");
                let next = Next {
                    previous: handler.name(),
                    handlers: rest,
                };
                handler.serve(ctx, writer, request, next).await
            }
            None => Err(HostMapError::NoNextHandler(self.previous)),
        }
    }
}

impl fmt::Debug for Next<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.handlers.iter().map(|h| h.name()))
            .finish()
    }
}

/// An ordered list of handlers, evaluated front to back until one of them
/// writes a reply.
#[derive(Clone, Default)]
pub struct Chain {
    handlers: Vec<Arc<dyn Handler>>,
}

impl Chain {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn push(&mut self, handler: Arc<dyn Handler>) {
        self.handlers.push(handler);
    }

    pub fn with(mut self, handler: impl Handler + 'static) -> Self {
        self.push(Arc::new(handler));
        self
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.handlers.iter().map(|h| h.name()).collect()
    }

    pub async fn serve(
        &self,
        ctx: &Context,
        writer: &mut dyn ResponseWriter,
        request: &Message,
    ) -> Result<RCode> {
        Next {
            previous: "server",
            handlers: &self.handlers,
        }
        .serve(ctx, writer, request)
        .await
    }
}

impl fmt::Debug for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Chain")
            .field("handlers", &self.names())
            .finish()
    }
}

/// Whether a handler returning `rcode` has already written to the client.
/// For the failure codes below the host is expected to write the reply.
pub fn client_write(rcode: RCode) -> bool {
    !matches!(
        rcode,
        RCode::ServerFailure | RCode::Refused | RCode::FormatError | RCode::NotImplemented
    )
}
