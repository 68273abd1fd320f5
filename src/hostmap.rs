use crate::handler::{Context, Handler, Next, ResponseWriter};
use crate::metrics::RequestCounter;
use crate::query::Query;
use crate::reply::{address_reply, strict_failure};
use crate::store::RecordStore;
use crate::Result;
use async_trait::async_trait;
use dns_message::{Message, RCode};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Answers A and AAAA queries from a [`RecordStore`].
///
/// Every address query gets exactly one authoritative reply, whether or not
/// the store knows the name. Other query types are passed to the next
/// handler untouched, or refused with SERVFAIL when fallthrough is off.
pub struct HostMap {
    store: Arc<dyn RecordStore>,
    metrics: Arc<RequestCounter>,
    fallthrough: bool,
}

impl HostMap {
    pub fn new(store: Arc<dyn RecordStore>, metrics: Arc<RequestCounter>) -> Self {
        Self {
            store,
            metrics,
            fallthrough: true,
        }
    }

    pub fn fallthrough(mut self, fallthrough: bool) -> Self {
        self.fallthrough = fallthrough;
        self
    }
}

#[async_trait]
impl Handler for HostMap {
    fn name(&self) -> &'static str {
        crate::DIRECTIVE
    }

    async fn serve(
        &self,
        ctx: &Context,
        writer: &mut dyn ResponseWriter,
        request: &Message,
        next: Next<'_>,
    ) -> Result<RCode> {
        let query = match Query::from_message(request) {
            Some(query) => query,
            None => return next.serve(ctx, writer, request).await,
        };

        debug!(name = %query.name, kind = ?query.kind, "received query");

        if !query.kind.is_address() {
            if self.fallthrough {
                return next.serve(ctx, writer, request).await;
            }
            writer.write_msg(&strict_failure(request)).await?;
            return Ok(RCode::NoError);
        }

        let label = query.leftmost_label();
        let address = self.store.lookup(label).await;
        match &address {
            Some(address) => info!(label, %address, "found matching record"),
            None => debug!(label, "no matching record"),
        }

        let reply = address_reply(request, &query, address.as_deref());
        if let Err(e) = writer.write_msg(&reply).await {
            warn!(error = %e, name = %query.name, "could not write reply");
            return Err(e);
        }

        self.metrics.increment(ctx.server());

        Ok(RCode::NoError)
    }
}
