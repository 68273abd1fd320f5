use async_trait::async_trait;
use bytes::Bytes;
use dns_message::Message;
use futures::prelude::*;
use futures::stream::SplitSink;
use hostmap::{client_write, Chain, Context, HostMapError, ResponseWriter};

use std::net::SocketAddr;

use std::sync::Arc;
use tokio::net::UdpSocket;
use tokio::sync::Mutex;
use tokio_util::codec::BytesCodec;
use tokio_util::udp::UdpFramed;
use tracing::{debug, error, info, warn};

type Result<T> = anyhow::Result<T>;

type UdpSink = SplitSink<UdpFramed<BytesCodec>, (Bytes, SocketAddr)>;

pub(crate) struct Server {
    local_addr: SocketAddr,
    chain: Arc<Chain>,
}

impl Server {
    pub fn new(local_addr: SocketAddr, chain: Chain) -> Self {
        Self {
            local_addr,
            chain: Arc::new(chain),
        }
    }

    pub async fn run(&self) -> Result<()> {
        let listener = UdpSocket::bind(&self.local_addr).await?;
        let ctx = Arc::new(Context::new(format!("dns://{}", listener.local_addr()?)));
        info!(server = ctx.server(), "listening");

        let (sink, mut stream) = UdpFramed::new(listener, BytesCodec::new()).split();
        let sink = Arc::new(Mutex::new(sink));

        loop {
            let (bytes, peer) = match stream.next().await {
                Some(Ok((b, a))) => (b, a),
                Some(Err(e)) => {
                    error!("Error getting next value in stream: {}", e);
                    continue;
                }
                None => {
                    warn!("No value available from stream, closing");
                    return Ok(());
                }
            };

            let sink = sink.clone();
            let chain = self.chain.clone();
            let ctx = ctx.clone();

            tokio::spawn(async move {
                let request = match Message::from_bytes(bytes.as_ref()) {
                    Ok(m) => m,
                    Err(e) => {
                        warn!(%peer, error = %e, "dropping unparsable request");
                        return;
                    }
                };
                debug!("{}: {}", peer, request);

                let mut writer = UdpWriter { sink, peer };
                handle(&chain, &ctx, &mut writer, &request).await;
            });
        }
    }
}

/// Runs `request` through the chain, writing an error reply when no handler
/// wrote one.
pub(crate) async fn handle(
    chain: &Chain,
    ctx: &Context,
    writer: &mut dyn ResponseWriter,
    request: &Message,
) {
    let rcode = match chain.serve(ctx, writer, request).await {
        Ok(rcode) if client_write(rcode) => return,
        Ok(rcode) => rcode,
        Err(e) => {
            error!(error = %e, "chain failed");
            e.rcode()
        }
    };

    if let Err(e) = writer.write_msg(&request.error_reply(rcode)).await {
        error!(error = %e, "Could not send error reply");
    }
}

struct UdpWriter {
    sink: Arc<Mutex<UdpSink>>,
    peer: SocketAddr,
}

#[async_trait]
impl ResponseWriter for UdpWriter {
    async fn write_msg(&mut self, message: &Message) -> hostmap::Result<()> {
        let mut buf = Vec::with_capacity(512);
        let len = message.to_bytes(&mut buf)?;
        debug!("Sending to: {}, length: {}", self.peer, len);

        self.sink
            .lock()
            .await
            .send((buf.into(), self.peer))
            .await
            .map_err(HostMapError::Write)
    }
}

#[cfg(test)]
pub(crate) mod test {
    use super::*;
    use dns_message::{MessageBuilder, RCode, Type};
    use hostmap::{Handler, Next};

    #[derive(Default)]
    pub struct RecordingWriter {
        pub written: Vec<Message>,
    }

    #[async_trait]
    impl ResponseWriter for RecordingWriter {
        async fn write_msg(&mut self, message: &Message) -> hostmap::Result<()> {
            self.written.push(message.clone());
            Ok(())
        }
    }

    struct Refuse;

    #[async_trait]
    impl Handler for Refuse {
        fn name(&self) -> &'static str {
            "refuse"
        }

        async fn serve(
            &self,
            _ctx: &Context,
            _writer: &mut dyn ResponseWriter,
            _request: &Message,
            _next: Next<'_>,
        ) -> hostmap::Result<RCode> {
            Ok(RCode::Refused)
        }
    }

    #[tokio::test]
    async fn test_host_writes_reply_for_failure_codes() {
        let chain = Chain::new().with(Refuse);
        let request = MessageBuilder::query(11, "example.com.", Type::A).build();
        let mut writer = RecordingWriter::default();

        handle(&chain, &Context::new("dns://test"), &mut writer, &request).await;

        assert_eq!(writer.written.len(), 1);
        assert_eq!(writer.written[0].header.id, 11);
        assert_eq!(writer.written[0].header.rcode, RCode::Refused);
    }

    #[tokio::test]
    async fn test_chain_error_becomes_servfail() {
        let request = MessageBuilder::query(12, "example.com.", Type::MX).build();
        let mut writer = RecordingWriter::default();

        handle(&Chain::new(), &Context::new("dns://test"), &mut writer, &request).await;

        assert_eq!(writer.written.len(), 1);
        assert_eq!(writer.written[0].header.rcode, RCode::ServerFailure);
    }

    #[tokio::test]
    async fn test_serves_udp() {
        use hostmap::{HostMap, Record, RequestCounter, StaticStore};
        use std::time::Duration;

        let metrics = Arc::new(RequestCounter::new());
        let store = Arc::new(StaticStore::new(
            vec![Record::new("host", "10.0.0.5")].into_iter().collect(),
        ));
        let chain = Chain::new().with(HostMap::new(store, metrics.clone()));

        // Find a free port, then hand it to the server.
        let addr = UdpSocket::bind("127.0.0.1:0")
            .await
            .unwrap()
            .local_addr()
            .unwrap();
        let server = Server::new(addr, chain);
        tokio::spawn(async move { server.run().await });
        tokio::time::sleep(Duration::from_millis(50)).await;

        let client = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let mut buf = Vec::new();
        let len = MessageBuilder::query(13, "host.example.com", Type::A)
            .build()
            .to_bytes(&mut buf)
            .unwrap();
        client.send_to(&buf[..len], addr).await.unwrap();

        let mut buf = vec![0u8; 512];
        let (len, _) = tokio::time::timeout(Duration::from_secs(5), client.recv_from(&mut buf))
            .await
            .unwrap()
            .unwrap();
        let reply = Message::from_bytes(&buf[..len]).unwrap();

        assert_eq!(reply.header.id, 13);
        assert!(reply.header.aa);
        assert_eq!(
            reply.answers[0].data,
            dns_message::RData::A("10.0.0.5".parse().unwrap())
        );

        // The counter moves after the reply is on the wire.
        let server_label = format!("dns://{}", addr);
        for _ in 0..100 {
            if metrics.get(&server_label) == 1 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(metrics.get(&server_label), 1);
    }
}
