use async_trait::async_trait;
use dns_message::{Message, RCode};
use hostmap::{ConfigError, Context, Directive, Handler, HostMapError, Next, ResponseWriter};
use std::io;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::time::timeout;
use tracing::{debug, info};

pub const DIRECTIVE: &str = "forward";

const UPSTREAM_TIMEOUT: Duration = Duration::from_secs(5);

/// Terminal stage: relays the request to an upstream resolver and writes back
/// its answer.
pub struct Forward {
    upstream: SocketAddr,
    timeout: Duration,
}

impl Forward {
    pub fn new(upstream: SocketAddr) -> Self {
        Self {
            upstream,
            timeout: UPSTREAM_TIMEOUT,
        }
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// `forward <ip>[:port] [timeout-secs]`, port 53 when left out.
    pub fn setup(directive: &Directive) -> Result<Self, ConfigError> {
        let invalid = |token: &String| ConfigError::InvalidArgument {
            directive: directive.name.clone(),
            token: token.clone(),
            line: directive.line,
        };

        match directive.args.as_slice() {
            [] => Err(ConfigError::MissingArgument {
                directive: directive.name.clone(),
                expected: "an upstream address",
                line: directive.line,
            }),
            [addr] => parse_upstream(addr).map(Self::new).ok_or_else(|| invalid(addr)),
            [addr, secs] => {
                let forward = parse_upstream(addr)
                    .map(Self::new)
                    .ok_or_else(|| invalid(addr))?;
                match secs.parse::<u64>() {
                    Ok(secs) if secs > 0 => Ok(forward.timeout(Duration::from_secs(secs))),
                    _ => Err(invalid(secs)),
                }
            }
            [_, _, extra, ..] => Err(ConfigError::UnexpectedArgument {
                directive: directive.name.clone(),
                token: extra.clone(),
                line: directive.line,
            }),
        }
    }
}

fn parse_upstream(addr: &str) -> Option<SocketAddr> {
    addr.parse::<SocketAddr>()
        .ok()
        .or_else(|| addr.parse::<IpAddr>().ok().map(|ip| SocketAddr::new(ip, 53)))
}

#[async_trait]
impl Handler for Forward {
    fn name(&self) -> &'static str {
        DIRECTIVE
    }

    async fn serve(
        &self,
        _ctx: &Context,
        writer: &mut dyn ResponseWriter,
        request: &Message,
        _next: Next<'_>,
    ) -> hostmap::Result<RCode> {
        let reply = send_dns_request(self.upstream, request, self.timeout).await?;
        writer.write_msg(&reply).await?;
        Ok(RCode::NoError)
    }
}

async fn send_dns_request(
    upstream: SocketAddr,
    msg: &Message,
    wait: Duration,
) -> hostmap::Result<Message> {
    // New socket to talk to upstream dns.
    let local: SocketAddr = match upstream {
        SocketAddr::V4(_) => (Ipv4Addr::UNSPECIFIED, 0).into(),
        SocketAddr::V6(_) => (Ipv6Addr::UNSPECIFIED, 0).into(),
    };
    let socket = UdpSocket::bind(local).await?;
    socket.connect(upstream).await?;

    let mut buf = Vec::with_capacity(512);
    let len = msg.to_bytes(&mut buf)?;

    debug!("Sending to {}", upstream);
    socket.send(&buf[0..len]).await?;

    let mut buf = vec![0u8; 4096];
    let len = timeout(wait, socket.recv(&mut buf))
        .await
        .map_err(|_| HostMapError::UpstreamTimeout(upstream))??;

    let r_message = Message::from_bytes(&buf[0..len])?;
    if r_message.header.id != msg.header.id {
        return Err(HostMapError::Upstream(io::Error::new(
            io::ErrorKind::InvalidData,
            format!(
                "reply id {} from {} does not match request id {}",
                r_message.header.id, upstream, msg.header.id
            ),
        )));
    }
    info!("Got back: {}", r_message);
    Ok(r_message)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::server::test::RecordingWriter;
    use dns_message::{MessageBuilder, RData, ResourceRecordBuilder, Type};
    use hostmap::{parse_directives, Chain};

    #[test]
    fn test_setup() {
        let directives = parse_directives(
            "forward 8.8.8.8:53\nforward 1.1.1.1 2\nforward\nforward 1.1.1.1 2 x\nforward nope\nforward 1.1.1.1 0",
        );

        let forward = Forward::setup(&directives[0]).unwrap();
        assert_eq!(forward.upstream, "8.8.8.8:53".parse().unwrap());
        assert_eq!(forward.timeout, UPSTREAM_TIMEOUT);

        let forward = Forward::setup(&directives[1]).unwrap();
        assert_eq!(forward.upstream, "1.1.1.1:53".parse().unwrap());
        assert_eq!(forward.timeout, Duration::from_secs(2));

        assert!(matches!(
            Forward::setup(&directives[2]),
            Err(ConfigError::MissingArgument { line: 3, .. })
        ));
        assert!(matches!(
            Forward::setup(&directives[3]),
            Err(ConfigError::UnexpectedArgument { line: 4, .. })
        ));
        assert!(matches!(
            Forward::setup(&directives[4]),
            Err(ConfigError::InvalidArgument { line: 5, .. })
        ));
        assert!(matches!(
            Forward::setup(&directives[5]),
            Err(ConfigError::InvalidArgument { line: 6, .. })
        ));
    }

    #[tokio::test]
    async fn test_relays_upstream_answer() {
        let upstream = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let upstream_addr = upstream.local_addr().unwrap();

        tokio::spawn(async move {
            let mut buf = vec![0u8; 512];
            let (len, peer) = upstream.recv_from(&mut buf).await.unwrap();
            let request = Message::from_bytes(&buf[..len]).unwrap();

            let mut reply = request.reply();
            reply.header.ra = true;
            reply.answers.push(
                ResourceRecordBuilder::new("mail.example.com", RData::A(Ipv4Addr::new(192, 0, 2, 7)))
                    .ttl(60)
                    .build(),
            );
            let mut out = Vec::new();
            let len = reply.to_bytes(&mut out).unwrap();
            upstream.send_to(&out[..len], peer).await.unwrap();
        });

        let chain = Chain::new().with(Forward::new(upstream_addr));
        let request = MessageBuilder::query(21, "mail.example.com", Type::A).build();
        let mut writer = RecordingWriter::default();

        let rcode = chain
            .serve(&Context::new("dns://test"), &mut writer, &request)
            .await
            .unwrap();

        assert_eq!(rcode, RCode::NoError);
        assert_eq!(writer.written.len(), 1);
        assert_eq!(writer.written[0].header.id, 21);
        assert!(writer.written[0].header.ra);
        assert_eq!(
            writer.written[0].answers[0].data,
            RData::A(Ipv4Addr::new(192, 0, 2, 7))
        );
    }

    #[tokio::test]
    async fn test_rejects_reply_with_other_id() {
        let upstream = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let upstream_addr = upstream.local_addr().unwrap();

        tokio::spawn(async move {
            let mut buf = vec![0u8; 512];
            let (len, peer) = upstream.recv_from(&mut buf).await.unwrap();
            let mut reply = Message::from_bytes(&buf[..len]).unwrap().reply();
            reply.header.id = reply.header.id.wrapping_add(1);
            let mut out = Vec::new();
            let len = reply.to_bytes(&mut out).unwrap();
            upstream.send_to(&out[..len], peer).await.unwrap();
        });

        let chain = Chain::new().with(Forward::new(upstream_addr));
        let request = MessageBuilder::query(23, "mail.example.com", Type::A).build();
        let mut writer = RecordingWriter::default();

        let err = chain
            .serve(&Context::new("dns://test"), &mut writer, &request)
            .await
            .unwrap_err();

        assert!(matches!(err, HostMapError::Upstream(_)));
        assert_eq!(err.rcode(), RCode::ServerFailure);
        assert!(writer.written.is_empty());
    }

    #[tokio::test]
    async fn test_upstream_timeout() {
        // Bound but never answers.
        let silent = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let forward =
            Forward::new(silent.local_addr().unwrap()).timeout(Duration::from_millis(50));
        let chain = Chain::new().with(forward);
        let request = MessageBuilder::query(22, "example.com", Type::A).build();
        let mut writer = RecordingWriter::default();

        let err = chain
            .serve(&Context::new("dns://test"), &mut writer, &request)
            .await
            .unwrap_err();

        assert!(matches!(err, HostMapError::UpstreamTimeout(_)));
        assert!(writer.written.is_empty());
    }
}
