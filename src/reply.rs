use crate::query::{Query, QueryKind};
use dns_message::{Class, Message, RCode, RData, ResourceRecordBuilder, Type};
use std::net::IpAddr;

/// TTL of every locally built answer, in seconds.
pub const ANSWER_TTL: u32 = 30;

/// Builds the authoritative reply to an address query.
///
/// The reply always carries exactly one answer, typed after the query (A for
/// v4, AAAA for v6). When `address` is missing, does not parse, or is of the
/// other family, the answer names no address at all; the reply is still a
/// NOERROR reply.
pub fn address_reply(request: &Message, query: &Query, address: Option<&str>) -> Message {
    let parsed = address.and_then(|a| a.parse::<IpAddr>().ok());

    let data = match query.kind {
        QueryKind::AddressV6 => match parsed {
            Some(IpAddr::V6(v6)) => RData::AAAA(v6),
            _ => RData::Unset(Type::AAAA),
        },
        // Only address queries get here; anything else is answered as v4.
        _ => match parsed {
            Some(IpAddr::V4(v4)) => RData::A(v4),
            Some(IpAddr::V6(v6)) => v6
                .to_ipv4_mapped()
                .map(RData::A)
                .unwrap_or(RData::Unset(Type::A)),
            None => RData::Unset(Type::A),
        },
    };

    let mut reply = request.reply();
    reply.header.aa = true;
    reply.answers.push(
        ResourceRecordBuilder::new(&query.name, data)
            .class(Class::IN)
            .ttl(ANSWER_TTL)
            .build(),
    );
    reply
}

/// The reply written in place of delegating when fallthrough is off.
pub fn strict_failure(request: &Message) -> Message {
    let mut reply = request.error_reply(RCode::ServerFailure);
    reply.header.aa = true;
    reply
}
