use crate::{encode_name, Result};
use std::fmt;

use tracing::{instrument, trace};

#[derive(Debug, Clone, Default, PartialEq)]
/// The question section carries the parameters that define what is being
/// asked.
pub struct Question {
    /// The domain name being queried. Names read off the wire carry no
    /// trailing dot; both forms encode the same way.
    pub q_name: String,

    /// The record [`Type`] being asked for.
    pub q_type: Type,

    /// The [`Class`] of the query.
    pub q_class: Class,
}

impl Question {
    #[instrument(skip(buf))]
    pub(crate) fn to_bytes(&self, buf: &mut Vec<u8>) -> Result<usize> {
        let byte_count = encode_name(&self.q_name, buf)?;
        buf.extend_from_slice(&u16::from(self.q_type).to_be_bytes());
        buf.extend_from_slice(&u16::from(self.q_class).to_be_bytes());

        trace!("Wrote {} bytes", byte_count + 4);

        Ok(byte_count + 4)
    }
}

/// Record types. Only the types this crate decodes, or that a chain is likely
/// to switch on, get their own variant; everything else is carried as
/// [`Type::Unknown`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Type {
    /// RFC1035 - (1) a host address.
    #[default]
    A,

    /// RFC1035 - (2) an authoritative name server.
    NS,

    /// RFC1035 - (5) the canonical name for an alias.
    CNAME,

    /// RFC1035 - (6) marks the start of a zone of authority.
    SOA,

    /// RFC1035 - (12) a domain name pointer.
    PTR,

    /// RFC1035 - (15) mail exchange.
    MX,

    /// RFC1035 - (16) text strings.
    TXT,

    /// RFC3596 - (28) a single IPv6 address.
    AAAA,

    /// RFC2782 - (33) service location.
    SRV,

    /// RFC6891 - (41) EDNS(0) pseudo record.
    OPT,

    /// RFC1035 - (255) a request for all records.
    ANY,

    /// Any other type - the value is contained within.
    Unknown(u16),
}

const TYPE_CODES: [(Type, u16, &str); 11] = [
    (Type::A, 1, "A"),
    (Type::NS, 2, "NS"),
    (Type::CNAME, 5, "CNAME"),
    (Type::SOA, 6, "SOA"),
    (Type::PTR, 12, "PTR"),
    (Type::MX, 15, "MX"),
    (Type::TXT, 16, "TXT"),
    (Type::AAAA, 28, "AAAA"),
    (Type::SRV, 33, "SRV"),
    (Type::OPT, 41, "OPT"),
    (Type::ANY, 255, "ANY"),
];

impl From<Type> for u16 {
    fn from(t: Type) -> u16 {
        match t {
            Type::Unknown(i) => i,
            known => TYPE_CODES
                .iter()
                .find(|(t, _, _)| *t == known)
                .map(|(_, code, _)| *code)
                .unwrap_or_default(),
        }
    }
}

impl From<u16> for Type {
    fn from(val: u16) -> Self {
        TYPE_CODES
            .iter()
            .find(|(_, code, _)| *code == val)
            .map(|(t, _, _)| *t)
            .unwrap_or(Type::Unknown(val))
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match TYPE_CODES.iter().find(|(t, _, _)| t == self) {
            Some((_, _, mnemonic)) => write!(f, "{}", mnemonic),
            None => write!(f, "TYPE{}", u16::from(*self)),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
/// The class of a query or record - [`Class::IN`] (the default) almost always.
pub enum Class {
    /// RFC1035 - 1 the Internet.
    #[default]
    IN,

    /// RFC1035 - 3 the CHAOS class.
    CH,

    /// RFC1035 - 4 Hesiod.
    HS,

    /// RFC1035 - 255 any class.
    ANY,

    /// Any other class - contained within. OPT records reuse this field for
    /// the requester's UDP payload size.
    Unknown(u16),
}

impl From<Class> for u16 {
    fn from(class: Class) -> u16 {
        match class {
            Class::IN => 1,
            Class::CH => 3,
            Class::HS => 4,
            Class::ANY => 255,
            Class::Unknown(i) => i,
        }
    }
}

impl From<u16> for Class {
    fn from(val: u16) -> Self {
        match val {
            1 => Class::IN,
            3 => Class::CH,
            4 => Class::HS,
            255 => Class::ANY,
            _ => Class::Unknown(val),
        }
    }
}
