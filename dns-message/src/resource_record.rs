use crate::{encode_name, Class, MessageError, Result, Type};
use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};
use tracing::{instrument, trace};

#[derive(Debug, Clone, PartialEq)]
/// The answer, authority and additional sections all share the same format,
/// that is a variable number of [`ResourceRecord`]s.
///
/// These can be constructed with a [`crate::ResourceRecordBuilder`].
pub struct ResourceRecord {
    /// The domain name this resource record pertains to.
    pub name: String,

    /// The type and data of the resource record.
    pub data: RData,

    /// The class of the data in the `data` field.
    pub class: Class,

    /// Seconds the record may be cached before it should be discarded.
    pub ttl: u32,
}

impl ResourceRecord {
    /// The record type, as written in the TYPE field.
    pub fn rtype(&self) -> Type {
        self.data.rtype()
    }

    #[instrument(skip(buf))]
    pub(crate) fn to_bytes(&self, buf: &mut Vec<u8>) -> Result<usize> {
        // Names are written out in full; compression is optional on the
        // sending side.
        let mut byte_count = encode_name(&self.name, buf)?;

        buf.extend_from_slice(&u16::from(self.rtype()).to_be_bytes());
        buf.extend_from_slice(&u16::from(self.class).to_be_bytes());
        buf.extend_from_slice(&self.ttl.to_be_bytes());
        byte_count += 8;

        // The rdata length is only known once the rdata is written.
        let mut rdata: Vec<u8> = Vec::with_capacity(64);
        let rdlength = self.data.to_bytes(&mut rdata)?;
        if rdlength > u16::MAX as usize {
            return Err(MessageError::EncodingError(format!(
                "rdata of {} bytes does not fit in RDLENGTH",
                rdlength
            )));
        }

        buf.extend_from_slice(&(rdlength as u16).to_be_bytes());
        buf.extend(rdata);
        byte_count += 2 + rdlength;

        trace!("Wrote {} bytes", byte_count);

        Ok(byte_count)
    }
}

#[derive(Debug, Clone, PartialEq)]
/// The [`ResourceRecord`] data.
pub enum RData {
    /// RFC1035 - a host address.
    A(Ipv4Addr),

    /// RFC3596 - a single IPv6 address.
    AAAA(Ipv6Addr),

    /// RFC1035 - an authoritative name server.
    NS(String),

    /// RFC1035 - the canonical name for an alias.
    CNAME(String),

    /// RFC1035 - a domain name pointer.
    PTR(String),

    /// RFC1035 - mail exchange: preference and exchange host.
    MX(u16, String),

    /// RFC1035 - start of authority: MNAME, RNAME, SERIAL, REFRESH, RETRY,
    /// EXPIRE and MINIMUM.
    SOA(String, String, u32, u32, u32, u32, u32),

    /// RFC1035 - one or more character strings.
    TXT(Vec<String>),

    /// A record of the given type whose rdata is empty. For address types
    /// this is a record that names no address at all.
    Unset(Type),

    /// Raw rdata for any type not decoded above - the u16 is the record type.
    Raw(u16, Vec<u8>),
}

impl RData {
    pub fn rtype(&self) -> Type {
        match self {
            RData::A(_) => Type::A,
            RData::AAAA(_) => Type::AAAA,
            RData::NS(_) => Type::NS,
            RData::CNAME(_) => Type::CNAME,
            RData::PTR(_) => Type::PTR,
            RData::MX(_, _) => Type::MX,
            RData::SOA(..) => Type::SOA,
            RData::TXT(_) => Type::TXT,
            RData::Unset(t) => *t,
            RData::Raw(i, _) => Type::from(*i),
        }
    }

    /// The address carried by an A or AAAA record, if any.
    pub fn address(&self) -> Option<std::net::IpAddr> {
        match self {
            RData::A(v4) => Some((*v4).into()),
            RData::AAAA(v6) => Some((*v6).into()),
            _ => None,
        }
    }

    #[instrument(skip(buf))]
    fn to_bytes(&self, buf: &mut Vec<u8>) -> Result<usize> {
        trace!("Writing {}", self);

        match self {
            RData::A(v4) => {
                buf.extend_from_slice(&v4.octets());
                Ok(4)
            }
            RData::AAAA(v6) => {
                buf.extend_from_slice(&v6.octets());
                Ok(16)
            }
            RData::NS(name) | RData::CNAME(name) | RData::PTR(name) => encode_name(name, buf),
            RData::MX(preference, exchange) => {
                buf.extend_from_slice(&preference.to_be_bytes());
                Ok(2 + encode_name(exchange, buf)?)
            }
            RData::SOA(mname, rname, serial, refresh, retry, expire, minimum) => {
                let mut bytes_written = encode_name(mname, buf)?;
                bytes_written += encode_name(rname, buf)?;
                for field in [serial, refresh, retry, expire, minimum] {
                    buf.extend_from_slice(&field.to_be_bytes());
                }
                Ok(bytes_written + 20)
            }
            RData::TXT(strings) => {
                let mut bytes_written = 0;
                for s in strings {
                    // Character strings are at most 255 bytes each.
                    for chunk in s.as_bytes().chunks(255) {
                        buf.push(chunk.len() as u8);
                        buf.extend_from_slice(chunk);
                        bytes_written += 1 + chunk.len();
                    }
                }
                Ok(bytes_written)
            }
            RData::Unset(_) => Ok(0),
            RData::Raw(_, v) => {
                buf.extend_from_slice(v);
                Ok(v.len())
            }
        }
    }
}

impl fmt::Display for RData {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::A(v4) => write!(f, "A({})", v4),
            Self::AAAA(v6) => write!(f, "AAAA({})", v6),
            Self::NS(s) => write!(f, "NS({})", s),
            Self::CNAME(s) => write!(f, "CNAME({})", s),
            Self::PTR(s) => write!(f, "PTR({})", s),
            Self::MX(preference, exchange) => write!(f, "MX({} {})", preference, exchange),
            Self::SOA(mname, rname, serial, refresh, retry, expire, minimum) => write!(
                f,
                "SOA({}, {}, {}, {}, {}, {}, {})",
                mname, rname, serial, refresh, retry, expire, minimum
            ),
            Self::TXT(strings) => write!(f, "TXT({:?})", strings),
            Self::Unset(t) => write!(f, "{}(<unset>)", t),
            Self::Raw(id, v) => write!(f, "Raw({}: {:?})", id, v),
        }
    }
}
