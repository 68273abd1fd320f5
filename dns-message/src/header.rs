use crate::{MessageError, Result};
use std::fmt;
use tracing::{instrument, trace};

const QR: u16 = 1 << 15;
const AA: u16 = 1 << 10;
const TC: u16 = 1 << 9;
const RD: u16 = 1 << 8;
const RA: u16 = 1 << 7;
const AD: u16 = 1 << 5;
const CD: u16 = 1 << 4;

#[derive(Debug, Clone, Default, PartialEq)]
/// The DNS Message Header as per RFC1035 and RFC2535.
///
/// The section counts are not stored here, they are derived from the
/// [`crate::Message`] sections when it is serialized.
pub struct Header {
    /// RFC1035 - A 16 bit identifier assigned by the program that generates any
    /// kind of query. This identifier is copied into the corresponding reply
    /// and is how the requester matches replies to outstanding queries.
    pub id: u16,

    /// RFC1035 - Whether this message is a query (false) or a response (true).
    pub qr: bool,

    /// RFC1035 - The kind of query in this message, copied into the response.
    pub opcode: OpCode,

    /// RFC1035 - Authoritative Answer - valid in responses, specifies that the
    /// responding name server is an authority for the domain name in the
    /// question section.
    pub aa: bool,

    /// RFC1035 - TrunCation.
    pub tc: bool,

    /// RFC1035 - Recursion Desired - set in a query and copied into the
    /// response.
    pub rd: bool,

    /// RFC1035 - Recursion Available.
    pub ra: bool,

    /// RFC2535 - Authentic Data.
    pub ad: bool,

    /// RFC2535 - Checking Disabled.
    pub cd: bool,

    /// RFC1035 - Response code.
    pub rcode: RCode,
}

impl Header {
    pub(crate) fn from_flags(id: u16, flags: u16) -> Self {
        Header {
            id,
            qr: flags & QR != 0,
            opcode: OpCode::from(((flags >> 11) & 0xf) as u8),
            aa: flags & AA != 0,
            tc: flags & TC != 0,
            rd: flags & RD != 0,
            ra: flags & RA != 0,
            ad: flags & AD != 0,
            cd: flags & CD != 0,
            rcode: RCode::from((flags & 0xf) as u8),
        }
    }

    /// Packs the second 16 bits of the header.
    pub(crate) fn flags(&self) -> Result<u16> {
        let mut flags = u16::from(self.opcode.as_u8()?) << 11;
        for (set, bit) in [
            (self.qr, QR),
            (self.aa, AA),
            (self.tc, TC),
            (self.rd, RD),
            (self.ra, RA),
            (self.ad, AD),
            (self.cd, CD),
        ] {
            if set {
                flags |= bit;
            }
        }
        Ok(flags | u16::from(self.rcode.as_u8() & 0xf))
    }

    #[instrument(skip(buf))]
    pub(crate) fn to_bytes(&self, counts: [u16; 4], buf: &mut Vec<u8>) -> Result<usize> {
        buf.extend_from_slice(&self.id.to_be_bytes());
        buf.extend_from_slice(&self.flags()?.to_be_bytes());
        for count in counts.iter() {
            buf.extend_from_slice(&count.to_be_bytes());
        }

        trace!("Wrote 12 bytes");

        Ok(12)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
/// The kind of query in a message.
pub enum OpCode {
    /// A standard query.
    #[default]
    Query,

    /// An inverse query.
    IQuery,

    /// A server status request.
    Status,

    /// Any other OpCode (contained within).
    Unknown(u8),
}

impl OpCode {
    pub(crate) fn as_u8(&self) -> Result<u8> {
        match self {
            OpCode::Query => Ok(0),
            OpCode::IQuery => Ok(1),
            OpCode::Status => Ok(2),
            // OpCodes can only be 4 bits wide.
            OpCode::Unknown(opcode) if *opcode > 0xf => {
                Err(MessageError::ReservedOpCode(*opcode))
            }
            OpCode::Unknown(opcode) => Ok(*opcode),
        }
    }
}

impl From<u8> for OpCode {
    fn from(val: u8) -> Self {
        match val {
            0 => OpCode::Query,
            1 => OpCode::IQuery,
            2 => OpCode::Status,
            n => OpCode::Unknown(n),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
/// Response code - this 4 bit field is set as part of responses.
pub enum RCode {
    /// No error condition.
    #[default]
    NoError,

    /// The name server was unable to interpret the query.
    FormatError,

    /// The name server was unable to process this query due to a problem with
    /// the name server.
    ServerFailure,

    /// The domain name referenced in the query does not exist (NXDOMAIN).
    NameError,

    /// The name server does not support the requested kind of query.
    NotImplemented,

    /// The name server refuses to perform the specified operation for policy
    /// reasons.
    Refused,

    /// The response code was unknown (contained within).
    Unknown(u8),
}

impl RCode {
    pub fn as_u8(&self) -> u8 {
        match self {
            RCode::NoError => 0,
            RCode::FormatError => 1,
            RCode::ServerFailure => 2,
            RCode::NameError => 3,
            RCode::NotImplemented => 4,
            RCode::Refused => 5,
            RCode::Unknown(i) => *i,
        }
    }
}

impl From<u8> for RCode {
    fn from(val: u8) -> Self {
        match val {
            0 => RCode::NoError,
            1 => RCode::FormatError,
            2 => RCode::ServerFailure,
            3 => RCode::NameError,
            4 => RCode::NotImplemented,
            5 => RCode::Refused,
            n => RCode::Unknown(n),
        }
    }
}

impl fmt::Display for RCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RCode::NoError => write!(f, "NOERROR"),
            RCode::FormatError => write!(f, "FORMERR"),
            RCode::ServerFailure => write!(f, "SERVFAIL"),
            RCode::NameError => write!(f, "NXDOMAIN"),
            RCode::NotImplemented => write!(f, "NOTIMP"),
            RCode::Refused => write!(f, "REFUSED"),
            RCode::Unknown(i) => write!(f, "RCODE{}", i),
        }
    }
}
