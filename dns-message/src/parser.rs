use crate::{Header, Message, MessageError, Question, RData, ResourceRecord, Result, Type};
use nom::bytes::complete::take;
use nom::number::complete::{be_u16, be_u32, be_u8};
use nom::IResult;
use std::collections::HashSet;
use std::net::{Ipv4Addr, Ipv6Addr};
use tracing::{instrument, trace};

/// The top two bits of a label length octet mark a compression pointer.
const POINTER_MASK: u8 = 0b1100_0000;

fn read_u8(input: &[u8]) -> IResult<&[u8], u8> {
    be_u8(input)
}

fn read_u16(input: &[u8]) -> IResult<&[u8], u16> {
    be_u16(input)
}

fn read_u32(input: &[u8]) -> IResult<&[u8], u32> {
    be_u32(input)
}

fn read_bytes(input: &[u8], count: usize) -> IResult<&[u8], &[u8]> {
    take(count)(input)
}

#[instrument(skip(input))]
fn read_header(input: &[u8]) -> IResult<&[u8], (Header, [u16; 4])> {
    trace!("reading header");
    let (input, id) = read_u16(input)?;
    let (input, flags) = read_u16(input)?;
    let (input, qd_count) = read_u16(input)?;
    let (input, an_count) = read_u16(input)?;
    let (input, ns_count) = read_u16(input)?;
    let (input, ar_count) = read_u16(input)?;

    Ok((
        input,
        (
            Header::from_flags(id, flags),
            [qd_count, an_count, ns_count, ar_count],
        ),
    ))
}

/// Reads a (possibly compressed) domain name starting at `input`. `message`
/// is the whole datagram, which compression pointers are offsets into.
fn read_name<'a>(message: &[u8], input: &'a [u8]) -> Result<(&'a [u8], String)> {
    let mut labels = Vec::new();
    let rest = read_labels(message, input, &mut labels, &mut HashSet::new())?;
    Ok((rest, labels.join(".")))
}

/// Appends the labels found at `input` to `labels`, following pointers. Every
/// pointer is followed at most once per name so a crafted loop is an error
/// rather than a hang.
fn read_labels<'a>(
    message: &[u8],
    mut input: &'a [u8],
    labels: &mut Vec<String>,
    seen_ptrs: &mut HashSet<u16>,
) -> Result<&'a [u8]> {
    loop {
        let (i, length) = read_u8(input)?;
        match length & POINTER_MASK {
            POINTER_MASK => {
                let (i, low) = read_u8(i)?;
                let offset = u16::from(length & !POINTER_MASK) << 8 | u16::from(low);
                trace!("Name pointer at offset: {}", offset);
                if !seen_ptrs.insert(offset) {
                    return Err(MessageError::CircularReference(offset));
                }
                let target = message
                    .get(offset as usize..)
                    .ok_or(MessageError::PointerOutOfBounds(offset))?;
                read_labels(message, target, labels, seen_ptrs)?;
                return Ok(i);
            }
            0 if length == 0 => return Ok(i),
            0 => {
                let (i, label) = read_bytes(i, length as usize)?;
                labels.push(String::from_utf8_lossy(label).into_owned());
                input = i;
            }
            _ => {
                return Err(MessageError::ParsingError(format!(
                    "Unsupported label type: {:#04x}",
                    length
                )))
            }
        }
    }
}

#[instrument(skip(message, input))]
fn read_question<'a>(message: &[u8], input: &'a [u8]) -> Result<(&'a [u8], Question)> {
    trace!("reading question");
    let (input, q_name) = read_name(message, input)?;
    let (input, q_type) = read_u16(input)?;
    let (input, q_class) = read_u16(input)?;

    Ok((
        input,
        Question {
            q_name,
            q_type: Type::from(q_type),
            q_class: q_class.into(),
        },
    ))
}

#[instrument(skip(message, input))]
fn read_resource_record<'a>(
    message: &[u8],
    input: &'a [u8],
) -> Result<(&'a [u8], ResourceRecord)> {
    trace!("reading resource record");
    let (input, name) = read_name(message, input)?;
    let (input, rtype) = read_u16(input)?;
    let (input, class) = read_u16(input)?;
    let (input, ttl) = read_u32(input)?;
    let (input, rdlength) = read_u16(input)?;

    trace!("Found rdata of length: {}", rdlength);

    let (input, rdata) = read_bytes(input, rdlength as usize)?;
    let data = read_rdata(message, Type::from(rtype), rdata)?;

    trace!("Parsed rdata as {}", data);

    Ok((
        input,
        ResourceRecord {
            name,
            data,
            class: class.into(),
            ttl,
        },
    ))
}

fn read_rdata(message: &[u8], rtype: Type, rdata: &[u8]) -> Result<RData> {
    let invalid = |name: &'static str, expected: usize| MessageError::InvalidRData {
        rtype: name,
        expected,
        found: rdata.len(),
    };

    let data = match rtype {
        Type::A | Type::AAAA if rdata.is_empty() => RData::Unset(rtype),
        Type::A => {
            let octets = <[u8; 4]>::try_from(rdata).map_err(|_| invalid("A", 4))?;
            RData::A(Ipv4Addr::from(octets))
        }
        Type::AAAA => {
            let octets = <[u8; 16]>::try_from(rdata).map_err(|_| invalid("AAAA", 16))?;
            RData::AAAA(Ipv6Addr::from(octets))
        }
        Type::NS => RData::NS(read_name(message, rdata)?.1),
        Type::CNAME => RData::CNAME(read_name(message, rdata)?.1),
        Type::PTR => RData::PTR(read_name(message, rdata)?.1),
        Type::MX => {
            let (i, preference) = read_u16(rdata)?;
            RData::MX(preference, read_name(message, i)?.1)
        }
        Type::SOA => {
            let (i, mname) = read_name(message, rdata)?;
            let (i, rname) = read_name(message, i)?;
            let (i, serial) = read_u32(i)?;
            let (i, refresh) = read_u32(i)?;
            let (i, retry) = read_u32(i)?;
            let (i, expire) = read_u32(i)?;
            let (_, minimum) = read_u32(i)?;
            RData::SOA(mname, rname, serial, refresh, retry, expire, minimum)
        }
        Type::TXT => {
            let mut strings = Vec::new();
            let mut input = rdata;
            while !input.is_empty() {
                let (i, length) = read_u8(input)?;
                let (i, s) = read_bytes(i, length as usize)?;
                strings.push(String::from_utf8_lossy(s).into_owned());
                input = i;
            }
            RData::TXT(strings)
        }
        _ => RData::Raw(rtype.into(), rdata.to_vec()),
    };
    Ok(data)
}

#[instrument(skip(input))]
pub(crate) fn read_message(input: &[u8]) -> Result<Message> {
    trace!("reading message");
    let (mut rest, (header, [qd_count, an_count, ns_count, ar_count])) = read_header(input)?;

    let mut questions = Vec::new();
    for _ in 0..qd_count {
        let (i, question) = read_question(input, rest)?;
        rest = i;
        questions.push(question);
    }

    let mut sections: [Vec<ResourceRecord>; 3] = Default::default();
    for (section, count) in sections.iter_mut().zip([an_count, ns_count, ar_count]) {
        for _ in 0..count {
            let (i, record) = read_resource_record(input, rest)?;
            rest = i;
            section.push(record);
        }
    }

    if !rest.is_empty() {
        trace!("Ignoring {} trailing bytes", rest.len());
    }

    let [answers, name_servers, additional_records] = sections;
    Ok(Message {
        header,
        questions,
        answers,
        name_servers,
        additional_records,
    })
}
