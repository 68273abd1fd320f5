use crate::{parser, Header, Question, RCode, ResourceRecord, Result};
use std::fmt;
use tracing::{instrument, trace};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Message {
    pub header: Header,
    pub questions: Vec<Question>,
    pub answers: Vec<ResourceRecord>,
    pub name_servers: Vec<ResourceRecord>,
    pub additional_records: Vec<ResourceRecord>,
}

impl Message {
    /// Reads the u8 buffer and parses the DNS message from it.
    ///
    /// This includes the dereferencing of rfc1035 Message Compression pointers,
    /// and collapsing the names into strings.
    #[instrument(skip(input))]
    pub fn from_bytes(input: &[u8]) -> Result<Message> {
        let message = parser::read_message(input)?;

        trace!("Read input as: {}", message);

        Ok(message)
    }

    /// Serializes the Message to bytes into the provided buffer, returning the
    /// number of bytes written to the buffer.
    #[instrument(skip(buf))]
    pub fn to_bytes(&self, buf: &mut Vec<u8>) -> Result<usize> {
        let counts = [
            self.questions.len() as u16,
            self.answers.len() as u16,
            self.name_servers.len() as u16,
            self.additional_records.len() as u16,
        ];
        let mut byte_count = self.header.to_bytes(counts, buf)?;
        for q in self.questions.iter() {
            byte_count += q.to_bytes(buf)?;
        }
        for rr in self
            .answers
            .iter()
            .chain(self.name_servers.iter())
            .chain(self.additional_records.iter())
        {
            byte_count += rr.to_bytes(buf)?;
        }

        trace!("Wrote {} bytes", byte_count);

        Ok(byte_count)
    }

    /// The first question, which is the only one any real server looks at.
    pub fn question(&self) -> Option<&Question> {
        self.questions.first()
    }

    /// Starts a response to this message: same id, opcode, RD and CD bits and
    /// question section, with QR set and every other section empty.
    pub fn reply(&self) -> Message {
        Message {
            header: Header {
                id: self.header.id,
                qr: true,
                opcode: self.header.opcode,
                rd: self.header.rd,
                cd: self.header.cd,
                ..Default::default()
            },
            questions: self.questions.clone(),
            ..Default::default()
        }
    }

    /// A response to this message carrying only `rcode`.
    pub fn error_reply(&self, rcode: RCode) -> Message {
        let mut reply = self.reply();
        reply.header.rcode = rcode;
        reply
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Message(id:{}) - ", self.header.id)?;
        write!(f, "Query [")?;
        for (i, q) in self.questions.iter().enumerate() {
            if i != 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}({})", q.q_name, q.q_type)?;
        }
        write!(f, "]")?;
        if self.header.qr {
            write!(f, " - Response {} [", self.header.rcode)?;
            for (i, a) in self.answers.iter().enumerate() {
                if i != 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{} => {}", a.name, a.data)?;
            }
            write!(f, "]")?;
        }
        Ok(())
    }
}
