use crate::{Class, Header, Message, OpCode, Question, RCode, RData, ResourceRecord, Type};

#[derive(Debug, Default)]
pub struct MessageBuilder {
    header: Header,
    questions: Vec<Question>,
    answers: Vec<ResourceRecord>,
    name_servers: Vec<ResourceRecord>,
    additional_records: Vec<ResourceRecord>,
}

impl MessageBuilder {
    pub fn new() -> Self {
        Default::default()
    }

    /// A standard recursive query for a single name and type.
    pub fn query(id: u16, name: &str, q_type: Type) -> Self {
        Self::new()
            .id(id)
            .rd(true)
            .question(QuestionBuilder::new().name(name).q_type(q_type).build())
    }

    pub fn build(self) -> Message {
        Message {
            header: self.header,
            questions: self.questions,
            answers: self.answers,
            name_servers: self.name_servers,
            additional_records: self.additional_records,
        }
    }

    pub fn id(mut self, id: u16) -> Self {
        self.header.id = id;
        self
    }

    pub fn qr(mut self, qr: bool) -> Self {
        self.header.qr = qr;
        self
    }

    pub fn opcode(mut self, opcode: OpCode) -> Self {
        self.header.opcode = opcode;
        self
    }

    pub fn aa(mut self, aa: bool) -> Self {
        self.header.aa = aa;
        self
    }

    pub fn rd(mut self, rd: bool) -> Self {
        self.header.rd = rd;
        self
    }

    pub fn ra(mut self, ra: bool) -> Self {
        self.header.ra = ra;
        self
    }

    pub fn ad(mut self, ad: bool) -> Self {
        self.header.ad = ad;
        self
    }

    pub fn rcode(mut self, rcode: RCode) -> Self {
        self.header.rcode = rcode;
        self
    }

    pub fn question(mut self, question: Question) -> Self {
        self.questions.push(question);
        self
    }

    pub fn answer(mut self, answer: ResourceRecord) -> Self {
        self.answers.push(answer);
        self
    }

    pub fn name_server(mut self, ns: ResourceRecord) -> Self {
        self.name_servers.push(ns);
        self
    }

    pub fn additional_record(mut self, ar: ResourceRecord) -> Self {
        self.additional_records.push(ar);
        self
    }
}

#[derive(Debug, Default)]
pub struct QuestionBuilder {
    question: Question,
}

impl QuestionBuilder {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn build(self) -> Question {
        self.question
    }

    pub fn name(mut self, name: &str) -> Self {
        self.question.q_name = name.to_string();
        self
    }

    pub fn q_type(mut self, t: Type) -> Self {
        self.question.q_type = t;
        self
    }

    pub fn class(mut self, cls: Class) -> Self {
        self.question.q_class = cls;
        self
    }
}

#[derive(Debug)]
pub struct ResourceRecordBuilder {
    record: ResourceRecord,
}

impl ResourceRecordBuilder {
    pub fn new(name: &str, data: RData) -> Self {
        Self {
            record: ResourceRecord {
                name: name.to_string(),
                data,
                class: Class::IN,
                ttl: 0,
            },
        }
    }

    pub fn build(self) -> ResourceRecord {
        self.record
    }

    pub fn class(mut self, cls: Class) -> Self {
        self.record.class = cls;
        self
    }

    pub fn ttl(mut self, ttl: u32) -> Self {
        self.record.ttl = ttl;
        self
    }
}
