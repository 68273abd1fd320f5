use dns_message::{Message, Type};

/// The part of a request the stage decides on.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    /// Fully qualified, always dot-terminated, in the case it was asked.
    pub name: String,
    pub kind: QueryKind,
    /// Leftmost label of `name`, lowercased.
    label: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryKind {
    AddressV4,
    AddressV6,
    Other(Type),
}

impl QueryKind {
    pub fn is_address(&self) -> bool {
        matches!(self, QueryKind::AddressV4 | QueryKind::AddressV6)
    }
}

impl From<Type> for QueryKind {
    fn from(t: Type) -> Self {
        match t {
            Type::A => QueryKind::AddressV4,
            Type::AAAA => QueryKind::AddressV6,
            other => QueryKind::Other(other),
        }
    }
}

impl Query {
    /// Classifies the first question of `message`; `None` when it has none.
    pub fn from_message(message: &Message) -> Option<Self> {
        let question = message.question()?;
        let mut name = question.q_name.clone();
        if !name.ends_with('.') {
            name.push('.');
        }
        let label = leftmost_label(&name).to_ascii_lowercase();
        Some(Query {
            name,
            kind: question.q_type.into(),
            label,
        })
    }

    /// The key records are matched against.
    pub fn leftmost_label(&self) -> &str {
        &self.label
    }
}

/// The first dot-separated segment of `name`: `host` for
/// `host.example.com.`. The rest of the name plays no part in matching.
pub fn leftmost_label(name: &str) -> &str {
    name.split('.').next().unwrap_or(name)
}
