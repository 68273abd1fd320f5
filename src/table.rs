use serde::de::Error as _;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::trace;

/// Label to address, as resolved from a [`RecordSet`].
pub type AddressMap = HashMap<String, String>;

/// One entry of the record table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Record {
    /// A single label, compared against the leftmost label of the query.
    #[serde(default, alias = "Name", alias = "NAME")]
    pub name: String,

    /// IPv4 or IPv6 address in text form. Not validated until it is put in
    /// an answer.
    #[serde(
        default,
        rename = "ipaddress",
        alias = "IPAddress",
        alias = "IpAddress",
        alias = "ipAddress",
        alias = "IPADDRESS"
    )]
    pub address: String,
}

impl Record {
    pub fn new(name: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            address: address.into(),
        }
    }
}

/// The whole table, in file order:
///
/// ```json
/// { "records": [ { "name": "host", "ipaddress": "10.0.0.5" } ] }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct RecordSet {
    #[serde(default, alias = "Records")]
    pub records: Vec<Record>,
}

#[derive(Debug, Error)]
pub enum TableError {
    #[error("record table {} is unavailable: {source}", .path.display())]
    Unavailable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("record table {} is malformed: {source}", .path.display())]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl RecordSet {
    /// Parses a table. Only the object form is a table; arrays and scalars
    /// at the top level or in place of a record are rejected.
    pub fn from_json(bytes: &[u8]) -> serde_json::Result<Self> {
        let value: Value = serde_json::from_slice(bytes)?;
        if !is_table_shaped(&value) {
            return Err(serde_json::Error::custom(
                "expected an object with a list of record objects",
            ));
        }
        serde_json::from_value(value)
    }

    /// Reads and parses the table at `path`.
    pub async fn load(path: &Path) -> Result<Self, TableError> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|source| TableError::Unavailable {
                path: path.to_path_buf(),
                source,
            })?;

        let set = Self::from_json(&bytes).map_err(|source| TableError::Malformed {
            path: path.to_path_buf(),
            source,
        })?;

        trace!(path = %path.display(), records = set.records.len(), "loaded record table");

        Ok(set)
    }

    /// Folds the records into a map in file order, so when several records
    /// share a name the one furthest down the file wins.
    pub fn into_address_map(self) -> AddressMap {
        self.records
            .into_iter()
            .map(|r| (r.name, r.address))
            .collect()
    }
}

impl FromIterator<Record> for RecordSet {
    fn from_iter<I: IntoIterator<Item = Record>>(iter: I) -> Self {
        Self {
            records: iter.into_iter().collect(),
        }
    }
}

fn is_table_shaped(value: &Value) -> bool {
    let table = match value {
        Value::Object(table) => table,
        _ => return false,
    };
    table
        .iter()
        .filter(|(key, _)| key.as_str() == "records" || key.as_str() == "Records")
        .all(|(_, records)| match records {
            Value::Array(records) => records.iter().all(Value::is_object),
            _ => false,
        })
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_parse_table() {
        let set = RecordSet::from_json(
            br#"{ "records": [
                { "name": "host", "ipaddress": "10.0.0.5" },
                { "name": "v6", "ipaddress": "fd00::1" }
            ] }"#,
        )
        .unwrap();

        assert_eq!(
            set.records,
            vec![Record::new("host", "10.0.0.5"), Record::new("v6", "fd00::1")]
        );
    }

    #[test]
    fn test_missing_fields_default_to_empty() {
        let set = RecordSet::from_json(br#"{ "records": [ { "name": "host" } ], "extra": 1 }"#)
            .unwrap();
        assert_eq!(set.records, vec![Record::new("host", "")]);

        let set = RecordSet::from_json(b"{}").unwrap();
        assert!(set.records.is_empty());
    }

    #[test]
    fn test_malformed_table() {
        assert!(RecordSet::from_json(b"{ \"records\": [").is_err());
        assert!(RecordSet::from_json(b"[]").is_err());
        assert!(RecordSet::from_json(br#"[[["host","10.0.0.5"]]]"#).is_err());
        assert!(RecordSet::from_json(br#"{"records":[["host","10.0.0.5"]]}"#).is_err());
        assert!(RecordSet::from_json(br#"{"records":{"name":"host"}}"#).is_err());
        assert!(RecordSet::from_json(b"\"records\"").is_err());
    }

    #[test]
    fn test_capitalised_keys() {
        let set = RecordSet::from_json(
            br#"{ "Records": [ { "Name": "host", "IPAddress": "10.0.0.5" } ] }"#,
        )
        .unwrap();
        assert_eq!(set.records, vec![Record::new("host", "10.0.0.5")]);
    }

    #[test]
    fn test_last_record_wins() {
        let set: RecordSet = vec![
            Record::new("host", "10.0.0.1"),
            Record::new("other", "10.0.0.2"),
            Record::new("host", "10.0.0.3"),
        ]
        .into_iter()
        .collect();

        let map = set.into_address_map();
        assert_eq!(map.len(), 2);
        assert_eq!(map.get("host").map(String::as_str), Some("10.0.0.3"));
        assert_eq!(map.get("other").map(String::as_str), Some("10.0.0.2"));
        assert_eq!(map.get("missing"), None);
    }

    #[test]
    fn test_record_names_are_compared_exactly() {
        let map = RecordSet::from_iter(vec![
            Record::new("Host", "10.0.0.1"),
            Record::new("host", "10.0.0.2"),
        ])
        .into_address_map();
        assert_eq!(map.get("host").map(String::as_str), Some("10.0.0.2"));
        assert_eq!(map.get("Host").map(String::as_str), Some("10.0.0.1"));
    }

    #[tokio::test]
    async fn test_load_missing_file() {
        let err = RecordSet::load(Path::new("/nonexistent/records.json"))
            .await
            .unwrap_err();
        assert!(matches!(err, TableError::Unavailable { .. }));
    }
}
