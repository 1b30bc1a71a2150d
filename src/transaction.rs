//! Ledger transactions and their signature components

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub type Transactions = Vec<Transaction>;

/// A transaction as stored inside a block.
///
/// The record is kept verbatim: key order, fields this crate does not know
/// about and explicit `null`s all survive, because the owning block's hash
/// covers the stored JSON text of its transaction list. The identity fields
/// (sender, receiver, value, nonce, v, r, s) are read through accessors and
/// are only required when the transaction itself is hashed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Transaction {
    record: Value,
}

impl Transaction {
    /// A new record with keys in the order sender, receiver, value, nonce,
    /// v, r, s.
    pub fn new(
        sender: impl Into<String>,
        receiver: impl Into<String>,
        value: u64,
        nonce: u64,
        signature: Signature,
    ) -> Self {
        let mut record = Map::new();
        record.insert("sender".to_string(), Value::String(sender.into()));
        record.insert("receiver".to_string(), Value::String(receiver.into()));
        record.insert("value".to_string(), Value::from(value));
        record.insert("nonce".to_string(), Value::from(nonce));
        record.insert("v".to_string(), Value::String(signature.v));
        record.insert("r".to_string(), Value::String(signature.r));
        record.insert("s".to_string(), Value::String(signature.s));
        Transaction {
            record: Value::Object(record),
        }
    }

    pub fn from_record(record: Value) -> Self {
        Transaction { record }
    }

    pub fn record(&self) -> &Value {
        &self.record
    }

    /// A field of the record. Absent keys and explicit `null` both read as `None`.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.record.get(name).filter(|value| !value.is_null())
    }

    pub fn str_field(&self, name: &str) -> Option<&str> {
        self.field(name).and_then(Value::as_str)
    }

    pub fn sender(&self) -> Option<&str> {
        self.str_field("sender")
    }

    pub fn receiver(&self) -> Option<&str> {
        self.str_field("receiver")
    }

    pub fn value(&self) -> Option<u64> {
        self.field("value").and_then(Value::as_u64)
    }

    pub fn nonce(&self) -> Option<u64> {
        self.field("nonce").and_then(Value::as_u64)
    }

    /// Set a field, keeping its position when the key already exists.
    /// Records that are not JSON objects are left untouched.
    pub fn set_field(&mut self, name: &str, value: impl Into<Value>) {
        if let Value::Object(record) = &mut self.record {
            record.insert(name.to_string(), value.into());
        }
    }

    pub fn remove_field(&mut self, name: &str) -> Option<Value> {
        match &mut self.record {
            Value::Object(record) => record.shift_remove(name),
            _ => None,
        }
    }

    /// Signature components, when all three are present as strings.
    pub fn signature(&self) -> Option<Signature> {
        match (self.str_field("v"), self.str_field("r"), self.str_field("s")) {
            (Some(v), Some(r), Some(s)) => Some(Signature::new(v, r, s)),
            _ => None,
        }
    }
}

/// Recoverable ECDSA signature components, carried as opaque strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    pub v: String,
    pub r: String,
    pub s: String,
}

impl Signature {
    pub fn new(v: impl Into<String>, r: impl Into<String>, s: impl Into<String>) -> Self {
        Signature {
            v: v.into(),
            r: r.into(),
            s: s.into(),
        }
    }
}
