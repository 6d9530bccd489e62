//! Run-time field values and records.

use crate::core::rollup::SubTransaction;
use crate::types::asset::AssetId;
use crate::types::decimal::Decimal;
use crate::types::keys::{Pubkey, Pubkeyhash, Seckey, Signature, Subpubkeyhash};
use crate::types::uint256::Uint256;
use std::collections::BTreeMap;

/// A field value. Native-width integers share `Int`; 256-bit integers are
/// a separate variant and are never coerced into or out of it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Value {
    Int(u128),
    Uint256(Uint256),
    Decimal(Decimal),
    Binary(Vec<u8>),
    Text(String),
    Bool(bool),
    Seckey(Seckey),
    Pubkey(Pubkey),
    Pubkeyhash(Pubkeyhash),
    Subpubkeyhash(Subpubkeyhash),
    Signature(Signature),
    Asset(AssetId),
    List(Vec<Value>),
    Record(Record),
    Rollup(Vec<SubTransaction>),
}

impl Value {
    /// Variant name used in type errors.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Int(_) => "integer",
            Value::Uint256(_) => "uint256",
            Value::Decimal(_) => "decimal",
            Value::Binary(_) => "binary",
            Value::Text(_) => "string",
            Value::Bool(_) => "boolean",
            Value::Seckey(_) => "seckey",
            Value::Pubkey(_) => "pubkey",
            Value::Pubkeyhash(_) => "pubkeyhash",
            Value::Subpubkeyhash(_) => "subpubkeyhash",
            Value::Signature(_) => "signature",
            Value::Asset(_) => "asset",
            Value::List(_) => "list",
            Value::Record(_) => "record",
            Value::Rollup(_) => "rollup",
        }
    }

    pub fn as_int(&self) -> Option<u128> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_asset(&self) -> Option<&AssetId> {
        match self {
            Value::Asset(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_signature(&self) -> Option<&Signature> {
        match self {
            Value::Signature(s) => Some(s),
            _ => None,
        }
    }
}

macro_rules! value_from {
    ($($t:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$t> for Value {
                fn from(value: $t) -> Self {
                    Value::$variant(value)
                }
            }
        )*
    };
}

value_from!(
    Uint256 => Uint256,
    Decimal => Decimal,
    Vec<u8> => Binary,
    String => Text,
    bool => Bool,
    Seckey => Seckey,
    Pubkey => Pubkey,
    Pubkeyhash => Pubkeyhash,
    Subpubkeyhash => Subpubkeyhash,
    Signature => Signature,
    AssetId => Asset,
    Record => Record,
    Vec<SubTransaction> => Rollup,
);

macro_rules! value_from_int {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Value {
                fn from(value: $t) -> Self {
                    Value::Int(value.into())
                }
            }
        )*
    };
}

value_from_int!(u8, u16, u32, u64, u128);

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

/// Field name to value map.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Record(BTreeMap<String, Value>);

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`Record::insert`].
    pub fn with(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: &str, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(name.to_string(), value.into())
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.0.remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integers_collapse_to_int() {
        assert_eq!(Value::from(7u8), Value::Int(7));
        assert_eq!(Value::from(u64::MAX), Value::Int(u64::MAX as u128));
        assert_eq!(Value::from(Uint256::new(7)).kind(), "uint256");
    }

    #[test]
    fn record_builder() {
        let record = Record::new().with("amount", 5u64).with("memo", "hi");
        assert_eq!(record.len(), 2);
        assert_eq!(record.get("amount").and_then(Value::as_int), Some(5));
        assert_eq!(record.get("memo").and_then(Value::as_text), Some("hi"));
        assert!(!record.contains("to"));
    }
}
