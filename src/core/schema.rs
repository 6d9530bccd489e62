//! Declarative record schemas.
//!
//! A [`Schema`] is an ordered list of named, typed fields. Field order is
//! wire order. Optional fields are written only when present and carry no
//! presence flag, so they belong at the end of a schema.

use crate::types::stream::StreamError;
use chainwire_derive::Error;
use std::fmt;
use std::str::FromStr;

/// Errors raised while storing or loading records.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("field `{field}` expects {expected}, got {found}")]
    TypeMismatch {
        field: String,
        expected: String,
        found: &'static str,
    },

    #[error("field `{field}` value {value} is out of range for {expected}")]
    OutOfRange {
        field: String,
        expected: String,
        value: String,
    },

    #[error("missing required field `{field}` of type {expected}")]
    MissingField { field: String, expected: String },

    #[error("field `{field}` of type {expected} could not be read")]
    Unreadable {
        field: String,
        expected: String,
        #[source]
        source: StreamError,
    },

    #[error("unknown field type `{0}`")]
    UnknownType(String),

    #[error("no schema for transaction type {0:#010x}")]
    UnknownTransactionType(u32),

    #[error("field `{0}`: rollups cannot be nested inside a rollup")]
    NestedRollup(String),

    #[error("field `{field}`: malformed rollup, {reason}")]
    MalformedRollup { field: String, reason: &'static str },
}

/// Semantic type of a field.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FieldType {
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Uint128,
    Uint256,
    Decimal,
    Binary,
    String,
    Boolean,
    /// Any scalar, written with its natural tag.
    Typeless,
    Seckey,
    Pubkey,
    Pubkeyhash,
    Subpubkeyhash,
    Signature,
    AssetId,
    /// Length-prefixed list of values of one type.
    List(Box<FieldType>),
    /// Length-prefixed list of records sharing a schema.
    Table(Schema),
    /// Batched sub-transactions grouped by asset.
    Rollup,
}

impl FieldType {
    /// Largest value of a native-width integer type.
    pub fn int_max(&self) -> Option<u128> {
        match self {
            FieldType::Uint8 => Some(u8::MAX.into()),
            FieldType::Uint16 => Some(u16::MAX.into()),
            FieldType::Uint32 => Some(u32::MAX.into()),
            FieldType::Uint64 => Some(u64::MAX.into()),
            FieldType::Uint128 => Some(u128::MAX),
            _ => None,
        }
    }

    pub fn list_of(inner: FieldType) -> FieldType {
        FieldType::List(Box::new(inner))
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self {
            FieldType::Uint8 => "uint8",
            FieldType::Uint16 => "uint16",
            FieldType::Uint32 => "uint32",
            FieldType::Uint64 => "uint64",
            FieldType::Uint128 => "uint128",
            FieldType::Uint256 => "uint256",
            FieldType::Decimal => "decimal",
            FieldType::Binary => "binary",
            FieldType::String => "string",
            FieldType::Boolean => "boolean",
            FieldType::Typeless => "typeless",
            FieldType::Seckey => "seckey",
            FieldType::Pubkey => "pubkey",
            FieldType::Pubkeyhash => "pubkeyhash",
            FieldType::Subpubkeyhash => "subpubkeyhash",
            FieldType::Signature => "signature",
            FieldType::AssetId => "asset",
            FieldType::Rollup => "rollup",
            FieldType::List(inner) => return write!(f, "[{inner}]"),
            FieldType::Table(schema) => return write!(f, "[{schema}]"),
        };
        f.write_str(tag)
    }
}

impl FromStr for FieldType {
    type Err = SchemaError;

    /// Parses a scalar tag or `[tag]` for a list.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tag = s.trim();
        if let Some(inner) = tag.strip_prefix('[').and_then(|t| t.strip_suffix(']')) {
            return Ok(FieldType::list_of(inner.parse()?));
        }
        Ok(match tag {
            "uint8" => FieldType::Uint8,
            "uint16" => FieldType::Uint16,
            "uint32" => FieldType::Uint32,
            "uint64" => FieldType::Uint64,
            "uint128" => FieldType::Uint128,
            "uint256" => FieldType::Uint256,
            "decimal" => FieldType::Decimal,
            "binary" => FieldType::Binary,
            "string" => FieldType::String,
            "boolean" => FieldType::Boolean,
            "typeless" => FieldType::Typeless,
            "seckey" => FieldType::Seckey,
            "pubkey" => FieldType::Pubkey,
            "pubkeyhash" => FieldType::Pubkeyhash,
            "subpubkeyhash" => FieldType::Subpubkeyhash,
            "signature" => FieldType::Signature,
            "asset" => FieldType::AssetId,
            "rollup" => FieldType::Rollup,
            other => return Err(SchemaError::UnknownType(other.to_string())),
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    pub ty: FieldType,
    pub optional: bool,
}

/// Ordered field list.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Schema {
    fields: Vec<Field>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(mut self, name: &str, ty: FieldType, optional: bool) -> Self {
        let field = Field {
            name: name.to_string(),
            ty,
            optional,
        };
        match self.fields.iter_mut().find(|f| f.name == name) {
            Some(existing) => *existing = field,
            None => self.fields.push(field),
        }
        self
    }

    /// Appends a required field, replacing any field of the same name in place.
    pub fn field(self, name: &str, ty: FieldType) -> Self {
        self.push(name, ty, false)
    }

    /// Appends an optional field, replacing any field of the same name in place.
    pub fn optional(self, name: &str, ty: FieldType) -> Self {
        self.push(name, ty, true)
    }

    /// Builds a schema from `(name, tag)` pairs. A trailing `?` on the tag
    /// marks the field optional.
    pub fn from_tags(tags: &[(&str, &str)]) -> Result<Self, SchemaError> {
        tags.iter().try_fold(Schema::new(), |schema, (name, tag)| {
            let tag = tag.trim();
            Ok(match tag.strip_suffix('?') {
                Some(base) => schema.optional(name, base.parse()?),
                None => schema.field(name, tag.parse()?),
            })
        })
    }

    /// `self` followed by the fields of `other`; fields of `other` replace
    /// same-named fields of `self`.
    pub fn merge(&self, other: &Schema) -> Schema {
        other.fields.iter().fold(self.clone(), |schema, f| {
            schema.push(&f.name, f.ty.clone(), f.optional)
        })
    }

    /// `self` minus every field whose name appears in `other`.
    pub fn without(&self, other: &Schema) -> Schema {
        Schema {
            fields: self
                .fields
                .iter()
                .filter(|f| !other.contains(&f.name))
                .cloned()
                .collect(),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn get(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, field) in self.fields.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}: {}", field.name, field.ty)?;
            if field.optional {
                write!(f, "?")?;
            }
        }
        write!(f, "}}")
    }
}
