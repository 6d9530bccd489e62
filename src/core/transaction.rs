//! Transaction schemas, type ids and record signing.
//!
//! Schemas are composed, not inherited: every transaction starts from
//! [`uniform`] (just the type id), signed transactions extend it into
//! [`authentic`], and concrete types merge their own fields on top.

use crate::core::codec::{SchemaLookup, load_with, store_with};
use crate::core::schema::{FieldType, Schema, SchemaError};
use crate::core::value::{Record, Value};
use crate::types::hash::{Hash, hash32};
use crate::types::keys::{Pubkey, Seckey, Signature};
use crate::types::stream::Stream;
use std::collections::HashMap;

pub const TRANSFER: &str = "transfer";
pub const ROLLUP: &str = "rollup";

/// Field excluded from the signing digest.
pub const SIGNATURE_FIELD: &str = "signature";
pub const TYPE_FIELD: &str = "type";

/// Stable 32-bit id of a transaction type name.
pub fn type_id(name: &str) -> u32 {
    u32::from_be_bytes(hash32(name.as_bytes()))
}

/// Fields shared by every transaction.
pub fn uniform() -> Schema {
    Schema::new().field(TYPE_FIELD, FieldType::Uint32)
}

/// Fields shared by signed transactions.
pub fn authentic() -> Schema {
    uniform()
        .field("asset", FieldType::AssetId)
        .field("nonce", FieldType::Uint64)
        .field(SIGNATURE_FIELD, FieldType::Signature)
}

pub fn transfer_schema() -> Schema {
    authentic().merge(
        &Schema::new()
            .field("to", FieldType::Subpubkeyhash)
            .field("amount", FieldType::Decimal)
            .optional("memo", FieldType::String),
    )
}

pub fn rollup_schema() -> Schema {
    authentic().merge(&Schema::new().field("transactions", FieldType::Rollup))
}

/// Known transaction types by id.
#[derive(Clone, Debug, Default)]
pub struct Registry {
    types: HashMap<u32, (String, Schema)>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in transfer and rollup types.
    pub fn standard() -> Self {
        Registry::new()
            .with(TRANSFER, transfer_schema())
            .with(ROLLUP, rollup_schema())
    }

    /// Registers `schema` under `name` and returns its type id.
    pub fn register(&mut self, name: &str, schema: Schema) -> u32 {
        let id = type_id(name);
        self.types.insert(id, (name.to_string(), schema));
        id
    }

    pub fn with(mut self, name: &str, schema: Schema) -> Self {
        self.register(name, schema);
        self
    }

    pub fn get(&self, type_id: u32) -> Option<&Schema> {
        self.types.get(&type_id).map(|(_, schema)| schema)
    }

    pub fn schema_of(&self, name: &str) -> Option<&Schema> {
        self.get(type_id(name))
    }

    /// Schema selected by the record's `type` field.
    fn schema_for(&self, record: &Record) -> Result<&Schema, SchemaError> {
        let id = match record.get(TYPE_FIELD) {
            Some(Value::Int(id)) => u32::try_from(*id).map_err(|_| SchemaError::OutOfRange {
                field: TYPE_FIELD.to_string(),
                expected: FieldType::Uint32.to_string(),
                value: id.to_string(),
            })?,
            Some(other) => {
                return Err(SchemaError::TypeMismatch {
                    field: TYPE_FIELD.to_string(),
                    expected: FieldType::Uint32.to_string(),
                    found: other.kind(),
                });
            }
            None => {
                return Err(SchemaError::MissingField {
                    field: TYPE_FIELD.to_string(),
                    expected: FieldType::Uint32.to_string(),
                });
            }
        };
        self.get(id).ok_or(SchemaError::UnknownTransactionType(id))
    }

    /// Stores a transaction under the schema named by its `type` field.
    pub fn store(&self, record: &Record) -> Result<Stream, SchemaError> {
        store_with(self.schema_for(record)?, record, self)
    }

    /// Reads the leading type id, then loads the whole transaction under its
    /// schema.
    pub fn load(&self, input: &mut Stream) -> Result<Record, SchemaError> {
        let start = input.seek();
        let header = load_with(&uniform(), input, self)?;
        input.set_seek(start);
        let schema = self.schema_for(&header)?;
        load_with(schema, input, self)
    }
}

impl SchemaLookup for Registry {
    fn lookup(&self, type_id: u32) -> Option<Schema> {
        self.get(type_id).cloned()
    }

    fn name(&self, type_id: u32) -> Option<String> {
        self.types.get(&type_id).map(|(name, _)| name.clone())
    }
}

/// Hash of the record stored without its signature field.
pub fn signing_digest(
    schema: &Schema,
    record: &Record,
    lookup: &dyn SchemaLookup,
) -> Result<Hash, SchemaError> {
    let unsigned = schema.without(&Schema::new().field(SIGNATURE_FIELD, FieldType::Signature));
    Ok(store_with(&unsigned, record, lookup)?.hash())
}

/// Signs `record` and stores the signature in its signature field.
///
/// Returns `Ok(None)` when the key cannot sign.
pub fn sign_record(
    seckey: &Seckey,
    schema: &Schema,
    record: &mut Record,
    lookup: &dyn SchemaLookup,
) -> Result<Option<Signature>, SchemaError> {
    let digest = signing_digest(schema, record, lookup)?;
    let signature = seckey.sign(&digest);
    if let Some(signature) = signature {
        record.insert(SIGNATURE_FIELD, signature);
    }
    Ok(signature)
}

/// Public key that signed `record`, if its signature recovers.
pub fn recover_record_signer(
    schema: &Schema,
    record: &Record,
    lookup: &dyn SchemaLookup,
) -> Result<Option<Pubkey>, SchemaError> {
    let Some(signature) = record.get(SIGNATURE_FIELD).and_then(Value::as_signature) else {
        return Ok(None);
    };
    let digest = signing_digest(schema, record, lookup)?;
    Ok(signature.recover(&digest))
}
