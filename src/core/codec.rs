//! Schema-driven record codec.
//!
//! [`store`] walks a schema in field order and writes each value with the
//! stream writer for its declared type. Values of the wrong kind or
//! magnitude are rejected, never coerced. [`load`] mirrors it.
//!
//! Optional fields have no presence flag on the wire. A loader tries to read
//! them and rewinds on failure, so records stored under an older schema
//! without trailing optional fields still load.

use crate::core::rollup::{read_rollup, write_rollup};
use crate::core::schema::{Field, FieldType, Schema, SchemaError};
use crate::core::value::{Record, Value};
use crate::debug;
use crate::types::asset::AssetId;
use crate::types::convert::bytes_to_prefixed_hex;
use crate::types::encoding::{Decode, Encode};
use crate::types::keys::{Pubkey, Pubkeyhash, Seckey, Signature, Subpubkeyhash};
use crate::types::stream::{Primitive, Stream, StreamError};
use crate::types::uint256::Uint256;

/// Resolves transaction type ids to schemas for rollup fields.
pub trait SchemaLookup {
    fn lookup(&self, type_id: u32) -> Option<Schema>;

    /// Type name for a type id, if known.
    fn name(&self, _type_id: u32) -> Option<String> {
        None
    }
}

impl<F> SchemaLookup for F
where
    F: Fn(u32) -> Option<Schema>,
{
    fn lookup(&self, type_id: u32) -> Option<Schema> {
        self(type_id)
    }
}

fn no_types(_type_id: u32) -> Option<Schema> {
    None
}

/// Stores `record` under `schema`.
pub fn store(schema: &Schema, record: &Record) -> Result<Stream, SchemaError> {
    store_with(schema, record, &no_types)
}

/// Stores `record`, resolving rollup sub-transaction schemas via `lookup`.
pub fn store_with(
    schema: &Schema,
    record: &Record,
    lookup: &dyn SchemaLookup,
) -> Result<Stream, SchemaError> {
    let mut out = Stream::new();
    write_record(&mut out, schema, record, lookup)?;
    Ok(out)
}

/// Loads a record stored under `schema`.
pub fn load(schema: &Schema, input: &mut Stream) -> Result<Record, SchemaError> {
    load_with(schema, input, &no_types)
}

pub fn load_with(
    schema: &Schema,
    input: &mut Stream,
    lookup: &dyn SchemaLookup,
) -> Result<Record, SchemaError> {
    read_record(input, schema, lookup)
}

pub(crate) fn write_record(
    out: &mut Stream,
    schema: &Schema,
    record: &Record,
    lookup: &dyn SchemaLookup,
) -> Result<(), SchemaError> {
    for field in schema.fields() {
        match record.get(&field.name) {
            Some(value) => write_value(out, &field.name, &field.ty, value, schema, lookup)?,
            None if field.optional => {}
            None => {
                return Err(SchemaError::MissingField {
                    field: field.name.clone(),
                    expected: field.ty.to_string(),
                });
            }
        }
    }
    Ok(())
}

fn mismatch(name: &str, ty: &FieldType, value: &Value) -> SchemaError {
    SchemaError::TypeMismatch {
        field: name.to_string(),
        expected: ty.to_string(),
        found: value.kind(),
    }
}

/// Refuses handles that [`AssetId::is_valid`] rejects; they would not load back.
pub(crate) fn check_asset(name: &str, asset: &AssetId) -> Result<(), SchemaError> {
    if asset.is_valid() {
        return Ok(());
    }
    Err(SchemaError::OutOfRange {
        field: name.to_string(),
        expected: FieldType::AssetId.to_string(),
        value: asset.to_string(),
    })
}

fn write_value(
    out: &mut Stream,
    name: &str,
    ty: &FieldType,
    value: &Value,
    schema: &Schema,
    lookup: &dyn SchemaLookup,
) -> Result<(), SchemaError> {
    match (ty, value) {
        (_, Value::Int(n)) if ty.int_max().is_some() => {
            if ty.int_max().is_some_and(|max| *n > max) {
                return Err(SchemaError::OutOfRange {
                    field: name.to_string(),
                    expected: ty.to_string(),
                    value: n.to_string(),
                });
            }
            out.write_uint(&Uint256::from(*n));
        }
        (FieldType::Uint256, Value::Uint256(v)) => out.write_uint(v),
        (FieldType::Decimal, Value::Decimal(d)) => out.write_decimal(d),
        (FieldType::Binary, Value::Binary(b)) => out.write_bytes(b),
        (FieldType::String, Value::Text(s)) => out.write_string(s),
        (FieldType::Boolean, Value::Bool(b)) => out.write_bool(*b),
        (FieldType::Seckey, Value::Seckey(k)) => k.encode(out),
        (FieldType::Pubkey, Value::Pubkey(k)) => k.encode(out),
        (FieldType::Pubkeyhash, Value::Pubkeyhash(h)) => h.encode(out),
        (FieldType::Subpubkeyhash, Value::Subpubkeyhash(h)) => h.encode(out),
        (FieldType::Signature, Value::Signature(s)) => s.encode(out),
        (FieldType::AssetId, Value::Asset(a)) => {
            check_asset(name, a)?;
            a.encode(out);
        }
        (FieldType::Typeless, _) => write_typeless(out, name, value)?,
        (FieldType::List(inner), Value::List(items)) => {
            out.write_u64(items.len() as u64);
            for item in items {
                write_value(out, name, inner, item, schema, lookup)?;
            }
        }
        (FieldType::Table(sub), Value::List(rows)) => {
            out.write_u64(rows.len() as u64);
            for row in rows {
                match row {
                    Value::Record(record) => write_record(out, sub, record, lookup)?,
                    other => return Err(mismatch(name, ty, other)),
                }
            }
        }
        (FieldType::Rollup, Value::Rollup(txs)) => write_rollup(out, name, txs, schema, lookup)?,
        _ => return Err(mismatch(name, ty, value)),
    }
    Ok(())
}

fn write_typeless(out: &mut Stream, name: &str, value: &Value) -> Result<(), SchemaError> {
    match value {
        Value::Int(n) => out.write_uint(&Uint256::from(*n)),
        Value::Uint256(v) => out.write_uint(v),
        Value::Decimal(d) => out.write_decimal(d),
        Value::Binary(b) => out.write_bytes(b),
        Value::Text(s) => out.write_string(s),
        Value::Bool(b) => out.write_bool(*b),
        Value::Seckey(k) => k.encode(out),
        Value::Pubkey(k) => k.encode(out),
        Value::Pubkeyhash(h) => h.encode(out),
        Value::Subpubkeyhash(h) => h.encode(out),
        Value::Signature(s) => s.encode(out),
        Value::Asset(a) => {
            check_asset(name, a)?;
            a.encode(out);
        }
        Value::List(_) | Value::Record(_) | Value::Rollup(_) => {
            return Err(mismatch(name, &FieldType::Typeless, value));
        }
    }
    Ok(())
}

pub(crate) fn read_record(
    input: &mut Stream,
    schema: &Schema,
    lookup: &dyn SchemaLookup,
) -> Result<Record, SchemaError> {
    let mut record = Record::new();
    for field in schema.fields() {
        if let Some(value) = read_field(input, field, schema, lookup)? {
            record.insert(&field.name, value);
        }
    }
    Ok(record)
}

fn read_field(
    input: &mut Stream,
    field: &Field,
    schema: &Schema,
    lookup: &dyn SchemaLookup,
) -> Result<Option<Value>, SchemaError> {
    if !field.optional {
        return read_value(input, &field.name, &field.ty, schema, lookup).map(Some);
    }
    let start = input.seek();
    match read_value(input, &field.name, &field.ty, schema, lookup) {
        Ok(value) => Ok(Some(value)),
        Err(err) => {
            debug!("optional field `{}` absent: {err}", field.name);
            input.set_seek(start);
            Ok(None)
        }
    }
}

fn unreadable<'a>(name: &'a str, ty: &'a FieldType) -> impl FnOnce(StreamError) -> SchemaError + 'a {
    move |source| SchemaError::Unreadable {
        field: name.to_string(),
        expected: ty.to_string(),
        source,
    }
}

fn decode<T: Decode>(input: &mut Stream, name: &str, ty: &FieldType) -> Result<T, SchemaError> {
    T::decode(input).map_err(unreadable(name, ty))
}

fn read_count(input: &mut Stream, name: &str, ty: &FieldType) -> Result<u64, SchemaError> {
    input.read_u64().map_err(unreadable(name, ty))
}

fn read_value(
    input: &mut Stream,
    name: &str,
    ty: &FieldType,
    schema: &Schema,
    lookup: &dyn SchemaLookup,
) -> Result<Value, SchemaError> {
    Ok(match ty {
        FieldType::Uint8 => Value::Int(decode::<u8>(input, name, ty)?.into()),
        FieldType::Uint16 => Value::Int(decode::<u16>(input, name, ty)?.into()),
        FieldType::Uint32 => Value::Int(decode::<u32>(input, name, ty)?.into()),
        FieldType::Uint64 => Value::Int(decode::<u64>(input, name, ty)?.into()),
        FieldType::Uint128 => Value::Int(decode::<u128>(input, name, ty)?),
        FieldType::Uint256 => Value::Uint256(decode(input, name, ty)?),
        FieldType::Decimal => Value::Decimal(decode(input, name, ty)?),
        FieldType::Binary => Value::Binary(decode(input, name, ty)?),
        FieldType::String => Value::Text(decode(input, name, ty)?),
        FieldType::Boolean => Value::Bool(decode(input, name, ty)?),
        FieldType::Seckey => Value::Seckey(decode::<Seckey>(input, name, ty)?),
        FieldType::Pubkey => Value::Pubkey(decode::<Pubkey>(input, name, ty)?),
        FieldType::Pubkeyhash => Value::Pubkeyhash(decode::<Pubkeyhash>(input, name, ty)?),
        FieldType::Subpubkeyhash => {
            Value::Subpubkeyhash(decode::<Subpubkeyhash>(input, name, ty)?)
        }
        FieldType::Signature => Value::Signature(decode::<Signature>(input, name, ty)?),
        FieldType::AssetId => Value::Asset(decode::<AssetId>(input, name, ty)?),
        FieldType::Typeless => read_typeless(input, name, ty)?,
        FieldType::List(inner) => {
            let count = read_count(input, name, ty)?;
            let mut items = Vec::new();
            for _ in 0..count {
                items.push(read_value(input, name, inner, schema, lookup)?);
            }
            Value::List(items)
        }
        FieldType::Table(sub) => {
            let count = read_count(input, name, ty)?;
            let mut rows = Vec::new();
            for _ in 0..count {
                rows.push(Value::Record(read_record(input, sub, lookup)?));
            }
            Value::List(rows)
        }
        FieldType::Rollup => Value::Rollup(read_rollup(input, name, schema, lookup)?),
    })
}

/// Maps whatever tag is found to its natural value: integers that fit
/// `u128` become `Int`, raw strings become text when they are UTF-8.
fn read_typeless(input: &mut Stream, name: &str, ty: &FieldType) -> Result<Value, SchemaError> {
    let primitive = input.read_primitive().map_err(unreadable(name, ty))?;
    Ok(match primitive {
        Primitive::Uint(v) => match v.to_u128() {
            Some(n) => Value::Int(n),
            None => Value::Uint256(v),
        },
        Primitive::Decimal(d) => Value::Decimal(d),
        Primitive::Bool(b) => Value::Bool(b),
        Primitive::Bytes(bytes) => match String::from_utf8(bytes) {
            Ok(text) => Value::Text(text),
            Err(err) => Value::Binary(err.into_bytes()),
        },
        Primitive::HexBytes(bytes) => Value::Text(bytes_to_prefixed_hex(&bytes)),
    })
}
