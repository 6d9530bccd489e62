//! Rollup batches.
//!
//! A rollup field carries sub-transactions of mixed types. On the wire they
//! are grouped by asset, groups in ascending numeric asset id, so any
//! permutation of one batch encodes to the same bytes:
//!
//! ```text
//! uint group_count
//!   uint asset_id, uint tx_count
//!     bool internal, uint type_id,
//!     [uint nonce, bytes trimmed_signature]   (only when not internal)
//!     fields of the type schema not already in the outer schema
//! ```
//!
//! Decoding accepts only that canonical form: groups strictly ascending and
//! non-empty, and a signature on every transaction not flagged internal.

use crate::core::codec::{SchemaLookup, check_asset, read_record, write_record};
use crate::core::schema::{FieldType, Schema, SchemaError};
use crate::core::transaction::type_id;
use crate::core::value::{Record, Value};
use crate::types::asset::AssetId;
use crate::types::encoding::{Decode, Encode};
use crate::types::keys::Signature;
use crate::types::stream::{Stream, StreamError};
use crate::warn;
use std::collections::BTreeMap;

/// Sub-transaction type, by name or by numeric id.
#[derive(Clone, Debug)]
pub enum TransactionKind {
    Named(String),
    Id(u32),
}

impl TransactionKind {
    pub fn type_id(&self) -> u32 {
        match self {
            TransactionKind::Named(name) => type_id(name),
            TransactionKind::Id(id) => *id,
        }
    }
}

/// Kinds are equal when their type ids are.
impl PartialEq for TransactionKind {
    fn eq(&self, other: &Self) -> bool {
        self.type_id() == other.type_id()
    }
}

impl Eq for TransactionKind {}

impl From<&str> for TransactionKind {
    fn from(name: &str) -> Self {
        TransactionKind::Named(name.to_string())
    }
}

impl From<u32> for TransactionKind {
    fn from(id: u32) -> Self {
        TransactionKind::Id(id)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubTransaction {
    pub kind: TransactionKind,
    pub asset: AssetId,
    pub nonce: u64,
    /// All zero for internal transactions.
    pub signature: Signature,
    pub fields: Record,
}

impl SubTransaction {
    /// Unsigned (internal) sub-transaction.
    pub fn new(kind: impl Into<TransactionKind>, asset: AssetId) -> Self {
        SubTransaction {
            kind: kind.into(),
            asset,
            nonce: 0,
            signature: Signature::zero(),
            fields: Record::new(),
        }
    }

    pub fn signed(mut self, nonce: u64, signature: Signature) -> Self {
        self.nonce = nonce;
        self.signature = signature;
        self
    }

    pub fn with(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.fields.insert(name, value);
        self
    }

    /// Internal transactions carry no signature and are written without
    /// nonce and signature.
    pub fn is_internal(&self) -> bool {
        self.signature.is_zero()
    }
}

fn malformed(field: &str, reason: &'static str) -> SchemaError {
    SchemaError::MalformedRollup {
        field: field.to_string(),
        reason,
    }
}

fn header_error(field: &str, part: &str) -> impl FnOnce(StreamError) -> SchemaError {
    let field = field.to_string();
    let expected = format!("rollup {part}");
    move |source| SchemaError::Unreadable {
        field,
        expected,
        source,
    }
}

/// Schema of `type_id` minus the fields the outer transaction already carries.
fn sub_schema(
    field: &str,
    type_id: u32,
    outer: &Schema,
    lookup: &dyn SchemaLookup,
) -> Result<Schema, SchemaError> {
    let Some(full) = lookup.lookup(type_id) else {
        warn!("rollup `{field}`: no schema for transaction type {type_id:#010x}");
        return Err(SchemaError::UnknownTransactionType(type_id));
    };
    let schema = full.without(outer);
    if schema.fields().iter().any(|f| f.ty == FieldType::Rollup) {
        return Err(SchemaError::NestedRollup(field.to_string()));
    }
    Ok(schema)
}

pub(crate) fn write_rollup(
    out: &mut Stream,
    field: &str,
    txs: &[SubTransaction],
    outer: &Schema,
    lookup: &dyn SchemaLookup,
) -> Result<(), SchemaError> {
    let mut groups: BTreeMap<&AssetId, Vec<&SubTransaction>> = BTreeMap::new();
    for tx in txs {
        groups.entry(&tx.asset).or_default().push(tx);
    }

    out.write_u64(groups.len() as u64);
    for (asset, group) in groups {
        check_asset(field, asset)?;
        asset.encode(out);
        out.write_u64(group.len() as u64);
        for tx in group {
            let type_id = tx.kind.type_id();
            let schema = sub_schema(field, type_id, outer, lookup)?;
            out.write_bool(tx.is_internal());
            type_id.encode(out);
            if !tx.is_internal() {
                out.write_u64(tx.nonce);
                out.write_bytes(tx.signature.trimmed());
            }
            write_record(out, &schema, &tx.fields, lookup)?;
        }
    }
    Ok(())
}

pub(crate) fn read_rollup(
    input: &mut Stream,
    field: &str,
    outer: &Schema,
    lookup: &dyn SchemaLookup,
) -> Result<Vec<SubTransaction>, SchemaError> {
    let group_count = input.read_u64().map_err(header_error(field, "group count"))?;
    let mut txs = Vec::new();
    let mut previous: Option<AssetId> = None;
    for _ in 0..group_count {
        let asset = AssetId::decode(input).map_err(header_error(field, "asset"))?;
        if previous.as_ref().is_some_and(|p| asset <= *p) {
            return Err(malformed(field, "asset groups out of order"));
        }
        let tx_count = input.read_u64().map_err(header_error(field, "transaction count"))?;
        if tx_count == 0 {
            return Err(malformed(field, "empty asset group"));
        }
        for _ in 0..tx_count {
            let internal = input.read_bool().map_err(header_error(field, "internal flag"))?;
            let type_id = u32::decode(input).map_err(header_error(field, "type id"))?;
            let schema = sub_schema(field, type_id, outer, lookup)?;
            let (nonce, signature) = if internal {
                (0, Signature::zero())
            } else {
                let nonce = input.read_u64().map_err(header_error(field, "nonce"))?;
                let bytes = input.read_bytes().map_err(header_error(field, "signature"))?;
                if bytes.len() > Signature::LEN {
                    return Err(malformed(field, "signature longer than 65 bytes"));
                }
                let signature = Signature::from_trimmed(&bytes);
                if signature.is_zero() {
                    return Err(malformed(field, "signed transaction without signature"));
                }
                (nonce, signature)
            };
            let fields = read_record(input, &schema, lookup)?;
            let kind = lookup
                .name(type_id)
                .map_or(TransactionKind::Id(type_id), TransactionKind::Named);
            txs.push(SubTransaction {
                kind,
                asset: asset.clone(),
                nonce,
                signature,
                fields,
            });
        }
        previous = Some(asset);
    }
    Ok(txs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::codec::{load_with, store_with};
    use crate::core::transaction::{self, ROLLUP, Registry, TRANSFER};
    use crate::types::decimal::Decimal;
    use crate::types::keys::Subpubkeyhash;
    use crate::types::uint256::Uint256;
    use crate::utils::test_utils::utils::{fixed_seckey, test_digest};

    fn asset(id: u64) -> AssetId {
        AssetId::from_id(&Uint256::new(id)).unwrap()
    }

    fn transfer(asset_id: u64, amount: u64) -> SubTransaction {
        SubTransaction::new(TRANSFER, asset(asset_id))
            .with("to", Subpubkeyhash::new([amount as u8; 40]))
            .with("amount", Decimal::from(Uint256::new(amount)))
    }

    fn batch(txs: Vec<SubTransaction>) -> Record {
        Record::new()
            .with("type", transaction::type_id(ROLLUP))
            .with("asset", asset(1))
            .with("nonce", 1u64)
            .with("signature", Signature::zero())
            .with("transactions", txs)
    }

    fn encode(txs: Vec<SubTransaction>) -> Stream {
        store_with(&transaction::rollup_schema(), &batch(txs), &Registry::standard()).unwrap()
    }

    fn decode(mut stream: Stream) -> Vec<SubTransaction> {
        let record = load_with(&transaction::rollup_schema(), &mut stream, &Registry::standard()).unwrap();
        match record.get("transactions") {
            Some(Value::Rollup(txs)) => txs.clone(),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn groups_are_ordered_by_asset_id() {
        let txs = vec![transfer(5, 50), transfer(1, 10), transfer(3, 30)];
        let decoded = decode(encode(txs));
        let ids: Vec<Uint256> = decoded.iter().map(|tx| tx.asset.to_uint256()).collect();
        assert_eq!(ids, [Uint256::new(1), Uint256::new(3), Uint256::new(5)]);
    }

    #[test]
    fn permuted_batches_encode_identically() {
        let a = encode(vec![transfer(5, 50), transfer(1, 10), transfer(3, 30)]);
        let b = encode(vec![transfer(3, 30), transfer(5, 50), transfer(1, 10)]);
        assert_eq!(a.data(), b.data());
    }

    #[test]
    fn order_within_a_group_is_kept() {
        let txs = vec![transfer(2, 7), transfer(1, 1), transfer(2, 8)];
        let decoded = decode(encode(txs));
        let amount = |n: u64| Some(Value::Decimal(Decimal::from(Uint256::new(n))));
        assert_eq!(decoded[0].asset, asset(1));
        assert_eq!(decoded[1].asset, asset(2));
        assert_eq!(decoded[1].fields.get("amount").cloned(), amount(7));
        assert_eq!(decoded[2].fields.get("amount").cloned(), amount(8));
    }

    #[test]
    fn internal_transactions_omit_nonce_and_signature() {
        let internal = SubTransaction { nonce: 9, ..transfer(1, 10) };
        let signature = fixed_seckey().sign(&test_digest(1)).unwrap();
        let signed = transfer(1, 10).signed(9, signature);

        let short = encode(vec![internal]);
        let long = encode(vec![signed.clone()]);
        assert!(long.len() > short.len() + signature.trimmed().len());

        let decoded = decode(short);
        assert!(decoded[0].is_internal());
        assert_eq!(decoded[0].nonce, 0);

        let decoded = decode(long);
        assert_eq!(decoded[0], signed);
        assert_eq!(decoded[0].kind, TransactionKind::Named(TRANSFER.to_string()));
    }

    #[test]
    fn outer_fields_are_not_repeated() {
        let schema = sub_schema(
            "transactions",
            transaction::type_id(TRANSFER),
            &transaction::rollup_schema(),
            &Registry::standard(),
        )
        .unwrap();
        assert_eq!(schema.names().collect::<Vec<_>>(), ["to", "amount", "memo"]);
    }

    #[test]
    fn unknown_type_is_an_error() {
        let tx = SubTransaction::new(0xdead_beef_u32, asset(1));
        let err = store_with(&transaction::rollup_schema(), &batch(vec![tx]), &Registry::standard())
            .unwrap_err();
        assert!(matches!(err, SchemaError::UnknownTransactionType(0xdead_beef)));
    }

    #[test]
    fn nested_rollups_are_rejected() {
        let tx = SubTransaction::new(ROLLUP, asset(1));
        let outer = Schema::new().field("batch", FieldType::Rollup);
        let record = Record::new().with("batch", vec![tx]);
        let err = store_with(&outer, &record, &Registry::standard()).unwrap_err();
        assert!(matches!(err, SchemaError::NestedRollup(field) if field == "batch"));
    }

    /// Outer rollup fields up to, not including, the batch itself.
    fn header(group_count: u64) -> Stream {
        let mut out = store_with(&transaction::authentic(), &batch(vec![]), &Registry::standard()).unwrap();
        out.write_u64(group_count);
        out
    }

    /// Writes one transfer; `signature` of `None` marks it internal.
    fn write_transfer(out: &mut Stream, signature: Option<&[u8]>) {
        out.write_bool(signature.is_none());
        transaction::type_id(TRANSFER).encode(out);
        if let Some(signature) = signature {
            out.write_u64(9);
            out.write_bytes(signature);
        }
        Subpubkeyhash::new([1; 40]).encode(out);
        out.write_decimal(&Decimal::from(Uint256::new(10)));
    }

    fn write_group(out: &mut Stream, asset_id: u64, signatures: &[Option<&[u8]>]) {
        asset(asset_id).encode(out);
        out.write_u64(signatures.len() as u64);
        for signature in signatures {
            write_transfer(out, *signature);
        }
    }

    fn load_batch(mut stream: Stream) -> Result<Record, SchemaError> {
        load_with(&transaction::rollup_schema(), &mut stream, &Registry::standard())
    }

    fn malformed_reason(result: Result<Record, SchemaError>) -> &'static str {
        match result {
            Err(SchemaError::MalformedRollup { field, reason }) if field == "transactions" => reason,
            other => panic!("expected malformed rollup, got {other:?}"),
        }
    }

    #[test]
    fn handwritten_canonical_batch_loads() {
        let signature = fixed_seckey().sign(&test_digest(2)).unwrap();
        let mut out = header(2);
        write_group(&mut out, 1, &[None]);
        write_group(&mut out, 3, &[Some(signature.trimmed())]);
        let record = load_batch(out).unwrap();
        match record.get("transactions") {
            Some(Value::Rollup(txs)) => {
                assert!(txs[0].is_internal());
                assert_eq!(txs[1].signature, signature);
                assert_eq!(txs[1].nonce, 9);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn signed_transaction_needs_a_signature() {
        let mut out = header(1);
        write_group(&mut out, 1, &[Some(&[0u8; 0][..])]);
        assert_eq!(malformed_reason(load_batch(out)), "signed transaction without signature");

        let mut out = header(1);
        write_group(&mut out, 1, &[Some(&[0u8; 3][..])]);
        assert_eq!(malformed_reason(load_batch(out)), "signed transaction without signature");
    }

    #[test]
    fn oversized_signature_is_rejected() {
        let mut out = header(1);
        write_group(&mut out, 1, &[Some(&[7u8; 66][..])]);
        assert_eq!(malformed_reason(load_batch(out)), "signature longer than 65 bytes");
    }

    #[test]
    fn groups_must_ascend() {
        let mut out = header(2);
        write_group(&mut out, 3, &[None]);
        write_group(&mut out, 1, &[None]);
        assert_eq!(malformed_reason(load_batch(out)), "asset groups out of order");

        let mut out = header(2);
        write_group(&mut out, 1, &[None]);
        write_group(&mut out, 1, &[None]);
        assert_eq!(malformed_reason(load_batch(out)), "asset groups out of order");

        let mut out = header(1);
        write_group(&mut out, 1, &[]);
        assert_eq!(malformed_reason(load_batch(out)), "empty asset group");
    }

    #[test]
    fn invalid_group_asset_is_not_stored() {
        let tx = transfer(1, 10);
        let tx = SubTransaction { asset: AssetId::parse("ETH:USDT").unwrap(), ..tx };
        let err = store_with(&transaction::rollup_schema(), &batch(vec![tx]), &Registry::standard())
            .unwrap_err();
        assert!(matches!(err, SchemaError::OutOfRange { field, .. } if field == "transactions"));
    }

    #[test]
    fn kinds_compare_by_type_id() {
        let id = transaction::type_id(TRANSFER);
        assert_eq!(TransactionKind::from(TRANSFER), TransactionKind::Id(id));
        assert_ne!(TransactionKind::from(TRANSFER), TransactionKind::from(ROLLUP));
    }
}
