//! Schema-driven record encoding.
//!
//! - `schema`: field types and ordered schemas
//! - `value`: run-time values and records
//! - `codec`: `store`/`load` over a `Stream`
//! - `rollup`: batched sub-transactions grouped by asset
//! - `transaction`: base field sets, type ids and record signing

pub mod codec;
pub mod rollup;
pub mod schema;
pub mod transaction;
pub mod value;
