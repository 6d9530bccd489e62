//! Derive macros for the chainwire crate.
//!
//! Provides:
//! - `#[derive(Error)]` - `Display` and `std::error::Error` for error enums,
//!   with `#[from]` conversions and `#[source]` chaining (thiserror replacement)

mod error;

use proc_macro::TokenStream;

/// Automatically implements `Display` and `Error` traits for error types.
#[proc_macro_derive(Error, attributes(error, from, source))]
pub fn derive_error(input: TokenStream) -> TokenStream {
    error::derive_error(input)
}
