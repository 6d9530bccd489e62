//! Derive macro for error types.
//!
//! Generates `std::fmt::Display` and `std::error::Error` implementations.
//!
//! # Usage
//!
//! ```ignore
//! use chainwire_derive::Error;
//!
//! #[derive(Debug, Error)]
//! pub enum CodecError {
//!     #[error("unexpected tag {0:#04x}")]
//!     UnexpectedTag(u8),
//!
//!     #[error("field `{field}` could not be read")]
//!     Unreadable {
//!         field: String,
//!         #[source]
//!         source: StreamError,
//!     },
//!
//!     #[error("stream error: {0}")]
//!     Stream(#[from] StreamError),
//! }
//! ```
//!
//! # Supported Features
//!
//! - Unit variants: `#[error("message")]`
//! - Tuple variants with positional args: `{0}`, `{1:?}`, `{0:#010x}`
//! - Struct variants with named args: `{field}`, `{field:?}`
//! - `#[from]` on the only field of a tuple variant: emits `From<T>` and `source()`
//! - `#[source]` on any field: returned from `source()`
//!
//! Fields the message does not mention are left out of the generated
//! `write!` call, so a variant can carry data that is only reachable through
//! `source()` or pattern matching.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{ToTokens, format_ident, quote};
use syn::{Attribute, Data, DeriveInput, Fields, Ident, Lit, Meta, Type, parse_macro_input};

/// Derives `Display` and `Error` for an enum or struct.
///
/// Each variant must have an `#[error("...")]` attribute specifying
/// the display message.
pub fn derive_error(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match expand_error_derive(&input) {
        Ok(tokens) => TokenStream::from(tokens),
        Err(err) => err.to_compile_error().into(),
    }
}

/// One field of a variant (or struct) as seen by the generator.
struct FieldInfo {
    /// Named fields keep their name; tuple fields become `f0`, `f1`, ...
    binding: Ident,
    /// Accessor on `self` for struct types (`name` or index).
    member: syn::Member,
    ty: Type,
    from: bool,
    source: bool,
}

fn collect_fields(fields: &Fields) -> Vec<FieldInfo> {
    match fields {
        Fields::Unit => Vec::new(),
        Fields::Named(named) => named
            .named
            .iter()
            .enumerate()
            .map(|(i, f)| {
                let binding = f.ident.clone().unwrap_or_else(|| format_ident!("f{}", i));
                FieldInfo {
                    member: syn::Member::Named(binding.clone()),
                    binding,
                    ty: f.ty.clone(),
                    from: has_attr(&f.attrs, "from"),
                    source: has_attr(&f.attrs, "source") || has_attr(&f.attrs, "from"),
                }
            })
            .collect(),
        Fields::Unnamed(unnamed) => unnamed
            .unnamed
            .iter()
            .enumerate()
            .map(|(i, f)| FieldInfo {
                binding: format_ident!("f{}", i),
                member: syn::Member::Unnamed(syn::Index::from(i)),
                ty: f.ty.clone(),
                from: has_attr(&f.attrs, "from"),
                source: has_attr(&f.attrs, "source") || has_attr(&f.attrs, "from"),
            })
            .collect(),
    }
}

fn has_attr(attrs: &[Attribute], name: &str) -> bool {
    attrs.iter().any(|attr| attr.path().is_ident(name))
}

/// Returns true if `message` interpolates `binding` (`{name}` or `{name:spec}`).
fn references(message: &str, binding: &Ident) -> bool {
    let plain = format!("{{{}}}", binding);
    let with_spec = format!("{{{}:", binding);
    message.contains(&plain) || message.contains(&with_spec)
}

/// Builds the `write!` call for a message and the fields it mentions.
fn write_call(message: &str, fields: &[FieldInfo], accessor: impl Fn(&FieldInfo) -> TokenStream2) -> TokenStream2 {
    let args = fields.iter().filter(|f| references(message, &f.binding)).map(|f| {
        let binding = &f.binding;
        let value = accessor(f);
        quote! { , #binding = #value }
    });
    quote! { write!(f, #message #(#args)*) }
}

fn expand_error_derive(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let name = &input.ident;
    let generics = &input.generics;
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    match &input.data {
        Data::Enum(data_enum) => {
            let mut display_arms = Vec::new();
            let mut source_arms = Vec::new();
            let mut from_impls = Vec::new();
            let mut variants_without_source = 0usize;

            for variant in &data_enum.variants {
                let variant_name = &variant.ident;
                let fields = collect_fields(&variant.fields);
                let message = convert_positional_to_named(
                    &extract_error_message(variant)?,
                    &variant.fields,
                );

                let write = write_call(&message, &fields, |f| {
                    let binding = &f.binding;
                    quote! { #binding }
                });

                let display_arm = match &variant.fields {
                    Fields::Unit => quote! { Self::#variant_name => #write, },
                    Fields::Unnamed(_) => {
                        let patterns = fields.iter().map(|f| {
                            if references(&message, &f.binding) {
                                f.binding.to_token_stream()
                            } else {
                                quote! { _ }
                            }
                        });
                        quote! { Self::#variant_name(#(#patterns),*) => #write, }
                    }
                    Fields::Named(_) => {
                        let used = fields
                            .iter()
                            .filter(|f| references(&message, &f.binding))
                            .map(|f| &f.binding);
                        quote! { Self::#variant_name { #(#used,)* .. } => #write, }
                    }
                };
                display_arms.push(display_arm);

                match fields.iter().position(|f| f.source) {
                    Some(index) => {
                        let binding = &fields[index].binding;
                        let arm = match &variant.fields {
                            Fields::Named(_) => {
                                quote! { Self::#variant_name { #binding, .. } => Some(#binding), }
                            }
                            _ => {
                                let patterns = fields.iter().enumerate().map(|(i, f)| {
                                    if i == index {
                                        f.binding.to_token_stream()
                                    } else {
                                        quote! { _ }
                                    }
                                });
                                quote! { Self::#variant_name(#(#patterns),*) => Some(#binding), }
                            }
                        };
                        source_arms.push(arm);
                    }
                    None => variants_without_source += 1,
                }

                if let Some(from_field) = fields.iter().find(|f| f.from) {
                    if fields.len() != 1 || !matches!(variant.fields, Fields::Unnamed(_)) {
                        return Err(syn::Error::new_spanned(
                            variant,
                            "#[from] is only supported on a tuple variant with exactly one field",
                        ));
                    }
                    let ty = &from_field.ty;
                    from_impls.push(quote! {
                        impl #impl_generics ::core::convert::From<#ty> for #name #ty_generics #where_clause {
                            fn from(source: #ty) -> Self {
                                Self::#variant_name(source)
                            }
                        }
                    });
                }
            }

            let source_fn = if source_arms.is_empty() {
                quote! {}
            } else {
                let fallback = if variants_without_source > 0 {
                    quote! { _ => None, }
                } else {
                    quote! {}
                };
                quote! {
                    fn source(&self) -> Option<&(dyn ::std::error::Error + 'static)> {
                        match self {
                            #(#source_arms)*
                            #fallback
                        }
                    }
                }
            };

            Ok(quote! {
                impl #impl_generics ::std::fmt::Display for #name #ty_generics #where_clause {
                    fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                        match self {
                            #(#display_arms)*
                        }
                    }
                }

                impl #impl_generics ::std::error::Error for #name #ty_generics #where_clause {
                    #source_fn
                }

                #(#from_impls)*
            })
        }
        Data::Struct(data_struct) => {
            let fields = collect_fields(&data_struct.fields);
            let message = convert_positional_to_named(
                &extract_error_message_from_attrs(
                    &input.attrs,
                    &input.ident,
                    &format!("type `{}`", input.ident),
                )?,
                &data_struct.fields,
            );

            let write = write_call(&message, &fields, |f| {
                let member = &f.member;
                quote! { self.#member }
            });

            let source_fn = match fields.iter().find(|f| f.source) {
                Some(field) => {
                    let member = &field.member;
                    quote! {
                        fn source(&self) -> Option<&(dyn ::std::error::Error + 'static)> {
                            Some(&self.#member)
                        }
                    }
                }
                None => quote! {},
            };

            Ok(quote! {
                impl #impl_generics ::std::fmt::Display for #name #ty_generics #where_clause {
                    fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                        #write
                    }
                }

                impl #impl_generics ::std::error::Error for #name #ty_generics #where_clause {
                    #source_fn
                }
            })
        }
        Data::Union(_) => Err(syn::Error::new_spanned(
            input,
            "Error derive does not support unions",
        )),
    }
}

/// Extracts the error message from a variant's `#[error("...")]` attribute.
fn extract_error_message(variant: &syn::Variant) -> syn::Result<String> {
    extract_error_message_from_attrs(
        &variant.attrs,
        &variant.ident,
        &format!("variant `{}`", variant.ident),
    )
}

/// Extracts the error message from attributes.
fn extract_error_message_from_attrs<T: ToTokens>(
    attrs: &[Attribute],
    target: &T,
    target_desc: &str,
) -> syn::Result<String> {
    for attr in attrs {
        if !attr.path().is_ident("error") {
            continue;
        }
        let Meta::List(meta_list) = &attr.meta else {
            return Err(syn::Error::new_spanned(
                &attr.meta,
                "invalid #[error] attribute; use #[error(\"message\")] to describe the error",
            ));
        };
        let lit = syn::parse2::<Lit>(meta_list.tokens.clone()).map_err(|_| {
            syn::Error::new_spanned(
                &attr.meta,
                "failed to parse #[error] attribute; expected a string literal like #[error(\"bad tag: {0}\")]",
            )
        })?;
        return match lit {
            Lit::Str(lit_str) => Ok(lit_str.value()),
            _ => Err(syn::Error::new_spanned(
                &attr.meta,
                "invalid #[error] attribute: message must be a string literal",
            )),
        };
    }

    Err(syn::Error::new_spanned(
        target,
        format!(
            "missing #[error(\"...\")] attribute on {}; every error variant must declare a display message",
            target_desc
        ),
    ))
}

/// Rewrites positional args `{0}` / `{0:spec}` to the generated bindings `{f0}` / `{f0:spec}`.
fn convert_positional_to_named(format_str: &str, fields: &Fields) -> String {
    let Fields::Unnamed(unnamed) = fields else {
        return format_str.to_string();
    };
    let mut result = format_str.to_string();
    for i in (0..unnamed.unnamed.len()).rev() {
        result = result
            .replace(&format!("{{{}}}", i), &format!("{{f{}}}", i))
            .replace(&format!("{{{}:", i), &format!("{{f{}:", i));
    }
    result
}
