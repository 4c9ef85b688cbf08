/*
 * Copyright (c) 2024. Govcraft
 *
 * Licensed under either of
 *   * Apache License, Version 2.0 (the "License");
 *     you may not use this file except in compliance with the License.
 *     You may obtain a copy of the License at http://www.apache.org/licenses/LICENSE-2.0
 *   * MIT license: http://opensource.org/licenses/MIT
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the applicable License for the specific language governing permissions and
 * limitations under that License.
 */
#![forbid(unsafe_code)]

//! Ferry Macro Library
//!
//! Procedural macros for the Ferry message broker.
//!
//! # Message Macro
//!
//! The [`ferry_message`] macro turns a payload struct into a named, versioned
//! message kind:
//!
//! ```ignore
//! #[ferry_message(name = "orders/created", version = "2022-01-02")]
//! pub struct OrderCreated {
//!     pub order_id: u64,
//! }
//! ```

use proc_macro::TokenStream;

use quote::quote;
use syn::{parse_macro_input, DeriveInput, LitStr};

fn has_derive(input: &DeriveInput, trait_name: &str) -> bool {
    input.attrs.iter().any(|attr| {
        if attr.path().is_ident("derive") {
            let mut found = false;
            let _ = attr.parse_nested_meta(|meta| {
                if meta
                    .path
                    .segments
                    .last()
                    .is_some_and(|segment| segment.ident == trait_name)
                {
                    found = true;
                }
                Ok(())
            });
            found
        } else {
            false
        }
    })
}

/// Options parsed from `#[ferry_message(...)]`.
#[derive(Default)]
struct MessageOptions {
    name: Option<LitStr>,
    version: Option<LitStr>,
}

/// Implements `MessageKind` for a payload struct and derives what the broker needs.
///
/// # Usage
///
/// ```ignore
/// use ferry_broker::prelude::*;
///
/// #[ferry_message(name = "orders/created", version = "2022-01-02")]
/// pub struct OrderCreated {
///     pub order_id: u64,
/// }
///
/// let message = Message::encode(&OrderCreated { order_id: 7 })?;
/// assert!(message.is::<OrderCreated>());
/// ```
///
/// This expands to:
/// - `#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]` (only the traits
///   not already present)
/// - `impl ferry_broker::prelude::MessageKind` with the given name and version
/// - A compile-time assertion that the type is `Send + Sync + 'static`
///
/// Both `name` and `version` are required. `serde` must be available in scope.
#[proc_macro_attribute]
pub fn ferry_message(attr: TokenStream, item: TokenStream) -> TokenStream {
    let mut options = MessageOptions::default();
    let parser = syn::meta::parser(|meta| {
        if meta.path.is_ident("name") {
            options.name = Some(meta.value()?.parse()?);
            Ok(())
        } else if meta.path.is_ident("version") {
            options.version = Some(meta.value()?.parse()?);
            Ok(())
        } else {
            Err(meta.error("unsupported ferry_message option, expected `name` or `version`"))
        }
    });
    parse_macro_input!(attr with parser);

    let input = parse_macro_input!(item as DeriveInput);

    let (Some(kind_name), Some(kind_version)) = (options.name, options.version) else {
        return syn::Error::new_spanned(
            &input.ident,
            "ferry_message requires both `name = \"...\"` and `version = \"...\"`",
        )
        .to_compile_error()
        .into();
    };

    let name = &input.ident;
    let generics = &input.generics;
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    let derives = {
        let mut traits = Vec::new();
        if !has_derive(&input, "Clone") {
            traits.push(quote!(Clone));
        }
        if !has_derive(&input, "Debug") {
            traits.push(quote!(Debug));
        }
        if !has_derive(&input, "Serialize") {
            traits.push(quote!(serde::Serialize));
        }
        if !has_derive(&input, "Deserialize") {
            traits.push(quote!(serde::Deserialize));
        }
        if traits.is_empty() {
            quote!()
        } else {
            quote!(#[derive(#(#traits),*)])
        }
    };

    let assert_ident = quote::format_ident!("_AssertFerryMessage_{}", name);

    let expanded = quote! {
        #derives
        #input

        impl #impl_generics ::ferry_broker::prelude::MessageKind for #name #ty_generics #where_clause {
            const NAME: &'static str = #kind_name;
            const VERSION: &'static str = #kind_version;
        }

        #[doc(hidden)]
        #[allow(dead_code, non_camel_case_types, non_snake_case, clippy::needless_lifetimes)]
        const _: () = {
            fn #assert_ident #impl_generics () #where_clause {
                fn assert_bounds<T: Send + Sync + 'static>() {}
                assert_bounds::<#name #ty_generics>();
            }
        };
    };

    TokenStream::from(expanded)
}
