//! Procedural macros for surface-dispatch

use darling::{FromDeriveInput, FromField, FromVariant};
use proc_macro::TokenStream;
use quote::{format_ident, quote};
use syn::{parse_macro_input, DeriveInput};

/// Container-level attributes for #[derive(Action)]
#[derive(Debug, FromDeriveInput)]
#[darling(attributes(action), supports(enum_any))]
struct ActionOpts {
    ident: syn::Ident,
    generics: syn::Generics,
    data: darling::ast::Data<ActionVariant, ()>,

    /// Also implement ActionSummary
    #[darling(default)]
    summary: bool,
}

/// Variant-level attributes
#[derive(Debug, FromVariant)]
#[darling(attributes(action))]
struct ActionVariant {
    ident: syn::Ident,
    fields: darling::ast::Fields<()>,

    /// Never print this variant's payload (passwords, recovery phrases)
    #[darling(default)]
    redact: bool,
}

fn variant_pattern(
    name: &syn::Ident,
    variant: &syn::Ident,
    style: darling::ast::Style,
) -> proc_macro2::TokenStream {
    match style {
        darling::ast::Style::Unit => quote! { #name::#variant },
        darling::ast::Style::Tuple => quote! { #name::#variant(..) },
        darling::ast::Style::Struct => quote! { #name::#variant { .. } },
    }
}

/// Derive macro for the Action trait
///
/// Generates a `name()` method that returns the variant name as a static string.
///
/// With `#[action(summary)]`, also implements `ActionSummary`: variants
/// marked `#[action(redact)]` log as `Name { .. }`, everything else uses
/// `Debug`.
///
/// # Example
/// ```ignore
/// #[derive(Action, Clone, Debug)]
/// #[action(summary)]
/// enum Action {
///     BalanceRefresh,
///     BalanceDidLoad { address: String, balance: String },
///     #[action(redact)]
///     UnlockWallet { password: String },
/// }
///
/// assert_eq!(Action::BalanceRefresh.name(), "BalanceRefresh");
/// ```
#[proc_macro_derive(Action, attributes(action))]
pub fn derive_action(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    let opts = match ActionOpts::from_derive_input(&input) {
        Ok(opts) => opts,
        Err(e) => return e.write_errors().into(),
    };

    let name = &opts.ident;
    let (impl_generics, ty_generics, where_clause) = opts.generics.split_for_impl();

    let variants = match &opts.data {
        darling::ast::Data::Enum(variants) => variants,
        _ => {
            return syn::Error::new_spanned(&input, "Action can only be derived for enums")
                .to_compile_error()
                .into();
        }
    };

    let name_arms = variants.iter().map(|v| {
        let pattern = variant_pattern(name, &v.ident, v.fields.style);
        let variant_str = v.ident.to_string();
        quote! { #pattern => #variant_str }
    });

    let mut expanded = quote! {
        impl #impl_generics ::surface_dispatch::Action for #name #ty_generics #where_clause {
            fn name(&self) -> &'static str {
                match self {
                    #(#name_arms),*
                }
            }
        }
    };

    if opts.summary {
        let redacted: Vec<_> = variants
            .iter()
            .filter(|v| v.redact)
            .map(|v| {
                let pattern = variant_pattern(name, &v.ident, v.fields.style);
                let text = match v.fields.style {
                    darling::ast::Style::Unit => v.ident.to_string(),
                    darling::ast::Style::Tuple => format!("{}(..)", v.ident),
                    darling::ast::Style::Struct => format!("{} {{ .. }}", v.ident),
                };
                quote! { #pattern => ::std::string::String::from(#text), }
            })
            .collect();

        expanded.extend(quote! {
            impl #impl_generics ::surface_dispatch::ActionSummary for #name #ty_generics #where_clause {
                fn summary(&self) -> ::std::string::String {
                    #[allow(unreachable_patterns)]
                    match self {
                        #(#redacted)*
                        other => ::std::format!("{:?}", other),
                    }
                }
            }
        });
    }

    TokenStream::from(expanded)
}

/// Container-level attributes for #[derive(Slice)]
#[derive(Debug, FromDeriveInput)]
#[darling(attributes(slice), supports(struct_named))]
struct SliceOpts {
    ident: syn::Ident,
    vis: syn::Visibility,
    data: darling::ast::Data<(), SliceField>,

    /// Slice name, also its key in the durable blob
    name: String,
}

#[derive(Debug, FromField)]
#[darling(attributes(slice))]
struct SliceField {
    ident: Option<syn::Ident>,
    ty: syn::Type,

    /// Field is on the persistence allow-list
    #[darling(default)]
    persist: bool,
}

/// Derive macro for the Slice trait
///
/// Generates:
/// - `<Name>Patch`: one `Option<T>` per field, for `Store::set_state(merge(..))`
/// - `Slice` and `SlicePatch` impls; merging sets exactly the present fields
/// - `Persist` with a static allow-list of the `#[slice(persist)]` fields
///
/// The struct must implement `Clone`, `Debug`, `Default` and `PartialEq`,
/// and persisted fields must be serde-serializable.
///
/// # Example
/// ```ignore
/// #[derive(Slice, Clone, Debug, Default, PartialEq)]
/// #[slice(name = "wallet")]
/// pub struct WalletState {
///     #[slice(persist)]
///     pub selected_account: Option<String>,
///     pub is_wallet_locked: bool,
/// }
///
/// store.set_state(merge(WalletStatePatch {
///     is_wallet_locked: Some(true),
///     ..Default::default()
/// }));
/// assert_eq!(WalletState::ALLOW_LIST, &["selected_account"]);
/// ```
#[proc_macro_derive(Slice, attributes(slice))]
pub fn derive_slice(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    let opts = match SliceOpts::from_derive_input(&input) {
        Ok(opts) => opts,
        Err(e) => return e.write_errors().into(),
    };

    let name = &opts.ident;
    let vis = &opts.vis;
    let slice_name = &opts.name;
    let patch_name = format_ident!("{}Patch", name);

    let fields = match &opts.data {
        darling::ast::Data::Struct(fields) => &fields.fields,
        _ => {
            return syn::Error::new_spanned(&input, "Slice can only be derived for structs")
                .to_compile_error()
                .into();
        }
    };

    let idents: Vec<_> = fields.iter().filter_map(|f| f.ident.as_ref()).collect();
    let types: Vec<_> = fields.iter().map(|f| &f.ty).collect();
    let persisted: Vec<_> = fields
        .iter()
        .filter(|f| f.persist)
        .filter_map(|f| f.ident.as_ref())
        .collect();
    let persisted_names: Vec<_> = persisted.iter().map(|ident| ident.to_string()).collect();

    let patch_doc = format!("Partial update of [`{}`]. `None` fields are left untouched.", name);

    let expanded = quote! {
        #[doc = #patch_doc]
        #[derive(Clone, Debug, Default)]
        #vis struct #patch_name {
            #( pub #idents: ::core::option::Option<#types>, )*
        }

        impl ::surface_dispatch::SlicePatch for #patch_name {
            type Slice = #name;

            fn is_empty(&self) -> bool {
                true #( && self.#idents.is_none() )*
            }
        }

        impl ::surface_dispatch::Slice for #name {
            const NAME: &'static str = #slice_name;
            type Patch = #patch_name;

            fn merge(&mut self, patch: #patch_name) -> bool {
                let mut changed = false;
                #(
                    if let ::core::option::Option::Some(value) = patch.#idents {
                        if self.#idents != value {
                            self.#idents = value;
                            changed = true;
                        }
                    }
                )*
                changed
            }
        }

        impl ::surface_dispatch::Persist for #name {
            const ALLOW_LIST: &'static [&'static str] = &[#(#persisted_names),*];

            fn dehydrate(&self) -> ::surface_dispatch::persist::Blob {
                #[allow(unused_mut)]
                let mut writer = ::surface_dispatch::persist::SliceWriter::new(#slice_name);
                #( writer.write(#persisted_names, &self.#persisted); )*
                writer.finish()
            }

            fn rehydrate(
                raw: &::surface_dispatch::__private::serde_json::Value,
            ) -> ::surface_dispatch::persist::Rehydrated<Self> {
                #[allow(unused_mut)]
                let mut value = <Self as ::core::default::Default>::default();
                #[allow(unused_mut)]
                let mut reader = ::surface_dispatch::persist::SliceReader::new(#slice_name, raw);
                #( reader.read(#persisted_names, &mut value.#persisted); )*
                reader.finish(value)
            }
        }
    };

    TokenStream::from(expanded)
}

/// Container-level attributes for #[derive(StateTree)]
#[derive(Debug, FromDeriveInput)]
#[darling(attributes(tree), supports(struct_named))]
struct TreeOpts {
    ident: syn::Ident,
    data: darling::ast::Data<(), TreeField>,

    /// The bitflags type with one flag per slice
    changes: syn::Path,

    /// Also implement PersistTree over the slices' allow-lists
    #[darling(default)]
    persist: bool,
}

#[derive(Debug, FromField)]
#[darling(attributes(tree))]
struct TreeField {
    ident: Option<syn::Ident>,
    ty: syn::Type,

    /// Flag of `changes` reported when this slice changes
    flag: syn::Ident,
}

/// Derive macro for the StateTree trait
///
/// Every field must be a distinct `Slice` type annotated with its flag.
/// Generates `StateTree`, one `HasSlice` impl per field and, with
/// `#[tree(persist)]`, a `PersistTree` whose blob is keyed by slice name.
///
/// # Example
/// ```ignore
/// #[derive(StateTree, Clone, Debug, Default)]
/// #[tree(changes = "PanelSlices", persist)]
/// pub struct PanelTree {
///     #[tree(flag = "PANEL")]
///     pub panel: PanelState,
///     #[tree(flag = "WALLET")]
///     pub wallet: WalletState,
/// }
/// ```
#[proc_macro_derive(StateTree, attributes(tree))]
pub fn derive_state_tree(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    let opts = match TreeOpts::from_derive_input(&input) {
        Ok(opts) => opts,
        Err(e) => return e.write_errors().into(),
    };

    let name = &opts.ident;
    let changes = &opts.changes;

    let fields = match &opts.data {
        darling::ast::Data::Struct(fields) => &fields.fields,
        _ => {
            return syn::Error::new_spanned(&input, "StateTree can only be derived for structs")
                .to_compile_error()
                .into();
        }
    };

    let has_slice_impls = fields.iter().map(|f| {
        let ident = &f.ident;
        let ty = &f.ty;
        let flag = &f.flag;
        quote! {
            impl ::surface_dispatch::HasSlice<#ty> for #name {
                const FLAG: #changes = #changes::#flag;

                fn slice(&self) -> &#ty {
                    &self.#ident
                }

                fn slice_mut(&mut self) -> &mut #ty {
                    &mut self.#ident
                }
            }
        }
    });

    let mut expanded = quote! {
        impl ::surface_dispatch::StateTree for #name {
            type Changes = #changes;
        }

        #(#has_slice_impls)*
    };

    if opts.persist {
        let idents: Vec<_> = fields.iter().filter_map(|f| f.ident.as_ref()).collect();
        let types: Vec<_> = fields.iter().map(|f| &f.ty).collect();
        let flags: Vec<_> = fields.iter().map(|f| &f.flag).collect();

        expanded.extend(quote! {
            impl ::surface_dispatch::PersistTree for #name {
                fn persisted_slices() -> #changes {
                    let mut slices = <#changes as ::surface_dispatch::bitflags::Flags>::empty();
                    #(
                        if !<#types as ::surface_dispatch::Persist>::ALLOW_LIST.is_empty() {
                            ::surface_dispatch::bitflags::Flags::insert(&mut slices, #changes::#flags);
                        }
                    )*
                    slices
                }

                fn dehydrate(&self) -> ::surface_dispatch::persist::Blob {
                    let mut blob = ::surface_dispatch::persist::Blob::new();
                    #( ::surface_dispatch::persist::dehydrate_slice(&mut blob, &self.#idents); )*
                    blob
                }

                fn rehydrate(
                    blob: &::surface_dispatch::persist::Blob,
                ) -> ::surface_dispatch::persist::Rehydrated<Self> {
                    let mut fallbacks = ::std::vec::Vec::new();
                    let value = #name {
                        #( #idents: ::surface_dispatch::persist::rehydrate_slice(blob, &mut fallbacks), )*
                    };
                    ::surface_dispatch::persist::Rehydrated { value, fallbacks }
                }
            }
        });
    }

    TokenStream::from(expanded)
}
