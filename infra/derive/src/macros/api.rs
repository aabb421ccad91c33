use fxhash::FxHashSet;
use proc_macro2::TokenStream;
use quote::quote;
use syn::parse::Parser;
use syn::{Attribute, Data, DataEnum, DeriveInput, Fields, ItemFn, Lit, LitStr, Meta};

/// Expands the `#[api_model]` attribute macro.
///
/// Automatically adds common derives (`Serialize`, `Deserialize`, `ToSchema`) and
/// configures Serde for camelCase and strict field checking. Structs get
/// `deny_unknown_fields`; enums may opt into internal tagging via `tag = "..."`.
pub fn expand_api_model(args: TokenStream, input: DeriveInput) -> TokenStream {
    match try_expand_model(args, &input) {
        Ok(tokens) => tokens,
        Err(err) => err.to_compile_error(),
    }
}

/// Expands the `#[api_handler]` attribute macro.
///
/// Integrates with `utoipa::path` for `OpenAPI` documentation while maintaining
/// clean handler signatures.
pub fn expand_api_handler(args: TokenStream, input: ItemFn) -> TokenStream {
    let body = &input.block;
    let sig = &input.sig;
    let vis = &input.vis;
    let attrs = &input.attrs;

    quote! {
        #(#attrs)*
        #[allow(clippy::unused_async)]
        #[cfg_attr(feature = "server", ::utoipa::path(#args))]
        #vis #sig {
            #body
        }
    }
}

fn try_expand_model(args: TokenStream, input: &DeriveInput) -> syn::Result<TokenStream> {
    let args = ModelArgs::parse(args)?;
    let existing = SerdeAttrs::scan(&input.attrs)?;
    let derives = derived_trait_names(&input.attrs);

    let derive_attr = derive_attr(&derives);
    let schema_attr = schema_attr(&derives);
    let serde_attrs = match &input.data {
        Data::Struct(_) => struct_serde_attrs(&args, &existing, input)?,
        Data::Enum(data) => enum_serde_attrs(&args, &existing, data, input)?,
        Data::Union(_) => {
            return Err(syn::Error::new_spanned(
                &input.ident,
                "api_model does not support unions",
            ));
        }
    };

    Ok(quote! {
        #derive_attr
        #schema_attr
        #(#serde_attrs)*
        #input
    })
}

struct ModelArgs {
    rename_all: Option<LitStr>,
    deny_unknown_fields: Option<bool>,
    tag: Option<LitStr>,
}

impl ModelArgs {
    fn parse(args: TokenStream) -> syn::Result<Self> {
        let parser = syn::punctuated::Punctuated::<Meta, syn::Token![,]>::parse_terminated;
        let metas = parser.parse2(args)?;

        let mut parsed =
            Self { rename_all: None, deny_unknown_fields: None, tag: None };

        for meta in metas {
            let Meta::NameValue(name_value) = meta else {
                return Err(syn::Error::new_spanned(
                    meta,
                    "Expected name-value arguments like `rename_all = \"...\"`",
                ));
            };

            if name_value.path.is_ident("rename_all") {
                let value = string_literal(&name_value, "rename_all")?;
                parsed.rename_all = set_once(parsed.rename_all.take(), &name_value, value)?;
                continue;
            }
            if name_value.path.is_ident("deny_unknown_fields") {
                let value = bool_literal(&name_value, "deny_unknown_fields")?;
                parsed.deny_unknown_fields =
                    set_once(parsed.deny_unknown_fields.take(), &name_value, value)?;
                continue;
            }
            if name_value.path.is_ident("tag") {
                let value = string_literal(&name_value, "tag")?;
                parsed.tag = set_once(parsed.tag.take(), &name_value, value)?;
                continue;
            }
            return Err(syn::Error::new_spanned(
                name_value.path,
                "Unsupported argument; expected rename_all, deny_unknown_fields, or tag",
            ));
        }

        Ok(parsed)
    }
}

fn struct_serde_attrs(
    args: &ModelArgs,
    existing: &SerdeAttrs,
    input: &DeriveInput,
) -> syn::Result<Vec<TokenStream>> {
    if let Some(tag) = &args.tag {
        return Err(syn::Error::new_spanned(
            tag,
            "tag is only supported for enums; structs are encoded as plain objects",
        ));
    }

    let mut attrs = Vec::new();
    attrs.push(rename_attr(args.rename_all.clone(), existing)?);

    let deny_unknown = args.deny_unknown_fields.unwrap_or(true);
    if existing.deny_unknown_fields {
        if !deny_unknown {
            return Err(syn::Error::new_spanned(
                &input.ident,
                "deny_unknown_fields is already set via serde; remove it before disabling",
            ));
        }
    } else if deny_unknown {
        attrs.push(quote! { #[serde(deny_unknown_fields)] });
    }

    Ok(attrs)
}

fn enum_serde_attrs(
    args: &ModelArgs,
    existing: &SerdeAttrs,
    data: &DataEnum,
    input: &DeriveInput,
) -> syn::Result<Vec<TokenStream>> {
    if args.deny_unknown_fields.is_some() {
        return Err(syn::Error::new_spanned(
            &input.ident,
            "deny_unknown_fields applies to structs only; serde does not enforce it for tagged enums",
        ));
    }

    let mut attrs = Vec::new();
    attrs.push(rename_attr(args.rename_all.clone(), existing)?);

    if let Some(tag) = &args.tag {
        if let Some(existing_tag) = &existing.tag {
            return Err(syn::Error::new_spanned(
                existing_tag,
                "Conflicting serde tag; remove it or drop api_model(tag = \"...\")",
            ));
        }
        attrs.push(quote! { #[serde(tag = #tag)] });

        let has_struct_variants =
            data.variants.iter().any(|v| matches!(v.fields, Fields::Named(_)));
        if has_struct_variants && existing.rename_all_fields.is_none() {
            attrs.push(quote! { #[serde(rename_all_fields = "camelCase")] });
        }
    }

    Ok(attrs)
}

fn rename_attr(rename_all: Option<LitStr>, existing: &SerdeAttrs) -> syn::Result<TokenStream> {
    let rename_all_value =
        rename_all.unwrap_or_else(|| LitStr::new("camelCase", proc_macro2::Span::call_site()));

    match &existing.rename_all {
        Some(current) if current.value() != rename_all_value.value() => Err(syn::Error::new_spanned(
            current,
            "Conflicting serde rename_all; remove it or set api_model(rename_all = \"...\") to match",
        )),
        Some(_) => Ok(quote! {}),
        None => Ok(quote! { #[serde(rename_all = #rename_all_value)] }),
    }
}

struct SerdeAttrs {
    rename_all: Option<LitStr>,
    rename_all_fields: Option<LitStr>,
    deny_unknown_fields: bool,
    tag: Option<LitStr>,
}

impl SerdeAttrs {
    fn scan(attrs: &[Attribute]) -> syn::Result<Self> {
        let mut scanned = Self {
            rename_all: None,
            rename_all_fields: None,
            deny_unknown_fields: false,
            tag: None,
        };

        for attr in attrs {
            if !attr.path().is_ident("serde") {
                continue;
            }

            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("rename_all") {
                    scanned.rename_all = Some(meta.value()?.parse()?);
                    return Ok(());
                }
                if meta.path.is_ident("rename_all_fields") {
                    scanned.rename_all_fields = Some(meta.value()?.parse()?);
                    return Ok(());
                }
                if meta.path.is_ident("deny_unknown_fields") {
                    scanned.deny_unknown_fields = true;
                    return Ok(());
                }
                if meta.path.is_ident("tag") {
                    scanned.tag = Some(meta.value()?.parse()?);
                    return Ok(());
                }
                Ok(())
            })?;
        }

        Ok(scanned)
    }
}

fn derive_attr(derives: &FxHashSet<String>) -> TokenStream {
    let mut tokens = Vec::new();
    if !derives.contains("Debug") {
        tokens.push(quote! { Debug });
    }
    if !derives.contains("Serialize") {
        tokens.push(quote! { ::serde::Serialize });
    }
    if !derives.contains("Deserialize") {
        tokens.push(quote! { ::serde::Deserialize });
    }

    if tokens.is_empty() { quote! {} } else { quote! { #[derive(#(#tokens),*)] } }
}

fn schema_attr(derives: &FxHashSet<String>) -> TokenStream {
    if derives.contains("ToSchema") {
        quote! {}
    } else {
        quote! { #[cfg_attr(feature = "server", derive(::utoipa::ToSchema))] }
    }
}

fn bool_literal(name_value: &syn::MetaNameValue, label: &str) -> syn::Result<bool> {
    match &name_value.value {
        syn::Expr::Lit(expr_lit) => match &expr_lit.lit {
            Lit::Bool(lit) => Ok(lit.value),
            _ => Err(syn::Error::new_spanned(
                &name_value.value,
                format!("{label} must be a boolean literal"),
            )),
        },
        _ => Err(syn::Error::new_spanned(
            &name_value.value,
            format!("{label} must be a boolean literal"),
        )),
    }
}

fn string_literal(name_value: &syn::MetaNameValue, label: &str) -> syn::Result<LitStr> {
    match &name_value.value {
        syn::Expr::Lit(expr_lit) => match &expr_lit.lit {
            Lit::Str(lit) => Ok(lit.clone()),
            _ => Err(syn::Error::new_spanned(
                &name_value.value,
                format!("{label} must be a string literal"),
            )),
        },
        _ => Err(syn::Error::new_spanned(
            &name_value.value,
            format!("{label} must be a string literal"),
        )),
    }
}

fn set_once<T>(
    current: Option<T>,
    token: &syn::MetaNameValue,
    value: T,
) -> syn::Result<Option<T>> {
    if current.is_some() {
        return Err(syn::Error::new_spanned(token, "Duplicate argument"));
    }
    Ok(Some(value))
}

fn derived_trait_names(attrs: &[Attribute]) -> FxHashSet<String> {
    let mut traits = FxHashSet::default();

    for attr in attrs {
        if !attr.path().is_ident("derive") {
            continue;
        }
        let _ = attr.parse_nested_meta(|meta| {
            if let Some(seg) = meta.path.segments.last() {
                traits.insert(seg.ident.to_string());
            }
            Ok(())
        });
    }

    traits
}
