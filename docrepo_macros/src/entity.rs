use heck::{
    ToKebabCase, ToLowerCamelCase, ToShoutyKebabCase, ToShoutySnakeCase, ToSnakeCase,
    ToUpperCamelCase,
};
use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{
    ext::IdentExt, meta::ParseNestedMeta, Attribute, Data, DeriveInput, Field, Fields, LitStr,
    Token,
};

pub fn derive_entity(input: TokenStream) -> TokenStream {
    let input = syn::parse_macro_input!(input as DeriveInput);
    match expand(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

#[derive(Default)]
struct EntityOptions {
    collection: Option<String>,
    indexes: Vec<(String, bool)>,
    drop_entities_on_start: bool,
    drop_indexes_on_start: bool,
}

#[derive(Default)]
struct FieldOptions {
    id: bool,
    non_index: bool,
    immutable: bool,
    object: bool,
}

/// The parts of `#[serde(...)]` that change a field's document key.
#[derive(Default)]
struct SerdeField {
    rename: Option<String>,
    skip: bool,
}

fn expand(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let name = &input.ident;
    let options = entity_options(input)?;

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    name,
                    "Entity derive: only structs with named fields are supported",
                ))
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                name,
                "Entity derive: only structs are supported",
            ))
        }
    };

    let rename_all = serde_rename_all(&input.attrs)?;

    // (field, document key, options); fields serde never writes are left out
    let mut parsed = Vec::with_capacity(fields.len());
    for field in fields {
        let serde = serde_field(field)?;
        if serde.skip {
            continue;
        }
        let ident = field
            .ident
            .as_ref()
            .map(|i| i.unraw().to_string())
            .unwrap_or_default();
        let key = match (serde.rename, &rename_all) {
            (Some(rename), _) => rename,
            (None, Some(rule)) => rename_rule(rule, &ident).unwrap_or(ident),
            (None, None) => ident,
        };
        parsed.push((field, key, field_options(field)?));
    }

    // Default: a field named `id` when none is marked
    if !parsed.iter().any(|(_, _, opts)| opts.id) {
        if let Some((_, _, opts)) = parsed
            .iter_mut()
            .find(|(field, _, _)| field.ident.as_ref().is_some_and(|i| i == "id"))
        {
            opts.id = true;
        }
    }

    let collection = options
        .collection
        .clone()
        .unwrap_or_else(|| format!("{}s", name.to_string().to_snake_case()));

    let field_calls = parsed.iter().map(|(field, field_name, opts)| {
        let ty = &field.ty;
        let value_type = if opts.object {
            quote! { docrepo::ValueType::Object }
        } else {
            quote! { <#ty as docrepo::FieldKind>::value_type() }
        };
        let id = opts.id.then(|| quote! { .id() });
        let non_index = opts.non_index.then(|| quote! { .non_index() });
        let immutable = opts.immutable.then(|| quote! { .immutable() });
        quote! {
            .field(docrepo::FieldDescriptor::new(#field_name, #value_type) #id #non_index #immutable)
        }
    });

    let index_calls = options.indexes.iter().map(|(spec, unique)| {
        let unique = unique.then(|| quote! { .unique() });
        quote! { .index(docrepo::CompoundIndex::parse(#spec) #unique) }
    });

    let drop_entities = options
        .drop_entities_on_start
        .then(|| quote! { .drop_entities_on_start() });
    let drop_indexes = options
        .drop_indexes_on_start
        .then(|| quote! { .drop_indexes_on_start() });

    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    Ok(quote! {
        impl #impl_generics docrepo::Entity for #name #ty_generics #where_clause {
            const COLLECTION: &'static str = #collection;

            fn schema() -> docrepo::SchemaDescriptor {
                docrepo::SchemaDescriptor::new::<Self>(#collection)
                    #(#field_calls)*
                    #(#index_calls)*
                    #drop_entities
                    #drop_indexes
            }
        }
    })
}

fn entity_options(input: &DeriveInput) -> syn::Result<EntityOptions> {
    let mut options = EntityOptions::default();
    for attr in &input.attrs {
        if !attr.path().is_ident("entity") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("collection") {
                let value: LitStr = meta.value()?.parse()?;
                options.collection = Some(value.value());
            } else if meta.path.is_ident("index") {
                let value: LitStr = meta.value()?.parse()?;
                options.indexes.push((value.value(), false));
            } else if meta.path.is_ident("unique_index") {
                let value: LitStr = meta.value()?.parse()?;
                options.indexes.push((value.value(), true));
            } else if meta.path.is_ident("drop_entities_on_start") {
                options.drop_entities_on_start = true;
            } else if meta.path.is_ident("drop_indexes_on_start") {
                options.drop_indexes_on_start = true;
            } else {
                return Err(meta.error("unknown entity option"));
            }
            Ok(())
        })?;
    }
    Ok(options)
}

fn field_options(field: &Field) -> syn::Result<FieldOptions> {
    let mut options = FieldOptions::default();
    for attr in &field.attrs {
        if !attr.path().is_ident("entity") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("id") {
                options.id = true;
            } else if meta.path.is_ident("non_index") {
                options.non_index = true;
            } else if meta.path.is_ident("immutable") {
                options.immutable = true;
            } else if meta.path.is_ident("object") {
                options.object = true;
            } else {
                return Err(meta.error("unknown entity field option"));
            }
            Ok(())
        })?;
    }
    Ok(options)
}

/// `#[serde(rename_all = "...")]` on the struct, checked against the rules
/// serde accepts.
fn serde_rename_all(attrs: &[Attribute]) -> syn::Result<Option<String>> {
    let mut rule = None;
    for attr in attrs.iter().filter(|a| a.path().is_ident("serde")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("rename_all") {
                if let Some(value) = serialize_name(&meta)? {
                    if rename_rule(&value.value(), "").is_none() {
                        return Err(syn::Error::new_spanned(value, "unknown rename_all rule"));
                    }
                    rule = Some(value.value());
                }
                Ok(())
            } else {
                skip_meta(&meta)
            }
        })?;
    }
    Ok(rule)
}

fn serde_field(field: &Field) -> syn::Result<SerdeField> {
    let mut options = SerdeField::default();
    for attr in field.attrs.iter().filter(|a| a.path().is_ident("serde")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("rename") {
                if let Some(value) = serialize_name(&meta)? {
                    options.rename = Some(value.value());
                }
                Ok(())
            } else if meta.path.is_ident("skip") || meta.path.is_ident("skip_serializing") {
                options.skip = true;
                Ok(())
            } else if meta.path.is_ident("flatten") {
                Err(meta.error("Entity derive: flattened fields are not supported"))
            } else {
                skip_meta(&meta)
            }
        })?;
    }
    Ok(options)
}

/// `key = "..."` or the `serialize` half of `key(serialize = "...", ...)`.
fn serialize_name(meta: &ParseNestedMeta) -> syn::Result<Option<LitStr>> {
    if meta.input.peek(Token![=]) {
        return Ok(Some(meta.value()?.parse()?));
    }
    let mut name = None;
    meta.parse_nested_meta(|inner| {
        if inner.path.is_ident("serialize") {
            name = Some(inner.value()?.parse()?);
            Ok(())
        } else {
            skip_meta(&inner)
        }
    })?;
    Ok(name)
}

/// Consume a serde option this derive does not care about.
fn skip_meta(meta: &ParseNestedMeta) -> syn::Result<()> {
    if meta.input.peek(Token![=]) {
        meta.value()?.parse::<syn::Expr>()?;
    } else if meta.input.peek(syn::token::Paren) {
        let content;
        syn::parenthesized!(content in meta.input);
        content.parse::<TokenStream2>()?;
    }
    Ok(())
}

fn rename_rule(rule: &str, ident: &str) -> Option<String> {
    Some(match rule {
        "lowercase" => ident.to_lowercase(),
        "UPPERCASE" => ident.to_uppercase(),
        "PascalCase" => ident.to_upper_camel_case(),
        "camelCase" => ident.to_lower_camel_case(),
        "snake_case" => ident.to_snake_case(),
        "SCREAMING_SNAKE_CASE" => ident.to_shouty_snake_case(),
        "kebab-case" => ident.to_kebab_case(),
        "SCREAMING-KEBAB-CASE" => ident.to_shouty_kebab_case(),
        _ => return None,
    })
}
