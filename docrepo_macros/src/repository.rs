use heck::ToLowerCamelCase;
use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{
    parse::{Parse, ParseStream},
    Attribute, FnArg, GenericArgument, Ident, ItemTrait, LitInt, LitStr, Pat, PathArguments,
    ReturnType, Token, TraitItem, TraitItemFn, Type,
};

/// `entity = Path`
struct RepositoryArgs {
    entity: syn::Path,
}

impl Parse for RepositoryArgs {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let key: Ident = input.parse()?;
        if key != "entity" {
            return Err(syn::Error::new_spanned(key, "expected `entity = Type`"));
        }
        input.parse::<Token![=]>()?;
        let entity = input.parse()?;
        Ok(Self { entity })
    }
}

pub fn expand(attr: TokenStream, item: TokenStream) -> TokenStream {
    let args = syn::parse_macro_input!(attr as RepositoryArgs);
    let mut item_trait = syn::parse_macro_input!(item as ItemTrait);
    match expand_trait(&args, &mut item_trait) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

/// Everything the macro reads off one trait method.
struct ContractMethod {
    sig: syn::Signature,
    camel_name: String,
    params: Vec<(Ident, Type)>,
    returned: Type,
    asynchronous: bool,
    transform: Option<LitStr>,
    sort_by: Vec<(LitStr, bool)>,
    limit: Option<LitInt>,
    skip: Option<LitInt>,
}

fn expand_trait(args: &RepositoryArgs, item_trait: &mut ItemTrait) -> syn::Result<TokenStream2> {
    let mut methods = Vec::new();
    for item in &mut item_trait.items {
        if let TraitItem::Fn(method) = item {
            methods.push(contract_method(method)?);
        }
    }

    let trait_name = &item_trait.ident;
    let contract_name = trait_name.to_string();
    let entity = &args.entity;

    let descriptors = methods.iter().map(|m| {
        let camel_name = &m.camel_name;
        let returned = &m.returned;
        let params = m.params.iter().map(|(name, ty)| {
            let name = name.to_string();
            quote! { .param(#name, <#ty as docrepo::Param>::param_type()) }
        });
        let asynchronous = m.asynchronous.then(|| quote! { .asynchronous() });
        let transform = m.transform.as_ref().map(|t| quote! { .transform(#t) });
        let sort_by = m
            .sort_by
            .iter()
            .map(|(field, ascending)| quote! { .sort_by(#field, #ascending) });
        let limit = m.limit.as_ref().map(|n| quote! { .limit(#n) });
        let skip = m.skip.as_ref().map(|n| quote! { .skip(#n) });
        quote! {
            .method(
                docrepo::MethodDescriptor::new(
                    #camel_name,
                    <#returned as docrepo::Returned>::return_type(),
                )
                #(#params)*
                #asynchronous
                #transform
                #(#sort_by)*
                #limit
                #skip
            )
        }
    });

    let impls = methods.iter().map(|m| {
        let sig = &m.sig;
        let camel_name = &m.camel_name;
        let returned = &m.returned;
        let arg_names = m.params.iter().map(|(name, _)| name);
        let call = if m.asynchronous {
            quote! { call_async::<#returned> }
        } else {
            quote! { call::<#returned> }
        };
        quote! {
            #sig {
                self.#call(
                    #camel_name,
                    vec![#(docrepo::Param::into_argument(#arg_names)),*],
                )
            }
        }
    });

    Ok(quote! {
        #item_trait

        impl docrepo::Contract for dyn #trait_name {
            type Entity = #entity;

            fn describe() -> docrepo::ContractDescriptor {
                docrepo::ContractDescriptor::new(#contract_name)
                    #(#descriptors)*
            }
        }

        impl #trait_name for docrepo::Repository<dyn #trait_name> {
            #(#impls)*
        }
    })
}

fn contract_method(method: &mut TraitItemFn) -> syn::Result<ContractMethod> {
    let sig = &method.sig;
    if !matches!(sig.inputs.first(), Some(FnArg::Receiver(r)) if r.reference.is_some() && r.mutability.is_none())
    {
        return Err(syn::Error::new_spanned(
            sig,
            "repository methods must take `&self`",
        ));
    }
    if !sig.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &sig.generics,
            "repository methods cannot be generic",
        ));
    }

    let mut params = Vec::new();
    for input in sig.inputs.iter().skip(1) {
        let FnArg::Typed(typed) = input else { continue };
        match &*typed.pat {
            Pat::Ident(pat) => params.push((pat.ident.clone(), (*typed.ty).clone())),
            other => {
                return Err(syn::Error::new_spanned(
                    other,
                    "repository method parameters must be plain identifiers",
                ))
            }
        }
    }

    let (returned, asynchronous) = split_return(&sig.output)?;

    let mut contract = ContractMethod {
        sig: sig.clone(),
        camel_name: sig.ident.to_string().to_lower_camel_case(),
        params,
        returned,
        asynchronous,
        transform: None,
        sort_by: Vec::new(),
        limit: None,
        skip: None,
    };

    let mut kept: Vec<Attribute> = Vec::new();
    for attr in method.attrs.drain(..) {
        let path = attr.path();
        if path.is_ident("transform") {
            contract.transform = Some(attr.parse_args()?);
        } else if path.is_ident("sort_by") {
            contract.sort_by.push(sort_by(&attr)?);
        } else if path.is_ident("limit") {
            contract.limit = Some(attr.parse_args()?);
        } else if path.is_ident("skip") {
            contract.skip = Some(attr.parse_args()?);
        } else {
            kept.push(attr);
        }
    }
    method.attrs = kept;
    Ok(contract)
}

/// `#[sort_by(field = "...", descending)]`
fn sort_by(attr: &Attribute) -> syn::Result<(LitStr, bool)> {
    let mut field = None;
    let mut ascending = true;
    attr.parse_nested_meta(|meta| {
        if meta.path.is_ident("field") {
            field = Some(meta.value()?.parse::<LitStr>()?);
        } else if meta.path.is_ident("descending") {
            ascending = false;
        } else if meta.path.is_ident("ascending") {
            ascending = true;
        } else {
            return Err(meta.error("expected `field = \"...\"`, `ascending` or `descending`"));
        }
        Ok(())
    })?;
    let field = field.ok_or_else(|| syn::Error::new_spanned(attr, "sort_by needs `field = \"...\"`"))?;
    Ok((field, ascending))
}

/// `Result<T, _>` -> (T, sync), `AsyncHandle<T>` -> (T, async).
fn split_return(output: &ReturnType) -> syn::Result<(Type, bool)> {
    let ReturnType::Type(_, ty) = output else {
        return Err(syn::Error::new_spanned(
            output,
            "repository methods must return Result<T, RepositoryError> or AsyncHandle<T>",
        ));
    };
    let segment = match &**ty {
        Type::Path(path) => path.path.segments.last(),
        _ => None,
    };
    let asynchronous = match segment {
        Some(s) if s.ident == "Result" => false,
        Some(s) if s.ident == "AsyncHandle" => true,
        _ => {
            return Err(syn::Error::new_spanned(
                ty,
                "repository methods must return Result<T, RepositoryError> or AsyncHandle<T>",
            ))
        }
    };
    let inner = segment.and_then(|s| match &s.arguments {
        PathArguments::AngleBracketed(args) => args.args.iter().find_map(|arg| match arg {
            GenericArgument::Type(ty) => Some(ty.clone()),
            _ => None,
        }),
        _ => None,
    });
    let inner = inner.ok_or_else(|| syn::Error::new_spanned(ty, "missing result type argument"))?;
    Ok((inner, asynchronous))
}
