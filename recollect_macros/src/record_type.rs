use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{Attribute, Data, DeriveInput, Expr, Fields, LitStr};

enum Declared {
    Attribute(String),
    Association {
        to_many: bool,
        name: String,
        collection: Expr,
        foreign_key: Option<String>,
        merge: bool,
    },
    Skipped,
}

pub fn derive_record_type(input: TokenStream) -> TokenStream {
    let input = syn::parse_macro_input!(input as DeriveInput);
    match expand(&input) {
        Ok(expanded) => TokenStream::from(expanded),
        Err(err) => TokenStream::from(err.to_compile_error()),
    }
}

fn expand(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let ident = &input.ident;
    let (type_name, primary_key) = extract_type_options(input)?;

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    ident,
                    "RecordType derive requires a struct with named fields",
                ))
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                ident,
                "RecordType derive only supports structs",
            ))
        }
    };

    let mut calls = Vec::new();
    if let Some(primary_key) = &primary_key {
        calls.push(quote! { .primary_key(#primary_key) });
    }

    for field in fields {
        let Some(field_ident) = &field.ident else {
            continue;
        };
        let field_name = field_ident.to_string();
        match extract_field(&field_name, &field.attrs)? {
            Declared::Attribute(name) => calls.push(quote! { .attribute(#name) }),
            Declared::Association {
                to_many,
                name,
                collection,
                foreign_key,
                merge,
            } => {
                let foreign_key = foreign_key.map(|fk| quote! { .foreign_key(#fk) });
                let merge = merge.then(|| quote! { .merge_on_assign(true) });
                let descriptor = quote! {
                    ::recollect::AssociationDescriptor::new(#collection) #foreign_key #merge
                };
                calls.push(if to_many {
                    quote! { .to_many(#name, #descriptor) }
                } else {
                    quote! { .to_one(#name, #descriptor) }
                });
            }
            Declared::Skipped => {}
        }
    }

    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();
    Ok(quote! {
        impl #impl_generics ::recollect::RecordDefinition for #ident #ty_generics #where_clause {
            fn record_type() -> ::std::rc::Rc<::recollect::RecordType> {
                ::recollect::RecordType::builder(#type_name)
                    #(#calls)*
                    .build()
            }
        }
    })
}

/// `#[record(name = "...", primary_key = "...")]` on the struct.
fn extract_type_options(input: &DeriveInput) -> syn::Result<(String, Option<String>)> {
    let mut name = None;
    let mut primary_key = None;

    for attr in &input.attrs {
        if !attr.path().is_ident("record") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("name") {
                let value: LitStr = meta.value()?.parse()?;
                name = Some(value.value());
                Ok(())
            } else if meta.path.is_ident("primary_key") {
                let value: LitStr = meta.value()?.parse()?;
                primary_key = Some(value.value());
                Ok(())
            } else {
                Err(meta.error("expected `name` or `primary_key`"))
            }
        })?;
    }

    Ok((name.unwrap_or_else(|| input.ident.to_string()), primary_key))
}

fn extract_field(field_name: &str, attrs: &[Attribute]) -> syn::Result<Declared> {
    let mut declared = Declared::Attribute(field_name.to_string());

    for attr in attrs {
        if !attr.path().is_ident("record") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("skip") {
                declared = Declared::Skipped;
                return Ok(());
            }
            if meta.path.is_ident("rename") {
                let value: LitStr = meta.value()?.parse()?;
                declared = Declared::Attribute(value.value());
                return Ok(());
            }

            let to_many = if meta.path.is_ident("to_many") {
                true
            } else if meta.path.is_ident("to_one") {
                false
            } else {
                return Err(meta.error("expected `to_one`, `to_many`, `rename` or `skip`"));
            };

            let mut collection = None;
            let mut foreign_key = None;
            let mut merge = false;
            meta.parse_nested_meta(|inner| {
                if inner.path.is_ident("collection") {
                    collection = Some(inner.value()?.parse::<Expr>()?);
                } else if inner.path.is_ident("foreign_key") {
                    let value: LitStr = inner.value()?.parse()?;
                    foreign_key = Some(value.value());
                } else if inner.path.is_ident("merge") {
                    merge = true;
                } else {
                    return Err(inner.error("expected `collection`, `foreign_key` or `merge`"));
                }
                Ok(())
            })?;

            let collection =
                collection.ok_or_else(|| meta.error("association requires `collection = ...`"))?;
            declared = Declared::Association {
                to_many,
                name: field_name.to_string(),
                collection,
                foreign_key,
                merge,
            };
            Ok(())
        })?;
    }

    Ok(declared)
}
