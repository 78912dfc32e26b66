use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{DeriveInput, Expr, Field, LitStr, Token, parse_macro_input};

use crate::fields::{FieldKind, classify, struct_fields};

/// Fallback of an optional parameter.
enum Fallback {
    Default,
    Expr(Expr),
}

pub fn derive_autowire(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

fn expand(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();
    let fields = struct_fields(input, "Autowire")?;
    let is_unit = matches!(&input.data, syn::Data::Struct(data) if matches!(data.fields, syn::Fields::Unit));

    let mut parameters = Vec::with_capacity(fields.len());
    let mut initializers = Vec::with_capacity(fields.len());

    for field in fields {
        let Some(ident) = &field.ident else {
            continue;
        };
        let param = LitStr::new(&ident.to_string(), ident.span());
        let ty = &field.ty;
        let kind = classify(ty);

        let declared = match kind {
            FieldKind::Shared(inner) => quote! { ::sijill::autowire::Parameter::typed::<#inner>(#param) },
            FieldKind::Service => quote! { ::sijill::autowire::Parameter::named(#param) },
            FieldKind::Other => quote! { ::sijill::autowire::Parameter::typed::<#ty>(#param) },
        };

        match parse_fallback(field)? {
            Some(fallback) => {
                parameters.push(quote! { #declared.optional() });
                initializers.push(match fallback {
                    Fallback::Default => quote! { #ident: arguments.value_or_default(#param)? },
                    Fallback::Expr(expr) => quote! { #ident: arguments.value_or(#param, || #expr)? },
                });
            }
            None => {
                let initializer = match kind {
                    FieldKind::Shared(inner) => quote! { #ident: arguments.service::<#inner>(#param)? },
                    FieldKind::Service => quote! { #ident: arguments.raw(#param)? },
                    FieldKind::Other => {
                        return Err(syn::Error::new_spanned(
                            ty,
                            "autowired fields must be `Arc<T>` or `Service`; mark other fields `#[autowire(default)]`",
                        ));
                    }
                };
                parameters.push(declared);
                initializers.push(initializer);
            }
        }
    }

    let body = if is_unit {
        quote! { Self }
    } else {
        quote! { Self { #(#initializers,)* } }
    };

    Ok(quote! {
        impl #impl_generics ::sijill::autowire::Autowire for #name #ty_generics #where_clause {
            fn parameters() -> ::std::vec::Vec<::sijill::autowire::Parameter> {
                ::std::vec![#(#parameters),*]
            }

            #[allow(unused_mut, unused_variables)]
            fn construct(mut arguments: ::sijill::autowire::Arguments) -> ::sijill::Result<Self> {
                ::std::result::Result::Ok(#body)
            }
        }
    })
}

fn parse_fallback(field: &Field) -> syn::Result<Option<Fallback>> {
    let mut fallback = None;
    for attr in &field.attrs {
        if !attr.path().is_ident("autowire") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("default") {
                fallback = Some(if meta.input.peek(Token![=]) {
                    Fallback::Expr(meta.value()?.parse()?)
                } else {
                    Fallback::Default
                });
                Ok(())
            } else {
                Err(meta.error("expected `default` or `default = <expr>`"))
            }
        })?;
    }
    Ok(fallback)
}
