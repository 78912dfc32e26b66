use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{DeriveInput, Field, LitStr, Meta, parse_macro_input};

use crate::fields::{FieldKind, classify, option_inner, struct_fields};

pub fn derive_injectable(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

fn expand(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();
    let fields = struct_fields(input, "Injectable")?;
    let is_unit = matches!(&input.data, syn::Data::Struct(data) if matches!(data.fields, syn::Fields::Unit));

    let mut initializers = Vec::with_capacity(fields.len());
    let mut properties = Vec::new();
    let mut arms = Vec::new();

    for field in fields {
        let Some(ident) = &field.ident else {
            continue;
        };
        let property = LitStr::new(&ident.to_string(), ident.span());

        let Some(service) = parse_inject(field)? else {
            initializers.push(quote! { #ident: arguments.value_or_default(#property)? });
            continue;
        };

        let kind = option_inner(&field.ty).map(classify);
        let (declared, inject) = match kind {
            Some(FieldKind::Shared(inner)) => (
                quote! { ::sijill::object_builder::Property::typed::<#inner>(#property) },
                quote! { self.#ident = ::std::option::Option::Some(service.require::<#inner>(#property)?) },
            ),
            Some(FieldKind::Service) => (
                quote! { ::sijill::object_builder::Property::new(#property) },
                quote! { self.#ident = ::std::option::Option::Some(service) },
            ),
            _ => {
                return Err(syn::Error::new_spanned(
                    &field.ty,
                    "#[inject] fields must be `Option<Arc<T>>` or `Option<Service>`",
                ));
            }
        };

        properties.push(match service {
            Some(id) => quote! { #declared.with_service(#id) },
            None => declared,
        });
        arms.push(quote! { #property => { #inject; ::std::result::Result::Ok(()) } });
        initializers.push(quote! { #ident: ::std::option::Option::None });
    }

    let body = if is_unit {
        quote! { Self }
    } else {
        quote! { Self { #(#initializers,)* } }
    };

    Ok(quote! {
        impl #impl_generics ::sijill::object_builder::Injectable for #name #ty_generics #where_clause {
            #[allow(unused_mut, unused_variables)]
            fn instantiate(mut arguments: ::sijill::autowire::Arguments) -> ::sijill::Result<Self> {
                ::std::result::Result::Ok(#body)
            }

            fn properties() -> ::std::vec::Vec<::sijill::object_builder::Property> {
                ::std::vec![#(#properties),*]
            }

            #[allow(unused_variables)]
            fn inject(&mut self, property: &str, service: ::sijill::Service) -> ::sijill::Result<()> {
                match property {
                    #(#arms)*
                    _ => ::std::result::Result::Err(::sijill::SijillError::invalid_argument(
                        property,
                        "no such injectable property",
                    )),
                }
            }
        }
    })
}

/// `Some(None)` for `#[inject]`, `Some(Some(id))` for `#[inject("id")]`.
fn parse_inject(field: &Field) -> syn::Result<Option<Option<LitStr>>> {
    let Some(attr) = field.attrs.iter().find(|attr| attr.path().is_ident("inject")) else {
        return Ok(None);
    };
    match &attr.meta {
        Meta::Path(_) => Ok(Some(None)),
        Meta::List(list) => Ok(Some(Some(list.parse_args()?))),
        Meta::NameValue(_) => Err(syn::Error::new_spanned(
            attr,
            "expected `#[inject]` or `#[inject(\"service_id\")]`",
        )),
    }
}
