//! Field inspection shared by the derives.

use syn::{Data, DeriveInput, Field, Fields, GenericArgument, PathArguments, Type};

/// How a field's type relates to the runtime's service handles.
#[derive(Clone, Copy)]
pub enum FieldKind<'a> {
    /// `Arc<T>`, carrying `T`.
    Shared(&'a Type),
    /// `Service`.
    Service,
    Other,
}

pub fn classify(ty: &Type) -> FieldKind<'_> {
    if let Some(inner) = generic_argument(ty, "Arc") {
        return FieldKind::Shared(inner);
    }
    match last_segment(ty) {
        Some(segment) if segment.ident == "Service" && segment.arguments.is_none() => FieldKind::Service,
        _ => FieldKind::Other,
    }
}

/// `T` for a field typed `Option<T>`.
pub fn option_inner(ty: &Type) -> Option<&Type> {
    generic_argument(ty, "Option")
}

/// Named fields of a struct; empty for a unit struct.
pub fn struct_fields<'a>(input: &'a DeriveInput, derive: &str) -> syn::Result<Vec<&'a Field>> {
    let Data::Struct(data) = &input.data else {
        return Err(syn::Error::new_spanned(
            &input.ident,
            format!("{derive} can only be derived for structs"),
        ));
    };
    match &data.fields {
        Fields::Named(fields) => Ok(fields.named.iter().collect()),
        Fields::Unit => Ok(Vec::new()),
        Fields::Unnamed(fields) => Err(syn::Error::new_spanned(
            fields,
            format!("{derive} requires named fields"),
        )),
    }
}

fn last_segment(ty: &Type) -> Option<&syn::PathSegment> {
    match ty {
        Type::Path(path) if path.qself.is_none() => path.path.segments.last(),
        _ => None,
    }
}

fn generic_argument<'a>(ty: &'a Type, wrapper: &str) -> Option<&'a Type> {
    let segment = last_segment(ty)?;
    if segment.ident != wrapper {
        return None;
    }
    let PathArguments::AngleBracketed(args) = &segment.arguments else {
        return None;
    };
    match args.args.first() {
        Some(GenericArgument::Type(inner)) if args.args.len() == 1 => Some(inner),
        _ => None,
    }
}
