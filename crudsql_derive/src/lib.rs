use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::ext::IdentExt;
use syn::spanned::Spanned;
use syn::{Data, DeriveInput, Fields, FieldsNamed, Ident, LitBool, LitStr, Type, parse_macro_input};

#[proc_macro_derive(Model, attributes(crud))]
pub fn derive_model(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match expand_model(input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

#[proc_macro_derive(Filter, attributes(crud))]
pub fn derive_filter(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match expand_filter(input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

#[derive(Default)]
struct ModelOptions {
    table: Option<String>,
    schema: Option<String>,
}

#[derive(Default)]
struct FieldOptions {
    key: bool,
    required: bool,
    editable: Option<bool>,
    read_only: Option<bool>,
    ignore_select: bool,
    ignore_insert: bool,
    ignore_update: bool,
    not_mapped: bool,
    column: Option<String>,
    enumeration: bool,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Kind {
    Integer,
    Float,
    Boolean,
    Text,
    Uuid,
    Timestamp,
    Date,
    Time,
    Bytes,
    Enumeration,
    Complex,
}

impl Kind {
    fn tokens(self) -> TokenStream2 {
        match self {
            Kind::Integer => quote!(::crudsql::FieldKind::Integer),
            Kind::Float => quote!(::crudsql::FieldKind::Float),
            Kind::Boolean => quote!(::crudsql::FieldKind::Boolean),
            Kind::Text => quote!(::crudsql::FieldKind::Text),
            Kind::Uuid => quote!(::crudsql::FieldKind::Uuid),
            Kind::Timestamp => quote!(::crudsql::FieldKind::Timestamp),
            Kind::Date => quote!(::crudsql::FieldKind::Date),
            Kind::Time => quote!(::crudsql::FieldKind::Time),
            Kind::Bytes => quote!(::crudsql::FieldKind::Bytes),
            Kind::Enumeration => quote!(::crudsql::FieldKind::Enumeration),
            Kind::Complex => quote!(::crudsql::FieldKind::Complex),
        }
    }
}

struct ModelField {
    ident: Ident,
    name: String,
    kind: Kind,
    options: FieldOptions,
}

impl ModelField {
    /// Has a column representation, so it can be read from and bound to SQL.
    fn is_bound(&self) -> bool {
        self.options.editable != Some(false)
            && (self.kind != Kind::Complex || self.options.editable == Some(true))
    }

    fn is_selected(&self) -> bool {
        self.is_bound() && !self.options.ignore_select && !self.options.not_mapped
    }
}

fn named_fields(input: DeriveInput, derive: &str) -> syn::Result<(Ident, FieldsNamed)> {
    let struct_name = input.ident;

    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            input.generics,
            format!("{} does not support generic structs", derive),
        ));
    }

    let data_struct = match input.data {
        Data::Struct(data) => data,
        _ => {
            return Err(syn::Error::new(
                struct_name.span(),
                format!("{} can only be derived for structs", derive),
            ));
        }
    };

    match data_struct.fields {
        Fields::Named(fields) => Ok((struct_name, fields)),
        _ => Err(syn::Error::new(
            struct_name.span(),
            format!("{} requires named fields", derive),
        )),
    }
}

fn expand_model(input: DeriveInput) -> syn::Result<TokenStream2> {
    let model_options = parse_model_options(&input.attrs)?;
    let (struct_name, named) = named_fields(input, "Model")?;

    let mut fields = Vec::<ModelField>::new();
    for field in named.named {
        let ident = field
            .ident
            .clone()
            .ok_or_else(|| syn::Error::new(field.span(), "Model requires named fields"))?;
        let options = parse_field_options(&field.attrs)?;
        let kind = if options.enumeration {
            Kind::Enumeration
        } else {
            field_kind(&field.ty)
        };
        fields.push(ModelField {
            name: ident.unraw().to_string(),
            ident,
            kind,
            options,
        });
    }

    let struct_label = struct_name.unraw().to_string();
    let table = optional_str(model_options.table.as_deref());
    let schema = optional_str(model_options.schema.as_deref());

    let descriptors = fields.iter().map(|field| {
        let name = &field.name;
        let kind = field.kind.tokens();
        let options = &field.options;
        let key = options.key;
        let required = options.required;
        let editable = optional_bool(options.editable);
        let read_only = optional_bool(options.read_only);
        let ignore_select = options.ignore_select;
        let ignore_insert = options.ignore_insert;
        let ignore_update = options.ignore_update;
        let not_mapped = options.not_mapped;
        let column = optional_str(options.column.as_deref());
        quote! {
            ::crudsql::FieldDescriptor::new(#name, #kind).with_markers(::crudsql::FieldMarkers {
                key: #key,
                required: #required,
                editable: #editable,
                read_only: #read_only,
                ignore_select: #ignore_select,
                ignore_insert: #ignore_insert,
                ignore_update: #ignore_update,
                not_mapped: #not_mapped,
                column: #column,
            })
        }
    });

    let bound = fields.iter().filter(|field| field.is_bound()).collect::<Vec<_>>();
    let bound_names = bound.iter().map(|field| &field.name).collect::<Vec<_>>();
    let bound_idents = bound.iter().map(|field| &field.ident).collect::<Vec<_>>();

    let row_fields = fields.iter().map(|field| {
        let ident = &field.ident;
        let name = &field.name;
        if field.is_selected() {
            quote!(#ident: row.get(#name)?)
        } else {
            quote!(#ident: ::core::default::Default::default())
        }
    });

    Ok(quote! {
        impl ::crudsql::Model for #struct_name {
            fn descriptor() -> &'static ::crudsql::ModelDescriptor {
                static DESCRIPTOR: ::crudsql::ModelDescriptor = ::crudsql::ModelDescriptor {
                    name: #struct_label,
                    module: ::core::module_path!(),
                    table: #table,
                    schema: #schema,
                    fields: &[#(#descriptors),*],
                };
                &DESCRIPTOR
            }

            fn field_value(&self, field: &str) -> ::core::option::Option<::crudsql::Value> {
                match field {
                    #(#bound_names => ::core::option::Option::Some(
                        ::crudsql::IntoValue::to_value(&self.#bound_idents)
                    ),)*
                    _ => ::core::option::Option::None,
                }
            }

            fn set_field_value(
                &mut self,
                field: &str,
                value: ::crudsql::Value,
            ) -> ::crudsql::Result<()> {
                match field {
                    #(#bound_names => {
                        self.#bound_idents = ::crudsql::FromValue::from_value(value)?;
                        ::core::result::Result::Ok(())
                    })*
                    other => ::core::result::Result::Err(::crudsql::CrudError::Conversion(
                        ::std::format!("{} has no column-backed field '{}'", #struct_label, other),
                    )),
                }
            }

            fn from_row(row: &::crudsql::Row) -> ::crudsql::Result<Self> {
                ::core::result::Result::Ok(Self {
                    #(#row_fields,)*
                })
            }
        }
    })
}

fn expand_filter(input: DeriveInput) -> syn::Result<TokenStream2> {
    let (struct_name, named) = named_fields(input, "Filter")?;

    let mut idents = Vec::<Ident>::new();
    let mut names = Vec::<String>::new();
    for field in named.named {
        let ident = field
            .ident
            .clone()
            .ok_or_else(|| syn::Error::new(field.span(), "Filter requires named fields"))?;
        names.push(ident.unraw().to_string());
        idents.push(ident);
    }

    Ok(quote! {
        impl ::crudsql::Filter for #struct_name {
            fn filter_fields() -> &'static [&'static str] {
                &[#(#names),*]
            }

            fn filter_value(&self, field: &str) -> ::crudsql::Value {
                match field {
                    #(#names => ::crudsql::IntoValue::to_value(&self.#idents),)*
                    _ => ::crudsql::Value::Null,
                }
            }
        }
    })
}

fn optional_str(value: Option<&str>) -> TokenStream2 {
    match value {
        Some(value) => quote!(::core::option::Option::Some(#value)),
        None => quote!(::core::option::Option::None),
    }
}

fn optional_bool(value: Option<bool>) -> TokenStream2 {
    match value {
        Some(value) => quote!(::core::option::Option::Some(#value)),
        None => quote!(::core::option::Option::None),
    }
}

/// Storage kind from the field's type syntax; `Option<T>` takes the kind of `T`.
fn field_kind(ty: &Type) -> Kind {
    match ty {
        Type::Reference(reference) => field_kind(reference.elem.as_ref()),
        Type::Group(group) => field_kind(group.elem.as_ref()),
        Type::Paren(paren) => field_kind(paren.elem.as_ref()),
        Type::Path(path) => {
            let Some(segment) = path.path.segments.last() else {
                return Kind::Complex;
            };
            match segment.ident.to_string().as_str() {
                "i8" | "i16" | "i32" | "i64" | "isize" | "u8" | "u16" | "u32" | "u64" | "usize" => {
                    Kind::Integer
                }
                "f32" | "f64" => Kind::Float,
                "bool" => Kind::Boolean,
                "String" | "str" | "char" => Kind::Text,
                "Uuid" => Kind::Uuid,
                "NaiveDateTime" | "DateTime" => Kind::Timestamp,
                "NaiveDate" => Kind::Date,
                "NaiveTime" => Kind::Time,
                "Vec" => match first_generic_type(segment) {
                    Some(Type::Path(inner)) if inner.path.is_ident("u8") => Kind::Bytes,
                    _ => Kind::Complex,
                },
                "Option" => first_generic_type(segment)
                    .map(|inner| field_kind(&inner))
                    .unwrap_or(Kind::Complex),
                _ => Kind::Complex,
            }
        }
        _ => Kind::Complex,
    }
}

fn first_generic_type(segment: &syn::PathSegment) -> Option<Type> {
    let syn::PathArguments::AngleBracketed(arguments) = &segment.arguments else {
        return None;
    };

    for arg in &arguments.args {
        if let syn::GenericArgument::Type(ty) = arg {
            return Some(ty.clone());
        }
    }
    None
}

fn parse_model_options(attrs: &[syn::Attribute]) -> syn::Result<ModelOptions> {
    let mut options = ModelOptions::default();

    for attr in attrs {
        if !attr.path().is_ident("crud") {
            continue;
        }

        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("table") {
                let lit: LitStr = meta.value()?.parse()?;
                options.table = Some(lit.value());
                return Ok(());
            }

            if meta.path.is_ident("schema") {
                let lit: LitStr = meta.value()?.parse()?;
                options.schema = Some(lit.value());
                return Ok(());
            }

            Err(meta.error(
                "Unsupported #[crud(...)] model option. Supported: table = \"...\", schema = \"...\"",
            ))
        })?;
    }

    Ok(options)
}

fn parse_field_options(attrs: &[syn::Attribute]) -> syn::Result<FieldOptions> {
    let mut options = FieldOptions::default();

    for attr in attrs {
        if !attr.path().is_ident("crud") {
            continue;
        }

        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("key") {
                options.key = true;
            } else if meta.path.is_ident("required") {
                options.required = true;
            } else if meta.path.is_ident("editable") {
                options.editable = Some(parse_flag(&meta)?);
            } else if meta.path.is_ident("read_only") {
                options.read_only = Some(parse_flag(&meta)?);
            } else if meta.path.is_ident("ignore_select") {
                options.ignore_select = true;
            } else if meta.path.is_ident("ignore_insert") {
                options.ignore_insert = true;
            } else if meta.path.is_ident("ignore_update") {
                options.ignore_update = true;
            } else if meta.path.is_ident("not_mapped") {
                options.not_mapped = true;
            } else if meta.path.is_ident("enumeration") {
                options.enumeration = true;
            } else if meta.path.is_ident("column") {
                let lit: LitStr = meta.value()?.parse()?;
                if lit.value().trim().is_empty() {
                    return Err(syn::Error::new(lit.span(), "column name cannot be empty"));
                }
                options.column = Some(lit.value());
            } else {
                return Err(meta.error(
                    "Unsupported #[crud(...)] field option. Supported: key, required, editable = bool, \
                     read_only, ignore_select, ignore_insert, ignore_update, not_mapped, enumeration, column = \"...\"",
                ));
            }
            Ok(())
        })?;
    }

    Ok(options)
}

/// `name` alone means `true`; `name = <bool>` is explicit.
fn parse_flag(meta: &syn::meta::ParseNestedMeta) -> syn::Result<bool> {
    if meta.input.peek(syn::Token![=]) {
        let lit: LitBool = meta.value()?.parse()?;
        Ok(lit.value)
    } else {
        Ok(true)
    }
}
