//! Record derive macro implementation

mod attrs;

use proc_macro2::TokenStream;
use quote::quote;
use syn::{Data, DeriveInput, Fields, Result};

use crate::common::syn_types::option_inner;

pub fn expand(input: DeriveInput) -> Result<TokenStream> {
    let name = &input.ident;
    let generics = &input.generics;
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    &input,
                    "Record can only be derived for structs with named fields",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                &input,
                "Record can only be derived for structs",
            ));
        }
    };

    let mut metas = Vec::with_capacity(fields.len());
    let mut values = Vec::with_capacity(fields.len());
    let mut extracts = Vec::with_capacity(fields.len());

    for field in fields {
        let Some(ident) = field.ident.as_ref() else {
            continue;
        };
        let attr = attrs::field_attr(field)?;
        let field_name = ident.to_string();
        let column = attr.column.unwrap_or_else(|| field_name.clone());
        let is_id = attr.is_id;

        metas.push(quote! {
            sqldao::FieldMeta { field: #field_name, column: #column, id: #is_id }
        });
        values.push(quote! {
            (#column, sqldao::Value::from(::std::clone::Clone::clone(&self.#ident)))
        });

        // Optional fields tolerate a missing column.
        let extract = if option_inner(&field.ty).is_some() {
            quote! {
                #ident: if row.contains_key(#column) { row.try_get(#column)? } else { None }
            }
        } else {
            quote! {
                #ident: row.try_get(#column)?
            }
        };
        extracts.push(extract);
    }

    Ok(quote! {
        impl #impl_generics sqldao::Record for #name #ty_generics #where_clause {
            const META: sqldao::RecordMeta = sqldao::RecordMeta {
                fields: &[#(#metas),*],
            };

            fn column_values(&self) -> ::std::vec::Vec<(&'static str, sqldao::Value)> {
                ::std::vec![#(#values),*]
            }
        }

        impl #impl_generics sqldao::FromRecord for #name #ty_generics #where_clause {
            fn from_record(row: &sqldao::RowMap) -> sqldao::DaoResult<Self> {
                Ok(Self {
                    #(#extracts),*
                })
            }
        }
    })
}
