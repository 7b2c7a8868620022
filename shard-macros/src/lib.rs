mod decode_field;
mod decode_model;

use decode_field::decode_field;
use decode_model::decode_model;
use proc_macro::TokenStream;
use quote::quote;
use syn::{Fields, ItemStruct, parse_macro_input};

#[proc_macro_derive(Model, attributes(orm))]
pub fn derive_model(input: TokenStream) -> TokenStream {
    let item: ItemStruct = parse_macro_input!(input as ItemStruct);
    let name = &item.ident;
    if !item.generics.params.is_empty() {
        panic!("Model `{}` cannot have generic parameters", name);
    }
    let Fields::Named(..) = &item.fields else {
        panic!("Model `{}` must be a struct with named fields", name);
    };
    let type_name = name.to_string();
    let model = decode_model(&item);
    let table = &model.table;
    let accessors = item.fields.iter().map(decode_field).map(|field| {
        let ident = &field.ident;
        let ty = &field.ty;
        let field_name = &field.name;
        let directives = &field.directives;
        quote! {
            ::shard::FieldAccessor {
                name: #field_name,
                directives: #directives,
                type_name: ::std::any::type_name::<#ty>(),
                get: |record: &#name| -> ::shard::Value {
                    ::shard::AsValue::as_value(::std::clone::Clone::clone(&record.#ident))
                },
                set: |record: &mut #name, value: ::shard::Value| -> ::shard::Result<()> {
                    record.#ident = <#ty as ::shard::AsValue>::try_from_value(value)?;
                    Ok(())
                },
            }
        }
    });
    let routed = model.database.as_ref().map(|database| {
        quote! {
            impl ::shard::Routed for #name {
                fn database() -> &'static str {
                    #database
                }
            }
        }
    });
    quote! {
        impl ::shard::Model for #name {
            fn type_name() -> &'static str {
                #type_name
            }

            fn full_name() -> &'static str {
                ::std::concat!(::std::module_path!(), "::", #type_name)
            }

            fn table_name() -> &'static str {
                #table
            }

            fn fields() -> ::std::vec::Vec<::shard::FieldAccessor<Self>> {
                ::std::vec![#(#accessors),*]
            }
        }
        #routed
    }
    .into()
}
