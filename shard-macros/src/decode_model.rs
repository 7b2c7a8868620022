use quote::ToTokens;
use syn::{ItemStruct, LitStr, parse::ParseBuffer};

pub(crate) struct ModelMetadata {
    pub(crate) table: String,
    pub(crate) database: Option<String>,
}

pub fn decode_model(item: &ItemStruct) -> ModelMetadata {
    let mut table = item.ident.to_string();
    let mut database = None;
    for attr in &item.attrs {
        let meta = &attr.meta;
        if !meta.path().is_ident("orm") {
            continue;
        }
        let Ok(list) = meta.require_list() else {
            panic!("Error while parsing `orm`, use it like: `#[orm(table = \"accounts\")]`");
        };
        let _ = list.parse_nested_meta(|arg| {
            if arg.path.is_ident("table") {
                let Ok(value) = arg.value().and_then(ParseBuffer::parse::<LitStr>) else {
                    panic!("Error while parsing `table`, use it like: `#[orm(table = \"accounts\")]`");
                };
                table = value.value();
            } else if arg.path.is_ident("database") {
                let Ok(value) = arg.value().and_then(ParseBuffer::parse::<LitStr>) else {
                    panic!("Error while parsing `database`, use it like: `#[orm(database = \"main\")]`");
                };
                database = Some(value.value());
            } else {
                panic!(
                    "Unknown attribute `{}` inside orm macro",
                    arg.path.to_token_stream()
                );
            }
            Ok(())
        });
    }
    ModelMetadata { table, database }
}
