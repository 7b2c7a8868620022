use syn::{Field, Ident, LitStr, Type};

pub(crate) struct FieldMetadata {
    pub(crate) ident: Ident,
    pub(crate) ty: Type,
    pub(crate) name: String,
    /// `;` separated, as written in the `orm` attributes.
    pub(crate) directives: String,
}

pub fn decode_field(field: &Field) -> FieldMetadata {
    let ident = field
        .ident
        .clone()
        .expect("Model fields are expected to have a name");
    let mut directives = Vec::new();
    for attr in &field.attrs {
        let meta = &attr.meta;
        if !meta.path().is_ident("orm") {
            continue;
        }
        let Ok(v) = meta.require_list().and_then(|v| v.parse_args::<LitStr>()) else {
            panic!("Error while parsing `orm`, use it like #[orm(\"pk;column(id)\")]");
        };
        directives.push(v.value());
    }
    FieldMetadata {
        name: ident.to_string(),
        ident,
        ty: field.ty.clone(),
        directives: directives.join(";"),
    }
}
