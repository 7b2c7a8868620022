use crate::{
    Attribute, DIRECTIVE_DELIMITER, DecodePolicy, FieldAccessor, Model, OrmError, Parameter,
    Result, SemanticType, SqlWriter, Value, decode, logged, parse_directives, separated_by,
};
use std::{
    any::Any,
    collections::HashMap,
    fmt::{self, Debug},
};

#[derive(Debug, Clone, PartialEq)]
pub struct FieldMetadata {
    pub name: &'static str,
    pub column: String,
    pub primary_key: bool,
    pub unique_key: bool,
    /// Position in the select-all column list and in [`Model::fields`].
    pub index: usize,
    pub semantic_type: SemanticType,
}

/// Structural description of a registered model, immutable once built.
pub struct TypeMetadata {
    pub type_name: &'static str,
    pub full_name: &'static str,
    pub table: String,
    pub fields: Vec<FieldMetadata>,
    pub column_to_field: HashMap<String, usize>,
    pub field_to_column: HashMap<&'static str, String>,
    /// Quoted, comma separated columns in declaration order.
    pub all_columns: String,
    pub unique_key: Option<String>,
    pub primary_key: Option<String>,
    accessors: Box<dyn Any + Send + Sync>,
}

impl TypeMetadata {
    pub fn from_model<M: Model>() -> Result<Self> {
        let model = M::full_name();
        let accessors = M::fields();
        let mut fields = Vec::with_capacity(accessors.len());
        let mut column_to_field = HashMap::with_capacity(accessors.len());
        let mut field_to_column = HashMap::with_capacity(accessors.len());
        let mut primary_key: Option<String> = None;
        let mut unique_key: Option<String> = None;
        for (index, accessor) in accessors.iter().enumerate() {
            let directives = parse_directives(accessor.directives, DIRECTIVE_DELIMITER);
            let column = match directives.get(Parameter::Column) {
                Some(column) if !column.is_empty() => column.to_owned(),
                _ => accessor.name.to_owned(),
            };
            let Some(semantic_type) = SemanticType::from_type_name(accessor.type_name) else {
                return Err(logged(OrmError::UnsupportedFieldType {
                    model: model.into(),
                    field: accessor.name.into(),
                    type_name: accessor.type_name.into(),
                }));
            };
            if column_to_field.insert(column.clone(), index).is_some() {
                return Err(logged(OrmError::DuplicateColumn {
                    model: model.into(),
                    column,
                }));
            }
            let field = FieldMetadata {
                name: accessor.name,
                column: column.clone(),
                primary_key: directives.has(Attribute::PrimaryKey),
                unique_key: directives.has(Attribute::UniqueKey),
                index,
                semantic_type,
            };
            for (enabled, role, slot) in [
                (field.primary_key, "primary key", &mut primary_key),
                (field.unique_key, "unique key", &mut unique_key),
            ] {
                if !enabled {
                    continue;
                }
                if let Some(first) = slot {
                    return Err(logged(OrmError::DuplicateKey {
                        model: model.into(),
                        role,
                        first: first.clone(),
                        second: column,
                    }));
                }
                *slot = Some(column.clone());
            }
            field_to_column.insert(accessor.name, column);
            fields.push(field);
        }
        if primary_key.is_none() && unique_key.is_none() {
            return Err(logged(OrmError::MissingKey(model.into())));
        }
        let mut all_columns = String::new();
        separated_by(
            &mut all_columns,
            &fields,
            |out, field| SqlWriter.write_identifier_quoted(out, &field.column),
            ", ",
        );
        Ok(Self {
            type_name: M::type_name(),
            full_name: model,
            table: M::table_name().to_owned(),
            fields,
            column_to_field,
            field_to_column,
            all_columns,
            unique_key,
            primary_key,
            accessors: Box::new(accessors),
        })
    }

    pub fn field(&self, column: &str) -> Option<&FieldMetadata> {
        self.column_to_field.get(column).map(|i| &self.fields[*i])
    }

    /// Look a field up by column name first, then by field name.
    pub fn resolve(&self, name: &str) -> Result<&FieldMetadata> {
        self.field(name)
            .or_else(|| self.fields.iter().find(|v| v.name == name))
            .ok_or_else(|| {
                logged(OrmError::UnknownColumn {
                    model: self.full_name.into(),
                    column: name.into(),
                })
            })
    }

    /// The default condition of single row statements: the unique key, else the primary key.
    pub fn condition_column(&self) -> Result<&FieldMetadata> {
        self.unique_key
            .as_deref()
            .or(self.primary_key.as_deref())
            .and_then(|column| self.field(column))
            .ok_or_else(|| logged(OrmError::UnknownConditionColumn(self.full_name.into())))
    }

    pub fn accessors<M: Model>(&self) -> Result<&[FieldAccessor<M>]> {
        self.accessors
            .downcast_ref::<Vec<FieldAccessor<M>>>()
            .map(Vec::as_slice)
            .ok_or_else(|| logged(OrmError::UnknownModel(M::full_name().into())))
    }

    fn accessor<M: Model>(&self, field: &FieldMetadata) -> Result<FieldAccessor<M>> {
        self.accessors::<M>()?
            .get(field.index)
            .copied()
            .ok_or_else(|| {
                logged(OrmError::UnknownColumn {
                    model: self.full_name.into(),
                    column: field.column.clone(),
                })
            })
    }

    pub fn value_of<M: Model>(&self, record: &M, field: &FieldMetadata) -> Result<Value> {
        Ok((self.accessor::<M>(field)?.get)(record))
    }

    /// Decode a driver value and store it into the field of `record`.
    pub fn assign<M: Model>(
        &self,
        record: &mut M,
        field: &FieldMetadata,
        value: Value,
        policy: DecodePolicy,
    ) -> Result<()> {
        let accessor = self.accessor::<M>(field)?;
        let value = decode(field.semantic_type, value, policy)?;
        (accessor.set)(record, value)
    }
}

impl Debug for TypeMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeMetadata")
            .field("type_name", &self.type_name)
            .field("full_name", &self.full_name)
            .field("table", &self.table)
            .field("fields", &self.fields)
            .field("unique_key", &self.unique_key)
            .field("primary_key", &self.primary_key)
            .finish_non_exhaustive()
    }
}

/// Registered models, keyed by full name.
#[derive(Default, Debug)]
pub struct Catalog {
    models: HashMap<&'static str, TypeMetadata>,
}

impl Catalog {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn register<M: Model>(&mut self) -> Result<&TypeMetadata> {
        let name = M::full_name();
        if self.models.contains_key(name) {
            return Err(logged(OrmError::DuplicateModel(name.into())));
        }
        let metadata = TypeMetadata::from_model::<M>()?;
        log::info!("Registered model `{}` on table `{}`", name, metadata.table);
        Ok(&*self.models.entry(name).or_insert(metadata))
    }

    pub fn get<M: Model>(&self) -> Result<&TypeMetadata> {
        self.get_by_name(M::full_name())
    }

    pub fn get_by_name(&self, full_name: &str) -> Result<&TypeMetadata> {
        self.models
            .get(full_name)
            .ok_or_else(|| logged(OrmError::UnknownModel(full_name.into())))
    }

    pub fn contains<M: Model>(&self) -> bool {
        self.models.contains_key(M::full_name())
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        AsValue, Catalog, DecodePolicy, FieldAccessor, Model, OrmError, SemanticType, Value,
    };

    #[derive(Default, Debug, PartialEq)]
    struct Account {
        id: i64,
        name: String,
        balance: f64,
    }

    impl Model for Account {
        fn type_name() -> &'static str {
            "Account"
        }
        fn full_name() -> &'static str {
            "bank::Account"
        }
        fn fields() -> Vec<FieldAccessor<Self>> {
            vec![
                FieldAccessor {
                    name: "id",
                    directives: "pk;column(ID)",
                    type_name: std::any::type_name::<i64>(),
                    get: |v| v.id.as_value(),
                    set: |v, value| {
                        v.id = i64::try_from_value(value)?;
                        Ok(())
                    },
                },
                FieldAccessor {
                    name: "name",
                    directives: "",
                    type_name: std::any::type_name::<String>(),
                    get: |v| v.name.clone().as_value(),
                    set: |v, value| {
                        v.name = String::try_from_value(value)?;
                        Ok(())
                    },
                },
                FieldAccessor {
                    name: "balance",
                    directives: "uk;column(Balance)",
                    type_name: std::any::type_name::<f64>(),
                    get: |v| v.balance.as_value(),
                    set: |v, value| {
                        v.balance = f64::try_from_value(value)?;
                        Ok(())
                    },
                },
            ]
        }
    }

    struct Keyless {
        value: u64,
    }

    impl Model for Keyless {
        fn type_name() -> &'static str {
            "Keyless"
        }
        fn full_name() -> &'static str {
            "bank::Keyless"
        }
        fn table_name() -> &'static str {
            "keyless_rows"
        }
        fn fields() -> Vec<FieldAccessor<Self>> {
            vec![FieldAccessor {
                name: "value",
                directives: "column(value)",
                type_name: std::any::type_name::<u64>(),
                get: |v| v.value.as_value(),
                set: |v, value| {
                    v.value = u64::try_from_value(value)?;
                    Ok(())
                },
            }]
        }
    }

    struct Unsupported {
        flag: bool,
    }

    impl Model for Unsupported {
        fn type_name() -> &'static str {
            "Unsupported"
        }
        fn full_name() -> &'static str {
            "bank::Unsupported"
        }
        fn fields() -> Vec<FieldAccessor<Self>> {
            vec![FieldAccessor {
                name: "flag",
                directives: "pk",
                type_name: std::any::type_name::<bool>(),
                get: |v| Value::Boolean(v.flag),
                set: |_, _| Ok(()),
            }]
        }
    }

    struct TwoPrimaryKeys;

    impl Model for TwoPrimaryKeys {
        fn type_name() -> &'static str {
            "TwoPrimaryKeys"
        }
        fn full_name() -> &'static str {
            "bank::TwoPrimaryKeys"
        }
        fn fields() -> Vec<FieldAccessor<Self>> {
            let field = |name| FieldAccessor {
                name,
                directives: "pk",
                type_name: "i64",
                get: |_| Value::Int64(0),
                set: |_, _| Ok(()),
            };
            vec![field("a"), field("b")]
        }
    }

    struct SameColumn;

    impl Model for SameColumn {
        fn type_name() -> &'static str {
            "SameColumn"
        }
        fn full_name() -> &'static str {
            "bank::SameColumn"
        }
        fn fields() -> Vec<FieldAccessor<Self>> {
            let field = |name, directives| FieldAccessor {
                name,
                directives,
                type_name: "i64",
                get: |_| Value::Int64(0),
                set: |_, _| Ok(()),
            };
            vec![field("a", "pk;column(x)"), field("b", "column(x)")]
        }
    }

    fn schema_error(error: crate::Error) -> OrmError {
        error
            .downcast_ref::<OrmError>()
            .cloned()
            .expect("Expected an OrmError")
    }

    #[test]
    fn register_account() {
        let mut catalog = Catalog::new();
        let metadata = catalog.register::<Account>().unwrap();
        assert_eq!(metadata.table, "Account");
        assert_eq!(metadata.all_columns, "`ID`, `name`, `Balance`");
        assert_eq!(metadata.primary_key.as_deref(), Some("ID"));
        assert_eq!(metadata.unique_key.as_deref(), Some("Balance"));
        assert_eq!(metadata.condition_column().unwrap().column, "Balance");
        assert_eq!(metadata.field_to_column["balance"], "Balance");
        assert_eq!(metadata.column_to_field["name"], 1);

        let id = metadata.field("ID").unwrap();
        assert!(id.primary_key);
        assert!(!id.unique_key);
        assert_eq!(id.semantic_type, SemanticType::SignedInteger64);
        assert_eq!(metadata.resolve("balance").unwrap().column, "Balance");
        assert_eq!(metadata.resolve("Balance").unwrap().index, 2);
        assert!(matches!(
            schema_error(metadata.resolve("missing").unwrap_err()),
            OrmError::UnknownColumn { .. }
        ));
        assert!(catalog.contains::<Account>());
        assert_eq!(catalog.len(), 1);
    }

    #[test]
    fn assign_and_read_fields() {
        let mut catalog = Catalog::new();
        let metadata = catalog.register::<Account>().unwrap();
        let mut account = Account::default();
        let balance = metadata.field("Balance").unwrap();
        metadata
            .assign(
                &mut account,
                balance,
                b"12.5".to_vec().into(),
                DecodePolicy::Lenient,
            )
            .unwrap();
        assert_eq!(account.balance, 12.5);
        assert_eq!(
            metadata.value_of(&account, balance).unwrap(),
            Value::Float64(12.5)
        );
    }

    #[test]
    fn missing_key() {
        let mut catalog = Catalog::new();
        let metadata = catalog.register::<Keyless>();
        assert!(matches!(
            schema_error(metadata.unwrap_err()),
            OrmError::MissingKey(..)
        ));
        assert!(!catalog.contains::<Keyless>());
    }

    #[test]
    fn duplicate_registration_keeps_first() {
        let mut catalog = Catalog::new();
        catalog.register::<Account>().unwrap();
        let error = catalog.register::<Account>().unwrap_err();
        assert_eq!(
            schema_error(error),
            OrmError::DuplicateModel("bank::Account".into())
        );
        assert_eq!(catalog.len(), 1);
        assert_eq!(
            catalog.get::<Account>().unwrap().all_columns,
            "`ID`, `name`, `Balance`"
        );
    }

    #[test]
    fn invalid_schemas() {
        let mut catalog = Catalog::new();
        assert_eq!(
            schema_error(catalog.register::<Unsupported>().unwrap_err()),
            OrmError::UnsupportedFieldType {
                model: "bank::Unsupported".into(),
                field: "flag".into(),
                type_name: "bool".into(),
            }
        );
        assert!(matches!(
            schema_error(catalog.register::<TwoPrimaryKeys>().unwrap_err()),
            OrmError::DuplicateKey { role: "primary key", .. }
        ));
        assert!(matches!(
            schema_error(catalog.register::<SameColumn>().unwrap_err()),
            OrmError::DuplicateColumn { .. }
        ));
        assert!(catalog.is_empty());
        assert!(matches!(
            schema_error(catalog.get::<Account>().unwrap_err()),
            OrmError::UnknownModel(..)
        ));
    }
}
