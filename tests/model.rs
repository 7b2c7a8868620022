#[cfg(test)]
mod tests {
    use shard::{Catalog, Model, OrmError, Routed, SemanticType, Value, orm_error};

    #[derive(Model, Default, Debug, Clone, PartialEq)]
    #[orm(database = "ledger")]
    struct Account {
        #[orm("pk;column(ID)")]
        id: i64,
        #[orm("column(Name)")]
        name: String,
        #[orm("uk")]
        #[orm("column(Balance)")]
        balance: f64,
    }

    #[derive(Model, Default)]
    #[orm(table = "inventory_items")]
    struct Item {
        #[orm("PK")]
        sku: u64,
        #[orm("column()")]
        label: String,
        #[orm("")]
        weight: f64,
    }

    #[derive(Model, Default)]
    struct Orphan {
        value: i64,
    }

    #[derive(Model, Default)]
    struct Twins {
        #[orm("uk;column(code)")]
        first: String,
        #[orm("column(code)")]
        second: String,
    }

    #[test]
    fn names() {
        assert_eq!(Account::type_name(), "Account");
        assert_eq!(Account::table_name(), "Account");
        assert!(Account::full_name().ends_with("::tests::Account"));
        assert_eq!(Account::database(), "ledger");
        assert_eq!(Item::table_name(), "inventory_items");
        assert_ne!(Account::full_name(), Item::full_name());
    }

    #[test]
    fn fields() {
        let fields = Account::fields();
        assert_eq!(
            fields.iter().map(|v| v.name).collect::<Vec<_>>(),
            ["id", "name", "balance"]
        );
        assert_eq!(fields[2].directives, "uk;column(Balance)");
        let mut account = Account {
            id: 3,
            name: "Dave".into(),
            balance: 12.5,
        };
        assert_eq!((fields[0].get)(&account), Value::Int64(3));
        assert_eq!((fields[1].get)(&account), Value::Varchar("Dave".into()));
        (fields[2].set)(&mut account, Value::Float64(-1.0)).expect("Failed to set the balance");
        assert_eq!(account.balance, -1.0);
        assert!((fields[0].set)(&mut account, Value::Varchar("3".into())).is_err());
        assert_eq!(account.id, 3);
    }

    #[test]
    fn metadata() {
        let mut catalog = Catalog::new();
        let metadata = catalog
            .register::<Account>()
            .expect("Failed to register Account");
        assert_eq!(metadata.table, "Account");
        assert_eq!(metadata.all_columns, "`ID`, `Name`, `Balance`");
        assert_eq!(metadata.primary_key.as_deref(), Some("ID"));
        assert_eq!(metadata.unique_key.as_deref(), Some("Balance"));
        assert_eq!(metadata.field_to_column["name"], "Name");

        let metadata = catalog
            .register::<Item>()
            .expect("Failed to register Item");
        assert_eq!(metadata.all_columns, "`sku`, `label`, `weight`");
        assert_eq!(metadata.primary_key.as_deref(), Some("sku"));
        assert_eq!(metadata.unique_key, None);
        assert_eq!(
            metadata
                .fields
                .iter()
                .map(|v| v.semantic_type)
                .collect::<Vec<_>>(),
            [
                SemanticType::UnsignedInteger64,
                SemanticType::Text,
                SemanticType::Float64
            ]
        );
        assert_eq!(catalog.len(), 2);
    }

    #[test]
    fn invalid() {
        let mut catalog = Catalog::new();
        let error = catalog
            .register::<Orphan>()
            .expect_err("A model without keys must fail");
        assert!(matches!(orm_error(&error), Some(OrmError::MissingKey(..))));
        let error = catalog
            .register::<Twins>()
            .expect_err("Two fields on one column must fail");
        assert!(matches!(
            orm_error(&error),
            Some(OrmError::DuplicateColumn { column, .. }) if column == "code"
        ));
        assert!(catalog.is_empty());
    }
}
