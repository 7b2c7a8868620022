use crate::{DEFAULT_ALIAS, silent_logs};
use indoc::indoc;
use shard::{
    Driver, Model, OrmError, Query, Registry, SemanticType, Session, Value, decode,
    DecodePolicy, stream::TryStreamExt,
};
use std::sync::{Arc, LazyLock};
use tokio::sync::Mutex;

#[derive(Model, Default, Debug, Clone, PartialEq)]
#[orm(database = "default")]
pub struct Account {
    #[orm("pk;column(ID)")]
    pub id: i64,
    #[orm("column(Name)")]
    pub name: String,
    #[orm("uk;column(Balance)")]
    pub balance: f64,
}

static MUTEX: LazyLock<Mutex<()>> = LazyLock::new(|| Mutex::new(()));

fn text(value: &Value) -> String {
    match decode(SemanticType::Text, value.clone(), DecodePolicy::Strict) {
        Ok(Value::Varchar(v)) => v,
        other => panic!("Expected text, got {:?}", other),
    }
}

pub async fn accounts<D: Driver>(connection: D::Connection) {
    let _lock = MUTEX.lock().await;

    let mut registry = Registry::<D>::new();
    registry
        .add_connection(DEFAULT_ALIAS, connection)
        .expect("Failed to add the connection");
    registry
        .register::<Account>()
        .expect("Failed to register Account");
    let error = silent_logs! {
        registry
            .register::<Account>()
            .expect_err("Registering Account twice must fail")
    };
    assert!(matches!(
        error.downcast_ref::<OrmError>(),
        Some(OrmError::DuplicateModel(..))
    ));
    let registry = Arc::new(registry);
    let mut session =
        Session::for_model::<Account>(registry.clone()).expect("Failed to open a session");
    assert_eq!(session.alias(), DEFAULT_ALIAS);

    // Setup
    session
        .exec("DROP TABLE IF EXISTS `Account`")
        .await
        .expect("Failed to drop the Account table");
    session
        .exec(indoc! {"
            CREATE TABLE `Account` (
                `ID` BIGINT NOT NULL AUTO_INCREMENT PRIMARY KEY,
                `Name` VARCHAR(255) NOT NULL,
                `Balance` DOUBLE NOT NULL UNIQUE
            )
        "})
        .await
        .expect("Failed to create the Account table");

    // Insert
    let mut alice = Account {
        id: 0,
        name: "Alice".into(),
        balance: 100.5,
    };
    alice.id = session
        .insert(&alice)
        .await
        .expect("Failed to insert Alice");
    let mut bob = Account {
        id: 0,
        name: "Bob".into(),
        balance: -20.25,
    };
    bob.id = session.insert(&bob).await.expect("Failed to insert Bob");
    assert!(alice.id > 0);
    assert_ne!(alice.id, bob.id);

    // Read on the unique key
    let mut account = Account {
        balance: 100.5,
        ..Default::default()
    };
    session
        .read(&mut account, &[])
        .await
        .expect("Failed to read Alice by balance");
    assert_eq!(account, alice);

    // Read on explicit columns
    let mut account = Account {
        id: bob.id,
        ..Default::default()
    };
    session
        .read(&mut account, &["ID"])
        .await
        .expect("Failed to read Bob by id");
    assert_eq!(account, bob);
    let mut account = Account {
        name: "Alice".into(),
        balance: 100.5,
        ..Default::default()
    };
    session
        .read(&mut account, &["name", "Balance"])
        .await
        .expect("Failed to read Alice by name and balance");
    assert_eq!(account, alice);

    // Nothing matches
    let mut missing = Account {
        balance: 1.0,
        ..Default::default()
    };
    let error = silent_logs! {
        session
            .read(&mut missing, &[])
            .await
            .expect_err("Reading a missing account must fail")
    };
    assert_eq!(error.downcast_ref::<OrmError>(), Some(&OrmError::NoRowsFound));
    assert_eq!(
        missing,
        Account {
            balance: 1.0,
            ..Default::default()
        }
    );
    let error = silent_logs! {
        session
            .read(&mut missing, &["Missing"])
            .await
            .expect_err("Reading on an unknown column must fail")
    };
    assert!(matches!(
        error.downcast_ref::<OrmError>(),
        Some(OrmError::UnknownColumn { .. })
    ));

    // Update
    alice.name = "Alice Cooper".into();
    let affected = session
        .update(&alice, &["Name"])
        .await
        .expect("Failed to update the name of Alice");
    assert_eq!(affected, 1);
    bob.name = "Robert".into();
    let affected = session
        .update(&bob, &[])
        .await
        .expect("Failed to update every column of Bob");
    assert_eq!(affected, 1);
    let mut account = Account {
        id: bob.id,
        ..Default::default()
    };
    session
        .read(&mut account, &["ID"])
        .await
        .expect("Failed to read Bob after the update");
    assert_eq!(account, bob);
    for key in ["Balance", "ID", "id"] {
        let error = silent_logs! {
            session
                .update(&alice, &[key])
                .await
                .expect_err("Updating a key must fail")
        };
        assert!(matches!(
            error.downcast_ref::<OrmError>(),
            Some(OrmError::CannotUpdateKey { .. })
        ));
    }

    // Raw statements
    let result = session
        .exec(
            Query::new("UPDATE `Account` SET `Balance` = ? WHERE `ID` = ?")
                .bind(250.0)
                .bind(alice.id),
        )
        .await
        .expect("Failed to update the balance of Alice");
    assert_eq!(result.rows_affected, 1);
    alice.balance = 250.0;
    let rows = session
        .query(Query::new("SELECT `Name`, `Balance` FROM `Account` WHERE `ID` = ?").bind(alice.id))
        .try_collect::<Vec<_>>()
        .await
        .expect("Failed to query Alice");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].names(), ["Name", "Balance"]);
    assert_eq!(text(&rows[0].values[0]), "Alice Cooper");
    assert_eq!(text(&rows[0].values[1]), "250");

    // Delete
    let affected = session.delete(&bob).await.expect("Failed to delete Bob");
    assert_eq!(affected, 1);
    let mut account = bob.clone();
    let error = silent_logs! {
        session
            .read(&mut account, &[])
            .await
            .expect_err("Bob must be gone")
    };
    assert_eq!(error.downcast_ref::<OrmError>(), Some(&OrmError::NoRowsFound));
    let affected = session
        .delete(&bob)
        .await
        .expect("Deleting a missing row is not an error");
    assert_eq!(affected, 0);
    let mut account = Account {
        balance: 250.0,
        ..Default::default()
    };
    session
        .read(&mut account, &[])
        .await
        .expect("Failed to read Alice");
    assert_eq!(account, alice);
}
