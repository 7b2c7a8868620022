use crate::{DEFAULT_ALIAS, silent_logs};
use indoc::indoc;
use shard::{Driver, Model, OrmError, Registry, Session, orm_error};
use std::sync::{Arc, LazyLock};
use tokio::sync::Mutex;

#[derive(Model, Default, Debug, Clone, PartialEq)]
#[orm(table = "transfers")]
struct Transfer {
    #[orm("pk")]
    id: i64,
    #[orm("uk")]
    reference: String,
    amount: f64,
}

static MUTEX: LazyLock<Mutex<()>> = LazyLock::new(|| Mutex::new(()));

async fn exists<D: Driver>(session: &mut Session<D>, reference: &str) -> bool {
    let mut transfer = Transfer {
        reference: reference.into(),
        ..Default::default()
    };
    match silent_logs! { session.read(&mut transfer, &[]).await } {
        Ok(()) => true,
        Err(e) if orm_error(&e) == Some(&OrmError::NoRowsFound) => false,
        Err(e) => panic!("Unexpected error while reading `{}`: {:#}", reference, e),
    }
}

pub async fn transactions<D: Driver>(connection: D::Connection) {
    let _lock = MUTEX.lock().await;

    let mut registry = Registry::<D>::new();
    registry
        .add_connection(DEFAULT_ALIAS, connection)
        .expect("Failed to add the connection");
    registry
        .register::<Transfer>()
        .expect("Failed to register Transfer");
    let mut session =
        Session::new(Arc::new(registry), DEFAULT_ALIAS).expect("Failed to open a session");

    // Setup
    session
        .exec("DROP TABLE IF EXISTS `transfers`")
        .await
        .expect("Failed to drop the transfers table");
    session
        .exec(indoc! {"
            CREATE TABLE `transfers` (
                `id` BIGINT NOT NULL AUTO_INCREMENT PRIMARY KEY,
                `reference` VARCHAR(64) NOT NULL UNIQUE,
                `amount` DOUBLE NOT NULL
            )
        "})
        .await
        .expect("Failed to create the transfers table");

    // Misuse
    let error = silent_logs! {
        session.commit().await.expect_err("Commit without begin must fail")
    };
    assert_eq!(orm_error(&error), Some(&OrmError::TransactionNotBegan));
    let error = silent_logs! {
        session.rollback().await.expect_err("Rollback without begin must fail")
    };
    assert_eq!(orm_error(&error), Some(&OrmError::TransactionNotBegan));
    session.begin().await.expect("Failed to begin");
    assert!(session.in_transaction());
    let error = silent_logs! {
        session.begin().await.expect_err("Beginning twice must fail")
    };
    assert_eq!(orm_error(&error), Some(&OrmError::TransactionAlreadyBegan));
    assert!(session.in_transaction());

    // Rollback discards
    session
        .insert(&Transfer {
            reference: "T-1".into(),
            amount: 10.0,
            ..Default::default()
        })
        .await
        .expect("Failed to insert T-1");
    assert!(exists(&mut session, "T-1").await);
    session.rollback().await.expect("Failed to rollback");
    assert!(!session.in_transaction());
    assert!(!exists(&mut session, "T-1").await);

    // Commit persists
    session.begin().await.expect("Failed to begin");
    let mut transfer = Transfer {
        reference: "T-2".into(),
        amount: 20.0,
        ..Default::default()
    };
    transfer.id = session
        .insert(&transfer)
        .await
        .expect("Failed to insert T-2");
    session
        .insert(&Transfer {
            reference: "T-3".into(),
            amount: 30.0,
            ..Default::default()
        })
        .await
        .expect("Failed to insert T-3");
    session.commit().await.expect("Failed to commit");
    assert!(exists(&mut session, "T-2").await);
    assert!(exists(&mut session, "T-3").await);

    // Update and delete, then roll them back
    session.begin().await.expect("Failed to begin");
    transfer.amount = 25.5;
    let affected = session
        .update(&transfer, &["amount"])
        .await
        .expect("Failed to update T-2");
    assert_eq!(affected, 1);
    let affected = session
        .delete(&Transfer {
            reference: "T-3".into(),
            ..Default::default()
        })
        .await
        .expect("Failed to delete T-3");
    assert_eq!(affected, 1);
    assert!(!exists(&mut session, "T-3").await);
    session.rollback().await.expect("Failed to rollback");
    assert!(exists(&mut session, "T-3").await);
    let mut loaded = Transfer {
        reference: "T-2".into(),
        ..Default::default()
    };
    session
        .read(&mut loaded, &[])
        .await
        .expect("Failed to read T-2");
    assert_eq!(loaded.amount, 20.0);

    // Same changes, committed
    session.begin().await.expect("Failed to begin");
    session
        .update(&transfer, &["amount"])
        .await
        .expect("Failed to update T-2");
    session
        .delete(&Transfer {
            reference: "T-3".into(),
            ..Default::default()
        })
        .await
        .expect("Failed to delete T-3");
    session.commit().await.expect("Failed to commit");
    assert!(!exists(&mut session, "T-3").await);
    let mut loaded = Transfer {
        reference: "T-2".into(),
        ..Default::default()
    };
    session
        .read(&mut loaded, &[])
        .await
        .expect("Failed to read T-2");
    assert_eq!(loaded, transfer);
}
