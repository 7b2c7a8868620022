#[cfg(test)]
mod tests {
    use indoc::indoc;
    use shard::{
        Connection, DecodePolicy, Model, OrmError, PoolOptions, Registry, RegistryOptions,
        Session, orm_error,
    };
    use shard_tests::{
        Account, DEFAULT_ALIAS, MemoryConnection, MemoryDriver, StatementRecord, execute_tests,
        init_logs, silent_logs,
    };
    use std::sync::Arc;

    #[derive(Model, Default, Debug, PartialEq)]
    #[orm(table = "gauges")]
    struct Gauge {
        #[orm("pk")]
        id: i64,
        reading: i64,
    }

    fn registry(connection: MemoryConnection) -> Registry<MemoryDriver> {
        let mut registry = Registry::new();
        registry
            .add_connection(DEFAULT_ALIAS, connection)
            .expect("Failed to add the connection");
        registry
    }

    async fn gauges(connection: &MemoryConnection) {
        let mut connection = connection.clone();
        for sql in [
            "CREATE TABLE `gauges` (`id` BIGINT AUTO_INCREMENT, `reading` VARCHAR(16))",
            "INSERT INTO `gauges` (`reading`) VALUES ('12')",
            "INSERT INTO `gauges` (`reading`) VALUES ('twelve')",
            "INSERT INTO `gauges` (`reading`) VALUES ('-3')",
        ] {
            shard::Executor::execute(&mut connection, sql.into())
                .await
                .expect("Failed to prepare the gauges table");
        }
    }

    #[tokio::test]
    async fn memory() {
        init_logs();
        execute_tests::<MemoryDriver>(MemoryConnection::new()).await;
    }

    #[tokio::test]
    async fn memory_text_protocol() {
        init_logs();
        execute_tests::<MemoryDriver>(MemoryConnection::new().with_text_protocol(true)).await;
    }

    #[tokio::test]
    async fn register_database() {
        init_logs();
        let mut registry = Registry::<MemoryDriver>::new();
        registry
            .register_database(
                "main",
                "memory://main",
                PoolOptions::new().max_idle(2).max_open(8),
            )
            .await
            .expect("Failed to register the main database");
        registry
            .register_database("text", "memory://text?protocol=text", PoolOptions::new())
            .await
            .expect("Failed to register the text database");
        silent_logs! {
            let error = registry
                .register_database("main", "memory://other", PoolOptions::new())
                .await
                .expect_err("The alias is taken");
            assert_eq!(
                orm_error(&error),
                Some(&OrmError::DuplicateAlias("main".into()))
            );
            assert!(
                registry
                    .register_database("offline", "memory://offline", PoolOptions::new())
                    .await
                    .is_err(),
                "The ping must fail"
            );
            assert!(
                registry
                    .register_database("wrong", "mysql://localhost", PoolOptions::new())
                    .await
                    .is_err(),
                "Urls of other drivers must fail"
            );
            let error = registry
                .connection("offline")
                .expect_err("A failed registration leaves no alias behind");
            assert_eq!(
                orm_error(&error),
                Some(&OrmError::UnknownAlias("offline".into()))
            );
        }
        let mut aliases = registry.aliases().collect::<Vec<_>>();
        aliases.sort();
        assert_eq!(aliases, ["main", "text"]);
    }

    #[tokio::test]
    async fn wrong_url() {
        silent_logs! {
            assert!(
                MemoryConnection::connect("sqlite://memory".into(), &PoolOptions::new())
                    .await
                    .is_err()
            );
        };
    }

    #[tokio::test]
    async fn statements_routing() {
        init_logs();
        let connection = MemoryConnection::new();
        let mut registry = registry(connection.clone());
        registry
            .register::<Account>()
            .expect("Failed to register Account");
        let mut session = Session::for_model::<Account>(Arc::new(registry))
            .expect("Failed to open a session");
        session
            .exec(indoc! {"
                CREATE TABLE `Account` (
                    `ID` BIGINT AUTO_INCREMENT,
                    `Name` VARCHAR(255),
                    `Balance` DOUBLE
                )
            "})
            .await
            .expect("Failed to create the Account table");
        let account = Account {
            id: 0,
            name: "Carol".into(),
            balance: 7.0,
        };
        session
            .insert(&account)
            .await
            .expect("Failed to insert Carol");
        connection
            .clear_statements()
            .expect("Failed to clear the statements");

        let mut loaded = Account {
            balance: 7.0,
            ..Default::default()
        };
        session
            .read(&mut loaded, &[])
            .await
            .expect("Failed to read Carol");
        session.begin().await.expect("Failed to begin");
        session
            .read(&mut loaded, &[])
            .await
            .expect("Failed to read Carol in a transaction");
        session.commit().await.expect("Failed to commit");
        assert_eq!(
            connection.statements().expect("Failed to get the statements"),
            [
                StatementRecord {
                    sql: "SELECT `ID`, `Name`, `Balance` FROM `Account` WHERE `Balance` = ?"
                        .into(),
                    transactional: false,
                },
                StatementRecord {
                    sql: "SELECT `ID`, `Name`, `Balance` FROM `Account` WHERE `Balance` = ? FOR UPDATE"
                        .into(),
                    transactional: true,
                },
            ]
        );

        connection
            .clear_statements()
            .expect("Failed to clear the statements");
        let error = silent_logs! {
            session
                .update(&loaded, &["Name", "Balance"])
                .await
                .expect_err("Updating the unique key must fail")
        };
        assert!(matches!(
            orm_error(&error),
            Some(OrmError::CannotUpdateKey { column, .. }) if column == "Balance"
        ));
        assert!(
            connection
                .statements()
                .expect("Failed to get the statements")
                .is_empty(),
            "A rejected update must not reach the database"
        );
    }

    #[tokio::test]
    async fn decode_policies() {
        init_logs();
        let connection = MemoryConnection::new();
        gauges(&connection).await;

        let mut registry = registry(connection.clone());
        registry
            .register::<Gauge>()
            .expect("Failed to register Gauge");
        let mut session =
            Session::new(Arc::new(registry), DEFAULT_ALIAS).expect("Failed to open a session");
        let mut loaded = Vec::<Gauge>::new();
        silent_logs! {
            session
                .query_into(&mut loaded, "SELECT * FROM `gauges` ORDER BY `id`")
                .await
                .expect("Lenient decoding must not fail");
        }
        assert_eq!(
            loaded.iter().map(|v| v.reading).collect::<Vec<_>>(),
            [12, 0, -3]
        );

        let mut registry = Registry::<MemoryDriver>::with_options(
            RegistryOptions::default().decode_policy(DecodePolicy::Strict),
        );
        registry
            .add_connection(DEFAULT_ALIAS, connection)
            .expect("Failed to add the connection");
        registry
            .register::<Gauge>()
            .expect("Failed to register Gauge");
        let mut session =
            Session::new(Arc::new(registry), DEFAULT_ALIAS).expect("Failed to open a session");
        let mut loaded = Vec::<Gauge>::new();
        let error = silent_logs! {
            session
                .query_into(&mut loaded, "SELECT * FROM `gauges` ORDER BY `id`")
                .await
                .expect_err("Strict decoding must fail")
        };
        assert!(matches!(orm_error(&error), Some(OrmError::Decoding { .. })));
        assert_eq!(loaded, [Gauge { id: 1, reading: 12 }]);

        let mut gauge = Gauge {
            id: 2,
            reading: 99,
        };
        let error = silent_logs! {
            session
                .read(&mut gauge, &[])
                .await
                .expect_err("Strict decoding must fail")
        };
        assert!(matches!(orm_error(&error), Some(OrmError::Decoding { .. })));
        assert_eq!(gauge, Gauge { id: 2, reading: 99 });
        let mut gauge = Gauge {
            id: 3,
            ..Default::default()
        };
        session
            .read(&mut gauge, &[])
            .await
            .expect("Failed to read a valid gauge");
        assert_eq!(gauge.reading, -3);
    }

    #[tokio::test]
    async fn switch_alias() {
        init_logs();
        let first = MemoryConnection::new();
        let second = MemoryConnection::new();
        gauges(&second).await;
        let mut registry = registry(first);
        registry
            .add_connection("second", second)
            .expect("Failed to add the second connection");
        registry
            .register::<Gauge>()
            .expect("Failed to register Gauge");
        let mut session =
            Session::new(Arc::new(registry), DEFAULT_ALIAS).expect("Failed to open a session");
        let mut gauge = Gauge {
            id: 1,
            ..Default::default()
        };
        silent_logs! {
            assert!(
                session.read(&mut gauge, &[]).await.is_err(),
                "The first database has no gauges table"
            );
            let error = session
                .using("missing")
                .expect_err("Unknown aliases must fail");
            assert_eq!(
                orm_error(&error),
                Some(&OrmError::UnknownAlias("missing".into()))
            );
        }
        assert_eq!(session.alias(), DEFAULT_ALIAS);
        session
            .using("second")
            .expect("Failed to switch to the second database");
        assert_eq!(session.alias(), "second");
        session
            .read(&mut gauge, &[])
            .await
            .expect("Failed to read from the second database");
        assert_eq!(gauge.reading, 12);
        assert!(Session::new(session.registry().clone(), "missing").is_err());
    }

    #[tokio::test]
    #[should_panic]
    async fn switch_alias_in_transaction() {
        let mut registry = registry(MemoryConnection::new());
        registry
            .add_connection("second", MemoryConnection::new())
            .expect("Failed to add the second connection");
        let mut session =
            Session::new(Arc::new(registry), DEFAULT_ALIAS).expect("Failed to open a session");
        session.begin().await.expect("Failed to begin");
        silent_logs! {
            let _ = session.using("second");
        }
    }

    #[tokio::test]
    async fn lost_transaction() {
        init_logs();
        let connection = MemoryConnection::new();
        gauges(&connection).await;
        let mut registry = registry(connection.clone());
        registry
            .register::<Gauge>()
            .expect("Failed to register Gauge");
        let mut session =
            Session::new(Arc::new(registry), DEFAULT_ALIAS).expect("Failed to open a session");
        session.begin().await.expect("Failed to begin");
        session
            .delete(&Gauge {
                id: 1,
                ..Default::default()
            })
            .await
            .expect("Failed to delete a gauge");
        connection
            .kill_transactions()
            .expect("Failed to kill the transactions");
        let error = silent_logs! {
            session.commit().await.expect_err("The transaction is gone")
        };
        assert_eq!(orm_error(&error), Some(&OrmError::TransactionNotBegan));
        assert!(!session.in_transaction());
        let mut gauge = Gauge {
            id: 1,
            ..Default::default()
        };
        session
            .read(&mut gauge, &[])
            .await
            .expect("The delete must not be applied");
        assert_eq!(gauge.reading, 12);

        session.begin().await.expect("Failed to begin again");
        connection
            .kill_transactions()
            .expect("Failed to kill the transactions");
        let error = silent_logs! {
            session.rollback().await.expect_err("The transaction is gone")
        };
        assert_eq!(orm_error(&error), Some(&OrmError::TransactionNotBegan));
        assert!(!session.in_transaction());
        let error = silent_logs! {
            session.rollback().await.expect_err("Nothing left to roll back")
        };
        assert_eq!(orm_error(&error), Some(&OrmError::TransactionNotBegan));
    }
}
