use crate::DEFAULT_ALIAS;
use indoc::indoc;
use shard::{DecodePolicy, Driver, Model, Registry, RegistryOptions, Session};
use std::sync::{Arc, LazyLock};
use tokio::sync::Mutex;

#[derive(Model, Default, Debug, Clone, PartialEq)]
#[orm(table = "limits")]
struct Limits {
    #[orm("pk")]
    id: i64,
    int64: i64,
    uint64: u64,
    float64: f64,
    text: String,
}

static MUTEX: LazyLock<Mutex<()>> = LazyLock::new(|| Mutex::new(()));

pub async fn limits<D: Driver>(connection: D::Connection) {
    let _lock = MUTEX.lock().await;

    let mut registry =
        Registry::<D>::with_options(RegistryOptions::default().decode_policy(DecodePolicy::Strict));
    registry
        .add_connection(DEFAULT_ALIAS, connection)
        .expect("Failed to add the connection");
    registry
        .register::<Limits>()
        .expect("Failed to register Limits");
    let mut session =
        Session::new(Arc::new(registry), DEFAULT_ALIAS).expect("Failed to open a session");

    // Setup
    session
        .exec("DROP TABLE IF EXISTS `limits`")
        .await
        .expect("Failed to drop the limits table");
    session
        .exec(indoc! {"
            CREATE TABLE `limits` (
                `id` BIGINT NOT NULL AUTO_INCREMENT PRIMARY KEY,
                `int64` BIGINT NOT NULL,
                `uint64` BIGINT UNSIGNED NOT NULL,
                `float64` DOUBLE NOT NULL,
                `text` TEXT NOT NULL
            ) DEFAULT CHARSET = utf8mb4
        "})
        .await
        .expect("Failed to create the limits table");

    let cases = [
        Limits {
            int64: i64::MIN,
            uint64: 0,
            float64: f64::MIN,
            text: "".into(),
            ..Default::default()
        },
        Limits {
            int64: i64::MAX,
            uint64: u64::MAX,
            float64: f64::MAX,
            text: "Ünïcödé 'quoted' `ticked` \"double\" \\ 日本語 🦀".into(),
            ..Default::default()
        },
        Limits {
            int64: -1,
            uint64: 1,
            float64: 0.1 + 0.2,
            text: "x".repeat(1000),
            ..Default::default()
        },
        Limits {
            int64: 0,
            uint64: i64::MAX as u64 + 1,
            float64: f64::MIN_POSITIVE,
            text: "line\nbreak\ttab".into(),
            ..Default::default()
        },
    ];
    for mut expected in cases {
        expected.id = session
            .insert(&expected)
            .await
            .expect("Failed to insert a limits row");
        let mut loaded = Limits {
            id: expected.id,
            ..Default::default()
        };
        session
            .read(&mut loaded, &[])
            .await
            .expect("Failed to read a limits row");
        assert_eq!(loaded, expected);
    }

    let mut rows = Vec::<Limits>::new();
    session
        .query_into(&mut rows, "SELECT * FROM `limits` ORDER BY `id`")
        .await
        .expect("Failed to load every limits row");
    assert_eq!(rows.len(), 4);
    assert_eq!(rows[1].uint64, u64::MAX);
    assert_eq!(rows[2].float64, 0.30000000000000004);
}
