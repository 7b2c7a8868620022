use crate::{DEFAULT_ALIAS, silent_logs};
use indoc::indoc;
use shard::{Driver, Model, OrmError, Query, Registry, Session, orm_error};
use std::sync::{Arc, LazyLock};
use tokio::sync::Mutex;

#[derive(Model, Default, Debug, Clone, PartialEq)]
#[orm(table = "books")]
struct Book {
    #[orm("pk;column(book_id)")]
    id: i64,
    #[orm("uk")]
    isbn: String,
    title: String,
    pages: u64,
    rating: f64,
}

/// Narrower view over the same table.
#[derive(Model, Default, Debug, Clone, PartialEq)]
#[orm(table = "books")]
struct Summary {
    #[orm("pk;column(book_id)")]
    id: i64,
    title: String,
}

#[derive(Model, Default, Debug)]
struct Shelf {
    #[orm("pk")]
    id: i64,
}

static MUTEX: LazyLock<Mutex<()>> = LazyLock::new(|| Mutex::new(()));

pub async fn collection<D: Driver>(connection: D::Connection) {
    let _lock = MUTEX.lock().await;

    let mut registry = Registry::<D>::new();
    registry
        .add_connection(DEFAULT_ALIAS, connection)
        .expect("Failed to add the connection");
    registry
        .register::<Book>()
        .expect("Failed to register Book");
    registry
        .register::<Summary>()
        .expect("Failed to register Summary");
    let mut session =
        Session::new(Arc::new(registry), DEFAULT_ALIAS).expect("Failed to open a session");

    // Setup
    session
        .exec("DROP TABLE IF EXISTS `books`")
        .await
        .expect("Failed to drop the books table");
    session
        .exec(indoc! {"
            CREATE TABLE `books` (
                `book_id` BIGINT NOT NULL AUTO_INCREMENT PRIMARY KEY,
                `isbn` VARCHAR(32) NOT NULL UNIQUE,
                `title` VARCHAR(255) NOT NULL,
                `pages` BIGINT UNSIGNED NOT NULL,
                `rating` DOUBLE NOT NULL
            )
        "})
        .await
        .expect("Failed to create the books table");
    let mut books = vec![
        Book {
            isbn: "978-0141439518".into(),
            title: "Pride and Prejudice".into(),
            pages: 480,
            rating: 4.3,
            ..Default::default()
        },
        Book {
            isbn: "978-0451524935".into(),
            title: "Nineteen Eighty-Four".into(),
            pages: 328,
            rating: 4.2,
            ..Default::default()
        },
        Book {
            isbn: "978-0140449136".into(),
            title: "Crime and Punishment".into(),
            pages: 671,
            rating: 4.5,
            ..Default::default()
        },
    ];
    for book in &mut books {
        book.id = session
            .insert(&*book)
            .await
            .expect("Failed to insert a book");
    }

    // Every column
    let mut loaded = Vec::<Book>::new();
    session
        .query_into(&mut loaded, "SELECT * FROM `books` ORDER BY `book_id`")
        .await
        .expect("Failed to load the books");
    assert_eq!(loaded, books);

    // Some columns in any order, the others keep their default
    let mut loaded = Vec::<Book>::new();
    session
        .query_into(
            &mut loaded,
            "SELECT `title`, `pages`, `book_id` FROM `books` ORDER BY `pages` DESC",
        )
        .await
        .expect("Failed to load the book titles");
    assert_eq!(
        loaded
            .iter()
            .map(|v| (v.id, v.title.as_str(), v.pages, v.isbn.as_str(), v.rating))
            .collect::<Vec<_>>(),
        [
            (books[2].id, "Crime and Punishment", 671, "", 0.0),
            (books[0].id, "Pride and Prejudice", 480, "", 0.0),
            (books[1].id, "Nineteen Eighty-Four", 328, "", 0.0),
        ]
    );

    // Appends, with bound arguments
    session
        .query_into(
            &mut loaded,
            Query::new("SELECT `book_id`, `isbn` FROM `books` WHERE `pages` = ?").bind(328u64),
        )
        .await
        .expect("Failed to load a book by pages");
    assert_eq!(loaded.len(), 4);
    assert_eq!(loaded[3].isbn, books[1].isbn);
    assert_eq!(loaded[3].id, books[1].id);
    assert!(loaded[3].title.is_empty());

    // No rows leaves the destination alone
    session
        .query_into(
            &mut loaded,
            Query::new("SELECT * FROM `books` WHERE `isbn` = ?").bind("missing"),
        )
        .await
        .expect("Failed to run a query without results");
    assert_eq!(loaded.len(), 4);

    // Narrow model
    let mut summaries = Vec::<Summary>::new();
    session
        .query_into(
            &mut summaries,
            "SELECT `book_id`, `title` FROM `books` ORDER BY `title`",
        )
        .await
        .expect("Failed to load the summaries");
    assert_eq!(
        summaries
            .iter()
            .map(|v| v.title.as_str())
            .collect::<Vec<_>>(),
        [
            "Crime and Punishment",
            "Nineteen Eighty-Four",
            "Pride and Prejudice"
        ]
    );
    let mut summaries = Vec::<Summary>::new();
    let error = silent_logs! {
        session
            .query_into(&mut summaries, "SELECT * FROM `books`")
            .await
            .expect_err("Columns outside Summary must fail")
    };
    assert!(matches!(
        orm_error(&error),
        Some(OrmError::UnknownColumn { column, .. }) if column == "isbn"
    ));
    assert!(summaries.is_empty());

    // Unregistered model
    let mut shelves = Vec::<Shelf>::new();
    let error = silent_logs! {
        session
            .query_into(&mut shelves, "SELECT * FROM `books`")
            .await
            .expect_err("Unregistered models must fail")
    };
    assert!(matches!(orm_error(&error), Some(OrmError::UnknownModel(..))));
    let error = silent_logs! {
        session
            .insert(&Shelf::default())
            .await
            .expect_err("Unregistered models must fail")
    };
    assert!(matches!(orm_error(&error), Some(OrmError::UnknownModel(..))));
}
