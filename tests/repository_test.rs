//! Integration tests for repository CRUD, pagination and transactions
//!
//! Each test opens a single-connection pool and creates its tables as
//! temporary tables, so tests never see each other's rows. Tests are skipped
//! when DATABASE_URL is not set.

use dbstore::prelude::*;
use sqlx::postgres::PgPoolOptions;
use std::time::Duration;

#[model]
#[derive(PartialEq)]
#[table(name = "books")]
pub struct Book {
    #[primary_key]
    pub id: String,
    pub title: String,
    pub pages: i32,
}

#[model]
#[table(name = "counters")]
pub struct Counter {
    #[primary_key]
    pub id: i64,
    pub label: String,
}

#[model]
#[table(name = "accounts")]
pub struct Account {
    #[primary_key]
    pub id: String,
    pub created: String,
}

#[model]
#[table(name = "tokens")]
pub struct Token {
    #[primary_key]
    pub id: Uuid,
    pub issued: DateTime<Utc>,
}

#[model]
#[table(name = "tags")]
pub struct Tag {
    #[primary_key]
    pub name: String,
}

fn book(id: &str, title: &str, pages: i32) -> Book {
    Book {
        id: id.to_string(),
        title: title.to_string(),
        pages,
    }
}

async fn setup() -> Option<Repository> {
    let Ok(database_url) = std::env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL not set, skipping");
        return None;
    };

    let pool = PgPoolOptions::new()
        .max_connections(1)
        .connect(&database_url)
        .await
        .expect("Failed to connect to database");

    sqlx::query(
        "CREATE TEMP TABLE books (id TEXT PRIMARY KEY, title TEXT NOT NULL, pages INTEGER NOT NULL)",
    )
    .execute(&pool)
    .await
    .expect("Failed to create books table");

    Some(DbStore::from_pool(pool).repository())
}

async fn create_table(repo: &Repository, ddl: &str) {
    sqlx::query(ddl)
        .execute(repo.pool().unwrap())
        .await
        .expect("Failed to create table");
}

async fn create_counters(repo: &Repository) {
    create_table(
        repo,
        "CREATE TEMP TABLE counters (id BIGINT PRIMARY KEY, label TEXT NOT NULL)",
    )
    .await;
}

fn counters(ids: impl IntoIterator<Item = i64>) -> Vec<Counter> {
    ids.into_iter()
        .map(|id| Counter {
            id,
            label: format!("row {}", id),
        })
        .collect()
}

async fn seed(repo: &Repository) {
    let books = vec![
        book("1", "The Rust Book", 550),
        book("2", "Programming Rust", 720),
        book("3", "Zero To Production", 400),
        book("4", "Rust for Rustaceans", 280),
    ];
    assert_eq!(repo.create_bulk(&books, false).await.unwrap(), 4);
}

fn ids(books: &[Book]) -> Vec<&str> {
    books.iter().map(|b| b.id.as_str()).collect()
}

// ========================================
// Create / Read
// ========================================

#[tokio::test]
async fn test_create_then_find_by_pk() {
    let Some(repo) = setup().await else { return };

    let original = book("b-1", "Dune", 412);
    assert_eq!(repo.create(&original, false).await.unwrap(), 1);

    let found: Book = repo.find_one_by_pk::<Book>(&"b-1".to_string()).await.unwrap();
    assert_eq!(found, original);
    assert_eq!(repo.reload(&original).await.unwrap(), original);
}

#[tokio::test]
async fn test_missing_row_is_not_found() {
    let Some(repo) = setup().await else { return };

    let err = repo
        .find_one_by_pk::<Book>(&"nope".to_string())
        .await
        .unwrap_err();
    assert!(err.is_not_found(), "{:?}", err);

    let err = repo
        .find_one_where::<Book>([eq("title", "nothing")])
        .await
        .unwrap_err();
    assert!(matches!(err.as_database(), Some(sqlx::Error::RowNotFound)));
}

#[tokio::test]
async fn test_duplicate_create_fails_unless_ignored() {
    let Some(repo) = setup().await else { return };

    repo.create(&book("dup", "First", 10), false).await.unwrap();

    let err = repo
        .create(&book("dup", "Second", 20), false)
        .await
        .unwrap_err();
    assert!(err.is_unique_violation(), "{:?}", err);

    let affected = repo.create(&book("dup", "Third", 30), true).await.unwrap();
    assert_eq!(affected, 0);

    let stored = repo.find_one_by_pk::<Book>(&"dup".to_string()).await.unwrap();
    assert_eq!(stored.title, "First");
    assert_eq!(stored.pages, 10);
}

#[tokio::test]
async fn test_find_many_applies_present_predicates_only() {
    let Some(repo) = setup().await else { return };
    seed(&repo).await;

    let found: Vec<Book> = repo
        .find_many_where(
            None,
            [
                contains("title", "rust"),
                gt("pages", 300),
                eq("id", SqlValue::Null),
                in_values("id", Vec::<String>::new()),
            ],
        )
        .await
        .unwrap();

    let mut found_ids = ids(&found);
    found_ids.sort();
    assert_eq!(found_ids, ["1", "2"]);
}

#[tokio::test]
async fn test_text_match_lowercases_column_only() {
    let Some(repo) = setup().await else { return };
    seed(&repo).await;

    let lower: Vec<Book> = repo
        .find_many_where(None, [starts_with("title", "zero")])
        .await
        .unwrap();
    assert_eq!(ids(&lower), ["3"]);

    // The value keeps its case, so an upper-case needle cannot match
    let upper: Vec<Book> = repo
        .find_many_where(None, [starts_with("title", "Zero")])
        .await
        .unwrap();
    assert!(upper.is_empty());
}

#[tokio::test]
async fn test_find_with_criteria_and_or() {
    let Some(repo) = setup().await else { return };
    seed(&repo).await;

    let found: Vec<Book> = repo
        .find_many_with(None, |query| {
            query.filter(eq("id", "1")).or_filter(eq("id", "3"));
            order_by_desc(query, "id");
        })
        .await
        .unwrap();
    assert_eq!(ids(&found), ["3", "1"]);

    let first: Book = repo
        .find_one_with(|query| {
            query.filter(lt("pages", 500));
            order_by(query, "pages", "ASC");
        })
        .await
        .unwrap();
    assert_eq!(first.id, "4");
}

#[tokio::test]
async fn test_count_where() {
    let Some(repo) = setup().await else { return };
    seed(&repo).await;

    assert_eq!(repo.count_where::<Book>([]).await.unwrap(), 4);
    assert_eq!(
        repo.count_where::<Book>([not_contains("title", "rust")])
            .await
            .unwrap(),
        1
    );
}

// ========================================
// Pagination
// ========================================

#[tokio::test]
async fn test_pagination_walks_both_directions_inclusively() {
    let Some(repo) = setup().await else { return };
    seed(&repo).await;

    let next = PaginationParams::next_page(2, "id", "2").unwrap();
    let page: Vec<Book> = repo.find_many_where(Some(&next), []).await.unwrap();
    assert_eq!(ids(&page), ["2", "3"]);

    let previous = PaginationParams::previous_page(2, "id", "2").unwrap();
    let page: Vec<Book> = repo.find_many_where(Some(&previous), []).await.unwrap();
    assert_eq!(ids(&page), ["2", "1"]);

    let first = PaginationParams::first(3, "id").unwrap();
    let page: Vec<Book> = repo.find_many_where(Some(&first), []).await.unwrap();
    assert_eq!(ids(&page), ["1", "2", "3"]);
}

#[tokio::test]
async fn test_numeric_cursor_pagination() {
    let Some(repo) = setup().await else { return };
    create_counters(&repo).await;
    repo.create_bulk(&counters(1..=4), false).await.unwrap();

    let next = PaginationParams::next_page(2, "id", 2).unwrap();
    let page: Vec<Counter> = repo.find_many_where(Some(&next), []).await.unwrap();
    assert_eq!(page.iter().map(|c| c.id).collect::<Vec<_>>(), [2, 3]);

    let previous = PaginationParams::previous_page(2, "id", 2).unwrap();
    let page: Vec<Counter> = repo.find_many_where(Some(&previous), []).await.unwrap();
    assert_eq!(page.iter().map(|c| c.id).collect::<Vec<_>>(), [2, 1]);

    let wide = PaginationParams::next_page(2, "id", 3_i64).unwrap();
    let page: Vec<Counter> = repo.find_many_where(Some(&wide), []).await.unwrap();
    assert_eq!(page.iter().map(|c| c.id).collect::<Vec<_>>(), [3, 4]);

    let empty = PaginationParams::next_page(-5, "id", 1).unwrap();
    let page: Vec<Counter> = repo.find_many_where(Some(&empty), []).await.unwrap();
    assert!(page.is_empty());
}

// ========================================
// Parameter types
// ========================================

#[tokio::test]
async fn test_text_columns_match_uuid_and_timestamp_shaped_strings() {
    let Some(repo) = setup().await else { return };
    create_table(
        &repo,
        "CREATE TEMP TABLE accounts (id TEXT PRIMARY KEY, created TEXT NOT NULL)",
    )
    .await;

    let ids = [
        "2f1c6a9e-0000-4000-8000-000000000001",
        "2f1c6a9e-0000-4000-8000-000000000002",
        "2f1c6a9e-0000-4000-8000-000000000003",
    ];
    let accounts: Vec<Account> = ids
        .iter()
        .enumerate()
        .map(|(i, id)| Account {
            id: id.to_string(),
            created: format!("2024-01-0{}T00:00:00Z", i + 1),
        })
        .collect();
    repo.create_bulk(&accounts, false).await.unwrap();

    let found: Account = repo.find_one_where([eq("id", ids[1])]).await.unwrap();
    assert_eq!(found.created, "2024-01-02T00:00:00Z");

    let found: Account = repo
        .find_one_where([eq("created", "2024-01-03T00:00:00Z")])
        .await
        .unwrap();
    assert_eq!(found.id, ids[2]);

    let next = PaginationParams::next_page(10, "id", ids[1]).unwrap();
    let page: Vec<Account> = repo.find_many_where(Some(&next), []).await.unwrap();
    assert_eq!(
        page.iter().map(|a| a.id.as_str()).collect::<Vec<_>>(),
        &ids[1..]
    );
}

#[tokio::test]
async fn test_uuid_and_timestamp_values_bind_as_their_types() {
    let Some(repo) = setup().await else { return };
    create_table(
        &repo,
        "CREATE TEMP TABLE tokens (id UUID PRIMARY KEY, issued TIMESTAMPTZ NOT NULL)",
    )
    .await;

    let early = Token {
        id: Uuid::new_v4(),
        issued: "2024-01-01T00:00:00Z".parse().unwrap(),
    };
    let late = Token {
        id: Uuid::new_v4(),
        issued: "2024-06-01T00:00:00Z".parse().unwrap(),
    };
    repo.create_bulk(&[early.clone(), late.clone()], false)
        .await
        .unwrap();

    let found: Token = repo.find_one_where([eq("id", early.id)]).await.unwrap();
    assert_eq!(found.issued, early.issued);

    let cutoff: DateTime<Utc> = "2024-03-01T00:00:00Z".parse().unwrap();
    let found: Vec<Token> = repo
        .find_many_where(None, [gte("issued", cutoff)])
        .await
        .unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, late.id);
}

#[tokio::test]
async fn test_pagination_combines_with_filters() {
    let Some(repo) = setup().await else { return };
    seed(&repo).await;

    let next = PaginationParams::next_page(10, "id", "2").unwrap();
    let page: Vec<Book> = repo
        .find_many_where(Some(&next), [contains("title", "rust")])
        .await
        .unwrap();
    assert_eq!(ids(&page), ["2", "4"]);
}

// ========================================
// Update / Upsert
// ========================================

#[tokio::test]
async fn test_update_by_pk() {
    let Some(repo) = setup().await else { return };
    seed(&repo).await;

    let changed = book("1", "The Rust Programming Language", 560);
    assert_eq!(repo.update_one_by_pk(&changed).await.unwrap(), 1);
    assert_eq!(repo.reload(&changed).await.unwrap(), changed);

    let missing = book("missing", "Nothing", 1);
    assert_eq!(repo.update_one_by_pk(&missing).await.unwrap(), 0);
}

#[tokio::test]
async fn test_update_many_by_pk() {
    let Some(repo) = setup().await else { return };
    seed(&repo).await;

    let changed = vec![book("1", "A", 1), book("2", "B", 2)];
    assert_eq!(repo.update_many_by_pk(&changed).await.unwrap(), 2);

    let found: Vec<Book> = repo
        .find_many_where(None, [lte("pages", 2)])
        .await
        .unwrap();
    assert_eq!(found.len(), 2);
}

#[tokio::test]
async fn test_update_where_requires_a_condition() {
    let Some(repo) = setup().await else { return };
    seed(&repo).await;

    let template = book("ignored", "Short Read", 100);
    let affected = repo
        .update_one_where(&template, |query| {
            query.filter(lt("pages", 300));
        })
        .await
        .unwrap();
    assert_eq!(affected, 1);
    let updated = repo.find_one_by_pk::<Book>(&"4".to_string()).await.unwrap();
    assert_eq!(updated.title, "Short Read");

    let err = repo
        .update_one_where(&template, |query| {
            query.filter(eq("title", SqlValue::Null));
        })
        .await
        .unwrap_err();
    assert!(matches!(err, DbStoreError::Configuration(_)));
    assert_eq!(repo.count_where::<Book>([eq("title", "Short Read")]).await.unwrap(), 1);
}

#[tokio::test]
async fn test_update_where_with_key_only_record_changes_nothing() {
    let Some(repo) = setup().await else { return };
    create_table(&repo, "CREATE TEMP TABLE tags (name TEXT PRIMARY KEY)").await;
    repo.create(&Tag { name: "rust".to_string() }, false)
        .await
        .unwrap();

    let affected = repo
        .update_one_where(&Tag { name: "rust".to_string() }, |query| {
            query.filter(eq("name", "rust"));
        })
        .await
        .unwrap();
    assert_eq!(affected, 0);
    assert_eq!(repo.count_where::<Tag>([]).await.unwrap(), 1);
}

#[tokio::test]
async fn test_update_with_explicit_assignments() {
    let Some(repo) = setup().await else { return };
    seed(&repo).await;

    let affected = repo
        .update_with::<Book, _>(|query| {
            query.set("pages", 999).filter(ends_with("title", "rust"));
        })
        .await
        .unwrap();
    assert_eq!(affected, 1);
    let updated = repo.find_one_by_pk::<Book>(&"2".to_string()).await.unwrap();
    assert_eq!(updated.pages, 999);
}

#[tokio::test]
async fn test_upsert_overwrites_existing_rows() {
    let Some(repo) = setup().await else { return };
    seed(&repo).await;

    let rows = vec![book("1", "Replaced", 1), book("5", "Inserted", 5)];
    assert_eq!(repo.upsert(&rows).await.unwrap(), 2);

    assert_eq!(repo.reload(&rows[0]).await.unwrap(), rows[0]);
    assert_eq!(repo.reload(&rows[1]).await.unwrap(), rows[1]);
    assert_eq!(repo.count_where::<Book>([]).await.unwrap(), 5);
}

#[tokio::test]
async fn test_bulk_writes_beyond_one_statement() {
    let Some(repo) = setup().await else { return };
    create_counters(&repo).await;

    // Two columns per row: more rows than fit in one statement's parameters
    let rows = counters(1..=40_000);
    assert_eq!(repo.create_bulk(&rows, false).await.unwrap(), 40_000);
    assert_eq!(repo.count_where::<Counter>([]).await.unwrap(), 40_000);

    assert_eq!(repo.upsert(&rows).await.unwrap(), 40_000);
    assert_eq!(repo.create_bulk(&rows, true).await.unwrap(), 0);
    assert_eq!(repo.delete_many_by_pk(&rows).await.unwrap(), 40_000);
}

#[tokio::test]
async fn test_split_bulk_insert_is_all_or_nothing() {
    let Some(repo) = setup().await else { return };
    create_counters(&repo).await;

    // The duplicate key lands in the second statement
    let mut rows = counters(1..=40_000);
    rows.push(Counter {
        id: 1,
        label: "duplicate".to_string(),
    });

    let err = repo.create_bulk(&rows, false).await.unwrap_err();
    assert!(err.is_unique_violation(), "{:?}", err);
    assert_eq!(repo.count_where::<Counter>([]).await.unwrap(), 0);
}

// ========================================
// Delete
// ========================================

#[tokio::test]
async fn test_delete_variants() {
    let Some(repo) = setup().await else { return };
    seed(&repo).await;

    assert_eq!(repo.delete_by_pk(&book("1", "", 0)).await.unwrap(), 1);
    assert_eq!(
        repo.delete_many_by_pk(&[book("2", "", 0), book("3", "", 0)])
            .await
            .unwrap(),
        2
    );
    assert_eq!(
        repo.delete_where::<Book>([gte("pages", 1000)]).await.unwrap(),
        0
    );
    assert_eq!(
        repo.delete_with::<Book, _>(|query| {
            query.filter(is_not_null("id"));
        })
        .await
        .unwrap(),
        1
    );
    assert_eq!(repo.count_where::<Book>([]).await.unwrap(), 0);
}

#[tokio::test]
async fn test_delete_without_condition_is_rejected() {
    let Some(repo) = setup().await else { return };
    seed(&repo).await;

    let err = repo
        .delete_where::<Book>([contains("title", "   ")])
        .await
        .unwrap_err();
    assert!(matches!(err, DbStoreError::Configuration(_)));
    assert_eq!(repo.count_where::<Book>([]).await.unwrap(), 4);
}

// ========================================
// Transactions
// ========================================

#[tokio::test]
async fn test_transaction_commits_on_success() {
    let Some(repo) = setup().await else { return };

    let created = repo
        .transaction(|tx| async move {
            assert!(tx.is_transactional());
            tx.create(&book("t1", "One", 1), false).await?;
            tx.create(&book("t2", "Two", 2), false).await?;
            Ok::<_, DbStoreError>(2)
        })
        .await
        .unwrap();

    assert_eq!(created, 2);
    assert_eq!(repo.count_where::<Book>([]).await.unwrap(), 2);
}

#[tokio::test]
async fn test_transaction_rolls_back_on_error() {
    let Some(repo) = setup().await else { return };

    let result: Result<(), DbStoreError> = repo
        .transaction(|tx| async move {
            tx.create(&book("t1", "One", 1), false).await?;
            tx.create(&book("t2", "Two", 2), false).await?;
            Err(DbStoreError::configuration("abort"))
        })
        .await;

    assert!(matches!(result, Err(DbStoreError::Configuration(ref m)) if m == "abort"));
    assert_eq!(repo.count_where::<Book>([]).await.unwrap(), 0);
}

#[tokio::test]
async fn test_transaction_rolls_back_on_panic() {
    let Some(repo) = setup().await else { return };

    let inner = repo.clone();
    let joined = tokio::spawn(async move {
        inner
            .transaction(|tx| async move {
                tx.create(&book("t1", "One", 1), false).await?;
                if tx.is_transactional() {
                    panic!("boom");
                }
                Ok::<_, DbStoreError>(())
            })
            .await
    })
    .await;

    assert!(joined.unwrap_err().is_panic());
    assert_eq!(repo.count_where::<Book>([]).await.unwrap(), 0);
}

#[tokio::test]
async fn test_nested_work_shares_the_outer_transaction() {
    let Some(repo) = setup().await else { return };
    seed(&repo).await;

    let result: Result<(), DbStoreError> = repo
        .transaction(|tx| async move {
            tx.update_many_by_pk(&[book("1", "Changed", 1), book("2", "Changed", 2)])
                .await?;
            tx.transaction(|inner| async move {
                inner.delete_by_pk(&book("3", "", 0)).await?;
                Ok::<_, DbStoreError>(())
            })
            .await?;
            Err(DbStoreError::configuration("abort"))
        })
        .await;

    assert!(result.is_err());
    assert_eq!(repo.count_where::<Book>([eq("title", "Changed")]).await.unwrap(), 0);
    assert_eq!(repo.count_where::<Book>([]).await.unwrap(), 4);
}

#[tokio::test]
async fn test_closed_handle_is_rejected() {
    let Some(repo) = setup().await else { return };

    let handle = repo.begin().await.unwrap();
    let tx_repo = repo.with_tx(handle.clone());
    tx_repo.create(&book("h1", "Handle", 1), false).await.unwrap();
    handle.commit().await.unwrap();

    assert!(!handle.is_open().await);
    let err = tx_repo.find_all::<Book>().await.unwrap_err();
    assert!(matches!(err, DbStoreError::TransactionClosed));
    assert!(matches!(
        handle.rollback().await,
        Err(DbStoreError::TransactionClosed)
    ));

    assert_eq!(repo.find_all::<Book>().await.unwrap().len(), 1);
}

// ========================================
// Timeouts
// ========================================

#[tokio::test]
async fn test_statement_timeout() {
    let Some(repo) = setup().await else { return };

    let slow = repo.clone().with_timeout(Duration::from_millis(50));
    let err = slow
        .find_many_with::<Book, _>(None, |query| {
            query.where_raw("(SELECT true FROM pg_sleep(1))", vec![]);
        })
        .await
        .unwrap_err();
    assert!(matches!(err, DbStoreError::Timeout(_)));

    // The connection stays usable once the statement is cancelled
    assert_eq!(repo.count_where::<Book>([]).await.unwrap(), 0);
}

#[tokio::test]
async fn test_timed_out_update_is_not_applied() {
    let Some(repo) = setup().await else { return };
    create_counters(&repo).await;
    repo.create(
        &Counter {
            id: 1,
            label: "before".to_string(),
        },
        false,
    )
    .await
    .unwrap();

    let slow = repo.clone().with_timeout(Duration::from_millis(100));
    let err = slow
        .update_with::<Counter, _>(|query| {
            query
                .set("label", "after")
                .where_raw("(SELECT true FROM pg_sleep(1))", vec![]);
        })
        .await
        .unwrap_err();
    assert!(matches!(err, DbStoreError::Timeout(_)), "{:?}", err);

    // Long enough for an uncancelled statement to have finished
    tokio::time::sleep(Duration::from_millis(1500)).await;
    let row = repo.find_one_by_pk::<Counter>(&1).await.unwrap();
    assert_eq!(row.label, "before");

    // Fast statements still run under the deadline
    assert_eq!(
        slow.update_with::<Counter, _>(|query| {
            query.set("label", "quick").filter(eq("id", 1_i64));
        })
        .await
        .unwrap(),
        1
    );
    assert_eq!(repo.find_one_by_pk::<Counter>(&1).await.unwrap().label, "quick");
}

#[tokio::test]
async fn test_timeout_inside_transaction_rolls_back() {
    let Some(repo) = setup().await else { return };
    create_counters(&repo).await;

    let result: Result<(), DbStoreError> = repo
        .transaction(|tx| async move {
            tx.create_bulk(&counters(1..=2), false).await?;
            tx.clone()
                .with_timeout(Duration::from_millis(100))
                .delete_with::<Counter, _>(|query| {
                    query.where_raw("(SELECT true FROM pg_sleep(1))", vec![]);
                })
                .await?;
            Ok::<_, DbStoreError>(())
        })
        .await;

    assert!(matches!(result, Err(DbStoreError::Timeout(_))), "{:?}", result);
    assert_eq!(repo.count_where::<Counter>([]).await.unwrap(), 0);
}
