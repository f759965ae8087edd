use std::path::PathBuf;

use alphadb_cli::AppError;
use alphadb_cli::db::{ConnectParams, Connector, DbHandle, LiveConnection, SqlxConnector};
use alphadb_cli::engine::document::{VersionDocument, compare_versions};
use alphadb_cli::engine::verify::{Severity, verify};
use alphadb_cli::engine::{InitOutcome, MigrationEngine, SqlEngine, UpdateOutcome};
use serde_json::{Value, json};
use std::cmp::Ordering;
use tempfile::TempDir;

fn empty_db() -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("shop.db");
    std::fs::File::create(&path).unwrap();
    (dir, path)
}

async fn open(path: &PathBuf) -> LiveConnection<DbHandle> {
    let params = ConnectParams::Sqlite { path: path.clone() };
    let handle = SqlxConnector.connect(&params).await.unwrap();
    LiveConnection::new(&params, handle)
}

fn shop_source() -> Value {
    json!({
        "name": "shop",
        "version": [
            {
                "_id": "0.2.0",
                "sql": "ALTER TABLE product ADD COLUMN price INTEGER"
            },
            {
                "_id": "0.1.0",
                "sql": ["CREATE TABLE product (id INTEGER PRIMARY KEY, name TEXT NOT NULL)"],
                "default_data": ["INSERT INTO product (name) VALUES ('widget')"]
            }
        ]
    })
}

#[tokio::test]
async fn sqlite_connector_rejects_missing_and_foreign_files() {
    let dir = tempfile::tempdir().unwrap();

    let missing = ConnectParams::Sqlite {
        path: dir.path().join("missing.db"),
    };
    assert!(SqlxConnector.connect(&missing).await.is_err());
    assert!(!dir.path().join("missing.db").exists());

    let text_file = dir.path().join("notes.db");
    std::fs::write(&text_file, "this is definitely not a database file, just some text").unwrap();
    let foreign = ConnectParams::Sqlite { path: text_file };
    assert!(SqlxConnector.connect(&foreign).await.is_err());
}

#[tokio::test]
async fn init_then_status_reports_an_initialized_database() {
    let (_dir, path) = empty_db();
    let mut conn = open(&path).await;
    let mut engine = SqlEngine::new(&mut conn);

    let before = engine.status().await.unwrap();
    assert_eq!(before.name, "shop");
    assert!(!before.init);
    assert_eq!(before.version, None);

    assert_eq!(engine.init().await.unwrap(), InitOutcome::Initialized);
    assert_eq!(engine.init().await.unwrap(), InitOutcome::AlreadyInitialized);

    let after = engine.status().await.unwrap();
    assert!(after.init);
    assert_eq!(after.template, None);
    assert_eq!(after.version, None);
}

#[tokio::test]
async fn update_requires_initialization() {
    let (_dir, path) = empty_db();
    let mut conn = open(&path).await;
    let err = SqlEngine::new(&mut conn)
        .update(&shop_source(), false)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Uninitialized), "{err:?}");
}

#[tokio::test]
async fn update_applies_pending_versions_in_order() {
    let (_dir, path) = empty_db();
    let mut conn = open(&path).await;
    {
        let mut engine = SqlEngine::new(&mut conn);
        engine.init().await.unwrap();

        let outcome = engine.update(&shop_source(), false).await.unwrap();
        assert_eq!(
            outcome,
            UpdateOutcome::Updated {
                from: None,
                to: "0.2.0".to_string(),
            }
        );

        let status = engine.status().await.unwrap();
        assert_eq!(status.version.as_deref(), Some("0.2.0"));
        assert_eq!(status.template.as_deref(), Some("shop"));

        let again = engine.update(&shop_source(), false).await.unwrap();
        assert_eq!(
            again,
            UpdateOutcome::UpToDate {
                version: Some("0.2.0".to_string()),
            }
        );
    }

    let names = conn
        .handle
        .fetch_strings("SELECT name FROM product", &[])
        .await
        .unwrap();
    assert_eq!(names, vec!["widget".to_string()]);
    conn.handle
        .execute("UPDATE product SET price = 10", &[])
        .await
        .unwrap();
}

#[tokio::test]
async fn update_without_data_skips_default_rows() {
    let (_dir, path) = empty_db();
    let mut conn = open(&path).await;
    {
        let mut engine = SqlEngine::new(&mut conn);
        engine.init().await.unwrap();
        engine.update(&shop_source(), true).await.unwrap();
    }
    let names = conn
        .handle
        .fetch_strings("SELECT name FROM product", &[])
        .await
        .unwrap();
    assert!(names.is_empty());
}

#[tokio::test]
async fn update_from_another_template_is_refused() {
    let (_dir, path) = empty_db();
    let mut conn = open(&path).await;
    let mut engine = SqlEngine::new(&mut conn);
    engine.init().await.unwrap();
    engine.update(&shop_source(), false).await.unwrap();

    let blog = json!({
        "name": "blog",
        "version": [{ "_id": "9.0.0", "sql": "CREATE TABLE post (id INTEGER)" }]
    });
    let err = engine.update(&blog, false).await.unwrap_err();
    assert!(
        matches!(err, AppError::TemplateMismatch { ref database_template, ref source_template }
            if database_template == "shop" && source_template == "blog"),
        "{err:?}"
    );
    assert_eq!(
        engine.status().await.unwrap().version.as_deref(),
        Some("0.2.0")
    );
}

#[tokio::test]
async fn vacate_drops_every_table() {
    let (_dir, path) = empty_db();
    let mut conn = open(&path).await;
    let mut engine = SqlEngine::new(&mut conn);
    engine.init().await.unwrap();
    engine.update(&shop_source(), false).await.unwrap();

    assert_eq!(engine.vacate().await.unwrap(), 2);
    let status = engine.status().await.unwrap();
    assert!(!status.init);
    assert_eq!(engine.vacate().await.unwrap(), 0);
}

#[test]
fn version_ordering_is_numeric() {
    assert_eq!(compare_versions("0.10.0", "0.9.1"), Ordering::Greater);
    assert_eq!(compare_versions("1.0", "1.0.0"), Ordering::Equal);
    assert_eq!(compare_versions("0.1.0", "0.2.0"), Ordering::Less);
}

#[test]
fn document_lists_pending_versions_after_current() {
    let doc = VersionDocument::from_json(&shop_source()).unwrap();

    let all: Vec<&str> = doc.pending_after(None).iter().map(|v| v.id.as_str()).collect();
    assert_eq!(all, vec!["0.1.0", "0.2.0"]);

    let rest: Vec<&str> = doc
        .pending_after(Some("0.1.0"))
        .iter()
        .map(|v| v.id.as_str())
        .collect();
    assert_eq!(rest, vec!["0.2.0"]);
    assert!(doc.pending_after(Some("0.2.0")).is_empty());
}

#[test]
fn malformed_document_is_rejected() {
    let err = VersionDocument::from_json(&json!({ "version": [] })).unwrap_err();
    assert!(matches!(err, AppError::InvalidVersionSource(_)), "{err:?}");

    let err = VersionDocument::from_json(&json!({
        "name": "shop",
        "version": [{ "_id": "0.1.0", "sql": 42 }]
    }))
    .unwrap_err();
    assert!(matches!(err, AppError::InvalidVersionSource(_)), "{err:?}");
}

#[test]
fn clean_source_verifies_without_issues() {
    let source = json!({
        "name": "shop",
        "version": [
            { "_id": "0.1.0", "sql": ["CREATE TABLE a (id INTEGER)"] },
            { "_id": "0.2.0", "default_data": "INSERT INTO a VALUES (1)" }
        ]
    });
    assert!(verify(&source).is_empty());
}

#[test]
fn verify_orders_issues_by_severity() {
    let source = json!({
        "version": [
            { "_id": "0.2.0", "sql": "CREATE TABLE a (id INTEGER)" },
            { "_id": "0.1.0" },
            { "_id": "abc", "sql": 7 },
            "not an object"
        ]
    });
    let issues = verify(&source);
    let severities: Vec<Severity> = issues.iter().map(|i| i.severity).collect();

    let mut sorted = severities.clone();
    sorted.sort();
    assert_eq!(severities, sorted);

    assert_eq!(severities.first(), Some(&Severity::Critical));
    assert!(issues.iter().any(|i| i.path == "name" && i.severity == Severity::Critical));
    assert!(issues.iter().any(|i| i.path == "version[1]._id" && i.severity == Severity::High));
    assert!(issues.iter().any(|i| i.path == "version[2].sql" && i.severity == Severity::High));
    assert!(issues.iter().any(|i| i.path == "version[1]" && i.severity == Severity::Low));
    assert_eq!(Severity::Critical.to_string(), "CRITICAL");
}

#[test]
fn non_object_source_is_critical() {
    let issues = verify(&json!([1, 2, 3]));
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].severity, Severity::Critical);
}
