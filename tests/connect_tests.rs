mod common;

use alphadb_cli::AppError;
use alphadb_cli::commands::connect::connect;
use alphadb_cli::db::{ConnectParams, Engine, MySqlParams};
use alphadb_cli::secret;
use alphadb_cli::session::{self, SessionRecord, StoredSession};
use alphadb_cli::store::SESSION_SECTION;
use common::{Answer, FakeConnector, ScriptedPrompter, temp_store, text};

fn mysql_script(password: &str, port: &str) -> ScriptedPrompter {
    ScriptedPrompter::new([
        Answer::Choice(0),
        text("db.internal"),
        text("deploy"),
        Answer::Password(password.to_string()),
        text("shop"),
        text(port),
    ])
}

#[tokio::test]
async fn successful_mysql_connect_saves_an_encrypted_session() {
    let (_dir, store) = temp_store();
    secret::ensure_secret(&store).unwrap();
    let connector = FakeConnector::accepting();
    let mut prompter = mysql_script("hunter2", "");

    let conn = connect(&store, &connector, &mut prompter)
        .await
        .unwrap()
        .expect("connection");
    assert_eq!(conn.engine(), Engine::MySql);
    assert_eq!(prompter.remaining(), 0);

    let expected = ConnectParams::MySql(MySqlParams {
        host: "db.internal".to_string(),
        user: "deploy".to_string(),
        password: "hunter2".to_string(),
        database: "shop".to_string(),
        port: 3306,
    });
    assert_eq!(connector.seen(), vec![expected.clone()]);

    assert_eq!(store.get(SESSION_SECTION, "engine").unwrap(), "mysql");
    assert_eq!(store.get(SESSION_SECTION, "port").unwrap(), "3306");
    let raw = std::fs::read_to_string(store.path()).unwrap();
    assert!(!raw.contains("hunter2"), "plaintext password on disk:\n{raw}");

    let secret = secret::load_secret(&store).unwrap();
    match session::load(&store).unwrap() {
        SessionRecord::Present(stored) => assert_eq!(stored.unseal(&secret).unwrap(), expected),
        other => panic!("unexpected {other:?}"),
    }
}

#[tokio::test]
async fn invalid_port_is_asked_again() {
    let (_dir, store) = temp_store();
    secret::ensure_secret(&store).unwrap();
    let connector = FakeConnector::accepting();
    let mut prompter = ScriptedPrompter::new([
        Answer::Choice(0),
        text("localhost"),
        text("root"),
        Answer::Password("pw".to_string()),
        text("shop"),
        text("three thousand"),
        text("3310"),
    ]);

    connect(&store, &connector, &mut prompter).await.unwrap().expect("connection");
    assert_eq!(store.get(SESSION_SECTION, "port").unwrap(), "3310");
    assert_eq!(prompter.asked.iter().filter(|q| *q == "Port").count(), 2);
}

#[tokio::test]
async fn rejected_connect_leaves_the_store_untouched() {
    let (_dir, store) = temp_store();
    secret::ensure_secret(&store).unwrap();
    let previous = ConnectParams::Sqlite {
        path: "/data/old.db".into(),
    };
    let secret = secret::load_secret(&store).unwrap();
    session::save(&store, &StoredSession::seal(&previous, &secret).unwrap()).unwrap();
    let before = std::fs::read(store.path()).unwrap();

    let connector = FakeConnector::rejecting();
    let mut prompter = mysql_script("wrong", "3306");
    let err = connect(&store, &connector, &mut prompter).await.err().unwrap();
    assert!(
        matches!(err, AppError::ConnectionRejected(ref msg) if msg.contains("Access denied")),
        "{err:?}"
    );
    assert_eq!(std::fs::read(store.path()).unwrap(), before);
}

#[tokio::test]
async fn aborting_the_prompt_saves_nothing() {
    let (_dir, store) = temp_store();
    secret::ensure_secret(&store).unwrap();
    let connector = FakeConnector::accepting();
    let mut prompter = ScriptedPrompter::new([
        Answer::Choice(0),
        text("localhost"),
        Answer::Abort,
    ]);

    let conn = connect(&store, &connector, &mut prompter).await.unwrap();
    assert!(conn.is_none());
    assert!(connector.seen().is_empty());
    assert!(store.section_opt(SESSION_SECTION).unwrap().is_none());
}

#[tokio::test]
async fn sqlite_connect_requires_an_existing_absolute_path() {
    let (dir, store) = temp_store();
    secret::ensure_secret(&store).unwrap();
    let db_path = dir.path().join("app.db");
    std::fs::File::create(&db_path).unwrap();

    let connector = FakeConnector::accepting();
    let mut prompter = ScriptedPrompter::new([
        Answer::Choice(1),
        text("relative/app.db"),
        text(&dir.path().join("missing.db").display().to_string()),
        text(&dir.path().display().to_string()),
        text(&db_path.display().to_string()),
    ]);

    let conn = connect(&store, &connector, &mut prompter)
        .await
        .unwrap()
        .expect("connection");
    assert_eq!(conn.engine(), Engine::Sqlite);
    assert_eq!(conn.database_name(), "app");
    assert_eq!(prompter.remaining(), 0);
    assert_eq!(connector.seen(), vec![ConnectParams::Sqlite { path: db_path.clone() }]);

    assert_eq!(store.get(SESSION_SECTION, "engine").unwrap(), "sqlite");
    assert_eq!(
        store.get(SESSION_SECTION, "path").unwrap(),
        db_path.display().to_string()
    );
}

#[tokio::test]
async fn new_session_replaces_the_previous_one_entirely() {
    let (dir, store) = temp_store();
    secret::ensure_secret(&store).unwrap();
    let connector = FakeConnector::accepting();

    connect(&store, &connector, &mut mysql_script("hunter2", ""))
        .await
        .unwrap()
        .expect("connection");

    let db_path = dir.path().join("app.db");
    std::fs::File::create(&db_path).unwrap();
    let mut prompter = ScriptedPrompter::new([
        Answer::Choice(1),
        text(&db_path.display().to_string()),
    ]);
    connect(&store, &connector, &mut prompter)
        .await
        .unwrap()
        .expect("connection");

    let keys: Vec<String> = store
        .list_items(SESSION_SECTION)
        .unwrap()
        .into_iter()
        .map(|(k, _)| k)
        .collect();
    assert_eq!(keys, vec!["engine".to_string(), "path".to_string()]);
}
