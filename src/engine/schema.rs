//! Metadata table the built-in engine keeps inside the managed database.
//! Plain column types so the same DDL runs on MySQL and SQLite.

pub const META_TABLE: &str = "adb_conf";

pub const META_INIT: &str = r#"
CREATE TABLE IF NOT EXISTS adb_conf (
    db_name VARCHAR(100) NOT NULL PRIMARY KEY,
    version VARCHAR(50) NULL,
    template VARCHAR(50) NULL
);
"#;

pub const SQLITE_TABLE_EXISTS: &str =
    "SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?";

pub const SQLITE_LIST_TABLES: &str =
    "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%'";

pub const MYSQL_TABLE_EXISTS: &str = "SELECT CAST(table_name AS CHAR) FROM information_schema.tables \
     WHERE table_schema = DATABASE() AND table_name = ?";

pub const MYSQL_LIST_TABLES: &str = "SELECT CAST(table_name AS CHAR) FROM information_schema.tables \
     WHERE table_schema = DATABASE() AND table_type = 'BASE TABLE'";

pub const SELECT_META: &str = "SELECT version, template FROM adb_conf WHERE db_name = ?";

pub const INSERT_META: &str = "INSERT INTO adb_conf (db_name, version, template) VALUES (?, NULL, NULL)";

pub const UPDATE_META: &str = "UPDATE adb_conf SET version = ?, template = ? WHERE db_name = ?";
