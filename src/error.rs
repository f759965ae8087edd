use sqlx::Error as SqlxError;
use std::path::PathBuf;
use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum AppError {
    #[error("Config is incomplete: missing {}", missing_label(.section, .key.as_deref()))]
    ConfigIncomplete {
        section: String,
        key: Option<String>,
    },

    #[error("Invalid value {value:?} for {section}.{key}")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
    },

    #[error("Unable to read config file at line {line}: {reason}")]
    StoreParse { line: usize, reason: String },

    #[error("Unable to encrypt value")]
    Encryption,

    #[error("Unable to decrypt value with the current secret")]
    Decryption,

    #[error("Connection rejected: {0}")]
    ConnectionRejected(String),

    #[error("URL responded with {code}")]
    HttpStatus { code: u16 },

    #[error("Unable to establish connection: {0}")]
    NetworkUnavailable(String),

    #[error("The version source did not contain compatible data: {0}")]
    MalformedPayload(String),

    #[error("This path does not point towards a JSON file: {}", .path.display())]
    SourceNotFound { path: PathBuf },

    #[error("Unable to read version source {}: {source}", .path.display())]
    SourceRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("HTTP request error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("Settings error: {0}")]
    Settings(#[from] Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(#[from] SqlxError),

    #[error("Database has not been initialized")]
    Uninitialized,

    #[error("Version source template {source_template:?} does not match database template {database_template:?}")]
    TemplateMismatch {
        database_template: String,
        source_template: String,
    },

    #[error("Invalid version source: {0}")]
    InvalidVersionSource(String),
}

impl AppError {
    pub fn missing_section(section: &str) -> Self {
        AppError::ConfigIncomplete {
            section: section.to_string(),
            key: None,
        }
    }

    pub fn missing_key(section: &str, key: &str) -> Self {
        AppError::ConfigIncomplete {
            section: section.to_string(),
            key: Some(key.to_string()),
        }
    }
}

impl From<figment::Error> for AppError {
    fn from(e: figment::Error) -> Self {
        AppError::Settings(Box::new(e))
    }
}

fn missing_label(section: &str, key: Option<&str>) -> String {
    match key {
        Some(key) => format!("{section}.{key}"),
        None => format!("section [{section}]"),
    }
}
