#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::path::PathBuf;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use alphadb_cli::AppError;
use alphadb_cli::db::{ConnectParams, ConnectionError, Connector};
use alphadb_cli::prompt::Prompter;
use alphadb_cli::sources::{HttpFetch, HttpResponse};
use alphadb_cli::store::ConfigStore;
use async_trait::async_trait;
use tempfile::TempDir;

/// Store backed by a file inside a fresh temp dir. Keep the `TempDir` alive.
pub fn temp_store() -> (TempDir, ConfigStore) {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let store = ConfigStore::new(dir.path().join("alphadb").join("cli-config.ini"));
    (dir, store)
}

#[derive(Debug, Clone)]
pub enum Answer {
    Text(String),
    Password(String),
    Choice(usize),
    Confirm(bool),
    Abort,
}

pub fn text(s: &str) -> Answer {
    Answer::Text(s.to_string())
}

/// Replays canned answers in order; panics when the script and the questions diverge.
#[derive(Debug, Default)]
pub struct ScriptedPrompter {
    answers: VecDeque<Answer>,
    pub asked: Vec<String>,
}

impl ScriptedPrompter {
    pub fn new(answers: impl IntoIterator<Item = Answer>) -> Self {
        Self {
            answers: answers.into_iter().collect(),
            asked: Vec::new(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.answers.len()
    }

    fn next(&mut self, message: &str) -> Answer {
        self.asked.push(message.to_string());
        self.answers
            .pop_front()
            .unwrap_or_else(|| panic!("no scripted answer for {message:?}"))
    }
}

impl Prompter for ScriptedPrompter {
    fn ask_text(&mut self, message: &str, default: Option<&str>) -> Result<Option<String>, AppError> {
        match self.next(message) {
            Answer::Text(s) if s.is_empty() => Ok(Some(default.unwrap_or_default().to_string())),
            Answer::Text(s) => Ok(Some(s)),
            Answer::Abort => Ok(None),
            other => panic!("expected text answer for {message:?}, got {other:?}"),
        }
    }

    fn ask_password(&mut self, message: &str) -> Result<Option<String>, AppError> {
        match self.next(message) {
            Answer::Password(s) => Ok(Some(s)),
            Answer::Abort => Ok(None),
            other => panic!("expected password answer for {message:?}, got {other:?}"),
        }
    }

    fn ask_choice(&mut self, message: &str, choices: &[String]) -> Result<Option<usize>, AppError> {
        match self.next(message) {
            Answer::Choice(idx) => {
                assert!(idx < choices.len(), "choice {idx} out of range for {choices:?}");
                Ok(Some(idx))
            }
            Answer::Abort => Ok(None),
            other => panic!("expected choice answer for {message:?}, got {other:?}"),
        }
    }

    fn ask_confirm(&mut self, message: &str, _default: bool) -> Result<Option<bool>, AppError> {
        match self.next(message) {
            Answer::Confirm(b) => Ok(Some(b)),
            Answer::Abort => Ok(None),
            other => panic!("expected confirm answer for {message:?}, got {other:?}"),
        }
    }
}

#[derive(Debug, Clone)]
pub enum StubReply {
    Status(u16, Vec<u8>),
    Offline,
}

/// Canned HTTP replies per URL; unknown URLs behave as unreachable.
#[derive(Debug, Default)]
pub struct StubFetcher {
    replies: HashMap<String, StubReply>,
    calls: AtomicUsize,
}

impl StubFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, url: &str, status: u16, body: &str) -> Self {
        self.replies
            .insert(url.to_string(), StubReply::Status(status, body.as_bytes().to_vec()));
        self
    }

    pub fn offline(mut self, url: &str) -> Self {
        self.replies.insert(url.to_string(), StubReply::Offline);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl HttpFetch for StubFetcher {
    async fn get(&self, url: &str) -> Result<HttpResponse, AppError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.replies.get(url) {
            Some(StubReply::Status(status, body)) => Ok(HttpResponse {
                status: *status,
                body: body.clone(),
            }),
            Some(StubReply::Offline) | None => {
                Err(AppError::NetworkUnavailable(format!("connection refused: {url}")))
            }
        }
    }
}

/// Records every connect attempt; accepts or rejects all of them.
#[derive(Debug)]
pub struct FakeConnector {
    accept: bool,
    alive: AtomicBool,
    seen: Mutex<Vec<ConnectParams>>,
}

impl FakeConnector {
    pub fn accepting() -> Self {
        Self {
            accept: true,
            alive: AtomicBool::new(true),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn rejecting() -> Self {
        Self {
            accept: false,
            alive: AtomicBool::new(true),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn drop_connections(&self) {
        self.alive.store(false, Ordering::SeqCst);
    }

    pub fn seen(&self) -> Vec<ConnectParams> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl Connector for FakeConnector {
    type Handle = String;

    async fn connect(&self, params: &ConnectParams) -> Result<String, ConnectionError> {
        self.seen.lock().unwrap().push(params.clone());
        self.alive.store(true, Ordering::SeqCst);
        if self.accept {
            Ok(params.describe())
        } else {
            Err(ConnectionError {
                engine: params.engine(),
                message: "Access denied for user".to_string(),
            })
        }
    }

    async fn is_live(&self, _handle: &mut String) -> bool {
        self.alive.load(Ordering::SeqCst)
    }
}

/// Write a JSON file into `dir` and return its absolute path as a string.
pub fn write_json(dir: &TempDir, file: &str, body: &str) -> String {
    let path: PathBuf = dir.path().join(file);
    std::fs::write(&path, body).expect("failed to write json fixture");
    path.display().to_string()
}
