//! Named version sources (`VERSION_SOURCES`): local JSON files or URLs serving JSON.
//!
//! `add`/`select` are interactive and may write the registry; `resolve` is a
//! side-effect-free fetch shared by every flow that needs the payload.

pub mod fetch;

use std::path::Path;

use serde_json::Value;
use tracing::{info, warn};

pub use fetch::{HttpFetch, HttpResponse, ReqwestFetcher, SourceLocation, is_web};

use crate::error::AppError;
use crate::prompt::Prompter;
use crate::store::{ConfigStore, SOURCES_SECTION};
use crate::ui;

pub const CREATE_NEW_CHOICE: &str = "Create new";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionSource {
    pub name: String,
    pub location: String,
}

impl VersionSource {
    pub fn kind(&self) -> &'static str {
        if is_web(&self.location) { "web" } else { "file" }
    }
}

pub struct VersionSourceRegistry<'a, F: HttpFetch + ?Sized> {
    store: &'a ConfigStore,
    fetcher: &'a F,
}

impl<'a, F: HttpFetch + ?Sized> VersionSourceRegistry<'a, F> {
    pub fn new(store: &'a ConfigStore, fetcher: &'a F) -> Self {
        Self { store, fetcher }
    }

    pub fn list(&self) -> Result<Vec<VersionSource>, AppError> {
        Ok(self
            .store
            .list_items(SOURCES_SECTION)?
            .into_iter()
            .map(|(name, location)| VersionSource { name, location })
            .collect())
    }

    /// Returns false when no source with that name exists.
    pub fn remove(&self, name: &str) -> Result<bool, AppError> {
        self.store.remove_key(SOURCES_SECTION, name)
    }

    pub async fn resolve(&self, location: &str) -> Result<Value, AppError> {
        fetch::resolve(self.fetcher, location).await
    }

    /// Check that `location` currently yields a JSON payload.
    pub async fn validate(&self, location: &str) -> Result<Value, AppError> {
        if let SourceLocation::File(path) = SourceLocation::parse(location)?
            && !path.is_file()
        {
            return Err(AppError::SourceNotFound { path });
        }
        self.resolve(location).await
    }

    /// Ask for a location until one validates, then register it. A location
    /// that fails validation is reported and asked for again.
    pub async fn prompt_and_add<P>(&self, prompter: &mut P) -> Result<Option<VersionSource>, AppError>
    where
        P: Prompter + ?Sized,
    {
        println!("Version sources can either be local JSON files or URL's returning JSON data.\n");
        loop {
            let Some(location) = prompter.ask_text(
                "Please provide either an absolute local file path or a local/remote URL",
                None,
            )?
            else {
                return Ok(None);
            };
            let location = location.trim();
            match self.validate(location).await {
                Ok(payload) => return self.register(location, &payload, prompter),
                Err(e) if is_invalid_location(&e) => {
                    warn!(location = %location, error = %e, "version source rejected");
                    ui::failure(e.to_string());
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Validate `location_input` once, let the user confirm a label (defaulting to
    /// the payload's `name`), then write `label = location_input`. Nothing is
    /// written when validation fails or the user aborts.
    pub async fn add<P>(&self, location_input: &str, prompter: &mut P) -> Result<Option<VersionSource>, AppError>
    where
        P: Prompter + ?Sized,
    {
        let payload = self.validate(location_input).await?;
        self.register(location_input, &payload, prompter)
    }

    fn register<P>(
        &self,
        location: &str,
        payload: &Value,
        prompter: &mut P,
    ) -> Result<Option<VersionSource>, AppError>
    where
        P: Prompter + ?Sized,
    {
        let default_name = default_label(payload, location);

        let Some(answer) = prompter.ask_text("Name the template", Some(&default_name))? else {
            return Ok(None);
        };
        let name = match answer.trim() {
            "" => default_name,
            trimmed => trimmed.to_string(),
        };

        self.store.write([(
            SOURCES_SECTION,
            vec![(name.clone(), location.to_string())],
        )])?;
        info!(name = %name, location = %location, "registered version source");

        Ok(Some(VersionSource {
            name,
            location: location.to_string(),
        }))
    }

    /// Pick a registered source (or create one). Returns its location.
    pub async fn select<P>(&self, prompter: &mut P) -> Result<Option<String>, AppError>
    where
        P: Prompter + ?Sized,
    {
        let sources = self.list()?;
        if sources.is_empty() {
            return Ok(self.prompt_and_add(prompter).await?.map(|s| s.location));
        }

        let mut choices: Vec<String> = sources
            .iter()
            .map(|s| format!("{} ({})", s.name, s.kind()))
            .collect();
        choices.push(CREATE_NEW_CHOICE.to_string());

        let Some(idx) = prompter.ask_choice("Select a version source", &choices)? else {
            return Ok(None);
        };
        match sources.get(idx) {
            Some(source) => Ok(Some(source.location.clone())),
            None => Ok(self.prompt_and_add(prompter).await?.map(|s| s.location)),
        }
    }
}

/// Failures that mean "this location is not a usable source", as opposed to
/// local store or I/O trouble.
fn is_invalid_location(err: &AppError) -> bool {
    matches!(
        err,
        AppError::SourceNotFound { .. }
            | AppError::SourceRead { .. }
            | AppError::HttpStatus { .. }
            | AppError::NetworkUnavailable(_)
            | AppError::MalformedPayload(_)
            | AppError::UrlParse(_)
    )
}

fn default_label(payload: &Value, location: &str) -> String {
    if let Some(name) = payload.get("name").and_then(Value::as_str)
        && !name.trim().is_empty()
    {
        return name.trim().to_string();
    }
    Path::new(location)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| location.to_string())
}
