use std::collections::BTreeMap;
use std::path::Path;

use crate::Result;

/// Secret lookup: values from an optional `.env` file win over the process environment.
#[derive(Clone, Default)]
pub struct Env {
    pub dotenv: BTreeMap<String, String>,
}

impl std::fmt::Debug for Env {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let keys: Vec<&str> = self.dotenv.keys().map(|key| key.as_str()).collect();
        f.debug_struct("Env").field("dotenv_keys", &keys).finish()
    }
}

impl Env {
    pub fn parse_dotenv(contents: &str) -> Self {
        Self {
            dotenv: parse_dotenv(contents),
        }
    }

    /// Read `path` if given. A missing default `.env` is not an error; an explicit path is.
    pub async fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => {
                let contents = tokio::fs::read_to_string(path).await?;
                Ok(Self::parse_dotenv(&contents))
            }
            None => match tokio::fs::read_to_string(".env").await {
                Ok(contents) => Ok(Self::parse_dotenv(&contents)),
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
                Err(err) => Err(err.into()),
            },
        }
    }

    pub fn get(&self, key: &str) -> Option<String> {
        if let Some(value) = self.dotenv.get(key) {
            return Some(value.clone());
        }
        std::env::var(key)
            .ok()
            .filter(|value| !value.trim().is_empty())
    }
}

/// `KEY=value` lines; `export ` prefixes, `#` comments and surrounding quotes are accepted.
/// Unquoted values end at ` #`. Empty values are skipped so the process env still applies.
pub fn parse_dotenv(contents: &str) -> BTreeMap<String, String> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| {
            let line = line.strip_prefix("export ").unwrap_or(line);
            let (key, value) = line.split_once('=')?;
            let key = key.trim();
            let value = dotenv_value(value.trim());
            (!key.is_empty() && !value.trim().is_empty())
                .then(|| (key.to_string(), value.to_string()))
        })
        .collect()
}

fn dotenv_value(raw: &str) -> &str {
    for quote in ['"', '\''] {
        if let Some(inner) = raw
            .strip_prefix(quote)
            .and_then(|rest| rest.strip_suffix(quote))
        {
            return inner;
        }
    }
    match raw.find(" #") {
        Some(end) => raw[..end].trim_end(),
        None => raw,
    }
}
