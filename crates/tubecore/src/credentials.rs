//! Credential strategies for yt-dlp.
//!
//! Each strategy turns its material into yt-dlp command-line arguments. The
//! arguments are built per extraction, so a token or cookie file replaced on
//! disk is picked up by the next request without a restart.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::AuthConfig;
use crate::error::ExtractionError;

/// Directory name the yt-dlp OAuth2 plugin keeps its token in, below the cache dir
const OAUTH2_CACHE_SUBDIR: &str = "youtube-oauth2";

/// Supplies authentication arguments to the extraction engine.
pub trait CredentialProvider: Send + Sync {
    /// Strategy name for logs (e.g., "none", "oauth2-token")
    fn name(&self) -> &'static str;

    /// Arguments appended to every yt-dlp invocation.
    fn engine_args(&self) -> Result<Vec<String>, ExtractionError>;
}

/// Builds the provider matching the configured auth mode.
pub fn provider_for(auth: &AuthConfig) -> Arc<dyn CredentialProvider> {
    match auth {
        AuthConfig::None => Arc::new(Anonymous),
        AuthConfig::Headers(headers) => Arc::new(StaticHeaders::new(headers.clone())),
        AuthConfig::OAuth2Token(path) => Arc::new(OAuth2TokenFile::new(path.clone())),
        AuthConfig::Cookies(path) => Arc::new(CookiesFile::new(path.clone())),
    }
}

/// No authentication.
pub struct Anonymous;

impl CredentialProvider for Anonymous {
    fn name(&self) -> &'static str {
        "none"
    }

    fn engine_args(&self) -> Result<Vec<String>, ExtractionError> {
        Ok(Vec::new())
    }
}

/// Fixed HTTP headers sent with every engine request.
pub struct StaticHeaders {
    headers: Vec<(String, String)>,
}

impl StaticHeaders {
    pub fn new(headers: Vec<(String, String)>) -> Self {
        Self { headers }
    }
}

impl CredentialProvider for StaticHeaders {
    fn name(&self) -> &'static str {
        "headers"
    }

    fn engine_args(&self) -> Result<Vec<String>, ExtractionError> {
        let mut args = Vec::with_capacity(self.headers.len() * 2);
        for (name, value) in &self.headers {
            args.push("--add-header".to_string());
            args.push(format!("{}:{}", name, value));
        }
        Ok(args)
    }
}

/// Token file maintained by the yt-dlp YouTube OAuth2 plugin.
///
/// Token refresh is the plugin's job; this provider only checks the file is
/// there and points yt-dlp at the cache directory that holds it.
pub struct OAuth2TokenFile {
    path: PathBuf,
}

impl OAuth2TokenFile {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// The `--cache-dir` yt-dlp needs so the plugin finds the token.
    ///
    /// The plugin stores `<cache-dir>/youtube-oauth2/token_data.json`; a token
    /// file outside such a directory uses its own parent.
    fn cache_dir(&self) -> PathBuf {
        let parent = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        match (parent.file_name(), parent.parent()) {
            (Some(name), Some(grandparent)) if name == OAUTH2_CACHE_SUBDIR => grandparent.to_path_buf(),
            _ => parent.to_path_buf(),
        }
    }
}

impl CredentialProvider for OAuth2TokenFile {
    fn name(&self) -> &'static str {
        "oauth2-token"
    }

    fn engine_args(&self) -> Result<Vec<String>, ExtractionError> {
        let contents = std::fs::read_to_string(&self.path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => {
                ExtractionError::CredentialUnavailable(format!("OAuth2 token file not found: {}", self.path.display()))
            }
            _ => ExtractionError::CredentialUnavailable(format!(
                "Cannot read OAuth2 token file {}: {}",
                self.path.display(),
                e
            )),
        })?;

        if contents.trim().is_empty() {
            return Err(ExtractionError::CredentialUnavailable(format!(
                "OAuth2 token file is empty: {}",
                self.path.display()
            )));
        }

        let is_object = serde_json::from_str::<serde_json::Value>(&contents)
            .map(|value| value.is_object())
            .unwrap_or(false);
        if !is_object {
            return Err(ExtractionError::CredentialUnavailable(format!(
                "OAuth2 token file is not a JSON object: {}",
                self.path.display()
            )));
        }

        Ok(vec![
            "--username".to_string(),
            "oauth2".to_string(),
            "--password".to_string(),
            String::new(),
            "--cache-dir".to_string(),
            self.cache_dir().to_string_lossy().into_owned(),
        ])
    }
}

/// Netscape HTTP Cookie File exported from a logged-in browser session.
pub struct CookiesFile {
    path: PathBuf,
}

impl CookiesFile {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl CredentialProvider for CookiesFile {
    fn name(&self) -> &'static str {
        "cookies"
    }

    fn engine_args(&self) -> Result<Vec<String>, ExtractionError> {
        let contents = std::fs::read_to_string(&self.path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => {
                ExtractionError::CredentialUnavailable(format!("Cookies file not found: {}", self.path.display()))
            }
            _ => ExtractionError::CredentialUnavailable(format!(
                "Cannot read cookies file {}: {}",
                self.path.display(),
                e
            )),
        })?;

        if !is_netscape_cookie_file(&contents) {
            // yt-dlp rejects the file with its own message; keep going so the client sees it
            log::warn!(
                "Cookies file {} does not look like a Netscape HTTP Cookie File",
                self.path.display()
            );
        }

        Ok(vec!["--cookies".to_string(), self.path.to_string_lossy().into_owned()])
    }
}

/// Validates Netscape HTTP Cookie File format.
///
/// Requires the "# Netscape HTTP Cookie File" (or "# HTTP Cookie File") header
/// and at least one tab-separated cookie line with seven fields.
pub fn is_netscape_cookie_file(contents: &str) -> bool {
    let has_header = contents.lines().any(|line| {
        let line = line.trim();
        line.starts_with("# Netscape HTTP Cookie File") || line.starts_with("# HTTP Cookie File")
    });

    let has_cookies = contents.lines().any(|line| {
        let trimmed = line.trim();
        !trimmed.is_empty() && !trimmed.starts_with('#') && trimmed.split('\t').count() >= 7
    });

    has_header && has_cookies
}
