//! Startup configuration.
//!
//! Read once from the environment (after `.env` is loaded by the binary) and
//! passed explicitly to the engine and the server. Nothing here is global.

use std::fmt::Display;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use strum::{Display as StrumDisplay, EnumString};

use crate::error::ConfigError;

/// Default values used when a variable is unset or empty
pub mod defaults {
    use super::Duration;

    /// Listen address of the HTTP server
    pub const BIND: &str = "0.0.0.0:5000";

    /// yt-dlp executable, resolved through PATH
    pub const YTDL_BIN: &str = "yt-dlp";

    /// Format selector passed to `yt-dlp -f`
    pub const FORMAT_SELECTOR: &str = "bestvideo+bestaudio/best";

    /// Timeout for a single extraction (in seconds)
    /// Metadata fetches for long videos behind slow proxies can take minutes
    pub const YTDLP_TIMEOUT_SECS: u64 = 240;

    /// Maximum number of yt-dlp processes running at once
    pub const MAX_CONCURRENT_EXTRACTIONS: usize = 4;

    pub fn ytdlp_timeout() -> Duration {
        Duration::from_secs(YTDLP_TIMEOUT_SECS)
    }
}

/// How yt-dlp authenticates against the target site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, StrumDisplay, EnumString)]
#[strum(ascii_case_insensitive)]
pub enum AuthMode {
    #[strum(to_string = "none")]
    None,
    #[strum(to_string = "headers")]
    Headers,
    #[strum(to_string = "oauth2-token", serialize = "oauth2")]
    OAuth2Token,
    #[strum(to_string = "cookies")]
    Cookies,
}

/// Auth mode together with the material it needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthConfig {
    None,
    /// `(name, value)` pairs sent with every engine request
    Headers(Vec<(String, String)>),
    /// Token file written by the yt-dlp OAuth2 plugin
    OAuth2Token(PathBuf),
    /// Netscape-format cookie file
    Cookies(PathBuf),
}

impl AuthConfig {
    pub fn mode(&self) -> AuthMode {
        match self {
            AuthConfig::None => AuthMode::None,
            AuthConfig::Headers(_) => AuthMode::Headers,
            AuthConfig::OAuth2Token(_) => AuthMode::OAuth2Token,
            AuthConfig::Cookies(_) => AuthMode::Cookies,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub bind: SocketAddr,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pub ytdl_bin: String,
    pub format_selector: String,
    pub timeout: Duration,
    pub max_concurrent_extractions: usize,
    pub auth: AuthConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            ytdl_bin: defaults::YTDL_BIN.to_string(),
            format_selector: defaults::FORMAT_SELECTOR.to_string(),
            timeout: defaults::ytdlp_timeout(),
            max_concurrent_extractions: defaults::MAX_CONCURRENT_EXTRACTIONS,
            auth: AuthConfig::None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub engine: EngineConfig,
}

impl AppConfig {
    /// Builds the configuration from process environment variables.
    ///
    /// | Variable | Default |
    /// |---|---|
    /// | `TUBEINFO_BIND` | `0.0.0.0:5000` |
    /// | `YTDL_BIN` | `yt-dlp` |
    /// | `YTDL_FORMAT` | `bestvideo+bestaudio/best` |
    /// | `YTDL_TIMEOUT_SECS` | `240` |
    /// | `MAX_CONCURRENT_EXTRACTIONS` | `4` |
    /// | `YTDL_AUTH_MODE` | `none` |
    /// | `YTDL_HEADERS` | newline-separated `Name: Value` entries |
    /// | `YTDL_OAUTH2_TOKEN_FILE` | required for `oauth2-token` |
    /// | `YTDL_COOKIES_FILE` | required for `cookies` |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`AppConfig::from_env`] with an injectable variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let bind = parse_var(&lookup, "TUBEINFO_BIND", defaults::BIND)?;

        let timeout_secs: u64 = parse_var(&lookup, "YTDL_TIMEOUT_SECS", &defaults::YTDLP_TIMEOUT_SECS.to_string())?;
        if timeout_secs == 0 {
            return Err(invalid("YTDL_TIMEOUT_SECS", "0", "must be greater than zero"));
        }

        let max_concurrent_extractions: usize = parse_var(
            &lookup,
            "MAX_CONCURRENT_EXTRACTIONS",
            &defaults::MAX_CONCURRENT_EXTRACTIONS.to_string(),
        )?;
        if max_concurrent_extractions == 0 {
            return Err(invalid("MAX_CONCURRENT_EXTRACTIONS", "0", "must be greater than zero"));
        }

        let engine = EngineConfig {
            ytdl_bin: non_empty(&lookup, "YTDL_BIN").unwrap_or_else(|| defaults::YTDL_BIN.to_string()),
            format_selector: non_empty(&lookup, "YTDL_FORMAT").unwrap_or_else(|| defaults::FORMAT_SELECTOR.to_string()),
            timeout: Duration::from_secs(timeout_secs),
            max_concurrent_extractions,
            auth: parse_auth(&lookup)?,
        };

        Ok(Self {
            server: ServerConfig { bind },
            engine,
        })
    }
}

fn parse_auth<F>(lookup: &F) -> Result<AuthConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mode = match non_empty(lookup, "YTDL_AUTH_MODE") {
        Some(raw) => AuthMode::from_str(&raw)
            .map_err(|_| invalid("YTDL_AUTH_MODE", &raw, "expected none, headers, oauth2-token or cookies"))?,
        None => AuthMode::None,
    };

    let auth = match mode {
        AuthMode::None => AuthConfig::None,
        AuthMode::Headers => {
            let raw = non_empty(lookup, "YTDL_HEADERS").ok_or(ConfigError::Missing {
                var: "YTDL_HEADERS",
                mode,
            })?;
            AuthConfig::Headers(parse_headers(&raw)?)
        }
        AuthMode::OAuth2Token => {
            let path = non_empty(lookup, "YTDL_OAUTH2_TOKEN_FILE").ok_or(ConfigError::Missing {
                var: "YTDL_OAUTH2_TOKEN_FILE",
                mode,
            })?;
            AuthConfig::OAuth2Token(expand_path(&path))
        }
        AuthMode::Cookies => {
            let path = non_empty(lookup, "YTDL_COOKIES_FILE").ok_or(ConfigError::Missing {
                var: "YTDL_COOKIES_FILE",
                mode,
            })?;
            AuthConfig::Cookies(expand_path(&path))
        }
    };

    Ok(auth)
}

/// Parses newline-separated `Name: Value` entries. Blank lines are skipped.
pub fn parse_headers(raw: &str) -> Result<Vec<(String, String)>, ConfigError> {
    let mut headers = Vec::new();

    for line in raw.lines().map(str::trim).filter(|line| !line.is_empty()) {
        let Some((name, value)) = line.split_once(':') else {
            return Err(invalid("YTDL_HEADERS", line, "expected `Name: Value`"));
        };
        let name = name.trim();
        if name.is_empty() || name.contains(char::is_whitespace) {
            return Err(invalid("YTDL_HEADERS", line, "header name must be a single token"));
        }
        headers.push((name.to_string(), value.trim().to_string()));
    }

    if headers.is_empty() {
        return Err(invalid("YTDL_HEADERS", raw, "no headers given"));
    }

    Ok(headers)
}

fn expand_path(raw: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(raw).into_owned())
}

fn non_empty<F>(lookup: &F, var: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(var).map(|value| value.trim().to_string()).filter(|value| !value.is_empty())
}

fn parse_var<F, T>(lookup: &F, var: &'static str, default: &str) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: Display,
{
    let raw = non_empty(lookup, var).unwrap_or_else(|| default.to_string());
    raw.parse().map_err(|e: T::Err| invalid(var, &raw, &e.to_string()))
}

fn invalid(var: &'static str, value: &str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        var,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();

        assert_eq!(config.server.bind, "0.0.0.0:5000".parse::<SocketAddr>().unwrap());
        assert_eq!(config.engine, EngineConfig::default());
        assert_eq!(config.engine.format_selector, "bestvideo+bestaudio/best");
        assert_eq!(config.engine.timeout, Duration::from_secs(240));
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("TUBEINFO_BIND", "127.0.0.1:8080"),
            ("YTDL_BIN", "/opt/yt-dlp/yt-dlp"),
            ("YTDL_FORMAT", "best"),
            ("YTDL_TIMEOUT_SECS", "30"),
            ("MAX_CONCURRENT_EXTRACTIONS", "2"),
        ])
        .unwrap();

        assert_eq!(config.server.bind.port(), 8080);
        assert_eq!(config.engine.ytdl_bin, "/opt/yt-dlp/yt-dlp");
        assert_eq!(config.engine.format_selector, "best");
        assert_eq!(config.engine.timeout, Duration::from_secs(30));
        assert_eq!(config.engine.max_concurrent_extractions, 2);
    }

    #[test]
    fn test_blank_values_fall_back_to_defaults() {
        let config = config_from(&[("YTDL_BIN", "   "), ("YTDL_AUTH_MODE", "")]).unwrap();
        assert_eq!(config.engine.ytdl_bin, "yt-dlp");
        assert_eq!(config.engine.auth, AuthConfig::None);
    }

    #[test]
    fn test_invalid_numbers_are_rejected() {
        assert!(matches!(
            config_from(&[("YTDL_TIMEOUT_SECS", "soon")]),
            Err(ConfigError::Invalid {
                var: "YTDL_TIMEOUT_SECS",
                ..
            })
        ));
        assert!(matches!(
            config_from(&[("MAX_CONCURRENT_EXTRACTIONS", "0")]),
            Err(ConfigError::Invalid {
                var: "MAX_CONCURRENT_EXTRACTIONS",
                ..
            })
        ));
        assert!(config_from(&[("TUBEINFO_BIND", "localhost")]).is_err());
    }

    #[test]
    fn test_auth_mode_parsing() {
        assert_eq!(AuthMode::from_str("none").unwrap(), AuthMode::None);
        assert_eq!(AuthMode::from_str("HEADERS").unwrap(), AuthMode::Headers);
        assert_eq!(AuthMode::from_str("oauth2-token").unwrap(), AuthMode::OAuth2Token);
        assert_eq!(AuthMode::from_str("oauth2").unwrap(), AuthMode::OAuth2Token);
        assert_eq!(AuthMode::from_str("cookies").unwrap(), AuthMode::Cookies);
        assert!(AuthMode::from_str("kerberos").is_err());
        assert_eq!(AuthMode::OAuth2Token.to_string(), "oauth2-token");
    }

    #[test]
    fn test_unknown_auth_mode() {
        let err = config_from(&[("YTDL_AUTH_MODE", "basic")]).unwrap_err();
        assert!(err.to_string().contains("YTDL_AUTH_MODE"));
    }

    #[test]
    fn test_headers_mode() {
        let config = config_from(&[
            ("YTDL_AUTH_MODE", "headers"),
            ("YTDL_HEADERS", "Authorization: Bearer abc\n\nCookie: a=1; b=2\n"),
        ])
        .unwrap();

        assert_eq!(
            config.engine.auth,
            AuthConfig::Headers(vec![
                ("Authorization".to_string(), "Bearer abc".to_string()),
                ("Cookie".to_string(), "a=1; b=2".to_string()),
            ])
        );
        assert_eq!(config.engine.auth.mode(), AuthMode::Headers);
    }

    #[test]
    fn test_mode_without_material_is_rejected() {
        assert!(matches!(
            config_from(&[("YTDL_AUTH_MODE", "headers")]),
            Err(ConfigError::Missing { var: "YTDL_HEADERS", .. })
        ));
        assert!(matches!(
            config_from(&[("YTDL_AUTH_MODE", "oauth2-token")]),
            Err(ConfigError::Missing {
                var: "YTDL_OAUTH2_TOKEN_FILE",
                ..
            })
        ));
        assert!(matches!(
            config_from(&[("YTDL_AUTH_MODE", "cookies")]),
            Err(ConfigError::Missing {
                var: "YTDL_COOKIES_FILE",
                ..
            })
        ));
    }

    #[test]
    fn test_token_file_mode() {
        let config = config_from(&[
            ("YTDL_AUTH_MODE", "oauth2-token"),
            ("YTDL_OAUTH2_TOKEN_FILE", "/var/lib/tubeinfo/youtube-oauth2/token_data.json"),
        ])
        .unwrap();

        assert_eq!(
            config.engine.auth,
            AuthConfig::OAuth2Token(PathBuf::from("/var/lib/tubeinfo/youtube-oauth2/token_data.json"))
        );
    }

    #[test]
    fn test_parse_headers_rejects_malformed_lines() {
        assert!(parse_headers("Authorization Bearer abc").is_err());
        assert!(parse_headers(": value").is_err());
        assert!(parse_headers("Bad Name: value").is_err());
        assert!(parse_headers("\n \n").is_err());
    }

    #[test]
    fn test_parse_headers_keeps_colons_in_value() {
        let headers = parse_headers("Referer: https://www.youtube.com/").unwrap();
        assert_eq!(
            headers,
            vec![("Referer".to_string(), "https://www.youtube.com/".to_string())]
        );
    }
}
