//! Extraction engine seam and its yt-dlp implementation.
//!
//! yt-dlp does all of the real work (site extractors, manifest resolution,
//! authentication). This module only builds the command line, runs the
//! process and turns its exit status and output into a typed result.

use std::process::{ExitStatus, Stdio};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::process::Command as TokioCommand;

use crate::config::EngineConfig;
use crate::credentials::{self, CredentialProvider};
use crate::error::ExtractionError;
use crate::types::RawVideoInfo;

/// Resolves a media URL into raw stream metadata.
#[async_trait]
pub trait ExtractionEngine: Send + Sync {
    /// Human-readable name of this engine (e.g., "yt-dlp")
    fn name(&self) -> &str;

    /// Fetch metadata and the list of available formats without downloading.
    async fn extract(&self, url: &str) -> Result<RawVideoInfo, ExtractionError>;
}

/// Engine backed by the `yt-dlp` executable.
pub struct YtDlpEngine {
    bin: String,
    format_selector: String,
    credentials: Arc<dyn CredentialProvider>,
}

impl YtDlpEngine {
    pub fn new(config: &EngineConfig) -> Self {
        Self::with_credentials(config, credentials::provider_for(&config.auth))
    }

    pub fn with_credentials(config: &EngineConfig, credentials: Arc<dyn CredentialProvider>) -> Self {
        Self {
            bin: config.ytdl_bin.clone(),
            format_selector: config.format_selector.clone(),
            credentials,
        }
    }

    /// Name of the credential strategy in use
    pub fn credential_strategy(&self) -> &'static str {
        self.credentials.name()
    }

    /// Full argument list for a metadata-only run against `url`.
    fn build_args(&self, url: &str) -> Result<Vec<String>, ExtractionError> {
        let mut args: Vec<String> = [
            "--dump-single-json",
            "--no-playlist",
            "--no-warnings",
            "--quiet",
            "-f",
            self.format_selector.as_str(),
        ]
        .iter()
        .map(|arg| arg.to_string())
        .collect();

        args.extend(self.credentials.engine_args()?);

        // Anything after `--` is a URL, even if it starts with a dash
        args.push("--".to_string());
        args.push(url.to_string());

        Ok(args)
    }

    /// Runs `yt-dlp --version`.
    pub async fn probe_version(&self) -> Result<String, ExtractionError> {
        let output = TokioCommand::new(&self.bin)
            .arg("--version")
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| ExtractionError::Spawn {
                bin: self.bin.clone(),
                source,
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ExtractionError::Engine(engine_error_message(&stderr, output.status)));
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

#[async_trait]
impl ExtractionEngine for YtDlpEngine {
    fn name(&self) -> &str {
        "yt-dlp"
    }

    async fn extract(&self, url: &str) -> Result<RawVideoInfo, ExtractionError> {
        let args = self.build_args(url)?;
        log::debug!("yt-dlp command: {} {}", self.bin, args.join(" "));

        // Dropping the future (timeout) kills the child
        let output = TokioCommand::new(&self.bin)
            .args(&args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| ExtractionError::Spawn {
                bin: self.bin.clone(),
                source,
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let message = engine_error_message(&stderr, output.status);
            if let Some(hint) = failure_hint(&message) {
                log::warn!("yt-dlp failed for {}: {} ({})", url, message, hint);
            }
            return Err(ExtractionError::Engine(message));
        }

        let info: RawVideoInfo = serde_json::from_slice(&output.stdout)?;
        Ok(info)
    }
}

/// Extracts the message a client should see from yt-dlp's stderr.
///
/// Prefers the `ERROR:` lines, falls back to the whole stderr, and finally to
/// the exit status when yt-dlp said nothing.
pub fn engine_error_message(stderr: &str, status: ExitStatus) -> String {
    let error_lines: Vec<&str> = stderr
        .lines()
        .map(str::trim)
        .filter(|line| line.starts_with("ERROR:"))
        .collect();

    if !error_lines.is_empty() {
        return error_lines.join("\n");
    }

    let trimmed = stderr.trim();
    if !trimmed.is_empty() {
        return trimmed.to_string();
    }

    match status.code() {
        Some(code) => format!("yt-dlp exited with status {}", code),
        None => "yt-dlp was terminated by a signal".to_string(),
    }
}

/// Operator hint for failures that usually mean the credential setup is wrong.
///
/// Only used for logs; the client always gets the engine message unchanged.
pub fn failure_hint(message: &str) -> Option<&'static str> {
    let lower = message.to_lowercase();

    if lower.contains("sign in to confirm you're not a bot")
        || lower.contains("sign in to confirm you’re not a bot")
        || lower.contains("please sign in")
        || lower.contains("use --cookies")
    {
        return Some("site requires authentication, check YTDL_AUTH_MODE");
    }

    if lower.contains("cookies are no longer valid") || lower.contains("cookies have likely been rotated") {
        return Some("cookies expired, export a fresh cookies file");
    }

    if lower.contains("http error 403") || lower.contains("http error 429") || lower.contains("too many requests") {
        return Some("request blocked or rate limited by the site");
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AuthConfig;
    use pretty_assertions::assert_eq;

    fn exit_status(code: i32) -> ExitStatus {
        #[cfg(unix)]
        {
            use std::os::unix::process::ExitStatusExt;
            ExitStatus::from_raw(code << 8)
        }
        #[cfg(windows)]
        {
            use std::os::windows::process::ExitStatusExt;
            ExitStatus::from_raw(code as u32)
        }
    }

    #[test]
    fn test_error_message_prefers_error_lines() {
        let stderr = "WARNING: [youtube] falling back to web client\n\
            ERROR: [youtube] dQw4w9WgXcQ: Video unavailable\n";
        assert_eq!(
            engine_error_message(stderr, exit_status(1)),
            "ERROR: [youtube] dQw4w9WgXcQ: Video unavailable"
        );
    }

    #[test]
    fn test_error_message_falls_back_to_stderr_then_status() {
        assert_eq!(
            engine_error_message("  Traceback: boom \n", exit_status(1)),
            "Traceback: boom"
        );
        assert_eq!(engine_error_message("", exit_status(2)), "yt-dlp exited with status 2");
    }

    #[test]
    fn test_failure_hints() {
        assert!(failure_hint("ERROR: [youtube] x: Sign in to confirm you're not a bot").is_some());
        assert!(failure_hint("ERROR: unable to download webpage: HTTP Error 429: Too Many Requests").is_some());
        assert_eq!(failure_hint("ERROR: [youtube] x: Video unavailable"), None);
    }

    #[test]
    fn test_build_args_anonymous() {
        let engine = YtDlpEngine::new(&EngineConfig::default());
        let args = engine.build_args("https://youtu.be/dQw4w9WgXcQ").unwrap();

        assert_eq!(
            args,
            vec![
                "--dump-single-json",
                "--no-playlist",
                "--no-warnings",
                "--quiet",
                "-f",
                "bestvideo+bestaudio/best",
                "--",
                "https://youtu.be/dQw4w9WgXcQ",
            ]
        );
        assert_eq!(engine.credential_strategy(), "none");
    }

    #[test]
    fn test_build_args_places_credentials_before_url() {
        let config = EngineConfig {
            auth: AuthConfig::Headers(vec![("Authorization".into(), "Bearer abc".into())]),
            ..EngineConfig::default()
        };
        let engine = YtDlpEngine::new(&config);
        let args = engine.build_args("-notaflag").unwrap();

        assert_eq!(
            &args[6..],
            &["--add-header", "Authorization:Bearer abc", "--", "-notaflag"]
        );
    }

    #[test]
    fn test_build_args_propagates_credential_errors() {
        let config = EngineConfig {
            auth: AuthConfig::OAuth2Token("/nonexistent/youtube-oauth2/token_data.json".into()),
            ..EngineConfig::default()
        };
        let engine = YtDlpEngine::new(&config);

        let err = engine.build_args("https://youtu.be/dQw4w9WgXcQ").unwrap_err();
        assert_eq!(
            err.to_string(),
            "OAuth2 token file not found: /nonexistent/youtube-oauth2/token_data.json"
        );
    }

    #[tokio::test]
    async fn test_missing_binary_is_spawn_error() {
        let config = EngineConfig {
            ytdl_bin: "/nonexistent/bin/yt-dlp".into(),
            ..EngineConfig::default()
        };
        let engine = YtDlpEngine::new(&config);

        let err = engine.extract("https://youtu.be/dQw4w9WgXcQ").await.unwrap_err();
        assert!(matches!(err, ExtractionError::Spawn { .. }));
        assert!(err.to_string().starts_with("Failed to run /nonexistent/bin/yt-dlp"));
    }

    /// Drives the engine against a shell script standing in for yt-dlp.
    ///
    /// All scenarios share one script and run sequentially: writing an
    /// executable while other test threads fork can fail with ETXTBSY.
    #[cfg(unix)]
    #[tokio::test]
    async fn test_fake_ytdlp_end_to_end() {
        use std::fs;
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::TempDir::new().unwrap();
        let script = dir.path().join("yt-dlp");
        let args_file = dir.path().join("args.txt");
        let info_file = dir.path().join("info.json");

        fs::write(
            &info_file,
            r#"{"title": "Sample", "thumbnail": "https://i.ytimg.com/vi/x/hq.jpg",
                "formats": [{"format_id": "18", "ext": "mp4", "vcodec": "avc1", "acodec": "mp4a", "filesize": 2097152, "fps": 30}]}"#,
        )
        .unwrap();
        fs::write(
            &script,
            format!(
                "#!/bin/sh\n\
                 printf '%s\\n' \"$@\" > '{args}'\n\
                 case \"$*\" in\n\
                   *--version*) echo '2024.12.06'; exit 0 ;;\n\
                   *not-a-url*) echo \"ERROR: [generic] 'not-a-url' is not a valid URL.\" >&2; exit 1 ;;\n\
                   *garbage*) echo 'this is not json'; exit 0 ;;\n\
                 esac\n\
                 cat '{info}'\n",
                args = args_file.display(),
                info = info_file.display()
            ),
        )
        .unwrap();
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();

        let config = EngineConfig {
            ytdl_bin: script.to_string_lossy().into_owned(),
            format_selector: "best".into(),
            auth: AuthConfig::Headers(vec![("User-Agent".into(), "tubeinfo-test".into())]),
            ..EngineConfig::default()
        };
        let engine = YtDlpEngine::new(&config);

        assert_eq!(engine.probe_version().await.unwrap(), "2024.12.06");

        let info = engine.extract("https://youtu.be/dQw4w9WgXcQ").await.unwrap();
        assert_eq!(info.title.as_deref(), Some("Sample"));
        assert_eq!(info.formats.len(), 1);
        assert_eq!(info.formats[0].filesize, Some(2_097_152.0));

        let recorded = fs::read_to_string(&args_file).unwrap();
        let recorded: Vec<&str> = recorded.lines().collect();
        assert_eq!(
            recorded,
            vec![
                "--dump-single-json",
                "--no-playlist",
                "--no-warnings",
                "--quiet",
                "-f",
                "best",
                "--add-header",
                "User-Agent:tubeinfo-test",
                "--",
                "https://youtu.be/dQw4w9WgXcQ",
            ]
        );

        let err = engine.extract("not-a-url").await.unwrap_err();
        assert!(matches!(err, ExtractionError::Engine(_)));
        assert_eq!(err.to_string(), "ERROR: [generic] 'not-a-url' is not a valid URL.");

        let err = engine.extract("garbage").await.unwrap_err();
        assert!(matches!(err, ExtractionError::InvalidOutput(_)));
    }
}
