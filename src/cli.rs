//! CLI argument parsing, validation, and startup helpers.

use crate::ServerConfig;
use crate::db::Database;
use crate::jwt::{DEFAULT_ACCESS_TOKEN_DURATION_SECS, TokenSecrets};
use clap::Parser;
use tracing::{error, info};

const MIN_JWT_SECRET_LENGTH: usize = 32;

pub const ACCESS_SECRET_ENV: &str = "JWT_ACCESS_SECRET";
pub const REFRESH_SECRET_ENV: &str = "JWT_REFRESH_SECRET";

const DEFAULT_ALLOWED_ORIGIN: &str = "http://localhost:5173";

#[derive(clap::ValueEnum, Clone, Debug, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
    Compact,
}

#[derive(Parser, Debug, Clone)]
#[command(name = "quillpost", about = "Personal blog posts behind JWT sessions")]
pub struct Args {
    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value = "7291")]
    pub port: u16,

    /// Path to SQLite database file
    #[arg(short, long, env = "DATABASE", default_value = "quillpost.db")]
    pub database: String,

    /// Path to file containing the access token secret. Prefer JWT_ACCESS_SECRET
    #[arg(long)]
    pub access_secret_file: Option<String>,

    /// Path to file containing the refresh token secret. Prefer JWT_REFRESH_SECRET
    #[arg(long)]
    pub refresh_secret_file: Option<String>,

    /// Access token lifetime in seconds
    #[arg(long, default_value_t = DEFAULT_ACCESS_TOKEN_DURATION_SECS,
        value_parser = clap::value_parser!(u64).range(1..))]
    pub access_token_ttl: u64,

    /// Omit the Secure attribute on the refresh cookie (local HTTP only)
    #[arg(long)]
    pub insecure_cookies: bool,

    /// Origin allowed to call the API with credentials. Repeatable
    #[arg(long = "allowed-origin", default_values_t = [DEFAULT_ALLOWED_ORIGIN.to_string()])]
    pub allowed_origins: Vec<String>,

    /// Log output format
    #[arg(short, long, default_value = "pretty")]
    pub log_format: LogFormat,
}

/// Initialize logging based on the specified format.
pub fn init_logging(format: &LogFormat) {
    match format {
        LogFormat::Pretty => tracing_subscriber::fmt::init(),
        LogFormat::Json => tracing_subscriber::fmt().json().init(),
        LogFormat::Compact => tracing_subscriber::fmt().compact().init(),
    }
}

/// Load one signing secret from its environment variable or a file.
/// Returns None and logs an error if the secret cannot be loaded.
pub fn load_secret(env_var: &str, secret_file: Option<&str>) -> Option<String> {
    let secret = if let Ok(secret) = std::env::var(env_var) {
        // SAFETY: called during single-threaded startup, before the runtime
        // spawns anything that reads the environment.
        unsafe { std::env::remove_var(env_var) };
        secret
    } else if let Some(path) = secret_file {
        match std::fs::read_to_string(path) {
            Ok(content) => content.trim().to_string(),
            Err(e) => {
                error!(path = %path, error = %e, "Failed to read secret file");
                return None;
            }
        }
    } else {
        error!(
            "{} is required. Set the environment variable or pass the matching --*-secret-file",
            env_var
        );
        return None;
    };

    if secret.len() < MIN_JWT_SECRET_LENGTH {
        error!(
            "{} is shorter than {} characters. Use a longer secret",
            env_var, MIN_JWT_SECRET_LENGTH
        );
        return None;
    }

    Some(secret)
}

/// Load both signing secrets. They must differ.
pub fn load_secrets(args: &Args) -> Option<TokenSecrets> {
    let access = load_secret(ACCESS_SECRET_ENV, args.access_secret_file.as_deref())?;
    let refresh = load_secret(REFRESH_SECRET_ENV, args.refresh_secret_file.as_deref())?;

    if access == refresh {
        error!(
            "{} and {} must be different",
            ACCESS_SECRET_ENV, REFRESH_SECRET_ENV
        );
        return None;
    }

    Some(TokenSecrets {
        access: access.into_bytes(),
        refresh: refresh.into_bytes(),
    })
}

/// Build ServerConfig from validated arguments.
pub fn build_config(args: &Args, db: Database, secrets: TokenSecrets) -> ServerConfig {
    ServerConfig {
        db,
        secrets,
        access_token_ttl: args.access_token_ttl,
        secure_cookies: !args.insecure_cookies,
        allowed_origins: args.allowed_origins.clone(),
    }
}

/// Open the database, logging errors if it fails.
pub async fn open_database(path: &str) -> Option<Database> {
    match Database::open(path).await {
        Ok(db) => {
            info!(path = %path, "Database opened");
            Some(db)
        }
        Err(e) => {
            error!(path = %path, error = %e, "Failed to open database");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from(["quillpost"]).unwrap();
        assert_eq!(args.access_token_ttl, 600);
        assert!(!args.insecure_cookies);
        assert_eq!(args.allowed_origins, vec!["http://localhost:5173"]);
    }

    #[test]
    fn test_zero_ttl_rejected() {
        assert!(Args::try_parse_from(["quillpost", "--access-token-ttl", "0"]).is_err());
    }

    #[test]
    fn test_repeated_origins() {
        let args = Args::try_parse_from([
            "quillpost",
            "--allowed-origin",
            "https://a.example",
            "--allowed-origin",
            "https://b.example",
        ])
        .unwrap();
        assert_eq!(
            args.allowed_origins,
            vec!["https://a.example", "https://b.example"]
        );
    }

    #[test]
    fn test_short_secret_file_rejected() {
        let path = std::env::temp_dir().join("quillpost-short-secret");
        std::fs::write(&path, "too-short\n").unwrap();
        let loaded = load_secret("QUILLPOST_TEST_UNSET_SECRET", path.to_str());
        std::fs::remove_file(&path).ok();
        assert!(loaded.is_none());
    }

    #[test]
    fn test_secret_file_is_trimmed() {
        let path = std::env::temp_dir().join("quillpost-long-secret");
        std::fs::write(&path, "0123456789abcdef0123456789abcdef\n").unwrap();
        let loaded = load_secret("QUILLPOST_TEST_UNSET_SECRET_2", path.to_str());
        std::fs::remove_file(&path).ok();
        assert_eq!(loaded.as_deref(), Some("0123456789abcdef0123456789abcdef"));
    }
}
