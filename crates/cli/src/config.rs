//! Command-line and environment configuration.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Development fallback used when `JWT_SECRET` is unset.
pub const DEV_JWT_SECRET: &str = "feedx-development-secret-change-me";

/// Default password for the seeded `admin` account.
pub const DEFAULT_ADMIN_PASSWORD: &str = "admin123";

#[derive(Debug, Parser)]
#[command(name = "feedx", version, about = "FeedX feedback and content server")]
pub struct Cli {
    #[command(flatten)]
    pub settings: Settings,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Run the HTTP server (default).
    Serve,

    /// Import JSON exports (`notifications.json`, `institutes.json`, ...)
    /// from an earlier deployment. Records that already exist are kept.
    Migrate {
        #[arg(long = "from", value_name = "DIR")]
        from: PathBuf,
    },

    /// Set a new password for an account.
    ResetPassword {
        username: String,

        /// Read from standard input when omitted.
        #[arg(long, env = "FEEDX_NEW_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Debug, Clone, Args)]
pub struct Settings {
    /// Address to bind.
    #[arg(long, env = "FEEDX_BIND", default_value = "0.0.0.0", global = true)]
    pub bind: String,

    #[arg(long, env = "PORT", default_value_t = 3001, global = true)]
    pub port: u16,

    /// SQLite database file.
    #[arg(long, env = "FEEDX_DATABASE", default_value = "data/feedx.db", global = true)]
    pub database: PathBuf,

    /// Directory holding the ECET reference files.
    #[arg(long, env = "FEEDX_DATA_DIR", default_value = "public/data", global = true)]
    pub data_dir: PathBuf,

    #[arg(long, env = "FEEDX_UPLOADS_DIR", default_value = "public/uploads", global = true)]
    pub uploads_dir: PathBuf,

    /// Built front-end served for unmatched paths.
    #[arg(long, env = "FEEDX_STATIC_DIR", global = true)]
    pub static_dir: Option<PathBuf>,

    #[arg(long, env = "JWT_SECRET", hide_env_values = true, global = true)]
    pub jwt_secret: Option<String>,

    /// Session lifetime, 1 hour to 1 year.
    #[arg(
        long,
        env = "FEEDX_TOKEN_TTL_HOURS",
        default_value_t = 24,
        value_parser = clap::value_parser!(i64).range(1..=8760),
        global = true
    )]
    pub token_ttl_hours: i64,

    #[arg(long, env = "FEEDX_BCRYPT_COST", default_value_t = 10, global = true)]
    pub bcrypt_cost: u32,

    /// Comma-separated list of allowed origins.
    #[arg(
        long,
        env = "FEEDX_CORS_ORIGINS",
        value_delimiter = ',',
        default_value = "http://localhost:8080,http://localhost:3000,http://127.0.0.1:8080,http://127.0.0.1:3000",
        global = true
    )]
    pub cors_origins: Vec<String>,

    /// Password given to the `admin` account created on an empty database.
    #[arg(
        long,
        env = "FEEDX_ADMIN_PASSWORD",
        default_value = DEFAULT_ADMIN_PASSWORD,
        hide_env_values = true,
        global = true
    )]
    pub admin_password: String,

    #[arg(long, env = "FEEDX_LOG_FORMAT", value_enum, default_value_t = LogFormat::Pretty, global = true)]
    pub log_format: LogFormat,

    /// OTLP collector endpoint; traces are exported only when set.
    #[arg(long, env = "OTEL_EXPORTER_OTLP_ENDPOINT", global = true)]
    pub otlp_endpoint: Option<String>,
}

impl Settings {
    pub fn address(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }

    /// The configured secret, or the development fallback.
    pub fn jwt_secret(&self) -> &str {
        self.jwt_secret
            .as_deref()
            .filter(|s| !s.is_empty())
            .unwrap_or(DEV_JWT_SECRET)
    }

    pub fn uses_dev_secret(&self) -> bool {
        self.jwt_secret() == DEV_JWT_SECRET
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_documented_values() {
        let cli = Cli::try_parse_from(["feedx"]).unwrap();
        assert_eq!(cli.command, None);
        let s = cli.settings;
        assert_eq!(s.database, PathBuf::from("data/feedx.db"));
        assert_eq!(s.cors_origins.len(), 4);
        assert_eq!(s.token_ttl_hours, 24);
        assert_eq!(s.log_format, LogFormat::Pretty);
    }

    #[test]
    fn subcommands_accept_global_flags() {
        let cli = Cli::try_parse_from([
            "feedx",
            "migrate",
            "--from",
            "server/data",
            "--database",
            "/tmp/x.db",
        ])
        .unwrap();
        assert_eq!(
            cli.command,
            Some(Command::Migrate {
                from: PathBuf::from("server/data")
            })
        );
        assert_eq!(cli.settings.database, PathBuf::from("/tmp/x.db"));
    }

    #[test]
    fn reset_password_takes_a_username() {
        let cli = Cli::try_parse_from(["feedx", "reset-password", "admin", "--password", "s3cret"]).unwrap();
        assert_eq!(
            cli.command,
            Some(Command::ResetPassword {
                username: "admin".into(),
                password: Some("s3cret".into())
            })
        );
    }

    #[test]
    fn token_ttl_must_be_between_an_hour_and_a_year() {
        for bad in ["0", "-5", "8761", "9223372036854775807"] {
            assert!(Cli::try_parse_from(["feedx", "--token-ttl-hours", bad]).is_err(), "{bad}");
        }
        let cli = Cli::try_parse_from(["feedx", "--token-ttl-hours", "8760"]).unwrap();
        assert_eq!(cli.settings.token_ttl_hours, 8760);
    }

    #[test]
    fn blank_secret_falls_back_to_the_dev_secret() {
        let mut cli = Cli::try_parse_from(["feedx"]).unwrap();
        cli.settings.jwt_secret = Some(String::new());
        assert!(cli.settings.uses_dev_secret());
        cli.settings.jwt_secret = Some("prod".into());
        assert_eq!(cli.settings.jwt_secret(), "prod");
    }
}
