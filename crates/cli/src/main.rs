//! `feedx` binary: the composition root.
//!
//! Parses configuration, installs tracing, builds the concrete adapters
//! (SQLite store, bcrypt hasher, JWT issuer, disk file store), wires them
//! into [`services::Services`], and runs the selected command.

mod config;
mod telemetry;

use std::io::BufRead;
use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context};
use api::{AppState, HttpConfig};
use auth::{BcryptHasher, JwtIssuer};
use clap::Parser;
use config::{Cli, Command, Settings, DEFAULT_ADMIN_PASSWORD};
use services::{Ports, Services, DEFAULT_ADMIN_USERNAME};
use store::{JsonReferenceData, SqliteStore};
use tokio::net::TcpListener;
use tracing::{info, warn};
use uploads::DiskFileStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let Cli { settings, command } = Cli::parse();
    let _telemetry = telemetry::init(&settings)?;

    match command.unwrap_or(Command::Serve) {
        Command::Serve => serve(&settings).await,
        Command::Migrate { from } => migrate(&settings, &from).await,
        Command::ResetPassword { username, password } => {
            reset_password(&settings, &username, password).await
        }
    }
}

async fn serve(settings: &Settings) -> anyhow::Result<()> {
    if settings.uses_dev_secret() {
        warn!("JWT_SECRET is not set; using the development secret");
    }

    let store = open_store(settings)?;
    let services = build_services(settings, store);

    if services
        .auth
        .ensure_default_admin(&settings.admin_password)
        .await
        .context("creating the default admin account")?
    {
        if settings.admin_password == DEFAULT_ADMIN_PASSWORD {
            warn!(
                username = DEFAULT_ADMIN_USERNAME,
                "default admin created with the default password; change it"
            );
        } else {
            info!(username = DEFAULT_ADMIN_USERNAME, "default admin created");
        }
    }

    let http = HttpConfig {
        cors_origins: settings.cors_origins.clone(),
        uploads_dir: settings.uploads_dir.clone(),
        static_dir: settings.static_dir.clone(),
    };
    tokio::fs::create_dir_all(&http.uploads_dir)
        .await
        .with_context(|| format!("creating {}", http.uploads_dir.display()))?;

    let app = api::router(AppState::new(services), &http);
    let address = settings.address();
    info!("Binding to {address}");
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("binding {address}"))?;

    api::serve(listener, app).await.context("serving HTTP")
}

async fn migrate(settings: &Settings, from: &Path) -> anyhow::Result<()> {
    let store = open_store(settings)?;
    let counts = store::import_legacy(from, &store, &store)
        .await
        .with_context(|| format!("importing from {}", from.display()))?;

    for count in &counts {
        info!(
            source = %count.source,
            read = count.read,
            imported = count.imported,
            existing = count.existing,
            invalid = count.invalid,
            "import finished"
        );
    }
    if counts.is_empty() {
        warn!(dir = %from.display(), "no export files found");
    }
    Ok(())
}

async fn reset_password(
    settings: &Settings,
    username: &str,
    password: Option<String>,
) -> anyhow::Result<()> {
    let password = match password {
        Some(p) => p,
        None => read_password()?,
    };
    if password.is_empty() {
        bail!("password must not be empty");
    }

    let services = build_services(settings, open_store(settings)?);
    services
        .auth
        .reset_password(username, &password)
        .await
        .with_context(|| format!("resetting the password for {username}"))?;
    info!(username, "password updated");
    Ok(())
}

fn read_password() -> anyhow::Result<String> {
    eprintln!("New password:");
    let mut line = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut line)
        .context("reading the password from stdin")?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

fn open_store(settings: &Settings) -> anyhow::Result<SqliteStore> {
    SqliteStore::open(&settings.database)
        .with_context(|| format!("opening {}", settings.database.display()))
}

fn build_services(settings: &Settings, store: SqliteStore) -> Services {
    let db = Arc::new(store);
    let ttl = chrono::Duration::hours(settings.token_ttl_hours);
    Services::new(Ports {
        users: db.clone(),
        audit: db.clone(),
        content: db.clone(),
        institutes: db.clone(),
        issues: db,
        reference: Arc::new(JsonReferenceData::new(&settings.data_dir)),
        files: Arc::new(DiskFileStore::new(&settings.uploads_dir)),
        hasher: Arc::new(BcryptHasher::new(settings.bcrypt_cost)),
        tokens: Arc::new(JwtIssuer::with_ttl(settings.jwt_secret().as_bytes(), ttl)),
    })
}
