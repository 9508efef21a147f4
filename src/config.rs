use anyhow::{Context, Result};
use clap::Parser;
use std::env;

/// Centralized application configuration.
/// Combines environment variables and CLI arguments.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub storage_dir: String,
    /// Directory the image picker writes into; uploads may only read from here.
    pub picker_dir: String,
    pub database_url: String,
    /// Prefix of blob download URLs handed to clients.
    pub public_url: String,
}

/// Command-line + environment configuration.
#[derive(Parser, Debug, Default)]
#[command(author, version, about = "Mes Bonnes Adresses client service")]
pub struct Args {
    /// Host to bind to (overrides BONNES_ADRESSES_HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to (overrides BONNES_ADRESSES_PORT)
    #[arg(long)]
    pub port: Option<u16>,

    /// Directory where uploaded images are stored (overrides BONNES_ADRESSES_STORAGE_DIR)
    #[arg(long)]
    pub storage_dir: Option<String>,

    /// Directory picked images are read from (overrides BONNES_ADRESSES_PICKER_DIR)
    #[arg(long)]
    pub picker_dir: Option<String>,

    /// Database URL (overrides BONNES_ADRESSES_DATABASE_URL)
    #[arg(long)]
    pub database_url: Option<String>,

    /// Base URL for image download links (overrides BONNES_ADRESSES_PUBLIC_URL)
    #[arg(long)]
    pub public_url: Option<String>,

    /// Run migrations and exit
    #[arg(long)]
    pub migrate: bool,
}

impl AppConfig {
    /// Parse environment variables + CLI args into AppConfig and migrate flag.
    pub fn from_env_and_args() -> Result<(Self, bool)> {
        let args = Args::parse();
        let migrate = args.migrate;
        Ok((Self::resolve(args, |name| env::var(name))?, migrate))
    }

    /// Merge CLI values over environment values over defaults.
    pub fn resolve<F>(args: Args, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Result<String, env::VarError>,
    {
        // --- Environment fallback ---
        let env_host = lookup("BONNES_ADRESSES_HOST").unwrap_or_else(|_| "127.0.0.1".into());
        let env_port = match lookup("BONNES_ADRESSES_PORT") {
            Ok(value) => value
                .parse::<u16>()
                .with_context(|| format!("parsing BONNES_ADRESSES_PORT value `{}`", value))?,
            Err(env::VarError::NotPresent) => 3000,
            Err(err) => return Err(err).context("reading BONNES_ADRESSES_PORT"),
        };
        let env_storage =
            lookup("BONNES_ADRESSES_STORAGE_DIR").unwrap_or_else(|_| "./data/blobs".into());
        let env_picker =
            lookup("BONNES_ADRESSES_PICKER_DIR").unwrap_or_else(|_| "./data/picker".into());
        let env_db = lookup("BONNES_ADRESSES_DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://./data/meta/bonnes_adresses.db".into());
        let env_public = lookup("BONNES_ADRESSES_PUBLIC_URL").ok();

        // --- Merge ---
        let host = args.host.unwrap_or(env_host);
        let port = args.port.unwrap_or(env_port);
        let public_url = args
            .public_url
            .or(env_public)
            .unwrap_or_else(|| format!("http://{}:{}", advertised_host(&host), port));

        Ok(Self {
            host,
            port,
            storage_dir: args.storage_dir.unwrap_or(env_storage),
            picker_dir: args.picker_dir.unwrap_or(env_picker),
            database_url: args.database_url.unwrap_or(env_db),
            public_url: public_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Wildcard bind addresses are not reachable URLs.
fn advertised_host(host: &str) -> &str {
    match host {
        "0.0.0.0" | "::" => "127.0.0.1",
        other => other,
    }
}
