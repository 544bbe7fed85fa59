use std::{env, path::PathBuf};

use chrono::Duration;
use kitchen_common::{parse_boolean_flag, Secret};
use kitchen_engine::proof_storage::DEFAULT_MAX_UPLOAD_BYTES;
use log::*;
use rand::{distributions::Alphanumeric, thread_rng, Rng};

const DEFAULT_KITCHEN_HOST: &str = "127.0.0.1";
const DEFAULT_KITCHEN_PORT: u16 = 8360;
const DEFAULT_DATABASE_URL: &str = "sqlite://data/kitchen.db";
const DEFAULT_ACCESS_TOKEN_TTL_HOURS: i64 = 24;
const DEFAULT_UPLOAD_DIR: &str = "data/uploads/payments";
const DEFAULT_ADMIN_NAME: &str = "Kitchen Admin";
const MIN_JWT_SECRET_LENGTH: usize = 32;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub auth: AuthConfig,
    /// Where proof-of-payment uploads are stored.
    pub upload_dir: PathBuf,
    pub max_upload_bytes: usize,
    /// If set, this admin account is created at start-up when it does not exist yet.
    pub bootstrap_admin: Option<AdminConfig>,
    pub run_migrations: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_KITCHEN_HOST.to_string(),
            port: DEFAULT_KITCHEN_PORT,
            database_url: DEFAULT_DATABASE_URL.to_string(),
            auth: AuthConfig::default(),
            upload_dir: PathBuf::from(DEFAULT_UPLOAD_DIR),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            bootstrap_admin: None,
            run_migrations: true,
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the configuration from the given variable lookup. Invalid values are logged and replaced by their
    /// defaults.
    pub fn from_lookup<F>(var: F) -> Self
    where F: Fn(&str) -> Option<String> {
        let host = var("KITCHEN_HOST").unwrap_or_else(|| DEFAULT_KITCHEN_HOST.into());
        let port = var("KITCHEN_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for KITCHEN_PORT. {e} Using the default, {DEFAULT_KITCHEN_PORT}, \
                         instead."
                    );
                    DEFAULT_KITCHEN_PORT
                })
            })
            .unwrap_or(DEFAULT_KITCHEN_PORT);
        let database_url = var("KITCHEN_DATABASE_URL").unwrap_or_else(|| {
            info!("🪛️ KITCHEN_DATABASE_URL is not set. Using {DEFAULT_DATABASE_URL}.");
            DEFAULT_DATABASE_URL.into()
        });
        let auth = AuthConfig::from_lookup(&var);
        let upload_dir = var("KITCHEN_UPLOAD_DIR").map(PathBuf::from).unwrap_or_else(|| DEFAULT_UPLOAD_DIR.into());
        let max_upload_bytes = var("KITCHEN_MAX_UPLOAD_BYTES")
            .and_then(|s| {
                s.parse::<usize>()
                    .ok()
                    .filter(|n| *n > 0)
                    .or_else(|| {
                        warn!("🪛️ Invalid configuration value for KITCHEN_MAX_UPLOAD_BYTES: {s}");
                        None
                    })
            })
            .unwrap_or(DEFAULT_MAX_UPLOAD_BYTES);
        let bootstrap_admin = AdminConfig::from_lookup(&var);
        let run_migrations = parse_boolean_flag(var("KITCHEN_RUN_MIGRATIONS"), true);
        Self { host, port, database_url, auth, upload_dir, max_upload_bytes, bootstrap_admin, run_migrations }
    }
}

//-------------------------------------------------  AuthConfig  -------------------------------------------------------
#[derive(Clone, Debug)]
pub struct AuthConfig {
    /// The HMAC key used to sign and verify access tokens.
    pub jwt_secret: Secret<String>,
    pub access_token_ttl: Duration,
}

impl Default for AuthConfig {
    fn default() -> Self {
        warn!(
            "🚨️🚨️🚨️ The JWT secret has not been set. I'm using a random value for this session. Every access token \
             will be invalid after a restart. Set KITCHEN_JWT_SECRET in production. 🚨️🚨️🚨️"
        );
        let access_token_ttl = Duration::hours(DEFAULT_ACCESS_TOKEN_TTL_HOURS);
        Self { jwt_secret: Secret::new(random_secret()), access_token_ttl }
    }
}

impl AuthConfig {
    pub fn new<S: Into<String>>(secret: S, access_token_ttl: Duration) -> Self {
        Self { jwt_secret: Secret::new(secret.into()), access_token_ttl }
    }

    fn from_lookup<F>(var: &F) -> Self
    where F: Fn(&str) -> Option<String> {
        let ttl_hours = var("KITCHEN_ACCESS_TOKEN_TTL_HOURS")
            .and_then(|s| {
                s.parse::<i64>().ok().filter(|h| *h > 0).or_else(|| {
                    warn!("🪛️ Invalid configuration value for KITCHEN_ACCESS_TOKEN_TTL_HOURS: {s}");
                    None
                })
            })
            .unwrap_or(DEFAULT_ACCESS_TOKEN_TTL_HOURS);
        let access_token_ttl = Duration::hours(ttl_hours);
        match var("KITCHEN_JWT_SECRET").filter(|s| !s.trim().is_empty()) {
            Some(secret) => {
                if secret.len() < MIN_JWT_SECRET_LENGTH {
                    warn!(
                        "🪛️ KITCHEN_JWT_SECRET is only {} characters long. Use at least {MIN_JWT_SECRET_LENGTH}.",
                        secret.len()
                    );
                }
                Self::new(secret, access_token_ttl)
            },
            None => Self { access_token_ttl, ..Self::default() },
        }
    }
}

fn random_secret() -> String {
    thread_rng().sample_iter(&Alphanumeric).take(2 * MIN_JWT_SECRET_LENGTH).map(char::from).collect()
}

//-------------------------------------------------  AdminConfig  ------------------------------------------------------
#[derive(Clone, Debug)]
pub struct AdminConfig {
    pub name: String,
    pub email: String,
    pub password: Secret<String>,
}

impl AdminConfig {
    fn from_lookup<F>(var: &F) -> Option<Self>
    where F: Fn(&str) -> Option<String> {
        let email = var("KITCHEN_ADMIN_EMAIL").filter(|s| !s.trim().is_empty());
        let password = var("KITCHEN_ADMIN_PASSWORD").filter(|s| !s.is_empty());
        match (email, password) {
            (Some(email), Some(password)) => {
                let name = var("KITCHEN_ADMIN_NAME").unwrap_or_else(|| DEFAULT_ADMIN_NAME.into());
                Some(Self { name, email, password: Secret::new(password) })
            },
            (Some(_), None) => {
                warn!("🪛️ KITCHEN_ADMIN_EMAIL is set, but KITCHEN_ADMIN_PASSWORD is not. No admin will be created.");
                None
            },
            _ => None,
        }
    }
}
