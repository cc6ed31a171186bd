use std::env;
use std::str::FromStr;

pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 256 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub storage: StorageConfig,
    pub admin: AdminConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Directory exposed as static files at the server root.
    pub static_dir: String,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub upload_dir: String,
    pub max_upload_bytes: usize,
}

#[derive(Debug, Clone)]
pub struct AdminConfig {
    pub email: String,
    pub password: String,
}

impl AppConfig {
    /// Reads `.env.local` and `.env` when present, then the process
    /// environment. Malformed numbers fall back to their defaults.
    pub fn from_env() -> Self {
        dotenvy::from_filename(".env.local").ok();
        dotenvy::dotenv().ok();

        Self {
            server: ServerConfig {
                host: var_or("HOST", "0.0.0.0"),
                port: parse_or("PORT", 5000),
                static_dir: var_or("STATIC_DIR", "."),
            },
            database: DatabaseConfig {
                url: var_or("DATABASE_URL", "sqlite://sharenotes.db"),
                max_connections: parse_or("DATABASE_MAX_CONNECTIONS", 5),
            },
            storage: StorageConfig {
                upload_dir: var_or("UPLOAD_DIR", "uploads"),
                max_upload_bytes: parse_or("MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES),
            },
            admin: AdminConfig {
                email: var_or("ADMIN_EMAIL", "admin@gmail.com"),
                password: var_or("ADMIN_PASSWORD", "admin123"),
            },
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

fn var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_or<T: FromStr>(key: &str, default: T) -> T {
    parse_value(env::var(key).ok(), default)
}

fn parse_value<T: FromStr>(raw: Option<String>, default: T) -> T {
    raw.and_then(|v| v.trim().parse().ok()).unwrap_or(default)
}
