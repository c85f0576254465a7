//! Config - Configurazione letta dalle variabili d'ambiente

use dotenv::dotenv;
use std::env;
use tracing::{info, warn};

const DEFAULT_JWT_SECRET: &str = "un segreto meno bello";

/// Parametri SMTP, presenti solo se SMTP_HOST è impostato
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub from: String,
    pub use_tls: bool,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub server_host: String,
    pub server_port: u16,
    pub max_connections: u32,
    pub cors_origin: Option<String>,
    pub app_env: String,
    pub bcrypt_cost: u32,
    pub smtp: Option<SmtpConfig>,
}

impl Config {
    /// Carica la configurazione dalle variabili d'ambiente
    /// Chiama dotenv() automaticamente
    pub fn from_env() -> Result<Self, String> {
        dotenv().ok();

        let database_url =
            env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://gatherly.db?mode=rwc".to_string());

        let jwt_secret = env::var("JWT_SECRET").unwrap_or_else(|_| {
            warn!("JWT_SECRET not set, using default (not secure for production!)");
            DEFAULT_JWT_SECRET.to_string()
        });

        let server_host = env::var("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());

        let server_port = env::var("SERVER_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| "Invalid SERVER_PORT: must be a number between 0-65535".to_string())?;

        let max_connections = env::var("MAX_DB_CONNECTIONS")
            .unwrap_or_else(|_| "5".to_string())
            .parse::<u32>()
            .map_err(|_| "Invalid MAX_DB_CONNECTIONS: must be a positive number".to_string())?;

        let cors_origin = env::var("CORS_ORIGIN").ok().filter(|o| !o.trim().is_empty());

        let app_env = env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());

        let bcrypt_cost = match env::var("BCRYPT_COST") {
            Ok(raw) => raw
                .parse::<u32>()
                .ok()
                .filter(|c| (4..=31).contains(c))
                .ok_or_else(|| "Invalid BCRYPT_COST: must be between 4 and 31".to_string())?,
            Err(_) => bcrypt::DEFAULT_COST,
        };

        let smtp = match env::var("SMTP_HOST") {
            Ok(host) if !host.trim().is_empty() => Some(SmtpConfig {
                host,
                port: env::var("SMTP_PORT")
                    .unwrap_or_else(|_| "587".to_string())
                    .parse::<u16>()
                    .map_err(|_| "Invalid SMTP_PORT".to_string())?,
                username: env::var("SMTP_USERNAME").ok(),
                password: env::var("SMTP_PASSWORD").ok(),
                from: env::var("SMTP_FROM")
                    .unwrap_or_else(|_| "Gatherly <no-reply@gatherly.local>".to_string()),
                use_tls: env::var("SMTP_TLS")
                    .map(|v| !matches!(v.to_lowercase().as_str(), "0" | "false" | "no"))
                    .unwrap_or(true),
            }),
            _ => None,
        };

        Ok(Config {
            database_url,
            jwt_secret,
            server_host,
            server_port,
            max_connections,
            cors_origin,
            app_env,
            bcrypt_cost,
            smtp,
        })
    }

    /// Logga la configurazione (nascondendo i segreti)
    pub fn print_info(&self) {
        info!("Environment: {}", self.app_env);
        info!("Server Address: {}:{}", self.server_host, self.server_port);
        info!("Database: {}", Self::mask_url(&self.database_url));
        info!("Max DB Connections: {}", self.max_connections);
        info!("CORS origin: {}", self.cors_origin.as_deref().unwrap_or("any"));
        info!(
            "JWT Secret: {}",
            if self.jwt_secret == DEFAULT_JWT_SECRET {
                "USING DEFAULT (INSECURE!)"
            } else {
                "custom secret configured"
            }
        );
        match &self.smtp {
            Some(smtp) => info!("Mailer: {}:{} as {}", smtp.host, smtp.port, smtp.from),
            None => info!("Mailer: disabled (SMTP_HOST not set)"),
        }
    }

    /// Maschera le credenziali eventualmente presenti nell'URL del database
    fn mask_url(url: &str) -> String {
        if let (Some(at_pos), Some(scheme_end)) = (url.find('@'), url.find("://")) {
            let scheme = &url[..scheme_end + 3];
            let after_at = &url[at_pos..];
            return format!("{}***{}", scheme, after_at);
        }
        url.to_string()
    }
}
