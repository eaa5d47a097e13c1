use std::env;

/// Environment-backed configuration, loaded once at startup.
///
/// Mail and upload settings are carried from the deployment environment even
/// though no handler in this service consumes them yet.
#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub secret_key: String,
    pub bind_addr: String,
    pub seed_admin_password: String,
    pub mail: MailConfig,
    pub upload: UploadConfig,
}

#[derive(Clone, Debug)]
pub struct MailConfig {
    pub server: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Clone, Debug)]
pub struct UploadConfig {
    pub dir: String,
    pub max_bytes: usize,
}

impl Config {
    pub fn load() -> anyhow::Result<Config> {
        let database_url =
            env::var("DATABASE_URL").map_err(|_| anyhow::anyhow!("DATABASE_URL missing"))?;
        let secret_key =
            env::var("SECRET_KEY").map_err(|_| anyhow::anyhow!("SECRET_KEY missing"))?;

        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| {
            let port = env::var("PORT").unwrap_or_else(|_| "3000".to_string());
            format!("0.0.0.0:{port}")
        });

        let seed_admin_password = env::var("SEED_ADMIN_PASSWORD").unwrap_or_else(|_| {
            tracing::warn!("SEED_ADMIN_PASSWORD not set, using default");
            "admin123".to_string()
        });

        Ok(Config {
            database_url,
            secret_key,
            bind_addr,
            seed_admin_password,
            mail: MailConfig {
                server: env::var("MAIL_SERVER").unwrap_or_else(|_| "smtp.gmail.com".to_string()),
                port: env::var("MAIL_PORT")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(587),
                username: env::var("MAIL_USERNAME").ok(),
                password: env::var("MAIL_PASSWORD").ok(),
            },
            upload: UploadConfig {
                dir: env::var("UPLOAD_DIR").unwrap_or_else(|_| "static/uploads".to_string()),
                max_bytes: env::var("MAX_UPLOAD_BYTES")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(16 * 1024 * 1024),
            },
        })
    }
}
