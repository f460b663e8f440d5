use crate::DigestError;

/// Runtime configuration for the digest batch, built once from the
/// environment and handed to each component. Nothing reads env vars after
/// construction and no credential is ever embedded in code.
#[derive(Debug, Clone)]
pub struct DigestConfig {
    pub database_url: String,
    pub market_data_base_url: String,
    pub narrator: Option<NarratorConfig>,
    pub smtp: Option<SmtpConfig>,
    /// Trailing window, in days, for the news-sentiment blend.
    pub sentiment_window_days: i64,
}

#[derive(Debug, Clone)]
pub struct NarratorConfig {
    pub base_url: String,
    pub api_key: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub from: String,
    pub to: Vec<String>,
    pub tls: SmtpTls,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SmtpTls {
    #[default]
    Tls,
    StartTls,
    None,
}

fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

impl DigestConfig {
    /// Build from the process environment. Call `dotenvy::dotenv().ok()`
    /// before this in binaries.
    pub fn from_env() -> Result<Self, DigestError> {
        let database_url =
            env_opt("DATABASE_URL").unwrap_or_else(|| "sqlite:digest.db".to_string());
        let market_data_base_url = env_opt("MARKET_DATA_BASE_URL")
            .unwrap_or_else(|| "https://query1.finance.yahoo.com".to_string());

        let narrator = env_opt("NARRATOR_URL").map(|base_url| NarratorConfig {
            base_url,
            api_key: env_opt("NARRATOR_API_KEY"),
        });

        let smtp = match (env_opt("SMTP_HOST"), env_opt("SMTP_FROM_ADDRESS")) {
            (Some(host), Some(from)) => {
                let to: Vec<String> = env_opt("DIGEST_EMAIL_TO")
                    .map(|v| v.split(',').map(|s| s.trim().to_string()).collect())
                    .unwrap_or_default();
                if to.is_empty() {
                    return Err(DigestError::Config(
                        "SMTP_HOST set but DIGEST_EMAIL_TO is empty".to_string(),
                    ));
                }
                let port = env_opt("SMTP_PORT")
                    .map(|v| {
                        v.parse::<u16>()
                            .map_err(|_| DigestError::Config(format!("Invalid SMTP_PORT: {}", v)))
                    })
                    .transpose()?
                    .unwrap_or(587);
                let tls = match env_opt("SMTP_TLS").as_deref() {
                    None | Some("tls") => SmtpTls::Tls,
                    Some("starttls") => SmtpTls::StartTls,
                    Some("none") => SmtpTls::None,
                    Some(other) => {
                        return Err(DigestError::Config(format!("Invalid SMTP_TLS: {}", other)))
                    }
                };
                Some(SmtpConfig {
                    host,
                    port,
                    username: env_opt("SMTP_USERNAME"),
                    password: env_opt("SMTP_PASSWORD"),
                    from,
                    to,
                    tls,
                })
            }
            _ => None,
        };

        let sentiment_window_days = env_opt("SENTIMENT_WINDOW_DAYS")
            .map(|v| {
                v.parse::<i64>().map_err(|_| {
                    DigestError::Config(format!("Invalid SENTIMENT_WINDOW_DAYS: {}", v))
                })
            })
            .transpose()?
            .unwrap_or(5);

        Ok(Self {
            database_url,
            market_data_base_url,
            narrator,
            smtp,
            sentiment_window_days,
        })
    }
}
