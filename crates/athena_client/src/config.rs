use crate::ChatError;
use secrecy::SecretString;
use std::time::Duration;

pub const DEFAULT_CHAT_URL: &str = "https://api.openai.com/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Clone, Debug)]
pub struct Config {
    /// `None` is allowed here; the client reports `AuthMissing` on send.
    pub api_key: Option<SecretString>,
    pub endpoint: String,
    pub model: String,
    pub timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            endpoint: DEFAULT_CHAT_URL.into(),
            model: DEFAULT_MODEL.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ChatError> {
        Self::from_env_with(|k| std::env::var(k).ok())
    }

    /// Testable helper that reads configuration values using the provided
    /// function instead of the process environment.
    pub fn from_env_with<F>(mut get: F) -> Result<Self, ChatError>
    where
        F: FnMut(&str) -> Option<String>,
    {
        let api_key = get("ATHENA_OPENAI_API_KEY")
            .filter(|k| !k.trim().is_empty())
            .map(|k| SecretString::new(k.into()));
        let endpoint = get("ATHENA_CHAT_URL").unwrap_or_else(|| DEFAULT_CHAT_URL.into());
        let model = get("ATHENA_CHAT_MODEL").unwrap_or_else(|| DEFAULT_MODEL.into());
        let timeout = match get("ATHENA_CHAT_TIMEOUT_SECS") {
            Some(raw) => {
                let secs: u64 = raw.trim().parse().map_err(|_| {
                    ChatError::Config(format!("invalid ATHENA_CHAT_TIMEOUT_SECS: {raw}"))
                })?;
                if secs == 0 {
                    return Err(ChatError::Config(
                        "ATHENA_CHAT_TIMEOUT_SECS must be positive".into(),
                    ));
                }
                Duration::from_secs(secs)
            }
            None => DEFAULT_TIMEOUT,
        };
        Ok(Self {
            api_key,
            endpoint,
            model,
            timeout,
        })
    }
}
