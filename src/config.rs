//! Email settings read once from the environment.

pub const EMAIL_USER: &str = "EMAIL_USER";
pub const EMAIL_PASS: &str = "EMAIL_PASS";
pub const EMAIL_TO: &str = "EMAIL_TO";
pub const EMAIL_RESULTS: &str = "EMAIL_RESULTS";
pub const SMTP_HOST: &str = "SMTP_HOST";
pub const SMTP_PORT: &str = "SMTP_PORT";

const DEFAULT_SMTP_HOST: &str = "smtp.gmail.com";
const DEFAULT_SMTP_PORT: u16 = 465;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailCredentials {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailSettings {
    /// Whether this run should try to email its report at all.
    pub enabled: bool,
    pub sender: Option<String>,
    pub password: Option<String>,
    /// Defaults to the sender when unset.
    pub recipient: Option<String>,
    pub smtp_host: String,
    /// 465 uses TLS on connect, anything else STARTTLS.
    pub smtp_port: u16,
}

impl Default for EmailSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            sender: None,
            password: None,
            recipient: None,
            smtp_host: DEFAULT_SMTP_HOST.to_string(),
            smtp_port: DEFAULT_SMTP_PORT,
        }
    }
}

impl EmailSettings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds settings from any key lookup; blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let value = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let enabled = value(EMAIL_RESULTS)
            .map(|v| matches!(v.to_ascii_lowercase().as_str(), "true" | "1" | "yes"))
            .unwrap_or(false);

        let smtp_port = match value(SMTP_PORT) {
            Some(port) => port.parse().unwrap_or_else(|_| {
                tracing::warn!("Ignoring invalid {}={}, using {}", SMTP_PORT, port, DEFAULT_SMTP_PORT);
                DEFAULT_SMTP_PORT
            }),
            None => DEFAULT_SMTP_PORT,
        };

        Self {
            enabled,
            sender: value(EMAIL_USER),
            password: value(EMAIL_PASS),
            recipient: value(EMAIL_TO),
            smtp_host: value(SMTP_HOST).unwrap_or_else(|| DEFAULT_SMTP_HOST.to_string()),
            smtp_port,
        }
    }

    /// Sender login, present only when both user and password are set.
    pub fn credentials(&self) -> Option<EmailCredentials> {
        match (&self.sender, &self.password) {
            (Some(username), Some(password)) => Some(EmailCredentials {
                username: username.clone(),
                password: password.clone(),
            }),
            _ => None,
        }
    }

    pub fn recipient(&self) -> Option<&str> {
        self.recipient.as_deref().or(self.sender.as_deref())
    }
}
