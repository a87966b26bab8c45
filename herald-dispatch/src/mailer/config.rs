use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct MailerConfig {
    /// Address every outgoing email is sent from. Never taken from the
    /// message itself.
    #[serde(default = "default_sender")]
    pub sender: String,

    #[serde(default)]
    pub transport: TransportConfig,
}

fn default_sender() -> String {
    "noreply@localhost".to_string()
}

impl Default for MailerConfig {
    fn default() -> Self {
        Self {
            sender: default_sender(),
            transport: TransportConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub enum TransportConfig {
    Smtp(SmtpConfig),
    /// Records mail instead of sending it
    Memory,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self::Smtp(SmtpConfig::default())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub enum TlsMode {
    /// Implicit TLS, usually port 465
    Tls,
    /// Upgrade a plain connection, usually port 587
    #[default]
    StartTls,
    /// Plaintext. Only for local relays and test servers.
    None,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SmtpConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default)]
    pub user: Option<String>,

    #[serde(default)]
    pub password: Option<String>,

    #[serde(default)]
    pub tls: TlsMode,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_host() -> String {
    "localhost".to_string()
}

const fn default_port() -> u16 {
    587
}

const fn default_timeout_secs() -> u64 {
    30
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            user: None,
            password: None,
            tls: TlsMode::default(),
            timeout_secs: default_timeout_secs(),
        }
    }
}
