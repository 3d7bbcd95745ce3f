use std::env;
use std::time::Duration;

use crate::cli::Cli;
use crate::error::ConfigError;
use crate::monitor::Account;

pub const DEFAULT_CHECK_INTERVAL_SECONDS: u64 = 30;
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_ACCOUNT_COUNT: usize = 2;
pub const DEFAULT_LOGIN_URL: &str = "https://hikkoshi-kanri.zba.jp/";
pub const DEFAULT_EXPORT_URL: &str = "https://hikkoshi-kanri.zba.jp/checkbox/company/users/searched/50/1";
pub const DEFAULT_PORTAL_TIMEOUT_SECONDS: u64 = 30;
pub const DEFAULT_SMTP_HOST: &str = "smtp.gmail.com";
pub const DEFAULT_SMTP_PORT: u16 = 465;
pub const DEFAULT_WORKSHEET: &str = "row";

#[derive(Debug, Clone)]
pub struct Config {
    pub accounts: Vec<Account>,
    pub portal: PortalConfig,
    pub email: Option<EmailConfig>,
    pub webhook_url: Option<String>,
    pub sheets: SheetsConfig,
    pub check_interval_seconds: u64,
    pub port: u16,
}

#[derive(Debug, Clone)]
pub struct PortalConfig {
    pub login_url: String,
    pub export_url: String,
    pub timeout_seconds: u64,
}

#[derive(Clone)]
pub struct EmailConfig {
    pub address: String,
    pub app_password: String,
    pub recipient: Option<String>,
    pub smtp_host: String,
    pub smtp_port: u16,
}

#[derive(Clone)]
pub struct SheetsConfig {
    pub service_account_json: Option<String>,
    pub spreadsheet_id: Option<String>,
    pub worksheet: String,
}

impl std::fmt::Debug for EmailConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailConfig")
            .field("address", &self.address)
            .field("recipient", &self.recipient)
            .field("smtp_host", &self.smtp_host)
            .field("smtp_port", &self.smtp_port)
            .finish_non_exhaustive()
    }
}

impl std::fmt::Debug for SheetsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SheetsConfig")
            .field("service_account", &self.service_account_json.is_some())
            .field("spreadsheet_id", &self.spreadsheet_id)
            .field("worksheet", &self.worksheet)
            .finish()
    }
}

impl EmailConfig {
    /// Recipient, defaulting to the sending address.
    pub fn recipient(&self) -> &str {
        self.recipient.as_deref().unwrap_or(&self.address)
    }
}

impl PortalConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the config from any key/value lookup. Empty values count as
    /// unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let account_count = parse_or(&get, "ACCOUNT_COUNT", DEFAULT_ACCOUNT_COUNT)?;
        let accounts = (1..=account_count)
            .map(|n| {
                Account::new(
                    format!("account {}", n),
                    get(&format!("WC_ID_{}", n)),
                    get(&format!("WC_PASS_{}", n)),
                )
            })
            .collect();

        let portal = PortalConfig {
            login_url: get("PORTAL_LOGIN_URL").unwrap_or_else(|| DEFAULT_LOGIN_URL.to_string()),
            export_url: get("PORTAL_EXPORT_URL").unwrap_or_else(|| DEFAULT_EXPORT_URL.to_string()),
            timeout_seconds: parse_or(&get, "PORTAL_TIMEOUT_SECONDS", DEFAULT_PORTAL_TIMEOUT_SECONDS)?,
        };

        let email = match (get("GMAIL_ADDRESS"), get("GMAIL_APP_PASSWORD")) {
            (Some(address), Some(app_password)) => Some(EmailConfig {
                address,
                app_password,
                recipient: get("NOTIFY_TO"),
                smtp_host: get("SMTP_HOST").unwrap_or_else(|| DEFAULT_SMTP_HOST.to_string()),
                smtp_port: parse_or(&get, "SMTP_PORT", DEFAULT_SMTP_PORT)?,
            }),
            _ => None,
        };

        let sheets = SheetsConfig {
            service_account_json: get("GCP_SERVICE_ACCOUNT"),
            spreadsheet_id: get("SPREADSHEET_ID"),
            worksheet: get("WORKSHEET_NAME").unwrap_or_else(|| DEFAULT_WORKSHEET.to_string()),
        };

        let check_interval_seconds = parse_or(&get, "CHECK_INTERVAL", DEFAULT_CHECK_INTERVAL_SECONDS)?;
        if check_interval_seconds == 0 {
            return Err(ConfigError::invalid("CHECK_INTERVAL", "0", "must be at least 1"));
        }

        Ok(Self {
            accounts,
            portal,
            email,
            webhook_url: get("NOTIFY_WEBHOOK_URL"),
            sheets,
            check_interval_seconds,
            port: parse_or(&get, "PORT", DEFAULT_PORT)?,
        })
    }

    /// Apply command-line overrides.
    pub fn with_cli(mut self, cli: &Cli) -> Self {
        if let Some(interval) = cli.interval.filter(|i| *i > 0) {
            self.check_interval_seconds = interval;
        }
        if let Some(port) = cli.port {
            self.port = port;
        }
        self
    }

    pub fn check_interval(&self) -> Duration {
        Duration::from_secs(self.check_interval_seconds)
    }
}

fn parse_or<T, G>(get: &G, key: &str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::invalid(key, &raw, "must be a valid number")),
    }
}
