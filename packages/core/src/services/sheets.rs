//! Google Sheets mirror.
//!
//! Overwrites one worksheet with the full snapshot: clear the sheet, then
//! append every row starting at `A1`. Access tokens come from a
//! [`TokenSource`]; in production that is a service account whose signed
//! JWT is exchanged for an OAuth access token.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::{Client, Response, Url};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::sync::Mutex;

use crate::cache::ExpiringCache;
use crate::error::ConfigError;
use crate::monitor::{DeliveryError, Sink};
use crate::table::Table;

pub const SHEETS_API_BASE: &str = "https://sheets.googleapis.com";
pub const GOOGLE_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const SHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";
const JWT_LIFETIME_SECS: i64 = 3600;
/// Tokens are refreshed this long before Google says they expire.
const TOKEN_EXPIRY_MARGIN: Duration = Duration::from_secs(60);

/// Supplies bearer tokens for the Sheets API.
#[async_trait]
pub trait TokenSource {
    async fn access_token(&self) -> Result<String, DeliveryError>;

    /// Forget any cached token so the next call fetches a fresh one.
    async fn invalidate(&self) {}
}

/// A fixed bearer token.
#[derive(Debug, Clone)]
pub struct StaticToken(pub String);

#[async_trait]
impl TokenSource for StaticToken {
    async fn access_token(&self) -> Result<String, DeliveryError> {
        Ok(self.0.clone())
    }
}

/// The parts of a service-account key file this client needs.
#[derive(Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_token_uri() -> String {
    GOOGLE_TOKEN_URI.to_string()
}

impl ServiceAccountKey {
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(raw).map_err(|e| ConfigError::service_account(e.to_string()))
    }
}

#[derive(Serialize)]
struct JwtClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

/// Service-account OAuth tokens (JWT bearer grant), cached until shortly
/// before expiry.
pub struct ServiceAccountTokens {
    key: ServiceAccountKey,
    http: Client,
    cache: Mutex<ExpiringCache<String>>,
}

impl ServiceAccountTokens {
    pub fn new(key: ServiceAccountKey) -> Self {
        Self {
            key,
            http: Client::new(),
            cache: Mutex::new(ExpiringCache::new()),
        }
    }

    fn signed_assertion(&self) -> Result<String, DeliveryError> {
        let now = Utc::now().timestamp();
        let claims = JwtClaims {
            iss: &self.key.client_email,
            scope: SHEETS_SCOPE,
            aud: &self.key.token_uri,
            iat: now,
            exp: now + JWT_LIFETIME_SECS,
        };
        let key = EncodingKey::from_rsa_pem(self.key.private_key.as_bytes())
            .map_err(|e| DeliveryError::auth(format!("invalid service account key: {}", e)))?;

        jsonwebtoken::encode(&Header::new(Algorithm::RS256), &claims, &key)
            .map_err(|e| DeliveryError::auth(format!("failed to sign token request: {}", e)))
    }
}

#[async_trait]
impl TokenSource for ServiceAccountTokens {
    async fn access_token(&self) -> Result<String, DeliveryError> {
        let mut cache = self.cache.lock().await;
        if let Some(token) = cache.get() {
            return Ok(token);
        }

        let assertion = self.signed_assertion()?;
        let response = self
            .http
            .post(&self.key.token_uri)
            .form(&[
                ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
                ("assertion", assertion.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(DeliveryError::auth(format!(
                "token exchange returned HTTP {}: {}",
                status, message
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| DeliveryError::auth(format!("bad token response: {}", e)))?;

        let lifetime = Duration::from_secs(token.expires_in.unwrap_or(JWT_LIFETIME_SECS as u64));
        cache.set(
            token.access_token.clone(),
            lifetime.saturating_sub(TOKEN_EXPIRY_MARGIN),
        );

        Ok(token.access_token)
    }

    async fn invalidate(&self) {
        self.cache.lock().await.invalidate();
    }
}

/// Sink writing the snapshot into one worksheet of a spreadsheet.
pub struct SheetsSink {
    api_base: String,
    spreadsheet_id: String,
    worksheet: String,
    tokens: Box<dyn TokenSource + Send + Sync>,
    http: Client,
}

impl SheetsSink {
    pub fn new(
        spreadsheet_id: impl Into<String>,
        worksheet: impl Into<String>,
        tokens: Box<dyn TokenSource + Send + Sync>,
    ) -> Self {
        Self {
            api_base: SHEETS_API_BASE.to_string(),
            spreadsheet_id: spreadsheet_id.into(),
            worksheet: worksheet.into(),
            tokens,
            http: Client::new(),
        }
    }

    /// Point the client at another API host.
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    /// `{base}/v4/spreadsheets/{id}/values/{range}{suffix}`
    fn values_url(&self, range: &str, suffix: &str) -> Result<Url, DeliveryError> {
        let mut url = Url::parse(&self.api_base)
            .map_err(|e| DeliveryError::invalid_payload(format!("bad Sheets API base: {}", e)))?;
        let target = format!("{}{}", range, suffix);
        url.path_segments_mut()
            .map_err(|_| DeliveryError::invalid_payload("Sheets API base cannot hold a path"))?
            .pop_if_empty()
            .extend([
                "v4",
                "spreadsheets",
                self.spreadsheet_id.as_str(),
                "values",
                target.as_str(),
            ]);
        Ok(url)
    }

    async fn clear(&self, token: &str) -> Result<(), DeliveryError> {
        let url = self.values_url(&self.worksheet, ":clear")?;
        let response = self
            .http
            .post(url)
            .bearer_auth(token)
            .json(&json!({}))
            .send()
            .await?;
        check(response).await
    }

    async fn append(&self, token: &str, table: &Table) -> Result<(), DeliveryError> {
        let mut url = self.values_url(&format!("{}!A1", self.worksheet), ":append")?;
        url.query_pairs_mut()
            .append_pair("valueInputOption", "RAW")
            .append_pair("insertDataOption", "INSERT_ROWS");

        let response = self
            .http
            .post(url)
            .bearer_auth(token)
            .json(&json!({ "values": table.rows() }))
            .send()
            .await?;
        check(response).await
    }

    async fn write(&self, token: &str, table: &Table) -> Result<(), DeliveryError> {
        self.clear(token).await?;
        if !table.is_empty() {
            self.append(token, table).await?;
        }
        Ok(())
    }
}

async fn check(response: Response) -> Result<(), DeliveryError> {
    let status = response.status();
    if status.is_success() {
        return Ok(());
    }
    let message = response.text().await.unwrap_or_default();
    if status.as_u16() == 401 {
        Err(DeliveryError::auth(message))
    } else {
        Err(DeliveryError::rejected(status.as_u16(), message))
    }
}

#[async_trait]
impl Sink for SheetsSink {
    async fn replace_all(&self, table: &Table) -> Result<(), DeliveryError> {
        let token = self.tokens.access_token().await?;

        match self.write(&token, table).await {
            Err(DeliveryError::Auth { message }) => {
                tracing::warn!(%message, "Sheets rejected the access token, retrying with a fresh one");
                self.tokens.invalidate().await;
                let token = self.tokens.access_token().await?;
                let retried = self.write(&token, table).await;
                if matches!(retried, Err(DeliveryError::Auth { .. })) {
                    self.tokens.invalidate().await;
                }
                retried
            }
            result => result,
        }
    }

    fn destination(&self) -> String {
        format!("https://docs.google.com/spreadsheets/d/{}", self.spreadsheet_id)
    }
}
