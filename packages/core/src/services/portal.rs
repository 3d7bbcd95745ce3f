//! Listings portal client.
//!
//! Logs in through the portal's HTML login form and downloads the CSV
//! export for one account. Every fetch uses its own cookie jar so sessions
//! never leak between accounts.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Response, Url};
use scraper::{ElementRef, Html, Selector};

use crate::config::PortalConfig;
use crate::monitor::{Credentials, DataSource, FetchError};
use crate::services::export::table_from_export;
use crate::table::Table;

const USER_AGENT: &str = concat!("listing-monitor/", env!("CARGO_PKG_VERSION"));

/// Download link candidates on the export page, tried in order.
const DOWNLOAD_LINK_SELECTORS: &[&str] = &["a[href*='export']", "a[href*='csv']"];

#[derive(Clone)]
pub struct PortalClient {
    login_url: String,
    export_url: String,
    timeout: Duration,
}

/// The parsed login form: where to post and what to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginForm {
    pub action: Url,
    pub username_field: String,
    pub password_field: String,
    pub hidden_fields: Vec<(String, String)>,
}

impl PortalClient {
    pub fn new(config: &PortalConfig) -> Self {
        Self {
            login_url: config.login_url.clone(),
            export_url: config.export_url.clone(),
            timeout: config.timeout(),
        }
    }

    /// A client with a fresh cookie store.
    fn session(&self) -> Result<Client, FetchError> {
        Client::builder()
            .cookie_store(true)
            .timeout(self.timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(FetchError::from)
    }

    async fn login(&self, http: &Client, credentials: &Credentials) -> Result<(), FetchError> {
        let page = http.get(&self.login_url).send().await?;
        let page = require_success(page, "login page")?;
        let page_url = page.url().clone();
        let html = page.text().await?;

        let form = parse_login_form(&html, &page_url)?;

        let mut fields = form.hidden_fields.clone();
        fields.push((form.username_field.clone(), credentials.username.clone()));
        fields.push((form.password_field.clone(), credentials.password.clone()));

        let response = http.post(form.action.clone()).form(&fields).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::auth(format!("login returned HTTP {}", status)));
        }

        let landing_url = response.url().clone();
        let landing = response.text().await?;
        if shows_login_form(&landing, &landing_url, &form) {
            return Err(FetchError::auth("login form shown again after submit"));
        }

        Ok(())
    }

    async fn download_export(&self, http: &Client) -> Result<Vec<u8>, FetchError> {
        let page = http.get(&self.export_url).send().await?;
        let page = require_success(page, "export page")?;

        if !is_html(&page) {
            return Ok(page.bytes().await?.to_vec());
        }

        let page_url = page.url().clone();
        let html = page.text().await?;
        let link = find_download_link(&html, &page_url)
            .ok_or_else(|| FetchError::extraction("no CSV download link on export page"))?;

        tracing::debug!(url = %link, "Following CSV download link");
        let file = http.get(link).send().await?;
        let file = require_success(file, "CSV download")?;
        Ok(file.bytes().await?.to_vec())
    }
}

#[async_trait]
impl DataSource for PortalClient {
    async fn fetch_table(&self, credentials: &Credentials) -> Result<Table, FetchError> {
        let http = self.session()?;

        self.login(&http, credentials).await?;
        let bytes = self.download_export(&http).await?;
        let table = table_from_export(&bytes)?;

        tracing::debug!(rows = table.len(), "Parsed CSV export");
        Ok(table)
    }

    fn source_name(&self) -> &str {
        "portal"
    }
}

fn require_success(response: Response, what: &str) -> Result<Response, FetchError> {
    if response.status().is_success() {
        Ok(response)
    } else {
        Err(FetchError::network(format!(
            "{} returned HTTP {}",
            what,
            response.status()
        )))
    }
}

fn is_html(response: &Response) -> bool {
    response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|ct| ct.contains("text/html"))
        .unwrap_or(false)
}

fn selector(css: &str) -> Selector {
    // Selectors are compile-time constants in this module.
    Selector::parse(css).expect("static CSS selector should parse")
}

/// True when `html` contains the same login form that was just submitted.
/// Other password inputs (a change-password widget, say) do not count.
fn shows_login_form(html: &str, page_url: &Url, submitted: &LoginForm) -> bool {
    parse_login_form(html, page_url)
        .map(|form| {
            form.action == submitted.action
                && form.username_field == submitted.username_field
                && form.password_field == submitted.password_field
        })
        .unwrap_or(false)
}

/// Locate the login form and the names of its credential fields.
pub fn parse_login_form(html: &str, page_url: &Url) -> Result<LoginForm, FetchError> {
    let document = Html::parse_document(html);

    let password_selectors = [
        selector("input[autocomplete='current-password']"),
        selector("input[type='password']"),
    ];
    let username_selectors = [
        selector("input[autocomplete='username']"),
        selector("input[type='email']"),
        selector("input[type='text']"),
    ];
    let hidden = selector("input[type='hidden']");
    let form_selector = selector("form");

    let form = document
        .select(&form_selector)
        .find(|form| password_selectors.iter().any(|s| form.select(s).next().is_some()))
        .ok_or_else(|| FetchError::auth("no login form on login page"))?;

    let password_field = first_named(&form, &password_selectors)
        .ok_or_else(|| FetchError::auth("login form has no named password field"))?;
    let username_field = first_named(&form, &username_selectors)
        .ok_or_else(|| FetchError::auth("login form has no named username field"))?;

    let hidden_fields = form
        .select(&hidden)
        .filter_map(|input| {
            let name = input.value().attr("name")?;
            let value = input.value().attr("value").unwrap_or_default();
            Some((name.to_string(), value.to_string()))
        })
        .collect();

    let action = match form.value().attr("action").filter(|a| !a.is_empty()) {
        Some(action) => page_url
            .join(action)
            .map_err(|e| FetchError::auth(format!("bad login form action: {}", e)))?,
        None => page_url.clone(),
    };

    Ok(LoginForm {
        action,
        username_field,
        password_field,
        hidden_fields,
    })
}

fn first_named(form: &ElementRef<'_>, selectors: &[Selector]) -> Option<String> {
    selectors.iter().find_map(|s| {
        form.select(s)
            .find_map(|input| input.value().attr("name").map(str::to_string))
    })
}

/// Find the CSV download link: `href` matches first, then anchor text.
pub fn find_download_link(html: &str, page_url: &Url) -> Option<Url> {
    let document = Html::parse_document(html);

    let by_href = DOWNLOAD_LINK_SELECTORS.iter().find_map(|css| {
        document
            .select(&selector(css))
            .find_map(|a| a.value().attr("href").map(str::to_string))
    });

    let href = by_href.or_else(|| {
        document
            .select(&selector("a[href]"))
            .find(|a| a.text().collect::<String>().contains("CSV"))
            .and_then(|a| a.value().attr("href").map(str::to_string))
    })?;

    page_url.join(&href).ok()
}
