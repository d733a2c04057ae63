use reqwest::blocking::Client;
use reqwest::header::{CONTENT_TYPE, COOKIE};
use std::time::Duration;
use tracing::debug;

use crate::cookies::{cookie_header_for, CookieSeed};
use crate::{BrowserError, PageDriver, PageLoad};

const USER_AGENT: &str = concat!("site-explorer/", env!("CARGO_PKG_VERSION"));

/// `PageDriver` that fetches raw HTML without executing scripts.
pub struct HttpDriver {
    client: Client,
    cookies: Vec<CookieSeed>,
    body: Option<String>,
}

impl HttpDriver {
    pub fn new(cookies: Vec<CookieSeed>) -> Result<Self, BrowserError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .cookie_store(true)
            .build()
            .map_err(|e| BrowserError::LaunchFailed(e.to_string()))?;

        Ok(Self {
            client,
            cookies,
            body: None,
        })
    }
}

impl PageDriver for HttpDriver {
    fn open_page(&mut self) -> Result<(), BrowserError> {
        self.body = Some(String::new());
        Ok(())
    }

    fn navigate(&mut self, url: &str, timeout: Duration) -> Result<PageLoad, BrowserError> {
        if self.body.is_none() {
            return Err(BrowserError::NoPage);
        }

        let mut request = self.client.get(url).timeout(timeout);
        if let Some(header) = cookie_header_for(&self.cookies, url) {
            request = request.header(COOKIE, header);
        }

        let response = request.send().map_err(|e| {
            if e.is_timeout() {
                BrowserError::Timeout(format!("{} after {:?}", url, timeout))
            } else {
                BrowserError::NavigationError(e.to_string())
            }
        })?;

        let status = response.status().as_u16();
        let final_url = response.url().to_string();
        let is_html = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.contains("html"))
            .unwrap_or(true);

        let body = if is_html {
            response
                .text()
                .map_err(|e| BrowserError::NavigationError(e.to_string()))?
        } else {
            debug!("Skipping non-HTML body at {}", final_url);
            String::new()
        };
        self.body = Some(body);

        Ok(PageLoad {
            status: Some(status),
            final_url,
        })
    }

    fn wait_for_idle(&mut self, _soft_timeout: Duration) -> Result<(), BrowserError> {
        Ok(())
    }

    fn page_content(&mut self) -> Result<String, BrowserError> {
        self.body.clone().ok_or(BrowserError::NoPage)
    }

    fn close_page(&mut self) {
        self.body = None;
    }
}
