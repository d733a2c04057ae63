use std::time::Duration;
use thiserror::Error;

mod chrome;
mod cookies;
mod http;

pub use chrome::{ChromeDriver, ChromeOptions, ScrollBehavior};
pub use cookies::{cookie_header_for, load_cookie_seeds, parse_cookie_arg, CookieSeed};
pub use http::HttpDriver;

#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("Failed to launch browser: {0}")]
    LaunchFailed(String),
    #[error("Navigation error: {0}")]
    NavigationError(String),
    #[error("Timeout error: {0}")]
    Timeout(String),
    #[error("No page is open")]
    NoPage,
    #[error("Invalid cookie: {0}")]
    InvalidCookie(String),
    #[error("Browser error: {0}")]
    BrowserError(#[from] anyhow::Error),
}

/// Outcome of a successful navigation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageLoad {
    pub status: Option<u16>,
    pub final_url: String,
}

/// The browser-control surface a crawl drives, one page at a time.
///
/// Every failure is reported per call; callers decide whether it is
/// fatal. A crawl treats navigation failures as "skip this page" and
/// idle timeouts as "continue with the current DOM".
pub trait PageDriver {
    fn open_page(&mut self) -> Result<(), BrowserError>;

    fn navigate(&mut self, url: &str, timeout: Duration) -> Result<PageLoad, BrowserError>;

    /// Best-effort wait for network quiescence. `Err(Timeout)` is not a
    /// load failure.
    fn wait_for_idle(&mut self, soft_timeout: Duration) -> Result<(), BrowserError>;

    /// Serialized DOM of the current page.
    fn page_content(&mut self) -> Result<String, BrowserError>;

    fn close_page(&mut self);
}

impl<D: PageDriver + ?Sized> PageDriver for &mut D {
    fn open_page(&mut self) -> Result<(), BrowserError> {
        (**self).open_page()
    }

    fn navigate(&mut self, url: &str, timeout: Duration) -> Result<PageLoad, BrowserError> {
        (**self).navigate(url, timeout)
    }

    fn wait_for_idle(&mut self, soft_timeout: Duration) -> Result<(), BrowserError> {
        (**self).wait_for_idle(soft_timeout)
    }

    fn page_content(&mut self) -> Result<String, BrowserError> {
        (**self).page_content()
    }

    fn close_page(&mut self) {
        (**self).close_page()
    }
}

impl<D: PageDriver + ?Sized> PageDriver for Box<D> {
    fn open_page(&mut self) -> Result<(), BrowserError> {
        (**self).open_page()
    }

    fn navigate(&mut self, url: &str, timeout: Duration) -> Result<PageLoad, BrowserError> {
        (**self).navigate(url, timeout)
    }

    fn wait_for_idle(&mut self, soft_timeout: Duration) -> Result<(), BrowserError> {
        (**self).wait_for_idle(soft_timeout)
    }

    fn page_content(&mut self) -> Result<String, BrowserError> {
        (**self).page_content()
    }

    fn close_page(&mut self) {
        (**self).close_page()
    }
}
