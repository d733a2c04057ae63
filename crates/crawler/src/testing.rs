use browser::{BrowserError, PageDriver, PageLoad};
use std::collections::{HashMap, HashSet};
use std::time::Duration;

/// In-memory site. Unknown URLs load as empty 404 pages.
#[derive(Default)]
pub struct FakeSite {
    pages: HashMap<String, String>,
    failing: HashSet<String>,
    unreadable: HashSet<String>,
    never_idle: bool,
    current: Option<String>,
}

impl FakeSite {
    pub fn page(mut self, url: &str, html: &str) -> Self {
        self.pages.insert(url.to_string(), html.to_string());
        self
    }

    pub fn failing(mut self, url: &str) -> Self {
        self.failing.insert(url.to_string());
        self
    }

    pub fn unreadable(mut self, url: &str) -> Self {
        self.unreadable.insert(url.to_string());
        self
    }

    pub fn never_idle(mut self) -> Self {
        self.never_idle = true;
        self
    }
}

impl PageDriver for FakeSite {
    fn open_page(&mut self) -> Result<(), BrowserError> {
        Ok(())
    }

    fn navigate(&mut self, url: &str, timeout: Duration) -> Result<PageLoad, BrowserError> {
        if self.failing.contains(url) {
            return Err(BrowserError::Timeout(format!("{} after {:?}", url, timeout)));
        }
        self.current = Some(url.to_string());
        let status = if self.pages.contains_key(url) || self.unreadable.contains(url) {
            200
        } else {
            404
        };
        Ok(PageLoad {
            status: Some(status),
            final_url: url.to_string(),
        })
    }

    fn wait_for_idle(&mut self, soft_timeout: Duration) -> Result<(), BrowserError> {
        if self.never_idle {
            Err(BrowserError::Timeout(format!("{:?}", soft_timeout)))
        } else {
            Ok(())
        }
    }

    fn page_content(&mut self) -> Result<String, BrowserError> {
        let url = self.current.as_deref().ok_or(BrowserError::NoPage)?;
        if self.unreadable.contains(url) {
            return Err(BrowserError::NavigationError("execution context destroyed".into()));
        }
        Ok(self.pages.get(url).cloned().unwrap_or_default())
    }

    fn close_page(&mut self) {
        self.current = None;
    }
}
