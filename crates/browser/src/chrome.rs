use headless_chrome::Browser as ChromeBrowser;
use headless_chrome::{LaunchOptions, Tab};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::cookies::{cookie_header_for, CookieSeed};
use crate::{BrowserError, PageDriver, PageLoad};

const IDLE_POLL: Duration = Duration::from_millis(250);
const IDLE_WINDOW: Duration = Duration::from_millis(500);

// Returns "<readyState>:<resource entry count>".
const IDLE_PROBE: &str =
    "document.readyState + ':' + performance.getEntriesByType('resource').length";

const STATUS_PROBE: &str = "(() => { \
    const nav = performance.getEntriesByType('navigation')[0]; \
    return nav && nav.responseStatus ? nav.responseStatus : 0; \
})()";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChromeOptions {
    pub headless: bool,
    pub window_size: (u32, u32),
    pub scroll_behavior: ScrollBehavior,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ScrollBehavior {
    None,
    ToBottom,
    Incremental { steps: u32, delay_ms: u64 },
}

impl Default for ChromeOptions {
    fn default() -> Self {
        Self {
            headless: true,
            window_size: (1920, 1080),
            scroll_behavior: ScrollBehavior::None,
        }
    }
}

/// `PageDriver` over a local Chrome instance.
pub struct ChromeDriver {
    browser: ChromeBrowser,
    tab: Option<Arc<Tab>>,
    options: ChromeOptions,
    cookies: Vec<CookieSeed>,
}

impl ChromeDriver {
    pub fn launch(options: ChromeOptions, cookies: Vec<CookieSeed>) -> Result<Self, BrowserError> {
        let launch_options = LaunchOptions::default_builder()
            .headless(options.headless)
            .window_size(Some(options.window_size))
            .idle_browser_timeout(Duration::from_secs(300))
            .build()
            .map_err(|e| BrowserError::LaunchFailed(e.to_string()))?;

        let browser = ChromeBrowser::new(launch_options)
            .map_err(|e| BrowserError::LaunchFailed(e.to_string()))?;

        info!(headless = options.headless, "Browser launched successfully");
        Ok(Self {
            browser,
            tab: None,
            options,
            cookies,
        })
    }

    fn tab(&self) -> Result<&Arc<Tab>, BrowserError> {
        self.tab.as_ref().ok_or(BrowserError::NoPage)
    }

    fn execute_script(&self, script: &str) -> Result<serde_json::Value, BrowserError> {
        let result = self
            .tab()?
            .evaluate(script, false)
            .map_err(|e| BrowserError::BrowserError(anyhow::anyhow!(e.to_string())))?;
        Ok(result.value.unwrap_or(serde_json::Value::Null))
    }

    fn scroll_to_bottom(&self) -> Result<(), BrowserError> {
        self.execute_script("window.scrollTo(0, document.body.scrollHeight);")?;
        std::thread::sleep(Duration::from_millis(500));
        Ok(())
    }

    fn scroll_incremental(&self, steps: u32, delay_ms: u64) -> Result<(), BrowserError> {
        for i in 1..=steps {
            let script = format!(
                "window.scrollTo(0, document.body.scrollHeight * {} / {});",
                i, steps
            );
            self.execute_script(&script)?;
            std::thread::sleep(Duration::from_millis(delay_ms));
        }
        Ok(())
    }

    fn response_status(&self) -> Option<u16> {
        match self.execute_script(STATUS_PROBE) {
            Ok(value) => value
                .as_u64()
                .filter(|status| *status > 0)
                .and_then(|status| u16::try_from(status).ok()),
            Err(e) => {
                debug!("Could not read response status: {}", e);
                None
            }
        }
    }
}

impl PageDriver for ChromeDriver {
    fn open_page(&mut self) -> Result<(), BrowserError> {
        let tab = self
            .browser
            .new_tab()
            .map_err(|e| BrowserError::BrowserError(anyhow::anyhow!(e.to_string())))?;
        self.tab = Some(tab);
        Ok(())
    }

    fn navigate(&mut self, url: &str, timeout: Duration) -> Result<PageLoad, BrowserError> {
        debug!("Navigating to: {}", url);
        let tab = self.tab()?.clone();
        tab.set_default_timeout(timeout);

        if let Some(header) = cookie_header_for(&self.cookies, url) {
            let mut headers = HashMap::new();
            headers.insert("Cookie", header.as_str());
            tab.set_extra_http_headers(headers)
                .map_err(|e| BrowserError::NavigationError(e.to_string()))?;
        }

        let started = Instant::now();
        tab.navigate_to(url)
            .map_err(|e| BrowserError::NavigationError(e.to_string()))?;
        tab.wait_until_navigated().map_err(|e| {
            if started.elapsed() >= timeout {
                BrowserError::Timeout(format!("{} after {:?}", url, timeout))
            } else {
                BrowserError::NavigationError(e.to_string())
            }
        })?;

        match &self.options.scroll_behavior {
            ScrollBehavior::None => {}
            ScrollBehavior::ToBottom => self.scroll_to_bottom()?,
            ScrollBehavior::Incremental { steps, delay_ms } => {
                self.scroll_incremental(*steps, *delay_ms)?;
            }
        }

        Ok(PageLoad {
            status: self.response_status(),
            final_url: tab.get_url(),
        })
    }

    fn wait_for_idle(&mut self, soft_timeout: Duration) -> Result<(), BrowserError> {
        let deadline = Instant::now() + soft_timeout;
        let mut last_count: Option<u64> = None;
        let mut stable_since = Instant::now();

        loop {
            let probe = self.execute_script(IDLE_PROBE)?;
            let (ready, count) = match probe.as_str().and_then(|s| s.split_once(':')) {
                Some((state, count)) => (state == "complete", count.parse::<u64>().ok()),
                None => (false, None),
            };

            if count != last_count {
                last_count = count;
                stable_since = Instant::now();
            } else if ready && stable_since.elapsed() >= IDLE_WINDOW {
                return Ok(());
            }

            if Instant::now() >= deadline {
                return Err(BrowserError::Timeout(format!(
                    "network still busy after {:?}",
                    soft_timeout
                )));
            }
            std::thread::sleep(IDLE_POLL);
        }
    }

    fn page_content(&mut self) -> Result<String, BrowserError> {
        self.tab()?
            .get_content()
            .map_err(|e| BrowserError::BrowserError(anyhow::anyhow!(e.to_string())))
    }

    fn close_page(&mut self) {
        if let Some(tab) = self.tab.take() {
            if let Err(e) = tab.close(true) {
                warn!("Failed to close tab: {}", e);
            }
        }
    }
}

impl Drop for ChromeDriver {
    fn drop(&mut self) {
        self.close_page();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chrome_options_default() {
        let options = ChromeOptions::default();
        assert!(options.headless);
        assert_eq!(options.window_size, (1920, 1080));
        assert!(matches!(options.scroll_behavior, ScrollBehavior::None));
    }
}
