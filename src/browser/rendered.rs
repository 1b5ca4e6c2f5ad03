use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::emulation::SetUserAgentOverrideParams;
use chromiumoxide::cdp::browser_protocol::page::AddScriptToEvaluateOnNewDocumentParams;
use chromiumoxide::page::Page;
use std::future::Future;
use std::time::Duration;
use tokio::time::{sleep, timeout};
use tracing::{debug, info, warn};

use crate::browser::manager::{BrowserSession, SessionTracker};
use crate::browser::stealth;
use crate::config::RenderConfig;
use crate::error::FetchError;
use crate::scraper::fetcher::{FetchRequest, PageFetcher, Transport};

/// Starts one browser session per fetch.
#[async_trait]
pub trait SessionLauncher: Send + Sync {
    type Session: RenderSession;

    /// Must hold a slot from `tracker` for the whole life of the session.
    async fn launch(&self, config: &RenderConfig, tracker: &SessionTracker) -> Result<Self::Session, FetchError>;
}

#[async_trait]
pub trait RenderSession: Send + Sync + Sized {
    type Page: RenderedPage;

    /// New tab with the client identity applied.
    async fn open_page(&self, config: &RenderConfig) -> Result<Self::Page, FetchError>;
    async fn close(self);
}

#[async_trait]
pub trait RenderedPage: Send + Sync {
    async fn goto(&self, url: &str) -> Result<(), FetchError>;
    async fn has_element(&self, selector: &str) -> bool;
    async fn content(&self) -> Result<String, FetchError>;
}

/// Launches a local Chrome/Chromium through chromiumoxide.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChromeLauncher;

#[async_trait]
impl SessionLauncher for ChromeLauncher {
    type Session = BrowserSession;

    async fn launch(&self, config: &RenderConfig, tracker: &SessionTracker) -> Result<BrowserSession, FetchError> {
        BrowserSession::launch(config, tracker).await
    }
}

#[async_trait]
impl RenderSession for BrowserSession {
    type Page = Page;

    async fn open_page(&self, config: &RenderConfig) -> Result<Page, FetchError> {
        let page = self.new_page().await?;

        let user_agent = SetUserAgentOverrideParams::builder()
            .user_agent(config.user_agent.as_str())
            .accept_language(stealth::ACCEPT_LANGUAGE)
            .platform(stealth::platform_for(&config.user_agent))
            .build()
            .map_err(|e| FetchError::BrowserError(format!("Failed to build user agent params: {}", e)))?;

        page.execute(user_agent)
            .await
            .map_err(|e| FetchError::BrowserError(format!("Failed to set user agent: {}", e)))?;

        page.execute(AddScriptToEvaluateOnNewDocumentParams::new(
            stealth::webdriver_suppression_script(),
        ))
        .await
        .map_err(|e| FetchError::BrowserError(format!("Failed to inject stealth script: {}", e)))?;

        debug!("Opened page in browser session {}", self.id());
        Ok(page)
    }

    async fn close(self) {
        BrowserSession::close(self).await
    }
}

#[async_trait]
impl RenderedPage for Page {
    async fn goto(&self, url: &str) -> Result<(), FetchError> {
        Page::goto(self, url)
            .await
            .map(|_| ())
            .map_err(|e| FetchError::BrowserError(format!("Failed to navigate to {}: {}", url, e)))
    }

    async fn has_element(&self, selector: &str) -> bool {
        self.find_element(selector).await.is_ok()
    }

    async fn content(&self) -> Result<String, FetchError> {
        Page::content(self)
            .await
            .map_err(|e| FetchError::BrowserError(format!("Failed to get page content: {}", e)))
    }
}

/// Headless-browser transport for storefronts that inject the price with
/// client-side script.
///
/// Every call launches its own browser and tears it down again before
/// returning, whatever the outcome.
pub struct RenderedFetcher<L = ChromeLauncher> {
    config: RenderConfig,
    tracker: SessionTracker,
    launcher: L,
}

impl RenderedFetcher {
    pub fn new(config: RenderConfig) -> Self {
        Self::with_launcher(config, ChromeLauncher)
    }
}

impl<L: SessionLauncher> RenderedFetcher<L> {
    pub fn with_launcher(config: RenderConfig, launcher: L) -> Self {
        let tracker = SessionTracker::new(config.max_concurrent_sessions);
        Self {
            config,
            tracker,
            launcher,
        }
    }

    pub fn tracker(&self) -> &SessionTracker {
        &self.tracker
    }

    /// Number of browser sessions currently alive. Zero whenever no fetch is in flight.
    pub fn live_sessions(&self) -> usize {
        self.tracker.live_sessions()
    }

    async fn render(&self, session: &L::Session, request: &FetchRequest) -> Result<String, FetchError> {
        let page = session.open_page(&self.config).await?;

        let navigation = self.config.navigation_timeout;
        timeout(navigation, page.goto(&request.url))
            .await
            .map_err(|_| FetchError::Timeout(navigation))??;

        if let Some(selector) = request.ready_selector.as_deref() {
            let page = &page;
            wait_for_selector(selector, self.config.selector_timeout, self.config.poll_interval, move || async move {
                page.has_element(selector).await
            })
            .await?;
        }

        let html = page.content().await?;
        debug!("Rendered {} ({} bytes)", request.url, html.len());
        Ok(html)
    }
}

#[async_trait]
impl<L: SessionLauncher> PageFetcher for RenderedFetcher<L> {
    fn transport(&self) -> Transport {
        Transport::Rendered
    }

    async fn fetch(&self, request: &FetchRequest) -> Result<String, FetchError> {
        let session = self.launcher.launch(&self.config, &self.tracker).await?;
        info!("Rendering {}", request.url);

        let outcome = self.render(&session, request).await;
        if let Err(ref e) = outcome {
            warn!("Rendered fetch of {} failed: {}", request.url, e);
        }

        session.close().await;
        outcome
    }
}

/// Polls `probe` until it reports the selector present or `budget` runs out.
///
/// The budget is a hard bound: a probe still in flight when it expires is
/// abandoned.
pub async fn wait_for_selector<F, Fut>(
    selector: &str,
    budget: Duration,
    poll_interval: Duration,
    mut probe: F,
) -> Result<(), FetchError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let polling = async {
        while !probe().await {
            sleep(poll_interval).await;
        }
    };

    timeout(budget, polling).await.map_err(|_| FetchError::SelectorTimeout {
        selector: selector.to_string(),
        waited: budget,
    })
}
