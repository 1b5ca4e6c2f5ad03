use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::page::Page;
use futures::StreamExt;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::browser::stealth;
use crate::config::RenderConfig;
use crate::error::FetchError;

pub type BrowserSessionId = Uuid;

const EXIT_GRACE: Duration = Duration::from_secs(5);

/// Bounds how many browser sessions exist at once and counts the live ones.
#[derive(Debug, Clone)]
pub struct SessionTracker {
    permits: Arc<Semaphore>,
    live: Arc<AtomicUsize>,
    max_sessions: usize,
}

/// Proof that a session slot is held. Releases the slot when dropped.
#[derive(Debug)]
pub struct SessionLease {
    _permit: OwnedSemaphorePermit,
    live: Arc<AtomicUsize>,
}

impl SessionTracker {
    pub fn new(max_sessions: usize) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(max_sessions)),
            live: Arc::new(AtomicUsize::new(0)),
            max_sessions,
        }
    }

    pub async fn acquire(&self) -> Result<SessionLease, FetchError> {
        let permit = self
            .permits
            .clone()
            .acquire_owned()
            .await
            .map_err(|e| FetchError::BrowserError(format!("Session limiter closed: {}", e)))?;

        let live = self.live.fetch_add(1, Ordering::SeqCst) + 1;
        debug!("Browser session slot acquired ({}/{})", live, self.max_sessions);

        Ok(SessionLease {
            _permit: permit,
            live: self.live.clone(),
        })
    }

    pub fn live_sessions(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }

    pub fn max_sessions(&self) -> usize {
        self.max_sessions
    }
}

impl Drop for SessionLease {
    fn drop(&mut self) {
        self.live.fetch_sub(1, Ordering::SeqCst);
    }
}

/// One isolated browser process, owned by a single scrape.
///
/// `close` is the normal teardown. If the session is dropped without it
/// (panic, cancelled future) the handler task is aborted, the browser value
/// is dropped and the profile directory removed, so nothing outlives the call.
pub struct BrowserSession {
    id: BrowserSessionId,
    browser: Option<Browser>,
    handler: JoinHandle<()>,
    user_data_dir: PathBuf,
    _lease: SessionLease,
}

impl BrowserSession {
    pub async fn launch(config: &RenderConfig, tracker: &SessionTracker) -> Result<Self, FetchError> {
        let lease = tracker.acquire().await?;
        let id = Uuid::new_v4();

        // unique profile dir so concurrent sessions never share a singleton lock
        let user_data_dir =
            std::env::temp_dir().join(format!("price-scraper-{}-{}", std::process::id(), id));

        let mut builder = BrowserConfig::builder()
            .no_sandbox()
            .user_data_dir(&user_data_dir)
            .window_size(config.window.width, config.window.height)
            .args(stealth::launch_args());

        if !config.headless {
            builder = builder.with_head();
        }
        if let Some(ref executable) = config.executable {
            builder = builder.chrome_executable(executable);
        }

        let browser_config = builder
            .build()
            .map_err(|e| FetchError::LaunchError(format!("Failed to create browser config: {}", e)))?;

        let (browser, mut handler) = match Browser::launch(browser_config).await {
            Ok(launched) => launched,
            Err(e) => {
                let _ = std::fs::remove_dir_all(&user_data_dir);
                return Err(FetchError::LaunchError(e.to_string()));
            }
        };

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    // filter out common websocket deserialization errors
                    let error_msg = e.to_string();
                    if error_msg.contains("data did not match any variant") {
                        debug!("Ignoring WebSocket deserialization error: {}", e);
                    } else {
                        warn!("Browser handler error: {}", e);
                    }
                }
            }
            debug!("Browser handler task ended");
        });

        info!("Launched browser session {}", id);
        Ok(Self {
            id,
            browser: Some(browser),
            handler,
            user_data_dir,
            _lease: lease,
        })
    }

    pub fn id(&self) -> BrowserSessionId {
        self.id
    }

    pub async fn new_page(&self) -> Result<Page, FetchError> {
        let browser = self
            .browser
            .as_ref()
            .ok_or_else(|| FetchError::BrowserError("Browser session already closed".to_string()))?;

        browser
            .new_page("about:blank")
            .await
            .map_err(|e| FetchError::BrowserError(format!("Failed to create new page: {}", e)))
    }

    /// Shuts the browser down and waits for the process to exit.
    pub async fn close(mut self) {
        if let Some(mut browser) = self.browser.take() {
            if let Err(e) = browser.close().await {
                error!("Failed to close browser session {}: {}", self.id, e);
            }
            match tokio::time::timeout(EXIT_GRACE, browser.wait()).await {
                Ok(Ok(_)) => {}
                Ok(Err(e)) => warn!("Browser session {} did not exit cleanly: {}", self.id, e),
                // dropping the Browser below kills the child process
                Err(_) => warn!("Browser session {} still running after {:?}", self.id, EXIT_GRACE),
            }
        }
        info!("Closed browser session {}", self.id);
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        if self.browser.is_some() {
            warn!("Browser session {} dropped without close", self.id);
        }
        self.handler.abort();
        let _ = std::fs::remove_dir_all(&self.user_data_dir);
    }
}
