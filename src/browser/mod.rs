pub mod manager;
pub mod rendered;
pub mod stealth;


pub use manager::{BrowserSession, BrowserSessionId, SessionLease, SessionTracker};
pub use rendered::{wait_for_selector, ChromeLauncher, RenderSession, RenderedFetcher, RenderedPage, SessionLauncher};
