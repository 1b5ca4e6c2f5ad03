pub mod browser;
pub mod config;
pub mod error;
pub mod parser;
pub mod scraper;

pub use error::{FetchError, Result, ScrapingError};
pub use config::Config;
pub use scraper::{Marketplace, ScraperManager, ScraperRegistry, ScrapingResult};
