pub mod fetcher;
pub mod manager;
pub mod marketplaces;
pub mod registry;
pub mod strategy;
pub mod types;

pub use fetcher::{FetchRequest, PageFetcher, StaticFetcher, Transport};
pub use manager::{MarketLinks, MarketPrices, ScraperManager};
pub use registry::{RegistryBuilder, ScraperRegistry};
pub use strategy::{MarketplaceScraper, SelectorStrategy, StrategySpec};
pub use types::{Marketplace, MarketplaceLink, ScrapingResult, CURRENCY};
