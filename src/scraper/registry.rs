use std::sync::Arc;
use tracing::info;

use crate::browser::RenderedFetcher;
use crate::config::Config;
use crate::error::{Result, ScrapingError};
use crate::scraper::fetcher::{PageFetcher, StaticFetcher, Transport};
use crate::scraper::marketplaces;
use crate::scraper::strategy::MarketplaceScraper;

/// Ordered, read-only set of strategies. The first one claiming a URL wins.
#[derive(Clone, Default)]
pub struct ScraperRegistry {
    scrapers: Vec<Arc<dyn MarketplaceScraper>>,
}

#[derive(Default)]
pub struct RegistryBuilder {
    scrapers: Vec<Arc<dyn MarketplaceScraper>>,
}

impl RegistryBuilder {
    pub fn register<S>(self, scraper: S) -> Self
    where
        S: MarketplaceScraper + 'static,
    {
        self.register_shared(Arc::new(scraper))
    }

    pub fn register_shared(mut self, scraper: Arc<dyn MarketplaceScraper>) -> Self {
        self.scrapers.push(scraper);
        self
    }

    pub fn build(self) -> ScraperRegistry {
        let registry = ScraperRegistry {
            scrapers: self.scrapers,
        };
        info!("Registered scrapers: {:?}", registry.names());
        registry
    }
}

impl ScraperRegistry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// Builder preloaded with the stock storefronts: Mercado Livre, Amazon,
    /// Magazine Luiza, Shopee.
    pub fn defaults(config: &Config) -> Result<RegistryBuilder> {
        let static_fetcher: Arc<dyn PageFetcher> =
            Arc::new(StaticFetcher::new(&config.http).map_err(|e| ScrapingError::ConfigError(e.to_string()))?);
        let rendered_fetcher: Arc<dyn PageFetcher> = Arc::new(RenderedFetcher::new(config.browser.clone()));

        let shopee_fetcher = match config.scrapers.shopee_transport {
            Transport::Static => static_fetcher.clone(),
            Transport::Rendered => rendered_fetcher.clone(),
        };

        Ok(Self::builder()
            .register(marketplaces::mercado_livre(static_fetcher.clone())?)
            .register(marketplaces::amazon(static_fetcher)?)
            .register(marketplaces::magalu(rendered_fetcher)?)
            .register(marketplaces::shopee(shopee_fetcher)?))
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::defaults(config)?.build())
    }

    pub fn resolve(&self, url: &str) -> Option<&Arc<dyn MarketplaceScraper>> {
        self.scrapers.iter().find(|scraper| scraper.is_valid_url(url))
    }

    pub fn names(&self) -> Vec<&str> {
        self.scrapers.iter().map(|s| s.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.scrapers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scrapers.is_empty()
    }
}
