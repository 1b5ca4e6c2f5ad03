use async_trait::async_trait;
use scraper::Html;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::error::ScrapingError;
use crate::parser::{
    any_unavailable, first_price_text, validate_price, CompiledIndicator, CompiledPriceSelector,
    PriceSelector, UnavailableIndicator,
};
use crate::scraper::fetcher::{FetchRequest, PageFetcher, Transport};
use crate::scraper::types::{Marketplace, ScrapingResult};

/// Price extraction for one storefront.
///
/// Implementations are immutable once built and safe to call concurrently.
/// `scrape_price` never fails: every problem is folded into the result.
#[async_trait]
pub trait MarketplaceScraper: Send + Sync {
    fn name(&self) -> &str;
    fn is_valid_url(&self, url: &str) -> bool;
    async fn scrape_price(&self, url: &str) -> ScrapingResult;
}

/// Static description of a storefront: which URLs it owns, where the price
/// lives and what marks a listing as unavailable.
#[derive(Debug, Clone, Copy)]
pub struct StrategySpec {
    pub marketplace: Marketplace,
    pub name: &'static str,
    /// Case-sensitive substrings; any one of them claims the URL.
    pub hosts: &'static [&'static str],
    pub transport: Transport,
    /// Rendered transport waits for this element before reading the DOM.
    pub ready_selector: Option<&'static str>,
    pub price_selectors: &'static [PriceSelector],
    pub unavailable: &'static [UnavailableIndicator],
}

/// Fetch, then walk the selector fallback chain.
pub struct SelectorStrategy {
    spec: StrategySpec,
    fetcher: Arc<dyn PageFetcher>,
    price_chain: Vec<CompiledPriceSelector>,
    indicators: Vec<CompiledIndicator>,
}

impl SelectorStrategy {
    pub fn new(spec: StrategySpec, fetcher: Arc<dyn PageFetcher>) -> Result<Self, ScrapingError> {
        if fetcher.transport() != spec.transport {
            warn!(
                "{} expects {:?} transport but was given {:?}",
                spec.name,
                spec.transport,
                fetcher.transport()
            );
        }

        let price_chain = spec
            .price_selectors
            .iter()
            .map(|s| CompiledPriceSelector::new(*s))
            .collect::<Result<Vec<_>, _>>()?;
        let indicators = spec
            .unavailable
            .iter()
            .map(|s| CompiledIndicator::new(*s))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            spec,
            fetcher,
            price_chain,
            indicators,
        })
    }

    pub fn spec(&self) -> &StrategySpec {
        &self.spec
    }

    /// Price and availability from an already fetched document.
    pub fn extract(&self, html: &str) -> Result<(f64, bool), ScrapingError> {
        let document = Html::parse_document(html);

        let found = first_price_text(&document, &self.price_chain).ok_or(ScrapingError::PriceNotFound)?;
        let price = validate_price(&found.text, found.format.parse(&found.text))?;
        let available = !any_unavailable(&document, &self.indicators);

        debug!(
            "{}: price {} from selector #{}, available={}",
            self.spec.name, price, found.position, available
        );
        Ok((price, available))
    }
}

#[async_trait]
impl MarketplaceScraper for SelectorStrategy {
    fn name(&self) -> &str {
        self.spec.name
    }

    fn is_valid_url(&self, url: &str) -> bool {
        self.spec.hosts.iter().any(|host| url.contains(host))
    }

    async fn scrape_price(&self, url: &str) -> ScrapingResult {
        let request = FetchRequest::new(url).ready_when(self.spec.ready_selector);

        let body = match self.fetcher.fetch(&request).await {
            Ok(body) => body,
            Err(source) => {
                let err = ScrapingError::FetchFailed {
                    marketplace: self.spec.name.to_string(),
                    source,
                };
                warn!("{}", err);
                return ScrapingResult::failure(err);
            }
        };

        match self.extract(&body) {
            Ok((price, available)) => {
                info!("{}: {} -> R$ {:.2} (available={})", self.spec.name, url, price, available);
                ScrapingResult::found(price, available)
            }
            Err(err) => {
                warn!("{}: {} -> {}", self.spec.name, url, err);
                ScrapingResult::failure(err)
            }
        }
    }
}
