use futures::future::join_all;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info};
use url::Url;

use crate::error::ScrapingError;
use crate::scraper::registry::ScraperRegistry;
use crate::scraper::types::{Marketplace, MarketplaceLink, ScrapingResult};

/// Candidate URLs per marketplace key, as received from callers.
/// Values are loose JSON so that malformed ones can be skipped, not rejected.
pub type MarketLinks = BTreeMap<String, Value>;

/// Lowest usable price per marketplace key.
pub type MarketPrices = BTreeMap<String, Option<f64>>;

/// Entry point: routes URLs to strategies and aggregates their results.
///
/// All methods are total; failures show up as `ScrapingResult::error` or as
/// a `None` price, never as a panic or `Err`.
#[derive(Clone)]
pub struct ScraperManager {
    registry: Arc<ScraperRegistry>,
}

impl ScraperManager {
    pub fn new(registry: ScraperRegistry) -> Self {
        Self {
            registry: Arc::new(registry),
        }
    }

    pub fn registry(&self) -> &ScraperRegistry {
        &self.registry
    }

    pub async fn scrape_price(&self, url: &str) -> ScrapingResult {
        match self.registry.resolve(url) {
            Some(scraper) => {
                debug!("{} handles {}", scraper.name(), url);
                scraper.scrape_price(url).await
            }
            None => {
                info!("No scraper for {}", url);
                ScrapingResult::failure(ScrapingError::NoScraperMatched)
            }
        }
    }

    /// Scrapes every URL concurrently. Results line up with the input order.
    pub async fn scrape_multiple_prices<I, S>(&self, urls: I) -> Vec<ScrapingResult>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let urls: Vec<S> = urls.into_iter().collect();
        join_all(urls.iter().map(|url| self.scrape_price(url.as_ref()))).await
    }

    /// Lowest positive price per marketplace.
    ///
    /// The four known marketplace keys are always present in the output.
    /// Unknown keys pass through with their own minimum. A key whose value is
    /// not an array counts as empty, and entries that are not http(s) URL
    /// strings are skipped.
    pub async fn scrape_all_markets(&self, links: &MarketLinks) -> MarketPrices {
        let mut prices: MarketPrices = Marketplace::ALL
            .iter()
            .map(|m| (m.key().to_string(), None))
            .collect();

        let lookups = links.iter().map(|(market, entries)| async move {
            let candidates = entries.as_array().map(Vec::as_slice).unwrap_or_default();
            let urls: Vec<&str> = candidates.iter().filter_map(url_candidate).collect();
            if urls.len() < candidates.len() {
                debug!("{}: skipped {} invalid entries", market, candidates.len() - urls.len());
            }

            let lowest = self
                .scrape_multiple_prices(urls)
                .await
                .iter()
                .filter_map(ScrapingResult::usable_price)
                .reduce(f64::min);
            (market.clone(), lowest)
        });

        for (market, lowest) in join_all(lookups).await {
            let label = market
                .parse::<Marketplace>()
                .map(Marketplace::display_name)
                .unwrap_or(market.as_str());
            info!("{}: lowest price {:?}", label, lowest);
            prices.insert(market, lowest);
        }
        prices
    }

    /// Scrapes each link and writes the price back on success. Failed links
    /// keep whatever price they had.
    pub async fn refresh_links(&self, links: Vec<MarketplaceLink>) -> Vec<MarketplaceLink> {
        let results = self.scrape_multiple_prices(links.iter().map(|l| l.url.as_str())).await;

        links
            .into_iter()
            .zip(results)
            .map(|(mut link, result)| {
                if let Some(price) = result.usable_price() {
                    link.price = Some(price);
                }
                link
            })
            .collect()
    }
}

fn url_candidate(value: &Value) -> Option<&str> {
    let raw = value.as_str()?;
    let parsed = Url::parse(raw).ok()?;
    matches!(parsed.scheme(), "http" | "https").then_some(raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchError;
    use crate::scraper::fetcher::{MockPageFetcher, Transport};
    use crate::scraper::marketplaces::AMAZON;
    use crate::scraper::strategy::{MarketplaceScraper, SelectorStrategy};
    use async_trait::async_trait;
    use serde_json::json;
    use std::time::Duration;

    /// Prices by URL suffix after a per-URL delay; `fail` in the URL yields an error.
    struct ScriptedScraper;

    #[async_trait]
    impl MarketplaceScraper for ScriptedScraper {
        fn name(&self) -> &str {
            "Scripted"
        }

        fn is_valid_url(&self, url: &str) -> bool {
            url.contains("loja.test")
        }

        async fn scrape_price(&self, url: &str) -> ScrapingResult {
            let (delay_ms, price) = match url.rsplit('/').next().unwrap_or_default() {
                "slow" => (300, 30.0),
                "medium" => (100, 20.0),
                "fast" => (0, 10.0),
                "zero" => (0, 0.0),
                _ => return ScrapingResult::failure("falha permanente"),
            };
            tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            ScrapingResult::found(price, true)
        }
    }

    fn manager() -> ScraperManager {
        ScraperManager::new(ScraperRegistry::builder().register(ScriptedScraper).build())
    }

    #[tokio::test]
    async fn test_unmatched_url() {
        let result = manager().scrape_price("https://desconhecida.com/p/1").await;
        assert_eq!(
            result,
            ScrapingResult {
                price: 0.0,
                currency: "BRL".to_string(),
                available: false,
                error: Some("Nenhum scraper disponível para esta URL".to_string()),
            }
        );
    }

    #[tokio::test]
    async fn test_delegates_to_matching_strategy() {
        let result = manager().scrape_price("https://loja.test/fast").await;
        assert_eq!(result, ScrapingResult::found(10.0, true));
    }

    #[tokio::test(start_paused = true)]
    async fn test_multiple_prices_keep_input_order() {
        let results = manager()
            .scrape_multiple_prices([
                "https://loja.test/slow",
                "https://loja.test/fail",
                "https://loja.test/fast",
                "https://nowhere.test/x",
            ])
            .await;

        assert_eq!(results.len(), 4);
        assert_eq!(results[0].price, 30.0);
        assert!(results[1].error.is_some());
        assert_eq!(results[2].price, 10.0);
        assert_eq!(
            results[3].error.as_deref(),
            Some("Nenhum scraper disponível para esta URL")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_multiple_prices_run_concurrently() {
        let started = tokio::time::Instant::now();
        manager()
            .scrape_multiple_prices(["https://loja.test/slow", "https://loja.test/medium"])
            .await;
        // sequential would take 400ms
        assert_eq!(started.elapsed(), Duration::from_millis(300));
    }

    #[tokio::test]
    async fn test_failing_fetch_does_not_affect_others() {
        let mut fetcher = MockPageFetcher::new();
        fetcher.expect_transport().return_const(Transport::Static);
        fetcher.expect_fetch().returning(|req| {
            if req.url.contains("B0FAIL") {
                Err(FetchError::NetworkError("connection reset".to_string()))
            } else {
                Ok(r#"<span class="a-price-whole">199,</span>"#.to_string())
            }
        });
        let amazon = SelectorStrategy::new(AMAZON, Arc::new(fetcher)).unwrap();
        let manager = ScraperManager::new(ScraperRegistry::builder().register(amazon).build());

        let results = manager
            .scrape_multiple_prices(vec![
                "https://www.amazon.com.br/dp/B0OK1".to_string(),
                "https://www.amazon.com.br/dp/B0FAIL".to_string(),
                "https://www.amazon.com.br/dp/B0OK2".to_string(),
            ])
            .await;

        assert_eq!(results[0], ScrapingResult::found(199.0, true));
        assert!(results[1].error.as_deref().unwrap().contains("connection reset"));
        assert_eq!(results[2], ScrapingResult::found(199.0, true));
    }

    #[tokio::test]
    async fn test_all_markets_skips_invalid_and_empty() {
        let links: MarketLinks = serde_json::from_value(json!({
            "mercado_livre": ["bad-url"],
            "amazon": []
        }))
        .unwrap();

        let prices = manager().scrape_all_markets(&links).await;
        assert_eq!(
            prices,
            BTreeMap::from([
                ("amazon".to_string(), None),
                ("magalu".to_string(), None),
                ("mercado_livre".to_string(), None),
                ("shopee".to_string(), None),
            ])
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_all_markets_takes_lowest_positive_price() {
        let links: MarketLinks = serde_json::from_value(json!({
            "amazon": [
                "https://loja.test/slow",
                "https://loja.test/fast",
                "https://loja.test/fail",
                "https://loja.test/zero",
                42,
                null,
                "ftp://loja.test/fast"
            ],
            "shopee": ["https://loja.test/fail"],
            "aliexpress": ["https://loja.test/medium"]
        }))
        .unwrap();

        let prices = manager().scrape_all_markets(&links).await;
        assert_eq!(prices["amazon"], Some(10.0));
        assert_eq!(prices["shopee"], None);
        assert_eq!(prices["aliexpress"], Some(20.0));
        assert_eq!(prices["magalu"], None);
        assert_eq!(prices.len(), 5);
    }

    #[tokio::test]
    async fn test_all_markets_treats_non_array_as_empty() {
        let links: MarketLinks = serde_json::from_value(json!({
            "amazon": "https://loja.test/fast",
            "shopee": {"url": "https://loja.test/fast"},
            "magalu": ["https://loja.test/fast"]
        }))
        .unwrap();

        let prices = manager().scrape_all_markets(&links).await;
        assert_eq!(prices["amazon"], None);
        assert_eq!(prices["shopee"], None);
        assert_eq!(prices["magalu"], Some(10.0));
        assert_eq!(prices["mercado_livre"], None);
    }

    #[tokio::test]
    async fn test_refresh_links_writes_back_prices() {
        let links = vec![
            MarketplaceLink {
                marketplace: Marketplace::Amazon,
                url: "https://loja.test/fast".to_string(),
                price: None,
            },
            MarketplaceLink {
                marketplace: Marketplace::Shopee,
                url: "https://loja.test/fail".to_string(),
                price: Some(55.0),
            },
        ];

        let refreshed = manager().refresh_links(links).await;
        assert_eq!(refreshed[0].price, Some(10.0));
        assert_eq!(refreshed[1].price, Some(55.0));
    }

    #[test]
    fn test_url_candidate() {
        assert_eq!(url_candidate(&json!("https://www.amazon.com.br/dp/1")), Some("https://www.amazon.com.br/dp/1"));
        assert_eq!(url_candidate(&json!("http://shopee.com.br/x")), Some("http://shopee.com.br/x"));
        assert_eq!(url_candidate(&json!("bad-url")), None);
        assert_eq!(url_candidate(&json!("mailto:a@b.com")), None);
        assert_eq!(url_candidate(&json!(7)), None);
    }
}
