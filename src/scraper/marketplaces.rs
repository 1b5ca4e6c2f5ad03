//! Storefront definitions.
//!
//! Selectors are listed in priority order: structured data first, visible
//! fragments after, since markup classes change far more often than meta tags.
//! Shopee uses obfuscated class names and breaks regularly.

use std::sync::Arc;

use crate::error::ScrapingError;
use crate::parser::{PriceSelector, UnavailableIndicator};
use crate::scraper::fetcher::{PageFetcher, Transport};
use crate::scraper::strategy::{SelectorStrategy, StrategySpec};
use crate::scraper::types::Marketplace;

pub const MERCADO_LIVRE: StrategySpec = StrategySpec {
    marketplace: Marketplace::MercadoLivre,
    name: "Mercado Livre",
    hosts: &["mercadolivre.com.br", "mercadolibre.com.br"],
    transport: Transport::Static,
    ready_selector: None,
    price_selectors: &[
        PriceSelector::attribute(r#"meta[itemprop="price"]"#, "content"),
        PriceSelector::text(".andes-money-amount__fraction"),
        PriceSelector::text(".price-tag-fraction"),
        PriceSelector::text(".ui-pdp-price__part"),
    ],
    unavailable: &[
        UnavailableIndicator::present(".ui-pdp-stock-unavailable"),
        UnavailableIndicator::present(".ui-pdp-sold-out"),
    ],
};

pub const AMAZON: StrategySpec = StrategySpec {
    marketplace: Marketplace::Amazon,
    name: "Amazon",
    hosts: &["amazon.com.br"],
    transport: Transport::Static,
    ready_selector: None,
    price_selectors: &[
        PriceSelector::text(".a-price-whole"),
        PriceSelector::text(".a-price .a-offscreen"),
        PriceSelector::text("#priceblock_ourprice"),
        PriceSelector::text("#priceblock_dealprice"),
        PriceSelector::text(".a-color-price"),
    ],
    unavailable: &[
        UnavailableIndicator::containing("#availability .a-color-price", &["indisponível", "unavailable"]),
        UnavailableIndicator::containing("#outOfStock", &["indisponível", "unavailable"]),
        UnavailableIndicator::containing("#availability .a-color-error", &["indisponível", "unavailable"]),
    ],
};

const MAGALU_PRICE: &str = r#"p[data-testid="price-value"]"#;

pub const MAGALU: StrategySpec = StrategySpec {
    marketplace: Marketplace::Magalu,
    name: "Magazine Luiza",
    hosts: &["magazineluiza.com.br"],
    transport: Transport::Rendered,
    ready_selector: Some(MAGALU_PRICE),
    price_selectors: &[PriceSelector::text(MAGALU_PRICE)],
    unavailable: &[],
};

const SHOPEE_PRICE: &str = ".IZPeQz.B67UQ0";

pub const SHOPEE_RENDERED: StrategySpec = StrategySpec {
    marketplace: Marketplace::Shopee,
    name: "Shopee",
    hosts: &["shopee.com.br"],
    transport: Transport::Rendered,
    ready_selector: Some(SHOPEE_PRICE),
    price_selectors: &[PriceSelector::text(SHOPEE_PRICE)],
    unavailable: &[],
};

pub const SHOPEE_STATIC: StrategySpec = StrategySpec {
    marketplace: Marketplace::Shopee,
    name: "Shopee",
    hosts: &["shopee.com.br"],
    transport: Transport::Static,
    ready_selector: None,
    price_selectors: &[
        PriceSelector::text(SHOPEE_PRICE),
        PriceSelector::text(".product-price"),
        PriceSelector::text(".price"),
        PriceSelector::text(".item-price"),
        PriceSelector::text(".price-box"),
    ],
    unavailable: &[
        UnavailableIndicator::containing(".product-status", &["esgotado", "indisponível", "out of stock"]),
        UnavailableIndicator::containing(".stock-status", &["esgotado", "indisponível", "out of stock"]),
        UnavailableIndicator::containing(".availability", &["esgotado", "indisponível", "out of stock"]),
    ],
};

pub fn mercado_livre(fetcher: Arc<dyn PageFetcher>) -> Result<SelectorStrategy, ScrapingError> {
    SelectorStrategy::new(MERCADO_LIVRE, fetcher)
}

pub fn amazon(fetcher: Arc<dyn PageFetcher>) -> Result<SelectorStrategy, ScrapingError> {
    SelectorStrategy::new(AMAZON, fetcher)
}

pub fn magalu(fetcher: Arc<dyn PageFetcher>) -> Result<SelectorStrategy, ScrapingError> {
    SelectorStrategy::new(MAGALU, fetcher)
}

/// Shopee variant matching the given transport.
pub fn shopee(fetcher: Arc<dyn PageFetcher>) -> Result<SelectorStrategy, ScrapingError> {
    let spec = match fetcher.transport() {
        Transport::Rendered => SHOPEE_RENDERED,
        Transport::Static => SHOPEE_STATIC,
    };
    SelectorStrategy::new(spec, fetcher)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scraper::fetcher::MockPageFetcher;
    use crate::scraper::strategy::MarketplaceScraper;

    fn serving(transport: Transport, html: &'static str) -> Arc<dyn PageFetcher> {
        let mut fetcher = MockPageFetcher::new();
        fetcher.expect_transport().return_const(transport);
        fetcher.expect_fetch().returning(move |_| Ok(html.to_string()));
        Arc::new(fetcher)
    }

    #[test]
    fn test_all_specs_compile() {
        for spec in [MERCADO_LIVRE, AMAZON, MAGALU, SHOPEE_RENDERED, SHOPEE_STATIC] {
            assert!(SelectorStrategy::new(spec, serving(spec.transport, "")).is_ok(), "{}", spec.name);
            assert!(!spec.price_selectors.is_empty(), "{}", spec.name);
            assert_eq!(spec.marketplace.display_name(), spec.name);
            assert_eq!(spec.ready_selector.is_some(), spec.transport == Transport::Rendered);
        }
    }

    #[tokio::test]
    async fn test_mercado_livre_meta_price() {
        let strategy = mercado_livre(serving(
            Transport::Static,
            r#"<html><head><meta itemprop="price" content="1349.9"></head>
               <body><span class="andes-money-amount__fraction">1.499</span></body></html>"#,
        ))
        .unwrap();

        let result = strategy
            .scrape_price("https://www.mercadolivre.com.br/barraca/p/MLB31045329")
            .await;
        assert_eq!(result, crate::scraper::ScrapingResult::found(1349.9, true));
    }

    #[tokio::test]
    async fn test_mercado_livre_visible_fraction_and_sold_out() {
        let strategy = mercado_livre(serving(
            Transport::Static,
            r#"<span class="andes-money-amount__fraction">1.499</span><div class="ui-pdp-sold-out"></div>"#,
        ))
        .unwrap();

        let result = strategy.scrape_price("https://produto.mercadolivre.com.br/MLB-1").await;
        assert_eq!(result.price, 1499.0);
        assert!(!result.available);
    }

    #[tokio::test]
    async fn test_amazon_unavailable_text() {
        let strategy = amazon(serving(
            Transport::Static,
            r#"<span class="a-price"><span class="a-offscreen">R$ 279,90</span></span>
               <div id="availability"><span class="a-color-price">Não disponível. Indisponível.</span></div>"#,
        ))
        .unwrap();

        let result = strategy.scrape_price("https://www.amazon.com.br/dp/B0BZJDLT6Z").await;
        assert_eq!(result.price, 279.90);
        assert!(!result.available);
    }

    #[tokio::test]
    async fn test_amazon_whole_price_in_stock() {
        let strategy = amazon(serving(
            Transport::Static,
            r#"<span class="a-price-whole">1.079,</span><span class="a-price-fraction">00</span>
               <div id="availability"><span class="a-color-success">Em estoque</span></div>"#,
        ))
        .unwrap();

        let result = strategy.scrape_price("https://www.amazon.com.br/dp/B0BZJDLT6Z").await;
        assert_eq!(result, crate::scraper::ScrapingResult::found(1079.0, true));
    }

    #[tokio::test]
    async fn test_magalu_rendered_price() {
        let strategy = magalu(serving(
            Transport::Rendered,
            r#"<div><p data-testid="price-value">R$&nbsp;189,90</p></div>"#,
        ))
        .unwrap();

        let result = strategy
            .scrape_price("https://www.magazineluiza.com.br/barraca-iglu/p/ccg4a44b7d/es/barr/")
            .await;
        assert_eq!(result.price, 189.90);
        assert!(result.available);
    }

    #[tokio::test]
    async fn test_shopee_variant_follows_transport() {
        let rendered = shopee(serving(Transport::Rendered, "")).unwrap();
        assert_eq!(rendered.spec().ready_selector, Some(SHOPEE_PRICE));

        let static_variant = shopee(serving(
            Transport::Static,
            r#"<div class="product-price">R$ 45,00</div><div class="stock-status">Esgotado</div>"#,
        ))
        .unwrap();
        assert_eq!(static_variant.spec().ready_selector, None);

        let result = static_variant.scrape_price("https://shopee.com.br/Barraca-i.1.2").await;
        assert_eq!(result.price, 45.0);
        assert!(!result.available);
    }
}
