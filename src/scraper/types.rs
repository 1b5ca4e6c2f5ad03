use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const CURRENCY: &str = "BRL";

/// Uniform outcome of a price lookup.
///
/// When `error` is set the price is `0` and `available` is `false`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrapingResult {
    pub price: f64,
    pub currency: String,
    pub available: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ScrapingResult {
    pub fn found(price: f64, available: bool) -> Self {
        Self {
            price,
            currency: CURRENCY.to_string(),
            available,
            error: None,
        }
    }

    pub fn failure(error: impl fmt::Display) -> Self {
        Self {
            price: 0.0,
            currency: CURRENCY.to_string(),
            available: false,
            error: Some(error.to_string()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// The price, if this result carries one worth comparing.
    pub fn usable_price(&self) -> Option<f64> {
        (self.is_success() && self.price.is_finite() && self.price > 0.0).then_some(self.price)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Marketplace {
    MercadoLivre,
    Amazon,
    Magalu,
    Shopee,
}

impl Marketplace {
    pub const ALL: [Marketplace; 4] = [
        Marketplace::MercadoLivre,
        Marketplace::Amazon,
        Marketplace::Magalu,
        Marketplace::Shopee,
    ];

    /// Wire key, as used in `{marketplace: [urls]}` maps.
    pub fn key(self) -> &'static str {
        match self {
            Marketplace::MercadoLivre => "mercado_livre",
            Marketplace::Amazon => "amazon",
            Marketplace::Magalu => "magalu",
            Marketplace::Shopee => "shopee",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Marketplace::MercadoLivre => "Mercado Livre",
            Marketplace::Amazon => "Amazon",
            Marketplace::Magalu => "Magazine Luiza",
            Marketplace::Shopee => "Shopee",
        }
    }
}

impl fmt::Display for Marketplace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Marketplace {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Marketplace::ALL
            .into_iter()
            .find(|m| m.key() == s)
            .ok_or_else(|| format!("Unknown marketplace '{}'", s))
    }
}

/// A product's listing on one marketplace. Owned by the caller; only `url`
/// is read and only `price` is written back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketplaceLink {
    pub marketplace: Marketplace,
    pub url: String,
    #[serde(default)]
    pub price: Option<f64>,
}
