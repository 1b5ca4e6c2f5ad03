use serde::{Deserialize, Serialize};

use crate::error::ScrapingError;

/// How the raw text of a price candidate is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceFormat {
    /// Visible storefront text, Brazilian locale: `R$ 1.234,56`.
    Localized,
    /// Structured data such as `<meta itemprop="price" content="1234.56">`.
    Decimal,
}

impl PriceFormat {
    pub fn parse(self, text: &str) -> f64 {
        match self {
            PriceFormat::Localized => parse_price(text),
            PriceFormat::Decimal => parse_decimal_price(text),
        }
    }
}

/// Converts localized price text into a number.
///
/// Everything except digits, `.` and `,` is stripped; `.` is a thousands
/// separator and `,` the decimal separator. Input without any digits yields
/// `NaN`, which callers must treat as "no price".
pub fn parse_price(text: &str) -> f64 {
    let normalized: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == ',')
        .map(|c| if c == ',' { '.' } else { c })
        .collect();

    normalized.parse::<f64>().unwrap_or(f64::NAN)
}

/// Like [`parse_price`] but for machine-formatted decimals where `.` is the
/// decimal separator and there is no grouping.
pub fn parse_decimal_price(text: &str) -> f64 {
    let normalized: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();

    normalized.parse::<f64>().unwrap_or(f64::NAN)
}

/// Rejects values that cannot be a purchase price.
///
/// `NaN` (no digits) and zero are both treated as a failed extraction rather
/// than a free product.
pub fn validate_price(raw: &str, value: f64) -> Result<f64, ScrapingError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(ScrapingError::InvalidPrice(raw.trim().to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_localized_prices() {
        assert_eq!(parse_price("1.234,56"), 1234.56);
        assert_eq!(parse_price("R$ 99,90"), 99.90);
        assert_eq!(parse_price("R$\u{a0}1.299,00"), 1299.00);
        assert_eq!(parse_price("1.234.567,89"), 1234567.89);
        assert_eq!(parse_price("349"), 349.0);
    }

    #[test]
    fn test_parse_amazon_whole_part() {
        // `.a-price-whole` renders as "1.299," with the cents in a sibling
        assert_eq!(parse_price("1.299,"), 1299.0);
    }

    #[test]
    fn test_parse_without_digits_is_nan() {
        assert!(parse_price("").is_nan());
        assert!(parse_price("R$").is_nan());
        assert!(parse_price("Indisponível").is_nan());
    }

    #[test]
    fn test_parse_decimal_prices() {
        assert_eq!(parse_decimal_price("1299.5"), 1299.5);
        assert_eq!(parse_decimal_price("89"), 89.0);
        assert!(parse_decimal_price("").is_nan());
        assert_eq!(PriceFormat::Decimal.parse("1234.56"), 1234.56);
        assert_eq!(PriceFormat::Localized.parse("1234.56"), 123456.0);
    }

    #[test]
    fn test_validate_price() {
        assert_eq!(validate_price("R$ 10,00", 10.0).unwrap(), 10.0);
        assert!(matches!(
            validate_price("  ", f64::NAN),
            Err(ScrapingError::InvalidPrice(ref text)) if text.is_empty()
        ));
        assert!(validate_price("0,00", 0.0).is_err());
    }
}
