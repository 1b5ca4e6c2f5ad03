pub mod price;
pub mod selectors;

pub use price::{parse_decimal_price, parse_price, validate_price, PriceFormat};
pub use selectors::{
    any_unavailable, first_price_text, CompiledIndicator, CompiledPriceSelector, PriceMatch,
    PriceSelector, TextSource, UnavailableIndicator,
};
