use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use crate::error::ScrapingError;
use crate::parser::price::PriceFormat;

/// Where a candidate's text comes from on the matched element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextSource {
    Text,
    Attribute(&'static str),
}

/// One link of a price fallback chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceSelector {
    pub css: &'static str,
    pub source: TextSource,
    pub format: PriceFormat,
}

impl PriceSelector {
    pub const fn text(css: &'static str) -> Self {
        Self {
            css,
            source: TextSource::Text,
            format: PriceFormat::Localized,
        }
    }

    pub const fn attribute(css: &'static str, name: &'static str) -> Self {
        Self {
            css,
            source: TextSource::Attribute(name),
            format: PriceFormat::Decimal,
        }
    }
}

/// Marks a product as unavailable when present.
///
/// With no keywords, presence of the element is enough. Otherwise its text
/// must contain one of them (case-insensitive).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnavailableIndicator {
    pub css: &'static str,
    pub keywords: &'static [&'static str],
}

impl UnavailableIndicator {
    pub const fn present(css: &'static str) -> Self {
        Self { css, keywords: &[] }
    }

    pub const fn containing(css: &'static str, keywords: &'static [&'static str]) -> Self {
        Self { css, keywords }
    }
}

pub fn compile(css: &str) -> Result<Selector, ScrapingError> {
    Selector::parse(css).map_err(|e| ScrapingError::InvalidSelector {
        selector: css.to_string(),
        reason: e.to_string(),
    })
}

#[derive(Debug, Clone)]
pub struct CompiledPriceSelector {
    pub spec: PriceSelector,
    selector: Selector,
}

#[derive(Debug, Clone)]
pub struct CompiledIndicator {
    pub spec: UnavailableIndicator,
    selector: Selector,
}

/// Price text pulled from a document, with the chain position that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceMatch {
    pub position: usize,
    pub text: String,
    pub format: PriceFormat,
}

impl CompiledPriceSelector {
    pub fn new(spec: PriceSelector) -> Result<Self, ScrapingError> {
        Ok(Self {
            spec,
            selector: compile(spec.css)?,
        })
    }

    fn extract(&self, document: &Html) -> Option<String> {
        let element = document.select(&self.selector).next()?;
        let text = match self.spec.source {
            TextSource::Text => element_text(&element),
            TextSource::Attribute(name) => element.value().attr(name)?.trim().to_string(),
        };
        (!text.is_empty()).then_some(text)
    }
}

impl CompiledIndicator {
    pub fn new(spec: UnavailableIndicator) -> Result<Self, ScrapingError> {
        Ok(Self {
            spec,
            selector: compile(spec.css)?,
        })
    }

    fn fires(&self, document: &Html) -> bool {
        let mut elements = document.select(&self.selector).peekable();
        if self.spec.keywords.is_empty() {
            return elements.peek().is_some();
        }

        elements.any(|element| {
            let text = element_text(&element).to_lowercase();
            self.spec
                .keywords
                .iter()
                .any(|keyword| text.contains(&keyword.to_lowercase()))
        })
    }
}

/// Walks the chain in order and returns the first candidate with non-empty text.
pub fn first_price_text(document: &Html, chain: &[CompiledPriceSelector]) -> Option<PriceMatch> {
    chain.iter().enumerate().find_map(|(position, candidate)| {
        let text = candidate.extract(document)?;
        debug!("Price selector #{} '{}' matched: {:?}", position, candidate.spec.css, text);
        Some(PriceMatch {
            position,
            text,
            format: candidate.spec.format,
        })
    })
}

pub fn any_unavailable(document: &Html, indicators: &[CompiledIndicator]) -> bool {
    indicators.iter().any(|indicator| {
        let fired = indicator.fires(document);
        if fired {
            debug!("Unavailable indicator '{}' present", indicator.spec.css);
        }
        fired
    })
}

fn element_text(element: &ElementRef) -> String {
    element.text().collect::<String>().trim().to_string()
}
