//! Offline headline source.

use crate::provider::{DateRange, HeadlineProvider, ProviderError};

/// Default template; `{ticker}` is replaced with the symbol.
pub const DEFAULT_TEMPLATE: &str = "{ticker} just posted strong quantum advancement news";

/// Produces one fixed, templated headline per ticker regardless of date.
#[derive(Debug, Clone)]
pub struct TemplateHeadlineProvider {
    template: String,
}

impl TemplateHeadlineProvider {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    pub fn render(&self, ticker: &str) -> String {
        self.template.replace("{ticker}", ticker)
    }
}

impl Default for TemplateHeadlineProvider {
    fn default() -> Self {
        Self::new(DEFAULT_TEMPLATE)
    }
}

impl HeadlineProvider for TemplateHeadlineProvider {
    fn name(&self) -> &str {
        "template"
    }

    fn headline(&self, ticker: &str, _range: &DateRange) -> Result<Option<String>, ProviderError> {
        Ok(Some(self.render(ticker)))
    }
}
