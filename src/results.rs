use crate::element::Element;
use crate::filter::Viewport;
use crate::fingerprint::Checksum;
use crate::templates::TemplateRegistry;
use serde::{Deserialize, Serialize};

/// A locator that could not be turned into an element
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErroredLocator {
    pub locator: String,
    pub reason: String,
}

impl ErroredLocator {
    pub fn new(locator: impl Into<String>, reason: impl ToString) -> Self {
        Self {
            locator: locator.into(),
            reason: reason.to_string(),
        }
    }
}

/// Everything one extraction pass produced for a page
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageExtraction {
    /// URL of the page
    pub url: String,

    /// Host of the page (if the URL has one)
    pub host: Option<String>,

    /// Checksum of the raw page source
    pub source_checksum: Checksum,

    /// Checksum of the encoded viewport screenshot
    pub screenshot_checksum: Checksum,

    pub viewport: Viewport,

    /// Canonical elements in extraction order, one per identity key
    pub elements: Vec<Element>,

    /// Templates keyed by template string
    pub templates: TemplateRegistry,

    /// Locators skipped because they could not be resolved or built
    pub errored: Vec<ErroredLocator>,

    /// Non-fatal issues, such as locators whose uniqueness was not confirmed
    pub warnings: Vec<String>,

    /// Number of resolved nodes the geometry filter rejected
    pub rejected: usize,
}

/// Outcome of one page in a crawl
#[derive(Debug, Serialize)]
pub struct PageReport {
    pub url: String,
    #[serde(flatten)]
    pub outcome: PageOutcome,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PageOutcome {
    Extracted(PageExtraction),
    Failed { error: String },
}

impl PageReport {
    pub fn extracted(url: impl Into<String>, extraction: PageExtraction) -> Self {
        Self {
            url: url.into(),
            outcome: PageOutcome::Extracted(extraction),
        }
    }

    pub fn failed(url: impl Into<String>, error: impl ToString) -> Self {
        Self {
            url: url.into(),
            outcome: PageOutcome::Failed {
                error: error.to_string(),
            },
        }
    }

    pub fn extraction(&self) -> Option<&PageExtraction> {
        match &self.outcome {
            PageOutcome::Extracted(extraction) => Some(extraction),
            PageOutcome::Failed { .. } => None,
        }
    }
}
