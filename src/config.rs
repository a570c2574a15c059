use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Configuration for the element extraction engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractorConfig {
    /// URL for the WebDriver instance
    #[serde(default = "default_webdriver_url")]
    pub webdriver_url: String,

    /// Maximum number of pages extracted concurrently (one session each)
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,

    /// Upper bound on navigation plus extraction for a single page
    #[serde(default = "default_page_load_timeout_secs")]
    pub page_load_timeout_secs: u64,

    /// Normalized edit distance below which two template strings are merged
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f64,

    /// Templates with fewer members than this are dropped
    #[serde(default = "default_min_template_members")]
    pub min_template_members: usize,

    /// Attributes eligible for locator predicates, in priority order
    #[serde(default = "default_locator_attributes")]
    pub locator_attributes: Vec<String>,

    /// Structural tags never extracted as elements
    #[serde(default = "default_excluded_tags")]
    pub excluded_tags: Vec<String>,

    /// Tags built as image elements
    #[serde(default = "default_image_tags")]
    pub image_tags: Vec<String>,

    /// Computed style properties captured for each element
    #[serde(default = "default_rendered_style_properties")]
    pub rendered_style_properties: Vec<String>,

    /// Whether elements outside the scrolled viewport are rejected
    #[serde(default = "default_true")]
    pub require_in_viewport: bool,

    /// Whether a PNG crop of each element is taken from the page screenshot
    #[serde(default = "default_true")]
    pub capture_element_screenshots: bool,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            webdriver_url: default_webdriver_url(),
            max_concurrency: default_max_concurrency(),
            page_load_timeout_secs: default_page_load_timeout_secs(),
            similarity_threshold: default_similarity_threshold(),
            min_template_members: default_min_template_members(),
            locator_attributes: default_locator_attributes(),
            excluded_tags: default_excluded_tags(),
            image_tags: default_image_tags(),
            rendered_style_properties: default_rendered_style_properties(),
            require_in_viewport: true,
            capture_element_screenshots: true,
        }
    }
}

impl ExtractorConfig {
    /// Load configuration from a file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn Error>> {
        let mut file = File::open(path)?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;

        Self::from_json(&contents)
    }

    /// Load configuration from a JSON string
    pub fn from_json(json: &str) -> Result<Self, Box<dyn Error>> {
        let config: Self = serde_json::from_str(json)?;
        if !(0.0..=1.0).contains(&config.similarity_threshold) {
            return Err(format!(
                "similarity_threshold must be within [0, 1], got {}",
                config.similarity_threshold
            )
            .into());
        }
        Ok(config)
    }

    /// Apply the `WEBDRIVER_URL` environment override, if set
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(webdriver_url) = std::env::var("WEBDRIVER_URL") {
            if !webdriver_url.is_empty() {
                self.webdriver_url = webdriver_url;
            }
        }
        self
    }

    /// Whether `tag` belongs to the structural exclusion set
    pub fn is_excluded_tag(&self, tag: &str) -> bool {
        self.excluded_tags.iter().any(|t| t.eq_ignore_ascii_case(tag))
    }

    /// Whether `tag` is built as an image element
    pub fn is_image_tag(&self, tag: &str) -> bool {
        self.image_tags.iter().any(|t| t.eq_ignore_ascii_case(tag))
    }
}

fn default_webdriver_url() -> String {
    "http://localhost:4444".to_string()
}

fn default_max_concurrency() -> usize {
    4
}

fn default_page_load_timeout_secs() -> u64 {
    45
}

/// Empirically tuned; kept configurable rather than derived.
fn default_similarity_threshold() -> f64 {
    0.025
}

fn default_min_template_members() -> usize {
    1
}

fn default_true() -> bool {
    true
}

fn default_locator_attributes() -> Vec<String> {
    ["class", "id", "name", "title"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_excluded_tags() -> Vec<String> {
    [
        "head", "link", "script", "style", "meta", "base", "iframe", "noscript", "svg", "path",
        "g", "polygon", "polyline", "use", "template", "audio", "br", "em", "body",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_image_tags() -> Vec<String> {
    vec!["img".to_string()]
}

fn default_rendered_style_properties() -> Vec<String> {
    [
        "color",
        "background-color",
        "font-family",
        "font-size",
        "font-weight",
        "line-height",
        "text-align",
        "text-decoration",
        "margin",
        "padding",
        "border",
        "display",
        "opacity",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}
