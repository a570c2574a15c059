//! [`PageSession`] over a fantoccini WebDriver client.

use super::{NodeProbe, PageSession};
use crate::element::BoundingBox;
use crate::error::{LocatorError, SessionError};
use crate::filter::Viewport;
use crate::locator::{LocatorIndex, PathStep};
use crate::markup::text;
use crate::snapshot::NodeDescription;
use async_trait::async_trait;
use fantoccini::elements::Element;
use fantoccini::error::CmdError;
use fantoccini::{Client, ClientBuilder, Locator};
use serde::Deserialize;
use std::collections::BTreeMap;

/// Alternative endpoints tried when the configured WebDriver is unreachable
const FALLBACK_URLS: &[&str] = &[
    "http://localhost:9515", // ChromeDriver default
    "http://localhost:4723", // Appium default
    "http://localhost:9222", // Chrome debug port default
    "http://127.0.0.1:4444",
];

/// Collects everything `NodeDescription` needs in one round trip
const DESCRIBE_SCRIPT: &str = r#"
const el = arguments[0];
const attrs = (node) => {
    const out = {};
    for (const a of node.attributes) { out[a.name] = a.value; }
    return out;
};
const lineage = [];
for (let n = el; n && n.nodeType === 1; n = n.parentElement) {
    lineage.push({ tag: n.tagName.toLowerCase(), attributes: attrs(n) });
}
return {
    tag: el.tagName.toLowerCase(),
    outer_html: el.outerHTML,
    own_text: Array.from(el.childNodes)
        .filter((n) => n.nodeType === 3)
        .map((n) => n.nodeValue),
    all_text: el.innerText || el.textContent || "",
    child_tags: Array.from(el.children).map((c) => c.tagName.toLowerCase()),
    lineage: lineage,
};
"#;

const VIEWPORT_SCRIPT: &str =
    "return [window.innerWidth, window.innerHeight, window.pageXOffset, window.pageYOffset];";

#[derive(Debug, Deserialize)]
struct DescribedNode {
    tag: String,
    outer_html: String,
    #[serde(default)]
    own_text: Vec<String>,
    #[serde(default)]
    all_text: String,
    #[serde(default)]
    child_tags: Vec<String>,
    #[serde(default)]
    lineage: Vec<PathStep>,
}

impl From<DescribedNode> for NodeDescription {
    fn from(node: DescribedNode) -> Self {
        let attributes = node
            .lineage
            .first()
            .map(|step| step.attributes.clone())
            .unwrap_or_default();
        NodeDescription {
            tag: node.tag,
            attributes,
            outer_html: node.outer_html,
            own_text: text::join_fragments(node.own_text.iter().map(String::as_str)),
            all_text: text::normalize_whitespace_in_segment(&node.all_text),
            child_tags: node.child_tags,
            lineage: node.lineage,
        }
    }
}

/// One WebDriver browser session
#[derive(Debug, Clone)]
pub struct WebDriverSession {
    client: Client,
}

impl WebDriverSession {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Connects to `webdriver_url`, falling back to common local endpoints
    pub async fn connect(webdriver_url: &str) -> Result<Self, SessionError> {
        match ClientBuilder::native().connect(webdriver_url).await {
            Ok(client) => {
                ::log::debug!("Connected to WebDriver at {}", webdriver_url);
                return Ok(Self::new(client));
            }
            Err(e) => {
                ::log::error!("Failed to connect to WebDriver at {}: {}", webdriver_url, e);
            }
        }

        for url in FALLBACK_URLS {
            if *url == webdriver_url {
                continue;
            }
            ::log::info!("Trying fallback WebDriver URL: {}", url);
            if let Ok(client) = ClientBuilder::native().connect(url).await {
                ::log::debug!("Connected to fallback WebDriver at {}", url);
                return Ok(Self::new(client));
            }
        }

        ::log::error!(
            "Make sure a WebDriver server is running or set the WEBDRIVER_URL environment variable"
        );
        Err(SessionError::Unavailable(format!(
            "no WebDriver server reachable at {} or any fallback",
            webdriver_url
        )))
    }

    pub async fn navigate(&self, url: &str) -> Result<(), SessionError> {
        self.client.goto(url).await?;
        Ok(())
    }

    pub async fn close(self) -> Result<(), SessionError> {
        self.client.close().await?;
        Ok(())
    }

    async fn describe(&self, element: &Element) -> Result<NodeDescription, LocatorError> {
        let argument =
            serde_json::to_value(element).map_err(|e| LocatorError::Script(e.to_string()))?;
        let value = self
            .client
            .execute(DESCRIBE_SCRIPT, vec![argument])
            .await
            .map_err(locator_error)?;
        let described: DescribedNode =
            serde_json::from_value(value).map_err(|e| LocatorError::Script(e.to_string()))?;
        Ok(described.into())
    }
}

fn locator_error(error: CmdError) -> LocatorError {
    let message = error.to_string();
    if message.contains("invalid selector") {
        LocatorError::InvalidSyntax(message)
    } else {
        LocatorError::Evaluation(message)
    }
}

#[async_trait]
impl LocatorIndex for WebDriverSession {
    type Node = Element;

    async fn find_all(&self, locator: &str) -> Result<Vec<Element>, LocatorError> {
        self.client
            .find_all(Locator::XPath(locator))
            .await
            .map_err(locator_error)
    }

    /// Same tag at the same position
    async fn same_node(&self, a: &Element, b: &Element) -> Result<bool, LocatorError> {
        let a_tag = a.tag_name().await.map_err(locator_error)?;
        let b_tag = b.tag_name().await.map_err(locator_error)?;
        if !a_tag.eq_ignore_ascii_case(&b_tag) {
            return Ok(false);
        }
        let (ax, ay, _, _) = a.rectangle().await.map_err(locator_error)?;
        let (bx, by, _, _) = b.rectangle().await.map_err(locator_error)?;
        Ok(ax == bx && ay == by)
    }
}

#[async_trait]
impl PageSession for WebDriverSession {
    async fn current_url(&self) -> Result<String, SessionError> {
        Ok(self.client.current_url().await?.to_string())
    }

    async fn page_source(&self) -> Result<String, SessionError> {
        Ok(self.client.source().await?)
    }

    async fn screenshot(&self) -> Result<Vec<u8>, SessionError> {
        Ok(self.client.screenshot().await?)
    }

    async fn viewport(&self) -> Result<Viewport, SessionError> {
        let value = self.client.execute(VIEWPORT_SCRIPT, Vec::new()).await?;
        let [width, height, scroll_x, scroll_y]: [f64; 4] = serde_json::from_value(value)
            .map_err(|e| SessionError::Command(format!("unexpected viewport value: {e}")))?;
        Ok(Viewport {
            width,
            height,
            scroll_x,
            scroll_y,
        })
    }

    async fn probe(&self, locator: &str) -> Result<NodeProbe<Element>, LocatorError> {
        let element = self
            .client
            .find(Locator::XPath(locator))
            .await
            .map_err(|e| match locator_error(e) {
                LocatorError::Evaluation(message) if message.contains("no such element") => {
                    LocatorError::NotFound(locator.to_string())
                }
                other => other,
            })?;

        let (x, y, width, height) = element.rectangle().await.map_err(locator_error)?;
        let displayed = element.is_displayed().await.map_err(locator_error)?;
        let description = self.describe(&element).await?;

        Ok(NodeProbe {
            node: element,
            description,
            rect: BoundingBox::new(x, y, width, height),
            displayed,
        })
    }

    async fn rendered_style(
        &self,
        node: &Element,
        properties: &[String],
    ) -> Result<BTreeMap<String, String>, LocatorError> {
        let mut style = BTreeMap::new();
        for property in properties {
            match node.css_value(property).await {
                Ok(value) if !value.is_empty() => {
                    style.insert(property.clone(), value);
                }
                Ok(_) => {}
                Err(e) => {
                    let error = locator_error(e);
                    ::log::debug!("Could not read {}: {}", property, error);
                }
            }
        }
        Ok(style)
    }
}
