//! Browser/session collaborator.
//!
//! A [`PageSession`] is one live page: it hands out the raw source, a
//! screenshot and the scrolled viewport, and resolves structural locators to
//! live nodes. WebDriver allows one command at a time per session, so the
//! engine drives a session strictly sequentially.

pub mod webdriver;

use crate::element::BoundingBox;
use crate::error::{LocatorError, SessionError};
use crate::filter::Viewport;
use crate::locator::LocatorIndex;
use crate::snapshot::NodeDescription;
use async_trait::async_trait;
use std::collections::BTreeMap;

pub use webdriver::WebDriverSession;

/// A locator resolved to one live node, with what the filter and builder need
#[derive(Debug, Clone)]
pub struct NodeProbe<N> {
    pub node: N,
    pub description: NodeDescription,
    /// Page-relative bounding box
    pub rect: BoundingBox,
    pub displayed: bool,
}

#[async_trait]
pub trait PageSession: LocatorIndex {
    async fn current_url(&self) -> Result<String, SessionError>;

    async fn page_source(&self) -> Result<String, SessionError>;

    /// Encoded (PNG) screenshot of the current viewport
    async fn screenshot(&self) -> Result<Vec<u8>, SessionError>;

    async fn viewport(&self) -> Result<Viewport, SessionError>;

    /// Resolves `locator` to its first matching node and describes it
    async fn probe(&self, locator: &str) -> Result<NodeProbe<Self::Node>, LocatorError>;

    /// Computed values of `properties` for `node`; properties that cannot be
    /// read are left out
    async fn rendered_style(
        &self,
        node: &Self::Node,
        properties: &[String],
    ) -> Result<BTreeMap<String, String>, LocatorError>;
}
