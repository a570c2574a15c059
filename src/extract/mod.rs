//! Per-page extraction engine.
//!
//! One pass over one live page: capture source, screenshot and viewport,
//! resolve every target locator in turn, filter, dedup, build and store the
//! accepted elements, then cluster the Parent elements into templates.
//! Element failures are recorded and skipped; session and store failures
//! abort the page.

#[cfg(test)]
mod tests;

use crate::builder::{self, ElementParts};
use crate::config::ExtractorConfig;
use crate::element::{Element, ElementKind};
use crate::error::{ExtractError, LocatorError, StoreError};
use crate::filter::{GeometryFilter, Rejection, Viewport};
use crate::fingerprint;
use crate::locator::{self, discover};
use crate::results::{ErroredLocator, PageExtraction};
use crate::session::{NodeProbe, PageSession};
use crate::snapshot::DocumentSnapshot;
use crate::store::DedupStore;
use crate::templates;
use crate::vision::VisionAnnotator;
use image::DynamicImage;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

enum ElementOutcome {
    Extracted(Element),
    Rejected(Rejection),
}

enum ElementFailure {
    Locator(LocatorError),
    Store(StoreError),
}

impl From<LocatorError> for ElementFailure {
    fn from(error: LocatorError) -> Self {
        ElementFailure::Locator(error)
    }
}

impl From<StoreError> for ElementFailure {
    fn from(error: StoreError) -> Self {
        ElementFailure::Store(error)
    }
}

/// Extraction engine with its collaborators injected
#[derive(Clone)]
pub struct Extractor {
    config: ExtractorConfig,
    filter: GeometryFilter,
    store: Arc<dyn DedupStore>,
    annotator: Option<Arc<dyn VisionAnnotator>>,
}

impl Extractor {
    pub fn new(config: ExtractorConfig, store: Arc<dyn DedupStore>) -> Self {
        let filter = GeometryFilter::new(&config);
        Self {
            config,
            filter,
            store,
            annotator: None,
        }
    }

    /// Enables vision annotation of newly built image elements
    pub fn with_annotator(mut self, annotator: Arc<dyn VisionAnnotator>) -> Self {
        self.annotator = Some(annotator);
        self
    }

    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Extracts the current page of `session` into `scope`
    ///
    /// Without `targets`, every extractable element of the page source is
    /// targeted.
    pub async fn extract_page<S>(
        &self,
        session: &S,
        scope: &str,
        targets: Option<&[String]>,
    ) -> Result<PageExtraction, ExtractError>
    where
        S: PageSession + ?Sized,
    {
        let url = session.current_url().await?;
        let source = session.page_source().await?;
        let screenshot_bytes = session.screenshot().await?;
        let viewport = session.viewport().await?;
        ::log::info!("Extracting elements from {}", url);

        let snapshot = DocumentSnapshot::parse(&url, &source);
        let screenshot_checksum = fingerprint::screenshot_checksum(&screenshot_bytes);
        let mut warnings = Vec::new();

        let screenshot = if self.config.capture_element_screenshots {
            match image::load_from_memory(&screenshot_bytes) {
                Ok(image) => Some(image),
                Err(e) => {
                    ::log::warn!("Could not decode screenshot of {}: {}", url, e);
                    warnings.push(format!("Screenshot could not be decoded: {e}"));
                    None
                }
            }
        } else {
            None
        };

        let targets = match targets {
            Some(targets) => targets.to_vec(),
            None => discover::candidate_locators(&snapshot, &self.config).await,
        };

        let mut elements = Vec::new();
        let mut seen = HashSet::new();
        let mut errored = Vec::new();
        let mut rejected = 0;

        for target in &targets {
            let outcome = self
                .extract_element(session, scope, target, &viewport, screenshot.as_ref(), &mut warnings)
                .await;
            match outcome {
                Ok(ElementOutcome::Extracted(element)) => {
                    if seen.insert(element.key.clone()) {
                        elements.push(element);
                    } else {
                        ::log::debug!("{} repeats markup already extracted", target);
                    }
                }
                Ok(ElementOutcome::Rejected(reason)) => {
                    ::log::trace!("Rejected {}: {}", target, reason);
                    rejected += 1;
                }
                Err(ElementFailure::Locator(e)) => {
                    ::log::warn!("Skipping {}: {}", target, e);
                    errored.push(ErroredLocator::new(target.as_str(), e));
                }
                Err(ElementFailure::Store(e)) => {
                    ::log::error!("Dedup store failed while extracting {}: {}", url, e);
                    return Err(e.into());
                }
            }
        }

        let threshold = self.config.similarity_threshold;
        let min_members = self.config.min_template_members;
        let clustered = elements.clone();
        let templates = tokio::task::spawn_blocking(move || {
            templates::build_registry(&clustered, threshold, min_members)
        })
        .await?;

        ::log::info!(
            "Extracted {} elements and {} templates from {} ({} errored, {} rejected)",
            elements.len(),
            templates.len(),
            url,
            errored.len(),
            rejected
        );

        Ok(PageExtraction {
            url,
            host: snapshot.host().map(|h| h.to_string()),
            source_checksum: snapshot.checksum().clone(),
            screenshot_checksum,
            viewport,
            elements,
            templates,
            errored,
            warnings,
            rejected,
        })
    }

    async fn extract_element<S>(
        &self,
        session: &S,
        scope: &str,
        target: &str,
        viewport: &Viewport,
        screenshot: Option<&DynamicImage>,
        warnings: &mut Vec<String>,
    ) -> Result<ElementOutcome, ElementFailure>
    where
        S: PageSession + ?Sized,
    {
        let probe = session.probe(target).await?;
        let classification = match self.filter.evaluate(
            &probe.description.tag,
            probe.displayed,
            &probe.rect,
            viewport,
            &probe.description.child_tags,
        ) {
            Ok(classification) => classification,
            Err(reason) => return Ok(ElementOutcome::Rejected(reason)),
        };

        let key = fingerprint::element_checksum(&probe.description.outer_html);
        if let Some(stored) = self.store.lookup(scope, &key).await? {
            ::log::debug!("Dedup hit for {} ({})", target, key);
            return Ok(ElementOutcome::Extracted(stored));
        }

        let generated = locator::generate(
            session,
            &probe.node,
            &probe.description.lineage,
            &self.config.locator_attributes,
        )
        .await?;
        if let Some(warning) = generated.warning {
            warnings.push(warning);
        }

        let rendered_style = match session
            .rendered_style(&probe.node, &self.config.rendered_style_properties)
            .await
        {
            Ok(style) => style,
            Err(e) => {
                ::log::warn!("No rendered style for {}: {}", target, e);
                BTreeMap::new()
            }
        };

        let NodeProbe {
            description,
            rect,
            displayed,
            ..
        } = probe;
        let mut element = builder::build(
            ElementParts {
                locator: generated.xpath,
                tag: description.tag,
                attributes: description.attributes,
                rendered_style,
                rect,
                own_text: description.own_text,
                all_text: description.all_text,
                outer_html: description.outer_html,
                visible: displayed,
                classification,
            },
            &self.config,
        );

        if let Some(crop) = screenshot.and_then(|image| builder::crop_screenshot(image, &rect, viewport)) {
            builder::attach_screenshot(&mut element, &crop);
            if element.is_image() {
                self.annotate(&mut element, &crop).await;
            }
        }

        let stored = self.store.upsert(scope, element).await?;
        Ok(ElementOutcome::Extracted(stored))
    }

    async fn annotate(&self, element: &mut Element, image: &[u8]) {
        let Some(annotator) = &self.annotator else {
            return;
        };
        match annotator.annotate(image).await {
            Ok(annotations) => element.kind = ElementKind::Image(annotations),
            Err(e) => ::log::warn!("Vision annotation failed for {}: {}", element.locator, e),
        }
    }
}
