use super::*;
use crate::element::{BoundingBox, ImageAnnotations, Label};
use crate::error::{SessionError, VisionError};
use crate::locator::LocatorIndex;
use crate::snapshot::NodeIndex;
use crate::store::InMemoryDedupStore;
use async_trait::async_trait;
use image::{ImageFormat, Rgba, RgbaImage};
use std::collections::HashMap;
use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};

const PAGE: &str = r#"<html><body>
<header class="top"><h1>Shop</h1>
  <nav><a class="link" href="/a">Deals</a><a class="link" href="/b">Help</a></nav>
</header>
<main>
  <img src="hero.png" alt="Hero">
  <p class="intro">Welcome</p>
  <p class="tiny">.</p>
  <p class="hidden">Secret</p>
</main>
</body></html>"#;

/// In-process page over a parsed snapshot with a table of node geometry
struct FakeSession {
    snapshot: DocumentSnapshot,
    geometry: HashMap<NodeIndex, (BoundingBox, bool)>,
    screenshot: Vec<u8>,
    fail_source: bool,
    blind_compare: bool,
}

impl FakeSession {
    fn new(source: &str) -> Self {
        let image = DynamicImage::ImageRgba8(RgbaImage::from_pixel(400, 300, Rgba([255, 255, 255, 255])));
        let mut png = Cursor::new(Vec::new());
        image.write_to(&mut png, ImageFormat::Png).unwrap();
        Self {
            snapshot: DocumentSnapshot::parse("https://shop.example.com/", source),
            geometry: HashMap::new(),
            screenshot: png.into_inner(),
            fail_source: false,
            blind_compare: false,
        }
    }

    async fn place(&mut self, locator: &str, rect: BoundingBox, displayed: bool) {
        for node in self.snapshot.find_all(locator).await.unwrap() {
            self.geometry.insert(node, (rect, displayed));
        }
    }
}

#[async_trait]
impl LocatorIndex for FakeSession {
    type Node = NodeIndex;

    async fn find_all(&self, locator: &str) -> Result<Vec<NodeIndex>, LocatorError> {
        self.snapshot.find_all(locator).await
    }

    async fn same_node(&self, a: &NodeIndex, b: &NodeIndex) -> Result<bool, LocatorError> {
        Ok(!self.blind_compare && a == b)
    }
}

#[async_trait]
impl PageSession for FakeSession {
    async fn current_url(&self) -> Result<String, SessionError> {
        Ok(self.snapshot.url().to_string())
    }

    async fn page_source(&self) -> Result<String, SessionError> {
        if self.fail_source {
            return Err(SessionError::Unavailable("page load blocked".to_string()));
        }
        Ok(self.snapshot.outer_html(self.snapshot.root()))
    }

    async fn screenshot(&self) -> Result<Vec<u8>, SessionError> {
        Ok(self.screenshot.clone())
    }

    async fn viewport(&self) -> Result<Viewport, SessionError> {
        Ok(Viewport::new(400.0, 300.0))
    }

    async fn probe(&self, locator: &str) -> Result<NodeProbe<NodeIndex>, LocatorError> {
        let matches = self.snapshot.find_all(locator).await?;
        let node = *matches
            .first()
            .ok_or_else(|| LocatorError::NotFound(locator.to_string()))?;
        let description = self
            .snapshot
            .describe(node)
            .ok_or_else(|| LocatorError::NotFound(locator.to_string()))?;
        let (rect, displayed) = self
            .geometry
            .get(&node)
            .copied()
            .unwrap_or((BoundingBox::new(10.0, 10.0, 50.0, 20.0), true));
        Ok(NodeProbe {
            node,
            description,
            rect,
            displayed,
        })
    }

    async fn rendered_style(
        &self,
        _node: &NodeIndex,
        _properties: &[String],
    ) -> Result<BTreeMap<String, String>, LocatorError> {
        Ok(BTreeMap::from([("font-size".to_string(), "16px".to_string())]))
    }
}

#[derive(Default)]
struct CountingAnnotator {
    calls: AtomicUsize,
}

#[async_trait]
impl VisionAnnotator for CountingAnnotator {
    async fn annotate(&self, image: &[u8]) -> Result<ImageAnnotations, VisionError> {
        assert!(image::load_from_memory(image).is_ok());
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(ImageAnnotations {
            labels: vec![Label {
                description: "banner".to_string(),
                score: 0.9,
            }],
            ..ImageAnnotations::default()
        })
    }
}

struct RejectingAnnotator;

#[async_trait]
impl VisionAnnotator for RejectingAnnotator {
    async fn annotate(&self, _image: &[u8]) -> Result<ImageAnnotations, VisionError> {
        Err(VisionError::Unsupported("image/png".to_string()))
    }
}

/// Store holding conflicting records for every key
struct ConflictingStore;

#[async_trait]
impl DedupStore for ConflictingStore {
    async fn lookup(&self, _scope: &str, _key: &fingerprint::Checksum) -> Result<Option<Element>, StoreError> {
        Ok(None)
    }

    async fn upsert(&self, _scope: &str, element: Element) -> Result<Element, StoreError> {
        Err(StoreError::Conflict(element.key.to_string()))
    }
}

struct UnavailableStore;

#[async_trait]
impl DedupStore for UnavailableStore {
    async fn lookup(&self, _scope: &str, _key: &fingerprint::Checksum) -> Result<Option<Element>, StoreError> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }

    async fn upsert(&self, _scope: &str, _element: Element) -> Result<Element, StoreError> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }
}

async fn shop_session() -> FakeSession {
    let mut session = FakeSession::new(PAGE);
    session
        .place(r#"//p[contains(@class,"tiny")]"#, BoundingBox::new(5.0, 5.0, 1.0, 1.0), true)
        .await;
    session
        .place(r#"//p[contains(@class,"hidden")]"#, BoundingBox::new(5.0, 5.0, 80.0, 20.0), false)
        .await;
    session
}

#[tokio::test]
async fn test_extracts_every_accepted_element() {
    let session = shop_session().await;
    let annotator = Arc::new(CountingAnnotator::default());
    let extractor = Extractor::new(ExtractorConfig::default(), Arc::new(InMemoryDedupStore::new()))
        .with_annotator(annotator.clone());

    let page = extractor.extract_page(&session, "audit", None).await.unwrap();

    assert_eq!(page.host.as_deref(), Some("shop.example.com"));
    assert!(page.errored.is_empty());
    assert_eq!(page.rejected, 2);

    // header, h1, nav, a, a, main, img, p.intro
    assert_eq!(page.elements.len(), 8);
    let keys: HashSet<_> = page.elements.iter().map(|e| e.key.clone()).collect();
    assert_eq!(keys.len(), page.elements.len());

    for element in &page.elements {
        let matches = session.snapshot.find_all(&element.locator).await.unwrap();
        assert_eq!(matches.len(), 1, "{} is not unique", element.locator);
        assert_eq!(element.foreground_color, "rgb(0,0,0)");
        assert_eq!(element.background_color, "rgb(255,255,255)");
        assert!(element.screenshot_checksum.is_some());
        assert!(!element.selector.is_empty());
    }

    let image = page.elements.iter().find(|e| e.tag == "img").unwrap();
    assert_eq!(image.annotations().unwrap().labels[0].description, "banner");
    assert_eq!(annotator.calls.load(Ordering::SeqCst), 1);

    let nav = page.elements.iter().find(|e| e.tag == "nav").unwrap();
    assert_eq!(nav.classification, crate::element::Classification::Parent);
    let intro = page.elements.iter().find(|e| e.own_text == "Welcome").unwrap();
    assert_eq!(intro.classification, crate::element::Classification::Leaf);
}

#[tokio::test]
async fn test_bad_locators_are_recorded_not_fatal() {
    let session = shop_session().await;
    let extractor = Extractor::new(ExtractorConfig::default(), Arc::new(InMemoryDedupStore::new()));
    let targets = vec![
        "//div[".to_string(),
        "//section".to_string(),
        r#"//p[contains(@class,"intro")]"#.to_string(),
    ];

    let page = extractor
        .extract_page(&session, "audit", Some(&targets))
        .await
        .unwrap();

    assert_eq!(page.elements.len(), 1);
    assert_eq!(page.elements[0].all_text, "Welcome");
    assert_eq!(page.errored.len(), 2);
    assert_eq!(page.errored[0].locator, "//div[");
    assert!(page.errored[0].reason.contains("Invalid locator syntax"));
    assert!(page.errored[1].reason.contains("No node matches"));
}

#[tokio::test]
async fn test_dedup_hit_reuses_stored_record() {
    let session = shop_session().await;
    let store = Arc::new(InMemoryDedupStore::new());
    let annotator = Arc::new(CountingAnnotator::default());
    let extractor = Extractor::new(ExtractorConfig::default(), store.clone())
        .with_annotator(annotator.clone());
    let targets = vec![r#"//main/img"#.to_string()];

    let first = extractor
        .extract_page(&session, "audit", Some(&targets))
        .await
        .unwrap();
    let second = extractor
        .extract_page(&session, "audit", Some(&targets))
        .await
        .unwrap();

    assert_eq!(first.elements, second.elements);
    assert_eq!(annotator.calls.load(Ordering::SeqCst), 1);
    assert_eq!(store.len().await, 1);

    // A different scope does not share records
    extractor
        .extract_page(&session, "other-audit", Some(&targets))
        .await
        .unwrap();
    assert_eq!(annotator.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_identical_markup_is_extracted_once() {
    let session = FakeSession::new(
        "<html><body><ul><li>Same</li><li>Same</li><li>Other</li></ul></body></html>",
    );
    let extractor = Extractor::new(ExtractorConfig::default(), Arc::new(InMemoryDedupStore::new()));

    let page = extractor.extract_page(&session, "audit", None).await.unwrap();
    let items: Vec<_> = page.elements.iter().filter(|e| e.tag == "li").collect();
    assert_eq!(items.len(), 2);
}

#[tokio::test]
async fn test_repeated_blocks_form_a_template() {
    let session = FakeSession::new(
        r#"<html><body>
        <div class="card" id="c1"><h3>Lamp</h3><span>$10</span></div>
        <div class="card" id="c2"><h3>Lamp</h3><span>$10</span></div>
        <footer><p>About</p></footer>
        </body></html>"#,
    );
    let extractor = Extractor::new(ExtractorConfig::default(), Arc::new(InMemoryDedupStore::new()));

    let page = extractor.extract_page(&session, "audit", None).await.unwrap();
    let card = &page.templates[r#"<div class="card"><h3>Lamp</h3><span>$10</span></div>"#];
    assert_eq!(card.members.len(), 2);
    assert_eq!(card.template_type, templates::TemplateType::Molecule);
    for key in &card.members {
        assert!(page.elements.iter().any(|e| &e.key == key));
    }
}

#[tokio::test]
async fn test_store_failure_aborts_the_page() {
    let session = shop_session().await;
    let extractor = Extractor::new(ExtractorConfig::default(), Arc::new(UnavailableStore));

    let result = extractor.extract_page(&session, "audit", None).await;
    assert!(matches!(result, Err(ExtractError::Store(_))));
}

#[tokio::test]
async fn test_session_failure_aborts_the_page() {
    let mut session = shop_session().await;
    session.fail_source = true;
    let extractor = Extractor::new(ExtractorConfig::default(), Arc::new(InMemoryDedupStore::new()));

    let result = extractor.extract_page(&session, "audit", None).await;
    assert!(matches!(
        result,
        Err(ExtractError::Session(SessionError::Unavailable(_)))
    ));
}

#[tokio::test]
async fn test_undecodable_screenshot_is_a_warning() {
    let mut session = shop_session().await;
    session.screenshot = b"not a png".to_vec();
    let extractor = Extractor::new(ExtractorConfig::default(), Arc::new(InMemoryDedupStore::new()));

    let page = extractor.extract_page(&session, "audit", None).await.unwrap();
    assert!(!page.elements.is_empty());
    assert!(page.elements.iter().all(|e| e.screenshot_checksum.is_none()));
    assert!(page.warnings.iter().any(|w| w.contains("Screenshot")));
}

#[tokio::test]
async fn test_ambiguous_locator_is_reported_as_warning() {
    let mut session = FakeSession::new("<html><body><ul><li>a</li><li>b</li></ul></body></html>");
    session.blind_compare = true;
    let extractor = Extractor::new(ExtractorConfig::default(), Arc::new(InMemoryDedupStore::new()));
    let targets = vec!["//ul/li".to_string()];

    let page = extractor
        .extract_page(&session, "audit", Some(&targets))
        .await
        .unwrap();

    assert_eq!(page.elements.len(), 1);
    assert_eq!(page.elements[0].locator, "(//body/ul/li)[1]");
    assert!(page.errored.is_empty());
    assert_eq!(page.warnings.len(), 1);
    assert!(page.warnings[0].contains("matches 2 nodes"), "{}", page.warnings[0]);
}

#[tokio::test]
async fn test_annotation_failure_keeps_image_element() {
    let session = shop_session().await;
    let extractor = Extractor::new(ExtractorConfig::default(), Arc::new(InMemoryDedupStore::new()))
        .with_annotator(Arc::new(RejectingAnnotator));
    let targets = vec![r#"//main/img"#.to_string()];

    let page = extractor
        .extract_page(&session, "audit", Some(&targets))
        .await
        .unwrap();

    assert_eq!(page.elements.len(), 1);
    assert!(page.errored.is_empty());
    let annotations = page.elements[0].annotations().unwrap();
    assert!(annotations.labels.is_empty());
}

#[tokio::test]
async fn test_store_conflict_aborts_the_page() {
    let session = shop_session().await;
    let extractor = Extractor::new(ExtractorConfig::default(), Arc::new(ConflictingStore));
    let targets = vec![r#"//p[contains(@class,"intro")]"#.to_string()];

    let result = extractor.extract_page(&session, "audit", Some(&targets)).await;
    assert!(matches!(result, Err(ExtractError::Store(StoreError::Conflict(_)))));
}
