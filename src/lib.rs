#![allow(clippy::too_many_arguments)]

// Re-export modules
pub mod builder;
pub mod config;
pub mod crawl;
pub mod element;
pub mod error;
pub mod extract;
pub mod filter;
pub mod fingerprint;
pub mod locator;
pub mod markup;
pub mod results;
pub mod session;
pub mod snapshot;
pub mod store;
pub mod templates;
pub mod vision;

// Re-export commonly used types for convenience
pub use config::ExtractorConfig;
pub use element::{BoundingBox, Classification, Element, ElementKind, ImageAnnotations};
pub use error::{ExtractError, LocatorError, SessionError, StoreError, VisionError};
pub use extract::Extractor;
pub use filter::{GeometryFilter, Viewport};
pub use fingerprint::Checksum;
pub use locator::{LocatorIndex, generate, to_css_selector};
pub use results::{ErroredLocator, PageExtraction, PageReport};
pub use session::{PageSession, WebDriverSession};
pub use snapshot::DocumentSnapshot;
pub use store::{DedupStore, InMemoryDedupStore};
pub use templates::{Template, TemplateRegistry, TemplateType};
pub use vision::VisionAnnotator;
