//! Routing plan construction and downstream configuration output.

pub mod builder;
pub mod engine;
pub mod render;
pub mod validate;
pub mod writer;

pub use builder::{build_plan, AggregateGroup, Redirect, RoutingBuilder, RoutingPlan, RoutingUnit};
pub use engine::{ConfigPreview, GeneratedConfig, RoutingEngine};
pub use render::{RenderedDocuments, RoutingDocument, UnifiedDocument};
pub use validate::{validate_document, validate_plan, DocumentKind, DocumentValidation};
pub use writer::{ConfigWriter, WriteReport};
