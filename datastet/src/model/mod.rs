//! Data model shared by the pipeline stages.

mod attributes;
mod biblio;
mod component;
mod dataset;
mod document;
mod offsets;

pub use attributes::{ContextAttributes, RoleAxis, RoleDecision};
pub use biblio::{BiblioComponent, BiblioItem};
pub use component::{Component, ComponentId, ComponentType, normalize_raw_form};
pub use dataset::{DEFAULT_CONFIDENCE, Dataset, MentionId};
pub use document::{
    AnnotationType, BoundingBox, Document, DocumentSequence, PdfAnnotation, Token, UrlReference,
    bounding_boxes,
};
pub use offsets::{OffsetSpan, byte_to_char, floor_char_boundary, overlaps_any};
