//! Attachment of URLs and bibliographic citations to dataset records.

pub mod citations;
pub mod urls;

pub use citations::CitationAttacher;
pub use urls::reattach_urls;
