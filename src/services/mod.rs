//! Service layer for the reading session.
//!
//! Session logic lives here, separate from any surface. The CLI drives it
//! today; a UI would drive the same services.

pub mod extraction;
pub mod viewer;

pub use extraction::{validate_url, ExtractionClient, PageChange};
pub use viewer::{Intent, RenderedPage, Screen, Viewer};
