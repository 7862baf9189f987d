//! Page content transformation: image substitution, math rendering and
//! sanitization, in that order.
//!
//! The sanitizer always runs last so that substituted URLs and rendered math
//! pass the same allow-list as the upstream markup.

mod images;
mod math;
mod regions;
mod sanitize;

pub use images::substitute_images;
pub use math::{normalize_tex, render_math, MathDisplay, MathMlRenderer, MathRenderer};
pub use regions::{regions, Region};
pub use sanitize::{sanitize_html, ALLOWED_ATTRIBUTES, ALLOWED_TAGS};

use std::sync::Arc;

use crate::models::PageImage;

/// Turns one page of raw markup into display-safe markup.
#[derive(Clone)]
pub struct ContentTransformer {
    renderer: Arc<dyn MathRenderer>,
}

impl Default for ContentTransformer {
    fn default() -> Self {
        Self::new(Arc::new(MathMlRenderer))
    }
}

impl ContentTransformer {
    pub fn new(renderer: Arc<dyn MathRenderer>) -> Self {
        Self { renderer }
    }

    pub fn transform(&self, raw: &str, images: &[PageImage]) -> String {
        let with_images = substitute_images(raw, images);
        let with_math = render_math(&with_images, self.renderer.as_ref());
        sanitize_html(&with_math)
    }
}

/// [`ContentTransformer::transform`] with the default MathML renderer.
pub fn transform(raw: &str, images: &[PageImage]) -> String {
    ContentTransformer::default().transform(raw, images)
}
