//! Viewer state: resource panel, full-screen image and page rendering.
//!
//! Clicks on rendered content arrive as [`Intent`]s, either directly or via
//! [`Region::intent`] for the regions found in the sanitized markup.

use crate::content::{regions, ContentTransformer, Region};
use crate::models::{ExtractionPayload, ResolvedResources};

/// User actions the viewer reacts to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    HighlightClicked(String),
    ImageClicked(String),
    /// A click anywhere outside the open resource panel.
    ClickOutsidePanel,
    ClosePanel,
    CloseImage,
    ImageBackdropClicked,
}

impl Region {
    /// The intent a click on this region dispatches.
    pub fn intent(&self) -> Intent {
        match self {
            Region::Highlight { index, .. } => Intent::HighlightClicked(index.clone()),
            Region::Image { src, .. } => Intent::ImageClicked(src.clone()),
        }
    }
}

/// Which top-level view to show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Screen {
    /// URL entry, with the error of the last failed extraction if any.
    Home { error: Option<String> },
    Loading,
    /// A document is open; `notice` carries a non-blocking error such as a
    /// failed page change.
    Reader { notice: Option<String> },
}

impl Screen {
    /// A document that has loaded once keeps the reader on screen; errors
    /// after that are notices, not a full error view.
    pub fn select(has_document: bool, loading: bool, last_error: Option<String>) -> Self {
        match (has_document, loading) {
            (true, _) => Screen::Reader { notice: last_error },
            (false, true) => Screen::Loading,
            (false, false) => Screen::Home { error: last_error },
        }
    }
}

/// One page ready for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPage {
    pub page: u32,
    pub total_pages: u32,
    pub html: String,
    pub regions: Vec<Region>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Viewer {
    selected_highlight: Option<String>,
    maximized_image: Option<String>,
    rendered_page: Option<u32>,
}

impl Viewer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selected_highlight(&self) -> Option<&str> {
        self.selected_highlight.as_deref()
    }

    pub fn maximized_image(&self) -> Option<&str> {
        self.maximized_image.as_deref()
    }

    pub fn dispatch(&mut self, intent: Intent) {
        match intent {
            Intent::HighlightClicked(index) => self.selected_highlight = Some(index),
            Intent::ClickOutsidePanel | Intent::ClosePanel => self.selected_highlight = None,
            Intent::ImageClicked(src) => self.maximized_image = Some(src),
            Intent::CloseImage | Intent::ImageBackdropClicked => self.maximized_image = None,
        }
    }

    /// Resources for the selected highlight; `None` while the panel is closed.
    pub fn panel(&self, payload: &ExtractionPayload) -> Option<ResolvedResources> {
        self.selected_highlight
            .as_deref()
            .map(|index| payload.resources_for(index))
    }

    /// Page content is blurred while the resource panel is open.
    pub fn content_blurred(&self) -> bool {
        self.selected_highlight.is_some()
    }

    /// Highlight indices and image sources belong to one page.
    fn page_changed(&mut self) {
        self.selected_highlight = None;
        self.maximized_image = None;
    }

    /// Render the payload's page. Moving to another page closes the panel
    /// and the maximized image.
    pub fn render(&mut self, transformer: &ContentTransformer, payload: &ExtractionPayload) -> RenderedPage {
        if self.rendered_page.replace(payload.current_page) != Some(payload.current_page) {
            self.page_changed();
        }
        let html = transformer.transform(&payload.page_content, &payload.images);
        let regions = regions(&html);
        RenderedPage {
            page: payload.current_page,
            total_pages: payload.total_pages,
            html,
            regions,
        }
    }
}
