//! Domain models for extracted documents and their related resources.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An external article or video linked to a highlight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    pub title: String,
    pub link: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snippet: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
}

/// The `videos` field of a highlight.
///
/// The resource search backend sometimes returns its raw search-parameters
/// object instead of a list; that shape is kept opaque and reads as no videos.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VideoResources {
    List(Vec<Resource>),
    Unrecognized(serde_json::Value),
}

impl Default for VideoResources {
    fn default() -> Self {
        VideoResources::List(Vec::new())
    }
}

impl VideoResources {
    pub fn as_slice(&self) -> &[Resource] {
        match self {
            VideoResources::List(videos) => videos,
            VideoResources::Unrecognized(_) => &[],
        }
    }
}

/// Resources attached to a single highlight index.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HighlightResources {
    #[serde(default)]
    pub articles: Vec<Resource>,
    #[serde(default)]
    pub videos: VideoResources,
}

/// Resolved article and video lists for the resource panel.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedResources {
    pub articles: Vec<Resource>,
    pub videos: Vec<Resource>,
}

impl ResolvedResources {
    pub fn is_empty(&self) -> bool {
        self.articles.is_empty() && self.videos.is_empty()
    }
}

/// An image referenced from page content by id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageImage {
    pub id: String,
    pub url: String,
}

/// One page of an extracted document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionPayload {
    pub total_pages: u32,
    /// 1-based.
    pub current_page: u32,
    pub page_content: String,
    #[serde(default)]
    pub images: Vec<PageImage>,
    #[serde(default)]
    pub resources: BTreeMap<String, HighlightResources>,
    /// Set on payloads produced by a page change rather than a fresh extraction.
    #[serde(default)]
    pub is_page_change_result: bool,
}

impl ExtractionPayload {
    /// Whether `page` is a valid page number for this document.
    pub fn contains_page(&self, page: u32) -> bool {
        page >= 1 && page <= self.total_pages
    }

    /// Resolve the resources for a highlight index, defaulting to empty lists.
    pub fn resources_for(&self, index: &str) -> ResolvedResources {
        match self.resources.get(index) {
            Some(found) => ResolvedResources {
                articles: found.articles.clone(),
                videos: found.videos.as_slice().to_vec(),
            },
            None => ResolvedResources::default(),
        }
    }

    /// Replace the page-scoped parts of this payload with a freshly fetched page.
    pub fn merge_page(&mut self, page: ExtractionPayload) {
        self.current_page = page.current_page;
        self.page_content = page.page_content;
        self.images = page.images;
        self.resources = page.resources;
        self.is_page_change_result = true;
    }
}

/// The single persisted document session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub source_url: String,
    pub payload: ExtractionPayload,
    pub saved_at: DateTime<Utc>,
}

impl CacheEntry {
    pub fn new(source_url: impl Into<String>, payload: ExtractionPayload) -> Self {
        Self {
            source_url: source_url.into(),
            payload,
            saved_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload_with(resources: BTreeMap<String, HighlightResources>) -> ExtractionPayload {
        ExtractionPayload {
            total_pages: 3,
            current_page: 1,
            page_content: "# Title".to_string(),
            images: vec![],
            resources,
            is_page_change_result: false,
        }
    }

    fn resource(title: &str) -> Resource {
        Resource {
            title: title.to_string(),
            link: format!("https://example.com/{title}"),
            snippet: None,
            image_url: None,
            duration: None,
        }
    }

    #[test]
    fn test_missing_highlight_resolves_empty() {
        let payload = payload_with(BTreeMap::new());
        let resolved = payload.resources_for("7");
        assert!(resolved.articles.is_empty());
        assert!(resolved.videos.is_empty());
    }

    #[test]
    fn test_search_parameters_videos_read_as_empty() {
        let json = serde_json::json!({
            "articles": [{"title": "a", "link": "https://example.com/a"}],
            "videos": {"searchParameters": {"q": "attention"}, "credits": 1}
        });
        let resources: HighlightResources = serde_json::from_value(json).unwrap();
        assert!(matches!(resources.videos, VideoResources::Unrecognized(_)));

        let mut map = BTreeMap::new();
        map.insert("0".to_string(), resources);
        let resolved = payload_with(map).resources_for("0");
        assert_eq!(resolved.articles.len(), 1);
        assert!(resolved.videos.is_empty());
    }

    #[test]
    fn test_video_list_is_kept() {
        let mut map = BTreeMap::new();
        map.insert(
            "2".to_string(),
            HighlightResources {
                articles: vec![],
                videos: VideoResources::List(vec![resource("talk")]),
            },
        );
        let resolved = payload_with(map).resources_for("2");
        assert_eq!(resolved.videos, vec![resource("talk")]);
    }

    #[test]
    fn test_merge_page_keeps_total_pages() {
        let mut payload = payload_with(BTreeMap::new());
        let next = ExtractionPayload {
            total_pages: 99,
            current_page: 2,
            page_content: "page two".to_string(),
            images: vec![PageImage {
                id: "img-0.jpeg".to_string(),
                url: "https://cdn.example.com/0.jpeg".to_string(),
            }],
            resources: BTreeMap::new(),
            is_page_change_result: false,
        };
        payload.merge_page(next);
        assert_eq!(payload.total_pages, 3);
        assert_eq!(payload.current_page, 2);
        assert_eq!(payload.page_content, "page two");
        assert_eq!(payload.images.len(), 1);
        assert!(payload.is_page_change_result);
    }
}
