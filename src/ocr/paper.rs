//! Helpers over OCR markdown: inline images, reading time, outline and
//! captions.

use std::sync::LazyLock;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use regex::{NoExpand, Regex};

use super::{OcrImage, OcrPage};

pub const WORDS_PER_MINUTE: usize = 200;

const DEFAULT_IMAGE_MIME: &str = "image/jpeg";

static HEADING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^(#{1,6})[ \t]+(.+?)[ \t]*$").expect("valid heading pattern")
});
static TITLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^#[ \t]+(.+?)[ \t]*$").expect("valid title pattern"));
static ABSTRACT_HEADING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^##[ \t]+Abstract\s+").expect("valid abstract pattern")
});
static FIGURE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Figure\s+\d+:[ \t]+([^\n]+)").expect("valid figure caption pattern")
});
static TABLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Table\s+\d+:[ \t]+([^\n]+)").expect("valid table caption pattern")
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TocEntry {
    pub title: String,
    pub level: u8,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageMetadata {
    pub title: Option<String>,
    pub r#abstract: Option<String>,
    pub has_images: bool,
    pub reading_time_minutes: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptionKind {
    Figure,
    Table,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caption {
    pub kind: CaptionKind,
    pub caption: String,
    /// 0-based position in the page list.
    pub page_index: usize,
}

/// `src` value for an OCR image: the data URI as given, or one built from
/// raw base64 with the MIME type sniffed from its magic bytes.
pub fn image_data_uri(image_base64: &str) -> String {
    let trimmed = image_base64.trim();
    if trimmed.starts_with("data:") {
        return trimmed.to_string();
    }
    let mime = STANDARD
        .decode(trimmed)
        .ok()
        .and_then(|bytes| infer::get(&bytes))
        .map(|kind| kind.mime_type())
        .filter(|mime| mime.starts_with("image/"))
        .unwrap_or(DEFAULT_IMAGE_MIME);
    format!("data:{};base64,{}", mime, trimmed)
}

fn image_block(image: &OcrImage, data: &str) -> String {
    let id = html_escape::encode_double_quoted_attribute(&image.id);
    let src = html_escape::encode_double_quoted_attribute(data);
    format!(
        "\n<div class=\"paper-figure\">\n  <img src=\"{}\" alt=\"{}\" loading=\"lazy\" style=\"max-width: {}px; max-height: {}px; object-fit: contain;\" />\n</div>",
        src,
        id,
        image.width(),
        image.height()
    )
}

/// Replace `![…](id)` references with inline image blocks.
///
/// Images without base64 data are left as references.
pub fn process_markdown(markdown: &str, images: &[OcrImage]) -> String {
    let mut processed = markdown.to_string();
    for image in images {
        let Some(data) = image.image_base64.as_deref() else {
            continue;
        };
        let Ok(pattern) = Regex::new(&format!(r"!\[[^\]]*\]\({}\)", regex::escape(&image.id)))
        else {
            continue;
        };
        let block = image_block(image, &image_data_uri(data));
        processed = pattern.replace_all(&processed, NoExpand(&block)).into_owned();
    }
    processed
}

/// Minutes to read `markdown` at 200 words per minute, rounded up.
pub fn reading_time(markdown: &str) -> usize {
    markdown.split_whitespace().count().div_ceil(WORDS_PER_MINUTE)
}

/// ATX headings across all pages, in order.
pub fn table_of_contents(pages: &[OcrPage]) -> Vec<TocEntry> {
    pages
        .iter()
        .flat_map(|page| HEADING.captures_iter(&page.markdown))
        .map(|caps| TocEntry {
            title: caps[2].trim().to_string(),
            level: caps[1].len() as u8,
        })
        .collect()
}

pub fn page_metadata(page: &OcrPage) -> PageMetadata {
    let title = TITLE.captures(&page.markdown).map(|c| c[1].to_string());

    let r#abstract = ABSTRACT_HEADING.find(&page.markdown).and_then(|m| {
        let rest = &page.markdown[m.end()..];
        let end = rest.find("##").unwrap_or(rest.len());
        let text = rest[..end].trim();
        (!text.is_empty()).then(|| text.to_string())
    });

    PageMetadata {
        title,
        r#abstract,
        has_images: !page.images.is_empty(),
        reading_time_minutes: reading_time(&page.markdown),
    }
}

/// `Figure N: …` and `Table N: …` captions, figures before tables per page.
pub fn figures_and_tables(pages: &[OcrPage]) -> Vec<Caption> {
    let mut items = Vec::new();
    for (page_index, page) in pages.iter().enumerate() {
        for (kind, re) in [(CaptionKind::Figure, &*FIGURE), (CaptionKind::Table, &*TABLE)] {
            items.extend(re.captures_iter(&page.markdown).map(|c| Caption {
                kind,
                caption: c[1].trim().to_string(),
                page_index,
            }));
        }
    }
    items
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(markdown: &str, images: Vec<OcrImage>) -> OcrPage {
        OcrPage {
            index: 0,
            markdown: markdown.to_string(),
            images,
            dimensions: None,
        }
    }

    fn image(id: &str, data: Option<&str>) -> OcrImage {
        OcrImage {
            id: id.to_string(),
            top_left_x: 0,
            top_left_y: 0,
            bottom_right_x: 120,
            bottom_right_y: 80,
            image_base64: data.map(str::to_string),
        }
    }

    #[test]
    fn test_data_uri_sniffs_png() {
        // 1x1 PNG signature prefix
        let png = STANDARD.encode([0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0]);
        assert!(image_data_uri(&png).starts_with("data:image/png;base64,"));
        assert!(image_data_uri("not base64!").starts_with("data:image/jpeg;base64,"));
        assert_eq!(
            image_data_uri("data:image/gif;base64,R0lG"),
            "data:image/gif;base64,R0lG"
        );
    }

    #[test]
    fn test_process_markdown_inlines_images() {
        let md = "Intro\n\n![img-0.jpeg](img-0.jpeg)\n\n![other](img-1.jpeg)";
        let out = process_markdown(
            md,
            &[
                image("img-0.jpeg", Some("data:image/jpeg;base64,/9j/")),
                image("img-1.jpeg", None),
            ],
        );
        assert!(out.contains(r#"src="data:image/jpeg;base64,/9j/""#));
        assert!(out.contains("max-width: 120px; max-height: 80px"));
        assert!(!out.contains("![img-0.jpeg]"));
        assert!(out.contains("![other](img-1.jpeg)"));
    }

    #[test]
    fn test_reading_time_rounds_up() {
        assert_eq!(reading_time(""), 0);
        assert_eq!(reading_time("one"), 1);
        assert_eq!(reading_time(&"word ".repeat(200)), 1);
        assert_eq!(reading_time(&"word ".repeat(201)), 2);
    }

    #[test]
    fn test_table_of_contents() {
        let pages = vec![
            page("# Title\n\nText\n## Abstract\nx", vec![]),
            page("### 3.1 Scaled Dot-Product Attention\n#nope", vec![]),
        ];
        assert_eq!(
            table_of_contents(&pages),
            vec![
                TocEntry { title: "Title".to_string(), level: 1 },
                TocEntry { title: "Abstract".to_string(), level: 2 },
                TocEntry { title: "3.1 Scaled Dot-Product Attention".to_string(), level: 3 },
            ]
        );
    }

    #[test]
    fn test_page_metadata() {
        let p = page(
            "# Attention Is All You Need\n\n## Abstract\nThe dominant sequence models.\n\n## 1 Introduction\nRNNs.",
            vec![image("img-0.jpeg", None)],
        );
        let meta = page_metadata(&p);
        assert_eq!(meta.title.as_deref(), Some("Attention Is All You Need"));
        assert_eq!(meta.r#abstract.as_deref(), Some("The dominant sequence models."));
        assert!(meta.has_images);
        assert_eq!(meta.reading_time_minutes, 1);

        let meta = page_metadata(&page("plain text", vec![]));
        assert!(meta.title.is_none());
        assert!(meta.r#abstract.is_none());
        assert!(!meta.has_images);
    }

    #[test]
    fn test_figures_and_tables() {
        let pages = vec![
            page("Figure 1: The Transformer architecture.\nTable 1: Complexity per layer.", vec![]),
            page("see Figure 2:  Attention heads\n", vec![]),
        ];
        let items = figures_and_tables(&pages);
        assert_eq!(items.len(), 3);
        assert_eq!(items[0].kind, CaptionKind::Figure);
        assert_eq!(items[0].caption, "The Transformer architecture.");
        assert_eq!(items[1].kind, CaptionKind::Table);
        assert_eq!(items[1].page_index, 0);
        assert_eq!(items[2].caption, "Attention heads");
        assert_eq!(items[2].page_index, 1);
    }
}
