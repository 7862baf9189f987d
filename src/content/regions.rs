//! Addressable interactive regions of sanitized page markup.

use scraper::{Html, Selector};

/// A clickable region the viewer binds an action to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Region {
    /// A `<highlight index="…">` span.
    Highlight { index: String, text: String },
    /// An `<img>` with a source.
    Image { src: String, alt: Option<String> },
}

/// List highlight and image regions in document order.
pub fn regions(html: &str) -> Vec<Region> {
    let Ok(selector) = Selector::parse("highlight[index], img[src]") else {
        return Vec::new();
    };

    let fragment = Html::parse_fragment(html);
    fragment
        .select(&selector)
        .filter_map(|el| {
            let value = el.value();
            match value.name() {
                "highlight" => {
                    let index = value.attr("index")?.trim();
                    if index.is_empty() {
                        return None;
                    }
                    let text = el.text().collect::<String>();
                    Some(Region::Highlight {
                        index: index.to_string(),
                        text: text.split_whitespace().collect::<Vec<_>>().join(" "),
                    })
                }
                "img" => {
                    let src = value.attr("src")?;
                    if src.is_empty() {
                        return None;
                    }
                    Some(Region::Image {
                        src: src.to_string(),
                        alt: value.attr("alt").map(str::to_string),
                    })
                }
                _ => None,
            }
        })
        .collect()
}
