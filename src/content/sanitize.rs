//! Allow-list HTML sanitizer.
//!
//! Everything that reaches the display surface goes through [`sanitize_html`]
//! after all substitutions. Unknown tags are unwrapped, unknown attributes are
//! dropped, and nothing here ever fails the page.

use lol_html::{doc_comments, element, rewrite_str, RewriteStrSettings};
use tracing::warn;

/// Tags allowed through. `highlight` marks clickable spans.
pub const ALLOWED_TAGS: &[&str] = &[
    "p", "h1", "h2", "h3", "h4", "h5", "h6", "ul", "ol", "li", "a", "strong", "em", "img", "code",
    "pre", "blockquote", "table", "thead", "tbody", "tr", "th", "td", "br", "hr", "sup", "sub",
    "span", "div", "highlight",
    // SVG
    "svg", "path", "line", "rect", "circle", "ellipse", "polyline", "polygon",
    // MathML
    "annotation", "semantics", "math", "mrow", "mi", "mo", "mn", "msup", "msub", "msubsup",
    "mfrac", "mtable", "mtr", "mtd", "mover", "munder", "munderover", "mtext", "merror", "mspace",
    "msqrt", "mroot", "mstyle", "mpadded", "mphantom", "menclose",
];

/// Attributes allowed on any allowed tag, plus `data-*`.
pub const ALLOWED_ATTRIBUTES: &[&str] = &[
    "href", "src", "alt", "class", "id", "style", "loading", "index",
    // SVG
    "viewbox", "d", "fill", "stroke", "stroke-width", "x", "y", "x1", "y1", "x2", "y2", "cx",
    "cy", "r", "rx", "ry", "points", "transform", "width", "height",
    // MathML
    "xmlns", "display", "dir", "aria-hidden", "mathvariant", "stretchy", "fence", "separator",
    "lspace", "rspace", "linethickness", "accent", "accentunder", "columnalign", "encoding",
    "notation", "movablelimits", "largeop", "symmetric", "minsize", "maxsize",
];

/// Disallowed tags whose content is dropped along with them.
const DROP_WITH_CONTENT: &[&str] = &[
    "script", "style", "iframe", "object", "embed", "noscript", "template", "textarea", "title",
    "noembed", "noframes", "xmp", "select", "plaintext",
];

fn attribute_allowed(name: &str) -> bool {
    ALLOWED_ATTRIBUTES.contains(&name)
        || name
            .strip_prefix("data-")
            .is_some_and(|rest| !rest.is_empty())
}

/// Whether a `href`/`src` value may be kept.
fn url_allowed(attribute: &str, value: &str) -> bool {
    // Browsers ignore embedded whitespace and control characters in schemes.
    let compact: String = html_escape::decode_html_entities(value)
        .chars()
        .filter(|c| !c.is_whitespace() && !c.is_control())
        .collect::<String>()
        .to_ascii_lowercase();

    let Some(colon) = compact.find(':') else {
        // Relative reference or fragment
        return true;
    };

    let scheme = &compact[..colon];
    let is_scheme = scheme.starts_with(|c: char| c.is_ascii_alphabetic())
        && scheme
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
    if !is_scheme {
        // The colon sits after a path, query or fragment character.
        return true;
    }

    match scheme {
        "http" | "https" => true,
        "mailto" => attribute == "href",
        "data" => attribute == "src" && compact.starts_with("data:image/"),
        _ => false,
    }
}

/// Sanitize `html` against the allow-list.
pub fn sanitize_html(html: &str) -> String {
    let result = rewrite_str(
        html,
        RewriteStrSettings {
            element_content_handlers: vec![element!("*", |el| {
                let tag = el.tag_name();

                if DROP_WITH_CONTENT.contains(&tag.as_str()) {
                    el.remove();
                    return Ok(());
                }
                if !ALLOWED_TAGS.contains(&tag.as_str()) {
                    el.remove_and_keep_content();
                    return Ok(());
                }

                let attributes: Vec<(String, String)> = el
                    .attributes()
                    .iter()
                    .map(|a| (a.name(), a.value()))
                    .collect();

                for (name, value) in attributes {
                    let lower = name.to_ascii_lowercase();
                    let keep = attribute_allowed(&lower)
                        && (!matches!(lower.as_str(), "href" | "src")
                            || url_allowed(&lower, &value));
                    if !keep {
                        el.remove_attribute(&name);
                    }
                }
                Ok(())
            })],
            document_content_handlers: vec![doc_comments!(|c| {
                c.remove();
                Ok(())
            })],
            ..RewriteStrSettings::default()
        },
    );

    match result {
        Ok(sanitized) => sanitized,
        Err(e) => {
            warn!("HTML rewrite failed, showing content as text: {}", e);
            html_escape::encode_text(html).into_owned()
        }
    }
}
