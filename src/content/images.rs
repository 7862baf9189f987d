//! Substitution of image placeholders with resolved URLs.

use regex::{Captures, NoExpand, Regex};

use crate::models::PageImage;

/// Replace every placeholder that names a known image id with its URL.
///
/// Two placeholder forms are recognised: a `src` attribute whose whole value
/// is the id (backend HTML) and a markdown image reference `![alt](id)`
/// (raw OCR markdown). Unknown ids are left as they are.
pub fn substitute_images(content: &str, images: &[PageImage]) -> String {
    let mut out = content.to_string();

    for image in images {
        if image.id.is_empty() {
            continue;
        }
        let id = regex::escape(&image.id);
        let url = html_escape::encode_double_quoted_attribute(&image.url);

        if let Ok(src) = Regex::new(&format!(r#"src=["']{}["']"#, id)) {
            let replacement = format!(r#"src="{}""#, url);
            out = src.replace_all(&out, NoExpand(&replacement)).into_owned();
        }

        if let Ok(markdown) = Regex::new(&format!(r"!\[([^\]]*)\]\({}\)", id)) {
            out = markdown
                .replace_all(&out, |caps: &Captures| {
                    format!(
                        r#"<img src="{}" alt="{}">"#,
                        url,
                        html_escape::encode_double_quoted_attribute(&caps[1])
                    )
                })
                .into_owned();
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image(id: &str, url: &str) -> PageImage {
        PageImage {
            id: id.to_string(),
            url: url.to_string(),
        }
    }

    #[test]
    fn test_src_attribute_substitution() {
        let html = r#"<p><img src="img-0.jpeg" alt="fig"></p><img src='img-1.jpeg'>"#;
        let out = substitute_images(
            html,
            &[
                image("img-0.jpeg", "https://cdn.example.com/0.jpeg"),
                image("img-1.jpeg", "https://cdn.example.com/1.jpeg"),
            ],
        );
        assert_eq!(
            out,
            r#"<p><img src="https://cdn.example.com/0.jpeg" alt="fig"></p><img src="https://cdn.example.com/1.jpeg">"#
        );
    }

    #[test]
    fn test_markdown_reference_substitution() {
        let md = "Intro\n\n![Figure 1](img-0.jpeg)\n";
        let out = substitute_images(md, &[image("img-0.jpeg", "https://cdn.example.com/0.jpeg")]);
        assert_eq!(
            out,
            "Intro\n\n<img src=\"https://cdn.example.com/0.jpeg\" alt=\"Figure 1\">\n"
        );
    }

    #[test]
    fn test_unknown_placeholder_left_alone() {
        let html = r#"<img src="img-9.jpeg">"#;
        let out = substitute_images(html, &[image("img-0.jpeg", "https://cdn.example.com/0.jpeg")]);
        assert_eq!(out, html);
        assert_eq!(substitute_images(html, &[]), html);
    }

    #[test]
    fn test_ids_are_matched_literally() {
        // The dot must not match arbitrary characters.
        let html = r#"<img src="img-0xjpeg">"#;
        let out = substitute_images(html, &[image("img-0.jpeg", "https://cdn.example.com/0.jpeg")]);
        assert_eq!(out, html);
    }

    #[test]
    fn test_url_is_attribute_escaped() {
        let html = r#"<img src="a">"#;
        let out = substitute_images(html, &[image("a", r#"https://x.example/"onerror="1"#)]);
        assert!(!out.contains(r#""onerror=""#));
        assert!(out.contains("&quot;"));
    }

    #[test]
    fn test_dollar_in_url_not_expanded() {
        let html = r#"<img src="a">"#;
        let out = substitute_images(html, &[image("a", "https://x.example/$1.png")]);
        assert_eq!(out, r#"<img src="https://x.example/$1.png">"#);
    }

    #[test]
    fn test_substitution_is_idempotent() {
        let images = [image("img-0.jpeg", "https://cdn.example.com/0.jpeg")];
        let once = substitute_images(r#"<img src="img-0.jpeg">"#, &images);
        assert_eq!(substitute_images(&once, &images), once);
    }
}
