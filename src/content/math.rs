//! Rendering of `$$…$$` and `$…$` spans to MathML.

use std::panic::{self, AssertUnwindSafe};
use std::sync::LazyLock;

use latex2mathml::{latex_to_mathml, DisplayStyle};
use regex::{Captures, Regex};
use tracing::debug;

static BLOCK_MATH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\$\$(.+?)\$\$").expect("valid block math pattern"));
static INLINE_MATH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$([^$]+?)\$").expect("valid inline math pattern"));
static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("\u{E000}(\\d+)\u{E001}").expect("valid placeholder pattern"));
static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid whitespace pattern"));

const PARSE_ERROR_MARKER: &str = "[PARSE ERROR";

/// How a math span is laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MathDisplay {
    Block,
    Inline,
}

/// Turns a TeX expression into display markup.
pub trait MathRenderer: Send + Sync {
    fn render(&self, tex: &str, display: MathDisplay) -> Result<String, String>;
}

/// MathML output via `latex2mathml`.
#[derive(Debug, Default, Clone, Copy)]
pub struct MathMlRenderer;

impl MathRenderer for MathMlRenderer {
    fn render(&self, tex: &str, display: MathDisplay) -> Result<String, String> {
        let style = match display {
            MathDisplay::Block => DisplayStyle::Block,
            MathDisplay::Inline => DisplayStyle::Inline,
        };
        // Renderer panics count as render failures.
        let markup = panic::catch_unwind(AssertUnwindSafe(|| latex_to_mathml(tex, style)))
            .map_err(|_| "renderer panicked".to_string())?
            .map_err(|e| e.to_string())?;
        // Some malformed input renders "successfully" with the error inlined.
        if markup.contains(PARSE_ERROR_MARKER) {
            return Err(format!("parse error in {:?}", tex));
        }
        Ok(markup)
    }
}

/// Undo upstream entity-encoding inside a math span and collapse whitespace.
pub fn normalize_tex(raw: &str) -> String {
    let decoded = raw
        .trim()
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
        .replace("&quot;", "\"")
        .replace("&#39;", "'");
    WHITESPACE.replace_all(&decoded, " ").into_owned()
}

/// Unescaped braces must nest and close.
fn braces_balanced(tex: &str) -> bool {
    let mut depth: i32 = 0;
    let mut escaped = false;
    for c in tex.chars() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth < 0 {
                    return false;
                }
            }
            _ => {}
        }
    }
    depth == 0
}

fn render_span(
    renderer: &dyn MathRenderer,
    original: &str,
    tex: &str,
    display: MathDisplay,
) -> String {
    let tex = normalize_tex(tex);
    if tex.is_empty() || !braces_balanced(&tex) {
        debug!("Leaving unbalanced math span as text: {}", original);
        return original.to_string();
    }
    match renderer.render(&tex, display) {
        Ok(markup) => markup,
        Err(e) => {
            debug!("Math render failed ({}), keeping {}", e, original);
            original.to_string()
        }
    }
}

/// Render every delimited math span in `content`.
///
/// Block spans are rendered first and parked behind placeholders so the
/// inline pass never sees their `$$` delimiters or their output. Spans that
/// cannot be rendered are kept verbatim, delimiters included.
pub fn render_math(content: &str, renderer: &dyn MathRenderer) -> String {
    let mut blocks: Vec<String> = Vec::new();

    let parked = BLOCK_MATH.replace_all(content, |caps: &Captures| {
        let rendered = render_span(renderer, &caps[0], &caps[1], MathDisplay::Block);
        blocks.push(rendered);
        format!("\u{E000}{}\u{E001}", blocks.len() - 1)
    });

    let inline = INLINE_MATH.replace_all(&parked, |caps: &Captures| {
        render_span(renderer, &caps[0], &caps[1], MathDisplay::Inline)
    });

    PLACEHOLDER
        .replace_all(&inline, |caps: &Captures| {
            caps[1]
                .parse::<usize>()
                .ok()
                .and_then(|i| blocks.get(i).cloned())
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Wraps the TeX it is given so tests can see exactly what was rendered.
    struct Echo;

    impl MathRenderer for Echo {
        fn render(&self, tex: &str, display: MathDisplay) -> Result<String, String> {
            if tex.contains("\\fail") {
                return Err("unsupported".to_string());
            }
            Ok(format!("<math display=\"{:?}\">{}</math>", display, tex))
        }
    }

    #[test]
    fn test_normalize_tex_decodes_entities_and_whitespace() {
        assert_eq!(
            normalize_tex("  a &lt; b\n\t&amp;&amp; c &gt; &#39;d&#39; &quot;e&quot; "),
            "a < b && c > 'd' \"e\""
        );
    }

    #[test]
    fn test_block_before_inline() {
        let out = render_math("before $$x + y$$ mid $z$ after", &Echo);
        assert_eq!(
            out,
            "before <math display=\"Block\">x + y</math> mid <math display=\"Inline\">z</math> after"
        );
    }

    #[test]
    fn test_multiline_block_collapses_whitespace() {
        let out = render_math("$$\n  a =\n  b\n$$", &Echo);
        assert_eq!(out, "<math display=\"Block\">a = b</math>");
    }

    #[test]
    fn test_malformed_inline_kept_verbatim() {
        let input = r"see $\frac{1}{$ here";
        assert_eq!(render_math(input, &Echo), input);
        assert_eq!(render_math(input, &MathMlRenderer), input);
    }

    #[test]
    fn test_malformed_block_not_resplit_by_inline_pass() {
        let input = r"$$\frac{1}{$$ and $y$";
        let out = render_math(input, &Echo);
        assert!(out.starts_with(r"$$\frac{1}{$$"));
        assert!(out.ends_with("<math display=\"Inline\">y</math>"));
    }

    #[test]
    fn test_renderer_error_keeps_original() {
        let input = r"$\fail{x}$";
        assert_eq!(render_math(input, &Echo), input);
    }

    #[test]
    fn test_no_math_is_untouched() {
        let input = "<p>Plain text, no delimiters.</p>";
        assert_eq!(render_math(input, &Echo), input);
    }

    #[test]
    fn test_mathml_renderer_produces_math_element() {
        let out = render_math(r"$\alpha^2$", &MathMlRenderer);
        assert!(out.contains("<math"));
        assert!(!out.contains('$'));
    }

    #[test]
    fn test_mathml_parse_errors_kept_verbatim() {
        for input in [r"$x^$", r"$a_$", r"$\sqrt$", r"$\unknowncmd{x}$", r"$$\frac{a}$$"] {
            let out = render_math(input, &MathMlRenderer);
            assert_eq!(out, input);
        }
        let out = render_math(r"ok $x^2$ bad $x^$", &MathMlRenderer);
        assert!(out.starts_with("ok <math"));
        assert!(out.ends_with(" bad $x^$"));
    }

    #[test]
    fn test_mathml_renderer_rejects_error_markup() {
        let err = MathMlRenderer.render("x^", MathDisplay::Inline).unwrap_err();
        assert!(err.contains("x^"));
        assert!(MathMlRenderer.render("x^2", MathDisplay::Inline).is_ok());
    }

    #[test]
    fn test_braces_balanced() {
        assert!(braces_balanced(r"\frac{1}{2}"));
        assert!(braces_balanced(r"\{ x \}"));
        assert!(!braces_balanced(r"\frac{1}{"));
        assert!(!braces_balanced("}{"));
    }
}
