//! Math rendering: split a rendered HTML blob at a fixed, ordered table of
//! delimiter pairs and typeset every math segment through KaTeX, leaving the
//! surrounding text untouched.
//!
//! KaTeX rendering is only compiled when the `math` feature is enabled; the
//! stub returns the "nothing to replace" sentinel so callers keep the blob
//! as-is.

use std::collections::HashMap;

/// One recognized math delimiter pair. Table order matters: a left marker
/// that is a prefix of another must come first.
#[derive(Debug, Clone, Copy)]
pub struct Delimiter {
    pub left: &'static str,
    pub right: &'static str,
    pub display: bool,
}

impl Delimiter {
    const fn new(left: &'static str, right: &'static str, display: bool) -> Self {
        Self {
            left,
            right,
            display,
        }
    }
}

/// Options for [`render_math`]. All fields have working defaults.
pub struct MathOptions {
    /// Ordered delimiter table.
    pub delimiters: Vec<Delimiter>,
    /// Tag names inside which delimiter scanning must not occur.
    pub ignored_tags: Vec<&'static str>,
    /// CSS class names with the same effect as `ignored_tags`.
    pub ignored_classes: Vec<String>,
    /// Macros shared across all math segments of one call.
    pub macros: HashMap<String, String>,
    /// Invoked (not thrown) when a segment fails to typeset; the segment is
    /// replaced with an inline error marker and processing continues.
    pub on_error: Option<Box<dyn Fn(&str, &str)>>,
}

impl Default for MathOptions {
    fn default() -> Self {
        Self {
            delimiters: vec![
                Delimiter::new("$$", "$$", true),
                Delimiter::new("\\(", "\\)", false),
                // Single `$` is not registered: it would capture plain dollar
                // amounts in prose. `$$` must stay ahead of any `$` variant.
                Delimiter::new("\\begin{equation}", "\\end{equation}", true),
                Delimiter::new("\\begin{align}", "\\end{align}", true),
                Delimiter::new("\\begin{alignat}", "\\end{alignat}", true),
                Delimiter::new("\\begin{gather}", "\\end{gather}", true),
                Delimiter::new("\\begin{CD}", "\\end{CD}", true),
                Delimiter::new("\\[", "\\]", true),
            ],
            ignored_tags: vec![
                "script", "noscript", "style", "textarea", "pre", "code", "option",
            ],
            ignored_classes: Vec::new(),
            macros: HashMap::new(),
            on_error: None,
        }
    }
}

#[derive(Debug, PartialEq)]
enum Segment {
    Text(String),
    Math { body: String, display: bool },
}

/// Render every delimiter-marked math span in `text` to KaTeX markup and
/// rejoin all segments with newline separators.
///
/// Returns `None` when no delimiters are found — the caller can then skip
/// rewriting entirely instead of taking a copy of the input.
#[cfg(feature = "math")]
pub fn render_math(text: &str, opts: &MathOptions) -> Option<String> {
    let segments = split_at_delimiters(text, opts);
    if !segments
        .iter()
        .any(|s| matches!(s, Segment::Math { .. }))
    {
        return None;
    }
    let rendered: Vec<String> = segments
        .iter()
        .map(|segment| match segment {
            Segment::Text(t) => t.clone(),
            Segment::Math { body, display } => render_segment(body, *display, opts),
        })
        .collect();
    Some(rendered.join("\n"))
}

/// Stub when the math feature is not enabled — nothing to replace.
#[cfg(not(feature = "math"))]
pub fn render_math(_text: &str, _opts: &MathOptions) -> Option<String> {
    None
}

/// Split `text` into plain and math segments at the configured delimiters.
/// Scanning skips the contents of ignored tags and ignored-class elements.
#[cfg(feature = "math")]
fn split_at_delimiters(text: &str, opts: &MathOptions) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut plain_start = 0;
    let mut i = 0;

    while i < text.len() {
        if text.as_bytes()[i] == b'<' {
            if let Some(skip) = ignored_element_len(&text[i..], opts) {
                i += skip;
            } else {
                i += 1;
            }
            continue;
        }

        let mut matched = false;
        for d in &opts.delimiters {
            if !text[i..].starts_with(d.left) {
                continue;
            }
            let body_start = i + d.left.len();
            if let Some(rel) = text[body_start..].find(d.right) {
                if i > plain_start {
                    segments.push(Segment::Text(text[plain_start..i].to_string()));
                }
                // AMS environments keep their delimiters: KaTeX parses the
                // \begin...\end wrapper itself.
                let body = if d.left.starts_with("\\begin{") {
                    &text[i..body_start + rel + d.right.len()]
                } else {
                    &text[body_start..body_start + rel]
                };
                segments.push(Segment::Math {
                    body: body.to_string(),
                    display: d.display,
                });
                i = body_start + rel + d.right.len();
                plain_start = i;
                matched = true;
            }
            // First left marker in table order wins, matched or not.
            break;
        }
        if !matched {
            i += text[i..].chars().next().map_or(1, char::len_utf8);
        }
    }

    if plain_start < text.len() {
        segments.push(Segment::Text(text[plain_start..].to_string()));
    }
    segments
}

/// If `html` (starting at `<`) opens an element whose tag name or class is
/// ignored, return the byte length up to and including its closing tag.
#[cfg(feature = "math")]
fn ignored_element_len(html: &str, opts: &MathOptions) -> Option<usize> {
    let rest = &html[1..];
    if rest.starts_with('/') || rest.starts_with('!') {
        return None;
    }
    let name: String = rest
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric() || *c == '-')
        .collect();
    if name.is_empty() {
        return None;
    }
    let tag_end = html.find('>')?;
    let open_tag = &html[..=tag_end];

    let by_tag = opts
        .ignored_tags
        .iter()
        .any(|t| t.eq_ignore_ascii_case(&name));
    let by_class = !opts.ignored_classes.is_empty()
        && super::images::extract_attr(open_tag, "class")
            .map(|classes| {
                classes
                    .split_whitespace()
                    .any(|c| opts.ignored_classes.iter().any(|ic| ic == c))
            })
            .unwrap_or(false);
    if !by_tag && !by_class {
        return None;
    }

    let close = format!("</{name}");
    match html[tag_end..].find(&close) {
        Some(pos) => {
            let close_start = tag_end + pos;
            match html[close_start..].find('>') {
                Some(end) => Some(close_start + end + 1),
                None => Some(html.len()),
            }
        }
        // Unclosed ignored element swallows the rest of the blob.
        None => Some(html.len()),
    }
}

#[cfg(feature = "math")]
fn render_segment(expr: &str, display: bool, opts: &MathOptions) -> String {
    let katex_opts = match katex::Opts::builder()
        .display_mode(display)
        .output_type(katex::OutputType::HtmlAndMathml)
        .macros(opts.macros.clone())
        .trust(true)
        .build()
    {
        Ok(o) => o,
        Err(e) => {
            let message = e.to_string();
            report_error(opts, expr, &message);
            return error_marker(expr, &message);
        }
    };
    match katex::render_with_opts(expr, &katex_opts) {
        Ok(html) => html,
        Err(e) => {
            let message = e.to_string();
            report_error(opts, expr, &message);
            error_marker(expr, &message)
        }
    }
}

#[cfg(feature = "math")]
fn report_error(opts: &MathOptions, expr: &str, message: &str) {
    match &opts.on_error {
        Some(callback) => callback(expr, message),
        None => tracing::error!(expr, error = message, "math segment failed to typeset"),
    }
}

/// Inline error marker carrying the verbatim source, mirroring KaTeX's own
/// error-recovery output.
#[cfg(feature = "math")]
fn error_marker(expr: &str, message: &str) -> String {
    format!(
        "<span class=\"katex-error\" title=\"{}\">{}</span>",
        escape_html(message),
        escape_html(expr)
    )
}

#[cfg(feature = "math")]
fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
