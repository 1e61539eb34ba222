//! Asset rewriting for image and video nodes: resolve relative paths against
//! the configured asset host and wrap images in a responsive
//! `<figure>`/`<picture>` shell.

use crate::error::{NoteError, Result};

/// Loading mode for an image, decided by its position in the document:
/// the first image-like node loads eagerly, every later one lazily.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Loading {
    Eager,
    Lazy,
}

/// A rewritten asset node: the replacement HTML and, for images, the
/// resolved absolute URL of the (first) image, used for cover extraction.
#[derive(Debug)]
pub struct RewrittenAsset {
    pub html: String,
    pub src: Option<String>,
}

/// Join a possibly-relative asset path to the asset host.
/// Already-absolute URLs pass through unchanged.
pub fn resolve_url(src: &str, asset_host: &str) -> String {
    if src.contains("://") {
        return src.to_string();
    }
    format!(
        "{}/{}",
        asset_host.trim_end_matches('/'),
        src.trim_start_matches('/')
    )
}

/// Rewrite a native Markdown image node into a block-level
/// `<figure><picture>` fragment pointing at the absolute asset URL.
pub fn image_node(dest: &str, loading: Loading, asset_host: &str) -> Result<RewrittenAsset> {
    if dest.is_empty() {
        return Err(NoteError::InvalidAsset(
            "image node has no destination".into(),
        ));
    }
    let url = resolve_url(dest, asset_host);
    let lazy_attr = match loading {
        Loading::Lazy => " loading=\"lazy\"",
        Loading::Eager => "",
    };
    let html = format!(
        "<figure><picture><source srcset=\"{url}\"><img{lazy_attr} src=\"{url}\" alt=\"\"></picture></figure>"
    );
    Ok(RewrittenAsset {
        html,
        src: Some(url),
    })
}

/// Rewrite every `<img>` tag inside a raw HTML block: resolve `src` against
/// the asset host, add `loading="lazy"` in lazy mode, and wrap the image in a
/// `<picture><source srcset="...">` shell. Only the first top-level element
/// of the fragment is kept after rewriting.
pub fn image_in_html_block(
    html: &str,
    loading: Loading,
    asset_host: &str,
) -> Result<RewrittenAsset> {
    let mut result = String::with_capacity(html.len() + 128);
    let mut remaining = html;
    let mut first_src: Option<String> = None;

    while let Some(img_start) = find_tag(remaining, "img") {
        result.push_str(&remaining[..img_start]);

        let after = &remaining[img_start..];
        let Some(img_end) = after.find('>') else {
            // Malformed tag, copy as-is
            result.push_str(after);
            remaining = "";
            break;
        };
        let img_tag = &after[..=img_end];

        let src = extract_attr(img_tag, "src").ok_or_else(|| {
            NoteError::InvalidAsset(format!("<img> has no src attribute: {img_tag}"))
        })?;
        let abs = resolve_url(&src, asset_host);

        let mut new_tag = replace_attr(img_tag, "src", &abs);
        if loading == Loading::Lazy {
            new_tag = add_lazy_to_tag(&new_tag);
        }
        result.push_str(&format!(
            "<picture><source srcset=\"{abs}\">{new_tag}</picture>"
        ));
        if first_src.is_none() {
            first_src = Some(abs);
        }

        remaining = &after[img_end + 1..];
    }
    result.push_str(remaining);

    Ok(RewrittenAsset {
        html: first_top_level_element(&result).to_string(),
        src: first_src,
    })
}

/// Rewrite every `<source>` tag inside a raw HTML video block, resolving
/// `src` against the asset host. Only the first top-level element of the
/// fragment is kept after rewriting.
pub fn video_in_html_block(html: &str, asset_host: &str) -> Result<RewrittenAsset> {
    let mut result = String::with_capacity(html.len());
    let mut remaining = html;

    while let Some(tag_start) = find_tag(remaining, "source") {
        result.push_str(&remaining[..tag_start]);

        let after = &remaining[tag_start..];
        let Some(tag_end) = after.find('>') else {
            result.push_str(after);
            remaining = "";
            break;
        };
        let source_tag = &after[..=tag_end];

        let src = extract_attr(source_tag, "src").ok_or_else(|| {
            NoteError::InvalidAsset(format!("<source> has no src attribute: {source_tag}"))
        })?;
        let abs = resolve_url(&src, asset_host);
        result.push_str(&replace_attr(source_tag, "src", &abs));

        remaining = &after[tag_end + 1..];
    }
    result.push_str(remaining);

    Ok(RewrittenAsset {
        html: first_top_level_element(&result).to_string(),
        src: None,
    })
}

/// Find the start of the next `<name ...>` tag, rejecting longer tag names
/// that merely share the prefix (`<source>` vs `<sources>`).
fn find_tag(html: &str, name: &str) -> Option<usize> {
    let needle = format!("<{name}");
    let mut offset = 0;
    while let Some(pos) = html[offset..].find(&needle) {
        let start = offset + pos;
        let boundary = html[start + needle.len()..].chars().next();
        match boundary {
            Some(c) if c.is_ascii_whitespace() || c == '>' || c == '/' => return Some(start),
            None => return Some(start),
            _ => offset = start + needle.len(),
        }
    }
    None
}

pub(crate) fn extract_attr(tag: &str, attr_name: &str) -> Option<String> {
    let search = format!("{attr_name}=\"");
    let start = tag.find(&search)?;
    let value_start = start + search.len();
    let rest = &tag[value_start..];
    let end = rest.find('"')?;
    Some(rest[..end].to_string())
}

fn replace_attr(tag: &str, attr_name: &str, value: &str) -> String {
    let search = format!("{attr_name}=\"");
    let Some(start) = tag.find(&search) else {
        return tag.to_string();
    };
    let value_start = start + search.len();
    let Some(end) = tag[value_start..].find('"') else {
        return tag.to_string();
    };
    format!("{}{}{}", &tag[..value_start], value, &tag[value_start + end..])
}

fn add_lazy_to_tag(tag: &str) -> String {
    if tag.contains("loading=") {
        return tag.to_string();
    }
    if let Some(base) = tag.strip_suffix("/>") {
        format!("{base} loading=\"lazy\" />")
    } else {
        let base = &tag[..tag.len() - 1];
        format!("{base} loading=\"lazy\">")
    }
}

const VOID_ELEMENTS: &[&str] = &["img", "source", "br", "hr", "input", "meta", "link", "embed"];

/// Extract the first top-level element of an HTML fragment, tracking nesting
/// of same-named tags. Falls back to the whole fragment when no element can
/// be delimited.
fn first_top_level_element(html: &str) -> &str {
    let Some(start) = html.find('<') else {
        return html;
    };
    let name: String = html[start + 1..]
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric() || *c == '-')
        .collect();
    if name.is_empty() {
        return html;
    }

    if VOID_ELEMENTS.contains(&name.as_str()) {
        match html[start..].find('>') {
            Some(end) => return &html[start..start + end + 1],
            None => return html,
        }
    }

    let open = format!("<{name}");
    let close = format!("</{name}");
    let mut depth = 0usize;
    let mut pos = start;
    while pos < html.len() {
        let rest = &html[pos..];
        let next_open = rest.find(&open);
        let next_close = rest.find(&close);
        match (next_open, next_close) {
            (Some(o), Some(c)) if o < c => {
                depth += 1;
                pos += o + open.len();
            }
            (_, Some(c)) => {
                depth = depth.saturating_sub(1);
                pos += c + close.len();
                if depth == 0 {
                    match html[pos..].find('>') {
                        Some(end) => return &html[start..pos + end + 1],
                        None => return html,
                    }
                }
            }
            (Some(o), None) => {
                depth += 1;
                pos += o + open.len();
            }
            (None, None) => break,
        }
    }
    html
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOST: &str = "https://cdn.example.com";

    #[test]
    fn test_resolve_url_relative() {
        assert_eq!(
            resolve_url("pic.png", HOST),
            "https://cdn.example.com/pic.png"
        );
        assert_eq!(
            resolve_url("/pic.png", HOST),
            "https://cdn.example.com/pic.png"
        );
    }

    #[test]
    fn test_resolve_url_absolute_passthrough() {
        assert_eq!(
            resolve_url("https://other.example.com/a.png", HOST),
            "https://other.example.com/a.png"
        );
    }

    #[test]
    fn test_image_node_eager() {
        let asset = image_node("pic.png", Loading::Eager, HOST).unwrap();
        assert_eq!(
            asset.html,
            "<figure><picture><source srcset=\"https://cdn.example.com/pic.png\">\
             <img src=\"https://cdn.example.com/pic.png\" alt=\"\"></picture></figure>"
        );
        assert_eq!(asset.src.as_deref(), Some("https://cdn.example.com/pic.png"));
    }

    #[test]
    fn test_image_node_lazy() {
        let asset = image_node("pic.png", Loading::Lazy, HOST).unwrap();
        assert!(asset.html.contains("<img loading=\"lazy\" src="));
    }

    #[test]
    fn test_image_node_empty_destination() {
        let err = image_node("", Loading::Eager, HOST).unwrap_err();
        assert!(matches!(err, crate::error::NoteError::InvalidAsset(_)));
    }

    #[test]
    fn test_image_in_html_block_wraps_and_resolves() {
        let asset =
            image_in_html_block("<img src=\"photo.jpg\" alt=\"x\">", Loading::Lazy, HOST).unwrap();
        assert!(asset
            .html
            .starts_with("<picture><source srcset=\"https://cdn.example.com/photo.jpg\">"));
        assert!(asset.html.contains("src=\"https://cdn.example.com/photo.jpg\""));
        assert!(asset.html.contains("loading=\"lazy\""));
        assert_eq!(
            asset.src.as_deref(),
            Some("https://cdn.example.com/photo.jpg")
        );
    }

    #[test]
    fn test_image_in_html_block_eager_has_no_lazy_attr() {
        let asset =
            image_in_html_block("<img src=\"photo.jpg\">", Loading::Eager, HOST).unwrap();
        assert!(!asset.html.contains("loading="));
    }

    #[test]
    fn test_image_in_html_block_missing_src() {
        let err = image_in_html_block("<img alt=\"x\">", Loading::Eager, HOST).unwrap_err();
        assert!(matches!(err, crate::error::NoteError::InvalidAsset(_)));
    }

    #[test]
    fn test_image_in_html_block_keeps_first_top_level_element() {
        let html = "<img src=\"a.png\"><img src=\"b.png\">";
        let asset = image_in_html_block(html, Loading::Eager, HOST).unwrap();
        // Both are rewritten, but only the first root survives serialization.
        assert!(asset.html.contains("a.png"));
        assert!(!asset.html.contains("b.png"));
        assert_eq!(asset.src.as_deref(), Some("https://cdn.example.com/a.png"));
    }

    #[test]
    fn test_image_in_html_block_nested_in_div() {
        let html = "<div class=\"hero\"><img src=\"a.png\"></div>";
        let asset = image_in_html_block(html, Loading::Eager, HOST).unwrap();
        assert!(asset.html.starts_with("<div class=\"hero\">"));
        assert!(asset.html.ends_with("</div>"));
        assert!(asset.html.contains("<picture><source srcset="));
    }

    #[test]
    fn test_video_in_html_block_resolves_sources() {
        let html = "<video controls><source src=\"clip.mp4\" type=\"video/mp4\"></video>";
        let asset = video_in_html_block(html, HOST).unwrap();
        assert!(asset
            .html
            .contains("src=\"https://cdn.example.com/clip.mp4\""));
        assert!(asset.html.starts_with("<video"));
        assert!(asset.html.ends_with("</video>"));
        assert!(asset.src.is_none());
    }

    #[test]
    fn test_video_in_html_block_missing_src() {
        let err = video_in_html_block("<video><source type=\"video/mp4\"></video>", HOST)
            .unwrap_err();
        assert!(matches!(err, crate::error::NoteError::InvalidAsset(_)));
    }

    #[test]
    fn test_first_top_level_element_void() {
        assert_eq!(
            first_top_level_element("<img src=\"a\"> trailing"),
            "<img src=\"a\">"
        );
    }

    #[test]
    fn test_first_top_level_element_nested_same_tag() {
        let html = "<div><div>inner</div></div><div>second</div>";
        assert_eq!(first_top_level_element(html), "<div><div>inner</div></div>");
    }
}
