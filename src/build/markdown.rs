//! Markdown compilation: a single pass over the pulldown-cmark event stream
//! that extracts note metadata (title, tags, cover image), rewrites image and
//! video nodes against the asset host, and serializes the result to HTML.

use std::ops::Range;

use pulldown_cmark::{html, Event, Options, Parser, Tag, TagEnd};
use tracing::debug;

use crate::build::images::{self, Loading};
use crate::error::{NoteError, Result};

/// Sentinel raw-HTML marker; the text that follows it holds the note's
/// `#tag` tokens.
pub const TAGS_SENTINEL: &str = "<wd-tags>";

/// A compiled document plus the metadata extracted during the walk.
#[derive(Debug)]
pub struct RenderedDoc {
    pub html: String,
    /// Text of the first heading, first-wins.
    pub title: Option<String>,
    /// Resolved absolute URL of the first image-like node.
    pub cover: Option<String>,
    /// Tags from the first sentinel marker, `#` prefixes stripped.
    pub tags: Vec<String>,
}

/// Parse `source`, transform asset nodes, and render to an HTML fragment.
pub fn render(source: &str, asset_host: &str) -> Result<RenderedDoc> {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_FOOTNOTES);

    let raw: Vec<(Event, Range<usize>)> = Parser::new_ext(source, options)
        .into_offset_iter()
        .collect();
    let events = coalesce_html_blocks(raw);

    let mut out: Vec<Event> = Vec::with_capacity(events.len());
    let mut title: Option<String> = None;
    let mut title_seen = false;
    let mut tags: Option<Vec<String>> = None;
    let mut cover: Option<String> = None;
    let mut image_count: usize = 0;

    let mut i = 0;
    while i < events.len() {
        let (event, range) = &events[i];
        // Ordinal loading rule: the first image-like node loads eagerly,
        // every later one lazily.
        let loading = if image_count > 0 {
            Loading::Lazy
        } else {
            Loading::Eager
        };
        match event {
            Event::Start(Tag::Heading { .. }) if !title_seen => {
                title_seen = true;
                match events.get(i + 1).map(|(e, _)| e) {
                    Some(Event::Text(text)) => title = Some(text.to_string()),
                    Some(Event::End(TagEnd::Heading(_))) | None => {
                        return Err(NoteError::MalformedDocument {
                            message: "heading has no children".into(),
                            offset: range.start,
                        })
                    }
                    // First child is not a text node (emphasis, code, ...):
                    // no title, and later headings stay ignored.
                    Some(_) => {}
                }
                out.push(event.clone());
            }
            Event::InlineHtml(s) if tags.is_none() && s.trim() == TAGS_SENTINEL => {
                if let Some((Event::Text(text), _)) = events.get(i + 1) {
                    tags = Some(parse_tag_tokens(text));
                }
                out.push(event.clone());
            }
            Event::Html(s) => {
                let block = s.as_ref();
                let trimmed = block.trim_start();
                if trimmed.starts_with("<!--") {
                    // Comment block: never image-like.
                    out.push(event.clone());
                } else if tags.is_none() && trimmed.starts_with(TAGS_SENTINEL) {
                    tags = Some(parse_tag_tokens(&trimmed[TAGS_SENTINEL.len()..]));
                    out.push(event.clone());
                } else if block.contains("img") {
                    let asset = images::image_in_html_block(block, loading, asset_host)?;
                    if image_count == 0 {
                        cover = asset.src;
                    }
                    image_count += 1;
                    out.push(Event::Html(asset.html.into()));
                } else if block.contains("video") {
                    let asset = images::video_in_html_block(block, asset_host)?;
                    image_count += 1;
                    out.push(Event::Html(asset.html.into()));
                } else {
                    out.push(event.clone());
                }
            }
            Event::Start(Tag::Image { dest_url, .. }) => {
                let asset = images::image_node(dest_url, loading, asset_host)?;
                if image_count == 0 {
                    cover = asset.src.clone();
                }
                image_count += 1;
                // Skip the alt-text events through the image end tag.
                while i < events.len() && !matches!(events[i].0, Event::End(TagEnd::Image)) {
                    i += 1;
                }
                // A paragraph holding only this image becomes a block-level
                // HTML fragment, so the paragraph wrapper goes away.
                let alone_in_paragraph =
                    matches!(out.last(), Some(Event::Start(Tag::Paragraph)))
                        && matches!(
                            events.get(i + 1).map(|(e, _)| e),
                            Some(Event::End(TagEnd::Paragraph))
                        );
                if alone_in_paragraph {
                    out.pop();
                    i += 1;
                }
                out.push(Event::Html(asset.html.into()));
            }
            _ => out.push(event.clone()),
        }
        i += 1;
    }

    let mut html_out = String::with_capacity(source.len() * 3 / 2);
    html::push_html(&mut html_out, out.into_iter());
    debug!(?title, ?tags, images = image_count, "note rendered");

    Ok(RenderedDoc {
        html: html_out,
        title,
        cover,
        tags: tags.unwrap_or_default(),
    })
}

/// Merge per-line `Event::Html` events belonging to one HTML block back into
/// a single event, so transforms see the whole fragment. Only byte-adjacent
/// events are merged; separate blocks keep their gap.
fn coalesce_html_blocks(events: Vec<(Event<'_>, Range<usize>)>) -> Vec<(Event<'_>, Range<usize>)> {
    let mut out: Vec<(Event, Range<usize>)> = Vec::with_capacity(events.len());
    for (event, range) in events {
        if let (Event::Html(next), Some((Event::Html(prev), prev_range))) =
            (&event, out.last_mut())
        {
            if prev_range.end == range.start {
                let merged = format!("{prev}{next}");
                *prev = merged.into();
                prev_range.end = range.end;
                continue;
            }
        }
        out.push((event, range));
    }
    out
}

fn parse_tag_tokens(text: &str) -> Vec<String> {
    text.split_whitespace()
        .map(|token| {
            let mut chars = token.chars();
            chars.next();
            chars.as_str().to_string()
        })
        .collect()
}
