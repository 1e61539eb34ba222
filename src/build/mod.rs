//! The note compilation pipeline: Markdown in, HTML fragment plus extracted
//! metadata out. The math post-pass runs only for notes tagged `math`.

pub mod images;
pub mod markdown;
pub mod math;

use crate::config::Config;
use crate::error::Result;

/// Tag that activates the math post-pass.
pub const MATH_TAG: &str = "math";

/// A fully compiled note, ready to write to `<slug>.html` and, for the
/// `index` command, to upsert into the note index.
#[derive(Debug)]
pub struct CompiledNote {
    pub html: String,
    pub title: Option<String>,
    pub cover: Option<String>,
    pub tags: Vec<String>,
}

/// Compile a Markdown note end to end.
pub fn compile_note(source: &str, config: &Config) -> Result<CompiledNote> {
    let doc = markdown::render(source, &config.asset_host)?;

    let mut html = doc.html;
    if doc.tags.iter().any(|t| t == MATH_TAG) {
        // `None` means no delimiters were found and the blob stays as-is.
        if let Some(replaced) = math::render_math(&html, &math::MathOptions::default()) {
            html = replaced;
        }
    }

    Ok(CompiledNote {
        html,
        title: doc.title,
        cover: doc.cover,
        tags: doc.tags,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> Config {
        Config {
            asset_host: "https://cdn.example.com".into(),
        }
    }

    #[test]
    fn test_compile_extracts_metadata() {
        let note = compile_note("# Title\n\n![alt](pic.png)\n", &config()).unwrap();
        assert_eq!(note.title.as_deref(), Some("Title"));
        assert_eq!(
            note.cover.as_deref(),
            Some("https://cdn.example.com/pic.png")
        );
        assert!(note.tags.is_empty());
    }

    #[cfg(feature = "math")]
    #[test]
    fn test_math_pass_runs_only_for_math_tag() {
        let with_tag = compile_note("<wd-tags>\n#math\n\n$$E=mc^2$$\n", &config()).unwrap();
        assert!(with_tag.html.contains("katex"), "{}", with_tag.html);

        let without_tag = compile_note("$$E=mc^2$$\n", &config()).unwrap();
        assert!(!without_tag.html.contains("katex"), "{}", without_tag.html);
    }
}
