//! Diagram marker extraction.
//!
//! Documentation HTML wraps Mermaid source in a fixed marker element with
//! the source text HTML-escaped inside it. Extraction records the byte span
//! of each occurrence so substitution can happen by offset rather than by
//! textual search.

use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;

/// Matches the marker element wrapping escaped Mermaid source.
///
/// Dotall so multi-line diagram source is captured; non-greedy so adjacent
/// blocks stay separate.
static MARKER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)<pre class="mermaid"><code>(.*?)</code></pre>"#).unwrap()
});

/// A diagram block located in the input document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagramBlock {
    /// 1-based position in document order. Used for scratch file naming and
    /// alt text only; carries no semantic meaning in the output.
    pub ordinal: usize,
    /// Diagram source with HTML entities decoded.
    pub source: String,
    /// Byte range of the full marker element within the document.
    pub span: Range<usize>,
}

/// Extract all diagram blocks in document order.
///
/// Occurrences are non-overlapping and returned left to right. The recorded
/// span, not the marker text, identifies each occurrence, so byte-identical
/// duplicate blocks are extracted independently and each get their own
/// ordinal.
#[must_use]
pub fn extract_blocks(html: &str) -> Vec<DiagramBlock> {
    MARKER_RE
        .captures_iter(html)
        .enumerate()
        .map(|(i, caps)| {
            let whole = caps.get(0).unwrap();
            DiagramBlock {
                ordinal: i + 1,
                source: htmlize::unescape(&caps[1]).into_owned(),
                span: whole.range(),
            }
        })
        .collect()
}
