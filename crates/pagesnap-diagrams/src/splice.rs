//! Image splicing for compiled diagram blocks.
//!
//! Substitution is driven by the byte spans recorded at extraction time and
//! applied in a single rebuild pass. Extraction ordinal `i` and replacement
//! `i` therefore correspond 1:1 even when blocks are byte-identical.

use std::collections::HashMap;
use std::path::Path;

use crate::block::DiagramBlock;
use crate::compiler::CompiledDiagram;

/// Image fragment referencing a rasterized diagram.
///
/// The src is an absolute local-file reference so the page loads without a
/// web server; the alt text names the diagram by its 1-based ordinal.
fn image_tag(ordinal: usize, image_path: &Path) -> String {
    format!(
        r#"<img src="file://{}" alt="Mermaid diagram {ordinal}">"#,
        image_path.display()
    )
}

/// Replace compiled blocks with image references.
///
/// Each block with a compiled image is substituted at its recorded span;
/// blocks whose compilation failed keep their original markup. `blocks`
/// must be in document order with non-overlapping spans, as produced by
/// [`extract_blocks`](crate::extract_blocks).
#[must_use]
pub fn splice_images(html: &str, blocks: &[DiagramBlock], compiled: &[CompiledDiagram]) -> String {
    if blocks.is_empty() {
        return html.to_owned();
    }

    let images: HashMap<usize, &Path> = compiled
        .iter()
        .map(|c| (c.ordinal, c.image_path.as_path()))
        .collect();

    let mut result = String::with_capacity(html.len());
    let mut cursor = 0;
    for b in blocks {
        result.push_str(&html[cursor..b.span.start]);
        match images.get(&b.ordinal) {
            Some(path) => result.push_str(&image_tag(b.ordinal, path)),
            None => result.push_str(&html[b.span.clone()]),
        }
        cursor = b.span.end;
    }
    result.push_str(&html[cursor..]);
    result
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::block::extract_blocks;

    fn compiled(ordinal: usize, path: &str) -> CompiledDiagram {
        CompiledDiagram {
            ordinal,
            image_path: PathBuf::from(path),
        }
    }

    #[test]
    fn test_splice_single_block() {
        let html = r#"<p>Before</p><pre class="mermaid"><code>graph TD;A--&gt;B;</code></pre><p>After</p>"#;
        let blocks = extract_blocks(html);

        let result = splice_images(html, &blocks, &[compiled(1, "/scratch/diagram_1.png")]);

        assert_eq!(
            result,
            r#"<p>Before</p><img src="file:///scratch/diagram_1.png" alt="Mermaid diagram 1"><p>After</p>"#
        );
    }

    #[test]
    fn test_splice_multiple_blocks() {
        let html = r#"<pre class="mermaid"><code>a</code></pre><p>mid</p><pre class="mermaid"><code>b</code></pre>"#;
        let blocks = extract_blocks(html);

        let result = splice_images(
            html,
            &blocks,
            &[
                compiled(1, "/s/diagram_1.png"),
                compiled(2, "/s/diagram_2.png"),
            ],
        );

        assert_eq!(
            result,
            r#"<img src="file:///s/diagram_1.png" alt="Mermaid diagram 1"><p>mid</p><img src="file:///s/diagram_2.png" alt="Mermaid diagram 2">"#
        );
    }

    #[test]
    fn test_splice_failed_block_keeps_original_markup() {
        let html = r#"<pre class="mermaid"><code>good</code></pre><pre class="mermaid"><code>bad</code></pre>"#;
        let blocks = extract_blocks(html);

        // Only the first block compiled.
        let result = splice_images(html, &blocks, &[compiled(1, "/s/diagram_1.png")]);

        assert_eq!(
            result,
            r#"<img src="file:///s/diagram_1.png" alt="Mermaid diagram 1"><pre class="mermaid"><code>bad</code></pre>"#
        );
    }

    #[test]
    fn test_splice_duplicate_blocks_get_independent_images() {
        let marker = r#"<pre class="mermaid"><code>graph TD;A-->B;</code></pre>"#;
        let html = format!("{marker}{marker}");
        let blocks = extract_blocks(&html);

        let result = splice_images(
            &html,
            &blocks,
            &[
                compiled(1, "/s/diagram_1.png"),
                compiled(2, "/s/diagram_2.png"),
            ],
        );

        assert_eq!(
            result,
            r#"<img src="file:///s/diagram_1.png" alt="Mermaid diagram 1"><img src="file:///s/diagram_2.png" alt="Mermaid diagram 2">"#
        );
    }

    #[test]
    fn test_splice_compiled_order_does_not_matter() {
        let html = r#"<pre class="mermaid"><code>a</code></pre><pre class="mermaid"><code>b</code></pre>"#;
        let blocks = extract_blocks(html);

        let result = splice_images(
            html,
            &blocks,
            &[
                compiled(2, "/s/diagram_2.png"),
                compiled(1, "/s/diagram_1.png"),
            ],
        );

        assert!(result.starts_with(r#"<img src="file:///s/diagram_1.png""#));
        assert!(result.contains(r#"<img src="file:///s/diagram_2.png""#));
    }

    #[test]
    fn test_splice_no_blocks_is_identity() {
        let html = "<p>plain document</p>";
        assert_eq!(splice_images(html, &[], &[]), html);
    }

    #[test]
    fn test_splice_nothing_compiled_is_identity() {
        let html = r#"<pre class="mermaid"><code>a</code></pre>"#;
        let blocks = extract_blocks(html);
        assert_eq!(splice_images(html, &blocks, &[]), html);
    }
}
