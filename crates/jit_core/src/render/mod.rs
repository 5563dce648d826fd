//! Two-format (hypertext + plain text) document rendering.
//!
//! # Responsibility
//! - Normalize scalar values into display cells and labeled rows.
//! - Render text/list/link/table blocks into both output formats.
//! - Assemble blocks into a titled document.
//!
//! # Invariants
//! - Blocks are immutable after construction.
//! - Table row/header cardinality is checked at construction, never at render.
//! - Document block order equals insertion order; the title block is first.

pub mod block;
pub mod cell;
pub mod document;
pub mod style;

pub use block::{
    BlockRenderer, ContentBlock, LinkBlock, ListBlock, ListKind, TableBlock, TableError,
    TableStyles, TextBlock,
};
pub use cell::{Cell, CellTag, Row};
pub use document::{BlockOptions, Document, DocumentTheme, RenderedDocument};
pub use style::Style;

/// Escapes text for inclusion in markup content or attribute values.
pub fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            other => escaped.push(other),
        }
    }
    escaped
}

/// Renders ` style="..."` or nothing for an empty style string.
pub(crate) fn style_attr(style: &str) -> String {
    if style.is_empty() {
        String::new()
    } else {
        format!(" style=\"{}\"", escape_html(style))
    }
}

#[cfg(test)]
mod tests {
    use super::{escape_html, style_attr};

    #[test]
    fn escape_html_replaces_markup_characters() {
        assert_eq!(
            escape_html(r#"<b>"Tom" & 'Jerry'</b>"#),
            "&lt;b&gt;&quot;Tom&quot; &amp; &#x27;Jerry&#x27;&lt;/b&gt;"
        );
    }

    #[test]
    fn style_attr_is_empty_for_empty_style() {
        assert_eq!(style_attr(""), "");
        assert_eq!(style_attr("color: red"), " style=\"color: red\"");
    }
}
