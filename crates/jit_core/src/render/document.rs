//! Titled document assembled from content blocks.

use crate::model::value::Value;
use crate::render::block::{
    BlockRenderer, ContentBlock, LinkBlock, ListBlock, ListKind, TableBlock, TableError,
    TableStyles, TextBlock,
};
use crate::render::style::{css, Style};
use crate::render::{escape_html, style_attr};

/// Both rendered forms of a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedDocument {
    pub html: String,
    pub text: String,
}

/// Fixed presentation styles applied by a [`Document`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentTheme {
    pub global_table: Style,
    pub main_table: Style,
    pub main_row: Option<Style>,
    pub main_content: Option<Style>,
    pub header_row: Option<Style>,
    pub header_cell: Option<Style>,
    pub block_title: Style,
    pub list: Style,
    pub link_outer: Style,
    pub link_inner: Style,
    pub table: TableStyles,
}

impl DocumentTheme {
    /// Theme without any inline styles.
    pub fn plain() -> Self {
        Self {
            global_table: Style::new(),
            main_table: Style::new(),
            main_row: None,
            main_content: None,
            header_row: None,
            header_cell: None,
            block_title: Style::new(),
            list: Style::new(),
            link_outer: Style::new(),
            link_inner: Style::new(),
            table: TableStyles::default(),
        }
    }

    /// Branded e-mail notification theme.
    pub fn notification() -> Self {
        const FONT: &str = "\"Open Sans\", sans-serif";
        const INK: &str = "#102E52";
        const BRAND: &str = "#012F55";

        Self {
            global_table: Style::from_pairs(&[
                ("margin", "0 auto"),
                ("text-align", "center"),
                ("min-width", "600px"),
                ("width", "100%"),
                ("padding", "0"),
            ]),
            main_table: Style::from_pairs(&[("margin", "0 auto"), ("width", "600px")]),
            main_row: None,
            main_content: Some(Style::from_pairs(&[
                ("font-family", FONT),
                ("font-size", "14px"),
                ("color", INK),
                ("text-align", "start"),
                ("padding", "15px 30px"),
            ])),
            header_row: None,
            header_cell: Some(Style::from_pairs(&[
                ("font-family", FONT),
                ("font-size", "20px"),
                ("line-height", "24px"),
                ("color", INK),
                ("font-weight", "700"),
                ("text-align", "start"),
                ("padding", "15px 30px"),
            ])),
            block_title: Style::from_pairs(&[("font-weight", "700"), ("font-size", "18px")]),
            list: Style::from_pairs(&[
                ("display", "inline-block"),
                ("padding-inline-start", "15px"),
            ]),
            link_outer: Style::from_pairs(&[
                ("font-size", "16px"),
                ("padding", "10px"),
                ("background", BRAND),
                ("border-radius", "8px"),
                ("min-width", "200px"),
                ("text-align", "center"),
                ("border", "1px solid #012F55"),
                ("display", "inline-block"),
            ]),
            link_inner: Style::from_pairs(&[("color", "white"), ("text-decoration", "none")]),
            table: TableStyles {
                table: Style::from_pairs(&[
                    ("font-family", FONT),
                    ("border-collapse", "collapse"),
                ]),
                header_row: Some(Style::from_pairs(&[("border", "1px solid #012F55")])),
                header_cell: Some(Style::from_pairs(&[
                    ("background", BRAND),
                    ("color", "white"),
                    ("font-weight", "700"),
                    ("padding", "5px"),
                    ("line-height", "24px"),
                    ("font-size", "14px"),
                    ("vertical-align", "center"),
                    ("text-align", "start"),
                ])),
                data_row: None,
                data_cell: Some(Style::from_pairs(&[
                    ("border", "1px solid #012F55"),
                    ("padding", "5px"),
                    ("color", INK),
                    ("line-height", "24px"),
                    ("font-size", "12px"),
                    ("vertical-align", "center"),
                    ("text-align", "start"),
                ])),
                data_overrides: Default::default(),
            },
        }
    }
}

impl Default for DocumentTheme {
    fn default() -> Self {
        Self::notification()
    }
}

/// Per-block container options.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockOptions {
    /// Optional heading rendered right before the block.
    pub title: Option<String>,
    /// Overrides the theme's main row style.
    pub row_style: Option<Style>,
    /// Overrides the theme's main content style.
    pub content_style: Option<Style>,
}

impl BlockOptions {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct DocumentEntry {
    block: ContentBlock,
    title: Option<String>,
    row_style: String,
    content_style: String,
}

/// Ordered sequence of blocks starting with a title block.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    title: String,
    theme: DocumentTheme,
    entries: Vec<DocumentEntry>,
}

impl Document {
    /// Creates a document using the notification theme.
    pub fn new(title: impl Into<String>) -> Self {
        Self::with_theme(title, DocumentTheme::notification())
    }

    pub fn with_theme(title: impl Into<String>, theme: DocumentTheme) -> Self {
        let title = title.into();
        let heading = BlockOptions {
            title: None,
            row_style: theme.header_row.clone(),
            content_style: theme.header_cell.clone(),
        };
        let mut document = Self {
            title: title.clone(),
            theme,
            entries: Vec::new(),
        };
        document.push(ContentBlock::Text(TextBlock::new(title)), heading);
        document
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn theme(&self) -> &DocumentTheme {
        &self.theme
    }

    /// Number of blocks, the title block included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Appends a prebuilt block; unset styles fall back to the theme defaults.
    pub fn push(&mut self, block: ContentBlock, options: BlockOptions) -> &mut Self {
        let row_style = options.row_style.or_else(|| self.theme.main_row.clone());
        let content_style = options
            .content_style
            .or_else(|| self.theme.main_content.clone());
        self.entries.push(DocumentEntry {
            block,
            title: options.title.filter(|title| !title.is_empty()),
            row_style: css(row_style.as_ref()),
            content_style: css(content_style.as_ref()),
        });
        self
    }

    pub fn add_text(&mut self, text: impl Into<String>) -> &mut Self {
        self.push(
            ContentBlock::Text(TextBlock::new(text)),
            BlockOptions::default(),
        )
    }

    pub fn add_list(&mut self, items: Vec<Vec<String>>, kind: ListKind) -> &mut Self {
        self.push(self.list_block(items, kind), BlockOptions::default())
    }

    pub fn add_link(
        &mut self,
        url: impl Into<String>,
        label: Option<String>,
        text: Option<String>,
    ) -> &mut Self {
        self.push(self.link_block(url, label, text), BlockOptions::default())
    }

    /// Appends a table.
    ///
    /// # Errors
    /// - Propagates [`TableError`] from table construction; nothing is appended.
    pub fn add_table(
        &mut self,
        header: Vec<String>,
        rows: Vec<Vec<Value>>,
    ) -> Result<&mut Self, TableError> {
        let block = self.table_block(header, rows)?;
        Ok(self.push(block, BlockOptions::default()))
    }

    /// Builds a list block styled by this document's theme.
    pub fn list_block(&self, items: Vec<Vec<String>>, kind: ListKind) -> ContentBlock {
        ContentBlock::List(ListBlock::new(items, kind, self.theme.list.clone()))
    }

    /// Builds a link block styled by this document's theme.
    pub fn link_block(
        &self,
        url: impl Into<String>,
        label: Option<String>,
        text: Option<String>,
    ) -> ContentBlock {
        ContentBlock::Link(LinkBlock::new(
            url,
            label,
            text,
            self.theme.link_outer.clone(),
            self.theme.link_inner.clone(),
        ))
    }

    /// Builds a table block styled by this document's theme.
    pub fn table_block(
        &self,
        header: Vec<String>,
        rows: Vec<Vec<Value>>,
    ) -> Result<ContentBlock, TableError> {
        TableBlock::new(header, rows, self.theme.table.clone()).map(ContentBlock::Table)
    }

    /// Full hypertext document.
    pub fn render_markup(&self) -> String {
        let title_style = self.theme.block_title.to_css();
        let rows = self
            .entries
            .iter()
            .map(|entry| {
                let title = entry
                    .title
                    .as_deref()
                    .map(|title| format!("<p{}>{}</p>", style_attr(&title_style), escape_html(title)))
                    .unwrap_or_default();
                format!(
                    "<tr{}><td{}>{title}{}</td></tr>",
                    style_attr(&entry.row_style),
                    style_attr(&entry.content_style),
                    entry.block.render_markup()
                )
            })
            .collect::<String>();

        format!(
            "<table{}><tr><td><table{}>{rows}</table></td></tr></table>",
            style_attr(&self.theme.global_table.to_css()),
            style_attr(&self.theme.main_table.to_css())
        )
    }

    /// Full plain-text document; blocks separated by one blank line.
    pub fn render_text(&self) -> String {
        self.entries
            .iter()
            .map(|entry| match &entry.title {
                Some(title) => format!("{title}\n{}", entry.block.render_text()),
                None => entry.block.render_text(),
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    pub fn render(&self) -> RenderedDocument {
        RenderedDocument {
            html: self.render_markup(),
            text: self.render_text(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{BlockOptions, Document, DocumentTheme};
    use crate::model::value::Value;
    use crate::render::block::ListKind;

    #[test]
    fn text_starts_with_title_then_blank_line() {
        let mut document = Document::new("Order changed");
        let rendered = document.add_text("body").render();

        assert!(rendered.text.starts_with("Order changed\n\nbody"));
        assert_eq!(rendered.text, "Order changed\n\nbody");
    }

    #[test]
    fn markup_keeps_insertion_order_and_theme_styles() {
        let mut document = Document::with_theme("Title", DocumentTheme::plain());
        document
            .add_text("first")
            .add_list(vec![vec!["second".to_string()]], ListKind::Unordered);

        assert_eq!(
            document.render_markup(),
            "<table><tr><td><table>\
             <tr><td>Title</td></tr>\
             <tr><td>first</td></tr>\
             <tr><td><ul><li>second</li></ul></td></tr>\
             </table></td></tr></table>"
        );
        assert_eq!(document.len(), 3);
    }

    #[test]
    fn heading_uses_header_cell_style() {
        let document = Document::new("Styled");
        let markup = document.render_markup();
        assert!(markup.contains("font-size: 20px"));
        assert!(markup.contains(">Styled</td>"));
    }

    #[test]
    fn failed_table_is_not_appended() {
        let mut document = Document::new("Title");
        let result = document.add_table(
            vec!["a".to_string(), "b".to_string()],
            vec![vec![Value::Int(1)]],
        );

        assert!(result.is_err());
        assert_eq!(document.len(), 1);
    }

    #[test]
    fn titled_block_renders_title_in_both_formats() {
        let mut document = Document::with_theme("Title", DocumentTheme::plain());
        let block = document.list_block(vec![vec!["docs".to_string()]], ListKind::Ordered);
        document.push(block, BlockOptions::titled("We prepare:"));

        let rendered = document.render();
        assert!(rendered.text.ends_with("We prepare:\ndocs"));
        assert!(rendered.html.contains("<p>We prepare:</p><ol><li>docs</li></ol>"));
    }
}
