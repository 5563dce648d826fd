//! Content block processors.
//!
//! Each block renders the same payload twice: a hypertext fragment and a
//! plain-text fragment.

use crate::model::value::Value;
use crate::render::cell::{CellTag, Row};
use crate::render::style::{css, Style};
use crate::render::{escape_html, style_attr};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Shared two-format rendering contract.
pub trait BlockRenderer {
    fn render_markup(&self) -> String;
    fn render_text(&self) -> String;
}

/// Table construction errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableError {
    /// Header has no columns.
    EmptyHeader,
    /// A data row does not have one value per header column.
    LengthMismatch {
        row: usize,
        expected: usize,
        actual: usize,
    },
}

impl Display for TableError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyHeader => write!(f, "table header must have at least one column"),
            Self::LengthMismatch {
                row,
                expected,
                actual,
            } => write!(
                f,
                "row/header length mismatch: row {row} has {actual} values, header has {expected}"
            ),
        }
    }
}

impl Error for TableError {}

/// Free text block; content is escaped unless built with [`TextBlock::trusted_markup`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextBlock {
    text: String,
    trusted: bool,
}

impl TextBlock {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            trusted: false,
        }
    }

    /// Block whose content is emitted into markup verbatim.
    ///
    /// Only for markup authored in code, never for record data.
    pub fn trusted_markup(markup: impl Into<String>) -> Self {
        Self {
            text: markup.into(),
            trusted: true,
        }
    }
}

impl BlockRenderer for TextBlock {
    fn render_markup(&self) -> String {
        if self.trusted {
            self.text.clone()
        } else {
            escape_html(&self.text)
        }
    }

    fn render_text(&self) -> String {
        self.text.clone()
    }
}

/// Bullet style of a list block.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ListKind {
    #[default]
    Unordered,
    Ordered,
}

impl ListKind {
    fn tag(self) -> &'static str {
        match self {
            Self::Unordered => "ul",
            Self::Ordered => "ol",
        }
    }
}

/// List of `label: value; value` items.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListBlock {
    items: Vec<Vec<String>>,
    kind: ListKind,
    style: Style,
}

impl ListBlock {
    pub fn new(items: Vec<Vec<String>>, kind: ListKind, style: Style) -> Self {
        Self { items, kind, style }
    }

    fn non_empty_items(&self) -> impl Iterator<Item = &[String]> {
        self.items
            .iter()
            .map(Vec::as_slice)
            .filter(|item| !item.is_empty())
    }
}

impl BlockRenderer for ListBlock {
    fn render_markup(&self) -> String {
        let items = self
            .non_empty_items()
            .map(|item| match item {
                [single] => format!("<li>{}</li>", escape_html(single)),
                [label, values @ ..] => format!(
                    "<li><b>{}:</b> {}</li>",
                    escape_html(label),
                    escape_html(&values.join("; "))
                ),
                [] => String::new(),
            })
            .collect::<String>();
        let tag = self.kind.tag();
        format!("<{tag}{}>{items}</{tag}>", style_attr(&self.style.to_css()))
    }

    fn render_text(&self) -> String {
        self.non_empty_items()
            .map(|item| match item {
                [label, values @ ..] if !values.is_empty() => {
                    format!("{label}: {}", values.join("; "))
                }
                _ => item.join(""),
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Hyperlink with optional label and lead-in text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkBlock {
    url: String,
    label: Option<String>,
    text: Option<String>,
    outer_style: Style,
    inner_style: Style,
}

impl LinkBlock {
    pub fn new(
        url: impl Into<String>,
        label: Option<String>,
        text: Option<String>,
        outer_style: Style,
        inner_style: Style,
    ) -> Self {
        Self {
            url: url.into(),
            label: label.filter(|value| !value.is_empty()),
            text: text.filter(|value| !value.is_empty()),
            outer_style,
            inner_style,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl BlockRenderer for LinkBlock {
    fn render_markup(&self) -> String {
        let mut markup = String::new();
        if let Some(text) = &self.text {
            markup.push_str(&format!("<p>{}</p>", escape_html(text)));
        }
        let label = self.label.as_deref().unwrap_or(&self.url);
        markup.push_str(&format!(
            "<div{}><a href=\"{}\"{}>{}</a></div>",
            style_attr(&self.outer_style.to_css()),
            escape_html(&self.url),
            style_attr(&self.inner_style.to_css()),
            escape_html(label)
        ));
        markup
    }

    fn render_text(&self) -> String {
        let mut lines = Vec::with_capacity(2);
        if let Some(text) = &self.text {
            lines.push(text.clone());
        }
        match &self.label {
            Some(label) => lines.push(format!("{label}: {}", self.url)),
            None => lines.push(self.url.clone()),
        }
        lines.join("\n")
    }
}

/// Styles applied to table parts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableStyles {
    pub table: Style,
    pub header_row: Option<Style>,
    pub header_cell: Option<Style>,
    pub data_row: Option<Style>,
    pub data_cell: Option<Style>,
    /// Per value-column data cell overrides.
    pub data_overrides: BTreeMap<usize, Style>,
}

/// Header row plus data rows of equal width.
#[derive(Debug, Clone, PartialEq)]
pub struct TableBlock {
    header: Vec<String>,
    rows: Vec<Vec<Value>>,
    styles: TableStyles,
}

impl TableBlock {
    /// Builds a table after checking every row against the header width.
    ///
    /// # Errors
    /// - `EmptyHeader` when `header` is empty.
    /// - `LengthMismatch` for the first row whose width differs.
    pub fn new(
        header: Vec<String>,
        rows: Vec<Vec<Value>>,
        styles: TableStyles,
    ) -> Result<Self, TableError> {
        if header.is_empty() {
            return Err(TableError::EmptyHeader);
        }
        for (index, row) in rows.iter().enumerate() {
            if row.len() != header.len() {
                return Err(TableError::LengthMismatch {
                    row: index,
                    expected: header.len(),
                    actual: row.len(),
                });
            }
        }

        Ok(Self {
            header,
            rows,
            styles,
        })
    }

    pub fn header(&self) -> &[String] {
        &self.header
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    fn header_row(&self) -> Row {
        let titles = self
            .header
            .iter()
            .map(|title| Value::from(title.as_str()))
            .collect::<Vec<_>>();
        Row::new(
            &titles[0],
            &titles[1..],
            self.styles.header_row.clone(),
            self.styles.header_cell.clone(),
            CellTag::Header,
            CellTag::Header,
            &BTreeMap::new(),
        )
    }

    fn data_row(&self, row: &[Value]) -> Row {
        Row::new(
            &row[0],
            &row[1..],
            self.styles.data_row.clone(),
            self.styles.data_cell.clone(),
            CellTag::Header,
            CellTag::Data,
            &self.styles.data_overrides,
        )
    }
}

impl BlockRenderer for TableBlock {
    fn render_markup(&self) -> String {
        let mut rows = self.header_row().render_markup();
        for row in &self.rows {
            rows.push_str(&self.data_row(row).render_markup());
        }
        format!(
            "<table{}>{rows}</table>",
            style_attr(&css(Some(&self.styles.table)))
        )
    }

    /// Without data rows the header titles are rendered, so output is never empty.
    fn render_text(&self) -> String {
        if self.rows.is_empty() {
            return self.header.join(". ");
        }
        self.rows
            .iter()
            .map(|row| {
                let mut parts = vec![row[0].display()];
                for (index, value) in row.iter().enumerate().skip(1) {
                    parts.push(format!("{}: {}", self.header[index], value.display()));
                }
                parts.join(". ")
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// One renderable unit of a document.
#[derive(Debug, Clone, PartialEq)]
pub enum ContentBlock {
    Text(TextBlock),
    List(ListBlock),
    Link(LinkBlock),
    Table(TableBlock),
}

impl BlockRenderer for ContentBlock {
    fn render_markup(&self) -> String {
        match self {
            Self::Text(block) => block.render_markup(),
            Self::List(block) => block.render_markup(),
            Self::Link(block) => block.render_markup(),
            Self::Table(block) => block.render_markup(),
        }
    }

    fn render_text(&self) -> String {
        match self {
            Self::Text(block) => block.render_text(),
            Self::List(block) => block.render_text(),
            Self::Link(block) => block.render_text(),
            Self::Table(block) => block.render_text(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{
        BlockRenderer, LinkBlock, ListBlock, ListKind, TableBlock, TableError, TableStyles,
        TextBlock,
    };
    use crate::model::value::Value;
    use crate::render::style::Style;

    fn items(raw: &[&[&str]]) -> Vec<Vec<String>> {
        raw.iter()
            .map(|item| item.iter().map(|value| value.to_string()).collect())
            .collect()
    }

    #[test]
    fn text_block_escapes_markup_but_keeps_plain_text() {
        let block = TextBlock::new("<img src=x onerror=alert(1)>");
        assert_eq!(
            block.render_markup(),
            "&lt;img src=x onerror=alert(1)&gt;"
        );
        assert_eq!(block.render_text(), "<img src=x onerror=alert(1)>");
    }

    #[test]
    fn trusted_markup_passes_through() {
        let block = TextBlock::trusted_markup("Hello<br>world");
        assert_eq!(block.render_markup(), "Hello<br>world");
        assert_eq!(block.render_text(), "Hello<br>world");
    }

    #[test]
    fn list_renders_labels_and_skips_empty_items() {
        let block = ListBlock::new(
            items(&[&["Author", "Ivanov", "Manager"], &[], &["Plain line"]]),
            ListKind::Ordered,
            Style::new(),
        );

        assert_eq!(
            block.render_markup(),
            "<ol><li><b>Author:</b> Ivanov; Manager</li><li>Plain line</li></ol>"
        );
        assert_eq!(block.render_text(), "Author: Ivanov; Manager\nPlain line");
    }

    #[test]
    fn link_defaults_label_to_url_in_markup() {
        let block = LinkBlock::new(
            "http://example.com/o/1",
            None,
            Some("Follow the link:".to_string()),
            Style::new(),
            Style::new(),
        );

        assert_eq!(
            block.render_markup(),
            "<p>Follow the link:</p><div><a href=\"http://example.com/o/1\">http://example.com/o/1</a></div>"
        );
        assert_eq!(block.render_text(), "Follow the link:\nhttp://example.com/o/1");
    }

    #[test]
    fn link_text_uses_label() {
        let block = LinkBlock::new(
            "http://example.com",
            Some("Open portal".to_string()),
            None,
            Style::new(),
            Style::new(),
        );
        assert_eq!(block.render_text(), "Open portal: http://example.com");
    }

    #[test]
    fn table_rejects_row_header_length_mismatch() {
        let err = TableBlock::new(
            vec!["Field".into(), "Was".into(), "Now".into()],
            vec![vec![Value::from("Weight"), Value::Int(1)]],
            TableStyles::default(),
        )
        .unwrap_err();

        assert_eq!(
            err,
            TableError::LengthMismatch {
                row: 0,
                expected: 3,
                actual: 2
            }
        );
        assert!(err.to_string().contains("row/header length mismatch"));
    }

    #[test]
    fn table_rejects_empty_header() {
        assert_eq!(
            TableBlock::new(Vec::new(), Vec::new(), TableStyles::default()).unwrap_err(),
            TableError::EmptyHeader
        );
    }

    #[test]
    fn table_renders_header_and_data_rows() {
        let block = TableBlock::new(
            vec!["Field".into(), "Was".into(), "Now".into()],
            vec![vec![Value::from("Comment"), Value::Null, Value::from("fragile")]],
            TableStyles::default(),
        )
        .unwrap();

        assert_eq!(
            block.render_markup(),
            "<table><tr><th>Field</th><th>Was</th><th>Now</th></tr>\
             <tr><th>Comment</th><td>-</td><td>fragile</td></tr></table>"
        );
        assert_eq!(block.render_text(), "Comment. Was: -. Now: fragile");
    }

    #[test]
    fn table_without_rows_renders_header_in_both_forms() {
        let block = TableBlock::new(
            vec!["a".into(), "b".into()],
            Vec::new(),
            TableStyles::default(),
        )
        .unwrap();

        assert_eq!(block.render_text(), "a. b");
        assert_eq!(
            block.render_markup(),
            "<table><tr><th>a</th><th>b</th></tr></table>"
        );
    }
}
