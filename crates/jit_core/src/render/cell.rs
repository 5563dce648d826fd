//! Table cells and labeled rows.

use crate::model::value::Value;
use crate::render::style::{css, Style};
use crate::render::{escape_html, style_attr};
use std::collections::BTreeMap;

/// Markup role of a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellTag {
    Header,
    Data,
}

impl CellTag {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Header => "th",
            Self::Data => "td",
        }
    }
}

/// One normalized table cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    value: String,
    tag: CellTag,
    style: Option<Style>,
}

impl Cell {
    pub fn new(value: &Value, tag: CellTag, style: Option<Style>) -> Self {
        Self {
            value: value.display(),
            tag,
            style,
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn tag(&self) -> CellTag {
        self.tag
    }

    pub fn render_markup(&self) -> String {
        let tag = self.tag.as_str();
        format!(
            "<{tag}{}>{}</{tag}>",
            style_attr(&css(self.style.as_ref())),
            escape_html(&self.value)
        )
    }
}

/// Label cell followed by one cell per value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    cells: Vec<Cell>,
    row_style: Option<Style>,
}

impl Row {
    /// Builds a row; `overrides` maps a value column index to its cell style.
    pub fn new(
        label: &Value,
        values: &[Value],
        row_style: Option<Style>,
        cell_style: Option<Style>,
        label_tag: CellTag,
        values_tag: CellTag,
        overrides: &BTreeMap<usize, Style>,
    ) -> Self {
        let mut cells = Vec::with_capacity(values.len() + 1);
        cells.push(Cell::new(label, label_tag, cell_style.clone()));
        for (index, value) in values.iter().enumerate() {
            let style = overrides
                .get(&index)
                .cloned()
                .or_else(|| cell_style.clone());
            cells.push(Cell::new(value, values_tag, style));
        }

        Self { cells, row_style }
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn render_markup(&self) -> String {
        let cells = self
            .cells
            .iter()
            .map(Cell::render_markup)
            .collect::<String>();
        format!("<tr{}>{cells}</tr>", style_attr(&css(self.row_style.as_ref())))
    }
}

#[cfg(test)]
mod tests {
    use super::{Cell, CellTag, Row};
    use crate::model::value::Value;
    use crate::render::style::Style;
    use std::collections::BTreeMap;

    #[test]
    fn cell_normalizes_null_and_escapes_markup() {
        let cell = Cell::new(&Value::Null, CellTag::Data, None);
        assert_eq!(cell.render_markup(), "<td>-</td>");

        let cell = Cell::new(&Value::from("a<b"), CellTag::Header, None);
        assert_eq!(cell.render_markup(), "<th>a&lt;b</th>");
    }

    #[test]
    fn row_applies_column_override() {
        let mut overrides = BTreeMap::new();
        overrides.insert(1, Style::from_pairs(&[("color", "red")]));
        let row = Row::new(
            &Value::from("Weight"),
            &[Value::Int(1), Value::Int(2)],
            Some(Style::from_pairs(&[("border", "0")])),
            Some(Style::from_pairs(&[("padding", "5px")])),
            CellTag::Header,
            CellTag::Data,
            &overrides,
        );

        assert_eq!(
            row.render_markup(),
            "<tr style=\"border: 0\"><th style=\"padding: 5px\">Weight</th>\
             <td style=\"padding: 5px\">1</td><td style=\"color: red\">2</td></tr>"
        );
        assert_eq!(row.cells().len(), 3);
    }
}
