//! Inline style descriptors.

/// Ordered presentation attributes rendered as an inline style string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Style {
    attributes: Vec<(String, String)>,
}

impl Style {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs(pairs: &[(&str, &str)]) -> Self {
        Self {
            attributes: pairs
                .iter()
                .map(|(name, value)| (name.to_string(), value.to_string()))
                .collect(),
        }
    }

    /// Returns a copy with one more attribute appended.
    pub fn with(mut self, name: &str, value: &str) -> Self {
        self.attributes.push((name.to_string(), value.to_string()));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    /// `name: value` pairs joined by `; `, both sides lowercased.
    pub fn to_css(&self) -> String {
        self.attributes
            .iter()
            .map(|(name, value)| format!("{}: {}", name.to_lowercase(), value.to_lowercase()))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Style string for an optional descriptor; `None` renders as empty.
pub fn css(style: Option<&Style>) -> String {
    style.map(Style::to_css).unwrap_or_default()
}
