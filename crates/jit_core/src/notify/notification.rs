//! Addressed notification built on a [`Document`].

use crate::config::{is_valid_email, SiteConfig};
use crate::model::value::Value;
use crate::notify::dispatcher::{DeliveryOutcome, Dispatcher};
use crate::render::block::{ContentBlock, ListKind, TableError, TextBlock};
use crate::render::document::{BlockOptions, Document, RenderedDocument};
use log::debug;

/// Subject, rendered body and recipients of one outgoing message.
#[derive(Debug, Clone)]
pub struct Notification {
    subject: String,
    document: Document,
    recipients: Vec<String>,
    site: SiteConfig,
}

impl Notification {
    /// Starts a notification whose document is headed by `title`.
    pub fn new(subject: impl Into<String>, title: impl Into<String>, site: &SiteConfig) -> Self {
        Self {
            subject: subject.into(),
            document: Document::new(title),
            recipients: Vec::new(),
            site: site.clone(),
        }
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn recipients(&self) -> &[String] {
        &self.recipients
    }

    /// Adds addresses, skipping blank, malformed and repeated ones.
    pub fn add_recipients<I, S>(&mut self, recipients: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for recipient in recipients {
            let address = recipient.as_ref().trim();
            if address.is_empty() {
                continue;
            }
            if !is_valid_email(address) {
                debug!(
                    "event=recipient_skip module=notify status=skipped reason=invalid_address"
                );
                continue;
            }
            if !self.recipients.iter().any(|known| known == address) {
                self.recipients.push(address.to_string());
            }
        }
        self
    }

    /// Link to an absolute external URL.
    pub fn add_outer_link(
        &mut self,
        url: impl Into<String>,
        label: impl Into<String>,
        text: impl Into<String>,
        title: Option<&str>,
    ) -> &mut Self {
        let block = self
            .document
            .link_block(url, non_empty(label.into()), non_empty(text.into()));
        self.document.push(block, options(title));
        self
    }

    /// Link to a portal page; `path` is joined onto the configured domain.
    pub fn add_inner_link(
        &mut self,
        path: &str,
        label: impl Into<String>,
        text: impl Into<String>,
        title: Option<&str>,
    ) -> &mut Self {
        let url = self.site.absolute_url(path);
        self.add_outer_link(url, label, text, title)
    }

    pub fn add_text(&mut self, text: impl Into<String>, title: Option<&str>) -> &mut Self {
        self.document
            .push(ContentBlock::Text(TextBlock::new(text)), options(title));
        self
    }

    pub fn add_list(
        &mut self,
        items: Vec<Vec<String>>,
        kind: ListKind,
        title: Option<&str>,
    ) -> &mut Self {
        let block = self.document.list_block(items, kind);
        self.document.push(block, options(title));
        self
    }

    /// Appends a table.
    ///
    /// # Errors
    /// - [`TableError`] when the header is empty or a row length differs from it.
    pub fn add_table(
        &mut self,
        header: Vec<String>,
        rows: Vec<Vec<Value>>,
        title: Option<&str>,
    ) -> Result<&mut Self, TableError> {
        let block = self.document.table_block(header, rows)?;
        self.document.push(block, options(title));
        Ok(self)
    }

    pub fn render(&self) -> RenderedDocument {
        self.document.render()
    }

    /// Delivers through `dispatcher`; without recipients this is a no-op.
    pub fn send(&self, dispatcher: &Dispatcher<'_>) -> DeliveryOutcome {
        dispatcher.dispatch(&self.subject, &self.document, &self.recipients)
    }
}

fn options(title: Option<&str>) -> BlockOptions {
    match title {
        Some(title) => BlockOptions::titled(title),
        None => BlockOptions::default(),
    }
}

fn non_empty(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}
