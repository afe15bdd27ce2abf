//! Outbound replies: text plus an optional button keyboard and document.
//!
//! Replies are transport-agnostic. A transport decides how to draw the
//! keyboard; the callback data of each button is an `Action` rendered via
//! `Display`.

use super::input::Action;
use crate::domain::planning::ExportedDocument;

/// One button of an inline keyboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    pub label: String,
    pub callback: String,
}

impl Button {
    pub fn new(label: impl Into<String>, action: Action) -> Self {
        Self {
            label: label.into(),
            callback: action.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Reply {
    pub text: String,
    pub keyboard: Vec<Vec<Button>>,
    pub document: Option<ExportedDocument>,
}

impl Reply {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    /// Adds a row of buttons.
    pub fn row(mut self, buttons: Vec<Button>) -> Self {
        if !buttons.is_empty() {
            self.keyboard.push(buttons);
        }
        self
    }

    /// Adds a single-button row.
    pub fn button(self, label: impl Into<String>, action: Action) -> Self {
        self.row(vec![Button::new(label, action)])
    }

    /// Lays `buttons` out in rows of at most `width`.
    pub fn grid(mut self, buttons: Vec<Button>, width: usize) -> Self {
        let width = width.max(1);
        let mut iter = buttons.into_iter().peekable();
        while iter.peek().is_some() {
            self.keyboard.push(iter.by_ref().take(width).collect());
        }
        self
    }

    pub fn with_document(mut self, document: ExportedDocument) -> Self {
        self.document = Some(document);
        self
    }

    /// Prefixes a notice line (e.g. "Not enough dishes") to the text.
    pub fn prepend(mut self, notice: impl AsRef<str>) -> Self {
        let notice = notice.as_ref();
        if !notice.is_empty() {
            self.text = format!("{}\n\n{}", notice, self.text);
        }
        self
    }

    /// Every button in reading order.
    pub fn buttons(&self) -> impl Iterator<Item = &Button> {
        self.keyboard.iter().flatten()
    }

    /// True if some button carries exactly this action.
    pub fn offers(&self, action: &Action) -> bool {
        let data = action.to_string();
        self.buttons().any(|b| b.callback == data)
    }
}
