//! Diagnostics for the semantics passes.
//!
//! Diagnostics are values: a pass accumulates `Message`s in a `Messages`
//! buffer and keeps going. A message may carry attachments, e.g. the
//! per-directory failures behind a single "cannot find module file" error.

use std::fmt::{Display, Formatter, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

impl Display for Severity {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

/// One diagnostic, attributed to the source name it is about.
#[derive(Debug, Clone)]
pub struct Message {
    pub severity: Severity,
    pub name: String,
    pub text: String,
    pub attachments: Vec<Message>,
}

impl Message {
    pub fn error(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            name: name.into(),
            text: text.into(),
            attachments: Vec::new(),
        }
    }

    pub fn warning(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            name: name.into(),
            text: text.into(),
            attachments: Vec::new(),
        }
    }

    /// Attaches supporting messages (kept in the order they were said).
    pub fn attach_all(mut self, attachments: Vec<Message>) -> Self {
        self.attachments.extend(attachments);
        self
    }

    pub fn is_fatal(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl Display for Message {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        write!(f, "{}: '{}': {}", self.severity, self.name, self.text)?;
        for attachment in &self.attachments {
            write!(f, "\n  note: {}", attachment)?;
        }
        Ok(())
    }
}

/// An ordered accumulation of diagnostics.
#[derive(Debug, Clone, Default)]
pub struct Messages {
    messages: Vec<Message>,
}

impl Messages {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn say(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Message> {
        self.messages.iter()
    }

    pub fn any_fatal(&self) -> bool {
        self.messages.iter().any(Message::is_fatal)
    }

    /// Moves all messages out, leaving the buffer empty.
    pub fn take(&mut self) -> Vec<Message> {
        std::mem::take(&mut self.messages)
    }

    pub fn extend(&mut self, other: Messages) {
        self.messages.extend(other.messages);
    }
}
