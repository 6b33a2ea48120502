//! The chat page's DOM surface: a messages container, a text input and a
//! send button.

use std::fmt;

use serde_json::Value;

/// Elements the chat page binds to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementId {
    /// Container that received messages are appended to.
    Messages,
    /// Text input holding the message being typed.
    Message,
    /// Button that posts the current input.
    Send,
}

impl ElementId {
    /// The element's DOM id.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Messages => "messages",
            Self::Message => "message",
            Self::Send => "send",
        }
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The `#messages` container. Starts hidden and empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessagesContainer {
    hidden: bool,
    children: Vec<String>,
}

impl Default for MessagesContainer {
    fn default() -> Self {
        Self {
            hidden: true,
            children: Vec::new(),
        }
    }
}

impl MessagesContainer {
    /// Creates a hidden, empty container.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the container still carries its hidden state.
    #[must_use]
    pub const fn is_hidden(&self) -> bool {
        self.hidden
    }

    /// Removes the hidden state. Calling it again has no effect.
    pub fn show(&mut self) {
        self.hidden = false;
    }

    /// Appends a child element given as raw HTML.
    pub fn append(&mut self, html: String) {
        self.children.push(html);
    }

    /// Child elements in insertion order.
    #[must_use]
    pub fn children(&self) -> &[String] {
        &self.children
    }
}

impl fmt::Display for MessagesContainer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let id = ElementId::Messages;
        if self.hidden {
            write!(f, r#"<div id="{id}" hidden>"#)?;
        } else {
            write!(f, r#"<div id="{id}">"#)?;
        }
        for child in &self.children {
            f.write_str(child)?;
        }
        f.write_str("</div>")
    }
}

/// The `#message` text input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextInput {
    value: String,
}

impl TextInput {
    /// Current value.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Replaces the value, as typing would.
    pub fn set_value(&mut self, value: impl Into<String>) {
        self.value = value.into();
    }
}

/// Wraps a received payload in a paragraph element.
///
/// String payloads are inserted as-is and other JSON values as their JSON
/// text. Nothing is escaped, so markup in a payload becomes live markup on
/// the page.
// TODO: escape `<`, `>` and `&` in the payload text.
#[must_use]
pub fn render_message(payload: &Value) -> String {
    match payload {
        Value::String(text) => format!("<p>{text}</p>"),
        other => format!("<p>{other}</p>"),
    }
}
