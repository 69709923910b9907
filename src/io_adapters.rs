use std::io::Cursor;

/// Single-slot, memory-backed stream connecting two pipeline stages.
///
/// A stage writes its whole result into the slot; the next stage reads it back
/// once the previous one has finished. An empty slot (`None`) is different
/// from a slot holding the empty string: it means nothing was written at all.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Buffer {
    content: Option<String>,
}

impl Buffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// A buffer already holding `content`.
    pub fn with_content(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
        }
    }

    /// Replace the slot's content.
    pub fn write(&mut self, content: impl Into<String>) {
        self.content = Some(content.into());
    }

    pub fn read(&self) -> Option<&str> {
        self.content.as_deref()
    }

    /// Content as text; an empty slot reads as the empty string.
    pub fn text(&self) -> &str {
        self.read().unwrap_or_default()
    }

    /// Memory reader over the content, for code written against `std::io::Read`.
    pub fn reader(&self) -> Cursor<&[u8]> {
        Cursor::new(self.text().as_bytes())
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_none()
    }

    pub fn clear(&mut self) {
        self.content = None;
    }

    pub fn into_inner(self) -> Option<String> {
        self.content
    }
}
