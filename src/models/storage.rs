use chrono::{DateTime, Utc};

/// Inclusive time bounds. An open end matches everything on that side.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TimeRange {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

impl TimeRange {
    pub fn new(from: Option<DateTime<Utc>>, to: Option<DateTime<Utc>>) -> Self {
        Self { from, to }
    }

    pub fn since(from: DateTime<Utc>) -> Self {
        Self::new(Some(from), None)
    }

    pub fn is_open(&self) -> bool {
        self.from.is_none() && self.to.is_none()
    }
}

/// Criteria for listing chats. Text criteria are substring matches.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterChat {
    id: Option<String>,
    title: Option<String>,
    message_contains: Option<String>,
    created: TimeRange,
    updated: TimeRange,
}

impl FilterChat {
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Match chats having at least one message containing `text`.
    pub fn with_message_contains(mut self, text: impl Into<String>) -> Self {
        self.message_contains = Some(text.into());
        self
    }

    pub fn with_created(mut self, range: TimeRange) -> Self {
        self.created = range;
        self
    }

    pub fn with_updated(mut self, range: TimeRange) -> Self {
        self.updated = range;
        self
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn message_contains(&self) -> Option<&str> {
        self.message_contains.as_deref()
    }

    pub fn created(&self) -> TimeRange {
        self.created
    }

    pub fn updated(&self) -> TimeRange {
        self.updated
    }
}
