// src/error.rs
// One error kind per collaborator seam. Render/extraction/persistence failures
// are isolated to the source that hit them; dispatch failures to the recipient.

#[derive(Debug, thiserror::Error)]
pub enum WatchError {
    #[error("render failed for {url}: {reason}")]
    Render { url: String, reason: String },

    #[error("extraction failed: {0}")]
    Extraction(String),

    #[error("persistence failed for {name}: {reason}")]
    Persistence { name: String, reason: String },

    #[error("dispatch failed for {to}: {reason}")]
    Dispatch { to: String, reason: String },
}

impl WatchError {
    pub fn render(url: impl Into<String>, reason: impl ToString) -> Self {
        Self::Render {
            url: url.into(),
            reason: reason.to_string(),
        }
    }

    pub fn extraction(reason: impl ToString) -> Self {
        Self::Extraction(reason.to_string())
    }

    pub fn persistence(name: impl Into<String>, reason: impl ToString) -> Self {
        Self::Persistence {
            name: name.into(),
            reason: reason.to_string(),
        }
    }

    pub fn dispatch(to: impl Into<String>, reason: impl ToString) -> Self {
        Self::Dispatch {
            to: to.into(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, WatchError>;
