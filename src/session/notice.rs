use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeKind {
    Success,
    Destructive,
}

/// A one-shot message shown to the user after an action, like a toast.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub kind: NoticeKind,
    pub title: String,
    pub description: String,
}

impl Notice {
    #[must_use]
    pub fn success(title: &str, description: &str) -> Self {
        Self {
            kind: NoticeKind::Success,
            title: title.to_string(),
            description: description.to_string(),
        }
    }

    #[must_use]
    pub fn destructive(title: &str, description: &str) -> Self {
        Self {
            kind: NoticeKind::Destructive,
            title: title.to_string(),
            description: description.to_string(),
        }
    }

    #[must_use]
    pub fn is_destructive(&self) -> bool {
        self.kind == NoticeKind::Destructive
    }

    /// CSS hook used by the templates.
    #[must_use]
    pub fn css_class(&self) -> &'static str {
        match self.kind {
            NoticeKind::Success => "notice notice-success",
            NoticeKind::Destructive => "notice notice-destructive",
        }
    }
}
