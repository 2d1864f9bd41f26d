use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeStatus {
    Added,
    Modified,
    Renamed,
}

impl ChangeStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Added => "added",
            Self::Modified => "modified",
            Self::Renamed => "renamed",
        }
    }
}

/// A file about to be committed. Renames only keep their destination path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "path", rename_all = "snake_case")]
pub enum ChangeEntry {
    Added(String),
    Modified(String),
    RenamedTo(String),
}

impl ChangeEntry {
    #[must_use]
    pub fn path(&self) -> &str {
        match self {
            Self::Added(path) | Self::Modified(path) | Self::RenamedTo(path) => path,
        }
    }

    #[must_use]
    pub const fn status(&self) -> ChangeStatus {
        match self {
            Self::Added(_) => ChangeStatus::Added,
            Self::Modified(_) => ChangeStatus::Modified,
            Self::RenamedTo(_) => ChangeStatus::Renamed,
        }
    }
}
