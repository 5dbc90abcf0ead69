use serde::{Deserialize, Serialize};

use crate::id::Id;

/// kind of a stored object
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectKind {
    Commit,
    Tree,
    Blob,
    Tag,
}

impl ObjectKind {
    /// get the type name for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            ObjectKind::Commit => "commit",
            ObjectKind::Tree => "tree",
            ObjectKind::Blob => "blob",
            ObjectKind::Tag => "tag",
        }
    }
}

impl std::fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.type_name())
    }
}

/// raw file content
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Blob {
    pub content: Vec<u8>,
}

impl Blob {
    pub fn new(content: impl Into<Vec<u8>>) -> Self {
        Self {
            content: content.into(),
        }
    }

    /// size in bytes
    pub fn len(&self) -> usize {
        self.content.len()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}

/// an annotated tag pointing at another object
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    /// tagged object
    pub target: Id,
    /// kind of the tagged object
    pub target_kind: ObjectKind,
    /// tag name
    pub name: String,
    /// tag message
    pub message: String,
}

impl Tag {
    pub fn new(
        target: Id,
        target_kind: ObjectKind,
        name: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            target,
            target_kind,
            name: name.into(),
            message: message.into(),
        }
    }
}
