use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::id::Id;
use crate::types::ObjectKind;

/// a directory tree - collection of entries sorted by name
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tree {
    entries: Vec<TreeEntry>,
}

impl Tree {
    /// create a new tree, validating and sorting entries
    pub fn new(mut entries: Vec<TreeEntry>) -> Result<Self> {
        // validate entry names
        for entry in &entries {
            validate_entry_name(&entry.name)?;
        }

        // sort by name (byte-wise)
        entries.sort_by(|a, b| a.name.as_bytes().cmp(b.name.as_bytes()));

        // check for duplicates
        for window in entries.windows(2) {
            if window[0].name == window[1].name {
                return Err(Error::DuplicateEntryName(window[0].name.clone()));
            }
        }

        Ok(Self { entries })
    }

    /// create an empty tree
    pub fn empty() -> Self {
        Self { entries: vec![] }
    }

    /// get entries slice
    pub fn entries(&self) -> &[TreeEntry] {
        &self.entries
    }

    /// consume and return entries
    pub fn into_entries(self) -> Vec<TreeEntry> {
        self.entries
    }

    /// look up entry by name
    pub fn get(&self, name: &str) -> Option<&TreeEntry> {
        self.entries
            .binary_search_by(|e| e.name.as_bytes().cmp(name.as_bytes()))
            .ok()
            .map(|i| &self.entries[i])
    }

    /// number of direct entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// is tree empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// validate an entry name
fn validate_entry_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::InvalidEntryName("empty name".to_string()));
    }
    if name.contains('/') {
        return Err(Error::InvalidEntryName(format!(
            "name contains '/': {}",
            name
        )));
    }
    if name.contains('\0') {
        return Err(Error::InvalidEntryName(format!(
            "name contains null byte: {}",
            name
        )));
    }
    if name == "." || name == ".." {
        return Err(Error::InvalidEntryName(format!("reserved name: {}", name)));
    }
    Ok(())
}

/// a single entry in a tree
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeEntry {
    pub name: String,
    pub mode: EntryMode,
    pub target: Id,
}

impl TreeEntry {
    pub fn new(name: impl Into<String>, mode: EntryMode, target: Id) -> Self {
        Self {
            name: name.into(),
            mode,
            target,
        }
    }

    /// kind of object this entry points at
    pub fn target_kind(&self) -> ObjectKind {
        self.mode.target_kind()
    }
}

/// entry mode
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryMode {
    /// regular file
    Regular,
    /// regular file with the executable bit
    Executable,
    /// symbolic link
    Symlink,
    /// commit in a foreign repository
    Submodule,
    /// nested tree
    Subtree,
}

/// coarse classification used to tell a content edit from a type change
///
/// regular and executable files share a class: flipping the executable bit
/// is a modification, not a type change.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntryClass {
    File,
    Symlink,
    Submodule,
    Subtree,
}

impl EntryMode {
    /// get the type name for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            EntryMode::Regular => "regular",
            EntryMode::Executable => "executable",
            EntryMode::Symlink => "symlink",
            EntryMode::Submodule => "submodule",
            EntryMode::Subtree => "subtree",
        }
    }

    /// kind of object an entry with this mode points at
    pub fn target_kind(&self) -> ObjectKind {
        match self {
            EntryMode::Subtree => ObjectKind::Tree,
            EntryMode::Submodule => ObjectKind::Commit,
            _ => ObjectKind::Blob,
        }
    }

    /// coarse class for diff classification
    pub fn class(&self) -> EntryClass {
        match self {
            EntryMode::Regular | EntryMode::Executable => EntryClass::File,
            EntryMode::Symlink => EntryClass::Symlink,
            EntryMode::Submodule => EntryClass::Submodule,
            EntryMode::Subtree => EntryClass::Subtree,
        }
    }

    /// is this a nested tree entry
    pub fn is_subtree(&self) -> bool {
        matches!(self, EntryMode::Subtree)
    }

    /// octal mode string in the conventional on-wire form
    pub fn as_octal(&self) -> &'static str {
        match self {
            EntryMode::Regular => "100644",
            EntryMode::Executable => "100755",
            EntryMode::Symlink => "120000",
            EntryMode::Submodule => "160000",
            EntryMode::Subtree => "040000",
        }
    }
}
