use crate::id::Id;
use crate::types::EntryMode;

/// classification of a single path-level change
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeltaStatus {
    Unmodified,
    Added,
    Deleted,
    Modified,
    Renamed,
    Copied,
    Typechange,
    Ignored,
    Untracked,
}

impl DeltaStatus {
    /// single-letter status code
    pub fn letter(&self) -> char {
        match self {
            DeltaStatus::Unmodified => ' ',
            DeltaStatus::Added => 'A',
            DeltaStatus::Deleted => 'D',
            DeltaStatus::Modified => 'M',
            DeltaStatus::Renamed => 'R',
            DeltaStatus::Copied => 'C',
            DeltaStatus::Typechange => 'T',
            DeltaStatus::Ignored => '!',
            DeltaStatus::Untracked => '?',
        }
    }
}

impl std::fmt::Display for DeltaStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.letter())
    }
}

/// one side of a delta
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DiffFile {
    pub path: String,
    pub id: Id,
    pub mode: EntryMode,
}

impl DiffFile {
    pub fn new(path: impl Into<String>, id: Id, mode: EntryMode) -> Self {
        Self {
            path: path.into(),
            id,
            mode,
        }
    }
}

/// a single path-level change between two trees
///
/// `similarity` is populated only for renamed/copied deltas.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DiffDelta {
    pub status: DeltaStatus,
    pub old: Option<DiffFile>,
    pub new: Option<DiffFile>,
    pub similarity: Option<u8>,
}

impl DiffDelta {
    pub fn added(new: DiffFile) -> Self {
        Self {
            status: DeltaStatus::Added,
            old: None,
            new: Some(new),
            similarity: None,
        }
    }

    pub fn deleted(old: DiffFile) -> Self {
        Self {
            status: DeltaStatus::Deleted,
            old: Some(old),
            new: None,
            similarity: None,
        }
    }

    pub fn modified(old: DiffFile, new: DiffFile) -> Self {
        Self {
            status: DeltaStatus::Modified,
            old: Some(old),
            new: Some(new),
            similarity: None,
        }
    }

    pub fn typechange(old: DiffFile, new: DiffFile) -> Self {
        Self {
            status: DeltaStatus::Typechange,
            old: Some(old),
            new: Some(new),
            similarity: None,
        }
    }

    pub fn unmodified(old: DiffFile, new: DiffFile) -> Self {
        Self {
            status: DeltaStatus::Unmodified,
            old: Some(old),
            new: Some(new),
            similarity: None,
        }
    }

    pub fn renamed(old: DiffFile, new: DiffFile, similarity: u8) -> Self {
        Self {
            status: DeltaStatus::Renamed,
            old: Some(old),
            new: Some(new),
            similarity: Some(similarity),
        }
    }

    pub fn copied(old: DiffFile, new: DiffFile, similarity: u8) -> Self {
        Self {
            status: DeltaStatus::Copied,
            old: Some(old),
            new: Some(new),
            similarity: Some(similarity),
        }
    }

    pub fn untracked(new: DiffFile) -> Self {
        Self {
            status: DeltaStatus::Untracked,
            old: None,
            new: Some(new),
            similarity: None,
        }
    }

    pub fn ignored(new: DiffFile) -> Self {
        Self {
            status: DeltaStatus::Ignored,
            old: None,
            new: Some(new),
            similarity: None,
        }
    }

    /// pre-change path, if the delta has an old side
    pub fn old_path(&self) -> Option<&str> {
        self.old.as_ref().map(|f| f.path.as_str())
    }

    /// post-change path, if the delta has a new side
    pub fn new_path(&self) -> Option<&str> {
        self.new.as_ref().map(|f| f.path.as_str())
    }

    /// display path: the new side when present, otherwise the old
    pub fn path(&self) -> &str {
        self.new
            .as_ref()
            .or(self.old.as_ref())
            .map(|f| f.path.as_str())
            .unwrap_or("")
    }
}

impl std::fmt::Display for DiffDelta {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.status {
            DeltaStatus::Renamed | DeltaStatus::Copied => write!(
                f,
                "{}{} {} -> {}",
                self.status,
                self.similarity.unwrap_or(0),
                self.old_path().unwrap_or(""),
                self.new_path().unwrap_or(""),
            ),
            _ => write!(f, "{} {}", self.status, self.path()),
        }
    }
}

/// origin of a rendered diff line
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LineOrigin {
    /// line present on both sides
    Context,
    /// line only on the new side
    Addition,
    /// line only on the old side
    Deletion,
    /// "no newline at end of file" marker
    EofNoNewline,
    /// file-level header line
    FileHeader,
    /// hunk header line
    HunkHeader,
}

impl LineOrigin {
    /// prefix character for content lines, none for headers/markers
    pub fn prefix(&self) -> Option<char> {
        match self {
            LineOrigin::Context => Some(' '),
            LineOrigin::Addition => Some('+'),
            LineOrigin::Deletion => Some('-'),
            _ => None,
        }
    }
}

/// a contiguous run of changes within a patch
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DiffHunk {
    /// 1-based first line on the old side (0 when the hunk has no old lines)
    pub old_start: u32,
    pub old_lines: u32,
    /// 1-based first line on the new side (0 when the hunk has no new lines)
    pub new_start: u32,
    pub new_lines: u32,
    pub header: String,
}

/// a single rendered diff line, borrowed for the duration of the callback
#[derive(Clone, Copy, Debug)]
pub struct DiffLine<'a> {
    pub origin: LineOrigin,
    pub content: &'a [u8],
    pub old_lineno: Option<u32>,
    pub new_lineno: Option<u32>,
}

impl<'a> DiffLine<'a> {
    pub(crate) fn header(content: &'a [u8], origin: LineOrigin) -> Self {
        Self {
            origin,
            content,
            old_lineno: None,
            new_lineno: None,
        }
    }
}
