use glob::Pattern;

use crate::error::{Error, Result};

/// path filter evaluated on full relative paths
///
/// each spec is either a glob pattern or a literal path; a literal that
/// names a directory matches everything underneath it. an empty pathspec
/// matches every path.
#[derive(Clone, Debug)]
pub struct Pathspec {
    specs: Vec<Spec>,
}

#[derive(Clone, Debug)]
struct Spec {
    raw: String,
    pattern: Pattern,
}

impl Pathspec {
    pub fn new<I, T>(specs: I) -> Result<Self>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        let mut compiled = Vec::new();
        for spec in specs {
            let raw = spec.as_ref().trim_end_matches('/').to_string();
            let pattern =
                Pattern::new(&raw).map_err(|e| Error::InvalidPathspec(format!("{}: {}", raw, e)))?;
            compiled.push(Spec { raw, pattern });
        }
        Ok(Self { specs: compiled })
    }

    /// pathspec that matches everything
    pub fn any() -> Self {
        Self { specs: Vec::new() }
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    /// does the given relative path match
    pub fn matches(&self, path: &str) -> bool {
        if self.specs.is_empty() {
            return true;
        }
        self.specs.iter().any(|spec| {
            spec.pattern.matches(path)
                || path
                    .strip_prefix(spec.raw.as_str())
                    .is_some_and(|rest| rest.starts_with('/'))
        })
    }
}
