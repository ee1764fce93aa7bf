// Copyright 2025 Crrow
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! File naming for the rotation chain.
//!
//! All files of one queue are derived from a single base name:
//!
//! ```text
//! diskq-data  ──►  diskq-data.1  ──►  diskq-data.2  ──►  ...
//!  (gen 0)          (gen 1)            (gen 2)
//! ```
//!
//! The appender and the tailer each compute names from a generation number,
//! so they agree on the next file without exchanging anything else. The
//! mapping is reversible: [`RotationChain::generation_of`] turns a name back
//! into its generation.

use std::{
    fs,
    path::{Path, PathBuf},
};

use snafu::{ResultExt, ensure};

use crate::{
    Result,
    error::{CreateDirSnafu, InvalidFileNameSnafu, InvalidPathSnafu},
};

/// Base file name used when none is configured.
pub const DEFAULT_FILE_NAME: &str = "diskq-data";

/// Deterministic naming scheme for one queue's data files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RotationChain {
    base: String,
}

impl RotationChain {
    /// Create a chain rooted at `base`.
    ///
    /// The base must be a plain file name: not empty, no path separators, and
    /// not `.` or `..`.
    pub fn new(base: impl Into<String>) -> Result<Self> {
        let base = base.into();
        ensure!(
            !base.is_empty()
                && base != "."
                && base != ".."
                && !base.contains(['/', '\\', '\0']),
            InvalidFileNameSnafu { name: base }
        );
        Ok(Self { base })
    }

    pub fn base(&self) -> &str { &self.base }

    /// Name of the file at `generation`. Generation 0 is the base file.
    pub fn name(&self, generation: u64) -> String {
        if generation == 0 {
            self.base.clone()
        } else {
            format!("{}.{generation}", self.base)
        }
    }

    /// Reverse of [`name`](Self::name). Returns `None` for names that are not
    /// part of this chain.
    pub fn generation_of(&self, name: &str) -> Option<u64> {
        if name == self.base {
            return Some(0);
        }
        let suffix = name.strip_prefix(self.base.as_str())?.strip_prefix('.')?;
        // Only canonical decimal suffixes, so each generation has one name.
        if suffix.is_empty() || suffix.starts_with('0') || !suffix.bytes().all(|b| b.is_ascii_digit())
        {
            return None;
        }
        suffix.parse().ok()
    }

    /// The name `increment` steps after `name` in the chain.
    pub fn next(&self, name: &str, increment: u64) -> Option<String> {
        self.generation_of(name)
            .and_then(|generation| generation.checked_add(increment))
            .map(|generation| self.name(generation))
    }

    /// Names from generation `from` through `to`, inclusive.
    pub fn names(&self, from: u64, to: u64) -> impl Iterator<Item = String> + '_ {
        (from..=to).map(|generation| self.name(generation))
    }
}

impl Default for RotationChain {
    fn default() -> Self {
        Self {
            base: DEFAULT_FILE_NAME.to_owned(),
        }
    }
}

/// Create `dir` if needed and return its canonical absolute path.
pub fn normalize_dir<P: AsRef<Path>>(dir: P) -> Result<PathBuf> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir).context(CreateDirSnafu { path: dir })?;
    fs::canonicalize(dir).context(InvalidPathSnafu { path: dir })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chain_names() {
        let chain = RotationChain::new("data").unwrap();
        assert_eq!(chain.name(0), "data");
        assert_eq!(chain.name(1), "data.1");
        assert_eq!(chain.name(42), "data.42");

        let names: Vec<_> = chain.names(0, 3).collect();
        assert_eq!(names, vec!["data", "data.1", "data.2", "data.3"]);
    }

    #[test]
    fn test_generation_of() {
        let chain = RotationChain::new("data").unwrap();
        for generation in [0, 1, 9, 10, 12_345] {
            assert_eq!(chain.generation_of(&chain.name(generation)), Some(generation));
        }

        assert_eq!(chain.generation_of("data.01"), None);
        assert_eq!(chain.generation_of("data.0"), None);
        assert_eq!(chain.generation_of("data."), None);
        assert_eq!(chain.generation_of("data.x"), None);
        assert_eq!(chain.generation_of("data1"), None);
        assert_eq!(chain.generation_of("other.1"), None);
    }

    #[test]
    fn test_next() {
        let chain = RotationChain::new("q.log").unwrap();
        assert_eq!(chain.next("q.log", 1).as_deref(), Some("q.log.1"));
        assert_eq!(chain.next("q.log.1", 1).as_deref(), Some("q.log.2"));
        assert_eq!(chain.next("q.log.2", 3).as_deref(), Some("q.log.5"));
        assert_eq!(chain.next("elsewhere", 1), None);
        assert_eq!(chain.next(&chain.name(u64::MAX), 1), None);
    }

    #[test]
    fn test_rejects_bad_base() {
        for name in ["", ".", "..", "a/b", "a\\b"] {
            let err = RotationChain::new(name).unwrap_err();
            assert!(matches!(err, crate::QueueError::InvalidFileName { .. }));
        }
        assert_eq!(RotationChain::default().base(), DEFAULT_FILE_NAME);
    }

    #[test]
    fn test_normalize_dir() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let nested = temp_dir.path().join("b").join("c");

        let dir = normalize_dir(&nested).unwrap();
        assert!(dir.is_absolute());
        assert!(dir.is_dir());
        assert_eq!(dir, fs::canonicalize(temp_dir.path().join("b/c")).unwrap());

        // Already present.
        assert_eq!(normalize_dir(&nested).unwrap(), dir);
    }
}
