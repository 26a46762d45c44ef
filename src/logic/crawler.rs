//! Corpus Crawler
//!
//! Breadth-first traversal of a directory tree. Produces every non-hidden
//! regular file in discovery order.
//!
//! Symlink policy: symlinked directories are never followed (no cycle
//! tracking needed). A symlink pointing at a regular file is kept.

use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{SamplerError, SamplerResult};

/// A crawled file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorpusEntry {
    pub path: PathBuf,
    pub size: u64,
}

/// Traverses a file system and produces the initial corpus
pub struct SystemReader {
    top_dir: PathBuf,
}

impl SystemReader {
    /// Fails with `Directory` if `top_dir` is not a directory
    pub fn new(top_dir: impl AsRef<Path>) -> SamplerResult<Self> {
        let top_dir = top_dir.as_ref();
        if !top_dir.is_dir() {
            return Err(SamplerError::Directory {
                path: top_dir.to_path_buf(),
                reason: "not a directory".to_string(),
            });
        }
        Ok(Self { top_dir: top_dir.to_path_buf() })
    }

    /// Walk the tree and collect all files
    pub fn run(&self) -> SamplerResult<Vec<CorpusEntry>> {
        let mut files = Vec::new();
        let mut next_dirs = VecDeque::from([self.top_dir.clone()]);

        while let Some(dirname) = next_dirs.pop_front() {
            match self.parse_dir(&dirname, &mut next_dirs, &mut files) {
                Ok(()) => {}
                // The root must be readable, subdirectories may not be
                Err(e) if dirname == self.top_dir => {
                    return Err(SamplerError::Directory {
                        path: dirname,
                        reason: e.to_string(),
                    });
                }
                Err(e) => log::warn!("Skipping unreadable directory {}: {}", dirname.display(), e),
            }
        }

        log::debug!("Crawled {} files under {}", files.len(), self.top_dir.display());
        Ok(files)
    }

    fn parse_dir(
        &self,
        dirname: &Path,
        next_dirs: &mut VecDeque<PathBuf>,
        files: &mut Vec<CorpusEntry>,
    ) -> std::io::Result<()> {
        // Sort for a deterministic order within one directory
        let mut entries = fs::read_dir(dirname)?
            .filter_map(|res| res.ok())
            .collect::<Vec<_>>();
        entries.sort_by_key(|e| e.file_name());

        for entry in entries {
            if is_hidden(&entry.file_name()) {
                continue;
            }
            let path = entry.path();
            let file_type = match entry.file_type() {
                Ok(t) => t,
                Err(_) => continue,
            };

            if file_type.is_dir() {
                next_dirs.push_back(path);
            } else if file_type.is_file() {
                let size = entry.metadata().map(|m| m.len()).unwrap_or(0);
                files.push(CorpusEntry { path, size });
            } else if file_type.is_symlink() {
                // Follow only to regular files
                if let Ok(meta) = fs::metadata(&path) {
                    if meta.is_file() {
                        files.push(CorpusEntry { path, size: meta.len() });
                    }
                }
            }
        }
        Ok(())
    }
}

fn is_hidden(name: &std::ffi::OsStr) -> bool {
    name.to_string_lossy().starts_with('.')
}

/// Convenience: crawl `top_dir` and return file paths only
pub fn crawl(top_dir: impl AsRef<Path>) -> SamplerResult<Vec<PathBuf>> {
    let reader = SystemReader::new(top_dir)?;
    Ok(reader.run()?.into_iter().map(|e| e.path).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use tempfile::tempdir;

    fn touch(path: &Path, content: &[u8]) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_not_a_directory() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("file.txt");
        touch(&file, b"x");

        let err = SystemReader::new(&file).err().unwrap();
        assert!(matches!(err, SamplerError::Directory { .. }));
        assert!(SystemReader::new(dir.path().join("missing")).is_err());
    }

    #[test]
    fn test_finds_all_non_hidden_files() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        touch(&root.join("a.csv"), b"1,2");
        touch(&root.join("sub/b.json"), b"{}");
        touch(&root.join("sub/deeper/c.txt"), b"hello");
        touch(&root.join(".hidden"), b"secret");
        touch(&root.join(".git/config"), b"[core]");
        touch(&root.join("sub/.cache/d.bin"), b"\x00");

        let found: HashSet<PathBuf> = crawl(root).unwrap().into_iter().collect();
        let expected: HashSet<PathBuf> = [
            root.join("a.csv"),
            root.join("sub/b.json"),
            root.join("sub/deeper/c.txt"),
        ]
        .into_iter()
        .collect();

        assert_eq!(found, expected);
    }

    #[test]
    fn test_breadth_first_order() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        touch(&root.join("a/deep/z.txt"), b"z");
        touch(&root.join("b/y.txt"), b"y");
        touch(&root.join("x.txt"), b"x");

        let files = crawl(root).unwrap();
        assert_eq!(files[0], root.join("x.txt"));
        assert_eq!(files[1], root.join("b/y.txt"));
        assert_eq!(files[2], root.join("a/deep/z.txt"));
    }

    #[test]
    fn test_records_sizes() {
        let dir = tempdir().unwrap();
        touch(&dir.path().join("five.bin"), b"12345");

        let entries = SystemReader::new(dir.path()).unwrap().run().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].size, 5);
    }

    #[test]
    fn test_empty_directory() {
        let dir = tempdir().unwrap();
        assert!(crawl(dir.path()).unwrap().is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_does_not_follow_symlinked_dirs() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        touch(&root.join("real/file.txt"), b"data");
        std::os::unix::fs::symlink(root, root.join("real/loop")).unwrap();

        let files = crawl(root).unwrap();
        assert_eq!(files, vec![root.join("real/file.txt")]);
    }
}
