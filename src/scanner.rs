//! Directory scanning and dependency-directory detection.
//!
//! The scanner walks a directory tree breadth-first looking for project roots,
//! i.e. directories that directly contain a `package.json` or `composer.json`.
//! For every project root it records the `node_modules/` and `vendor/`
//! directories sitting next to the manifest and then stops: neither the
//! dependency directories nor any other subdirectory of a project root is
//! opened.
//!
//! # Known limitation
//!
//! A `node_modules/` or `vendor/` directory is only recorded when a manifest
//! lives in the *same* directory. One whose project root has no manifest (or
//! whose manifest sits higher up the tree) is invisible to the scan.

use std::{
    collections::VecDeque,
    fs,
    path::{Path, PathBuf},
};

use tracing::debug;

use crate::dependency::{DependencyEntry, DependencyKind, MANIFEST_FILES};

/// Output of a single scan.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ScanResult {
    /// Dependency directories in breadth-first discovery order.
    pub entries: Vec<DependencyEntry>,

    /// Number of directories taken off the queue, including skipped ones.
    pub visited: usize,
}

/// Breadth-first scanner for dependency directories.
///
/// Uses an explicit FIFO queue rather than recursion so deep trees cannot
/// exhaust the stack. Symbolic links are never followed.
#[derive(Clone, Copy, Debug, Default)]
pub struct Scanner;

impl Scanner {
    /// Create a new scanner.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Scan the tree under `root` for dependency directories.
    ///
    /// Never fails: directories that cannot be read (permission denied,
    /// removed mid-walk) are skipped, so an unreadable root simply yields an
    /// empty result.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # use std::path::Path;
    /// # use cull::scanner::Scanner;
    /// let result = Scanner::new().scan(Path::new("/path/to/projects"));
    /// println!("{} found in {} directories", result.entries.len(), result.visited);
    /// ```
    #[must_use]
    pub fn scan(&self, root: &Path) -> ScanResult {
        let root = std::path::absolute(root).unwrap_or_else(|_| root.to_path_buf());

        let mut result = ScanResult::default();
        let mut queue = VecDeque::from([root.clone()]);

        while let Some(dir) = queue.pop_front() {
            result.visited += 1;

            if is_symlink(&dir) {
                debug!("skipping symlink {}", dir.display());
                continue;
            }

            if Self::is_project_root(&dir) {
                Self::record_dependencies(&root, &dir, &mut result.entries);
                continue;
            }

            Self::enqueue_children(&dir, &mut queue);
        }

        result
    }

    /// Whether `dir` directly contains one of the manifest files.
    fn is_project_root(dir: &Path) -> bool {
        MANIFEST_FILES.iter().any(|name| dir.join(name).is_file())
    }

    /// Record the dependency directories of the project root `dir`.
    fn record_dependencies(root: &Path, dir: &Path, entries: &mut Vec<DependencyEntry>) {
        for kind in DependencyKind::ALL {
            let path = dir.join(kind.dir_name());

            let is_real_dir = fs::symlink_metadata(&path).is_ok_and(|m| m.file_type().is_dir());
            if !is_real_dir {
                continue;
            }

            let relative_path = Self::relative_to(root, &path);
            entries.push(DependencyEntry::new(path, relative_path, kind));
        }
    }

    /// Queue every plain subdirectory of `dir` that is not a dependency directory.
    fn enqueue_children(dir: &Path, queue: &mut VecDeque<PathBuf>) {
        let read_dir = match fs::read_dir(dir) {
            Ok(read_dir) => read_dir,
            Err(e) => {
                debug!("cannot read {}: {e}", dir.display());
                return;
            }
        };

        for entry in read_dir {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    debug!("cannot read entry in {}: {e}", dir.display());
                    continue;
                }
            };

            // `DirEntry::file_type` does not follow symlinks.
            let Ok(file_type) = entry.file_type() else {
                continue;
            };
            if !file_type.is_dir() {
                continue;
            }

            let name = entry.file_name();
            if name
                .to_str()
                .and_then(DependencyKind::from_dir_name)
                .is_some()
            {
                continue;
            }

            queue.push_back(entry.path());
        }
    }

    /// `path` with the `root` prefix removed.
    fn relative_to(root: &Path, path: &Path) -> PathBuf {
        path.strip_prefix(root)
            .map_or_else(|_| path.to_path_buf(), Path::to_path_buf)
    }
}

fn is_symlink(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok_and(|m| m.file_type().is_symlink())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    /// Helper to create a file with content, ensuring parent dirs exist.
    fn create_file(path: &Path, content: &str) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    fn relative_paths(result: &ScanResult) -> Vec<PathBuf> {
        result
            .entries
            .iter()
            .map(|e| e.relative_path.clone())
            .collect()
    }

    #[test]
    fn test_node_and_composer_projects() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();

        create_file(&root.join("web/package.json"), "{}");
        fs::create_dir_all(root.join("web/node_modules/react")).unwrap();
        create_file(&root.join("api/composer.json"), "{}");
        fs::create_dir_all(root.join("api/vendor/laravel")).unwrap();

        let result = Scanner::new().scan(root);

        assert_eq!(result.entries.len(), 2);
        let api = result
            .entries
            .iter()
            .find(|e| e.kind == DependencyKind::Vendor)
            .unwrap();
        assert_eq!(api.relative_path, PathBuf::from("api").join("vendor"));
        assert!(api.path.is_absolute());
        assert_eq!(api.size, 0);
    }

    #[test]
    fn test_project_root_with_both_kinds() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();

        create_file(&root.join("app/composer.json"), "{}");
        fs::create_dir_all(root.join("app/node_modules")).unwrap();
        fs::create_dir_all(root.join("app/vendor")).unwrap();

        let result = Scanner::new().scan(root);
        let kinds: Vec<_> = result.entries.iter().map(|e| e.kind).collect();

        assert_eq!(
            kinds,
            vec![DependencyKind::NodeModules, DependencyKind::Vendor]
        );
    }

    #[test]
    fn test_does_not_descend_past_project_root() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();

        create_file(&root.join("outer/package.json"), "{}");
        fs::create_dir_all(root.join("outer/node_modules")).unwrap();
        create_file(&root.join("outer/packages/inner/package.json"), "{}");
        fs::create_dir_all(root.join("outer/packages/inner/node_modules")).unwrap();
        create_file(&root.join("outer/node_modules/dep/package.json"), "{}");
        fs::create_dir_all(root.join("outer/node_modules/dep/node_modules")).unwrap();

        let result = Scanner::new().scan(root);

        assert_eq!(
            relative_paths(&result),
            vec![PathBuf::from("outer").join("node_modules")]
        );
    }

    #[test]
    fn test_no_entry_nested_under_another() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();

        for project in ["a", "a/sub", "b/c", "b/c/d/e"] {
            create_file(&root.join(project).join("package.json"), "{}");
            fs::create_dir_all(root.join(project).join("node_modules/x")).unwrap();
        }

        let result = Scanner::new().scan(root);

        for outer in &result.entries {
            for inner in &result.entries {
                if outer.path != inner.path {
                    assert!(!inner.path.starts_with(&outer.path));
                }
            }
        }
        assert_eq!(result.entries.len(), 2);
    }

    #[test]
    fn test_orphan_dependency_dir_is_not_reported() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();

        fs::create_dir_all(root.join("loose/node_modules/pkg")).unwrap();
        fs::create_dir_all(root.join("loose/vendor")).unwrap();
        // A manifest inside the orphan dir must not be reached either.
        create_file(&root.join("loose/node_modules/pkg/package.json"), "{}");
        fs::create_dir_all(root.join("loose/node_modules/pkg/node_modules")).unwrap();

        let result = Scanner::new().scan(root);

        assert!(result.entries.is_empty());
    }

    #[test]
    fn test_manifest_directory_counts_as_root_without_deps() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();

        create_file(&root.join("app/package.json"), "{}");
        create_file(&root.join("app/sub/package.json"), "{}");
        fs::create_dir_all(root.join("app/sub/node_modules")).unwrap();

        let result = Scanner::new().scan(root);

        assert!(result.entries.is_empty());
    }

    #[test]
    fn test_dependency_file_is_not_recorded() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();

        create_file(&root.join("app/package.json"), "{}");
        create_file(&root.join("app/vendor"), "not a directory");

        let result = Scanner::new().scan(root);

        assert!(result.entries.is_empty());
    }

    #[test]
    fn test_breadth_first_order_and_visit_count() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();

        create_file(&root.join("deep/er/app/package.json"), "{}");
        fs::create_dir_all(root.join("deep/er/app/node_modules")).unwrap();
        create_file(&root.join("shallow/package.json"), "{}");
        fs::create_dir_all(root.join("shallow/node_modules")).unwrap();

        let result = Scanner::new().scan(root);

        assert_eq!(
            relative_paths(&result),
            vec![
                PathBuf::from("shallow").join("node_modules"),
                Path::new("deep").join("er").join("app").join("node_modules"),
            ]
        );
        // root, deep, shallow, deep/er, deep/er/app
        assert_eq!(result.visited, 5);
    }

    #[test]
    fn test_missing_root_yields_empty_result() {
        let tmp = TempDir::new().unwrap();
        let result = Scanner::new().scan(&tmp.path().join("does-not-exist"));

        assert!(result.entries.is_empty());
        assert_eq!(result.visited, 1);
    }

    #[test]
    fn test_root_itself_is_project() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();

        create_file(&root.join("package.json"), "{}");
        fs::create_dir_all(root.join("node_modules")).unwrap();

        let result = Scanner::new().scan(root);

        assert_eq!(relative_paths(&result), vec![PathBuf::from("node_modules")]);
        assert_eq!(result.visited, 1);
    }

    #[test]
    fn test_scan_directory_with_spaces_and_unicode() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();

        create_file(&root.join("my app/café/package.json"), "{}");
        fs::create_dir_all(root.join("my app/café/node_modules")).unwrap();

        let result = Scanner::new().scan(root);

        assert_eq!(
            relative_paths(&result),
            vec![Path::new("my app").join("café").join("node_modules")]
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinked_directories_are_not_followed() {
        use std::os::unix::fs::symlink;

        let outside = TempDir::new().unwrap();
        create_file(&outside.path().join("proj/package.json"), "{}");
        fs::create_dir_all(outside.path().join("proj/node_modules")).unwrap();

        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        symlink(outside.path(), root.join("linked")).unwrap();
        // Link cycle back to the root.
        symlink(root, root.join("loop")).unwrap();

        let result = Scanner::new().scan(root);

        assert!(result.entries.is_empty());
        assert_eq!(result.visited, 1);
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinked_dependency_dir_is_not_recorded() {
        use std::os::unix::fs::symlink;

        let store = TempDir::new().unwrap();
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();

        create_file(&root.join("app/package.json"), "{}");
        symlink(store.path(), root.join("app/node_modules")).unwrap();
        fs::create_dir_all(root.join("app/vendor")).unwrap();

        let result = Scanner::new().scan(root);

        assert_eq!(
            relative_paths(&result),
            vec![PathBuf::from("app").join("vendor")]
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinked_root_is_skipped() {
        use std::os::unix::fs::symlink;

        let real = TempDir::new().unwrap();
        create_file(&real.path().join("app/package.json"), "{}");
        fs::create_dir_all(real.path().join("app/node_modules")).unwrap();

        let tmp = TempDir::new().unwrap();
        let link = tmp.path().join("link");
        symlink(real.path(), &link).unwrap();

        let result = Scanner::new().scan(&link);

        assert!(result.entries.is_empty());
        assert_eq!(result.visited, 1);
    }
}
