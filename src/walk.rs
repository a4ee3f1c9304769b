use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::error::{Result, UploadError};

/// Walk all regular files under `root`, recursively
///
/// Fails before yielding anything if `root` is missing, unreadable or not a
/// directory. Siblings are visited in file name order. A symbolic link to a
/// regular file is yielded, but linked directories are never descended into.
/// Each call starts a fresh walk.
pub fn walk(root: &Path) -> Result<impl Iterator<Item = Result<PathBuf>> + use<>> {
    let metadata = std::fs::metadata(root).map_err(|e| UploadError::path(root, e))?;
    if !metadata.is_dir() {
        return Err(UploadError::path(
            root,
            io::Error::other("not a directory"),
        ));
    }
    // Probe readability up front so an unreadable root fails eagerly
    std::fs::read_dir(root).map_err(|e| UploadError::path(root, e))?;

    let root = root.to_path_buf();
    let files = WalkDir::new(&root)
        .sort_by_file_name()
        .into_iter()
        .filter_map(move |entry| match entry {
            Ok(entry) if entry.file_type().is_file() => Some(Ok(entry.into_path())),
            Ok(entry) if entry.path_is_symlink() => std::fs::metadata(entry.path())
                .is_ok_and(|target| target.is_file())
                .then(|| Ok(entry.into_path())),
            Ok(_) => None,
            Err(e) => {
                let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| root.clone());
                Some(Err(UploadError::path(path, io::Error::from(e))))
            }
        });

    Ok(files)
}

/// Derive the S3 key for `file` found under `root`
///
/// The key is `prefix` joined with the path of `file` relative to `root`.
/// Separators are always `/`, and an empty prefix adds no leading slash.
pub fn derive_key(root: &Path, file: &Path, prefix: &str) -> Result<String> {
    let relative = file.strip_prefix(root).map_err(|_| {
        UploadError::path(
            file,
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("not under {}", root.display()),
            ),
        )
    })?;

    let relative = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/");

    let key = if prefix.is_empty() {
        relative
    } else if prefix.ends_with('/') || prefix.ends_with('\\') {
        format!("{}{}", prefix, relative)
    } else {
        format!("{}/{}", prefix, relative)
    };

    Ok(key.replace('\\', "/"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use std::fs;
    use tempfile::TempDir;

    fn sample_tree() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.txt"), b"a").unwrap();
        fs::create_dir_all(dir.path().join("sub/deeper")).unwrap();
        fs::write(dir.path().join("sub/b.txt"), b"bb").unwrap();
        fs::write(dir.path().join("sub/deeper/c.bin"), b"ccc").unwrap();
        fs::create_dir(dir.path().join("empty")).unwrap();
        dir
    }

    #[test]
    fn test_walk_yields_only_regular_files() {
        let dir = sample_tree();
        let files: Vec<PathBuf> = walk(dir.path())
            .unwrap()
            .collect::<Result<_>>()
            .unwrap();

        assert_eq!(
            files,
            vec![
                dir.path().join("a.txt"),
                dir.path().join("sub/b.txt"),
                dir.path().join("sub/deeper/c.bin"),
            ]
        );
    }

    #[test]
    fn test_walk_is_restartable() {
        let dir = sample_tree();
        let first: Vec<PathBuf> = walk(dir.path()).unwrap().map(|f| f.unwrap()).collect();
        let second: Vec<PathBuf> = walk(dir.path()).unwrap().map(|f| f.unwrap()).collect();
        assert_eq!(first, second);
        assert_eq!(first.len(), 3);
    }

    #[cfg(unix)]
    #[test]
    fn test_walk_yields_symlinked_files_but_not_linked_dirs() {
        use std::os::unix::fs::symlink;

        let outside = TempDir::new().unwrap();
        fs::write(outside.path().join("real.txt"), b"real").unwrap();
        fs::create_dir(outside.path().join("elsewhere")).unwrap();
        fs::write(outside.path().join("elsewhere/hidden.txt"), b"h").unwrap();

        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.txt"), b"a").unwrap();
        symlink(outside.path().join("real.txt"), dir.path().join("linked.txt")).unwrap();
        symlink(outside.path().join("elsewhere"), dir.path().join("linked_dir")).unwrap();
        symlink(outside.path().join("gone.txt"), dir.path().join("dangling.txt")).unwrap();

        let files: Vec<PathBuf> = walk(dir.path()).unwrap().map(|f| f.unwrap()).collect();

        assert_eq!(
            files,
            vec![dir.path().join("a.txt"), dir.path().join("linked.txt")]
        );
        assert_eq!(
            derive_key(dir.path(), &files[1], "backup").unwrap(),
            "backup/linked.txt"
        );
    }

    #[test]
    fn test_walk_missing_root() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope");
        assert!(matches!(walk(&missing), Err(UploadError::Path { .. })));
    }

    #[test]
    fn test_walk_root_is_file() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("file.txt");
        fs::write(&file, b"x").unwrap();
        assert!(matches!(walk(&file), Err(UploadError::Path { .. })));
    }

    #[test]
    fn test_derive_key_with_prefix() {
        let root = Path::new("data");
        assert_eq!(
            derive_key(root, &root.join("a.txt"), "backup").unwrap(),
            "backup/a.txt"
        );
        assert_eq!(
            derive_key(root, &root.join("sub").join("b.txt"), "backup").unwrap(),
            "backup/sub/b.txt"
        );
        assert_eq!(
            derive_key(root, &root.join("a.txt"), "backup/").unwrap(),
            "backup/a.txt"
        );
    }

    #[test]
    fn test_derive_key_empty_prefix_has_no_leading_slash() {
        let root = Path::new("data");
        assert_eq!(
            derive_key(root, &root.join("sub").join("b.txt"), "").unwrap(),
            "sub/b.txt"
        );
    }

    #[test]
    fn test_derive_key_never_contains_backslash() {
        let root = Path::new("data");
        let key = derive_key(root, &root.join("odd\\name.txt"), "win\\prefix").unwrap();
        assert_eq!(key, "win/prefix/odd/name.txt");
    }

    #[test]
    fn test_derive_key_outside_root() {
        let result = derive_key(Path::new("data"), Path::new("other/a.txt"), "");
        assert!(matches!(result, Err(UploadError::Path { .. })));
    }

    #[test]
    fn test_walked_keys_match_files() {
        let dir = sample_tree();
        let keys: BTreeSet<String> = walk(dir.path())
            .unwrap()
            .map(|f| derive_key(dir.path(), &f.unwrap(), "backup").unwrap())
            .collect();

        let expected: BTreeSet<String> = ["backup/a.txt", "backup/sub/b.txt", "backup/sub/deeper/c.bin"]
            .into_iter()
            .map(String::from)
            .collect();
        assert_eq!(keys, expected);
    }
}
