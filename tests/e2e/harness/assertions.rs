use std::fs;
use std::path::Path;

/// Assert `path` is a symlink whose target is `expected`.
pub fn assert_link_into(path: &Path, expected: &Path) {
    let meta = fs::symlink_metadata(path)
        .unwrap_or_else(|e| panic!("{} should exist: {}", path.display(), e));
    assert!(
        meta.file_type().is_symlink(),
        "{} should be a symlink",
        path.display()
    );
    let target = fs::read_link(path).unwrap();
    assert_eq!(target, expected, "symlink target of {}", path.display());
}

/// Assert `path` is a regular file (not a symlink) with `content`.
pub fn assert_regular_file(path: &Path, content: &[u8]) {
    let meta = fs::symlink_metadata(path)
        .unwrap_or_else(|e| panic!("{} should exist: {}", path.display(), e));
    assert!(
        meta.file_type().is_file(),
        "{} should be a regular file",
        path.display()
    );
    assert_eq!(fs::read(path).unwrap(), content, "content of {}", path.display());
}
