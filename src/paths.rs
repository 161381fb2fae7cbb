//! Lexical path helpers shared by the resolver, the walker and history.

use std::path::{Component, Path, PathBuf};

/// Resolve `.` and `..` components without touching the file system.
///
/// `..` at the root of an absolute path is dropped; leading `..` in a
/// relative path is kept.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let popped = matches!(
                    out.components().next_back(),
                    Some(Component::Normal(_))
                ) && out.pop();
                if !popped && !out.has_root() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Make `path` relative to `root` as a forward-slash string.
///
/// Relative inputs are taken as relative to `root`. Returns `None` when the
/// path escapes `root` or normalizes to nothing.
pub fn relative_slash_path(root: &Path, path: &Path) -> Option<String> {
    let joined = if path.is_absolute() {
        normalize(path)
    } else {
        normalize(&root.join(path))
    };
    let rel = joined.strip_prefix(normalize(root)).ok()?;

    let mut parts = Vec::new();
    for component in rel.components() {
        match component {
            Component::Normal(part) => parts.push(part.to_string_lossy().into_owned()),
            _ => return None,
        }
    }

    (!parts.is_empty()).then(|| parts.join("/"))
}

/// Forward-slash form of a path for display and keys.
pub fn to_slash(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize() {
        assert_eq!(normalize(Path::new("/a/b/../c/./d")), PathBuf::from("/a/c/d"));
        assert_eq!(normalize(Path::new("/../a")), PathBuf::from("/a"));
        assert_eq!(normalize(Path::new("../a/../../b")), PathBuf::from("../../b"));
        assert_eq!(normalize(Path::new("a/./b/")), PathBuf::from("a/b"));
    }

    #[test]
    fn test_relative_slash_path() {
        let root = Path::new("/repo");
        assert_eq!(
            relative_slash_path(root, Path::new("/repo/src/a.js")).as_deref(),
            Some("src/a.js")
        );
        assert_eq!(
            relative_slash_path(root, Path::new("src/../lib/b.js")).as_deref(),
            Some("lib/b.js")
        );
        assert_eq!(relative_slash_path(root, Path::new("../outside.js")), None);
        assert_eq!(relative_slash_path(root, Path::new("/elsewhere/a.js")), None);
        assert_eq!(relative_slash_path(root, Path::new("/repo")), None);
    }
}
