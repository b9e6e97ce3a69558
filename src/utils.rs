use std::path::{Component, Path, PathBuf};

/// Highest value a permission literal may carry (setuid/setgid/sticky + rwx x3).
const MAX_MODE: u32 = 0o7777;

/// Turns a relative path from a document into one that cannot leave its root.
///
/// `.` segments are dropped. Returns `None` for absolute paths, `..` segments,
/// and paths that end up empty.
pub fn confine_path(raw: &str) -> Option<PathBuf> {
    let mut confined = PathBuf::new();

    for component in Path::new(raw).components() {
        match component {
            Component::CurDir => {}
            Component::Normal(segment) => confined.push(segment),
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
        }
    }

    if confined.as_os_str().is_empty() {
        None
    } else {
        Some(confined)
    }
}

/// Parses an octal permission literal such as `"755"` or `"0o644"`.
pub fn parse_octal_mode(raw: &str) -> Option<u32> {
    let trimmed = raw.trim();
    let digits = trimmed
        .strip_prefix("0o")
        .or_else(|| trimmed.strip_prefix("0O"))
        .unwrap_or(trimmed);

    if digits.is_empty() {
        return None;
    }

    u32::from_str_radix(digits, 8)
        .ok()
        .filter(|mode| *mode <= MAX_MODE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confine_keeps_nested_relative_paths() {
        assert_eq!(confine_path("a/b.txt"), Some(PathBuf::from("a/b.txt")));
        assert_eq!(confine_path("./a/./b.txt"), Some(PathBuf::from("a/b.txt")));
    }

    #[test]
    fn confine_rejects_escapes() {
        assert_eq!(confine_path("../secret"), None);
        assert_eq!(confine_path("a/../../b"), None);
        assert_eq!(confine_path("/etc/passwd"), None);
        assert_eq!(confine_path(""), None);
        assert_eq!(confine_path("."), None);
    }

    #[test]
    fn octal_modes() {
        assert_eq!(parse_octal_mode("755"), Some(0o755));
        assert_eq!(parse_octal_mode("0644"), Some(0o644));
        assert_eq!(parse_octal_mode("0o600"), Some(0o600));
        assert_eq!(parse_octal_mode("4755"), Some(0o4755));
    }

    #[test]
    fn non_octal_modes_are_rejected() {
        assert_eq!(parse_octal_mode("789"), None);
        assert_eq!(parse_octal_mode("rwx"), None);
        assert_eq!(parse_octal_mode(""), None);
        assert_eq!(parse_octal_mode("-755"), None);
        assert_eq!(parse_octal_mode("17777"), None);
    }
}
