use crate::error::{UnsafePath, UnsafeReason};
use path_clean::PathClean;
use std::env;
use std::ffi::OsString;
use std::path::{Component, MAIN_SEPARATOR_STR, Path, PathBuf};

/// Resolves `path` to an absolute, lexically cleaned path that is safe to mirror into or from.
///
/// A leading `~` or `$HOME` component is replaced with the user's home directory and relative
/// paths are joined onto the current directory. The path does not have to exist.
///
/// # Errors
/// Returns [`UnsafePath`] if the current directory cannot be determined, or if the result is
/// the filesystem root. rsync runs with `--delete`, so a root path would mirror (or wipe) a
/// whole filesystem.
pub fn safe_path(path: impl AsRef<Path>) -> Result<PathBuf, UnsafePath> {
    let path = path.as_ref();
    let unsafe_path = |reason| UnsafePath {
        path: path.to_path_buf(),
        reason,
    };

    let expanded = expand_home(path);
    let absolute = if expanded.is_absolute() {
        expanded
    } else {
        env::current_dir()
            .map_err(|_| unsafe_path(UnsafeReason::Unresolvable))?
            .join(expanded)
    };
    let cleaned = absolute.clean();
    if is_root(&cleaned) {
        return Err(unsafe_path(UnsafeReason::FilesystemRoot));
    }
    Ok(cleaned)
}

/// Returns `path` as an `OsString` ending in exactly one trailing separator.
///
/// rsync copies the *contents* of a source given as `dir/` rather than the directory itself.
pub fn with_trailing_separator(path: &Path) -> OsString {
    let mut s = path.as_os_str().to_os_string();
    if !s.as_encoded_bytes().ends_with(MAIN_SEPARATOR_STR.as_bytes()) {
        s.push(MAIN_SEPARATOR_STR);
    }
    s
}

fn is_root(path: &Path) -> bool {
    path.is_absolute() && path.parent().is_none()
}

fn expand_home(path: &Path) -> PathBuf {
    let mut components = path.components();
    match components.next() {
        Some(Component::Normal(first)) if first == "~" || first == "$HOME" => {
            match dirs::home_dir() {
                Some(home) => home.join(components.as_path()),
                None => path.to_path_buf(),
            }
        }
        _ => path.to_path_buf(),
    }
}
