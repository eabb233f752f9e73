//! rsync command construction and shell-quoted rendering for logs.

use crate::constants::MIRROR_FLAGS;
use crate::path::with_trailing_separator;
use std::borrow::Cow;
use std::ffi::{OsStr, OsString};
use std::path::Path;

/// Everything that determines the argument list of one transfer.
#[derive(Debug, Clone, Copy)]
pub struct CommandSpec<'a> {
    /// Resolved source directory.
    pub source: &'a Path,
    /// Resolved backup root.
    pub backup_root: &'a Path,
    /// Destination below the backup root.
    pub dest_name: &'a Path,
    pub options: &'a [String],
    /// Normalized exclude patterns.
    pub excludes: &'a [String],
    pub dry_run: bool,
    pub verbose: bool,
}

/// Builds the rsync argument list for `spec`.
///
/// The order is fixed: mirror flags, `-v`, configured options, `--exclude` pairs,
/// `--dry-run`, then source and destination, both with a trailing separator.
/// Nothing here touches the filesystem.
pub fn build_args(spec: &CommandSpec<'_>) -> Vec<OsString> {
    let mut args: Vec<OsString> = MIRROR_FLAGS.iter().map(OsString::from).collect();
    if spec.verbose {
        args.push("-v".into());
    }
    args.extend(spec.options.iter().map(OsString::from));
    for pattern in spec.excludes {
        args.push("--exclude".into());
        args.push(pattern.into());
    }
    if spec.dry_run {
        args.push("--dry-run".into());
    }
    args.push(with_trailing_separator(spec.source));
    args.push(with_trailing_separator(
        &spec.backup_root.join(spec.dest_name),
    ));
    args
}

/// Renders `program` and `args` as a single POSIX shell command line.
///
/// Meant for logs only; the transfer itself is spawned without a shell.
pub fn shell_join<S: AsRef<OsStr>>(program: impl AsRef<OsStr>, args: &[S]) -> String {
    let mut words = vec![shell_quote(program.as_ref())];
    words.extend(args.iter().map(|arg| shell_quote(arg.as_ref())));
    words.join(" ")
}

/// Quotes one argument so that `sh` reads it back as the same single word.
pub fn shell_quote(arg: &OsStr) -> Cow<'_, str> {
    let s = arg.to_string_lossy();
    if !s.is_empty() && s.chars().all(is_shell_safe) {
        return s;
    }
    Cow::Owned(format!("'{}'", s.replace('\'', r"'\''")))
}

fn is_shell_safe(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '/' | ',' | ':' | '=' | '@' | '%' | '+')
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::process::Command;

    fn spec<'a>(options: &'a [String], excludes: &'a [String]) -> CommandSpec<'a> {
        CommandSpec {
            source: Path::new("/a/b"),
            backup_root: Path::new("/backup"),
            dest_name: Path::new("c"),
            options,
            excludes,
            dry_run: false,
            verbose: false,
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_build_args_order() {
        let options = vec!["--foo".to_string()];
        let excludes = vec!["*.tmp".to_string()];
        let args = build_args(&CommandSpec {
            verbose: true,
            ..spec(&options, &excludes)
        });
        assert_eq!(
            args,
            ["-a", "--delete", "-v", "--foo", "--exclude", "*.tmp", "/a/b/", "/backup/c/"]
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_build_args_dry_run_and_multiple_excludes() {
        let options = vec!["--numeric-ids".to_string(), "-H".to_string()];
        let excludes = vec![".cache".to_string(), "*.swp".to_string()];
        let args = build_args(&CommandSpec {
            dry_run: true,
            ..spec(&options, &excludes)
        });
        assert_eq!(
            args,
            [
                "-a",
                "--delete",
                "--numeric-ids",
                "-H",
                "--exclude",
                ".cache",
                "--exclude",
                "*.swp",
                "--dry-run",
                "/a/b/",
                "/backup/c/",
            ]
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_build_args_minimal_is_deterministic() {
        let first = build_args(&spec(&[], &[]));
        assert_eq!(first, ["-a", "--delete", "/a/b/", "/backup/c/"]);
        assert_eq!(first, build_args(&spec(&[], &[])));
    }

    #[test]
    fn test_shell_quote() {
        assert_eq!(shell_quote(OsStr::new("--delete")), "--delete");
        assert_eq!(shell_quote(OsStr::new("/a/b/")), "/a/b/");
        assert_eq!(shell_quote(OsStr::new("")), "''");
        assert_eq!(shell_quote(OsStr::new("*.tmp")), "'*.tmp'");
        assert_eq!(shell_quote(OsStr::new("my dir")), "'my dir'");
        assert_eq!(shell_quote(OsStr::new("it's")), r"'it'\''s'");
    }

    #[test]
    fn test_shell_join() {
        let line = shell_join("rsync", &["-a", "--exclude", "*.tmp", "/my docs/"]);
        assert_eq!(line, "rsync -a --exclude '*.tmp' '/my docs/'");
    }

    #[cfg(unix)]
    #[test]
    fn test_shell_quote_round_trips_through_sh() {
        let args = [
            "plain",
            "with space",
            "it's",
            "''",
            "$HOME",
            "a\"b",
            "back\\slash",
            "*.tmp",
            "",
        ];
        for arg in args {
            let script = format!("printf '%s' {}", shell_quote(OsStr::new(arg)));
            let output = Command::new("sh").arg("-c").arg(&script).output().unwrap();
            assert!(output.status.success(), "{script}");
            assert_eq!(String::from_utf8_lossy(&output.stdout), arg, "{script}");
        }
    }
}
