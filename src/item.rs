use serde::Deserialize;
use std::io;
use std::path::{Component, Path, PathBuf};

/// A single backup unit: one source directory mirrored into `backup_root/<dest>`.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Item {
    /// Optional display name used in log lines.
    #[serde(default)]
    pub name: Option<String>,
    /// Source directory path, as written in the configuration.
    #[serde(rename = "path", default)]
    pub source: PathBuf,
    /// Optional destination name below the backup root.
    #[serde(rename = "dest", default)]
    pub dest_name: Option<String>,
}

impl Item {
    pub fn new(source: impl Into<PathBuf>) -> Self {
        Self {
            name: None,
            source: source.into(),
            dest_name: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_dest(mut self, dest_name: impl Into<String>) -> Self {
        self.dest_name = Some(dest_name.into());
        self
    }

    /// Label used to identify the item in reports: its name, or the base name of its source.
    pub fn label(&self) -> String {
        if let Some(name) = self.name.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
            return name.to_string();
        }
        match self.source.file_name() {
            Some(base) => base.to_string_lossy().into_owned(),
            None => self.source.display().to_string(),
        }
    }

    /// Relative destination below the backup root.
    ///
    /// Uses the configured `dest` when present, otherwise the last component of the resolved
    /// source path.
    ///
    /// # Errors
    /// Returns an `InvalidInput` error if no name can be derived, or if the configured name is
    /// absolute or climbs out of the backup root with `..`.
    pub fn dest_name_for(&self, resolved_source: &Path) -> io::Result<PathBuf> {
        let configured = self
            .dest_name
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty());
        let dest = match configured {
            Some(dest) => PathBuf::from(dest),
            None => resolved_source
                .file_name()
                .map(PathBuf::from)
                .ok_or_else(|| invalid_dest("no destination name can be derived from the source"))?,
        };

        let mut normal = 0;
        for component in dest.components() {
            match component {
                Component::Normal(_) => normal += 1,
                Component::CurDir => {}
                _ => return Err(invalid_dest("destination name must stay below the backup root")),
            }
        }
        if normal == 0 {
            return Err(invalid_dest("destination name is empty"));
        }
        Ok(dest)
    }
}

fn invalid_dest(msg: &str) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidInput, msg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label() {
        assert_eq!(Item::new("/srv/www").label(), "www");
        assert_eq!(Item::new("/srv/www/").label(), "www");
        assert_eq!(Item::new("/srv/www").with_name("site").label(), "site");
        assert_eq!(Item::new("/srv/www").with_name("  ").label(), "www");
        assert_eq!(Item::new("/").label(), "/");
    }

    #[test]
    fn test_dest_name_defaults_to_source_base_name() {
        let item = Item::new("~/projects");
        let dest = item.dest_name_for(Path::new("/home/u/projects")).unwrap();
        assert_eq!(dest, PathBuf::from("projects"));
    }

    #[test]
    fn test_dest_name_configured() {
        let item = Item::new("/srv/www").with_dest("hosts/web1");
        let dest = item.dest_name_for(Path::new("/srv/www")).unwrap();
        assert_eq!(dest, PathBuf::from("hosts/web1"));
    }

    #[test]
    fn test_dest_name_rejects_escapes() {
        for bad in ["..", "../x", "a/../../b", "/abs", "."] {
            let item = Item::new("/srv/www").with_dest(bad);
            let err = item.dest_name_for(Path::new("/srv/www")).unwrap_err();
            assert_eq!(err.kind(), io::ErrorKind::InvalidInput, "{bad}");
        }
    }

    #[test]
    fn test_item_deserialize() {
        #[derive(Deserialize)]
        struct Doc {
            items: Vec<Item>,
        }
        let doc: Doc = toml::from_str(
            r#"
            [[items]]
            name = "home"
            path = "~/"
            dest = "home"

            [[items]]
            path = "/srv/www"
            "#,
        )
        .unwrap();
        assert_eq!(
            doc.items,
            vec![
                Item::new("~/").with_name("home").with_dest("home"),
                Item::new("/srv/www"),
            ]
        );
    }
}
