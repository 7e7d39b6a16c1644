use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use config::{Config, Environment};
use serde::Deserialize;

/// Docset layout, overridable through `DOCSET_*` environment variables.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Extension of the pages to index, without the dot.
    pub page_extension: String,
    /// Folder holding the pages, relative to the docset root.
    pub documents_subpath: PathBuf,
    /// SQLite index, relative to the docset root.
    pub index_subpath: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            page_extension: "shtml".to_string(),
            documents_subpath: PathBuf::from("Contents/Resources/Documents"),
            index_subpath: PathBuf::from("Contents/Resources/docSet.dsidx"),
        }
    }
}

impl Settings {
    pub fn load() -> Result<Settings> {
        Self::from_config(
            Config::builder()
                .add_source(Environment::with_prefix("DOCSET"))
                .build()?,
        )
    }

    fn from_config(config: Config) -> Result<Settings> {
        config
            .try_deserialize()
            .context("Invalid DOCSET_* settings")
    }

    pub fn documents_dir(&self, docset: &Path) -> PathBuf {
        docset.join(&self.documents_subpath)
    }

    pub fn index_path(&self, docset: &Path) -> PathBuf {
        docset.join(&self.index_subpath)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_follow_docset_layout() {
        let s = Settings::from_config(Config::builder().build().unwrap()).unwrap();
        assert_eq!(s, Settings::default());
        let root = Path::new("/tmp/IDA.docset");
        assert_eq!(
            s.documents_dir(root),
            PathBuf::from("/tmp/IDA.docset/Contents/Resources/Documents")
        );
        assert_eq!(
            s.index_path(root),
            PathBuf::from("/tmp/IDA.docset/Contents/Resources/docSet.dsidx")
        );
    }

    #[test]
    fn overrides_single_field() {
        let config = Config::builder()
            .set_override("page_extension", "html")
            .unwrap()
            .build()
            .unwrap();
        let s = Settings::from_config(config).unwrap();
        assert_eq!(s.page_extension, "html");
        assert_eq!(s.documents_subpath, Settings::default().documents_subpath);
    }
}
