//! Discovery of feature documents shipped by mods and by the server operator
//!
//! Sources are applied in order, each layering over the last:
//! 1. the bundled defaults document
//! 2. every mod folder under the first mods directory found
//! 3. the operator override file

use crate::loader::Loader;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Directories searched for mods, relative to the server root
pub const MODS_DIR_CANDIDATES: [&str; 3] = ["mods", "Server/mods", "../mods"];

/// Path of a mod's feature document without its extension
pub const MOD_CONFIG_STEM: &str = "Server/Tamework/Tamework_Items_Config";

/// Operator override document, relative to the server root
pub const OVERRIDE_CONFIG_PATH: &str = "config/Tamework_Items_Config_Override.json";

const MOD_CONFIG_EXTENSIONS: [&str; 2] = ["json", "ron"];

/// Finds and loads feature documents below a server root
#[derive(Debug, Clone)]
pub struct ConfigDiscovery {
    root: PathBuf,
}

impl ConfigDiscovery {
    /// Discover relative to `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The server root being searched
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// First existing mods directory
    pub fn mods_dir(&self) -> Option<PathBuf> {
        MODS_DIR_CANDIDATES
            .iter()
            .map(|candidate| self.root.join(candidate))
            .find(|path| path.is_dir())
    }

    /// Apply every source in order, returning the number of entries loaded
    ///
    /// A failing source is logged and skipped.
    pub fn load_all(&self, loader: &mut Loader) -> usize {
        let mut loaded = match loader.load_bundled() {
            Ok(count) => count,
            Err(e) => {
                warn!(error = %e, "failed to load bundled feature config");
                0
            }
        };
        loaded += self.load_mods(loader);
        loaded += self.load_override(loader);
        loaded
    }

    /// Apply the documents shipped by mod folders, in name order
    pub fn load_mods(&self, loader: &mut Loader) -> usize {
        let Some(mods_dir) = self.mods_dir() else {
            info!(root = %self.root.display(), "no mods directory found for feature config discovery");
            return 0;
        };

        let mut mod_paths = match fs::read_dir(&mods_dir) {
            Ok(entries) => entries
                .filter_map(|entry| entry.ok().map(|entry| entry.path()))
                .collect::<Vec<_>>(),
            Err(e) => {
                warn!(path = %mods_dir.display(), error = %e, "failed to scan mods directory");
                return 0;
            }
        };
        mod_paths.sort();

        let mut loaded = 0;
        for mod_path in mod_paths {
            if mod_path.is_dir() {
                loaded += self.load_mod_folder(loader, &mod_path);
            } else if is_archive(&mod_path) {
                debug!(path = %mod_path.display(), "skipping packed mod archive");
            }
        }
        loaded
    }

    fn load_mod_folder(&self, loader: &mut Loader, mod_path: &Path) -> usize {
        let Some(config_path) = MOD_CONFIG_EXTENSIONS
            .iter()
            .map(|ext| mod_path.join(MOD_CONFIG_STEM).with_extension(ext))
            .find(|path| path.is_file())
        else {
            return 0;
        };

        match loader.load_file(&config_path) {
            Ok(count) => {
                if count > 0 {
                    info!(path = %config_path.display(), entries = count, "loaded feature config from mod");
                }
                count
            }
            Err(e) => {
                warn!(path = %config_path.display(), error = %e, "failed to read mod feature config");
                0
            }
        }
    }

    /// Apply the operator override file, if present
    pub fn load_override(&self, loader: &mut Loader) -> usize {
        let path = self.root.join(OVERRIDE_CONFIG_PATH);
        if !path.is_file() {
            return 0;
        }
        match loader.load_file(&path) {
            Ok(count) => {
                if count > 0 {
                    info!(path = %path.display(), entries = count, "loaded feature config override");
                }
                count
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to read feature config override");
                0
            }
        }
    }
}

fn is_archive(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("zip") || ext.eq_ignore_ascii_case("jar"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn write(path: &Path, content: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn mod_config(root: &Path, mods_dir: &str, mod_name: &str, ext: &str) -> PathBuf {
        root.join(mods_dir)
            .join(mod_name)
            .join(MOD_CONFIG_STEM)
            .with_extension(ext)
    }

    #[test]
    fn test_mods_dir_candidates() {
        let dir = tempdir().unwrap();
        let discovery = ConfigDiscovery::new(dir.path());
        assert_eq!(discovery.mods_dir(), None);

        fs::create_dir_all(dir.path().join("Server/mods")).unwrap();
        assert_eq!(discovery.mods_dir(), Some(dir.path().join("Server/mods")));

        fs::create_dir_all(dir.path().join("mods")).unwrap();
        assert_eq!(discovery.mods_dir(), Some(dir.path().join("mods")));
    }

    #[test]
    fn test_mods_apply_in_name_order_then_override() {
        let dir = tempdir().unwrap();
        write(
            &mod_config(dir.path(), "mods", "a_mod", "json"),
            r#"{ "Items": { "Net": { "Spawner": true, "SpawnerRoleId": "Fox" } } }"#,
        );
        write(
            &mod_config(dir.path(), "mods", "b_mod", "ron"),
            r#"{ "Items": { "Net": { "SpawnerRoleId": "Wolf" } } }"#,
        );
        write(
            &dir.path().join(OVERRIDE_CONFIG_PATH),
            r#"{ "Items": { "Net": { "OwnerRestricted": true } } }"#,
        );

        let discovery = ConfigDiscovery::new(dir.path());
        let mut loader = Loader::new();
        assert_eq!(discovery.load_mods(&mut loader), 2);
        assert_eq!(discovery.load_override(&mut loader), 1);

        let config = loader.registry().get("Net").unwrap();
        assert!(config.spawner_enabled);
        assert!(config.owner_restricted);
        assert_eq!(config.role_id(), Some("Wolf"));
    }

    #[test]
    fn test_broken_source_does_not_stop_others() {
        let dir = tempdir().unwrap();
        write(&mod_config(dir.path(), "mods", "a_broken", "json"), "{ not json");
        write(
            &mod_config(dir.path(), "mods", "b_good", "json"),
            r#"{ "Items": { "Net": { "Spawner": true } } }"#,
        );
        fs::write(dir.path().join("mods").join("packed.zip"), b"PK").unwrap();

        let discovery = ConfigDiscovery::new(dir.path());
        let mut loader = Loader::new();
        let loaded = discovery.load_all(&mut loader);

        assert!(loaded >= 1);
        assert!(loader.registry().get("Net").unwrap().spawner_enabled);
    }

    #[test]
    fn test_no_sources_loads_only_bundled() {
        let dir = tempdir().unwrap();
        let discovery = ConfigDiscovery::new(dir.path());
        let mut loader = Loader::new();
        let loaded = discovery.load_all(&mut loader);
        assert_eq!(loaded, loader.registry().len());
    }
}
