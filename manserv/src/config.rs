//! Configuration file handling.
//!
//! manserv reads an INI configuration file, by default from the user
//! configuration directory (`~/.config/manserv/config.ini` on Linux):
//!
//! ```ini
//! [server]
//! serving_dir = /srv/docserv
//! listen = localhost:8089
//! index = auxserver.idx
//!
//! [order]
//! products = Tumbleweed, Leap
//!
//! [product.Tumbleweed]
//! aliases = MicroOS, factory
//! cache = /var/cache/manserv/tumbleweed
//! ```
//!
//! Every `[product.<name>]` section declares one product: its aliases
//! (alternative names redirected to the canonical one) and the cache
//! directories scanned for extracted packages. The `[order]` section
//! ranks products for choice lists; unlisted products sort last.

use std::path::{Path, PathBuf};

use ini::Ini;
use thiserror::Error;

/// Error reading or writing the configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read or parsed.
    #[error("cannot read configuration {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: ini::Error,
    },

    /// The file could not be written.
    #[error("cannot write configuration {path:?}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A configured product (suite) and where its extracted packages live.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Product {
    /// Canonical product name ("Tumbleweed").
    pub name: String,

    /// Alternative names redirected to the canonical one.
    pub aliases: Vec<String>,

    /// Cache directories scanned for extracted packages.
    pub cache_dirs: Vec<PathBuf>,
}

/// Server settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Directory holding the rendered documentation tree.
    pub serving_dir: PathBuf,

    /// host:port on which to serve documentation.
    pub listen: String,

    /// Index file name, relative to the serving directory.
    pub index: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            serving_dir: PathBuf::from("/srv/docserv"),
            listen: "localhost:8089".to_string(),
            index: "auxserver.idx".to_string(),
        }
    }
}

/// Loaded configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigFile {
    /// Server settings.
    pub server: ServerConfig,

    /// Configured products, in file order.
    pub products: Vec<Product>,

    /// Product priority for choice lists; first entry ranks highest.
    pub product_order: Vec<String>,
}

/// Default configuration file path (`…/manserv/config.ini`), or `None`
/// when the platform has no user configuration directory.
pub fn config_file_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("manserv").join("config.ini"))
}

impl ConfigFile {
    /// Load a configuration file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let ini = Ini::load_from_file(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::from_ini(&ini))
    }

    /// Load the default configuration file, falling back to defaults
    /// when it does not exist or cannot be read.
    pub fn load_default() -> Self {
        config_file_path()
            .filter(|path| path.exists())
            .and_then(|path| Self::load(&path).ok())
            .unwrap_or_default()
    }

    fn from_ini(ini: &Ini) -> Self {
        let mut config = Self::default();

        if let Some(section) = ini.section(Some("server")) {
            if let Some(value) = section.get("serving_dir") {
                config.server.serving_dir = PathBuf::from(value);
            }
            if let Some(value) = section.get("listen") {
                config.server.listen = value.to_string();
            }
            if let Some(value) = section.get("index") {
                config.server.index = value.to_string();
            }
        }

        if let Some(section) = ini.section(Some("order")) {
            if let Some(value) = section.get("products") {
                config.product_order = split_list(value);
            }
        }

        for (name, properties) in ini.iter() {
            let Some(product_name) = name.and_then(|n| n.strip_prefix("product.")) else {
                continue;
            };
            config.products.push(Product {
                name: product_name.to_string(),
                aliases: properties
                    .get("aliases")
                    .map(split_list)
                    .unwrap_or_default(),
                cache_dirs: properties
                    .get("cache")
                    .map(|value| split_list(value).into_iter().map(PathBuf::from).collect())
                    .unwrap_or_default(),
            });
        }

        config
    }

    /// Write the configuration to `path`, creating parent directories as
    /// needed.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let write_err = |source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        };

        let mut ini = Ini::new();
        ini.with_section(Some("server"))
            .set("serving_dir", self.server.serving_dir.display().to_string())
            .set("listen", self.server.listen.clone())
            .set("index", self.server.index.clone());

        if !self.product_order.is_empty() {
            ini.with_section(Some("order"))
                .set("products", self.product_order.join(", "));
        }

        for product in &self.products {
            let cache = product
                .cache_dirs
                .iter()
                .map(|dir| dir.display().to_string())
                .collect::<Vec<_>>()
                .join(", ");
            ini.with_section(Some(format!("product.{}", product.name)))
                .set("aliases", product.aliases.join(", "))
                .set("cache", cache);
        }

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(write_err)?;
        }
        ini.write_to_file(path).map_err(write_err)
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const SAMPLE: &str = "\
[server]
serving_dir = /srv/docserv
listen = 0.0.0.0:8080
index = auxserver.idx

[order]
products = Tumbleweed, Leap

[product.Tumbleweed]
aliases = MicroOS, factory
cache = /var/cache/manserv/tw

[product.Leap]
cache = /var/cache/manserv/leap-a, /var/cache/manserv/leap-b
";

    fn parse(content: &str) -> ConfigFile {
        ConfigFile::from_ini(&Ini::load_from_str(content).unwrap())
    }

    #[test]
    fn test_parse_server_section() {
        let config = parse(SAMPLE);
        assert_eq!(config.server.serving_dir, PathBuf::from("/srv/docserv"));
        assert_eq!(config.server.listen, "0.0.0.0:8080");
        assert_eq!(config.server.index, "auxserver.idx");
    }

    #[test]
    fn test_parse_products() {
        let config = parse(SAMPLE);
        assert_eq!(config.products.len(), 2);

        let tumbleweed = &config.products[0];
        assert_eq!(tumbleweed.name, "Tumbleweed");
        assert_eq!(tumbleweed.aliases, vec!["MicroOS", "factory"]);
        assert_eq!(
            tumbleweed.cache_dirs,
            vec![PathBuf::from("/var/cache/manserv/tw")]
        );

        let leap = &config.products[1];
        assert_eq!(leap.name, "Leap");
        assert!(leap.aliases.is_empty());
        assert_eq!(leap.cache_dirs.len(), 2);
    }

    #[test]
    fn test_parse_product_order() {
        let config = parse(SAMPLE);
        assert_eq!(config.product_order, vec!["Tumbleweed", "Leap"]);
    }

    #[test]
    fn test_defaults_for_missing_sections() {
        let config = parse("");
        assert_eq!(config, ConfigFile::default());
        assert_eq!(config.server.listen, "localhost:8089");
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.ini");

        let config = parse(SAMPLE);
        config.save(&path).unwrap();
        let loaded = ConfigFile::load(&path).unwrap();

        assert_eq!(loaded, config);
    }

    #[test]
    fn test_save_creates_parent_directory() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested/dir/config.ini");

        ConfigFile::default().save(&path).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_load_missing_file_is_an_error() {
        let err = ConfigFile::load(Path::new("/nonexistent/config.ini")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn test_split_list_trims_and_drops_empties() {
        assert_eq!(split_list("a, b ,,c"), vec!["a", "b", "c"]);
        assert!(split_list("").is_empty());
    }
}
