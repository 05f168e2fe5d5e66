//! Ordered list of services to back up.
//!
//! The catalog is an INI file with one `[service]` section per entry. Entries
//! are processed in file order.
//!
//! ```ini
//! [service]
//! service_id = 0123456789abcdef0123456789abcdef
//! service_name = Parcels
//! layers = 0,1
//! tables = 2
//! ```

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use ini::{Ini, Properties};
use thiserror::Error;
use tracing::{debug, warn};

const SERVICE_SECTION: &str = "service";

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Failed to read catalog {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: ini::Error,
    },

    #[error("Failed to parse catalog: {0}")]
    Parse(#[from] ini::ParseError),

    #[error("Catalog entry {index} is missing required field '{field}'")]
    MissingField { index: usize, field: &'static str },

    #[error("Catalog entry {index} has invalid {field} '{value}': expected comma-separated layer ids")]
    InvalidIds {
        index: usize,
        field: &'static str,
        value: String,
    },

    #[error("Catalog {path} contains no [service] sections")]
    Empty { path: PathBuf },
}

/// One service to back up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    /// Portal item id, matched against each service's `serviceItemId`.
    pub service_id: String,
    /// Display name used in logs and console output.
    pub service_name: String,
    pub layers: Vec<u32>,
    pub tables: Vec<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
}

impl Catalog {
    pub fn new(entries: Vec<CatalogEntry>) -> Self {
        Self { entries }
    }

    /// Load a catalog file. A file without any entry is rejected.
    pub fn load_from(path: &Path) -> Result<Self, CatalogError> {
        let ini = Ini::load_from_file(path).map_err(|source| CatalogError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let catalog = Self::from_ini(&ini)?;
        if catalog.is_empty() {
            return Err(CatalogError::Empty {
                path: path.to_path_buf(),
            });
        }
        debug!(path = %path.display(), entries = catalog.len(), "Loaded catalog");
        Ok(catalog)
    }

    pub fn parse(content: &str) -> Result<Self, CatalogError> {
        let ini = Ini::load_from_str(content)?;
        Self::from_ini(&ini)
    }

    fn from_ini(ini: &Ini) -> Result<Self, CatalogError> {
        let mut seen = HashSet::new();
        let mut entries = Vec::new();

        for (index, section) in ini.section_all(Some(SERVICE_SECTION)).enumerate() {
            let entry = parse_entry(index + 1, section)?;
            if !seen.insert(entry.service_id.clone()) {
                warn!(
                    service_id = %entry.service_id,
                    service = %entry.service_name,
                    "Service listed more than once in catalog"
                );
            }
            entries.push(entry);
        }

        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CatalogEntry> {
        self.entries.iter()
    }
}

fn parse_entry(index: usize, section: &Properties) -> Result<CatalogEntry, CatalogError> {
    Ok(CatalogEntry {
        service_id: required(index, section, "service_id")?,
        service_name: required(index, section, "service_name")?,
        layers: id_list(index, section, "layers")?,
        tables: id_list(index, section, "tables")?,
    })
}

fn required(
    index: usize,
    section: &Properties,
    field: &'static str,
) -> Result<String, CatalogError> {
    section
        .get(field)
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .ok_or(CatalogError::MissingField { index, field })
}

fn id_list(index: usize, section: &Properties, field: &'static str) -> Result<Vec<u32>, CatalogError> {
    let Some(value) = section.get(field) else {
        return Ok(Vec::new());
    };
    value
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            part.parse().map_err(|_| CatalogError::InvalidIds {
                index,
                field,
                value: value.to_string(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const CATALOG: &str = r#"
[service]
service_id = abc
service_name = Parcels
layers = 0, 1
tables = 2

[service]
service_id = def
service_name = Roads
"#;

    #[test]
    fn test_entries_in_file_order() {
        let catalog = Catalog::parse(CATALOG).unwrap();

        assert_eq!(catalog.len(), 2);
        assert_eq!(
            catalog.entries()[0],
            CatalogEntry {
                service_id: "abc".to_string(),
                service_name: "Parcels".to_string(),
                layers: vec![0, 1],
                tables: vec![2],
            }
        );
        assert_eq!(catalog.entries()[1].service_name, "Roads");
        assert!(catalog.entries()[1].layers.is_empty());
    }

    #[test]
    fn test_missing_name() {
        let err = Catalog::parse("[service]\nservice_id = abc\n").unwrap_err();
        assert!(matches!(
            err,
            CatalogError::MissingField {
                index: 1,
                field: "service_name"
            }
        ));
    }

    #[test]
    fn test_invalid_layer_ids() {
        let err =
            Catalog::parse("[service]\nservice_id = a\nservice_name = A\nlayers = 0,x\n").unwrap_err();
        assert!(matches!(err, CatalogError::InvalidIds { field: "layers", .. }));
    }

    #[test]
    fn test_other_sections_ignored() {
        let catalog =
            Catalog::parse("[notes]\nowner = gis\n\n[service]\nservice_id = a\nservice_name = A\n")
                .unwrap();
        assert_eq!(catalog.len(), 1);
    }

    #[test]
    fn test_load_empty_file_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("catalog.ini");
        std::fs::write(&path, "; nothing here\n").unwrap();

        let err = Catalog::load_from(&path).unwrap_err();
        assert!(matches!(err, CatalogError::Empty { .. }));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = Catalog::load_from(&dir.path().join("missing.ini")).unwrap_err();
        assert!(matches!(err, CatalogError::Read { .. }));
    }

    #[test]
    fn test_load_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("catalog.ini");
        std::fs::write(&path, CATALOG).unwrap();

        let catalog = Catalog::load_from(&path).unwrap();
        let names: Vec<_> = catalog.iter().map(|e| e.service_name.as_str()).collect();
        assert_eq!(names, ["Parcels", "Roads"]);
    }
}
