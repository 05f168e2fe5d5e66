//! INI parsing logic for converting `Ini` → `ConfigFile`.
//!
//! This module contains the `parse_ini()` function and its helpers.
//! It is the single place where INI key names are mapped to struct fields.

use ini::Ini;
use std::path::PathBuf;
use std::str::FromStr;

use super::file::ConfigFileError;
use super::settings::ConfigFile;

/// Parse an `Ini` object into a `ConfigFile`.
///
/// Starts from `ConfigFile::default()` and overlays any values found in the INI.
pub(super) fn parse_ini(ini: &Ini) -> Result<ConfigFile, ConfigFileError> {
    let mut config = ConfigFile::default();

    // [portal] section
    if let Some(section) = ini.section(Some("portal")) {
        if let Some(v) = non_empty(section.get("token_url")) {
            config.portal.token_url = parse_url("portal", "token_url", v)?;
        }
        if let Some(v) = non_empty(section.get("referer")) {
            config.portal.referer = v.to_string();
        }
        if let Some(v) = non_empty(section.get("services_url")) {
            config.portal.services_url = Some(parse_url("portal", "services_url", v)?);
        }
        if let Some(v) = non_empty(section.get("username")) {
            config.portal.username = Some(v.to_string());
        }
    }

    // [catalog] section
    if let Some(section) = ini.section(Some("catalog")) {
        if let Some(v) = non_empty(section.get("file")) {
            config.catalog.file = expand_tilde(v);
        }
    }

    // [archive] section
    if let Some(section) = ini.section(Some("archive")) {
        if let Some(v) = non_empty(section.get("directory")) {
            config.archive.directory = expand_tilde(v);
        }
    }

    // [polling] section
    if let Some(section) = ini.section(Some("polling")) {
        if let Some(v) = section.get("interval_secs") {
            let secs: u64 = parse_number("polling", "interval_secs", v, "a positive integer (seconds)")?;
            if secs == 0 {
                return Err(ConfigFileError::InvalidValue {
                    section: "polling".to_string(),
                    key: "interval_secs".to_string(),
                    value: v.to_string(),
                    reason: "must be at least 1 second".to_string(),
                });
            }
            config.polling.interval_secs = secs;
        }
        if let Some(v) = section.get("max_attempts") {
            config.polling.max_attempts = parse_number(
                "polling",
                "max_attempts",
                v,
                "a non-negative integer (0 = unbounded)",
            )?;
        }
    }

    // [ledger] section
    if let Some(section) = ini.section(Some("ledger")) {
        if let Some(v) = section.get("log_failures") {
            config.ledger.log_failures = parse_bool("ledger", "log_failures", v)?;
        }
    }

    // [http] section
    if let Some(section) = ini.section(Some("http")) {
        if let Some(v) = section.get("timeout_secs") {
            config.http.timeout_secs =
                parse_number("http", "timeout_secs", v, "a positive integer (seconds)")?;
        }
        if let Some(v) = section.get("download_timeout_secs") {
            config.http.download_timeout_secs = parse_number(
                "http",
                "download_timeout_secs",
                v,
                "a positive integer (seconds)",
            )?;
        }
    }

    // [logging] section
    if let Some(section) = ini.section(Some("logging")) {
        if let Some(v) = non_empty(section.get("file")) {
            config.logging.file = expand_tilde(v);
        }
    }

    Ok(config)
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn parse_number<N: FromStr>(
    section: &str,
    key: &str,
    value: &str,
    expected: &str,
) -> Result<N, ConfigFileError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigFileError::InvalidValue {
            section: section.to_string(),
            key: key.to_string(),
            value: value.to_string(),
            reason: format!("must be {}", expected),
        })
}

fn parse_bool(section: &str, key: &str, value: &str) -> Result<bool, ConfigFileError> {
    match value.trim().to_lowercase().as_str() {
        "true" | "yes" | "1" | "on" => Ok(true),
        "false" | "no" | "0" | "off" => Ok(false),
        _ => Err(ConfigFileError::InvalidValue {
            section: section.to_string(),
            key: key.to_string(),
            value: value.to_string(),
            reason: "must be true or false".to_string(),
        }),
    }
}

fn parse_url(section: &str, key: &str, value: &str) -> Result<String, ConfigFileError> {
    if value.starts_with("https://") || value.starts_with("http://") {
        Ok(value.trim_end_matches('/').to_string())
    } else {
        Err(ConfigFileError::InvalidValue {
            section: section.to_string(),
            key: key.to_string(),
            value: value.to_string(),
            reason: "must be an http:// or https:// URL".to_string(),
        })
    }
}

/// Expand a leading `~/` to the user's home directory.
pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::defaults::*;
    use tempfile::TempDir;

    fn load(content: &str) -> Result<ConfigFile, ConfigFileError> {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.ini");
        std::fs::write(&config_path, content).unwrap();
        ConfigFile::load_from(&config_path)
    }

    #[test]
    fn test_full_config() {
        let config = load(
            r#"
[portal]
token_url = https://gis.example.org/portal/sharing/rest/generateToken
referer = https://gis.example.org
services_url = https://services1.arcgis.com/Org/ArcGIS/rest/services/
username = gis_admin

[catalog]
file = /etc/agol/catalog.ini

[archive]
directory = /mnt/backups

[polling]
interval_secs = 10
max_attempts = 360

[ledger]
log_failures = yes

[http]
timeout_secs = 30
download_timeout_secs = 600

[logging]
file = /var/log/agol-backup.log
"#,
        )
        .unwrap();

        assert_eq!(
            config.portal.token_url,
            "https://gis.example.org/portal/sharing/rest/generateToken"
        );
        assert_eq!(config.portal.referer, "https://gis.example.org");
        assert_eq!(
            config.portal.services_url.as_deref(),
            Some("https://services1.arcgis.com/Org/ArcGIS/rest/services")
        );
        assert_eq!(config.portal.username.as_deref(), Some("gis_admin"));
        assert_eq!(config.catalog.file, PathBuf::from("/etc/agol/catalog.ini"));
        assert_eq!(config.archive.directory, PathBuf::from("/mnt/backups"));
        assert_eq!(config.polling.interval_secs, 10);
        assert_eq!(config.polling.max_attempts, 360);
        assert!(config.ledger.log_failures);
        assert_eq!(config.http.timeout_secs, 30);
        assert_eq!(config.http.download_timeout_secs, 600);
        assert_eq!(config.logging.file, PathBuf::from("/var/log/agol-backup.log"));
    }

    #[test]
    fn test_partial_config() {
        let config = load("[polling]\nmax_attempts = 12\n").unwrap();

        assert_eq!(config.polling.max_attempts, 12);
        assert_eq!(config.polling.interval_secs, 5);
        assert_eq!(config.ledger.log_failures, DEFAULT_LOG_FAILURES);
        assert!(config.portal.services_url.is_none());
    }

    #[test]
    fn test_empty_values_keep_defaults() {
        let config = load("[portal]\nusername =\nservices_url = \n").unwrap();
        assert!(config.portal.username.is_none());
        assert!(config.portal.services_url.is_none());
    }

    #[test]
    fn test_invalid_poll_interval() {
        let err = load("[polling]\ninterval_secs = soon\n").unwrap_err();
        assert!(err.to_string().contains("interval_secs"));

        let err = load("[polling]\ninterval_secs = 0\n").unwrap_err();
        assert!(err.to_string().contains("at least 1 second"));
    }

    #[test]
    fn test_invalid_bool() {
        let err = load("[ledger]\nlog_failures = maybe\n").unwrap_err();
        assert!(matches!(err, ConfigFileError::InvalidValue { ref key, .. } if key == "log_failures"));
    }

    #[test]
    fn test_invalid_services_url() {
        let err = load("[portal]\nservices_url = services1.arcgis.com\n").unwrap_err();
        assert!(err.to_string().contains("services_url"));
    }

    #[test]
    fn test_expand_tilde() {
        let path = expand_tilde("~/test/path");
        if let Some(home) = dirs::home_dir() {
            assert_eq!(path, home.join("test/path"));
        }

        // Non-tilde paths should be unchanged
        let path = expand_tilde("/absolute/path");
        assert_eq!(path, PathBuf::from("/absolute/path"));
    }
}
