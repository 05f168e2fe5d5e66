//! INI serialization logic for converting `ConfigFile` → INI string.
//!
//! This module contains the `to_config_string()` function that produces
//! the commented INI representation written to `config.ini`.

use std::path::Path;

use super::settings::ConfigFile;

/// Convert a `ConfigFile` to a commented INI string for saving.
pub(super) fn to_config_string(config: &ConfigFile) -> String {
    let services_url = config.portal.services_url.as_deref().unwrap_or("");
    let username = config.portal.username.as_deref().unwrap_or("");
    let log_failures = if config.ledger.log_failures {
        "true"
    } else {
        "false"
    };

    format!(
        r#"[portal]
; Token endpoint used to sign in
token_url = {}
; Referer sent with the token request
referer = {}
; Organization services root (required), e.g.
; https://services1.arcgis.com/<org-id>/ArcGIS/rest/services
services_url = {}
; Account name. Leave empty to be prompted.
; The password is never stored: set AGOL_PASSWORD or enter it when prompted.
username = {}

[catalog]
; Services to back up, one [service] section per entry:
;   [service]
;   service_id = <item id>
;   service_name = Parcels
;   layers = 0,1
;   tables = 2
file = {}

[archive]
; Root directory. Each run writes into a dated subdirectory.
directory = {}

[polling]
; Seconds between replica status requests (default: 5)
interval_secs = {}
; Maximum status requests per replica, 0 = wait until the job finishes (default: 0)
max_attempts = {}

[ledger]
; Also record skipped services in the run ledger (default: false)
log_failures = {}

[http]
; Timeout in seconds for portal requests (default: 60)
timeout_secs = {}
; Timeout in seconds for archive downloads (default: 3600)
download_timeout_secs = {}

[logging]
; Log file, cleared at the start of each run
file = {}
"#,
        config.portal.token_url,
        config.portal.referer,
        services_url,
        username,
        path_to_string(&config.catalog.file),
        path_to_string(&config.archive.directory),
        config.polling.interval_secs,
        config.polling.max_attempts,
        log_failures,
        config.http.timeout_secs,
        config.http.download_timeout_secs,
        path_to_string(&config.logging.file),
    )
}

fn path_to_string(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_string_has_all_sections() {
        let content = to_config_string(&ConfigFile::default());
        for section in [
            "[portal]", "[catalog]", "[archive]", "[polling]", "[ledger]", "[http]", "[logging]",
        ] {
            assert!(content.contains(section), "missing {}", section);
        }
        assert!(content.contains("max_attempts = 0"));
        assert!(content.contains("log_failures = false"));
    }

    #[test]
    fn test_password_is_never_written() {
        let content = to_config_string(&ConfigFile::default());
        assert!(!content.contains("password ="));
    }
}
