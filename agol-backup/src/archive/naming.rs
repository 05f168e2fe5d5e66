//! Deterministic naming for run directories, archives and ledgers.

use chrono::{DateTime, NaiveDate, TimeZone};

/// Separator between a base name and its suffix (`2024-05-01__2`,
/// `Parcels__2024-05-01_0930.zip`).
pub const NAME_SEPARATOR: &str = "__";

/// Format of the run timestamp embedded in archive and ledger names.
pub const RUN_TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H%M";

/// Format of the dated run directory name.
pub const RUN_DATE_FORMAT: &str = "%Y-%m-%d";

pub const ARCHIVE_EXTENSION: &str = "zip";

/// First name in `base, base__1, base__2, ...` for which `exists` is false.
///
/// Pure: the caller decides what "exists" means, so the function can be
/// tested without touching a filesystem.
pub fn next_available_name<F>(base: &str, mut exists: F) -> String
where
    F: FnMut(&str) -> bool,
{
    if !exists(base) {
        return base.to_string();
    }
    let mut n: u32 = 1;
    loop {
        let candidate = format!("{}{}{}", base, NAME_SEPARATOR, n);
        if !exists(&candidate) {
            return candidate;
        }
        n += 1;
    }
}

/// Run directory base name, e.g. `2024-05-01`.
pub fn run_directory_name(date: NaiveDate) -> String {
    date.format(RUN_DATE_FORMAT).to_string()
}

/// Run timestamp, e.g. `2024-05-01_0930`.
pub fn run_timestamp<Tz: TimeZone>(at: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    at.format(RUN_TIMESTAMP_FORMAT).to_string()
}

/// Archive file name, e.g. `Parcels__2024-05-01_0930.zip`.
///
/// The service name passes through [`file_name_component`], so the result
/// is always a single file name inside the run directory.
pub fn archive_file_name(service_name: &str, run_timestamp: &str) -> String {
    format!(
        "{}{}{}.{}",
        file_name_component(service_name),
        NAME_SEPARATOR,
        run_timestamp,
        ARCHIVE_EXTENSION
    )
}

/// Replace path separators, characters Windows forbids in file names and
/// control characters with `_`.
pub fn file_name_component(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Local;
    use std::collections::HashSet;

    #[test]
    fn test_unused_base_is_returned() {
        assert_eq!(next_available_name("2024-05-01", |_| false), "2024-05-01");
    }

    #[test]
    fn test_first_free_suffix() {
        let taken: HashSet<&str> = ["2024-05-01", "2024-05-01__1", "2024-05-01__2"]
            .into_iter()
            .collect();
        assert_eq!(
            next_available_name("2024-05-01", |name| taken.contains(name)),
            "2024-05-01__3"
        );
    }

    #[test]
    fn test_gap_in_suffixes_is_reused() {
        let taken: HashSet<&str> = ["run", "run__2"].into_iter().collect();
        assert_eq!(next_available_name("run", |name| taken.contains(name)), "run__1");
    }

    #[test]
    fn test_run_names() {
        let at = Local.with_ymd_and_hms(2024, 5, 1, 9, 30, 12).unwrap();
        assert_eq!(run_directory_name(at.date_naive()), "2024-05-01");
        assert_eq!(run_timestamp(&at), "2024-05-01_0930");
        assert_eq!(
            archive_file_name("Parcels", &run_timestamp(&at)),
            "Parcels__2024-05-01_0930.zip"
        );
    }

    #[test]
    fn test_service_name_cannot_leave_directory() {
        assert_eq!(
            archive_file_name("../escaped", "2024-05-01_0930"),
            ".._escaped__2024-05-01_0930.zip"
        );
        assert_eq!(
            archive_file_name("Roads/Centerlines", "2024-05-01_0930"),
            "Roads_Centerlines__2024-05-01_0930.zip"
        );
        assert_eq!(file_name_component(r"C:\tmp\x"), "C__tmp_x");
        assert_eq!(file_name_component("Parcels 2024"), "Parcels 2024");
    }
}
