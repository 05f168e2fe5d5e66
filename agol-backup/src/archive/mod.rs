//! Archive placement.
//!
//! Each run writes into a dated directory under the archive root:
//!
//! ```text
//! <root>/2024-05-01/Parcels__2024-05-01_0930.zip
//! <root>/2024-05-01/log_2024-05-01_0930.txt
//! <root>/2024-05-01__1/...              second run on the same day
//! ```

mod error;
mod naming;
mod writer;

pub use error::ArchiveError;
pub use naming::{
    archive_file_name, file_name_component, next_available_name, run_directory_name, run_timestamp,
    ARCHIVE_EXTENSION, NAME_SEPARATOR, RUN_DATE_FORMAT, RUN_TIMESTAMP_FORMAT,
};
pub use writer::{create_run_directory, ArchiveWriter};
