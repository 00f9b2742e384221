//! Expands the input paths given on the command line into report files.
use std::path::{Path, PathBuf};

use log::debug;
use walkdir::WalkDir;

use crate::{Error, Result};

const REPORT_EXTENSION: &str = "xml";

/// Resolves every path into the reports to parse.
///
/// Files are taken as they are. Directories contribute their `*.xml`
/// entries, descending into subdirectories only when `recursive` is set.
/// The result is sorted and free of duplicates, which fixes the order
/// reports are merged in.
///
/// ```rust,no_run
/// # use nmap2csv::discovery::discover;
/// let reports = discover(&["scans/"], false).unwrap();
/// ```
pub fn discover<P: AsRef<Path>>(paths: &[P], recursive: bool) -> Result<Vec<PathBuf>> {
    let mut reports = Vec::new();

    for path in paths {
        let path = path.as_ref();
        if path.is_file() {
            reports.push(path.to_path_buf());
        } else if path.is_dir() {
            debug!("Processing directory {}", path.display());
            let walker = WalkDir::new(path)
                .min_depth(1)
                .max_depth(if recursive { usize::MAX } else { 1 });
            for entry in walker {
                let entry = entry?;
                // metadata of the link target, so symlinked reports are kept
                if entry.path().is_file() && is_report(entry.path()) {
                    reports.push(entry.into_path());
                }
            }
        } else {
            return Err(Error::InvalidInput(path.to_path_buf()));
        }
    }

    reports.sort();
    reports.dedup();
    Ok(reports)
}

fn is_report(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case(REPORT_EXTENSION))
}
