//! Distribution table files
//!
//! The combined table is written as `<stem>.csv` in the output directory and
//! each repository's table as `individual_repos/<name>_<stem>.csv`.

use anyhow::Result;
use log::warn;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use super::csv::write_csv;
use crate::stats::{Contents, Distribution};

pub const INDIVIDUAL_DIR: &str = "individual_repos";

/// Keep only ASCII letters, digits, `-` and `_`
pub fn sanitize_file_name(identifier: &str) -> String {
    identifier
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .collect()
}

/// Sanitized file names for a set of identifiers, one per identifier.
///
/// Sanitizing can map two identifiers to the same name (`a/bc`, `ab/c`);
/// later ones get a `-2`, `-3`, ... suffix so no file is overwritten.
pub fn unique_file_names<I, S>(identifiers: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut used = HashSet::new();
    identifiers
        .into_iter()
        .map(|identifier| {
            let identifier = identifier.as_ref();
            let base = sanitize_file_name(identifier);
            let mut name = base.clone();
            let mut suffix = 1;
            while used.contains(&name) {
                suffix += 1;
                name = format!("{}-{}", base, suffix);
            }
            if suffix > 1 {
                warn!(
                    "{}: file name '{}' is already taken, writing as '{}'",
                    identifier, base, name
                );
            }
            used.insert(name.clone());
            name
        })
        .collect()
}

/// Per-repository file name for a distribution table
pub fn individual_file_name(file_name: &str, stem: &str) -> String {
    format!("{}_{}.csv", file_name, stem)
}

/// Write one distribution table and return its path.
///
/// With `file_name` set (see [`unique_file_names`]) the file goes under
/// `individual_repos/`.
pub fn write_distribution<P: AsRef<Path>>(
    output_dir: P,
    file_name: Option<&str>,
    distribution: &Distribution,
    contents: Contents,
) -> Result<PathBuf> {
    let stem = distribution.kind().file_stem(contents);
    let path = match file_name {
        Some(file_name) => output_dir
            .as_ref()
            .join(INDIVIDUAL_DIR)
            .join(individual_file_name(file_name, stem)),
        None => output_dir.as_ref().join(format!("{}.csv", stem)),
    };

    write_csv(&path, &distribution.header(), &distribution.rows(contents))?;
    Ok(path)
}
