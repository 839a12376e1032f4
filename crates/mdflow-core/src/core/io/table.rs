use crate::core::models::results::ResultRow;
use chrono::Local;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const PARTIAL_PREFIX: &str = "partial_";
pub const TABLE_EXTENSION: &str = "csv";

/// Column order of every result table.
pub const HEADERS: [&str; 19] = [
    "kind",
    "name",
    "equilibration_index",
    "equilibrium_temperature",
    "msd_average",
    "self_diffusion_coefficient",
    "heat_capacity",
    "debye_temperature",
    "cohesive_energy",
    "equilibrium_warning",
    "debye_warning",
    "trajectory_file",
    "lattice_family",
    "equilibrium_volume",
    "lattice_constant",
    "cell_parameters",
    "bulk_modulus",
    "lindemann",
    "error_message",
];

#[derive(Debug, Error)]
pub enum TableError {
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

pub fn write_rows(rows: &[ResultRow], writer: impl Write) -> Result<(), TableError> {
    let mut csv_writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    csv_writer.write_record(HEADERS)?;
    for row in rows {
        csv_writer.serialize(row)?;
    }
    csv_writer.flush().map_err(csv::Error::from)?;
    Ok(())
}

pub fn read_rows(reader: impl Read) -> Result<Vec<ResultRow>, TableError> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    csv_reader
        .deserialize()
        .collect::<Result<Vec<ResultRow>, _>>()
        .map_err(TableError::from)
}

pub fn write_rows_to_path(rows: &[ResultRow], path: &Path) -> Result<(), TableError> {
    let file = std::fs::File::create(path).map_err(|source| TableError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    write_rows(rows, std::io::BufWriter::new(file))
}

pub fn read_rows_from_path(path: &Path) -> Result<Vec<ResultRow>, TableError> {
    let file = std::fs::File::open(path).map_err(|source| TableError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    read_rows(std::io::BufReader::new(file))
}

/// `<dir>/<prefix>_<dd-mm-yy_HH_MM_SS>.csv`, stamped with the local time.
pub fn timestamped_table_path(dir: &Path, prefix: &str) -> PathBuf {
    let stamp = Local::now().format("%d-%m-%y_%H_%M_%S");
    dir.join(format!("{prefix}_{stamp}.{TABLE_EXTENSION}"))
}

/// A partial-table path no other worker process can pick, even on another host
/// sharing the same directory.
pub fn partial_table_path(dir: &Path) -> PathBuf {
    let host = hostname::get()
        .map(|h| h.to_string_lossy().replace(['/', '\\', ' ', '_'], "-"))
        .unwrap_or_else(|_| "unknown-host".to_string());
    let pid = std::process::id();
    let stamp = Local::now().format("%Y%m%dT%H%M%S%3f");
    let nonce: u32 = rand::random();
    dir.join(format!(
        "{PARTIAL_PREFIX}{host}_{pid}_{stamp}_{nonce:08x}.{TABLE_EXTENSION}"
    ))
}

pub fn is_partial_table(path: &Path) -> bool {
    let name_matches = path
        .file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with(PARTIAL_PREFIX));
    let ext_matches = path.extension().and_then(|e| e.to_str()) == Some(TABLE_EXTENSION);
    name_matches && ext_matches
}

/// Writes one worker's rows to a fresh partial table in `dir` and returns its path.
pub fn write_partial(dir: &Path, rows: &[ResultRow]) -> Result<PathBuf, TableError> {
    let path = partial_table_path(dir);
    write_rows_to_path(rows, &path)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::results::{ResultRow, RowKind, SimulationResult};
    use tempfile::tempdir;

    fn sample_row(name: &str) -> ResultRow {
        ResultRow::from(&SimulationResult {
            job_name: name.into(),
            equilibration_index: 3,
            equilibrium_warning: true,
            equilibrium_temperature: 295.5,
            msd_average: 0.02,
            self_diffusion_coefficient: 1.5e-5,
            heat_capacity: 385.0,
            debye_temperature: 310.0,
            debye_warning: false,
            cohesive_energy: 3.49,
        })
    }

    #[test]
    fn rows_survive_a_write_read_cycle() {
        let rows = vec![sample_row("a"), ResultRow::failed("b", "no trajectory, bad, run")];
        let mut buffer = Vec::new();
        write_rows(&rows, &mut buffer).unwrap();
        let read = read_rows(buffer.as_slice()).unwrap();
        assert_eq!(read, rows);
    }

    #[test]
    fn header_is_written_even_for_empty_tables() {
        let mut buffer = Vec::new();
        write_rows(&[], &mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        assert_eq!(text.trim_end(), HEADERS.join(","));
        assert!(read_rows(text.as_bytes()).unwrap().is_empty());
    }

    #[test]
    fn nan_lattice_constant_is_preserved() {
        let mut row = ResultRow::failed("group", "fit failed");
        row.kind = RowKind::VolumeAggregate;
        row.lattice_constant = Some(f64::NAN);
        let mut buffer = Vec::new();
        write_rows(std::slice::from_ref(&row), &mut buffer).unwrap();
        let read = read_rows(buffer.as_slice()).unwrap();
        assert!(read[0].lattice_constant.unwrap().is_nan());
    }

    #[test]
    fn partial_paths_are_unique_and_recognized() {
        let dir = tempdir().unwrap();
        let first = write_partial(dir.path(), &[sample_row("a")]).unwrap();
        let second = write_partial(dir.path(), &[sample_row("b")]).unwrap();
        assert_ne!(first, second);
        assert!(is_partial_table(&first));
        assert!(!is_partial_table(&dir.path().join("post_process_01-01-25_00_00_00.csv")));
        assert_eq!(read_rows_from_path(&second).unwrap()[0].name, "b");
    }

    #[test]
    fn timestamped_path_uses_prefix_and_extension() {
        let path = timestamped_table_path(Path::new("/ws/post_process_output"), "post_process");
        let name = path.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("post_process_"));
        assert!(name.ends_with(".csv"));
        assert_eq!(name.len(), "post_process_dd-mm-yy_HH_MM_SS.csv".len());
    }
}
