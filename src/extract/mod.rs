//! Source extraction: the two flat CSV record sets the builders consume.

pub mod record;

pub use record::*;

use serde::de::DeserializeOwned;
use std::io::Read;
use std::path::Path;
use tracing::{debug, warn};

use crate::config::SourceConfig;
use crate::error::{EtlError, Result};

/// Both source record sets, normalized
#[derive(Debug, Clone, Default)]
pub struct Extracted {
    pub athlete_events: Vec<AthleteEventRecord>,
    pub noc_regions: Vec<NocRegionRecord>,
    /// Rows that could not be decoded and were skipped
    pub skipped_rows: usize,
}

/// Read both source files.
///
/// Missing files, missing header columns and a file without any data rows
/// are fatal. Individual undecodable rows are skipped.
pub fn extract(sources: &SourceConfig) -> Result<Extracted> {
    let (athlete_events, skipped_events) = read_csv_file::<AthleteEventRecord>(
        &sources.athlete_events,
        ATHLETE_EVENT_COLUMNS,
    )?;
    if athlete_events.is_empty() {
        return Err(EtlError::EmptySource(sources.athlete_events.clone()));
    }

    let (noc_regions, skipped_regions) =
        read_csv_file::<NocRegionRecord>(&sources.noc_regions, NOC_REGION_COLUMNS)?;
    if noc_regions.is_empty() {
        return Err(EtlError::EmptySource(sources.noc_regions.clone()));
    }

    Ok(Extracted {
        athlete_events: athlete_events
            .into_iter()
            .map(AthleteEventRecord::normalized)
            .collect(),
        noc_regions: noc_regions
            .into_iter()
            .map(NocRegionRecord::normalized)
            .collect(),
        skipped_rows: skipped_events + skipped_regions,
    })
}

fn read_csv_file<T: DeserializeOwned>(path: &Path, required: &[&str]) -> Result<(Vec<T>, usize)> {
    if !path.exists() {
        return Err(EtlError::MissingSource(path.to_path_buf()));
    }
    let file = std::fs::File::open(path)?;
    read_records(file, path, required)
}

/// Deserialize every row of a CSV stream, checking the header first.
///
/// Returns the decoded rows and the number of rows skipped.
pub fn read_records<T: DeserializeOwned, R: Read>(
    reader: R,
    path: &Path,
    required: &[&str],
) -> Result<(Vec<T>, usize)> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader.headers()?.clone();
    let missing: Vec<&str> = required
        .iter()
        .copied()
        .filter(|col| !headers.iter().any(|h| h == *col))
        .collect();
    if !missing.is_empty() {
        return Err(EtlError::MalformedSource {
            path: path.to_path_buf(),
            reason: format!("missing columns: {}", missing.join(", ")),
        });
    }

    let mut rows = Vec::new();
    let mut skipped = 0;
    for (line, result) in reader.deserialize::<T>().enumerate() {
        match result {
            Ok(row) => rows.push(row),
            Err(err) if is_row_error(&err) => {
                warn!(file = ?path, row = line + 1, error = %err, "skipping undecodable row");
                skipped += 1;
            }
            Err(err) => return Err(err.into()),
        }
    }

    debug!(file = ?path, rows = rows.len(), skipped, "read source file");
    Ok((rows, skipped))
}

fn is_row_error(err: &csv::Error) -> bool {
    matches!(
        err.kind(),
        csv::ErrorKind::UnequalLengths { .. }
            | csv::ErrorKind::Deserialize { .. }
            | csv::ErrorKind::Utf8 { .. }
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "ID,Name,Sex,Age,Height,Weight,Team,NOC,Games,Year,Season,City,Sport,Event,Medal\n";

    #[test]
    fn test_reads_rows_and_missing_tokens() {
        let data = format!(
            "{HEADER}1,A Dijiang,M,24,180,80,China,CHN,1992 Summer,1992,Summer,Barcelona,Basketball,Basketball Men's Basketball,NA\n"
        );
        let (rows, skipped) = read_records::<AthleteEventRecord, _>(
            data.as_bytes(),
            Path::new("athlete_events.csv"),
            ATHLETE_EVENT_COLUMNS,
        )
        .unwrap();
        assert_eq!(skipped, 0);
        let row = rows[0].clone().normalized();
        assert_eq!(row.name.as_deref(), Some("A Dijiang"));
        assert_eq!(row.medal, None);
    }

    #[test]
    fn test_short_row_is_skipped() {
        let data = format!("{HEADER}1,A Dijiang,M\n2,A Lamusi,M,23,170,60,China,CHN,2012 Summer,2012,Summer,London,Judo,Judo Men's Extra-Lightweight,NA\n");
        let (rows, skipped) = read_records::<AthleteEventRecord, _>(
            data.as_bytes(),
            Path::new("athlete_events.csv"),
            ATHLETE_EVENT_COLUMNS,
        )
        .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(skipped, 1);
    }

    #[test]
    fn test_missing_column_is_fatal() {
        let data = "NOC,region\nAFG,Afghanistan\n";
        let err = read_records::<NocRegionRecord, _>(
            data.as_bytes(),
            Path::new("noc_regions.csv"),
            NOC_REGION_COLUMNS,
        )
        .unwrap_err();
        assert!(matches!(err, EtlError::MalformedSource { .. }));
        assert!(err.to_string().contains("notes"));
    }

    #[test]
    fn test_missing_file_is_fatal() {
        let sources = SourceConfig {
            athlete_events: "/nonexistent/athlete_events.csv".into(),
            noc_regions: "/nonexistent/noc_regions.csv".into(),
        };
        let err = extract(&sources).unwrap_err();
        assert!(matches!(err, EtlError::MissingSource(_)));
    }

    #[test]
    fn test_header_only_regions_file_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let sources = SourceConfig::in_dir(dir.path());
        std::fs::write(
            &sources.athlete_events,
            format!("{HEADER}1,A Dijiang,M,24,180,80,China,CHN,1992 Summer,1992,Summer,Barcelona,Basketball,Basketball Men's Basketball,NA\n"),
        )
        .unwrap();
        std::fs::write(&sources.noc_regions, "NOC,region,notes\n").unwrap();

        let err = extract(&sources).unwrap_err();
        assert!(
            matches!(err, EtlError::EmptySource(ref path) if path == &sources.noc_regions),
            "got {err:?}"
        );
    }
}
