use std::path::PathBuf;

use thiserror::Error;

/// Failures while loading the daily or hourly tables.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("{dataset} dataset not found (tried {})", display_paths(.candidates))]
    DataUnavailable {
        dataset: &'static str,
        candidates: Vec<PathBuf>,
    },
    #[error("malformed record in {} at line {line}: {reason}", .path.display())]
    MalformedRecord {
        path: PathBuf,
        line: u64,
        reason: String,
    },
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {}: {source}", .path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|path| path.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unavailable_lists_every_candidate() {
        let err = DataError::DataUnavailable {
            dataset: "daily",
            candidates: vec![PathBuf::from("data/day.csv"), PathBuf::from("../data/day.csv")],
        };
        assert_eq!(
            err.to_string(),
            "daily dataset not found (tried data/day.csv, ../data/day.csv)"
        );
    }

    #[test]
    fn malformed_record_names_the_line() {
        let err = DataError::MalformedRecord {
            path: PathBuf::from("day.csv"),
            line: 7,
            reason: "unparseable date 'x'".to_string(),
        };
        assert!(err.to_string().contains("line 7"));
    }
}
