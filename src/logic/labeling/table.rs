//! Label Table - persisted weak labels
//!
//! CSV with one header row: `path,size,file_label,infer_time`.
//! Paths must be valid UTF-8 to be stored; other rows are rejected at write
//! time and counted, so no row ever names a file that does not exist.

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, StringRecord, WriterBuilder};
use serde::{Deserialize, Serialize};

use crate::error::{SamplerError, SamplerResult};
use super::label::FileLabel;

pub const HEADER: [&str; 4] = ["path", "size", "file_label", "infer_time"];

/// One labeled file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeakLabel {
    pub path: PathBuf,
    pub size: u64,
    pub label: FileLabel,
    /// Seconds spent in the cascade
    pub infer_time: f64,
}

/// Parsed table: good rows plus (line number, reason) for malformed ones
#[derive(Debug, Default)]
pub struct LabelTable {
    pub rows: Vec<WeakLabel>,
    pub malformed: Vec<(usize, String)>,
}

// ============================================================================
// WRITE
// ============================================================================

/// Write the label table, replacing any existing file.
/// Returns the number of rows rejected because their path is not UTF-8.
pub fn write_label_table(path: &Path, rows: &[WeakLabel]) -> SamplerResult<usize> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| SamplerError::io(parent, e))?;
    }

    let csv_err = |e: csv::Error| SamplerError::io(path, e.into());
    let mut out = WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .map_err(csv_err)?;

    out.write_record(HEADER).map_err(csv_err)?;
    let mut rejected = 0;
    for row in rows {
        let Some(row_path) = row.path.to_str() else {
            log::warn!("Not writing label for non UTF-8 path {}", row.path.display());
            rejected += 1;
            continue;
        };
        let size = row.size.to_string();
        let infer_time = row.infer_time.to_string();
        out.write_record([row_path, size.as_str(), row.label.as_str(), infer_time.as_str()])
            .map_err(csv_err)?;
    }
    out.flush().map_err(|e| SamplerError::io(path, e))?;

    log::info!(
        "Wrote {} labels to {} ({} rejected)",
        rows.len() - rejected,
        path.display(),
        rejected
    );
    Ok(rejected)
}

// ============================================================================
// READ
// ============================================================================

fn parse_row(record: &StringRecord) -> Result<WeakLabel, String> {
    if record.len() != HEADER.len() {
        return Err(format!("expected {} fields, found {}", HEADER.len(), record.len()));
    }
    let size = record[1]
        .trim()
        .parse::<u64>()
        .map_err(|e| format!("bad size {:?}: {}", &record[1], e))?;
    let label = record[2].parse::<FileLabel>()?;
    let infer_time = record[3]
        .trim()
        .parse::<f64>()
        .map_err(|e| format!("bad infer_time {:?}: {}", &record[3], e))?;

    Ok(WeakLabel {
        path: PathBuf::from(&record[0]),
        size,
        label,
        infer_time,
    })
}

/// Read a label table. A missing file or bad header is fatal; bad rows are
/// reported in `malformed` for the caller to count.
pub fn read_label_table(path: &Path) -> SamplerResult<LabelTable> {
    let file = File::open(path).map_err(|e| SamplerError::io(path, e))?;
    let table_err = |reason: String| SamplerError::LabelTable {
        path: path.to_path_buf(),
        reason,
    };

    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(file);

    let header = reader.headers().map_err(|e| table_err(e.to_string()))?.clone();
    if header.is_empty() {
        return Err(table_err("empty file".to_string()));
    }
    let header_ok = header.len() == HEADER.len()
        && header.iter().zip(HEADER).all(|(a, b)| a.trim() == b);
    if !header_ok {
        return Err(table_err(format!("unexpected header {:?}", header)));
    }

    let mut table = LabelTable::default();
    for result in reader.records() {
        match result {
            Ok(record) => {
                let line = record.position().map_or(0, |p| p.line() as usize);
                match parse_row(&record) {
                    Ok(row) => table.rows.push(row),
                    Err(reason) => table.malformed.push((line, reason)),
                }
            }
            Err(e) => {
                if e.is_io_error() {
                    return Err(table_err(e.to_string()));
                }
                let line = e.position().map_or(0, |p| p.line() as usize);
                table.malformed.push((line, e.to_string()));
            }
        }
    }
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn row(path: &str, label: FileLabel) -> WeakLabel {
        WeakLabel { path: PathBuf::from(path), size: 10, label, infer_time: 0.25 }
    }

    #[test]
    fn test_write_then_read() {
        let dir = tempdir().unwrap();
        let table_path = dir.path().join("out/naivetruth.csv");
        let rows = vec![
            row("/data/a.csv", FileLabel::Tabular),
            row("/data/with,comma.json", FileLabel::JsonXml),
            row("/data/with \"quote\".txt", FileLabel::FreeText),
        ];

        assert_eq!(write_label_table(&table_path, &rows).unwrap(), 0);
        let table = read_label_table(&table_path).unwrap();

        assert!(table.malformed.is_empty());
        assert_eq!(table.rows, rows);
    }

    #[test]
    fn test_header_row() {
        let dir = tempdir().unwrap();
        let table_path = dir.path().join("labels.csv");
        write_label_table(&table_path, &[]).unwrap();

        let text = fs::read_to_string(&table_path).unwrap();
        assert_eq!(text, "path,size,file_label,infer_time\n");
    }

    #[test]
    fn test_malformed_rows_are_reported() {
        let dir = tempdir().unwrap();
        let table_path = dir.path().join("labels.csv");
        fs::write(
            &table_path,
            "path,size,file_label,infer_time\n/a,1,tabular,0.1\n/b,x,tabular,0.1\n/c,1,video,0.1\n/d,2\n\n",
        )
        .unwrap();

        let table = read_label_table(&table_path).unwrap();
        assert_eq!(table.rows.len(), 1);
        let lines: Vec<usize> = table.malformed.iter().map(|(l, _)| *l).collect();
        assert_eq!(lines, vec![3, 4, 5]);
    }

    #[test]
    fn test_bad_header_is_fatal() {
        let dir = tempdir().unwrap();
        let table_path = dir.path().join("labels.csv");
        fs::write(&table_path, "file,label\n/a,tabular\n").unwrap();

        let err = read_label_table(&table_path).unwrap_err();
        assert!(matches!(err, SamplerError::LabelTable { .. }));
    }

    #[test]
    fn test_missing_table_is_io_error() {
        let err = read_label_table(Path::new("/no/such/table.csv")).unwrap_err();
        assert!(matches!(err, SamplerError::Io { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_path_is_rejected_not_mangled() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let dir = tempdir().unwrap();
        let odd = dir.path().join(OsStr::from_bytes(b"bad\xFFname.csv"));
        fs::write(&odd, "a,b\n1,2\n").unwrap();
        let good = dir.path().join("good.csv");
        fs::write(&good, "a,b\n1,2\n").unwrap();

        let rows = vec![
            WeakLabel { path: odd, size: 8, label: FileLabel::Tabular, infer_time: 0.1 },
            WeakLabel { path: good.clone(), size: 8, label: FileLabel::Tabular, infer_time: 0.1 },
        ];
        let table_path = dir.path().join("labels.csv");
        assert_eq!(write_label_table(&table_path, &rows).unwrap(), 1);

        let table = read_label_table(&table_path).unwrap();
        assert!(table.malformed.is_empty());
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.rows[0].path, good);
        assert!(table.rows.iter().all(|r| r.path.exists()));
    }

    #[test]
    fn test_multiline_quoted_path() {
        let dir = tempdir().unwrap();
        let table_path = dir.path().join("labels.csv");
        let rows = vec![row("/data/two\nlines.txt", FileLabel::FreeText), row("/data/b", FileLabel::Unknown)];
        write_label_table(&table_path, &rows).unwrap();

        let table = read_label_table(&table_path).unwrap();
        assert_eq!(table.rows, rows);
    }
}
