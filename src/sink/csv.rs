//! Two-column delimited table (path, hex digest), no header. Rows go to a temp file next to
//! the output and the file is renamed into place on finish.

use std::borrow::Cow;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use super::{ChecksumSink, SinkError, SinkRow};
use crate::ChecksumRecord;
use crate::utils::{remove_stale_temp, rename_temp_to_final, temp_path_for};

pub struct CsvSink {
    output: PathBuf,
    temp: PathBuf,
    writer: Option<BufWriter<File>>,
    delimiter: u8,
    rows: usize,
}

impl CsvSink {
    /// Open `<output>.pathsum.tmp` for writing, replacing a stale one.
    pub fn create(output: &Path, delimiter: u8) -> Result<Self, SinkError> {
        let temp = temp_path_for(output);
        let io_err = |source| SinkError::Io {
            path: temp.clone(),
            source,
        };
        remove_stale_temp(&temp).map_err(io_err)?;
        let file = File::create(&temp).map_err(io_err)?;
        Ok(Self {
            output: output.to_path_buf(),
            temp,
            writer: Some(BufWriter::new(file)),
            delimiter,
            rows: 0,
        })
    }

    pub fn output_path(&self) -> &Path {
        &self.output
    }

    pub fn temp_path(&self) -> &Path {
        &self.temp
    }

    pub fn rows_written(&self) -> usize {
        self.rows
    }

    fn io_error(&self, source: std::io::Error) -> SinkError {
        SinkError::Io {
            path: self.temp.clone(),
            source,
        }
    }
}

/// Quote a field when it contains the delimiter, a quote or a line break.
fn escape_field(field: &str, delimiter: u8) -> Cow<'_, str> {
    let needs_quotes = field
        .bytes()
        .any(|b| b == delimiter || b == b'"' || b == b'\n' || b == b'\r');
    if needs_quotes {
        Cow::Owned(format!("\"{}\"", field.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(field)
    }
}

impl ChecksumSink for CsvSink {
    fn write_row(&mut self, row: usize, record: &ChecksumRecord) -> Result<(), SinkError> {
        debug_assert_eq!(row, self.rows + 1, "rows must arrive numbered from 1");
        let SinkRow {
            path, digest_hex, ..
        } = SinkRow::from_record(row, record);
        let delimiter = self.delimiter as char;
        let result = match self.writer.as_mut() {
            Some(w) => writeln!(
                w,
                "{}{}{}",
                escape_field(&path, self.delimiter),
                delimiter,
                digest_hex
            ),
            None => {
                return Err(SinkError::Rejected {
                    row,
                    reason: "sink already finished".to_string(),
                });
            }
        };
        result.map_err(|e| self.io_error(e))?;
        self.rows = row;
        Ok(())
    }

    fn finish(&mut self) -> Result<(), SinkError> {
        let Some(writer) = self.writer.take() else {
            return Ok(());
        };
        let file = writer
            .into_inner()
            .map_err(|e| self.io_error(e.into_error()))?;
        file.sync_all().map_err(|e| self.io_error(e))?;
        drop(file);
        rename_temp_to_final(&self.temp, &self.output).map_err(|source| SinkError::Finalize {
            from: self.temp.clone(),
            to: self.output.clone(),
            source,
        })?;
        log::debug!("wrote {} rows to {}", self.rows, self.output.display());
        Ok(())
    }
}

impl Drop for CsvSink {
    /// An unfinished sink leaves no temp file behind.
    fn drop(&mut self) {
        if self.writer.take().is_some() {
            let _ = std::fs::remove_file(&self.temp);
        }
    }
}
