use harvest_core::{HarvestError, HarvestRow, RowSchema};
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// CSV output of one run. The header is written on open; rows follow in
/// the order they are handed in.
pub struct RowSink {
    writer: csv::Writer<File>,
    schema: RowSchema,
    path: PathBuf,
    rows_written: usize,
}

impl RowSink {
    /// Creates or truncates the file at `path`.
    pub fn open(path: impl AsRef<Path>, schema: RowSchema) -> Result<Self, HarvestError> {
        let path = path.as_ref().to_path_buf();
        let mut writer = csv::Writer::from_path(&path)?;
        writer.write_record(schema.header())?;
        writer.flush()?;

        info!("Writing rows to {}", path.display());
        Ok(Self {
            writer,
            schema,
            path,
            rows_written: 0,
        })
    }

    pub fn write_row(&mut self, row: &HarvestRow) -> Result<(), HarvestError> {
        self.writer.write_record(row.record(self.schema))?;
        self.rows_written += 1;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<(), HarvestError> {
        self.writer.flush()?;
        Ok(())
    }

    pub fn rows_written(&self) -> usize {
        self.rows_written
    }

    /// Flushes and closes the file, returning the number of data rows.
    pub fn close(mut self) -> Result<usize, HarvestError> {
        self.writer.flush()?;
        debug!(
            "Closed {} after {} row(s)",
            self.path.display(),
            self.rows_written
        );
        Ok(self.rows_written)
    }
}
