use super::*;

pub const CSV_HEADER: [&str; 11] = [
    "State",
    "City",
    "Neighborhood",
    "Location",
    "Name",
    "Orientation",
    "Type",
    "Year",
    "Retired",
    "Position",
    "Source",
];

fn record_row(record: &PennyRecord) -> [String; 11] {
    [
        sanitize_for_output(&record.state),
        sanitize_for_output(&record.city),
        sanitize_for_output(&record.neighborhood),
        sanitize_for_output(&record.location),
        sanitize_for_output(&record.name),
        record.orientation.as_str().to_string(),
        sanitize_for_output(&record.coin_type),
        record.year.clone(),
        if record.retired { "Yes" } else { "" }.to_string(),
        record.position.to_string(),
        record.source.clone(),
    ]
}

/// CSV output shared by every document of a run.
pub struct RecordWriter {
    path: PathBuf,
    writer: csv::Writer<File>,
    rows_written: usize,
}

impl RecordWriter {
    /// Opens the output. With `append`, rows continue an existing file and
    /// the header is written only when the file is new or empty.
    pub fn create(path: &Path, append: bool) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            ensure_directory(parent)?;
        }

        let has_rows = append
            && fs::metadata(path)
                .map(|metadata| metadata.len() > 0)
                .unwrap_or(false);

        let file = if append {
            OpenOptions::new().create(true).append(true).open(path)
        } else {
            File::create(path)
        }
        .with_context(|| format!("failed to open output {}", path.display()))?;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);

        if !has_rows {
            writer
                .write_record(CSV_HEADER)
                .with_context(|| format!("failed to write header to {}", path.display()))?;
            writer
                .flush()
                .with_context(|| format!("failed to flush {}", path.display()))?;
        }

        Ok(Self {
            path: path.to_path_buf(),
            writer,
            rows_written: 0,
        })
    }

    /// Writes and flushes `records`, so a later failure cannot lose them.
    pub fn write_records(&mut self, records: &[PennyRecord]) -> Result<usize> {
        for record in records {
            self.writer
                .write_record(record_row(record))
                .with_context(|| format!("failed to write row to {}", self.path.display()))?;
        }
        self.writer
            .flush()
            .with_context(|| format!("failed to flush {}", self.path.display()))?;

        self.rows_written += records.len();
        Ok(records.len())
    }

    pub fn rows_written(&self) -> usize {
        self.rows_written
    }
}

pub fn write_records_to<W: Write>(destination: W, records: &[PennyRecord]) -> Result<()> {
    let mut writer = csv::Writer::from_writer(destination);
    writer
        .write_record(CSV_HEADER)
        .context("failed to write csv header")?;
    for record in records {
        writer
            .write_record(record_row(record))
            .context("failed to write csv row")?;
    }
    writer.flush().context("failed to flush csv output")
}
