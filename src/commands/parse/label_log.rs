use super::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Warning,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Info => "INFO",
            Self::Warning => "WARNING",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelLogEntry {
    pub timestamp: String,
    pub severity: Severity,
    pub source: String,
    pub message: String,
}

impl LabelLogEntry {
    pub fn new(severity: Severity, source: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            timestamp: now_utc_string(),
            severity,
            source: source.into(),
            message: message.into(),
        }
    }

    pub fn render(&self) -> String {
        format!(
            "{} {} {}\n{}",
            self.timestamp,
            self.severity.as_str(),
            self.source,
            self.message
        )
    }
}

/// Destination for mismatch and label-quality entries.
pub trait LabelSink {
    fn record(&mut self, entry: LabelLogEntry);
}

impl LabelSink for Vec<LabelLogEntry> {
    fn record(&mut self, entry: LabelLogEntry) {
        self.push(entry);
    }
}

/// Appends entries to `labels_<stem>.log` beside other runs' entries.
pub struct FileLabelLog {
    path: PathBuf,
    writer: BufWriter<File>,
    entries: usize,
}

impl FileLabelLog {
    pub fn open(log_dir: &Path, document: &Path) -> Result<Self> {
        ensure_directory(log_dir)?;
        let path = log_dir.join(format!("labels_{}.log", file_stem_lower(document)));
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("failed to open label log {}", path.display()))?;

        Ok(Self {
            path,
            writer: BufWriter::new(file),
            entries: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn entries(&self) -> usize {
        self.entries
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer
            .flush()
            .with_context(|| format!("failed to flush label log {}", self.path.display()))
    }
}

impl LabelSink for FileLabelLog {
    fn record(&mut self, entry: LabelLogEntry) {
        match writeln!(self.writer, "{}", entry.render()) {
            Ok(()) => self.entries += 1,
            Err(err) => {
                warn!(path = %self.path.display(), error = %err, "failed to write label log entry");
            }
        }
    }
}
