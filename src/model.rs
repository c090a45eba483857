use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Orientation {
    Horizontal,
    Vertical,
    #[default]
    Unknown,
}

impl Orientation {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Horizontal => "h",
            Self::Vertical => "v",
            Self::Unknown => "",
        }
    }

    /// Accepts `h`/`v` in either case, with or without surrounding parentheses.
    pub fn from_token(token: &str) -> Option<Self> {
        let inner = token
            .trim()
            .strip_prefix('(')
            .and_then(|rest| rest.strip_suffix(')'))
            .unwrap_or(token.trim());

        if inner.eq_ignore_ascii_case("h") {
            Some(Self::Horizontal)
        } else if inner.eq_ignore_ascii_case("v") {
            Some(Self::Vertical)
        } else {
            None
        }
    }

    pub fn from_stored(value: &str) -> Self {
        Self::from_token(value).unwrap_or(Self::Unknown)
    }
}

/// Raw top/bottom cell text for one coin slot, in table order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelPair {
    pub top: String,
    pub bottom: String,
    pub retired: bool,
    pub position: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PennyRecord {
    pub state: String,
    pub city: String,
    pub neighborhood: String,
    pub location: String,
    pub name: String,
    pub orientation: Orientation,
    pub coin_type: String,
    pub year: String,
    pub retired: bool,
    pub position: u32,
    pub source: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct FileSummary {
    pub source: String,
    pub state: String,
    pub status: String,
    pub tables: usize,
    pub label_pairs: usize,
    pub records: usize,
    pub records_written: usize,
    pub records_committed: usize,
    pub mismatches: usize,
    pub label_warnings: usize,
    pub failure_reason: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ParseCounts {
    pub input_count: usize,
    pub processed_count: usize,
    pub failed_count: usize,
    pub records_total: usize,
    pub records_written: usize,
    pub records_committed: usize,
    pub mismatches: usize,
    pub store_total: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ParseRunManifest {
    pub manifest_version: u32,
    pub run_id: String,
    pub db_schema_version: String,
    pub status: String,
    pub started_at: String,
    pub updated_at: String,
    pub input_path: String,
    pub output_path: String,
    pub db_path: String,
    pub short_location: bool,
    pub multi_line_dash: bool,
    pub new_only: bool,
    pub counts: ParseCounts,
    pub files: Vec<FileSummary>,
}
