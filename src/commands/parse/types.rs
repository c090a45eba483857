use super::*;

/// Failures that abort one document while the batch carries on.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("no recognizable state name or abbreviation in file name '{file}'")]
    UnknownState { file: String },

    #[error("unsupported input type for '{file}': {mime}")]
    UnsupportedMime { file: String, mime: String },

    #[error("could not read document '{file}': {reason}")]
    Unreadable { file: String, reason: String },
}

/// Outcome of parsing one label string. Empty input is `Invalid`, never an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LabelParse<T> {
    Valid(T),
    Ambiguous { fields: T, warning: String },
    Invalid { reason: String },
}

impl<T> LabelParse<T> {
    pub fn fields(&self) -> Option<&T> {
        match self {
            Self::Valid(fields) | Self::Ambiguous { fields, .. } => Some(fields),
            Self::Invalid { .. } => None,
        }
    }

    pub fn into_fields(self) -> Option<T> {
        match self {
            Self::Valid(fields) | Self::Ambiguous { fields, .. } => Some(fields),
            Self::Invalid { .. } => None,
        }
    }

    pub fn warning(&self) -> Option<&str> {
        match self {
            Self::Ambiguous { warning, .. } => Some(warning.as_str()),
            Self::Invalid { reason } => Some(reason.as_str()),
            Self::Valid(_) => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TopLabel {
    pub city: String,
    pub neighborhood: String,
    pub location: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BottomLabel {
    pub orientation: Orientation,
    pub name: String,
    pub coin_type: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LabelOptions {
    pub short_location: bool,
    pub multi_line_dash: bool,
}

/// Per-document settings for record assembly.
#[derive(Debug, Clone)]
pub struct AssemblyConfig {
    pub state: String,
    pub source: String,
    pub retired_fill: String,
    pub layout: LabelLayout,
}

#[derive(Debug, Clone, Default)]
pub struct Assembly {
    pub records: Vec<PennyRecord>,
    pub tables: usize,
    pub label_pairs: usize,
    pub mismatches: usize,
    pub warnings: usize,
}
