use super::*;

const STATES: &[(&str, &str)] = &[
    ("al", "Alabama"),
    ("ak", "Alaska"),
    ("az", "Arizona"),
    ("ar", "Arkansas"),
    ("ca", "California"),
    ("co", "Colorado"),
    ("ct", "Connecticut"),
    ("de", "Delaware"),
    ("dc", "District of Columbia"),
    ("fl", "Florida"),
    ("ga", "Georgia"),
    ("hi", "Hawaii"),
    ("id", "Idaho"),
    ("il", "Illinois"),
    ("in", "Indiana"),
    ("ia", "Iowa"),
    ("ks", "Kansas"),
    ("ky", "Kentucky"),
    ("la", "Louisiana"),
    ("me", "Maine"),
    ("md", "Maryland"),
    ("ma", "Massachusetts"),
    ("mi", "Michigan"),
    ("mn", "Minnesota"),
    ("ms", "Mississippi"),
    ("mo", "Missouri"),
    ("mt", "Montana"),
    ("ne", "Nebraska"),
    ("nv", "Nevada"),
    ("nh", "New Hampshire"),
    ("nj", "New Jersey"),
    ("nm", "New Mexico"),
    ("ny", "New York"),
    ("nc", "North Carolina"),
    ("nd", "North Dakota"),
    ("oh", "Ohio"),
    ("ok", "Oklahoma"),
    ("or", "Oregon"),
    ("pa", "Pennsylvania"),
    ("ri", "Rhode Island"),
    ("sc", "South Carolina"),
    ("sd", "South Dakota"),
    ("tn", "Tennessee"),
    ("tx", "Texas"),
    ("ut", "Utah"),
    ("vt", "Vermont"),
    ("va", "Virginia"),
    ("wa", "Washington"),
    ("wv", "West Virginia"),
    ("wi", "Wisconsin"),
    ("wy", "Wyoming"),
];

/// Full state name for a document, from its file name.
///
/// Full names win over abbreviations and longer names over shorter ones, so
/// `west-virginia.docx` is never read as Virginia. Abbreviations must be the
/// whole stem or its first token (`ca.docx`, `ca-2024.docx`).
pub fn state_from_filename(path: &Path) -> Result<String, DocumentError> {
    let stem = file_stem_lower(path);
    let spaced: String = stem
        .chars()
        .map(|ch| if matches!(ch, '-' | '_' | '.') { ' ' } else { ch })
        .collect();
    let compact: String = spaced.chars().filter(|ch| !ch.is_whitespace()).collect();

    let mut by_length: Vec<&(&str, &str)> = STATES.iter().collect();
    by_length.sort_by_key(|(_, name)| std::cmp::Reverse(name.len()));

    for (_, name) in &by_length {
        let lower = name.to_lowercase();
        if spaced.contains(&lower) || compact.contains(&lower.replace(' ', "")) {
            return Ok((*name).to_string());
        }
    }

    for (abbreviation, name) in STATES {
        let prefixed = stem
            .strip_prefix(abbreviation)
            .is_some_and(|rest| rest.is_empty() || rest.starts_with(['-', '_', '.', ' ']));
        if prefixed {
            return Ok((*name).to_string());
        }
    }

    Err(DocumentError::UnknownState {
        file: path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_default(),
    })
}
