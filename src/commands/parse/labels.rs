use super::*;

/// Leading tokens that continue the previous line instead of starting a new field.
pub const CONTINUATION_WORDS: &[&str] = &["And", "and", "&", "Of", "of"];

pub fn starts_with_continuation(line: &str) -> bool {
    line.split_whitespace()
        .next()
        .is_some_and(|token| CONTINUATION_WORDS.contains(&token))
}

fn label_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(normalize_cell_text)
        .filter(|line| !line.is_empty())
        .collect()
}

/// Joins continuation lines onto the line before them.
fn merge_continuations(lines: &[String]) -> Vec<String> {
    let mut merged: Vec<String> = Vec::with_capacity(lines.len());
    for line in lines {
        match merged.last_mut() {
            Some(previous) if starts_with_continuation(line) => {
                previous.push(' ');
                previous.push_str(line);
            }
            _ => merged.push(line.clone()),
        }
    }
    merged
}

/// City line split off a top label: the first line when it names the city
/// and more lines follow.
pub fn split_city_line(text: &str, city: &str) -> (Option<String>, String) {
    let lines: Vec<&str> = text.lines().filter(|line| !line.trim().is_empty()).collect();
    if city.is_empty() || lines.len() < 2 {
        return (None, text.to_string());
    }

    let first = normalize_cell_text(lines[0]);
    if first.to_lowercase() == normalize_cell_text(city).to_lowercase() {
        (Some(first), lines[1..].join("\n"))
    } else {
        (None, text.to_string())
    }
}

pub struct LabelParser {
    options: LabelOptions,
    marker: Regex,
    separator: Regex,
}

impl LabelParser {
    pub fn new(options: LabelOptions) -> Result<Self> {
        Ok(Self {
            options,
            marker: Regex::new(r"(?i)\((h|v)\)")
                .context("failed to compile orientation marker regex")?,
            // A dash is a non-word char, so `\B` on both sides means no word
            // char touches it: in-word hyphens ("Two-Way") never match.
            separator: Regex::new(r"\B[-\x{2013}\x{2014}]\B")
                .context("failed to compile separator dash regex")?,
        })
    }

    pub fn contains_separator_dash(&self, text: &str) -> bool {
        self.separator.is_match(text)
    }

    pub fn split_on_separator_dash(&self, text: &str) -> Vec<String> {
        self.separator
            .split(text)
            .map(str::trim)
            .filter(|piece| !piece.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Splits every line on separator dashes; a continuation line extends the
    /// last segment rather than opening a new one.
    fn dash_segments(&self, lines: &[String]) -> Vec<String> {
        let mut segments: Vec<String> = Vec::new();
        for line in lines {
            let mut pieces = self.split_on_separator_dash(line);
            if starts_with_continuation(line) && !pieces.is_empty() {
                if let Some(previous) = segments.last_mut() {
                    previous.push(' ');
                    previous.push_str(&pieces.remove(0));
                }
            }
            segments.extend(pieces);
        }
        segments
    }

    /// Neighborhood and location from a top label. City stays empty; it is
    /// resolved from the heading context by the caller.
    pub fn detect_city_location_neighborhood(&self, text: &str) -> LabelParse<TopLabel> {
        let lines = label_lines(text);
        if lines.is_empty() {
            return LabelParse::Invalid {
                reason: "top label is empty".to_string(),
            };
        }

        let dashed = lines.iter().any(|line| self.contains_separator_dash(line))
            || (self.options.multi_line_dash && lines.len() > 1);

        // Undashed lines after the first are location parts; a continuation
        // line has already been merged onto the one before it.
        let segments = if dashed {
            self.dash_segments(&lines)
        } else {
            merge_continuations(&lines)
        };

        match segments.as_slice() {
            [] => LabelParse::Invalid {
                reason: format!("top label has no text besides separators: '{}'", lines.join(" ")),
            },
            [location] => LabelParse::Valid(TopLabel {
                location: location.clone(),
                ..TopLabel::default()
            }),
            [neighborhood, rest @ ..] => {
                let location = if self.options.short_location {
                    short_location(rest)
                } else {
                    rest.join(" - ")
                };
                let fields = TopLabel {
                    city: String::new(),
                    neighborhood: neighborhood.clone(),
                    location,
                };

                if dashed && rest.len() > 1 {
                    LabelParse::Ambiguous {
                        warning: format!(
                            "top label splits into {} parts; '{}' taken as neighborhood",
                            segments.len(),
                            fields.neighborhood
                        ),
                        fields,
                    }
                } else {
                    LabelParse::Valid(fields)
                }
            }
        }
    }

    /// Orientation, name and coin type from a bottom label.
    pub fn detect_orientation_and_type(&self, text: &str) -> LabelParse<BottomLabel> {
        if text.trim().is_empty() {
            return LabelParse::Invalid {
                reason: "bottom label is empty".to_string(),
            };
        }

        if let Some(captures) = self.marker.captures(text) {
            let marker = captures.get(0).map_or(0..0, |found| found.range());
            let orientation = captures
                .get(1)
                .and_then(|token| Orientation::from_token(token.as_str()))
                .unwrap_or_default();
            let name_lines = label_lines(&text[..marker.start]);
            let after = normalize_cell_text(&text[marker.end..]);
            if name_lines.is_empty() {
                return LabelParse::Valid(BottomLabel {
                    orientation,
                    name: after,
                    coin_type: String::new(),
                });
            }

            let name = match name_lines.split_first() {
                Some((first, rest)) if self.options.multi_line_dash && !rest.is_empty() => {
                    format!("{first} - {}", rest.join(" "))
                }
                _ => name_lines.join(" "),
            };

            return LabelParse::Valid(BottomLabel {
                orientation,
                name,
                coin_type: after,
            });
        }

        let trimmed = text.trim_start();
        let (token, remainder) = trimmed
            .split_once(char::is_whitespace)
            .unwrap_or((trimmed, ""));

        if let Some(orientation) = Orientation::from_token(token) {
            let remainder = remainder.trim_start();
            let remainder = match self.separator.find(remainder) {
                Some(dash) if dash.start() == 0 => &remainder[dash.end()..],
                _ => remainder,
            };
            let name = normalize_cell_text(remainder);
            if name.is_empty() {
                return LabelParse::Ambiguous {
                    warning: format!("orientation '{token}' without a name"),
                    fields: BottomLabel {
                        orientation,
                        ..BottomLabel::default()
                    },
                };
            }
            return LabelParse::Valid(BottomLabel {
                orientation,
                name,
                coin_type: String::new(),
            });
        }

        let name = normalize_cell_text(text);
        LabelParse::Ambiguous {
            warning: format!("no h/v orientation marker in '{name}'"),
            fields: BottomLabel {
                orientation: Orientation::Unknown,
                name,
                coin_type: String::new(),
            },
        }
    }
}

/// Trailing segment of a location, keeping the fragment before it when the
/// segment opens with a continuation word.
fn short_location(segments: &[String]) -> String {
    match segments {
        [.., previous, last] if starts_with_continuation(last) => format!("{previous} {last}"),
        [.., last] => last.clone(),
        [] => String::new(),
    }
}
