use super::*;

const MISMATCH_RULE_WIDTH: usize = 60;

/// Heading position while walking a document body. Scoped to one document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TraversalContext {
    pub city: String,
    pub neighborhood: String,
    pub location: String,
    pub year: String,
    pub table_index: usize,
}

impl TraversalContext {
    pub fn enter_heading(&mut self, level: u8, text: &str, outline: &OutlineMap) {
        match level {
            1 => {
                *self = Self {
                    city: text.to_string(),
                    table_index: self.table_index,
                    ..Self::default()
                };
            }
            2 => {
                if outline.is_neighborhood(&self.city, text) {
                    self.neighborhood = text.to_string();
                    self.location.clear();
                } else {
                    self.neighborhood.clear();
                    self.location = text.to_string();
                }
                self.year.clear();
            }
            3 => {
                self.location = text.to_string();
                self.year.clear();
            }
            4 => self.year = text.to_string(),
            _ => {}
        }
    }

    fn source_id(&self, source: &str, position: u32) -> String {
        format!("{source}#table{}:pos{position}", self.table_index)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mismatch {
    pub city: String,
    pub neighborhood: String,
    pub location: String,
    pub outline_city: Option<String>,
    pub label_city: Option<String>,
    pub outline_location: Option<String>,
    pub label_location: Option<String>,
    pub outline_neighborhood: Option<String>,
    pub label_neighborhood: Option<String>,
}

impl Mismatch {
    pub fn render(&self) -> String {
        let rule = "=".repeat(MISMATCH_RULE_WIDTH);
        let subject = [&self.city, &self.neighborhood, &self.location]
            .into_iter()
            .filter(|part| !part.is_empty())
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(" ");

        let mut block = format!("{rule}\nMismatch for {subject}");
        if let (Some(outline), Some(label)) = (&self.outline_city, &self.label_city) {
            block.push_str(&format!(
                "\n  City Mismatch:\n    Document Map City: '{outline}'\n    Parsed Label City: '{label}'"
            ));
        }
        if let (Some(outline), Some(label)) = (&self.outline_location, &self.label_location) {
            block.push_str(&format!(
                "\n  Location Mismatch:\n    Document Map Location: '{outline}'\n    Parsed Label Location: '{label}'"
            ));
        }
        if let (Some(outline), Some(label)) = (&self.outline_neighborhood, &self.label_neighborhood)
        {
            block.push_str(&format!(
                "\n  Neighborhood Mismatch:\n    Document Map Neighborhood: '{outline}'\n    Parsed Label Neighborhood: '{label}'"
            ));
        }
        block.push('\n');
        block.push_str(&rule);
        block
    }
}

/// Compares label fields with the outline under the current context. A
/// city line differs when its spelling is not the heading's exactly. The
/// neighborhood differs when the label names one other than the context's;
/// the location differs when the outline lists no such location under the
/// context's neighborhood.
pub fn find_mismatch(
    context: &TraversalContext,
    label: &TopLabel,
    outline: &OutlineMap,
) -> Option<Mismatch> {
    let city_differs = !label.city.is_empty() && label.city != context.city;
    let neighborhood_differs =
        !label.neighborhood.is_empty() && label.neighborhood != context.neighborhood;
    let location_differs = !label.location.is_empty()
        && !outline.contains_location(&context.city, &context.neighborhood, &label.location);

    if !city_differs && !neighborhood_differs && !location_differs {
        return None;
    }

    Some(Mismatch {
        city: context.city.clone(),
        neighborhood: pick(&label.neighborhood, &context.neighborhood),
        location: pick(&label.location, &context.location),
        outline_city: city_differs.then(|| context.city.clone()),
        label_city: city_differs.then(|| label.city.clone()),
        outline_location: location_differs.then(|| context.location.clone()),
        label_location: location_differs.then(|| label.location.clone()),
        outline_neighborhood: neighborhood_differs.then(|| context.neighborhood.clone()),
        label_neighborhood: neighborhood_differs.then(|| label.neighborhood.clone()),
    })
}

fn pick(label_value: &str, context_value: &str) -> String {
    if label_value.is_empty() {
        context_value.to_string()
    } else {
        label_value.to_string()
    }
}

struct Assembler<'a> {
    parser: &'a LabelParser,
    config: &'a AssemblyConfig,
    outline: &'a OutlineMap,
    assembly: Assembly,
}

impl Assembler<'_> {
    fn note(&mut self, sink: &mut dyn LabelSink, severity: Severity, source: String, message: String) {
        if severity == Severity::Warning {
            self.assembly.warnings += 1;
        }
        sink.record(LabelLogEntry::new(severity, source, message));
    }

    fn table(&mut self, sink: &mut dyn LabelSink, context: &TraversalContext, table: &Table) {
        self.assembly.tables += 1;

        let extraction = extract_label_pairs(table, self.config.layout, &self.config.retired_fill);
        for warning in extraction.warnings {
            let source = format!("{}#table{}", self.config.source, context.table_index);
            self.note(sink, Severity::Warning, source, warning);
        }

        if !context.year.is_empty()
            && self
                .outline
                .years(&context.city, &context.neighborhood, &context.location)
                .is_some_and(|years| !years.contains(&context.year))
        {
            let source = format!("{}#table{}", self.config.source, context.table_index);
            let message = format!(
                "year '{}' is not listed under '{}' in the outline",
                context.year, context.location
            );
            self.note(sink, Severity::Info, source, message);
        }

        let mut positions: HashMap<(String, String, Orientation), u32> = HashMap::new();
        for pair in &extraction.pairs {
            self.assembly.label_pairs += 1;
            if let Some(record) = self.pair(sink, context, pair, &mut positions) {
                self.assembly.records.push(record);
            }
        }
    }

    fn pair(
        &mut self,
        sink: &mut dyn LabelSink,
        context: &TraversalContext,
        pair: &LabelPair,
        positions: &mut HashMap<(String, String, Orientation), u32>,
    ) -> Option<PennyRecord> {
        let source = context.source_id(&self.config.source, pair.position);

        let (label_city, top_text) = split_city_line(&pair.top, &context.city);
        let parsed_top = self.parser.detect_city_location_neighborhood(&top_text);
        if let Some(message) = parsed_top.warning() {
            let severity = if parsed_top.fields().is_some() {
                Severity::Warning
            } else {
                Severity::Info
            };
            self.note(sink, severity, source.clone(), message.to_string());
        }
        let mut top = parsed_top.into_fields().unwrap_or_default();
        top.city = label_city.unwrap_or_default();

        let bottom = match self.parser.detect_orientation_and_type(&pair.bottom) {
            LabelParse::Valid(fields) => fields,
            LabelParse::Ambiguous { fields, warning } => {
                self.note(sink, Severity::Warning, source.clone(), warning);
                fields
            }
            LabelParse::Invalid { reason } => {
                self.note(sink, Severity::Warning, source, format!("{reason}; no record emitted"));
                return None;
            }
        };

        if let Some(mismatch) = find_mismatch(context, &top, self.outline) {
            self.assembly.mismatches += 1;
            self.note(sink, Severity::Warning, source.clone(), mismatch.render());
        }

        let location = pick(&top.location, &context.location);
        let key = (location.clone(), bottom.name.clone(), bottom.orientation);
        let position = *positions.entry(key).or_insert(pair.position);
        if position != pair.position {
            debug!(
                source = %source,
                shared_position = position,
                "type variant shares an earlier position"
            );
        }

        Some(PennyRecord {
            state: self.config.state.clone(),
            city: context.city.clone(),
            neighborhood: pick(&top.neighborhood, &context.neighborhood),
            location,
            name: bottom.name,
            orientation: bottom.orientation,
            coin_type: bottom.coin_type,
            year: context.year.clone(),
            retired: pair.retired,
            position,
            source: self.config.source.clone(),
        })
    }
}

/// Walks the document body in order, tracking heading context, and turns
/// every table's label pairs into records. Label problems go to `sink` and
/// never abort the document.
pub fn assemble_records(
    document: &Document,
    parser: &LabelParser,
    config: &AssemblyConfig,
    sink: &mut dyn LabelSink,
) -> Assembly {
    let outline = OutlineMap::from_headings(&outline_headings(document));
    let mut context = TraversalContext::default();

    let mut assembler = Assembler {
        parser,
        config,
        outline: &outline,
        assembly: Assembly::default(),
    };

    for block in &document.blocks {
        match block {
            Block::Paragraph(paragraph) if !paragraph.toc => {
                let Some(level) = paragraph.heading else {
                    continue;
                };
                let text = normalize_cell_text(&paragraph.text);
                if !text.is_empty() {
                    context.enter_heading(level, &text, &outline);
                }
            }
            Block::Paragraph(_) => {}
            Block::Table(table) => {
                context.table_index += 1;
                assembler.table(sink, &context, table);
            }
        }
    }

    assembler.assembly
}
