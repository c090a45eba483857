use std::path::PathBuf;

use crate::docx::Paragraph;
use crate::docx::fixtures::DocxBuilder;
use crate::store::hash_record;

use super::run::{collect_inputs, process_document};
use super::*;

fn parser() -> LabelParser {
    LabelParser::new(LabelOptions::default()).expect("label parser")
}

fn parser_with(short_location: bool, multi_line_dash: bool) -> LabelParser {
    LabelParser::new(LabelOptions {
        short_location,
        multi_line_dash,
    })
    .expect("label parser")
}

fn heading(level: u8, text: &str) -> Block {
    Block::Paragraph(Paragraph {
        heading: Some(level),
        toc: false,
        text: text.to_string(),
    })
}

fn cell(text: &str) -> Cell {
    Cell {
        text: text.to_string(),
        fill: None,
    }
}

fn shaded(text: &str, fill: &str) -> Cell {
    Cell {
        text: text.to_string(),
        fill: Some(fill.to_string()),
    }
}

fn config() -> AssemblyConfig {
    AssemblyConfig {
        state: "California".to_string(),
        source: "california.docx".to_string(),
        retired_fill: DEFAULT_RETIRED_FILL.to_string(),
        layout: LabelLayout::default(),
    }
}

fn headings(items: &[(u8, &str)]) -> Vec<(u8, String)> {
    items
        .iter()
        .map(|(level, text)| (*level, text.to_string()))
        .collect()
}

fn anaheim_fixture(path: &Path) {
    DocxBuilder::default()
        .toc_entry("Anaheim")
        .heading(1, "Anaheim")
        .heading(2, "Downtown Disney")
        .heading(3, "World of Disney")
        .heading(4, "2019")
        .table(&[
            vec![("Downtown Disney - World Of Disney", None)],
            vec![("h\nCastle", None)],
        ])
        .write(path);
}

fn parse_args(dir: &Path, input: PathBuf, output: &str) -> ParseArgs {
    ParseArgs {
        input,
        output: dir.join(output),
        short_location: false,
        multi_line_dash: false,
        new_only: true,
        append: false,
        db_path: dir.join("pennies.db"),
        log_dir: dir.join("logs"),
        retired_fill: DEFAULT_RETIRED_FILL.to_string(),
        manifest_path: None,
    }
}

fn csv_rows(path: &Path) -> Vec<Vec<String>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .from_path(path)
        .expect("open csv");
    reader
        .records()
        .map(|row| {
            row.expect("csv row")
                .iter()
                .map(str::to_string)
                .collect()
        })
        .collect()
}

#[test]
fn sanitize_maps_document_punctuation_to_ascii() {
    let input = "\u{2018}Hi\u{2019} \u{201C}there\u{201D} \u{2013} \u{2014} \u{2026}\u{00A0}\u{2022}\u{00AE}\u{2122}\u{00A9}\u{00B0}";
    assert_eq!(
        sanitize_for_output(input),
        "'Hi' \"there\" - - ... *(R)(TM)(C)deg"
    );
    assert_eq!(sanitize_for_output("Mickey\u{02BC}s 45\u{2032}"), "Mickey's 45'");
    assert_eq!(sanitize_for_output("plain & simple"), "plain & simple");
}

#[test]
fn sanitize_is_idempotent() {
    let inputs = [
        "Cameron\u{2019}s Restaurant, Pub & Inn",
        "\u{201E}quoted\u{201F} \u{2015} \u{2212}5\u{00B0}",
        "zero\u{200B}width\u{FEFF}",
        "Buc-ee\u{2019}s \u{2013} Two\u{2011}Way",
    ];
    for input in inputs {
        let once = sanitize_for_output(input);
        assert_eq!(sanitize_for_output(&once), once, "input {input:?}");
    }
}

#[test]
fn normalize_cell_text_never_leaves_line_breaks() {
    let inputs = [
        "\r\n",
        "a\rb",
        "line one\nline two\r\nline three",
        "\n\n  Downtown\u{00A0}Disney \u{2013}\r\nWorld  of\tDisney \n",
        "",
    ];
    for input in inputs {
        let normalized = normalize_cell_text(input);
        assert!(!normalized.contains(['\r', '\n']), "input {input:?}");
    }

    assert_eq!(
        normalize_cell_text("  Downtown\u{00A0}Disney \u{2013}\r\nWorld  of\tDisney "),
        "Downtown Disney - World of Disney"
    );
}

#[test]
fn strip_newlines_keeps_words_apart() {
    assert_eq!(strip_newlines("Pirates\r\nof the\nCaribbean"), "Pirates of the Caribbean");
    assert_eq!(strip_newlines("no breaks"), "no breaks");
}

#[test]
fn split_and_strip_drops_empty_pieces_in_order() {
    assert_eq!(
        split_and_strip(" a | | b |c", "|"),
        vec!["a".to_string(), "b".to_string(), "c".to_string()]
    );
    assert!(split_and_strip("   ", ",").is_empty());
}

#[test]
fn separator_dashes_ignore_in_word_hyphens() {
    let parser = parser();
    assert_eq!(
        parser.split_on_separator_dash("Buc-ee's - Two-Way Street"),
        vec!["Buc-ee's".to_string(), "Two-Way Street".to_string()]
    );
    assert_eq!(
        parser.split_on_separator_dash("Hollywood \u{2014} Vine - Walk of Fame"),
        vec![
            "Hollywood".to_string(),
            "Vine".to_string(),
            "Walk of Fame".to_string()
        ]
    );
    assert!(parser.contains_separator_dash("Hollywood \u{2013} Vine"));
    assert!(!parser.contains_separator_dash("Two-Way"));
    assert!(!parser.contains_separator_dash("Route 66-A"));
}

#[test]
fn top_label_with_dash_splits_neighborhood_and_location() {
    let parsed = parser().detect_city_location_neighborhood("Downtown Disney - World of Disney");
    assert_eq!(
        parsed,
        LabelParse::Valid(TopLabel {
            city: String::new(),
            neighborhood: "Downtown Disney".to_string(),
            location: "World of Disney".to_string(),
        })
    );
}

#[test]
fn top_label_without_separator_is_location_only() {
    let parsed = parser().detect_city_location_neighborhood("Cameron's Restaurant, Pub & Inn");
    let fields = parsed.fields().expect("fields");
    assert_eq!(fields.neighborhood, "");
    assert_eq!(fields.location, "Cameron's Restaurant, Pub & Inn");
    assert!(parsed.warning().is_none());
}

#[test]
fn top_label_on_two_lines_reads_neighborhood_then_location() {
    let parsed = parser().detect_city_location_neighborhood("Fantasyland\nCastle Gifts");
    let fields = parsed.into_fields().expect("fields");
    assert_eq!(fields.neighborhood, "Fantasyland");
    assert_eq!(fields.location, "Castle Gifts");

    let dashed = parser_with(false, true).detect_city_location_neighborhood("Fantasyland\nCastle Gifts");
    let fields = dashed.into_fields().expect("fields");
    assert_eq!(fields.neighborhood, "Fantasyland");
    assert_eq!(fields.location, "Castle Gifts");
}

#[test]
fn continuation_lines_extend_the_previous_line() {
    let parsed = parser().detect_city_location_neighborhood("Pirates\nof the Caribbean");
    let fields = parsed.into_fields().expect("fields");
    assert_eq!(fields.neighborhood, "");
    assert_eq!(fields.location, "Pirates of the Caribbean");

    let parsed = parser().detect_city_location_neighborhood("Main Street - Emporium\nAnd Gifts");
    let fields = parsed.into_fields().expect("fields");
    assert_eq!(fields.neighborhood, "Main Street");
    assert_eq!(fields.location, "Emporium And Gifts");
}

#[test]
fn undashed_lines_after_neighborhood_join_with_dash() {
    let label = "Downtown\nStreet Name\nAnother Location";

    let full = parser().detect_city_location_neighborhood(label);
    assert_eq!(
        full,
        LabelParse::Valid(TopLabel {
            city: String::new(),
            neighborhood: "Downtown".to_string(),
            location: "Street Name - Another Location".to_string(),
        })
    );

    let short = parser_with(true, false).detect_city_location_neighborhood(label);
    let fields = short.into_fields().expect("fields");
    assert_eq!(fields.neighborhood, "Downtown");
    assert_eq!(fields.location, "Another Location");

    let continued = parser()
        .detect_city_location_neighborhood("Downtown\nStreet Name\nAnd Another Location");
    let fields = continued.into_fields().expect("fields");
    assert_eq!(fields.neighborhood, "Downtown");
    assert_eq!(fields.location, "Street Name And Another Location");
}

#[test]
fn short_location_keeps_trailing_form() {
    let full = parser().detect_city_location_neighborhood("Disneyland - Tomorrowland - Star Traders");
    assert!(matches!(full, LabelParse::Ambiguous { .. }));
    assert_eq!(
        full.fields().map(|fields| fields.location.as_str()),
        Some("Tomorrowland - Star Traders")
    );

    let short = parser_with(true, false)
        .detect_city_location_neighborhood("Disneyland - Tomorrowland - Star Traders");
    let fields = short.into_fields().expect("fields");
    assert_eq!(fields.neighborhood, "Disneyland");
    assert_eq!(fields.location, "Star Traders");

    let joined = parser_with(true, false)
        .detect_city_location_neighborhood("Adventureland - Pirates - of the Caribbean");
    let fields = joined.into_fields().expect("fields");
    assert_eq!(fields.neighborhood, "Adventureland");
    assert_eq!(fields.location, "Pirates of the Caribbean");
}

#[test]
fn empty_labels_are_invalid_not_errors() {
    let parser = parser();
    assert!(matches!(
        parser.detect_city_location_neighborhood("  \n\t "),
        LabelParse::Invalid { .. }
    ));
    assert!(matches!(
        parser.detect_orientation_and_type(""),
        LabelParse::Invalid { .. }
    ));
}

#[test]
fn bottom_label_leading_token_sets_orientation() {
    let parsed = parser().detect_orientation_and_type("h\nCastle");
    assert_eq!(
        parsed,
        LabelParse::Valid(BottomLabel {
            orientation: Orientation::Horizontal,
            name: "Castle".to_string(),
            coin_type: String::new(),
        })
    );

    let vertical = parser().detect_orientation_and_type("V Tinker Bell\nand Friends");
    let fields = vertical.into_fields().expect("fields");
    assert_eq!(fields.orientation, Orientation::Vertical);
    assert_eq!(fields.name, "Tinker Bell and Friends");
}

#[test]
fn bottom_label_leading_token_drops_separator_dash() {
    let parsed = parser().detect_orientation_and_type("h - Castle");
    assert_eq!(
        parsed,
        LabelParse::Valid(BottomLabel {
            orientation: Orientation::Horizontal,
            name: "Castle".to_string(),
            coin_type: String::new(),
        })
    );

    let hyphenated = parser().detect_orientation_and_type("v -Castle");
    let fields = hyphenated.into_fields().expect("fields");
    assert_eq!(fields.orientation, Orientation::Vertical);
    assert_eq!(fields.name, "-Castle");
}

#[test]
fn bottom_label_without_orientation_is_ambiguous_unknown() {
    let parsed = parser().detect_orientation_and_type("Castle");
    match parsed {
        LabelParse::Ambiguous { fields, warning } => {
            assert_eq!(fields.orientation, Orientation::Unknown);
            assert_eq!(fields.name, "Castle");
            assert!(warning.contains("orientation"));
        }
        other => panic!("expected ambiguous parse, got {other:?}"),
    }
}

#[test]
fn bottom_label_marker_splits_name_and_type() {
    let parsed = parser().detect_orientation_and_type("Denver Colorado - Mile High City (h) Copper Penny");
    let fields = parsed.into_fields().expect("fields");
    assert_eq!(fields.orientation, Orientation::Horizontal);
    assert_eq!(fields.name, "Denver Colorado - Mile High City");
    assert_eq!(fields.coin_type, "Copper Penny");

    let plain = parser().detect_orientation_and_type("The Aristocats\nSomething (V) Zinc");
    assert_eq!(plain.fields().map(|fields| fields.name.as_str()), Some("The Aristocats Something"));

    let dashed = parser_with(false, true).detect_orientation_and_type("The Aristocats\nSomething (V) Zinc");
    let fields = dashed.into_fields().expect("fields");
    assert_eq!(fields.orientation, Orientation::Vertical);
    assert_eq!(fields.name, "The Aristocats - Something");
    assert_eq!(fields.coin_type, "Zinc");

    let leading = parser().detect_orientation_and_type("(h)\nCastle");
    let fields = leading.into_fields().expect("fields");
    assert_eq!(fields.orientation, Orientation::Horizontal);
    assert_eq!(fields.name, "Castle");
}

#[test]
fn city_line_is_split_from_multi_line_labels() {
    let (city, rest) = split_city_line("ANAHEIM\nDowntown Disney - World of Disney", "Anaheim");
    assert_eq!(city.as_deref(), Some("ANAHEIM"));
    assert_eq!(rest, "Downtown Disney - World of Disney");

    let (city, rest) = split_city_line("Anaheim", "Anaheim");
    assert_eq!(city, None);
    assert_eq!(rest, "Anaheim");
}

#[test]
fn heading_tree_nests_by_level() {
    let tree = build_heading_tree(&headings(&[
        (1, "Anaheim"),
        (2, "Downtown Disney"),
        (3, "World of Disney"),
        (4, "2019"),
        (2, "Disneyland Hotel"),
        (1, "Buena Park"),
    ]));

    assert_eq!(tree.len(), 2);
    assert_eq!(tree[0].text, "Anaheim");
    assert_eq!(tree[0].children.len(), 2);
    assert_eq!(tree[0].children[0].children[0].text, "World of Disney");
    assert_eq!(tree[0].children[0].children[0].children[0].text, "2019");
    assert!(tree[1].children.is_empty());
}

#[test]
fn heading_two_with_heading_three_children_becomes_neighborhood() {
    let outline = OutlineMap::from_headings(&headings(&[
        (1, "Anaheim"),
        (2, "Downtown Disney"),
        (3, "World of Disney"),
        (4, "2019"),
        (4, "2021"),
    ]));

    assert!(outline.is_neighborhood("Anaheim", "Downtown Disney"));
    assert!(outline.contains_location("Anaheim", "Downtown Disney", "World of Disney"));
    assert!(!outline.contains_location("Anaheim", "", "Downtown Disney"));

    let years = outline
        .years("Anaheim", "Downtown Disney", "World of Disney")
        .expect("years");
    assert!(years.contains("2019") && years.contains("2021"));
}

#[test]
fn heading_two_without_children_becomes_location() {
    let outline = OutlineMap::from_headings(&headings(&[
        (1, "Anaheim"),
        (2, "Disneyland Hotel"),
        (4, "2020"),
        (2, "Downtown Disney"),
        (3, "World of Disney"),
    ]));

    assert!(!outline.is_neighborhood("Anaheim", "Disneyland Hotel"));
    assert!(outline.contains_location("Anaheim", "", "Disneyland Hotel"));
    assert!(
        outline
            .years("Anaheim", "", "Disneyland Hotel")
            .is_some_and(|years| years.contains("2020"))
    );
    assert!(outline.is_neighborhood("Anaheim", "Downtown Disney"));
}

#[test]
fn repeated_headings_merge_into_one_entry() {
    let outline = OutlineMap::from_headings(&headings(&[
        (3, "Orphan Location"),
        (1, "Anaheim"),
        (2, "Downtown Disney"),
        (3, "World of Disney"),
        (1, "Anaheim"),
        (2, "Downtown Disney"),
        (3, "LEGO Store"),
        (3, "World of Disney"),
    ]));

    let locations = outline
        .locations("Anaheim", "Downtown Disney")
        .expect("locations");
    assert_eq!(locations.len(), 2);
    assert!(outline.contains_location("", "", "Orphan Location"));
}

#[test]
fn label_pairs_follow_row_major_positions_and_skip_spacers() {
    let table = Table {
        rows: vec![
            vec![shaded("Loc A", "F2DBDB"), cell("spacer"), cell("Loc B")],
            vec![shaded("h\nOne", "f2dbdb"), cell(""), shaded("v\nTwo", "f2dbdb")],
            vec![cell(""), cell(""), cell("Loc D")],
            vec![cell(""), cell(""), cell("h\nFour")],
        ],
    };

    let extraction = extract_label_pairs(&table, LabelLayout::default(), DEFAULT_RETIRED_FILL);
    assert!(extraction.warnings.is_empty());

    let positions: Vec<u32> = extraction.pairs.iter().map(|pair| pair.position).collect();
    assert_eq!(positions, vec![1, 2, 4]);

    assert!(extraction.pairs[0].retired);
    assert!(!extraction.pairs[1].retired);
    assert!(!extraction.pairs[2].retired);
    assert_eq!(extraction.pairs[2].top, "Loc D");
    assert_eq!(extraction.pairs[2].bottom, "h\nFour");
}

#[test]
fn odd_trailing_row_is_skipped_with_warning() {
    let table = Table {
        rows: vec![
            vec![cell("Loc A")],
            vec![cell("h\nOne")],
            vec![cell("Loc B")],
        ],
    };

    let extraction = extract_label_pairs(&table, LabelLayout::default(), DEFAULT_RETIRED_FILL);
    assert_eq!(extraction.pairs.len(), 1);
    assert_eq!(extraction.warnings.len(), 1);
    assert!(extraction.warnings[0].contains("incomplete trailing group"));
}

#[test]
fn other_shading_colors_are_not_retired() {
    assert!(is_retired_fill(&shaded("x", "F2DBDB"), "f2dbdb"));
    assert!(!is_retired_fill(&shaded("x", "ffcccc"), "f2dbdb"));
    assert!(!is_retired_fill(&cell("x"), "f2dbdb"));
}

#[test]
fn state_comes_from_file_name() {
    let cases = [
        ("ca.docx", "California"),
        ("ca-2024.docx", "California"),
        ("new-york.docx", "New York"),
        ("newyork_backup.docx", "New York"),
        ("west.virginia.docx", "West Virginia"),
        ("Arkansas.docx", "Arkansas"),
        ("dc.docx", "District of Columbia"),
    ];
    for (file, expected) in cases {
        let state = state_from_filename(Path::new(file)).expect("state");
        assert_eq!(state, expected, "file {file}");
    }
}

#[test]
fn unknown_state_is_a_document_error() {
    let err = state_from_filename(Path::new("pennies.docx")).expect_err("no state");
    assert!(matches!(err, DocumentError::UnknownState { ref file } if file == "pennies.docx"));
}

#[test]
fn traversal_context_tracks_headings() {
    let outline = OutlineMap::from_headings(&headings(&[
        (1, "Anaheim"),
        (2, "Downtown Disney"),
        (3, "World of Disney"),
        (2, "Disneyland Hotel"),
    ]));
    let mut context = TraversalContext::default();

    context.enter_heading(1, "Anaheim", &outline);
    context.enter_heading(2, "Downtown Disney", &outline);
    context.enter_heading(3, "World of Disney", &outline);
    context.enter_heading(4, "2019", &outline);
    assert_eq!(context.neighborhood, "Downtown Disney");
    assert_eq!(context.location, "World of Disney");
    assert_eq!(context.year, "2019");

    context.enter_heading(2, "Disneyland Hotel", &outline);
    assert_eq!(context.neighborhood, "");
    assert_eq!(context.location, "Disneyland Hotel");
    assert_eq!(context.year, "");

    context.table_index = 3;
    context.enter_heading(1, "Buena Park", &outline);
    assert_eq!(
        context,
        TraversalContext {
            city: "Buena Park".to_string(),
            table_index: 3,
            ..TraversalContext::default()
        }
    );
}

#[test]
fn mismatch_block_names_both_values() {
    let outline = OutlineMap::from_headings(&headings(&[
        (1, "Anaheim"),
        (2, "Downtown Disney"),
        (3, "World of Disney"),
    ]));
    let context = TraversalContext {
        city: "Anaheim".to_string(),
        neighborhood: "Downtown Disney".to_string(),
        location: "World of Disney".to_string(),
        ..TraversalContext::default()
    };
    let label = TopLabel {
        city: String::new(),
        neighborhood: "Downtown Disney".to_string(),
        location: "World Of Disney".to_string(),
    };

    let mismatch = find_mismatch(&context, &label, &outline).expect("mismatch");
    let rule = "=".repeat(60);
    assert_eq!(
        mismatch.render(),
        format!(
            "{rule}\nMismatch for Anaheim Downtown Disney World Of Disney\n  Location Mismatch:\n    Document Map Location: 'World of Disney'\n    Parsed Label Location: 'World Of Disney'\n{rule}"
        )
    );

    let matching = TopLabel {
        location: "World of Disney".to_string(),
        ..label
    };
    assert!(find_mismatch(&context, &matching, &outline).is_none());
}

#[test]
fn assembly_reuses_positions_for_type_variants_and_skips_empty_bottoms() {
    let document = Document {
        content_type: None,
        blocks: vec![
            heading(1, "Anaheim"),
            heading(2, "Disneyland Hotel"),
            heading(4, "2022"),
            Block::Table(Table {
                rows: vec![
                    vec![cell("Disneyland Hotel"), cell(""), cell("Disneyland Hotel"), cell(""), cell("Disneyland Hotel")],
                    vec![cell("Castle (h) Copper"), cell(""), cell("Castle (h) Zinc"), cell(""), cell("")],
                ],
            }),
        ],
    };

    let mut sink: Vec<LabelLogEntry> = Vec::new();
    let assembly = assemble_records(&document, &parser(), &config(), &mut sink);

    assert_eq!(assembly.tables, 1);
    assert_eq!(assembly.label_pairs, 3);
    assert_eq!(assembly.records.len(), 2);
    assert_eq!(assembly.mismatches, 0);

    let first = &assembly.records[0];
    let second = &assembly.records[1];
    assert_eq!(first.coin_type, "Copper");
    assert_eq!(second.coin_type, "Zinc");
    assert_eq!(first.position, 1);
    assert_eq!(second.position, 1);
    assert_eq!(first.year, "2022");
    assert_eq!(hash_record(first), hash_record(second));

    assert_eq!(sink.len(), 1);
    assert_eq!(sink[0].severity, Severity::Warning);
    assert_eq!(sink[0].source, "california.docx#table1:pos3");
    assert!(sink[0].message.contains("bottom label is empty"));
}

#[test]
fn end_to_end_label_wins_and_logs_one_mismatch() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("california.docx");
    anaheim_fixture(&path);

    let document = docx::read_document(&path).expect("read fixture");
    let mut sink: Vec<LabelLogEntry> = Vec::new();
    let assembly = assemble_records(&document, &parser(), &config(), &mut sink);

    assert_eq!(assembly.records.len(), 1);
    let record = &assembly.records[0];
    assert_eq!(record.state, "California");
    assert_eq!(record.city, "Anaheim");
    assert_eq!(record.neighborhood, "Downtown Disney");
    assert_eq!(record.location, "World Of Disney");
    assert_eq!(record.name, "Castle");
    assert_eq!(record.orientation, Orientation::Horizontal);
    assert_eq!(record.year, "2019");
    assert_eq!(record.position, 1);
    assert!(!record.retired);

    assert_eq!(assembly.mismatches, 1);
    let mismatches: Vec<&LabelLogEntry> = sink
        .iter()
        .filter(|entry| entry.message.contains("Mismatch for"))
        .collect();
    assert_eq!(mismatches.len(), 1);
    assert!(mismatches[0].message.contains("Document Map Location: 'World of Disney'"));
    assert!(mismatches[0].message.contains("Parsed Label Location: 'World Of Disney'"));
    assert!(!mismatches[0].message.contains("Neighborhood Mismatch"));
}

#[test]
fn new_only_twice_writes_nothing_the_second_time() {
    let dir = tempfile::tempdir().expect("tempdir");
    let input = dir.path().join("california.docx");
    anaheim_fixture(&input);

    run(parse_args(dir.path(), input.clone(), "first.csv")).expect("first run");
    let count_after_first = PennyStore::open(&dir.path().join("pennies.db"))
        .expect("store")
        .count()
        .expect("count");
    assert_eq!(count_after_first, 1);

    let first_rows = csv_rows(&dir.path().join("first.csv"));
    assert_eq!(first_rows.len(), 2);
    assert_eq!(first_rows[0], CSV_HEADER.map(str::to_string).to_vec());
    assert_eq!(first_rows[1][3], "World Of Disney");

    run(parse_args(dir.path(), input, "second.csv")).expect("second run");
    let second_rows = csv_rows(&dir.path().join("second.csv"));
    assert_eq!(second_rows.len(), 1, "only the header is written");

    let count_after_second = PennyStore::open(&dir.path().join("pennies.db"))
        .expect("store")
        .count()
        .expect("count");
    assert_eq!(count_after_second, count_after_first);

    let log = fs::read_to_string(dir.path().join("logs").join("labels_california.log"))
        .expect("label log");
    assert_eq!(log.matches("Mismatch for Anaheim").count(), 2);
}

#[test]
fn batch_continues_past_failed_documents() {
    let dir = tempfile::tempdir().expect("tempdir");
    let batch = dir.path().join("docs");
    fs::create_dir_all(&batch).expect("batch dir");

    anaheim_fixture(&batch.join("california.docx"));
    anaheim_fixture(&batch.join("unknown.docx"));
    fs::write(batch.join("~$california.docx"), "lock").expect("lock file");
    fs::write(batch.join("notes.txt"), "ignored").expect("text file");

    let inputs = collect_inputs(&batch).expect("inputs");
    assert_eq!(inputs.len(), 2);

    let mut args = parse_args(dir.path(), batch, "batch.csv");
    args.new_only = false;
    args.manifest_path = Some(dir.path().join("manifest.json"));

    let err = run(args).expect_err("one document fails");
    assert!(format!("{err:#}").contains("1 of 2 documents failed"));

    let rows = csv_rows(&dir.path().join("batch.csv"));
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[1][0], "California");

    let manifest: serde_json::Value = serde_json::from_str(
        &fs::read_to_string(dir.path().join("manifest.json")).expect("manifest"),
    )
    .expect("manifest json");
    assert_eq!(manifest["status"], "partial");
    assert_eq!(manifest["counts"]["failed_count"], 1);
    assert_eq!(manifest["files"][1]["status"], "failed");
}

#[test]
fn unsupported_extension_is_rejected_before_reading() {
    let dir = tempfile::tempdir().expect("tempdir");
    let input = dir.path().join("california.txt");
    fs::write(&input, "not a document").expect("write");

    let args = parse_args(dir.path(), input.clone(), "out.csv");
    let parser = parser();
    let mut store = PennyStore::open(&args.db_path).expect("store");
    let mut writer = RecordWriter::create(&args.output, false).expect("writer");

    let err = process_document(&input, &args, &parser, &mut store, &mut writer)
        .expect_err("unsupported input");
    assert!(matches!(
        err.downcast_ref::<DocumentError>(),
        Some(DocumentError::UnsupportedMime { .. })
    ));
    assert_eq!(store.count().expect("count"), 0);
}

#[test]
fn record_writer_appends_without_second_header() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("out").join("pennies.csv");
    let record = PennyRecord {
        state: "California".to_string(),
        city: "Anaheim".to_string(),
        location: "Cameron\u{2019}s Restaurant, Pub & Inn".to_string(),
        name: "Say \"Cheese\"".to_string(),
        orientation: Orientation::Vertical,
        retired: true,
        position: 7,
        source: "california.docx".to_string(),
        ..PennyRecord::default()
    };

    let mut writer = RecordWriter::create(&path, false).expect("create");
    writer.write_records(std::slice::from_ref(&record)).expect("write");
    drop(writer);

    let mut appended = RecordWriter::create(&path, true).expect("append");
    appended.write_records(&[record]).expect("write");
    assert_eq!(appended.rows_written(), 1);
    drop(appended);

    let raw = fs::read_to_string(&path).expect("read csv");
    assert_eq!(raw.matches("State,City").count(), 1);
    assert!(raw.contains("\"Cameron's Restaurant, Pub & Inn\""));
    assert!(raw.contains("\"Say \"\"Cheese\"\"\""));

    let rows = csv_rows(&path);
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[1][5], "v");
    assert_eq!(rows[1][8], "Yes");
    assert_eq!(rows[1][9], "7");
}

#[test]
fn file_label_log_appends_rendered_entries() {
    let dir = tempfile::tempdir().expect("tempdir");
    let document = Path::new("California.docx");

    for message in ["first", "second"] {
        let mut log = FileLabelLog::open(dir.path(), document).expect("open log");
        log.record(LabelLogEntry::new(
            Severity::Warning,
            "california.docx#table1:pos2",
            message,
        ));
        assert_eq!(log.entries(), 1);
        log.flush().expect("flush");
    }

    let raw = fs::read_to_string(dir.path().join("labels_california.log")).expect("read log");
    assert!(raw.contains("WARNING california.docx#table1:pos2\nfirst"));
    assert!(raw.contains("WARNING california.docx#table1:pos2\nsecond"));
}
