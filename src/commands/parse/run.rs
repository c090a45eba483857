use super::*;

const MANIFEST_VERSION: u32 = 1;

pub fn run(args: ParseArgs) -> Result<()> {
    let started_ts = Utc::now();
    let started_at = now_utc_string();
    let run_id = format!("parse-{}", utc_compact_string(started_ts));

    let inputs = collect_inputs(&args.input)?;
    if inputs.is_empty() {
        bail!("no .docx documents found in {}", args.input.display());
    }

    info!(
        input = %args.input.display(),
        output = %args.output.display(),
        documents = inputs.len(),
        new_only = args.new_only,
        run_id = %run_id,
        "starting parse"
    );

    let mut store = PennyStore::open(&args.db_path)?;
    let parser = LabelParser::new(LabelOptions {
        short_location: args.short_location,
        multi_line_dash: args.multi_line_dash,
    })?;
    let mut writer = RecordWriter::create(&args.output, args.append)?;

    let mut counts = ParseCounts {
        input_count: inputs.len(),
        ..ParseCounts::default()
    };
    let mut files = Vec::with_capacity(inputs.len());

    for path in &inputs {
        match process_document(path, &args, &parser, &mut store, &mut writer) {
            Ok(summary) => {
                counts.processed_count += 1;
                counts.records_total += summary.records;
                counts.records_written += summary.records_written;
                counts.records_committed += summary.records_committed;
                counts.mismatches += summary.mismatches;
                files.push(summary);
            }
            Err(err) => {
                let reason = format!("{err:#}");
                error!(path = %path.display(), error = %reason, "document failed; continuing");
                counts.failed_count += 1;
                files.push(FileSummary {
                    source: display_name(path),
                    status: "failed".to_string(),
                    failure_reason: Some(reason),
                    ..FileSummary::default()
                });
            }
        }
    }

    counts.store_total = store.count()?;

    info!(
        processed = counts.processed_count,
        failed = counts.failed_count,
        records = counts.records_total,
        written = writer.rows_written(),
        committed = counts.records_committed,
        mismatches = counts.mismatches,
        store_total = counts.store_total,
        "parse finished"
    );

    if let Some(manifest_path) = &args.manifest_path {
        let manifest = ParseRunManifest {
            manifest_version: MANIFEST_VERSION,
            run_id,
            db_schema_version: DB_SCHEMA_VERSION.to_string(),
            status: if counts.failed_count == 0 {
                "completed".to_string()
            } else {
                "partial".to_string()
            },
            started_at,
            updated_at: now_utc_string(),
            input_path: args.input.display().to_string(),
            output_path: args.output.display().to_string(),
            db_path: args.db_path.display().to_string(),
            short_location: args.short_location,
            multi_line_dash: args.multi_line_dash,
            new_only: args.new_only,
            counts: counts.clone(),
            files,
        };
        write_json_pretty(manifest_path, &manifest)?;
        info!(path = %manifest_path.display(), "wrote parse manifest");
    }

    if counts.failed_count > 0 {
        bail!(
            "{} of {} documents failed",
            counts.failed_count,
            counts.input_count
        );
    }

    Ok(())
}

/// Parses, writes and commits one document. Rows are flushed before the
/// store is touched, so a failed write leaves no entries marked as seen.
pub(super) fn process_document(
    path: &Path,
    args: &ParseArgs,
    parser: &LabelParser,
    store: &mut PennyStore,
    writer: &mut RecordWriter,
) -> Result<FileSummary> {
    let source = display_name(path);

    check_mime_type(path)?;
    let state = state_from_filename(path)?;

    let document = docx::read_document(path).map_err(|err| DocumentError::Unreadable {
        file: source.clone(),
        reason: format!("{err:#}"),
    })?;
    if let Some(content_type) = document.content_type.as_deref() {
        if !content_type.starts_with(WORDPROCESSING_MIME) {
            return Err(DocumentError::UnsupportedMime {
                file: source,
                mime: content_type.to_string(),
            }
            .into());
        }
    }

    let config = AssemblyConfig {
        state: state.clone(),
        source: source.clone(),
        retired_fill: args.retired_fill.trim_start_matches('#').to_string(),
        layout: LabelLayout::default(),
    };

    let mut label_log = FileLabelLog::open(&args.log_dir, path)?;
    let assembly = assemble_records(&document, parser, &config, &mut label_log);
    label_log.flush()?;

    let output = if args.new_only {
        store.filter_new(&assembly.records)?
    } else {
        assembly.records.clone()
    };
    let written = writer.write_records(&output)?;
    let committed = store
        .commit(&assembly.records)
        .with_context(|| format!("failed to commit records from {source}"))?;

    info!(
        source = %source,
        state = %state,
        tables = assembly.tables,
        records = assembly.records.len(),
        written,
        committed,
        mismatches = assembly.mismatches,
        label_log = %label_log.path().display(),
        log_entries = label_log.entries(),
        "document processed"
    );

    Ok(FileSummary {
        source,
        state,
        status: "processed".to_string(),
        tables: assembly.tables,
        label_pairs: assembly.label_pairs,
        records: assembly.records.len(),
        records_written: written,
        records_committed: committed,
        mismatches: assembly.mismatches,
        label_warnings: assembly.warnings.saturating_sub(assembly.mismatches),
        failure_reason: None,
    })
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

fn check_mime_type(path: &Path) -> Result<(), DocumentError> {
    match docx::guess_mime_type(path) {
        Some(WORDPROCESSING_MIME) => Ok(()),
        other => Err(DocumentError::UnsupportedMime {
            file: display_name(path),
            mime: other.unwrap_or("unknown").to_string(),
        }),
    }
}

/// A single file as given, or the `.docx` files of a directory in name
/// order, skipping Word lock files (`~$*`).
pub(super) fn collect_inputs(input: &Path) -> Result<Vec<PathBuf>> {
    if input.is_file() {
        return Ok(vec![input.to_path_buf()]);
    }
    if !input.is_dir() {
        bail!("input path does not exist: {}", input.display());
    }

    let mut documents = Vec::new();
    for entry in fs::read_dir(input)
        .with_context(|| format!("failed to read directory {}", input.display()))?
    {
        let entry = entry.with_context(|| format!("failed to list {}", input.display()))?;
        let path = entry.path();

        if entry.file_name().to_string_lossy().starts_with("~$") {
            debug!(path = %path.display(), "skipping lock file");
            continue;
        }
        let is_docx = path
            .extension()
            .and_then(|extension| extension.to_str())
            .is_some_and(|extension| extension.eq_ignore_ascii_case("docx"));
        if path.is_file() && is_docx {
            documents.push(path);
        }
    }

    documents.sort();
    Ok(documents)
}
