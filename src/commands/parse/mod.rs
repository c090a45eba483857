use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use chrono::Utc;
use regex::Regex;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::cli::ParseArgs;
use crate::docx::{self, Block, Cell, Document, Table, WORDPROCESSING_MIME};
use crate::model::{
    FileSummary, LabelPair, Orientation, ParseCounts, ParseRunManifest, PennyRecord,
};
use crate::store::{DB_SCHEMA_VERSION, PennyStore};
use crate::util::{
    ensure_directory, file_stem_lower, now_utc_string, utc_compact_string, write_json_pretty,
};

mod label_log;
mod labels;
mod normalize;
mod outline;
mod output;
mod reconcile;
mod run;
mod state;
mod tables;
#[cfg(test)]
mod tests;
mod types;

pub use output::write_records_to;
pub use tables::DEFAULT_RETIRED_FILL;
pub use run::run;

use label_log::*;
use labels::*;
use normalize::*;
use outline::*;
use output::*;
use reconcile::*;
use state::*;
use tables::*;
use types::*;
