//! Conversion of the TIN-X score CSV files into database table dumps.
//!
//! The four CSV files written by `score` are read by column position and converted into the
//! `tinx_disease`, `tinx_novelty`, `tinx_importance`, and `tinx_articlerank` tables.  Each
//! table is written as a TSV file with header and sequential 1-based row identifiers.

use std::io::{Read, Write};
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{de::DeserializeOwned, Serialize};
use thousands::Separable;

use crate::common::io::std::{open_read_maybe_gz, open_write_maybe_gz};
use crate::common::line_progress;
use crate::mentions::Pmid;
use crate::obo::DiseaseOntology;
use crate::score::output::{
    fixed8, DISEASE_NOVELTY_FILE, IMPORTANCE_FILE, PMID_RANKING_FILE, PROTEIN_NOVELTY_FILE,
};

pub const TINX_DISEASE_FILE: &str = "tinx_disease.tsv";
pub const TINX_NOVELTY_FILE: &str = "tinx_novelty.tsv";
pub const TINX_IMPORTANCE_FILE: &str = "tinx_importance.tsv";
pub const TINX_ARTICLERANK_FILE: &str = "tinx_articlerank.tsv";

/// Command line arguments for `load` sub command.
#[derive(Parser, Debug)]
#[command(about = "Convert TIN-X score CSV files into table dumps", long_about = None)]
pub struct Args {
    /// Path to the Disease Ontology OBO file.
    #[arg(long)]
    pub path_disease_ontology: PathBuf,
    /// Directory containing the CSV files written by `tinx score`.
    #[arg(long)]
    pub path_input_dir: PathBuf,
    /// Directory to write the table TSV files to, created if missing.
    #[arg(long)]
    pub path_output_dir: PathBuf,
}

/// Row of the `tinx_disease` table.
#[derive(Serialize, Debug)]
struct TinxDisease<'a> {
    id: usize,
    doid: &'a str,
    name: &'a str,
    summary: &'a str,
    #[serde(serialize_with = "fixed8")]
    score: f64,
}

/// Row of the `tinx_novelty` table.
#[derive(Serialize, Debug)]
struct TinxNovelty {
    id: usize,
    protein_id: i64,
    #[serde(serialize_with = "fixed8")]
    score: f64,
}

/// Row of the `tinx_importance` table.
#[derive(Serialize, Debug)]
struct TinxImportance {
    id: usize,
    protein_id: i64,
    disease_id: usize,
    #[serde(serialize_with = "fixed8")]
    score: f64,
}

/// Row of the `tinx_articlerank` table.
#[derive(Serialize, Debug)]
struct TinxArticleRank {
    id: usize,
    importance_id: usize,
    pmid: Pmid,
    rank: usize,
}

/// Counts for one converted table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableStats {
    /// Number of data rows read.
    pub processed: usize,
    /// Number of table rows written.
    pub inserted: usize,
    /// Distinct keys whose rows were skipped.
    pub skipped: FxHashSet<String>,
}

impl TableStats {
    fn log(&self, table: &str) {
        tracing::info!(
            "... {} lines processed, inserted {} new {} rows",
            self.processed.separate_with_commas(),
            self.inserted.separate_with_commas(),
            table
        );
        if !self.skipped.is_empty() {
            tracing::warn!(
                "  skipped rows for {} unknown keys",
                self.skipped.len().separate_with_commas()
            );
        }
    }
}

/// Maps from keys of the score files to row identifiers of the written tables.
#[derive(Debug, Clone, Default)]
pub struct IdMaps {
    /// DOID to `tinx_disease.id`.
    pub disease: FxHashMap<String, usize>,
    /// `<DOID>|<protein id>` to `tinx_importance.id`.
    pub importance: FxHashMap<String, usize>,
}

fn importance_key(doid: &str, protein_id: i64) -> String {
    format!("{}|{}", doid, protein_id)
}

/// Iterate the data rows of a score CSV, deserialized by column position.
fn for_each_row<R, T, F>(inner: R, is_silent: bool, mut func: F) -> Result<usize, anyhow::Error>
where
    R: Read,
    T: DeserializeOwned,
    F: FnMut(T) -> Result<(), anyhow::Error>,
{
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(inner);
    let pb = line_progress(is_silent);
    let mut count = 0;
    for record in rdr.records() {
        let record = record?;
        let row: T = record
            .deserialize(None)
            .with_context(|| format!("problem with row {:?}", &record))?;
        func(row)?;
        count += 1;
        pb.inc(1);
    }
    pb.finish_and_clear();
    Ok(count)
}

/// Construct a TSV writer and write the header.
fn table_writer<W: Write>(inner: W, header: &[&str]) -> Result<csv::Writer<W>, anyhow::Error> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .from_writer(inner);
    writer.write_record(header)?;
    Ok(writer)
}

/// Convert `DiseaseNovelty.csv` into the `tinx_disease` table.
///
/// DOIDs missing from `ontology` are skipped with a warning, terms without a name are skipped
/// silently.
pub fn load_diseases<R, W>(
    inner: R,
    ontology: &DiseaseOntology,
    out: W,
    ids: &mut IdMaps,
    is_silent: bool,
) -> Result<TableStats, anyhow::Error>
where
    R: Read,
    W: Write,
{
    let mut stats = TableStats::default();
    let mut writer = table_writer(out, &["id", "doid", "name", "summary", "score"])?;
    stats.processed = for_each_row(inner, is_silent, |(doid, score): (String, f64)| {
        let Some(term) = ontology.get(&doid) else {
            tracing::warn!("{} not in Disease Ontology", doid);
            stats.skipped.insert(doid);
            return Ok(());
        };
        let Some(name) = term.name.as_deref() else {
            return Ok(());
        };
        let id = stats.inserted + 1;
        writer.serialize(TinxDisease {
            id,
            doid: &doid,
            name,
            summary: term.def.as_deref().unwrap_or_default(),
            score,
        })?;
        stats.inserted += 1;
        ids.disease.insert(doid, id);
        Ok(())
    })?;
    writer.flush()?;
    Ok(stats)
}

/// Convert `ProteinNovelty.csv` into the `tinx_novelty` table.
pub fn load_novelty<R, W>(inner: R, out: W, is_silent: bool) -> Result<TableStats, anyhow::Error>
where
    R: Read,
    W: Write,
{
    let mut stats = TableStats::default();
    let mut writer = table_writer(out, &["id", "protein_id", "score"])?;
    stats.processed = for_each_row(
        inner,
        is_silent,
        |(protein_id, _uniprot, score): (i64, String, f64)| {
            stats.inserted += 1;
            writer.serialize(TinxNovelty {
                id: stats.inserted,
                protein_id,
                score,
            })?;
            Ok(())
        },
    )?;
    writer.flush()?;
    Ok(stats)
}

/// Convert `Importance.csv` into the `tinx_importance` table.
///
/// Rows whose DOID has no `tinx_disease` row are skipped with an error message.
pub fn load_importance<R, W>(
    inner: R,
    out: W,
    ids: &mut IdMaps,
    is_silent: bool,
) -> Result<TableStats, anyhow::Error>
where
    R: Read,
    W: Write,
{
    let mut stats = TableStats::default();
    let mut writer = table_writer(out, &["id", "protein_id", "disease_id", "score"])?;
    stats.processed = for_each_row(
        inner,
        is_silent,
        |(doid, protein_id, _uniprot, score): (String, i64, String, f64)| {
            let Some(disease_id) = ids.disease.get(&doid).copied() else {
                tracing::error!("{} not in disease map", doid);
                stats.skipped.insert(doid);
                return Ok(());
            };
            let id = stats.inserted + 1;
            writer.serialize(TinxImportance {
                id,
                protein_id,
                disease_id,
                score,
            })?;
            stats.inserted += 1;
            ids.importance.insert(importance_key(&doid, protein_id), id);
            Ok(())
        },
    )?;
    writer.flush()?;
    Ok(stats)
}

/// Convert `PMIDRanking.csv` into the `tinx_articlerank` table.
///
/// Rows whose protein-disease pair has no `tinx_importance` row are skipped with a warning.
pub fn load_articlerank<R, W>(
    inner: R,
    out: W,
    ids: &IdMaps,
    is_silent: bool,
) -> Result<TableStats, anyhow::Error>
where
    R: Read,
    W: Write,
{
    let mut stats = TableStats::default();
    let mut writer = table_writer(out, &["id", "importance_id", "pmid", "rank"])?;
    stats.processed = for_each_row(
        inner,
        is_silent,
        |(doid, protein_id, _uniprot, pmid, rank): (String, i64, String, Pmid, usize)| {
            let key = importance_key(&doid, protein_id);
            let Some(importance_id) = ids.importance.get(&key).copied() else {
                if !stats.skipped.contains(&key) {
                    tracing::warn!("{} not in importance map", key);
                    stats.skipped.insert(key);
                }
                return Ok(());
            };
            stats.inserted += 1;
            writer.serialize(TinxArticleRank {
                id: stats.inserted,
                importance_id,
                pmid,
                rank,
            })?;
            Ok(())
        },
    )?;
    writer.flush()?;
    Ok(stats)
}

/// Main entry point for `load` sub command.
pub fn run(common: &crate::common::Args, args: &Args) -> Result<(), anyhow::Error> {
    tracing::info!(
        "Converting TIN-X scores to tables\ncommon args: {:#?}\nargs: {:#?}",
        common,
        args
    );
    let is_silent = common.is_silent();
    let in_path = |name: &str| args.path_input_dir.join(name);
    let out_path = |name: &str| args.path_output_dir.join(name);

    let ontology = DiseaseOntology::from_path(&args.path_disease_ontology)?;
    std::fs::create_dir_all(&args.path_output_dir)
        .with_context(|| format!("could not create {:?}", &args.path_output_dir))?;

    let mut ids = IdMaps::default();

    tracing::info!("Processing {} ...", DISEASE_NOVELTY_FILE);
    let stats = load_diseases(
        open_read_maybe_gz(in_path(DISEASE_NOVELTY_FILE))?,
        &ontology,
        open_write_maybe_gz(out_path(TINX_DISEASE_FILE))?,
        &mut ids,
        is_silent,
    )
    .with_context(|| format!("problem processing {}", DISEASE_NOVELTY_FILE))?;
    stats.log("tinx_disease");

    tracing::info!("Processing {} ...", PROTEIN_NOVELTY_FILE);
    let stats = load_novelty(
        open_read_maybe_gz(in_path(PROTEIN_NOVELTY_FILE))?,
        open_write_maybe_gz(out_path(TINX_NOVELTY_FILE))?,
        is_silent,
    )
    .with_context(|| format!("problem processing {}", PROTEIN_NOVELTY_FILE))?;
    stats.log("tinx_novelty");

    tracing::info!("Processing {} ...", IMPORTANCE_FILE);
    let stats = load_importance(
        open_read_maybe_gz(in_path(IMPORTANCE_FILE))?,
        open_write_maybe_gz(out_path(TINX_IMPORTANCE_FILE))?,
        &mut ids,
        is_silent,
    )
    .with_context(|| format!("problem processing {}", IMPORTANCE_FILE))?;
    stats.log("tinx_importance");

    tracing::info!("Processing {} ...", PMID_RANKING_FILE);
    let stats = load_articlerank(
        open_read_maybe_gz(in_path(PMID_RANKING_FILE))?,
        open_write_maybe_gz(out_path(TINX_ARTICLERANK_FILE))?,
        &ids,
        is_silent,
    )
    .with_context(|| format!("problem processing {}", PMID_RANKING_FILE))?;
    stats.log("tinx_articlerank");

    tracing::info!("Done converting TIN-X scores");
    Ok(())
}
