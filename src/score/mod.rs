//! Computation of TIN-X novelty and importance scores from text-mining mentions.

pub mod importance;
pub mod novelty;
pub mod output;

use std::io::Write;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::Context;
use clap::Parser;
use thousands::Separable;

use crate::common::io::std::{open_read_maybe_gz, open_write_maybe_gz};
use crate::common::trace_rss_now;
use crate::mentions::{
    extract_disease_mentions, extract_protein_mentions, Discard, ExtractOptions, MalformedPolicy,
    MentionIndex,
};
use crate::obo::DiseaseOntology;
use crate::proteins::ProteinTable;

/// Command line arguments for `score` sub command.
#[derive(Parser, Debug)]
#[command(about = "Compute TIN-X novelty and importance scores", long_about = None)]
pub struct Args {
    /// Path to the JensenLab protein text-mining mentions TSV.
    #[arg(long)]
    pub path_protein_mentions: PathBuf,
    /// Path to the JensenLab disease text-mining mentions TSV.
    #[arg(long)]
    pub path_disease_mentions: PathBuf,
    /// Path to the Disease Ontology OBO file.
    #[arg(long)]
    pub path_disease_ontology: PathBuf,
    /// Path to the protein table TSV with columns `id`, `uniprot`, and `stringid`.
    #[arg(long)]
    pub path_proteins: PathBuf,
    /// Path to the protein cross-reference TSV with columns `protein_id`, `xtype`, and `value`.
    #[arg(long)]
    pub path_xrefs: Option<PathBuf>,
    /// Directory to write the score CSV files to, created if missing.
    #[arg(long)]
    pub path_output_dir: PathBuf,

    /// How to handle malformed mention lines.
    #[arg(long, value_enum, default_value_t = MalformedPolicy::Fail)]
    pub on_malformed: MalformedPolicy,
    /// Optional path to a JSON lines file receiving discarded lines and identifiers.
    #[arg(long)]
    pub path_discards: Option<PathBuf>,

    /// For debug purposes, maximal number of lines to read from each mentions file.
    #[arg(long)]
    pub max_lines: Option<usize>,
}

/// Read both mentions files into a fresh `MentionIndex`.
fn build_index(
    common: &crate::common::Args,
    args: &Args,
    ontology: &DiseaseOntology,
    proteins: &ProteinTable,
) -> Result<MentionIndex, anyhow::Error> {
    let options = ExtractOptions {
        on_malformed: args.on_malformed,
        max_lines: args.max_lines,
        is_silent: common.is_silent(),
    };

    let mut discards = args
        .path_discards
        .as_ref()
        .map(open_write_maybe_gz)
        .transpose()?;
    let mut report = |discard: &Discard| -> Result<(), anyhow::Error> {
        if let Some(writer) = discards.as_mut() {
            serde_json::to_writer(&mut *writer, discard)?;
            writer.write_all(b"\n")?;
        }
        Ok(())
    };

    let mut index = MentionIndex::default();
    extract_protein_mentions(
        open_read_maybe_gz(&args.path_protein_mentions)?,
        proteins,
        &mut index,
        &options,
        &mut report,
    )
    .with_context(|| format!("problem reading {:?}", &args.path_protein_mentions))?;
    extract_disease_mentions(
        open_read_maybe_gz(&args.path_disease_mentions)?,
        ontology,
        &mut index,
        &options,
        &mut report,
    )
    .with_context(|| format!("problem reading {:?}", &args.path_disease_mentions))?;

    if let Some(writer) = discards.as_mut() {
        writer.flush()?;
    }

    Ok(index)
}

/// Compute all scores from `index` and write them to `args.path_output_dir`.
pub fn write_scores(index: &MentionIndex, args: &Args) -> Result<(), anyhow::Error> {
    let out_path = |name: &str| args.path_output_dir.join(name);

    tracing::info!("Computing protein novelty scores ...");
    let before = Instant::now();
    let scores = novelty::protein_novelty(index)?;
    let count = output::write_protein_novelty(
        open_write_maybe_gz(out_path(output::PROTEIN_NOVELTY_FILE))?,
        &scores,
    )?;
    tracing::info!(
        "... wrote {} protein novelty scores in {:?}",
        count.separate_with_commas(),
        before.elapsed()
    );

    tracing::info!("Computing disease novelty scores ...");
    let before = Instant::now();
    let scores = novelty::disease_novelty(index)?;
    let count = output::write_disease_novelty(
        open_write_maybe_gz(out_path(output::DISEASE_NOVELTY_FILE))?,
        &scores,
    )?;
    tracing::info!(
        "... wrote {} disease novelty scores in {:?}",
        count.separate_with_commas(),
        before.elapsed()
    );

    tracing::info!("Computing importance scores and PubMed rankings ...");
    let before = Instant::now();
    let pairs = importance::score_pairs(index)?;
    trace_rss_now();
    let count = output::write_importance(
        open_write_maybe_gz(out_path(output::IMPORTANCE_FILE))?,
        index,
        &pairs,
    )?;
    let ranked = output::write_pmid_ranking(
        open_write_maybe_gz(out_path(output::PMID_RANKING_FILE))?,
        index,
        &pairs,
    )?;
    tracing::info!(
        "... wrote {} importance scores and {} PubMed rankings in {:?}",
        count.separate_with_commas(),
        ranked.separate_with_commas(),
        before.elapsed()
    );

    Ok(())
}

/// Main entry point for `score` sub command.
pub fn run(common: &crate::common::Args, args: &Args) -> Result<(), anyhow::Error> {
    tracing::info!(
        "Computing TIN-X scores\ncommon args: {:#?}\nargs: {:#?}",
        common,
        args
    );

    let ontology = DiseaseOntology::from_path(&args.path_disease_ontology)?;
    let proteins = ProteinTable::from_paths(&args.path_proteins, args.path_xrefs.as_ref())?;

    std::fs::create_dir_all(&args.path_output_dir)
        .with_context(|| format!("could not create {:?}", &args.path_output_dir))?;

    let index = build_index(common, args, &ontology, &proteins)?;
    trace_rss_now();

    write_scores(&index, args)?;

    tracing::info!("Done computing TIN-X scores");
    Ok(())
}
