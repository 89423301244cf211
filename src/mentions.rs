//! Extraction of PubMed co-mentions from JensenLab text-mining files.
//!
//! Both the protein and the disease mentions files are line-based with two tab-separated
//! columns: the entity identifier and a space-separated list of PubMed IDs.
//!
//! ```text
//! ENSP00000000233	10022756 10082535 10189373
//! DOID:0001816	10048285 10073574
//! ```

use std::collections::BTreeSet;
use std::fmt::Display;
use std::io::BufRead;

use indexmap::IndexMap;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::Serialize;
use thousands::Separable;

use crate::common::line_progress;
use crate::error::Error;
use crate::obo::DiseaseOntology;
use crate::proteins::{ProteinLookup, ProteinRecord};

/// PubMed identifier.
pub type Pmid = u64;

/// Set of PubMed identifiers.
pub type PmidSet = FxHashSet<Pmid>;

/// Prefix of the lines to consider in the protein mentions file.
pub const PROTEIN_PREFIX: &str = "ENSP";

/// Prefix of the lines to consider in the disease mentions file.
pub const DISEASE_PREFIX: &str = "DOID:";

/// Key of a protein in the mention index.
///
/// Displayed as `<id>,<uniprot>`, the form used for the leading columns of the output files.
#[derive(Serialize, Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProteinKey {
    /// Internal protein identifier.
    pub id: i64,
    /// UniProt accession.
    pub uniprot: String,
}

impl From<&ProteinRecord> for ProteinKey {
    fn from(record: &ProteinRecord) -> Self {
        Self {
            id: record.id,
            uniprot: record.uniprot.clone(),
        }
    }
}

impl Display for ProteinKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{},{}", self.id, self.uniprot)
    }
}

/// Mentions of proteins and diseases in PubMed papers.
///
/// Every PMID of a mention set has a per-paper count on the same side.  This is maintained by
/// only allowing modification through `add_protein_mentions` and `add_disease_mentions`.
#[derive(Debug, Clone, Default)]
pub struct MentionIndex {
    /// Protein to PMIDs, in first-seen order.
    proteins: IndexMap<ProteinKey, PmidSet>,
    /// DOID to PMIDs, in first-seen order.
    diseases: IndexMap<String, PmidSet>,
    /// PMID to number of protein mentions.
    paper_protein_count: FxHashMap<Pmid, f64>,
    /// PMID to number of disease mentions.
    paper_disease_count: FxHashMap<Pmid, f64>,
}

impl MentionIndex {
    /// Record that `protein` is mentioned in `pmids`.
    ///
    /// Every PMID's protein count is incremented by one, also when the protein was already
    /// recorded for the paper.
    pub fn add_protein_mentions(&mut self, protein: ProteinKey, pmids: &PmidSet) {
        self.proteins.entry(protein).or_default().extend(pmids);
        for pmid in pmids {
            *self.paper_protein_count.entry(*pmid).or_default() += 1.0;
        }
    }

    /// Record that the disease `doid` is mentioned in `pmids`.
    pub fn add_disease_mentions(&mut self, doid: &str, pmids: &PmidSet) {
        if let Some(known) = self.diseases.get_mut(doid) {
            known.extend(pmids);
        } else {
            self.diseases.insert(doid.to_string(), pmids.clone());
        }
        for pmid in pmids {
            *self.paper_disease_count.entry(*pmid).or_default() += 1.0;
        }
    }

    /// Proteins with their PMIDs, in first-seen order.
    pub fn proteins(&self) -> &IndexMap<ProteinKey, PmidSet> {
        &self.proteins
    }

    /// Diseases with their PMIDs, in first-seen order.
    pub fn diseases(&self) -> &IndexMap<String, PmidSet> {
        &self.diseases
    }

    /// Number of protein mentions in the given paper.
    pub fn paper_protein_count(&self, pmid: Pmid) -> Result<f64, Error> {
        self.paper_protein_count
            .get(&pmid)
            .copied()
            .ok_or(Error::MissingPaperCount(pmid))
    }

    /// Number of disease mentions in the given paper.
    pub fn paper_disease_count(&self, pmid: Pmid) -> Result<f64, Error> {
        self.paper_disease_count
            .get(&pmid)
            .copied()
            .ok_or(Error::MissingPaperCount(pmid))
    }

    /// Number of papers with at least one protein mention.
    pub fn protein_paper_len(&self) -> usize {
        self.paper_protein_count.len()
    }

    /// Number of papers with at least one disease mention.
    pub fn disease_paper_len(&self) -> usize {
        self.paper_disease_count.len()
    }
}

/// What to do with lines that cannot be parsed.
#[derive(
    clap::ValueEnum,
    strum::Display,
    Serialize,
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum MalformedPolicy {
    /// Abort with an error.
    #[default]
    Fail,
    /// Skip the line, count it, and report it.
    Skip,
}

/// Options for mention extraction.
#[derive(Debug, Clone, Default)]
pub struct ExtractOptions {
    /// Handling of malformed lines.
    pub on_malformed: MalformedPolicy,
    /// For debug purposes, stop after this many lines.
    pub max_lines: Option<usize>,
    /// Hide progress display.
    pub is_silent: bool,
}

/// Reason for discarding a line or identifier.
#[derive(Serialize, strum::Display, Debug, Clone, Copy, PartialEq, Eq)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Reason {
    /// The line could not be parsed.
    Malformed,
    /// The identifier could not be resolved.
    NotFound,
}

/// Record of a discarded line or identifier, written to the discard report.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Discard {
    /// Input that the record comes from.
    pub source: String,
    /// Why it was discarded.
    pub reason: Reason,
    /// The identifier or offending line content.
    pub id: String,
    /// 1-based line number, if the discard concerns a single line.
    pub line_no: Option<usize>,
}

/// Counts collected while reading one mentions file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractionStats {
    /// Number of lines read.
    pub lines: usize,
    /// Lines not starting with the expected prefix.
    pub skipped: usize,
    /// Malformed lines skipped because of `MalformedPolicy::Skip`.
    pub malformed: usize,
    /// Identifiers that could not be resolved.
    pub not_found: BTreeSet<String>,
}

/// One parsed line of a mentions file.
#[derive(Debug, Clone, PartialEq)]
pub struct MentionLine<'a> {
    /// Entity identifier from the first column.
    pub id: &'a str,
    /// PubMed IDs from the second column.
    pub pmids: PmidSet,
}

/// Parse one line of a mentions file.
pub fn parse_mention_line(line: &str, line_no: usize) -> Result<MentionLine<'_>, Error> {
    let (id, pmids) = line
        .trim_end()
        .split_once('\t')
        .ok_or(Error::MissingColumn { line_no })?;
    let pmids = pmids
        .split_whitespace()
        .map(|token| {
            token.parse::<Pmid>().map_err(|_| Error::MalformedPmid {
                line_no,
                token: token.to_string(),
            })
        })
        .collect::<Result<PmidSet, _>>()?;
    Ok(MentionLine { id, pmids })
}

/// Read the protein mentions file into `index`.
///
/// Each line's Ensembl protein ID is resolved with `lookup`; the PMIDs are attributed to each
/// resolved protein.
pub fn extract_protein_mentions<R, L>(
    reader: R,
    lookup: &L,
    index: &mut MentionIndex,
    options: &ExtractOptions,
    report: &mut impl FnMut(&Discard) -> Result<(), anyhow::Error>,
) -> Result<ExtractionStats, anyhow::Error>
where
    R: BufRead,
    L: ProteinLookup + ?Sized,
{
    tracing::info!("Reading protein mentions ...");
    let stats = for_each_mention_line(
        reader,
        PROTEIN_PREFIX,
        "protein_mentions",
        options,
        report,
        |line| {
            let targets = lookup.resolve_ensp(line.id);
            for target in &targets {
                index.add_protein_mentions(ProteinKey::from(*target), &line.pmids);
            }
            !targets.is_empty()
        },
    )?;

    for ensp in &stats.not_found {
        tracing::warn!("No target found for {}", ensp);
    }
    tracing::info!(
        "... {} lines processed, skipped {} non-{} lines",
        stats.lines.separate_with_commas(),
        stats.skipped.separate_with_commas(),
        PROTEIN_PREFIX
    );
    tracing::info!(
        "  saved {} protein to PMIDs mappings and {} PMID to protein count mappings",
        index.proteins().len().separate_with_commas(),
        index.protein_paper_len().separate_with_commas()
    );
    log_problems(&stats, "ENSPs");

    Ok(stats)
}

/// Read the disease mentions file into `index`.
///
/// Diseases that are not part of `ontology` are reported and skipped.
pub fn extract_disease_mentions<R>(
    reader: R,
    ontology: &DiseaseOntology,
    index: &mut MentionIndex,
    options: &ExtractOptions,
    report: &mut impl FnMut(&Discard) -> Result<(), anyhow::Error>,
) -> Result<ExtractionStats, anyhow::Error>
where
    R: BufRead,
{
    tracing::info!("Reading disease mentions ...");
    let stats = for_each_mention_line(
        reader,
        DISEASE_PREFIX,
        "disease_mentions",
        options,
        report,
        |line| {
            if ontology.contains(line.id) {
                index.add_disease_mentions(line.id, &line.pmids);
                true
            } else {
                false
            }
        },
    )?;

    for doid in &stats.not_found {
        tracing::warn!("{} not found in Disease Ontology", doid);
    }
    tracing::info!(
        "... {} lines processed, skipped {} non-DOID lines",
        stats.lines.separate_with_commas(),
        stats.skipped.separate_with_commas(),
    );
    tracing::info!(
        "  saved {} DOID to PMIDs mappings and {} PMID to disease count mappings",
        index.diseases().len().separate_with_commas(),
        index.disease_paper_len().separate_with_commas()
    );
    log_problems(&stats, "DOIDs");

    Ok(stats)
}

fn log_problems(stats: &ExtractionStats, what: &str) {
    if !stats.not_found.is_empty() {
        tracing::warn!(
            "  no entry found for {} {}",
            stats.not_found.len().separate_with_commas(),
            what
        );
    }
    if stats.malformed > 0 {
        tracing::warn!(
            "  skipped {} malformed lines",
            stats.malformed.separate_with_commas()
        );
    }
}

/// Drive the line loop shared by both mentions files.
///
/// `handle` is called for each well-formed line with the expected prefix and returns whether
/// the identifier could be resolved.
fn for_each_mention_line<R>(
    reader: R,
    prefix: &str,
    source: &str,
    options: &ExtractOptions,
    report: &mut impl FnMut(&Discard) -> Result<(), anyhow::Error>,
    mut handle: impl FnMut(&MentionLine<'_>) -> bool,
) -> Result<ExtractionStats, anyhow::Error>
where
    R: BufRead,
{
    let mut stats = ExtractionStats::default();
    let pb = line_progress(options.is_silent);

    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let line_no = idx + 1;
        stats.lines += 1;
        pb.inc(1);

        if !line.starts_with(prefix) {
            stats.skipped += 1;
        } else {
            match parse_mention_line(&line, line_no) {
                Ok(mention) => {
                    if !handle(&mention) && !stats.not_found.contains(mention.id) {
                        stats.not_found.insert(mention.id.to_string());
                    }
                }
                Err(err) => match options.on_malformed {
                    MalformedPolicy::Fail => {
                        pb.finish_and_clear();
                        return Err(anyhow::Error::new(err).context(format!(
                            "malformed line in {} (use --on-malformed=skip to skip such lines)",
                            source
                        )));
                    }
                    MalformedPolicy::Skip => {
                        tracing::warn!("Skipping malformed line: {}", err);
                        stats.malformed += 1;
                        report(&Discard {
                            source: source.to_string(),
                            reason: Reason::Malformed,
                            id: line.clone(),
                            line_no: Some(line_no),
                        })?;
                    }
                },
            }
        }

        if let Some(max_lines) = options.max_lines {
            if stats.lines >= max_lines {
                tracing::warn!(
                    "Stopping after {} lines as requested by --max-lines",
                    stats.lines.separate_with_commas()
                );
                break;
            }
        }
    }
    pb.finish_and_clear();

    for id in &stats.not_found {
        report(&Discard {
            source: source.to_string(),
            reason: Reason::NotFound,
            id: id.clone(),
            line_no: None,
        })?;
    }

    Ok(stats)
}
