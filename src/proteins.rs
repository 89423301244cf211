//! Resolution of Ensembl protein identifiers to protein records.
//!
//! The protein table TSV has a header line and at least the columns `id`, `uniprot`, and
//! `stringid`; further columns are ignored.  The optional cross-reference TSV has the columns
//! `protein_id`, `xtype`, and `value`.

use std::path::Path;

use anyhow::Context;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use thousands::Separable;

use crate::common::io::std::open_read_maybe_gz;

/// Cross-reference type used for the Ensembl fallback lookup.
pub const XTYPE_ENSEMBL: &str = "Ensembl";

/// A protein as far as TIN-X is concerned.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProteinRecord {
    /// Internal protein identifier.
    pub id: i64,
    /// UniProt accession.
    pub uniprot: String,
}

/// Lookup of proteins by STRING identifier and by cross-reference.
pub trait ProteinLookup {
    /// Proteins whose STRING identifier is `stringid`.
    fn find_by_stringid(&self, stringid: &str) -> Vec<&ProteinRecord>;

    /// Proteins having a cross-reference of type `xtype` with the given `value`.
    fn find_by_xref(&self, xtype: &str, value: &str) -> Vec<&ProteinRecord>;

    /// Resolve an Ensembl protein identifier.
    ///
    /// The STRING identifier is tried first, the Ensembl cross-reference is only consulted if
    /// this yields nothing.
    fn resolve_ensp(&self, ensp: &str) -> Vec<&ProteinRecord> {
        let result = self.find_by_stringid(ensp);
        if result.is_empty() {
            self.find_by_xref(XTYPE_ENSEMBL, ensp)
        } else {
            result
        }
    }
}

/// Row of the protein table TSV.
#[derive(Deserialize, Debug)]
struct ProteinRow {
    id: i64,
    uniprot: String,
    stringid: Option<String>,
}

/// Row of the cross-reference TSV.
#[derive(Deserialize, Debug)]
struct XrefRow {
    protein_id: i64,
    xtype: String,
    value: String,
}

/// In-memory protein table with STRING ID and cross-reference indices.
#[derive(Debug, Clone, Default)]
pub struct ProteinTable {
    proteins: Vec<ProteinRecord>,
    by_id: FxHashMap<i64, Vec<usize>>,
    by_stringid: FxHashMap<String, Vec<usize>>,
    by_xref: FxHashMap<(String, String), Vec<usize>>,
}

impl ProteinTable {
    /// Load from the protein TSV and, optionally, the cross-reference TSV.
    pub fn from_paths<P, Q>(path_proteins: P, path_xrefs: Option<Q>) -> Result<Self, anyhow::Error>
    where
        P: AsRef<Path>,
        Q: AsRef<Path>,
    {
        tracing::info!("Loading proteins from {:?} ...", path_proteins.as_ref());
        let mut result = Self::default();

        let mut rdr = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .comment(Some(b'#'))
            .flexible(true)
            .from_reader(open_read_maybe_gz(path_proteins.as_ref())?);
        for row in rdr.deserialize() {
            let row: ProteinRow =
                row.with_context(|| format!("problem reading {:?}", path_proteins.as_ref()))?;
            result.insert(
                ProteinRecord {
                    id: row.id,
                    uniprot: row.uniprot,
                },
                row.stringid.filter(|s| !s.is_empty()),
            );
        }

        if let Some(path_xrefs) = path_xrefs {
            tracing::info!("Loading cross-references from {:?} ...", path_xrefs.as_ref());
            let mut rdr = csv::ReaderBuilder::new()
                .delimiter(b'\t')
                .comment(Some(b'#'))
                .flexible(true)
                .from_reader(open_read_maybe_gz(path_xrefs.as_ref())?);
            let mut unknown = 0usize;
            for row in rdr.deserialize() {
                let row: XrefRow =
                    row.with_context(|| format!("problem reading {:?}", path_xrefs.as_ref()))?;
                if !result.insert_xref(row.protein_id, row.xtype, row.value) {
                    unknown += 1;
                }
            }
            if unknown > 0 {
                tracing::warn!(
                    "{} cross-references point to unknown proteins",
                    unknown.separate_with_commas()
                );
            }
        }

        tracing::info!(
            "... loaded {} proteins ({} with STRING ID, {} cross-references)",
            result.proteins.len().separate_with_commas(),
            result.by_stringid.len().separate_with_commas(),
            result.by_xref.len().separate_with_commas()
        );
        Ok(result)
    }

    /// Register a protein with its optional STRING identifier.
    pub fn insert(&mut self, protein: ProteinRecord, stringid: Option<String>) {
        let idx = self.proteins.len();
        self.by_id.entry(protein.id).or_default().push(idx);
        self.proteins.push(protein);
        if let Some(stringid) = stringid {
            self.by_stringid.entry(stringid).or_default().push(idx);
        }
    }

    /// Register a cross-reference, returns `false` if the protein is unknown.
    pub fn insert_xref(&mut self, protein_id: i64, xtype: String, value: String) -> bool {
        let Some(idxs) = self.by_id.get(&protein_id) else {
            return false;
        };
        self.by_xref
            .entry((xtype, value))
            .or_default()
            .extend(idxs.iter().copied());
        true
    }

    /// Number of proteins.
    pub fn len(&self) -> usize {
        self.proteins.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.proteins.is_empty()
    }

    fn records(&self, idxs: Option<&Vec<usize>>) -> Vec<&ProteinRecord> {
        idxs.map(|idxs| idxs.iter().map(|idx| &self.proteins[*idx]).collect())
            .unwrap_or_default()
    }
}

impl ProteinLookup for ProteinTable {
    fn find_by_stringid(&self, stringid: &str) -> Vec<&ProteinRecord> {
        self.records(self.by_stringid.get(stringid))
    }

    fn find_by_xref(&self, xtype: &str, value: &str) -> Vec<&ProteinRecord> {
        self.records(self.by_xref.get(&(xtype.to_string(), value.to_string())))
    }
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use super::{ProteinLookup, ProteinRecord, ProteinTable};

    fn record(id: i64, uniprot: &str) -> ProteinRecord {
        ProteinRecord {
            id,
            uniprot: uniprot.to_string(),
        }
    }

    #[test]
    fn from_paths() -> Result<(), anyhow::Error> {
        let table = ProteinTable::from_paths(
            "tests/data/tinx/proteins.tsv",
            Some("tests/data/tinx/xrefs.tsv"),
        )?;

        assert_eq!(table.len(), 3);
        assert_eq!(table.find_by_stringid("ENSP000001"), vec![&record(1, "P1")]);
        assert_eq!(table.find_by_stringid("ENSP000002"), Vec::<&ProteinRecord>::new());
        assert_eq!(
            table.find_by_xref("Ensembl", "ENSP000002"),
            vec![&record(2, "P2")]
        );

        Ok(())
    }

    #[test]
    fn from_paths_without_xrefs() -> Result<(), anyhow::Error> {
        let table =
            ProteinTable::from_paths("tests/data/tinx/proteins.tsv", None::<&str>)?;

        assert_eq!(table.resolve_ensp("ENSP000002"), Vec::<&ProteinRecord>::new());

        Ok(())
    }

    #[rstest::rstest]
    #[case("ENSP000001", vec![1])]
    #[case("ENSP000002", vec![2])]
    #[case("ENSP000009", vec![])]
    fn resolve_ensp(#[case] ensp: &str, #[case] expected: Vec<i64>) {
        let mut table = ProteinTable::default();
        table.insert(record(1, "P1"), Some("ENSP000001".into()));
        table.insert(record(2, "P2"), None);
        assert!(table.insert_xref(2, "Ensembl".into(), "ENSP000002".into()));
        // the STRING ID wins over the cross-reference
        assert!(table.insert_xref(2, "Ensembl".into(), "ENSP000001".into()));

        let ids = table
            .resolve_ensp(ensp)
            .into_iter()
            .map(|p| p.id)
            .collect::<Vec<_>>();

        assert_eq!(ids, expected);
    }

    #[test]
    fn insert_xref_unknown_protein() {
        let mut table = ProteinTable::default();

        assert!(!table.insert_xref(42, "Ensembl".into(), "ENSP000042".into()));
    }
}
