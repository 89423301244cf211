//! Writing of the TIN-X score CSV files.
//!
//! The files are re-read by column position when loading, so the column order and the
//! 8-decimal formatting of scores must not change.

use std::io::Write;

use serde::Serialize;

use crate::mentions::{MentionIndex, Pmid, ProteinKey};
use crate::score::importance::PairScore;

/// File name of the protein novelty CSV.
pub const PROTEIN_NOVELTY_FILE: &str = "ProteinNovelty.csv";
/// File name of the disease novelty CSV.
pub const DISEASE_NOVELTY_FILE: &str = "DiseaseNovelty.csv";
/// File name of the importance CSV.
pub const IMPORTANCE_FILE: &str = "Importance.csv";
/// File name of the PubMed ranking CSV.
pub const PMID_RANKING_FILE: &str = "PMIDRanking.csv";

pub const PROTEIN_NOVELTY_HEADER: &[&str] = &["Protein ID", "UniProt", "Novelty"];
pub const DISEASE_NOVELTY_HEADER: &[&str] = &["DOID", "Novelty"];
pub const IMPORTANCE_HEADER: &[&str] = &["DOID", "Protein ID", "UniProt", "Score"];
pub const PMID_RANKING_HEADER: &[&str] = &["DOID", "Protein ID", "UniProt", "PubMed ID", "Rank"];

/// Serialize a score with exactly 8 decimal places.
pub fn fixed8<S>(value: &f64, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.collect_str(&format_args!("{:.8}", value))
}

#[derive(Serialize, Debug)]
struct ProteinNoveltyRecord<'a> {
    protein_id: i64,
    uniprot: &'a str,
    #[serde(serialize_with = "fixed8")]
    novelty: f64,
}

#[derive(Serialize, Debug)]
struct DiseaseNoveltyRecord<'a> {
    doid: &'a str,
    #[serde(serialize_with = "fixed8")]
    novelty: f64,
}

#[derive(Serialize, Debug)]
struct ImportanceRecord<'a> {
    doid: &'a str,
    protein_id: i64,
    uniprot: &'a str,
    #[serde(serialize_with = "fixed8")]
    score: f64,
}

#[derive(Serialize, Debug)]
struct PmidRankingRecord<'a> {
    doid: &'a str,
    protein_id: i64,
    uniprot: &'a str,
    pmid: Pmid,
    rank: usize,
}

/// Construct a CSV writer that leaves the header to the caller.
fn csv_writer<W: Write>(inner: W) -> csv::Writer<W> {
    csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(inner)
}

/// Write protein novelty scores, returns the number of rows written.
pub fn write_protein_novelty<W: Write>(
    inner: W,
    scores: &[(&ProteinKey, f64)],
) -> Result<usize, anyhow::Error> {
    let mut writer = csv_writer(inner);
    writer.write_record(PROTEIN_NOVELTY_HEADER)?;
    for (key, novelty) in scores {
        writer.serialize(ProteinNoveltyRecord {
            protein_id: key.id,
            uniprot: &key.uniprot,
            novelty: *novelty,
        })?;
    }
    writer.flush()?;
    Ok(scores.len())
}

/// Write disease novelty scores, returns the number of rows written.
pub fn write_disease_novelty<W: Write>(
    inner: W,
    scores: &[(&String, f64)],
) -> Result<usize, anyhow::Error> {
    let mut writer = csv_writer(inner);
    writer.write_record(DISEASE_NOVELTY_HEADER)?;
    for (doid, novelty) in scores {
        writer.serialize(DiseaseNoveltyRecord {
            doid,
            novelty: *novelty,
        })?;
    }
    writer.flush()?;
    Ok(scores.len())
}

/// Resolve the protein and disease of a pair.
fn pair_keys<'a>(
    index: &'a MentionIndex,
    pair: &PairScore,
) -> Result<(&'a ProteinKey, &'a str), anyhow::Error> {
    let (protein, _) = index
        .proteins()
        .get_index(pair.protein_idx)
        .ok_or_else(|| anyhow::anyhow!("invalid protein index {}", pair.protein_idx))?;
    let (doid, _) = index
        .diseases()
        .get_index(pair.disease_idx)
        .ok_or_else(|| anyhow::anyhow!("invalid disease index {}", pair.disease_idx))?;
    Ok((protein, doid.as_str()))
}

/// Write importance scores, returns the number of rows written.
pub fn write_importance<W: Write>(
    inner: W,
    index: &MentionIndex,
    pairs: &[PairScore],
) -> Result<usize, anyhow::Error> {
    let mut writer = csv_writer(inner);
    writer.write_record(IMPORTANCE_HEADER)?;
    for pair in pairs {
        let (protein, doid) = pair_keys(index, pair)?;
        writer.serialize(ImportanceRecord {
            doid,
            protein_id: protein.id,
            uniprot: &protein.uniprot,
            score: pair.importance,
        })?;
    }
    writer.flush()?;
    Ok(pairs.len())
}

/// Write the PubMed ranking of each pair, returns the number of rows written.
pub fn write_pmid_ranking<W: Write>(
    inner: W,
    index: &MentionIndex,
    pairs: &[PairScore],
) -> Result<usize, anyhow::Error> {
    let mut writer = csv_writer(inner);
    writer.write_record(PMID_RANKING_HEADER)?;
    let mut count = 0;
    for pair in pairs {
        let (protein, doid) = pair_keys(index, pair)?;
        for (rank, paper) in pair.papers.iter().enumerate() {
            writer.serialize(PmidRankingRecord {
                doid,
                protein_id: protein.id,
                uniprot: &protein.uniprot,
                pmid: paper.pmid,
                rank,
            })?;
            count += 1;
        }
    }
    writer.flush()?;
    Ok(count)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::mentions::PmidSet;
    use crate::score::{importance, novelty};

    fn pmids(values: &[Pmid]) -> PmidSet {
        values.iter().copied().collect()
    }

    /// The worked example: one protein, one disease sharing paper 101.
    fn example_index() -> MentionIndex {
        let mut index = MentionIndex::default();
        index.add_protein_mentions(
            ProteinKey {
                id: 1,
                uniprot: "P1".into(),
            },
            &pmids(&[100, 101]),
        );
        index.add_disease_mentions("DOID:50", &pmids(&[101, 102]));
        index
    }

    #[test]
    fn write_novelty_example() -> Result<(), anyhow::Error> {
        let index = example_index();

        let mut buf = Vec::new();
        let count = write_protein_novelty(&mut buf, &novelty::protein_novelty(&index)?)?;
        assert_eq!(count, 1);
        insta::assert_snapshot!(String::from_utf8(buf)?, @r"
        Protein ID,UniProt,Novelty
        1,P1,0.50000000
        ");

        let mut buf = Vec::new();
        write_disease_novelty(&mut buf, &novelty::disease_novelty(&index)?)?;
        insta::assert_snapshot!(String::from_utf8(buf)?, @r"
        DOID,Novelty
        DOID:50,0.50000000
        ");

        Ok(())
    }

    #[test]
    fn write_importance_and_ranking_example() -> Result<(), anyhow::Error> {
        let index = example_index();
        let pairs = importance::score_pairs(&index)?;

        let mut buf = Vec::new();
        write_importance(&mut buf, &index, &pairs)?;
        insta::assert_snapshot!(String::from_utf8(buf)?, @r"
        DOID,Protein ID,UniProt,Score
        DOID:50,1,P1,1.00000000
        ");

        let mut buf = Vec::new();
        let count = write_pmid_ranking(&mut buf, &index, &pairs)?;
        assert_eq!(count, 1);
        insta::assert_snapshot!(String::from_utf8(buf)?, @r"
        DOID,Protein ID,UniProt,PubMed ID,Rank
        DOID:50,1,P1,101,0
        ");

        Ok(())
    }

    #[test]
    fn header_written_without_rows() -> Result<(), anyhow::Error> {
        let mut buf = Vec::new();
        write_importance(&mut buf, &MentionIndex::default(), &[])?;

        assert_eq!(String::from_utf8(buf)?, "DOID,Protein ID,UniProt,Score\n");

        Ok(())
    }

    #[rstest::rstest]
    #[case(2.0 / 3.0, "0.66666667")]
    #[case(1.0, "1.00000000")]
    #[case(1234.5, "1234.50000000")]
    fn fixed8_formatting(#[case] value: f64, #[case] expected: &str) -> Result<(), anyhow::Error> {
        let mut writer = csv_writer(Vec::new());
        writer.serialize(DiseaseNoveltyRecord {
            doid: "DOID:4",
            novelty: value,
        })?;
        let buf = writer.into_inner().map_err(|e| anyhow::anyhow!("{}", e))?;

        assert_eq!(String::from_utf8(buf)?, format!("DOID:4,{}\n", expected));

        Ok(())
    }
}
