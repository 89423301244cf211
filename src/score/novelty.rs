//! Novelty scores for proteins and diseases.
//!
//! Each paper is assigned a fractional score of one divided by the number of entities (of the
//! same kind) mentioned in it.  The novelty of an entity is one divided by the sum of the
//! fractional scores of all papers mentioning it.

use std::hash::Hash;

use indexmap::IndexMap;
use rayon::prelude::*;

use crate::error::Error;
use crate::mentions::{MentionIndex, Pmid, PmidSet, ProteinKey};

/// Novelty of one entity with the given mentions.
///
/// `paper_count` yields the number of mentions of entities of the same kind in a paper.
pub fn novelty<F>(key: &dyn std::fmt::Display, pmids: &PmidSet, paper_count: F) -> Result<f64, Error>
where
    F: Fn(Pmid) -> Result<f64, Error>,
{
    if pmids.is_empty() {
        return Err(Error::EmptyMentions(key.to_string()));
    }
    let mut ft_score_sum = 0.0;
    for pmid in pmids {
        ft_score_sum += 1.0 / paper_count(*pmid)?;
    }
    Ok(1.0 / ft_score_sum)
}

/// Compute novelty for each key of `mentions`, in the order of `mentions`.
fn novelties<'a, K, F>(
    mentions: &'a IndexMap<K, PmidSet>,
    paper_count: F,
) -> Result<Vec<(&'a K, f64)>, Error>
where
    K: std::fmt::Display + Hash + Eq + Sync,
    F: Fn(Pmid) -> Result<f64, Error> + Sync,
{
    mentions
        .par_iter()
        .map(|(key, pmids)| Ok((key, novelty(key, pmids, &paper_count)?)))
        .collect()
}

/// Novelty scores of all proteins in `index`.
pub fn protein_novelty(index: &MentionIndex) -> Result<Vec<(&ProteinKey, f64)>, Error> {
    novelties(index.proteins(), |pmid| index.paper_protein_count(pmid))
}

/// Novelty scores of all diseases in `index`.
pub fn disease_novelty(index: &MentionIndex) -> Result<Vec<(&String, f64)>, Error> {
    novelties(index.diseases(), |pmid| index.paper_disease_count(pmid))
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use super::*;

    fn pmids(values: &[Pmid]) -> PmidSet {
        values.iter().copied().collect()
    }

    fn key(id: i64) -> ProteinKey {
        ProteinKey {
            id,
            uniprot: format!("P{}", id),
        }
    }

    #[test]
    fn novelty_equals_paper_count_for_single_entity_papers() -> Result<(), anyhow::Error> {
        let value = novelty(&"x", &pmids(&[1, 2, 3, 4]), |_| Ok(1.0))?;

        assert_eq!(value, 4.0);

        Ok(())
    }

    #[rstest::rstest]
    #[case(&[(1, 1.0), (2, 2.0)], 1.0 / 1.5)]
    #[case(&[(1, 2.0), (2, 2.0)], 1.0)]
    #[case(&[(7, 4.0)], 4.0)]
    fn novelty_formula(#[case] counts: &[(Pmid, f64)], #[case] expected: f64) {
        let set = counts.iter().map(|(pmid, _)| *pmid).collect::<PmidSet>();
        let value = novelty(&"x", &set, |pmid| {
            Ok(counts
                .iter()
                .find(|(p, _)| *p == pmid)
                .map(|(_, c)| *c)
                .expect("count must exist"))
        })
        .expect("must compute");

        assert!((value - expected).abs() < 1e-12);
        assert!(value.is_finite() && value > 0.0);
    }

    #[test]
    fn novelty_empty_mentions() {
        let res = novelty(&"DOID:4", &PmidSet::default(), |_| Ok(1.0));

        assert_eq!(res, Err(Error::EmptyMentions("DOID:4".into())));
    }

    #[test]
    fn protein_and_disease_novelty() -> Result<(), anyhow::Error> {
        let mut index = MentionIndex::default();
        index.add_protein_mentions(key(1), &pmids(&[100, 101]));
        index.add_protein_mentions(key(2), &pmids(&[101]));
        index.add_disease_mentions("DOID:50", &pmids(&[101, 102]));

        let proteins = protein_novelty(&index)?
            .into_iter()
            .map(|(k, v)| (k.id, v))
            .collect::<Vec<_>>();
        assert_eq!(proteins, vec![(1, 1.0 / 1.5), (2, 2.0)]);

        let diseases = disease_novelty(&index)?;
        assert_eq!(diseases, vec![(&"DOID:50".to_string(), 0.5)]);

        Ok(())
    }
}
