//! Importance scores and article ranking for protein-disease pairs.
//!
//! Each paper is assigned a fractional disease-target score of one divided by the product of
//! the number of proteins and the number of diseases mentioned in it.  The importance of a
//! protein-disease pair is the sum of these scores over all papers mentioning both.
//!
//! Papers of a pair are ranked by the product of their protein and disease mention counts,
//! ascending, so focused papers come first.  Ties are broken by descending PMID, assuming that
//! larger PMIDs are newer.
//!
//! Pairs are found through an inverted PMID to proteins index, so the work is proportional to
//! the number of co-mentions rather than to the number of protein-disease combinations.

use std::cmp::Ordering;

use rayon::prelude::*;
use rustc_hash::FxHashMap;

use crate::error::Error;
use crate::mentions::{MentionIndex, Pmid};

/// A paper with its ranking score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankedPaper {
    /// PubMed ID.
    pub pmid: Pmid,
    /// Product of the protein and disease mention counts of the paper.
    pub score: f64,
}

/// Importance and paper ranking of one protein-disease pair.
#[derive(Debug, Clone, PartialEq)]
pub struct PairScore {
    /// Position of the protein in `MentionIndex::proteins()`.
    pub protein_idx: usize,
    /// Position of the disease in `MentionIndex::diseases()`.
    pub disease_idx: usize,
    /// Sum of fractional disease-target scores of the shared papers.
    pub importance: f64,
    /// Shared papers, index in this `Vec` is the rank.
    pub papers: Vec<RankedPaper>,
}

/// Order papers by ascending score, then descending PMID.
pub fn cmp_ranked(lhs: &RankedPaper, rhs: &RankedPaper) -> Ordering {
    lhs.score
        .total_cmp(&rhs.score)
        .then_with(|| rhs.pmid.cmp(&lhs.pmid))
}

/// Collect the shared PMIDs of all protein-disease pairs with at least one shared paper.
///
/// The result is sorted by protein and then disease position.
pub fn shared_pmids(index: &MentionIndex) -> Vec<((usize, usize), Vec<Pmid>)> {
    let mut pmid_to_proteins: FxHashMap<Pmid, Vec<usize>> = FxHashMap::default();
    for (protein_idx, pmids) in index.proteins().values().enumerate() {
        for pmid in pmids {
            pmid_to_proteins.entry(*pmid).or_default().push(protein_idx);
        }
    }

    let mut pairs: FxHashMap<(usize, usize), Vec<Pmid>> = FxHashMap::default();
    for (disease_idx, pmids) in index.diseases().values().enumerate() {
        for pmid in pmids {
            if let Some(protein_idxs) = pmid_to_proteins.get(pmid) {
                for protein_idx in protein_idxs {
                    pairs
                        .entry((*protein_idx, disease_idx))
                        .or_default()
                        .push(*pmid);
                }
            }
        }
    }

    let mut pairs = pairs.into_iter().collect::<Vec<_>>();
    pairs.par_sort_unstable_by_key(|(key, _)| *key);
    pairs
}

/// Compute importance and ranking for one pair from its shared PMIDs.
pub fn score_pair(
    index: &MentionIndex,
    protein_idx: usize,
    disease_idx: usize,
    pmids: &[Pmid],
) -> Result<PairScore, Error> {
    let mut papers = pmids
        .iter()
        .map(|pmid| {
            Ok(RankedPaper {
                pmid: *pmid,
                score: index.paper_protein_count(*pmid)? * index.paper_disease_count(*pmid)?,
            })
        })
        .collect::<Result<Vec<_>, Error>>()?;
    papers.sort_by(cmp_ranked);

    let importance = papers.iter().map(|paper| 1.0 / paper.score).sum();

    Ok(PairScore {
        protein_idx,
        disease_idx,
        importance,
        papers,
    })
}

/// Score all protein-disease pairs with shared papers.
///
/// Pairs without shared papers do not appear in the result.  The result is sorted by protein
/// and then disease position.
pub fn score_pairs(index: &MentionIndex) -> Result<Vec<PairScore>, Error> {
    shared_pmids(index)
        .par_iter()
        .map(|((protein_idx, disease_idx), pmids)| {
            score_pair(index, *protein_idx, *disease_idx, pmids)
        })
        .collect()
}
