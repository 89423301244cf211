use criterion::{criterion_group, criterion_main, Criterion};
use tinx::mentions::{MentionIndex, PmidSet, ProteinKey};
use tinx::score::{importance, novelty};

/// Synthetic index where each paper mentions a handful of proteins and diseases.
fn synthetic_index(n_proteins: u64, n_diseases: u64, n_papers: u64) -> MentionIndex {
    let mut index = MentionIndex::default();
    for p in 0..n_proteins {
        let pmids = (0..n_papers)
            .filter(|pmid| (pmid * 7 + p) % 13 == 0)
            .collect::<PmidSet>();
        if !pmids.is_empty() {
            let key = ProteinKey {
                id: p as i64,
                uniprot: format!("P{:05}", p),
            };
            index.add_protein_mentions(key, &pmids);
        }
    }
    for d in 0..n_diseases {
        let pmids = (0..n_papers)
            .filter(|pmid| (pmid * 3 + d) % 17 == 0)
            .collect::<PmidSet>();
        if !pmids.is_empty() {
            index.add_disease_mentions(&format!("DOID:{}", d), &pmids);
        }
    }
    index
}

fn scoring(c: &mut Criterion) {
    let index = synthetic_index(2_000, 500, 20_000);

    c.bench_function("novelty::protein_novelty", |b| {
        b.iter(|| novelty::protein_novelty(&index).unwrap())
    });
    c.bench_function("importance::score_pairs", |b| {
        b.iter(|| importance::score_pairs(&index).unwrap())
    });
}

criterion_group!(benches, scoring);
criterion_main!(benches);
