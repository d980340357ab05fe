use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::info;

use crate::error::BuildError;
use crate::schema::{CorpusStore, SampledPassage};

/// Uniform single-hop sampling: draw `n` distinct passages without
/// replacement; each one's retrieval ground truth is the singleton group
/// of its own id and text.
///
/// `n` is clamped to the corpus size. Without a seed each run may differ;
/// a seed makes the draw reproducible.
pub fn random_single_hop(
    corpus: &CorpusStore,
    n: usize,
    seed: Option<u64>,
) -> Result<Vec<SampledPassage>, BuildError> {
    if corpus.is_empty() {
        return Err(BuildError::EmptyCorpus);
    }

    let available = corpus.len();
    let amount = n.min(available);
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let passages: Vec<_> = corpus.iter().collect();
    let sampled = rand::seq::index::sample(&mut rng, available, amount)
        .into_iter()
        .map(|idx| {
            let passage = passages[idx];
            SampledPassage {
                passage_id: passage.id.clone(),
                retrieval_gt: vec![vec![passage.id.clone()]],
                retrieval_gt_contents: vec![passage.contents.clone()],
            }
        })
        .collect::<Vec<_>>();

    info!(
        requested = n,
        sampled = sampled.len(),
        corpus_size = available,
        seeded = seed.is_some(),
        "sampled passages for QA synthesis"
    );
    Ok(sampled)
}
