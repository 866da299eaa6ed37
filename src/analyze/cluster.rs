// Author clustering - TF-IDF vectors over per-author documents, grouped
// with K-means.
//
// Each author's posts concatenate into one document. Vocabulary covers
// unigrams and bigrams of the normalized token stream, capped so a feed
// with a huge vocabulary doesn't blow up the vector width. K-means runs
// with a fixed-seed RNG so the same records always produce the same
// clusters.

use std::collections::{BTreeMap, HashMap};

use anyhow::Result;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use tracing::info;

use super::normalize::normalize;
use crate::store::Record;

/// Terms reported per cluster.
const TOP_TERMS: usize = 10;

/// Iteration cap - tiny author counts converge in a handful of rounds,
/// this is the runaway guard.
const MAX_ITERATIONS: usize = 100;

pub struct ClusterOptions {
    /// Desired cluster count; capped at the number of authors.
    pub n_clusters: usize,
    /// Vocabulary cap for the TF-IDF vectors.
    pub max_vocab: usize,
    /// RNG seed for centroid initialization.
    pub seed: u64,
}

impl Default for ClusterOptions {
    fn default() -> Self {
        Self {
            n_clusters: 5,
            max_vocab: 1000,
            seed: 42,
        }
    }
}

/// One K-means cluster: its member authors and the terms its centroid
/// weighs highest.
#[derive(Debug, Clone, Serialize)]
pub struct AuthorCluster {
    pub id: usize,
    pub authors: Vec<String>,
    pub top_terms: Vec<String>,
}

/// Cluster authors by what they post about.
///
/// Needs at least two authors with analyzable text - clustering one
/// document is meaningless.
pub fn cluster_authors(records: &[Record], opts: &ClusterOptions) -> Result<Vec<AuthorCluster>> {
    // One term document per author. BTreeMap keeps author order stable.
    let mut docs: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for record in records {
        let tokens = normalize(&record.text);
        let terms = docs.entry(record.author.clone()).or_default();
        // Bigrams stay within one record - posts don't run into each other.
        for pair in tokens.windows(2) {
            terms.push(format!("{} {}", pair[0], pair[1]));
        }
        terms.extend(tokens);
    }
    docs.retain(|_, terms| !terms.is_empty());

    if docs.len() < 2 {
        anyhow::bail!(
            "Need at least two authors with analyzable text to cluster - got {}",
            docs.len()
        );
    }

    let authors: Vec<String> = docs.keys().cloned().collect();
    let documents: Vec<&Vec<String>> = docs.values().collect();

    let vocab = build_vocabulary(&documents, opts.max_vocab);
    let vectors = tfidf_vectors(&documents, &vocab);

    let k = opts.n_clusters.min(authors.len());
    let assignments = kmeans(&vectors, k, opts.seed);

    info!(
        authors = authors.len(),
        clusters = k,
        vocab = vocab.len(),
        "clustered author documents"
    );

    // Recompute final centroids from the converged assignment for the
    // top-term summaries.
    let centroids = centroids_for(&vectors, &assignments, k);

    let mut clusters: Vec<AuthorCluster> = (0..k)
        .map(|id| AuthorCluster {
            id,
            authors: Vec::new(),
            top_terms: top_terms(&centroids[id], &vocab),
        })
        .collect();
    for (doc_idx, &cluster_id) in assignments.iter().enumerate() {
        clusters[cluster_id].authors.push(authors[doc_idx].clone());
    }

    Ok(clusters)
}

/// Pick the vocabulary: all terms ranked by corpus frequency (ties
/// lexicographic), capped.
fn build_vocabulary(documents: &[&Vec<String>], max_vocab: usize) -> Vec<String> {
    let mut totals: HashMap<&str, u64> = HashMap::new();
    for doc in documents {
        for term in doc.iter() {
            *totals.entry(term.as_str()).or_default() += 1;
        }
    }

    let mut ranked: Vec<(&str, u64)> = totals.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    ranked.truncate(max_vocab);
    ranked.into_iter().map(|(term, _)| term.to_string()).collect()
}

/// Dense TF-IDF vectors, L2-normalized so distance reflects direction
/// rather than document length.
fn tfidf_vectors(documents: &[&Vec<String>], vocab: &[String]) -> Vec<Vec<f64>> {
    let index: HashMap<&str, usize> = vocab
        .iter()
        .enumerate()
        .map(|(i, term)| (term.as_str(), i))
        .collect();

    // Document frequency per vocab term
    let mut df = vec![0u64; vocab.len()];
    let mut doc_counts: Vec<HashMap<usize, u64>> = Vec::with_capacity(documents.len());
    for doc in documents {
        let mut counts: HashMap<usize, u64> = HashMap::new();
        for term in doc.iter() {
            if let Some(&i) = index.get(term.as_str()) {
                *counts.entry(i).or_default() += 1;
            }
        }
        for &i in counts.keys() {
            df[i] += 1;
        }
        doc_counts.push(counts);
    }

    let n_docs = documents.len() as f64;
    doc_counts
        .iter()
        .zip(documents)
        .map(|(counts, doc)| {
            let doc_len = doc.len().max(1) as f64;
            let mut vector = vec![0.0; vocab.len()];
            for (&i, &count) in counts {
                let tf = count as f64 / doc_len;
                let idf = (n_docs / (1.0 + df[i] as f64)).ln() + 1.0;
                vector[i] = tf * idf;
            }
            let norm = vector.iter().map(|v| v * v).sum::<f64>().sqrt();
            if norm > 0.0 {
                for v in &mut vector {
                    *v /= norm;
                }
            }
            vector
        })
        .collect()
}

/// Lloyd's algorithm with fixed-seed initialization: pick k distinct
/// documents as starting centroids, iterate assign/recompute until the
/// assignment stops moving.
fn kmeans(vectors: &[Vec<f64>], k: usize, seed: u64) -> Vec<usize> {
    let mut rng = StdRng::seed_from_u64(seed);
    let chosen = rand::seq::index::sample(&mut rng, vectors.len(), k);
    let mut centroids: Vec<Vec<f64>> = chosen.iter().map(|i| vectors[i].clone()).collect();

    let mut assignments = vec![0usize; vectors.len()];
    for _ in 0..MAX_ITERATIONS {
        let next: Vec<usize> = vectors
            .iter()
            .map(|v| nearest_centroid(v, &centroids))
            .collect();

        let converged = next == assignments;
        assignments = next;
        if converged {
            break;
        }

        let recomputed = centroids_for(vectors, &assignments, k);
        for (id, centroid) in recomputed.into_iter().enumerate() {
            // An emptied cluster keeps its old centroid rather than
            // collapsing to the origin.
            if centroid.iter().any(|&v| v != 0.0) {
                centroids[id] = centroid;
            }
        }
    }

    assignments
}

fn nearest_centroid(vector: &[f64], centroids: &[Vec<f64>]) -> usize {
    let mut best = 0;
    let mut best_dist = f64::MAX;
    for (id, centroid) in centroids.iter().enumerate() {
        let dist: f64 = vector
            .iter()
            .zip(centroid)
            .map(|(a, b)| (a - b) * (a - b))
            .sum();
        if dist < best_dist {
            best_dist = dist;
            best = id;
        }
    }
    best
}

/// Mean vector per cluster. Empty clusters come back as all-zero.
fn centroids_for(vectors: &[Vec<f64>], assignments: &[usize], k: usize) -> Vec<Vec<f64>> {
    let width = vectors.first().map(|v| v.len()).unwrap_or(0);
    let mut sums = vec![vec![0.0; width]; k];
    let mut sizes = vec![0usize; k];

    for (vector, &cluster) in vectors.iter().zip(assignments) {
        sizes[cluster] += 1;
        for (slot, value) in sums[cluster].iter_mut().zip(vector) {
            *slot += value;
        }
    }

    for (sum, &size) in sums.iter_mut().zip(&sizes) {
        if size > 0 {
            for slot in sum.iter_mut() {
                *slot /= size as f64;
            }
        }
    }
    sums
}

/// The centroid's heaviest terms, weight descending then term ascending.
fn top_terms(centroid: &[f64], vocab: &[String]) -> Vec<String> {
    let mut weighted: Vec<(usize, f64)> = centroid
        .iter()
        .copied()
        .enumerate()
        .filter(|(_, w)| *w > 0.0)
        .collect();
    weighted.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| vocab[a.0].cmp(&vocab[b.0]))
    });
    weighted
        .into_iter()
        .take(TOP_TERMS)
        .map(|(i, _)| vocab[i].clone())
        .collect()
}
