use std::collections::HashMap;
use uuid::Uuid;

const K1: f32 = 1.2;
const B: f32 = 0.75;

/// Lowercase alphanumeric words longer than one character.
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.chars().count() > 1)
        .map(str::to_lowercase)
        .collect()
}

/// Inverted index scored with Okapi BM25.
///
/// ```text
/// score(d, q) = sum over t in q of
///   idf(t) * tf * (k1 + 1) / (tf + k1 * (1 - b + b * |d| / avgdl))
/// idf(t) = ln((N - df + 0.5) / (df + 0.5) + 1)
/// ```
#[derive(Debug, Clone, Default)]
pub struct Bm25 {
    /// term -> doc -> term frequency
    postings: HashMap<String, HashMap<Uuid, f32>>,
    lengths: HashMap<Uuid, f32>,
    total_length: f32,
}

impl Bm25 {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index `text` under `id`, replacing any earlier text for that id.
    pub fn insert(&mut self, id: Uuid, text: &str) {
        self.remove(id);

        let tokens = tokenize(text);
        let mut frequencies: HashMap<String, f32> = HashMap::new();
        for token in tokens.iter() {
            *frequencies.entry(token.clone()).or_default() += 1.0;
        }
        for (term, tf) in frequencies {
            self.postings.entry(term).or_default().insert(id, tf);
        }

        let length = tokens.len() as f32;
        self.lengths.insert(id, length);
        self.total_length += length;
    }

    /// Returns whether `id` was indexed.
    pub fn remove(&mut self, id: Uuid) -> bool {
        let Some(length) = self.lengths.remove(&id) else {
            return false;
        };
        self.total_length -= length;
        self.postings.retain(|_, docs| {
            docs.remove(&id);
            !docs.is_empty()
        });
        true
    }

    pub fn len(&self) -> usize {
        self.lengths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lengths.is_empty()
    }

    /// Up to `top_k` `(id, score)` pairs with a positive score, best first.
    pub fn search(&self, query: &str, top_k: usize) -> Vec<(Uuid, f32)> {
        if self.is_empty() || top_k == 0 {
            return Vec::new();
        }

        let n = self.len() as f32;
        let avgdl = (self.total_length / n).max(1.0);
        let mut query_terms = tokenize(query);
        query_terms.sort();
        query_terms.dedup();

        let mut scores: HashMap<Uuid, f32> = HashMap::new();
        for term in query_terms.iter() {
            let Some(docs) = self.postings.get(term) else {
                continue;
            };
            let df = docs.len() as f32;
            let idf = ((n - df + 0.5) / (df + 0.5) + 1.0).ln();
            for (id, &tf) in docs {
                let dl = self.lengths.get(id).copied().unwrap_or_default();
                let norm = tf + K1 * (1.0 - B + B * dl / avgdl);
                *scores.entry(*id).or_default() += idf * tf * (K1 + 1.0) / norm;
            }
        }

        let mut ranked: Vec<(Uuid, f32)> = scores.into_iter().filter(|(_, s)| *s > 0.0).collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ranked.truncate(top_k);
        ranked
    }
}
