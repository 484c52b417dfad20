//! Synthetic payload generator used by index and query workers.

use crate::document::{TestDocument, CATEGORY, DOC_SIZE_MAX, DOC_SIZE_MIN, LAB_PHASE};
use crate::query::QueryShape;
use chrono::{SecondsFormat, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Title prefix used when none is configured.
pub const DEFAULT_TITLE_PREFIX: &str = "Concurrent Load Document";

const CONTENT_TEMPLATES: [&str; 3] = [
    "This is concurrent load testing content for document {id}. The system is under simultaneous read and write pressure to simulate production conditions.",
    "Document {id} contains performance testing data designed to stress both indexing and search operations running concurrently in realistic scenarios.",
    "Advanced concurrent testing document {id} with substantial content to evaluate system behavior under mixed read-write workloads and resource contention.",
];

/// Content body for a document, derived only from its identifier.
pub fn content_for(doc_id: u64) -> String {
    let template = CONTENT_TEMPLATES[(doc_id % CONTENT_TEMPLATES.len() as u64) as usize];
    template.replace("{id}", &doc_id.to_string())
}

/// Generator that produces batches of documents and query selections.
///
/// Each worker owns its own generator. Identifiers come from a monotonically
/// increasing counter starting at `first_id`, so two generators seeded into
/// disjoint ranges never emit the same identifier. Only `doc_size` and the
/// query selection consume randomness; everything else is a function of the
/// identifier and the batch number.
pub struct PayloadGenerator {
    /// Seeded random source for sizes and query selection
    rng: StdRng,
    /// Identifier assigned to the next generated document
    next_id: u64,
    /// Sequence number of the next batch
    batch_number: u64,
    title_prefix: String,
}

impl PayloadGenerator {
    /// Create a generator whose first document gets `first_id`.
    pub fn new(first_id: u64, seed: u64) -> Self {
        Self::with_rng(first_id, StdRng::seed_from_u64(seed))
    }

    /// Create a generator with an injected random source.
    pub fn with_rng(first_id: u64, rng: StdRng) -> Self {
        Self {
            rng,
            next_id: first_id,
            batch_number: 0,
            title_prefix: DEFAULT_TITLE_PREFIX.to_string(),
        }
    }

    /// Set the title prefix (the identifier is appended to it).
    pub fn with_title_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.title_prefix = prefix.into();
        self
    }

    /// Identifier the next document will receive.
    pub fn next_id(&self) -> u64 {
        self.next_id
    }

    /// Sequence number the next batch will carry.
    pub fn batch_number(&self) -> u64 {
        self.batch_number
    }

    /// Generate the next batch of `size` documents.
    ///
    /// All documents in a batch share the batch number and the timestamp.
    pub fn next_batch(&mut self, size: usize) -> Vec<TestDocument> {
        let timestamp = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
        let batch_number = self.batch_number;

        let docs = (0..size)
            .map(|_| {
                let doc_id = self.next_id;
                self.next_id += 1;
                TestDocument {
                    doc_id,
                    title: format!("{} {doc_id}", self.title_prefix),
                    content: content_for(doc_id),
                    category: CATEGORY.to_string(),
                    doc_size: self.rng.random_range(DOC_SIZE_MIN..DOC_SIZE_MAX),
                    batch_number,
                    timestamp: timestamp.clone(),
                    lab_phase: LAB_PHASE.to_string(),
                }
            })
            .collect();

        self.batch_number += 1;
        docs
    }

    /// Select the next query shape uniformly from the pool.
    pub fn next_query(&mut self) -> QueryShape {
        QueryShape::pick(&mut self.rng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifiers_are_monotonic_across_batches() {
        let mut generator = PayloadGenerator::new(20_000, 42);

        let first = generator.next_batch(3);
        let second = generator.next_batch(2);

        let ids: Vec<u64> = first.iter().chain(&second).map(|d| d.doc_id).collect();
        assert_eq!(ids, vec![20_000, 20_001, 20_002, 20_003, 20_004]);
        assert_eq!(generator.next_id(), 20_005);
    }

    #[test]
    fn test_batch_numbers_increment_per_batch() {
        let mut generator = PayloadGenerator::new(0, 1);

        let first = generator.next_batch(4);
        let second = generator.next_batch(4);

        assert!(first.iter().all(|d| d.batch_number == 0));
        assert!(second.iter().all(|d| d.batch_number == 1));
        assert_eq!(generator.batch_number(), 2);
    }

    #[test]
    fn test_same_seed_produces_same_sizes() {
        let mut a = PayloadGenerator::new(100, 99);
        let mut b = PayloadGenerator::new(100, 99);

        let sizes_a: Vec<u32> = a.next_batch(50).iter().map(|d| d.doc_size).collect();
        let sizes_b: Vec<u32> = b.next_batch(50).iter().map(|d| d.doc_size).collect();

        assert_eq!(sizes_a, sizes_b);
    }

    #[test]
    fn test_document_fields() {
        let mut generator =
            PayloadGenerator::new(25_000, 3).with_title_prefix("Solr Concurrent Load Document");
        let doc = generator.next_batch(1).remove(0);

        assert_eq!(doc.title, "Solr Concurrent Load Document 25000");
        assert_eq!(doc.category, "concurrent_load");
        assert_eq!(doc.lab_phase, "concurrent_readwrite");
        assert!((DOC_SIZE_MIN..DOC_SIZE_MAX).contains(&doc.doc_size));
        chrono::DateTime::parse_from_rfc3339(&doc.timestamp)
            .expect("Timestamp should be valid RFC3339");
    }

    #[test]
    fn test_content_rotates_through_templates() {
        // 20000 % 3 == 2
        assert!(content_for(20_000).starts_with("Advanced concurrent testing document 20000"));
        assert!(content_for(20_001).starts_with("This is concurrent load testing content for document 20001"));
        assert!(content_for(20_002).starts_with("Document 20002 contains"));
        assert_eq!(content_for(7), content_for(7));
    }

    #[test]
    fn test_zero_size_batch_still_advances_batch_number() {
        let mut generator = PayloadGenerator::new(10, 0);

        assert!(generator.next_batch(0).is_empty());
        assert_eq!(generator.next_id(), 10);
        assert_eq!(generator.batch_number(), 1);
    }
}
