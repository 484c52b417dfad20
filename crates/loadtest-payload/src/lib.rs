//! Payload generation for the search-loadtest concurrent load tester.
//!
//! This crate produces the synthetic documents and queries sent to the two
//! search backends, and renders them into each backend's wire format.
//!
//! # Architecture
//!
//! ```text
//! PayloadGenerator (seed, next_id, batch_number)
//!        │
//!        ├── next_batch(n) ──► Vec<TestDocument>
//!        │                        │
//!        │                        ├── elasticsearch::bulk_body  (NDJSON)
//!        │                        └── solr::update_body         (JSON array)
//!        │
//!        └── next_query() ───► QueryShape
//!                                 │
//!                                 ├── elasticsearch::search_body (JSON DSL)
//!                                 └── solr::select_params        (query string)
//! ```
//!
//! # Example
//!
//! ```rust
//! use loadtest_payload::{elasticsearch, PayloadGenerator};
//!
//! let mut generator = PayloadGenerator::new(20_000, 42);
//! let batch = generator.next_batch(10);
//! let body = elasticsearch::bulk_body(&batch).unwrap();
//! assert_eq!(body.iter().filter(|b| **b == b'\n').count(), 20);
//! ```

pub mod document;
pub mod elasticsearch;
pub mod error;
pub mod generator;
pub mod query;
pub mod solr;

pub use document::TestDocument;
pub use error::PayloadError;
pub use generator::PayloadGenerator;
pub use query::QueryShape;
