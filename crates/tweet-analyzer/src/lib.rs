//! Tweet Analyzer
//!
//! Runs a tweet through the backend chain and the calibration engine, with a
//! single fallback attempt when the primary backend fails. Also hosts batch
//! CSV analysis and the guided sample tweets.

pub mod analyzer;
pub mod batch;
pub mod chain;
pub mod error;
pub mod samples;

pub use analyzer::TweetAnalyzer;
pub use batch::{analyze_csv, BatchFailure, BatchReport, BatchRow, BatchSummary, LabelCounts};
pub use chain::BackendChain;
pub use error::{AnalyzerError, AnalyzerResult};
pub use samples::{SampleTweet, SAMPLE_TWEETS};
