use chrono::{DateTime, Utc};
use serde::Serialize;
use toxicity_core::{ScoreTriple, SentimentLabel};
use tracing::{info, warn};

use crate::analyzer::TweetAnalyzer;
use crate::error::{AnalyzerError, AnalyzerResult};

const TWEET_COLUMN: &str = "tweet";

#[derive(Debug, Clone, Serialize)]
pub struct BatchRow {
    /// 1-based data row, header excluded
    pub row: usize,
    pub tweet: String,
    pub sentiment: SentimentLabel,
    pub confidence: f64,
    pub scores: ScoreTriple,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchFailure {
    pub row: usize,
    pub error: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LabelCounts {
    pub negative: usize,
    pub neutral: usize,
    pub positive: usize,
}

impl LabelCounts {
    fn record(&mut self, label: SentimentLabel) {
        match label {
            SentimentLabel::Negative => self.negative += 1,
            SentimentLabel::Neutral => self.neutral += 1,
            SentimentLabel::Positive => self.positive += 1,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchSummary {
    /// Rows that were analyzed successfully
    pub total: usize,
    pub failed: usize,
    pub label_counts: LabelCounts,
    pub toxic_count: usize,
    pub toxic_pct: f64,
    pub avg_confidence: f64,
}

impl BatchSummary {
    pub fn from_rows(rows: &[BatchRow], failed: usize) -> Self {
        let mut label_counts = LabelCounts::default();
        for row in rows {
            label_counts.record(row.sentiment);
        }

        let total = rows.len();
        let toxic_count = label_counts.negative;
        let (toxic_pct, avg_confidence) = if total == 0 {
            (0.0, 0.0)
        } else {
            let confidence_sum: f64 = rows.iter().map(|r| r.confidence).sum();
            (
                toxic_count as f64 / total as f64 * 100.0,
                confidence_sum / total as f64,
            )
        };

        Self {
            total,
            failed,
            label_counts,
            toxic_count,
            toxic_pct,
            avg_confidence,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub generated_at: DateTime<Utc>,
    pub summary: BatchSummary,
    pub rows: Vec<BatchRow>,
    pub failures: Vec<BatchFailure>,
}

/// Analyze every row of a CSV with a `tweet` column.
///
/// A malformed or failing row is recorded in `failures` and the batch goes on.
pub async fn analyze_csv(analyzer: &TweetAnalyzer, csv_data: &str) -> AnalyzerResult<BatchReport> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(csv_data.as_bytes());

    let column = reader
        .headers()?
        .iter()
        .position(|h| h == TWEET_COLUMN)
        .ok_or_else(|| AnalyzerError::MissingColumn(TWEET_COLUMN.to_string()))?;

    let mut rows = Vec::new();
    let mut failures = Vec::new();

    for (idx, result) in reader.records().enumerate() {
        let row = idx + 1;
        let tweet = match result {
            Ok(record) => record.get(column).unwrap_or("").to_string(),
            Err(e) => {
                warn!("Skipping unreadable CSV row {}: {}", row, e);
                failures.push(BatchFailure {
                    row,
                    error: e.to_string(),
                });
                continue;
            }
        };

        match analyzer.analyze(&tweet).await {
            Ok(result) => rows.push(BatchRow {
                row,
                tweet,
                sentiment: result.label,
                confidence: result.confidence,
                scores: result.scores,
            }),
            Err(e) => {
                warn!("Error processing row {}: {}", row, e);
                failures.push(BatchFailure {
                    row,
                    error: e.to_string(),
                });
            }
        }
    }

    let summary = BatchSummary::from_rows(&rows, failures.len());
    info!(
        "Batch analyzed: {} rows, {} toxic, {} failed",
        summary.total, summary.toxic_count, summary.failed
    );

    Ok(BatchReport {
        generated_at: Utc::now(),
        summary,
        rows,
        failures,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::BackendChain;
    use async_trait::async_trait;
    use calibration_engine::CalibrationEngine;
    use std::sync::Arc;
    use toxicity_core::{BackendKind, BackendResult, RawOutput, ScoreBackend};

    /// Negative for anything mentioning "idiot", positive otherwise.
    struct KeywordBackend;

    #[async_trait]
    impl ScoreBackend for KeywordBackend {
        async fn predict_raw(&self, text: &str) -> BackendResult<RawOutput> {
            let scores = if text.contains("idiot") {
                ScoreTriple::new(0.8, 0.1, 0.1)
            } else {
                ScoreTriple::new(0.1, 0.1, 0.8)
            };
            Ok(RawOutput::Probabilities(scores))
        }

        fn kind(&self) -> BackendKind {
            BackendKind::Lexical
        }
    }

    fn analyzer() -> TweetAnalyzer {
        TweetAnalyzer::new(
            BackendChain::single(Arc::new(KeywordBackend)),
            CalibrationEngine::default(),
        )
    }

    #[tokio::test]
    async fn test_batch_summary() {
        let csv = "id,tweet\n\
                   1,\"You're such an idiot, honestly\"\n\
                   2,Lovely morning\n\
                   3,   \n\
                   4,What an idiot\n";

        let report = analyze_csv(&analyzer(), csv).await.unwrap();

        assert_eq!(report.summary.total, 3);
        assert_eq!(report.summary.toxic_count, 2);
        assert_eq!(report.summary.label_counts.positive, 1);
        assert!((report.summary.toxic_pct - 200.0 / 3.0).abs() < 1e-9);
        assert!((report.summary.avg_confidence - 0.8).abs() < 1e-9);

        // the blank row is reported, not fatal
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].row, 3);
        assert_eq!(report.rows[0].tweet, "You're such an idiot, honestly");
    }

    #[tokio::test]
    async fn test_missing_tweet_column() {
        let err = analyze_csv(&analyzer(), "text\nhello\n").await.unwrap_err();
        assert!(matches!(err, AnalyzerError::MissingColumn(_)));
    }

    #[tokio::test]
    async fn test_short_rows_are_failures() {
        let csv = "id,tweet\n1\n2,fine day\n";
        let report = analyze_csv(&analyzer(), csv).await.unwrap();

        assert_eq!(report.summary.total, 1);
        assert_eq!(report.summary.failed, 1);
    }

    #[test]
    fn test_empty_summary_is_zeroed() {
        let summary = BatchSummary::from_rows(&[], 0);
        assert_eq!(summary.total, 0);
        assert_eq!(summary.toxic_pct, 0.0);
        assert_eq!(summary.avg_confidence, 0.0);
    }
}
