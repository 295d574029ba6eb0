use crate::classifier::Classifier;
use crate::config::AppConfig;
use crate::model::{AppError, ConfigError, InputError, LookupOutcome, Record, RunSummary};
use crate::normalizer::Normalizer;
use crate::search::ImageSearch;
use crate::storage::JsonlSink;

use std::io::Write;
use std::time::Duration;
use tokio::time::sleep;
use tracing::info;

/// Sequential enrichment: one record is looked up, written and flushed
/// before the next one is read. No lookups run concurrently.
pub struct Pipeline<S> {
    normalizer: Normalizer,
    classifier: Classifier,
    search: S,
    pause: Duration,
}

impl<S: ImageSearch> Pipeline<S> {
    pub fn new(
        normalizer: Normalizer,
        classifier: Classifier,
        search: S,
        pause: Duration,
    ) -> Self {
        Self {
            normalizer,
            classifier,
            search,
            pause,
        }
    }

    pub fn from_config(config: &AppConfig, search: S) -> Result<Self, ConfigError> {
        let normalizer =
            Normalizer::new(&config.brands, config.max_query_len, config.strict_units)?;
        let classifier = Classifier::new(&config.categories);
        Ok(Self::new(normalizer, classifier, search, config.pause()))
    }

    /// Looks up an image for one record and stores it in `image_url`.
    pub async fn enrich(&self, idx: usize, record: &mut Record) -> LookupOutcome {
        let title = record.title().to_string();
        let query = self.normalizer.normalize(&title);

        let (url, outcome) = match self.search.lookup(&query).await {
            Some(url) => {
                info!(
                    "[{}] Direct search for '{}' with '{}' yielded: {}",
                    idx, title, query, url
                );
                (Some(url), LookupOutcome::Direct)
            }
            None => {
                // The fallback is derived from the raw title, not the cleaned query.
                let fallback = self.classifier.classify(&title);
                let url = self.search.lookup(fallback).await;
                info!(
                    "[{}] Fallback search for '{}' with '{}' yielded: {}",
                    idx,
                    title,
                    fallback,
                    url.as_deref().unwrap_or("nothing")
                );
                let outcome = if url.is_some() {
                    LookupOutcome::Fallback
                } else {
                    LookupOutcome::Miss
                };
                (url, outcome)
            }
        };

        record.set_image_url(url.as_deref());
        outcome
    }

    /// Enriches every record (up to `limit`) into `sink`.
    ///
    /// Lookup problems never stop the run. A record that cannot be read or
    /// written does; everything already written stays intact.
    pub async fn run<I, W>(
        &self,
        records: I,
        sink: &mut JsonlSink<W>,
        limit: Option<usize>,
    ) -> Result<RunSummary, AppError>
    where
        I: IntoIterator<Item = Result<Record, InputError>>,
        W: Write,
    {
        let mut summary = RunSummary::start();

        for (i, item) in records
            .into_iter()
            .take(limit.unwrap_or(usize::MAX))
            .enumerate()
        {
            let mut record = item?;
            let outcome = self.enrich(i + 1, &mut record).await;
            sink.write(&record)?;
            summary.record(outcome);

            if !self.pause.is_zero() {
                sleep(self.pause).await;
            }
        }

        Ok(summary.finish())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::CsvSource;
    use serde_json::{Map, Value};
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Answers from a fixed table and remembers every query it was asked.
    struct TableSearch {
        answers: HashMap<String, String>,
        asked: Mutex<Vec<String>>,
    }

    impl TableSearch {
        fn new(answers: &[(&str, &str)]) -> Self {
            Self {
                answers: answers
                    .iter()
                    .map(|(q, u)| (q.to_string(), u.to_string()))
                    .collect(),
                asked: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait::async_trait]
    impl ImageSearch for TableSearch {
        async fn lookup(&self, query: &str) -> Option<String> {
            self.asked.lock().unwrap().push(query.to_string());
            self.answers.get(query).cloned()
        }
    }

    fn pipeline(answers: &[(&str, &str)], pause: Duration) -> Pipeline<TableSearch> {
        let mut config = AppConfig::default();
        config.pause_ms = pause.as_millis() as u64;
        Pipeline::from_config(&config, TableSearch::new(answers)).unwrap()
    }

    fn asked(p: &Pipeline<TableSearch>) -> Vec<String> {
        p.search.asked.lock().unwrap().clone()
    }

    async fn run_csv(
        p: &Pipeline<TableSearch>,
        csv: &str,
        limit: Option<usize>,
    ) -> (RunSummary, Vec<Map<String, Value>>) {
        let source = CsvSource::from_reader(csv.as_bytes(), "_extra").unwrap();
        let mut sink = JsonlSink::new(Vec::new());
        let summary = p.run(source, &mut sink, limit).await.unwrap();
        let text = String::from_utf8(sink.into_inner()).unwrap();
        let lines = text
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        (summary, lines)
    }

    #[tokio::test]
    async fn biscotti_falls_back_to_cookie() {
        let p = pipeline(&[("cookie", "https://cdn/cookie.jpg")], Duration::ZERO);
        let (summary, out) = run_csv(&p, "Title\nFerrara Biscotti 8 count\n", None).await;

        assert_eq!(asked(&p), vec!["biscotti", "cookie"]);
        assert_eq!(out[0]["image_url"], "https://cdn/cookie.jpg");
        assert_eq!(summary.fallback_hits, 1);
    }

    #[tokio::test]
    async fn double_miss_records_empty_url() {
        let p = pipeline(&[], Duration::ZERO);
        let (summary, out) = run_csv(&p, "Title\nFerrara Biscotti 8 count\n", None).await;

        assert_eq!(asked(&p), vec!["biscotti", "cookie"]);
        assert_eq!(out[0]["image_url"], "");
        assert_eq!(summary.misses, 1);
    }

    #[tokio::test]
    async fn direct_hit_skips_fallback() {
        let p = pipeline(&[("chocolate cake", "https://cdn/cake.jpg")], Duration::ZERO);
        let (summary, out) = run_csv(
            &p,
            "Title\n\"David's Chocolate Cake 12 oz (Family Size)\"\n",
            None,
        )
        .await;

        assert_eq!(asked(&p), vec!["chocolate cake"]);
        assert_eq!(out[0]["image_url"], "https://cdn/cake.jpg");
        assert_eq!(summary.direct_hits, 1);
    }

    #[tokio::test]
    async fn fallback_classifies_the_raw_title() {
        // The brand "classic cake" is stripped from the query, which would
        // classify as "cookie"; the title itself says "cake".
        let p = pipeline(&[], Duration::ZERO);
        let mut record = Record::default();
        record
            .fields
            .insert("Title".into(), Value::String("Classic Cake Butter Cookies".into()));

        p.enrich(1, &mut record).await;
        assert_eq!(asked(&p), vec!["butter cookies", "cake"]);
    }

    #[tokio::test]
    async fn preserves_order_and_fields() {
        let csv = "Title,Price,Notes\n\
                   Salmon Fillet 2 lbs,19.99,fresh\n\
                   Mystery Box,,\n\
                   \"Crème Brûlée (4 ct)\",12.00,\"a, b\"\n";
        let p = pipeline(&[("salmon fillet", "https://cdn/salmon.jpg")], Duration::ZERO);
        let (summary, out) = run_csv(&p, csv, None).await;

        assert_eq!(out.len(), 3);
        assert_eq!(summary.records, 3);
        let titles: Vec<_> = out.iter().map(|r| r["Title"].as_str().unwrap()).collect();
        assert_eq!(titles, vec!["Salmon Fillet 2 lbs", "Mystery Box", "Crème Brûlée (4 ct)"]);
        assert_eq!(out[1]["Price"], "");
        assert_eq!(out[2]["Notes"], "a, b");

        let keys: Vec<_> = out[2].keys().cloned().collect();
        assert_eq!(keys, vec!["Title", "Price", "Notes", "image_url"]);
        assert_eq!(out[0]["image_url"], "https://cdn/salmon.jpg");
        assert_eq!(out[1]["image_url"], "");
    }

    #[tokio::test]
    async fn missing_title_column_searches_empty_query() {
        let p = pipeline(&[("food", "https://cdn/food.jpg")], Duration::ZERO);
        let (_, out) = run_csv(&p, "Sku\nA1\n", None).await;

        assert_eq!(asked(&p), vec!["", "food"]);
        assert_eq!(out[0]["Sku"], "A1");
        assert_eq!(out[0]["image_url"], "https://cdn/food.jpg");
    }

    #[tokio::test]
    async fn limit_stops_early() {
        let p = pipeline(&[], Duration::ZERO);
        let (summary, out) = run_csv(&p, "Title\nA\nB\nC\n", Some(2)).await;
        assert_eq!(out.len(), 2);
        assert_eq!(summary.records, 2);
    }

    #[tokio::test]
    async fn pauses_once_per_record() {
        let p = pipeline(&[], Duration::from_millis(30));
        let started = std::time::Instant::now();
        // Each record misses twice but is only paused for once.
        let (_, out) = run_csv(&p, "Title\nA\nB\n", None).await;
        assert_eq!(out.len(), 2);
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_millis(60));
        assert!(elapsed < Duration::from_millis(120 + 500));
    }

    #[tokio::test]
    async fn unreadable_row_aborts_after_written_records() {
        let p = pipeline(&[], Duration::ZERO);
        let records = vec![
            Ok(Record::default()),
            Err(InputError::Row {
                row: 2,
                source: csv::Error::from(std::io::Error::other("disk gone")),
            }),
            Ok(Record::default()),
        ];
        let mut sink = JsonlSink::new(Vec::new());

        let err = p.run(records, &mut sink, None).await.unwrap_err();
        assert!(matches!(err, AppError::Input(InputError::Row { row: 2, .. })));
        assert_eq!(sink.written(), 1);
    }
}
