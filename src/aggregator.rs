// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Multi-Source Aggregation
 * Fans primary items out across lookup sources and merges the answers
 *
 * Failures stay scoped to one (key, source) pair. Results are deduplicated
 * within a source by item identity and never across sources.
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use crate::query::{Lookup, QueryResponse};
use crate::types::{PrimaryItem, QueryItem};
use futures::future::join_all;
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub const DEFAULT_EMPTY_MARKER: &str = "No results found";
pub const NOT_FOUND_MARKER: &str = "Not found";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum RecordOutcome {
    Items(Vec<QueryItem>),
    NotFound,
    Failed(String),
}

/// One source's answer for one query key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryRecord {
    pub query_key: String,
    pub source: String,
    pub outcome: RecordOutcome,
    /// Human-readable note for empty and not-found outcomes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marker: Option<String>,
}

impl QueryRecord {
    pub fn items(&self) -> &[QueryItem] {
        match &self.outcome {
            RecordOutcome::Items(items) => items,
            _ => &[],
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self.outcome, RecordOutcome::Failed(_))
    }
}

/// Everything known about one primary item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyReport {
    pub query_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    pub records: Vec<QueryRecord>,
}

impl KeyReport {
    pub fn record(&self, source: &str) -> Option<&QueryRecord> {
        self.records.iter().find(|r| r.source == source)
    }
}

/// Reports in primary-item order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateReport {
    pub entries: Vec<KeyReport>,
}

impl AggregateReport {
    pub fn get(&self, key: &str) -> Option<&KeyReport> {
        self.entries.iter().find(|e| e.query_key == key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn failure_count(&self) -> usize {
        self.entries
            .iter()
            .flat_map(|e| e.records.iter())
            .filter(|r| r.is_failure())
            .count()
    }
}

/// Drop repeated items by identity (url, else label), keeping first occurrences
pub fn dedup_items(items: Vec<QueryItem>) -> Vec<QueryItem> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.identity().to_string()))
        .collect()
}

/// Drop repeated primary keys, keeping the first occurrence and its context
pub fn dedup_primary(items: Vec<PrimaryItem>) -> Vec<PrimaryItem> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| !item.key.trim().is_empty())
        .filter(|item| seen.insert(item.key.clone()))
        .collect()
}

pub struct Aggregator {
    sources: Vec<Arc<dyn Lookup>>,
    concurrency: usize,
    empty_marker: String,
    cancel: Option<CancellationToken>,
}

impl Aggregator {
    pub fn new(sources: Vec<Arc<dyn Lookup>>, concurrency: usize) -> Self {
        Self {
            sources,
            concurrency: concurrency.max(1),
            empty_marker: DEFAULT_EMPTY_MARKER.to_string(),
            cancel: None,
        }
    }

    /// Marker attached to successful lookups that returned nothing
    pub fn with_empty_marker(mut self, marker: &str) -> Self {
        self.empty_marker = marker.to_string();
        self
    }

    /// Items not yet started when `cancel` fires are left out of the report
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    pub fn source_names(&self) -> Vec<&str> {
        self.sources.iter().map(|s| s.name()).collect()
    }

    pub async fn aggregate(&self, primary_items: Vec<PrimaryItem>) -> AggregateReport {
        let items = dedup_primary(primary_items);
        info!(
            "Aggregating {} keys across {}",
            items.len(),
            self.source_names().join(", ")
        );

        let cancel = self.cancel.clone();
        let entries: Vec<KeyReport> = stream::iter(items)
            .take_while(move |_| {
                let running = cancel.as_ref().map(|c| !c.is_cancelled()).unwrap_or(true);
                futures::future::ready(running)
            })
            .map(|item| self.report_for(item))
            .buffered(self.concurrency)
            .collect()
            .await;

        let report = AggregateReport { entries };
        if report.failure_count() > 0 {
            warn!("{} lookup(s) failed; see report markers", report.failure_count());
        }
        report
    }

    async fn report_for(&self, item: PrimaryItem) -> KeyReport {
        let key = item.key.as_str();
        let lookups = self.sources.iter().filter(|source| {
            let accepted = source.accepts(key);
            if !accepted {
                debug!(source = source.name(), key = key, "Key type not served by source, skipped");
            }
            accepted
        });
        let lookups = lookups.map(|source| async move {
            let response = source.lookup(key).await;
            debug!(source = source.name(), key = key, outcome = %response, "Lookup finished");
            self.record(key, source.name(), response)
        });

        let records = join_all(lookups).await;

        KeyReport {
            query_key: item.key.clone(),
            context: item.context.clone(),
            records,
        }
    }

    fn record(&self, key: &str, source: &str, response: QueryResponse) -> QueryRecord {
        let (outcome, marker) = match response {
            QueryResponse::Success(items) => {
                let items = dedup_items(items);
                let marker = items.is_empty().then(|| self.empty_marker.clone());
                (RecordOutcome::Items(items), marker)
            }
            QueryResponse::NotFound => (RecordOutcome::NotFound, Some(NOT_FOUND_MARKER.to_string())),
            other => (RecordOutcome::Failed(other.to_string()), None),
        };

        QueryRecord {
            query_key: key.to_string(),
            source: source.to_string(),
            outcome,
            marker,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;

    struct ScriptedSource {
        name: String,
        answers: HashMap<String, QueryResponse>,
    }

    #[async_trait]
    impl Lookup for ScriptedSource {
        fn name(&self) -> &str {
            &self.name
        }

        async fn lookup(&self, key: &str) -> QueryResponse {
            self.answers
                .get(key)
                .cloned()
                .unwrap_or(QueryResponse::NotFound)
        }
    }

    fn item(label: &str, url: &str) -> QueryItem {
        QueryItem::new(label).with_url(url)
    }

    #[tokio::test]
    async fn test_partial_failure_is_scoped() {
        let mut a = HashMap::new();
        a.insert("k1".to_string(), QueryResponse::Success(vec![item("x", "u1")]));
        a.insert("k2".to_string(), QueryResponse::TransientError("boom".into()));
        a.insert("k3".to_string(), QueryResponse::Success(vec![item("y", "u2")]));

        let source_a: Arc<dyn Lookup> = Arc::new(ScriptedSource { name: "a".into(), answers: a });
        let aggregator = Aggregator::new(vec![source_a], 2);

        let report = aggregator
            .aggregate(vec![PrimaryItem::new("k1"), PrimaryItem::new("k2"), PrimaryItem::new("k3")])
            .await;

        assert_eq!(report.len(), 3);
        assert_eq!(report.get("k1").unwrap().record("a").unwrap().items().len(), 1);
        assert!(report.get("k2").unwrap().record("a").unwrap().is_failure());
        assert_eq!(report.get("k3").unwrap().record("a").unwrap().items()[0].label, "y");
        assert_eq!(report.failure_count(), 1);
    }

    #[tokio::test]
    async fn test_dedup_within_source_not_across() {
        let dup = vec![item("poc", "https://github.com/a/poc"), item("poc-fork", "https://github.com/a/poc")];
        let mut a = HashMap::new();
        a.insert("CVE-1".to_string(), QueryResponse::Success(dup.clone()));
        let mut b = HashMap::new();
        b.insert("CVE-1".to_string(), QueryResponse::Success(dup));

        let sources: Vec<Arc<dyn Lookup>> = vec![
            Arc::new(ScriptedSource { name: "a".into(), answers: a }),
            Arc::new(ScriptedSource { name: "b".into(), answers: b }),
        ];
        let report = Aggregator::new(sources, 1).aggregate(vec![PrimaryItem::new("CVE-1")]).await;

        let entry = report.get("CVE-1").unwrap();
        assert_eq!(entry.records.len(), 2);
        assert_eq!(entry.record("a").unwrap().items().len(), 1);
        assert_eq!(entry.record("b").unwrap().items().len(), 1);
    }

    #[tokio::test]
    async fn test_markers_and_order() {
        let mut a = HashMap::new();
        a.insert("CVE-2".to_string(), QueryResponse::Success(Vec::new()));
        let source: Arc<dyn Lookup> = Arc::new(ScriptedSource { name: "github".into(), answers: a });

        let report = Aggregator::new(vec![source], 4)
            .with_empty_marker("No PoCs found")
            .aggregate(vec![
                PrimaryItem::new("CVE-3").with_context("third"),
                PrimaryItem::new("CVE-2"),
                PrimaryItem::new("CVE-3"),
            ])
            .await;

        let keys: Vec<&str> = report.entries.iter().map(|e| e.query_key.as_str()).collect();
        assert_eq!(keys, vec!["CVE-3", "CVE-2"]);
        assert_eq!(report.get("CVE-3").unwrap().context.as_deref(), Some("third"));

        let empty = report.get("CVE-2").unwrap().record("github").unwrap();
        assert_eq!(empty.outcome, RecordOutcome::Items(Vec::new()));
        assert_eq!(empty.marker.as_deref(), Some("No PoCs found"));

        let missing = report.get("CVE-3").unwrap().record("github").unwrap();
        assert_eq!(missing.outcome, RecordOutcome::NotFound);
        assert!(!missing.is_failure());
    }

    struct EmailOnly;

    #[async_trait]
    impl Lookup for EmailOnly {
        fn name(&self) -> &str {
            "email-only"
        }

        fn accepts(&self, key: &str) -> bool {
            key.contains('@')
        }

        async fn lookup(&self, _key: &str) -> QueryResponse {
            QueryResponse::Success(vec![QueryItem::new("breach")])
        }
    }

    #[tokio::test]
    async fn test_sources_skip_keys_they_do_not_serve() {
        let everything: Arc<dyn Lookup> = Arc::new(ScriptedSource { name: "all".into(), answers: HashMap::new() });
        let aggregator = Aggregator::new(vec![everything, Arc::new(EmailOnly)], 2);
        assert_eq!(aggregator.source_names(), vec!["all", "email-only"]);

        let report = aggregator
            .aggregate(vec![PrimaryItem::new("example.com"), PrimaryItem::new("a@example.com")])
            .await;

        let domain = report.get("example.com").unwrap();
        assert_eq!(domain.records.len(), 1);
        assert!(domain.record("email-only").is_none());

        let email = report.get("a@example.com").unwrap();
        assert_eq!(email.records.len(), 2);
        assert_eq!(email.record("email-only").unwrap().items().len(), 1);
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let source: Arc<dyn Lookup> = Arc::new(ScriptedSource { name: "a".into(), answers: HashMap::new() });
        let report = Aggregator::new(vec![source], 1)
            .with_cancellation(cancel)
            .aggregate(vec![PrimaryItem::new("k1")])
            .await;
        assert!(report.is_empty());
    }
}
