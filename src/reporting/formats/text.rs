// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

use crate::aggregator::{KeyReport, QueryRecord, RecordOutcome};
use crate::discovery::{ArchiveReport, SubdomainReport};
use crate::types::{PrimaryItem, QueryItem, Verdict};

/// `host[:port]: evidence`, or nothing for a negative verdict
pub fn verdict_line(verdict: &Verdict) -> Option<String> {
    if !verdict.detected {
        return None;
    }
    let evidence = verdict
        .evidence
        .as_deref()
        .or(verdict.matched_probe.as_deref())
        .unwrap_or("detected");
    Some(format!("{}: {}", verdict.target.display_host(), evidence))
}

fn item_line(item: &QueryItem) -> String {
    let mut line = item.label.clone();
    if let Some(url) = &item.url {
        line.push_str(" - ");
        line.push_str(url);
    }
    if let Some(description) = &item.description {
        line.push_str(" - ");
        line.push_str(description);
    }
    line
}

fn record_lines(record: &QueryRecord) -> Vec<String> {
    let prefix = format!("  [{}]", record.source);
    match &record.outcome {
        RecordOutcome::Items(items) if items.is_empty() => {
            vec![format!("{} {}", prefix, record.marker.as_deref().unwrap_or("No results found"))]
        }
        RecordOutcome::Items(items) => items
            .iter()
            .map(|item| format!("{} {}", prefix, item_line(item)))
            .collect(),
        RecordOutcome::NotFound => {
            vec![format!("{} {}", prefix, record.marker.as_deref().unwrap_or("Not found"))]
        }
        RecordOutcome::Failed(reason) => vec![format!("{} failed: {}", prefix, reason)],
    }
}

pub fn key_report(entry: &KeyReport) -> String {
    let mut lines = Vec::with_capacity(entry.records.len() + 1);
    match &entry.context {
        Some(context) => lines.push(format!("{} - {}", entry.query_key, context)),
        None => lines.push(entry.query_key.clone()),
    }
    lines.extend(entry.records.iter().flat_map(record_lines));
    lines.join("\n")
}

pub fn primary_items(items: &[PrimaryItem]) -> String {
    items
        .iter()
        .map(|item| match &item.context {
            Some(context) => format!("{} - {}", item.key, context),
            None => item.key.clone(),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn archive_report(report: &ArchiveReport) -> String {
    if report.urls_seen == 0 {
        return format!("{}: no archived URLs found", report.domain);
    }
    if report.sensitive_urls.is_empty() {
        return format!("{}: no sensitive information found in {} URLs", report.domain, report.urls_seen);
    }

    let mut lines = vec![format!(
        "{}: {} potentially sensitive URLs",
        report.domain,
        report.sensitive_urls.len()
    )];
    lines.extend(report.sensitive_urls.iter().map(|url| format!("  {}", url)));
    lines.join("\n")
}

pub fn subdomain_report(report: &SubdomainReport) -> String {
    let mut lines = vec![format!(
        "{}: {} subdomains, {} live, {} web services",
        report.domain,
        report.subdomains.len(),
        report.live.len(),
        report.web_services.len()
    )];
    lines.extend(report.live.iter().map(|name| format!("  live: {}", name)));
    lines.extend(report.web_services.iter().map(|url| format!("  web: {}", url)));
    lines.join("\n")
}
