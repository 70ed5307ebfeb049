// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - CVE Keyword Search
 * Scrapes the MITRE keyword search page into primary items
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use crate::errors::{ReconError, ReconResult};
use crate::http_client::{ApiRequest, HttpClient};
use crate::retry::{retry_with_backoff, RetryConfig};
use crate::types::PrimaryItem;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::sync::Arc;
use tracing::{debug, info};

pub const SOURCE_NAME: &str = "mitre";
pub const DEFAULT_BASE_URL: &str = "https://cve.mitre.org";

/// Descriptions kept by the RCE filter. "rce" only counts as a whole word.
static RCE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)remote code execution|arbitrary code execution|\brce\b").unwrap()
});

pub struct MitreCveSearch {
    http_client: Arc<HttpClient>,
    base_url: String,
    retry: RetryConfig,
}

impl MitreCveSearch {
    pub fn new(http_client: Arc<HttpClient>) -> Self {
        Self::with_base_url(http_client, DEFAULT_BASE_URL)
    }

    pub fn with_base_url(http_client: Arc<HttpClient>, base_url: &str) -> Self {
        Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            retry: RetryConfig::default(),
        }
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// CVE IDs with their descriptions for `keyword`, in page order
    pub async fn search(&self, keyword: &str) -> ReconResult<Vec<PrimaryItem>> {
        let request = ApiRequest::get(format!("{}/cgi-bin/cvekey.cgi", self.base_url)).query("keyword", keyword);

        let response = retry_with_backoff(&self.retry, "mitre_keyword_search", || {
            let request = &request;
            async move {
                let response = self.http_client.execute(request).await?;
                if response.is_success() {
                    Ok(response)
                } else {
                    Err(ReconError::UnexpectedStatus {
                        status_code: response.status_code,
                        url: request.url.clone(),
                    })
                }
            }
        })
        .await?;

        let items = parse_cve_table(&response.body)?;
        info!("Found {} CVEs for keyword '{}'", items.len(), keyword);
        Ok(items)
    }
}

fn selector(css: &str) -> ReconResult<Selector> {
    Selector::parse(css).map_err(|e| ReconError::Pattern {
        pattern: css.to_string(),
        reason: format!("{:?}", e),
    })
}

fn cell_text(cell: &ElementRef) -> String {
    cell.text().map(str::trim).collect::<Vec<_>>().join("")
}

/// Locate the table whose header names "Name" and "Description" and read its rows
pub fn parse_cve_table(html: &str) -> ReconResult<Vec<PrimaryItem>> {
    let document = Html::parse_document(html);
    let table_sel = selector("table")?;
    let thead_sel = selector("thead")?;
    let row_sel = selector("tr")?;
    let cell_sel = selector("td")?;

    let table = document.select(&table_sel).find(|table| {
        table
            .select(&thead_sel)
            .next()
            .map(|thead| {
                let text = thead.text().collect::<String>();
                text.contains("Name") && text.contains("Description")
            })
            .unwrap_or(false)
    });

    let Some(table) = table else {
        return Err(ReconError::MalformedUpstream {
            source_name: SOURCE_NAME.to_string(),
            reason: "CVE table not found".to_string(),
        });
    };

    let items = table
        .select(&row_sel)
        .skip(1)
        .filter_map(|row| {
            let cells: Vec<ElementRef> = row.select(&cell_sel).collect();
            if cells.len() < 2 {
                return None;
            }
            let id = cell_text(&cells[0]);
            if id.is_empty() {
                return None;
            }
            Some(PrimaryItem::new(id).with_context(cell_text(&cells[1])))
        })
        .collect::<Vec<_>>();

    debug!("Parsed {} CVE rows", items.len());
    Ok(items)
}

/// Keep items whose description mentions code execution
pub fn filter_rce(items: Vec<PrimaryItem>) -> Vec<PrimaryItem> {
    items
        .into_iter()
        .filter(|item| RCE_PATTERN.is_match(item.context.as_deref().unwrap_or("")))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<html><body>
        <table><tr><td>Search results</td></tr></table>
        <table>
          <thead><tr><th>Name</th><th>Description</th></tr></thead>
          <tr><td><a href="/x">CVE-2020-1938</a></td><td>When using the Apache JServ Protocol (AJP), ... remote code execution</td></tr>
          <tr><td>CVE-2020-9484</td><td>Session persistence deserialization of a resource</td></tr>
          <tr><td>CVE-2019-0232</td><td>Arbitrary Code Execution via CGI Servlet</td></tr>
          <tr><td>CVE-2021-0001</td><td>Unauthenticated RCE in admin console</td></tr>
        </table>
    </body></html>"#;

    #[test]
    fn test_parse_table_rows() {
        let items = parse_cve_table(PAGE).unwrap();
        let ids: Vec<&str> = items.iter().map(|i| i.key.as_str()).collect();
        assert_eq!(ids, vec!["CVE-2020-1938", "CVE-2020-9484", "CVE-2019-0232", "CVE-2021-0001"]);
        assert!(items[1].context.as_deref().unwrap().contains("deserialization"));
    }

    #[test]
    fn test_missing_table_is_malformed() {
        let err = parse_cve_table("<html><body><p>maintenance</p></body></html>").unwrap_err();
        assert!(matches!(err, ReconError::MalformedUpstream { .. }));
    }

    #[test]
    fn test_rce_filter_is_case_insensitive() {
        let kept = filter_rce(parse_cve_table(PAGE).unwrap());
        let ids: Vec<&str> = kept.iter().map(|i| i.key.as_str()).collect();
        assert_eq!(ids, vec!["CVE-2020-1938", "CVE-2019-0232", "CVE-2021-0001"]);
    }
}
