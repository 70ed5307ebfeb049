// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Result Reporting
 * Renders verdicts and aggregation reports as text lines or JSON
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

pub mod formats;

use crate::aggregator::AggregateReport;
use crate::discovery::{ArchiveReport, SubdomainReport};
use crate::types::{PrimaryItem, Verdict};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for ReportFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" | "txt" => Ok(ReportFormat::Text),
            "json" => Ok(ReportFormat::Json),
            other => Err(anyhow::anyhow!("Unknown output format: {}", other)),
        }
    }
}

pub struct Reporter<W: Write> {
    out: W,
    format: ReportFormat,
}

impl<W: Write> Reporter<W> {
    pub fn new(out: W, format: ReportFormat) -> Self {
        Self { out, format }
    }

    pub fn format(&self) -> ReportFormat {
        self.format
    }

    fn write_line(&mut self, line: &str) -> Result<()> {
        writeln!(self.out, "{}", line)?;
        Ok(())
    }

    /// Text mode prints positives only; JSON mode prints every verdict
    pub fn verdict(&mut self, verdict: &Verdict) -> Result<()> {
        match self.format {
            ReportFormat::Text => match formats::text::verdict_line(verdict) {
                Some(line) => self.write_line(&line),
                None => Ok(()),
            },
            ReportFormat::Json => {
                let line = formats::json::line(verdict)?;
                self.write_line(&line)
            }
        }
    }

    pub fn aggregate(&mut self, report: &AggregateReport) -> Result<()> {
        match self.format {
            ReportFormat::Text => {
                for entry in &report.entries {
                    let block = formats::text::key_report(entry);
                    self.write_line(&block)?;
                }
                Ok(())
            }
            ReportFormat::Json => {
                let document = formats::json::document(report)?;
                self.write_line(&document)
            }
        }
    }

    pub fn primary_items(&mut self, items: &[PrimaryItem]) -> Result<()> {
        let rendered = match self.format {
            ReportFormat::Text => formats::text::primary_items(items),
            ReportFormat::Json => formats::json::document(&items)?,
        };
        if rendered.is_empty() {
            return Ok(());
        }
        self.write_line(&rendered)
    }

    pub fn archive(&mut self, report: &ArchiveReport) -> Result<()> {
        let rendered = match self.format {
            ReportFormat::Text => formats::text::archive_report(report),
            ReportFormat::Json => formats::json::line(report)?,
        };
        self.write_line(&rendered)
    }

    pub fn subdomains(&mut self, report: &SubdomainReport) -> Result<()> {
        let rendered = match self.format {
            ReportFormat::Text => formats::text::subdomain_report(report),
            ReportFormat::Json => formats::json::document(report)?,
        };
        self.write_line(&rendered)
    }

    pub fn flush(&mut self) -> Result<()> {
        self.out.flush()?;
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}
