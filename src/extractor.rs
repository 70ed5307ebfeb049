// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Evidence Extraction
 * First-match signature evaluation over response surfaces
 *
 * Signatures are evaluated strictly in caller order so specific patterns
 * (e.g. `Liferay Portal 7.4.1`) win over generic ones (`Version 7.4.1`).
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use crate::errors::{ReconError, ReconResult};
use crate::http_client::HttpResponse;
use regex::{Regex, RegexBuilder};
use scraper::Html;
use serde::{Deserialize, Serialize};

/// Part of an HTTP response a signature inspects
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "name", rename_all = "snake_case")]
pub enum Surface {
    Header(String),
    Cookie(String),
    Body,
    Status,
    /// `<meta name="...">` content attribute
    Meta(String),
    /// Bodies of `<!-- ... -->` comments
    Comments,
}

/// How the inspected value is tested
#[derive(Debug, Clone)]
pub enum Matcher {
    Contains { needle: String, case_insensitive: bool },
    /// Matches whenever the surface has a value (header/cookie exists)
    Present,
    Equals { value: String, case_insensitive: bool },
    /// Capture group 1 is used as evidence when present
    Regex(Regex),
}

/// What a match reports as evidence
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvidenceMode {
    None,
    #[default]
    Matched,
    Whole,
}

/// A compiled, immutable matching rule
#[derive(Debug, Clone)]
pub struct Signature {
    pub name: String,
    pub surface: Surface,
    pub matcher: Matcher,
    pub evidence: EvidenceMode,
}

/// Result of the first matching signature
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    pub signature: String,
    pub value: Option<String>,
}

impl Matcher {
    /// Returns the matched text (or capture) when `value` satisfies the matcher
    fn find<'a>(&self, value: &'a str) -> Option<&'a str> {
        match self {
            Matcher::Contains { needle, case_insensitive } => {
                if needle.is_empty() {
                    return None;
                }
                let start = if *case_insensitive {
                    // ASCII lowering keeps byte offsets aligned with the original
                    value
                        .to_ascii_lowercase()
                        .find(&needle.to_ascii_lowercase())?
                } else {
                    value.find(needle.as_str())?
                };
                value.get(start..start + needle.len())
            }
            Matcher::Present => Some(value),
            Matcher::Equals { value: expected, case_insensitive } => {
                let candidate = value.trim();
                let equal = if *case_insensitive {
                    candidate.eq_ignore_ascii_case(expected)
                } else {
                    candidate == expected
                };
                equal.then_some(candidate)
            }
            Matcher::Regex(regex) => {
                let captures = regex.captures(value)?;
                captures
                    .get(1)
                    .or_else(|| captures.get(0))
                    .map(|m| m.as_str())
            }
        }
    }
}

impl Signature {
    pub fn new(name: &str, surface: Surface, matcher: Matcher) -> Self {
        Self {
            name: name.to_string(),
            surface,
            matcher,
            evidence: EvidenceMode::Matched,
        }
    }

    /// Case-insensitive substring on a surface
    pub fn contains(name: &str, surface: Surface, needle: &str) -> Self {
        Self::new(
            name,
            surface,
            Matcher::Contains {
                needle: needle.to_string(),
                case_insensitive: true,
            },
        )
    }

    pub fn present(name: &str, surface: Surface) -> Self {
        Self::new(name, surface, Matcher::Present).with_evidence(EvidenceMode::Whole)
    }

    pub fn regex(name: &str, surface: Surface, pattern: &str) -> ReconResult<Self> {
        let regex = Regex::new(pattern).map_err(|e| ReconError::Pattern {
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self::new(name, surface, Matcher::Regex(regex)))
    }

    pub fn with_evidence(mut self, evidence: EvidenceMode) -> Self {
        self.evidence = evidence;
        self
    }

    /// Evaluate against one inspected value
    fn evaluate(&self, value: &str) -> Option<Extraction> {
        if value.is_empty() && !matches!(self.matcher, Matcher::Present) {
            return None;
        }
        let found = self.matcher.find(value)?;
        let evidence = match self.evidence {
            EvidenceMode::None => None,
            EvidenceMode::Matched => Some(found.to_string()),
            EvidenceMode::Whole => Some(value.to_string()),
        };
        Some(Extraction {
            signature: self.name.clone(),
            value: evidence.filter(|v| !v.is_empty()),
        })
    }
}

/// First signature (in order) that matches `text`, ignoring surfaces.
///
/// Empty input never matches.
pub fn extract(text: &str, signatures: &[Signature]) -> Option<Extraction> {
    if text.is_empty() {
        return None;
    }
    signatures.iter().find_map(|sig| sig.evaluate(text))
}

/// First signature (in order) that matches its surface on `response`
pub fn extract_response(response: &HttpResponse, signatures: &[Signature]) -> Option<Extraction> {
    // Parsed lazily: only meta/comment surfaces need a DOM
    let mut document: Option<Html> = None;

    for signature in signatures {
        let values: Vec<String> = match &signature.surface {
            Surface::Header(name) => response.header(name).into_iter().collect(),
            Surface::Cookie(name) => response.cookie(name).map(str::to_string).into_iter().collect(),
            Surface::Body => vec![response.body.clone()],
            Surface::Status => vec![response.status_code.to_string()],
            Surface::Meta(name) => {
                let doc = document.get_or_insert_with(|| Html::parse_document(&response.body));
                meta_contents(doc, name)
            }
            Surface::Comments => {
                let doc = document.get_or_insert_with(|| Html::parse_document(&response.body));
                comments(doc)
            }
        };

        if let Some(extraction) = values.iter().find_map(|v| signature.evaluate(v)) {
            return Some(extraction);
        }
    }

    None
}

fn meta_contents(document: &Html, name: &str) -> Vec<String> {
    document
        .tree
        .values()
        .filter_map(|node| node.as_element())
        .filter(|el| el.name().eq_ignore_ascii_case("meta"))
        .filter(|el| {
            el.attr("name")
                .map(|n| n.eq_ignore_ascii_case(name))
                .unwrap_or(false)
        })
        .filter_map(|el| el.attr("content"))
        .map(|content| content.trim().to_string())
        .collect()
}

fn comments(document: &Html) -> Vec<String> {
    document
        .tree
        .values()
        .filter_map(|node| node.as_comment())
        .map(|comment| comment.trim().to_string())
        .filter(|comment| !comment.is_empty())
        .collect()
}

/// Serializable matcher description used in profile files
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MatcherDef {
    Contains {
        needle: String,
        #[serde(default = "default_true")]
        case_insensitive: bool,
    },
    Present,
    Equals {
        value: String,
        #[serde(default)]
        case_insensitive: bool,
    },
    Regex {
        pattern: String,
        #[serde(default)]
        case_insensitive: bool,
    },
}

fn default_true() -> bool {
    true
}

/// Serializable signature, compiled once at startup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignatureDef {
    pub name: String,
    pub surface: Surface,
    pub matcher: MatcherDef,
    #[serde(default)]
    pub evidence: EvidenceMode,
}

impl SignatureDef {
    /// Case-insensitive substring, matched text as evidence
    pub fn contains(name: &str, surface: Surface, needle: &str) -> Self {
        Self {
            name: name.to_string(),
            surface,
            matcher: MatcherDef::Contains {
                needle: needle.to_string(),
                case_insensitive: true,
            },
            evidence: EvidenceMode::Matched,
        }
    }

    /// Case-sensitive substring
    pub fn literal(name: &str, surface: Surface, needle: &str) -> Self {
        Self {
            matcher: MatcherDef::Contains {
                needle: needle.to_string(),
                case_insensitive: false,
            },
            ..Self::contains(name, surface, needle)
        }
    }

    pub fn present(name: &str, surface: Surface) -> Self {
        Self {
            name: name.to_string(),
            surface,
            matcher: MatcherDef::Present,
            evidence: EvidenceMode::Whole,
        }
    }

    pub fn regex(name: &str, surface: Surface, pattern: &str) -> Self {
        Self {
            name: name.to_string(),
            surface,
            matcher: MatcherDef::Regex {
                pattern: pattern.to_string(),
                case_insensitive: false,
            },
            evidence: EvidenceMode::Matched,
        }
    }

    pub fn with_evidence(mut self, evidence: EvidenceMode) -> Self {
        self.evidence = evidence;
        self
    }

    pub fn compile(&self) -> ReconResult<Signature> {
        let matcher = match &self.matcher {
            MatcherDef::Contains { needle, case_insensitive } => Matcher::Contains {
                needle: needle.clone(),
                case_insensitive: *case_insensitive,
            },
            MatcherDef::Present => Matcher::Present,
            MatcherDef::Equals { value, case_insensitive } => Matcher::Equals {
                value: value.clone(),
                case_insensitive: *case_insensitive,
            },
            MatcherDef::Regex { pattern, case_insensitive } => {
                let regex = RegexBuilder::new(pattern)
                    .case_insensitive(*case_insensitive)
                    .build()
                    .map_err(|e| ReconError::Pattern {
                        pattern: pattern.clone(),
                        reason: e.to_string(),
                    })?;
                Matcher::Regex(regex)
            }
        };

        Ok(Signature {
            name: self.name.clone(),
            surface: self.surface.clone(),
            matcher,
            evidence: self.evidence,
        })
    }
}

/// Compile a signature list, failing on the first bad pattern
pub fn compile_all(defs: &[SignatureDef]) -> ReconResult<Vec<Signature>> {
    defs.iter().map(SignatureDef::compile).collect()
}
