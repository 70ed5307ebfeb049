// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Liferay Version Detection Profile
 * Extracts the running Liferay Portal version
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use super::{Binding, ServiceProfile};
use crate::extractor::{EvidenceMode, SignatureDef, Surface};
use crate::probes::{ProbeDef, ProbeKind, StatusRequirement};

pub const PROFILE_NAME: &str = "liferay";

const ENDPOINTS: &[&str] = &[
    "/html/portal/update_available.html",
    "/api/jsonws",
    "/c/portal/update_available",
    "/c/portal/license",
    "/c/portal/login",
    "/api/jsonws/invoke",
    "/group/control_panel/manage",
    "/web/guest/home",
];

const JSP_FILES: &[&str] = &[
    "/html/common/themes/top.jsp",
    "/html/common/themes/bottom.jsp",
    "/html/portal/update_available.jsp",
    "/html/portal/setup_wizard.jsp",
];

/// Specific patterns before generic ones: `Liferay Portal 7.4.1` beats `Version 7.4.1`
const VERSION_PATTERNS: &[(&str, &str)] = &[
    ("portal-version", r"Liferay Portal (\d+\.\d+\.\d+)"),
    ("liferay-version", r"Liferay (\d+\.\d+\.\d+)"),
    ("version-label", r"Version (\d+\.\d+\.\d+)"),
    ("liferay-version-label", r"Liferay Version (\d+\.\d+\.\d+)"),
    ("js-camel-version", r#"liferayVersion\s*=\s*"(\d+\.\d+\.\d+)""#),
    ("js-dotted-version", r#"Liferay\.version = "(\d+\.\d+\.\d+)""#),
];

fn version_signatures(surface: Surface) -> Vec<SignatureDef> {
    VERSION_PATTERNS
        .iter()
        .map(|(name, pattern)| SignatureDef::regex(name, surface.clone(), pattern))
        .collect()
}

fn probe(id: &str, kind: ProbeKind, status: StatusRequirement, signatures: Vec<SignatureDef>) -> ProbeDef {
    ProbeDef {
        id: id.to_string(),
        kind,
        status,
        label: None,
        signatures,
    }
}

pub fn profile() -> ServiceProfile {
    let meta = Surface::Meta("generator".into());

    let probes = vec![
        probe(
            "header-check",
            ProbeKind::HeaderCheck,
            StatusRequirement::Success,
            vec![SignatureDef::present("liferay-portal", Surface::Header("Liferay-Portal".into()))],
        ),
        probe(
            "meta-tag-check",
            ProbeKind::BodyCheck,
            StatusRequirement::Success,
            vec![
                SignatureDef::regex("generator-version", meta.clone(), r"Liferay\D*?(\d+\.\d+\.\d+)"),
                // No parsable version: the generator string itself is the evidence
                SignatureDef::literal("generator", meta, "Liferay").with_evidence(EvidenceMode::Whole),
            ],
        ),
        probe(
            "endpoint-check",
            ProbeKind::PathProbe {
                paths: ENDPOINTS.iter().map(|p| p.to_string()).collect(),
            },
            StatusRequirement::Exact(200),
            version_signatures(Surface::Body),
        ),
        probe(
            "comment-check",
            ProbeKind::BodyCheck,
            StatusRequirement::Success,
            version_signatures(Surface::Comments),
        ),
        probe(
            "jsp-check",
            ProbeKind::PathProbe {
                paths: JSP_FILES.iter().map(|p| p.to_string()).collect(),
            },
            StatusRequirement::Exact(200),
            version_signatures(Surface::Body),
        ),
        probe(
            "js-variable-check",
            ProbeKind::BodyCheck,
            StatusRequirement::Success,
            vec![SignatureDef::regex(
                "js-version",
                Surface::Body,
                r#"Liferay\.version\s*=\s*"(\d+\.\d+\.\d+)""#,
            )],
        ),
    ];

    ServiceProfile {
        name: PROFILE_NAME.to_string(),
        binding: Binding::DualScheme,
        probes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::{compile_all, extract};

    #[test]
    fn test_probe_order() {
        let ids: Vec<String> = profile().probes.into_iter().map(|p| p.id).collect();
        assert_eq!(
            ids,
            vec![
                "header-check",
                "meta-tag-check",
                "endpoint-check",
                "comment-check",
                "jsp-check",
                "js-variable-check"
            ]
        );
    }

    #[test]
    fn test_version_patterns_prefer_specific() {
        let sigs = compile_all(&version_signatures(Surface::Body)).unwrap();
        let hit = extract("Version 1.2.3 Liferay Portal 7.4.1", &sigs).unwrap();
        assert_eq!(hit.signature, "portal-version");
        assert_eq!(hit.value.as_deref(), Some("7.4.1"));

        let hit = extract(r#"var liferayVersion = "7.0.6";"#, &sigs).unwrap();
        assert_eq!(hit.value.as_deref(), Some("7.0.6"));
    }
}
