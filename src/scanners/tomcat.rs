// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Apache Tomcat Detection Profile
 * Identifies Tomcat on the usual web ports
 *
 * Detects:
 * - Server / X-Powered-By headers naming Tomcat
 * - JSESSIONID session cookie
 * - Default page, manager and error page markers
 * - Default docs/examples resources and exposed config paths
 * - Tomcat responses to OPTIONS/PUT/DELETE
 * - Ghostcat (CVE-2020-1938) AJP indicator
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use super::{Binding, ServiceProfile};
use crate::extractor::{EvidenceMode, SignatureDef, Surface};
use crate::probes::{Indicator, ProbeDef, ProbeKind, StatusRequirement};

pub const PROFILE_NAME: &str = "tomcat";

/// Ports swept for every host
pub const DEFAULT_PORTS: [u16; 3] = [80, 443, 8080];

const MANAGER_PATHS: &[&str] = &["/manager/html", "/host-manager/html"];

const FINGERPRINT_PATHS: &[&str] = &[
    "/docs/",
    "/examples/",
    "/host-manager/",
    "/manager/",
    "/webapps/",
    "/favicon.ico",
    "/index.jsp",
];

const COMMON_PATHS: &[&str] = &["/conf/", "/webapps/", "/logs/", "/conf/server.xml", "/web.xml"];

const PROBE_METHODS: &[&str] = &["OPTIONS", "PUT", "DELETE"];

fn paths(list: &[&str]) -> Vec<String> {
    list.iter().map(|p| p.to_string()).collect()
}

/// `Apache Tomcat/9.0.41` captures the version, bare markers report themselves
fn page_markers() -> Vec<SignatureDef> {
    vec![
        SignatureDef::regex("tomcat-version", Surface::Body, r"Apache Tomcat/(\d+(?:\.\d+)*)"),
        SignatureDef::literal("apache-tomcat", Surface::Body, "Apache Tomcat"),
        SignatureDef::literal("tomcat-slash", Surface::Body, "Tomcat/"),
    ]
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

fn labelled(mut def: ProbeDef, label: &str) -> ProbeDef {
    def.label = Some(label.to_string());
    def
}

pub fn profile(ports: &[u16]) -> ServiceProfile {
    let probes = vec![
        probe(
            "server-header",
            ProbeKind::HeaderCheck,
            StatusRequirement::Any,
            vec![SignatureDef::contains("server", Surface::Header("Server".into()), "tomcat")
                .with_evidence(EvidenceMode::Whole)],
        ),
        probe(
            "powered-by-header",
            ProbeKind::HeaderCheck,
            StatusRequirement::Any,
            vec![
                SignatureDef::contains("x-powered-by", Surface::Header("X-Powered-By".into()), "tomcat")
                    .with_evidence(EvidenceMode::Whole),
            ],
        ),
        labelled(
            probe(
                "session-cookie",
                ProbeKind::CookieCheck,
                StatusRequirement::Any,
                vec![SignatureDef::present("jsessionid", Surface::Cookie("JSESSIONID".into()))
                    .with_evidence(EvidenceMode::None)],
            ),
            "JSESSIONID cookie",
        ),
        probe("body-marker", ProbeKind::BodyCheck, StatusRequirement::Any, page_markers()),
        labelled(
            probe(
                "manager-endpoint",
                ProbeKind::PathProbe {
                    paths: paths(MANAGER_PATHS),
                },
                StatusRequirement::Exact(200),
                vec![
                    SignatureDef::literal("manager", Surface::Body, "Tomcat Manager"),
                    SignatureDef::literal("host-manager", Surface::Body, "Tomcat Host Manager"),
                ],
            ),
            "Tomcat manager interface",
        ),
        probe(
            "error-page",
            ProbeKind::PathProbe {
                paths: vec!["/nonexistentpage".to_string()],
            },
            StatusRequirement::Exact(404),
            vec![
                SignatureDef::regex("tomcat-version", Surface::Body, r"Apache Tomcat/(\d+(?:\.\d+)*)"),
                SignatureDef::literal("apache-tomcat", Surface::Body, "Apache Tomcat"),
            ],
        ),
        probe(
            "fingerprint-resource",
            ProbeKind::PathProbe {
                paths: paths(FINGERPRINT_PATHS),
            },
            StatusRequirement::Exact(200),
            page_markers(),
        ),
        probe(
            "common-file",
            ProbeKind::PathProbe {
                paths: paths(COMMON_PATHS),
            },
            StatusRequirement::Exact(200),
            page_markers(),
        ),
        probe(
            "http-method",
            ProbeKind::MethodProbe {
                methods: paths(PROBE_METHODS),
                path: "/".to_string(),
            },
            StatusRequirement::Exact(200),
            vec![SignatureDef::literal("apache-tomcat", Surface::Body, "Apache Tomcat")],
        ),
        probe(
            "known-vulnerability",
            ProbeKind::VulnerabilityProbe {
                indicators: vec![Indicator::new(
                    "/AJP/13",
                    "Vulnerable to CVE-2020-1938 (Ghostcat)",
                    StatusRequirement::Exact(200),
                )],
            },
            StatusRequirement::Any,
            Vec::new(),
        ),
    ];

    ServiceProfile {
        name: PROFILE_NAME.to_string(),
        binding: Binding::PortSweep {
            ports: ports.to_vec(),
        },
        probes,
    }
}
