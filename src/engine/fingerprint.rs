// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Fingerprint Engine
 * Ordered probe cascade with first-match short-circuit
 *
 * Cheap high-confidence probes (headers) are listed before noisy ones
 * (path brute force), so most positive targets cost one request.
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use crate::probes::Probe;
use crate::types::{ProbeFailure, Scheme, Target, Verdict};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Engine progress for one target. `Matched` and `Exhausted` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Pending,
    Probing(usize),
    Matched,
    Exhausted,
}

impl EngineState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, EngineState::Matched | EngineState::Exhausted)
    }
}

/// Runs an ordered probe list against targets. Holds no per-target state.
#[derive(Clone)]
pub struct FingerprintEngine {
    probes: Arc<Vec<Arc<dyn Probe>>>,
    timeout: Duration,
}

impl FingerprintEngine {
    pub fn new(probes: Vec<Arc<dyn Probe>>, timeout: Duration) -> Self {
        Self {
            probes: Arc::new(probes),
            timeout,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub async fn identify(&self, target: &Target) -> Verdict {
        identify(target, &self.probes, self.timeout).await
    }

    /// Plain HTTP first; HTTPS only when HTTP found nothing
    pub async fn identify_dual_scheme(&self, target: &Target) -> Verdict {
        let plain = self.identify(&target.with_scheme(Scheme::Http)).await;
        if plain.detected {
            return plain;
        }

        let secure = self.identify(&target.with_scheme(Scheme::Https)).await;
        if secure.detected {
            secure
        } else {
            plain
        }
    }

    /// One verdict per port, scheme chosen by port convention
    pub async fn sweep_ports(&self, target: &Target, ports: &[u16]) -> Vec<Verdict> {
        let mut verdicts = Vec::with_capacity(ports.len());
        for &port in ports {
            let bound = target.with_port(port).with_scheme(Scheme::for_port(port));
            verdicts.push(self.identify(&bound).await);
        }
        verdicts
    }
}

/// Run `probes` in order against `target`, stopping at the first match
pub async fn identify(target: &Target, probes: &[Arc<dyn Probe>], timeout: Duration) -> Verdict {
    let mut state = EngineState::Pending;
    let mut errors: Vec<ProbeFailure> = Vec::new();
    let mut probes_run = 0;

    for (index, probe) in probes.iter().enumerate() {
        state = transition(target, state, EngineState::Probing(index));

        let result = probe.run(target, timeout).await;
        probes_run += 1;

        if result.matched {
            transition(target, state, EngineState::Matched);
            info!(
                target = %target,
                probe = %result.probe_id,
                evidence = result.evidence.as_deref().unwrap_or(""),
                "Target identified"
            );
            return Verdict {
                target: target.clone(),
                detected: true,
                evidence: result.evidence,
                matched_probe: Some(result.probe_id),
                probes_run,
                errors,
            };
        }

        if let Some(failure) = result.error {
            errors.push(failure);
        }
    }

    transition(target, state, EngineState::Exhausted);
    Verdict::negative(target.clone(), probes_run, errors)
}

fn transition(target: &Target, from: EngineState, to: EngineState) -> EngineState {
    debug!(target = %target, from = ?from, to = ?to, "Engine transition");
    to
}
