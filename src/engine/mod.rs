// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Engine Module
 * Fingerprinting state machine shared by every service profile
 *
 * © 2026 Bountyy Oy
 */

pub mod fingerprint;

pub use fingerprint::{identify, EngineState, FingerprintEngine};
