/*
 * Copyright (c) 2023, Stalwart Labs Ltd.
 *
 * Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
 * https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
 * <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
 * option. This file may not be copied, modified, or distributed
 * except according to those terms.
 */

//! Maps structured outcomes to confidence scores in `[0, 100]`. Every
//! function is pure; composing the per-mechanism scores into one
//! deliverability number is the caller's policy, not this crate's. The ARC
//! verdict is advisory context and deliberately carries no score.

use crate::{AuthOutcome, AuthResult, AuthenticationBundle, DkimRecord, Scores};

pub fn spf(outcome: &AuthOutcome) -> u8 {
    match &outcome.result {
        AuthResult::Pass => 100,
        AuthResult::Neutral | AuthResult::None => 50,
        AuthResult::SoftFail => 17,
        _ => 0,
    }
}

/// One message may carry several DKIM signatures; a mix of passing and
/// failing signatures is worth less than unanimity.
pub fn dkim(outcomes: &[AuthOutcome]) -> u8 {
    if outcomes.is_empty() {
        return 0;
    }
    let passed = outcomes
        .iter()
        .filter(|outcome| outcome.result == AuthResult::Pass)
        .count();
    if passed == outcomes.len() {
        100
    } else if passed > 0 {
        90
    } else {
        20
    }
}

/// Scores the publishing side of DKIM independently of signature verdicts.
pub fn dkim_records(records: &[DkimRecord]) -> u8 {
    if records.is_empty() {
        0
    } else if records.iter().any(|record| record.valid) {
        100
    } else {
        25
    }
}

pub fn aligned_from(outcome: Option<&AuthOutcome>) -> u8 {
    match outcome {
        Some(outcome) if outcome.result == AuthResult::Pass => 100,
        _ => 0,
    }
}

impl Scores {
    /// The per-mechanism score vector handed to the surrounding pipeline.
    pub fn from_bundle(bundle: &AuthenticationBundle) -> Self {
        Scores {
            spf: bundle.spf.as_ref().map(spf),
            dkim: dkim(&bundle.dkim),
            dkim_records: dkim_records(&bundle.dkim_records),
            aligned_from: aligned_from(bundle.aligned_from.as_ref()),
        }
    }
}
