/*
 * Copyright (c) 2023, Stalwart Labs Ltd.
 *
 * Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
 * https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
 * <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
 * option. This file may not be copied, modified, or distributed
 * except according to those terms.
 */

use crate::{
    common::{message::InspectedMessage, parse::instance_number},
    ArcOutcome, ArcResult,
};

pub(crate) const ARC_AUTH_RESULTS: &str = "ARC-Authentication-Results";
pub(crate) const ARC_MESSAGE_SIGNATURE: &str = "ARC-Message-Signature";
pub(crate) const ARC_SEAL: &str = "ARC-Seal";

const MAX_CHAIN: usize = 50;

impl ArcOutcome {
    /// Structurally validates the ARC chain of a message. Returns `None` when
    /// the message carries no ARC material at all, which is distinct from a
    /// `none` verdict over headers that yielded zero seals.
    pub fn from_chain(message: &InspectedMessage<'_>) -> Option<Self> {
        let seals = message.header_values(ARC_SEAL).collect::<Vec<_>>();
        let signatures = message
            .header_values(ARC_MESSAGE_SIGNATURE)
            .collect::<Vec<_>>();
        let results = message.header_values(ARC_AUTH_RESULTS).collect::<Vec<_>>();

        if seals.is_empty() && signatures.is_empty() && results.is_empty() {
            return None;
        }

        let mut outcome = ArcOutcome::default();
        outcome.validate(&seals, &signatures, &results);
        outcome.into()
    }

    /// Backfills `chain_length` and `chain_valid` on an outcome extracted
    /// from an `arc=` token. Fields already set are never overwritten.
    pub fn enhance(&mut self, message: &InspectedMessage<'_>) {
        if self.chain_length.is_some() && self.chain_valid.is_some() {
            return;
        }

        let seals = message.header_values(ARC_SEAL).collect::<Vec<_>>();
        let signatures = message
            .header_values(ARC_MESSAGE_SIGNATURE)
            .collect::<Vec<_>>();
        let results = message.header_values(ARC_AUTH_RESULTS).collect::<Vec<_>>();
        self.validate(&seals, &signatures, &results);
    }

    /// One seal per intermediary hop determines the chain length. A chain is
    /// valid when the three header groups have equal cardinality and the
    /// instance tags of each group cover exactly `1..=length`.
    fn validate(&mut self, seals: &[&str], signatures: &[&str], results: &[&str]) {
        let length = *self.chain_length.get_or_insert(seals.len());
        if self.chain_valid.is_some() {
            return;
        }

        if length == 0 {
            // Vacuously valid, and never a failure
            self.chain_valid = true.into();
            self.result = ArcResult::None;
            return;
        }

        let valid = length <= MAX_CHAIN
            && covers_instances(seals, length)
            && covers_instances(signatures, length)
            && covers_instances(results, length);
        self.chain_valid = valid.into();

        if !valid {
            self.result = ArcResult::Fail;
            self.details = format!("invalid chain of length {length}");
        } else if self.result != ArcResult::Fail {
            self.result = ArcResult::Pass;
            self.details = format!(
                "{length} intermediar{}",
                if length == 1 { "y" } else { "ies" }
            );
        }
    }
}

fn covers_instances(group: &[&str], length: usize) -> bool {
    if group.len() != length {
        return false;
    }
    let mut seen = vec![false; length];
    for header in group {
        match instance_number(header) {
            Some(instance) if (1..=length as u32).contains(&instance) => {
                let slot = &mut seen[instance as usize - 1];
                if *slot {
                    return false;
                }
                *slot = true;
            }
            _ => return false,
        }
    }
    true
}
