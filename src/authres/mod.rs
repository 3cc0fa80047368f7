/*
 * Copyright (c) 2023, Stalwart Labs Ltd.
 *
 * Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
 * https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
 * <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
 * option. This file may not be copied, modified, or distributed
 * except according to those terms.
 */

pub mod parse;

use crate::{
    common::{message::InspectedMessage, parse::starts_with_key},
    ArcOutcome, AuthenticationBundle,
};

impl AuthenticationBundle {
    /// Gathers every authentication outcome a message claims. Each
    /// `Authentication-Results` value is split into its `;`-delimited
    /// mechanism substrings; the legacy `Received-SPF` header is consulted
    /// only when no `spf=` token exists, and the ARC verdict is enhanced
    /// against the actual chain headers.
    ///
    /// When `authserv_id` is given, only `Authentication-Results` headers
    /// stamped with that identity are trusted; `None` trusts all of them.
    /// DNS-backed evidence (`dkim_records`) is left for the caller to attach.
    pub fn scan(message: &InspectedMessage<'_>, authserv_id: Option<&str>) -> Self {
        let mut bundle = AuthenticationBundle::default();

        for header in message.authentication_results() {
            if let Some(id) = authserv_id {
                let stamped = header
                    .split(';')
                    .next()
                    .and_then(|leader| leader.split_ascii_whitespace().next())
                    .unwrap_or_default();
                if !stamped.eq_ignore_ascii_case(id) {
                    continue;
                }
            }

            for segment in header.split(';') {
                bundle.add_mechanism(segment.trim());
            }
        }

        if bundle.spf.is_none() {
            bundle.spf = parse::received_spf(message);
        }

        match &mut bundle.arc {
            Some(outcome) => outcome.enhance(message),
            None => bundle.arc = ArcOutcome::from_chain(message),
        }

        bundle
    }

    /// The first claim wins for single-valued mechanisms; a message may carry
    /// any number of DKIM signatures.
    fn add_mechanism(&mut self, segment: &str) {
        if starts_with_key(segment, "spf=") {
            if self.spf.is_none() {
                self.spf = parse::spf(segment).into();
            }
        } else if starts_with_key(segment, "dkim=") {
            self.dkim.push(parse::dkim(segment));
        } else if starts_with_key(segment, "dmarc=") {
            if self.dmarc.is_none() {
                self.dmarc = parse::dmarc(segment).into();
            }
        } else if starts_with_key(segment, "arc=") {
            if self.arc.is_none() {
                self.arc = ArcOutcome::from(&parse::arc(segment)).into();
            }
        } else if starts_with_key(segment, "x-aligned-from=") {
            if self.aligned_from.is_none() {
                self.aligned_from = parse::aligned_from(segment).into();
            }
        }
    }
}
