/*
 * Copyright (c) 2023, Stalwart Labs Ltd.
 *
 * Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
 * https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
 * <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
 * option. This file may not be copied, modified, or distributed
 * except according to those terms.
 */

#![no_main]
use libfuzzer_sys::fuzz_target;

use mail_trust::{
    authres::parse, common::message::InspectedMessage, ArcOutcome, AuthenticationBundle,
};

static RFC822_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz:;=@.- \r\n";

fuzz_target!(|data: &[u8]| {
    let data_rfc822 = into_alphabet(data, RFC822_ALPHABET);

    for raw in [data, &data_rfc822[..]] {
        if let Some(message) = InspectedMessage::parse(raw) {
            AuthenticationBundle::scan(&message, None);
            AuthenticationBundle::scan(&message, Some("mx.example.org"));
            parse::received_spf(&message);
            if let Some(mut outcome) = ArcOutcome::from_chain(&message) {
                outcome.enhance(&message);
            }
        }

        if let Ok(text) = std::str::from_utf8(raw) {
            parse::spf(text);
            parse::dkim(text);
            parse::dmarc(text);
            parse::arc(text);
            parse::aligned_from(text);
        }
    }
});

fn into_alphabet(data: &[u8], alphabet: &[u8]) -> Vec<u8> {
    data.iter()
        .map(|&byte| alphabet[byte as usize % alphabet.len()])
        .collect()
}
