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
    common::{
        message::{InspectedMessage, RECEIVED_SPF},
        parse::{strip_prefix, tag_value},
    },
    AuthOutcome, AuthResult, Mechanism,
};

/// Extracts an SPF outcome from one `spf=...` mechanism substring of an
/// Authentication-Results header.
pub fn spf(input: &str) -> AuthOutcome {
    AuthOutcome {
        mechanism: Mechanism::Spf,
        result: result_code(input, "spf="),
        domain: tag_value(input, "smtp.mailfrom=").and_then(domain_of),
        selector: None,
        details: strip_prefix(input, "spf=").to_string(),
    }
}

/// Extracts a DKIM outcome from one `dkim=...` mechanism substring. The
/// signing domain and selector come from `header.d=`/`header.s=`, with the
/// bare `d=`/`s=` forms accepted as fallback.
pub fn dkim(input: &str) -> AuthOutcome {
    AuthOutcome {
        mechanism: Mechanism::Dkim,
        result: result_code(input, "dkim="),
        domain: tag_value(input, "header.d=")
            .or_else(|| tag_value(input, "d="))
            .and_then(non_empty),
        selector: tag_value(input, "header.s=")
            .or_else(|| tag_value(input, "s="))
            .and_then(non_empty),
        details: strip_prefix(input, "dkim=").to_string(),
    }
}

/// Extracts a DMARC outcome from one `dmarc=...` mechanism substring.
pub fn dmarc(input: &str) -> AuthOutcome {
    AuthOutcome {
        mechanism: Mechanism::Dmarc,
        result: result_code(input, "dmarc="),
        domain: tag_value(input, "header.from=")
            .or_else(|| tag_value(input, "from="))
            .and_then(non_empty),
        selector: None,
        details: strip_prefix(input, "dmarc=").to_string(),
    }
}

/// Extracts the chain verdict from one `arc=...` mechanism substring.
pub fn arc(input: &str) -> AuthOutcome {
    AuthOutcome {
        mechanism: Mechanism::Arc,
        result: result_code(input, "arc="),
        domain: None,
        selector: None,
        details: strip_prefix(input, "arc=").to_string(),
    }
}

/// Extracts an aligned-from outcome. The whole substring is kept as detail.
pub fn aligned_from(input: &str) -> AuthOutcome {
    AuthOutcome {
        mechanism: Mechanism::AlignedFrom,
        result: result_code(input, "x-aligned-from="),
        domain: None,
        selector: None,
        details: input.to_string(),
    }
}

/// Fallback for messages that only carry the legacy `Received-SPF` header.
/// Returns `None` when the header is absent or empty; the full header value
/// is preserved untouched as detail.
pub fn received_spf(message: &InspectedMessage<'_>) -> Option<AuthOutcome> {
    let value = message.header_values(RECEIVED_SPF).next()?;
    let code = value.split_ascii_whitespace().next()?;

    AuthOutcome {
        mechanism: Mechanism::Spf,
        result: AuthResult::parse(code),
        domain: tag_value(value, "envelope-from=")
            .or_else(|| tag_value(value, "sender="))
            .and_then(domain_of),
        selector: None,
        details: value.to_string(),
    }
    .into()
}

fn result_code(input: &str, key: &str) -> AuthResult {
    tag_value(input, key)
        .map(AuthResult::parse)
        .unwrap_or(AuthResult::Other(String::new()))
}

/// Domain part of an email-like value, quotes stripped. Values without `@`
/// or with nothing after it yield no domain.
fn domain_of(value: &str) -> Option<String> {
    value
        .trim_matches('"')
        .rsplit_once('@')
        .map(|(_, domain)| domain.to_string())
        .filter(|domain| !domain.is_empty())
}

fn non_empty(value: &str) -> Option<String> {
    if !value.is_empty() {
        Some(value.to_string())
    } else {
        None
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::common::message::InspectedMessage;

    #[test]
    fn spf_extraction() {
        let outcome = spf("spf=pass smtp.mailfrom=sender@example.com");
        assert_eq!(outcome.mechanism, Mechanism::Spf);
        assert_eq!(outcome.result, AuthResult::Pass);
        assert_eq!(outcome.domain.as_deref(), Some("example.com"));
        assert_eq!(outcome.selector, None);
        assert_eq!(outcome.details, "pass smtp.mailfrom=sender@example.com");

        // Result codes fold case; the rest stays verbatim
        let outcome = spf("SPF=SoftFail smtp.mailfrom=a@Sub.Example.COM");
        assert_eq!(outcome.result, AuthResult::SoftFail);
        assert_eq!(outcome.domain.as_deref(), Some("Sub.Example.COM"));

        // No @ in the sender, no domain claim
        let outcome = spf("spf=neutral smtp.mailfrom=postmaster");
        assert_eq!(outcome.result, AuthResult::Neutral);
        assert_eq!(outcome.domain, None);

        let outcome = spf("unrelated text");
        assert_eq!(outcome.result, AuthResult::Other(String::new()));
        assert_eq!(outcome.domain, None);
        assert_eq!(outcome.details, "unrelated text");
    }

    #[test]
    fn dkim_extraction() {
        for (token, result, domain, selector) in [
            (
                "dkim=pass header.d=example.com header.s=sel1",
                AuthResult::Pass,
                Some("example.com"),
                Some("sel1"),
            ),
            (
                "dkim=fail header.d=example.com header.s=selector1",
                AuthResult::Fail,
                Some("example.com"),
                Some("selector1"),
            ),
            (
                "dkim=temperror d=example.org s=k2",
                AuthResult::TempError,
                Some("example.org"),
                Some("k2"),
            ),
            ("dkim=none", AuthResult::None, None, None),
            (
                "dkim=bogus-code header.d=example.com",
                AuthResult::Other("bogus-code".to_string()),
                Some("example.com"),
                None,
            ),
        ] {
            let outcome = dkim(token);
            assert_eq!(outcome.result, result, "{token}");
            assert_eq!(outcome.domain.as_deref(), domain, "{token}");
            assert_eq!(outcome.selector.as_deref(), selector, "{token}");
            assert_eq!(outcome.details, strip_prefix(token, "dkim="));
        }
    }

    #[test]
    fn dmarc_extraction() {
        let outcome = dmarc("dmarc=pass header.from=example.com");
        assert_eq!(outcome.result, AuthResult::Pass);
        assert_eq!(outcome.domain.as_deref(), Some("example.com"));
        assert_eq!(outcome.details, "pass header.from=example.com");
    }

    #[test]
    fn arc_extraction() {
        let outcome = arc("arc=pass");
        assert_eq!(outcome.result, AuthResult::Pass);
        assert_eq!(outcome.domain, None);
        assert_eq!(outcome.details, "pass");
    }

    #[test]
    fn aligned_from_keeps_token_verbatim() {
        let outcome = aligned_from("x-aligned-from=pass (From and SPF domains match)");
        assert_eq!(outcome.mechanism, Mechanism::AlignedFrom);
        assert_eq!(outcome.result, AuthResult::Pass);
        assert_eq!(
            outcome.details,
            "x-aligned-from=pass (From and SPF domains match)"
        );

        assert_eq!(aligned_from("x-aligned-from=fail").result, AuthResult::Fail);
    }

    #[test]
    fn legacy_received_spf() {
        let raw = concat!(
            "Received-SPF: Pass (mx.example.org: domain of a@example.org ",
            "designates 203.0.113.7 as permitted sender) ",
            "envelope-from=\"a@example.org\"; helo=mail.example.org;\r\n",
            "\r\n",
        );
        let message = InspectedMessage::parse(raw.as_bytes()).unwrap();
        let outcome = received_spf(&message).unwrap();
        assert_eq!(outcome.result, AuthResult::Pass);
        assert_eq!(outcome.domain.as_deref(), Some("example.org"));
        // Round-trip: the detail is the untouched header value
        assert_eq!(
            outcome.details,
            "Pass (mx.example.org: domain of a@example.org \
             designates 203.0.113.7 as permitted sender) \
             envelope-from=\"a@example.org\"; helo=mail.example.org;"
        );

        // sender= fallback, unquoted
        let raw = b"Received-SPF: softfail sender=b@example.net;\r\n\r\n";
        let outcome = received_spf(&InspectedMessage::parse(raw).unwrap()).unwrap();
        assert_eq!(outcome.result, AuthResult::SoftFail);
        assert_eq!(outcome.domain.as_deref(), Some("example.net"));

        // No sender claim at all: result still set, domain unset
        let raw = b"Received-SPF: none\r\n\r\n";
        let outcome = received_spf(&InspectedMessage::parse(raw).unwrap()).unwrap();
        assert_eq!(outcome.result, AuthResult::None);
        assert_eq!(outcome.domain, None);
        assert_eq!(outcome.details, "none");
    }

    #[test]
    fn legacy_received_spf_absent_or_empty() {
        let message = InspectedMessage::parse(b"From: a@example.org\r\n\r\n").unwrap();
        assert_eq!(received_spf(&message), None);

        let message = InspectedMessage::parse(b"Received-SPF: \r\n\r\n").unwrap();
        assert_eq!(received_spf(&message), None);
    }
}
