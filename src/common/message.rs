/*
 * Copyright (c) 2023, Stalwart Labs Ltd.
 *
 * Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
 * https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
 * <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
 * option. This file may not be copied, modified, or distributed
 * except according to those terms.
 */

use std::str;

use mail_parser::Message;

/// Borrowed view of one message's header block: case-insensitive,
/// multi-valued lookup preserving receipt order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InspectedMessage<'x> {
    pub(crate) headers: Vec<(&'x str, &'x str)>,
}

pub(crate) const AUTH_RESULTS: &str = "Authentication-Results";
pub(crate) const RECEIVED_SPF: &str = "Received-SPF";

impl<'x> InspectedMessage<'x> {
    /// Scans the header block of a raw RFC5322 message. Folded lines are kept
    /// with their field; headers that are not valid UTF-8 are skipped.
    /// Returns `None` when no header could be found at all.
    pub fn parse(raw_message: &'x [u8]) -> Option<Self> {
        let mut headers = Vec::new();
        let mut field: Option<(usize, usize)> = None;
        let mut offset = 0;

        for line in raw_message.split_inclusive(|&ch| ch == b'\n') {
            let start = offset;
            offset += line.len();

            let mut content = line;
            while let [rest @ .., b'\r' | b'\n'] = content {
                content = rest;
            }
            if content.is_empty() {
                // End of the header block
                break;
            }

            if matches!(content.first(), Some(b' ' | b'\t')) {
                if let Some((_, end)) = &mut field {
                    *end = start + line.len();
                }
                continue;
            }

            if let Some(span) = field.replace((start, start + line.len())) {
                push_header(raw_message, span, &mut headers);
            }
        }

        if let Some(span) = field {
            push_header(raw_message, span, &mut headers);
        }

        if !headers.is_empty() {
            Some(InspectedMessage { headers })
        } else {
            None
        }
    }

    /// Builds the view from an already parsed message.
    pub fn from_parsed(parsed: &'x Message<'x>) -> Self {
        InspectedMessage {
            headers: parsed
                .headers()
                .iter()
                .filter_map(|header| {
                    header
                        .value
                        .as_text()
                        .map(|value| (header.name.as_str(), value))
                })
                .collect(),
        }
    }

    /// All values of `name` in receipt order, surrounding whitespace trimmed.
    pub fn header_values<'z>(&'z self, name: &'z str) -> impl Iterator<Item = &'x str> + 'z {
        self.headers.iter().filter_map(move |(header_name, value)| {
            if header_name.eq_ignore_ascii_case(name) {
                Some(value.trim())
            } else {
                None
            }
        })
    }

    pub fn authentication_results(&self) -> impl Iterator<Item = &'x str> + '_ {
        self.header_values(AUTH_RESULTS)
    }
}

fn push_header<'x>(
    raw_message: &'x [u8],
    (start, end): (usize, usize),
    headers: &mut Vec<(&'x str, &'x str)>,
) {
    let field = raw_message.get(start..end).unwrap_or_default();
    if let Some(colon) = field.iter().position(|&ch| ch == b':') {
        if let (Ok(name), Ok(value)) = (
            str::from_utf8(&field[..colon]),
            str::from_utf8(&field[colon + 1..]),
        ) {
            let name = name.trim();
            if !name.is_empty() {
                headers.push((name, value));
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::InspectedMessage;

    #[test]
    fn header_scan() {
        let message = concat!(
            "From: a\r\n",
            "Authentication-Results: mx.example.org;\r\n",
            "\tspf=pass smtp.mailfrom=a@example.org\r\n",
            "authentication-results: other.example.org; dkim=none\r\n",
            "Received-SPF: pass (mx.example.org: domain of a@example.org)\r\n",
            "Subject: b\r\n",
            "\r\n",
            "Authentication-Results: ignored.example.org; spf=fail\r\n",
        );
        let message = InspectedMessage::parse(message.as_bytes()).unwrap();

        assert_eq!(
            message.authentication_results().collect::<Vec<_>>(),
            [
                "mx.example.org;\r\n\tspf=pass smtp.mailfrom=a@example.org",
                "other.example.org; dkim=none"
            ]
        );
        assert_eq!(
            message.header_values("received-spf").collect::<Vec<_>>(),
            ["pass (mx.example.org: domain of a@example.org)"]
        );
        assert_eq!(message.header_values("subject").collect::<Vec<_>>(), ["b"]);
        assert_eq!(message.header_values("missing").count(), 0);
    }

    #[test]
    fn header_scan_edge_cases() {
        assert!(InspectedMessage::parse(b"").is_none());
        assert!(InspectedMessage::parse(b"\r\n\r\n").is_none());
        assert!(InspectedMessage::parse(b"no colon here\r\n\r\n").is_none());

        // No trailing newline on the last header
        let message = InspectedMessage::parse(b"A: 1\nB: 2").unwrap();
        assert_eq!(message.header_values("a").collect::<Vec<_>>(), ["1"]);
        assert_eq!(message.header_values("B").collect::<Vec<_>>(), ["2"]);

        // Duplicate headers keep receipt order
        let message = InspectedMessage::parse(b"X: first\nX: second\n\n").unwrap();
        assert_eq!(
            message.header_values("x").collect::<Vec<_>>(),
            ["first", "second"]
        );
    }
}
