//! Scanning helpers shared by the header-field extractors. Tag keys are
//! matched case-insensitively at token boundaries; values are returned
//! verbatim.

/// Returns the value following `key` (which must include the trailing `=`),
/// up to the next whitespace or `;`. The key must start the input or follow
/// whitespace or `;`, so `d=` does not match inside `header.d=`.
pub(crate) fn tag_value<'x>(input: &'x str, key: &str) -> Option<&'x str> {
    let start = find_tag(input, key)? + key.len();
    let value = &input[start..];
    let end = value
        .find(|ch: char| ch.is_ascii_whitespace() || ch == ';')
        .unwrap_or(value.len());
    Some(&value[..end])
}

/// Strips a leading `prefix` case-insensitively; a no-op when absent.
/// Keys and prefixes are ASCII, so a match always ends on a char boundary.
pub(crate) fn strip_prefix<'x>(input: &'x str, prefix: &str) -> &'x str {
    if starts_with_key(input, prefix) {
        &input[prefix.len()..]
    } else {
        input
    }
}

/// Whether a mechanism substring opens with `key` (case-insensitive).
pub(crate) fn starts_with_key(input: &str, key: &str) -> bool {
    let input = input.as_bytes();
    input.len() >= key.len() && input[..key.len()].eq_ignore_ascii_case(key.as_bytes())
}

/// Extracts the `i=` instance tag of an ARC header as an integer.
pub(crate) fn instance_number(header: &str) -> Option<u32> {
    for tag in header.split(';') {
        if let Some((key, value)) = tag.split_once('=') {
            if key.trim().eq_ignore_ascii_case("i") {
                return value.trim().parse().ok();
            }
        }
    }
    None
}

fn find_tag(input: &str, key: &str) -> Option<usize> {
    let bytes = input.as_bytes();
    let key = key.as_bytes();
    let mut boundary = true;
    for (pos, &ch) in bytes.iter().enumerate() {
        if boundary
            && bytes.len() - pos >= key.len()
            && bytes[pos..pos + key.len()].eq_ignore_ascii_case(key)
        {
            return Some(pos);
        }
        boundary = ch.is_ascii_whitespace() || ch == b';';
    }
    None
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn tag_values() {
        for (input, key, expected) in [
            ("spf=pass smtp.mailfrom=a@b.org", "spf=", Some("pass")),
            ("spf=pass smtp.mailfrom=a@b.org", "smtp.mailfrom=", Some("a@b.org")),
            ("dkim=pass header.d=Example.COM;", "header.d=", Some("Example.COM")),
            ("dkim=pass header.d=a.org header.s=k1", "d=", None),
            ("dkim=neutral d=a.org", "d=", Some("a.org")),
            ("DKIM=Pass header.d=a.org", "dkim=", Some("Pass")),
            ("arc=none", "arc=", Some("none")),
            ("spf=", "spf=", Some("")),
            ("nothing here", "spf=", None),
            // Non-ASCII input is tolerated, never a panic
            ("héader spf=pass", "spf=", Some("pass")),
            ("€€", "spf=", None),
        ] {
            assert_eq!(tag_value(input, key), expected, "{input:?} {key:?}");
        }
    }

    #[test]
    fn instance_numbers() {
        assert_eq!(instance_number("i=1; a=rsa-sha256; d=a.org"), Some(1));
        assert_eq!(instance_number("a=rsa-sha256; i = 17 ; d=a.org"), Some(17));
        assert_eq!(instance_number("a=rsa-sha256; d=a.org"), None);
        assert_eq!(instance_number("i=zero"), None);
        assert_eq!(instance_number(""), None);
    }

    #[test]
    fn prefix_strip() {
        assert_eq!(strip_prefix("spf=pass more", "spf="), "pass more");
        assert_eq!(strip_prefix("SPF=pass", "spf="), "pass");
        assert_eq!(strip_prefix("received", "spf="), "received");
        assert_eq!(strip_prefix("", "spf="), "");
    }
}
