/*
 * Copyright (c) 2023, Stalwart Labs Ltd.
 *
 * Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
 * https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
 * <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
 * option. This file may not be copied, modified, or distributed
 * except according to those terms.
 */

//! Analyzes the authentication evidence carried by inbound email messages
//! (`Authentication-Results`, legacy `Received-SPF` and the ARC header chain),
//! cross-checks DKIM key publication and DNSSEC presence against live DNS,
//! and maps every mechanism to a 0-100 confidence score.

use std::fmt::Display;

use serde::{Deserialize, Serialize};
use trust_dns_resolver::proto::op::ResponseCode;

pub mod arc;
pub mod authres;
pub mod common;
pub mod dkim;
pub mod score;

/// Authentication mechanism an outcome was extracted for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Mechanism {
    Spf,
    Dkim,
    Dmarc,
    Arc,
    AlignedFrom,
}

/// Result code claimed by a mechanism token. Codes that do not match any
/// RFC 8601 keyword are preserved verbatim in `Other`, never coerced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthResult {
    Pass,
    Fail,
    SoftFail,
    Neutral,
    None,
    TempError,
    PermError,
    Other(String),
}

/// One structured authentication outcome, as claimed by the message headers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthOutcome {
    pub mechanism: Mechanism,
    pub result: AuthResult,
    pub domain: Option<String>,
    pub selector: Option<String>,
    pub details: String,
}

/// All authentication evidence gathered from one message. Built while the
/// headers are scanned, read-only once handed to the scoring policy.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AuthenticationBundle {
    pub spf: Option<AuthOutcome>,
    pub dkim: Vec<AuthOutcome>,
    pub dmarc: Option<AuthOutcome>,
    pub aligned_from: Option<AuthOutcome>,
    pub arc: Option<ArcOutcome>,
    pub dkim_records: Vec<DkimRecord>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArcResult {
    Pass,
    Fail,
    #[default]
    None,
}

/// Structural verdict over a message's ARC chain. `chain_length` and
/// `chain_valid` are computed at most once and never overwritten.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ArcOutcome {
    pub result: ArcResult,
    pub chain_length: Option<usize>,
    pub chain_valid: Option<bool>,
    pub details: String,
}

/// Outcome of one `<selector>._domainkey.<domain>` TXT lookup. Created fresh
/// per lookup and immutable afterwards; never cached by this crate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DkimRecord {
    pub selector: String,
    pub domain: String,
    pub record: Option<String>,
    pub valid: bool,
    pub error: Option<String>,
}

/// Per-mechanism confidence scores in `[0, 100]`. `spf` is `None` when the
/// message carried no SPF evidence at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scores {
    pub spf: Option<u8>,
    pub dkim: u8,
    pub dkim_records: u8,
    pub aligned_from: u8,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    ParseError,
    DnsError(String),
    DnsRecordNotFound(ResponseCode),
    Timeout,
}

pub type Result<T> = std::result::Result<T, Error>;

impl AuthResult {
    /// Parses a result code case-insensitively. Unrecognized codes are kept
    /// lower-cased in `Other`.
    pub fn parse(code: &str) -> Self {
        match code.to_ascii_lowercase().as_str() {
            "pass" => AuthResult::Pass,
            "fail" => AuthResult::Fail,
            "softfail" => AuthResult::SoftFail,
            "neutral" => AuthResult::Neutral,
            "none" => AuthResult::None,
            "temperror" => AuthResult::TempError,
            "permerror" => AuthResult::PermError,
            other => AuthResult::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            AuthResult::Pass => "pass",
            AuthResult::Fail => "fail",
            AuthResult::SoftFail => "softfail",
            AuthResult::Neutral => "neutral",
            AuthResult::None => "none",
            AuthResult::TempError => "temperror",
            AuthResult::PermError => "permerror",
            AuthResult::Other(code) => code,
        }
    }
}

impl Display for AuthResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&AuthResult> for ArcResult {
    fn from(result: &AuthResult) -> Self {
        match result {
            AuthResult::Pass => ArcResult::Pass,
            AuthResult::None => ArcResult::None,
            _ => ArcResult::Fail,
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::ParseError => write!(f, "Parse error"),
            Error::DnsError(err) => write!(f, "DNS resolution error: {err}"),
            Error::DnsRecordNotFound(code) => write!(f, "DNS record not found: {code}"),
            Error::Timeout => write!(f, "DNS lookup timed out"),
        }
    }
}
