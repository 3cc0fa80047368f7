/*
 * Copyright (c) 2023, Stalwart Labs Ltd.
 *
 * Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
 * https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
 * <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
 * option. This file may not be copied, modified, or distributed
 * except according to those terms.
 */

use std::time::Duration;

use crate::{
    common::resolver::{to_fqdn, Resolver},
    DkimRecord, Error,
};

use super::domain_key;

/// Looks up and structurally validates the DKIM key published at
/// `<selector>._domainkey.<domain>`. Resolution failures and timeouts are
/// reported on the returned record, never raised; multi-string TXT answers
/// are joined without separators before validation.
pub async fn check_record(
    resolver: &dyn Resolver,
    domain: &str,
    selector: &str,
    timeout: Duration,
) -> DkimRecord {
    let name = domain_key(selector, domain);
    let answers = match tokio::time::timeout(timeout, resolver.lookup_txt(&name)).await {
        Ok(Ok(answers)) => answers,
        Ok(Err(err)) => {
            log::debug!("TXT lookup for {name} failed: {err}");
            return DkimRecord::lookup_failed(selector, domain, err.to_string());
        }
        Err(_) => {
            log::debug!("TXT lookup for {name} timed out");
            return DkimRecord::lookup_failed(selector, domain, Error::Timeout.to_string());
        }
    };

    if answers.is_empty() {
        return DkimRecord::lookup_failed(selector, domain, "No DKIM record found");
    }

    let record = answers.concat();
    let valid = is_well_formed(&record);
    DkimRecord {
        selector: selector.to_string(),
        domain: domain.to_string(),
        record: record.into(),
        valid,
        error: if valid {
            None
        } else {
            Some("DKIM record appears malformed".to_string())
        },
    }
}

/// Whether DNS answers for `domain` arrive with a validated DNSSEC chain of
/// trust. Names are normalized first, so the trailing-dot and bare forms of
/// a domain report identically.
pub async fn is_dnssec_authenticated(
    resolver: &dyn Resolver,
    domain: &str,
    timeout: Duration,
) -> crate::Result<bool> {
    let name = to_fqdn(domain);
    match tokio::time::timeout(timeout, resolver.is_authenticated(&name)).await {
        Ok(result) => result,
        Err(_) => Err(Error::Timeout),
    }
}

/// A published key must carry a `p=` tag (an empty value means the key was
/// revoked, which still counts as published) and, when versioned, exactly
/// `v=DKIM1`. Everything else is ignored.
fn is_well_formed(record: &str) -> bool {
    let mut has_key = false;
    for tag in record.split(';') {
        if let Some((key, value)) = tag.split_once('=') {
            if key.trim().eq_ignore_ascii_case("p") {
                has_key = true;
            } else if key.trim().eq_ignore_ascii_case("v") && value.trim() != "DKIM1" {
                return false;
            }
        }
    }
    has_key
}
