/*
 * Copyright (c) 2023, Stalwart Labs Ltd.
 *
 * Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
 * https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
 * <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
 * option. This file may not be copied, modified, or distributed
 * except according to those terms.
 */

use async_trait::async_trait;
use trust_dns_resolver::{
    config::{ResolverConfig, ResolverOpts},
    error::{ResolveError, ResolveErrorKind},
    proto::rr::RecordType,
    system_conf::read_system_conf,
    AsyncResolver, TokioAsyncResolver,
};

use crate::Error;

use super::lru::TxtCache;

/// DNS capability the analysis engine depends on. Implementations own any
/// pooling, retry or caching policy; the engine issues one logical query per
/// check and never retries.
#[async_trait]
pub trait Resolver: Send + Sync {
    /// TXT records published at `name`, one string per record with its
    /// character-strings joined without separators.
    async fn lookup_txt(&self, name: &str) -> crate::Result<Vec<String>>;

    /// Whether answers for `name` carry a validated DNSSEC chain of trust.
    /// Must never report `true` for a name that cannot be resolved.
    async fn is_authenticated(&self, name: &str) -> crate::Result<bool>;
}

/// Lower-cases a domain and appends the root dot, so that `example.org` and
/// `example.org.` reach the resolver as the same name.
pub(crate) fn to_fqdn(name: &str) -> String {
    let name = name.to_lowercase();
    if name.ends_with('.') {
        name
    } else {
        format!("{name}.")
    }
}

/// DNSSEC-validating resolver backed by trust-dns, with a TTL-bounded cache
/// for raw TXT answers.
pub struct DnssecResolver {
    resolver: TokioAsyncResolver,
    cache_txt: TxtCache,
}

impl DnssecResolver {
    pub fn new_cloudflare() -> Result<Self, ResolveError> {
        Self::with_capacity(ResolverConfig::cloudflare(), ResolverOpts::default(), 128)
    }

    pub fn new_cloudflare_tls() -> Result<Self, ResolveError> {
        Self::with_capacity(
            ResolverConfig::cloudflare_tls(),
            ResolverOpts::default(),
            128,
        )
    }

    pub fn new_google() -> Result<Self, ResolveError> {
        Self::with_capacity(ResolverConfig::google(), ResolverOpts::default(), 128)
    }

    pub fn new_quad9() -> Result<Self, ResolveError> {
        Self::with_capacity(ResolverConfig::quad9(), ResolverOpts::default(), 128)
    }

    pub fn new_system_conf() -> Result<Self, ResolveError> {
        let (config, options) = read_system_conf()?;
        Self::with_capacity(config, options, 128)
    }

    pub fn with_capacity(
        config: ResolverConfig,
        mut options: ResolverOpts,
        capacity: usize,
    ) -> Result<Self, ResolveError> {
        options.validate = true;
        Ok(Self {
            resolver: AsyncResolver::tokio(config, options)?,
            cache_txt: TxtCache::with_capacity(capacity),
        })
    }
}

#[async_trait]
impl Resolver for DnssecResolver {
    async fn lookup_txt(&self, name: &str) -> crate::Result<Vec<String>> {
        let name = to_fqdn(name);
        if let Some(answers) = self.cache_txt.get(&name) {
            return Ok(answers);
        }

        let txt_lookup = self.resolver.txt_lookup(name.as_str()).await?;
        let answers = txt_lookup
            .as_lookup()
            .record_iter()
            .filter_map(|record| {
                let txt_data = record.data()?.as_txt()?.txt_data();
                let mut entry = Vec::with_capacity(255 * txt_data.len());
                for data in txt_data {
                    entry.extend_from_slice(data);
                }
                String::from_utf8(entry).ok()
            })
            .collect::<Vec<_>>();

        Ok(self
            .cache_txt
            .insert(name, answers, txt_lookup.valid_until()))
    }

    async fn is_authenticated(&self, name: &str) -> crate::Result<bool> {
        let name = to_fqdn(name);
        match self.resolver.lookup(name.as_str(), RecordType::DNSKEY).await {
            Ok(lookup) => Ok(lookup
                .record_iter()
                .any(|record| {
                    record
                        .data()
                        .map_or(false, |data| data.to_record_type() == RecordType::DNSKEY)
                })),
            Err(err) => {
                if matches!(err.kind(), ResolveErrorKind::NoRecordsFound { .. }) {
                    Ok(false)
                } else {
                    log::debug!("DNSKEY lookup for {name} failed: {err}");
                    Err(err.into())
                }
            }
        }
    }
}

impl From<ResolveError> for Error {
    fn from(err: ResolveError) -> Self {
        match err.kind() {
            ResolveErrorKind::NoRecordsFound { response_code, .. } => {
                Error::DnsRecordNotFound(*response_code)
            }
            _ => Error::DnsError(err.to_string()),
        }
    }
}

#[cfg(any(test, feature = "test"))]
pub mod mock {
    use std::collections::HashMap;

    use async_trait::async_trait;
    use parking_lot::Mutex;
    use trust_dns_resolver::proto::op::ResponseCode;

    use super::{to_fqdn, Resolver};
    use crate::Error;

    /// Deterministic stand-in wired through the same capability trait as the
    /// production resolver. Unknown names answer NXDOMAIN.
    #[derive(Default)]
    pub struct MockResolver {
        txt: Mutex<HashMap<String, crate::Result<Vec<String>>>>,
        sec: Mutex<HashMap<String, bool>>,
    }

    impl MockResolver {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn txt_add(&self, name: impl Into<String>, answers: Vec<String>) {
            self.txt
                .lock()
                .insert(to_fqdn(&name.into()), Ok(answers));
        }

        pub fn txt_error(&self, name: impl Into<String>, error: Error) {
            self.txt.lock().insert(to_fqdn(&name.into()), Err(error));
        }

        pub fn sec_add(&self, name: impl Into<String>, authenticated: bool) {
            self.sec.lock().insert(to_fqdn(&name.into()), authenticated);
        }
    }

    #[async_trait]
    impl Resolver for MockResolver {
        async fn lookup_txt(&self, name: &str) -> crate::Result<Vec<String>> {
            self.txt
                .lock()
                .get(&to_fqdn(name))
                .cloned()
                .unwrap_or(Err(Error::DnsRecordNotFound(ResponseCode::NXDomain)))
        }

        async fn is_authenticated(&self, name: &str) -> crate::Result<bool> {
            Ok(self.sec.lock().get(&to_fqdn(name)).copied().unwrap_or(false))
        }
    }
}
