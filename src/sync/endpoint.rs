// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Sync master endpoint descriptors.
//!
//! An endpoint is a set of URLs that address the same logical sync master.
//! Endpoints are compared by intersection rather than equality.

use crate::constants::syncmaster;
use crate::error::{OperatorError, Result};
use crate::types::EndpointSpec;
use serde::{Deserialize, Serialize};
use url::Url;

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct Endpoint(Vec<String>);

impl Endpoint {
    /// Build an endpoint from raw URLs. URLs are normalized and deduplicated, order is kept.
    pub fn new<I, S>(urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut normalized: Vec<String> = Vec::new();
        for url in urls {
            let url = normalize(url.as_ref());
            if !url.is_empty() && !normalized.contains(&url) {
                normalized.push(url);
            }
        }
        Endpoint(normalized)
    }

    /// Whether both endpoints share at least one URL
    pub fn intersects(&self, other: &Endpoint) -> bool {
        self.0.iter().any(|url| other.0.contains(url))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn urls(&self) -> &[String] {
        &self.0
    }
}

impl From<Vec<String>> for Endpoint {
    fn from(urls: Vec<String>) -> Self {
        Endpoint::new(urls)
    }
}

impl From<Endpoint> for Vec<String> {
    fn from(endpoint: Endpoint) -> Self {
        endpoint.0
    }
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.0.join(", "))
    }
}

/// Normalize a URL so that equivalent spellings compare equal
fn normalize(raw: &str) -> String {
    let raw = raw.trim();
    match Url::parse(raw) {
        Ok(url) => {
            let host = url.host_str().unwrap_or_default().to_ascii_lowercase();
            let port = url.port().map(|p| format!(":{}", p)).unwrap_or_default();
            let path = url.path().trim_end_matches('/');
            format!("{}://{}{}{}", url.scheme(), host, port, path)
        }
        Err(_) => raw.trim_end_matches('/').to_ascii_lowercase(),
    }
}

/// Resolve the endpoint a spec refers to.
///
/// A referenced deployment contributes the URL of its sync master service,
/// explicit master endpoints are appended after it.
pub fn resolve_endpoint(namespace: &str, spec: &EndpointSpec) -> Result<Endpoint> {
    let mut urls: Vec<String> = Vec::new();

    if let Some(name) = spec.deployment_name.as_deref().filter(|n| !n.is_empty()) {
        urls.push(format!(
            "https://{}{}.{}.svc:{}",
            name,
            syncmaster::SERVICE_SUFFIX,
            namespace,
            syncmaster::PORT
        ));
    }
    urls.extend(spec.master_endpoint.iter().cloned());

    let endpoint = Endpoint::new(urls);
    if endpoint.is_empty() {
        return Err(OperatorError::EndpointError(
            "neither deploymentName nor masterEndpoint is set".to_string(),
        ));
    }
    Ok(endpoint)
}
