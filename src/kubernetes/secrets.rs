// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! TLS and basic-auth material for sync masters, read from Kubernetes secrets

use crate::constants::syncmaster;
use crate::error::{OperatorError, Result};
use crate::sync::client::TlsAuthentication;
use crate::types::replication::DeploymentReplicationSpec;
use crate::types::EndpointSpec;
use k8s_openapi::api::core::v1::Secret;
use kube::{Api, Client};
use tracing::{debug, instrument};

/// Client certificate chain and private key taken from a keyfile secret
#[derive(Clone, PartialEq, Eq)]
pub struct Keyfile {
    /// Certificate chain followed by the key
    pub pem: String,
    pub certificate: String,
    pub key: String,
}

impl std::fmt::Debug for Keyfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Keyfile").finish_non_exhaustive()
    }
}

#[derive(Clone)]
pub struct BasicAuth {
    pub username: String,
    pub password: String,
}

/// Reads credential secrets referenced by endpoint specs
#[derive(Clone)]
pub struct SecretCredentials {
    client: Client,
}

impl SecretCredentials {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// CA certificate the endpoint's TLS certificate is verified against, if configured
    pub async fn ca_certificate(&self, namespace: &str, spec: &EndpointSpec) -> Result<Option<String>> {
        match spec.tls.ca_secret_name.as_deref() {
            Some(name) => Ok(Some(
                self.secret_value(namespace, name, syncmaster::CA_CERT_KEY).await?,
            )),
            None => Ok(None),
        }
    }

    /// Client keyfile used to authenticate against the endpoint, if configured
    pub async fn keyfile(&self, namespace: &str, spec: &EndpointSpec) -> Result<Option<Keyfile>> {
        match spec.auth.keyfile_secret_name.as_deref() {
            Some(name) => {
                let pem = self.secret_value(namespace, name, syncmaster::KEYFILE_KEY).await?;
                parse_keyfile(&pem).map(Some)
            }
            None => Ok(None),
        }
    }

    /// Username and password used to authenticate against the endpoint, if configured
    pub async fn basic_auth(&self, namespace: &str, spec: &EndpointSpec) -> Result<Option<BasicAuth>> {
        match spec.auth.user_secret_name.as_deref() {
            Some(name) => Ok(Some(BasicAuth {
                username: self.secret_value(namespace, name, syncmaster::USERNAME_KEY).await?,
                password: self.secret_value(namespace, name, syncmaster::PASSWORD_KEY).await?,
            })),
            None => Ok(None),
        }
    }

    /// Material the destination needs to connect to the source: the source
    /// keyfile as client identity and the source CA.
    #[instrument(skip(self, spec))]
    pub async fn tls_authentication(
        &self,
        namespace: &str,
        spec: &DeploymentReplicationSpec,
    ) -> Result<TlsAuthentication> {
        let keyfile = self.keyfile(namespace, &spec.source).await?.ok_or_else(|| {
            OperatorError::CredentialsError("source.auth.keyfileSecretName is not set".to_string())
        })?;
        let ca_certificate = self
            .ca_certificate(namespace, &spec.source)
            .await?
            .ok_or_else(|| {
                OperatorError::CredentialsError("source.tls.caSecretName is not set".to_string())
            })?;

        Ok(TlsAuthentication {
            client_certificate: keyfile.certificate,
            client_key: keyfile.key,
            ca_certificate,
        })
    }

    async fn secret_value(&self, namespace: &str, secret_name: &str, key: &str) -> Result<String> {
        let secrets: Api<Secret> = Api::namespaced(self.client.clone(), namespace);

        debug!("Reading key '{}' of secret '{}/{}'", key, namespace, secret_name);

        let secret = secrets.get(secret_name).await.map_err(|e| {
            OperatorError::CredentialsError(format!(
                "Failed to get secret {}/{}: {}",
                namespace, secret_name, e
            ))
        })?;

        let Some(data) = secret.data.as_ref() else {
            return Err(OperatorError::CredentialsError(format!(
                "Secret {}/{} has no data",
                namespace, secret_name
            )));
        };

        let Some(value) = data.get(key) else {
            return Err(OperatorError::CredentialsError(format!(
                "Secret {}/{} does not contain '{}' key",
                namespace, secret_name, key
            )));
        };

        String::from_utf8(value.0.clone()).map_err(|e| {
            OperatorError::CredentialsError(format!(
                "Failed to decode '{}' of secret {}/{}: {}",
                key, namespace, secret_name, e
            ))
        })
    }
}

/// Split a PEM keyfile into its certificate chain and private key
pub fn parse_keyfile(keyfile: &str) -> Result<Keyfile> {
    let blocks = pem::parse_many(keyfile.as_bytes())
        .map_err(|e| OperatorError::CredentialsError(format!("failed to parse keyfile: {}", e)))?;

    let mut certificate = String::new();
    let mut key = String::new();

    for block in &blocks {
        if block.tag() == "CERTIFICATE" {
            certificate.push_str(&encode_block(block));
        } else if block.tag().ends_with("PRIVATE KEY") && key.is_empty() {
            key = encode_block(block);
        }
    }

    if certificate.is_empty() || key.is_empty() {
        return Err(OperatorError::CredentialsError(
            "keyfile must contain a certificate and a private key".to_string(),
        ));
    }

    Ok(Keyfile {
        pem: format!("{}{}", certificate, key),
        certificate,
        key,
    })
}

fn encode_block(block: &pem::Pem) -> String {
    pem::encode_config(block, pem::EncodeConfig::new().set_line_ending(pem::LineEnding::LF))
}
