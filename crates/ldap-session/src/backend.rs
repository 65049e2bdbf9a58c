//! Seam between the session facade and the native protocol layer.

use crate::{
    config::DirectoryConfig,
    error::{Error, Result},
    policy::{self, Status},
    scope::SearchScope,
};
use ldap3::asn1::StructureTag;
use ldap3::{LdapConn, LdapConnSettings, LdapError, Scope, SearchOptions};
use native_tls::{Certificate, TlsConnector};
use std::fs;
use tracing::warn;

/// Fully resolved search request as issued on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SearchRequest {
    pub(crate) base: String,
    pub(crate) scope: SearchScope,
    pub(crate) filter: String,
    pub(crate) attributes: Vec<String>,
    pub(crate) attrs_only: bool,
}

/// Raw response of a search: entry tags in arrival order plus the final status.
#[derive(Debug, Clone)]
pub(crate) struct RawSearch {
    pub(crate) entries: Vec<StructureTag>,
    pub(crate) status: Status,
}

#[cfg_attr(test, mockall::automock)]
pub(crate) trait LdapSession: Send {
    fn simple_bind(&mut self, dn: &str, password: &str) -> std::result::Result<Status, LdapError>;
    fn search(&mut self, request: &SearchRequest) -> std::result::Result<RawSearch, LdapError>;
    fn unbind(&mut self) -> std::result::Result<(), LdapError>;
}

#[cfg_attr(test, mockall::automock)]
pub(crate) trait LdapConnector: Send + Sync {
    fn connect(&self, config: &DirectoryConfig) -> Result<Box<dyn LdapSession>>;
}

/// Connector backed by the synchronous `ldap3` client.
pub(crate) struct Ldap3Connector;

impl LdapConnector for Ldap3Connector {
    fn connect(&self, config: &DirectoryConfig) -> Result<Box<dyn LdapSession>> {
        let settings = build_ldap_settings(config)?;
        let conn =
            LdapConn::with_settings(settings, config.url()).map_err(policy::transport_failure)?;
        Ok(Box::new(Ldap3Session { inner: conn }))
    }
}

struct Ldap3Session {
    inner: LdapConn,
}

impl LdapSession for Ldap3Session {
    fn simple_bind(&mut self, dn: &str, password: &str) -> std::result::Result<Status, LdapError> {
        self.inner.simple_bind(dn, password).map(Status::from)
    }

    fn search(&mut self, request: &SearchRequest) -> std::result::Result<RawSearch, LdapError> {
        let options = SearchOptions::new()
            .sizelimit(0)
            .typesonly(request.attrs_only);
        let ldap3::SearchResult(entries, result) = self.inner.with_search_options(options).search(
            &request.base,
            wire_scope(request.scope),
            &request.filter,
            request.attributes.clone(),
        )?;
        Ok(RawSearch {
            entries: entries.into_iter().map(|entry| entry.0).collect(),
            status: result.into(),
        })
    }

    fn unbind(&mut self) -> std::result::Result<(), LdapError> {
        self.inner.unbind()
    }
}

/// Maps a scope onto the values `ldap3` can put on the wire.
///
/// `Children` goes out as a subtree search; the caller removes the base entry.
pub(crate) const fn wire_scope(scope: SearchScope) -> Scope {
    match scope {
        SearchScope::Base => Scope::Base,
        SearchScope::OneLevel => Scope::OneLevel,
        SearchScope::Subtree | SearchScope::Children => Scope::Subtree,
    }
}

fn build_ldap_settings(config: &DirectoryConfig) -> Result<LdapConnSettings> {
    let mut settings = LdapConnSettings::new().set_starttls(config.starttls());

    if !config.tls_verify() {
        warn!(url = config.url(), "TLS verification disabled for directory session");
        let connector = TlsConnector::builder()
            .danger_accept_invalid_certs(true)
            .build()
            .map_err(|err| {
                Error::Validation(format!("failed to construct TLS connector: {err}"))
            })?;
        settings = settings.set_connector(connector).set_no_tls_verify(true);
    } else if let Some(cert_path) = config.tls_ca_cert() {
        let pem = fs::read(cert_path).map_err(|err| {
            Error::Validation(format!(
                "failed to read CA certificate {}: {err}",
                cert_path.display()
            ))
        })?;
        let certificate = Certificate::from_pem(&pem)
            .map_err(|err| Error::Validation(format!("invalid CA certificate: {err}")))?;
        let connector = TlsConnector::builder()
            .add_root_certificate(certificate)
            .build()
            .map_err(|err| Error::Validation(format!("failed to load CA certificate: {err}")))?;
        settings = settings.set_connector(connector);
    }

    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn children_goes_out_as_subtree() {
        assert!(matches!(wire_scope(SearchScope::Base), Scope::Base));
        assert!(matches!(wire_scope(SearchScope::OneLevel), Scope::OneLevel));
        assert!(matches!(wire_scope(SearchScope::Subtree), Scope::Subtree));
        assert!(matches!(wire_scope(SearchScope::Children), Scope::Subtree));
    }

    #[test]
    fn missing_ca_certificate_is_a_validation_error() {
        let config = DirectoryConfig::new("ldaps://ldap.example.com")
            .unwrap()
            .with_tls_ca_cert(PathBuf::from("/nonexistent/ldap-session/ca.pem"));
        let err = build_ldap_settings(&config).err().unwrap();
        assert!(matches!(err, Error::Validation(message) if message.contains("CA certificate")));
    }

    #[test]
    fn plain_settings_build() {
        let config = DirectoryConfig::new("ldap://localhost").unwrap();
        assert!(build_ldap_settings(&config).is_ok());
    }
}
