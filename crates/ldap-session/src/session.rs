//! Directory session handle: connect, bind, search and teardown.

use crate::{
    backend::{Ldap3Connector, LdapConnector, LdapSession, SearchRequest},
    config::DirectoryConfig,
    dn,
    error::{Error, Result},
    marshal::{self, SearchResult},
    policy::{self, BindOutcome, SearchOutcome},
    scope::SearchScope,
};
use std::fmt;
use tracing::{debug, info, warn};

/// Filter used when the caller does not supply one.
pub const DEFAULT_FILTER: &str = "(objectClass=*)";

/// Attribute selector that requests no attributes at all.
pub const NO_ATTRIBUTES: &str = "1.1";

/// Opens a session against `url` with default settings.
///
/// # Errors
///
/// Returns [`Error::Validation`] for an empty or malformed URL and [`Error::Protocol`] if the
/// session cannot be established.
pub fn connect(url: &str) -> Result<SessionHandle> {
    connect_with_config(DirectoryConfig::new(url)?)
}

/// Opens a session using an explicit configuration.
///
/// # Errors
///
/// Returns [`Error::Validation`] if the configuration is invalid or its TLS material cannot be
/// loaded, and [`Error::Protocol`] if the session cannot be established.
pub fn connect_with_config(config: DirectoryConfig) -> Result<SessionHandle> {
    SessionHandle::open(&Ldap3Connector, config)
}

/// Owns one directory session and the URL it was opened against.
///
/// All operations block until the server answers. The handle is [`Send`] but every operation
/// takes `&mut self`, so concurrent use has to be serialized by the owner. Once the session is
/// torn down, either explicitly with [`SessionHandle::close`], by a fatal protocol error, or
/// when the handle is dropped, it is never re-established.
pub struct SessionHandle {
    url: Option<String>,
    session: Option<Box<dyn LdapSession>>,
}

impl SessionHandle {
    pub(crate) fn open(connector: &dyn LdapConnector, config: DirectoryConfig) -> Result<Self> {
        config.check()?;

        let mut handle = Self {
            url: Some(config.url().to_string()),
            session: None,
        };

        debug!(url = config.url(), "connecting to directory server");
        match connector.connect(&config) {
            Ok(session) => {
                handle.session = Some(session);
                info!(url = config.url(), "directory session established");
                Ok(handle)
            }
            Err(err) => {
                handle.teardown();
                Err(err)
            }
        }
    }

    /// Returns the URL the session was opened against, until teardown.
    #[must_use]
    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    /// Returns true while the session is live.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.session.is_some()
    }

    /// Performs a simple bind; the credential must be valid UTF-8.
    ///
    /// The bytes are sent unchanged, but the protocol layer only accepts text passwords.
    /// Returns `Ok(false)` when the server rejects the credentials (result code 49); the
    /// session stays usable in that case.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotConnected`] without any network exchange if the session is gone,
    /// [`Error::Validation`] if the credential is not valid UTF-8, and [`Error::Protocol`] for
    /// any other failure, after tearing the session down.
    pub fn bind(&mut self, dn: &str, credential: &[u8]) -> Result<bool> {
        let session = self.session.as_mut().ok_or(Error::NotConnected)?;
        let password = std::str::from_utf8(credential)
            .map_err(|_| Error::Validation("Bind credential is not valid UTF-8".to_string()))?;

        debug!(dn, "issuing simple bind");
        let status = match session.simple_bind(dn, password) {
            Ok(status) => status,
            Err(err) => return Err(self.abort(policy::transport_failure(err))),
        };

        match policy::classify_bind(status.code) {
            BindOutcome::Accepted => Ok(true),
            BindOutcome::Rejected => {
                debug!(dn, "bind rejected: invalid credentials");
                Ok(false)
            }
            BindOutcome::Fatal => Err(self.abort(policy::protocol_error(status))),
        }
    }

    /// Runs a search and returns the matching entries in server order.
    ///
    /// `scope` is one of the aliases accepted by [`SearchScope::parse`]. An absent base searches
    /// from the empty DN, an absent filter matches every entry. `attributes` of `None` requests
    /// all user attributes while an empty slice requests none, so entries carry only their DN.
    /// No size limit is sent.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotConnected`] if the session is gone and [`Error::Validation`] for an
    /// unknown scope, both without any network exchange. Any protocol failure tears the
    /// session down and returns [`Error::Protocol`].
    pub fn search(
        &mut self,
        base_dn: Option<&str>,
        scope: &str,
        filter: Option<&str>,
        attributes: Option<&[&str]>,
        attrs_only: bool,
    ) -> Result<SearchResult> {
        if self.session.is_none() {
            return Err(Error::NotConnected);
        }
        let scope = SearchScope::parse(scope)?;
        let request = SearchRequest {
            base: base_dn.unwrap_or_default().to_string(),
            scope,
            filter: filter.unwrap_or(DEFAULT_FILTER).to_string(),
            attributes: select_attributes(attributes),
            attrs_only,
        };
        self.execute(&request)
    }

    /// Releases the session and the URL. Calling it again is a no-op.
    pub fn close(&mut self) {
        self.teardown();
    }

    fn execute(&mut self, request: &SearchRequest) -> Result<SearchResult> {
        let session = self.session.as_mut().ok_or(Error::NotConnected)?;

        debug!(
            base = %request.base,
            scope = %request.scope,
            filter = %request.filter,
            attributes = ?request.attributes,
            attrs_only = request.attrs_only,
            "issuing search"
        );
        let raw = match session.search(request) {
            Ok(raw) => raw,
            Err(err) => return Err(self.abort(policy::transport_failure(err))),
        };

        match policy::classify_search(raw.status.code) {
            SearchOutcome::Completed => {}
            SearchOutcome::Fatal => {
                let status = raw.status;
                drop(raw.entries);
                return Err(self.abort(policy::protocol_error(status)));
            }
        }

        let mut result = match marshal::marshal(raw.entries) {
            Ok(result) => result,
            Err(err) => return Err(self.abort(err)),
        };
        if request.scope == SearchScope::Children {
            result.retain(|entry| !dn::same_entry(&entry.dn, &request.base));
        }
        debug!(entries = result.len(), "search completed");
        Ok(result)
    }

    /// Tears the session down and hands back the error that caused it.
    fn abort(&mut self, err: Error) -> Error {
        warn!(
            url = self.url.as_deref().unwrap_or_default(),
            error = %err,
            "closing directory session after protocol failure"
        );
        self.teardown();
        err
    }

    fn teardown(&mut self) {
        if let Some(mut session) = self.session.take() {
            if let Err(err) = session.unbind() {
                debug!(error = %err, "unbind during teardown failed");
            }
        }
        self.url = None;
    }
}

impl Drop for SessionHandle {
    fn drop(&mut self) {
        self.teardown();
    }
}

impl fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionHandle")
            .field("url", &self.url)
            .field("connected", &self.is_connected())
            .finish()
    }
}

fn select_attributes(attributes: Option<&[&str]>) -> Vec<String> {
    match attributes {
        None => Vec::new(),
        Some([]) => vec![NO_ATTRIBUTES.to_string()],
        Some(names) => names.iter().map(|name| (*name).to_string()).collect(),
    }
}
