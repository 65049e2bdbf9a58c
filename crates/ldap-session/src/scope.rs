//! Search scope and its accepted string aliases.

use crate::error::{Error, Result};
use std::fmt;
use std::str::FromStr;

/// Represents the search scope for LDAP queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SearchScope {
    /// Base object only.
    Base,
    /// Immediate children of the base.
    OneLevel,
    /// The base and all of its descendants.
    Subtree,
    /// All descendants of the base, excluding the base itself.
    Children,
}

impl SearchScope {
    /// Resolves a scope alias.
    ///
    /// `LDAP_SCOPE_BASE`, `LDAP_SCOPE_BASEOBJECT`, `LDAP_SCOPE_ONE`, `LDAP_SCOPE_SUB` and
    /// `LDAP_SCOPE_CHILDREN` must match exactly. `LDAP_SCOPE_ONELEVEL`, `LDAP_SCOPE_SUBTREE` and
    /// `LDAP_SCOPE_SUBORDINATE` are matched ignoring ASCII case.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] for any other string.
    pub fn parse(alias: &str) -> Result<Self> {
        let scope = match alias {
            "LDAP_SCOPE_BASE" | "LDAP_SCOPE_BASEOBJECT" => Self::Base,
            "LDAP_SCOPE_ONE" => Self::OneLevel,
            "LDAP_SCOPE_SUB" => Self::Subtree,
            "LDAP_SCOPE_CHILDREN" => Self::Children,
            _ if alias.eq_ignore_ascii_case("LDAP_SCOPE_ONELEVEL") => Self::OneLevel,
            _ if alias.eq_ignore_ascii_case("LDAP_SCOPE_SUBTREE") => Self::Subtree,
            _ if alias.eq_ignore_ascii_case("LDAP_SCOPE_SUBORDINATE") => Self::Children,
            _ => return Err(Error::Validation(format!("Unsupported scope {alias}"))),
        };
        Ok(scope)
    }

    /// Canonical alias for the scope.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Base => "LDAP_SCOPE_BASE",
            Self::OneLevel => "LDAP_SCOPE_ONELEVEL",
            Self::Subtree => "LDAP_SCOPE_SUBTREE",
            Self::Children => "LDAP_SCOPE_CHILDREN",
        }
    }
}

impl fmt::Display for SearchScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SearchScope {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
