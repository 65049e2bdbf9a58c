//! Single-session LDAP client.
//!
//! A [`SessionHandle`] owns one connection to a directory server. It supports a simple bind, a
//! scoped search whose results come back as owned, ordered [`Entry`] records, and an idempotent
//! close. Failures are split strictly: rejected bind credentials are an ordinary `false`, input
//! and state problems leave the session alone, and every other protocol failure closes the
//! session before it is reported.
//!
//! ```no_run
//! # fn run() -> ldap_session::Result<()> {
//! let mut session = ldap_session::connect("ldap://ldap.example.com")?;
//! if session.bind("cn=reader,dc=example,dc=com", b"secret")? {
//!     let people = session.search(
//!         Some("ou=People,dc=example,dc=com"),
//!         "LDAP_SCOPE_ONELEVEL",
//!         Some("(objectClass=person)"),
//!         Some(&["cn", "mail"]),
//!         false,
//!     )?;
//!     for entry in &people {
//!         println!("{} {:?}", entry.dn, entry.first_text("mail"));
//!     }
//! }
//! session.close();
//! # Ok(())
//! # }
//! ```

#![deny(missing_docs)]

mod backend;
mod config;
mod dn;
mod error;
mod marshal;
mod policy;
mod scope;
mod session;

pub use config::{DirectoryConfig, SUPPORTED_SCHEMES};
pub use error::{Error, Result};
pub use marshal::{Attribute, Entry, SearchResult};
pub use policy::{describe, INVALID_CREDENTIALS, SUCCESS};
pub use scope::SearchScope;
pub use session::{connect, connect_with_config, SessionHandle, DEFAULT_FILTER, NO_ATTRIBUTES};
