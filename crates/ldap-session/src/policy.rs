//! Classification of protocol outcomes into results and fatal errors.

use crate::error::Error;
use ldap3::LdapError;

/// Result code for a successful operation.
pub const SUCCESS: u32 = 0;
/// Result code for rejected bind credentials, the only non-fatal bind failure.
pub const INVALID_CREDENTIALS: u32 = 49;

/// Status reported by the server for a completed request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Status {
    pub(crate) code: u32,
    pub(crate) text: String,
}

impl Status {
    #[cfg(test)]
    pub(crate) fn new(code: u32, text: impl Into<String>) -> Self {
        Self {
            code,
            text: text.into(),
        }
    }
}

impl From<ldap3::LdapResult> for Status {
    fn from(result: ldap3::LdapResult) -> Self {
        Self {
            code: result.rc,
            text: result.text,
        }
    }
}

/// How a bind result code is surfaced to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BindOutcome {
    Accepted,
    Rejected,
    Fatal,
}

/// How a search result code is surfaced to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SearchOutcome {
    Completed,
    Fatal,
}

pub(crate) const fn classify_bind(code: u32) -> BindOutcome {
    match code {
        SUCCESS => BindOutcome::Accepted,
        INVALID_CREDENTIALS => BindOutcome::Rejected,
        _ => BindOutcome::Fatal,
    }
}

pub(crate) const fn classify_search(code: u32) -> SearchOutcome {
    match code {
        SUCCESS => SearchOutcome::Completed,
        _ => SearchOutcome::Fatal,
    }
}

/// Returns the standard description for an LDAP result code.
#[must_use]
pub const fn describe(code: u32) -> &'static str {
    match code {
        0 => "Success",
        1 => "Operations error",
        2 => "Protocol error",
        3 => "Time limit exceeded",
        4 => "Size limit exceeded",
        5 => "Compare False",
        6 => "Compare True",
        7 => "Authentication method not supported",
        8 => "Strong(er) authentication required",
        9 => "Partial results and referral received",
        10 => "Referral",
        11 => "Administrative limit exceeded",
        12 => "Critical extension is unavailable",
        13 => "Confidentiality required",
        14 => "SASL bind in progress",
        16 => "No such attribute",
        17 => "Undefined attribute type",
        18 => "Inappropriate matching",
        19 => "Constraint violation",
        20 => "Type or value exists",
        21 => "Invalid syntax",
        32 => "No such object",
        33 => "Alias problem",
        34 => "Invalid DN syntax",
        35 => "Entry is a leaf",
        36 => "Alias dereferencing problem",
        47 => "Proxy Authorization Failure",
        48 => "Inappropriate authentication",
        49 => "Invalid credentials",
        50 => "Insufficient access",
        51 => "Server is busy",
        52 => "Server is unavailable",
        53 => "Server is unwilling to perform",
        54 => "Loop detected",
        64 => "Naming violation",
        65 => "Object class violation",
        66 => "Operation not allowed on non-leaf",
        67 => "Operation not allowed on RDN",
        68 => "Already exists",
        69 => "Cannot modify object class",
        70 => "Results too large",
        71 => "Operation affects multiple DSAs",
        80 => "Other (e.g., implementation specific) error",
        118 => "Cancelled",
        119 => "No Operation to Cancel",
        120 => "Too Late to Cancel",
        121 => "Cannot Cancel",
        122 => "Assertion Failed",
        123 => "Proxied Authorization Denied",
        _ => "Unknown error",
    }
}

/// Builds the error for a non-zero result code reported by the server.
pub(crate) fn protocol_error(status: Status) -> Error {
    Error::Protocol {
        code: Some(status.code),
        diagnostic: describe(status.code).to_string(),
        server_message: status.text,
    }
}

/// Builds the error for a failure below the result-code level.
pub(crate) fn transport_failure(err: LdapError) -> Error {
    let diagnostic = match &err {
        LdapError::LdapResult { result } => return protocol_error(result.clone().into()),
        LdapError::Io { .. } => "Can't contact LDAP server",
        LdapError::FilterParsing => "Bad search filter",
        _ => return client_failure(err.to_string()),
    };
    Error::Protocol {
        code: None,
        diagnostic: diagnostic.to_string(),
        server_message: err.to_string(),
    }
}

/// Builds the error for a response that does not have the expected shape.
pub(crate) fn decoding_failure(detail: impl Into<String>) -> Error {
    Error::Protocol {
        code: None,
        diagnostic: "Decoding error".to_string(),
        server_message: detail.into(),
    }
}

fn client_failure(message: String) -> Error {
    Error::Protocol {
        code: None,
        diagnostic: message,
        server_message: String::new(),
    }
}
