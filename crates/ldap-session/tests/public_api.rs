//! Integration tests for the public session API.
//!
//! These run without a directory server: they cover input validation, configuration loading
//! and the result model.

use ldap_session::{
    connect, connect_with_config, describe, Attribute, DirectoryConfig, Entry, Error,
    SearchResult, SearchScope,
};

fn sample_entry() -> Entry {
    Entry {
        dn: "uid=jdoe,ou=People,dc=example,dc=com".to_string(),
        attributes: vec![
            Attribute {
                name: "cn".to_string(),
                values: vec![b"John Doe".to_vec()],
            },
            Attribute {
                name: "mail".to_string(),
                values: vec![b"jdoe@example.com".to_vec(), b"john@example.com".to_vec()],
            },
            Attribute {
                name: "jpegPhoto".to_string(),
                values: vec![vec![0xff, 0xd8, 0xff, 0x00]],
            },
        ],
    }
}

#[test]
fn test_connect_empty_url() {
    let err = connect("").unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
}

#[test]
fn test_connect_malformed_url() {
    let err = connect("ldap//missing-colon").unwrap_err();
    assert_eq!(err.error_code(), "VALIDATION_ERROR");
}

#[test]
#[ignore = "opens a TCP connection to 127.0.0.1:1"]
fn test_connect_unreachable_server() {
    let err = connect("ldap://127.0.0.1:1").unwrap_err();
    assert!(err.is_fatal(), "unexpected error {err:?}");
    assert!(err.to_string().starts_with("LDAP Error: "));
}

#[test]
fn test_config_from_json() {
    let json = r#"{
        "url": "ldaps://ldap.example.com:636",
        "tls_verify": false
    }"#;
    let config: DirectoryConfig = serde_json::from_str(json).unwrap();
    config.check().unwrap();

    assert_eq!(config.url(), "ldaps://ldap.example.com:636");
    assert!(!config.tls_verify());
    assert!(!config.starttls());
    assert!(config.tls_ca_cert().is_none());
}

#[test]
fn test_config_from_json_rejects_bad_scheme() {
    let config: DirectoryConfig =
        serde_json::from_str(r#"{ "url": "http://ldap.example.com" }"#).unwrap();
    assert!(matches!(config.check(), Err(Error::Validation(_))));
    assert!(matches!(
        connect_with_config(config),
        Err(Error::Validation(_))
    ));
}

#[test]
fn test_scope_aliases() {
    assert_eq!("LDAP_SCOPE_BASEOBJECT".parse::<SearchScope>().unwrap(), SearchScope::Base);
    assert_eq!("ldap_scope_subtree".parse::<SearchScope>().unwrap(), SearchScope::Subtree);
    assert_eq!(
        "LDAP_SCOPE_one".parse::<SearchScope>().unwrap_err().to_string(),
        "Unsupported scope LDAP_SCOPE_one"
    );
}

#[test]
fn test_entry_accessors() {
    let entry = sample_entry();

    assert_eq!(entry.first_text("cn"), Some("John Doe"));
    assert_eq!(entry.values("mail").count(), 2);
    assert_eq!(entry.first("mail"), Some(&b"jdoe@example.com"[..]));
    assert_eq!(entry.first_text("jpegPhoto"), None);
    assert!(entry.attribute("CN").is_none());
}

#[test]
fn test_search_result_iteration() {
    let result = SearchResult::from(vec![sample_entry()]);

    assert_eq!(result.len(), 1);
    assert!(!result.is_empty());
    assert_eq!((&result).into_iter().count(), 1);

    let entries = result.into_entries();
    assert_eq!(entries[0].dn, "uid=jdoe,ou=People,dc=example,dc=com");
}

#[test]
fn test_search_result_serialization() {
    let result = SearchResult::from(vec![sample_entry()]);
    let json = serde_json::to_value(&result).unwrap();

    assert_eq!(json[0]["dn"], "uid=jdoe,ou=People,dc=example,dc=com");
    assert_eq!(json[0]["attributes"][1]["name"], "mail");
    assert_eq!(json[0]["attributes"][2]["values"][0][0], 0xff);
}

#[test]
fn test_describe() {
    assert_eq!(describe(49), "Invalid credentials");
    assert_eq!(describe(4), "Size limit exceeded");
}
