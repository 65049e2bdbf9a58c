//! Conversion of raw search responses into owned, ordered entries.
//!
//! A search result entry arrives as `[APPLICATION 4] SEQUENCE { objectName, attributes }`
//! where `attributes` is a `SEQUENCE OF SEQUENCE { type, vals SET OF value }`. The walk keeps
//! the order the server used at every level and consumes each tag as it goes, so nothing from
//! the response survives the call.

use crate::error::Result;
use crate::policy::decoding_failure;
use ldap3::asn1::{StructureTag, TagClass};
use serde::Serialize;

const SEARCH_RESULT_ENTRY: u64 = 4;
const SEARCH_RESULT_REFERENCE: u64 = 19;
const INTERMEDIATE_RESPONSE: u64 = 25;

/// One attribute of an entry with its values in server order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Attribute {
    /// Attribute description exactly as returned (no case folding).
    pub name: String,
    /// Raw attribute values.
    pub values: Vec<Vec<u8>>,
}

/// Directory entry returned by a search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Entry {
    /// Distinguished name of the entry.
    pub dn: String,
    /// Attributes in server order; names may repeat.
    pub attributes: Vec<Attribute>,
}

impl Entry {
    /// Returns the first attribute with exactly this name.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|attribute| attribute.name == name)
    }

    /// Returns every value of every attribute with this name, in order.
    pub fn values<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a [u8]> + 'a {
        self.attributes
            .iter()
            .filter(move |attribute| attribute.name == name)
            .flat_map(|attribute| attribute.values.iter().map(Vec::as_slice))
    }

    /// Returns the first value of the attribute if present.
    #[must_use]
    pub fn first(&self, name: &str) -> Option<&[u8]> {
        self.attributes
            .iter()
            .filter(|attribute| attribute.name == name)
            .find_map(|attribute| attribute.values.first())
            .map(Vec::as_slice)
    }

    /// Returns the first value as text, if present and valid UTF-8.
    #[must_use]
    pub fn first_text(&self, name: &str) -> Option<&str> {
        self.first(name)
            .and_then(|value| std::str::from_utf8(value).ok())
    }
}

/// Ordered set of entries produced by one search.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SearchResult {
    entries: Vec<Entry>,
}

impl SearchResult {
    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the search matched nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Borrows the entries in server order.
    #[must_use]
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Iterates over the entries in server order.
    pub fn iter(&self) -> std::slice::Iter<'_, Entry> {
        self.entries.iter()
    }

    /// Consumes the result, returning its entries.
    #[must_use]
    pub fn into_entries(self) -> Vec<Entry> {
        self.entries
    }

    pub(crate) fn retain(&mut self, keep: impl FnMut(&Entry) -> bool) {
        self.entries.retain(keep);
    }
}

impl From<Vec<Entry>> for SearchResult {
    fn from(entries: Vec<Entry>) -> Self {
        Self { entries }
    }
}

impl IntoIterator for SearchResult {
    type Item = Entry;
    type IntoIter = std::vec::IntoIter<Entry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<'a> IntoIterator for &'a SearchResult {
    type Item = &'a Entry;
    type IntoIter = std::slice::Iter<'a, Entry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Walks the response tags and builds the result.
///
/// Search references and intermediate responses are skipped.
pub(crate) fn marshal(tags: Vec<StructureTag>) -> Result<SearchResult> {
    let mut entries = Vec::with_capacity(tags.len());
    for tag in tags {
        if tag.class != TagClass::Application {
            return Err(decoding_failure(format!(
                "unexpected {:?} tag {} in search response",
                tag.class, tag.id
            )));
        }
        match tag.id {
            SEARCH_RESULT_ENTRY => entries.push(marshal_entry(tag)?),
            SEARCH_RESULT_REFERENCE | INTERMEDIATE_RESPONSE => {}
            other => {
                return Err(decoding_failure(format!(
                    "unexpected protocol op {other} in search response"
                )))
            }
        }
    }
    Ok(SearchResult { entries })
}

fn marshal_entry(tag: StructureTag) -> Result<Entry> {
    let mut parts = tag
        .expect_constructed()
        .ok_or_else(|| decoding_failure("search entry is not constructed"))?
        .into_iter();

    let dn = parts
        .next()
        .and_then(StructureTag::expect_primitive)
        .ok_or_else(|| decoding_failure("search entry has no object name"))?;
    let dn = String::from_utf8(dn)
        .map_err(|_| decoding_failure("search entry name is not valid UTF-8"))?;

    let attribute_list = parts
        .next()
        .and_then(StructureTag::expect_constructed)
        .ok_or_else(|| decoding_failure(format!("search entry {dn} has no attribute list")))?;

    let mut attributes = Vec::with_capacity(attribute_list.len());
    for attribute in attribute_list {
        if let Some(attribute) = marshal_attribute(&dn, attribute)? {
            attributes.push(attribute);
        }
    }

    Ok(Entry { dn, attributes })
}

/// Returns `None` for an attribute without values (attribute-names-only responses).
fn marshal_attribute(dn: &str, tag: StructureTag) -> Result<Option<Attribute>> {
    let malformed = || decoding_failure(format!("malformed attribute in search entry {dn}"));

    let mut parts = tag.expect_constructed().ok_or_else(malformed)?.into_iter();
    let name = parts
        .next()
        .and_then(StructureTag::expect_primitive)
        .and_then(|name| String::from_utf8(name).ok())
        .ok_or_else(malformed)?;
    let values = parts
        .next()
        .and_then(StructureTag::expect_constructed)
        .ok_or_else(malformed)?
        .into_iter()
        .map(StructureTag::expect_primitive)
        .collect::<Option<Vec<Vec<u8>>>>()
        .ok_or_else(malformed)?;

    if values.is_empty() {
        return Ok(None);
    }
    Ok(Some(Attribute { name, values }))
}


#[cfg(test)]
mod tests {
    use super::fixtures::{entry, reference};
    use super::*;
    use ldap3::asn1::PL;

    #[test]
    fn preserves_value_order_and_bytes() {
        let photo: &[u8] = &[0x89, b'P', b'N', b'G', 0x00, 0xff];
        let result = marshal(vec![entry(
            "uid=jdoe,dc=example,dc=com",
            &[("mail", &[b"b@example.com", b"a@example.com", photo])],
        )])
        .unwrap();

        assert_eq!(result.len(), 1);
        let entry = &result.entries()[0];
        assert_eq!(entry.dn, "uid=jdoe,dc=example,dc=com");
        let values: Vec<&[u8]> = entry.values("mail").collect();
        assert_eq!(values, vec![&b"b@example.com"[..], b"a@example.com", photo]);
    }

    #[test]
    fn preserves_entry_and_attribute_order() {
        let result = marshal(vec![
            entry("cn=b,dc=com", &[("sn", &[b"B"]), ("cn", &[b"b"])]),
            entry("cn=a,dc=com", &[("cn", &[b"a"])]),
        ])
        .unwrap();

        let dns: Vec<&str> = result.iter().map(|entry| entry.dn.as_str()).collect();
        assert_eq!(dns, vec!["cn=b,dc=com", "cn=a,dc=com"]);
        let names: Vec<&str> = result.entries()[0]
            .attributes
            .iter()
            .map(|attribute| attribute.name.as_str())
            .collect();
        assert_eq!(names, vec!["sn", "cn"]);
    }

    #[test]
    fn keeps_duplicate_attribute_names() {
        let result = marshal(vec![entry(
            "cn=x,dc=com",
            &[("CN", &[b"one"]), ("cn", &[b"two"]), ("CN", &[b"three"])],
        )])
        .unwrap();

        let entry = &result.entries()[0];
        assert_eq!(entry.attributes.len(), 3);
        let upper: Vec<&[u8]> = entry.values("CN").collect();
        assert_eq!(upper, vec![&b"one"[..], b"three"]);
        assert_eq!(entry.first_text("cn"), Some("two"));
        assert_eq!(entry.attribute("CN").unwrap().values, vec![b"one".to_vec()]);
    }

    #[test]
    fn entry_without_attributes() {
        let result = marshal(vec![entry("dc=com", &[])]).unwrap();
        assert_eq!(result.entries()[0].dn, "dc=com");
        assert!(result.entries()[0].attributes.is_empty());
    }

    #[test]
    fn attribute_names_only_yield_empty_mapping() {
        let result = marshal(vec![entry("dc=com", &[("cn", &[]), ("sn", &[])])]).unwrap();
        assert!(result.entries()[0].attributes.is_empty());
    }

    #[test]
    fn references_are_skipped() {
        let result = marshal(vec![
            reference("ldap://other.example.com/dc=other"),
            entry("dc=com", &[("dc", &[b"com"])]),
        ])
        .unwrap();
        assert_eq!(result.len(), 1);
    }

    #[test]
    fn empty_response() {
        let result = marshal(Vec::new()).unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn malformed_entry_is_a_decoding_error() {
        let broken = StructureTag {
            class: TagClass::Application,
            id: 4,
            payload: PL::P(b"garbage".to_vec()),
        };
        let err = marshal(vec![broken]).unwrap_err();
        assert_eq!(err.to_string(), "LDAP Error: Decoding error");
    }

    #[test]
    fn first_text_rejects_binary() {
        let result = marshal(vec![entry("cn=x", &[("jpegPhoto", &[&[0xff, 0xd8]])])]).unwrap();
        let entry = &result.entries()[0];
        assert_eq!(entry.first("jpegPhoto"), Some(&[0xff, 0xd8][..]));
        assert_eq!(entry.first_text("jpegPhoto"), None);
        assert_eq!(entry.first("missing"), None);
    }
}
