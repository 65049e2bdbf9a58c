//! Distinguished name parsing used to compare entry names returned by the server.

use thiserror::Error;

/// Errors that can occur when parsing distinguished names.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub(crate) enum DistinguishedNameError {
    #[error("distinguished name cannot be empty")]
    Empty,
    #[error("invalid distinguished name component: {0}")]
    InvalidComponent(String),
    #[error("distinguished name component missing attribute: {0}")]
    MissingAttribute(String),
    #[error("distinguished name contains an unterminated escape sequence")]
    UnterminatedEscape,
}

/// Single attribute/value assertion inside a relative distinguished name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct NameComponent {
    attribute: String,
    value: String,
}

impl NameComponent {
    fn matches(&self, other: &Self) -> bool {
        self.attribute.eq_ignore_ascii_case(&other.attribute)
            && self.value.eq_ignore_ascii_case(&other.value)
    }
}

/// Parsed distinguished name: RDNs leaf first, each with one or more `+`-joined components.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct DistinguishedName {
    rdns: Vec<Vec<NameComponent>>,
}

impl DistinguishedName {
    pub(crate) fn parse(input: &str) -> std::result::Result<Self, DistinguishedNameError> {
        let raw = input.trim();
        if raw.is_empty() {
            return Err(DistinguishedNameError::Empty);
        }

        let mut rdns = Vec::new();
        for rdn in split_escaped(raw, ',')? {
            let mut components = Vec::new();
            for part in split_escaped(&rdn, '+')? {
                let (attribute, value) = split_attribute_value(&part)?;
                components.push(NameComponent { attribute, value });
            }
            rdns.push(components);
        }

        Ok(Self { rdns })
    }

    /// Returns true if both names identify the same entry.
    ///
    /// Attribute types and values are compared ignoring ASCII case; multi-valued RDNs match
    /// regardless of component order.
    pub(crate) fn is_same_entry(&self, other: &Self) -> bool {
        self.rdns.len() == other.rdns.len()
            && self.rdns.iter().zip(&other.rdns).all(|(left, right)| {
                left.len() == right.len()
                    && left
                        .iter()
                        .all(|component| right.iter().any(|candidate| component.matches(candidate)))
            })
    }
}

/// Compares two DN strings as names, falling back to a case-insensitive string comparison when
/// either side does not parse. Two empty names are equal.
pub(crate) fn same_entry(left: &str, right: &str) -> bool {
    match (DistinguishedName::parse(left), DistinguishedName::parse(right)) {
        (Ok(left), Ok(right)) => left.is_same_entry(&right),
        _ => left.trim().eq_ignore_ascii_case(right.trim()),
    }
}

fn split_escaped(
    input: &str,
    delimiter: char,
) -> std::result::Result<Vec<String>, DistinguishedNameError> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut escape = false;

    for ch in input.chars() {
        if escape {
            current.push('\\');
            current.push(ch);
            escape = false;
            continue;
        }

        if ch == '\\' {
            escape = true;
            continue;
        }

        if ch == delimiter {
            parts.push(current.trim().to_string());
            current.clear();
            continue;
        }

        current.push(ch);
    }

    if escape {
        return Err(DistinguishedNameError::UnterminatedEscape);
    }

    parts.push(current.trim().to_string());
    if parts.iter().any(String::is_empty) {
        return Err(DistinguishedNameError::InvalidComponent(input.to_string()));
    }
    Ok(parts)
}

fn split_attribute_value(
    component: &str,
) -> std::result::Result<(String, String), DistinguishedNameError> {
    let mut escape = false;
    let mut index = None;

    for (i, ch) in component.char_indices() {
        if escape {
            escape = false;
            continue;
        }

        if ch == '\\' {
            escape = true;
            continue;
        }

        if ch == '=' {
            index = Some(i);
            break;
        }
    }

    let idx =
        index.ok_or_else(|| DistinguishedNameError::InvalidComponent(component.to_string()))?;
    let attribute = component[..idx].trim();
    if attribute.is_empty() {
        return Err(DistinguishedNameError::MissingAttribute(
            component.to_string(),
        ));
    }

    // Empty values are legal (e.g. `cn=`).
    let value = unescape(component[idx + 1..].trim())?;
    Ok((attribute.to_string(), value))
}

/// Removes backslash escapes. Runs of `\XX` hex pairs are collected as bytes and decoded as
/// UTF-8 together, so `caf\c3\a9` reads as `café`.
fn unescape(value: &str) -> std::result::Result<String, DistinguishedNameError> {
    let mut result = String::with_capacity(value.len());
    let mut pending = Vec::new();
    let mut chars = value.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch != '\\' {
            flush_hex(&mut pending, &mut result);
            result.push(ch);
            continue;
        }

        let next = chars
            .next()
            .ok_or(DistinguishedNameError::UnterminatedEscape)?;
        match (next.to_digit(16), chars.peek().and_then(|c| c.to_digit(16))) {
            (Some(high), Some(low)) => {
                chars.next();
                pending.extend(u8::try_from(high * 16 + low).ok());
            }
            _ => {
                flush_hex(&mut pending, &mut result);
                result.push(next);
            }
        }
    }

    flush_hex(&mut pending, &mut result);
    Ok(result)
}

/// Appends decoded hex-escaped bytes. Bytes that are not valid UTF-8 stay in `\xx` form.
fn flush_hex(pending: &mut Vec<u8>, result: &mut String) {
    if pending.is_empty() {
        return;
    }
    match String::from_utf8(std::mem::take(pending)) {
        Ok(text) => result.push_str(&text),
        Err(err) => {
            for byte in err.into_bytes() {
                result.push_str(&format!("\\{byte:02x}"));
            }
        }
    }
}
