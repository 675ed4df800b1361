//! An insertion-ordered, case-insensitive header map shared by requests and
//! responses, plus the RFC 7230 character classes used to validate it.

use std::collections::HashMap;
use std::fmt;

use crate::ensure;
use crate::protocol::HeaderError;

pub(crate) const HOST: &str = "Host";
pub(crate) const USER_AGENT: &str = "User-Agent";
pub(crate) const AUTHORIZATION: &str = "Authorization";
pub(crate) const CONTENT_LENGTH: &str = "Content-Length";
pub(crate) const CONTENT_TYPE: &str = "Content-Type";
pub(crate) const CONNECTION: &str = "Connection";
pub(crate) const TRANSFER_ENCODING: &str = "Transfer-Encoding";

/// `tchar` from RFC 7230 §3.2.6.
#[inline]
pub(crate) fn is_token_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&b)
}

/// SP or HTAB.
#[inline]
pub(crate) fn is_whitespace(b: u8) -> bool {
    b == b' ' || b == b'\t'
}

/// `VCHAR`: 0x21..=0x7E.
#[inline]
pub(crate) fn is_visible(b: u8) -> bool {
    (0x21..=0x7E).contains(&b)
}

/// `obs-text`: 0x80..=0xFF.
#[inline]
pub(crate) fn is_obs_text(b: u8) -> bool {
    b >= 0x80
}

/// A byte allowed inside a field value or a reason phrase.
#[inline]
pub(crate) fn is_field_char(b: u8) -> bool {
    is_visible(b) || is_whitespace(b) || is_obs_text(b)
}

pub(crate) fn is_token(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(is_token_char)
}

pub(crate) fn is_field_value(s: &str) -> bool {
    s.bytes().all(is_field_char)
}

/// A single `name: value` pair, with the name in its original case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderField {
    name: String,
    value: String,
}

impl HeaderField {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &str {
        &self.value
    }
}

/// Ordered header fields with unique, case-insensitive names.
///
/// Adding a name that is already present overwrites the value in place, so the
/// original position and spelling of the name are kept. Removing a field moves
/// the last field into the freed slot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderCollection {
    fields: Vec<HeaderField>,
    /// lower-cased name -> position in `fields`
    index: HashMap<String, usize>,
}

impl HeaderCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self { fields: Vec::with_capacity(capacity), index: HashMap::with_capacity(capacity) }
    }

    /// Adds a field, or overwrites the value of the field with the same name.
    ///
    /// The value is trimmed of surrounding spaces and tabs before validation.
    ///
    /// # Errors
    ///
    /// [`HeaderError::InvalidName`] if `name` is not a token,
    /// [`HeaderError::InvalidValue`] if `value` holds control characters.
    pub fn add<N, V>(&mut self, name: N, value: V) -> Result<(), HeaderError>
    where
        N: Into<String>,
        V: AsRef<str>,
    {
        let name = name.into();
        ensure!(is_token(&name), HeaderError::invalid_name(name));

        let value = value.as_ref().trim_matches([' ', '\t']);
        ensure!(is_field_value(value), HeaderError::invalid_value(name));

        let key = name.to_ascii_lowercase();
        match self.index.get(&key) {
            Some(&position) => value.clone_into(&mut self.fields[position].value),
            None => {
                self.index.insert(key, self.fields.len());
                self.fields.push(HeaderField { name, value: value.to_owned() });
            }
        }
        Ok(())
    }

    /// # Errors
    ///
    /// [`HeaderError::NotFound`] if no field has this name.
    pub fn get(&self, name: &str) -> Result<&str, HeaderError> {
        self.position(name).map(|position| self.fields[position].value.as_str()).ok_or_else(|| HeaderError::not_found(name))
    }

    pub fn has(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Removes the field with this name.
    ///
    /// # Errors
    ///
    /// [`HeaderError::NotFound`] if no field has this name.
    pub fn remove(&mut self, name: &str) -> Result<(), HeaderError> {
        let position = self.index.remove(&name.to_ascii_lowercase()).ok_or_else(|| HeaderError::not_found(name))?;

        self.fields.swap_remove(position);
        if let Some(moved) = self.fields.get(position) {
            self.index.insert(moved.name.to_ascii_lowercase(), position);
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, HeaderField> {
        self.fields.iter()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.index.get(&name.to_ascii_lowercase()).copied()
    }
}

impl<'a> IntoIterator for &'a HeaderCollection {
    type Item = &'a HeaderField;
    type IntoIter = std::slice::Iter<'a, HeaderField>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Builds a collection from `(name, value)` pairs, in order.
impl<N, V> TryFrom<Vec<(N, V)>> for HeaderCollection
where
    N: Into<String>,
    V: AsRef<str>,
{
    type Error = HeaderError;

    fn try_from(pairs: Vec<(N, V)>) -> Result<Self, Self::Error> {
        let mut headers = HeaderCollection::with_capacity(pairs.len());
        for (name, value) in pairs {
            headers.add(name, value)?;
        }
        Ok(headers)
    }
}

impl fmt::Display for HeaderCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for field in &self.fields {
            write!(f, "{}: {}\r\n", field.name, field.value)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(headers: &HeaderCollection) -> Vec<&str> {
        headers.iter().map(HeaderField::name).collect()
    }

    #[test]
    fn get_is_case_insensitive() {
        let mut headers = HeaderCollection::new();
        headers.add("Content-Type", "text/plain").unwrap();

        assert_eq!(headers.get("content-type").unwrap(), "text/plain");
        assert_eq!(headers.get("CONTENT-TYPE").unwrap(), "text/plain");
        assert!(headers.has("cOnTeNt-TyPe"));
        assert!(!headers.has("Content-Length"));
    }

    #[test]
    fn re_adding_overwrites_in_place() {
        let mut headers = HeaderCollection::new();
        headers.add("Accept", "*/*").unwrap();
        headers.add("Content-Type", "text/plain").unwrap();
        headers.add("Host", "example.com").unwrap();

        headers.add("content-type", "application/json").unwrap();

        assert_eq!(headers.len(), 3);
        assert_eq!(names(&headers), ["Accept", "Content-Type", "Host"]);
        assert_eq!(headers.get("Content-Type").unwrap(), "application/json");
    }

    #[test]
    fn values_are_trimmed() {
        let mut headers = HeaderCollection::new();
        headers.add("X-Padded", " \t value with inner space \t ").unwrap();
        assert_eq!(headers.get("x-padded").unwrap(), "value with inner space");

        headers.add("X-Empty", "   ").unwrap();
        assert_eq!(headers.get("x-empty").unwrap(), "");
    }

    #[test]
    fn invalid_names_and_values() {
        let mut headers = HeaderCollection::new();
        assert_eq!(headers.add("", "v"), Err(HeaderError::invalid_name("")));
        assert_eq!(headers.add("Bad Name", "v"), Err(HeaderError::invalid_name("Bad Name")));
        assert_eq!(headers.add("Bad:Name", "v"), Err(HeaderError::invalid_name("Bad:Name")));
        assert_eq!(headers.add("X-Value", "a\r\nInjected: yes"), Err(HeaderError::invalid_value("X-Value")));
        assert_eq!(headers.add("X-Value", "nul\0"), Err(HeaderError::invalid_value("X-Value")));
        assert!(headers.is_empty());

        // obs-text is tolerated
        headers.add("X-Latin", "caf\u{e9}").unwrap();
        assert_eq!(headers.get("x-latin").unwrap(), "caf\u{e9}");
    }

    #[test]
    fn missing_header_is_an_error() {
        let mut headers = HeaderCollection::new();
        assert_eq!(headers.get("Host"), Err(HeaderError::not_found("Host")));
        assert_eq!(headers.remove("Host"), Err(HeaderError::not_found("Host")));
    }

    #[test]
    fn remove_moves_last_field_into_the_gap() {
        let mut headers =
            HeaderCollection::try_from(vec![("A", "1"), ("B", "2"), ("C", "3"), ("D", "4")]).unwrap();

        headers.remove("b").unwrap();
        assert_eq!(names(&headers), ["A", "D", "C"]);
        assert_eq!(headers.get("d").unwrap(), "4");
        assert_eq!(headers.get("c").unwrap(), "3");
        assert!(!headers.has("b"));

        // removing the tail needs no fix-up
        headers.remove("C").unwrap();
        assert_eq!(names(&headers), ["A", "D"]);

        // the moved field is still addressable and updatable in place
        headers.add("D", "40").unwrap();
        assert_eq!(names(&headers), ["A", "D"]);
        assert_eq!(headers.get("D").unwrap(), "40");

        headers.add("E", "5").unwrap();
        assert_eq!(names(&headers), ["A", "D", "E"]);
    }

    #[test]
    fn display_as_wire_lines() {
        let headers = HeaderCollection::try_from(vec![("Host", "a"), ("Accept", "*/*")]).unwrap();
        assert_eq!(headers.to_string(), "Host: a\r\nAccept: */*\r\n");
    }

    #[test]
    fn character_classes() {
        assert!(is_token("X-Custom_Header.1"));
        assert!(is_token("!#$%&'*+-.^_`|~"));
        assert!(!is_token("a b"));
        assert!(!is_token("a\"b"));
        assert!(!is_token("(comment)"));

        assert!(is_field_char(b' '));
        assert!(is_field_char(b'\t'));
        assert!(is_field_char(b'~'));
        assert!(is_field_char(0xE9));
        assert!(!is_field_char(0x7F));
        assert!(!is_field_char(b'\r'));
        assert!(!is_field_char(b'\n'));
    }
}
