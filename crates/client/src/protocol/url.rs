//! Absolute `http`/`https` URL parsing.
//!
//! Only what a request needs is extracted: scheme, optional userinfo, host,
//! port, path, query and fragment. Percent-decoding is left to the caller; the
//! path and query are sent to the server exactly as written.

use std::fmt;
use std::str::FromStr;

use crate::ensure;
use crate::protocol::UrlError;
use crate::protocol::header::{is_obs_text, is_visible};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scheme {
    Http,
    Https,
}

impl Scheme {
    pub fn default_port(self) -> u16 {
        match self {
            Scheme::Http => 80,
            Scheme::Https => 443,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Scheme::Http => "http",
            Scheme::Https => "https",
        }
    }

    #[inline]
    pub fn is_secure(self) -> bool {
        matches!(self, Scheme::Https)
    }
}

impl FromStr for Scheme {
    type Err = UrlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("http") {
            Ok(Scheme::Http)
        } else if s.eq_ignore_ascii_case("https") {
            Ok(Scheme::Https)
        } else {
            Err(UrlError::unsupported_scheme(s))
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Credentials embedded in the authority as `user[:password]@`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserInfo {
    username: String,
    password: Option<String>,
}

impl UserInfo {
    fn parse(raw: &str) -> Self {
        match raw.split_once(':') {
            Some((username, password)) => {
                Self { username: username.to_owned(), password: Some(password.to_owned()) }
            }
            None => Self { username: raw.to_owned(), password: None },
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> Option<&str> {
        self.password.as_deref()
    }
}

/// A parsed absolute URL.
///
/// The path is stored without its leading `/`; query and fragment are `None`
/// when absent or empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Url {
    scheme: Scheme,
    user_info: Option<UserInfo>,
    host: String,
    port: u16,
    path: String,
    query: Option<String>,
    fragment: Option<String>,
}

impl Url {
    /// Parses `scheme://[user[:pass]@]host[:port][/path][?query][#fragment]`.
    ///
    /// # Errors
    ///
    /// - [`UrlError::MissingScheme`] for empty input or a missing `://`
    /// - [`UrlError::UnsupportedScheme`] for anything but `http`/`https`
    /// - [`UrlError::EmptyHost`], [`UrlError::InvalidPort`] or
    ///   [`UrlError::InvalidAuthority`] for a malformed authority
    /// - [`UrlError::InvalidCharacter`] for whitespace or control bytes
    pub fn parse(raw: &str) -> Result<Self, UrlError> {
        let (scheme, rest) = raw.split_once("://").ok_or(UrlError::MissingScheme)?;
        ensure!(!scheme.is_empty(), UrlError::MissingScheme);
        let scheme = scheme.parse::<Scheme>()?;

        // the authority ends at the first of '/', '?' or '#'
        let authority_end = rest.find(['/', '?', '#']).unwrap_or(rest.len());
        let (authority, remainder) = rest.split_at(authority_end);

        ensure!(is_url_text(authority), UrlError::invalid_character("authority"));

        let (user_info, host_port) = match authority.rsplit_once('@') {
            Some((user_info, host_port)) => (Some(UserInfo::parse(user_info)), host_port),
            None => (None, authority),
        };
        let (host, port) = split_host_port(host_port, scheme)?;

        let (remainder, fragment) = match remainder.split_once('#') {
            Some((remainder, fragment)) => (remainder, non_empty(fragment)),
            None => (remainder, None),
        };
        let (path, query) = match remainder.split_once('?') {
            Some((path, query)) => (path, non_empty(query)),
            None => (remainder, None),
        };
        ensure!(is_url_text(path), UrlError::invalid_character("path"));
        ensure!(query.as_deref().is_none_or(is_url_text), UrlError::invalid_character("query"));
        ensure!(fragment.as_deref().is_none_or(is_url_text), UrlError::invalid_character("fragment"));
        let path = path.strip_prefix('/').unwrap_or(path).to_owned();

        Ok(Self { scheme, user_info, host, port, path, query, fragment })
    }

    pub fn scheme(&self) -> Scheme {
        self.scheme
    }

    pub fn user_info(&self) -> Option<&UserInfo> {
        self.user_info.as_ref()
    }

    /// The host, without brackets for IPv6 literals.
    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// The path without its leading `/`.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    pub fn fragment(&self) -> Option<&str> {
        self.fragment.as_deref()
    }

    pub fn is_default_port(&self) -> bool {
        self.port == self.scheme.default_port()
    }

    /// The origin-form request target: `/path[?query]`.
    pub fn request_target(&self) -> String {
        let mut target = String::with_capacity(self.path.len() + 1);
        target.push('/');
        target.push_str(&self.path);
        if let Some(query) = &self.query {
            target.push('?');
            target.push_str(query);
        }
        target
    }

    /// The `Host` header value: the host, plus the port when it is not the
    /// scheme default.
    pub fn host_header(&self) -> String {
        let host = self.bracketed_host();
        if self.is_default_port() { host } else { format!("{host}:{}", self.port) }
    }

    fn bracketed_host(&self) -> String {
        if self.host.contains(':') { format!("[{}]", self.host) } else { self.host.clone() }
    }
}

/// Everything after the scheme ends up in the request line or the `Host`
/// header, so whitespace and control bytes are never allowed.
fn is_url_text(s: &str) -> bool {
    s.bytes().all(|b| is_visible(b) || is_obs_text(b))
}

fn non_empty(s: &str) -> Option<String> {
    (!s.is_empty()).then(|| s.to_owned())
}

fn split_host_port(host_port: &str, scheme: Scheme) -> Result<(String, u16), UrlError> {
    let (host, port) = if let Some(literal) = host_port.strip_prefix('[') {
        let (host, after) =
            literal.split_once(']').ok_or_else(|| UrlError::invalid_authority("unterminated ipv6 literal"))?;
        let port = match after {
            "" => None,
            after => Some(
                after
                    .strip_prefix(':')
                    .ok_or_else(|| UrlError::invalid_authority(format!("unexpected '{after}' after ipv6 literal")))?,
            ),
        };
        (host, port)
    } else {
        match host_port.split_once(':') {
            Some((host, port)) => (host, Some(port)),
            None => (host_port, None),
        }
    };

    ensure!(!host.is_empty(), UrlError::EmptyHost);

    let port = match port {
        // "host:" carries no explicit port
        None | Some("") => scheme.default_port(),
        Some(port) => {
            ensure!(port.bytes().all(|b| b.is_ascii_digit()), UrlError::invalid_port(port));
            port.parse::<u16>().map_err(|_overflow| UrlError::invalid_port(port))?
        }
    };

    Ok((host.to_owned(), port))
}

impl FromStr for Url {
    type Err = UrlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Url::parse(s)
    }
}

impl TryFrom<&str> for Url {
    type Error = UrlError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Url::parse(value)
    }
}

/// Re-assembles the URL. The password is never printed.
impl fmt::Display for Url {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://", self.scheme)?;
        if let Some(user_info) = &self.user_info {
            write!(f, "{}@", user_info.username)?;
        }
        f.write_str(&self.host_header())?;
        f.write_str(&self.request_target())?;
        if let Some(fragment) = &self.fragment {
            write!(f, "#{fragment}")?;
        }
        Ok(())
    }
}
