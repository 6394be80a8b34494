//! Cross-origin response origin selection.
//!
//! The policy echoes a caller's declared origin only when it is one of the
//! origins the deployment already trusts: the configured front-end origin,
//! the origin the request arrived on, or the API's own public origin. Any
//! other declared origin is answered with the configured front-end origin,
//! which a browser will then refuse for the foreign caller.

use std::fmt;

use url::Url;

/// A URL that could not be parsed while computing an origin.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid URL `{value}`: {source}")]
pub struct OriginParseError {
    value: String,
    #[source]
    source: url::ParseError,
}

impl OriginParseError {
    /// The offending input.
    pub fn value(&self) -> &str {
        &self.value
    }
}

fn parse_url(value: &str) -> Result<Url, OriginParseError> {
    Url::parse(value).map_err(|source| OriginParseError {
        value: value.to_owned(),
        source,
    })
}

/// ASCII serialisation of a URL's scheme, host and non-default port.
///
/// # Examples
/// ```
/// use chatroom_backend::domain::Origin;
///
/// let origin = Origin::from_url("http://api.example.com/reference")?;
/// assert_eq!(origin.as_ref(), "http://api.example.com");
/// # Ok::<(), chatroom_backend::domain::OriginParseError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Origin(String);

impl Origin {
    /// Parse `url` and keep only its origin.
    ///
    /// URLs without a tuple origin (e.g. custom schemes) serialise as
    /// `"null"`.
    pub fn from_url(url: &str) -> Result<Self, OriginParseError> {
        let parsed = parse_url(url)?;
        Ok(Self(parsed.origin().ascii_serialization()))
    }
}

impl AsRef<str> for Origin {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<Origin> for String {
    fn from(value: Origin) -> Self {
        value.0
    }
}

/// Validated CORS origin configuration.
///
/// The trusted fallback origin is kept exactly as configured: it is compared
/// against declared origins and echoed back verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorsOriginPolicy {
    trusted_fallback_origin: String,
    api_origin: Origin,
}

impl CorsOriginPolicy {
    /// Validate the configured origins.
    ///
    /// # Errors
    ///
    /// Returns [`OriginParseError`] when either value is not a valid URL.
    pub fn new(
        trusted_fallback_origin: impl Into<String>,
        api_base_url: &str,
    ) -> Result<Self, OriginParseError> {
        let trusted_fallback_origin = trusted_fallback_origin.into();
        parse_url(&trusted_fallback_origin)?;
        let api_origin = Origin::from_url(api_base_url)?;
        Ok(Self {
            trusted_fallback_origin,
            api_origin,
        })
    }

    /// The configured fallback origin.
    pub fn trusted_fallback_origin(&self) -> &str {
        &self.trusted_fallback_origin
    }

    /// Origin derived from the API base URL.
    pub fn api_origin(&self) -> &Origin {
        &self.api_origin
    }

    /// Pick the origin to echo for a request.
    ///
    /// - no declared origin (absent or empty): the request's own origin;
    /// - declared origin equal to the fallback, request or API origin: the
    ///   declared origin unchanged;
    /// - anything else: the trusted fallback origin.
    ///
    /// # Errors
    ///
    /// Returns [`OriginParseError`] when `request_url` is malformed.
    ///
    /// # Examples
    /// ```
    /// use chatroom_backend::domain::CorsOriginPolicy;
    ///
    /// let policy = CorsOriginPolicy::new("https://web.example.com", "https://auth.example.com")?;
    /// let origin = policy.resolve(Some("https://example.com"), "http://localhost/")?;
    /// assert_eq!(origin, "https://web.example.com");
    /// # Ok::<(), chatroom_backend::domain::OriginParseError>(())
    /// ```
    pub fn resolve(
        &self,
        declared_origin: Option<&str>,
        request_url: &str,
    ) -> Result<String, OriginParseError> {
        let request_origin = Origin::from_url(request_url)?;

        let Some(declared) = declared_origin.filter(|value| !value.is_empty()) else {
            return Ok(request_origin.into());
        };

        if declared == self.trusted_fallback_origin
            || declared == request_origin.as_ref()
            || declared == self.api_origin.as_ref()
        {
            return Ok(declared.to_owned());
        }

        Ok(self.trusted_fallback_origin.clone())
    }
}
