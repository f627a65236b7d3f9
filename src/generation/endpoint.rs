//! Generation service endpoint parsing

use std::fmt;
use tungstenite::http::Uri;

use crate::error::GenerationError;

/// A validated plain `ws://` endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    uri: String,
    host: String,
    port: u16,
}

impl Endpoint {
    pub fn parse(raw: &str) -> Result<Self, GenerationError> {
        let invalid =
            |reason: &str| GenerationError::InvalidEndpoint(format!("{}: {}", raw, reason));

        let uri: Uri = raw.parse().map_err(|_| invalid("not a URI"))?;

        match uri.scheme_str() {
            Some("ws") => {}
            Some("wss") => return Err(invalid("TLS endpoints are not supported")),
            _ => return Err(invalid("scheme must be ws://")),
        }

        let host = uri
            .host()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| invalid("missing host"))?
            .trim_start_matches('[')
            .trim_end_matches(']')
            .to_string();
        let port = uri.port_u16().unwrap_or(80);

        Ok(Self {
            uri: raw.to_string(),
            host,
            port,
        })
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.uri)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_default_endpoint() {
        let endpoint = Endpoint::parse("ws://localhost:8001").unwrap();
        assert_eq!(endpoint.host(), "localhost");
        assert_eq!(endpoint.port(), 8001);
        assert_eq!(endpoint.uri(), "ws://localhost:8001");
    }

    #[test]
    fn test_parse_default_port_and_path() {
        let endpoint = Endpoint::parse("ws://gen.internal/batch").unwrap();
        assert_eq!(endpoint.host(), "gen.internal");
        assert_eq!(endpoint.port(), 80);
    }

    #[test]
    fn test_parse_ipv6() {
        let endpoint = Endpoint::parse("ws://[::1]:9000").unwrap();
        assert_eq!(endpoint.host(), "::1");
        assert_eq!(endpoint.port(), 9000);
    }

    #[test]
    fn test_rejects_invalid() {
        for raw in ["wss://gen.internal", "http://gen.internal", "not a uri", "localhost:8001"] {
            assert!(
                matches!(Endpoint::parse(raw), Err(GenerationError::InvalidEndpoint(_))),
                "{} should be rejected",
                raw
            );
        }
    }
}
