use std::fmt;
use std::str::FromStr;

use crate::error::EndpointError;

/// HTTP endpoint paths for the Zenea block protocol.
pub mod endpoints {
    /// `GET|HEAD /block/{id}` fetches or probes one block; `POST /block` stores one.
    pub const BLOCK: &str = "/block";
    /// `GET /blocks` lists every identifier, comma-separated.
    pub const BLOCKS: &str = "/blocks";
}

/// Port a Zenea server listens on unless told otherwise.
pub const DEFAULT_PORT: u16 = 4096;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Scheme {
    Http,
    Https,
}

impl Scheme {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Http => "http",
            Self::Https => "https",
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Scheme {
    type Err = EndpointError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "http" => Ok(Self::Http),
            "https" => Ok(Self::Https),
            other => Err(EndpointError::UnknownScheme(other.to_string())),
        }
    }
}

/// Address of a remote Zenea server: `scheme://host:port`.
///
/// IPv6 hosts are written in brackets (`http://[::1]:4096`); the port
/// defaults to [`DEFAULT_PORT`] when omitted.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct RemoteEndpoint {
    scheme: Scheme,
    host: String,
    port: u16,
}

impl RemoteEndpoint {
    pub fn new(scheme: Scheme, host: impl Into<String>, port: u16) -> Self {
        Self {
            scheme,
            host: host.into(),
            port,
        }
    }

    pub fn http(host: impl Into<String>, port: u16) -> Self {
        Self::new(Scheme::Http, host, port)
    }

    pub fn scheme(&self) -> Scheme {
        self.scheme
    }

    /// Host name or address, without IPv6 brackets.
    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Absolute URL of `path` on this endpoint.
    pub fn url(&self, path: &str) -> String {
        format!("{self}{path}")
    }

    fn is_ipv6(&self) -> bool {
        self.host.contains(':')
    }
}

impl fmt::Display for RemoteEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_ipv6() {
            write!(f, "{}://[{}]:{}", self.scheme, self.host, self.port)
        } else {
            write!(f, "{}://{}:{}", self.scheme, self.host, self.port)
        }
    }
}

fn valid_hostname(host: &str) -> bool {
    !host.is_empty()
        && host
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'.' || b == b'-')
}

fn valid_ipv6(host: &str) -> bool {
    !host.is_empty() && host.bytes().all(|b| b.is_ascii_hexdigit() || b == b':' || b == b'.')
}

impl FromStr for RemoteEndpoint {
    type Err = EndpointError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (scheme, rest) = s
            .split_once("://")
            .ok_or_else(|| EndpointError::MissingScheme(s.to_string()))?;
        let scheme: Scheme = scheme.parse()?;
        let rest = rest.strip_suffix('/').unwrap_or(rest);
        if rest.is_empty() {
            return Err(EndpointError::MissingHost(s.to_string()));
        }

        let (host, port) = if let Some(bracketed) = rest.strip_prefix('[') {
            let (host, tail) = bracketed
                .split_once(']')
                .ok_or_else(|| EndpointError::InvalidHost(rest.to_string()))?;
            if !valid_ipv6(host) {
                return Err(EndpointError::InvalidHost(host.to_string()));
            }
            let port = match tail {
                "" => None,
                tail => Some(
                    tail.strip_prefix(':')
                        .ok_or_else(|| EndpointError::InvalidPort(tail.to_string()))?,
                ),
            };
            (host, port)
        } else {
            let (host, port) = match rest.rsplit_once(':') {
                Some((host, port)) => (host, Some(port)),
                None => (rest, None),
            };
            if !valid_hostname(host) {
                return Err(EndpointError::InvalidHost(host.to_string()));
            }
            (host, port)
        };

        let port = match port {
            Some(port) => port
                .parse::<u16>()
                .map_err(|_| EndpointError::InvalidPort(port.to_string()))?,
            None => DEFAULT_PORT,
        };
        Ok(Self::new(scheme, host, port))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_full_endpoint() {
        let ep: RemoteEndpoint = "https://blocks.example.org:8443".parse().unwrap();
        assert_eq!(ep.scheme(), Scheme::Https);
        assert_eq!(ep.host(), "blocks.example.org");
        assert_eq!(ep.port(), 8443);
        assert_eq!(ep.to_string(), "https://blocks.example.org:8443");
    }

    #[test]
    fn default_port_and_trailing_slash() {
        let ep: RemoteEndpoint = "http://localhost/".parse().unwrap();
        assert_eq!(ep, RemoteEndpoint::http("localhost", DEFAULT_PORT));
        assert_eq!(ep.to_string(), "http://localhost:4096");
    }

    #[test]
    fn ipv6_hosts_keep_brackets_in_display() {
        let ep: RemoteEndpoint = "http://[::1]:9000".parse().unwrap();
        assert_eq!(ep.host(), "::1");
        assert_eq!(ep.to_string(), "http://[::1]:9000");
        assert_eq!(ep.url(endpoints::BLOCKS), "http://[::1]:9000/blocks");

        let ep: RemoteEndpoint = "http://[fe80::1]".parse().unwrap();
        assert_eq!(ep.port(), DEFAULT_PORT);
    }

    #[test]
    fn rejects_malformed() {
        assert!(matches!(
            "localhost:4096".parse::<RemoteEndpoint>(),
            Err(EndpointError::MissingScheme(_))
        ));
        assert!(matches!(
            "ftp://host:1".parse::<RemoteEndpoint>(),
            Err(EndpointError::UnknownScheme(_))
        ));
        assert!(matches!(
            "http://".parse::<RemoteEndpoint>(),
            Err(EndpointError::MissingHost(_))
        ));
        assert!(matches!(
            "http://host:port".parse::<RemoteEndpoint>(),
            Err(EndpointError::InvalidPort(_))
        ));
        assert!(matches!(
            "http://host:70000".parse::<RemoteEndpoint>(),
            Err(EndpointError::InvalidPort(_))
        ));
        assert!(matches!(
            "http://ho st:1".parse::<RemoteEndpoint>(),
            Err(EndpointError::InvalidHost(_))
        ));
        assert!(matches!(
            "http://host/path".parse::<RemoteEndpoint>(),
            Err(EndpointError::InvalidHost(_))
        ));
        assert!(matches!(
            "http://[::1".parse::<RemoteEndpoint>(),
            Err(EndpointError::InvalidHost(_))
        ));
    }

    #[test]
    fn endpoint_paths() {
        assert_eq!(endpoints::BLOCK, "/block");
        assert_eq!(endpoints::BLOCKS, "/blocks");
    }
}
