use std::fmt;
use std::str::FromStr;

mod error;

pub use error::{Error, Result};

/// Address family of a listening socket, spelled the way the conntrack CLI
/// spells it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Family {
    Ipv4,
    Ipv6,
}

impl Family {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ipv4 => "ipv4",
            Self::Ipv6 => "ipv6",
        }
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Family {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "ipv4" => Ok(Self::Ipv4),
            "ipv6" => Ok(Self::Ipv6),
            other => Err(Error::InvalidFamily(other.to_owned())),
        }
    }
}

/// Transport protocol of a listening socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Proto {
    Tcp,
    Udp,
}

impl Proto {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Tcp => "tcp",
            Self::Udp => "udp",
        }
    }
}

impl fmt::Display for Proto {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Proto {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "tcp" => Ok(Self::Tcp),
            "udp" => Ok(Self::Udp),
            other => Err(Error::InvalidProto(other.to_owned())),
        }
    }
}

/// One discovered listening socket.
///
/// Immutable after discovery. The discovered set may contain duplicates: a
/// wildcard bind expands to one ipv4 and one ipv6 entry, each monitored by
/// its own watcher. The connection tracker filters by family, so the two
/// watchers of a single wildcard listener observe disjoint flows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Socket {
    pub family: Family,
    pub proto: Proto,
    pub port: u16,
}

impl Socket {
    pub fn new(family: Family, proto: Proto, port: u16) -> Self {
        Self {
            family,
            proto,
            port,
        }
    }
}

impl fmt::Display for Socket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}:{}", self.proto, self.family, self.port)
    }
}

/// Parses a port token from external tool output.
///
/// # Errors
///
/// Returns [`Error::InvalidPort`] if the token is not a valid port number.
pub fn parse_port(s: &str) -> Result<u16> {
    s.parse().map_err(|_| Error::InvalidPort(s.to_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_family_round_trip() {
        assert_eq!("ipv4".parse::<Family>().unwrap(), Family::Ipv4);
        assert_eq!("ipv6".parse::<Family>().unwrap(), Family::Ipv6);
        assert_eq!(Family::Ipv4.to_string(), "ipv4");
        assert_eq!(Family::Ipv6.to_string(), "ipv6");
    }

    #[test]
    fn test_family_rejects_unknown() {
        let err = "inet".parse::<Family>().unwrap_err();
        assert!(matches!(err, Error::InvalidFamily(_)));
    }

    #[test]
    fn test_proto_round_trip() {
        assert_eq!("tcp".parse::<Proto>().unwrap(), Proto::Tcp);
        assert_eq!("udp".parse::<Proto>().unwrap(), Proto::Udp);
        assert_eq!(Proto::Tcp.to_string(), "tcp");
        assert_eq!(Proto::Udp.to_string(), "udp");
    }

    #[test]
    fn test_proto_rejects_unknown() {
        let err = "sctp".parse::<Proto>().unwrap_err();
        assert!(matches!(err, Error::InvalidProto(_)));
    }

    #[test]
    fn test_socket_display() {
        let socket = Socket::new(Family::Ipv6, Proto::Tcp, 8080);
        assert_eq!(socket.to_string(), "tcp/ipv6:8080");
    }

    #[test]
    fn test_parse_port() {
        assert_eq!(parse_port("80").unwrap(), 80);
        assert!(parse_port("").is_err());
        assert!(parse_port("http").is_err());
        assert!(parse_port("70000").is_err());
    }
}
