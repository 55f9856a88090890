//! Published-port discovery for a docker container.

use crate::socket::{self, Family, Proto, Socket};

use super::{Error, Result, capture};

/// Discovers the published ports of the named container.
///
/// # Errors
///
/// Fails if `docker` cannot be run (or the container does not exist) or a
/// port-mapping line does not parse.
pub fn container_sockets(name: &str) -> Result<Vec<Socket>> {
    let listing = capture("docker", &["port", name])?;
    parse_port_listing(&listing)
}

/// Parses `docker port` output, one mapping per line:
/// `80/tcp -> 0.0.0.0:8080`.
///
/// The protocol comes from the container side of the mapping and the port
/// from the host side, because conntrack sees the host-facing flow. A
/// `0.0.0.0` host address is a wildcard publish and expands to both families.
pub(crate) fn parse_port_listing(listing: &str) -> Result<Vec<Socket>> {
    let mut sockets = Vec::new();
    for line in listing.lines() {
        if line.trim().is_empty() {
            continue;
        }
        parse_line(line, &mut sockets)?;
    }
    Ok(sockets)
}

fn parse_line(line: &str, out: &mut Vec<Socket>) -> Result<()> {
    let mut fields = line.split_whitespace();
    let container_side = fields.next().ok_or_else(|| Error::MissingField {
        field: "container port",
        line: line.to_owned(),
    })?;
    let proto: Proto = container_side
        .split('/')
        .nth(1)
        .ok_or_else(|| Error::MissingField {
            field: "protocol",
            line: line.to_owned(),
        })?
        .parse()
        .map_err(|source| Error::InvalidSocket {
            line: line.to_owned(),
            source,
        })?;
    let host_side = fields.nth(1).ok_or_else(|| Error::MissingField {
        field: "host address",
        line: line.to_owned(),
    })?;
    let (addr, port) = host_side
        .rsplit_once(':')
        .ok_or_else(|| Error::MissingField {
            field: "port separator",
            line: line.to_owned(),
        })?;
    let port = socket::parse_port(port).map_err(|source| Error::InvalidSocket {
        line: line.to_owned(),
        source,
    })?;

    if addr == "0.0.0.0" {
        out.push(Socket::new(Family::Ipv4, proto, port));
        out.push(Socket::new(Family::Ipv6, proto, port));
    } else if addr.starts_with('[') {
        out.push(Socket::new(Family::Ipv6, proto, port));
    } else {
        out.push(Socket::new(Family::Ipv4, proto, port));
    }
    Ok(())
}
