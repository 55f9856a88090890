//! Listening-socket discovery for a single process, via `ss -tunlp`.

use crate::socket::{self, Family, Proto, Socket};

use super::{Error, Result, capture};

/// Discovers the listening sockets owned by `pid`.
///
/// # Errors
///
/// Fails if `ss` cannot be run or a line owned by the pid does not parse.
pub fn pid_sockets(pid: i32) -> Result<Vec<Socket>> {
    let listing = capture("ss", &["-tunlp"])?;
    parse_listing(&listing, pid)
}

/// Extracts the sockets owned by `pid` from an `ss -tunlp` listing.
///
/// A listing line reads
/// `tcp LISTEN 0 128 0.0.0.0:22 0.0.0.0:* users:(("sshd",pid=1234,fd=3))`.
/// The netid column carries the protocol and the fifth column the local
/// address; ownership is matched on the exact `pid=<pid>,` token so pid 123
/// never matches pid 1234. Lines for other processes (including the header)
/// are skipped entirely.
pub(crate) fn parse_listing(listing: &str, pid: i32) -> Result<Vec<Socket>> {
    let needle = format!("pid={pid},");
    let mut sockets = Vec::new();
    for line in listing.lines() {
        if !line.contains(&needle) {
            continue;
        }
        parse_line(line, &mut sockets)?;
    }
    Ok(sockets)
}

fn parse_line(line: &str, out: &mut Vec<Socket>) -> Result<()> {
    let mut fields = line.split_whitespace();
    let proto: Proto = fields
        .next()
        .ok_or_else(|| Error::MissingField {
            field: "netid",
            line: line.to_owned(),
        })?
        .parse()
        .map_err(|source| Error::InvalidSocket {
            line: line.to_owned(),
            source,
        })?;
    let local = fields.nth(3).ok_or_else(|| Error::MissingField {
        field: "local address",
        line: line.to_owned(),
    })?;
    let (addr, port) = local.rsplit_once(':').ok_or_else(|| Error::MissingField {
        field: "port separator",
        line: line.to_owned(),
    })?;
    let port = socket::parse_port(port).map_err(|source| Error::InvalidSocket {
        line: line.to_owned(),
        source,
    })?;

    // `*` is a bind to every address of both families; `[...]` is an ipv6
    // literal; anything else (including `0.0.0.0`) is ipv4.
    if addr == "*" {
        out.push(Socket::new(Family::Ipv4, proto, port));
        out.push(Socket::new(Family::Ipv6, proto, port));
    } else if addr.starts_with('[') {
        out.push(Socket::new(Family::Ipv6, proto, port));
    } else {
        out.push(Socket::new(Family::Ipv4, proto, port));
    }
    Ok(())
}
