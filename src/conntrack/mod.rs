//! Interface to the kernel connection-tracking table, as exposed by the
//! `conntrack` command-line tool.
//!
//! The [`ConnectionTracker`] trait is the seam the watchers depend on: a
//! one-shot baseline count plus a live open/close event subscription per
//! filter. [`ConntrackCli`] is the production implementation; tests substitute
//! scripted trackers. No ordering or completeness guarantee is made relative
//! to the kernel table itself.

use std::fmt;
use std::process::Stdio;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;

use crate::socket::Socket;

mod error;
mod parser;

pub use error::{Error, Result};

const CONNTRACK_BIN: &str = "conntrack";
const EVENT_BUFFER: usize = 64;

/// A single live change to the tracking table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Opened,
    Closed,
}

impl EventKind {
    /// Contribution of this event to the connection gauge.
    pub fn delta(self) -> i64 {
        match self {
            Self::Opened => 1,
            Self::Closed => -1,
        }
    }
}

/// Selects which tracking-table entries one watcher observes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    /// Match a discovered socket by family, protocol, and destination port.
    Socket(Socket),
    /// Raw conntrack arguments supplied on the command line in place of
    /// automatic socket discovery.
    Raw(Vec<String>),
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Socket(socket) => write!(f, "{socket}"),
            Self::Raw(args) => f.write_str(&args.join(" ")),
        }
    }
}

/// Supplies the baseline connection count and the live event feed for a
/// filter.
pub trait ConnectionTracker {
    /// Counts the connections already matching the filter at the moment
    /// monitoring begins.
    fn baseline(&self, filter: &Filter) -> impl std::future::Future<Output = Result<i64>> + Send;

    /// Subscribes to subsequent open/close events for the filter.
    ///
    /// The sequence is unbounded and blocks indefinitely for lack of events;
    /// the channel closing means the subscription ended.
    fn subscribe(
        &self,
        filter: &Filter,
    ) -> impl std::future::Future<Output = Result<mpsc::Receiver<EventKind>>> + Send;
}

/// Production tracker backed by the `conntrack` binary.
///
/// Requires the privileges conntrack itself needs (typically root or
/// CAP_NET_ADMIN).
#[derive(Debug, Clone, Copy, Default)]
pub struct ConntrackCli;

fn command_args(mode_args: &[&str], filter: &Filter) -> Vec<String> {
    let mut args: Vec<String> = mode_args.iter().map(|s| (*s).to_owned()).collect();
    match filter {
        Filter::Socket(socket) => {
            args.push("--family".to_owned());
            args.push(socket.family.as_str().to_owned());
            args.push("--proto".to_owned());
            args.push(socket.proto.as_str().to_owned());
            args.push("--dport".to_owned());
            args.push(socket.port.to_string());
        }
        Filter::Raw(raw) => args.extend(raw.iter().cloned()),
    }
    args
}

impl ConnectionTracker for ConntrackCli {
    async fn baseline(&self, filter: &Filter) -> Result<i64> {
        let args = command_args(&["--dump"], filter);
        log::info!("{} {}", CONNTRACK_BIN, args.join(" "));
        let output = Command::new(CONNTRACK_BIN)
            .args(&args)
            .stderr(Stdio::null())
            .output()
            .await
            .map_err(Error::Spawn)?;
        if !output.status.success() {
            return Err(Error::DumpStatus(output.status));
        }
        let listing = String::from_utf8(output.stdout).map_err(Error::DumpEncoding)?;
        Ok(parser::count_entries(&listing))
    }

    async fn subscribe(&self, filter: &Filter) -> Result<mpsc::Receiver<EventKind>> {
        let args = command_args(&["--event", "--event-mask", "NEW,DESTROY"], filter);
        log::info!("{} {}", CONNTRACK_BIN, args.join(" "));
        let mut child = Command::new(CONNTRACK_BIN)
            .args(&args)
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(Error::Spawn)?;
        let stdout = child.stdout.take().expect("stdout is piped");

        let (tx, rx) = mpsc::channel(EVENT_BUFFER);
        let tag = filter.to_string();
        tokio::spawn(async move {
            if pump_events(BufReader::new(stdout), &tx, &tag).await == PumpEnd::ReceiverClosed {
                // Subscriber went away; conntrack never exits on its own, so
                // stop it before reaping.
                let _ = child.start_kill();
            }
            match child.wait().await {
                Ok(status) => log::warn!("[{tag}] conntrack event feed ended with {status}"),
                Err(err) => log::error!("[{tag}] failed to reap conntrack: {err}"),
            }
        });

        Ok(rx)
    }
}

/// Why an event pump stopped forwarding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PumpEnd {
    /// The source closed its output.
    SourceClosed,
    /// The subscriber dropped its receiver.
    ReceiverClosed,
    ReadFailed,
}

/// Forwards parsed events from `reader` into `tx` until either side goes
/// away.
async fn pump_events<R>(reader: R, tx: &mpsc::Sender<EventKind>, tag: &str) -> PumpEnd
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                if let Some(kind) = parser::parse_event_line(&line) {
                    if tx.send(kind).await.is_err() {
                        return PumpEnd::ReceiverClosed;
                    }
                }
            }
            Ok(None) => return PumpEnd::SourceClosed,
            Err(err) => {
                log::error!("[{tag}] event stream read failed: {err}");
                return PumpEnd::ReadFailed;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::socket::{Family, Proto};

    #[test]
    fn test_socket_filter_args() {
        let filter = Filter::Socket(Socket::new(Family::Ipv4, Proto::Tcp, 80));
        assert_eq!(
            command_args(&["--dump"], &filter),
            vec!["--dump", "--family", "ipv4", "--proto", "tcp", "--dport", "80"]
        );
    }

    #[test]
    fn test_raw_filter_args_pass_through() {
        let filter = Filter::Raw(vec![
            "--proto".to_owned(),
            "tcp".to_owned(),
            "--dport".to_owned(),
            "443".to_owned(),
        ]);
        assert_eq!(
            command_args(&["--event", "--event-mask", "NEW,DESTROY"], &filter),
            vec!["--event", "--event-mask", "NEW,DESTROY", "--proto", "tcp", "--dport", "443"]
        );
    }

    #[test]
    fn test_filter_display() {
        let socket = Filter::Socket(Socket::new(Family::Ipv6, Proto::Udp, 53));
        assert_eq!(socket.to_string(), "udp/ipv6:53");
        let raw = Filter::Raw(vec!["--proto".to_owned(), "udp".to_owned()]);
        assert_eq!(raw.to_string(), "--proto udp");
    }

    #[test]
    fn test_event_deltas() {
        assert_eq!(EventKind::Opened.delta(), 1);
        assert_eq!(EventKind::Closed.delta(), -1);
    }

    #[tokio::test]
    async fn test_pump_forwards_until_source_closes() {
        let input = "\
    [NEW] tcp      6 120 SYN_SENT src=10.0.0.5 dst=10.0.0.9 sport=53370 dport=80
 [UPDATE] tcp      6 432000 ESTABLISHED src=10.0.0.5 dst=10.0.0.9 sport=53370 dport=80
[DESTROY] tcp      6 src=10.0.0.5 dst=10.0.0.9 sport=53370 dport=80
";
        let (tx, mut rx) = mpsc::channel(16);

        let end = pump_events(input.as_bytes(), &tx, "test").await;
        assert_eq!(end, PumpEnd::SourceClosed);

        drop(tx);
        assert_eq!(rx.recv().await, Some(EventKind::Opened));
        assert_eq!(rx.recv().await, Some(EventKind::Closed));
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test]
    async fn test_pump_reports_a_dropped_receiver() {
        // With nobody listening, the pump must stop instead of draining the
        // source forever; subscribe kills the conntrack child on this path.
        let input = "[NEW] tcp      6 120 SYN_SENT src=10.0.0.5 dst=10.0.0.9 sport=53370 dport=80\n";
        let (tx, rx) = mpsc::channel(1);
        drop(rx);

        let end = pump_events(input.as_bytes(), &tx, "test").await;
        assert_eq!(end, PumpEnd::ReceiverClosed);
    }
}
