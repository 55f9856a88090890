use clap::Parser;

/// Entry point for the connfreeze pause/resume tool.
///
/// Suspends the selected target while it has no tracked network connections
/// and resumes it as soon as activity reappears. Must run with privileges
/// sufficient to signal the target, read the cgroup filesystem, or drive the
/// service/container managers, and should only be started after the target is
/// ready to accept connections.
///
/// # Errors
///
/// Returns an error if socket discovery or signal-handler installation fails;
/// the target is resumed before the process exits either way.
///
/// # Examples
///
/// ```bash
/// RUST_LOG=info connfreeze --service nginx
/// ```
#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = connfreeze::cli::Cli::parse();
    connfreeze::run(args).await
}
