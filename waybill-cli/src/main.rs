//! Entry point for the command-line interface.
#![forbid(unsafe_code)]

use tracing_subscriber::EnvFilter;

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = waybill_cli::run() {
        report(&err);
        std::process::exit(1);
    }
}

#[expect(
    clippy::print_stderr,
    reason = "the top-level error is the command's only human-readable output"
)]
fn report(err: &waybill_cli::CliError) {
    eprintln!("waybill: {err}");
}
