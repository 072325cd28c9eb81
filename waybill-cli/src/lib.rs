//! Command-line interface for planning trips with the Waybill engine.
#![forbid(unsafe_code)]

use clap::{Parser, Subcommand};

mod error;
mod fs;
mod plan;

pub use error::CliError;

use plan::PlanArgs;

const ARG_REQUEST: &str = "request";
const ARG_ORS_API_KEY: &str = "ors-api-key";
const ARG_ORS_BASE_URL: &str = "ors-base-url";
const ARG_NOMINATIM_BASE_URL: &str = "nominatim-base-url";
const ARG_COUNTRIES: &str = "countries";
const ARG_START_DATE: &str = "start-date";
const ARG_OUTPUT: &str = "output";
const ENV_REQUEST: &str = "WAYBILL_CMDS_PLAN_REQUEST_PATH";
const ENV_ORS_API_KEY: &str = "WAYBILL_CMDS_PLAN_ORS_API_KEY";

/// Run the Waybill CLI with the current process arguments and environment.
///
/// # Errors
///
/// Returns [`CliError`] when arguments or configuration are invalid, the
/// request cannot be read, or planning fails. A failed plan still writes its
/// error payload before returning.
pub fn run() -> Result<(), CliError> {
    let cli = Cli::try_parse().map_err(CliError::ArgumentParsing)?;
    match cli.command {
        Command::Plan(args) => plan::run_plan(args),
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "waybill",
    about = "Plan freight trips with fuel stops, rest stops and duty logs",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Plan a trip from a JSON request.
    Plan(PlanArgs),
}

#[cfg(test)]
mod tests;
