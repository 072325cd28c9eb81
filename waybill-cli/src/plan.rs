//! Plan command implementation for the Waybill CLI.

use std::io::{BufReader, Write};

use camino::{Utf8Path, Utf8PathBuf};
use chrono::{Local, NaiveDate};
use clap::Parser;
use log::info;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};
use waybill_core::{
    DutyLogSimulator, PlannerConfig, Services, ThreadPause, TripPipeline, TripRequest,
};
use waybill_data::{
    MemoryCache,
    nominatim::{DEFAULT_NOMINATIM_BASE_URL, NominatimClient, NominatimConfig},
    ors::{DEFAULT_ORS_BASE_URL, OrsClient, OrsConfig},
};

use crate::{
    ARG_COUNTRIES, ARG_NOMINATIM_BASE_URL, ARG_ORS_API_KEY, ARG_ORS_BASE_URL, ARG_OUTPUT,
    ARG_REQUEST, ARG_START_DATE, CliError, ENV_ORS_API_KEY, ENV_REQUEST, fs,
};

/// CLI arguments for the `plan` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Plan a trip described by a JSON request with \
                 current_location, pickup_location, dropoff_location and \
                 current_cycle_used. Routing and geocoding use \
                 OpenRouteService; fuel and rest areas come from Nominatim.",
    about = "Plan stops and duty logs for a trip"
)]
#[ortho_config(prefix = "WAYBILL")]
pub(crate) struct PlanArgs {
    /// Path to a JSON file containing a trip request.
    #[arg(value_name = "path")]
    #[serde(default)]
    pub(crate) request_path: Option<Utf8PathBuf>,
    /// OpenRouteService API key.
    #[arg(long = ARG_ORS_API_KEY, value_name = "key")]
    #[serde(default)]
    pub(crate) ors_api_key: Option<String>,
    /// Base URL for OpenRouteService.
    #[arg(long = ARG_ORS_BASE_URL, value_name = "url")]
    #[serde(default)]
    pub(crate) ors_base_url: Option<String>,
    /// Base URL for Nominatim.
    #[arg(long = ARG_NOMINATIM_BASE_URL, value_name = "url")]
    #[serde(default)]
    pub(crate) nominatim_base_url: Option<String>,
    /// Comma-separated ISO country codes searched for stops (default "us,ca").
    #[arg(long = ARG_COUNTRIES, value_name = "codes")]
    #[serde(default)]
    pub(crate) countries: Option<String>,
    /// Date of the first log day (default: today).
    #[arg(long = ARG_START_DATE, value_name = "YYYY-MM-DD")]
    #[serde(default)]
    pub(crate) start_date: Option<NaiveDate>,
    /// Write the response here instead of stdout.
    #[arg(long = ARG_OUTPUT, value_name = "path")]
    #[serde(default)]
    pub(crate) output: Option<Utf8PathBuf>,
}

impl PlanArgs {
    pub(crate) fn into_config(self) -> Result<PlanConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        PlanConfig::try_from(merged)
    }
}

/// Resolved `plan` command configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PlanConfig {
    pub(crate) request_path: Utf8PathBuf,
    pub(crate) ors_api_key: String,
    pub(crate) ors_base_url: String,
    pub(crate) nominatim_base_url: String,
    pub(crate) countries: Vec<String>,
    pub(crate) start_date: NaiveDate,
    pub(crate) output: Option<Utf8PathBuf>,
}

impl PlanConfig {
    pub(crate) fn validate_sources(&self) -> Result<(), CliError> {
        let path = &self.request_path;
        match fs::file_is_file(path) {
            Ok(true) => Ok(()),
            Ok(false) => Err(CliError::SourcePathNotFile {
                field: ARG_REQUEST,
                path: path.clone(),
            }),
            Err(source) if source.kind() == std::io::ErrorKind::NotFound => {
                Err(CliError::MissingSourceFile {
                    field: ARG_REQUEST,
                    path: path.clone(),
                })
            }
            Err(source) => Err(CliError::InspectSourcePath {
                field: ARG_REQUEST,
                path: path.clone(),
                source,
            }),
        }
    }

    fn planner_config(&self) -> PlannerConfig {
        PlannerConfig::default().with_countries(self.countries.iter().cloned())
    }
}

impl TryFrom<PlanArgs> for PlanConfig {
    type Error = CliError;

    fn try_from(args: PlanArgs) -> Result<Self, Self::Error> {
        let request_path = args.request_path.ok_or(CliError::MissingArgument {
            field: ARG_REQUEST,
            env: ENV_REQUEST,
        })?;
        let ors_api_key = args
            .ors_api_key
            .filter(|key| !key.trim().is_empty())
            .ok_or(CliError::MissingArgument {
                field: ARG_ORS_API_KEY,
                env: ENV_ORS_API_KEY,
            })?;
        let countries = match args.countries {
            Some(list) => parse_countries(&list)?,
            None => PlannerConfig::default().countries,
        };

        Ok(Self {
            request_path,
            ors_api_key,
            ors_base_url: args
                .ors_base_url
                .unwrap_or_else(|| DEFAULT_ORS_BASE_URL.to_owned()),
            nominatim_base_url: args
                .nominatim_base_url
                .unwrap_or_else(|| DEFAULT_NOMINATIM_BASE_URL.to_owned()),
            countries,
            start_date: args
                .start_date
                .unwrap_or_else(|| Local::now().date_naive()),
            output: args.output,
        })
    }
}

/// Split a comma-separated list of ISO 3166-1 alpha-2 codes, lowercasing
/// each. An empty list falls back to the planner default.
fn parse_countries(list: &str) -> Result<Vec<String>, CliError> {
    let codes: Vec<String> = list
        .split(',')
        .map(str::trim)
        .filter(|code| !code.is_empty())
        .map(|code| {
            if code.len() == 2 && code.chars().all(|c| c.is_ascii_alphabetic()) {
                Ok(code.to_ascii_lowercase())
            } else {
                Err(CliError::InvalidCountryCode {
                    field: ARG_COUNTRIES,
                    code: code.to_owned(),
                })
            }
        })
        .collect::<Result<_, _>>()?;
    if codes.is_empty() {
        return Ok(PlannerConfig::default().countries);
    }
    Ok(codes)
}

/// A set of long-lived service clients.
pub(crate) trait ServiceSet {
    fn services(&self) -> Services<'_>;
}

/// Builds the service clients for the current plan invocation.
pub(crate) trait ServicesBuilder {
    fn build(&self, config: &PlanConfig) -> Result<Box<dyn ServiceSet>, CliError>;
}

struct HttpServices {
    ors: OrsClient,
    nominatim: NominatimClient,
    cache: MemoryCache,
    pause: ThreadPause,
}

impl ServiceSet for HttpServices {
    fn services(&self) -> Services<'_> {
        Services {
            geocoder: &self.ors,
            reverse_geocoder: &self.nominatim,
            router: &self.ors,
            search: &self.nominatim,
            cache: &self.cache,
            pause: &self.pause,
        }
    }
}

pub(crate) struct HttpServicesBuilder;

impl ServicesBuilder for HttpServicesBuilder {
    fn build(&self, config: &PlanConfig) -> Result<Box<dyn ServiceSet>, CliError> {
        let ors_config = OrsConfig::new(config.ors_api_key.clone())
            .with_base_url(config.ors_base_url.clone());
        let ors = OrsClient::with_config(ors_config).map_err(|source| CliError::BuildProvider {
            service: "OpenRouteService",
            base_url: config.ors_base_url.clone(),
            source,
        })?;
        let nominatim =
            NominatimClient::with_config(NominatimConfig::new(config.nominatim_base_url.clone()))
                .map_err(|source| CliError::BuildProvider {
                    service: "Nominatim",
                    base_url: config.nominatim_base_url.clone(),
                    source,
                })?;
        Ok(Box::new(HttpServices {
            ors,
            nominatim,
            cache: MemoryCache::default(),
            pause: ThreadPause,
        }))
    }
}

pub(crate) fn run_plan(args: PlanArgs) -> Result<(), CliError> {
    let mut stdout = std::io::stdout().lock();
    run_plan_with(args, &HttpServicesBuilder, &mut stdout)
}

/// Plan the requested trip and write the response.
///
/// Pipeline failures still produce output: the error payload is written
/// before [`CliError::Plan`] is returned.
pub(crate) fn run_plan_with(
    args: PlanArgs,
    builder: &dyn ServicesBuilder,
    writer: &mut dyn Write,
) -> Result<(), CliError> {
    let config = args.into_config()?;
    config.validate_sources()?;
    let request = load_trip_request(&config.request_path)?;
    let services = builder.build(&config)?;
    let planner_config = config.planner_config();
    let pipeline = TripPipeline::new(
        services.services(),
        &planner_config,
        DutyLogSimulator::new(config.start_date),
    );

    info!(
        "planning {} -> {} -> {}",
        request.current_location, request.pickup_location, request.dropoff_location
    );
    match pipeline.plan_trip(&request) {
        Ok(plan) => {
            info!(
                "planned {} miles with {} stops over {} log records",
                plan.total_miles,
                plan.stops.len(),
                plan.eld_logs.len()
            );
            write_response(&config, writer, &plan)
        }
        Err(err) => {
            write_response(&config, writer, &err.to_response())?;
            Err(CliError::Plan(err))
        }
    }
}

/// Loads a JSON-encoded [`TripRequest`] from disk.
pub(crate) fn load_trip_request(path: &Utf8Path) -> Result<TripRequest, CliError> {
    let file = fs::open_utf8_file(path).map_err(|source| CliError::OpenTripRequest {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_reader(BufReader::new(file)).map_err(|source| CliError::ParseTripRequest {
        path: path.to_path_buf(),
        source,
    })
}

fn write_response<T: Serialize>(
    config: &PlanConfig,
    writer: &mut dyn Write,
    response: &T,
) -> Result<(), CliError> {
    let mut payload =
        serde_json::to_string_pretty(response).map_err(CliError::SerialiseResponse)?;
    payload.push('\n');
    if let Some(path) = &config.output {
        return fs::write_utf8_file(path, payload.as_bytes()).map_err(|source| {
            CliError::WriteOutputFile {
                path: path.clone(),
                source,
            }
        });
    }
    writer
        .write_all(payload.as_bytes())
        .map_err(CliError::WriteOutput)
}

#[cfg(test)]
pub(crate) fn config_from_layers_for_test(
    layers: Vec<ortho_config::MergeLayer<'static>>,
) -> Result<PlanConfig, CliError> {
    let merged = PlanArgs::merge_from_layers(layers).map_err(CliError::from)?;
    PlanConfig::try_from(merged)
}
