//! Focused unit tests covering plan CLI configuration and request parsing.

use super::helpers::{request_json, utf8_tempdir, write_utf8};
use crate::plan::{PlanArgs, PlanConfig, config_from_layers_for_test, load_trip_request};
use crate::{ARG_COUNTRIES, ARG_ORS_API_KEY, ARG_REQUEST, CliError, ENV_ORS_API_KEY, ENV_REQUEST};
use camino::Utf8PathBuf;
use chrono::NaiveDate;
use rstest::{fixture, rstest};
use waybill_data::{nominatim::DEFAULT_NOMINATIM_BASE_URL, ors::DEFAULT_ORS_BASE_URL};

#[fixture]
fn complete_args() -> PlanArgs {
    PlanArgs {
        request_path: Some(Utf8PathBuf::from("trip.json")),
        ors_api_key: Some("key".to_owned()),
        start_date: NaiveDate::from_ymd_opt(2025, 4, 7),
        ..PlanArgs::default()
    }
}

#[rstest]
#[case::request(None, Some("key"), ARG_REQUEST, ENV_REQUEST)]
#[case::api_key(Some("trip.json"), None, ARG_ORS_API_KEY, ENV_ORS_API_KEY)]
#[case::blank_api_key(Some("trip.json"), Some("  "), ARG_ORS_API_KEY, ENV_ORS_API_KEY)]
fn converting_without_required_fields_errors(
    #[case] request: Option<&str>,
    #[case] key: Option<&str>,
    #[case] field: &'static str,
    #[case] env_var: &'static str,
) {
    let args = PlanArgs {
        request_path: request.map(Utf8PathBuf::from),
        ors_api_key: key.map(str::to_owned),
        ..PlanArgs::default()
    };

    let err = PlanConfig::try_from(args).expect_err("missing field should error");
    match err {
        CliError::MissingArgument {
            field: missing,
            env,
        } => {
            assert_eq!(missing, field);
            assert_eq!(env, env_var);
        }
        other => panic!("expected MissingArgument, found {other:?}"),
    }
}

#[rstest]
fn defaults_fill_service_urls_and_countries(complete_args: PlanArgs) {
    let config = PlanConfig::try_from(complete_args).expect("config should build");

    assert_eq!(config.ors_base_url, DEFAULT_ORS_BASE_URL);
    assert_eq!(config.nominatim_base_url, DEFAULT_NOMINATIM_BASE_URL);
    assert_eq!(config.countries, vec!["us".to_owned(), "ca".to_owned()]);
    assert_eq!(config.start_date, NaiveDate::from_ymd_opt(2025, 4, 7).expect("date"));
    assert_eq!(config.output, None);
}

#[rstest]
#[case(" US, mx ,", &["us", "mx"])]
#[case(",", &["us", "ca"])]
#[case("ca", &["ca"])]
fn countries_are_normalised(
    complete_args: PlanArgs,
    #[case] list: &str,
    #[case] expected: &[&str],
) {
    let args = PlanArgs {
        countries: Some(list.to_owned()),
        ..complete_args
    };

    let config = PlanConfig::try_from(args).expect("config should build");

    assert_eq!(config.countries, expected);
}

#[rstest]
#[case("usa")]
#[case("u1")]
fn malformed_country_codes_are_rejected(complete_args: PlanArgs, #[case] code: &str) {
    let args = PlanArgs {
        countries: Some(format!("us,{code}")),
        ..complete_args
    };

    let err = PlanConfig::try_from(args).expect_err("bad code should error");
    match err {
        CliError::InvalidCountryCode { field, code: found } => {
            assert_eq!(field, ARG_COUNTRIES);
            assert_eq!(found, code);
        }
        other => panic!("expected InvalidCountryCode, found {other:?}"),
    }
}

#[rstest]
fn validate_sources_reports_missing_request(complete_args: PlanArgs) {
    let (_tmp, root) = utf8_tempdir();
    let args = PlanArgs {
        request_path: Some(root.join("absent.json")),
        ..complete_args
    };
    let config = PlanConfig::try_from(args).expect("config should build");

    let err = config.validate_sources().expect_err("expected failure");
    match err {
        CliError::MissingSourceFile { field, .. } => assert_eq!(field, ARG_REQUEST),
        other => panic!("expected MissingSourceFile, found {other:?}"),
    }
}

#[rstest]
fn validate_sources_rejects_directories(complete_args: PlanArgs) {
    let (_tmp, root) = utf8_tempdir();
    let args = PlanArgs {
        request_path: Some(root.clone()),
        ..complete_args
    };
    let config = PlanConfig::try_from(args).expect("config should build");

    let err = config.validate_sources().expect_err("expected failure");
    match err {
        CliError::SourcePathNotFile { field, path } => {
            assert_eq!(field, ARG_REQUEST);
            assert_eq!(path, root);
        }
        other => panic!("expected SourcePathNotFile, found {other:?}"),
    }
}

#[rstest]
#[expect(clippy::float_arithmetic, reason = "tolerance comparison")]
fn load_trip_request_decodes_json() {
    let (_tmp, root) = utf8_tempdir();
    let path = root.join("trip.json");
    write_utf8(&path, request_json(12.5).as_bytes());

    let request = load_trip_request(&path).expect("request should decode");

    assert_eq!(request.pickup_location, "Chicago, IL");
    assert!((request.current_cycle_used - 12.5).abs() < f64::EPSILON);
}

#[rstest]
fn load_trip_request_rejects_invalid_json() {
    let (_tmp, root) = utf8_tempdir();
    let path = root.join("trip.json");
    write_utf8(&path, b"{ not valid json");

    let err = load_trip_request(&path).expect_err("invalid json should error");
    match err {
        CliError::ParseTripRequest { path: found, .. } => assert_eq!(found, path),
        other => panic!("expected ParseTripRequest, found {other:?}"),
    }
}

#[rstest]
fn load_trip_request_reports_open_errors() {
    let (_tmp, root) = utf8_tempdir();
    let path = root.join("trip.json");

    let err = load_trip_request(&path).expect_err("missing request should error");
    match err {
        CliError::OpenTripRequest { path: found, .. } => assert_eq!(found, path),
        other => panic!("expected OpenTripRequest, found {other:?}"),
    }
}

#[rstest]
fn merge_layers_maps_configuration_errors() {
    use ortho_config::MergeComposer;
    use serde_json::json;

    let mut composer = MergeComposer::new();
    composer.push_cli(json!({ "request_path": 42 }));

    let err = config_from_layers_for_test(composer.layers())
        .expect_err("invalid config layer should map to CliError::Configuration");
    match err {
        CliError::Configuration(_) => {}
        other => panic!("expected CliError::Configuration, found {other:?}"),
    }
}

#[rstest]
fn merge_layers_honour_precedence() {
    use ortho_config::MergeComposer;
    use serde_json::json;

    let mut composer = MergeComposer::new();
    composer.push_file(
        json!({
            "ors_api_key": "from-file",
            "ors_base_url": "http://ors.from-file",
            "countries": "us",
        }),
        None,
    );
    composer.push_environment(json!({
        "request_path": "from-env.json",
        "ors_api_key": "from-env",
    }));
    composer.push_cli(json!({
        "ors_api_key": "from-cli",
        "start_date": "2025-04-07",
    }));

    let config =
        config_from_layers_for_test(composer.layers()).expect("merged config should build");

    assert_eq!(config.request_path, Utf8PathBuf::from("from-env.json"));
    assert_eq!(config.ors_api_key, "from-cli");
    assert_eq!(config.ors_base_url, "http://ors.from-file");
    assert_eq!(config.countries, vec!["us".to_owned()]);
    assert_eq!(config.start_date, NaiveDate::from_ymd_opt(2025, 4, 7).expect("date"));
}
