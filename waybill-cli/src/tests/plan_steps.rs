//! Behaviour-driven step definitions driving the plan CLI scenarios.

use std::cell::RefCell;

use camino::Utf8PathBuf;
use clap::Parser;
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use tempfile::TempDir;

use super::helpers::{StubServicesBuilder, request_json, write_utf8};
use crate::{
    ARG_OUTPUT, ARG_ORS_API_KEY, ARG_REQUEST, ARG_START_DATE, Cli, CliError, Command,
    plan::run_plan_with,
};

#[derive(Debug)]
struct PlanWorld {
    _tmp: TempDir,
    request_path: Utf8PathBuf,
    output_path: Utf8PathBuf,
    include_request: RefCell<bool>,
    cli_args: RefCell<Vec<String>>,
    stdout: RefCell<Vec<u8>>,
    result: RefCell<Option<Result<(), CliError>>>,
}

impl PlanWorld {
    fn new() -> Self {
        let tmp = TempDir::new().expect("tempdir");
        let root = Utf8PathBuf::from_path_buf(tmp.path().to_path_buf()).expect("utf-8 workspace");
        Self {
            request_path: root.join("trip.json"),
            output_path: root.join("out/plan.json"),
            _tmp: tmp,
            include_request: RefCell::new(true),
            cli_args: RefCell::new(Vec::new()),
            stdout: RefCell::new(Vec::new()),
            result: RefCell::new(None),
        }
    }

    fn build_command_line(&self) -> Vec<String> {
        let mut argv = vec!["waybill".to_owned(), "plan".to_owned()];
        if *self.include_request.borrow() {
            argv.push(self.request_path.as_str().to_owned());
        }
        argv.extend([
            format!("--{ARG_ORS_API_KEY}"),
            "test-key".to_owned(),
            format!("--{ARG_START_DATE}"),
            "2025-04-07".to_owned(),
        ]);
        argv.extend(self.cli_args.borrow().iter().cloned());
        argv
    }

    fn error(&self) -> String {
        let borrowed = self.result.borrow();
        let error = borrowed
            .as_ref()
            .expect("result recorded")
            .as_ref()
            .expect_err("expected error");
        format!("{error:?}")
    }

    fn assert_success(&self) {
        let borrowed = self.result.borrow();
        let result = borrowed.as_ref().expect("result recorded");
        if let Err(err) = result {
            panic!("expected success, found {err:?}");
        }
    }

    fn stdout_json(&self) -> serde_json::Value {
        let stdout = String::from_utf8(self.stdout.borrow().clone()).expect("stdout utf-8");
        serde_json::from_str(&stdout).expect("stdout should be JSON")
    }
}

#[fixture]
fn world() -> PlanWorld {
    PlanWorld::new()
}

#[given("a trip request with {hours} cycle hours used")]
fn trip_request(#[from(world)] world: &PlanWorld, hours: f64) {
    write_utf8(&world.request_path, request_json(hours).as_bytes());
}

#[given("the output is redirected to a file")]
fn output_to_file(#[from(world)] world: &PlanWorld) {
    world.cli_args.borrow_mut().extend([
        format!("--{ARG_OUTPUT}"),
        world.output_path.as_str().to_owned(),
    ]);
}

#[given("the trip request file contains invalid JSON")]
fn invalid_json(#[from(world)] world: &PlanWorld) {
    write_utf8(&world.request_path, b"{ not valid json");
}

#[given("the request path is omitted")]
fn omit_request(#[from(world)] world: &PlanWorld) {
    world.include_request.replace(false);
}

#[when("I run the plan command")]
fn run_plan_command(#[from(world)] world: &PlanWorld) {
    let invocation = world.build_command_line();
    let parsed = Cli::try_parse_from(invocation).map_err(CliError::from);
    let outcome = parsed.and_then(|cli| match cli.command {
        Command::Plan(args) => {
            let mut buffer = world.stdout.borrow_mut();
            run_plan_with(args, &StubServicesBuilder, &mut *buffer)
        }
    });
    world.result.replace(Some(outcome));
}

#[then("the command succeeds and prints a trip plan")]
fn succeeds_with_plan(#[from(world)] world: &PlanWorld) {
    world.assert_success();
    let body = world.stdout_json();
    assert_eq!(body["status"], "success");
    assert_eq!(body["total_miles"], 950.0);
    assert_eq!(body["eld_logs"][0]["date"], "2025-04-07");
}

#[then("the plan lists stop types {kinds}")]
fn plan_stop_types(#[from(world)] world: &PlanWorld, kinds: String) {
    let body = world.stdout_json();
    let actual: Vec<String> = body["stops"]
        .as_array()
        .expect("stops array")
        .iter()
        .map(|stop| stop["stop_type"].as_str().expect("stop type").to_owned())
        .collect();
    assert_eq!(actual.join(","), kinds.trim_matches('"'));
}

#[then("the command succeeds and stdout is empty")]
fn succeeds_silently(#[from(world)] world: &PlanWorld) {
    world.assert_success();
    assert!(world.stdout.borrow().is_empty());
}

#[then("the output file holds a trip plan")]
fn output_file_has_plan(#[from(world)] world: &PlanWorld) {
    let contents = std::fs::read_to_string(world.output_path.as_std_path()).expect("output file");
    let body: serde_json::Value = serde_json::from_str(&contents).expect("output JSON");
    assert_eq!(body["status"], "success");
}

#[then("the command fails because planning failed")]
fn fails_planning(#[from(world)] world: &PlanWorld) {
    let error = world.error();
    assert!(error.starts_with("Plan("), "expected Plan error, found {error}");
}

#[then("the error payload says {message}")]
fn error_payload(#[from(world)] world: &PlanWorld, message: String) {
    let body = world.stdout_json();
    assert_eq!(body["status"], "error");
    assert_eq!(body["message"], message.trim_matches('"'));
    assert!(
        body["system_message"]
            .as_str()
            .is_some_and(|detail| detail.contains("70")),
        "system message should name the used hours: {body}"
    );
}

#[then("the command fails because the request JSON is invalid")]
fn fails_invalid_json(#[from(world)] world: &PlanWorld) {
    let error = world.error();
    assert!(
        error.starts_with("ParseTripRequest"),
        "expected ParseTripRequest, found {error}"
    );
}

#[then("the command fails because the request path is missing")]
fn fails_missing_request(#[from(world)] world: &PlanWorld) {
    let borrowed = world.result.borrow();
    let error = borrowed
        .as_ref()
        .expect("result recorded")
        .as_ref()
        .expect_err("expected error");
    match error {
        CliError::MissingArgument { field, .. } => assert_eq!(*field, ARG_REQUEST),
        other => panic!("expected MissingArgument, found {other:?}"),
    }
}

macro_rules! register_plan_scenario {
    ($fn_name:ident, $scenario_title:literal) => {
        #[scenario(path = "tests/features/plan_command.feature", name = $scenario_title)]
        fn $fn_name(#[from(world)] world: PlanWorld) {
            let _ = world;
        }
    };
}

register_plan_scenario!(plan_happy_path, "planning a trip from JSON");
register_plan_scenario!(plan_to_file, "writing the plan to a file");
register_plan_scenario!(plan_exhausted_cycle, "reporting an exhausted cycle");
register_plan_scenario!(plan_invalid_json, "rejecting invalid JSON input");
register_plan_scenario!(plan_missing_request, "rejecting missing request paths");
