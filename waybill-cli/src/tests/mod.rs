//! Shared test harness modules for the Waybill CLI.
#![expect(
    clippy::panic,
    reason = "Tests assert panic branches to surface unexpected CLI outcomes"
)]

mod helpers;
mod plan_steps;
mod unit;
