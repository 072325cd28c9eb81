//! Test helpers for writing requests and stubbing services.

use camino::{Utf8Path, Utf8PathBuf};
use geo::Coord;
use tempfile::TempDir;
use waybill_core::{
    RouteSummary, Services,
    test_support::{StubServices, straight_route},
};

use crate::{
    CliError,
    plan::{PlanConfig, ServiceSet, ServicesBuilder},
};

pub(super) const DENVER: Coord<f64> = Coord { x: -104.99, y: 39.74 };
pub(super) const CHICAGO: Coord<f64> = Coord { x: -87.63, y: 41.88 };
pub(super) const DALLAS: Coord<f64> = Coord { x: -96.8, y: 32.78 };

pub(super) fn write_utf8(path: &Utf8Path, contents: &[u8]) {
    std::fs::write(path.as_std_path(), contents).expect("write file");
}

pub(super) fn utf8_tempdir() -> (TempDir, Utf8PathBuf) {
    let tmp = TempDir::new().expect("tempdir");
    let root = Utf8PathBuf::from_path_buf(tmp.path().to_path_buf()).expect("utf-8 workspace");
    (tmp, root)
}

pub(super) fn request_json(cycle_used: f64) -> String {
    serde_json::json!({
        "current_location": "Denver, CO",
        "pickup_location": "Chicago, IL",
        "dropoff_location": "Dallas, TX",
        "current_cycle_used": cycle_used,
    })
    .to_string()
}

struct StubSet(StubServices);

impl ServiceSet for StubSet {
    fn services(&self) -> Services<'_> {
        self.0.services()
    }
}

/// Builds stub services that know the three request addresses and a
/// 950 mile route.
#[derive(Debug, Default)]
pub(super) struct StubServicesBuilder;

impl ServicesBuilder for StubServicesBuilder {
    fn build(&self, _config: &PlanConfig) -> Result<Box<dyn ServiceSet>, CliError> {
        let stubs = StubServices::default()
            .with_address("Denver, CO", DENVER)
            .with_address("Chicago, IL", CHICAGO)
            .with_address("Dallas, TX", DALLAS)
            .with_route(RouteSummary {
                distance_miles: 950.0,
                geometry: straight_route(CHICAGO, DALLAS, 50),
            });
        Ok(Box::new(StubSet(stubs)))
    }
}
