//! [`Occupancy`] report definition.

use std::sync::OnceLock;

use common::Percent;
use juniper::graphql_object;
use service::query;

use crate::{api, Context};

use super::{ContractCounts, RoomCounts};

/// Report on how the dormitory `Room`s are occupied.
#[derive(Clone, Debug)]
pub struct Occupancy {
    /// Underlying [`query::report::occupancy::Output`].
    output: query::report::occupancy::Output,

    /// [`Row`]s of this report.
    rows: OnceLock<Vec<Row>>,
}

impl From<query::report::occupancy::Output> for Occupancy {
    fn from(output: query::report::occupancy::Output) -> Self {
        Self {
            output,
            rows: OnceLock::new(),
        }
    }
}

/// Report on how the dormitory `Room`s are occupied.
#[graphql_object(name = "OccupancyReport", context = Context)]
impl Occupancy {
    /// `Room`s statistics.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "OccupancyReport.rooms",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    #[must_use]
    pub fn rooms(&self) -> RoomCounts {
        self.output.rooms.into()
    }

    /// Share of occupied `Room`s.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "OccupancyReport.occupancy",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    #[must_use]
    pub fn occupancy(&self) -> Percent {
        self.output.occupancy
    }

    /// `Contract`s statistics.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "OccupancyReport.contracts",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    #[must_use]
    pub fn contracts(&self) -> ContractCounts {
        self.output.contracts.into()
    }

    /// Number of `ACTIVE` `Contract`s ending within 30 days.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "OccupancyReport.expiringContracts",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    #[must_use]
    pub fn expiring_contracts(&self) -> i32 {
        api::saturating(self.output.expiring_contracts)
    }

    /// Per-`Building` `OccupancyReportRow`s, ordered by `Building` names.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "OccupancyReport.buildings",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    #[must_use]
    pub fn buildings(&self) -> &[Row] {
        self.rows
            .get_or_init(|| {
                self.output.buildings.iter().cloned().map(Row::from).collect()
            })
            .as_slice()
    }
}

/// Row of an [`Occupancy`] report about a single `Building`.
#[derive(Clone, Debug)]
pub struct Row {
    /// `Building` this [`Row`] is about.
    building: api::Building,

    /// Total number of `Room`s in the `Building`.
    total: u32,

    /// Number of occupied `Room`s in the `Building`.
    occupied: u32,

    /// Number of `Room`s not being occupied in the `Building`.
    available: u32,

    /// Share of occupied `Room`s in the `Building`.
    occupancy: Percent,
}

impl From<query::report::occupancy::BuildingRow> for Row {
    fn from(row: query::report::occupancy::BuildingRow) -> Self {
        Self {
            building: row.building.into(),
            total: row.total,
            occupied: row.occupied,
            available: row.available,
            occupancy: row.occupancy,
        }
    }
}

/// Row of an `OccupancyReport` about a single `Building`.
#[graphql_object(name = "OccupancyReportRow", context = Context)]
impl Row {
    /// `Building` this row is about.
    #[must_use]
    pub fn building(&self) -> &api::Building {
        &self.building
    }

    /// Total number of `Room`s in the `Building`.
    #[must_use]
    pub fn total(&self) -> i32 {
        api::saturating(self.total)
    }

    /// Number of occupied `Room`s in the `Building`.
    #[must_use]
    pub fn occupied(&self) -> i32 {
        api::saturating(self.occupied)
    }

    /// Number of `Room`s not being occupied in the `Building`.
    #[must_use]
    pub fn available(&self) -> i32 {
        api::saturating(self.available)
    }

    /// Share of occupied `Room`s in the `Building`.
    #[must_use]
    pub fn occupancy(&self) -> Percent {
        self.occupancy
    }
}
