//! [`Dashboard`] report definition.

use common::Percent;
use juniper::graphql_object;
use service::query;

use crate::{api, Context};

use super::RoomCounts;

/// Overview of the whole dormitory.
#[derive(Clone, Debug)]
pub struct Dashboard(query::report::dashboard::Output);

impl From<query::report::dashboard::Output> for Dashboard {
    fn from(output: query::report::dashboard::Output) -> Self {
        Self(output)
    }
}

/// Overview of the whole dormitory.
#[graphql_object(name = "DashboardReport", context = Context)]
impl Dashboard {
    /// Total number of `Building`s.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "DashboardReport.buildings",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    #[must_use]
    pub fn buildings(&self) -> i32 {
        api::saturating(self.0.buildings)
    }

    /// `Room`s statistics.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "DashboardReport.rooms",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    #[must_use]
    pub fn rooms(&self) -> RoomCounts {
        self.0.rooms.into()
    }

    /// Share of occupied `Room`s.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "DashboardReport.occupancy",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    #[must_use]
    pub fn occupancy(&self) -> Percent {
        self.0.occupancy
    }

    /// Total number of `Student`s.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "DashboardReport.students",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    #[must_use]
    pub fn students(&self) -> i32 {
        api::saturating(self.0.students)
    }

    /// Number of `ACTIVE` `Contract`s.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "DashboardReport.activeContracts",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    #[must_use]
    pub fn active_contracts(&self) -> i32 {
        api::saturating(self.0.active_contracts)
    }

    /// `ACTIVE` `Contract`s ending within 30 days, the earliest ending first.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "DashboardReport.expiringContracts",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    #[must_use]
    pub fn expiring_contracts(&self) -> Vec<api::Contract> {
        self.0
            .expiring_contracts
            .iter()
            .cloned()
            .map(Into::into)
            .collect()
    }

    /// Total number of overdue `Payment`s.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "DashboardReport.overduePayments",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    #[must_use]
    pub fn overdue_payments(&self) -> i32 {
        api::saturating(self.0.overdue_payments)
    }

    /// Most recently due overdue `Payment`s.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "DashboardReport.recentOverduePayments",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    #[must_use]
    pub fn recent_overdue_payments(&self) -> Vec<api::Payment> {
        self.0
            .recent_overdue_payments
            .iter()
            .cloned()
            .map(Into::into)
            .collect()
    }

    /// Pending `Payment`s due within a week, the earliest due first.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "DashboardReport.upcomingPayments",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    #[must_use]
    pub fn upcoming_payments(&self) -> Vec<api::Payment> {
        self.0
            .upcoming_payments
            .iter()
            .cloned()
            .map(Into::into)
            .collect()
    }

    /// Total number of pending `Payment`s.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "DashboardReport.pendingPayments",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    #[must_use]
    pub fn pending_payments(&self) -> i32 {
        api::saturating(self.0.pending_payments)
    }
}
