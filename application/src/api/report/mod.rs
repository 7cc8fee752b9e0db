//! Reports definitions.

pub mod dashboard;
pub mod occupancy;

use juniper::GraphQLObject;
use service::read;

use crate::{api, Context};

pub use self::{dashboard::Dashboard, occupancy::Occupancy};

/// Numbers of `Room`s in each `RoomStatus`.
#[derive(Clone, Copy, Debug, GraphQLObject)]
#[graphql(context = Context)]
pub struct RoomCounts {
    /// Total number of `Room`s.
    pub total: i32,

    /// Number of `AVAILABLE` `Room`s.
    pub available: i32,

    /// Number of `OCCUPIED` `Room`s.
    pub occupied: i32,

    /// Number of `Room`s under `MAINTENANCE`.
    pub maintenance: i32,
}

impl From<read::room::Counts> for RoomCounts {
    fn from(counts: read::room::Counts) -> Self {
        Self {
            total: api::saturating(counts.total),
            available: api::saturating(counts.available),
            occupied: api::saturating(counts.occupied),
            maintenance: api::saturating(counts.maintenance),
        }
    }
}

/// Numbers of `Contract`s in each `ContractStatus`.
#[derive(Clone, Copy, Debug, GraphQLObject)]
#[graphql(context = Context)]
pub struct ContractCounts {
    /// Number of `ACTIVE` `Contract`s.
    pub active: i32,

    /// Number of `EXPIRED` `Contract`s.
    pub expired: i32,

    /// Number of `TERMINATED` `Contract`s.
    pub terminated: i32,
}

impl From<read::contract::Counts> for ContractCounts {
    fn from(counts: read::contract::Counts) -> Self {
        Self {
            active: api::saturating(counts.active),
            expired: api::saturating(counts.expired),
            terminated: api::saturating(counts.terminated),
        }
    }
}
