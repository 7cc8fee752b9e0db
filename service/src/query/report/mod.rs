//! Reporting [`Query`]s recomputed on every request.

pub mod dashboard;
pub mod occupancy;

#[cfg(doc)]
use crate::Query;

pub use self::{dashboard::Dashboard, occupancy::Occupancy};

/// Number of days ahead of today a [`Contract`] is considered expiring soon
/// within.
///
/// [`Contract`]: crate::domain::Contract
pub const EXPIRING_WITHIN_DAYS: u16 = 30;
