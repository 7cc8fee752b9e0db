//! [`Notifier`]-related implementations.

mod log;

pub use self::log::Log;

/// Outbound notification delivering [`payment::Reminder`]s to students.
///
/// Answers whether the [`payment::Reminder`] was delivered. A `false` answer
/// is a normal outcome, not an error, and is never retried.
///
/// [`payment::Reminder`]: crate::domain::payment::Reminder
pub use common::Handler as Notifier;
