//! Business logic of the dormitory management backend.
//!
//! List of available Cargo features:
#![doc = document_features::document_features!()]
#![deny(
    nonstandard_style,
    rust_2018_idioms,
    rustdoc::all,
    trivial_casts,
    trivial_numeric_casts,
    unsafe_code
)]
#![forbid(non_ascii_idents)]
#![warn(
    clippy::allow_attributes,
    clippy::allow_attributes_without_reason,
    clippy::pedantic,
    clippy::wildcard_enum_match_arm,
    deprecated_in_future,
    missing_copy_implementations,
    missing_debug_implementations,
    missing_docs,
    unreachable_pub,
    unused_crate_dependencies,
    unused_import_braces,
    unused_labels,
    unused_lifetimes,
    unused_qualifications,
    unused_results
)]

pub mod command;
#[cfg(test)]
mod fixture;
pub mod domain;
pub mod infra;
pub mod policy;
pub mod query;
pub mod read;
pub mod task;

use std::error::Error;

use common::operations::{By, Start};
use derive_more::Debug;

#[cfg(doc)]
use infra::{Database, Notifier};

pub use self::{command::Command, query::Query, task::Task};

/// [`Service`] configuration.
#[derive(Clone, Debug)]
pub struct Config {
    /// [JWT] encoding key.
    ///
    /// [JWT]: https://datatracker.ietf.org/doc/html/rfc7519
    #[debug(skip)]
    pub jwt_encoding_key: jsonwebtoken::EncodingKey,

    /// [JWT] decoding key.
    ///
    /// [JWT]: https://datatracker.ietf.org/doc/html/rfc7519
    #[debug(skip)]
    pub jwt_decoding_key: jsonwebtoken::DecodingKey,

    /// [`task::ExpireContracts`] configuration.
    pub expire_contracts: task::expire_contracts::Config,
}

/// Domain service.
#[derive(Clone, Debug)]
pub struct Service<Db, Ntf> {
    /// Configuration of this [`Service`].
    config: Config,

    /// [`Database`] of this [`Service`].
    database: Db,

    /// [`Notifier`] of this [`Service`].
    notifier: Ntf,
}

impl<Db, Ntf> Service<Db, Ntf> {
    /// Creates a new [`Service`] with the provided parameters, along with the
    /// [`task::Background`] running its periodic [`Task`]s.
    pub fn new(
        config: Config,
        database: Db,
        notifier: Ntf,
    ) -> (Self, task::Background)
    where
        Self: Task<
                Start<
                    By<
                        task::ExpireContracts<Self>,
                        task::expire_contracts::Config,
                    >,
                >,
                Ok = (),
                Err: Error,
            > + Clone
            + 'static,
    {
        let this = Service {
            config,
            database,
            notifier,
        };

        let mut bg = task::Background::default();
        let svc = this.clone();
        bg.spawn("ExpireContracts", async move {
            svc.execute(Start(By::new(svc.config().expire_contracts)))
                .await
        });

        (this, bg)
    }

    /// Returns [`Config`] of this [`Service`].
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns [`Database`] of this [`Service`].
    #[must_use]
    pub fn database(&self) -> &Db {
        &self.database
    }

    /// Returns [`Notifier`] of this [`Service`].
    #[must_use]
    pub fn notifier(&self) -> &Ntf {
        &self.notifier
    }
}
