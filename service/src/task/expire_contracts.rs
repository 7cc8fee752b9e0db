//! [`ExpireContracts`] [`Task`].

use std::{convert::Infallible, error::Error, time};

use common::{
    operations::{
        By, Commit, Lock, Perform, Select, Start, Transact, Transacted, Update,
    },
    Date,
};
use smart_default::SmartDefault;
use tokio::time::interval;
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{contract, room, student, Contract, Room, Student},
    infra::{database, Database},
    read::contract::{Active, EndingBefore},
    Service,
};

use super::Task;

/// Configuration for [`ExpireContracts`] [`Task`].
#[derive(Clone, Copy, Debug, SmartDefault)]
pub struct Config {
    /// Interval between checks for ended [`Contract`]s.
    #[default(time::Duration::from_secs(60 * 60))]
    pub interval: time::Duration,
}

/// [`Task`] expiring active [`Contract`]s whose end date has passed, and
/// freeing their [`Room`]s.
#[derive(Clone, Copy, Debug)]
pub struct ExpireContracts<S> {
    /// [`Config`] of this [`Task`].
    config: Config,

    /// [`Service`] instance.
    service: S,
}

impl<Db, Ntf> Task<Start<By<ExpireContracts<Self>, Config>>>
    for Service<Db, Ntf>
where
    ExpireContracts<Self>:
        Task<Perform<()>, Ok = usize, Err: Error> + 'static,
    Self: Clone,
{
    type Ok = ();
    type Err = Infallible;

    async fn execute(
        &self,
        Start(by): Start<By<ExpireContracts<Self>, Config>>,
    ) -> Result<Self::Ok, Self::Err> {
        let config = by.into_inner();
        let task = ExpireContracts {
            config,
            service: self.clone(),
        };

        let mut interval = interval(task.config.interval);
        loop {
            let _ = interval.tick().await;
            match task.execute(Perform(())).await {
                Ok(0) => {}
                Ok(n) => {
                    log::info!("`task::ExpireContracts` expired {n} contracts");
                }
                Err(e) => {
                    log::error!("`task::ExpireContracts` failed: {e}");
                }
            }
        }
    }
}

impl<Db, Ntf> Task<Perform<()>> for ExpireContracts<Service<Db, Ntf>>
where
    Db: Database<
            Select<By<Vec<Active<Contract>>, EndingBefore>>,
            Ok = Vec<Active<Contract>>,
            Err = Traced<database::Error>,
        > + Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Lock<By<Room, room::Id>>,
            Ok = (),
            Err = Traced<database::Error>,
        > + Database<
            Lock<By<Student, student::Id>>,
            Ok = (),
            Err = Traced<database::Error>,
        > + Database<
            Lock<By<Contract, contract::Id>>,
            Ok = (),
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Contract>, contract::Id>>,
            Ok = Option<Contract>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Room>, room::Id>>,
            Ok = Option<Room>,
            Err = Traced<database::Error>,
        > + Database<Update<Contract>, Ok = (), Err = Traced<database::Error>>
        + Database<Update<Room>, Ok = (), Err = Traced<database::Error>>
        + Database<Commit, Ok = (), Err = Traced<database::Error>>,
{
    /// Number of expired [`Contract`]s.
    type Ok = usize;
    type Err = ExecutionError;

    async fn execute(&self, _: Perform<()>) -> Result<Self::Ok, Self::Err> {
        let today = Date::today();
        let ended = self
            .service
            .database()
            .execute(Select(By::<Vec<Active<Contract>>, _>::new(
                EndingBefore(today),
            )))
            .await
            .map_err(tracerr::wrap!())?;

        let mut expired = 0;
        for Active(contract) in ended {
            let id = contract.id;
            match self.expire(contract, today).await {
                Ok(true) => expired += 1,
                Ok(false) => {}
                Err(e) => log::error!(
                    contract_id = %id,
                    "failed to expire contract: {e}",
                ),
            }
        }
        Ok(expired)
    }
}

impl<Db, Ntf> ExpireContracts<Service<Db, Ntf>>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Lock<By<Room, room::Id>>,
            Ok = (),
            Err = Traced<database::Error>,
        > + Database<
            Lock<By<Student, student::Id>>,
            Ok = (),
            Err = Traced<database::Error>,
        > + Database<
            Lock<By<Contract, contract::Id>>,
            Ok = (),
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Contract>, contract::Id>>,
            Ok = Option<Contract>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Room>, room::Id>>,
            Ok = Option<Room>,
            Err = Traced<database::Error>,
        > + Database<Update<Contract>, Ok = (), Err = Traced<database::Error>>
        + Database<Update<Room>, Ok = (), Err = Traced<database::Error>>
        + Database<Commit, Ok = (), Err = Traced<database::Error>>,
{
    /// Expires the provided [`Contract`] in its own transaction, returning
    /// `false` if it has been changed concurrently and is not due anymore.
    async fn expire(
        &self,
        contract: Contract,
        today: Date,
    ) -> Result<bool, ExecutionError> {
        let tx = self
            .service
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::wrap!())?;

        tx.execute(Lock(By::<Room, _>::new(contract.room_id)))
            .await
            .map_err(tracerr::wrap!())?;
        tx.execute(Lock(By::<Student, _>::new(contract.student_id)))
            .await
            .map_err(tracerr::wrap!())?;
        tx.execute(Lock(By::<Contract, _>::new(contract.id)))
            .await
            .map_err(tracerr::wrap!())?;

        let Some(mut contract) = tx
            .execute(Select(By::<Option<Contract>, _>::new(contract.id)))
            .await
            .map_err(tracerr::wrap!())?
            .filter(|c| c.is_active() && c.end_date < today)
        else {
            return Ok(false);
        };

        contract.status = contract::Status::Expired;
        tx.execute(Update(contract.clone()))
            .await
            .map_err(tracerr::wrap!())?;

        let room = tx
            .execute(Select(By::<Option<Room>, _>::new(contract.room_id)))
            .await
            .map_err(tracerr::wrap!())?;
        if let Some(mut room) =
            room.filter(|r| r.status == room::Status::Occupied)
        {
            room.status = room::Status::Available;
            tx.execute(Update(room))
                .await
                .map_err(tracerr::wrap!())?;
        }

        tx.execute(Commit).await.map_err(tracerr::wrap!())?;

        log::info!(contract_id = %contract.id, "contract expired");

        Ok(true)
    }
}

/// Error of [`ExpireContracts`] execution.
pub type ExecutionError = Traced<database::Error>;

#[cfg(test)]
mod spec {
    use common::{
        operations::{Perform, Update},
        Date,
    };

    use crate::{
        domain::{contract, room, Contract, Room},
        fixture,
        infra::Database as _,
        Task as _,
    };

    use super::{Config, ExpireContracts};

    fn task(
        svc: &fixture::TestService,
    ) -> ExpireContracts<fixture::TestService> {
        ExpireContracts {
            config: Config {
                interval: std::time::Duration::from_secs(60),
            },
            service: svc.clone(),
        }
    }

    #[tokio::test]
    async fn expires_ended_contracts_and_frees_rooms() {
        let svc = fixture::service();
        let (_, first) = fixture::student(&svc).await;
        let (_, second) = fixture::student(&svc).await;
        let ended_room = fixture::room(&svc, room::Status::Available).await;
        let running_room = fixture::room(&svc, room::Status::Available).await;
        let ended = fixture::contract(
            &svc,
            &first,
            &ended_room,
            Date::from_calendar(2025, 8, 31).unwrap(),
            contract::Status::Active,
        )
        .await;
        let running = fixture::contract(
            &svc,
            &second,
            &running_room,
            Date::today().add_days(30),
            contract::Status::Active,
        )
        .await;

        let expired = task(&svc).execute(Perform(())).await.unwrap();

        assert_eq!(expired, 1);
        let ended = fixture::reload_contract(&svc, ended.id).await.unwrap();
        assert_eq!(ended.status, contract::Status::Expired);
        assert_eq!(
            fixture::reload_room(&svc, ended_room.id).await.status,
            room::Status::Available,
        );
        let running =
            fixture::reload_contract(&svc, running.id).await.unwrap();
        assert_eq!(running.status, contract::Status::Active);
        assert_eq!(
            fixture::reload_room(&svc, running_room.id).await.status,
            room::Status::Occupied,
        );

        assert_eq!(task(&svc).execute(Perform(())).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn keeps_rooms_under_maintenance() {
        let svc = fixture::service();
        let (_, student) = fixture::student(&svc).await;
        let room = fixture::room(&svc, room::Status::Available).await;
        let ended = fixture::contract(
            &svc,
            &student,
            &room,
            Date::from_calendar(2025, 8, 31).unwrap(),
            contract::Status::Active,
        )
        .await;
        svc.database()
            .execute(Update(Room {
                status: room::Status::Maintenance,
                ..room.clone()
            }))
            .await
            .unwrap();

        assert_eq!(task(&svc).execute(Perform(())).await.unwrap(), 1);

        let ended = fixture::reload_contract(&svc, ended.id).await.unwrap();
        assert_eq!(ended.status, contract::Status::Expired);
        assert_eq!(
            fixture::reload_room(&svc, room.id).await.status,
            room::Status::Maintenance,
        );
    }

    #[tokio::test]
    async fn keeps_expiring_after_failed_contract() {
        let svc = fixture::service();
        let (_, first) = fixture::student(&svc).await;
        let (_, second) = fixture::student(&svc).await;
        let (_, third) = fixture::student(&svc).await;
        let first_room = fixture::room(&svc, room::Status::Available).await;
        let second_room = fixture::room(&svc, room::Status::Available).await;
        let failing = fixture::contract(
            &svc,
            &first,
            &first_room,
            Date::from_calendar(2025, 8, 30).unwrap(),
            contract::Status::Active,
        )
        .await;
        let ended = fixture::contract(
            &svc,
            &second,
            &second_room,
            Date::from_calendar(2025, 8, 31).unwrap(),
            contract::Status::Active,
        )
        .await;
        // A second active contract for the same room makes every commit
        // fail until `ended` is expired.
        let clashing = Contract {
            id: contract::Id::new(),
            student_id: third.id,
            end_date: Date::today().add_days(30),
            ..ended.clone()
        };
        svc.database().write_unchecked(|state| {
            drop(state.contracts.insert(clashing.id, clashing));
        });

        let expired = task(&svc).execute(Perform(())).await.unwrap();

        assert_eq!(expired, 1);
        let failing =
            fixture::reload_contract(&svc, failing.id).await.unwrap();
        assert_eq!(failing.status, contract::Status::Active);
        let ended = fixture::reload_contract(&svc, ended.id).await.unwrap();
        assert_eq!(ended.status, contract::Status::Expired);
    }
}
