//! [`Command`] for deleting a [`Contract`].

use common::operations::{
    By, Commit, Delete, Lock, Select, Transact, Transacted, Update,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{contract, room, student, user, Contract, Room, Student, User},
    infra::{database, Database},
    policy::{self, Action},
    Service,
};

use super::Command;

/// [`Command`] for deleting a [`Contract`] along with its payments.
///
/// Frees the [`Room`] if the [`Contract`] was active.
#[derive(Clone, Copy, Debug)]
pub struct DeleteContract {
    /// ID of the [`Contract`] to be deleted.
    pub contract_id: contract::Id,

    /// ID of the [`User`] deleting the [`Contract`].
    pub initiator_id: user::Id,
}

impl<Db, Ntf> Command<DeleteContract> for Service<Db, Ntf>
where
    Db: Database<Transact, Err = Traced<database::Error>>
        + Database<
            Select<By<Option<User>, user::Id>>,
            Ok = Option<User>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Contract>, contract::Id>>,
            Ok = Option<Contract>,
            Err = Traced<database::Error>,
        >,
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
        > + Database<
            Delete<By<Contract, contract::Id>>,
            Ok = (),
            Err = Traced<database::Error>,
        > + Database<Update<Room>, Ok = (), Err = Traced<database::Error>>
        + Database<Commit, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = Contract;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: DeleteContract,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let DeleteContract {
            contract_id,
            initiator_id,
        } = cmd;

        policy::authorize(
            self.database(),
            initiator_id,
            Action::ManageContracts,
        )
        .await
        .map_err(tracerr::map_from_and_wrap!(=> E))
        .map(drop)?;

        let contract = self
            .database()
            .execute(Select(By::<Option<Contract>, _>::new(contract_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::ContractNotExists(contract_id))
            .map_err(tracerr::wrap!())?;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        tx.execute(Lock(By::<Room, _>::new(contract.room_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        tx.execute(Lock(By::<Student, _>::new(contract.student_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        tx.execute(Lock(By::<Contract, _>::new(contract_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        let contract = tx
            .execute(Select(By::<Option<Contract>, _>::new(contract_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::ContractNotExists(contract_id))
            .map_err(tracerr::wrap!())?;

        tx.execute(Delete(By::<Contract, _>::new(contract_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        if contract.is_active() {
            let room = tx
                .execute(Select(By::<Option<Room>, _>::new(contract.room_id)))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?;
            if let Some(mut room) =
                room.filter(|r| r.status == room::Status::Occupied)
            {
                room.status = room::Status::Available;
                tx.execute(Update(room))
                    .await
                    .map_err(tracerr::map_from_and_wrap!(=> E))?;
            }
        }

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        log::info!(%contract_id, %initiator_id, "contract deleted");

        Ok(contract)
    }
}

/// Error of [`DeleteContract`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Contract`] with the provided ID does not exist.
    #[display("`Contract(id: {_0})` does not exist")]
    #[from(ignore)]
    ContractNotExists(#[error(not(source))] contract::Id),

    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// Initiator is not allowed to manage [`Contract`]s.
    #[display("Not authorized: {_0}")]
    #[from]
    Policy(policy::Error),
}

#[cfg(test)]
mod spec {
    use common::Date;

    use crate::{
        domain::{contract, room, user::Role},
        fixture, Command as _,
    };

    use super::{DeleteContract, ExecutionError};

    #[tokio::test]
    async fn deletes_active_contract_and_frees_room() {
        let svc = fixture::service();
        let staff = fixture::user(&svc, Role::Staff).await;
        let (_, student) = fixture::student(&svc).await;
        let room = fixture::room(&svc, room::Status::Available).await;
        let contract = fixture::contract(
            &svc,
            &student,
            &room,
            Date::today().add_days(60),
            contract::Status::Active,
        )
        .await;

        _ = svc
            .execute(DeleteContract {
                contract_id: contract.id,
                initiator_id: staff.id,
            })
            .await
            .unwrap();

        assert!(fixture::reload_contract(&svc, contract.id).await.is_none());
        assert_eq!(
            fixture::reload_room(&svc, room.id).await.status,
            room::Status::Available,
        );

        let err = svc
            .execute(DeleteContract {
                contract_id: contract.id,
                initiator_id: staff.id,
            })
            .await
            .unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::ContractNotExists(_)));
    }
}
