//! [`Command`] for deleting a [`Room`].

use common::operations::{
    By, Commit, Delete, Lock, Select, Transact, Transacted,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{contract, room, user, Contract, Room, User},
    infra::{database, Database},
    policy::{self, Action},
    read::contract::Active,
    Service,
};

use super::Command;

/// [`Command`] for deleting a [`Room`] along with its past [`Contract`]s.
#[derive(Clone, Copy, Debug)]
pub struct DeleteRoom {
    /// ID of the [`Room`] to be deleted.
    pub room_id: room::Id,

    /// ID of the [`User`] deleting the [`Room`].
    pub initiator_id: user::Id,
}

impl<Db, Ntf> Command<DeleteRoom> for Service<Db, Ntf>
where
    Db: Database<
            Select<By<Option<User>, user::Id>>,
            Ok = Option<User>,
            Err = Traced<database::Error>,
        > + Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Lock<By<Room, room::Id>>,
            Ok = (),
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Room>, room::Id>>,
            Ok = Option<Room>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Active<Contract>>, room::Id>>,
            Ok = Option<Active<Contract>>,
            Err = Traced<database::Error>,
        > + Database<
            Delete<By<Room, room::Id>>,
            Ok = (),
            Err = Traced<database::Error>,
        > + Database<Commit, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = Room;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: DeleteRoom) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let DeleteRoom {
            room_id,
            initiator_id,
        } = cmd;

        policy::authorize(self.database(), initiator_id, Action::ManageRooms)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        tx.execute(Lock(By::<Room, _>::new(room_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        let room = tx
            .execute(Select(By::<Option<Room>, _>::new(room_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::RoomNotExists(room_id))
            .map_err(tracerr::wrap!())?;

        if let Some(Active(contract)) = tx
            .execute(Select(By::<Option<Active<Contract>>, _>::new(room_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
        {
            return Err(tracerr::new!(E::RoomHasActiveContract(
                room_id,
                contract.id,
            )));
        }

        tx.execute(Delete(By::<Room, _>::new(room_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        log::info!(%room_id, %initiator_id, "room deleted");

        Ok(room)
    }
}

/// Error of [`DeleteRoom`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// Initiator is not allowed to manage [`Room`]s.
    #[display("Not authorized: {_0}")]
    #[from]
    Policy(policy::Error),

    /// [`Room`] is rented by an active [`Contract`].
    #[display("`Room(id: {_0})` is rented by active `Contract(id: {_1})`")]
    #[from(ignore)]
    RoomHasActiveContract(
        #[error(not(source))] room::Id,
        #[error(not(source))] contract::Id,
    ),

    /// [`Room`] doesn't exist.
    #[display("`Room(id: {_0})` does not exist")]
    #[from(ignore)]
    RoomNotExists(#[error(not(source))] room::Id),
}

#[cfg(test)]
mod spec {
    use common::Date;

    use crate::{
        domain::{contract, room, user::Role},
        fixture, Command as _,
    };

    use super::{DeleteRoom, ExecutionError};

    #[tokio::test]
    async fn deletes_room_without_active_contract() {
        let svc = fixture::service();
        let staff = fixture::user(&svc, Role::Staff).await;
        let (_, student) = fixture::student(&svc).await;
        let rented = fixture::room(&svc, room::Status::Available).await;
        let free = fixture::room(&svc, room::Status::Available).await;
        let contract = fixture::contract(
            &svc,
            &student,
            &rented,
            Date::today().add_days(30),
            contract::Status::Active,
        )
        .await;
        let past = fixture::contract(
            &svc,
            &student,
            &free,
            Date::today(),
            contract::Status::Expired,
        )
        .await;

        let err = svc
            .execute(DeleteRoom {
                room_id: rented.id,
                initiator_id: staff.id,
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err.as_ref(),
            ExecutionError::RoomHasActiveContract(_, id) if *id == contract.id,
        ));

        _ = svc
            .execute(DeleteRoom {
                room_id: free.id,
                initiator_id: staff.id,
            })
            .await
            .unwrap();
        assert!(fixture::reload_contract(&svc, past.id).await.is_none());
    }
}
