//! [`Command`] for deleting a [`Building`].

use common::operations::{
    By, Commit, Delete, Lock, Select, Transact, Transacted,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

#[cfg(doc)]
use crate::domain::Room;
use crate::{
    domain::{building, user, Building, User},
    infra::{database, Database},
    policy::{self, Action},
    read, Service,
};

use super::Command;

/// [`Command`] for deleting a [`Building`] having no [`Room`]s.
#[derive(Clone, Copy, Debug)]
pub struct DeleteBuilding {
    /// ID of the [`Building`] to be deleted.
    pub building_id: building::Id,

    /// ID of the [`User`] deleting the [`Building`].
    pub initiator_id: user::Id,
}

impl<Db, Ntf> Command<DeleteBuilding> for Service<Db, Ntf>
where
    Db: Database<
            Select<By<Option<User>, user::Id>>,
            Ok = Option<User>,
            Err = Traced<database::Error>,
        > + Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Select<By<Option<Building>, building::Id>>,
            Ok = Option<Building>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<read::room::Counts, Option<building::Id>>>,
            Ok = read::room::Counts,
            Err = Traced<database::Error>,
        > + Database<
            Lock<By<Building, building::Id>>,
            Ok = (),
            Err = Traced<database::Error>,
        > + Database<
            Delete<By<Building, building::Id>>,
            Ok = (),
            Err = Traced<database::Error>,
        > + Database<Commit, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = Building;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: DeleteBuilding,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let DeleteBuilding {
            building_id,
            initiator_id,
        } = cmd;

        policy::authorize(
            self.database(),
            initiator_id,
            Action::ManageBuildings,
        )
        .await
        .map_err(tracerr::map_from_and_wrap!(=> E))
        .map(drop)?;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        tx.execute(Lock(By::<Building, _>::new(building_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        let building = tx
            .execute(Select(By::<Option<Building>, _>::new(building_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::BuildingNotExists(building_id))
            .map_err(tracerr::wrap!())?;

        let rooms = tx
            .execute(Select(By::<read::room::Counts, _>::new(Some(
                building_id,
            ))))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .total;
        if rooms > 0 {
            return Err(tracerr::new!(E::BuildingHasRooms(building_id, rooms)));
        }

        tx.execute(Delete(By::<Building, _>::new(building_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        log::info!(%building_id, %initiator_id, "building deleted");

        Ok(building)
    }
}

/// Error of [`DeleteBuilding`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Building`] still has [`Room`]s.
    #[display("`Building(id: {_0})` still has {_1} rooms")]
    #[from(ignore)]
    BuildingHasRooms(
        #[error(not(source))] building::Id,
        #[error(not(source))] u32,
    ),

    /// [`Building`] doesn't exist.
    #[display("`Building(id: {_0})` does not exist")]
    #[from(ignore)]
    BuildingNotExists(#[error(not(source))] building::Id),

    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// Initiator is not allowed to manage [`Building`]s.
    #[display("Not authorized: {_0}")]
    #[from]
    Policy(policy::Error),
}

#[cfg(test)]
mod spec {
    use crate::{
        domain::{room, user::Role},
        fixture, Command as _,
    };

    use super::{DeleteBuilding, ExecutionError};

    #[tokio::test]
    async fn deletes_empty_building_only() {
        let svc = fixture::service();
        let staff = fixture::user(&svc, Role::Staff).await;
        let empty = fixture::building(&svc).await;
        let room = fixture::room(&svc, room::Status::Available).await;

        let err = svc
            .execute(DeleteBuilding {
                building_id: room.building_id,
                initiator_id: staff.id,
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err.as_ref(),
            ExecutionError::BuildingHasRooms(_, 1),
        ));

        let deleted = svc
            .execute(DeleteBuilding {
                building_id: empty.id,
                initiator_id: staff.id,
            })
            .await
            .unwrap();
        assert_eq!(deleted.id, empty.id);
    }
}
