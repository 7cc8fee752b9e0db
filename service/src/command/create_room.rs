//! [`Command`] for creating a new [`Room`].

use common::{
    operations::{By, Commit, Insert, Lock, Select, Transact, Transacted},
    DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{
        building, room, room_type, user, Building, Room, RoomType, User,
    },
    infra::{database, Database},
    policy::{self, Action},
    Service,
};

use super::Command;

/// [`Command`] for creating a new [`Room`] in a [`Building`].
#[derive(Clone, Debug)]
pub struct CreateRoom {
    /// ID of the [`Building`] a new [`Room`] belongs to.
    pub building_id: building::Id,

    /// ID of the [`RoomType`] of a new [`Room`].
    pub room_type_id: room_type::Id,

    /// Number of a new [`Room`], unique within its [`Building`].
    pub number: room::Number,

    /// Floor a new [`Room`] is located on.
    pub floor: u16,

    /// Initial [`room::Status`] of a new [`Room`].
    ///
    /// [`room::Status::Occupied`] is only set by contracts.
    pub status: room::Status,

    /// Optional notes about a new [`Room`].
    pub notes: Option<room::Notes>,

    /// ID of the [`User`] creating the [`Room`].
    pub initiator_id: user::Id,
}

impl<Db, Ntf> Command<CreateRoom> for Service<Db, Ntf>
where
    Db: Database<
            Select<By<Option<User>, user::Id>>,
            Ok = Option<User>,
            Err = Traced<database::Error>,
        > + Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Lock<By<Building, building::Id>>,
            Ok = (),
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Building>, building::Id>>,
            Ok = Option<Building>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<RoomType>, room_type::Id>>,
            Ok = Option<RoomType>,
            Err = Traced<database::Error>,
        > + Database<Insert<Room>, Ok = (), Err = Traced<database::Error>>
        + Database<Commit, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = Room;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: CreateRoom) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CreateRoom {
            building_id,
            room_type_id,
            number,
            floor,
            status,
            notes,
            initiator_id,
        } = cmd;

        policy::authorize(self.database(), initiator_id, Action::ManageRooms)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        if status == room::Status::Occupied {
            return Err(tracerr::new!(E::ManualOccupation));
        }

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Avoid concurrent deletion of the `Building`.
        tx.execute(Lock(By::<Building, _>::new(building_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        let building = tx
            .execute(Select(By::<Option<Building>, _>::new(building_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::BuildingNotExists(building_id))
            .map_err(tracerr::wrap!())?;
        if !building.has_floor(floor) {
            return Err(tracerr::new!(E::FloorOutOfRange {
                floor,
                num_floors: building.num_floors,
            }));
        }

        tx.execute(Select(By::<Option<RoomType>, _>::new(room_type_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::RoomTypeNotExists(room_type_id))
            .map_err(tracerr::wrap!())
            .map(drop)?;

        let room = Room {
            id: room::Id::new(),
            building_id,
            number,
            room_type_id,
            floor,
            status,
            notes,
            created_at: DateTime::now().coerce(),
        };

        let occupied = |e: Traced<database::Error>| {
            if e.as_ref().is_unique_violation(Some(database::ROOM_NUMBER)) {
                tracerr::new!(E::NumberOccupied(room.number.clone()))
            } else {
                tracerr::map_from_and_wrap!(=> E)(e)
            }
        };
        tx.execute(Insert(room.clone())).await.map_err(occupied)?;
        tx.execute(Commit).await.map_err(occupied)?;

        Ok(room)
    }
}

/// Error of [`CreateRoom`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Building`] doesn't exist.
    #[display("`Building(id: {_0})` does not exist")]
    #[from(ignore)]
    BuildingNotExists(#[error(not(source))] building::Id),

    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Building`] has no such floor.
    #[display("Floor {floor} is out of `Building`'s 1..={num_floors} floors")]
    #[from(ignore)]
    FloorOutOfRange {
        /// Requested floor.
        #[error(not(source))]
        floor: u16,

        /// Number of floors in the [`Building`].
        #[error(not(source))]
        num_floors: u16,
    },

    /// [`room::Status::Occupied`] is requested without a contract.
    #[display("`Room` cannot be occupied without a contract")]
    #[from(ignore)]
    ManualOccupation,

    /// [`room::Number`] is already taken in the [`Building`].
    #[display("`{_0}` room number is occupied in the building")]
    #[from(ignore)]
    NumberOccupied(#[error(not(source))] room::Number),

    /// Initiator is not allowed to manage [`Room`]s.
    #[display("Not authorized: {_0}")]
    #[from]
    Policy(policy::Error),

    /// [`RoomType`] doesn't exist.
    #[display("`RoomType(id: {_0})` does not exist")]
    #[from(ignore)]
    RoomTypeNotExists(#[error(not(source))] room_type::Id),
}

#[cfg(test)]
mod spec {
    use crate::{
        domain::{building, room, room_type, user::Role},
        fixture, Command as _,
    };

    use super::{CreateRoom, ExecutionError};

    fn cmd(
        building_id: building::Id,
        room_type_id: room_type::Id,
        initiator_id: crate::domain::user::Id,
    ) -> CreateRoom {
        CreateRoom {
            building_id,
            room_type_id,
            number: room::Number::new("A101").unwrap(),
            floor: 1,
            status: room::Status::Available,
            notes: None,
            initiator_id,
        }
    }

    #[tokio::test]
    async fn creates_room() {
        let svc = fixture::service();
        let staff = fixture::user(&svc, Role::Staff).await;
        let building = fixture::building(&svc).await;
        let room_type = fixture::room_type(&svc, 900_000).await;

        let room = svc
            .execute(cmd(building.id, room_type.id, staff.id))
            .await
            .unwrap();

        assert_eq!(room.status, room::Status::Available);
        assert_eq!(fixture::reload_room(&svc, room.id).await.floor, 1);
    }

    #[tokio::test]
    async fn rejects_duplicate_number_within_building() {
        let svc = fixture::service();
        let staff = fixture::user(&svc, Role::Staff).await;
        let building = fixture::building(&svc).await;
        let other = fixture::building(&svc).await;
        let room_type = fixture::room_type(&svc, 900_000).await;
        _ = svc
            .execute(cmd(building.id, room_type.id, staff.id))
            .await
            .unwrap();

        let err = svc
            .execute(cmd(building.id, room_type.id, staff.id))
            .await
            .unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::NumberOccupied(_)));

        _ = svc
            .execute(cmd(other.id, room_type.id, staff.id))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn rejects_floor_outside_building() {
        let svc = fixture::service();
        let staff = fixture::user(&svc, Role::Staff).await;
        let building = fixture::building(&svc).await;
        let room_type = fixture::room_type(&svc, 900_000).await;

        for floor in [0, building.num_floors + 1] {
            let err = svc
                .execute(CreateRoom {
                    floor,
                    ..cmd(building.id, room_type.id, staff.id)
                })
                .await
                .unwrap_err();
            assert!(matches!(
                err.as_ref(),
                ExecutionError::FloorOutOfRange { .. },
            ));
        }
    }
}
