//! [`Command`] for updating a [`Room`].

use common::operations::{
    By, Commit, Lock, Select, Transact, Transacted, Update,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{
        building, room, room_type, user, Building, Contract, Room, RoomType,
        User,
    },
    infra::{database, Database},
    policy::{self, Action},
    read::contract::Active,
    Service,
};

use super::Command;

/// [`Command`] for updating a [`Room`].
///
/// [`None`] fields are left untouched.
#[derive(Clone, Debug)]
pub struct UpdateRoom {
    /// ID of the [`Room`] to be updated.
    pub room_id: room::Id,

    /// New number of the [`Room`].
    pub number: Option<room::Number>,

    /// ID of the new [`RoomType`] of the [`Room`].
    pub room_type_id: Option<room_type::Id>,

    /// New floor of the [`Room`].
    pub floor: Option<u16>,

    /// New [`room::Status`] of the [`Room`].
    pub status: Option<room::Status>,

    /// New notes about the [`Room`], [`Some`]`(`[`None`]`)` removes them.
    pub notes: Option<Option<room::Notes>>,

    /// ID of the [`User`] updating the [`Room`].
    pub initiator_id: user::Id,
}

impl<Db, Ntf> Command<UpdateRoom> for Service<Db, Ntf>
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
            Select<By<Option<Building>, building::Id>>,
            Ok = Option<Building>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<RoomType>, room_type::Id>>,
            Ok = Option<RoomType>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Active<Contract>>, room::Id>>,
            Ok = Option<Active<Contract>>,
            Err = Traced<database::Error>,
        > + Database<Update<Room>, Ok = (), Err = Traced<database::Error>>
        + Database<Commit, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = Room;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: UpdateRoom) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let UpdateRoom {
            room_id,
            number,
            room_type_id,
            floor,
            status,
            notes,
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

        let mut room = tx
            .execute(Select(By::<Option<Room>, _>::new(room_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::RoomNotExists(room_id))
            .map_err(tracerr::wrap!())?;

        if let Some(status) = status.filter(|s| *s != room.status) {
            let touches_occupation = status == room::Status::Occupied
                || room.status == room::Status::Occupied;
            if touches_occupation {
                let has_contract = tx
                    .execute(Select(
                        By::<Option<Active<Contract>>, _>::new(
                            room_id,
                        ),
                    ))
                    .await
                    .map_err(tracerr::map_from_and_wrap!(=> E))?
                    .is_some();
                if has_contract {
                    return Err(tracerr::new!(E::RoomHasActiveContract(
                        room_id
                    )));
                }
            }
            room.status = status;
        }

        if let Some(floor) = floor {
            let building = tx
                .execute(Select(By::<Option<Building>, _>::new(
                    room.building_id,
                )))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?
                .ok_or(E::BuildingNotExists(room.building_id))
                .map_err(tracerr::wrap!())?;
            if !building.has_floor(floor) {
                return Err(tracerr::new!(E::FloorOutOfRange {
                    floor,
                    num_floors: building.num_floors,
                }));
            }
            room.floor = floor;
        }

        if let Some(room_type_id) = room_type_id {
            tx.execute(Select(By::<Option<RoomType>, _>::new(room_type_id)))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?
                .ok_or(E::RoomTypeNotExists(room_type_id))
                .map_err(tracerr::wrap!())
                .map(drop)?;
            room.room_type_id = room_type_id;
        }
        if let Some(number) = number {
            room.number = number;
        }
        if let Some(notes) = notes {
            room.notes = notes;
        }

        let occupied = |e: Traced<database::Error>| {
            if e.as_ref().is_unique_violation(Some(database::ROOM_NUMBER)) {
                tracerr::new!(E::NumberOccupied(room.number.clone()))
            } else {
                tracerr::map_from_and_wrap!(=> E)(e)
            }
        };
        tx.execute(Update(room.clone())).await.map_err(occupied)?;
        tx.execute(Commit).await.map_err(occupied)?;

        Ok(room)
    }
}

/// Error of [`UpdateRoom`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Building`] of the [`Room`] doesn't exist.
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

    /// [`room::Number`] is already taken in the [`Building`].
    #[display("`{_0}` room number is occupied in the building")]
    #[from(ignore)]
    NumberOccupied(#[error(not(source))] room::Number),

    /// Initiator is not allowed to manage [`Room`]s.
    #[display("Not authorized: {_0}")]
    #[from]
    Policy(policy::Error),

    /// Occupation of the [`Room`] is governed by its active [`Contract`].
    #[display("`Room(id: {_0})` has an active `Contract`")]
    #[from(ignore)]
    RoomHasActiveContract(#[error(not(source))] room::Id),

    /// [`Room`] doesn't exist.
    #[display("`Room(id: {_0})` does not exist")]
    #[from(ignore)]
    RoomNotExists(#[error(not(source))] room::Id),

    /// [`RoomType`] doesn't exist.
    #[display("`RoomType(id: {_0})` does not exist")]
    #[from(ignore)]
    RoomTypeNotExists(#[error(not(source))] room_type::Id),
}

#[cfg(test)]
mod spec {
    use common::Date;

    use crate::{
        domain::{contract, room, user::Role},
        fixture, Command as _,
    };

    use super::{ExecutionError, UpdateRoom};

    fn cmd(
        room_id: room::Id,
        initiator_id: crate::domain::user::Id,
    ) -> UpdateRoom {
        UpdateRoom {
            room_id,
            number: None,
            room_type_id: None,
            floor: None,
            status: None,
            notes: None,
            initiator_id,
        }
    }

    #[tokio::test]
    async fn puts_free_room_under_maintenance() {
        let svc = fixture::service();
        let staff = fixture::user(&svc, Role::Staff).await;
        let room = fixture::room(&svc, room::Status::Available).await;

        let updated = svc
            .execute(UpdateRoom {
                status: Some(room::Status::Maintenance),
                floor: Some(3),
                ..cmd(room.id, staff.id)
            })
            .await
            .unwrap();

        assert_eq!(updated.status, room::Status::Maintenance);
        assert_eq!(updated.floor, 3);
        assert_eq!(updated.number, room.number);
    }

    #[tokio::test]
    async fn keeps_occupation_of_contracted_room() {
        let svc = fixture::service();
        let staff = fixture::user(&svc, Role::Staff).await;
        let (_, student) = fixture::student(&svc).await;
        let room = fixture::room(&svc, room::Status::Available).await;
        _ = fixture::contract(
            &svc,
            &student,
            &room,
            Date::today().add_days(30),
            contract::Status::Active,
        )
        .await;

        let err = svc
            .execute(UpdateRoom {
                status: Some(room::Status::Available),
                ..cmd(room.id, staff.id)
            })
            .await
            .unwrap_err();

        assert!(matches!(
            err.as_ref(),
            ExecutionError::RoomHasActiveContract(_),
        ));
        assert_eq!(
            fixture::reload_room(&svc, room.id).await.status,
            room::Status::Occupied,
        );
    }
}
