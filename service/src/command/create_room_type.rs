//! [`Command`] for creating a new [`RoomType`].

use common::{
    operations::{By, Commit, Insert, Select, Transact, Transacted},
    Money,
};
use derive_more::{Display, Error, From};
use rust_decimal::Decimal;
use tracerr::Traced;

use crate::{
    domain::{room_type, user, RoomType, User},
    infra::{database, Database},
    policy::{self, Action},
    Service,
};

use super::Command;

/// [`Command`] for creating a new [`RoomType`].
#[derive(Clone, Debug)]
pub struct CreateRoomType {
    /// Name of a new [`RoomType`].
    pub name: room_type::Name,

    /// Number of beds in a room of a new [`RoomType`].
    pub capacity: u16,

    /// Monthly rent of a room of a new [`RoomType`].
    pub monthly_price: Money,

    /// ID of the [`User`] creating the [`RoomType`].
    pub initiator_id: user::Id,
}

impl<Db, Ntf> Command<CreateRoomType> for Service<Db, Ntf>
where
    Db: Database<
            Select<By<Option<User>, user::Id>>,
            Ok = Option<User>,
            Err = Traced<database::Error>,
        > + Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<Insert<RoomType>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = RoomType;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: CreateRoomType,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CreateRoomType {
            name,
            capacity,
            monthly_price,
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

        if capacity == 0 {
            return Err(tracerr::new!(E::NoCapacity));
        }
        if monthly_price.amount < Decimal::ZERO {
            return Err(tracerr::new!(E::NegativePrice(monthly_price)));
        }

        let room_type = RoomType {
            id: room_type::Id::new(),
            name,
            capacity,
            monthly_price,
        };

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        tx.execute(Insert(room_type.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        Ok(room_type)
    }
}

/// Error of [`CreateRoomType`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// Monthly price is negative.
    #[display("Monthly price cannot be negative: {_0}")]
    #[from(ignore)]
    NegativePrice(#[error(not(source))] Money),

    /// [`RoomType`] must fit at least one person.
    #[display("`RoomType` must have a positive capacity")]
    #[from(ignore)]
    NoCapacity,

    /// Initiator is not allowed to manage [`RoomType`]s.
    #[display("Not authorized: {_0}")]
    #[from]
    Policy(policy::Error),
}

#[cfg(test)]
mod spec {
    use common::Money;

    use crate::{
        domain::{room_type, user::Role},
        fixture, Command as _,
    };

    use super::{CreateRoomType, ExecutionError};

    #[tokio::test]
    async fn creates_room_type() {
        let svc = fixture::service();
        let manager = fixture::user(&svc, Role::Manager).await;

        let room_type = svc
            .execute(CreateRoomType {
                name: room_type::Name::new("Quad").unwrap(),
                capacity: 4,
                monthly_price: Money::vnd(800_000),
                initiator_id: manager.id,
            })
            .await
            .unwrap();

        assert_eq!(room_type.capacity, 4);
        assert_eq!(room_type.monthly_price, Money::vnd(800_000));
    }

    #[tokio::test]
    async fn rejects_negative_price() {
        let svc = fixture::service();
        let staff = fixture::user(&svc, Role::Staff).await;

        let err = svc
            .execute(CreateRoomType {
                name: room_type::Name::new("Single").unwrap(),
                capacity: 1,
                monthly_price: Money::vnd(-1),
                initiator_id: staff.id,
            })
            .await
            .unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::NegativePrice(_)));
    }
}
