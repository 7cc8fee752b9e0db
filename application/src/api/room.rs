//! [`Room`]-related definitions.

use common::DateTime;
use derive_more::{AsRef, Display, From, Into};
use futures::{future, TryFutureExt as _};
use juniper::{graphql_object, GraphQLEnum, GraphQLScalar};
use service::{domain, query, Query as _};
use tokio::sync::OnceCell;
use uuid::Uuid;

use crate::{
    api::{self, scalar},
    AsError, Context, Error,
};

/// A [`Room`] in a dormitory [`api::Building`].
#[derive(Clone, Debug)]
pub struct Room {
    /// ID of this [`Room`].
    pub id: Id,

    /// [`domain::Room`] representing this [`Room`].
    room: OnceCell<domain::Room>,
}

impl From<domain::Room> for Room {
    fn from(room: domain::Room) -> Self {
        Self {
            id: room.id.into(),
            room: OnceCell::new_with(Some(room)),
        }
    }
}

impl Room {
    /// Creates a new [`Room`] with the provided ID.
    ///
    /// # Safety
    ///
    /// Caller must ensure that [`Room`] with the provided ID exists,
    /// otherwise accessing this [`Room`] will result with an error.
    #[expect(unsafe_code, reason = "bypass")]
    #[must_use]
    pub unsafe fn new_unchecked(id: impl Into<Id>) -> Self {
        Self {
            id: id.into(),
            room: OnceCell::new(),
        }
    }

    /// Returns the [`domain::Room`] representing this [`Room`].
    async fn room(&self, ctx: &Context) -> Result<&domain::Room, Error> {
        let id = self.id.into();
        self.room
            .get_or_try_init(|| {
                ctx.service()
                    .execute(query::room::ById::by(id))
                    .map_err(AsError::into_error)
                    .map_err(ctx.error())
                    .and_then(|r| {
                        future::ready(r.ok_or_else(|| {
                            ctx.error()(api::query::RoomError::NotExists.into())
                        }))
                    })
            })
            .await
    }
}

/// A `Room` in a dormitory `Building`.
#[graphql_object(context = Context)]
impl Room {
    /// Unique identifier of this `Room`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Room.id",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub fn id(&self) -> Id {
        self.id
    }

    /// Number of this `Room`, unique within its `Building`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Room.number",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn number(&self, ctx: &Context) -> Result<Number, Error> {
        Ok(self.room(ctx).await?.number.clone().into())
    }

    /// `Building` this `Room` is located in.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Room.building",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn building(
        &self,
        ctx: &Context,
    ) -> Result<api::Building, Error> {
        let building_id = self.room(ctx).await?.building_id;
        #[expect(
            unsafe_code,
            reason = "`Room` cannot exist without its `Building`"
        )]
        let building = unsafe { api::Building::new_unchecked(building_id) };
        Ok(building)
    }

    /// `RoomType` of this `Room`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Room.roomType",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn room_type(
        &self,
        ctx: &Context,
    ) -> Result<api::RoomType, Error> {
        let room_type_id = self.room(ctx).await?.room_type_id;
        ctx.service()
            .execute(query::room_type::ById::by(room_type_id))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())?
            .ok_or_else(|| api::query::RoomTypeError::NotExists.into())
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Floor this `Room` is located on.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Room.floor",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn floor(&self, ctx: &Context) -> Result<i32, Error> {
        Ok(self.room(ctx).await?.floor.into())
    }

    /// Current availability `RoomStatus` of this `Room`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Room.status",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn status(&self, ctx: &Context) -> Result<Status, Error> {
        Ok(self.room(ctx).await?.status.into())
    }

    /// Notes about this `Room`, if any.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Room.notes",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn notes(&self, ctx: &Context) -> Result<Option<Notes>, Error> {
        Ok(self.room(ctx).await?.notes.clone().map(Into::into))
    }

    /// `DateTime` when this `Room` was created.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Room.createdAt",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn created_at(&self, ctx: &Context) -> Result<DateTime, Error> {
        Ok(self.room(ctx).await?.created_at.coerce())
    }
}

/// Unique identifier of a `Room`.
#[derive(
    Clone, Copy, Debug, Display, Eq, From, GraphQLScalar, Into, PartialEq,
)]
#[from(domain::room::Id)]
#[into(domain::room::Id)]
#[graphql(name = "RoomId", transparent)]
pub struct Id(Uuid);

/// Number of a `Room`.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "RoomNumber",
    with = scalar::Via::<domain::room::Number>,
)]
pub struct Number(domain::room::Number);

/// Notes about a `Room`.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "RoomNotes",
    with = scalar::Via::<domain::room::Notes>,
)]
pub struct Notes(domain::room::Notes);

/// Availability status of a `Room`.
#[derive(Clone, Copy, Debug, Eq, GraphQLEnum, PartialEq)]
#[graphql(name = "RoomStatus")]
pub enum Status {
    /// `Room` is free and can be booked.
    Available,

    /// `Room` is taken by an active `Contract`.
    Occupied,

    /// `Room` is under maintenance and cannot be booked.
    Maintenance,
}

impl From<domain::room::Status> for Status {
    fn from(status: domain::room::Status) -> Self {
        use domain::room::Status as S;
        match status {
            S::Available => Self::Available,
            S::Occupied => Self::Occupied,
            S::Maintenance => Self::Maintenance,
        }
    }
}

impl From<Status> for domain::room::Status {
    fn from(status: Status) -> Self {
        match status {
            Status::Available => Self::Available,
            Status::Occupied => Self::Occupied,
            Status::Maintenance => Self::Maintenance,
        }
    }
}

pub mod list {
    //! Definitions related to [`Room`] list.

    define_list!(
        Room in room as
        "RoomListCursor",
        "RoomListEdge",
        "RoomListConnection",
        "RoomListPageInfo",
    );
}
