//! [`Building`]-related definitions.

use common::DateTime;
use derive_more::{AsRef, Display, From, Into};
use futures::{future, TryFutureExt as _};
use juniper::{graphql_object, GraphQLScalar};
use service::{domain, query, Query as _};
use tokio::sync::OnceCell;
use uuid::Uuid;

use crate::{
    api::{self, scalar},
    AsError, Context, Error,
};

/// A dormitory [`Building`].
#[derive(Clone, Debug)]
pub struct Building {
    /// ID of this [`Building`].
    pub id: Id,

    /// [`domain::Building`] representing this [`Building`].
    building: OnceCell<domain::Building>,
}

impl From<domain::Building> for Building {
    fn from(building: domain::Building) -> Self {
        Self {
            id: building.id.into(),
            building: OnceCell::new_with(Some(building)),
        }
    }
}

impl Building {
    /// Creates a new [`Building`] with the provided ID.
    ///
    /// # Safety
    ///
    /// Caller must ensure that [`Building`] with the provided ID exists,
    /// otherwise accessing this [`Building`] will result with an error.
    #[expect(unsafe_code, reason = "bypass")]
    #[must_use]
    pub unsafe fn new_unchecked(id: impl Into<Id>) -> Self {
        Self {
            id: id.into(),
            building: OnceCell::new(),
        }
    }

    /// Returns the [`domain::Building`] representing this [`Building`].
    async fn building(
        &self,
        ctx: &Context,
    ) -> Result<&domain::Building, Error> {
        let id = self.id.into();
        self.building
            .get_or_try_init(|| {
                ctx.service()
                    .execute(query::building::ById::by(id))
                    .map_err(AsError::into_error)
                    .map_err(ctx.error())
                    .and_then(|b| {
                        future::ready(b.ok_or_else(|| {
                            ctx.error()(
                                api::query::BuildingError::NotExists.into(),
                            )
                        }))
                    })
            })
            .await
    }
}

/// A dormitory `Building`.
#[graphql_object(context = Context)]
impl Building {
    /// Unique identifier of this `Building`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Building.id",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub fn id(&self) -> Id {
        self.id
    }

    /// Name of this `Building`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Building.name",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn name(&self, ctx: &Context) -> Result<Name, Error> {
        Ok(self.building(ctx).await?.name.clone().into())
    }

    /// Postal address of this `Building`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Building.address",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn address(&self, ctx: &Context) -> Result<Address, Error> {
        Ok(self.building(ctx).await?.address.clone().into())
    }

    /// Number of floors in this `Building`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Building.numFloors",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn num_floors(&self, ctx: &Context) -> Result<i32, Error> {
        Ok(self.building(ctx).await?.num_floors.into())
    }

    /// Description of this `Building`, if any.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Building.description",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn description(
        &self,
        ctx: &Context,
    ) -> Result<Option<Description>, Error> {
        Ok(self
            .building(ctx)
            .await?
            .description
            .clone()
            .map(Into::into))
    }

    /// `DateTime` when this `Building` was created.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Building.createdAt",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn created_at(&self, ctx: &Context) -> Result<DateTime, Error> {
        Ok(self.building(ctx).await?.created_at.coerce())
    }
}

/// Unique identifier of a `Building`.
#[derive(
    Clone, Copy, Debug, Display, Eq, From, GraphQLScalar, Into, PartialEq,
)]
#[from(domain::building::Id)]
#[into(domain::building::Id)]
#[graphql(name = "BuildingId", transparent)]
pub struct Id(Uuid);

/// Name of a `Building`.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "BuildingName",
    with = scalar::Via::<domain::building::Name>,
)]
pub struct Name(domain::building::Name);

/// Postal address of a `Building`.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "BuildingAddress",
    with = scalar::Via::<domain::building::Address>,
)]
pub struct Address(domain::building::Address);

/// Description of a `Building`.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "BuildingDescription",
    with = scalar::Via::<domain::building::Description>,
)]
pub struct Description(domain::building::Description);

pub mod list {
    //! Definitions related to [`Building`] list.

    define_list!(
        Building in building as
        "BuildingListCursor",
        "BuildingListEdge",
        "BuildingListConnection",
        "BuildingListPageInfo",
    );
}
