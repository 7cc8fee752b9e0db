//! [`RoomType`]-related definitions.

use common::Money;
use derive_more::{AsRef, Display, From, Into};
use juniper::{graphql_object, GraphQLScalar};
use service::domain;
use uuid::Uuid;

use crate::{api, api::scalar, Context};

/// A [`RoomType`] defining capacity and price of [`Room`]s.
///
/// [`Room`]: api::Room
#[derive(Clone, Debug, From)]
pub struct RoomType(domain::RoomType);

/// A type of `Room`s defining their capacity and monthly price.
#[graphql_object(context = Context)]
impl RoomType {
    /// Unique identifier of this `RoomType`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "RoomType.id",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub fn id(&self) -> Id {
        self.0.id.into()
    }

    /// Name of this `RoomType`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "RoomType.name",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub fn name(&self) -> Name {
        self.0.name.clone().into()
    }

    /// Number of students a `Room` of this `RoomType` fits.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "RoomType.capacity",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub fn capacity(&self) -> i32 {
        self.0.capacity.into()
    }

    /// Monthly price of a `Room` of this `RoomType`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "RoomType.monthlyPrice",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub fn monthly_price(&self) -> Money {
        self.0.monthly_price
    }
}

/// Unique identifier of a `RoomType`.
#[derive(
    Clone, Copy, Debug, Display, Eq, From, GraphQLScalar, Into, PartialEq,
)]
#[from(domain::room_type::Id)]
#[into(domain::room_type::Id)]
#[graphql(name = "RoomTypeId", transparent)]
pub struct Id(Uuid);

/// Name of a `RoomType`.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "RoomTypeName",
    with = scalar::Via::<domain::room_type::Name>,
)]
pub struct Name(domain::room_type::Name);
