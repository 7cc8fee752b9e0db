//! [`Contract`]-related definitions.

use common::{Date, DateTime, Money};
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

/// A rental [`Contract`] of an [`api::Room`] by an [`api::Student`].
#[derive(Clone, Debug)]
pub struct Contract {
    /// ID of this [`Contract`].
    pub id: Id,

    /// [`domain::Contract`] representing this [`Contract`].
    contract: OnceCell<domain::Contract>,
}

impl From<domain::Contract> for Contract {
    fn from(contract: domain::Contract) -> Self {
        Self {
            id: contract.id.into(),
            contract: OnceCell::new_with(Some(contract)),
        }
    }
}

impl Contract {
    /// Creates a new [`Contract`] with the provided ID.
    ///
    /// # Safety
    ///
    /// Caller must ensure that [`Contract`] with the provided ID exists,
    /// otherwise accessing this [`Contract`] will result with an error.
    #[expect(unsafe_code, reason = "bypass")]
    #[must_use]
    pub unsafe fn new_unchecked(id: impl Into<Id>) -> Self {
        Self {
            id: id.into(),
            contract: OnceCell::new(),
        }
    }

    /// Returns the [`domain::Contract`] representing this [`Contract`].
    async fn contract(
        &self,
        ctx: &Context,
    ) -> Result<&domain::Contract, Error> {
        let id = self.id.into();
        self.contract
            .get_or_try_init(|| {
                ctx.service()
                    .execute(query::contract::ById::by(id))
                    .map_err(AsError::into_error)
                    .map_err(ctx.error())
                    .and_then(|c| {
                        future::ready(c.ok_or_else(|| {
                            ctx.error()(
                                api::query::ContractError::NotExists.into(),
                            )
                        }))
                    })
            })
            .await
    }
}

/// A rental `Contract` of a `Room` by a `Student`.
#[graphql_object(context = Context)]
impl Contract {
    /// Unique identifier of this `Contract`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Contract.id",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub fn id(&self) -> Id {
        self.id
    }

    /// Human-readable number of this `Contract`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Contract.number",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn number(&self, ctx: &Context) -> Result<Number, Error> {
        Ok(self.contract(ctx).await?.number.clone().into())
    }

    /// `Student` renting the `Room`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Contract.student",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn student(&self, ctx: &Context) -> Result<api::Student, Error> {
        let student_id = self.contract(ctx).await?.student_id;
        #[expect(
            unsafe_code,
            reason = "`Contract` cannot exist without its `Student`"
        )]
        let student = unsafe { api::Student::new_unchecked(student_id) };
        Ok(student)
    }

    /// Rented `Room`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Contract.room",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn room(&self, ctx: &Context) -> Result<api::Room, Error> {
        let room_id = self.contract(ctx).await?.room_id;
        #[expect(
            unsafe_code,
            reason = "`Contract` cannot exist without its `Room`"
        )]
        let room = unsafe { api::Room::new_unchecked(room_id) };
        Ok(room)
    }

    /// `Date` this `Contract` comes into effect.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Contract.startDate",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn start_date(&self, ctx: &Context) -> Result<Date, Error> {
        Ok(self.contract(ctx).await?.start_date)
    }

    /// `Date` this `Contract` ends.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Contract.endDate",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn end_date(&self, ctx: &Context) -> Result<Date, Error> {
        Ok(self.contract(ctx).await?.end_date)
    }

    /// Deposit paid for this `Contract`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Contract.deposit",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn deposit(&self, ctx: &Context) -> Result<Money, Error> {
        Ok(self.contract(ctx).await?.deposit)
    }

    /// Lifecycle `ContractStatus` of this `Contract`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Contract.status",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn status(&self, ctx: &Context) -> Result<Status, Error> {
        Ok(self.contract(ctx).await?.status.into())
    }

    /// `DateTime` when this `Contract` was created.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Contract.createdAt",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn created_at(&self, ctx: &Context) -> Result<DateTime, Error> {
        Ok(self.contract(ctx).await?.created_at.coerce())
    }
}

/// Unique identifier of a `Contract`.
#[derive(
    Clone, Copy, Debug, Display, Eq, From, GraphQLScalar, Into, PartialEq,
)]
#[from(domain::contract::Id)]
#[into(domain::contract::Id)]
#[graphql(name = "ContractId", transparent)]
pub struct Id(Uuid);

/// Human-readable number of a `Contract`.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "ContractNumber",
    with = scalar::Via::<domain::contract::Number>,
)]
pub struct Number(domain::contract::Number);

/// Lifecycle status of a `Contract`.
#[derive(Clone, Copy, Debug, Eq, GraphQLEnum, PartialEq)]
#[graphql(name = "ContractStatus")]
pub enum Status {
    /// `Contract` is in effect and occupies its `Room`.
    Active,

    /// `Contract` has reached its end `Date`.
    Expired,

    /// `Contract` was terminated before its end `Date`.
    Terminated,
}

impl From<domain::contract::Status> for Status {
    fn from(status: domain::contract::Status) -> Self {
        use domain::contract::Status as S;
        match status {
            S::Active => Self::Active,
            S::Expired => Self::Expired,
            S::Terminated => Self::Terminated,
        }
    }
}

impl From<Status> for domain::contract::Status {
    fn from(status: Status) -> Self {
        match status {
            Status::Active => Self::Active,
            Status::Expired => Self::Expired,
            Status::Terminated => Self::Terminated,
        }
    }
}

pub mod list {
    //! Definitions related to [`Contract`] list.

    define_list!(
        Contract in contract as
        "ContractListCursor",
        "ContractListEdge",
        "ContractListConnection",
        "ContractListPageInfo",
    );
}
