//! [`Payment`]-related definitions.

use common::{Date, DateTime, Money};
use derive_more::{Display, From, Into};
use futures::{future, TryFutureExt as _};
use juniper::{graphql_object, GraphQLEnum, GraphQLObject, GraphQLScalar};
use service::{domain, query, read, Query as _};
use tokio::sync::OnceCell;
use uuid::Uuid;

use crate::{api, AsError, Context, Error};

/// A [`Payment`] due for an [`api::Contract`].
#[derive(Clone, Debug)]
pub struct Payment {
    /// ID of this [`Payment`].
    pub id: Id,

    /// [`domain::Payment`] representing this [`Payment`].
    payment: OnceCell<domain::Payment>,
}

impl From<domain::Payment> for Payment {
    fn from(payment: domain::Payment) -> Self {
        Self {
            id: payment.id.into(),
            payment: OnceCell::new_with(Some(payment)),
        }
    }
}

impl Payment {
    /// Creates a new [`Payment`] with the provided ID.
    ///
    /// # Safety
    ///
    /// Caller must ensure that [`Payment`] with the provided ID exists,
    /// otherwise accessing this [`Payment`] will result with an error.
    #[expect(unsafe_code, reason = "bypass")]
    #[must_use]
    pub unsafe fn new_unchecked(id: impl Into<Id>) -> Self {
        Self {
            id: id.into(),
            payment: OnceCell::new(),
        }
    }

    /// Returns the [`domain::Payment`] representing this [`Payment`].
    async fn payment(
        &self,
        ctx: &Context,
    ) -> Result<&domain::Payment, Error> {
        let id = self.id.into();
        self.payment
            .get_or_try_init(|| {
                ctx.service()
                    .execute(query::payment::ById::by(id))
                    .map_err(AsError::into_error)
                    .map_err(ctx.error())
                    .and_then(|p| {
                        future::ready(p.ok_or_else(|| {
                            ctx.error()(
                                api::query::PaymentError::NotExists.into(),
                            )
                        }))
                    })
            })
            .await
    }
}

/// A `Payment` due for a `Contract`.
#[graphql_object(context = Context)]
impl Payment {
    /// Unique identifier of this `Payment`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Payment.id",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub fn id(&self) -> Id {
        self.id
    }

    /// `Contract` this `Payment` is due for.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Payment.contract",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn contract(
        &self,
        ctx: &Context,
    ) -> Result<api::Contract, Error> {
        let contract_id = self.payment(ctx).await?.contract_id;
        #[expect(
            unsafe_code,
            reason = "`Payment` cannot exist without its `Contract`"
        )]
        let contract = unsafe { api::Contract::new_unchecked(contract_id) };
        Ok(contract)
    }

    /// Amount to be paid.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Payment.amount",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn amount(&self, ctx: &Context) -> Result<Money, Error> {
        Ok(self.payment(ctx).await?.amount)
    }

    /// `Date` this `Payment` is due at.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Payment.dueDate",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn due_date(&self, ctx: &Context) -> Result<Date, Error> {
        Ok(self.payment(ctx).await?.due_date)
    }

    /// Settlement `PaymentStatus` of this `Payment`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Payment.status",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn status(&self, ctx: &Context) -> Result<Status, Error> {
        Ok(self.payment(ctx).await?.status.into())
    }

    /// Indicator whether this `Payment` is pending past its due `Date`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Payment.isOverdue",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn is_overdue(&self, ctx: &Context) -> Result<bool, Error> {
        Ok(self.payment(ctx).await?.is_overdue(Date::today()))
    }

    /// `DateTime` when this `Payment` was settled, if it was.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Payment.paidAt",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn paid_at(
        &self,
        ctx: &Context,
    ) -> Result<Option<DateTime>, Error> {
        Ok(self.payment(ctx).await?.paid_at.map(|at| at.coerce()))
    }

    /// `DateTime` when this `Payment` was created.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Payment.createdAt",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn created_at(&self, ctx: &Context) -> Result<DateTime, Error> {
        Ok(self.payment(ctx).await?.created_at.coerce())
    }
}

/// Unique identifier of a `Payment`.
#[derive(
    Clone, Copy, Debug, Display, Eq, From, GraphQLScalar, Into, PartialEq,
)]
#[from(domain::payment::Id)]
#[into(domain::payment::Id)]
#[graphql(name = "PaymentId", transparent)]
pub struct Id(Uuid);

/// Settlement status of a `Payment`.
#[derive(Clone, Copy, Debug, Eq, GraphQLEnum, PartialEq)]
#[graphql(name = "PaymentStatus")]
pub enum Status {
    /// `Payment` is awaited.
    Pending,

    /// `Payment` has been paid.
    Paid,
}

impl From<domain::payment::Status> for Status {
    fn from(status: domain::payment::Status) -> Self {
        use domain::payment::Status as S;
        match status {
            S::Pending => Self::Pending,
            S::Paid => Self::Paid,
        }
    }
}

impl From<Status> for domain::payment::Status {
    fn from(status: Status) -> Self {
        match status {
            Status::Pending => Self::Pending,
            Status::Paid => Self::Paid,
        }
    }
}

/// Statistics of `Payment`s.
#[derive(Clone, Copy, Debug, GraphQLObject)]
#[graphql(context = Context, name = "PaymentStats")]
pub struct Stats {
    /// Number of pending `Payment`s.
    pub pending: i32,

    /// Number of paid `Payment`s.
    pub paid: i32,

    /// Number of pending `Payment`s past their due `Date`.
    pub overdue: i32,

    /// Sum of paid `Payment`s in VND.
    pub paid_amount: Money,
}

impl From<read::payment::Stats> for Stats {
    fn from(stats: read::payment::Stats) -> Self {
        let read::payment::Stats {
            pending,
            paid,
            overdue,
            paid_amount,
        } = stats;
        Self {
            pending: api::saturating(pending),
            paid: api::saturating(paid),
            overdue: api::saturating(overdue),
            paid_amount,
        }
    }
}

/// Reminder about a pending `Payment` delivered to a `Student`.
#[derive(Clone, Debug, GraphQLObject)]
#[graphql(context = Context, name = "PaymentReminder")]
pub struct Reminder {
    /// `Payment` the reminder is about.
    pub payment: Payment,

    /// Email the reminder was delivered to.
    pub email: Option<api::user::Email>,

    /// Amount to be paid.
    pub amount: Money,

    /// `Date` the `Payment` is due at.
    pub due_date: Date,
}

impl From<domain::payment::Reminder> for Reminder {
    fn from(reminder: domain::payment::Reminder) -> Self {
        #[expect(
            unsafe_code,
            reason = "`Reminder` is built from an existing `Payment`"
        )]
        let payment = unsafe { Payment::new_unchecked(reminder.payment_id) };
        Self {
            payment,
            email: reminder.email.map(Into::into),
            amount: reminder.amount,
            due_date: reminder.due_date,
        }
    }
}

pub mod list {
    //! Definitions related to [`Payment`] list.

    define_list!(
        Payment in payment as
        "PaymentListCursor",
        "PaymentListEdge",
        "PaymentListConnection",
        "PaymentListPageInfo",
    );
}
