//! GraphQL [`Query`]s definitions.

use common::Date;
use itertools::Itertools as _;
use juniper::graphql_object;
use service::{policy::Action, query, read, Query as _};

use crate::{api, define_error, AsError, Context, Error};

/// Root of all GraphQL queries.
#[derive(Clone, Copy, Debug)]
pub struct Query;

impl Query {
    /// Name of the [`tracing::Span`] for the queries.
    pub(crate) const SPAN_NAME: &'static str = "GraphQL query";

    /// Default number of entities in a list page.
    const DEFAULT_PAGE_SIZE: i32 = 10;
}

#[graphql_object(context = Context)]
impl Query {
    /// Returns the currently authenticated `User`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "myUser",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn my_user(ctx: &Context) -> Result<api::User, Error> {
        Ok(ctx.current_user().await?.clone().into())
    }

    /// Returns the `Student` profile of the currently authenticated `User`,
    /// if it has been completed.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "myStudent",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn my_student(
        ctx: &Context,
    ) -> Result<Option<api::Student>, Error> {
        let me = ctx.current_user().await?;
        ctx.service()
            .execute(query::student::ByUserId::by(me.id))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(|s| s.map(Into::into))
    }

    /// Returns the `ACTIVE` `Contract` of the currently authenticated
    /// `User`, if any.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `STUDENT_PROFILE_NOT_EXISTS` - the current `User` has no `Student`
    ///                                  profile.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "myActiveContract",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn my_active_contract(
        ctx: &Context,
    ) -> Result<Option<api::Contract>, Error> {
        let me = ctx.current_user().await?;
        let student = ctx
            .service()
            .execute(query::student::ByUserId::by(me.id))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())?
            .ok_or_else(|| StudentError::NoProfile.into())
            .map_err(ctx.error())?;

        ctx.service()
            .execute(query::contract::ActiveByStudent::by(student.id))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(|c| c.map(|active| active.0.into()))
    }

    /// Returns the `Building` with the specified ID.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `BUILDING_NOT_EXISTS` - the `Building` with the specified ID does
    ///                           not exist.
    #[tracing::instrument(
        skip_all,
        fields(
            id = %id,
            gql.name = "building",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn building(
        id: api::building::Id,
        ctx: &Context,
    ) -> Result<api::Building, Error> {
        _ = ctx.current_user().await?;

        ctx.service()
            .execute(query::building::ById::by(id.into()))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())?
            .ok_or_else(|| BuildingError::NotExists.into())
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Fetches the page of `Building`s ordered by their IDs.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `AMBIGUOUS_PAGINATION_ARGUMENTS` - the pagination arguments are
    ///                                      ambiguous.
    #[tracing::instrument(
        skip_all,
        fields(
            after = ?after,
            before = ?before,
            first = ?first,
            gql.name = "buildings",
            last = ?last,
            otel.name = Self::SPAN_NAME,
            search = ?search.as_ref().map(ToString::to_string),
        ),
    )]
    pub async fn buildings(
        first: Option<i32>,
        after: Option<api::building::list::Cursor>,
        last: Option<i32>,
        before: Option<api::building::list::Cursor>,
        search: Option<api::SearchQuery>,
        ctx: &Context,
    ) -> Result<api::building::list::Connection, Error> {
        _ = ctx.current_user().await?;

        ctx.service()
            .execute(query::building::List::by(
                read::building::list::Selector {
                    arguments: read::building::list::Arguments::new(
                        first,
                        after.map(Into::into),
                        last,
                        before.map(Into::into),
                        Self::DEFAULT_PAGE_SIZE,
                    )
                    .ok_or_else(|| api::PaginationError::Ambiguous.into())
                    .map_err(ctx.error())?,
                    filter: read::building::list::Filter {
                        search: search.map(Into::into),
                    },
                },
            ))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Returns all the `RoomType`s ordered by their names.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "roomTypes",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn room_types(
        ctx: &Context,
    ) -> Result<Vec<api::RoomType>, Error> {
        _ = ctx.current_user().await?;

        ctx.service()
            .execute(query::room_type::All::by(()))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(|types| types.into_iter().map(Into::into).collect())
    }

    /// Returns the `Room` with the specified ID.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `ROOM_NOT_EXISTS` - the `Room` with the specified ID does not exist.
    #[tracing::instrument(
        skip_all,
        fields(
            id = %id,
            gql.name = "room",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn room(
        id: api::room::Id,
        ctx: &Context,
    ) -> Result<api::Room, Error> {
        _ = ctx.current_user().await?;

        ctx.service()
            .execute(query::room::ById::by(id.into()))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())?
            .ok_or_else(|| RoomError::NotExists.into())
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Fetches the page of `Room`s ordered by their IDs.
    ///
    /// `Student`s are listed `AVAILABLE` `Room`s only, regardless of the
    /// requested `status`.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `AMBIGUOUS_PAGINATION_ARGUMENTS` - the pagination arguments are
    ///                                      ambiguous.
    #[tracing::instrument(
        skip_all,
        fields(
            after = ?after,
            before = ?before,
            building_id = ?building_id,
            first = ?first,
            gql.name = "rooms",
            last = ?last,
            otel.name = Self::SPAN_NAME,
            search = ?search.as_ref().map(ToString::to_string),
            status = ?status,
        ),
    )]
    pub async fn rooms(
        first: Option<i32>,
        after: Option<api::room::list::Cursor>,
        last: Option<i32>,
        before: Option<api::room::list::Cursor>,
        search: Option<api::SearchQuery>,
        status: Option<api::room::Status>,
        building_id: Option<api::building::Id>,
        ctx: &Context,
    ) -> Result<api::room::list::Connection, Error> {
        let me = ctx.current_user().await?;

        ctx.service()
            .execute(query::visible::Visible {
                viewer_id: me.id,
                selector: read::room::list::Selector {
                    arguments: read::room::list::Arguments::new(
                        first,
                        after.map(Into::into),
                        last,
                        before.map(Into::into),
                        Self::DEFAULT_PAGE_SIZE,
                    )
                    .ok_or_else(|| api::PaginationError::Ambiguous.into())
                    .map_err(ctx.error())?,
                    filter: read::room::list::Filter {
                        search: search.map(Into::into),
                        status: status.map(Into::into),
                        building_id: building_id.map(Into::into),
                    },
                },
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Returns the `Student` with the specified ID.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `STUDENT_NOT_EXISTS` - the `Student` with the specified ID does not
    ///                          exist;
    /// - `FORBIDDEN` - the current `User` is not a staff member.
    #[tracing::instrument(
        skip_all,
        fields(
            id = %id,
            gql.name = "student",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn student(
        id: api::student::Id,
        ctx: &Context,
    ) -> Result<api::Student, Error> {
        Self::students(None, Some(id.into()), None, Some(id.into()), None, ctx)
            .await?
            .edges()
            .into_iter()
            .exactly_one()
            .map(|edge| edge.node())
            .map_err(|_| StudentError::NotExists.into())
            .map_err(ctx.error())
    }

    /// Fetches the page of `Student`s ordered by their IDs.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `AMBIGUOUS_PAGINATION_ARGUMENTS` - the pagination arguments are
    ///                                      ambiguous;
    /// - `FORBIDDEN` - the current `User` is not a staff member.
    #[tracing::instrument(
        skip_all,
        fields(
            after = ?after,
            before = ?before,
            first = ?first,
            gql.name = "students",
            last = ?last,
            otel.name = Self::SPAN_NAME,
            search = ?search.as_ref().map(ToString::to_string),
        ),
    )]
    pub async fn students(
        first: Option<i32>,
        after: Option<api::student::list::Cursor>,
        last: Option<i32>,
        before: Option<api::student::list::Cursor>,
        search: Option<api::SearchQuery>,
        ctx: &Context,
    ) -> Result<api::student::list::Connection, Error> {
        _ = ctx.authorize(Action::ManageStudents).await?;

        ctx.service()
            .execute(query::student::List::by(
                read::student::list::Selector {
                    arguments: read::student::list::Arguments::new(
                        first,
                        after.map(Into::into),
                        last,
                        before.map(Into::into),
                        Self::DEFAULT_PAGE_SIZE,
                    )
                    .ok_or_else(|| api::PaginationError::Ambiguous.into())
                    .map_err(ctx.error())?,
                    filter: read::student::list::Filter {
                        search: search.map(Into::into),
                    },
                },
            ))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Returns the `Contract` with the specified ID.
    ///
    /// `Student`s may access their own `Contract`s only.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `CONTRACT_NOT_EXISTS` - the `Contract` with the specified ID does not
    ///                           exist;
    /// - `STUDENT_PROFILE_NOT_EXISTS` - the current `User` is a `Student`
    ///                                  without a profile.
    #[tracing::instrument(
        skip_all,
        fields(
            id = %id,
            gql.name = "contract",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn contract(
        id: api::contract::Id,
        ctx: &Context,
    ) -> Result<api::Contract, Error> {
        Self::contracts(
            None,
            Some(id.into()),
            None,
            Some(id.into()),
            None,
            None,
            None,
            ctx,
        )
        .await?
        .edges()
        .into_iter()
        .exactly_one()
        .map(|edge| edge.node())
        .map_err(|_| ContractError::NotExists.into())
        .map_err(ctx.error())
    }

    /// Fetches the page of `Contract`s ordered by their IDs.
    ///
    /// `Student`s are listed their own `Contract`s only, regardless of the
    /// requested `studentId`.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `AMBIGUOUS_PAGINATION_ARGUMENTS` - the pagination arguments are
    ///                                      ambiguous;
    /// - `STUDENT_PROFILE_NOT_EXISTS` - the current `User` is a `Student`
    ///                                  without a profile.
    #[tracing::instrument(
        skip_all,
        fields(
            after = ?after,
            before = ?before,
            first = ?first,
            gql.name = "contracts",
            last = ?last,
            otel.name = Self::SPAN_NAME,
            search = ?search.as_ref().map(ToString::to_string),
            status = ?status,
            student_id = ?student_id,
        ),
    )]
    pub async fn contracts(
        first: Option<i32>,
        after: Option<api::contract::list::Cursor>,
        last: Option<i32>,
        before: Option<api::contract::list::Cursor>,
        search: Option<api::SearchQuery>,
        status: Option<api::contract::Status>,
        student_id: Option<api::student::Id>,
        ctx: &Context,
    ) -> Result<api::contract::list::Connection, Error> {
        let me = ctx.current_user().await?;

        ctx.service()
            .execute(query::visible::Visible {
                viewer_id: me.id,
                selector: read::contract::list::Selector {
                    arguments: read::contract::list::Arguments::new(
                        first,
                        after.map(Into::into),
                        last,
                        before.map(Into::into),
                        Self::DEFAULT_PAGE_SIZE,
                    )
                    .ok_or_else(|| api::PaginationError::Ambiguous.into())
                    .map_err(ctx.error())?,
                    filter: read::contract::list::Filter {
                        search: search.map(Into::into),
                        status: status.map(Into::into),
                        student_id: student_id.map(Into::into),
                    },
                },
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Returns the `Payment` with the specified ID.
    ///
    /// `Student`s may access their own `Payment`s only.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `PAYMENT_NOT_EXISTS` - the `Payment` with the specified ID does not
    ///                          exist;
    /// - `STUDENT_PROFILE_NOT_EXISTS` - the current `User` is a `Student`
    ///                                  without a profile.
    #[tracing::instrument(
        skip_all,
        fields(
            id = %id,
            gql.name = "payment",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn payment(
        id: api::payment::Id,
        ctx: &Context,
    ) -> Result<api::Payment, Error> {
        Self::payments(
            None,
            Some(id.into()),
            None,
            Some(id.into()),
            None,
            None,
            ctx,
        )
        .await?
        .edges()
        .into_iter()
        .exactly_one()
        .map(|edge| edge.node())
        .map_err(|_| PaymentError::NotExists.into())
        .map_err(ctx.error())
    }

    /// Fetches the page of `Payment`s ordered by their IDs.
    ///
    /// `Student`s are listed their own `Payment`s only, regardless of the
    /// requested `studentId`.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `AMBIGUOUS_PAGINATION_ARGUMENTS` - the pagination arguments are
    ///                                      ambiguous;
    /// - `STUDENT_PROFILE_NOT_EXISTS` - the current `User` is a `Student`
    ///                                  without a profile.
    #[tracing::instrument(
        skip_all,
        fields(
            after = ?after,
            before = ?before,
            first = ?first,
            gql.name = "payments",
            last = ?last,
            otel.name = Self::SPAN_NAME,
            status = ?status,
            student_id = ?student_id,
        ),
    )]
    pub async fn payments(
        first: Option<i32>,
        after: Option<api::payment::list::Cursor>,
        last: Option<i32>,
        before: Option<api::payment::list::Cursor>,
        status: Option<api::payment::Status>,
        student_id: Option<api::student::Id>,
        ctx: &Context,
    ) -> Result<api::payment::list::Connection, Error> {
        let me = ctx.current_user().await?;

        ctx.service()
            .execute(query::visible::Visible {
                viewer_id: me.id,
                selector: read::payment::list::Selector {
                    arguments: read::payment::list::Arguments::new(
                        first,
                        after.map(Into::into),
                        last,
                        before.map(Into::into),
                        Self::DEFAULT_PAGE_SIZE,
                    )
                    .ok_or_else(|| api::PaginationError::Ambiguous.into())
                    .map_err(ctx.error())?,
                    filter: read::payment::list::Filter {
                        status: status.map(Into::into),
                        student_id: student_id.map(Into::into),
                    },
                },
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Calculates `PaymentStats` of the specified `Student`, or of all
    /// `Student`s if none is specified.
    ///
    /// `Student`s are given their own `PaymentStats` only.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "paymentStats",
            otel.name = Self::SPAN_NAME,
            student_id = ?student_id,
        ),
    )]
    pub async fn payment_stats(
        student_id: Option<api::student::Id>,
        ctx: &Context,
    ) -> Result<api::payment::Stats, Error> {
        let me = ctx.current_user().await?;

        ctx.service()
            .execute(query::visible::Visible {
                viewer_id: me.id,
                selector: read::payment::StatsScope {
                    student_id: student_id.map(Into::into),
                    today: Date::today(),
                },
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Calculates the `DashboardReport` as of today.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `FORBIDDEN` - the current `User` is not a staff member.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "dashboard",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn dashboard(
        ctx: &Context,
    ) -> Result<api::report::Dashboard, Error> {
        _ = ctx.authorize(Action::ViewReports).await?;

        ctx.service()
            .execute(query::report::Dashboard {
                today: Date::today(),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Calculates the `OccupancyReport` as of today.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `FORBIDDEN` - the current `User` is not a staff member.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "occupancyReport",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn occupancy_report(
        ctx: &Context,
    ) -> Result<api::report::Occupancy, Error> {
        _ = ctx.authorize(Action::ViewReports).await?;

        ctx.service()
            .execute(query::report::Occupancy {
                today: Date::today(),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }
}

define_error! {
    enum BuildingError {
        #[code = "BUILDING_NOT_EXISTS"]
        #[status = NOT_FOUND]
        #[message = "`Building` with the specified ID does not exist"]
        NotExists,
    }
}

define_error! {
    enum ContractError {
        #[code = "CONTRACT_NOT_EXISTS"]
        #[status = NOT_FOUND]
        #[message = "`Contract` with the specified ID does not exist"]
        NotExists,
    }
}

define_error! {
    enum PaymentError {
        #[code = "PAYMENT_NOT_EXISTS"]
        #[status = NOT_FOUND]
        #[message = "`Payment` with the specified ID does not exist"]
        NotExists,
    }
}

define_error! {
    enum RoomError {
        #[code = "ROOM_NOT_EXISTS"]
        #[status = NOT_FOUND]
        #[message = "`Room` with the specified ID does not exist"]
        NotExists,
    }
}

define_error! {
    enum RoomTypeError {
        #[code = "ROOM_TYPE_NOT_EXISTS"]
        #[status = NOT_FOUND]
        #[message = "`RoomType` with the specified ID does not exist"]
        NotExists,
    }
}

define_error! {
    enum StudentError {
        #[code = "STUDENT_NOT_EXISTS"]
        #[status = NOT_FOUND]
        #[message = "`Student` with the specified ID does not exist"]
        NotExists,

        #[code = "STUDENT_PROFILE_NOT_EXISTS"]
        #[status = NOT_FOUND]
        #[message = "Authenticated `User` has no `Student` profile yet"]
        NoProfile,
    }
}

define_error! {
    enum UserError {
        #[code = "USER_NOT_EXISTS"]
        #[status = NOT_FOUND]
        #[message = "`User` with the specified ID does not exist"]
        NotExists,
    }
}

impl AsError for query::visible::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::NoProfile(_) => Some(StudentError::NoProfile.into()),
            Self::UserNotExists(_) => Some(UserError::NotExists.into()),
        }
    }
}
