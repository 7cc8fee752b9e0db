//! [`Student`]-related definitions.

use common::Date;
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

/// A [`Student`] profile of an [`api::User`].
#[derive(Clone, Debug)]
pub struct Student {
    /// ID of this [`Student`].
    pub id: Id,

    /// [`domain::Student`] representing this [`Student`].
    student: OnceCell<domain::Student>,
}

impl From<domain::Student> for Student {
    fn from(student: domain::Student) -> Self {
        Self {
            id: student.id.into(),
            student: OnceCell::new_with(Some(student)),
        }
    }
}

impl Student {
    /// Creates a new [`Student`] with the provided ID.
    ///
    /// # Safety
    ///
    /// Caller must ensure that [`Student`] with the provided ID exists,
    /// otherwise accessing this [`Student`] will result with an error.
    #[expect(unsafe_code, reason = "bypass")]
    #[must_use]
    pub unsafe fn new_unchecked(id: impl Into<Id>) -> Self {
        Self {
            id: id.into(),
            student: OnceCell::new(),
        }
    }

    /// Returns the [`domain::Student`] representing this [`Student`].
    async fn student(
        &self,
        ctx: &Context,
    ) -> Result<&domain::Student, Error> {
        let id = self.id.into();
        self.student
            .get_or_try_init(|| {
                ctx.service()
                    .execute(query::student::ById::by(id))
                    .map_err(AsError::into_error)
                    .map_err(ctx.error())
                    .and_then(|s| {
                        future::ready(s.ok_or_else(|| {
                            ctx.error()(
                                api::query::StudentError::NotExists.into(),
                            )
                        }))
                    })
            })
            .await
    }
}

/// A `Student` profile of a `User`.
#[graphql_object(context = Context)]
impl Student {
    /// Unique identifier of this `Student`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Student.id",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub fn id(&self) -> Id {
        self.id
    }

    /// `User` account this `Student` profile belongs to.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Student.user",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn user(&self, ctx: &Context) -> Result<api::User, Error> {
        let user_id = self.student(ctx).await?.user_id;
        #[expect(
            unsafe_code,
            reason = "`Student` cannot exist without its `User`"
        )]
        let user = unsafe { api::User::new_unchecked(user_id) };
        Ok(user)
    }

    /// Globally unique number of this `Student`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Student.number",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn number(&self, ctx: &Context) -> Result<Number, Error> {
        Ok(self.student(ctx).await?.number.clone().into())
    }

    /// Full name of this `Student`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Student.fullName",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn full_name(&self, ctx: &Context) -> Result<FullName, Error> {
        Ok(self.student(ctx).await?.full_name.clone().into())
    }

    /// `Date` of birth of this `Student`, if known.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Student.dateOfBirth",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn date_of_birth(
        &self,
        ctx: &Context,
    ) -> Result<Option<Date>, Error> {
        Ok(self.student(ctx).await?.date_of_birth)
    }

    /// University this `Student` studies at.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Student.university",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn university(
        &self,
        ctx: &Context,
    ) -> Result<University, Error> {
        Ok(self.student(ctx).await?.university.clone().into())
    }

    /// Faculty this `Student` studies at.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Student.faculty",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn faculty(&self, ctx: &Context) -> Result<Faculty, Error> {
        Ok(self.student(ctx).await?.faculty.clone().into())
    }

    /// Course this `Student` studies in.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Student.course",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn course(&self, ctx: &Context) -> Result<Course, Error> {
        Ok(self.student(ctx).await?.course.clone().into())
    }

    /// Currently active `Contract` of this `Student`, if any.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Student.activeContract",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn active_contract(
        &self,
        ctx: &Context,
    ) -> Result<Option<api::Contract>, Error> {
        ctx.service()
            .execute(query::contract::ActiveByStudent::by(self.id.into()))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(|c| c.map(|active| active.0.into()))
    }
}

/// Unique identifier of a `Student`.
#[derive(
    Clone, Copy, Debug, Display, Eq, From, GraphQLScalar, Into, PartialEq,
)]
#[from(domain::student::Id)]
#[into(domain::student::Id)]
#[graphql(name = "StudentId", transparent)]
pub struct Id(Uuid);

/// Globally unique number of a `Student`.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "StudentNumber",
    with = scalar::Via::<domain::student::Number>,
)]
pub struct Number(domain::student::Number);

/// Full name of a `Student`.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "StudentFullName",
    with = scalar::Via::<domain::student::FullName>,
)]
pub struct FullName(domain::student::FullName);

/// University a `Student` studies at.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "StudentUniversity",
    with = scalar::Via::<domain::student::University>,
)]
pub struct University(domain::student::University);

/// Faculty a `Student` studies at.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "StudentFaculty",
    with = scalar::Via::<domain::student::Faculty>,
)]
pub struct Faculty(domain::student::Faculty);

/// Course a `Student` studies in.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "StudentCourse",
    with = scalar::Via::<domain::student::Course>,
)]
pub struct Course(domain::student::Course);

pub mod list {
    //! Definitions related to [`Student`] list.

    define_list!(
        Student in student as
        "StudentListCursor",
        "StudentListEdge",
        "StudentListConnection",
        "StudentListPageInfo",
    );
}
