//! [`User`]-related definitions.

use common::DateTime;
use derive_more::{AsRef, Display, From, Into};
use futures::{future, TryFutureExt as _};
use juniper::{graphql_object, GraphQLEnum, GraphQLScalar};
use service::{
    domain,
    policy::{self, Action},
    query, Query,
};
use tokio::sync::OnceCell;
use uuid::Uuid;

use crate::{
    api::{self, scalar},
    AsError, Context, Error,
};

/// A [`User`] of the system.
#[derive(Clone, Debug, From)]
pub struct User {
    /// ID of this [`User`].
    pub id: Id,

    /// [`domain::User`] representing this [`User`].
    user: OnceCell<domain::User>,
}

impl From<domain::User> for User {
    fn from(user: domain::User) -> Self {
        Self {
            id: user.id.into(),
            user: OnceCell::new_with(Some(user)),
        }
    }
}

impl User {
    /// Creates a new [`User`] with the provided ID.
    ///
    /// # Safety
    ///
    /// Caller must ensure that [`User`] with the provided ID exists,
    /// otherwise accessing this [`User`] will result with an error.
    #[expect(unsafe_code, reason = "bypass")]
    #[must_use]
    pub unsafe fn new_unchecked(id: impl Into<Id>) -> Self {
        Self {
            id: id.into(),
            user: OnceCell::new(),
        }
    }

    /// Returns the [`domain::User`] representing this [`User`].
    ///
    /// # Errors
    ///
    /// Error if the [`domain::User`] doesn't exist.
    async fn user(&self, ctx: &Context) -> Result<&domain::User, Error> {
        let id = self.id.into();
        self.user
            .get_or_try_init(|| {
                ctx.service()
                    .execute(query::user::ById::by(id))
                    .map_err(AsError::into_error)
                    .map_err(ctx.error())
                    .and_then(|u| {
                        future::ready(u.ok_or_else(|| {
                            ctx.error()(api::query::UserError::NotExists.into())
                        }))
                    })
            })
            .await
    }

    /// Indicates whether contacts of this [`User`] can be seen by the current
    /// [`User`]: either by this [`User`] itself, or by the dormitory staff.
    async fn is_visible(&self, ctx: &Context) -> Result<bool, Error> {
        let me = ctx.current_user().await?;
        Ok(me.id == domain::user::Id::from(self.id)
            || policy::can_perform(Action::ManageStudents, me.role))
    }
}

/// A `User` of the system.
#[graphql_object(context = Context)]
impl User {
    /// Unique identifier of this `User`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "User.id",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub fn id(&self) -> Id {
        self.id
    }

    /// Name of this `User`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "User.name",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn name(&self, ctx: &Context) -> Result<Name, Error> {
        Ok(self.user(ctx).await?.name.clone().into())
    }

    /// Role of this `User`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "User.role",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn role(&self, ctx: &Context) -> Result<Role, Error> {
        Ok(self.user(ctx).await?.role.into())
    }

    /// Login of this `User`.
    ///
    /// Visible to this `User` and the dormitory staff only.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "User.login",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn login(&self, ctx: &Context) -> Result<Option<Login>, Error> {
        Ok(if self.is_visible(ctx).await? {
            Some(self.user(ctx).await?.login.clone().into())
        } else {
            None
        })
    }

    /// Email of this `User`.
    ///
    /// Visible to this `User` and the dormitory staff only.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "User.email",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn email(&self, ctx: &Context) -> Result<Option<Email>, Error> {
        Ok(if self.is_visible(ctx).await? {
            self.user(ctx).await?.email.clone().map(Into::into)
        } else {
            None
        })
    }

    /// Phone of this `User`.
    ///
    /// Visible to this `User` and the dormitory staff only.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "User.phone",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn phone(&self, ctx: &Context) -> Result<Option<Phone>, Error> {
        Ok(if self.is_visible(ctx).await? {
            self.user(ctx).await?.phone.clone().map(Into::into)
        } else {
            None
        })
    }

    /// `Student` profile of this `User`, if it has been completed.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "User.student",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn student(
        &self,
        ctx: &Context,
    ) -> Result<Option<api::Student>, Error> {
        if !self.is_visible(ctx).await? {
            return Ok(None);
        }
        ctx.service()
            .execute(query::student::ByUserId::by(self.id.into()))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(|s| s.map(Into::into))
    }

    /// `DateTime` when this `User` was created.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "User.createdAt",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn created_at(&self, ctx: &Context) -> Result<DateTime, Error> {
        Ok(self.user(ctx).await?.created_at.coerce())
    }
}

/// Unique identifier of a `User`.
#[derive(
    Clone, Copy, Debug, Display, Eq, From, GraphQLScalar, Into, PartialEq,
)]
#[from(domain::user::Id)]
#[into(domain::user::Id)]
#[graphql(name = "UserId", transparent)]
pub struct Id(Uuid);

/// Name of a `User`.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "UserName",
    with = scalar::Via::<domain::user::Name>,
)]
pub struct Name(domain::user::Name);

/// Login of a `User`.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "UserLogin",
    with = scalar::Via::<domain::user::Login>,
)]
pub struct Login(domain::user::Login);

/// Password of a `User`.
#[derive(AsRef, Clone, Debug, From, GraphQLScalar, Into)]
#[graphql(
    name = "UserPassword",
    with = scalar::Via::<domain::user::Password>,
)]
pub struct Password(domain::user::Password);

/// Email of a `User`.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "UserEmail",
    with = scalar::Via::<domain::user::Email>,
)]
pub struct Email(domain::user::Email);

/// Phone of a `User`.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "UserPhone",
    with = scalar::Via::<domain::user::Phone>,
)]
pub struct Phone(domain::user::Phone);

/// Role of a `User` in the dormitory.
#[derive(Clone, Copy, Debug, Eq, GraphQLEnum, PartialEq)]
#[graphql(name = "UserRole")]
pub enum Role {
    /// A student living in the dormitory.
    Student,

    /// A dormitory staff member.
    Staff,

    /// A dormitory manager.
    Manager,
}

impl From<domain::user::Role> for Role {
    fn from(role: domain::user::Role) -> Self {
        use domain::user::Role as R;
        match role {
            R::Student => Self::Student,
            R::Staff => Self::Staff,
            R::Manager => Self::Manager,
        }
    }
}

impl From<Role> for domain::user::Role {
    fn from(role: Role) -> Self {
        match role {
            Role::Student => Self::Student,
            Role::Staff => Self::Staff,
            Role::Manager => Self::Manager,
        }
    }
}

pub mod session {
    //! [`Session`]-related definitions.
    //!
    //! [`Session`]: crate::Session

    use common::DateTime;
    use derive_more::{AsRef, From, Into};
    use juniper::{GraphQLObject, GraphQLScalar};
    use service::{command, domain};

    use crate::{
        api::{self, scalar},
        Context,
    };

    /// `Session` access token.
    #[derive(AsRef, Clone, Debug, From, GraphQLScalar, Into)]
    #[graphql(
        name = "UserAuthToken",
        with = scalar::Via::<domain::user::session::Token>,
    )]
    pub struct Token(domain::user::session::Token);

    /// Result of a `Session` creation.
    #[derive(Clone, Debug, From, GraphQLObject)]
    #[graphql(context = Context, name = "CreateSessionResult")]
    pub struct CreateResult {
        /// Access token of the created `Session`.
        pub token: Token,

        /// `User` associated with the created `Session`.
        pub user: api::User,

        /// `DateTime` when the created `Session` expires.
        pub expires_at: DateTime,
    }

    impl From<command::create_user_session::Output> for CreateResult {
        fn from(output: command::create_user_session::Output) -> Self {
            let command::create_user_session::Output {
                token,
                user,
                expires_at,
            } = output;
            Self {
                token: token.into(),
                user: user.into(),
                expires_at: expires_at.coerce(),
            }
        }
    }
}
