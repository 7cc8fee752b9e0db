//! [`Context`]-related definitions.

use std::{
    future,
    sync::atomic::{self, AtomicU16},
};

use axum::{async_trait, extract::FromRequestParts, RequestPartsExt as _};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use common::DateTime;
use juniper::{
    http::{GraphQLBatchResponse, GraphQLResponse},
    IntoFieldError as _,
};
use service::{
    command::{self, Command as _},
    domain::{self, user::session},
    policy, query, Query as _,
};
use tokio::sync::OnceCell;

#[cfg(doc)]
use crate::api::User;
use crate::{api, define_error, AsError, Error, JuniperResponse, Service};

/// Context of a single HTTP request.
#[derive(Debug)]
pub struct Context {
    /// [`Service`] instance.
    service: Service,

    /// Error status code.
    error_status_code: AtomicU16,

    /// Parts of the HTTP request.
    parts: http::request::Parts,

    /// Current [`Session`].
    current_session: OnceCell<Session>,

    /// [`domain::User`] of the current [`Session`].
    current_user: OnceCell<domain::User>,

    /// Last authentication [`Error`].
    auth_error: OnceCell<Error>,
}

impl Context {
    /// Returns [`Service`] instance of this [`Context`].
    #[must_use]
    pub fn service(&self) -> &Service {
        &self.service
    }

    /// Returns the error status code of this [`Context`].
    #[must_use]
    pub fn error_status_code(&self) -> http::StatusCode {
        http::StatusCode::from_u16(
            self.error_status_code.load(atomic::Ordering::Relaxed),
        )
        .unwrap_or(http::StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Sets the error status code for this [`Context`].
    ///
    /// Provided [`http::StatusCode`] will be applied to the response.
    pub fn set_error_status_code(&self, status_code: http::StatusCode) {
        self.error_status_code
            .store(status_code.as_u16(), atomic::Ordering::Relaxed);
    }

    /// Helper method calling [`Context::set_error_status_code()`] inside
    /// [`Result::map_err()`] closure.
    pub fn error(&self) -> impl FnOnce(Error) -> Error + '_ {
        move |err| {
            self.set_error_status_code(err.status_code);
            err
        }
    }

    /// Sets the current [`Session`] for this [`Context`].
    pub async fn set_current_session(&self, session: Session) {
        _ = self
            .current_session
            .get_or_init(|| future::ready(session))
            .await;
    }

    /// Returns the current [`Session`] for this [`Context`].
    ///
    /// # Errors
    ///
    /// Errors if:
    /// - the current HTTP request is not authorized;
    /// - the provided authentication token is invalid.
    pub async fn current_session(&self) -> Result<Session, Error> {
        self.current_session
            .get_or_try_init(|| async {
                match self
                    .auth_error
                    .get_or_try_init(|| async {
                        match self.do_authentication().await {
                            Ok(u) => Err(u),
                            Err(e) => Ok(e),
                        }
                    })
                    .await
                {
                    Ok(e) => Err(e),
                    Err(u) => Ok(u),
                }
            })
            .await
            .cloned()
            .map_err(Clone::clone)
    }

    /// Returns the [`domain::User`] of the current [`Session`].
    ///
    /// # Errors
    ///
    /// Errors if the current [`Session`] is missing or its [`User`] doesn't
    /// exist anymore.
    pub async fn current_user(&self) -> Result<&domain::User, Error> {
        let user_id = self.current_session().await?.user_id;
        self.current_user
            .get_or_try_init(|| async {
                self.service
                    .execute(query::user::ById::by(user_id.into()))
                    .await
                    .map_err(AsError::into_error)?
                    .ok_or_else(|| AuthError::AuthorizationRequired.into())
            })
            .await
            .map_err(self.error())
    }

    /// Ensures the [`domain::User`] of the current [`Session`] is allowed to
    /// perform the provided [`policy::Action`].
    ///
    /// # Errors
    ///
    /// Errors if the current [`Session`] is missing, or its [`User`] is not
    /// allowed to perform the [`policy::Action`].
    pub async fn authorize(
        &self,
        action: policy::Action,
    ) -> Result<&domain::User, Error> {
        let user = self.current_user().await?;
        if policy::can_perform(action, user.role) {
            Ok(user)
        } else {
            Err(self.error()(api::PrivilegeError::Forbidden.into()))
        }
    }

    /// Performs the [`Session`] authentication.
    ///
    /// # Errors
    ///
    /// Errors if the provided authentication token is invalid.
    async fn do_authentication(&self) -> Result<Session, Error> {
        let res = self
            .parts
            .clone()
            .extract::<TypedHeader<Authorization<Bearer>>>()
            .await;
        match res {
            Ok(TypedHeader(Authorization(bearer))) => {
                let token = match bearer.token().parse::<session::Token>() {
                    Ok(token) => token,
                    Err(e) => match e {},
                };
                self.service
                    .execute(command::AuthorizeUserSession {
                        token: token.clone(),
                    })
                    .await
                    .map(|s| Session {
                        user_id: s.user_id.into(),
                        token,
                        expires_at: s.expires_at.coerce(),
                    })
                    .map_err(AsError::into_error)
            }
            Err(e) => {
                if e.is_missing() {
                    Err(AuthError::AuthorizationRequired.into())
                } else {
                    Err(e.into_error())
                }
            }
        }
        .map_err(self.error())
    }
}

impl juniper::Context for Context {}

#[async_trait]
impl<S> FromRequestParts<S> for Context
where
    S: Send + Sync,
{
    type Rejection = JuniperResponse;

    async fn from_request_parts(
        parts: &mut http::request::Parts,
        _: &S,
    ) -> Result<Self, Self::Rejection> {
        let service =
            parts.extensions.get::<Service>().cloned().ok_or_else(|| {
                JuniperResponse {
                    status_code: http::StatusCode::INTERNAL_SERVER_ERROR,
                    response: GraphQLBatchResponse::Single(
                        GraphQLResponse::error(
                            Error::internal(&"missing `Service` extension")
                                .into_field_error(),
                        ),
                    ),
                }
            })?;

        Ok(Self {
            service,
            error_status_code: AtomicU16::new(
                http::StatusCode::INTERNAL_SERVER_ERROR.as_u16(),
            ),
            parts: parts.clone(),
            current_session: OnceCell::new(),
            current_user: OnceCell::new(),
            auth_error: OnceCell::new(),
        })
    }
}

/// User session.
#[derive(Clone, Debug)]
pub struct Session {
    /// ID of the [`User`] associated with this [`Session`].
    pub user_id: api::user::Id,

    /// Authentication token.
    pub token: session::Token,

    /// [`DateTime`] when this [`Session`] expires.
    pub expires_at: DateTime,
}

impl AsError for command::authorize_user_session::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::JsonWebTokenDecodeError(_) | Self::UserNotExists(_) => {
                Some(AuthError::AuthorizationRequired.into())
            }
        }
    }
}

define_error! {
    enum AuthError {
        #[code = "AUTHORIZATION_REQUIRED"]
        #[status = UNAUTHORIZED]
        #[message = "Authorization required"]
        AuthorizationRequired,
    }
}
