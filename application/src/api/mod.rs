//! GraphQL API definitions.

/// Defines GraphQL types of a cursor-paginated list of the provided entity,
/// backed by the `service::read::$module::list` read model.
///
/// Must be invoked inside a child module of the entity module, providing
/// `Id` and the entity type via `super`.
macro_rules! define_list {
    (
        $entity:ident in $module:ident as
        $cursor:tt, $edge:tt, $connection:tt, $page_info:tt $(,)?
    ) => {
        use derive_more::{AsRef, From, Into};
        use juniper::{graphql_object, GraphQLScalar};
        use service::{query, read, Query as _};

        use crate::{api::scalar, AsError, Context, Error};

        use super::{Id, $entity};

        /// Cursor for the list.
        #[derive(AsRef, Clone, Copy, Debug, From, GraphQLScalar, Into)]
        #[from(Id, read::$module::list::Cursor)]
        #[graphql(
            name = $cursor,
            with = scalar::Via::<read::$module::list::Cursor>,
        )]
        pub struct Cursor(pub read::$module::list::Cursor);

        /// Edge in the list.
        #[derive(Clone, Copy, Debug, From, Into)]
        pub struct Edge(read::$module::list::Edge);

        /// Edge in the list.
        #[graphql_object(name = $edge, context = Context)]
        impl Edge {
            /// Cursor of this edge.
            #[must_use]
            pub fn cursor(&self) -> Cursor {
                self.0.cursor.into()
            }

            /// Node of this edge.
            #[must_use]
            pub fn node(&self) -> $entity {
                #[expect(
                    unsafe_code,
                    reason = "`Edge` loaded from repository guarantees node \
                              existence"
                )]
                unsafe {
                    $entity::new_unchecked(self.0.node)
                }
            }
        }

        /// Connection of the list.
        #[derive(Clone, Debug, From, Into)]
        pub struct Connection(read::$module::list::Connection);

        /// Connection of the list.
        #[graphql_object(name = $connection, context = Context)]
        impl Connection {
            /// Edges in this connection.
            #[must_use]
            pub fn edges(&self) -> Vec<Edge> {
                self.0.edges.iter().copied().map(Into::into).collect()
            }

            /// Information about the page.
            #[must_use]
            pub fn page_info(&self) -> PageInfo {
                PageInfo {
                    info: self.0.page_info(),
                    start_cursor: self.0.edges.first().map(|e| e.cursor.into()),
                    end_cursor: self.0.edges.last().map(|e| e.cursor.into()),
                }
            }
        }

        /// Information about a [`Connection`] page.
        #[derive(Clone, Copy, Debug)]
        pub struct PageInfo {
            /// Underlying page information.
            info: read::$module::list::PageInfo,

            /// Start cursor of the page.
            start_cursor: Option<Cursor>,

            /// End cursor of the page.
            end_cursor: Option<Cursor>,
        }

        /// Information about a list page.
        #[graphql_object(name = $page_info, context = Context)]
        impl PageInfo {
            /// Indicator whether there is a next page.
            #[must_use]
            pub fn has_next_page(&self) -> bool {
                self.info.has_next_page
            }

            /// Indicator whether there is a previous page.
            #[must_use]
            pub fn has_previous_page(&self) -> bool {
                self.info.has_previous_page
            }

            /// Start cursor of the page.
            #[must_use]
            pub fn start_cursor(&self) -> &Option<Cursor> {
                &self.start_cursor
            }

            /// End cursor of the page.
            #[must_use]
            pub fn end_cursor(&self) -> &Option<Cursor> {
                &self.end_cursor
            }

            /// Total count of the listed entities, regardless of filters.
            pub async fn total_count(
                &self,
                ctx: &Context,
            ) -> Result<i32, Error> {
                ctx.service()
                    .execute(query::$module::TotalCount::by(()))
                    .await
                    .map_err(AsError::into_error)
                    .map_err(ctx.error())
                    .map(Into::into)
            }
        }
    };
}

pub mod building;
pub mod contract;
mod mutation;
pub mod payment;
mod query;
pub mod report;
pub mod room;
pub mod room_type;
pub mod scalar;
pub mod student;
pub mod user;

use derive_more::{AsRef, Display, From, Into};
use juniper::{EmptySubscription, GraphQLScalar};
use service::{policy, read};

use crate::{context::AuthError, define_error, AsError, Context, Error};

pub use self::{
    building::Building, contract::Contract, mutation::Mutation,
    payment::Payment, query::Query, room::Room, room_type::RoomType,
    student::Student, user::User,
};

/// GraphQL schema.
pub type Schema =
    juniper::RootNode<'static, Query, Mutation, EmptySubscription<Context>>;

/// Creates a new [`Schema`].
#[must_use]
pub fn schema() -> Schema {
    Schema::new(Query, Mutation, EmptySubscription::new())
}

/// Text to fuzzy search entities by.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(with = scalar::Via::<read::SearchQuery>)]
pub struct SearchQuery(read::SearchQuery);

define_error! {
    enum PrivilegeError {
        #[code = "FORBIDDEN"]
        #[status = FORBIDDEN]
        #[message = "Authenticated `User` is not allowed to do this"]
        Forbidden,
    }
}

define_error! {
    enum PaginationError {
        #[code = "AMBIGUOUS_PAGINATION_ARGUMENTS"]
        #[status = BAD_REQUEST]
        #[message = "Ambiguous pagination arguments"]
        Ambiguous,
    }
}

define_error! {
    enum InputError {
        #[code = "INVALID_NUMBER"]
        #[status = BAD_REQUEST]
        #[message = "Provided number is negative or too large"]
        InvalidNumber,
    }
}

impl AsError for policy::Error {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::Forbidden(..) => Some(PrivilegeError::Forbidden.into()),
            Self::UserNotExists(_) => {
                Some(AuthError::AuthorizationRequired.into())
            }
        }
    }
}

/// Converts a GraphQL integer into an unsigned one.
///
/// # Errors
///
/// Errors if the provided `num` is negative or too large.
pub(crate) fn unsigned<T: TryFrom<i32>>(num: i32) -> Result<T, Error> {
    T::try_from(num).map_err(|_| InputError::InvalidNumber.into())
}

/// Converts a counter into a GraphQL integer, saturating at [`i32::MAX`].
pub(crate) fn saturating(num: u32) -> i32 {
    i32::try_from(num).unwrap_or(i32::MAX)
}
