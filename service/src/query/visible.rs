//! [`Query`]s narrowed down to what the viewing [`User`] may see.

use common::operations::{By, Select};
use derive_more::{Display, Error as StdError, From};
use tracerr::Traced;

use crate::{
    domain::{room, student, user, Student, User},
    infra::{database, Database},
    policy::{self, Action},
    read, Service,
};

use super::Query;

/// [`Query`] for the `S`elected entities as seen by the [`User`] with the
/// provided `viewer_id`.
///
/// [`User`]s not allowed to perform [`Narrow::SEE_ALL`] get the `selector`
/// [`Narrow::narrow`]ed down, regardless of what they've requested.
#[derive(Clone, Debug)]
pub struct Visible<S> {
    /// ID of the [`User`] viewing the entities.
    pub viewer_id: user::Id,

    /// Selector of the entities, as requested.
    pub selector: S,
}

/// Selector which can be narrowed down for [`User`]s not allowed to see
/// everything.
pub trait Narrow: Sized {
    /// Result of the selection.
    type Output;

    /// [`Action`] allowing to see everything.
    const SEE_ALL: Action;

    /// Indicator whether other [`User`]s see only the entities of their own
    /// [`Student`] profile, so must have one.
    const OWN_ONLY: bool;

    /// Narrows this selector down.
    ///
    /// `own` is the ID of the viewer's [`Student`] profile, always provided
    /// if [`Narrow::OWN_ONLY`].
    #[must_use]
    fn narrow(self, own: Option<student::Id>) -> Self;
}

impl Narrow for read::room::list::Selector {
    type Output = read::room::list::Page;

    const SEE_ALL: Action = Action::ManageRooms;
    const OWN_ONLY: bool = false;

    fn narrow(mut self, _: Option<student::Id>) -> Self {
        self.filter.status = Some(room::Status::Available);
        self
    }
}

impl Narrow for read::contract::list::Selector {
    type Output = read::contract::list::Page;

    const SEE_ALL: Action = Action::ViewAllContracts;
    const OWN_ONLY: bool = true;

    fn narrow(mut self, own: Option<student::Id>) -> Self {
        self.filter.student_id = own;
        self
    }
}

impl Narrow for read::payment::list::Selector {
    type Output = read::payment::list::Page;

    const SEE_ALL: Action = Action::ViewAllPayments;
    const OWN_ONLY: bool = true;

    fn narrow(mut self, own: Option<student::Id>) -> Self {
        self.filter.student_id = own;
        self
    }
}

impl Narrow for read::payment::StatsScope {
    type Output = read::payment::Stats;

    const SEE_ALL: Action = Action::ViewAllPayments;
    const OWN_ONLY: bool = true;

    fn narrow(mut self, own: Option<student::Id>) -> Self {
        self.student_id = own;
        self
    }
}

impl<Db, Ntf, S> Query<Visible<S>> for Service<Db, Ntf>
where
    S: Narrow,
    Db: Database<
            Select<By<Option<User>, user::Id>>,
            Ok = Option<User>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Student>, user::Id>>,
            Ok = Option<Student>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<S::Output, S>>,
            Ok = S::Output,
            Err = Traced<database::Error>,
        >,
{
    type Ok = S::Output;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        query: Visible<S>,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let Visible {
            viewer_id,
            selector,
        } = query;

        let viewer = self
            .database()
            .execute(Select(By::<Option<User>, _>::new(viewer_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::UserNotExists(viewer_id))
            .map_err(tracerr::wrap!())?;

        let selector = if policy::can_perform(S::SEE_ALL, viewer.role) {
            selector
        } else if S::OWN_ONLY {
            let own = self
                .database()
                .execute(Select(By::<Option<Student>, _>::new(viewer_id)))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?
                .ok_or(E::NoProfile(viewer_id))
                .map_err(tracerr::wrap!())?;
            selector.narrow(Some(own.id))
        } else {
            selector.narrow(None)
        };

        self.database()
            .execute(Select(By::<S::Output, _>::new(selector)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
    }
}

/// Error of [`Visible`] [`Query`] execution.
#[derive(Debug, Display, From, StdError)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// Viewing [`User`] sees its own entities only, but has no [`Student`]
    /// profile.
    #[display("`User(id: {_0})` has no `Student` profile")]
    #[from(ignore)]
    NoProfile(#[error(not(source))] user::Id),

    /// Viewing [`User`] doesn't exist.
    #[display("`User(id: {_0})` does not exist")]
    #[from(ignore)]
    UserNotExists(#[error(not(source))] user::Id),
}

#[cfg(test)]
mod spec {
    use common::Date;

    use crate::{
        domain::{contract, payment, room, user::Role},
        fixture, read, Query as _,
    };

    use super::{ExecutionError, Visible};

    fn rooms(status: Option<room::Status>) -> read::room::list::Selector {
        read::room::list::Selector {
            arguments: read::room::list::Arguments::new(
                None, None, None, None, 20,
            )
            .unwrap(),
            filter: read::room::list::Filter {
                search: None,
                status,
                building_id: None,
            },
        }
    }

    fn contracts(
        search: Option<&str>,
        student_id: Option<crate::domain::student::Id>,
    ) -> read::contract::list::Selector {
        read::contract::list::Selector {
            arguments: read::contract::list::Arguments::new(
                None, None, None, None, 20,
            )
            .unwrap(),
            filter: read::contract::list::Filter {
                search: search.map(|s| read::SearchQuery::new(s).unwrap()),
                status: None,
                student_id,
            },
        }
    }

    fn payments(
        status: Option<payment::Status>,
        student_id: Option<crate::domain::student::Id>,
    ) -> read::payment::list::Selector {
        read::payment::list::Selector {
            arguments: read::payment::list::Arguments::new(
                None, None, None, None, 20,
            )
            .unwrap(),
            filter: read::payment::list::Filter { status, student_id },
        }
    }

    #[tokio::test]
    async fn students_see_only_available_rooms() {
        let svc = fixture::service();
        let (student, _) = fixture::student(&svc).await;
        let staff = fixture::user(&svc, Role::Staff).await;
        let available = fixture::room(&svc, room::Status::Available).await;
        let closed = fixture::room(&svc, room::Status::Maintenance).await;

        for status in [None, Some(room::Status::Maintenance)] {
            let page = svc
                .execute(Visible {
                    viewer_id: student.id,
                    selector: rooms(status),
                })
                .await
                .unwrap();
            let ids = page.edges.iter().map(|e| e.node).collect::<Vec<_>>();
            assert_eq!(ids, [available.id], "requested {status:?}");
        }

        let page = svc
            .execute(Visible {
                viewer_id: staff.id,
                selector: rooms(Some(room::Status::Maintenance)),
            })
            .await
            .unwrap();
        let ids = page.edges.iter().map(|e| e.node).collect::<Vec<_>>();
        assert_eq!(ids, [closed.id]);
    }

    #[tokio::test]
    async fn searches_rooms_by_number_and_building() {
        let svc = fixture::service();
        let staff = fixture::user(&svc, Role::Staff).await;
        let building = fixture::building(&svc).await;
        let room_type = fixture::room_type(&svc, 1_000_000).await;
        let first = fixture::room_in(
            &svc,
            &building,
            &room_type,
            room::Status::Available,
        )
        .await;
        let second = fixture::room_in(
            &svc,
            &building,
            &room_type,
            room::Status::Available,
        )
        .await;
        let elsewhere = fixture::room(&svc, room::Status::Available).await;

        for (search, mut expected) in [
            (first.number.to_string(), vec![first.id]),
            (
                building.name.as_ref().replace("Block ", ""),
                vec![first.id, second.id],
            ),
            (elsewhere.number.to_string(), vec![elsewhere.id]),
        ] {
            let mut selector = rooms(None);
            selector.filter.search =
                Some(read::SearchQuery::new(search.as_str()).unwrap());
            let page = svc
                .execute(Visible {
                    viewer_id: staff.id,
                    selector,
                })
                .await
                .unwrap();
            let mut ids =
                page.edges.iter().map(|e| e.node).collect::<Vec<_>>();
            ids.sort_unstable();
            expected.sort_unstable();
            assert_eq!(ids, expected, "searched {search:?}");
        }
    }

    #[tokio::test]
    async fn students_see_only_own_contracts() {
        let svc = fixture::service();
        let staff = fixture::user(&svc, Role::Staff).await;
        let (me, mine) = fixture::student(&svc).await;
        let (_, other) = fixture::student(&svc).await;
        let my_room = fixture::room(&svc, room::Status::Available).await;
        let other_room = fixture::room(&svc, room::Status::Available).await;
        let my_contract = fixture::contract(
            &svc,
            &mine,
            &my_room,
            Date::today().add_days(100),
            contract::Status::Active,
        )
        .await;
        let other_contract = fixture::contract(
            &svc,
            &other,
            &other_room,
            Date::today().add_days(100),
            contract::Status::Active,
        )
        .await;

        for requested in [None, Some(other.id)] {
            let page = svc
                .execute(Visible {
                    viewer_id: me.id,
                    selector: contracts(None, requested),
                })
                .await
                .unwrap();
            let ids = page.edges.iter().map(|e| e.node).collect::<Vec<_>>();
            assert_eq!(ids, [my_contract.id], "requested {requested:?}");
        }

        let page = svc
            .execute(Visible {
                viewer_id: staff.id,
                selector: contracts(None, None),
            })
            .await
            .unwrap();
        let mut ids = page.edges.iter().map(|e| e.node).collect::<Vec<_>>();
        ids.sort_unstable();
        let mut expected = vec![my_contract.id, other_contract.id];
        expected.sort_unstable();
        assert_eq!(ids, expected);
    }

    #[tokio::test]
    async fn searches_contracts_by_student_and_room() {
        let svc = fixture::service();
        let staff = fixture::user(&svc, Role::Staff).await;
        let (_, first) = fixture::student(&svc).await;
        let (_, second) = fixture::student(&svc).await;
        let first_room = fixture::room(&svc, room::Status::Available).await;
        let second_room = fixture::room(&svc, room::Status::Available).await;
        let by_student = fixture::contract(
            &svc,
            &first,
            &first_room,
            Date::today().add_days(100),
            contract::Status::Active,
        )
        .await;
        let by_room = fixture::contract(
            &svc,
            &second,
            &second_room,
            Date::today().add_days(100),
            contract::Status::Active,
        )
        .await;

        for (search, expected) in [
            (first.number.to_string(), by_student.id),
            (second_room.number.to_string(), by_room.id),
        ] {
            let page = svc
                .execute(Visible {
                    viewer_id: staff.id,
                    selector: contracts(Some(&search), None),
                })
                .await
                .unwrap();
            let ids = page.edges.iter().map(|e| e.node).collect::<Vec<_>>();
            assert_eq!(ids, [expected], "searched {search:?}");
        }
    }

    #[tokio::test]
    async fn students_see_only_own_payments() {
        let svc = fixture::service();
        let staff = fixture::user(&svc, Role::Staff).await;
        let (me, mine) = fixture::student(&svc).await;
        let (_, other) = fixture::student(&svc).await;
        let my_room = fixture::room(&svc, room::Status::Available).await;
        let other_room = fixture::room(&svc, room::Status::Available).await;
        let my_contract = fixture::contract(
            &svc,
            &mine,
            &my_room,
            Date::today().add_days(100),
            contract::Status::Active,
        )
        .await;
        let other_contract = fixture::contract(
            &svc,
            &other,
            &other_room,
            Date::today().add_days(100),
            contract::Status::Active,
        )
        .await;
        let mut mine_pending = Vec::new();
        for days in [3, 33, 63] {
            mine_pending.push(
                fixture::payment(
                    &svc,
                    &my_contract,
                    Date::today().add_days(days),
                    payment::Status::Pending,
                )
                .await
                .id,
            );
        }
        let my_paid = fixture::payment(
            &svc,
            &my_contract,
            Date::today().add_days(1),
            payment::Status::Paid,
        )
        .await;
        _ = fixture::payment(
            &svc,
            &other_contract,
            Date::today().add_days(3),
            payment::Status::Pending,
        )
        .await;

        let page = svc
            .execute(Visible {
                viewer_id: me.id,
                selector: payments(
                    Some(payment::Status::Pending),
                    Some(other.id),
                ),
            })
            .await
            .unwrap();
        let ids = page.edges.iter().map(|e| e.node).collect::<Vec<_>>();
        mine_pending.sort_unstable();
        assert_eq!(ids, mine_pending, "listed in their IDs order");

        let stats = svc
            .execute(Visible {
                viewer_id: me.id,
                selector: read::payment::StatsScope {
                    student_id: None,
                    today: Date::today(),
                },
            })
            .await
            .unwrap();
        assert_eq!((stats.pending, stats.paid), (3, 1));
        assert_eq!(stats.paid_amount, my_paid.amount);

        let stats = svc
            .execute(Visible {
                viewer_id: staff.id,
                selector: read::payment::StatsScope {
                    student_id: None,
                    today: Date::today(),
                },
            })
            .await
            .unwrap();
        assert_eq!((stats.pending, stats.paid), (4, 1));
    }

    #[tokio::test]
    async fn rejects_student_without_profile() {
        let svc = fixture::service();
        let user = fixture::user(&svc, Role::Student).await;

        let err = svc
            .execute(Visible {
                viewer_id: user.id,
                selector: contracts(None, None),
            })
            .await
            .unwrap_err();

        assert!(matches!(
            err.as_ref(),
            ExecutionError::NoProfile(id) if *id == user.id,
        ));
    }
}
