//! [`Dashboard`] definition.

use common::{
    operations::{By, Select},
    Date, Percent,
};
use tracerr::Traced;

#[cfg(doc)]
use crate::domain::{Building, Room, Student};
use crate::{
    domain::{building, Contract, Payment},
    infra::{database, Database},
    read::{self, contract::Active},
    Query, Service,
};

use super::EXPIRING_WITHIN_DAYS;

/// [`Query`] gathering the staff dashboard as of the provided date.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Dashboard {
    /// Current [`Date`].
    pub today: Date,
}

/// Number of days ahead of today a [`Payment`] is considered upcoming within.
pub const UPCOMING_WITHIN_DAYS: u16 = 7;

/// Maximum number of [`Payment`]s listed in the [`Output`].
pub const LISTED_PAYMENTS: u16 = 5;

/// Output of the [`Dashboard`] [`Query`].
#[derive(Clone, Debug)]
pub struct Output {
    /// Total number of [`Building`]s.
    pub buildings: u32,

    /// [`Room`]s statistics.
    pub rooms: read::room::Counts,

    /// Share of occupied [`Room`]s.
    pub occupancy: Percent,

    /// Total number of [`Student`]s.
    pub students: u32,

    /// Number of [`Active`] [`Contract`]s.
    pub active_contracts: u32,

    /// [`Active`] [`Contract`]s ending within [`EXPIRING_WITHIN_DAYS`], the
    /// earliest ending first.
    pub expiring_contracts: Vec<Contract>,

    /// Total number of overdue [`Payment`]s.
    pub overdue_payments: u32,

    /// Most recently due overdue [`Payment`]s.
    pub recent_overdue_payments: Vec<Payment>,

    /// Pending [`Payment`]s due within [`UPCOMING_WITHIN_DAYS`], the earliest
    /// due first.
    pub upcoming_payments: Vec<Payment>,

    /// Total number of pending [`Payment`]s.
    pub pending_payments: u32,
}

impl<Db, Ntf> Query<Dashboard> for Service<Db, Ntf>
where
    Db: Database<
            Select<By<read::building::list::TotalCount, ()>>,
            Ok = read::building::list::TotalCount,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<read::student::list::TotalCount, ()>>,
            Ok = read::student::list::TotalCount,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<read::room::Counts, Option<building::Id>>>,
            Ok = read::room::Counts,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<read::contract::Counts, ()>>,
            Ok = read::contract::Counts,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Vec<Active<Contract>>, read::contract::EndingBefore>>,
            Ok = Vec<Active<Contract>>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<read::payment::Stats, read::payment::StatsScope>>,
            Ok = read::payment::Stats,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Vec<Payment>, read::payment::Overdue>>,
            Ok = Vec<Payment>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Vec<Payment>, read::payment::Upcoming>>,
            Ok = Vec<Payment>,
            Err = Traced<database::Error>,
        >,
{
    type Ok = Output;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Dashboard { today }: Dashboard,
    ) -> Result<Self::Ok, Self::Err> {
        let db = self.database();

        let buildings = db
            .execute(Select(By::<read::building::list::TotalCount, _>::new(())))
            .await
            .map_err(tracerr::wrap!())?;
        let students = db
            .execute(Select(By::<read::student::list::TotalCount, _>::new(())))
            .await
            .map_err(tracerr::wrap!())?;
        let rooms = db
            .execute(Select(By::<read::room::Counts, _>::new(None)))
            .await
            .map_err(tracerr::wrap!())?;
        let contracts = db
            .execute(Select(By::<read::contract::Counts, _>::new(())))
            .await
            .map_err(tracerr::wrap!())?;
        let expiring = db
            .execute(Select(By::<Vec<Active<Contract>>, _>::new(
                read::contract::EndingBefore(
                    today.add_days(EXPIRING_WITHIN_DAYS + 1),
                ),
            )))
            .await
            .map_err(tracerr::wrap!())?;
        let payments = db
            .execute(Select(By::<read::payment::Stats, _>::new(
                read::payment::StatsScope {
                    student_id: None,
                    today,
                },
            )))
            .await
            .map_err(tracerr::wrap!())?;
        let overdue = db
            .execute(Select(By::<Vec<Payment>, _>::new(read::payment::Overdue {
                today,
                limit: LISTED_PAYMENTS,
            })))
            .await
            .map_err(tracerr::wrap!())?;
        let upcoming = db
            .execute(Select(By::<Vec<Payment>, _>::new(
                read::payment::Upcoming {
                    from: today,
                    until: today.add_days(UPCOMING_WITHIN_DAYS),
                    limit: LISTED_PAYMENTS,
                },
            )))
            .await
            .map_err(tracerr::wrap!())?;

        let count = |n: i32| u32::try_from(n).unwrap_or_default();
        Ok(Output {
            buildings: count(buildings.into()),
            occupancy: rooms.occupancy(),
            rooms,
            students: count(students.into()),
            active_contracts: contracts.active,
            expiring_contracts: expiring
                .into_iter()
                .map(|Active(c)| c)
                .collect(),
            overdue_payments: payments.overdue,
            recent_overdue_payments: overdue,
            upcoming_payments: upcoming,
            pending_payments: payments.pending,
        })
    }
}

#[cfg(test)]
mod spec {
    use common::{Date, Percent};

    use crate::{
        domain::{contract, payment, room},
        fixture, Query as _,
    };

    use super::Dashboard;

    #[tokio::test]
    async fn empty_dashboard_has_zero_occupancy() {
        let svc = fixture::service();

        let out = svc
            .execute(Dashboard {
                today: Date::today(),
            })
            .await
            .unwrap();

        assert_eq!(out.rooms.total, 0);
        assert_eq!(out.occupancy, Percent::ratio(0, 0));
        assert!(out.expiring_contracts.is_empty());
    }

    #[tokio::test]
    async fn gathers_rooms_contracts_and_payments() {
        let svc = fixture::service();
        let today = Date::today();
        let (_, first) = fixture::student(&svc).await;
        let (_, second) = fixture::student(&svc).await;
        let soon = fixture::room(&svc, room::Status::Available).await;
        let later = fixture::room(&svc, room::Status::Available).await;
        _ = fixture::room(&svc, room::Status::Available).await;
        _ = fixture::room(&svc, room::Status::Maintenance).await;
        let expiring = fixture::contract(
            &svc,
            &first,
            &soon,
            today.add_days(30),
            contract::Status::Active,
        )
        .await;
        let lasting = fixture::contract(
            &svc,
            &second,
            &later,
            today.add_days(31),
            contract::Status::Active,
        )
        .await;
        let overdue = fixture::payment(
            &svc,
            &expiring,
            Date::from_calendar(2025, 1, 5).unwrap(),
            payment::Status::Pending,
        )
        .await;
        let upcoming = fixture::payment(
            &svc,
            &lasting,
            today.add_days(7),
            payment::Status::Pending,
        )
        .await;
        _ = fixture::payment(
            &svc,
            &lasting,
            today.add_days(8),
            payment::Status::Pending,
        )
        .await;
        _ = fixture::payment(
            &svc,
            &lasting,
            Date::from_calendar(2025, 1, 5).unwrap(),
            payment::Status::Paid,
        )
        .await;

        let out = svc.execute(Dashboard { today }).await.unwrap();

        assert_eq!(out.buildings, 4);
        assert_eq!(out.students, 2);
        assert_eq!(out.rooms.total, 4);
        assert_eq!(out.rooms.occupied, 2);
        assert_eq!(out.rooms.available, 1);
        assert_eq!(out.occupancy, Percent::ratio(2, 4));
        assert_eq!(out.active_contracts, 2);
        assert_eq!(
            out.expiring_contracts.iter().map(|c| c.id).collect::<Vec<_>>(),
            [expiring.id],
        );
        assert_eq!(out.overdue_payments, 1);
        assert_eq!(
            out.recent_overdue_payments
                .iter()
                .map(|p| p.id)
                .collect::<Vec<_>>(),
            [overdue.id],
        );
        assert_eq!(
            out.upcoming_payments.iter().map(|p| p.id).collect::<Vec<_>>(),
            [upcoming.id],
        );
        assert_eq!(out.pending_payments, 3);
    }
}
