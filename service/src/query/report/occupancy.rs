//! [`Occupancy`] report definition.

use common::{
    operations::{By, Select},
    Date, Percent,
};
use tracerr::Traced;

#[cfg(doc)]
use crate::domain::Room;
use crate::{
    domain::{building, Building, Contract},
    infra::{database, Database},
    read::{self, contract::Active},
    Query, Service,
};

use super::EXPIRING_WITHIN_DAYS;

/// [`Query`] gathering the [`Room`]s occupancy report as of the provided
/// date.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Occupancy {
    /// Current [`Date`].
    pub today: Date,
}

/// Output of the [`Occupancy`] [`Query`].
#[derive(Clone, Debug)]
pub struct Output {
    /// [`Room`]s statistics.
    pub rooms: read::room::Counts,

    /// Share of occupied [`Room`]s.
    pub occupancy: Percent,

    /// [`Contract`]s statistics.
    pub contracts: read::contract::Counts,

    /// Number of [`Active`] [`Contract`]s ending within
    /// [`EXPIRING_WITHIN_DAYS`].
    pub expiring_contracts: u32,

    /// Per-[`Building`] statistics, ordered by [`Building`] names.
    pub buildings: Vec<BuildingRow>,
}

/// Row of the per-[`Building`] statistics in the [`Output`].
#[derive(Clone, Debug)]
pub struct BuildingRow {
    /// [`Building`] the row is about.
    pub building: Building,

    /// Total number of [`Room`]s in the [`Building`].
    pub total: u32,

    /// Number of occupied [`Room`]s in the [`Building`].
    pub occupied: u32,

    /// Number of [`Room`]s not being occupied in the [`Building`].
    pub available: u32,

    /// Share of occupied [`Room`]s in the [`Building`].
    pub occupancy: Percent,
}

impl From<read::building::Occupancy> for BuildingRow {
    fn from(row: read::building::Occupancy) -> Self {
        let read::building::Occupancy { building, rooms } = row;
        Self {
            building,
            total: rooms.total,
            occupied: rooms.occupied,
            available: rooms.unoccupied(),
            occupancy: rooms.occupancy(),
        }
    }
}

impl<Db, Ntf> Query<Occupancy> for Service<Db, Ntf>
where
    Db: Database<
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
            Select<By<Vec<read::building::Occupancy>, ()>>,
            Ok = Vec<read::building::Occupancy>,
            Err = Traced<database::Error>,
        >,
{
    type Ok = Output;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Occupancy { today }: Occupancy,
    ) -> Result<Self::Ok, Self::Err> {
        let db = self.database();

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
        let buildings = db
            .execute(Select(By::<Vec<read::building::Occupancy>, _>::new(())))
            .await
            .map_err(tracerr::wrap!())?;

        Ok(Output {
            occupancy: rooms.occupancy(),
            rooms,
            contracts,
            expiring_contracts: u32::try_from(expiring.len())
                .unwrap_or(u32::MAX),
            buildings: buildings.into_iter().map(Into::into).collect(),
        })
    }
}

#[cfg(test)]
mod spec {
    use common::{Date, Percent};

    use crate::{
        domain::{contract, room},
        fixture, Query as _,
    };

    use super::Occupancy;

    #[tokio::test]
    async fn reports_per_building() {
        let svc = fixture::service();
        let today = Date::today();
        let building = fixture::building(&svc).await;
        let room_type = fixture::room_type(&svc, 800_000).await;
        let occupied = fixture::room_in(
            &svc,
            &building,
            &room_type,
            room::Status::Available,
        )
        .await;
        _ = fixture::room_in(
            &svc,
            &building,
            &room_type,
            room::Status::Available,
        )
        .await;
        _ = fixture::room_in(
            &svc,
            &building,
            &room_type,
            room::Status::Maintenance,
        )
        .await;
        let empty = fixture::building(&svc).await;
        let (_, student) = fixture::student(&svc).await;
        _ = fixture::contract(
            &svc,
            &student,
            &occupied,
            today.add_days(10),
            contract::Status::Active,
        )
        .await;
        _ = fixture::contract(
            &svc,
            &student,
            &occupied,
            Date::from_calendar(2025, 8, 31).unwrap(),
            contract::Status::Expired,
        )
        .await;

        let out = svc.execute(Occupancy { today }).await.unwrap();

        assert_eq!(out.rooms.total, 3);
        assert_eq!(out.rooms.maintenance, 1);
        assert_eq!(out.occupancy, Percent::ratio(1, 3));
        assert_eq!(out.contracts.active, 1);
        assert_eq!(out.contracts.expired, 1);
        assert_eq!(out.expiring_contracts, 1);

        let row = out
            .buildings
            .iter()
            .find(|r| r.building.id == building.id)
            .unwrap();
        assert_eq!((row.total, row.occupied, row.available), (3, 1, 2));
        let row = out
            .buildings
            .iter()
            .find(|r| r.building.id == empty.id)
            .unwrap();
        assert_eq!((row.total, row.available), (0, 0));
        assert_eq!(row.occupancy, Percent::ratio(0, 0));
    }
}
