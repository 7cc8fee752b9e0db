//! [`Building`]-related [`Database`] implementations.

use std::collections::HashMap;

use common::operations::{By, Delete, Insert, Lock, Select, Update};
use itertools::Itertools as _;
use postgres_types::ToSql;
use tracerr::Traced;

use crate::{
    domain::{building, Building},
    infra::{
        database::{
            self,
            postgres::{Connection, FuzzPattern},
            Postgres,
        },
        Database,
    },
    read,
};

use super::{count, small_number};

impl<C, IDs> Database<Select<By<HashMap<building::Id, Building>, IDs>>>
    for Postgres<C>
where
    C: Connection,
    IDs: AsRef<[building::Id]>,
{
    type Ok = HashMap<building::Id, Building>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<HashMap<building::Id, Building>, IDs>>,
    ) -> Result<Self::Ok, Self::Err> {
        let ids = by.into_inner();
        let ids: &[building::Id] = ids.as_ref();
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let limit = i32::try_from(ids.len()).unwrap_or(i32::MAX);

        const SQL: &str = "\
            SELECT id, name, address, num_floors, description, created_at \
            FROM buildings \
            WHERE id IN (SELECT unnest($1::UUID[]) LIMIT $2::INT4) \
            LIMIT $2::INT4";
        Ok(self
            .query(SQL, &[&ids, &limit])
            .await
            .map_err(tracerr::wrap!())?
            .into_iter()
            .map(|row| {
                let id = row.get("id");
                (
                    id,
                    Building {
                        id,
                        name: row.get("name"),
                        address: row.get("address"),
                        num_floors: small_number(&row, "num_floors"),
                        description: row.get("description"),
                        created_at: row.get("created_at"),
                    },
                )
            })
            .collect())
    }
}

impl<C> Database<Select<By<Option<Building>, building::Id>>> for Postgres<C>
where
    C: Connection,
    Self: Database<
        Select<By<HashMap<building::Id, Building>, [building::Id; 1]>>,
        Ok = HashMap<building::Id, Building>,
        Err = Traced<database::Error>,
    >,
{
    type Ok = Option<Building>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Building>, building::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        Ok(self
            .execute(Select(By::new([id])))
            .await
            .map_err(tracerr::wrap!())?
            .remove(&id))
    }
}

impl<C> Database<Insert<Building>> for Postgres<C>
where
    C: Connection,
    Self: Database<Update<Building>, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(building): Insert<Building>,
    ) -> Result<Self::Ok, Self::Err> {
        self.execute(Update(building)).await.map_err(tracerr::wrap!())
    }
}

impl<C> Database<Update<Building>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(building): Update<Building>,
    ) -> Result<Self::Ok, Self::Err> {
        let Building {
            id,
            name,
            address,
            num_floors,
            description,
            created_at,
        } = building;
        let num_floors = i32::from(num_floors);

        const SQL: &str = "\
            INSERT INTO buildings (\
                id, name, address, num_floors, description, created_at\
            ) \
            VALUES (\
                $1::UUID, $2::VARCHAR, $3::VARCHAR, \
                $4::INT4, $5::TEXT, $6::TIMESTAMPTZ\
            ) \
            ON CONFLICT (id) DO UPDATE \
            SET name = EXCLUDED.name, \
                address = EXCLUDED.address, \
                num_floors = EXCLUDED.num_floors, \
                description = EXCLUDED.description";
        self.exec(
            SQL,
            &[&id, &name, &address, &num_floors, &description, &created_at],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}

impl<C> Database<Delete<By<Building, building::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Delete(by): Delete<By<Building, building::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id: building::Id = by.into_inner();

        const SQL: &str = "\
            DELETE FROM buildings \
            WHERE id = $1::UUID";
        self.exec(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}

impl<C> Database<Lock<By<Building, building::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Lock(by): Lock<By<Building, building::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id: building::Id = by.into_inner();

        const SQL: &str = "\
            SELECT id \
            FROM buildings \
            WHERE id = $1::UUID \
            FOR UPDATE";
        self.query(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}

impl<C> Database<Select<By<Vec<read::building::Occupancy>, ()>>>
    for Postgres<C>
where
    C: Connection,
    Self: Database<
        Select<By<HashMap<building::Id, Building>, Vec<building::Id>>>,
        Ok = HashMap<building::Id, Building>,
        Err = Traced<database::Error>,
    >,
{
    type Ok = Vec<read::building::Occupancy>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        _: Select<By<Vec<read::building::Occupancy>, ()>>,
    ) -> Result<Self::Ok, Self::Err> {
        const SQL: &str = "\
            SELECT b.id, \
                   COUNT(r.id)::INT4 AS total, \
                   (COUNT(r.id) FILTER (WHERE r.status = 1))::INT4 \
                       AS available, \
                   (COUNT(r.id) FILTER (WHERE r.status = 2))::INT4 \
                       AS occupied, \
                   (COUNT(r.id) FILTER (WHERE r.status = 3))::INT4 \
                       AS maintenance \
            FROM buildings AS b \
            LEFT JOIN rooms AS r ON r.building_id = b.id \
            GROUP BY b.id, b.name \
            ORDER BY b.name, b.id";
        let rows = self
            .query(SQL, &[])
            .await
            .map_err(tracerr::wrap!())?;

        let ids = rows
            .iter()
            .map(|row| row.get::<_, building::Id>("id"))
            .collect::<Vec<_>>();
        let mut buildings = self
            .execute(Select(By::<HashMap<_, _>, _>::new(ids)))
            .await
            .map_err(tracerr::wrap!())?;

        Ok(rows
            .into_iter()
            .filter_map(|row| {
                Some(read::building::Occupancy {
                    building: buildings
                        .remove(&row.get::<_, building::Id>("id"))?,
                    rooms: read::room::Counts {
                        total: count(&row, "total"),
                        available: count(&row, "available"),
                        occupied: count(&row, "occupied"),
                        maintenance: count(&row, "maintenance"),
                    },
                })
            })
            .collect())
    }
}

impl<C>
    Database<
        Select<
            By<read::building::list::Page, read::building::list::Selector>,
        >,
    > for Postgres<C>
where
    C: Connection,
{
    type Ok = read::building::list::Page;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<
            By<read::building::list::Page, read::building::list::Selector>,
        >,
    ) -> Result<Self::Ok, Self::Err> {
        let read::building::list::Selector {
            arguments,
            filter: read::building::list::Filter { search },
        } = by.into_inner();

        let limit = i32::try_from(arguments.limit())
            .unwrap_or(i32::MAX)
            .saturating_add(1);

        let mut ps: Vec<&(dyn ToSql + Sync)> = vec![&limit];

        let cursor_idx = arguments.cursor().map(|c| {
            ps.push(c);
            ps.len()
        });
        let pattern = search.as_ref().map(|s| FuzzPattern::new(s.as_ref()));
        let pattern_idx = pattern.as_ref().map(|p| {
            ps.push(p);
            ps.len()
        });

        let sql = format!(
            "SELECT id \
             FROM buildings \
             WHERE TRUE \
                   {cursor} \
                   {search} \
             ORDER BY id {order} \
             LIMIT $1::INT4",
            cursor = cursor_idx.into_iter().format_with("", |idx, f| {
                let op = arguments.kind().operator();
                f(&format_args!("AND id {op} ${idx}::UUID"))
            }),
            search = pattern_idx.into_iter().format_with("", |idx, f| {
                f(&format_args!(
                    "AND (LOWER(name) SIMILAR TO LOWER(${idx}::VARCHAR) \
                          OR LOWER(address) SIMILAR TO LOWER(${idx}::VARCHAR))"
                ))
            }),
            order = arguments.kind().order().sql(),
        );
        let rows = self
            .query(&sql, ps.as_slice())
            .await
            .map_err(tracerr::wrap!())?;

        let has_more = rows.len() > arguments.limit();
        let edges = rows
            .into_iter()
            .take(arguments.limit())
            .map(|row| {
                let id = row.get("id");
                (id, id)
            })
            .collect::<Vec<_>>();

        Ok(read::building::list::Page::new(&arguments, edges, has_more))
    }
}

impl<C> Database<Select<By<read::building::list::TotalCount, ()>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = read::building::list::TotalCount;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        _: Select<By<read::building::list::TotalCount, ()>>,
    ) -> Result<Self::Ok, Self::Err> {
        const SQL: &str = "\
            SELECT COUNT(*)::INT4 \
            FROM buildings";
        self.query(SQL, &[])
            .await
            .map_err(tracerr::wrap!())
            .map(|rows| {
                rows.first().map_or(0, |row| row.get::<_, i32>(0)).into()
            })
    }
}
