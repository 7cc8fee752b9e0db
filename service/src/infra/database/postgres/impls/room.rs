//! [`Room`]-related [`Database`] implementations.

use std::collections::HashMap;

use common::operations::{By, Delete, Insert, Lock, Select, Update};
use itertools::Itertools as _;
use postgres_types::ToSql;
use tracerr::Traced;

use crate::{
    domain::{building, room, Room},
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

impl<C, IDs> Database<Select<By<HashMap<room::Id, Room>, IDs>>> for Postgres<C>
where
    C: Connection,
    IDs: AsRef<[room::Id]>,
{
    type Ok = HashMap<room::Id, Room>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<HashMap<room::Id, Room>, IDs>>,
    ) -> Result<Self::Ok, Self::Err> {
        let ids = by.into_inner();
        let ids: &[room::Id] = ids.as_ref();
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let limit = i32::try_from(ids.len()).unwrap_or(i32::MAX);

        const SQL: &str = "\
            SELECT id, building_id, number, room_type_id, \
                   floor, status, notes, created_at \
            FROM rooms \
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
                    Room {
                        id,
                        building_id: row.get("building_id"),
                        number: row.get("number"),
                        room_type_id: row.get("room_type_id"),
                        floor: small_number(&row, "floor"),
                        status: row.get("status"),
                        notes: row.get("notes"),
                        created_at: row.get("created_at"),
                    },
                )
            })
            .collect())
    }
}

impl<C> Database<Select<By<Option<Room>, room::Id>>> for Postgres<C>
where
    C: Connection,
    Self: Database<
        Select<By<HashMap<room::Id, Room>, [room::Id; 1]>>,
        Ok = HashMap<room::Id, Room>,
        Err = Traced<database::Error>,
    >,
{
    type Ok = Option<Room>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Room>, room::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        Ok(self
            .execute(Select(By::new([id])))
            .await
            .map_err(tracerr::wrap!())?
            .remove(&id))
    }
}

impl<C> Database<Insert<Room>> for Postgres<C>
where
    C: Connection,
    Self: Database<Update<Room>, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(room): Insert<Room>,
    ) -> Result<Self::Ok, Self::Err> {
        self.execute(Update(room)).await.map_err(tracerr::wrap!())
    }
}

impl<C> Database<Update<Room>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(room): Update<Room>,
    ) -> Result<Self::Ok, Self::Err> {
        let Room {
            id,
            building_id,
            number,
            room_type_id,
            floor,
            status,
            notes,
            created_at,
        } = room;
        let floor = i32::from(floor);

        const SQL: &str = "\
            INSERT INTO rooms (\
                id, building_id, number, room_type_id, \
                floor, status, notes, created_at\
            ) \
            VALUES (\
                $1::UUID, $2::UUID, $3::VARCHAR, $4::UUID, \
                $5::INT4, $6::INT2, $7::TEXT, $8::TIMESTAMPTZ\
            ) \
            ON CONFLICT (id) DO UPDATE \
            SET building_id = EXCLUDED.building_id, \
                number = EXCLUDED.number, \
                room_type_id = EXCLUDED.room_type_id, \
                floor = EXCLUDED.floor, \
                status = EXCLUDED.status, \
                notes = EXCLUDED.notes";
        self.exec(
            SQL,
            &[
                &id,
                &building_id,
                &number,
                &room_type_id,
                &floor,
                &status,
                &notes,
                &created_at,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}

impl<C> Database<Delete<By<Room, room::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Delete(by): Delete<By<Room, room::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id: room::Id = by.into_inner();

        const SQL: &str = "\
            DELETE FROM rooms \
            WHERE id = $1::UUID";
        self.exec(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}

impl<C> Database<Lock<By<Room, room::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Lock(by): Lock<By<Room, room::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id: room::Id = by.into_inner();

        const SQL: &str = "\
            SELECT id \
            FROM rooms \
            WHERE id = $1::UUID \
            FOR UPDATE";
        self.query(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}

impl<C> Database<Select<By<read::room::Counts, Option<building::Id>>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = read::room::Counts;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<read::room::Counts, Option<building::Id>>>,
    ) -> Result<Self::Ok, Self::Err> {
        let building_id = by.into_inner();

        const SQL: &str = "\
            SELECT COUNT(*)::INT4 AS total, \
                   (COUNT(*) FILTER (WHERE status = 1))::INT4 AS available, \
                   (COUNT(*) FILTER (WHERE status = 2))::INT4 AS occupied, \
                   (COUNT(*) FILTER (WHERE status = 3))::INT4 AS maintenance \
            FROM rooms \
            WHERE $1::UUID IS NULL OR building_id = $1::UUID";
        let rows = self
            .query(SQL, &[&building_id])
            .await
            .map_err(tracerr::wrap!())?;

        Ok(rows.first().map_or_else(read::room::Counts::default, |row| {
            read::room::Counts {
                total: count(row, "total"),
                available: count(row, "available"),
                occupied: count(row, "occupied"),
                maintenance: count(row, "maintenance"),
            }
        }))
    }
}

impl<C>
    Database<Select<By<read::room::list::Page, read::room::list::Selector>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = read::room::list::Page;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<
            By<read::room::list::Page, read::room::list::Selector>,
        >,
    ) -> Result<Self::Ok, Self::Err> {
        let read::room::list::Selector {
            arguments,
            filter:
                read::room::list::Filter {
                    search,
                    status,
                    building_id,
                },
        } = by.into_inner();

        let limit = i32::try_from(arguments.limit())
            .unwrap_or(i32::MAX)
            .saturating_add(1);

        let mut ps: Vec<&(dyn ToSql + Sync)> = vec![&limit];

        let cursor_idx = arguments.cursor().map(|c| {
            ps.push(c);
            ps.len()
        });
        let status_idx = status.as_ref().map(|s| {
            ps.push(s);
            ps.len()
        });
        let building_idx = building_id.as_ref().map(|b| {
            ps.push(b);
            ps.len()
        });
        let pattern = search.as_ref().map(|s| FuzzPattern::new(s.as_ref()));
        let pattern_idx = pattern.as_ref().map(|p| {
            ps.push(p);
            ps.len()
        });

        let sql = format!(
            "SELECT r.id \
             FROM rooms AS r \
             INNER JOIN buildings AS b ON b.id = r.building_id \
             INNER JOIN room_types AS t ON t.id = r.room_type_id \
             WHERE TRUE \
                   {cursor} \
                   {status} \
                   {building} \
                   {search} \
             ORDER BY r.id {order} \
             LIMIT $1::INT4",
            cursor = cursor_idx.into_iter().format_with("", |idx, f| {
                let op = arguments.kind().operator();
                f(&format_args!("AND r.id {op} ${idx}::UUID"))
            }),
            status = status_idx.into_iter().format_with("", |idx, f| {
                f(&format_args!("AND r.status = ${idx}::INT2"))
            }),
            building = building_idx.into_iter().format_with("", |idx, f| {
                f(&format_args!("AND r.building_id = ${idx}::UUID"))
            }),
            search = pattern_idx.into_iter().format_with("", |idx, f| {
                f(&format_args!(
                    "AND (LOWER(r.number) SIMILAR TO LOWER(${idx}::VARCHAR) \
                          OR LOWER(b.name) SIMILAR TO LOWER(${idx}::VARCHAR) \
                          OR LOWER(t.name) SIMILAR TO LOWER(${idx}::VARCHAR))"
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

        Ok(read::room::list::Page::new(&arguments, edges, has_more))
    }
}

impl<C> Database<Select<By<read::room::list::TotalCount, ()>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = read::room::list::TotalCount;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        _: Select<By<read::room::list::TotalCount, ()>>,
    ) -> Result<Self::Ok, Self::Err> {
        const SQL: &str = "\
            SELECT COUNT(*)::INT4 \
            FROM rooms";
        self.query(SQL, &[])
            .await
            .map_err(tracerr::wrap!())
            .map(|rows| {
                rows.first().map_or(0, |row| row.get::<_, i32>(0)).into()
            })
    }
}
