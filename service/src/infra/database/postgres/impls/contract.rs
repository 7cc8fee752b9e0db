//! [`Contract`]-related [`Database`] implementations.

use std::collections::HashMap;

use common::{
    operations::{By, Delete, Insert, Lock, Select, Update},
    Money,
};
use itertools::Itertools as _;
use postgres_types::ToSql;
use tracerr::Traced;

use crate::{
    domain::{contract, room, student, Contract},
    infra::{
        database::{
            self,
            postgres::{Connection, FuzzPattern},
            Postgres,
        },
        Database,
    },
    read::{self, contract::Active},
};

use super::count;

impl<C, IDs> Database<Select<By<HashMap<contract::Id, Contract>, IDs>>>
    for Postgres<C>
where
    C: Connection,
    IDs: AsRef<[contract::Id]>,
{
    type Ok = HashMap<contract::Id, Contract>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<HashMap<contract::Id, Contract>, IDs>>,
    ) -> Result<Self::Ok, Self::Err> {
        let ids = by.into_inner();
        let ids: &[contract::Id] = ids.as_ref();
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let limit = i32::try_from(ids.len()).unwrap_or(i32::MAX);

        const SQL: &str = "\
            SELECT id, number, student_id, room_id, \
                   start_date, end_date, \
                   deposit, deposit_currency, \
                   status, created_at \
            FROM contracts \
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
                    Contract {
                        id,
                        number: row.get("number"),
                        student_id: row.get("student_id"),
                        room_id: row.get("room_id"),
                        start_date: row.get("start_date"),
                        end_date: row.get("end_date"),
                        deposit: Money {
                            amount: row.get("deposit"),
                            currency: row.get("deposit_currency"),
                        },
                        status: row.get("status"),
                        created_at: row.get("created_at"),
                    },
                )
            })
            .collect())
    }
}

impl<C> Database<Select<By<Option<Contract>, contract::Id>>> for Postgres<C>
where
    C: Connection,
    Self: Database<
        Select<By<HashMap<contract::Id, Contract>, [contract::Id; 1]>>,
        Ok = HashMap<contract::Id, Contract>,
        Err = Traced<database::Error>,
    >,
{
    type Ok = Option<Contract>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Contract>, contract::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        Ok(self
            .execute(Select(By::new([id])))
            .await
            .map_err(tracerr::wrap!())?
            .remove(&id))
    }
}

impl<C> Database<Select<By<Option<Active<Contract>>, student::Id>>>
    for Postgres<C>
where
    C: Connection,
    Self: Database<
        Select<By<Option<Contract>, contract::Id>>,
        Ok = Option<Contract>,
        Err = Traced<database::Error>,
    >,
{
    type Ok = Option<Active<Contract>>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Active<Contract>>, student::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let student_id: student::Id = by.into_inner();

        const SQL: &str = "\
            SELECT id \
            FROM contracts \
            WHERE student_id = $1::UUID \
              AND status = 1 \
            LIMIT 1";
        let Some(row) = self
            .query_opt(SQL, &[&student_id])
            .await
            .map_err(tracerr::wrap!())?
        else {
            return Ok(None);
        };

        Ok(self
            .execute(Select(By::new(row.get::<_, contract::Id>("id"))))
            .await
            .map_err(tracerr::wrap!())?
            .filter(Contract::is_active)
            .map(Active))
    }
}

impl<C> Database<Select<By<Option<Active<Contract>>, room::Id>>>
    for Postgres<C>
where
    C: Connection,
    Self: Database<
        Select<By<Option<Contract>, contract::Id>>,
        Ok = Option<Contract>,
        Err = Traced<database::Error>,
    >,
{
    type Ok = Option<Active<Contract>>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Active<Contract>>, room::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let room_id: room::Id = by.into_inner();

        const SQL: &str = "\
            SELECT id \
            FROM contracts \
            WHERE room_id = $1::UUID \
              AND status = 1 \
            LIMIT 1";
        let Some(row) = self
            .query_opt(SQL, &[&room_id])
            .await
            .map_err(tracerr::wrap!())?
        else {
            return Ok(None);
        };

        Ok(self
            .execute(Select(By::new(row.get::<_, contract::Id>("id"))))
            .await
            .map_err(tracerr::wrap!())?
            .filter(Contract::is_active)
            .map(Active))
    }
}

impl<C>
    Database<
        Select<By<Vec<Active<Contract>>, read::contract::EndingBefore>>,
    > for Postgres<C>
where
    C: Connection,
    Self: Database<
        Select<By<HashMap<contract::Id, Contract>, Vec<contract::Id>>>,
        Ok = HashMap<contract::Id, Contract>,
        Err = Traced<database::Error>,
    >,
{
    type Ok = Vec<Active<Contract>>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<
            By<Vec<Active<Contract>>, read::contract::EndingBefore>,
        >,
    ) -> Result<Self::Ok, Self::Err> {
        let read::contract::EndingBefore(date) = by.into_inner();

        const SQL: &str = "\
            SELECT id \
            FROM contracts \
            WHERE status = 1 \
              AND end_date < $1::DATE \
            ORDER BY end_date, id";
        let ids = self
            .query(SQL, &[&date])
            .await
            .map_err(tracerr::wrap!())?
            .into_iter()
            .map(|row| row.get::<_, contract::Id>("id"))
            .collect::<Vec<_>>();

        let mut contracts = self
            .execute(Select(By::<HashMap<_, _>, _>::new(ids.clone())))
            .await
            .map_err(tracerr::wrap!())?;
        Ok(ids
            .into_iter()
            .filter_map(|id| contracts.remove(&id))
            .filter(Contract::is_active)
            .map(Active)
            .collect())
    }
}

impl<C> Database<Select<By<read::contract::Counts, ()>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = read::contract::Counts;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        _: Select<By<read::contract::Counts, ()>>,
    ) -> Result<Self::Ok, Self::Err> {
        const SQL: &str = "\
            SELECT (COUNT(*) FILTER (WHERE status = 1))::INT4 AS active, \
                   (COUNT(*) FILTER (WHERE status = 2))::INT4 AS expired, \
                   (COUNT(*) FILTER (WHERE status = 3))::INT4 AS terminated \
            FROM contracts";
        let rows = self.query(SQL, &[]).await.map_err(tracerr::wrap!())?;

        Ok(rows.first().map_or_else(
            read::contract::Counts::default,
            |row| read::contract::Counts {
                active: count(row, "active"),
                expired: count(row, "expired"),
                terminated: count(row, "terminated"),
            },
        ))
    }
}

impl<C> Database<Insert<Contract>> for Postgres<C>
where
    C: Connection,
    Self: Database<Update<Contract>, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(contract): Insert<Contract>,
    ) -> Result<Self::Ok, Self::Err> {
        self.execute(Update(contract)).await.map_err(tracerr::wrap!())
    }
}

impl<C> Database<Update<Contract>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(contract): Update<Contract>,
    ) -> Result<Self::Ok, Self::Err> {
        let Contract {
            id,
            number,
            student_id,
            room_id,
            start_date,
            end_date,
            deposit,
            status,
            created_at,
        } = contract;

        const SQL: &str = "\
            INSERT INTO contracts (\
                id, number, student_id, room_id, \
                start_date, end_date, \
                deposit, deposit_currency, \
                status, created_at\
            ) \
            VALUES (\
                $1::UUID, $2::VARCHAR, $3::UUID, $4::UUID, \
                $5::DATE, $6::DATE, \
                $7::NUMERIC, $8::INT2, \
                $9::INT2, $10::TIMESTAMPTZ\
            ) \
            ON CONFLICT (id) DO UPDATE \
            SET number = EXCLUDED.number, \
                start_date = EXCLUDED.start_date, \
                end_date = EXCLUDED.end_date, \
                deposit = EXCLUDED.deposit, \
                deposit_currency = EXCLUDED.deposit_currency, \
                status = EXCLUDED.status";
        self.exec(
            SQL,
            &[
                &id,
                &number,
                &student_id,
                &room_id,
                &start_date,
                &end_date,
                &deposit.amount,
                &deposit.currency,
                &status,
                &created_at,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}

impl<C> Database<Delete<By<Contract, contract::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Delete(by): Delete<By<Contract, contract::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id: contract::Id = by.into_inner();

        const SQL: &str = "\
            DELETE FROM contracts \
            WHERE id = $1::UUID";
        self.exec(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}

impl<C> Database<Lock<By<Contract, contract::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Lock(by): Lock<By<Contract, contract::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id: contract::Id = by.into_inner();

        const SQL: &str = "\
            SELECT id \
            FROM contracts \
            WHERE id = $1::UUID \
            FOR UPDATE";
        self.query(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}

impl<C>
    Database<
        Select<
            By<read::contract::list::Page, read::contract::list::Selector>,
        >,
    > for Postgres<C>
where
    C: Connection,
{
    type Ok = read::contract::list::Page;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<
            By<read::contract::list::Page, read::contract::list::Selector>,
        >,
    ) -> Result<Self::Ok, Self::Err> {
        let read::contract::list::Selector {
            arguments,
            filter:
                read::contract::list::Filter {
                    search,
                    status,
                    student_id,
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
        let student_idx = student_id.as_ref().map(|s| {
            ps.push(s);
            ps.len()
        });
        let pattern = search.as_ref().map(|s| FuzzPattern::new(s.as_ref()));
        let pattern_idx = pattern.as_ref().map(|p| {
            ps.push(p);
            ps.len()
        });

        let sql = format!(
            "SELECT c.id \
             FROM contracts AS c \
             INNER JOIN students AS s ON s.id = c.student_id \
             INNER JOIN rooms AS r ON r.id = c.room_id \
             INNER JOIN buildings AS b ON b.id = r.building_id \
             WHERE TRUE \
                   {cursor} \
                   {status} \
                   {student} \
                   {search} \
             ORDER BY c.id {order} \
             LIMIT $1::INT4",
            cursor = cursor_idx.into_iter().format_with("", |idx, f| {
                let op = arguments.kind().operator();
                f(&format_args!("AND c.id {op} ${idx}::UUID"))
            }),
            status = status_idx.into_iter().format_with("", |idx, f| {
                f(&format_args!("AND c.status = ${idx}::INT2"))
            }),
            student = student_idx.into_iter().format_with("", |idx, f| {
                f(&format_args!("AND c.student_id = ${idx}::UUID"))
            }),
            search = pattern_idx.into_iter().format_with("", |idx, f| {
                f(&format_args!(
                    "AND (LOWER(c.number) SIMILAR TO LOWER(${idx}::VARCHAR) \
                          OR LOWER(s.number) SIMILAR TO LOWER(${idx}::VARCHAR) \
                          OR LOWER(s.full_name) \
                                 SIMILAR TO LOWER(${idx}::VARCHAR) \
                          OR LOWER(r.number) SIMILAR TO LOWER(${idx}::VARCHAR) \
                          OR LOWER(b.name) SIMILAR TO LOWER(${idx}::VARCHAR))"
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

        Ok(read::contract::list::Page::new(&arguments, edges, has_more))
    }
}

impl<C> Database<Select<By<read::contract::list::TotalCount, ()>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = read::contract::list::TotalCount;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        _: Select<By<read::contract::list::TotalCount, ()>>,
    ) -> Result<Self::Ok, Self::Err> {
        const SQL: &str = "\
            SELECT COUNT(*)::INT4 \
            FROM contracts";
        self.query(SQL, &[])
            .await
            .map_err(tracerr::wrap!())
            .map(|rows| {
                rows.first().map_or(0, |row| row.get::<_, i32>(0)).into()
            })
    }
}
