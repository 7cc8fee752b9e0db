//! [`Payment`]-related [`Database`] implementations.

use common::{
    operations::{By, Insert, Lock, Select, Update},
    Money,
};
use itertools::Itertools as _;
use postgres_types::ToSql;
use rust_decimal::Decimal;
use tokio_postgres::Row;
use tracerr::Traced;

use crate::{
    domain::{payment, Payment},
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
    read,
};

use super::count;

/// Columns of a [`Payment`] row.
const COLUMNS: &str = "\
    p.id, p.contract_id, p.amount, p.amount_currency, \
    p.due_date, p.status, p.paid_at, p.created_at";

/// Converts the provided [`Row`] into a [`Payment`].
fn payment(row: &Row) -> Payment {
    Payment {
        id: row.get("id"),
        contract_id: row.get("contract_id"),
        amount: Money {
            amount: row.get("amount"),
            currency: row.get("amount_currency"),
        },
        due_date: row.get("due_date"),
        status: row.get("status"),
        paid_at: row.get("paid_at"),
        created_at: row.get("created_at"),
    }
}

impl<C> Database<Select<By<Option<Payment>, payment::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Payment>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Payment>, payment::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id: payment::Id = by.into_inner();

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM payments AS p \
             WHERE p.id = $1::UUID"
        );
        Ok(self
            .query_opt(&sql, &[&id])
            .await
            .map_err(tracerr::wrap!())?
            .as_ref()
            .map(payment))
    }
}

impl<C> Database<Insert<Payment>> for Postgres<C>
where
    C: Connection,
    Self: Database<Update<Payment>, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(payment): Insert<Payment>,
    ) -> Result<Self::Ok, Self::Err> {
        self.execute(Update(payment)).await.map_err(tracerr::wrap!())
    }
}

impl<C> Database<Update<Payment>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(payment): Update<Payment>,
    ) -> Result<Self::Ok, Self::Err> {
        let Payment {
            id,
            contract_id,
            amount,
            due_date,
            status,
            paid_at,
            created_at,
        } = payment;

        const SQL: &str = "\
            INSERT INTO payments (\
                id, contract_id, amount, amount_currency, \
                due_date, status, paid_at, created_at\
            ) \
            VALUES (\
                $1::UUID, $2::UUID, $3::NUMERIC, $4::INT2, \
                $5::DATE, $6::INT2, $7::TIMESTAMPTZ, $8::TIMESTAMPTZ\
            ) \
            ON CONFLICT (id) DO UPDATE \
            SET amount = EXCLUDED.amount, \
                amount_currency = EXCLUDED.amount_currency, \
                due_date = EXCLUDED.due_date, \
                status = EXCLUDED.status, \
                paid_at = EXCLUDED.paid_at";
        self.exec(
            SQL,
            &[
                &id,
                &contract_id,
                &amount.amount,
                &amount.currency,
                &due_date,
                &status,
                &paid_at,
                &created_at,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}

impl<C> Database<Lock<By<Payment, payment::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Lock(by): Lock<By<Payment, payment::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id: payment::Id = by.into_inner();

        const SQL: &str = "\
            SELECT id \
            FROM payments \
            WHERE id = $1::UUID \
            FOR UPDATE";
        self.query(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}

impl<C> Database<Select<By<read::payment::Stats, read::payment::StatsScope>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = read::payment::Stats;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<
            By<read::payment::Stats, read::payment::StatsScope>,
        >,
    ) -> Result<Self::Ok, Self::Err> {
        let read::payment::StatsScope { student_id, today } = by.into_inner();

        const SQL: &str = "\
            SELECT (COUNT(*) FILTER (WHERE p.status = 1))::INT4 AS pending, \
                   (COUNT(*) FILTER (WHERE p.status = 2))::INT4 AS paid, \
                   (COUNT(*) FILTER (WHERE p.status = 1 \
                                       AND p.due_date < $2::DATE))::INT4 \
                       AS overdue, \
                   COALESCE(SUM(p.amount) FILTER (WHERE p.status = 2 \
                                                  AND p.amount_currency = 1), \
                            0)::NUMERIC AS paid_amount \
            FROM payments AS p \
            INNER JOIN contracts AS c ON c.id = p.contract_id \
            WHERE $1::UUID IS NULL OR c.student_id = $1::UUID";
        let rows = self
            .query(SQL, &[&student_id, &today])
            .await
            .map_err(tracerr::wrap!())?;

        Ok(rows.first().map_or_else(
            || read::payment::Stats {
                pending: 0,
                paid: 0,
                overdue: 0,
                paid_amount: Money::vnd(Decimal::ZERO),
            },
            |row| read::payment::Stats {
                pending: count(row, "pending"),
                paid: count(row, "paid"),
                overdue: count(row, "overdue"),
                paid_amount: Money::vnd(row.get::<_, Decimal>("paid_amount")),
            },
        ))
    }
}

impl<C> Database<Select<By<Vec<Payment>, read::payment::Overdue>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<Payment>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Payment>, read::payment::Overdue>>,
    ) -> Result<Self::Ok, Self::Err> {
        let read::payment::Overdue { today, limit } = by.into_inner();
        let limit = i32::from(limit);

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM payments AS p \
             WHERE p.status = 1 \
               AND p.due_date < $1::DATE \
             ORDER BY p.due_date DESC, p.id \
             LIMIT $2::INT4"
        );
        Ok(self
            .query(&sql, &[&today, &limit])
            .await
            .map_err(tracerr::wrap!())?
            .iter()
            .map(payment)
            .collect())
    }
}

impl<C> Database<Select<By<Vec<Payment>, read::payment::Upcoming>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<Payment>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Payment>, read::payment::Upcoming>>,
    ) -> Result<Self::Ok, Self::Err> {
        let read::payment::Upcoming { from, until, limit } = by.into_inner();
        let limit = i32::from(limit);

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM payments AS p \
             WHERE p.status = 1 \
               AND p.due_date BETWEEN $1::DATE AND $2::DATE \
             ORDER BY p.due_date, p.id \
             LIMIT $3::INT4"
        );
        Ok(self
            .query(&sql, &[&from, &until, &limit])
            .await
            .map_err(tracerr::wrap!())?
            .iter()
            .map(payment)
            .collect())
    }
}

impl<C>
    Database<
        Select<By<read::payment::list::Page, read::payment::list::Selector>>,
    > for Postgres<C>
where
    C: Connection,
{
    type Ok = read::payment::list::Page;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<
            By<read::payment::list::Page, read::payment::list::Selector>,
        >,
    ) -> Result<Self::Ok, Self::Err> {
        let read::payment::list::Selector {
            arguments,
            filter: read::payment::list::Filter { status, student_id },
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

        let sql = format!(
            "SELECT p.id \
             FROM payments AS p \
             INNER JOIN contracts AS c ON c.id = p.contract_id \
             WHERE TRUE \
                   {cursor} \
                   {status} \
                   {student} \
             ORDER BY p.id {order} \
             LIMIT $1::INT4",
            cursor = cursor_idx.into_iter().format_with("", |idx, f| {
                let op = arguments.kind().operator();
                f(&format_args!("AND p.id {op} ${idx}::UUID"))
            }),
            status = status_idx.into_iter().format_with("", |idx, f| {
                f(&format_args!("AND p.status = ${idx}::INT2"))
            }),
            student = student_idx.into_iter().format_with("", |idx, f| {
                f(&format_args!("AND c.student_id = ${idx}::UUID"))
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

        Ok(read::payment::list::Page::new(&arguments, edges, has_more))
    }
}

impl<C> Database<Select<By<read::payment::list::TotalCount, ()>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = read::payment::list::TotalCount;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        _: Select<By<read::payment::list::TotalCount, ()>>,
    ) -> Result<Self::Ok, Self::Err> {
        const SQL: &str = "\
            SELECT COUNT(*)::INT4 \
            FROM payments";
        self.query(SQL, &[])
            .await
            .map_err(tracerr::wrap!())
            .map(|rows| {
                rows.first().map_or(0, |row| row.get::<_, i32>(0)).into()
            })
    }
}
