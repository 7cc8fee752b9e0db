//! [`RoomType`]-related [`Database`] implementations.

use common::{
    operations::{By, Insert, Select, Update},
    Money,
};
use tokio_postgres::Row;
use tracerr::Traced;

use crate::{
    domain::{room_type, RoomType},
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
};

use super::small_number;

/// Columns of a [`RoomType`] row.
const COLUMNS: &str = "\
    id, name, capacity, monthly_price, monthly_price_currency";

/// Converts the provided [`Row`] into a [`RoomType`].
fn room_type(row: &Row) -> RoomType {
    RoomType {
        id: row.get("id"),
        name: row.get("name"),
        capacity: small_number(row, "capacity"),
        monthly_price: Money {
            amount: row.get("monthly_price"),
            currency: row.get("monthly_price_currency"),
        },
    }
}

impl<C> Database<Select<By<Option<RoomType>, room_type::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<RoomType>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<RoomType>, room_type::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id: room_type::Id = by.into_inner();

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM room_types \
             WHERE id = $1::UUID"
        );
        Ok(self
            .query_opt(&sql, &[&id])
            .await
            .map_err(tracerr::wrap!())?
            .as_ref()
            .map(room_type))
    }
}

impl<C> Database<Select<By<Vec<RoomType>, ()>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<RoomType>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        _: Select<By<Vec<RoomType>, ()>>,
    ) -> Result<Self::Ok, Self::Err> {
        let sql = format!(
            "SELECT {COLUMNS} \
             FROM room_types \
             ORDER BY name, id"
        );
        Ok(self
            .query(&sql, &[])
            .await
            .map_err(tracerr::wrap!())?
            .iter()
            .map(room_type)
            .collect())
    }
}

impl<C> Database<Insert<RoomType>> for Postgres<C>
where
    C: Connection,
    Self: Database<Update<RoomType>, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(room_type): Insert<RoomType>,
    ) -> Result<Self::Ok, Self::Err> {
        self.execute(Update(room_type)).await.map_err(tracerr::wrap!())
    }
}

impl<C> Database<Update<RoomType>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(room_type): Update<RoomType>,
    ) -> Result<Self::Ok, Self::Err> {
        let RoomType {
            id,
            name,
            capacity,
            monthly_price,
        } = room_type;
        let capacity = i32::from(capacity);

        const SQL: &str = "\
            INSERT INTO room_types (\
                id, name, capacity, monthly_price, monthly_price_currency\
            ) \
            VALUES (\
                $1::UUID, $2::VARCHAR, $3::INT4, $4::NUMERIC, $5::INT2\
            ) \
            ON CONFLICT (id) DO UPDATE \
            SET name = EXCLUDED.name, \
                capacity = EXCLUDED.capacity, \
                monthly_price = EXCLUDED.monthly_price, \
                monthly_price_currency = EXCLUDED.monthly_price_currency";
        self.exec(
            SQL,
            &[
                &id,
                &name,
                &capacity,
                &monthly_price.amount,
                &monthly_price.currency,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}
