//! [`User`]-related [`Database`] implementations.

use std::collections::HashMap;

use common::operations::{By, Insert, Select, Update};
use tracerr::Traced;

use crate::{
    domain::{user, User},
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
};

impl<C, IDs> Database<Select<By<HashMap<user::Id, User>, IDs>>> for Postgres<C>
where
    C: Connection,
    IDs: AsRef<[user::Id]>,
{
    type Ok = HashMap<user::Id, User>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<HashMap<user::Id, User>, IDs>>,
    ) -> Result<Self::Ok, Self::Err> {
        let ids = by.into_inner();
        let ids: &[user::Id] = ids.as_ref();
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let limit = i32::try_from(ids.len()).unwrap_or(i32::MAX);

        const SQL: &str = "\
            SELECT id, name, login, password_hash, \
                   email, phone, role, created_at \
            FROM users \
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
                    User {
                        id,
                        name: row.get("name"),
                        login: row.get("login"),
                        password_hash: row.get("password_hash"),
                        email: row.get("email"),
                        phone: row.get("phone"),
                        role: row.get("role"),
                        created_at: row.get("created_at"),
                    },
                )
            })
            .collect())
    }
}

impl<C> Database<Select<By<Option<User>, user::Id>>> for Postgres<C>
where
    C: Connection,
    Self: Database<
        Select<By<HashMap<user::Id, User>, [user::Id; 1]>>,
        Ok = HashMap<user::Id, User>,
        Err = Traced<database::Error>,
    >,
{
    type Ok = Option<User>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<User>, user::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        Ok(self
            .execute(Select(By::new([id])))
            .await
            .map_err(tracerr::wrap!())?
            .remove(&id))
    }
}

impl<'l, C> Database<Select<By<Option<User>, &'l user::Login>>> for Postgres<C>
where
    C: Connection,
    Self: Database<
        Select<By<Option<User>, user::Id>>,
        Ok = Option<User>,
        Err = Traced<database::Error>,
    >,
{
    type Ok = Option<User>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<User>, &'l user::Login>>,
    ) -> Result<Self::Ok, Self::Err> {
        let login = by.into_inner();

        const SQL: &str = "\
            SELECT id \
            FROM users \
            WHERE login = $1::VARCHAR \
            LIMIT 1";
        let Some(row) = self
            .query_opt(SQL, &[&login])
            .await
            .map_err(tracerr::wrap!())?
        else {
            return Ok(None);
        };

        self.execute(Select(By::new(row.get::<_, user::Id>("id"))))
            .await
            .map_err(tracerr::wrap!())
    }
}

impl<C> Database<Insert<User>> for Postgres<C>
where
    C: Connection,
    Self: Database<Update<User>, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(user): Insert<User>,
    ) -> Result<Self::Ok, Self::Err> {
        self.execute(Update(user)).await.map_err(tracerr::wrap!())
    }
}

impl<C> Database<Update<User>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(user): Update<User>,
    ) -> Result<Self::Ok, Self::Err> {
        let User {
            id,
            name,
            login,
            password_hash,
            email,
            phone,
            role,
            created_at,
        } = user;

        const SQL: &str = "\
            INSERT INTO users (\
                id, name, login, password_hash, \
                email, phone, role, created_at\
            ) \
            VALUES (\
                $1::UUID, $2::VARCHAR, $3::VARCHAR, $4::VARCHAR, \
                $5::VARCHAR, $6::VARCHAR, $7::INT2, $8::TIMESTAMPTZ\
            ) \
            ON CONFLICT (id) DO UPDATE \
            SET name = EXCLUDED.name, \
                login = EXCLUDED.login, \
                password_hash = EXCLUDED.password_hash, \
                email = EXCLUDED.email, \
                phone = EXCLUDED.phone, \
                role = EXCLUDED.role";
        self.exec(
            SQL,
            &[
                &id,
                &name,
                &login,
                &password_hash,
                &email,
                &phone,
                &role,
                &created_at,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}
