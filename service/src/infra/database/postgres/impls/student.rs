//! [`Student`]-related [`Database`] implementations.

use std::collections::HashMap;

use common::operations::{By, Delete, Insert, Lock, Select, Update};
use itertools::Itertools as _;
use postgres_types::ToSql;
use tracerr::Traced;

use crate::{
    domain::{student, user, Student},
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

impl<C, IDs> Database<Select<By<HashMap<student::Id, Student>, IDs>>>
    for Postgres<C>
where
    C: Connection,
    IDs: AsRef<[student::Id]>,
{
    type Ok = HashMap<student::Id, Student>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<HashMap<student::Id, Student>, IDs>>,
    ) -> Result<Self::Ok, Self::Err> {
        let ids = by.into_inner();
        let ids: &[student::Id] = ids.as_ref();
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let limit = i32::try_from(ids.len()).unwrap_or(i32::MAX);

        const SQL: &str = "\
            SELECT id, user_id, number, full_name, date_of_birth, \
                   university, faculty, course \
            FROM students \
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
                    Student {
                        id,
                        user_id: row.get("user_id"),
                        number: row.get("number"),
                        full_name: row.get("full_name"),
                        date_of_birth: row.get("date_of_birth"),
                        university: row.get("university"),
                        faculty: row.get("faculty"),
                        course: row.get("course"),
                    },
                )
            })
            .collect())
    }
}

impl<C> Database<Select<By<Option<Student>, student::Id>>> for Postgres<C>
where
    C: Connection,
    Self: Database<
        Select<By<HashMap<student::Id, Student>, [student::Id; 1]>>,
        Ok = HashMap<student::Id, Student>,
        Err = Traced<database::Error>,
    >,
{
    type Ok = Option<Student>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Student>, student::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        Ok(self
            .execute(Select(By::new([id])))
            .await
            .map_err(tracerr::wrap!())?
            .remove(&id))
    }
}

impl<C> Database<Select<By<Option<Student>, user::Id>>> for Postgres<C>
where
    C: Connection,
    Self: Database<
        Select<By<Option<Student>, student::Id>>,
        Ok = Option<Student>,
        Err = Traced<database::Error>,
    >,
{
    type Ok = Option<Student>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Student>, user::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let user_id: user::Id = by.into_inner();

        const SQL: &str = "\
            SELECT id \
            FROM students \
            WHERE user_id = $1::UUID";
        let Some(row) = self
            .query_opt(SQL, &[&user_id])
            .await
            .map_err(tracerr::wrap!())?
        else {
            return Ok(None);
        };

        self.execute(Select(By::new(row.get::<_, student::Id>("id"))))
            .await
            .map_err(tracerr::wrap!())
    }
}

impl<C> Database<Insert<Student>> for Postgres<C>
where
    C: Connection,
    Self: Database<Update<Student>, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(student): Insert<Student>,
    ) -> Result<Self::Ok, Self::Err> {
        self.execute(Update(student)).await.map_err(tracerr::wrap!())
    }
}

impl<C> Database<Update<Student>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(student): Update<Student>,
    ) -> Result<Self::Ok, Self::Err> {
        let Student {
            id,
            user_id,
            number,
            full_name,
            date_of_birth,
            university,
            faculty,
            course,
        } = student;

        const SQL: &str = "\
            INSERT INTO students (\
                id, user_id, number, full_name, date_of_birth, \
                university, faculty, course\
            ) \
            VALUES (\
                $1::UUID, $2::UUID, $3::VARCHAR, $4::VARCHAR, $5::DATE, \
                $6::VARCHAR, $7::VARCHAR, $8::VARCHAR\
            ) \
            ON CONFLICT (id) DO UPDATE \
            SET number = EXCLUDED.number, \
                full_name = EXCLUDED.full_name, \
                date_of_birth = EXCLUDED.date_of_birth, \
                university = EXCLUDED.university, \
                faculty = EXCLUDED.faculty, \
                course = EXCLUDED.course";
        self.exec(
            SQL,
            &[
                &id,
                &user_id,
                &number,
                &full_name,
                &date_of_birth,
                &university,
                &faculty,
                &course,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}

impl<C> Database<Delete<By<Student, student::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Delete(by): Delete<By<Student, student::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id: student::Id = by.into_inner();

        const SQL: &str = "\
            DELETE FROM students \
            WHERE id = $1::UUID";
        self.exec(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}

impl<C> Database<Lock<By<Student, student::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Lock(by): Lock<By<Student, student::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id: student::Id = by.into_inner();

        const SQL: &str = "\
            SELECT id \
            FROM students \
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
        Select<By<read::student::list::Page, read::student::list::Selector>>,
    > for Postgres<C>
where
    C: Connection,
{
    type Ok = read::student::list::Page;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<
            By<read::student::list::Page, read::student::list::Selector>,
        >,
    ) -> Result<Self::Ok, Self::Err> {
        let read::student::list::Selector {
            arguments,
            filter: read::student::list::Filter { search },
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
             FROM students \
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
                    "AND (LOWER(number) SIMILAR TO LOWER(${idx}::VARCHAR) \
                       OR LOWER(full_name) SIMILAR TO LOWER(${idx}::VARCHAR) \
                       OR LOWER(university) SIMILAR TO LOWER(${idx}::VARCHAR) \
                       OR LOWER(faculty) SIMILAR TO LOWER(${idx}::VARCHAR))"
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

        Ok(read::student::list::Page::new(&arguments, edges, has_more))
    }
}

impl<C> Database<Select<By<read::student::list::TotalCount, ()>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = read::student::list::TotalCount;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        _: Select<By<read::student::list::TotalCount, ()>>,
    ) -> Result<Self::Ok, Self::Err> {
        const SQL: &str = "\
            SELECT COUNT(*)::INT4 \
            FROM students";
        self.query(SQL, &[])
            .await
            .map_err(tracerr::wrap!())
            .map(|rows| {
                rows.first().map_or(0, |row| row.get::<_, i32>(0)).into()
            })
    }
}
