//! [`Command`] for updating a [`Student`] profile.

use common::{
    operations::{By, Commit, Lock, Select, Transact, Transacted, Update},
    Date,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{student, user, Student, User},
    infra::{database, Database},
    policy::{self, Action},
    Service,
};

use super::Command;

/// [`Command`] for updating a [`Student`] profile.
///
/// [`None`] fields are left untouched.
#[derive(Clone, Debug)]
pub struct UpdateStudent {
    /// ID of the [`Student`] to be updated.
    pub student_id: student::Id,

    /// New number of the [`Student`].
    pub number: Option<student::Number>,

    /// New full name of the [`Student`].
    pub full_name: Option<student::FullName>,

    /// New date of birth of the [`Student`], [`Some`]`(`[`None`]`)` removes
    /// it.
    pub date_of_birth: Option<Option<Date>>,

    /// New university of the [`Student`].
    pub university: Option<student::University>,

    /// New faculty of the [`Student`].
    pub faculty: Option<student::Faculty>,

    /// New course of the [`Student`].
    pub course: Option<student::Course>,

    /// ID of the [`User`] updating the [`Student`].
    pub initiator_id: user::Id,
}

impl<Db, Ntf> Command<UpdateStudent> for Service<Db, Ntf>
where
    Db: Database<
            Select<By<Option<User>, user::Id>>,
            Ok = Option<User>,
            Err = Traced<database::Error>,
        > + Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Lock<By<Student, student::Id>>,
            Ok = (),
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Student>, student::Id>>,
            Ok = Option<Student>,
            Err = Traced<database::Error>,
        > + Database<Update<Student>, Ok = (), Err = Traced<database::Error>>
        + Database<Commit, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = Student;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: UpdateStudent,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let UpdateStudent {
            student_id,
            number,
            full_name,
            date_of_birth,
            university,
            faculty,
            course,
            initiator_id,
        } = cmd;

        policy::authorize(self.database(), initiator_id, Action::ManageStudents)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        tx.execute(Lock(By::<Student, _>::new(student_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        let mut student = tx
            .execute(Select(By::<Option<Student>, _>::new(student_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::StudentNotExists(student_id))
            .map_err(tracerr::wrap!())?;

        if let Some(number) = number {
            student.number = number;
        }
        if let Some(full_name) = full_name {
            student.full_name = full_name;
        }
        if let Some(date_of_birth) = date_of_birth {
            student.date_of_birth = date_of_birth;
        }
        if let Some(university) = university {
            student.university = university;
        }
        if let Some(faculty) = faculty {
            student.faculty = faculty;
        }
        if let Some(course) = course {
            student.course = course;
        }

        let occupied = |e: Traced<database::Error>| {
            if e.as_ref().is_unique_violation(Some(database::STUDENT_NUMBER)) {
                tracerr::new!(E::NumberOccupied(student.number.clone()))
            } else {
                tracerr::map_from_and_wrap!(=> E)(e)
            }
        };
        tx.execute(Update(student.clone()))
            .await
            .map_err(occupied)?;
        tx.execute(Commit).await.map_err(occupied)?;

        Ok(student)
    }
}

/// Error of [`UpdateStudent`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`student::Number`] belongs to another [`Student`].
    #[display("`{_0}` student number is occupied")]
    #[from(ignore)]
    NumberOccupied(#[error(not(source))] student::Number),

    /// Initiator is not allowed to manage [`Student`]s.
    #[display("Not authorized: {_0}")]
    #[from]
    Policy(policy::Error),

    /// [`Student`] doesn't exist.
    #[display("`Student(id: {_0})` does not exist")]
    #[from(ignore)]
    StudentNotExists(#[error(not(source))] student::Id),
}

#[cfg(test)]
mod spec {
    use crate::{
        domain::{student, user::Role},
        fixture, Command as _,
    };

    use super::{ExecutionError, UpdateStudent};

    fn cmd(
        student_id: student::Id,
        initiator_id: crate::domain::user::Id,
    ) -> UpdateStudent {
        UpdateStudent {
            student_id,
            number: None,
            full_name: None,
            date_of_birth: None,
            university: None,
            faculty: None,
            course: None,
            initiator_id,
        }
    }

    #[tokio::test]
    async fn updates_provided_fields_only() {
        let svc = fixture::service();
        let staff = fixture::user(&svc, Role::Staff).await;
        let (_, origin) = fixture::student(&svc).await;

        let student = svc
            .execute(UpdateStudent {
                course: Some(student::Course::new("K66").unwrap()),
                ..cmd(origin.id, staff.id)
            })
            .await
            .unwrap();

        assert_eq!(student.course.as_ref(), "K66");
        assert_eq!(student.number, origin.number);
    }

    #[tokio::test]
    async fn rejects_occupied_number() {
        let svc = fixture::service();
        let staff = fixture::user(&svc, Role::Staff).await;
        let (_, first) = fixture::student(&svc).await;
        let (_, second) = fixture::student(&svc).await;

        let err = svc
            .execute(UpdateStudent {
                number: Some(first.number.clone()),
                ..cmd(second.id, staff.id)
            })
            .await
            .unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::NumberOccupied(_)));
    }
}
