//! [`Command`] for deleting a [`Student`] profile.

use common::operations::{
    By, Commit, Delete, Lock, Select, Transact, Transacted,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{contract, student, user, Contract, Student, User},
    infra::{database, Database},
    policy::{self, Action},
    read::contract::Active,
    Service,
};

use super::Command;

/// [`Command`] for deleting a [`Student`] profile along with its past
/// [`Contract`]s.
#[derive(Clone, Copy, Debug)]
pub struct DeleteStudent {
    /// ID of the [`Student`] to be deleted.
    pub student_id: student::Id,

    /// ID of the [`User`] deleting the [`Student`].
    pub initiator_id: user::Id,
}

impl<Db, Ntf> Command<DeleteStudent> for Service<Db, Ntf>
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
        > + Database<
            Select<By<Option<Active<Contract>>, student::Id>>,
            Ok = Option<Active<Contract>>,
            Err = Traced<database::Error>,
        > + Database<
            Delete<By<Student, student::Id>>,
            Ok = (),
            Err = Traced<database::Error>,
        > + Database<Commit, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = Student;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: DeleteStudent,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let DeleteStudent {
            student_id,
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

        let student = tx
            .execute(Select(By::<Option<Student>, _>::new(student_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::StudentNotExists(student_id))
            .map_err(tracerr::wrap!())?;

        if let Some(Active(contract)) = tx
            .execute(Select(By::<Option<Active<Contract>>, _>::new(
                student_id,
            )))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
        {
            return Err(tracerr::new!(E::StudentHasActiveContract(
                student_id,
                contract.id,
            )));
        }

        tx.execute(Delete(By::<Student, _>::new(student_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        log::info!(%student_id, %initiator_id, "student deleted");

        Ok(student)
    }
}

/// Error of [`DeleteStudent`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// Initiator is not allowed to manage [`Student`]s.
    #[display("Not authorized: {_0}")]
    #[from]
    Policy(policy::Error),

    /// [`Student`] rents a room by an active [`Contract`].
    #[display("`Student(id: {_0})` has active `Contract(id: {_1})`")]
    #[from(ignore)]
    StudentHasActiveContract(
        #[error(not(source))] student::Id,
        #[error(not(source))] contract::Id,
    ),

    /// [`Student`] doesn't exist.
    #[display("`Student(id: {_0})` does not exist")]
    #[from(ignore)]
    StudentNotExists(#[error(not(source))] student::Id),
}

#[cfg(test)]
mod spec {
    use common::Date;

    use crate::{
        domain::{contract, room, user::Role},
        fixture, Command as _,
    };

    use super::{DeleteStudent, ExecutionError};

    #[tokio::test]
    async fn rejects_student_with_active_contract() {
        let svc = fixture::service();
        let staff = fixture::user(&svc, Role::Staff).await;
        let (_, student) = fixture::student(&svc).await;
        let room = fixture::room(&svc, room::Status::Available).await;
        _ = fixture::contract(
            &svc,
            &student,
            &room,
            Date::today().add_days(30),
            contract::Status::Active,
        )
        .await;

        let err = svc
            .execute(DeleteStudent {
                student_id: student.id,
                initiator_id: staff.id,
            })
            .await
            .unwrap_err();

        assert!(matches!(
            err.as_ref(),
            ExecutionError::StudentHasActiveContract(..),
        ));
    }

    #[tokio::test]
    async fn deletes_student_without_contracts() {
        let svc = fixture::service();
        let staff = fixture::user(&svc, Role::Staff).await;
        let (_, student) = fixture::student(&svc).await;

        let deleted = svc
            .execute(DeleteStudent {
                student_id: student.id,
                initiator_id: staff.id,
            })
            .await
            .unwrap();

        assert_eq!(deleted.id, student.id);
    }
}
