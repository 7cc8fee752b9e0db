//! [`Command`] for creating a [`Student`] profile.

use common::{
    operations::{By, Commit, Insert, Select, Transact, Transacted},
    Date,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{
        student,
        user::{self, Role},
        Student, User,
    },
    infra::{database, Database},
    policy::{self, Action},
    Service,
};

use super::Command;

/// [`Command`] for creating a [`Student`] profile of a [`User`].
///
/// Either staff fills the profile in for any [`Role::Student`] account, or a
/// student completes their own one.
#[derive(Clone, Debug)]
pub struct CreateStudent {
    /// ID of the [`User`] account the profile belongs to.
    pub user_id: user::Id,

    /// Number of a new [`Student`].
    pub number: student::Number,

    /// Full name of a new [`Student`].
    pub full_name: student::FullName,

    /// Date of birth of a new [`Student`].
    pub date_of_birth: Option<Date>,

    /// University of a new [`Student`].
    pub university: student::University,

    /// Faculty of a new [`Student`].
    pub faculty: student::Faculty,

    /// Course of a new [`Student`].
    pub course: student::Course,

    /// ID of the [`User`] creating the profile.
    pub initiator_id: user::Id,
}

impl<Db, Ntf> Command<CreateStudent> for Service<Db, Ntf>
where
    Db: Database<
            Select<By<Option<User>, user::Id>>,
            Ok = Option<User>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Student>, user::Id>>,
            Ok = Option<Student>,
            Err = Traced<database::Error>,
        > + Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<Insert<Student>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Student;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: CreateStudent,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CreateStudent {
            user_id,
            number,
            full_name,
            date_of_birth,
            university,
            faculty,
            course,
            initiator_id,
        } = cmd;

        let action = if initiator_id == user_id {
            Action::CompleteOwnProfile
        } else {
            Action::ManageStudents
        };
        let initiator = policy::authorize(self.database(), initiator_id, action)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        let owner = if initiator.id == user_id {
            initiator
        } else {
            self.database()
                .execute(Select(By::<Option<User>, _>::new(user_id)))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?
                .ok_or(E::UserNotExists(user_id))
                .map_err(tracerr::wrap!())?
        };
        if owner.role != Role::Student {
            return Err(tracerr::new!(E::UserNotStudent(user_id, owner.role)));
        }

        let existing = self
            .database()
            .execute(Select(By::<Option<Student>, _>::new(user_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        if existing.is_some() {
            return Err(tracerr::new!(E::ProfileExists(user_id)));
        }

        let student = Student {
            id: student::Id::new(),
            user_id,
            number,
            full_name,
            date_of_birth,
            university,
            faculty,
            course,
        };

        let conflict = |e: Traced<database::Error>| {
            let err = e.as_ref();
            if err.is_unique_violation(Some(database::STUDENT_NUMBER)) {
                tracerr::new!(E::NumberOccupied(student.number.clone()))
            } else if err.is_unique_violation(Some(database::STUDENT_USER)) {
                tracerr::new!(E::ProfileExists(user_id))
            } else {
                tracerr::map_from_and_wrap!(=> E)(e)
            }
        };
        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        tx.execute(Insert(student.clone()))
            .await
            .map_err(conflict)
            .map(drop)?;
        tx.execute(Commit).await.map_err(conflict).map(drop)?;

        Ok(student)
    }
}

/// Error of [`CreateStudent`] [`Command`] execution.
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

    /// Initiator is not allowed to create the profile.
    #[display("Not authorized: {_0}")]
    #[from]
    Policy(policy::Error),

    /// [`User`] already has a [`Student`] profile.
    #[display("`User(id: {_0})` already has a `Student` profile")]
    #[from(ignore)]
    ProfileExists(#[error(not(source))] user::Id),

    /// [`User`] owning the profile doesn't exist.
    #[display("`User(id: {_0})` does not exist")]
    #[from(ignore)]
    UserNotExists(#[error(not(source))] user::Id),

    /// [`User`] owning the profile is not a student.
    #[display("`User(id: {_0})` is {_1}, not a student")]
    #[from(ignore)]
    UserNotStudent(#[error(not(source))] user::Id, #[error(not(source))] Role),
}

#[cfg(test)]
mod spec {
    use crate::{
        domain::{student, user::Role},
        fixture, policy, Command as _,
    };

    use super::{CreateStudent, ExecutionError};

    fn cmd(
        user_id: crate::domain::user::Id,
        initiator_id: crate::domain::user::Id,
        number: &str,
    ) -> CreateStudent {
        CreateStudent {
            user_id,
            number: student::Number::new(number).unwrap(),
            full_name: student::FullName::new("Le Van C").unwrap(),
            date_of_birth: None,
            university: student::University::new("HUST").unwrap(),
            faculty: student::Faculty::new("Mechanics").unwrap(),
            course: student::Course::new("K66").unwrap(),
            initiator_id,
        }
    }

    #[tokio::test]
    async fn completes_own_profile() {
        let svc = fixture::service();
        let user = fixture::user(&svc, Role::Student).await;

        let student = svc
            .execute(cmd(user.id, user.id, "SV2024001"))
            .await
            .unwrap();
        assert_eq!(student.user_id, user.id);

        let err = svc
            .execute(cmd(user.id, user.id, "SV2024002"))
            .await
            .unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::ProfileExists(_)));
    }

    #[tokio::test]
    async fn staff_fills_profiles_of_students_only() {
        let svc = fixture::service();
        let staff = fixture::user(&svc, Role::Staff).await;
        let user = fixture::user(&svc, Role::Student).await;
        let other = fixture::user(&svc, Role::Student).await;

        _ = svc
            .execute(cmd(user.id, staff.id, "SV2024001"))
            .await
            .unwrap();

        let err = svc
            .execute(cmd(other.id, staff.id, "SV2024001"))
            .await
            .unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::NumberOccupied(_)));

        let err = svc
            .execute(cmd(staff.id, staff.id, "SV2024003"))
            .await
            .unwrap_err();
        assert!(matches!(
            err.as_ref(),
            ExecutionError::Policy(policy::Error::Forbidden(..)),
        ));

        let err = svc
            .execute(cmd(other.id, user.id, "SV2024004"))
            .await
            .unwrap_err();
        assert!(matches!(
            err.as_ref(),
            ExecutionError::Policy(policy::Error::Forbidden(..)),
        ));
    }
}
