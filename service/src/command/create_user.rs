//! [`Command`] for creating a new [`User`].

use common::{
    operations::{By, Commit, Insert, Select, Transact, Transacted},
    DateTime,
};
use derive_more::{Display, Error, From};
use secrecy::{ExposeSecret, SecretBox};
use tracerr::Traced;

#[cfg(doc)]
use crate::domain::user::{Email, Login, Name, Password, Phone};
use crate::{
    domain::{
        user::{self, Role},
        User,
    },
    infra::{database, Database},
    policy::{self, Action},
    Service,
};

use super::Command;

/// [`Command`] for creating a new [`User`].
#[derive(Clone, Debug)]
pub struct CreateUser {
    /// [`Name`] of a new [`User`].
    pub name: user::Name,

    /// [`Login`] of a new [`User`].
    pub login: user::Login,

    /// [`Password`] of a new [`User`].
    pub password: SecretBox<user::Password>,

    /// [`Email`] of a new [`User`].
    pub email: Option<user::Email>,

    /// [`Phone`] of a new [`User`].
    pub phone: Option<user::Phone>,

    /// [`Role`] of a new [`User`].
    pub role: Role,

    /// ID of the [`User`] creating the new one.
    ///
    /// [`None`] means self-registration, which is allowed for
    /// [`Role::Student`]s only.
    pub initiator_id: Option<user::Id>,
}

impl<Db, Ntf> Command<CreateUser> for Service<Db, Ntf>
where
    Db: Database<
            Select<By<Option<User>, user::Id>>,
            Ok = Option<User>,
            Err = Traced<database::Error>,
        > + for<'l> Database<
            Select<By<Option<User>, &'l user::Login>>,
            Ok = Option<User>,
            Err = Traced<database::Error>,
        > + Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<Insert<User>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = User;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: CreateUser) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CreateUser {
            name,
            login,
            password,
            email,
            phone,
            role,
            initiator_id,
        } = cmd;

        if role != Role::Student {
            let initiator_id = initiator_id
                .ok_or(E::StaffSelfRegistration)
                .map_err(tracerr::wrap!())?;
            policy::authorize(
                self.database(),
                initiator_id,
                Action::CreateStaffAccount,
            )
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        }

        let u = self
            .database()
            .execute(Select(By::new(&login)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        if u.is_some() {
            return Err(tracerr::new!(E::LoginOccupied(login)));
        }

        let user = User {
            id: user::Id::new(),
            name,
            login,
            password_hash: user::PasswordHash::new(password.expose_secret())
                .map_err(tracerr::from_and_wrap!(=> E))?,
            email,
            phone,
            role,
            created_at: DateTime::now().coerce(),
        };

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        tx.execute(Insert(user.clone()))
            .await
            .map_err(|e| {
                if e.as_ref().is_unique_violation(Some(database::USER_LOGIN)) {
                    tracerr::new!(E::LoginOccupied(user.login.clone()))
                } else {
                    tracerr::map_from_and_wrap!(=> E)(e)
                }
            })
            .map(drop)?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        Ok(user)
    }
}

/// Error of [`CreateUser`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`user::Login`] is already occupied.
    #[display("`{_0}` login is occupied")]
    #[from(ignore)]
    LoginOccupied(#[error(not(source))] user::Login),

    /// [`user::Password`] cannot be hashed.
    #[display("Failed to hash `Password`: {_0}")]
    #[from]
    PasswordHash(#[error(not(source))] argon2::password_hash::Error),

    /// Initiator is not allowed to create the [`User`].
    #[display("Not authorized: {_0}")]
    #[from]
    Policy(policy::Error),

    /// Non-[`Role::Student`] [`User`] tries to register itself.
    #[display("Only students can register themselves")]
    #[from(ignore)]
    StaffSelfRegistration,
}

#[cfg(test)]
mod spec {
    use secrecy::SecretBox;

    use crate::{
        fixture,
        domain::user::{Login, Name, Password, Role},
        policy, Command as _,
    };

    use super::{CreateUser, ExecutionError};

    fn cmd(login: &str, role: Role) -> CreateUser {
        CreateUser {
            name: Name::new("Nguyen Van A").unwrap(),
            login: Login::new(login).unwrap(),
            password: SecretBox::new(Box::new(
                Password::new("secret-pass").unwrap(),
            )),
            email: None,
            phone: None,
            role,
            initiator_id: None,
        }
    }

    #[tokio::test]
    async fn registers_student_with_hashed_password() {
        let svc = fixture::service();

        let user = svc.execute(cmd("student.a", Role::Student)).await.unwrap();

        assert_eq!(user.role, Role::Student);
        assert!(user
            .password_hash
            .verify(&Password::new("secret-pass").unwrap()));
    }

    #[tokio::test]
    async fn rejects_occupied_login() {
        let svc = fixture::service();
        _ = svc.execute(cmd("student.a", Role::Student)).await.unwrap();

        let err = svc
            .execute(cmd("student.a", Role::Student))
            .await
            .unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::LoginOccupied(_)));
    }

    #[tokio::test]
    async fn only_managers_create_staff() {
        let svc = fixture::service();
        let staff = fixture::user(&svc, Role::Staff).await;
        let manager = fixture::user(&svc, Role::Manager).await;

        let err = svc
            .execute(cmd("staff.b", Role::Staff))
            .await
            .unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::StaffSelfRegistration));

        let err = svc
            .execute(CreateUser {
                initiator_id: Some(staff.id),
                ..cmd("staff.b", Role::Staff)
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err.as_ref(),
            ExecutionError::Policy(policy::Error::Forbidden(..)),
        ));

        let user = svc
            .execute(CreateUser {
                initiator_id: Some(manager.id),
                ..cmd("staff.b", Role::Staff)
            })
            .await
            .unwrap();
        assert_eq!(user.role, Role::Staff);
    }
}
