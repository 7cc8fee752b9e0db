//! [`Command`] for creating a [`Contract`] by staff.

use common::{
    operations::{
        By, Commit, Insert, Lock, Select, Transact, Transacted, Update,
    },
    Date, DateTime, Money,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{
        contract, room, room_type, student, user, Contract, Room, RoomType,
        Student, User,
    },
    infra::{database, Database},
    policy::{self, Action},
    read::contract::Active,
    Service,
};

use super::{book_room::ActiveContractRoom, Command};

/// [`Command`] for assigning a [`Room`] to a [`Student`] on behalf of staff.
#[derive(Clone, Copy, Debug)]
pub struct CreateContract {
    /// ID of the [`Student`] renting the [`Room`].
    pub student_id: student::Id,

    /// ID of the [`Room`] to be rented.
    pub room_id: room::Id,

    /// [`Date`] the new [`Contract`] starts at.
    pub start_date: Date,

    /// [`Date`] the new [`Contract`] ends at.
    pub end_date: Date,

    /// Deposit of the new [`Contract`].
    ///
    /// Defaults to the monthly price of the [`Room`]'s [`RoomType`].
    pub deposit: Option<Money>,

    /// ID of the [`User`] creating the [`Contract`].
    pub initiator_id: user::Id,
}

impl<Db, Ntf> Command<CreateContract> for Service<Db, Ntf>
where
    Db: Database<Transact, Err = Traced<database::Error>>
        + Database<
            Select<By<Option<User>, user::Id>>,
            Ok = Option<User>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Room>, room::Id>>,
            Ok = Option<Room>,
            Err = Traced<database::Error>,
        >,
    Transacted<Db>: Database<
            Lock<By<Room, room::Id>>,
            Ok = (),
            Err = Traced<database::Error>,
        > + Database<
            Lock<By<Student, student::Id>>,
            Ok = (),
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Room>, room::Id>>,
            Ok = Option<Room>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Student>, student::Id>>,
            Ok = Option<Student>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<RoomType>, room_type::Id>>,
            Ok = Option<RoomType>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Active<Contract>>, student::Id>>,
            Ok = Option<Active<Contract>>,
            Err = Traced<database::Error>,
        > + Database<Insert<Contract>, Ok = (), Err = Traced<database::Error>>
        + Database<Update<Room>, Ok = (), Err = Traced<database::Error>>
        + Database<Commit, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = Contract;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: CreateContract,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CreateContract {
            student_id,
            room_id,
            start_date,
            end_date,
            deposit,
            initiator_id,
        } = cmd;

        policy::authorize(
            self.database(),
            initiator_id,
            Action::ManageContracts,
        )
        .await
        .map_err(tracerr::map_from_and_wrap!(=> E))
        .map(drop)?;

        if end_date <= start_date {
            return Err(tracerr::new!(E::InvalidPeriod {
                start: start_date,
                end: end_date,
            }));
        }

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        tx.execute(Lock(By::<Room, _>::new(room_id)))
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

        let existing = tx
            .execute(Select(By::<Option<Active<Contract>>, _>::new(
                student_id,
            )))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        if let Some(Active(existing)) = existing {
            let number = tx
                .execute(Select(By::<Option<Room>, _>::new(existing.room_id)))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?
                .map(|r| r.number);
            return Err(tracerr::new!(E::StudentHasActiveContract(
                ActiveContractRoom {
                    id: existing.room_id,
                    number,
                }
            )));
        }

        let mut room = tx
            .execute(Select(By::<Option<Room>, _>::new(room_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .filter(Room::is_available)
            .ok_or(E::RoomNotExists(room_id))
            .map_err(tracerr::wrap!())?;

        let deposit = match deposit {
            Some(d) => d,
            None => {
                tx.execute(Select(By::<Option<RoomType>, _>::new(
                    room.room_type_id,
                )))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?
                .ok_or(E::RoomTypeNotExists(room.room_type_id))
                .map_err(tracerr::wrap!())?
                .monthly_price
            }
        };

        let contract = Contract {
            id: contract::Id::new(),
            number: contract::Number::generate(Date::today(), &student.number),
            student_id,
            room_id,
            start_date,
            end_date,
            deposit,
            status: contract::Status::Active,
            created_at: DateTime::now().coerce(),
        };
        room.status = room::Status::Occupied;

        let already_booked = |e: Traced<database::Error>| {
            let err = e.as_ref();
            if err.is_unique_violation(Some(database::ACTIVE_ROOM_CONTRACT))
                || err.is_unique_violation(Some(
                    database::ACTIVE_STUDENT_CONTRACT,
                ))
            {
                tracerr::new!(E::RoomAlreadyBooked(room_id))
            } else {
                tracerr::map_from_and_wrap!(=> E)(e)
            }
        };
        tx.execute(Insert(contract.clone()))
            .await
            .map_err(already_booked)?;
        tx.execute(Update(room))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        tx.execute(Commit).await.map_err(already_booked)?;

        log::info!(
            contract_id = %contract.id,
            %room_id,
            %student_id,
            %initiator_id,
            "contract created",
        );

        Ok(contract)
    }
}

/// Error of [`CreateContract`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Contract`] doesn't end after it starts.
    #[display("`Contract` must end after {start}, but ends at {end}")]
    #[from(ignore)]
    InvalidPeriod {
        /// Requested start [`Date`].
        #[error(not(source))]
        start: Date,

        /// Requested end [`Date`].
        #[error(not(source))]
        end: Date,
    },

    /// Initiator is not allowed to manage [`Contract`]s.
    #[display("Not authorized: {_0}")]
    #[from]
    Policy(policy::Error),

    /// [`Room`] has been booked concurrently.
    #[display("`Room(id: {_0})` is already booked")]
    #[from(ignore)]
    RoomAlreadyBooked(#[error(not(source))] room::Id),

    /// [`Room`] doesn't exist or isn't available.
    #[display("`Room(id: {_0})` does not exist or is not available")]
    #[from(ignore)]
    RoomNotExists(#[error(not(source))] room::Id),

    /// [`RoomType`] of the [`Room`] doesn't exist.
    #[display("`RoomType(id: {_0})` does not exist")]
    #[from(ignore)]
    RoomTypeNotExists(#[error(not(source))] room_type::Id),

    /// [`Student`] already has an active [`Contract`].
    #[display("`Student` already has an active `Contract` for {_0}")]
    #[from(ignore)]
    StudentHasActiveContract(#[error(not(source))] ActiveContractRoom),

    /// [`Student`] doesn't exist.
    #[display("`Student(id: {_0})` does not exist")]
    #[from(ignore)]
    StudentNotExists(#[error(not(source))] student::Id),
}

#[cfg(test)]
mod spec {
    use common::{Date, Money};

    use crate::{
        domain::{contract, room, user::Role},
        fixture, policy, Command as _,
    };

    use super::{CreateContract, ExecutionError};

    fn cmd(
        student_id: crate::domain::student::Id,
        room_id: room::Id,
        initiator_id: crate::domain::user::Id,
    ) -> CreateContract {
        let start_date = Date::from_calendar(2025, 9, 1).unwrap();
        CreateContract {
            student_id,
            room_id,
            start_date,
            end_date: start_date.add_days(180),
            deposit: None,
            initiator_id,
        }
    }

    #[tokio::test]
    async fn defaults_deposit_to_monthly_price() {
        let svc = fixture::service();
        let staff = fixture::user(&svc, Role::Staff).await;
        let (_, student) = fixture::student(&svc).await;
        let room = fixture::room(&svc, room::Status::Available).await;

        let contract = svc
            .execute(cmd(student.id, room.id, staff.id))
            .await
            .unwrap();

        assert_eq!(contract.deposit, Money::vnd(1_000_000));
        assert_eq!(contract.status, contract::Status::Active);
        assert_eq!(
            fixture::reload_room(&svc, room.id).await.status,
            room::Status::Occupied,
        );
    }

    #[tokio::test]
    async fn keeps_explicit_deposit() {
        let svc = fixture::service();
        let manager = fixture::user(&svc, Role::Manager).await;
        let (_, student) = fixture::student(&svc).await;
        let room = fixture::room(&svc, room::Status::Available).await;

        let contract = svc
            .execute(CreateContract {
                deposit: Some(Money::vnd(500_000)),
                ..cmd(student.id, room.id, manager.id)
            })
            .await
            .unwrap();

        assert_eq!(contract.deposit, Money::vnd(500_000));
    }

    #[tokio::test]
    async fn rejects_inverted_period() {
        let svc = fixture::service();
        let staff = fixture::user(&svc, Role::Staff).await;
        let (_, student) = fixture::student(&svc).await;
        let room = fixture::room(&svc, room::Status::Available).await;
        let base = cmd(student.id, room.id, staff.id);

        let err = svc
            .execute(CreateContract {
                end_date: base.start_date,
                ..base
            })
            .await
            .unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::InvalidPeriod { .. }));
    }

    #[tokio::test]
    async fn rejects_students_and_occupied_rooms() {
        let svc = fixture::service();
        let staff = fixture::user(&svc, Role::Staff).await;
        let (user, student) = fixture::student(&svc).await;
        let (_, other) = fixture::student(&svc).await;
        let room = fixture::room(&svc, room::Status::Available).await;
        _ = fixture::contract(
            &svc,
            &other,
            &room,
            Date::today().add_days(30),
            contract::Status::Active,
        )
        .await;

        let err = svc
            .execute(cmd(student.id, room.id, user.id))
            .await
            .unwrap_err();
        assert!(matches!(
            err.as_ref(),
            ExecutionError::Policy(policy::Error::Forbidden(..)),
        ));

        let err = svc
            .execute(cmd(student.id, room.id, staff.id))
            .await
            .unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::RoomNotExists(_)));
    }
}
