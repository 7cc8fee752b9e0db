//! [`Command`] for booking a [`Room`] by a [`Student`].

use common::{
    operations::{
        By, Commit, Insert, Lock, Select, Transact, Transacted, Update,
    },
    Date, DateTime,
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

use super::Command;

/// [`Command`] for booking an available [`Room`] by the [`Student`] owning
/// the acting [`User`] account.
///
/// Creates an active [`Contract`] lasting [`Contract::BOOKING_DAYS`] from
/// today and occupies the [`Room`].
#[derive(Clone, Copy, Debug)]
pub struct BookRoom {
    /// ID of the [`Room`] to be booked.
    pub room_id: room::Id,

    /// ID of the [`User`] booking the [`Room`].
    pub user_id: user::Id,
}

impl<Db, Ntf> Command<BookRoom> for Service<Db, Ntf>
where
    Db: Database<Transact, Err = Traced<database::Error>>
        + Database<
            Select<By<Option<User>, user::Id>>,
            Ok = Option<User>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Student>, user::Id>>,
            Ok = Option<Student>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Room>, room::Id>>,
            Ok = Option<Room>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Active<Contract>>, student::Id>>,
            Ok = Option<Active<Contract>>,
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

    async fn execute(&self, cmd: BookRoom) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let BookRoom { room_id, user_id } = cmd;

        policy::authorize(self.database(), user_id, Action::BookRoom)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let student = self
            .database()
            .execute(Select(By::<Option<Student>, _>::new(user_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::StudentNotExists(user_id))
            .map_err(tracerr::wrap!())?;

        self.database()
            .execute(Select(By::<Option<Room>, _>::new(room_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .filter(Room::is_available)
            .ok_or(E::RoomNotExists(room_id))
            .map_err(tracerr::wrap!())
            .map(drop)?;

        if let Some(Active(existing)) = self
            .database()
            .execute(Select(By::<Option<Active<Contract>>, _>::new(
                student.id,
            )))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
        {
            let room = self
                .database()
                .execute(Select(By::<Option<Room>, _>::new(existing.room_id)))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?;
            return Err(tracerr::new!(E::StudentHasActiveContract(
                ActiveContractRoom {
                    id: existing.room_id,
                    number: room.map(|r| r.number),
                }
            )));
        }

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Room first, then student, to never deadlock with other
        // assignments of the same pair.
        tx.execute(Lock(By::<Room, _>::new(room_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        tx.execute(Lock(By::<Student, _>::new(student.id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        let mut room = tx
            .execute(Select(By::<Option<Room>, _>::new(room_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::RoomNotExists(room_id))
            .map_err(tracerr::wrap!())?;
        if !room.is_available() {
            return Err(tracerr::new!(E::RoomAlreadyBooked(room_id)));
        }
        let student = tx
            .execute(Select(By::<Option<Student>, _>::new(student.id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::StudentNotExists(user_id))
            .map_err(tracerr::wrap!())?;
        let has_contract = tx
            .execute(Select(By::<Option<Active<Contract>>, _>::new(
                student.id,
            )))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .is_some();
        if has_contract {
            return Err(tracerr::new!(E::RoomAlreadyBooked(room_id)));
        }

        let room_type = tx
            .execute(Select(By::<Option<RoomType>, _>::new(room.room_type_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::RoomTypeNotExists(room.room_type_id))
            .map_err(tracerr::wrap!())?;

        let today = Date::today();
        let contract = Contract {
            id: contract::Id::new(),
            number: contract::Number::generate(today, &student.number),
            student_id: student.id,
            room_id,
            start_date: today,
            end_date: today.add_days(Contract::BOOKING_DAYS),
            deposit: room_type.monthly_price,
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
            student_id = %student.id,
            "room booked",
        );

        Ok(contract)
    }
}

/// [`Room`] of an already active [`Contract`].
#[derive(Clone, Debug, Display)]
#[display("`Room(id: {id})`")]
pub struct ActiveContractRoom {
    /// ID of the [`Room`].
    pub id: room::Id,

    /// Number of the [`Room`], if it still exists.
    pub number: Option<room::Number>,
}

/// Error of [`BookRoom`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`User`] is not allowed to book [`Room`]s.
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

    /// [`User`] has no [`Student`] profile.
    #[display("`User(id: {_0})` has no `Student` profile")]
    #[from(ignore)]
    StudentNotExists(#[error(not(source))] user::Id),
}

#[cfg(test)]
mod spec {
    use common::{Date, Money};

    use crate::{
        command::DeleteStudent,
        domain::{contract, room, user::Role},
        fixture, policy, Command as _,
    };

    use super::{BookRoom, ExecutionError};

    #[tokio::test]
    async fn books_available_room() {
        let svc = fixture::service();
        let (user, student) = fixture::student(&svc).await;
        let room = fixture::room(&svc, room::Status::Available).await;

        let contract = svc
            .execute(BookRoom {
                room_id: room.id,
                user_id: user.id,
            })
            .await
            .unwrap();

        let today = Date::today();
        assert_eq!(contract.status, contract::Status::Active);
        assert_eq!(contract.student_id, student.id);
        assert_eq!(contract.deposit, Money::vnd(1_000_000));
        assert_eq!(contract.start_date, today);
        assert_eq!(contract.start_date.days_until(contract.end_date), 365);
        assert_eq!(
            contract.number.as_ref(),
            format!("CT{}{}", today.to_compact_string(), student.number),
        );
        assert!(fixture::reload_contract(&svc, contract.id).await.is_some());
        assert_eq!(
            fixture::reload_room(&svc, room.id).await.status,
            room::Status::Occupied,
        );
    }

    #[tokio::test]
    async fn rejects_second_active_contract() {
        let svc = fixture::service();
        let (user, student) = fixture::student(&svc).await;
        let first = fixture::room(&svc, room::Status::Available).await;
        let second = fixture::room(&svc, room::Status::Available).await;
        let existing = fixture::contract(
            &svc,
            &student,
            &first,
            Date::today().add_days(100),
            contract::Status::Active,
        )
        .await;

        let err = svc
            .execute(BookRoom {
                room_id: second.id,
                user_id: user.id,
            })
            .await
            .unwrap_err();

        let ExecutionError::StudentHasActiveContract(room) = err.as_ref()
        else {
            panic!("unexpected error: {err}");
        };
        assert_eq!(room.id, existing.room_id);
        assert_eq!(room.number.as_ref(), Some(&first.number));
        assert_eq!(
            fixture::reload_room(&svc, second.id).await.status,
            room::Status::Available,
        );
    }

    #[tokio::test]
    async fn rejects_unavailable_room() {
        let svc = fixture::service();
        let (user, _) = fixture::student(&svc).await;
        let room = fixture::room(&svc, room::Status::Maintenance).await;

        let err = svc
            .execute(BookRoom {
                room_id: room.id,
                user_id: user.id,
            })
            .await
            .unwrap_err();

        assert!(matches!(
            err.as_ref(),
            ExecutionError::RoomNotExists(id) if *id == room.id,
        ));
    }

    #[tokio::test]
    async fn rejects_non_students() {
        let svc = fixture::service();
        let staff = fixture::user(&svc, Role::Staff).await;
        let room = fixture::room(&svc, room::Status::Available).await;

        let err = svc
            .execute(BookRoom {
                room_id: room.id,
                user_id: staff.id,
            })
            .await
            .unwrap_err();

        assert!(matches!(
            err.as_ref(),
            ExecutionError::Policy(policy::Error::Forbidden(..)),
        ));
    }

    #[tokio::test]
    async fn rejects_student_without_profile() {
        let svc = fixture::service();
        let user = fixture::user(&svc, Role::Student).await;
        let room = fixture::room(&svc, room::Status::Available).await;

        let err = svc
            .execute(BookRoom {
                room_id: room.id,
                user_id: user.id,
            })
            .await
            .unwrap_err();

        assert!(matches!(
            err.as_ref(),
            ExecutionError::StudentNotExists(id) if *id == user.id,
        ));
    }

    #[tokio::test]
    async fn books_room_once_under_race() {
        let svc = fixture::service();
        let (first, _) = fixture::student(&svc).await;
        let (second, _) = fixture::student(&svc).await;
        let room = fixture::room(&svc, room::Status::Available).await;

        let (a, b) = tokio::join!(
            svc.execute(BookRoom {
                room_id: room.id,
                user_id: first.id,
            }),
            svc.execute(BookRoom {
                room_id: room.id,
                user_id: second.id,
            }),
        );

        let (booked, failed) = match (a, b) {
            (Ok(c), Err(e)) | (Err(e), Ok(c)) => (c, e),
            (a, b) => panic!("expected exactly one booking: {a:?}, {b:?}"),
        };
        assert!(matches!(
            failed.as_ref(),
            ExecutionError::RoomAlreadyBooked(_)
                | ExecutionError::RoomNotExists(_),
        ));
        assert_eq!(booked.room_id, room.id);
        assert_eq!(
            fixture::reload_room(&svc, room.id).await.status,
            room::Status::Occupied,
        );
    }

    #[tokio::test]
    async fn never_books_for_concurrently_deleted_student() {
        for delay in 0..6 {
            let svc = fixture::service();
            let staff = fixture::user(&svc, Role::Staff).await;
            let (user, student) = fixture::student(&svc).await;
            let room = fixture::room(&svc, room::Status::Available).await;

            let (booked, deleted) = tokio::join!(
                svc.execute(BookRoom {
                    room_id: room.id,
                    user_id: user.id,
                }),
                async {
                    for _ in 0..delay {
                        tokio::task::yield_now().await;
                    }
                    svc.execute(DeleteStudent {
                        student_id: student.id,
                        initiator_id: staff.id,
                    })
                    .await
                },
            );

            assert!(
                booked.is_ok() != deleted.is_ok(),
                "delay {delay}: {booked:?}, {deleted:?}",
            );
            if let Err(e) = booked {
                assert!(
                    matches!(
                        e.as_ref(),
                        ExecutionError::StudentNotExists(id) if *id == user.id,
                    ),
                    "delay {delay}: {e}",
                );
                assert_eq!(
                    fixture::reload_room(&svc, room.id).await.status,
                    room::Status::Available,
                );
            }
        }
    }

    #[tokio::test]
    async fn books_once_per_student_under_race() {
        let svc = fixture::service();
        let (user, _) = fixture::student(&svc).await;
        let r1 = fixture::room(&svc, room::Status::Available).await;
        let r2 = fixture::room(&svc, room::Status::Available).await;

        let (a, b) = tokio::join!(
            svc.execute(BookRoom {
                room_id: r1.id,
                user_id: user.id,
            }),
            svc.execute(BookRoom {
                room_id: r2.id,
                user_id: user.id,
            }),
        );

        assert_eq!(usize::from(a.is_ok()) + usize::from(b.is_ok()), 1);
        let statuses = [
            fixture::reload_room(&svc, r1.id).await.status,
            fixture::reload_room(&svc, r2.id).await.status,
        ];
        assert_eq!(
            statuses
                .iter()
                .filter(|s| **s == room::Status::Occupied)
                .count(),
            1,
        );
    }
}
