//! [`Command`] for reminding a student about a pending [`Payment`].

use std::convert::Infallible;

use common::operations::{By, Select};
use derive_more::{Display, Error, From};
use tracerr::Traced;

#[cfg(doc)]
use crate::infra::notifier;
use crate::{
    domain::{
        contract, payment, student, user, Contract, Payment, Student, User,
    },
    infra::{database, Database, Notifier},
    policy::{self, Action},
    Service,
};

use super::Command;

/// [`Command`] for delivering a [`payment::Reminder`] about a pending
/// [`Payment`] to the [`Student`] owing it.
///
/// Delivery is attempted exactly once.
#[derive(Clone, Copy, Debug)]
pub struct SendPaymentReminder {
    /// ID of the [`Payment`] to remind about.
    pub payment_id: payment::Id,

    /// ID of the [`User`] sending the reminder.
    pub initiator_id: user::Id,
}

impl<Db, Ntf> Command<SendPaymentReminder> for Service<Db, Ntf>
where
    Db: Database<
            Select<By<Option<User>, user::Id>>,
            Ok = Option<User>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Payment>, payment::Id>>,
            Ok = Option<Payment>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Contract>, contract::Id>>,
            Ok = Option<Contract>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Student>, student::Id>>,
            Ok = Option<Student>,
            Err = Traced<database::Error>,
        >,
    Ntf: Notifier<payment::Reminder, Ok = bool, Err = Infallible>,
{
    type Ok = payment::Reminder;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: SendPaymentReminder,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let SendPaymentReminder {
            payment_id,
            initiator_id,
        } = cmd;

        policy::authorize(
            self.database(),
            initiator_id,
            Action::SendPaymentReminder,
        )
        .await
        .map_err(tracerr::map_from_and_wrap!(=> E))
        .map(drop)?;

        let payment = self
            .database()
            .execute(Select(By::<Option<Payment>, _>::new(payment_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::PaymentNotExists(payment_id))
            .map_err(tracerr::wrap!())?;
        if payment.status != payment::Status::Pending {
            return Err(tracerr::new!(E::PaymentNotPending(payment_id)));
        }

        let contract = self
            .database()
            .execute(Select(By::<Option<Contract>, _>::new(
                payment.contract_id,
            )))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::PaymentNotExists(payment_id))
            .map_err(tracerr::wrap!())?;
        let student = self
            .database()
            .execute(Select(By::<Option<Student>, _>::new(contract.student_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::PaymentNotExists(payment_id))
            .map_err(tracerr::wrap!())?;
        let user = self
            .database()
            .execute(Select(By::<Option<User>, _>::new(student.user_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::PaymentNotExists(payment_id))
            .map_err(tracerr::wrap!())?;

        let reminder = payment::Reminder {
            payment_id,
            contract_number: contract.number,
            student_name: student.full_name,
            email: user.email,
            amount: payment.amount,
            due_date: payment.due_date,
        };

        let sent = match self.notifier().execute(reminder.clone()).await {
            Ok(sent) => sent,
            Err(e) => match e {},
        };
        if !sent {
            return Err(tracerr::new!(E::ReminderNotSent(payment_id)));
        }

        Ok(reminder)
    }
}

/// Error of [`SendPaymentReminder`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Payment`] doesn't exist.
    #[display("`Payment(id: {_0})` does not exist")]
    #[from(ignore)]
    PaymentNotExists(#[error(not(source))] payment::Id),

    /// [`Payment`] is already paid.
    #[display("`Payment(id: {_0})` is already paid")]
    #[from(ignore)]
    PaymentNotPending(#[error(not(source))] payment::Id),

    /// Initiator is not allowed to send reminders.
    #[display("Not authorized: {_0}")]
    #[from]
    Policy(policy::Error),

    /// [`Notifier`] hasn't delivered the [`payment::Reminder`], like the
    /// [`notifier::Log`] does for students without an email.
    #[display("Reminder about `Payment(id: {_0})` was not sent")]
    #[from(ignore)]
    ReminderNotSent(#[error(not(source))] payment::Id),
}

#[cfg(test)]
mod spec {
    use common::{
        operations::{By, Select, Update},
        Date,
    };

    use crate::{
        domain::{contract, payment, room, user::Role, User},
        fixture,
        infra::Database as _,
        policy, Command as _,
    };

    use super::{ExecutionError, SendPaymentReminder};

    async fn pending_payment(
        svc: &fixture::TestService,
    ) -> (User, payment::Payment) {
        let (user, student) = fixture::student(svc).await;
        let room = fixture::room(svc, room::Status::Available).await;
        let contract = fixture::contract(
            svc,
            &student,
            &room,
            Date::today().add_days(200),
            contract::Status::Active,
        )
        .await;
        let payment = fixture::payment(
            svc,
            &contract,
            Date::today().add_days(3),
            payment::Status::Pending,
        )
        .await;
        (user, payment)
    }

    #[tokio::test]
    async fn reminds_student_with_email() {
        let svc = fixture::service();
        let staff = fixture::user(&svc, Role::Staff).await;
        let (user, payment) = pending_payment(&svc).await;

        let reminder = svc
            .execute(SendPaymentReminder {
                payment_id: payment.id,
                initiator_id: staff.id,
            })
            .await
            .unwrap();

        assert_eq!(reminder.email, user.email);
        assert_eq!(reminder.amount, payment.amount);
    }

    #[tokio::test]
    async fn fails_when_not_delivered() {
        let svc = fixture::service();
        let staff = fixture::user(&svc, Role::Staff).await;
        let (user, payment) = pending_payment(&svc).await;
        let user = svc
            .database()
            .execute(Select(By::<Option<User>, _>::new(user.id)))
            .await
            .unwrap()
            .unwrap();
        svc.database()
            .execute(Update(User {
                email: None,
                ..user
            }))
            .await
            .unwrap();

        let err = svc
            .execute(SendPaymentReminder {
                payment_id: payment.id,
                initiator_id: staff.id,
            })
            .await
            .unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::ReminderNotSent(_)));
    }

    #[tokio::test]
    async fn rejects_students() {
        let svc = fixture::service();
        let (user, payment) = pending_payment(&svc).await;

        let err = svc
            .execute(SendPaymentReminder {
                payment_id: payment.id,
                initiator_id: user.id,
            })
            .await
            .unwrap_err();

        assert!(matches!(
            err.as_ref(),
            ExecutionError::Policy(policy::Error::Forbidden(..)),
        ));
    }

    #[tokio::test]
    async fn rejects_paid_payment() {
        let svc = fixture::service();
        let staff = fixture::user(&svc, Role::Staff).await;
        let (_, student) = fixture::student(&svc).await;
        let room = fixture::room(&svc, room::Status::Available).await;
        let contract = fixture::contract(
            &svc,
            &student,
            &room,
            Date::today().add_days(200),
            contract::Status::Active,
        )
        .await;
        let payment = fixture::payment(
            &svc,
            &contract,
            Date::today().add_days(3),
            payment::Status::Paid,
        )
        .await;

        let err = svc
            .execute(SendPaymentReminder {
                payment_id: payment.id,
                initiator_id: staff.id,
            })
            .await
            .unwrap_err();

        assert!(matches!(
            err.as_ref(),
            ExecutionError::PaymentNotPending(id) if *id == payment.id,
        ));
    }

    #[tokio::test]
    async fn rejects_unknown_payment() {
        let svc = fixture::service();
        let staff = fixture::user(&svc, Role::Staff).await;

        let err = svc
            .execute(SendPaymentReminder {
                payment_id: payment::Id::new(),
                initiator_id: staff.id,
            })
            .await
            .unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::PaymentNotExists(_)));
    }
}
