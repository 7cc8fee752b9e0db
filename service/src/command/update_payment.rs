//! [`Command`] for updating a [`Payment`].

use common::{
    operations::{By, Commit, Lock, Select, Transact, Transacted, Update},
    Date, DateTime, Money,
};
use derive_more::{Display, Error, From};
use rust_decimal::Decimal;
use tracerr::Traced;

use crate::{
    domain::{payment, user, Payment, User},
    infra::{database, Database},
    policy::{self, Action},
    Service,
};

use super::Command;

/// [`Command`] for updating a [`Payment`].
///
/// Marking a [`Payment`] as [`payment::Status::Paid`] records when it was
/// settled. [`None`] fields are left untouched.
#[derive(Clone, Copy, Debug)]
pub struct UpdatePayment {
    /// ID of the [`Payment`] to be updated.
    pub payment_id: payment::Id,

    /// New amount of the [`Payment`].
    pub amount: Option<Money>,

    /// New due [`Date`] of the [`Payment`].
    pub due_date: Option<Date>,

    /// New [`payment::Status`] of the [`Payment`].
    pub status: Option<payment::Status>,

    /// ID of the [`User`] updating the [`Payment`].
    pub initiator_id: user::Id,
}

impl<Db, Ntf> Command<UpdatePayment> for Service<Db, Ntf>
where
    Db: Database<
            Select<By<Option<User>, user::Id>>,
            Ok = Option<User>,
            Err = Traced<database::Error>,
        > + Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Lock<By<Payment, payment::Id>>,
            Ok = (),
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Payment>, payment::Id>>,
            Ok = Option<Payment>,
            Err = Traced<database::Error>,
        > + Database<Update<Payment>, Ok = (), Err = Traced<database::Error>>
        + Database<Commit, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = Payment;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: UpdatePayment,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let UpdatePayment {
            payment_id,
            amount,
            due_date,
            status,
            initiator_id,
        } = cmd;

        policy::authorize(self.database(), initiator_id, Action::ManagePayments)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        if let Some(amount) = amount.filter(|a| a.amount < Decimal::ZERO) {
            return Err(tracerr::new!(E::NegativeAmount(amount)));
        }

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        tx.execute(Lock(By::<Payment, _>::new(payment_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        let mut payment = tx
            .execute(Select(By::<Option<Payment>, _>::new(payment_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::PaymentNotExists(payment_id))
            .map_err(tracerr::wrap!())?;

        if let Some(amount) = amount {
            payment.amount = amount;
        }
        if let Some(due_date) = due_date {
            payment.due_date = due_date;
        }
        if let Some(status) = status.filter(|s| *s != payment.status) {
            payment.status = status;
            payment.paid_at = match status {
                payment::Status::Paid => Some(DateTime::now().coerce()),
                payment::Status::Pending => None,
            };
        }

        tx.execute(Update(payment.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        Ok(payment)
    }
}

/// Error of [`UpdatePayment`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// Amount is negative.
    #[display("`Payment` amount cannot be negative: {_0}")]
    #[from(ignore)]
    NegativeAmount(#[error(not(source))] Money),

    /// [`Payment`] doesn't exist.
    #[display("`Payment(id: {_0})` does not exist")]
    #[from(ignore)]
    PaymentNotExists(#[error(not(source))] payment::Id),

    /// Initiator is not allowed to manage [`Payment`]s.
    #[display("Not authorized: {_0}")]
    #[from]
    Policy(policy::Error),
}

#[cfg(test)]
mod spec {
    use common::Date;

    use crate::{
        domain::{contract, payment, room, user::Role},
        fixture, Command as _,
    };

    use super::UpdatePayment;

    #[tokio::test]
    async fn records_settlement_time() {
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
        let origin = fixture::payment(
            &svc,
            &contract,
            Date::today(),
            payment::Status::Pending,
        )
        .await;

        let paid = svc
            .execute(UpdatePayment {
                payment_id: origin.id,
                amount: None,
                due_date: None,
                status: Some(payment::Status::Paid),
                initiator_id: staff.id,
            })
            .await
            .unwrap();
        assert_eq!(paid.status, payment::Status::Paid);
        assert!(paid.paid_at.is_some());
        assert_eq!(paid.amount, origin.amount);

        let reopened = svc
            .execute(UpdatePayment {
                payment_id: origin.id,
                amount: None,
                due_date: None,
                status: Some(payment::Status::Pending),
                initiator_id: staff.id,
            })
            .await
            .unwrap();
        assert!(reopened.paid_at.is_none());
    }
}
