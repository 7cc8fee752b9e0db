//! [`Command`] for creating a new [`Payment`].

use common::{
    operations::{By, Commit, Insert, Select, Transact, Transacted},
    Date, DateTime, Money,
};
use derive_more::{Display, Error, From};
use rust_decimal::Decimal;
use tracerr::Traced;

use crate::{
    domain::{contract, payment, user, Contract, Payment, User},
    infra::{database, Database},
    policy::{self, Action},
    Service,
};

use super::Command;

/// [`Command`] for charging a new pending [`Payment`] for a [`Contract`].
#[derive(Clone, Copy, Debug)]
pub struct CreatePayment {
    /// ID of the [`Contract`] a new [`Payment`] is due for.
    pub contract_id: contract::Id,

    /// Amount to be paid.
    pub amount: Money,

    /// [`Date`] a new [`Payment`] is due at.
    pub due_date: Date,

    /// ID of the [`User`] creating the [`Payment`].
    pub initiator_id: user::Id,
}

impl<Db, Ntf> Command<CreatePayment> for Service<Db, Ntf>
where
    Db: Database<
            Select<By<Option<User>, user::Id>>,
            Ok = Option<User>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Contract>, contract::Id>>,
            Ok = Option<Contract>,
            Err = Traced<database::Error>,
        > + Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<Insert<Payment>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Payment;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: CreatePayment,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CreatePayment {
            contract_id,
            amount,
            due_date,
            initiator_id,
        } = cmd;

        policy::authorize(self.database(), initiator_id, Action::ManagePayments)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        if amount.amount < Decimal::ZERO {
            return Err(tracerr::new!(E::NegativeAmount(amount)));
        }

        self.database()
            .execute(Select(By::<Option<Contract>, _>::new(contract_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::ContractNotExists(contract_id))
            .map_err(tracerr::wrap!())
            .map(drop)?;

        let payment = Payment {
            id: payment::Id::new(),
            contract_id,
            amount,
            due_date,
            status: payment::Status::Pending,
            paid_at: None,
            created_at: DateTime::now().coerce(),
        };

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        tx.execute(Insert(payment.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        Ok(payment)
    }
}

/// Error of [`CreatePayment`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Contract`] doesn't exist.
    #[display("`Contract(id: {_0})` does not exist")]
    #[from(ignore)]
    ContractNotExists(#[error(not(source))] contract::Id),

    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// Amount is negative.
    #[display("`Payment` amount cannot be negative: {_0}")]
    #[from(ignore)]
    NegativeAmount(#[error(not(source))] Money),

    /// Initiator is not allowed to manage [`Payment`]s.
    #[display("Not authorized: {_0}")]
    #[from]
    Policy(policy::Error),
}

#[cfg(test)]
mod spec {
    use common::{Date, Money};

    use crate::{
        domain::{contract, payment, room, user::Role},
        fixture, Command as _,
    };

    use super::{CreatePayment, ExecutionError};

    #[tokio::test]
    async fn charges_pending_payment() {
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

        let payment = svc
            .execute(CreatePayment {
                contract_id: contract.id,
                amount: Money::vnd(1_200_000),
                due_date: Date::today().add_days(5),
                initiator_id: staff.id,
            })
            .await
            .unwrap();

        assert_eq!(payment.status, payment::Status::Pending);
        assert!(payment.paid_at.is_none());
    }

    #[tokio::test]
    async fn rejects_unknown_contract() {
        let svc = fixture::service();
        let staff = fixture::user(&svc, Role::Staff).await;

        let err = svc
            .execute(CreatePayment {
                contract_id: contract::Id::new(),
                amount: Money::vnd(1_200_000),
                due_date: Date::today(),
                initiator_id: staff.id,
            })
            .await
            .unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::ContractNotExists(_)));
    }
}
