//! [`Log`] [`Notifier`] implementation.

use std::convert::Infallible;

use tracing as log;

use crate::{domain::payment, infra::Notifier};

/// [`Notifier`] recording [`payment::Reminder`]s into the log instead of
/// sending them anywhere.
///
/// A [`payment::Reminder`] is considered delivered if the student has an
/// email to deliver it to.
#[derive(Clone, Copy, Debug, Default)]
pub struct Log;

impl Notifier<payment::Reminder> for Log {
    type Ok = bool;
    type Err = Infallible;

    async fn execute(
        &self,
        reminder: payment::Reminder,
    ) -> Result<Self::Ok, Self::Err> {
        let payment::Reminder {
            payment_id,
            contract_number,
            student_name,
            email,
            amount,
            due_date,
        } = reminder;

        let Some(email) = email else {
            log::warn!(
                %payment_id,
                "no email to remind `{student_name}` about `{amount}` due \
                 {due_date} for `Contract({contract_number})`",
            );
            return Ok(false);
        };

        log::info!(
            %payment_id,
            %email,
            "reminded `{student_name}` about `{amount}` due {due_date} for \
             `Contract({contract_number})`",
        );
        Ok(true)
    }
}

#[cfg(test)]
mod spec {
    use common::{Date, Money};

    use crate::{
        domain::{contract, payment, student, user},
        infra::Notifier as _,
    };

    use super::Log;

    fn reminder(email: Option<&str>) -> payment::Reminder {
        payment::Reminder {
            payment_id: payment::Id::new(),
            contract_number: "CT20240901SV1"
                .parse::<contract::Number>()
                .unwrap(),
            student_name: "Nguyen Van A".parse::<student::FullName>().unwrap(),
            email: email.map(|e| e.parse::<user::Email>().unwrap()),
            amount: Money::vnd(1_000_000),
            due_date: Date::from_calendar(2024, 10, 5).unwrap(),
        }
    }

    #[tokio::test]
    async fn delivers_only_with_email() {
        assert!(Log.execute(reminder(Some("a@example.com"))).await.unwrap());
        assert!(!Log.execute(reminder(None)).await.unwrap());
    }
}
