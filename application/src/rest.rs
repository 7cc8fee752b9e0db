//! REST API handlers.

use axum::{
    extract::Path,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use service::{command, domain, Command as _};
use uuid::Uuid;

use crate::{AsError, Context, Error};

/// Name of the [`tracing::Span`] for the REST handlers.
const SPAN_NAME: &str = "REST request";

/// Books the specified `Room` for the authenticated student.
///
/// # Errors
///
/// Errors with the same codes as the `bookRoom` GraphQL mutation.
#[tracing::instrument(
    skip_all,
    fields(
        http.name = "bookRoom",
        otel.name = SPAN_NAME,
        room_id = %room_id,
    ),
)]
pub async fn book_room(
    ctx: Context,
    Path(room_id): Path<Uuid>,
) -> Result<Json<Contract>, Error> {
    let my_id = ctx.current_session().await?.user_id;

    ctx.service()
        .execute(command::BookRoom {
            room_id: room_id.into(),
            user_id: my_id.into(),
        })
        .await
        .map_err(AsError::into_error)
        .map(|c| Json(c.into()))
}

/// Reminds the student about the specified pending `Payment`.
///
/// # Errors
///
/// Errors with the same codes as the `sendPaymentReminder` GraphQL mutation.
#[tracing::instrument(
    skip_all,
    fields(
        http.name = "sendPaymentReminder",
        otel.name = SPAN_NAME,
        payment_id = %payment_id,
    ),
)]
pub async fn send_payment_reminder(
    ctx: Context,
    Path(payment_id): Path<Uuid>,
) -> Result<Json<Reminder>, Error> {
    let my_id = ctx.current_session().await?.user_id;

    ctx.service()
        .execute(command::SendPaymentReminder {
            payment_id: payment_id.into(),
            initiator_id: my_id.into(),
        })
        .await
        .map_err(AsError::into_error)
        .map(|r| Json(r.into()))
}

/// [`domain::Contract`] representation in REST responses.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Contract {
    /// ID of the [`domain::Contract`].
    pub id: Uuid,

    /// Human-readable number of the [`domain::Contract`].
    pub number: String,

    /// ID of the student renting the room.
    pub student_id: Uuid,

    /// ID of the rented room.
    pub room_id: Uuid,

    /// `YYYY-MM-DD` date the [`domain::Contract`] comes into effect.
    pub start_date: String,

    /// `YYYY-MM-DD` date the [`domain::Contract`] ends.
    pub end_date: String,

    /// Deposit paid for the [`domain::Contract`].
    pub deposit: String,

    /// Lifecycle status of the [`domain::Contract`].
    pub status: String,
}

impl From<domain::Contract> for Contract {
    fn from(contract: domain::Contract) -> Self {
        Self {
            id: contract.id.into(),
            number: contract.number.to_string(),
            student_id: contract.student_id.into(),
            room_id: contract.room_id.into(),
            start_date: contract.start_date.to_string(),
            end_date: contract.end_date.to_string(),
            deposit: contract.deposit.to_string(),
            status: contract.status.to_string(),
        }
    }
}

/// [`domain::payment::Reminder`] representation in REST responses.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Reminder {
    /// ID of the reminded payment.
    pub payment_id: Uuid,

    /// Number of the contract the payment is due for.
    pub contract_number: String,

    /// Full name of the reminded student.
    pub student_name: String,

    /// Email the reminder was delivered to.
    pub email: Option<String>,

    /// Amount to be paid.
    pub amount: String,

    /// `YYYY-MM-DD` date the payment is due at.
    pub due_date: String,
}

impl From<domain::payment::Reminder> for Reminder {
    fn from(reminder: domain::payment::Reminder) -> Self {
        Self {
            payment_id: reminder.payment_id.into(),
            contract_number: reminder.contract_number.to_string(),
            student_name: reminder.student_name.to_string(),
            email: reminder.email.as_ref().map(ToString::to_string),
            amount: reminder.amount.to_string(),
            due_date: reminder.due_date.to_string(),
        }
    }
}

/// Body of an [`Error`] REST response.
#[derive(Debug, Serialize)]
struct ErrorBody<'e> {
    /// [`Error`] code.
    code: &'e str,

    /// [`Error`] message.
    message: &'e str,
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            code: self.code,
            message: &self.message,
        };
        (self.status_code, Json(body)).into_response()
    }
}

#[cfg(test)]
mod spec {
    use axum::{body, response::IntoResponse as _};
    use common::{Date, Money};
    use service::domain::{contract, payment, room, student};
    use uuid::Uuid;

    use crate::Error;

    use super::{Contract, Reminder};

    #[tokio::test]
    async fn renders_error_with_status_and_code() {
        let response = Error {
            code: "ROOM_ALREADY_BOOKED",
            status_code: http::StatusCode::CONFLICT,
            message: "taken".to_owned(),
            backtrace: None,
        }
        .into_response();

        assert_eq!(response.status(), http::StatusCode::CONFLICT);
        let bytes = body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(
            std::str::from_utf8(&bytes).unwrap(),
            r#"{"code":"ROOM_ALREADY_BOOKED","message":"taken"}"#,
        );
    }

    #[test]
    fn renders_contract_fields_as_text() {
        let start = Date::from_calendar(2025, 9, 1).unwrap();
        let contract = Contract::from(service::domain::Contract {
            id: contract::Id::from(Uuid::nil()),
            number: "CT20250901SV001".parse().unwrap(),
            student_id: student::Id::from(Uuid::nil()),
            room_id: room::Id::from(Uuid::nil()),
            start_date: start,
            end_date: start.add_days(365),
            deposit: Money::vnd(1_000_000),
            status: contract::Status::Active,
            created_at: common::DateTime::now().coerce(),
        });

        assert_eq!(contract.number, "CT20250901SV001");
        assert_eq!(contract.start_date, "2025-09-01");
        assert_eq!(contract.end_date, "2026-09-01");
        assert_eq!(contract.status, "ACTIVE");
    }

    #[test]
    fn omits_missing_reminder_email() {
        let reminder = Reminder::from(payment::Reminder {
            payment_id: payment::Id::from(Uuid::nil()),
            contract_number: "CT20250901SV001".parse().unwrap(),
            student_name: "Nguyen Van A".parse().unwrap(),
            email: None,
            amount: Money::vnd(1_000_000),
            due_date: Date::from_calendar(2025, 10, 1).unwrap(),
        });

        assert_eq!(reminder.email, None);
        assert_eq!(reminder.due_date, "2025-10-01");
    }
}
