//! [`Command`] definition.

pub mod authorize_user_session;
pub mod book_room;
pub mod create_building;
pub mod create_contract;
pub mod create_payment;
pub mod create_room;
pub mod create_room_type;
pub mod create_student;
pub mod create_user;
pub mod create_user_session;
pub mod delete_building;
pub mod delete_contract;
pub mod delete_room;
pub mod delete_student;
pub mod send_payment_reminder;
pub mod terminate_contract;
pub mod update_building;
pub mod update_payment;
pub mod update_room;
pub mod update_student;

/// [`Command`] of the [`Service`].
///
/// [`Service`]: crate::Service
pub use common::Handler as Command;

pub use self::{
    authorize_user_session::AuthorizeUserSession, book_room::BookRoom,
    create_building::CreateBuilding, create_contract::CreateContract,
    create_payment::CreatePayment, create_room::CreateRoom,
    create_room_type::CreateRoomType, create_student::CreateStudent,
    create_user::CreateUser, create_user_session::CreateUserSession,
    delete_building::DeleteBuilding, delete_contract::DeleteContract,
    delete_room::DeleteRoom, delete_student::DeleteStudent,
    send_payment_reminder::SendPaymentReminder,
    terminate_contract::TerminateContract, update_building::UpdateBuilding,
    update_payment::UpdatePayment, update_room::UpdateRoom,
    update_student::UpdateStudent,
};
