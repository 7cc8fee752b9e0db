//! Authorization policy of [`User`] actions.

use common::operations::{By, Select};
use derive_more::{Display, Error as StdError, From};
use tracerr::Traced;

use crate::{
    domain::{
        user::{self, Role},
        User,
    },
    infra::{database, Database},
};

/// Action a [`User`] may be allowed to perform.
#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
pub enum Action {
    /// Booking a room for oneself.
    BookRoom,

    /// Creating, updating and deleting buildings and room types.
    ManageBuildings,

    /// Creating, updating and deleting rooms.
    ManageRooms,

    /// Creating, updating and deleting profiles of any students.
    ManageStudents,

    /// Creating one's own student profile.
    CompleteOwnProfile,

    /// Creating, terminating and deleting contracts of any students.
    ManageContracts,

    /// Creating and updating payments.
    ManagePayments,

    /// Sending reminders about pending payments.
    SendPaymentReminder,

    /// Viewing aggregated reports.
    ViewReports,

    /// Viewing payments of all students.
    ViewAllPayments,

    /// Viewing contracts of all students.
    ViewAllContracts,

    /// Creating staff and manager accounts.
    CreateStaffAccount,
}

/// Checks whether a [`User`] with the provided [`Role`] is allowed to perform
/// the provided [`Action`].
#[must_use]
pub const fn can_perform(action: Action, role: Role) -> bool {
    use Action as A;

    match action {
        A::BookRoom | A::CompleteOwnProfile => matches!(role, Role::Student),
        A::CreateStaffAccount => matches!(role, Role::Manager),
        A::ManageBuildings
        | A::ManageRooms
        | A::ManageStudents
        | A::ManageContracts
        | A::ManagePayments
        | A::SendPaymentReminder
        | A::ViewReports
        | A::ViewAllPayments
        | A::ViewAllContracts => matches!(role, Role::Staff | Role::Manager),
    }
}

/// Loads the [`User`] with the provided ID and ensures it's allowed to
/// perform the provided [`Action`].
///
/// # Errors
///
/// - [`Error::UserNotExists`] if there is no such [`User`].
/// - [`Error::Forbidden`] if the [`User`]'s [`Role`] disallows the [`Action`].
pub async fn authorize<Db>(
    database: &Db,
    user_id: user::Id,
    action: Action,
) -> Result<User, Traced<Error>>
where
    Db: Database<
        Select<By<Option<User>, user::Id>>,
        Ok = Option<User>,
        Err = Traced<database::Error>,
    >,
{
    let user = database
        .execute(Select(By::new(user_id)))
        .await
        .map_err(tracerr::map_from_and_wrap!(=> Error))?
        .ok_or(Error::UserNotExists(user_id))
        .map_err(tracerr::wrap!())?;

    if !can_perform(action, user.role) {
        return Err(tracerr::new!(Error::Forbidden(action, user.role)));
    }

    Ok(user)
}

/// Error of an [`authorize()`] check.
#[derive(Debug, Display, From, StdError)]
pub enum Error {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`User`] is not allowed to perform the [`Action`].
    #[display("`{_1}` is not allowed to perform `{_0}`")]
    #[from(ignore)]
    Forbidden(#[error(not(source))] Action, #[error(not(source))] Role),

    /// [`User`] with the provided ID does not exist.
    #[display("`User(id: {_0})` does not exist")]
    #[from(ignore)]
    UserNotExists(#[error(not(source))] user::Id),
}

#[cfg(test)]
mod spec {
    use crate::domain::user::Role;

    use super::{can_perform, Action};

    #[test]
    fn students_only_book_and_complete_profile() {
        for action in [Action::BookRoom, Action::CompleteOwnProfile] {
            assert!(can_perform(action, Role::Student), "{action}");
            assert!(!can_perform(action, Role::Staff), "{action}");
            assert!(!can_perform(action, Role::Manager), "{action}");
        }
    }

    #[test]
    fn only_managers_create_staff_accounts() {
        assert!(!can_perform(Action::CreateStaffAccount, Role::Student));
        assert!(!can_perform(Action::CreateStaffAccount, Role::Staff));
        assert!(can_perform(Action::CreateStaffAccount, Role::Manager));
    }

    #[test]
    fn staff_and_managers_administer_everything_else() {
        for action in [
            Action::ManageBuildings,
            Action::ManageRooms,
            Action::ManageStudents,
            Action::ManageContracts,
            Action::ManagePayments,
            Action::SendPaymentReminder,
            Action::ViewReports,
            Action::ViewAllPayments,
            Action::ViewAllContracts,
        ] {
            assert!(!can_perform(action, Role::Student), "{action}");
            assert!(can_perform(action, Role::Staff), "{action}");
            assert!(can_perform(action, Role::Manager), "{action}");
        }
    }
}
