//! GraphQL [`Mutation`]s definitions.

use common::{Date, Money};
use juniper::{graphql_object, Nullable};
use service::{command, domain, Command as _};

use crate::{api, define_error, AsError, Context, Error, Session};

/// Root of all GraphQL mutations.
#[derive(Clone, Copy, Debug)]
pub struct Mutation;

impl Mutation {
    /// Name of the [`tracing::Span`] for the mutations.
    const SPAN_NAME: &'static str = "GraphQL mutation";
}

#[graphql_object(context = Context)]
impl Mutation {
    /// Registers a new `STUDENT` `User` with the provided credentials and
    /// contact info, and starts a `UserSession` for it.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `LOGIN_OCCUPIED` - provided `UserLogin` is occupied by another `User`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "createUser",
            email = ?email,
            login = %login,
            name = %name,
            otel.name = Self::SPAN_NAME,
            phone = ?phone,
        ),
    )]
    pub async fn create_user(
        name: api::user::Name,
        login: api::user::Login,
        password: api::user::Password,
        email: Option<api::user::Email>,
        phone: Option<api::user::Phone>,
        ctx: &Context,
    ) -> Result<api::user::session::CreateResult, Error> {
        let user = ctx
            .service()
            .execute(command::CreateUser {
                name: name.into(),
                login: login.into(),
                password: secrecy::SecretBox::init_with(move || {
                    password.into()
                }),
                email: email.map(Into::into),
                phone: phone.map(Into::into),
                role: domain::user::Role::Student,
                initiator_id: None,
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())?;
        let output = ctx
            .service()
            .execute(command::CreateUserSession::ByUserId(user.id))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())?;

        ctx.set_current_session(Session {
            user_id: output.user.id.into(),
            token: output.token.clone(),
            expires_at: output.expires_at.coerce(),
        })
        .await;

        Ok(output.into())
    }

    /// Creates a new `User` of any `UserRole` on behalf of the authenticated
    /// manager.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `FORBIDDEN` - the current `User` is not a manager;
    /// - `LOGIN_OCCUPIED` - provided `UserLogin` is occupied by another `User`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "createStaffUser",
            email = ?email,
            login = %login,
            name = %name,
            otel.name = Self::SPAN_NAME,
            phone = ?phone,
            role = ?role,
        ),
    )]
    pub async fn create_staff_user(
        name: api::user::Name,
        login: api::user::Login,
        password: api::user::Password,
        email: Option<api::user::Email>,
        phone: Option<api::user::Phone>,
        role: api::user::Role,
        ctx: &Context,
    ) -> Result<api::User, Error> {
        let my_id = ctx.current_session().await?.user_id;

        ctx.service()
            .execute(command::CreateUser {
                name: name.into(),
                login: login.into(),
                password: secrecy::SecretBox::init_with(move || {
                    password.into()
                }),
                email: email.map(Into::into),
                phone: phone.map(Into::into),
                role: role.into(),
                initiator_id: Some(my_id.into()),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Creates a new `UserSession` with the provided credentials.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `WRONG_CREDENTIALS` - provided credentials does not match any `User`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "createUserSession",
            login = %login,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn create_user_session(
        login: api::user::Login,
        password: api::user::Password,
        ctx: &Context,
    ) -> Result<api::user::session::CreateResult, Error> {
        let output = ctx
            .service()
            .execute(command::CreateUserSession::ByCredentials {
                login: login.into(),
                password: secrecy::SecretBox::init_with(move || {
                    password.into()
                }),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())?;

        ctx.set_current_session(Session {
            user_id: output.user.id.into(),
            token: output.token.clone(),
            expires_at: output.expires_at.coerce(),
        })
        .await;

        Ok(output.into())
    }

    /// Creates a new `Building`.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `FORBIDDEN` - the current `User` is not a staff member;
    /// - `NO_FLOORS` - `numFloors` is zero.
    #[tracing::instrument(
        skip_all,
        fields(
            address = %address,
            gql.name = "createBuilding",
            name = %name,
            num_floors = num_floors,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn create_building(
        name: api::building::Name,
        address: api::building::Address,
        num_floors: i32,
        description: Option<api::building::Description>,
        ctx: &Context,
    ) -> Result<api::Building, Error> {
        let my_id = ctx.current_session().await?.user_id;
        let num_floors = api::unsigned(num_floors).map_err(ctx.error())?;

        ctx.service()
            .execute(command::CreateBuilding {
                name: name.into(),
                address: address.into(),
                num_floors,
                description: description.map(Into::into),
                initiator_id: my_id.into(),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Updates the provided fields of the specified `Building`.
    ///
    /// Passing `null` as `description` clears it.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `BUILDING_NOT_EXISTS` - the `Building` does not exist;
    /// - `FORBIDDEN` - the current `User` is not a staff member;
    /// - `NO_FLOORS` - `numFloors` is zero.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "updateBuilding",
            id = %id,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn update_building(
        id: api::building::Id,
        name: Option<api::building::Name>,
        address: Option<api::building::Address>,
        num_floors: Option<i32>,
        description: Nullable<api::building::Description>,
        ctx: &Context,
    ) -> Result<api::Building, Error> {
        let my_id = ctx.current_session().await?.user_id;
        let num_floors = num_floors
            .map(api::unsigned)
            .transpose()
            .map_err(ctx.error())?;

        ctx.service()
            .execute(command::UpdateBuilding {
                building_id: id.into(),
                name: name.map(Into::into),
                address: address.map(Into::into),
                num_floors,
                description: description
                    .explicit()
                    .map(|d| d.map(Into::into)),
                initiator_id: my_id.into(),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Deletes the specified `Building`.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `BUILDING_HAS_ROOMS` - the `Building` still has `Room`s;
    /// - `BUILDING_NOT_EXISTS` - the `Building` does not exist;
    /// - `FORBIDDEN` - the current `User` is not a staff member.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "deleteBuilding",
            id = %id,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn delete_building(
        id: api::building::Id,
        ctx: &Context,
    ) -> Result<api::Building, Error> {
        let my_id = ctx.current_session().await?.user_id;

        ctx.service()
            .execute(command::DeleteBuilding {
                building_id: id.into(),
                initiator_id: my_id.into(),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Creates a new `RoomType`.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `FORBIDDEN` - the current `User` is not a staff member;
    /// - `NEGATIVE_PRICE` - `monthlyPrice` is negative;
    /// - `NO_CAPACITY` - `capacity` is zero.
    #[tracing::instrument(
        skip_all,
        fields(
            capacity = capacity,
            gql.name = "createRoomType",
            monthly_price = %monthly_price,
            name = %name,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn create_room_type(
        name: api::room_type::Name,
        capacity: i32,
        monthly_price: Money,
        ctx: &Context,
    ) -> Result<api::RoomType, Error> {
        let my_id = ctx.current_session().await?.user_id;
        let capacity = api::unsigned(capacity).map_err(ctx.error())?;

        ctx.service()
            .execute(command::CreateRoomType {
                name: name.into(),
                capacity,
                monthly_price,
                initiator_id: my_id.into(),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Creates a new `Room` in the specified `Building`.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `BUILDING_NOT_EXISTS` - the `Building` does not exist;
    /// - `FLOOR_OUT_OF_RANGE` - the `Building` has no such floor;
    /// - `FORBIDDEN` - the current `User` is not a staff member;
    /// - `MANUAL_OCCUPATION` - `status` is `OCCUPIED`;
    /// - `ROOM_NUMBER_OCCUPIED` - the `Building` has a `Room` with the same
    ///                            number;
    /// - `ROOM_TYPE_NOT_EXISTS` - the `RoomType` does not exist.
    #[tracing::instrument(
        skip_all,
        fields(
            building_id = %building_id,
            floor = floor,
            gql.name = "createRoom",
            number = %number,
            otel.name = Self::SPAN_NAME,
            room_type_id = %room_type_id,
            status = ?status,
        ),
    )]
    pub async fn create_room(
        building_id: api::building::Id,
        room_type_id: api::room_type::Id,
        number: api::room::Number,
        floor: i32,
        status: Option<api::room::Status>,
        notes: Option<api::room::Notes>,
        ctx: &Context,
    ) -> Result<api::Room, Error> {
        let my_id = ctx.current_session().await?.user_id;
        let floor = api::unsigned(floor).map_err(ctx.error())?;

        ctx.service()
            .execute(command::CreateRoom {
                building_id: building_id.into(),
                room_type_id: room_type_id.into(),
                number: number.into(),
                floor,
                status: status
                    .map_or(domain::room::Status::Available, Into::into),
                notes: notes.map(Into::into),
                initiator_id: my_id.into(),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Updates the provided fields of the specified `Room`.
    ///
    /// Passing `null` as `notes` clears them.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `FLOOR_OUT_OF_RANGE` - the `Building` has no such floor;
    /// - `FORBIDDEN` - the current `User` is not a staff member;
    /// - `ROOM_HAS_ACTIVE_CONTRACT` - `status` is changed to or from
    ///                                `OCCUPIED` while the `Room` is rented;
    /// - `ROOM_NOT_EXISTS` - the `Room` does not exist;
    /// - `ROOM_NUMBER_OCCUPIED` - the `Building` has a `Room` with the same
    ///                            number;
    /// - `ROOM_TYPE_NOT_EXISTS` - the `RoomType` does not exist.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "updateRoom",
            id = %id,
            otel.name = Self::SPAN_NAME,
            status = ?status,
        ),
    )]
    pub async fn update_room(
        id: api::room::Id,
        number: Option<api::room::Number>,
        room_type_id: Option<api::room_type::Id>,
        floor: Option<i32>,
        status: Option<api::room::Status>,
        notes: Nullable<api::room::Notes>,
        ctx: &Context,
    ) -> Result<api::Room, Error> {
        let my_id = ctx.current_session().await?.user_id;
        let floor =
            floor.map(api::unsigned).transpose().map_err(ctx.error())?;

        ctx.service()
            .execute(command::UpdateRoom {
                room_id: id.into(),
                number: number.map(Into::into),
                room_type_id: room_type_id.map(Into::into),
                floor,
                status: status.map(Into::into),
                notes: notes.explicit().map(|n| n.map(Into::into)),
                initiator_id: my_id.into(),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Deletes the specified `Room`.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `FORBIDDEN` - the current `User` is not a staff member;
    /// - `ROOM_HAS_ACTIVE_CONTRACT` - the `Room` is rented;
    /// - `ROOM_NOT_EXISTS` - the `Room` does not exist.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "deleteRoom",
            id = %id,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn delete_room(
        id: api::room::Id,
        ctx: &Context,
    ) -> Result<api::Room, Error> {
        let my_id = ctx.current_session().await?.user_id;

        ctx.service()
            .execute(command::DeleteRoom {
                room_id: id.into(),
                initiator_id: my_id.into(),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Creates a `Student` profile for the specified `User`, or for the
    /// authenticated `User` if none is specified.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `FORBIDDEN` - the current `User` is a `Student` completing another
    ///                 `User`'s profile;
    /// - `STUDENT_NUMBER_OCCUPIED` - another `Student` has the same number;
    /// - `STUDENT_PROFILE_EXISTS` - the `User` already has a profile;
    /// - `USER_NOT_EXISTS` - the `User` does not exist;
    /// - `USER_NOT_STUDENT` - the `User` is not a `STUDENT`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "createStudent",
            number = %number,
            otel.name = Self::SPAN_NAME,
            user_id = ?user_id,
        ),
    )]
    pub async fn create_student(
        user_id: Option<api::user::Id>,
        number: api::student::Number,
        full_name: api::student::FullName,
        date_of_birth: Option<Date>,
        university: api::student::University,
        faculty: api::student::Faculty,
        course: api::student::Course,
        ctx: &Context,
    ) -> Result<api::Student, Error> {
        let my_id = ctx.current_session().await?.user_id;

        ctx.service()
            .execute(command::CreateStudent {
                user_id: user_id.unwrap_or(my_id).into(),
                number: number.into(),
                full_name: full_name.into(),
                date_of_birth,
                university: university.into(),
                faculty: faculty.into(),
                course: course.into(),
                initiator_id: my_id.into(),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Updates the provided fields of the specified `Student`.
    ///
    /// Passing `null` as `dateOfBirth` clears it.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `FORBIDDEN` - the current `User` is not a staff member;
    /// - `STUDENT_NOT_EXISTS` - the `Student` does not exist;
    /// - `STUDENT_NUMBER_OCCUPIED` - another `Student` has the same number.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "updateStudent",
            id = %id,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn update_student(
        id: api::student::Id,
        number: Option<api::student::Number>,
        full_name: Option<api::student::FullName>,
        date_of_birth: Nullable<Date>,
        university: Option<api::student::University>,
        faculty: Option<api::student::Faculty>,
        course: Option<api::student::Course>,
        ctx: &Context,
    ) -> Result<api::Student, Error> {
        let my_id = ctx.current_session().await?.user_id;

        ctx.service()
            .execute(command::UpdateStudent {
                student_id: id.into(),
                number: number.map(Into::into),
                full_name: full_name.map(Into::into),
                date_of_birth: date_of_birth.explicit(),
                university: university.map(Into::into),
                faculty: faculty.map(Into::into),
                course: course.map(Into::into),
                initiator_id: my_id.into(),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Deletes the specified `Student` profile.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `FORBIDDEN` - the current `User` is not a staff member;
    /// - `STUDENT_HAS_ACTIVE_CONTRACT` - the `Student` rents a `Room`;
    /// - `STUDENT_NOT_EXISTS` - the `Student` does not exist.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "deleteStudent",
            id = %id,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn delete_student(
        id: api::student::Id,
        ctx: &Context,
    ) -> Result<api::Student, Error> {
        let my_id = ctx.current_session().await?.user_id;

        ctx.service()
            .execute(command::DeleteStudent {
                student_id: id.into(),
                initiator_id: my_id.into(),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Books the specified `AVAILABLE` `Room` for the authenticated `Student`
    /// for a year, starting today.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `FORBIDDEN` - the current `User` is not a `STUDENT`;
    /// - `ROOM_ALREADY_BOOKED` - the `Room` has been booked concurrently;
    /// - `ROOM_NOT_EXISTS` - the `Room` does not exist or is not `AVAILABLE`;
    /// - `STUDENT_HAS_ACTIVE_CONTRACT` - the `Student` already rents a `Room`;
    /// - `STUDENT_PROFILE_NOT_EXISTS` - the current `User` has no `Student`
    ///                                  profile.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "bookRoom",
            otel.name = Self::SPAN_NAME,
            room_id = %room_id,
        ),
    )]
    pub async fn book_room(
        room_id: api::room::Id,
        ctx: &Context,
    ) -> Result<api::Contract, Error> {
        let my_id = ctx.current_session().await?.user_id;

        ctx.service()
            .execute(command::BookRoom {
                room_id: room_id.into(),
                user_id: my_id.into(),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Creates a new `ACTIVE` `Contract` of the specified `Room` by the
    /// specified `Student`.
    ///
    /// `deposit` defaults to the monthly price of the `Room`'s `RoomType`.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `FORBIDDEN` - the current `User` is not a staff member;
    /// - `INVALID_PERIOD` - `endDate` is not after `startDate`;
    /// - `ROOM_ALREADY_BOOKED` - the `Room` has been booked concurrently;
    /// - `ROOM_NOT_EXISTS` - the `Room` does not exist or is not `AVAILABLE`;
    /// - `STUDENT_HAS_ACTIVE_CONTRACT` - the `Student` already rents a `Room`;
    /// - `STUDENT_NOT_EXISTS` - the `Student` does not exist.
    #[tracing::instrument(
        skip_all,
        fields(
            end_date = %end_date,
            gql.name = "createContract",
            otel.name = Self::SPAN_NAME,
            room_id = %room_id,
            start_date = %start_date,
            student_id = %student_id,
        ),
    )]
    pub async fn create_contract(
        student_id: api::student::Id,
        room_id: api::room::Id,
        start_date: Date,
        end_date: Date,
        deposit: Option<Money>,
        ctx: &Context,
    ) -> Result<api::Contract, Error> {
        let my_id = ctx.current_session().await?.user_id;

        ctx.service()
            .execute(command::CreateContract {
                student_id: student_id.into(),
                room_id: room_id.into(),
                start_date,
                end_date,
                deposit,
                initiator_id: my_id.into(),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Terminates the specified `ACTIVE` `Contract`, freeing its `Room`.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `CONTRACT_NOT_ACTIVE` - the `Contract` is not `ACTIVE`;
    /// - `CONTRACT_NOT_EXISTS` - the `Contract` does not exist;
    /// - `FORBIDDEN` - the current `User` is not a staff member.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "terminateContract",
            id = %id,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn terminate_contract(
        id: api::contract::Id,
        ctx: &Context,
    ) -> Result<api::Contract, Error> {
        let my_id = ctx.current_session().await?.user_id;

        ctx.service()
            .execute(command::TerminateContract {
                contract_id: id.into(),
                initiator_id: my_id.into(),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Deletes the specified `Contract` along with its `Payment`s, freeing
    /// its `Room` if the `Contract` is `ACTIVE`.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `CONTRACT_NOT_EXISTS` - the `Contract` does not exist;
    /// - `FORBIDDEN` - the current `User` is not a staff member.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "deleteContract",
            id = %id,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn delete_contract(
        id: api::contract::Id,
        ctx: &Context,
    ) -> Result<api::Contract, Error> {
        let my_id = ctx.current_session().await?.user_id;

        ctx.service()
            .execute(command::DeleteContract {
                contract_id: id.into(),
                initiator_id: my_id.into(),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Creates a new `PENDING` `Payment` for the specified `Contract`.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `CONTRACT_NOT_EXISTS` - the `Contract` does not exist;
    /// - `FORBIDDEN` - the current `User` is not a staff member;
    /// - `NEGATIVE_AMOUNT` - `amount` is negative.
    #[tracing::instrument(
        skip_all,
        fields(
            amount = %amount,
            contract_id = %contract_id,
            due_date = %due_date,
            gql.name = "createPayment",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn create_payment(
        contract_id: api::contract::Id,
        amount: Money,
        due_date: Date,
        ctx: &Context,
    ) -> Result<api::Payment, Error> {
        let my_id = ctx.current_session().await?.user_id;

        ctx.service()
            .execute(command::CreatePayment {
                contract_id: contract_id.into(),
                amount,
                due_date,
                initiator_id: my_id.into(),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Updates the provided fields of the specified `Payment`.
    ///
    /// Marking a `Payment` as `PAID` records when it was paid.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `FORBIDDEN` - the current `User` is not a staff member;
    /// - `NEGATIVE_AMOUNT` - `amount` is negative;
    /// - `PAYMENT_NOT_EXISTS` - the `Payment` does not exist.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "updatePayment",
            id = %id,
            otel.name = Self::SPAN_NAME,
            status = ?status,
        ),
    )]
    pub async fn update_payment(
        id: api::payment::Id,
        amount: Option<Money>,
        due_date: Option<Date>,
        status: Option<api::payment::Status>,
        ctx: &Context,
    ) -> Result<api::Payment, Error> {
        let my_id = ctx.current_session().await?.user_id;

        ctx.service()
            .execute(command::UpdatePayment {
                payment_id: id.into(),
                amount,
                due_date,
                status: status.map(Into::into),
                initiator_id: my_id.into(),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Reminds the `Student` about the specified `PENDING` `Payment`.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `FORBIDDEN` - the current `User` is not a staff member;
    /// - `PAYMENT_NOT_EXISTS` - the `Payment` does not exist;
    /// - `PAYMENT_NOT_PENDING` - the `Payment` is already paid;
    /// - `REMINDER_NOT_SENT` - the reminder could not be delivered.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "sendPaymentReminder",
            id = %id,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn send_payment_reminder(
        id: api::payment::Id,
        ctx: &Context,
    ) -> Result<api::payment::Reminder, Error> {
        let my_id = ctx.current_session().await?.user_id;

        ctx.service()
            .execute(command::SendPaymentReminder {
                payment_id: id.into(),
                initiator_id: my_id.into(),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }
}

/// Builds the [`Error`] of a `Student` already renting the provided `Room`.
fn active_contract_conflict(
    room: &command::book_room::ActiveContractRoom,
) -> Error {
    let number = room
        .number
        .as_ref()
        .map(|n| format!(" `{n}`"))
        .unwrap_or_default();
    Error {
        code: "STUDENT_HAS_ACTIVE_CONTRACT",
        status_code: http::StatusCode::CONFLICT,
        message: format!(
            "`Student` already has an active `Contract` for `Room`{number} \
             (id: {})",
            room.id,
        ),
        backtrace: None,
    }
}

define_error! {
    enum RentError {
        #[code = "ROOM_ALREADY_BOOKED"]
        #[status = CONFLICT]
        #[message = "`Room` has been booked by someone else"]
        RoomAlreadyBooked,

        #[code = "ROOM_NOT_EXISTS"]
        #[status = NOT_FOUND]
        #[message = "`Room` with the provided ID does not exist or is not \
                     available"]
        RoomNotAvailable,
    }
}

impl AsError for command::create_user::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "LOGIN_OCCUPIED"]
                #[status = CONFLICT]
                #[message = "`UserLogin` is occupied by another `User`"]
                LoginOccupied,
            }
        }

        match self {
            Self::Db(e) => e.try_as_error(),
            Self::LoginOccupied(_) => Some(Error::LoginOccupied.into()),
            Self::PasswordHash(_) => None,
            Self::Policy(e) => e.try_as_error(),
            Self::StaffSelfRegistration => {
                Some(api::PrivilegeError::Forbidden.into())
            }
        }
    }
}

impl AsError for command::create_user_session::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "WRONG_CREDENTIALS"]
                #[status = FORBIDDEN]
                #[message = "Provided credentials does not match any `User`"]
                WrongCredentials,
            }
        }

        match self {
            Self::Db(e) => e.try_as_error(),
            Self::JsonWebTokenEncodeError(_) => None,
            Self::UserNotExists(_) | Self::WrongCredentials => {
                Some(Error::WrongCredentials.into())
            }
        }
    }
}

define_error! {
    enum BuildingError {
        #[code = "NO_FLOORS"]
        #[status = BAD_REQUEST]
        #[message = "`Building` must have at least one floor"]
        NoFloors,
    }
}

impl AsError for command::create_building::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::NoFloors => Some(BuildingError::NoFloors.into()),
            Self::Policy(e) => e.try_as_error(),
        }
    }
}

impl AsError for command::update_building::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::BuildingNotExists(_) => {
                Some(api::query::BuildingError::NotExists.into())
            }
            Self::Db(e) => e.try_as_error(),
            Self::NoFloors => Some(BuildingError::NoFloors.into()),
            Self::Policy(e) => e.try_as_error(),
        }
    }
}

impl AsError for command::delete_building::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "BUILDING_HAS_ROOMS"]
                #[status = CONFLICT]
                #[message = "`Building` still has `Room`s"]
                HasRooms,
            }
        }

        match self {
            Self::BuildingHasRooms(..) => Some(Error::HasRooms.into()),
            Self::BuildingNotExists(_) => {
                Some(api::query::BuildingError::NotExists.into())
            }
            Self::Db(e) => e.try_as_error(),
            Self::Policy(e) => e.try_as_error(),
        }
    }
}

impl AsError for command::create_room_type::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "NEGATIVE_PRICE"]
                #[status = BAD_REQUEST]
                #[message = "Monthly price cannot be negative"]
                NegativePrice,

                #[code = "NO_CAPACITY"]
                #[status = BAD_REQUEST]
                #[message = "`RoomType` must fit at least one `Student`"]
                NoCapacity,
            }
        }

        match self {
            Self::Db(e) => e.try_as_error(),
            Self::NegativePrice(_) => Some(Error::NegativePrice.into()),
            Self::NoCapacity => Some(Error::NoCapacity.into()),
            Self::Policy(e) => e.try_as_error(),
        }
    }
}

define_error! {
    enum RoomError {
        #[code = "FLOOR_OUT_OF_RANGE"]
        #[status = BAD_REQUEST]
        #[message = "`Building` has no such floor"]
        FloorOutOfRange,

        #[code = "ROOM_NUMBER_OCCUPIED"]
        #[status = CONFLICT]
        #[message = "`Building` already has a `Room` with the same number"]
        NumberOccupied,

        #[code = "ROOM_HAS_ACTIVE_CONTRACT"]
        #[status = CONFLICT]
        #[message = "`Room` is rented by an active `Contract`"]
        HasActiveContract,
    }
}

impl AsError for command::create_room::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "MANUAL_OCCUPATION"]
                #[status = BAD_REQUEST]
                #[message = "`Room` cannot be occupied without a `Contract`"]
                ManualOccupation,
            }
        }

        match self {
            Self::BuildingNotExists(_) => {
                Some(api::query::BuildingError::NotExists.into())
            }
            Self::Db(e) => e.try_as_error(),
            Self::FloorOutOfRange { .. } => {
                Some(RoomError::FloorOutOfRange.into())
            }
            Self::ManualOccupation => Some(Error::ManualOccupation.into()),
            Self::NumberOccupied(_) => Some(RoomError::NumberOccupied.into()),
            Self::Policy(e) => e.try_as_error(),
            Self::RoomTypeNotExists(_) => {
                Some(api::query::RoomTypeError::NotExists.into())
            }
        }
    }
}

impl AsError for command::update_room::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::BuildingNotExists(_) => {
                Some(api::query::BuildingError::NotExists.into())
            }
            Self::Db(e) => e.try_as_error(),
            Self::FloorOutOfRange { .. } => {
                Some(RoomError::FloorOutOfRange.into())
            }
            Self::NumberOccupied(_) => Some(RoomError::NumberOccupied.into()),
            Self::Policy(e) => e.try_as_error(),
            Self::RoomHasActiveContract(_) => {
                Some(RoomError::HasActiveContract.into())
            }
            Self::RoomNotExists(_) => {
                Some(api::query::RoomError::NotExists.into())
            }
            Self::RoomTypeNotExists(_) => {
                Some(api::query::RoomTypeError::NotExists.into())
            }
        }
    }
}

impl AsError for command::delete_room::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::Policy(e) => e.try_as_error(),
            Self::RoomHasActiveContract(..) => {
                Some(RoomError::HasActiveContract.into())
            }
            Self::RoomNotExists(_) => {
                Some(api::query::RoomError::NotExists.into())
            }
        }
    }
}

define_error! {
    enum StudentError {
        #[code = "STUDENT_NUMBER_OCCUPIED"]
        #[status = CONFLICT]
        #[message = "Another `Student` has the same number"]
        NumberOccupied,

        #[code = "STUDENT_HAS_ACTIVE_CONTRACT"]
        #[status = CONFLICT]
        #[message = "`Student` rents a `Room` by an active `Contract`"]
        HasActiveContract,
    }
}

impl AsError for command::create_student::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "STUDENT_PROFILE_EXISTS"]
                #[status = CONFLICT]
                #[message = "`User` already has a `Student` profile"]
                ProfileExists,

                #[code = "USER_NOT_STUDENT"]
                #[status = CONFLICT]
                #[message = "`Student` profile can be created for a \
                             `STUDENT` `User` only"]
                UserNotStudent,
            }
        }

        match self {
            Self::Db(e) => e.try_as_error(),
            Self::NumberOccupied(_) => {
                Some(StudentError::NumberOccupied.into())
            }
            Self::Policy(e) => e.try_as_error(),
            Self::ProfileExists(_) => Some(Error::ProfileExists.into()),
            Self::UserNotExists(_) => {
                Some(api::query::UserError::NotExists.into())
            }
            Self::UserNotStudent(..) => Some(Error::UserNotStudent.into()),
        }
    }
}

impl AsError for command::update_student::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::NumberOccupied(_) => {
                Some(StudentError::NumberOccupied.into())
            }
            Self::Policy(e) => e.try_as_error(),
            Self::StudentNotExists(_) => {
                Some(api::query::StudentError::NotExists.into())
            }
        }
    }
}

impl AsError for command::delete_student::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::Policy(e) => e.try_as_error(),
            Self::StudentHasActiveContract(..) => {
                Some(StudentError::HasActiveContract.into())
            }
            Self::StudentNotExists(_) => {
                Some(api::query::StudentError::NotExists.into())
            }
        }
    }
}

impl AsError for command::book_room::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::Policy(e) => e.try_as_error(),
            Self::RoomAlreadyBooked(_) => {
                Some(RentError::RoomAlreadyBooked.into())
            }
            Self::RoomNotExists(_) => Some(RentError::RoomNotAvailable.into()),
            Self::RoomTypeNotExists(_) => {
                Some(api::query::RoomTypeError::NotExists.into())
            }
            Self::StudentHasActiveContract(room) => {
                Some(active_contract_conflict(room))
            }
            Self::StudentNotExists(_) => {
                Some(api::query::StudentError::NoProfile.into())
            }
        }
    }
}

impl AsError for command::create_contract::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "INVALID_PERIOD"]
                #[status = BAD_REQUEST]
                #[message = "`Contract` must end after it starts"]
                InvalidPeriod,
            }
        }

        match self {
            Self::Db(e) => e.try_as_error(),
            Self::InvalidPeriod { .. } => Some(Error::InvalidPeriod.into()),
            Self::Policy(e) => e.try_as_error(),
            Self::RoomAlreadyBooked(_) => {
                Some(RentError::RoomAlreadyBooked.into())
            }
            Self::RoomNotExists(_) => Some(RentError::RoomNotAvailable.into()),
            Self::RoomTypeNotExists(_) => {
                Some(api::query::RoomTypeError::NotExists.into())
            }
            Self::StudentHasActiveContract(room) => {
                Some(active_contract_conflict(room))
            }
            Self::StudentNotExists(_) => {
                Some(api::query::StudentError::NotExists.into())
            }
        }
    }
}

impl AsError for command::terminate_contract::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "CONTRACT_NOT_ACTIVE"]
                #[status = CONFLICT]
                #[message = "`Contract` is not active"]
                NotActive,
            }
        }

        match self {
            Self::ContractNotActive(..) => Some(Error::NotActive.into()),
            Self::ContractNotExists(_) => {
                Some(api::query::ContractError::NotExists.into())
            }
            Self::Db(e) => e.try_as_error(),
            Self::Policy(e) => e.try_as_error(),
        }
    }
}

impl AsError for command::delete_contract::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::ContractNotExists(_) => {
                Some(api::query::ContractError::NotExists.into())
            }
            Self::Db(e) => e.try_as_error(),
            Self::Policy(e) => e.try_as_error(),
        }
    }
}

define_error! {
    enum PaymentError {
        #[code = "NEGATIVE_AMOUNT"]
        #[status = BAD_REQUEST]
        #[message = "`Payment` amount cannot be negative"]
        NegativeAmount,
    }
}

impl AsError for command::create_payment::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::ContractNotExists(_) => {
                Some(api::query::ContractError::NotExists.into())
            }
            Self::Db(e) => e.try_as_error(),
            Self::NegativeAmount(_) => {
                Some(PaymentError::NegativeAmount.into())
            }
            Self::Policy(e) => e.try_as_error(),
        }
    }
}

impl AsError for command::update_payment::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::NegativeAmount(_) => {
                Some(PaymentError::NegativeAmount.into())
            }
            Self::PaymentNotExists(_) => {
                Some(api::query::PaymentError::NotExists.into())
            }
            Self::Policy(e) => e.try_as_error(),
        }
    }
}

impl AsError for command::send_payment_reminder::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "PAYMENT_NOT_PENDING"]
                #[status = CONFLICT]
                #[message = "`Payment` is already paid"]
                NotPending,

                #[code = "REMINDER_NOT_SENT"]
                #[status = BAD_GATEWAY]
                #[message = "Reminder about the `Payment` was not delivered"]
                NotSent,
            }
        }

        match self {
            Self::Db(e) => e.try_as_error(),
            Self::PaymentNotExists(_) => {
                Some(api::query::PaymentError::NotExists.into())
            }
            Self::PaymentNotPending(_) => Some(Error::NotPending.into()),
            Self::Policy(e) => e.try_as_error(),
            Self::ReminderNotSent(_) => Some(Error::NotSent.into()),
        }
    }
}
