//! Fixtures populating the [`Memory`] database for tests.

use std::{sync::LazyLock, time::Duration};

use common::{
    operations::{By, Insert, Select},
    Date, DateTime, Money,
};
use uuid::Uuid;

use crate::{
    domain::{
        building, contract, payment, room, room_type, student, user, Building,
        Contract, Payment, Room, RoomType, Student, User,
    },
    infra::{notifier, Database as _, Memory},
    task, Config, Service,
};

/// [`Service`] used in tests.
pub(crate) type TestService = Service<Memory, notifier::Log>;

/// Password of every [`User`] created by [`user()`].
pub(crate) const PASSWORD: &str = "secret-pass";

/// Creates a new [`TestService`] over an empty [`Memory`] database, without
/// any background tasks running.
pub(crate) fn service() -> TestService {
    let secret = b"test-secret";
    Service {
        config: Config {
            jwt_encoding_key: jsonwebtoken::EncodingKey::from_secret(secret),
            jwt_decoding_key: jsonwebtoken::DecodingKey::from_secret(secret),
            expire_contracts: task::expire_contracts::Config {
                interval: Duration::from_secs(60),
            },
        },
        database: Memory::new(),
        notifier: notifier::Log,
    }
}

/// Returns a unique suffix for the values required to be unique.
fn unique() -> String {
    Uuid::new_v4().simple().to_string()[..8].to_owned()
}

/// Inserts a new [`User`] with the provided [`user::Role`].
pub(crate) async fn user(svc: &TestService, role: user::Role) -> User {
    static HASH: LazyLock<user::PasswordHash> = LazyLock::new(|| {
        user::PasswordHash::new(&user::Password::new(PASSWORD).unwrap())
            .unwrap()
    });

    let user = User {
        id: user::Id::new(),
        name: user::Name::new("Tran Thi B").unwrap(),
        login: user::Login::new(format!("u{}", unique())).unwrap(),
        password_hash: HASH.clone(),
        email: Some(user::Email::new("b@example.com").unwrap()),
        phone: None,
        role,
        created_at: DateTime::now().coerce(),
    };
    svc.database().execute(Insert(user.clone())).await.unwrap();
    user
}

/// Inserts a new [`Student`] along with its [`User`].
pub(crate) async fn student(svc: &TestService) -> (User, Student) {
    let user = user(svc, user::Role::Student).await;
    let student = Student {
        id: student::Id::new(),
        user_id: user.id,
        number: student::Number::new(format!("SV{}", unique())).unwrap(),
        full_name: student::FullName::new("Tran Thi B").unwrap(),
        date_of_birth: None,
        university: student::University::new("HUST").unwrap(),
        faculty: student::Faculty::new("Computer Science").unwrap(),
        course: student::Course::new("K65").unwrap(),
    };
    svc.database().execute(Insert(student.clone())).await.unwrap();
    (user, student)
}

/// Inserts a new [`Building`] with 5 floors.
pub(crate) async fn building(svc: &TestService) -> Building {
    let building = Building {
        id: building::Id::new(),
        name: building::Name::new(format!("Block {}", unique())).unwrap(),
        address: building::Address::new("1 Dai Co Viet").unwrap(),
        num_floors: 5,
        description: None,
        created_at: DateTime::now().coerce(),
    };
    svc.database().execute(Insert(building.clone())).await.unwrap();
    building
}

/// Inserts a new [`RoomType`] with the provided monthly price in VND.
pub(crate) async fn room_type(svc: &TestService, price: i64) -> RoomType {
    let room_type = RoomType {
        id: room_type::Id::new(),
        name: room_type::Name::new(format!("Type {}", unique())).unwrap(),
        capacity: 4,
        monthly_price: Money::vnd(price),
    };
    svc.database()
        .execute(Insert(room_type.clone()))
        .await
        .unwrap();
    room_type
}

/// Inserts a new [`Room`] with the provided [`room::Status`] into a new
/// [`Building`], with a new [`RoomType`] costing 1,000,000 VND monthly.
pub(crate) async fn room(svc: &TestService, status: room::Status) -> Room {
    let building = building(svc).await;
    let room_type = room_type(svc, 1_000_000).await;
    room_in(svc, &building, &room_type, status).await
}

/// Inserts a new [`Room`] with the provided [`room::Status`] into the
/// provided [`Building`].
pub(crate) async fn room_in(
    svc: &TestService,
    building: &Building,
    room_type: &RoomType,
    status: room::Status,
) -> Room {
    let room = Room {
        id: room::Id::new(),
        building_id: building.id,
        number: room::Number::new(format!("R{}", unique())).unwrap(),
        room_type_id: room_type.id,
        floor: 1,
        status,
        notes: None,
        created_at: DateTime::now().coerce(),
    };
    svc.database().execute(Insert(room.clone())).await.unwrap();
    room
}

/// Inserts a new [`Contract`] with the provided [`contract::Status`]
/// assigning the [`Room`] to the [`Student`], and occupies the [`Room`] if
/// the [`Contract`] is active.
pub(crate) async fn contract(
    svc: &TestService,
    student: &Student,
    room: &Room,
    end_date: Date,
    status: contract::Status,
) -> Contract {
    let start_date = Date::from_calendar(2024, 9, 1).unwrap();
    let contract = Contract {
        id: contract::Id::new(),
        number: contract::Number::generate(start_date, &student.number),
        student_id: student.id,
        room_id: room.id,
        start_date,
        end_date,
        deposit: Money::vnd(1_000_000),
        status,
        created_at: DateTime::now().coerce(),
    };
    svc.database()
        .execute(Insert(contract.clone()))
        .await
        .unwrap();
    if contract.is_active() {
        svc.database()
            .execute(Insert(Room {
                status: room::Status::Occupied,
                ..room.clone()
            }))
            .await
            .unwrap();
    }
    contract
}

/// Inserts a new [`Payment`] for the [`Contract`].
pub(crate) async fn payment(
    svc: &TestService,
    contract: &Contract,
    due_date: Date,
    status: payment::Status,
) -> Payment {
    let payment = Payment {
        id: payment::Id::new(),
        contract_id: contract.id,
        amount: Money::vnd(1_000_000),
        due_date,
        status,
        paid_at: (status == payment::Status::Paid)
            .then(|| DateTime::now().coerce()),
        created_at: DateTime::now().coerce(),
    };
    svc.database().execute(Insert(payment.clone())).await.unwrap();
    payment
}

/// Reads the current state of the [`Room`] with the provided ID.
pub(crate) async fn reload_room(svc: &TestService, id: room::Id) -> Room {
    svc.database()
        .execute(Select(By::<Option<Room>, _>::new(id)))
        .await
        .unwrap()
        .unwrap()
}

/// Reads the current state of the [`Contract`] with the provided ID.
pub(crate) async fn reload_contract(
    svc: &TestService,
    id: contract::Id,
) -> Option<Contract> {
    svc.database()
        .execute(Select(By::<Option<Contract>, _>::new(id)))
        .await
        .unwrap()
}
