//! Domain definitions.

pub mod building;
pub mod contract;
pub mod payment;
pub mod room;
pub mod room_type;
pub mod student;
pub mod user;

pub use self::{
    building::Building, contract::Contract, payment::Payment, room::Room,
    room_type::RoomType, student::Student, user::User,
};
