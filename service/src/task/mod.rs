//! Background [`Task`]s definitions.

mod background;
pub mod expire_contracts;

pub use common::Handler as Task;

pub use self::{
    background::{Background, Failure},
    expire_contracts::ExpireContracts,
};
