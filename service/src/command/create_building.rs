//! [`Command`] for creating a new [`Building`].

use common::{
    operations::{By, Commit, Insert, Select, Transact, Transacted},
    DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{building, user, Building, User},
    infra::{database, Database},
    policy::{self, Action},
    Service,
};

use super::Command;

/// [`Command`] for creating a new [`Building`].
#[derive(Clone, Debug)]
pub struct CreateBuilding {
    /// Name of a new [`Building`].
    pub name: building::Name,

    /// Address of a new [`Building`].
    pub address: building::Address,

    /// Number of floors of a new [`Building`].
    pub num_floors: u16,

    /// Optional description of a new [`Building`].
    pub description: Option<building::Description>,

    /// ID of the [`User`] creating the [`Building`].
    pub initiator_id: user::Id,
}

impl<Db, Ntf> Command<CreateBuilding> for Service<Db, Ntf>
where
    Db: Database<
            Select<By<Option<User>, user::Id>>,
            Ok = Option<User>,
            Err = Traced<database::Error>,
        > + Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<Insert<Building>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Building;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: CreateBuilding,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CreateBuilding {
            name,
            address,
            num_floors,
            description,
            initiator_id,
        } = cmd;

        policy::authorize(
            self.database(),
            initiator_id,
            Action::ManageBuildings,
        )
        .await
        .map_err(tracerr::map_from_and_wrap!(=> E))
        .map(drop)?;

        if num_floors == 0 {
            return Err(tracerr::new!(E::NoFloors));
        }

        let building = Building {
            id: building::Id::new(),
            name,
            address,
            num_floors,
            description,
            created_at: DateTime::now().coerce(),
        };

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        tx.execute(Insert(building.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        Ok(building)
    }
}

/// Error of [`CreateBuilding`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Building`] must have at least one floor.
    #[display("`Building` must have at least one floor")]
    #[from(ignore)]
    NoFloors,

    /// Initiator is not allowed to manage [`Building`]s.
    #[display("Not authorized: {_0}")]
    #[from]
    Policy(policy::Error),
}

#[cfg(test)]
mod spec {
    use crate::{
        domain::{building, user::Role},
        fixture, policy, Command as _,
    };

    use super::{CreateBuilding, ExecutionError};

    fn cmd(initiator_id: crate::domain::user::Id) -> CreateBuilding {
        CreateBuilding {
            name: building::Name::new("Block B3").unwrap(),
            address: building::Address::new("1 Dai Co Viet").unwrap(),
            num_floors: 6,
            description: None,
            initiator_id,
        }
    }

    #[tokio::test]
    async fn creates_building() {
        let svc = fixture::service();
        let staff = fixture::user(&svc, Role::Staff).await;

        let building = svc.execute(cmd(staff.id)).await.unwrap();

        assert_eq!(building.name.as_ref(), "Block B3");
        assert_eq!(building.num_floors, 6);
    }

    #[tokio::test]
    async fn rejects_students_and_zero_floors() {
        let svc = fixture::service();
        let student = fixture::user(&svc, Role::Student).await;
        let staff = fixture::user(&svc, Role::Staff).await;

        let err = svc.execute(cmd(student.id)).await.unwrap_err();
        assert!(matches!(
            err.as_ref(),
            ExecutionError::Policy(policy::Error::Forbidden(..)),
        ));

        let err = svc
            .execute(CreateBuilding {
                num_floors: 0,
                ..cmd(staff.id)
            })
            .await
            .unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::NoFloors));
    }
}
