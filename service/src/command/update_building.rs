//! [`Command`] for updating a [`Building`].

use common::operations::{
    By, Commit, Lock, Select, Transact, Transacted, Update,
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

/// [`Command`] for updating a [`Building`].
///
/// [`None`] fields are left untouched.
#[derive(Clone, Debug)]
pub struct UpdateBuilding {
    /// ID of the [`Building`] to be updated.
    pub building_id: building::Id,

    /// New name of the [`Building`].
    pub name: Option<building::Name>,

    /// New address of the [`Building`].
    pub address: Option<building::Address>,

    /// New number of floors of the [`Building`].
    pub num_floors: Option<u16>,

    /// New description of the [`Building`], [`Some`]`(`[`None`]`)` removes
    /// it.
    pub description: Option<Option<building::Description>>,

    /// ID of the [`User`] updating the [`Building`].
    pub initiator_id: user::Id,
}

impl<Db, Ntf> Command<UpdateBuilding> for Service<Db, Ntf>
where
    Db: Database<
            Select<By<Option<User>, user::Id>>,
            Ok = Option<User>,
            Err = Traced<database::Error>,
        > + Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Select<By<Option<Building>, building::Id>>,
            Ok = Option<Building>,
            Err = Traced<database::Error>,
        > + Database<
            Lock<By<Building, building::Id>>,
            Ok = (),
            Err = Traced<database::Error>,
        > + Database<Update<Building>, Ok = (), Err = Traced<database::Error>>
        + Database<Commit, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = Building;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: UpdateBuilding,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let UpdateBuilding {
            building_id,
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

        if num_floors == Some(0) {
            return Err(tracerr::new!(E::NoFloors));
        }

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        tx.execute(Lock(By::<Building, _>::new(building_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        let mut building = tx
            .execute(Select(By::<Option<Building>, _>::new(building_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::BuildingNotExists(building_id))
            .map_err(tracerr::wrap!())?;

        if let Some(name) = name {
            building.name = name;
        }
        if let Some(address) = address {
            building.address = address;
        }
        if let Some(num_floors) = num_floors {
            building.num_floors = num_floors;
        }
        if let Some(description) = description {
            building.description = description;
        }

        tx.execute(Update(building.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        Ok(building)
    }
}

/// Error of [`UpdateBuilding`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Building`] doesn't exist.
    #[display("`Building(id: {_0})` does not exist")]
    #[from(ignore)]
    BuildingNotExists(#[error(not(source))] building::Id),

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
        fixture, Command as _,
    };

    use super::{ExecutionError, UpdateBuilding};

    #[tokio::test]
    async fn updates_provided_fields_only() {
        let svc = fixture::service();
        let staff = fixture::user(&svc, Role::Staff).await;
        let origin = fixture::building(&svc).await;

        let building = svc
            .execute(UpdateBuilding {
                building_id: origin.id,
                name: None,
                address: Some(
                    building::Address::new("2 Tran Dai Nghia").unwrap(),
                ),
                num_floors: None,
                description: Some(Some(
                    building::Description::new("Renovated in 2024").unwrap(),
                )),
                initiator_id: staff.id,
            })
            .await
            .unwrap();

        assert_eq!(building.name, origin.name);
        assert_eq!(building.num_floors, origin.num_floors);
        assert_eq!(building.address.as_ref(), "2 Tran Dai Nghia");
        assert!(building.description.is_some());
    }

    #[tokio::test]
    async fn rejects_unknown_building() {
        let svc = fixture::service();
        let staff = fixture::user(&svc, Role::Staff).await;

        let err = svc
            .execute(UpdateBuilding {
                building_id: building::Id::new(),
                name: None,
                address: None,
                num_floors: Some(3),
                description: None,
                initiator_id: staff.id,
            })
            .await
            .unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::BuildingNotExists(_)));
    }
}
