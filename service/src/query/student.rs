//! [`Query`] collection related to [`Student`]s.

use common::operations::By;

use crate::{
    domain::{student, user, Student},
    read,
};
#[cfg(doc)]
use crate::{domain::User, Query};

use super::DatabaseQuery;

/// Queries a [`Student`] by its [`student::Id`].
pub type ById = DatabaseQuery<By<Option<Student>, student::Id>>;

/// Queries a [`Student`] profile of a [`User`].
pub type ByUserId = DatabaseQuery<By<Option<Student>, user::Id>>;

/// Queries a list of [`Student`]s.
pub type List = DatabaseQuery<
    By<read::student::list::Page, read::student::list::Selector>,
>;

/// Queries total count of [`Student`]s.
pub type TotalCount = DatabaseQuery<By<read::student::list::TotalCount, ()>>;

#[cfg(test)]
mod spec {
    use common::operations::Update;

    use crate::{
        domain::{student, Student},
        fixture,
        infra::Database as _,
        read, Query as _,
    };

    use super::List;

    async fn search(
        svc: &fixture::TestService,
        query: &str,
    ) -> Vec<student::Id> {
        svc.execute(List::by(read::student::list::Selector {
            arguments: read::student::list::Arguments::new(
                None, None, None, None, 20,
            )
            .unwrap(),
            filter: read::student::list::Filter {
                search: Some(read::SearchQuery::new(query).unwrap()),
            },
        }))
        .await
        .unwrap()
        .edges
        .into_iter()
        .map(|e| e.node)
        .collect()
    }

    #[tokio::test]
    async fn searches_by_number_and_faculty() {
        let svc = fixture::service();
        let (_, economist) = fixture::student(&svc).await;
        let (_, engineer) = fixture::student(&svc).await;
        svc.database()
            .execute(Update(Student {
                faculty: student::Faculty::new("Economics").unwrap(),
                ..economist.clone()
            }))
            .await
            .unwrap();

        assert_eq!(search(&svc, "ECONOMICS").await, [economist.id]);
        assert_eq!(
            search(&svc, &engineer.number.as_ref().to_lowercase()).await,
            [engineer.id],
        );
        assert!(search(&svc, "Harvard").await.is_empty());
    }
}
