//! Background environment for running [`Task`]s.

use std::{
    error::Error,
    fmt,
    future::{Future, IntoFuture},
    iter,
};

use futures::{
    future::{self, LocalBoxFuture},
    FutureExt as _, TryFutureExt as _,
};
use tokio::task;
use tracing as log;

#[cfg(doc)]
use crate::Task;

/// Background environment for running long-living [`Task`]s on a single
/// thread.
#[derive(Debug, Default)]
pub struct Background {
    /// Local set of tasks.
    set: task::LocalSet,

    /// Handles of spawned tasks along with their names.
    handles: Vec<(&'static str, task::JoinHandle<Result<(), BoxedError>>)>,
}

/// Type-erased error of a [`Task`].
type BoxedError = Box<dyn Error + 'static>;

impl Background {
    /// Spawns a new named [`Task`] inside the [`Background`] environment.
    pub fn spawn<F, E>(&mut self, name: &'static str, future: F)
    where
        F: Future<Output = Result<(), E>> + 'static,
        E: Error + 'static,
    {
        log::debug!("spawning `{name}` background task");
        self.handles.push((
            name,
            self.set
                .spawn_local(future.map_err(|e| BoxedError::from(Box::new(e)))),
        ));
    }

    /// Returns the number of spawned [`Task`]s.
    #[must_use]
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    /// Indicates whether no [`Task`]s have been spawned.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }
}

impl IntoFuture for Background {
    type Output = Result<(), Failure>;
    type IntoFuture = LocalBoxFuture<'static, Self::Output>;

    fn into_future(self) -> Self::IntoFuture {
        let Self { set, handles } = self;
        future::try_join_all(iter::once(set.map(Ok).boxed_local()).chain(
            handles.into_iter().map(|(task, h)| {
                h.map(move |r| match r {
                    Ok(Ok(())) => Ok(()),
                    Ok(Err(source)) => Err(Failure { task, source }),
                    Err(e) => Err(Failure {
                        task,
                        source: BoxedError::from(Box::new(e)),
                    }),
                })
                .boxed_local()
            }),
        ))
        .map_ok(drop)
        .boxed_local()
    }
}

/// Failure of a [`Task`] running in the [`Background`].
#[derive(Debug)]
pub struct Failure {
    /// Name of the failed [`Task`].
    pub task: &'static str,

    /// Error the [`Task`] failed with.
    pub source: BoxedError,
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "`{}` task failed: {}", self.task, self.source)
    }
}

impl Error for Failure {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&*self.source)
    }
}

#[cfg(test)]
mod spec {
    use std::{convert::Infallible, fmt, future::IntoFuture as _};

    use super::Background;

    #[derive(Debug)]
    struct Boom;

    impl fmt::Display for Boom {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("boom")
        }
    }

    impl std::error::Error for Boom {}

    #[tokio::test]
    async fn completes_when_all_tasks_finish() {
        let mut bg = Background::default();
        bg.spawn("first", async { Ok::<_, Infallible>(()) });
        bg.spawn("second", async { Ok::<_, Infallible>(()) });

        assert_eq!(bg.len(), 2);
        bg.into_future().await.unwrap();
    }

    #[tokio::test]
    async fn names_failed_task() {
        let mut bg = Background::default();
        bg.spawn("fine", async { Ok::<_, Boom>(()) });
        bg.spawn("broken", async { Err(Boom) });

        let err = bg.into_future().await.unwrap_err();

        assert_eq!(err.task, "broken");
        assert_eq!(err.to_string(), "`broken` task failed: boom");
    }
}
