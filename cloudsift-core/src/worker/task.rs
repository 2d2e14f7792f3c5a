use std::fmt;
use std::future::Future;

use futures::future::BoxFuture;
use tokio_util::sync::CancellationToken;

pub type TaskFuture = BoxFuture<'static, anyhow::Result<()>>;

/// A unit of work executed exactly once by a pool worker.
///
/// The closure receives a token that is cancelled when the pool stops or the
/// task exceeds its timeout. Honouring it is up to the task.
pub struct Task {
    run: Box<dyn FnOnce(CancellationToken) -> TaskFuture + Send + 'static>,
}

impl Task {
    pub fn new<F, Fut>(f: F) -> Self
    where
        F: FnOnce(CancellationToken) -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        Self {
            run: Box::new(move |token| Box::pin(f(token))),
        }
    }

    pub(crate) fn into_future(self, token: CancellationToken) -> TaskFuture {
        (self.run)(token)
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task").finish_non_exhaustive()
    }
}
