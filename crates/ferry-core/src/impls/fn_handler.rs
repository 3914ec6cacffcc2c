//! FnHandler - async closure を TaskHandler として使うためのアダプタ

use std::future::Future;

use async_trait::async_trait;

use crate::domain::BoxError;
use crate::ports::{TaskContext, TaskHandler};

/// Wraps an async closure `Fn(TaskContext, Req) -> Future<Output = Result<Resp, BoxError>>`.
///
/// Built with [`handler_fn`].
#[derive(Clone)]
pub struct FnHandler<F> {
    f: F,
}

/// Turn an async closure into a [`TaskHandler`].
///
/// ```ignore
/// let handler = handler_fn(|_ctx, req: String| async move {
///     Ok::<_, BoxError>(req.to_uppercase())
/// });
/// ```
pub fn handler_fn<F>(f: F) -> FnHandler<F> {
    FnHandler { f }
}

#[async_trait]
impl<Req, Resp, F, Fut> TaskHandler<Req, Resp> for FnHandler<F>
where
    Req: Send + 'static,
    Resp: Send + 'static,
    F: Fn(TaskContext, Req) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Resp, BoxError>> + Send + 'static,
{
    async fn handle(&self, ctx: TaskContext, request: Req) -> Result<Resp, BoxError> {
        (self.f)(ctx, request).await
    }
}
