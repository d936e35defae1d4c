//! The four async adapter shapes.
//!
//! Every engine call is blocking or callback-based; these helpers give each
//! call one of four uniform asynchronous shapes, always executed off the
//! initiating task and always settling exactly once:
//!
//! - **Single**: [`run_blocking`] → `Result<T>`
//! - **Optional-Single**: `Result<Option<T>>` (realized by the session bridge)
//! - **Stream**: [`emit_all`] → `BoxStream<Result<T>>`, emission order preserved
//! - **Completion**: [`run_blocking`] with `T = ()`

use std::future::Future;

use futures::future;
use futures::stream::{self, BoxStream, StreamExt};

use crate::error::FlowError;

/// Run a blocking engine call on the worker pool and surface its result.
pub(crate) async fn run_blocking<T, F>(op: F) -> Result<T, FlowError>
where
    F: FnOnce() -> Result<T, FlowError> + Send + 'static,
    T: Send + 'static,
{
    match tokio::task::spawn_blocking(op).await {
        Ok(result) => result,
        Err(err) => Err(FlowError::Background(err.to_string())),
    }
}

/// Turn a future producing a batch of values into a stream that emits each
/// value in order. An empty batch is a valid empty stream; a failed batch
/// emits exactly one `Err` item.
pub(crate) fn emit_all<T, F>(body: F) -> BoxStream<'static, Result<T, FlowError>>
where
    F: Future<Output = Result<Vec<T>, FlowError>> + Send + 'static,
    T: Send + 'static,
{
    stream::once(body)
        .flat_map(|outcome| match outcome {
            Ok(items) => stream::iter(items).map(Ok).left_stream(),
            Err(err) => stream::once(future::ready(Err(err))).right_stream(),
        })
        .boxed()
}

/// Require a stream to produce exactly one element.
///
/// Errors on an empty stream and on a stream with more than one element;
/// an error element propagates as-is.
pub(crate) async fn expect_single<T>(
    mut stream: BoxStream<'static, Result<T, FlowError>>,
) -> Result<T, FlowError>
where
    T: Send,
{
    let first = match stream.next().await {
        Some(item) => item?,
        None => return Err(FlowError::ExactlyOneExpected(0)),
    };
    if stream.next().await.is_some() {
        return Err(FlowError::ExactlyOneExpected(2));
    }
    Ok(first)
}
