//! Middleware pipeline around a single request/response round trip.
//!
//! Middleware registered as `[A, B, C]` observe the request in that order and
//! the response in reverse: `A → B → C → network call → C → B → A`.

mod context;
mod logging;

pub use context::{Request, RequestContext, RequestToken, Response};
pub use logging::RequestLogger;

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use aws_sdk_dynamodb::operation::delete_item::{DeleteItemInput, DeleteItemOutput};
use aws_sdk_dynamodb::operation::get_item::{GetItemInput, GetItemOutput};
use aws_sdk_dynamodb::operation::put_item::{PutItemInput, PutItemOutput};
use aws_sdk_dynamodb::operation::query::{QueryInput, QueryOutput};
use aws_sdk_dynamodb::operation::update_item::{UpdateItemInput, UpdateItemOutput};
use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use tokio_util::sync::CancellationToken;

use crate::Error;
use crate::client::ItemClient;

/// The rest of the pipeline from a middleware's point of view.
pub type Continuation =
    Arc<dyn Fn(RequestContext) -> BoxFuture<'static, Result<Response, Error>> + Send + Sync>;

/// Intercepts a request on its way to DynamoDB and the response on its way back.
///
/// ```rust
/// use async_trait::async_trait;
/// use dynamo_request::{Error, Middleware, Next, RequestContext, Response};
///
/// #[derive(Debug)]
/// struct ConsistentReads;
///
/// #[async_trait]
/// impl Middleware for ConsistentReads {
///     async fn invoke(&self, mut context: RequestContext, next: Next) -> Result<Response, Error> {
///         if let dynamo_request::Request::Get(input) = context.request_mut() {
///             input.consistent_read = Some(true);
///         }
///         next.run(context).await
///     }
/// }
/// ```
#[async_trait]
pub trait Middleware: fmt::Debug + Send + Sync {
    /// Handle `context`, usually by forwarding it to `next`.
    async fn invoke(&self, context: RequestContext, next: Next) -> Result<Response, Error>;
}

/// Handle to the remainder of the pipeline.
#[derive(Clone)]
pub struct Next {
    inner: Continuation,
}

impl Next {
    /// Forward the context; it must be the one this middleware received.
    pub async fn run(self, context: RequestContext) -> Result<Response, Error> {
        (self.inner)(context).await
    }
}

impl fmt::Debug for Next {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Next").finish_non_exhaustive()
    }
}

/// Fold `middlewares` around `endpoint`, first registered outermost.
pub fn compose(middlewares: &[Arc<dyn Middleware>], endpoint: Continuation) -> Continuation {
    middlewares.iter().rev().fold(endpoint, |inner, middleware| {
        let middleware = Arc::clone(middleware);
        Arc::new(
            move |context: RequestContext| -> BoxFuture<'static, Result<Response, Error>> {
                let middleware = Arc::clone(&middleware);
                let next = Next {
                    inner: Arc::clone(&inner),
                };
                async move { middleware.invoke(context, next).await }.boxed()
            },
        )
    })
}

/// Client plus middleware, resolved once per handler.
#[derive(Debug, Clone)]
pub(crate) struct Dispatcher {
    client: Arc<dyn ItemClient>,
    middlewares: Vec<Arc<dyn Middleware>>,
}

impl Dispatcher {
    pub(crate) fn new(client: Arc<dyn ItemClient>, middlewares: Vec<Arc<dyn Middleware>>) -> Self {
        Self {
            client,
            middlewares,
        }
    }
}

/// Typed view of one DynamoDB operation inside the untyped pipeline.
pub(crate) trait Operation: Sized + Send + 'static {
    type Output: Send + 'static;
    const NAME: &'static str;

    fn into_request(self) -> Request;
    fn from_request(request: Request) -> Option<Self>;
    fn into_response(output: Self::Output) -> Response;
    fn from_response(response: Response) -> Option<Self::Output>;
    fn call(
        client: Arc<dyn ItemClient>,
        input: Self,
    ) -> BoxFuture<'static, Result<Self::Output, Error>>;
}

macro_rules! impl_operation {
    ($input:ty, $output:ty, $variant:ident, $method:ident, $name:literal) => {
        impl Operation for $input {
            type Output = $output;
            const NAME: &'static str = $name;

            fn into_request(self) -> Request {
                Request::$variant(self)
            }

            fn from_request(request: Request) -> Option<Self> {
                match request {
                    Request::$variant(input) => Some(input),
                    _ => None,
                }
            }

            fn into_response(output: $output) -> Response {
                Response::$variant(output)
            }

            fn from_response(response: Response) -> Option<$output> {
                match response {
                    Response::$variant(output) => Some(output),
                    _ => None,
                }
            }

            fn call(
                client: Arc<dyn ItemClient>,
                input: Self,
            ) -> BoxFuture<'static, Result<$output, Error>> {
                async move { client.$method(input).await }.boxed()
            }
        }
    };
}

impl_operation!(GetItemInput, GetItemOutput, Get, get_item, "GetItem");
impl_operation!(PutItemInput, PutItemOutput, Put, put_item, "PutItem");
impl_operation!(UpdateItemInput, UpdateItemOutput, Update, update_item, "UpdateItem");
impl_operation!(DeleteItemInput, DeleteItemOutput, Delete, delete_item, "DeleteItem");
impl_operation!(QueryInput, QueryOutput, Query, query, "Query");

async fn with_cancellation<T, F>(cancellation: &CancellationToken, call: F) -> Result<T, Error>
where
    F: Future<Output = Result<T, Error>>,
{
    tokio::select! {
        biased;
        _ = cancellation.cancelled() => Err(Error::Cancelled),
        result = call => result,
    }
}

/// Send one request through the dispatcher's pipeline.
///
/// With no middleware the client is called directly; otherwise the request
/// is wrapped in a [`RequestContext`] and the innermost continuation checks
/// the context's token before casting the request back.
pub(crate) async fn send_request<O: Operation>(
    input: O,
    dispatcher: &Dispatcher,
    cancellation: &CancellationToken,
) -> Result<O::Output, Error> {
    tracing::debug!(
        operation = O::NAME,
        middleware = dispatcher.middlewares.len(),
        "dispatching DynamoDB operation"
    );

    if dispatcher.middlewares.is_empty() {
        let call = O::call(Arc::clone(&dispatcher.client), input);
        return with_cancellation(cancellation, call).await;
    }

    let context = RequestContext::new(input.into_request(), cancellation.clone());
    let expected = context.token();
    let client = Arc::clone(&dispatcher.client);

    let endpoint: Continuation = Arc::new(
        move |context: RequestContext| -> BoxFuture<'static, Result<Response, Error>> {
            let client = Arc::clone(&client);
            async move {
                let (request, cancellation, token) = context.into_parts();
                if token != expected {
                    return Err(Error::InvalidOperation(format!(
                        "{} middleware forwarded a different request context",
                        O::NAME
                    )));
                }

                let kind = request.operation_name();
                let input = O::from_request(request).ok_or_else(|| {
                    Error::InvalidOperation(format!(
                        "middleware replaced a {} request with a {} request",
                        O::NAME,
                        kind
                    ))
                })?;

                let output = with_cancellation(&cancellation, O::call(client, input)).await?;
                Ok(O::into_response(output))
            }
            .boxed()
        },
    );

    let response = compose(&dispatcher.middlewares, endpoint)(context).await?;
    let kind = response.operation_name();
    O::from_response(response).ok_or_else(|| {
        Error::InvalidOperation(format!(
            "middleware returned a {} response to a {} request",
            kind,
            O::NAME
        ))
    })
}
