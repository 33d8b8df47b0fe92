//! Request handlers: build, dispatch, unmarshall.
//!
//! Each handler owns a request builder, the table's marshaller and a
//! resolved client plus middleware list. `send` builds the request for the
//! argument, dispatches it, and turns the response into entities. Errors
//! from the client propagate unchanged.

mod delete;
mod get;
mod put;
mod query;
mod update;

pub use delete::DeleteRequestHandler;
pub use get::GetRequestHandler;
pub use put::PutRequestHandler;
pub use query::QueryRequestHandler;
pub use update::UpdateRequestHandler;

use std::sync::Arc;

use async_trait::async_trait;
use aws_sdk_dynamodb::types::ReturnValue;
use tokio_util::sync::CancellationToken;

use crate::Error;
use crate::client::ItemClient;
use crate::marshaller::{EntityMarshaller, Item};
use crate::pipeline::{Dispatcher, Middleware};
use crate::table::TableAccess;

/// One access pattern exposed to application code.
#[async_trait]
pub trait RequestHandler<A: Sync>: Send + Sync {
    /// `Option<T>` for point operations, `Vec<T>` for queries
    type Output: Send;

    /// Build, dispatch and unmarshall for `argument`.
    async fn send(
        &self,
        argument: &A,
        cancellation: &CancellationToken,
    ) -> Result<Self::Output, Error>;
}

/// Handler configuration, filled in by the callback passed to a
/// `to_*_request_handler` constructor.
#[derive(Debug, Clone, Default)]
pub struct HandlerOptions {
    /// Client for this handler; falls back to the table binding's client
    pub client: Option<Arc<dyn ItemClient>>,
    /// Middleware, outermost first
    pub request_pipelines: Vec<Arc<dyn Middleware>>,
}

impl HandlerOptions {
    /// Use `client` for this handler.
    pub fn with_client(&mut self, client: Arc<dyn ItemClient>) -> &mut Self {
        self.client = Some(client);
        self
    }

    /// Append a middleware; it runs inside every middleware added before it.
    pub fn add_middleware(&mut self, middleware: impl Middleware + 'static) -> &mut Self {
        self.request_pipelines.push(Arc::new(middleware));
        self
    }
}

pub(crate) fn resolve_dispatcher<M, C>(
    table: &TableAccess<M>,
    configure: C,
) -> Result<Dispatcher, Error>
where
    M: EntityMarshaller,
    C: FnOnce(&mut HandlerOptions),
{
    let mut options = HandlerOptions::default();
    configure(&mut options);

    let client = options
        .client
        .or_else(|| table.client().cloned())
        .ok_or_else(|| {
            Error::configuration(format!(
                "no DynamoDB client for table `{}`: set one on the table binding or in the handler options",
                table.table_name()
            ))
        })?;

    Ok(Dispatcher::new(client, options.request_pipelines))
}

/// Whether a return value policy asks DynamoDB to send attributes back.
///
/// `None` and `NONE` return nothing; the four `ALL_*`/`UPDATED_*` settings
/// return an item image. Anything else is rejected.
pub fn is_value_provided(return_values: Option<&ReturnValue>) -> Result<bool, Error> {
    match return_values {
        None | Some(ReturnValue::None) => Ok(false),
        Some(
            ReturnValue::AllNew
            | ReturnValue::AllOld
            | ReturnValue::UpdatedNew
            | ReturnValue::UpdatedOld,
        ) => Ok(true),
        Some(other) => Err(Error::configuration(format!(
            "cannot tell whether return value `{}` provides attributes",
            other.as_str()
        ))),
    }
}

/// Unmarshall returned attributes only when they were requested and present.
pub(crate) fn unmarshall_returned<M: EntityMarshaller>(
    marshaller: &M,
    provided: bool,
    attributes: Option<Item>,
) -> Result<Option<M::Entity>, Error> {
    match attributes {
        Some(attributes) if provided && !attributes.is_empty() => {
            Ok(Some(marshaller.unmarshall(attributes)?))
        }
        _ => Ok(None),
    }
}
