use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use aws_sdk_dynamodb::operation::query::QueryInput;
use tokio_util::sync::CancellationToken;

use super::{HandlerOptions, RequestHandler, resolve_dispatcher};
use crate::Error;
use crate::builders::RequestBuilder;
use crate::marshaller::EntityMarshaller;
use crate::pipeline::{Dispatcher, send_request};
use crate::table::TableAccess;

type QueryBuilder<A> = Arc<dyn RequestBuilder<A, Request = QueryInput>>;

/// Query that follows continuation keys until the last page.
///
/// Pages are fetched one after another; each page's `LastEvaluatedKey`
/// becomes the next request's `ExclusiveStartKey`. An absent or empty key
/// ends the loop.
pub struct QueryRequestHandler<M: EntityMarshaller> {
    builder: QueryBuilder<M::Argument>,
    marshaller: Arc<M>,
    dispatcher: Dispatcher,
}

#[async_trait]
impl<M: EntityMarshaller> RequestHandler<M::Argument> for QueryRequestHandler<M> {
    type Output = Vec<M::Entity>;

    async fn send(
        &self,
        argument: &M::Argument,
        cancellation: &CancellationToken,
    ) -> Result<Vec<M::Entity>, Error> {
        let mut request = self.builder.build(argument)?;
        let mut entities = Vec::new();
        let mut page = 0usize;

        loop {
            page += 1;
            let output = send_request(request.clone(), &self.dispatcher, cancellation).await?;

            let items = output.items.unwrap_or_default();
            let count = items.len();
            entities.reserve(count);
            for item in items {
                entities.push(self.marshaller.unmarshall(item)?);
            }

            let continuation = output.last_evaluated_key.filter(|key| !key.is_empty());
            tracing::debug!(
                page,
                items = count,
                has_more = continuation.is_some(),
                "received query page"
            );

            match continuation {
                Some(key) => request.exclusive_start_key = Some(key),
                None => break,
            }
        }

        Ok(entities)
    }
}

impl<M: EntityMarshaller> fmt::Debug for QueryRequestHandler<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryRequestHandler")
            .field("dispatcher", &self.dispatcher)
            .finish_non_exhaustive()
    }
}

impl<M: EntityMarshaller> TableAccess<M> {
    /// Query handler; collects every page into one list.
    pub fn to_query_request_handler<B, S, C>(
        &self,
        select_builder: S,
        configure: C,
    ) -> Result<QueryRequestHandler<M>, Error>
    where
        B: RequestBuilder<M::Argument, Request = QueryInput> + 'static,
        S: FnOnce(&Self) -> Result<B, Error>,
        C: FnOnce(&mut HandlerOptions),
    {
        Ok(QueryRequestHandler {
            builder: Arc::new(select_builder(self)?),
            marshaller: self.shared_marshaller(),
            dispatcher: resolve_dispatcher(self, configure)?,
        })
    }
}
