use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use aws_sdk_dynamodb::operation::put_item::PutItemInput;
use tokio_util::sync::CancellationToken;

use super::{
    HandlerOptions, RequestHandler, is_value_provided, resolve_dispatcher, unmarshall_returned,
};
use crate::Error;
use crate::builders::RequestBuilder;
use crate::marshaller::EntityMarshaller;
use crate::pipeline::{Dispatcher, send_request};
use crate::table::TableAccess;

type PutBuilder<A> = Arc<dyn RequestBuilder<A, Request = PutItemInput>>;

/// Point write. Returns the replaced item only when the request asks for it
/// (`ALL_OLD`) and DynamoDB sent one back.
pub struct PutRequestHandler<M: EntityMarshaller> {
    builder: PutBuilder<M::Argument>,
    marshaller: Arc<M>,
    dispatcher: Dispatcher,
}

#[async_trait]
impl<M: EntityMarshaller> RequestHandler<M::Argument> for PutRequestHandler<M> {
    type Output = Option<M::Entity>;

    async fn send(
        &self,
        argument: &M::Argument,
        cancellation: &CancellationToken,
    ) -> Result<Option<M::Entity>, Error> {
        let request = self.builder.build(argument)?;
        let provided = is_value_provided(request.return_values())?;
        let output = send_request(request, &self.dispatcher, cancellation).await?;

        unmarshall_returned(self.marshaller.as_ref(), provided, output.attributes)
    }
}

impl<M: EntityMarshaller> fmt::Debug for PutRequestHandler<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PutRequestHandler")
            .field("dispatcher", &self.dispatcher)
            .finish_non_exhaustive()
    }
}

impl<M: EntityMarshaller> TableAccess<M> {
    /// Put handler; `select_builder` picks the request builder from this table.
    pub fn to_put_request_handler<B, S, C>(
        &self,
        select_builder: S,
        configure: C,
    ) -> Result<PutRequestHandler<M>, Error>
    where
        B: RequestBuilder<M::Argument, Request = PutItemInput> + 'static,
        S: FnOnce(&Self) -> Result<B, Error>,
        C: FnOnce(&mut HandlerOptions),
    {
        Ok(PutRequestHandler {
            builder: Arc::new(select_builder(self)?),
            marshaller: self.shared_marshaller(),
            dispatcher: resolve_dispatcher(self, configure)?,
        })
    }
}
