use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use aws_sdk_dynamodb::operation::delete_item::DeleteItemInput;
use tokio_util::sync::CancellationToken;

use super::{
    HandlerOptions, RequestHandler, is_value_provided, resolve_dispatcher, unmarshall_returned,
};
use crate::Error;
use crate::builders::RequestBuilder;
use crate::marshaller::EntityMarshaller;
use crate::pipeline::{Dispatcher, send_request};
use crate::table::TableAccess;

type DeleteBuilder<A> = Arc<dyn RequestBuilder<A, Request = DeleteItemInput>>;

/// Point delete. Returns the deleted item only when the request asks for it
/// (`ALL_OLD`) and DynamoDB sent one back.
pub struct DeleteRequestHandler<M: EntityMarshaller> {
    builder: DeleteBuilder<M::Argument>,
    marshaller: Arc<M>,
    dispatcher: Dispatcher,
}

#[async_trait]
impl<M: EntityMarshaller> RequestHandler<M::Argument> for DeleteRequestHandler<M> {
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

impl<M: EntityMarshaller> fmt::Debug for DeleteRequestHandler<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeleteRequestHandler")
            .field("dispatcher", &self.dispatcher)
            .finish_non_exhaustive()
    }
}

impl<M: EntityMarshaller> TableAccess<M> {
    /// Delete handler; `select_builder` picks the request builder from this table.
    pub fn to_delete_request_handler<B, S, C>(
        &self,
        select_builder: S,
        configure: C,
    ) -> Result<DeleteRequestHandler<M>, Error>
    where
        B: RequestBuilder<M::Argument, Request = DeleteItemInput> + 'static,
        S: FnOnce(&Self) -> Result<B, Error>,
        C: FnOnce(&mut HandlerOptions),
    {
        Ok(DeleteRequestHandler {
            builder: Arc::new(select_builder(self)?),
            marshaller: self.shared_marshaller(),
            dispatcher: resolve_dispatcher(self, configure)?,
        })
    }
}
