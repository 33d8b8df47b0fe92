use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use aws_sdk_dynamodb::operation::update_item::UpdateItemInput;
use tokio_util::sync::CancellationToken;

use super::{
    HandlerOptions, RequestHandler, is_value_provided, resolve_dispatcher, unmarshall_returned,
};
use crate::Error;
use crate::builders::RequestBuilder;
use crate::marshaller::EntityMarshaller;
use crate::pipeline::{Dispatcher, send_request};
use crate::table::TableAccess;

type UpdateBuilder<A> = Arc<dyn RequestBuilder<A, Request = UpdateItemInput>>;

/// Conditional or unconditional update. Returns the old or new item image
/// only when the return value policy asks for one and DynamoDB sent it.
pub struct UpdateRequestHandler<M: EntityMarshaller> {
    builder: UpdateBuilder<M::Argument>,
    marshaller: Arc<M>,
    dispatcher: Dispatcher,
}

#[async_trait]
impl<M: EntityMarshaller> RequestHandler<M::Argument> for UpdateRequestHandler<M> {
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

impl<M: EntityMarshaller> fmt::Debug for UpdateRequestHandler<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpdateRequestHandler")
            .field("dispatcher", &self.dispatcher)
            .finish_non_exhaustive()
    }
}

impl<M: EntityMarshaller> TableAccess<M> {
    /// Update handler; `select_builder` picks the request builder from this table.
    pub fn to_update_request_handler<B, S, C>(
        &self,
        select_builder: S,
        configure: C,
    ) -> Result<UpdateRequestHandler<M>, Error>
    where
        B: RequestBuilder<M::Argument, Request = UpdateItemInput> + 'static,
        S: FnOnce(&Self) -> Result<B, Error>,
        C: FnOnce(&mut HandlerOptions),
    {
        Ok(UpdateRequestHandler {
            builder: Arc::new(select_builder(self)?),
            marshaller: self.shared_marshaller(),
            dispatcher: resolve_dispatcher(self, configure)?,
        })
    }
}
