use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use aws_sdk_dynamodb::operation::get_item::GetItemInput;
use tokio_util::sync::CancellationToken;

use super::{HandlerOptions, RequestHandler, resolve_dispatcher};
use crate::Error;
use crate::builders::RequestBuilder;
use crate::marshaller::EntityMarshaller;
use crate::pipeline::{Dispatcher, send_request};
use crate::table::TableAccess;

type GetBuilder<A> = Arc<dyn RequestBuilder<A, Request = GetItemInput>>;

/// Point lookup. A missing item is `Ok(None)`, not an error.
pub struct GetRequestHandler<M: EntityMarshaller> {
    builder: GetBuilder<M::Argument>,
    marshaller: Arc<M>,
    dispatcher: Dispatcher,
}

#[async_trait]
impl<M: EntityMarshaller> RequestHandler<M::Argument> for GetRequestHandler<M> {
    type Output = Option<M::Entity>;

    async fn send(
        &self,
        argument: &M::Argument,
        cancellation: &CancellationToken,
    ) -> Result<Option<M::Entity>, Error> {
        let request = self.builder.build(argument)?;
        let output = send_request(request, &self.dispatcher, cancellation).await?;

        match output.item {
            Some(item) if !item.is_empty() => Ok(Some(self.marshaller.unmarshall(item)?)),
            _ => Ok(None),
        }
    }
}

impl<M: EntityMarshaller> fmt::Debug for GetRequestHandler<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GetRequestHandler")
            .field("dispatcher", &self.dispatcher)
            .finish_non_exhaustive()
    }
}

impl<M: EntityMarshaller> TableAccess<M> {
    /// Get handler.
    ///
    /// ```rust,ignore
    /// let handler = cats.to_get_request_handler(
    ///     |table| table.to_get_request_builder_by_partition(KeyPart::by_ref(|c: &Cat| &c.id)),
    ///     |options| { options.add_middleware(RequestLogger::new()); },
    /// )?;
    /// let cat = handler.send(&lookup, &CancellationToken::new()).await?;
    /// ```
    pub fn to_get_request_handler<B, S, C>(
        &self,
        select_builder: S,
        configure: C,
    ) -> Result<GetRequestHandler<M>, Error>
    where
        B: RequestBuilder<M::Argument, Request = GetItemInput> + 'static,
        S: FnOnce(&Self) -> Result<B, Error>,
        C: FnOnce(&mut HandlerOptions),
    {
        Ok(GetRequestHandler {
            builder: Arc::new(select_builder(self)?),
            marshaller: self.shared_marshaller(),
            dispatcher: resolve_dispatcher(self, configure)?,
        })
    }
}
