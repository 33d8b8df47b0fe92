use std::fmt;
use std::sync::Arc;

use crate::Error;
use crate::client::ItemClient;
use crate::marshaller::EntityMarshaller;

/// A marshaller bound to a DynamoDB table.
///
/// This is the composition root of every builder chain: expression stages,
/// request builders and request handlers are all derived from it. It is
/// cheap to clone and never mutated once built.
///
/// ```rust
/// use aws_sdk_dynamodb::types::ScalarAttributeType;
/// use dynamo_request::{KeyMarshaller, OnTable, SerdeMarshaller};
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Serialize, Deserialize)]
/// struct User {
///     id: String,
/// }
///
/// let users = SerdeMarshaller::<User>::new(KeyMarshaller::partition("id", ScalarAttributeType::S))
///     .on_table("users")
///     .unwrap();
/// assert_eq!(users.table_name(), "users");
/// ```
pub struct TableAccess<M: EntityMarshaller> {
    table_name: String,
    marshaller: Arc<M>,
    client: Option<Arc<dyn ItemClient>>,
}

impl<M: EntityMarshaller> TableAccess<M> {
    /// Bind `marshaller` to `table_name`; the name must not be empty.
    pub fn new(marshaller: M, table_name: impl Into<String>) -> Result<Self, Error> {
        Self::from_shared(Arc::new(marshaller), table_name)
    }

    /// Bind an already shared marshaller.
    pub fn from_shared(marshaller: Arc<M>, table_name: impl Into<String>) -> Result<Self, Error> {
        let table_name = table_name.into();
        if table_name.trim().is_empty() {
            return Err(Error::configuration("table name must not be empty"));
        }

        Ok(Self {
            table_name,
            marshaller,
            client: None,
        })
    }

    /// Client shared by every handler built from this binding unless the
    /// handler's options supply their own.
    pub fn with_client(mut self, client: Arc<dyn ItemClient>) -> Self {
        self.client = Some(client);
        self
    }

    /// Table name
    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// The bound marshaller
    pub fn marshaller(&self) -> &M {
        &self.marshaller
    }

    pub(crate) fn shared_marshaller(&self) -> Arc<M> {
        Arc::clone(&self.marshaller)
    }

    /// Default client, if one was attached
    pub fn client(&self) -> Option<&Arc<dyn ItemClient>> {
        self.client.as_ref()
    }
}

impl<M: EntityMarshaller> Clone for TableAccess<M> {
    fn clone(&self) -> Self {
        Self {
            table_name: self.table_name.clone(),
            marshaller: Arc::clone(&self.marshaller),
            client: self.client.clone(),
        }
    }
}

impl<M: EntityMarshaller> fmt::Debug for TableAccess<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TableAccess")
            .field("table_name", &self.table_name)
            .field("marshaller", &std::any::type_name::<M>())
            .field("client", &self.client)
            .finish()
    }
}

/// Bind a marshaller to a table: `marshaller.on_table("cats")`.
pub trait OnTable: EntityMarshaller + Sized {
    /// See [`TableAccess::new`].
    fn on_table(self, table_name: impl Into<String>) -> Result<TableAccess<Self>, Error> {
        TableAccess::new(self, table_name)
    }
}

impl<M: EntityMarshaller> OnTable for M {}
