use std::fmt;

use aws_sdk_dynamodb::operation::get_item::GetItemInput;
use aws_sdk_dynamodb::types::ReturnConsumedCapacity;
use serde::Serialize;

use super::RequestBuilder;
use crate::Error;
use crate::keys::{KeyPart, KeySelector, compose_keys};
use crate::marshaller::EntityMarshaller;
use crate::table::TableAccess;

/// Builds `GetItem` requests.
///
/// Options left unset fall back to the DynamoDB defaults.
pub struct GetRequestBuilder<A> {
    table_name: String,
    key_selector: KeySelector<A>,
    consistent_read: Option<bool>,
    return_consumed_capacity: Option<ReturnConsumedCapacity>,
    projection_expression: Option<String>,
}

impl<A> GetRequestBuilder<A> {
    pub(crate) fn new(table_name: impl Into<String>, key_selector: KeySelector<A>) -> Self {
        Self {
            table_name: table_name.into(),
            key_selector,
            consistent_read: None,
            return_consumed_capacity: None,
            projection_expression: None,
        }
    }

    /// Target a different table
    pub fn with_table_name(mut self, table_name: impl Into<String>) -> Self {
        self.table_name = table_name.into();
        self
    }

    /// Strongly consistent read
    pub fn with_consistent_read(mut self, consistent_read: bool) -> Self {
        self.consistent_read = Some(consistent_read);
        self
    }

    /// Consumed capacity reporting
    pub fn with_return_consumed_capacity(mut self, value: ReturnConsumedCapacity) -> Self {
        self.return_consumed_capacity = Some(value);
        self
    }

    /// Attributes to retrieve
    pub fn with_projection_expression(mut self, projection: impl Into<String>) -> Self {
        self.projection_expression = Some(projection.into());
        self
    }

    /// Table name the requests target
    pub fn table_name(&self) -> &str {
        &self.table_name
    }
}

impl<A> RequestBuilder<A> for GetRequestBuilder<A> {
    type Request = GetItemInput;

    fn build(&self, argument: &A) -> Result<GetItemInput, Error> {
        let key = (self.key_selector)(argument)?;

        Ok(GetItemInput::builder()
            .table_name(&self.table_name)
            .set_key(Some(key))
            .set_consistent_read(self.consistent_read)
            .set_return_consumed_capacity(self.return_consumed_capacity.clone())
            .set_projection_expression(self.projection_expression.clone())
            .build()?)
    }
}

impl<A> fmt::Debug for GetRequestBuilder<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GetRequestBuilder")
            .field("table_name", &self.table_name)
            .field("consistent_read", &self.consistent_read)
            .field("return_consumed_capacity", &self.return_consumed_capacity)
            .field("projection_expression", &self.projection_expression)
            .finish_non_exhaustive()
    }
}

impl<M: EntityMarshaller> TableAccess<M> {
    /// Get builder that uses the whole argument as the partition key.
    pub fn to_get_request_builder(&self) -> Result<GetRequestBuilder<M::Argument>, Error>
    where
        M::Argument: Serialize,
    {
        self.to_get_request_builder_by_partition(KeyPart::argument())
    }

    /// Get builder keyed by a partition key selected from the argument.
    pub fn to_get_request_builder_by_partition(
        &self,
        partition: KeyPart<M::Argument>,
    ) -> Result<GetRequestBuilder<M::Argument>, Error> {
        let keys = compose_keys(self.marshaller().primary_key_marshaller(), Some(partition), None)?;
        Ok(GetRequestBuilder::new(self.table_name(), keys))
    }

    /// Get builder keyed by partition and range keys selected from the argument.
    pub fn to_get_request_builder_by_keys(
        &self,
        partition: KeyPart<M::Argument>,
        range: KeyPart<M::Argument>,
    ) -> Result<GetRequestBuilder<M::Argument>, Error> {
        let keys = compose_keys(
            self.marshaller().primary_key_marshaller(),
            Some(partition),
            Some(range),
        )?;
        Ok(GetRequestBuilder::new(self.table_name(), keys))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::marshaller::{KeyMarshaller, SerdeMarshaller};
    use crate::table::OnTable;
    use aws_sdk_dynamodb::types::{AttributeValue, ScalarAttributeType};
    use serde::Deserialize;

    #[derive(Debug, Clone, Serialize, Deserialize)]
    struct Order {
        customer: String,
        number: u32,
    }

    fn orders() -> TableAccess<SerdeMarshaller<Order>> {
        SerdeMarshaller::new(
            KeyMarshaller::partition("customer", ScalarAttributeType::S)
                .with_range("number", ScalarAttributeType::N),
        )
        .on_table("orders")
        .unwrap()
    }

    fn order() -> Order {
        Order {
            customer: "c1".to_string(),
            number: 42,
        }
    }

    #[test]
    fn test_defaults_are_unset() {
        let builder = orders()
            .to_get_request_builder_by_partition(KeyPart::by_ref(|o: &Order| &o.customer))
            .unwrap();
        let request = builder.build(&order()).unwrap();

        assert_eq!(request.table_name(), Some("orders"));
        assert_eq!(request.key().map(|k| k.len()), Some(1));
        assert_eq!(request.consistent_read(), None);
        assert_eq!(request.return_consumed_capacity(), None);
        assert_eq!(request.projection_expression(), None);
    }

    #[test]
    fn test_overrides_are_applied() {
        let builder = orders()
            .to_get_request_builder_by_keys(
                KeyPart::by_ref(|o: &Order| &o.customer),
                KeyPart::new(|o: &Order| o.number),
            )
            .unwrap()
            .with_consistent_read(false)
            .with_return_consumed_capacity(ReturnConsumedCapacity::Total)
            .with_projection_expression("customer")
            .with_table_name("orders-archive");
        let request = builder.build(&order()).unwrap();

        assert_eq!(request.table_name(), Some("orders-archive"));
        assert_eq!(request.consistent_read(), Some(false));
        assert_eq!(
            request.return_consumed_capacity(),
            Some(&ReturnConsumedCapacity::Total)
        );
        assert_eq!(request.projection_expression(), Some("customer"));

        let key = request.key().unwrap();
        assert_eq!(key["customer"], AttributeValue::S("c1".to_string()));
        assert_eq!(key["number"], AttributeValue::N("42".to_string()));
    }

    #[test]
    fn test_build_is_repeatable() {
        let builder = orders()
            .to_get_request_builder_by_partition(KeyPart::by_ref(|o: &Order| &o.customer))
            .unwrap();
        assert_eq!(builder.build(&order()).unwrap(), builder.build(&order()).unwrap());
    }

    #[test]
    fn test_argument_as_partition_key() {
        let table = SerdeMarshaller::<Order, String>::new(KeyMarshaller::partition(
            "customer",
            ScalarAttributeType::S,
        ))
        .on_table("orders")
        .unwrap();
        let request = table
            .to_get_request_builder()
            .unwrap()
            .build(&"c7".to_string())
            .unwrap();

        assert_eq!(
            request.key().unwrap()["customer"],
            AttributeValue::S("c7".to_string())
        );
    }
}
