use std::fmt;

use aws_sdk_dynamodb::operation::delete_item::DeleteItemInput;
use aws_sdk_dynamodb::types::{
    ReturnConsumedCapacity, ReturnItemCollectionMetrics, ReturnValue,
    ReturnValuesOnConditionCheckFailure,
};
use serde::Serialize;

use super::RequestBuilder;
use super::stages::Condition;
use crate::Error;
use crate::expression::ExpressionSelector;
use crate::keys::{KeyPart, KeySelector, compose_keys};
use crate::marshaller::EntityMarshaller;
use crate::table::TableAccess;

/// Builds `DeleteItem` requests, optionally guarded by a condition.
pub struct DeleteRequestBuilder<A> {
    table_name: String,
    key_selector: KeySelector<A>,
    condition: Option<ExpressionSelector<A>>,
    return_values: Option<ReturnValue>,
    return_consumed_capacity: Option<ReturnConsumedCapacity>,
    return_item_collection_metrics: Option<ReturnItemCollectionMetrics>,
    return_values_on_condition_check_failure: Option<ReturnValuesOnConditionCheckFailure>,
}

impl<A> DeleteRequestBuilder<A> {
    pub(crate) fn new(
        table_name: impl Into<String>,
        key_selector: KeySelector<A>,
        condition: Option<ExpressionSelector<A>>,
    ) -> Self {
        Self {
            table_name: table_name.into(),
            key_selector,
            condition,
            return_values: None,
            return_consumed_capacity: None,
            return_item_collection_metrics: None,
            return_values_on_condition_check_failure: None,
        }
    }

    /// Target a different table
    pub fn with_table_name(mut self, table_name: impl Into<String>) -> Self {
        self.table_name = table_name.into();
        self
    }

    /// Replace the key selector
    pub fn with_key_selector(mut self, key_selector: KeySelector<A>) -> Self {
        self.key_selector = key_selector;
        self
    }

    /// Return the deleted item (`ALL_OLD`) or nothing (`NONE`)
    pub fn with_return_values(mut self, value: ReturnValue) -> Self {
        self.return_values = Some(value);
        self
    }

    /// Consumed capacity reporting
    pub fn with_return_consumed_capacity(mut self, value: ReturnConsumedCapacity) -> Self {
        self.return_consumed_capacity = Some(value);
        self
    }

    /// Item collection metrics reporting
    pub fn with_return_item_collection_metrics(
        mut self,
        value: ReturnItemCollectionMetrics,
    ) -> Self {
        self.return_item_collection_metrics = Some(value);
        self
    }

    /// Return the item when the condition check fails
    pub fn with_return_values_on_condition_check_failure(
        mut self,
        value: ReturnValuesOnConditionCheckFailure,
    ) -> Self {
        self.return_values_on_condition_check_failure = Some(value);
        self
    }

    /// Configured return value policy
    pub fn return_values(&self) -> Option<&ReturnValue> {
        self.return_values.as_ref()
    }
}

impl<A> RequestBuilder<A> for DeleteRequestBuilder<A> {
    type Request = DeleteItemInput;

    fn build(&self, argument: &A) -> Result<DeleteItemInput, Error> {
        let key = (self.key_selector)(argument)?;
        let mut builder = DeleteItemInput::builder()
            .table_name(&self.table_name)
            .set_key(Some(key))
            .set_return_values(self.return_values.clone())
            .set_return_consumed_capacity(self.return_consumed_capacity.clone())
            .set_return_item_collection_metrics(self.return_item_collection_metrics.clone())
            .set_return_values_on_condition_check_failure(
                self.return_values_on_condition_check_failure.clone(),
            );

        if let Some(condition) = &self.condition {
            let expression = condition(argument)?;
            builder = builder
                .set_condition_expression(expression.expression(0))
                .set_expression_attribute_names(expression.names_or_none())
                .set_expression_attribute_values(expression.values_or_none());
        }

        Ok(builder.build()?)
    }
}

impl<A> fmt::Debug for DeleteRequestBuilder<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeleteRequestBuilder")
            .field("table_name", &self.table_name)
            .field("conditional", &self.condition.is_some())
            .field("return_values", &self.return_values)
            .field("return_consumed_capacity", &self.return_consumed_capacity)
            .field(
                "return_item_collection_metrics",
                &self.return_item_collection_metrics,
            )
            .field(
                "return_values_on_condition_check_failure",
                &self.return_values_on_condition_check_failure,
            )
            .finish_non_exhaustive()
    }
}

fn delete_builder<M: EntityMarshaller>(
    table: &TableAccess<M>,
    partition: Option<KeyPart<M::Argument>>,
    range: Option<KeyPart<M::Argument>>,
    condition: Option<ExpressionSelector<M::Argument>>,
) -> Result<DeleteRequestBuilder<M::Argument>, Error> {
    let keys = compose_keys(table.marshaller().primary_key_marshaller(), partition, range)?;
    Ok(DeleteRequestBuilder::new(table.table_name(), keys, condition))
}

impl<M: EntityMarshaller> TableAccess<M> {
    /// Delete builder that uses the whole argument as the partition key.
    pub fn to_delete_request_builder(&self) -> Result<DeleteRequestBuilder<M::Argument>, Error>
    where
        M::Argument: Serialize,
    {
        delete_builder(self, Some(KeyPart::argument()), None, None)
    }

    /// Delete builder keyed by a partition key selected from the argument.
    pub fn to_delete_request_builder_by_partition(
        &self,
        partition: KeyPart<M::Argument>,
    ) -> Result<DeleteRequestBuilder<M::Argument>, Error> {
        delete_builder(self, Some(partition), None, None)
    }

    /// Delete builder keyed by partition and range keys selected from the argument.
    pub fn to_delete_request_builder_by_keys(
        &self,
        partition: KeyPart<M::Argument>,
        range: KeyPart<M::Argument>,
    ) -> Result<DeleteRequestBuilder<M::Argument>, Error> {
        delete_builder(self, Some(partition), Some(range), None)
    }
}

impl<M: EntityMarshaller> Condition<M> {
    /// Conditional delete that uses the whole argument as the partition key.
    pub fn to_delete_request_builder(&self) -> Result<DeleteRequestBuilder<M::Argument>, Error>
    where
        M::Argument: Serialize,
    {
        delete_builder(
            &self.table,
            Some(KeyPart::argument()),
            None,
            Some(self.compose()?),
        )
    }

    /// Conditional delete keyed by a partition key selected from the argument.
    pub fn to_delete_request_builder_by_partition(
        &self,
        partition: KeyPart<M::Argument>,
    ) -> Result<DeleteRequestBuilder<M::Argument>, Error> {
        delete_builder(&self.table, Some(partition), None, Some(self.compose()?))
    }

    /// Conditional delete keyed by partition and range keys selected from the argument.
    pub fn to_delete_request_builder_by_keys(
        &self,
        partition: KeyPart<M::Argument>,
        range: KeyPart<M::Argument>,
    ) -> Result<DeleteRequestBuilder<M::Argument>, Error> {
        delete_builder(
            &self.table,
            Some(partition),
            Some(range),
            Some(self.compose()?),
        )
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
    struct Session {
        user: String,
        started: u64,
    }

    fn sessions() -> TableAccess<SerdeMarshaller<Session>> {
        SerdeMarshaller::new(
            KeyMarshaller::partition("user", ScalarAttributeType::S)
                .with_range("started", ScalarAttributeType::N),
        )
        .on_table("sessions")
        .unwrap()
    }

    fn session() -> Session {
        Session {
            user: "u1".to_string(),
            started: 1700,
        }
    }

    #[test]
    fn test_key_map_matches_schema() {
        let request = sessions()
            .to_delete_request_builder_by_keys(
                KeyPart::by_ref(|s: &Session| &s.user),
                KeyPart::new(|s: &Session| s.started),
            )
            .unwrap()
            .build(&session())
            .unwrap();

        let key = request.key().unwrap();
        assert_eq!(key.len(), 2);
        assert_eq!(key["user"], AttributeValue::S("u1".to_string()));
        assert_eq!(key["started"], AttributeValue::N("1700".to_string()));
        assert_eq!(request.condition_expression(), None);
        assert_eq!(request.expression_attribute_values(), None);
    }

    #[test]
    fn test_conditional_delete() {
        let request = sessions()
            .with_condition_expression(|n, v| {
                format!("{} = {}", n.field("user"), v.arg(|s| &s.user))
            })
            .to_delete_request_builder_by_partition(KeyPart::by_ref(|s: &Session| &s.user))
            .unwrap()
            .with_return_values(ReturnValue::AllOld)
            .with_return_values_on_condition_check_failure(
                ReturnValuesOnConditionCheckFailure::AllOld,
            )
            .build(&session())
            .unwrap();

        assert_eq!(request.condition_expression(), Some("#user = :p1"));
        assert_eq!(
            request.expression_attribute_names().unwrap()["#user"],
            "user"
        );
        assert_eq!(request.return_values(), Some(&ReturnValue::AllOld));
        assert_eq!(
            request.return_values_on_condition_check_failure(),
            Some(&ReturnValuesOnConditionCheckFailure::AllOld)
        );
    }

    #[test]
    fn test_wrong_key_type_fails_build() {
        let builder = sessions()
            .to_delete_request_builder_by_keys(
                KeyPart::by_ref(|s: &Session| &s.user),
                KeyPart::by_ref(|s: &Session| &s.user),
            )
            .unwrap();

        let err = builder.build(&session()).unwrap_err();
        assert!(err.is_marshalling_error());
    }
}
