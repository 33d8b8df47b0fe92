use std::fmt;
use std::sync::Arc;

use aws_sdk_dynamodb::operation::update_item::UpdateItemInput;
use aws_sdk_dynamodb::types::{
    ReturnConsumedCapacity, ReturnItemCollectionMetrics, ReturnValue,
    ReturnValuesOnConditionCheckFailure,
};

use super::RequestBuilder;
use super::stages::{ConditionalUpdate, Update};
use crate::Error;
use crate::expression::ExpressionSelector;
use crate::marshaller::{EntityMarshaller, Item, KeyMarshaller};

/// Picks the item key from the key schema and the call-time argument.
pub type UpdateKeySelector<A> =
    Arc<dyn Fn(&KeyMarshaller, &A) -> Result<Item, Error> + Send + Sync>;

/// Builds `UpdateItem` requests from an update clause and an optional condition.
pub struct UpdateRequestBuilder<A> {
    table_name: String,
    expression: ExpressionSelector<A>,
    key_selector: UpdateKeySelector<A>,
    keys: KeyMarshaller,
    return_values: Option<ReturnValue>,
    return_consumed_capacity: Option<ReturnConsumedCapacity>,
    return_item_collection_metrics: Option<ReturnItemCollectionMetrics>,
    return_values_on_condition_check_failure: Option<ReturnValuesOnConditionCheckFailure>,
}

impl<A> UpdateRequestBuilder<A> {
    pub(crate) fn new(
        table_name: impl Into<String>,
        expression: ExpressionSelector<A>,
        key_selector: UpdateKeySelector<A>,
        keys: KeyMarshaller,
    ) -> Self {
        Self {
            table_name: table_name.into(),
            expression,
            key_selector,
            keys,
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

    /// Which item image to return (`ALL_NEW`, `UPDATED_OLD`, ...)
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

impl<A> RequestBuilder<A> for UpdateRequestBuilder<A> {
    type Request = UpdateItemInput;

    fn build(&self, argument: &A) -> Result<UpdateItemInput, Error> {
        let expression = (self.expression)(argument)?;
        let key = (self.key_selector)(&self.keys, argument)?;

        Ok(UpdateItemInput::builder()
            .table_name(&self.table_name)
            .set_key(Some(key))
            .set_update_expression(expression.expression(0))
            .set_condition_expression(expression.expression(1))
            .set_expression_attribute_names(expression.names_or_none())
            .set_expression_attribute_values(expression.values_or_none())
            .set_return_values(self.return_values.clone())
            .set_return_consumed_capacity(self.return_consumed_capacity.clone())
            .set_return_item_collection_metrics(self.return_item_collection_metrics.clone())
            .set_return_values_on_condition_check_failure(
                self.return_values_on_condition_check_failure.clone(),
            )
            .build()?)
    }
}

impl<A> fmt::Debug for UpdateRequestBuilder<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpdateRequestBuilder")
            .field("table_name", &self.table_name)
            .field("keys", &self.keys)
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

macro_rules! impl_to_update_request_builder {
    ($stage:ident) => {
        impl<M: EntityMarshaller> $stage<M> {
            /// Update builder; `key_selector` picks the item key, e.g.
            /// `|keys, arg| keys.keys(&arg.id, &arg.home_id)`.
            pub fn to_update_request_builder<F>(
                &self,
                key_selector: F,
            ) -> Result<UpdateRequestBuilder<M::Argument>, Error>
            where
                F: Fn(&KeyMarshaller, &M::Argument) -> Result<Item, Error>
                    + Send
                    + Sync
                    + 'static,
            {
                Ok(UpdateRequestBuilder::new(
                    self.table.table_name(),
                    self.compose()?,
                    Arc::new(key_selector),
                    self.table.marshaller().primary_key_marshaller().clone(),
                ))
            }
        }
    };
}

impl_to_update_request_builder!(Update);
impl_to_update_request_builder!(ConditionalUpdate);
