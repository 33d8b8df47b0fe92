use std::fmt;
use std::sync::Arc;

use aws_sdk_dynamodb::operation::put_item::PutItemInput;
use aws_sdk_dynamodb::types::{
    ReturnConsumedCapacity, ReturnItemCollectionMetrics, ReturnValue,
    ReturnValuesOnConditionCheckFailure,
};

use super::RequestBuilder;
use super::stages::Condition;
use crate::Error;
use crate::expression::ExpressionSelector;
use crate::marshaller::{EntityMarshaller, Item};
use crate::table::TableAccess;

type MarshallFn<T> = Arc<dyn Fn(&T) -> Result<Item, Error> + Send + Sync>;

/// Builds `PutItem` requests from an entity, optionally guarded by a condition.
pub struct PutRequestBuilder<T> {
    table_name: String,
    marshall: MarshallFn<T>,
    condition: Option<ExpressionSelector<T>>,
    return_values: Option<ReturnValue>,
    return_consumed_capacity: Option<ReturnConsumedCapacity>,
    return_item_collection_metrics: Option<ReturnItemCollectionMetrics>,
    return_values_on_condition_check_failure: Option<ReturnValuesOnConditionCheckFailure>,
}

impl<T> PutRequestBuilder<T> {
    pub(crate) fn new(
        table_name: impl Into<String>,
        marshall: MarshallFn<T>,
        condition: Option<ExpressionSelector<T>>,
    ) -> Self {
        Self {
            table_name: table_name.into(),
            marshall,
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

    /// Return the replaced item (`ALL_OLD`) or nothing (`NONE`)
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

impl<T> RequestBuilder<T> for PutRequestBuilder<T> {
    type Request = PutItemInput;

    fn build(&self, entity: &T) -> Result<PutItemInput, Error> {
        let item = (self.marshall)(entity)?;
        let mut builder = PutItemInput::builder()
            .table_name(&self.table_name)
            .set_item(Some(item))
            .set_return_values(self.return_values.clone())
            .set_return_consumed_capacity(self.return_consumed_capacity.clone())
            .set_return_item_collection_metrics(self.return_item_collection_metrics.clone())
            .set_return_values_on_condition_check_failure(
                self.return_values_on_condition_check_failure.clone(),
            );

        if let Some(condition) = &self.condition {
            let expression = condition(entity)?;
            builder = builder
                .set_condition_expression(expression.expression(0))
                .set_expression_attribute_names(expression.names_or_none())
                .set_expression_attribute_values(expression.values_or_none());
        }

        Ok(builder.build()?)
    }
}

impl<T> fmt::Debug for PutRequestBuilder<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PutRequestBuilder")
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

fn marshall_fn<M: EntityMarshaller>(table: &TableAccess<M>) -> MarshallFn<M::Entity> {
    let marshaller = table.shared_marshaller();
    Arc::new(move |entity: &M::Entity| marshaller.marshall(entity))
}

impl<M, T> TableAccess<M>
where
    M: EntityMarshaller<Entity = T, Argument = T>,
    T: 'static,
{
    /// Unconditional put of the argument entity.
    pub fn to_put_request_builder(&self) -> PutRequestBuilder<T> {
        PutRequestBuilder::new(self.table_name(), marshall_fn(self), None)
    }
}

impl<M, T> Condition<M>
where
    M: EntityMarshaller<Entity = T, Argument = T>,
    T: 'static,
{
    /// Put of the argument entity, guarded by this condition.
    pub fn to_put_request_builder(&self) -> Result<PutRequestBuilder<T>, Error> {
        Ok(PutRequestBuilder::new(
            self.table.table_name(),
            marshall_fn(&self.table),
            Some(self.compose()?),
        ))
    }
}
