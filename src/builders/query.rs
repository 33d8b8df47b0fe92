use std::fmt;

use aws_sdk_dynamodb::operation::query::QueryInput;
use aws_sdk_dynamodb::types::{ReturnConsumedCapacity, Select};

use super::RequestBuilder;
use super::stages::{KeyCondition, KeyConditionedFilter};
use crate::Error;
use crate::expression::ExpressionSelector;
use crate::marshaller::EntityMarshaller;

/// Builds `Query` requests from a key condition and an optional filter.
///
/// When a limit is set the index name is not copied onto the request; the
/// limit takes precedence.
pub struct QueryRequestBuilder<A> {
    table_name: String,
    expression: ExpressionSelector<A>,
    index_name: Option<String>,
    limit: Option<i32>,
    consistent_read: Option<bool>,
    scan_index_forward: Option<bool>,
    select: Option<Select>,
    return_consumed_capacity: Option<ReturnConsumedCapacity>,
    projection_expression: Option<String>,
}

impl<A> QueryRequestBuilder<A> {
    pub(crate) fn new(table_name: impl Into<String>, expression: ExpressionSelector<A>) -> Self {
        Self {
            table_name: table_name.into(),
            expression,
            index_name: None,
            limit: None,
            consistent_read: None,
            scan_index_forward: None,
            select: None,
            return_consumed_capacity: None,
            projection_expression: None,
        }
    }

    /// Target a different table
    pub fn with_table_name(mut self, table_name: impl Into<String>) -> Self {
        self.table_name = table_name.into();
        self
    }

    /// Query a secondary index; ignored when a limit is set
    pub fn with_index_name(mut self, index_name: impl Into<String>) -> Self {
        self.index_name = Some(index_name.into());
        self
    }

    /// Page size
    pub fn with_limit(mut self, limit: i32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Strongly consistent read
    pub fn with_consistent_read(mut self, consistent_read: bool) -> Self {
        self.consistent_read = Some(consistent_read);
        self
    }

    /// Ascending (`true`) or descending (`false`) range key order
    pub fn with_scan_index_forward(mut self, forward: bool) -> Self {
        self.scan_index_forward = Some(forward);
        self
    }

    /// Attributes to return
    pub fn with_select(mut self, select: Select) -> Self {
        self.select = Some(select);
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
}

impl<A> RequestBuilder<A> for QueryRequestBuilder<A> {
    type Request = QueryInput;

    fn build(&self, argument: &A) -> Result<QueryInput, Error> {
        let expression = (self.expression)(argument)?;

        let mut builder = QueryInput::builder()
            .table_name(&self.table_name)
            .set_key_condition_expression(expression.expression(0))
            .set_filter_expression(expression.expression(1))
            .set_expression_attribute_names(expression.names_or_none())
            .set_expression_attribute_values(expression.values_or_none())
            .set_consistent_read(self.consistent_read)
            .set_scan_index_forward(self.scan_index_forward)
            .set_select(self.select.clone())
            .set_return_consumed_capacity(self.return_consumed_capacity.clone())
            .set_projection_expression(self.projection_expression.clone());

        if let Some(limit) = self.limit {
            builder = builder.limit(limit);
        } else if let Some(index_name) = &self.index_name {
            builder = builder.index_name(index_name);
        }

        Ok(builder.build()?)
    }
}

impl<A> fmt::Debug for QueryRequestBuilder<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryRequestBuilder")
            .field("table_name", &self.table_name)
            .field("index_name", &self.index_name)
            .field("limit", &self.limit)
            .field("consistent_read", &self.consistent_read)
            .field("scan_index_forward", &self.scan_index_forward)
            .field("select", &self.select)
            .field("return_consumed_capacity", &self.return_consumed_capacity)
            .field("projection_expression", &self.projection_expression)
            .finish_non_exhaustive()
    }
}

impl<M: EntityMarshaller> KeyCondition<M> {
    /// Query builder for this key condition.
    pub fn to_query_request_builder(&self) -> Result<QueryRequestBuilder<M::Argument>, Error> {
        Ok(QueryRequestBuilder::new(self.table.table_name(), self.compose()?))
    }
}

impl<M: EntityMarshaller> KeyConditionedFilter<M> {
    /// Query builder for this key condition and filter.
    pub fn to_query_request_builder(&self) -> Result<QueryRequestBuilder<M::Argument>, Error> {
        Ok(QueryRequestBuilder::new(self.table.table_name(), self.compose()?))
    }
}
