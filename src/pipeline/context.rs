use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use aws_sdk_dynamodb::operation::delete_item::{DeleteItemInput, DeleteItemOutput};
use aws_sdk_dynamodb::operation::get_item::{GetItemInput, GetItemOutput};
use aws_sdk_dynamodb::operation::put_item::{PutItemInput, PutItemOutput};
use aws_sdk_dynamodb::operation::query::{QueryInput, QueryOutput};
use aws_sdk_dynamodb::operation::update_item::{UpdateItemInput, UpdateItemOutput};
use aws_sdk_dynamodb::types::AttributeValue;
use tokio_util::sync::CancellationToken;

/// A provider request travelling through the middleware pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    /// GetItem
    Get(GetItemInput),
    /// PutItem
    Put(PutItemInput),
    /// UpdateItem
    Update(UpdateItemInput),
    /// DeleteItem
    Delete(DeleteItemInput),
    /// Query
    Query(QueryInput),
}

impl Request {
    /// DynamoDB operation name, e.g. `GetItem`.
    pub fn operation_name(&self) -> &'static str {
        match self {
            Request::Get(_) => "GetItem",
            Request::Put(_) => "PutItem",
            Request::Update(_) => "UpdateItem",
            Request::Delete(_) => "DeleteItem",
            Request::Query(_) => "Query",
        }
    }

    /// Target table
    pub fn table_name(&self) -> Option<&str> {
        match self {
            Request::Get(input) => input.table_name(),
            Request::Put(input) => input.table_name(),
            Request::Update(input) => input.table_name(),
            Request::Delete(input) => input.table_name(),
            Request::Query(input) => input.table_name(),
        }
    }

    /// Expression strings set on the request, labelled by role.
    pub fn expressions(&self) -> Vec<(&'static str, &str)> {
        let labelled: Vec<(&'static str, Option<&str>)> = match self {
            Request::Get(input) => vec![("projection", input.projection_expression())],
            Request::Put(input) => vec![("condition", input.condition_expression())],
            Request::Update(input) => vec![
                ("update", input.update_expression()),
                ("condition", input.condition_expression()),
            ],
            Request::Delete(input) => vec![("condition", input.condition_expression())],
            Request::Query(input) => vec![
                ("key_condition", input.key_condition_expression()),
                ("filter", input.filter_expression()),
                ("projection", input.projection_expression()),
            ],
        };

        labelled
            .into_iter()
            .filter_map(|(label, expression)| expression.map(|e| (label, e)))
            .collect()
    }

    /// Name placeholders
    pub fn expression_attribute_names(&self) -> Option<&HashMap<String, String>> {
        match self {
            Request::Get(input) => input.expression_attribute_names(),
            Request::Put(input) => input.expression_attribute_names(),
            Request::Update(input) => input.expression_attribute_names(),
            Request::Delete(input) => input.expression_attribute_names(),
            Request::Query(input) => input.expression_attribute_names(),
        }
    }

    /// Value placeholders
    pub fn expression_attribute_values(&self) -> Option<&HashMap<String, AttributeValue>> {
        match self {
            Request::Get(_) => None,
            Request::Put(input) => input.expression_attribute_values(),
            Request::Update(input) => input.expression_attribute_values(),
            Request::Delete(input) => input.expression_attribute_values(),
            Request::Query(input) => input.expression_attribute_values(),
        }
    }

    /// Item key, for point operations
    pub fn key(&self) -> Option<&HashMap<String, AttributeValue>> {
        match self {
            Request::Get(input) => input.key(),
            Request::Update(input) => input.key(),
            Request::Delete(input) => input.key(),
            Request::Put(_) | Request::Query(_) => None,
        }
    }
}

/// A provider response travelling back through the middleware pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    /// GetItem
    Get(GetItemOutput),
    /// PutItem
    Put(PutItemOutput),
    /// UpdateItem
    Update(UpdateItemOutput),
    /// DeleteItem
    Delete(DeleteItemOutput),
    /// Query
    Query(QueryOutput),
}

impl Response {
    /// DynamoDB operation name, e.g. `GetItem`.
    pub fn operation_name(&self) -> &'static str {
        match self {
            Response::Get(_) => "GetItem",
            Response::Put(_) => "PutItem",
            Response::Update(_) => "UpdateItem",
            Response::Delete(_) => "DeleteItem",
            Response::Query(_) => "Query",
        }
    }
}

static NEXT_TOKEN: AtomicU64 = AtomicU64::new(1);

/// Identifies one dispatch; compared by value at the end of the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestToken(u64);

impl RequestToken {
    fn next() -> Self {
        RequestToken(NEXT_TOKEN.fetch_add(1, Ordering::Relaxed))
    }
}

/// Per-dispatch state handed from middleware to middleware.
///
/// Middleware may inspect or adjust the request in place, but must forward
/// the context it received. A freshly constructed context carries a new
/// [`RequestToken`] and is rejected before the network call.
#[derive(Debug)]
pub struct RequestContext {
    request: Request,
    cancellation: CancellationToken,
    token: RequestToken,
}

impl RequestContext {
    /// New context with a fresh token.
    pub fn new(request: Request, cancellation: CancellationToken) -> Self {
        Self {
            request,
            cancellation,
            token: RequestToken::next(),
        }
    }

    /// The request being dispatched
    pub fn request(&self) -> &Request {
        &self.request
    }

    /// Adjust the request in place
    pub fn request_mut(&mut self) -> &mut Request {
        &mut self.request
    }

    /// Cancellation signal for this dispatch
    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancellation
    }

    /// Identity of this dispatch
    pub fn token(&self) -> RequestToken {
        self.token
    }

    pub(crate) fn into_parts(self) -> (Request, CancellationToken, RequestToken) {
        (self.request, self.cancellation, self.token)
    }
}
