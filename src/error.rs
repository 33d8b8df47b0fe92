use aws_sdk_dynamodb::error::BuildError;
use aws_sdk_dynamodb::operation::delete_item::DeleteItemError;
use aws_sdk_dynamodb::operation::get_item::GetItemError;
use aws_sdk_dynamodb::operation::put_item::PutItemError;
use aws_sdk_dynamodb::operation::query::QueryError;
use aws_sdk_dynamodb::operation::update_item::UpdateItemError;
use aws_smithy_runtime_api::client::result::SdkError;
use aws_smithy_runtime_api::http::Response;
use serde_dynamo::Error as SerdeDynamoError;
use std::error::Error as StdError;
use std::fmt;

pub(crate) type DynamoGetError = SdkError<GetItemError, Response>;
pub(crate) type DynamoPutError = SdkError<PutItemError, Response>;
pub(crate) type DynamoUpdateError = SdkError<UpdateItemError, Response>;
pub(crate) type DynamoDeleteItemError = SdkError<DeleteItemError, Response>;
pub(crate) type DynamoQueryError = SdkError<QueryError, Response>;

/// Errors raised while building, dispatching or unmarshalling a request.
///
/// Variants fall into four families that callers can branch on:
/// marshalling ([`Error::is_marshalling_error`]), configuration
/// ([`Error::is_configuration_error`]), transport ([`Error::is_transport_error`])
/// and cancellation ([`Error::is_cancelled`]).
#[derive(Debug)]
pub enum Error {
    /// Serde DynamoDB serialization/deserialization error
    SerdeDynamo(SerdeDynamoError),
    /// A value could not be converted to or from the attribute type of a field
    Marshalling {
        /// Attribute name or value placeholder that failed
        field: String,
        /// What went wrong
        reason: String,
    },
    /// DynamoDB request builder error
    BuildError(BuildError),
    /// Invalid setup: empty table name, missing clause, missing client
    Configuration(String),
    /// A middleware broke the request context contract
    InvalidOperation(String),
    /// The cancellation token fired before the call completed
    Cancelled,
    /// Failure reported by a custom [`ItemClient`](crate::ItemClient) implementation
    Client(String),
    /// DynamoDB GetItem operation error
    DynamoGetError(DynamoGetError),
    /// DynamoDB PutItem operation error
    DynamoPutError(DynamoPutError),
    /// DynamoDB UpdateItem operation error
    DynamoUpdateError(DynamoUpdateError),
    /// DynamoDB DeleteItem operation error
    DynamoDeleteItemError(DynamoDeleteItemError),
    /// DynamoDB Query operation error
    DynamoQueryError(DynamoQueryError),
}

impl Error {
    pub(crate) fn marshalling(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::Marshalling {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn configuration(message: impl Into<String>) -> Self {
        Error::Configuration(message.into())
    }

    /// Check if the error is a DynamoDB ConditionalCheckFailedException
    ///
    /// Covers PutItem, UpdateItem and DeleteItem, the operations that accept
    /// a condition expression.
    ///
    /// # Example
    /// ```no_run
    /// # use dynamo_request::Error;
    /// # fn example(error: Error) {
    /// if error.is_conditional_check_failed() {
    ///     println!("Item was modified by another process");
    /// }
    /// # }
    /// ```
    pub fn is_conditional_check_failed(&self) -> bool {
        match self {
            Error::DynamoPutError(e) => matches!(
                e.as_service_error(),
                Some(PutItemError::ConditionalCheckFailedException(_))
            ),
            Error::DynamoUpdateError(e) => matches!(
                e.as_service_error(),
                Some(UpdateItemError::ConditionalCheckFailedException(_))
            ),
            Error::DynamoDeleteItemError(e) => matches!(
                e.as_service_error(),
                Some(DeleteItemError::ConditionalCheckFailedException(_))
            ),
            _ => false,
        }
    }

    /// Returns `true` when a value could not be converted to or from attributes.
    pub fn is_marshalling_error(&self) -> bool {
        matches!(self, Error::SerdeDynamo(_) | Error::Marshalling { .. })
    }

    /// Returns `true` for setup mistakes detected at build or first invoke.
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            Error::Configuration(_) | Error::BuildError(_) | Error::InvalidOperation(_)
        )
    }

    /// Returns `true` for anything raised by the underlying client.
    pub fn is_transport_error(&self) -> bool {
        matches!(
            self,
            Error::Client(_)
                | Error::DynamoGetError(_)
                | Error::DynamoPutError(_)
                | Error::DynamoUpdateError(_)
                | Error::DynamoDeleteItemError(_)
                | Error::DynamoQueryError(_)
        )
    }

    /// Returns `true` if the call was aborted through its cancellation token.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled)
    }
}

macro_rules! impl_from_error {
    ($name:ident, $variant:ident) => {
        impl From<$name> for Error {
            fn from(e: $name) -> Self {
                Error::$variant(e)
            }
        }
    };
    ($name:ident) => {
        impl From<$name> for Error {
            fn from(e: $name) -> Self {
                Error::$name(e)
            }
        }
    };
}

impl_from_error!(SerdeDynamoError, SerdeDynamo);
impl_from_error!(BuildError);
impl_from_error!(DynamoGetError);
impl_from_error!(DynamoPutError);
impl_from_error!(DynamoUpdateError);
impl_from_error!(DynamoDeleteItemError);
impl_from_error!(DynamoQueryError);

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::SerdeDynamo(e) => write!(f, "DynamoDB serialization error: {}", e),
            Error::Marshalling { field, reason } => {
                write!(f, "failed to marshall `{}`: {}", field, reason)
            }
            Error::BuildError(e) => write!(f, "DynamoDB request builder error: {}", e),
            Error::Configuration(message) => write!(f, "invalid configuration: {}", message),
            Error::InvalidOperation(message) => write!(f, "invalid operation: {}", message),
            Error::Cancelled => write!(f, "request was cancelled"),
            Error::Client(message) => write!(f, "DynamoDB client error: {}", message),
            Error::DynamoGetError(e) => {
                write!(f, "DynamoDB GetItem operation failed: {}", e)
            }
            Error::DynamoPutError(e) => {
                write!(f, "DynamoDB PutItem operation failed: {}", e)
            }
            Error::DynamoUpdateError(e) => {
                write!(f, "DynamoDB UpdateItem operation failed: {}", e)
            }
            Error::DynamoDeleteItemError(e) => {
                write!(f, "DynamoDB DeleteItem operation failed: {}", e)
            }
            Error::DynamoQueryError(e) => {
                write!(f, "DynamoDB Query operation failed: {}", e)
            }
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Error::SerdeDynamo(e) => Some(e),
            Error::BuildError(e) => Some(e),
            Error::DynamoGetError(e) => Some(e),
            Error::DynamoPutError(e) => Some(e),
            Error::DynamoUpdateError(e) => Some(e),
            Error::DynamoDeleteItemError(e) => Some(e),
            Error::DynamoQueryError(e) => Some(e),
            _ => None,
        }
    }
}
