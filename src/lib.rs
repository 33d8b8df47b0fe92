//! # Typed DynamoDB Requests
//!
//! Describe once how an entity maps to table attributes, then compose that
//! mapping with key selectors and condition, update or filter expressions to
//! get ready-to-send DynamoDB requests and handlers:
//! - Placeholder-backed expressions (`#Name`, `:p1`) built from closures
//! - Key composition for partition-only and partition plus range tables
//! - Get, Put, Update, Delete and Query request builders with tri-state overrides
//! - Handlers that dispatch, unmarshall and follow query pagination
//! - An ordered middleware pipeline around every network call
//! - Cancellation through `tokio_util::sync::CancellationToken`
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use aws_sdk_dynamodb::types::{ReturnValue, ScalarAttributeType};
//! use dynamo_request::{
//!     CancellationToken, Error, KeyMarshaller, KeyPart, OnTable, RequestHandler, RequestLogger,
//!     SerdeMarshaller,
//! };
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Debug, Clone, Serialize, Deserialize)]
//! #[serde(rename_all = "PascalCase")]
//! struct Cat {
//!     id: String,
//!     home_id: String,
//!     name: String,
//!     cuteness: f64,
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Error> {
//!     let cats = SerdeMarshaller::<Cat>::new(
//!         KeyMarshaller::partition("Id", ScalarAttributeType::S)
//!             .with_range("HomeId", ScalarAttributeType::S),
//!     )
//!     .on_table("Cats")?
//!     .with_client(dynamo_request::default_client().await);
//!
//!     // Delete a cat, returning the deleted item
//!     let delete = cats.to_delete_request_handler(
//!         |table| {
//!             Ok(table
//!                 .with_condition_expression(|names, values| {
//!                     format!(
//!                         "{} = {} AND {} = {}",
//!                         names.field("Id"),
//!                         values.key_arg("Id", |cat| &cat.id),
//!                         names.field("HomeId"),
//!                         values.key_arg("HomeId", |cat| &cat.home_id)
//!                     )
//!                 })
//!                 .to_delete_request_builder_by_keys(
//!                     KeyPart::by_ref(|cat: &Cat| &cat.id),
//!                     KeyPart::by_ref(|cat: &Cat| &cat.home_id),
//!                 )?
//!                 .with_return_values(ReturnValue::AllOld))
//!         },
//!         |options| {
//!             options.add_middleware(RequestLogger::new());
//!         },
//!     )?;
//!
//!     let cat = Cat {
//!         id: "c1".into(),
//!         home_id: "h1".into(),
//!         name: "Tom".into(),
//!         cuteness: 9.5,
//!     };
//!     let deleted = delete.send(&cat, &CancellationToken::new()).await?;
//!     println!("{:?}", deleted);
//!
//!     Ok(())
//! }
//! ```
#![warn(
    bad_style,
    dead_code,
    improper_ctypes,
    non_shorthand_field_patterns,
    no_mangle_generic_items,
    overflowing_literals,
    path_statements,
    patterns_in_fns_without_body,
    unconditional_recursion,
    unused,
    unused_allocation,
    unused_comparisons,
    unused_parens,
    while_true,
    missing_debug_implementations,
    missing_docs,
    trivial_casts,
    trivial_numeric_casts,
    unreachable_pub,
    unused_extern_crates,
    unused_import_braces,
    unused_qualifications,
    unused_results,
    deprecated,
    unknown_lints,
    unreachable_code,
    unused_mut
)]

mod error;
pub use error::Error;

/// Provider client seam and default SDK configuration
pub mod client;

/// Placeholder-backed attribute expressions
pub mod expression;

/// Key composition
pub mod keys;

/// Entity and key marshalling
pub mod marshaller;

mod table;

/// Expression stages and request builders
pub mod builders;

/// Middleware pipeline
pub mod pipeline;

/// Request handlers
pub mod handlers;

// Re-export main types for convenience
pub use builders::{
    Condition, ConditionalUpdate, DeleteRequestBuilder, GetRequestBuilder, KeyCondition,
    KeyConditionedFilter, PutRequestBuilder, QueryRequestBuilder, RequestBuilder, Update,
    UpdateKeySelector, UpdateRequestBuilder,
};
pub use client::{ItemClient, client_from_config, default_client, default_sdk_config};
pub use expression::{
    AttributeExpression, ExpressionFn, ExpressionSelector, NameTracker, ValueTracker,
    compose_attribute_expression, compose_keyed_attribute_expression,
};
pub use handlers::{
    DeleteRequestHandler, GetRequestHandler, HandlerOptions, PutRequestHandler,
    QueryRequestHandler, RequestHandler, UpdateRequestHandler, is_value_provided,
};
pub use keys::{KeyPart, KeySelector, compose_keys};
pub use marshaller::{EntityMarshaller, Item, KeyAttribute, KeyMarshaller, SerdeMarshaller};
pub use pipeline::{
    Continuation, Middleware, Next, Request, RequestContext, RequestLogger, RequestToken,
    Response, compose,
};
pub use table::{OnTable, TableAccess};
pub use tokio_util::sync::CancellationToken;

// Re-export aws-config types for configuration
pub use aws_config::{
    BehaviorVersion, Region, SdkConfig, defaults,
    meta::region::{ProvideRegion, RegionProviderChain},
    retry::{RetryConfig, RetryMode},
    timeout::TimeoutConfig,
};

// Re-export aws-types for advanced configuration
pub use aws_types::sdk_config::Builder as SdkConfigBuilder;
