//! Expression stages and request builders.
//!
//! A chain starts at a [`TableAccess`](crate::TableAccess), optionally passes
//! through expression stages that accumulate clause callbacks, and ends in a
//! request builder. Nothing is evaluated until [`RequestBuilder::build`] is
//! called with a concrete argument.
//!
//! ```text
//! TableAccess ─ with_key_condition_expression ─ KeyCondition ─ with_filter_expression ─ KeyConditionedFilter
//!             ├ with_condition_expression ───── Condition ──── with_update_expression ─ ConditionalUpdate
//!             └ with_update_expression ──────── Update ─────── with_condition_expression ┘
//! ```

mod delete;
mod get;
mod put;
mod query;
mod stages;
mod update;

pub use delete::DeleteRequestBuilder;
pub use get::GetRequestBuilder;
pub use put::PutRequestBuilder;
pub use query::QueryRequestBuilder;
pub use stages::{Condition, ConditionalUpdate, KeyCondition, KeyConditionedFilter, Update};
pub use update::{UpdateKeySelector, UpdateRequestBuilder};

use crate::Error;

/// Turns a call-time argument into a provider request.
///
/// `build` is pure: the same argument and configuration always produce
/// structurally equal requests.
pub trait RequestBuilder<A>: Send + Sync {
    /// Provider request produced by this builder
    type Request;

    /// Build the request for `argument`.
    fn build(&self, argument: &A) -> Result<Self::Request, Error>;
}
