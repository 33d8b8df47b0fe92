use std::fmt;
use std::sync::Arc;

use crate::Error;
use crate::expression::{ExpressionFn, ExpressionSelector, NameTracker, ValueTracker};
use crate::marshaller::EntityMarshaller;
use crate::table::TableAccess;

/// Clause callbacks accumulated by a chain of stages, not yet evaluated.
///
/// Every stage lowers to one of these variants and a single composer
/// resolves it, so the slot order lives in one place.
pub(crate) enum PendingExpression<A> {
    KeyCondition(ExpressionFn<A>),
    KeyConditionedFilter {
        key_condition: ExpressionFn<A>,
        filter: ExpressionFn<A>,
    },
    Condition(ExpressionFn<A>),
    Update(ExpressionFn<A>),
    ConditionalUpdate {
        update: ExpressionFn<A>,
        condition: ExpressionFn<A>,
    },
}

impl<A> PendingExpression<A> {
    /// Primary (key condition or update) and secondary (filter or condition) slots.
    fn clauses(&self) -> (Option<ExpressionFn<A>>, Option<ExpressionFn<A>>) {
        match self {
            PendingExpression::KeyCondition(key_condition) => (Some(Arc::clone(key_condition)), None),
            PendingExpression::KeyConditionedFilter {
                key_condition,
                filter,
            } => (Some(Arc::clone(key_condition)), Some(Arc::clone(filter))),
            PendingExpression::Condition(condition) => (None, Some(Arc::clone(condition))),
            PendingExpression::Update(update) => (Some(Arc::clone(update)), None),
            PendingExpression::ConditionalUpdate { update, condition } => {
                (Some(Arc::clone(update)), Some(Arc::clone(condition)))
            }
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            PendingExpression::KeyCondition(_) => "KeyCondition",
            PendingExpression::KeyConditionedFilter { .. } => "KeyConditionedFilter",
            PendingExpression::Condition(_) => "Condition",
            PendingExpression::Update(_) => "Update",
            PendingExpression::ConditionalUpdate { .. } => "ConditionalUpdate",
        }
    }
}

/// Resolve pending clauses through the table's marshaller.
pub(crate) fn compose<M: EntityMarshaller>(
    table: &TableAccess<M>,
    pending: &PendingExpression<M::Argument>,
) -> Result<ExpressionSelector<M::Argument>, Error> {
    let (primary, secondary) = pending.clauses();
    table
        .marshaller()
        .compose_attribute_expression(primary, secondary)
}

fn clause<A, F>(f: F) -> ExpressionFn<A>
where
    F: Fn(&mut NameTracker, &mut ValueTracker<'_, A>) -> String + Send + Sync + 'static,
{
    Arc::new(f)
}

macro_rules! stage {
    ($(#[$meta:meta])* $name:ident { $($field:ident),+ } => $pending:expr) => {
        $(#[$meta])*
        pub struct $name<M: EntityMarshaller> {
            pub(crate) table: TableAccess<M>,
            $(pub(crate) $field: ExpressionFn<M::Argument>,)+
        }

        impl<M: EntityMarshaller> $name<M> {
            /// The table binding this stage was derived from.
            pub fn table(&self) -> &TableAccess<M> {
                &self.table
            }

            pub(crate) fn pending(&self) -> PendingExpression<M::Argument> {
                $(let $field = Arc::clone(&self.$field);)+
                $pending
            }

            pub(crate) fn compose(&self) -> Result<ExpressionSelector<M::Argument>, Error> {
                compose(&self.table, &self.pending())
            }
        }

        impl<M: EntityMarshaller> fmt::Debug for $name<M> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.debug_struct(stringify!($name))
                    .field("table", &self.table)
                    .field("pending", &self.pending().kind())
                    .finish()
            }
        }
    };
}

stage!(
    /// A key condition, the starting point of a query.
    KeyCondition { key_condition } => PendingExpression::KeyCondition(key_condition)
);
stage!(
    /// A key condition followed by a filter.
    KeyConditionedFilter { key_condition, filter } => PendingExpression::KeyConditionedFilter {
        key_condition,
        filter,
    }
);
stage!(
    /// A condition for a put or delete, or the guard of an update.
    Condition { condition } => PendingExpression::Condition(condition)
);
stage!(
    /// An update expression without a condition.
    Update { update } => PendingExpression::Update(update)
);
stage!(
    /// An update expression guarded by a condition.
    ConditionalUpdate { update, condition } => PendingExpression::ConditionalUpdate {
        update,
        condition,
    }
);

impl<M: EntityMarshaller> TableAccess<M> {
    /// Start a query with a key condition.
    ///
    /// ```rust,ignore
    /// table.with_key_condition_expression(|names, values| {
    ///     format!("{} = {}", names.field("Id"), values.arg(|a| &a.id))
    /// })
    /// ```
    pub fn with_key_condition_expression<F>(&self, key_condition: F) -> KeyCondition<M>
    where
        F: Fn(&mut NameTracker, &mut ValueTracker<'_, M::Argument>) -> String
            + Send
            + Sync
            + 'static,
    {
        KeyCondition {
            table: self.clone(),
            key_condition: clause(key_condition),
        }
    }

    /// Start a conditional put, delete or update.
    pub fn with_condition_expression<F>(&self, condition: F) -> Condition<M>
    where
        F: Fn(&mut NameTracker, &mut ValueTracker<'_, M::Argument>) -> String
            + Send
            + Sync
            + 'static,
    {
        Condition {
            table: self.clone(),
            condition: clause(condition),
        }
    }

    /// Start an update.
    pub fn with_update_expression<F>(&self, update: F) -> Update<M>
    where
        F: Fn(&mut NameTracker, &mut ValueTracker<'_, M::Argument>) -> String
            + Send
            + Sync
            + 'static,
    {
        Update {
            table: self.clone(),
            update: clause(update),
        }
    }
}

impl<M: EntityMarshaller> KeyCondition<M> {
    /// Filter the items matched by the key condition.
    pub fn with_filter_expression<F>(self, filter: F) -> KeyConditionedFilter<M>
    where
        F: Fn(&mut NameTracker, &mut ValueTracker<'_, M::Argument>) -> String
            + Send
            + Sync
            + 'static,
    {
        KeyConditionedFilter {
            table: self.table,
            key_condition: self.key_condition,
            filter: clause(filter),
        }
    }
}

impl<M: EntityMarshaller> Condition<M> {
    /// Attach an update; the condition guards it.
    pub fn with_update_expression<F>(self, update: F) -> ConditionalUpdate<M>
    where
        F: Fn(&mut NameTracker, &mut ValueTracker<'_, M::Argument>) -> String
            + Send
            + Sync
            + 'static,
    {
        ConditionalUpdate {
            table: self.table,
            update: clause(update),
            condition: self.condition,
        }
    }
}

impl<M: EntityMarshaller> Update<M> {
    /// Guard the update with a condition.
    pub fn with_condition_expression<F>(self, condition: F) -> ConditionalUpdate<M>
    where
        F: Fn(&mut NameTracker, &mut ValueTracker<'_, M::Argument>) -> String
            + Send
            + Sync
            + 'static,
    {
        ConditionalUpdate {
            table: self.table,
            update: self.update,
            condition: clause(condition),
        }
    }
}
