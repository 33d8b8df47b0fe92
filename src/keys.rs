//! Key composition: typed key selectors to key attribute maps.

use std::fmt;
use std::sync::Arc;

use aws_sdk_dynamodb::types::AttributeValue;
use serde::Serialize;

use crate::Error;
use crate::marshaller::{Item, KeyAttribute, KeyMarshaller};

/// Produces the key map for one call-time argument.
pub type KeySelector<A> = Arc<dyn Fn(&A) -> Result<Item, Error> + Send + Sync>;

type PartSelector<A> =
    Arc<dyn Fn(&KeyAttribute, &A) -> Result<AttributeValue, Error> + Send + Sync>;

/// Selects one key value (partition or range) from the call-time argument.
pub struct KeyPart<A> {
    select: PartSelector<A>,
}

impl<A: 'static> KeyPart<A> {
    /// Select an owned value: `KeyPart::new(|cat: &Cat| cat.age)`.
    pub fn new<V, F>(select: F) -> Self
    where
        V: Serialize + 'static,
        F: Fn(&A) -> V + Send + Sync + 'static,
    {
        Self {
            select: Arc::new(move |attribute: &KeyAttribute, argument: &A| {
                attribute.convert(&select(argument))
            }),
        }
    }

    /// Select a borrowed value: `KeyPart::by_ref(|cat: &Cat| &cat.id)`.
    pub fn by_ref<V, F>(select: F) -> Self
    where
        V: Serialize + ?Sized + 'static,
        F: Fn(&A) -> &V + Send + Sync + 'static,
    {
        Self {
            select: Arc::new(move |attribute: &KeyAttribute, argument: &A| {
                attribute.convert(select(argument))
            }),
        }
    }
}

impl<A> KeyPart<A>
where
    A: Serialize + 'static,
{
    /// Use the whole argument as the key value.
    pub fn argument() -> Self {
        Self::by_ref(|argument: &A| argument)
    }
}

impl<A> Clone for KeyPart<A> {
    fn clone(&self) -> Self {
        Self {
            select: Arc::clone(&self.select),
        }
    }
}

impl<A> fmt::Debug for KeyPart<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPart").finish_non_exhaustive()
    }
}

/// Compose partition and range selectors into a [`KeySelector`].
///
/// Supports partition-only, range-only and partition plus range. Selecting
/// neither, or a range key on a schema without one, is a configuration error.
pub fn compose_keys<A: 'static>(
    keys: &KeyMarshaller,
    partition: Option<KeyPart<A>>,
    range: Option<KeyPart<A>>,
) -> Result<KeySelector<A>, Error> {
    let range_attribute = match (&range, keys.range_attribute()) {
        (Some(_), None) => {
            return Err(Error::configuration(format!(
                "a range key was selected but the key schema with partition key `{}` has none",
                keys.partition_attribute().name
            )));
        }
        (Some(_), Some(attribute)) => Some(attribute.clone()),
        (None, _) => None,
    };

    let parts: Vec<(KeyAttribute, KeyPart<A>)> = match (partition, range) {
        (None, None) => {
            return Err(Error::configuration(
                "a key selector needs a partition key, a range key or both",
            ));
        }
        (partition, range) => partition
            .map(|p| (keys.partition_attribute().clone(), p))
            .into_iter()
            .chain(range_attribute.zip(range))
            .collect(),
    };

    Ok(Arc::new(move |argument: &A| {
        let mut key = Item::with_capacity(parts.len());
        for (attribute, part) in &parts {
            let value = (part.select)(attribute, argument)?;
            let _ = key.insert(attribute.name.clone(), value);
        }
        Ok(key)
    }))
}
