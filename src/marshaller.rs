//! Entity and key marshalling.

use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;

use aws_sdk_dynamodb::types::{AttributeValue, ScalarAttributeType};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::Error;
use crate::expression::{ExpressionFn, ExpressionSelector, compose_keyed_attribute_expression};

/// A DynamoDB item: attribute name to attribute value.
pub type Item = HashMap<String, AttributeValue>;

/// Converts an entity to and from DynamoDB items.
///
/// `Argument` is the call-time argument type that condition, update and key
/// selectors read from. Put requests marshall it directly, so marshallers
/// used for writes usually set `Argument = Entity`.
pub trait EntityMarshaller: Send + Sync + 'static {
    /// The entity stored in the table
    type Entity: Send + 'static;
    /// The call-time argument expressions are resolved against
    type Argument: Send + Sync + 'static;

    /// Convert an entity to an item.
    fn marshall(&self, entity: &Self::Entity) -> Result<Item, Error>;

    /// Convert an item back to an entity; fails naming the field on missing
    /// or malformed data.
    fn unmarshall(&self, item: Item) -> Result<Self::Entity, Error>;

    /// Key schema of the table's primary key.
    fn primary_key_marshaller(&self) -> &KeyMarshaller;

    /// Compose up to two clauses against this marshaller's argument type.
    ///
    /// Key attribute values registered through
    /// [`ValueTracker::key_value`](crate::ValueTracker::key_value) are checked
    /// against [`primary_key_marshaller`](Self::primary_key_marshaller).
    fn compose_attribute_expression(
        &self,
        primary: Option<ExpressionFn<Self::Argument>>,
        secondary: Option<ExpressionFn<Self::Argument>>,
    ) -> Result<ExpressionSelector<Self::Argument>, Error> {
        compose_keyed_attribute_expression(self.primary_key_marshaller(), primary, secondary)
    }
}

/// A key attribute name and its declared scalar type.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyAttribute {
    /// Attribute name
    pub name: String,
    /// Declared attribute type (S, N or B)
    pub attribute_type: ScalarAttributeType,
}

impl KeyAttribute {
    /// Create a key attribute.
    pub fn new(name: impl Into<String>, attribute_type: ScalarAttributeType) -> Self {
        Self {
            name: name.into(),
            attribute_type,
        }
    }

    pub(crate) fn convert<V>(&self, value: &V) -> Result<AttributeValue, Error>
    where
        V: Serialize + ?Sized,
    {
        let attribute: AttributeValue = serde_dynamo::to_attribute_value(value)
            .map_err(|e| Error::marshalling(self.name.clone(), e.to_string()))?;

        let matches = match (&self.attribute_type, &attribute) {
            (ScalarAttributeType::S, AttributeValue::S(_)) => true,
            (ScalarAttributeType::N, AttributeValue::N(_)) => true,
            (ScalarAttributeType::B, AttributeValue::B(_)) => true,
            _ => false,
        };

        if !matches {
            return Err(Error::marshalling(
                self.name.clone(),
                format!(
                    "expected {} key attribute, got {}",
                    self.attribute_type.as_str(),
                    attribute_kind(&attribute)
                ),
            ));
        }

        Ok(attribute)
    }
}

fn attribute_kind(attribute: &AttributeValue) -> &'static str {
    match attribute {
        AttributeValue::S(_) => "S",
        AttributeValue::N(_) => "N",
        AttributeValue::B(_) => "B",
        AttributeValue::Bool(_) => "BOOL",
        AttributeValue::Null(_) => "NULL",
        AttributeValue::L(_) => "L",
        AttributeValue::M(_) => "M",
        AttributeValue::Ss(_) => "SS",
        AttributeValue::Ns(_) => "NS",
        AttributeValue::Bs(_) => "BS",
        _ => "unknown",
    }
}

/// Builds key maps for a table's primary key (or an index key).
#[derive(Debug, Clone, PartialEq)]
pub struct KeyMarshaller {
    partition: KeyAttribute,
    range: Option<KeyAttribute>,
}

impl KeyMarshaller {
    /// Key schema with only a partition key.
    pub fn partition(name: impl Into<String>, attribute_type: ScalarAttributeType) -> Self {
        Self {
            partition: KeyAttribute::new(name, attribute_type),
            range: None,
        }
    }

    /// Add a range (sort) key.
    pub fn with_range(
        mut self,
        name: impl Into<String>,
        attribute_type: ScalarAttributeType,
    ) -> Self {
        self.range = Some(KeyAttribute::new(name, attribute_type));
        self
    }

    /// The partition key attribute.
    pub fn partition_attribute(&self) -> &KeyAttribute {
        &self.partition
    }

    /// The range key attribute, if the schema has one.
    pub fn range_attribute(&self) -> Option<&KeyAttribute> {
        self.range.as_ref()
    }

    /// The key attribute called `name`, partition or range.
    pub fn attribute(&self, name: &str) -> Option<&KeyAttribute> {
        std::iter::once(&self.partition)
            .chain(self.range.as_ref())
            .find(|attribute| attribute.name == name)
    }

    /// Key map holding only the partition key.
    pub fn partition_key<V: Serialize + ?Sized>(&self, value: &V) -> Result<Item, Error> {
        let mut key = Item::new();
        let _ = key.insert(self.partition.name.clone(), self.partition.convert(value)?);
        Ok(key)
    }

    /// Key map holding only the range key.
    pub fn range_key<V: Serialize + ?Sized>(&self, value: &V) -> Result<Item, Error> {
        let range = self.require_range()?;
        let mut key = Item::new();
        let _ = key.insert(range.name.clone(), range.convert(value)?);
        Ok(key)
    }

    /// Key map holding both the partition and the range key.
    pub fn keys<P, R>(&self, partition: &P, range: &R) -> Result<Item, Error>
    where
        P: Serialize + ?Sized,
        R: Serialize + ?Sized,
    {
        let range_attribute = self.require_range()?;
        let mut key = self.partition_key(partition)?;
        let _ = key.insert(range_attribute.name.clone(), range_attribute.convert(range)?);
        Ok(key)
    }

    fn require_range(&self) -> Result<&KeyAttribute, Error> {
        self.range.as_ref().ok_or_else(|| {
            Error::configuration(format!(
                "key schema with partition key `{}` has no range key",
                self.partition.name
            ))
        })
    }
}

/// Marshaller backed by `serde_dynamo`.
///
/// ```rust
/// use aws_sdk_dynamodb::types::ScalarAttributeType;
/// use dynamo_request::{KeyMarshaller, SerdeMarshaller};
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Serialize, Deserialize)]
/// struct User {
///     id: String,
///     name: String,
/// }
///
/// let marshaller: SerdeMarshaller<User> =
///     SerdeMarshaller::new(KeyMarshaller::partition("id", ScalarAttributeType::S));
/// ```
pub struct SerdeMarshaller<T, A = T> {
    keys: KeyMarshaller,
    _marker: PhantomData<fn() -> (T, A)>,
}

impl<T, A> SerdeMarshaller<T, A> {
    /// Create a marshaller for the given primary key schema.
    pub fn new(keys: KeyMarshaller) -> Self {
        Self {
            keys,
            _marker: PhantomData,
        }
    }
}

impl<T, A> Clone for SerdeMarshaller<T, A> {
    fn clone(&self) -> Self {
        Self::new(self.keys.clone())
    }
}

impl<T, A> fmt::Debug for SerdeMarshaller<T, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SerdeMarshaller")
            .field("entity", &std::any::type_name::<T>())
            .field("argument", &std::any::type_name::<A>())
            .field("keys", &self.keys)
            .finish()
    }
}

impl<T, A> EntityMarshaller for SerdeMarshaller<T, A>
where
    T: Serialize + DeserializeOwned + Send + 'static,
    A: Send + Sync + 'static,
{
    type Entity = T;
    type Argument = A;

    fn marshall(&self, entity: &T) -> Result<Item, Error> {
        Ok(serde_dynamo::to_item(entity)?)
    }

    fn unmarshall(&self, item: Item) -> Result<T, Error> {
        Ok(serde_dynamo::from_item(item)?)
    }

    fn primary_key_marshaller(&self) -> &KeyMarshaller {
        &self.keys
    }
}
