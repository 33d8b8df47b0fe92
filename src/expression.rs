//! Placeholder-backed attribute expressions.
//!
//! Clauses are written as callbacks that receive a [`NameTracker`] for entity
//! fields and a [`ValueTracker`] for the call-time argument. Every reference
//! goes through a placeholder (`#Name` for names, `:pN` for values), so
//! reserved words and user data never end up inlined in the expression text.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use aws_sdk_dynamodb::types::AttributeValue;
use serde::Serialize;

use crate::Error;
use crate::marshaller::KeyMarshaller;

/// Caller-supplied clause: renders an expression string while registering
/// the names and values it references.
pub type ExpressionFn<A> =
    Arc<dyn Fn(&mut NameTracker, &mut ValueTracker<'_, A>) -> String + Send + Sync>;

/// Resolves a composed expression for one call-time argument.
pub type ExpressionSelector<A> =
    Arc<dyn Fn(&A) -> Result<AttributeExpression, Error> + Send + Sync>;

/// Wrap a closure as an [`ExpressionFn`].
pub fn expression<A, F>(f: F) -> ExpressionFn<A>
where
    F: Fn(&mut NameTracker, &mut ValueTracker<'_, A>) -> String + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Registers attribute names and hands out `#` placeholders for them.
#[derive(Debug, Default)]
pub struct NameTracker {
    names: HashMap<String, String>,
    placeholders: HashMap<String, String>,
}

impl NameTracker {
    /// Reference an attribute (or a dotted document path) by placeholder.
    ///
    /// `Name` becomes `#Name`, `Address.City` becomes `#Address.#City`.
    /// Referencing the same attribute twice returns the same placeholder.
    pub fn field(&mut self, path: &str) -> String {
        path.split('.')
            .map(|segment| self.segment(segment))
            .collect::<Vec<_>>()
            .join(".")
    }

    fn segment(&mut self, name: &str) -> String {
        if let Some(existing) = self.placeholders.get(name) {
            return existing.clone();
        }

        let base: String = name
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
            .collect();
        let mut placeholder = format!("#{}", base);
        let mut suffix = 1;
        while self.names.contains_key(&placeholder) {
            suffix += 1;
            placeholder = format!("#{}_{}", base, suffix);
        }

        let _ = self.names.insert(placeholder.clone(), name.to_string());
        let _ = self
            .placeholders
            .insert(name.to_string(), placeholder.clone());
        placeholder
    }

    /// Placeholder to attribute name map collected so far.
    pub fn names(&self) -> &HashMap<String, String> {
        &self.names
    }

    fn into_names(self) -> HashMap<String, String> {
        self.names
    }
}

/// Serializes values taken from the call-time argument into `:pN` placeholders.
///
/// Numbering is shared by every clause resolved with the same tracker, so
/// placeholders never collide across a primary and a secondary clause.
/// Values for key attributes can be checked against the table's key schema
/// with [`ValueTracker::key_value`] and [`ValueTracker::key_arg`].
pub struct ValueTracker<'a, A> {
    argument: &'a A,
    keys: Option<&'a KeyMarshaller>,
    values: HashMap<String, AttributeValue>,
    next: usize,
    error: Option<Error>,
}

impl<A> fmt::Debug for ValueTracker<'_, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValueTracker")
            .field("keys", &self.keys)
            .field("values", &self.values)
            .field("next", &self.next)
            .finish()
    }
}

impl<'a, A> ValueTracker<'a, A> {
    /// Start numbering at `:p1` for `argument`.
    pub fn new(argument: &'a A) -> Self {
        Self {
            argument,
            keys: None,
            values: HashMap::new(),
            next: 1,
            error: None,
        }
    }

    /// Check key attribute values against `keys`.
    pub fn with_keys(mut self, keys: &'a KeyMarshaller) -> Self {
        self.keys = Some(keys);
        self
    }

    /// The argument values are drawn from.
    pub fn argument(&self) -> &'a A {
        self.argument
    }

    /// Register `value` and return its placeholder.
    ///
    /// A value that cannot be serialized still yields a placeholder; the
    /// failure is reported when the expression is resolved.
    pub fn value<V: Serialize + ?Sized>(&mut self, value: &V) -> String {
        let placeholder = self.next_placeholder();
        let converted = serde_dynamo::to_attribute_value::<_, AttributeValue>(value)
            .map_err(|e| Error::marshalling(placeholder.clone(), e.to_string()));
        self.record(&placeholder, converted);
        placeholder
    }

    /// Register `value` for the key attribute `attribute`.
    ///
    /// The value must convert to the attribute's declared type (S, N or B);
    /// otherwise resolving the expression fails with a marshalling error
    /// naming the attribute. Naming an attribute outside the key schema, or
    /// resolving without a key schema, is a configuration error.
    pub fn key_value<V: Serialize + ?Sized>(&mut self, attribute: &str, value: &V) -> String {
        let placeholder = self.next_placeholder();
        let converted = match self.keys {
            Some(keys) => match keys.attribute(attribute) {
                Some(key) => key.convert(value),
                None => Err(Error::configuration(format!(
                    "`{}` is not a key attribute (placeholder {})",
                    attribute, placeholder
                ))),
            },
            None => Err(Error::configuration(format!(
                "no key schema to check `{}` against (placeholder {})",
                attribute, placeholder
            ))),
        };
        self.record(&placeholder, converted);
        placeholder
    }

    /// Select a key attribute value from the argument and register it.
    ///
    /// ```rust
    /// # use aws_sdk_dynamodb::types::ScalarAttributeType;
    /// # use dynamo_request::KeyMarshaller;
    /// # use dynamo_request::expression::{NameTracker, ValueTracker};
    /// struct ById { id: String }
    /// let keys = KeyMarshaller::partition("Id", ScalarAttributeType::S);
    /// let arg = ById { id: "c1".into() };
    /// let mut names = NameTracker::default();
    /// let mut values = ValueTracker::new(&arg).with_keys(&keys);
    /// let clause = format!("{} = {}", names.field("Id"), values.key_arg("Id", |a| &a.id));
    /// assert_eq!(clause, "#Id = :p1");
    /// ```
    pub fn key_arg<V, F>(&mut self, attribute: &str, select: F) -> String
    where
        V: Serialize,
        F: FnOnce(&'a A) -> V,
    {
        let value = select(self.argument);
        self.key_value(attribute, &value)
    }

    fn next_placeholder(&mut self) -> String {
        let placeholder = format!(":p{}", self.next);
        self.next += 1;
        placeholder
    }

    fn record(&mut self, placeholder: &str, converted: Result<AttributeValue, Error>) {
        match converted {
            Ok(attribute) => {
                let _ = self.values.insert(placeholder.to_string(), attribute);
            }
            Err(error) => {
                if self.error.is_none() {
                    self.error = Some(error);
                }
            }
        }
    }

    /// Select a value from the argument and register it.
    ///
    /// ```rust
    /// # use dynamo_request::expression::{NameTracker, ValueTracker};
    /// struct ById { id: String }
    /// let arg = ById { id: "c1".into() };
    /// let mut names = NameTracker::default();
    /// let mut values = ValueTracker::new(&arg);
    /// let clause = format!("{} = {}", names.field("Id"), values.arg(|a| &a.id));
    /// assert_eq!(clause, "#Id = :p1");
    /// ```
    pub fn arg<V, F>(&mut self, select: F) -> String
    where
        V: Serialize,
        F: FnOnce(&'a A) -> V,
    {
        let value = select(self.argument);
        self.value(&value)
    }

    fn finish(self) -> Result<HashMap<String, AttributeValue>, Error> {
        match self.error {
            Some(error) => Err(error),
            None => Ok(self.values),
        }
    }
}

/// Resolved names, values and clause strings for one request.
///
/// `expressions` holds the primary clause (key condition or update) first,
/// followed by the secondary clause (filter or condition) when present.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AttributeExpression {
    /// Placeholder to attribute name
    pub names: HashMap<String, String>,
    /// Placeholder to attribute value
    pub values: HashMap<String, AttributeValue>,
    /// Rendered clauses in composition order
    pub expressions: Vec<String>,
}

impl AttributeExpression {
    /// Names map, or `None` when empty; DynamoDB rejects empty maps.
    pub fn names_or_none(&self) -> Option<HashMap<String, String>> {
        (!self.names.is_empty()).then(|| self.names.clone())
    }

    /// Values map, or `None` when empty; DynamoDB rejects empty maps.
    pub fn values_or_none(&self) -> Option<HashMap<String, AttributeValue>> {
        (!self.values.is_empty()).then(|| self.values.clone())
    }

    pub(crate) fn expression(&self, index: usize) -> Option<String> {
        self.expressions.get(index).cloned()
    }
}

/// Compose up to two clauses into a selector evaluated per call-time argument.
///
/// Both clauses share one name tracker and one value tracker, so the primary
/// clause is rendered first and numbering continues into the secondary one.
/// Supplying neither clause is a configuration error. Clauses composed this
/// way have no key schema, so [`ValueTracker::key_value`] fails; use
/// [`compose_keyed_attribute_expression`] for type-checked key values.
pub fn compose_attribute_expression<A: 'static>(
    primary: Option<ExpressionFn<A>>,
    secondary: Option<ExpressionFn<A>>,
) -> Result<ExpressionSelector<A>, Error> {
    compose(None, primary, secondary)
}

/// Like [`compose_attribute_expression`], checking key attribute values
/// against `keys`.
pub fn compose_keyed_attribute_expression<A: 'static>(
    keys: &KeyMarshaller,
    primary: Option<ExpressionFn<A>>,
    secondary: Option<ExpressionFn<A>>,
) -> Result<ExpressionSelector<A>, Error> {
    compose(Some(keys.clone()), primary, secondary)
}

fn compose<A: 'static>(
    keys: Option<KeyMarshaller>,
    primary: Option<ExpressionFn<A>>,
    secondary: Option<ExpressionFn<A>>,
) -> Result<ExpressionSelector<A>, Error> {
    let clauses: Vec<ExpressionFn<A>> = match (primary, secondary) {
        (None, None) => {
            return Err(Error::configuration(
                "an attribute expression needs at least one clause",
            ));
        }
        (Some(p), None) => vec![p],
        (None, Some(s)) => vec![s],
        (Some(p), Some(s)) => vec![p, s],
    };

    Ok(Arc::new(move |argument: &A| {
        let mut names = NameTracker::default();
        let mut values = ValueTracker {
            keys: keys.as_ref(),
            ..ValueTracker::new(argument)
        };
        let expressions = clauses
            .iter()
            .map(|clause| clause(&mut names, &mut values))
            .collect::<Vec<_>>();
        tracing::trace!(?expressions, "resolved attribute expression");

        Ok(AttributeExpression {
            names: names.into_names(),
            values: values.finish()?,
            expressions,
        })
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_dynamodb::types::ScalarAttributeType;
    use serde::ser::{Error as _, Serializer};

    struct Arg {
        id: String,
        score: f64,
    }

    struct Unserializable;

    impl Serialize for Unserializable {
        fn serialize<S: Serializer>(&self, _: S) -> Result<S::Ok, S::Error> {
            Err(S::Error::custom("not representable"))
        }
    }

    fn arg() -> Arg {
        Arg {
            id: "cat-1".to_string(),
            score: 4.5,
        }
    }

    #[test]
    fn test_name_placeholders_are_stable() {
        let mut names = NameTracker::default();
        assert_eq!(names.field("Name"), "#Name");
        assert_eq!(names.field("Name"), "#Name");
        assert_eq!(names.field("Address.City"), "#Address.#City");
        assert_eq!(names.names().len(), 3);
        assert_eq!(names.names()["#City"], "City");
    }

    #[test]
    fn test_name_placeholders_sanitize_and_disambiguate() {
        let mut names = NameTracker::default();
        assert_eq!(names.field("first-name"), "#first_name");
        assert_eq!(names.field("first_name"), "#first_name_2");
        assert_eq!(names.names()["#first_name"], "first-name");
        assert_eq!(names.names()["#first_name_2"], "first_name");
    }

    #[test]
    fn test_single_clause() {
        let condition = expression::<Arg, _>(|n, v| {
            format!("{} = {}", n.field("Id"), v.arg(|a| &a.id))
        });
        let selector = compose_attribute_expression(None, Some(condition)).unwrap();
        let resolved = selector(&arg()).unwrap();

        assert_eq!(resolved.expressions, vec!["#Id = :p1".to_string()]);
        assert_eq!(resolved.names["#Id"], "Id");
        assert_eq!(resolved.values[":p1"], AttributeValue::S("cat-1".to_string()));
    }

    #[test]
    fn test_two_clauses_share_numbering_and_keep_order() {
        let update = expression::<Arg, _>(|n, v| {
            format!("SET {} = {}", n.field("Cuteness"), v.arg(|a| a.score))
        });
        let condition = expression::<Arg, _>(|n, v| {
            format!(
                "{} = {} AND {} < {}",
                n.field("Id"),
                v.arg(|a| &a.id),
                n.field("Cuteness"),
                v.arg(|a| a.score)
            )
        });

        let selector = compose_attribute_expression(Some(update), Some(condition)).unwrap();
        let resolved = selector(&arg()).unwrap();

        assert_eq!(resolved.expressions.len(), 2);
        assert_eq!(resolved.expressions[0], "SET #Cuteness = :p1");
        assert_eq!(resolved.expressions[1], "#Id = :p2 AND #Cuteness < :p3");
        assert_eq!(resolved.values.len(), 3);
        assert_eq!(resolved.names.len(), 2);
    }

    #[test]
    fn test_resolution_is_repeatable() {
        let condition = expression::<Arg, _>(|n, v| {
            format!("{} = {}", n.field("Id"), v.arg(|a| &a.id))
        });
        let selector = compose_attribute_expression(Some(condition), None).unwrap();
        assert_eq!(selector(&arg()).unwrap(), selector(&arg()).unwrap());
    }

    #[test]
    fn test_no_clause_is_configuration_error() {
        let result = compose_attribute_expression::<Arg>(None, None);
        assert!(matches!(result, Err(Error::Configuration(_))));
    }

    #[test]
    fn test_unserializable_value_is_marshalling_error() {
        let condition =
            expression::<Arg, _>(|n, v| format!("{} = {}", n.field("Id"), v.value(&Unserializable)));
        let selector = compose_attribute_expression(Some(condition), None).unwrap();

        match selector(&arg()) {
            Err(Error::Marshalling { field, .. }) => assert_eq!(field, ":p1"),
            other => panic!("expected marshalling error, got {:?}", other),
        }
    }

    fn sensor_keys() -> KeyMarshaller {
        KeyMarshaller::partition("Sensor", ScalarAttributeType::N)
            .with_range("Id", ScalarAttributeType::S)
    }

    #[test]
    fn test_key_values_are_type_checked() {
        let condition = expression::<Arg, _>(|n, v| {
            format!(
                "{} = {} AND {} = {}",
                n.field("Sensor"),
                v.key_arg("Sensor", |a| a.score),
                n.field("Id"),
                v.key_arg("Id", |a| &a.id)
            )
        });
        let selector =
            compose_keyed_attribute_expression(&sensor_keys(), Some(condition), None).unwrap();
        let resolved = selector(&arg()).unwrap();

        assert_eq!(resolved.expressions[0], "#Sensor = :p1 AND #Id = :p2");
        assert_eq!(resolved.values[":p1"], AttributeValue::N("4.5".to_string()));
        assert_eq!(resolved.values[":p2"], AttributeValue::S("cat-1".to_string()));
    }

    #[test]
    fn test_mistyped_key_value_names_the_attribute() {
        let condition = expression::<Arg, _>(|n, v| {
            format!("{} = {}", n.field("Sensor"), v.key_arg("Sensor", |a| &a.id))
        });
        let selector =
            compose_keyed_attribute_expression(&sensor_keys(), Some(condition), None).unwrap();

        match selector(&arg()) {
            Err(Error::Marshalling { field, reason }) => {
                assert_eq!(field, "Sensor");
                assert!(reason.contains("expected N"));
            }
            other => panic!("expected marshalling error, got {:?}", other),
        }
    }

    #[test]
    fn test_key_value_outside_schema_is_configuration_error() {
        let condition = expression::<Arg, _>(|n, v| {
            format!("{} = {}", n.field("Name"), v.key_arg("Name", |a| &a.id))
        });
        let keyed =
            compose_keyed_attribute_expression(&sensor_keys(), Some(condition.clone()), None)
                .unwrap();
        assert!(matches!(keyed(&arg()), Err(Error::Configuration(_))));

        let unkeyed = compose_attribute_expression(Some(condition), None).unwrap();
        assert!(matches!(unkeyed(&arg()), Err(Error::Configuration(_))));
    }

    #[test]
    fn test_empty_maps_are_omitted() {
        let empty = AttributeExpression::default();
        assert!(empty.names_or_none().is_none());
        assert!(empty.values_or_none().is_none());
    }
}
