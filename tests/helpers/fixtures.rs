/// Common test fixtures and data structures
///
/// Defines the `Cat` entity stored in the `Cats` table, keyed by `Id`
/// (partition) and `HomeId` (range).
use aws_sdk_dynamodb::types::ScalarAttributeType;
use dynamo_request::{Item, KeyMarshaller, OnTable, SerdeMarshaller, TableAccess};
use rusty_ulid::generate_ulid_string;
use serde::{Deserialize, Serialize};

/// A cat living in a home
#[derive(Serialize, Deserialize, PartialEq, Debug, Clone)]
#[serde(rename_all = "PascalCase")]
pub struct Cat {
    pub id: String,
    pub home_id: String,
    pub name: String,
    pub cuteness: f64,
}

#[allow(dead_code)]
impl Cat {
    /// A cat with fresh ids
    pub fn new(name: &str, cuteness: f64) -> Self {
        Self {
            id: generate_ulid_string(),
            home_id: generate_ulid_string(),
            name: name.to_string(),
            cuteness,
        }
    }

    /// A cat living in `home_id`
    pub fn in_home(home_id: &str, name: &str, cuteness: f64) -> Self {
        Self {
            home_id: home_id.to_string(),
            ..Self::new(name, cuteness)
        }
    }

    /// The cat as a DynamoDB item
    pub fn item(&self) -> Item {
        serde_dynamo::to_item(self).unwrap()
    }
}

/// `Cats` table binding without a client
#[allow(dead_code)]
pub fn cats_table() -> TableAccess<SerdeMarshaller<Cat>> {
    SerdeMarshaller::new(
        KeyMarshaller::partition("Id", ScalarAttributeType::S)
            .with_range("HomeId", ScalarAttributeType::S),
    )
    .on_table("Cats")
    .unwrap()
}

/// `Cats` table binding whose call-time argument is a home id
#[allow(dead_code)]
pub fn cats_by_home_table() -> TableAccess<SerdeMarshaller<Cat, String>> {
    SerdeMarshaller::new(
        KeyMarshaller::partition("Id", ScalarAttributeType::S)
            .with_range("HomeId", ScalarAttributeType::S),
    )
    .on_table("Cats")
    .unwrap()
}
