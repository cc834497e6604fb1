//! Address domain model.
//!
//! # Responsibility
//! - Represent one postal address snapshot owned by a person.
//! - Validate raw form input into a storable `NewAddress`.
//!
//! # Invariants
//! - `zipcode` is always seven ASCII digits once validated.
//! - `is_current` is true for at most one address per person.
//! - Superseded addresses are history and are never rewritten.

use crate::model::person::PersonId;
use crate::model::validation::{
    normalize_zipcode, optional_text, required_text, ValidationError, ADDRESS_LINE_MAX_CHARS,
    NAME_MAX_CHARS,
};
use serde::{Deserialize, Serialize};

/// Row id of an address. Ascending ids follow creation order.
pub type AddressId = i64;

/// Stored address snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub id: AddressId,
    pub person_id: PersonId,
    /// May differ from the person's name for joint addressing.
    pub family_name: String,
    pub given_name: String,
    pub joint_name1: Option<String>,
    /// Stored for the address book only; genenga has no column for it.
    pub joint_name2: Option<String>,
    pub zipcode: String,
    pub address1: String,
    pub address2: Option<String>,
    /// `false` means superseded by a later address.
    pub is_current: bool,
    /// Update timestamp in epoch milliseconds.
    pub updated_at: i64,
}

/// Raw address fields as submitted by a form or API caller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressInput {
    pub family_name: String,
    pub given_name: String,
    #[serde(default)]
    pub joint_name1: Option<String>,
    #[serde(default)]
    pub joint_name2: Option<String>,
    pub zipcode: String,
    pub address1: String,
    #[serde(default)]
    pub address2: Option<String>,
}

/// Validated address ready for insertion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAddress {
    pub family_name: String,
    pub given_name: String,
    pub joint_name1: Option<String>,
    pub joint_name2: Option<String>,
    pub zipcode: String,
    pub address1: String,
    pub address2: Option<String>,
}

impl TryFrom<&AddressInput> for NewAddress {
    type Error = ValidationError;

    fn try_from(input: &AddressInput) -> Result<Self, Self::Error> {
        Ok(Self {
            family_name: required_text("family_name", &input.family_name, NAME_MAX_CHARS)?,
            given_name: required_text("given_name", &input.given_name, NAME_MAX_CHARS)?,
            joint_name1: optional_text(
                "joint_name1",
                input.joint_name1.as_deref(),
                NAME_MAX_CHARS,
            )?,
            joint_name2: optional_text(
                "joint_name2",
                input.joint_name2.as_deref(),
                NAME_MAX_CHARS,
            )?,
            zipcode: normalize_zipcode(&input.zipcode)?,
            address1: required_text("address1", &input.address1, ADDRESS_LINE_MAX_CHARS)?,
            address2: optional_text(
                "address2",
                input.address2.as_deref(),
                ADDRESS_LINE_MAX_CHARS,
            )?,
        })
    }
}

impl NewAddress {
    /// Validates raw input. Equivalent to `NewAddress::try_from(input)`.
    pub fn parse(input: &AddressInput) -> Result<Self, ValidationError> {
        Self::try_from(input)
    }
}

#[cfg(test)]
mod tests {
    use super::{AddressInput, NewAddress};
    use crate::model::validation::ValidationError;

    fn input() -> AddressInput {
        AddressInput {
            family_name: "山田".to_string(),
            given_name: "太郎".to_string(),
            joint_name1: Some("花子".to_string()),
            joint_name2: Some(" ".to_string()),
            zipcode: "100-0001".to_string(),
            address1: "東京都千代田区千代田1-1".to_string(),
            address2: None,
        }
    }

    #[test]
    fn parse_normalizes_zipcode_and_blank_joint_names() {
        let parsed = NewAddress::parse(&input()).unwrap();
        assert_eq!(parsed.zipcode, "1000001");
        assert_eq!(parsed.joint_name1.as_deref(), Some("花子"));
        assert_eq!(parsed.joint_name2, None);
    }

    #[test]
    fn parse_requires_first_address_line() {
        let mut raw = input();
        raw.address1 = "   ".to_string();
        let err = NewAddress::parse(&raw).unwrap_err();
        assert_eq!(err, ValidationError::Blank { field: "address1" });
    }
}
