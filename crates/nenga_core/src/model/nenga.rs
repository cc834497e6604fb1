//! Year and card-record (nenga) domain model.
//!
//! # Responsibility
//! - Define the closed status domains of a card record.
//! - Decode bulk-update requests into a typed `StatusChange` before any
//!   storage access.
//!
//! # Invariants
//! - `printing` and `received` codes are 0..=2, `mourning` codes are 0..=1.
//! - One record exists per (address, year) and only rollover creates it.

use crate::model::address::{Address, AddressId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Row id of a card record. Ascending ids follow rollover order.
pub type NengaId = i64;

/// Calendar year a card set belongs to.
pub type YearNumber = i32;

/// Year row with its edit lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Year {
    pub year: YearNumber,
    /// Locked years reject bulk status updates.
    pub locked: bool,
}

/// Send status of our card to an address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrintingStatus {
    NotSent,
    Sent,
    /// Sent late, in reply to a card we received.
    SentAsReply,
}

/// Receive status of a card from an address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReceivedStatus {
    NotReceived,
    Received,
    /// Their card arrived as a reply to ours.
    ReceivedAsReply,
}

/// Mourning status of the household for this year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MourningStatus {
    Normal,
    InMourning,
}

impl PrintingStatus {
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Self::NotSent),
            1 => Some(Self::Sent),
            2 => Some(Self::SentAsReply),
            _ => None,
        }
    }

    pub fn code(self) -> i64 {
        match self {
            Self::NotSent => 0,
            Self::Sent => 1,
            Self::SentAsReply => 2,
        }
    }
}

impl ReceivedStatus {
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Self::NotReceived),
            1 => Some(Self::Received),
            2 => Some(Self::ReceivedAsReply),
            _ => None,
        }
    }

    pub fn code(self) -> i64 {
        match self {
            Self::NotReceived => 0,
            Self::Received => 1,
            Self::ReceivedAsReply => 2,
        }
    }
}

impl MourningStatus {
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Self::Normal),
            1 => Some(Self::InMourning),
            _ => None,
        }
    }

    pub fn code(self) -> i64 {
        match self {
            Self::Normal => 0,
            Self::InMourning => 1,
        }
    }
}

/// Card record for one address in one year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NengaRecord {
    pub id: NengaId,
    pub address_id: AddressId,
    pub year: YearNumber,
    pub printing: PrintingStatus,
    pub received: ReceivedStatus,
    pub mourning: MourningStatus,
    /// Update timestamp in epoch milliseconds.
    pub updated_at: i64,
}

impl NengaRecord {
    /// Status a freshly rolled-over record starts with.
    ///
    /// Sending is opt-out: the address book exists to send cards.
    pub const DEFAULT_PRINTING: PrintingStatus = PrintingStatus::Sent;
    pub const DEFAULT_RECEIVED: ReceivedStatus = ReceivedStatus::NotReceived;
    pub const DEFAULT_MOURNING: MourningStatus = MourningStatus::Normal;
}

/// Card record joined with the address it was created for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NengaEntry {
    pub record: NengaRecord,
    pub address: Address,
}

/// Externally settable card-record columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NengaField {
    Printing,
    Received,
    Mourning,
}

impl NengaField {
    /// Storage column backing this field.
    pub fn column(self) -> &'static str {
        match self {
            Self::Printing => "printing",
            Self::Received => "received",
            Self::Mourning => "mourning",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "printing" => Some(Self::Printing),
            "received" => Some(Self::Received),
            "mourning" => Some(Self::Mourning),
            _ => None,
        }
    }
}

impl Display for NengaField {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.column())
    }
}

/// One field assignment with a value already inside its domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusChange {
    Printing(PrintingStatus),
    Received(ReceivedStatus),
    Mourning(MourningStatus),
}

/// Rejected bulk-update request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusChangeError {
    /// Action string is not `<field>_<value>`.
    MalformedAction(String),
    /// Field is not one of printing/received/mourning.
    UnknownField(String),
    /// Value lies outside the field's domain.
    ValueOutOfDomain { field: NengaField, value: i64 },
}

impl Display for StatusChangeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MalformedAction(value) => {
                write!(f, "bulk action must look like `<field>_<value>`, got `{value}`")
            }
            Self::UnknownField(value) => write!(
                f,
                "unknown nenga field `{value}`; expected printing|received|mourning"
            ),
            Self::ValueOutOfDomain { field, value } => {
                write!(f, "value {value} is out of range for `{field}`")
            }
        }
    }
}

impl Error for StatusChangeError {}

impl StatusChange {
    /// Validates a field name and integer code.
    pub fn from_field_value(field: &str, value: i64) -> Result<Self, StatusChangeError> {
        let field = NengaField::parse(field)
            .ok_or_else(|| StatusChangeError::UnknownField(field.to_string()))?;
        let change = match field {
            NengaField::Printing => PrintingStatus::from_code(value).map(Self::Printing),
            NengaField::Received => ReceivedStatus::from_code(value).map(Self::Received),
            NengaField::Mourning => MourningStatus::from_code(value).map(Self::Mourning),
        };
        change.ok_or(StatusChangeError::ValueOutOfDomain { field, value })
    }

    pub fn field(self) -> NengaField {
        match self {
            Self::Printing(_) => NengaField::Printing,
            Self::Received(_) => NengaField::Received,
            Self::Mourning(_) => NengaField::Mourning,
        }
    }

    /// Integer code persisted for this change.
    pub fn code(self) -> i64 {
        match self {
            Self::Printing(status) => status.code(),
            Self::Received(status) => status.code(),
            Self::Mourning(status) => status.code(),
        }
    }
}

impl FromStr for StatusChange {
    type Err = StatusChangeError;

    /// Decodes a bulk action of the form `<field>_<value>`, e.g. `printing_2`.
    fn from_str(action: &str) -> Result<Self, Self::Err> {
        let (field, value) = action
            .trim()
            .rsplit_once('_')
            .ok_or_else(|| StatusChangeError::MalformedAction(action.to_string()))?;
        let value = value
            .parse::<i64>()
            .map_err(|_| StatusChangeError::MalformedAction(action.to_string()))?;
        Self::from_field_value(field, value)
    }
}

/// Bulk status update over a set of card records of one year.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkUpdate {
    pub ids: BTreeSet<NengaId>,
    pub change: StatusChange,
}

impl BulkUpdate {
    pub fn new(ids: impl IntoIterator<Item = NengaId>, change: StatusChange) -> Self {
        Self {
            ids: ids.into_iter().collect(),
            change,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{
        MourningStatus, NengaField, PrintingStatus, ReceivedStatus, StatusChange,
        StatusChangeError,
    };

    #[test]
    fn action_string_decodes_into_typed_change() {
        assert_eq!(
            "printing_2".parse::<StatusChange>().unwrap(),
            StatusChange::Printing(PrintingStatus::SentAsReply)
        );
        assert_eq!(
            "received_1".parse::<StatusChange>().unwrap(),
            StatusChange::Received(ReceivedStatus::Received)
        );
        assert_eq!(
            "mourning_0".parse::<StatusChange>().unwrap(),
            StatusChange::Mourning(MourningStatus::Normal)
        );
    }

    #[test]
    fn mourning_rejects_reply_code() {
        let err = StatusChange::from_field_value("mourning", 2).unwrap_err();
        assert_eq!(
            err,
            StatusChangeError::ValueOutOfDomain {
                field: NengaField::Mourning,
                value: 2
            }
        );
    }

    #[test]
    fn unknown_and_malformed_actions_are_rejected() {
        assert!(matches!(
            "bogus_1".parse::<StatusChange>(),
            Err(StatusChangeError::UnknownField(field)) if field == "bogus"
        ));
        assert!(matches!(
            "printing".parse::<StatusChange>(),
            Err(StatusChangeError::MalformedAction(_))
        ));
        assert!(matches!(
            "printing_x".parse::<StatusChange>(),
            Err(StatusChangeError::MalformedAction(_))
        ));
    }

    #[test]
    fn status_serializes_as_snake_case() {
        let json = serde_json::to_string(&PrintingStatus::SentAsReply).unwrap();
        assert_eq!(json, "\"sent_as_reply\"");
    }
}
