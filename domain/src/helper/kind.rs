//! Helper domain identifiers
//!
//! A [`HelperDomain`] is one of the seven fixed entity kinds the host platform
//! manages as "helpers". Parsing is strict: only the lowercase canonical form is
//! accepted, so `"INPUT_BOOLEAN"` is rejected rather than normalized.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

/// Returned when a string does not name one of the seven helper domains.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid domain '{0}'. Valid domains: {valid}", valid = HelperDomain::valid_list())]
pub struct UnknownDomain(pub String);

/// The closed set of helper domains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HelperDomain {
    /// Toggle
    InputBoolean,
    /// Numeric input with bounds
    InputNumber,
    /// Free-text input with length bounds
    InputText,
    /// Selection from an ordered list of options
    InputSelect,
    /// Date and/or time input
    InputDatetime,
    /// Integer counter
    Counter,
    /// Countdown timer
    Timer,
}

impl HelperDomain {
    /// All domains, in canonical listing order.
    pub const ALL: [HelperDomain; 7] = [
        HelperDomain::InputBoolean,
        HelperDomain::InputNumber,
        HelperDomain::InputText,
        HelperDomain::InputSelect,
        HelperDomain::InputDatetime,
        HelperDomain::Counter,
        HelperDomain::Timer,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            HelperDomain::InputBoolean => "input_boolean",
            HelperDomain::InputNumber => "input_number",
            HelperDomain::InputText => "input_text",
            HelperDomain::InputSelect => "input_select",
            HelperDomain::InputDatetime => "input_datetime",
            HelperDomain::Counter => "counter",
            HelperDomain::Timer => "timer",
        }
    }

    /// The key the host protocol expects for the object id on update/delete
    /// (e.g. `input_number_id`).
    pub fn id_key(&self) -> String {
        format!("{}_id", self.as_str())
    }

    fn valid_list() -> String {
        Self::ALL
            .iter()
            .map(|d| d.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl std::fmt::Display for HelperDomain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for HelperDomain {
    type Err = UnknownDomain;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|d| d.as_str() == s)
            .ok_or_else(|| UnknownDomain(s.to_string()))
    }
}
