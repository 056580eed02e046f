//! Domain registry: one immutable [`DomainSchema`] per helper domain
//!
//! The registry is a fixed table keyed by the closed [`HelperDomain`] enum.
//! Schemas are `static` data: built at compile time, never mutated, and safe to
//! share across threads without locking. Adding a domain is a new table entry,
//! not a new code path through the validation or command layers.
//!
//! | Domain | Required on create | Cross-field rules |
//! |--------|--------------------|-------------------|
//! | `input_boolean` | `name` | |
//! | `input_number` | `name`, `min`, `max` | `min ≤ max`, `step > 0`, `initial ∈ [min, max]` |
//! | `input_text` | `name` | `min ≤ max` |
//! | `input_select` | `name`, `options` | `initial ∈ options` |
//! | `input_datetime` | `name`, one of `has_date`/`has_time` | not both false |
//! | `counter` | `name` | `minimum ≤ maximum`, `step > 0`, `initial ∈ [minimum, maximum]` |
//! | `timer` | `name` | `0 < duration < 100h` |

use super::kind::{HelperDomain, UnknownDomain};

/// Largest value accepted for `input_text` length bounds.
pub const MAX_TEXT_LENGTH: i64 = 255;

/// Shape a single field must have.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    /// Non-empty string
    Text,
    Boolean,
    /// Any finite JSON number
    Number,
    /// Integer, optionally bounded (inclusive); integral floats are coerced
    Integer { min: Option<i64>, max: Option<i64> },
    /// One of a fixed set of strings
    Choice(&'static [&'static str]),
    /// Non-empty, duplicate-free ordered list of non-empty strings
    Options,
    /// String that compiles as a regular expression
    Pattern,
    /// `HH:MM:SS` or `HH:MM`, normalized to zero-padded `HH:MM:SS`
    Duration,
    /// Lowercase object id (`[a-z_][a-z0-9_]*`)
    Slug,
}

/// Rule for one named field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldRule {
    pub name: &'static str,
    pub kind: FieldType,
    /// Whether JSON `null` is accepted (meaning "unset")
    pub nullable: bool,
}

impl FieldRule {
    pub(crate) const fn new(name: &'static str, kind: FieldType) -> Self {
        Self {
            name,
            kind,
            nullable: false,
        }
    }

    pub(crate) const fn nullable(name: &'static str, kind: FieldType) -> Self {
        Self {
            name,
            kind,
            nullable: true,
        }
    }
}

/// A field (or group of fields) that must be present on create.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequiredField {
    Field(&'static str),
    /// At least one of the listed fields must be present
    AnyOf(&'static [&'static str]),
}

/// Invariants spanning more than one field.
///
/// Each rule is only evaluated when every field it references is present
/// (and non-null) in the payload being validated. [`CrossFieldRule::AnyTrue`]
/// is the exception on create, where absent flags count as `false`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrossFieldRule {
    /// `lower ≤ upper`
    Ordered {
        lower: &'static str,
        upper: &'static str,
    },
    /// `field > 0`
    Positive(&'static str),
    /// `lower ≤ value ≤ upper`
    WithinBounds {
        value: &'static str,
        lower: &'static str,
        upper: &'static str,
    },
    /// `value` is an element of the `list` field
    MemberOf {
        value: &'static str,
        list: &'static str,
    },
    /// At least one of the boolean fields is `true`
    AnyTrue(&'static [&'static str]),
    /// Duration is positive and below [`MAX_DURATION_SECS`]
    DurationInRange(&'static str),
}

/// Exclusive upper bound for timer durations (100 hours).
pub const MAX_DURATION_SECS: u64 = 100 * 60 * 60;

/// Immutable description of one helper domain.
///
/// Every domain accepts an optional `id` slug on create; it never appears in
/// `field_rules` and is rejected on update.
#[derive(Debug, PartialEq, Eq)]
pub struct DomainSchema {
    pub domain: HelperDomain,
    pub required_create_fields: &'static [RequiredField],
    pub field_rules: &'static [FieldRule],
    pub cross_field_rules: &'static [CrossFieldRule],
}

impl DomainSchema {
    /// The schema for a parsed domain.
    pub fn of(domain: HelperDomain) -> &'static DomainSchema {
        match domain {
            HelperDomain::InputBoolean => &INPUT_BOOLEAN,
            HelperDomain::InputNumber => &INPUT_NUMBER,
            HelperDomain::InputText => &INPUT_TEXT,
            HelperDomain::InputSelect => &INPUT_SELECT,
            HelperDomain::InputDatetime => &INPUT_DATETIME,
            HelperDomain::Counter => &COUNTER,
            HelperDomain::Timer => &TIMER,
        }
    }

    /// Look up a field rule by name.
    pub fn rule(&self, field: &str) -> Option<&'static FieldRule> {
        self.field_rules.iter().find(|r| r.name == field)
    }

    /// The id key the host protocol expects on update/delete.
    pub fn update_id_field(&self) -> String {
        self.domain.id_key()
    }
}

/// Resolve a domain identifier to its schema.
///
/// Identifiers are case-sensitive; only the lowercase canonical form matches.
pub fn schema_for(domain: &str) -> Result<&'static DomainSchema, UnknownDomain> {
    domain.parse::<HelperDomain>().map(DomainSchema::of)
}

const NAME: FieldRule = FieldRule::new("name", FieldType::Text);
const ICON: FieldRule = FieldRule::nullable("icon", FieldType::Text);

static INPUT_BOOLEAN: DomainSchema = DomainSchema {
    domain: HelperDomain::InputBoolean,
    required_create_fields: &[RequiredField::Field("name")],
    field_rules: &[NAME, ICON, FieldRule::new("initial", FieldType::Boolean)],
    cross_field_rules: &[],
};

static INPUT_NUMBER: DomainSchema = DomainSchema {
    domain: HelperDomain::InputNumber,
    required_create_fields: &[
        RequiredField::Field("name"),
        RequiredField::Field("min"),
        RequiredField::Field("max"),
    ],
    field_rules: &[
        NAME,
        ICON,
        FieldRule::new("min", FieldType::Number),
        FieldRule::new("max", FieldType::Number),
        FieldRule::new("step", FieldType::Number),
        FieldRule::new("mode", FieldType::Choice(&["box", "slider"])),
        FieldRule::nullable("unit_of_measurement", FieldType::Text),
        FieldRule::nullable("initial", FieldType::Number),
    ],
    cross_field_rules: &[
        CrossFieldRule::Ordered {
            lower: "min",
            upper: "max",
        },
        CrossFieldRule::Positive("step"),
        CrossFieldRule::WithinBounds {
            value: "initial",
            lower: "min",
            upper: "max",
        },
    ],
};

static INPUT_TEXT: DomainSchema = DomainSchema {
    domain: HelperDomain::InputText,
    required_create_fields: &[RequiredField::Field("name")],
    field_rules: &[
        NAME,
        ICON,
        FieldRule::new(
            "min",
            FieldType::Integer {
                min: Some(0),
                max: Some(MAX_TEXT_LENGTH),
            },
        ),
        FieldRule::new(
            "max",
            FieldType::Integer {
                min: Some(0),
                max: Some(MAX_TEXT_LENGTH),
            },
        ),
        FieldRule::nullable("pattern", FieldType::Pattern),
        FieldRule::new("mode", FieldType::Choice(&["text", "password"])),
        FieldRule::nullable("initial", FieldType::Text),
    ],
    cross_field_rules: &[CrossFieldRule::Ordered {
        lower: "min",
        upper: "max",
    }],
};

static INPUT_SELECT: DomainSchema = DomainSchema {
    domain: HelperDomain::InputSelect,
    required_create_fields: &[RequiredField::Field("name"), RequiredField::Field("options")],
    field_rules: &[
        NAME,
        ICON,
        FieldRule::new("options", FieldType::Options),
        FieldRule::nullable("initial", FieldType::Text),
    ],
    cross_field_rules: &[CrossFieldRule::MemberOf {
        value: "initial",
        list: "options",
    }],
};

static INPUT_DATETIME: DomainSchema = DomainSchema {
    domain: HelperDomain::InputDatetime,
    required_create_fields: &[
        RequiredField::Field("name"),
        RequiredField::AnyOf(&["has_date", "has_time"]),
    ],
    field_rules: &[
        NAME,
        ICON,
        FieldRule::new("has_date", FieldType::Boolean),
        FieldRule::new("has_time", FieldType::Boolean),
    ],
    cross_field_rules: &[CrossFieldRule::AnyTrue(&["has_date", "has_time"])],
};

static COUNTER: DomainSchema = DomainSchema {
    domain: HelperDomain::Counter,
    required_create_fields: &[RequiredField::Field("name")],
    field_rules: &[
        NAME,
        ICON,
        FieldRule::new(
            "initial",
            FieldType::Integer {
                min: None,
                max: None,
            },
        ),
        FieldRule::nullable(
            "minimum",
            FieldType::Integer {
                min: None,
                max: None,
            },
        ),
        FieldRule::nullable(
            "maximum",
            FieldType::Integer {
                min: None,
                max: None,
            },
        ),
        FieldRule::new(
            "step",
            FieldType::Integer {
                min: None,
                max: None,
            },
        ),
        FieldRule::new("restore", FieldType::Boolean),
    ],
    cross_field_rules: &[
        CrossFieldRule::Ordered {
            lower: "minimum",
            upper: "maximum",
        },
        CrossFieldRule::Positive("step"),
        CrossFieldRule::WithinBounds {
            value: "initial",
            lower: "minimum",
            upper: "maximum",
        },
    ],
};

static TIMER: DomainSchema = DomainSchema {
    domain: HelperDomain::Timer,
    required_create_fields: &[RequiredField::Field("name")],
    field_rules: &[
        NAME,
        ICON,
        FieldRule::new("duration", FieldType::Duration),
        FieldRule::new("restore", FieldType::Boolean),
    ],
    cross_field_rules: &[CrossFieldRule::DurationInRange("duration")],
};
