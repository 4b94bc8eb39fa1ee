//! Validators - the pure configuration-checking layer.
//!
//! Everything in this module is a pure function of its inputs: a raw
//! configuration snapshot goes in, a typed value or a [`ValidateError`] comes
//! out. No validator touches global state or performs I/O, which keeps the
//! whole pipeline testable in isolation.
//!
//! # Components
//!
//! - [`validate_param`]: checks one configuration entry against a
//!   [`ParamRule`](crate::models::ParamRule) - presence, type coercion,
//!   numeric bounds
//! - [`ChoiceList`] / [`OpenChoiceList`] / [`ChoiceTree`]: the three choice
//!   validators (closed set, open set, hierarchical universe)
//! - [`BoundSet`]: the bounded scalar/multi-value validator - per-slot
//!   min/max, shared minimum interval, page increment, and decimal precision,
//!   with construction-time feasibility checking
//!
//! # Error Taxonomy
//!
//! All construction-time failures are [`ValidateError`] variants. The
//! specifier builder wraps them in [`SpecError`] to attach the owning
//! control's identity; runtime errors live with the components that raise
//! them ([`StateError`](crate::state::StateError),
//! [`PropertyError`](crate::spec::PropertyError)).

pub mod bounds;
pub mod choice;
pub mod param;

pub use bounds::{BoundSet, SlotBounds, MAX_PRECISION};
pub use choice::{
    parse_choice_list, parse_choice_tree, ChoiceList, ChoiceTree, OpenChoiceList,
};
pub use param::validate_param;

use crate::models::ConfigValue;
use thiserror::Error;

/// A construction-time validation failure for a single parameter.
///
/// Every variant names the offending parameter; variants carry the offending
/// value and the violated constraint where one exists.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidateError {
    #[error("required parameter `{parameter}` is missing")]
    MissingRequired { parameter: String },

    #[error("parameter `{parameter}` expected {expected}, found {} ({})", .found.type_name(), .found)]
    WrongType {
        parameter: String,
        expected: &'static str,
        found: ConfigValue,
    },

    #[error("parameter `{parameter}` value {value} is outside [{min}, {max}]")]
    OutOfBounds {
        parameter: String,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("parameter `{parameter}` is malformed: {reason}")]
    Malformed { parameter: String, reason: String },

    #[error("parameter `{parameter}` declares incompatible bounds: {reason}")]
    IncompatibleBounds { parameter: String, reason: String },

    #[error("duplicate choice name `{name}` under `{parent}`")]
    DuplicateChoiceName { name: String, parent: String },

    #[error("parameter `{parameter}` names `{name}`, which is not in the configured choice set")]
    UnknownChoice { parameter: String, name: String },

    #[error("parameter `{parameter}` names unknown unit `{unit}`")]
    UnknownUnit { parameter: String, unit: String },
}

impl ValidateError {
    /// The name of the parameter this error is about.
    pub fn parameter(&self) -> &str {
        match self {
            ValidateError::MissingRequired { parameter }
            | ValidateError::WrongType { parameter, .. }
            | ValidateError::OutOfBounds { parameter, .. }
            | ValidateError::Malformed { parameter, .. }
            | ValidateError::IncompatibleBounds { parameter, .. }
            | ValidateError::UnknownChoice { parameter, .. }
            | ValidateError::UnknownUnit { parameter, .. } => parameter,
            ValidateError::DuplicateChoiceName { .. } => "choices",
        }
    }

    /// The offending configuration value, where the failure has one.
    pub fn offending_value(&self) -> Option<ConfigValue> {
        match self {
            ValidateError::WrongType { found, .. } => Some(found.clone()),
            ValidateError::OutOfBounds { value, .. } => Some(ConfigValue::Float(*value)),
            ValidateError::UnknownChoice { name, .. } => Some(ConfigValue::from(name.as_str())),
            ValidateError::UnknownUnit { unit, .. } => Some(ConfigValue::from(unit.as_str())),
            _ => None,
        }
    }
}

/// A construction-time failure annotated with the owning control's identity.
///
/// Aborts construction of the offending control. Whether the surrounding
/// panel builder aborts the whole panel or skips the one control is the
/// builder's policy, not decided here.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("control `{control}` ({}): {source}", .kind.as_ref().map_or("unknown", |k| k.tag()))]
pub struct SpecError {
    /// Identifier of the control whose construction failed.
    pub control: String,
    /// The control's type tag; `None` when the `type` parameter itself was
    /// missing or unknown.
    pub kind: Option<crate::spec::ControlKind>,
    #[source]
    pub source: ValidateError,
}

impl SpecError {
    pub fn new(
        control: impl Into<String>,
        kind: impl Into<Option<crate::spec::ControlKind>>,
        source: ValidateError,
    ) -> Self {
        Self {
            control: control.into(),
            kind: kind.into(),
            source,
        }
    }

    /// The offending parameter name.
    pub fn parameter(&self) -> &str {
        self.source.parameter()
    }

    /// The offending value, or `None` when the failure has none (e.g. a
    /// missing required parameter).
    pub fn offending_value(&self) -> Option<ConfigValue> {
        self.source.offending_value()
    }
}
