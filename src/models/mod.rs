//! Data models for the FormKit validation pipeline.
//!
//! This module contains the core data structures consumed and produced by the
//! validators:
//! - [`ConfigValue`] / [`RawConfig`]: untyped configuration entries as read
//!   from a panel definition file, before any validation
//! - [`ParamRule`] / [`ParamKind`]: the per-parameter validation rules a
//!   control family declares
//! - [`Choice`] / [`Selection`]: choice-universe nodes and selected subtrees
//!   for the choice-backed control families
//!
//! # Architecture Note
//!
//! Raw configuration is ephemeral: it is consumed once by the specifier
//! builder and always passed **by value** at composition boundaries, so no
//! component ever observes another component's mutations. The typed outputs
//! (specifiers, bound sets) are the long-lived objects.

pub mod choice;
pub mod rule;
pub mod value;

pub use choice::{Choice, Selection};
pub use rule::{ParamKind, ParamRule};
pub use value::{ConfigValue, RawConfig};
