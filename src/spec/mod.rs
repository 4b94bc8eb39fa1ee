//! Control specifiers - validated, composed descriptions of controls.
//!
//! A specifier is what the validation pipeline produces and what everything
//! downstream consumes: the panel manager seeds synchronizers from it,
//! rendering toolkits read its typed accessors, and the side-effect layer
//! reads and writes its declared mutable properties.
//!
//! # Components
//!
//! - [`ControlSpec`]: the specifier itself, built once per control
//!   definition and immutable except through its mutable-property set
//! - [`ControlKind`]: the control family tags (`scale`, `range`, `select`,
//!   `combo`, `tree`, `toggle`, `timedelta`)
//! - [`PropertyError`]: runtime failures of mutable-property access
//! - [`UnitRegistry`]: the explicit time-delta unit vocabulary passed to the
//!   builder (no process-wide unit table)

pub mod control;
pub mod units;

pub use control::{ControlKind, ControlSpec, PropertyError};
pub use units::UnitRegistry;
