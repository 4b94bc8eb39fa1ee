// FormKit - Declarative form-control specification and state synchronization
//
// This is the library crate containing the validation pipeline, control
// specifiers, and the state synchronization engine. Rendering toolkits
// consume the specifiers and the state-change contract; no drawing or event
// wiring lives here.

pub mod config;
pub mod logging;
pub mod models;
pub mod services;
pub mod spec;
pub mod state;
pub mod validate;

// Re-export commonly used types for convenience
pub use config::{PanelFile, PanelLoader};
pub use models::{ConfigValue, RawConfig};
pub use services::{EffectHandler, PanelManager};
pub use spec::{ControlKind, ControlSpec, PropertyError, UnitRegistry};
pub use state::{NotifyPolicy, StateError, StateEvent, SyncEngine, TaskQueue};
pub use validate::{BoundSet, SpecError, ValidateError};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const LIB_NAME: &str = env!("CARGO_PKG_NAME");
