//! Services module - Panel orchestration on top of the validation pipeline.
//!
//! This module contains the components that put specifiers to work at
//! runtime. They are **toolkit-agnostic**: no rendering, no layout, no event
//! wiring - a GUI layer consumes the specifiers, subscribes to the state
//! events, and supplies an [`EffectHandler`] for reactive property updates.
//!
//! # Components
//!
//! - [`PanelManager`]: builds every [`ControlSpec`](crate::spec::ControlSpec)
//!   of a panel definition (fail fast), seeds one
//!   [`SyncEngine`](crate::state::SyncEngine) per numeric control, routes
//!   interactive edits under each control's notification policy, and applies
//!   side effects once per flushed batch
//!
//! - [`EffectHandler`]: the bidirectional side-effect collaborator. Given
//!   the identifiers that just changed (or `None` for "initialize"), the
//!   current mutable-property snapshot, and a snapshot-dirty flag, it
//!   returns the property updates that must follow. Updates are applied
//!   without re-entering the handler in the same batch.
//!
//! # Usage Example
//!
//! ```ignore
//! use formkit::services::{NullEffects, PanelManager};
//! use formkit::spec::UnitRegistry;
//! use formkit::state::TaskQueue;
//!
//! let mut queue = TaskQueue::new();
//! let manager = PanelManager::build(
//!     "settings",
//!     panel_file.controls,
//!     &UnitRegistry::standard(),
//!     Box::new(NullEffects),
//!     &queue.handle(),
//! )?;
//!
//! // The event loop drains deferred work between external events.
//! queue.run_pending();
//!
//! manager.set_value("low:high", "low", 30.0)?;
//! manager.commit("low:high")?;
//! ```

pub mod effects;
pub mod manager;

pub use effects::{ChangeSet, EffectHandler, NullEffects, PanelSnapshot, PropertyUpdate};
pub use manager::PanelManager;
