//! Side-effect interface: reactive property updates driven by state changes.

use crate::models::ConfigValue;
use indexmap::IndexMap;

/// Snapshot of every managed control's mutable properties:
/// control identifier to property name to current value.
pub type PanelSnapshot = IndexMap<String, IndexMap<String, ConfigValue>>;

/// The state identifiers of one control that changed in a batch.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeSet {
    pub control: String,
    pub identifiers: Vec<String>,
}

/// One property mutation requested by an effect handler.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyUpdate {
    pub control: String,
    pub property: String,
    pub value: ConfigValue,
}

impl PropertyUpdate {
    pub fn new(
        control: impl Into<String>,
        property: impl Into<String>,
        value: impl Into<ConfigValue>,
    ) -> Self {
        Self {
            control: control.into(),
            property: property.into(),
            value: value.into(),
        }
    }
}

/// Bidirectional side-effect collaborator.
///
/// The panel manager calls [`on_changes`](Self::on_changes) exactly once per
/// flushed notification batch, and once with `changed = None` ("initialize")
/// from the deferred task scheduled at build time. The handler receives the
/// current property snapshot of all managed controls plus a flag indicating
/// whether that snapshot may have changed since the previous call, and
/// returns the property updates that must follow.
///
/// Returned updates are applied through the declared mutable-property path
/// but do **not** re-enter the handler within the same batch; their
/// consequences surface through `props_dirty` on the next call.
#[cfg_attr(test, mockall::automock)]
pub trait EffectHandler {
    fn on_changes(
        &mut self,
        changed: Option<ChangeSet>,
        snapshot: &PanelSnapshot,
        props_dirty: bool,
    ) -> Vec<PropertyUpdate>;
}

/// A handler with no side effects, for panels that need none.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullEffects;

impl EffectHandler for NullEffects {
    fn on_changes(
        &mut self,
        _changed: Option<ChangeSet>,
        _snapshot: &PanelSnapshot,
        _props_dirty: bool,
    ) -> Vec<PropertyUpdate> {
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_effects_is_inert() {
        let mut effects = NullEffects;
        let snapshot = PanelSnapshot::new();
        assert!(effects.on_changes(None, &snapshot, false).is_empty());
    }

    #[test]
    fn test_property_update_builder() {
        let update = PropertyUpdate::new("volume", "enabled", false);
        assert_eq!(update.control, "volume");
        assert_eq!(update.value, ConfigValue::Bool(false));
    }
}
