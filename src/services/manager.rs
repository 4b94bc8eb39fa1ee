// PanelManager - Builds specifiers and routes runtime edits
//
// This is the coordinator between:
// - The validation pipeline (RawConfig -> ControlSpec, fail fast)
// - Per-control SyncEngine instances (seeded from the specifiers' bounds)
// - The EffectHandler (called once per flushed batch)
// - The deferred TaskQueue (one-shot initialization after construction)

use crate::models::{ConfigValue, RawConfig};
use crate::services::effects::{ChangeSet, EffectHandler, PanelSnapshot};
use crate::spec::{ControlKind, ControlSpec, PropertyError, UnitRegistry};
use crate::state::{StateError, StateEvent, SyncEngine, TaskHandle};
use crate::validate::{SpecError, ValidateError};
use indexmap::{IndexMap, IndexSet};
use std::cell::RefCell;
use std::rc::Rc;
use tokio::sync::broadcast;

/// Owns the specifiers and synchronizers of one panel's controls.
///
/// Construction fails fast: the first control whose configuration does not
/// validate aborts the build with its [`SpecError`] (the caller decides
/// whether to drop the panel or retry without the control). After
/// construction the manager routes interactive edits through each numeric
/// control's engine under its configured notification policy and applies
/// side effects once per flushed batch.
///
/// The manager is single-threaded by design; it hands out broadcast
/// receivers for observation but all mutation goes through `&self` methods
/// on the owning thread.
pub struct PanelManager {
    inner: Rc<RefCell<PanelInner>>,
}

impl std::fmt::Debug for PanelManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("PanelManager")
            .field("panel", &inner.panel)
            .field("controls", &inner.specs.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

struct PanelInner {
    panel: String,
    specs: IndexMap<String, ControlSpec>,
    engines: IndexMap<String, SyncEngine>,
    effects: Box<dyn EffectHandler>,
    props_dirty: bool,
}

impl PanelManager {
    /// Build every control of a panel definition.
    ///
    /// Schedules one deferred "initialize" effects pass on the task queue;
    /// it runs after this call returns and silently no-ops if the manager
    /// was dropped before the queue drained.
    pub fn build(
        panel: impl Into<String>,
        controls: Vec<RawConfig>,
        units: &UnitRegistry,
        effects: Box<dyn EffectHandler>,
        tasks: &TaskHandle,
    ) -> Result<Self, SpecError> {
        let panel = panel.into();
        let mut specs: IndexMap<String, ControlSpec> = IndexMap::new();
        let mut engines = IndexMap::new();

        for config in controls {
            let spec = ControlSpec::build(config, units)?;
            let identifier = spec.identifier().to_string();

            if specs.contains_key(&identifier) {
                return Err(SpecError::new(
                    identifier.as_str(),
                    spec.kind(),
                    ValidateError::Malformed {
                        parameter: "identifier".to_string(),
                        reason: "duplicate control identifier in panel".to_string(),
                    },
                ));
            }

            if let Some(engine) = SyncEngine::from_spec(&spec) {
                engines.insert(identifier.clone(), engine);
            }
            specs.insert(identifier, spec);
        }

        tracing::info!(
            "Built panel `{}`: {} control(s), {} synchronized",
            panel,
            specs.len(),
            engines.len()
        );

        let inner = Rc::new(RefCell::new(PanelInner {
            panel,
            specs,
            engines,
            effects,
            props_dirty: false,
        }));

        let weak = Rc::downgrade(&inner);
        tasks.schedule(move || match weak.upgrade() {
            Some(inner) => inner.borrow_mut().run_effects(None),
            None => tracing::debug!("Panel disposed before initialization effects ran"),
        });

        Ok(Self { inner })
    }

    pub fn panel(&self) -> String {
        self.inner.borrow().panel.clone()
    }

    /// Control identifiers, in panel definition order.
    pub fn control_ids(&self) -> Vec<String> {
        self.inner.borrow().specs.keys().cloned().collect()
    }

    pub fn kind_of(&self, control: &str) -> Option<ControlKind> {
        self.inner.borrow().specs.get(control).map(ControlSpec::kind)
    }

    /// Execute a closure against one control's specifier.
    pub fn with_spec<R>(&self, control: &str, f: impl FnOnce(&ControlSpec) -> R) -> Option<R> {
        self.inner.borrow().specs.get(control).map(f)
    }

    /// Current mutable-property snapshot of all managed controls.
    pub fn snapshot(&self) -> PanelSnapshot {
        self.inner.borrow().snapshot()
    }

    /// Current value of one state identifier of a numeric control.
    pub fn value(&self, control: &str, identifier: &str) -> Result<f64, StateError> {
        let inner = self.inner.borrow();
        inner.engine(control)?.value(identifier)
    }

    /// All current values of a numeric control, in slot order.
    pub fn values(&self, control: &str) -> Result<IndexMap<String, f64>, StateError> {
        let inner = self.inner.borrow();
        Ok(inner.engine(control)?.values())
    }

    /// Subscribe to one numeric control's notification batches.
    pub fn subscribe(
        &self,
        control: &str,
    ) -> Result<broadcast::Receiver<StateEvent>, StateError> {
        let inner = self.inner.borrow();
        Ok(inner.engine(control)?.subscribe())
    }

    /// Route one interactive edit through a control's engine.
    ///
    /// Under the control's `EveryChange` policy this flushes immediately
    /// and runs the side effects for the batch; under `OnCommit` the edit
    /// accumulates until [`commit`](Self::commit).
    pub fn set_value(
        &self,
        control: &str,
        identifier: &str,
        value: f64,
    ) -> Result<(), StateError> {
        let mut inner = self.inner.borrow_mut();
        let flushed = inner.engine_mut(control)?.edit(identifier, value)?;
        inner.apply_batch(control, flushed);
        Ok(())
    }

    /// Discretized page step, routed like [`set_value`](Self::set_value).
    pub fn step_page(
        &self,
        control: &str,
        identifier: &str,
        pages: i64,
    ) -> Result<(), StateError> {
        let mut inner = self.inner.borrow_mut();
        let flushed = inner.engine_mut(control)?.edit_page(identifier, pages)?;
        inner.apply_batch(control, flushed);
        Ok(())
    }

    /// Flush a control's accumulated edits as one batch.
    pub fn commit(&self, control: &str) -> Result<(), StateError> {
        let mut inner = self.inner.borrow_mut();
        let flushed = inner.engine_mut(control)?.commit();
        inner.apply_batch(control, flushed);
        Ok(())
    }

    pub fn get_property(
        &self,
        control: &str,
        property: &str,
    ) -> Result<ConfigValue, PropertyError> {
        let inner = self.inner.borrow();
        let spec = inner.spec(control, property)?;
        spec.get_property(property).cloned()
    }

    /// Set a declared mutable property. The change is recorded so the next
    /// effects pass sees `props_dirty`.
    pub fn set_property(
        &self,
        control: &str,
        property: &str,
        value: ConfigValue,
    ) -> Result<bool, PropertyError> {
        let mut inner = self.inner.borrow_mut();
        let changed = inner
            .spec_mut(control, property)?
            .set_property(property, value)?;
        inner.props_dirty |= changed;
        Ok(changed)
    }

    /// Admit a novel choice name on an open-choice control.
    pub fn add_choice(&self, control: &str, name: &str) -> Result<bool, PropertyError> {
        let mut inner = self.inner.borrow_mut();
        let inserted = inner.spec_mut(control, "choices")?.add_choice(name)?;
        inner.props_dirty |= inserted;
        Ok(inserted)
    }
}

impl PanelInner {
    fn engine(&self, control: &str) -> Result<&SyncEngine, StateError> {
        self.engines
            .get(control)
            .ok_or_else(|| StateError::UnknownIdentifier {
                identifier: control.to_string(),
            })
    }

    fn engine_mut(&mut self, control: &str) -> Result<&mut SyncEngine, StateError> {
        self.engines
            .get_mut(control)
            .ok_or_else(|| StateError::UnknownIdentifier {
                identifier: control.to_string(),
            })
    }

    fn spec(&self, control: &str, property: &str) -> Result<&ControlSpec, PropertyError> {
        self.specs
            .get(control)
            .ok_or_else(|| PropertyError::Unknown {
                control: control.to_string(),
                property: property.to_string(),
            })
    }

    fn spec_mut(
        &mut self,
        control: &str,
        property: &str,
    ) -> Result<&mut ControlSpec, PropertyError> {
        self.specs
            .get_mut(control)
            .ok_or_else(|| PropertyError::Unknown {
                control: control.to_string(),
                property: property.to_string(),
            })
    }

    fn snapshot(&self) -> PanelSnapshot {
        self.specs
            .iter()
            .map(|(id, spec)| (id.clone(), spec.property_snapshot()))
            .collect()
    }

    /// Run the effects pass for one flushed batch, if the batch changed
    /// anything.
    fn apply_batch(&mut self, control: &str, flushed: Option<IndexSet<String>>) {
        let Some(dirty) = flushed else { return };
        if dirty.is_empty() {
            return;
        }
        let change = ChangeSet {
            control: control.to_string(),
            identifiers: dirty.into_iter().collect(),
        };
        self.run_effects(Some(change));
    }

    /// One side-effect pass: snapshot, call the handler, apply its updates.
    /// Updates are applied through the declared property path and never
    /// re-enter the handler within the same pass.
    fn run_effects(&mut self, changed: Option<ChangeSet>) {
        let snapshot = self.snapshot();
        let props_dirty = std::mem::take(&mut self.props_dirty);
        let updates = self.effects.on_changes(changed, &snapshot, props_dirty);

        for update in updates {
            match self.specs.get_mut(&update.control) {
                None => {
                    tracing::warn!(
                        "Effect update targets unknown control `{}`",
                        update.control
                    );
                }
                Some(spec) => match spec.set_property(&update.property, update.value) {
                    Ok(changed) => self.props_dirty |= changed,
                    Err(e) => tracing::warn!("Effect update rejected: {}", e),
                },
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::effects::{MockEffectHandler, NullEffects, PropertyUpdate};
    use crate::state::TaskQueue;

    fn scale_config(identifier: &str) -> RawConfig {
        [
            ("identifier".to_string(), ConfigValue::from(identifier)),
            ("type".to_string(), ConfigValue::from("scale")),
            ("maxValue".to_string(), ConfigValue::Int(100)),
        ]
        .into_iter()
        .collect()
    }

    fn range_config(identifier: &str, every_change: bool) -> RawConfig {
        [
            ("identifier".to_string(), ConfigValue::from(identifier)),
            ("type".to_string(), ConfigValue::from("range")),
            ("minInterval".to_string(), ConfigValue::Int(5)),
            (
                "sendEveryStateChange".to_string(),
                ConfigValue::Bool(every_change),
            ),
        ]
        .into_iter()
        .collect()
    }

    fn build_manager(
        controls: Vec<RawConfig>,
        effects: Box<dyn EffectHandler>,
    ) -> (PanelManager, TaskQueue) {
        let queue = TaskQueue::new();
        let manager = PanelManager::build(
            "settings",
            controls,
            &UnitRegistry::standard(),
            effects,
            &queue.handle(),
        )
        .unwrap();
        (manager, queue)
    }

    #[test]
    fn test_build_seeds_engines_for_numeric_kinds() {
        let (manager, _queue) = build_manager(
            vec![scale_config("volume"), range_config("low:high", true)],
            Box::new(NullEffects),
        );

        assert_eq!(manager.control_ids(), vec!["volume", "low:high"]);
        assert_eq!(manager.value("volume", "volume").unwrap(), 0.0);
        assert_eq!(manager.value("low:high", "high").unwrap(), 5.0);
    }

    #[test]
    fn test_duplicate_control_identifier_rejected() {
        let queue = TaskQueue::new();
        let err = PanelManager::build(
            "settings",
            vec![scale_config("volume"), scale_config("volume")],
            &UnitRegistry::standard(),
            Box::new(NullEffects),
            &queue.handle(),
        )
        .unwrap_err();

        assert_eq!(err.control, "volume");
        assert!(matches!(err.source, ValidateError::Malformed { .. }));
    }

    #[test]
    fn test_unknown_control_is_a_state_error() {
        let (manager, _queue) = build_manager(vec![scale_config("volume")], Box::new(NullEffects));
        assert!(matches!(
            manager.set_value("nope", "nope", 1.0),
            Err(StateError::UnknownIdentifier { .. })
        ));
    }

    #[test]
    fn test_deferred_initialize_runs_once_after_build() {
        let mut effects = MockEffectHandler::new();
        effects
            .expect_on_changes()
            .withf(|changed, snapshot, props_dirty| {
                changed.is_none() && snapshot.contains_key("volume") && !*props_dirty
            })
            .times(1)
            .returning(|_, _, _| Vec::new());

        let (_manager, mut queue) =
            build_manager(vec![scale_config("volume")], Box::new(effects));

        assert_eq!(queue.run_pending(), 1);
        // A second drain finds nothing: initialization is one-shot.
        assert_eq!(queue.run_pending(), 0);
    }

    #[test]
    fn test_initialize_noops_after_disposal() {
        let mut effects = MockEffectHandler::new();
        effects.expect_on_changes().times(0);

        let (manager, mut queue) =
            build_manager(vec![scale_config("volume")], Box::new(effects));

        drop(manager);
        assert_eq!(queue.run_pending(), 1);
    }

    #[test]
    fn test_every_change_edit_runs_effects_per_batch() {
        let mut effects = MockEffectHandler::new();
        effects
            .expect_on_changes()
            .withf(|changed, _, _| {
                changed
                    .as_ref()
                    .is_some_and(|c| c.control == "volume" && c.identifiers == ["volume"])
            })
            .times(1)
            .returning(|_, _, _| Vec::new());

        let (manager, _queue) = build_manager(vec![scale_config("volume")], Box::new(effects));

        manager.set_value("volume", "volume", 40.0).unwrap();
    }

    #[test]
    fn test_idempotent_edit_skips_effects() {
        let mut effects = MockEffectHandler::new();
        effects.expect_on_changes().times(1).returning(|_, _, _| Vec::new());

        let (manager, _queue) = build_manager(vec![scale_config("volume")], Box::new(effects));

        manager.set_value("volume", "volume", 40.0).unwrap();
        // Same already-legal value: empty dirty set, no second effects pass.
        manager.set_value("volume", "volume", 40.0).unwrap();
    }

    #[test]
    fn test_on_commit_batches_effects_until_commit() {
        let mut effects = MockEffectHandler::new();
        effects
            .expect_on_changes()
            .withf(|changed, _, _| {
                changed.as_ref().is_some_and(|c| {
                    c.control == "low:high"
                        && c.identifiers.contains(&"low".to_string())
                        && c.identifiers.contains(&"high".to_string())
                })
            })
            .times(1)
            .returning(|_, _, _| Vec::new());

        let (manager, _queue) =
            build_manager(vec![range_config("low:high", false)], Box::new(effects));

        manager.set_value("low:high", "low", 30.0).unwrap();
        manager.set_value("low:high", "high", 80.0).unwrap();
        manager.commit("low:high").unwrap();

        // A commit with nothing pending is silent.
        manager.commit("low:high").unwrap();
    }

    #[test]
    fn test_effect_updates_apply_without_reentry() {
        let mut effects = MockEffectHandler::new();
        effects
            .expect_on_changes()
            .times(1)
            .returning(|_, _, _| vec![PropertyUpdate::new("volume", "enabled", false)]);

        let (manager, _queue) = build_manager(vec![scale_config("volume")], Box::new(effects));

        manager.set_value("volume", "volume", 10.0).unwrap();
        assert_eq!(
            manager.get_property("volume", "enabled").unwrap(),
            ConfigValue::Bool(false)
        );
    }

    #[test]
    fn test_props_dirty_reported_once() {
        use std::cell::RefCell;
        use std::rc::Rc;

        let seen = Rc::new(RefCell::new(Vec::new()));
        let recorder = Rc::clone(&seen);

        let mut effects = MockEffectHandler::new();
        effects
            .expect_on_changes()
            .times(2)
            .returning_st(move |_, _, props_dirty| {
                recorder.borrow_mut().push(props_dirty);
                Vec::new()
            });

        let (manager, _queue) = build_manager(vec![scale_config("volume")], Box::new(effects));

        manager
            .set_property("volume", "label", ConfigValue::from("Volume"))
            .unwrap();

        manager.set_value("volume", "volume", 10.0).unwrap();
        manager.set_value("volume", "volume", 20.0).unwrap();

        // First batch sees the property change, second does not.
        assert_eq!(*seen.borrow(), vec![true, false]);
    }

    #[test]
    fn test_property_round_trip_through_manager() {
        let (manager, _queue) = build_manager(vec![scale_config("volume")], Box::new(NullEffects));

        assert!(manager
            .set_property("volume", "visible", ConfigValue::Bool(false))
            .unwrap());
        assert_eq!(
            manager.get_property("volume", "visible").unwrap(),
            ConfigValue::Bool(false)
        );

        let err = manager.get_property("volume", "weight").unwrap_err();
        assert!(matches!(err, PropertyError::Unknown { .. }));
    }

    #[test]
    fn test_subscribe_observes_batches() {
        let (manager, _queue) = build_manager(vec![scale_config("volume")], Box::new(NullEffects));
        let mut rx = manager.subscribe("volume").unwrap();

        manager.set_value("volume", "volume", 25.0).unwrap();

        assert!(matches!(
            rx.try_recv().unwrap(),
            StateEvent::ValueChanged { value, .. } if value == 25.0
        ));
    }

    #[test]
    fn test_step_page_through_manager() {
        let mut config = scale_config("volume");
        config.insert("pageIncrement".to_string(), ConfigValue::Int(10));
        let (manager, _queue) = build_manager(vec![config], Box::new(NullEffects));

        manager.step_page("volume", "volume", 2).unwrap();
        assert_eq!(manager.value("volume", "volume").unwrap(), 20.0);
    }
}
