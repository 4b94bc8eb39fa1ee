//! Control specifiers: validated, typed descriptions of single controls.
//!
//! A [`ControlSpec`] is built once from a raw configuration snapshot, fails
//! fast on any validation error, and is immutable afterwards except through
//! its declared mutable-property set. Rather than a deep validator
//! inheritance chain, a specifier composes independent capabilities as plain
//! fields: a bound set for numeric kinds, a choice list or tree for
//! choice-backed kinds, a unit binding for time deltas.

use crate::models::{ConfigValue, ParamKind, ParamRule, RawConfig};
use crate::spec::units::UnitRegistry;
use crate::validate::{
    parse_choice_list, parse_choice_tree, validate_param, BoundSet, ChoiceList, ChoiceTree,
    OpenChoiceList, SpecError, ValidateError,
};
use indexmap::IndexMap;
use std::fmt;
use thiserror::Error;

/// Numeric ceiling for time-delta controls without a configured maximum:
/// one year, in seconds.
const DELTA_CEILING_SECONDS: f64 = 31_536_000.0;

/// Runtime failure of a mutable-property access. Fatal to the call only;
/// the property keeps its previous value.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PropertyError {
    #[error("control `{control}` declares no property `{property}`")]
    Unknown { control: String, property: String },

    #[error("property `{property}` of `{control}` rejects {value}: {reason}")]
    Invalid {
        control: String,
        property: String,
        value: ConfigValue,
        reason: String,
    },
}

/// The control families this crate can specify.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlKind {
    /// Single bounded numeric slot.
    Scale,
    /// Two or more ordered numeric slots with a minimum interval.
    Range,
    /// One value from a closed choice list.
    Select,
    /// One value from an open, runtime-extensible choice list.
    Combo,
    /// A selection subtree of a hierarchical choice universe.
    Tree,
    /// A boolean on/off state.
    Toggle,
    /// A single time-delta slot in seconds, with a unit vocabulary.
    TimeDelta,
}

impl ControlKind {
    /// The configuration `type` tag for this kind.
    pub fn tag(self) -> &'static str {
        match self {
            ControlKind::Scale => "scale",
            ControlKind::Range => "range",
            ControlKind::Select => "select",
            ControlKind::Combo => "combo",
            ControlKind::Tree => "tree",
            ControlKind::Toggle => "toggle",
            ControlKind::TimeDelta => "timedelta",
        }
    }

    pub fn parse(tag: &str) -> Option<Self> {
        match tag {
            "scale" => Some(ControlKind::Scale),
            "range" => Some(ControlKind::Range),
            "select" => Some(ControlKind::Select),
            "combo" => Some(ControlKind::Combo),
            "tree" => Some(ControlKind::Tree),
            "toggle" => Some(ControlKind::Toggle),
            "timedelta" => Some(ControlKind::TimeDelta),
            _ => None,
        }
    }

    /// Whether this kind carries numeric slots driven by a
    /// [`SyncEngine`](crate::state::SyncEngine).
    pub fn is_numeric(self) -> bool {
        matches!(
            self,
            ControlKind::Scale | ControlKind::Range | ControlKind::TimeDelta
        )
    }
}

impl fmt::Display for ControlKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Immutable, validated description of a single control.
#[derive(Debug, Clone, PartialEq)]
pub struct ControlSpec {
    identifier: String,
    kind: ControlKind,
    state_ids: Vec<String>,

    // Capabilities; populated per kind.
    bounds: Option<BoundSet>,
    choices: Option<ChoiceList>,
    open_choices: Option<OpenChoiceList>,
    tree: Option<ChoiceTree>,
    unit: Option<(String, f64)>,

    initial_values: Vec<f64>,
    initial_selection: Option<String>,
    initial_toggle: bool,

    scrollable: bool,
    send_every_change: bool,

    properties: IndexMap<String, ConfigValue>,
}

impl ControlSpec {
    /// Build a specifier from a raw configuration snapshot.
    ///
    /// The snapshot is consumed by value: callers hand over their own copy
    /// and no aliasing survives construction. Unrecognized keys are
    /// ignored; recognized-but-malformed keys abort construction with a
    /// [`SpecError`] naming this control.
    pub fn build(config: RawConfig, units: &UnitRegistry) -> Result<Self, SpecError> {
        let (identifier, kind) = parse_header(&config)?;
        let fail = |e: ValidateError| SpecError::new(identifier.as_str(), kind, e);

        let state_ids = parse_state_ids(&identifier, kind).map_err(&fail)?;

        let mut spec = Self {
            identifier: identifier.clone(),
            kind,
            state_ids,
            bounds: None,
            choices: None,
            open_choices: None,
            tree: None,
            unit: None,
            initial_values: Vec::new(),
            initial_selection: None,
            initial_toggle: false,
            scrollable: false,
            send_every_change: true,
            properties: IndexMap::new(),
        };

        match kind {
            ControlKind::Scale => spec.build_scale(&config).map_err(&fail)?,
            ControlKind::Range => spec.build_range(&config).map_err(&fail)?,
            ControlKind::Select => spec.build_select(&config).map_err(&fail)?,
            ControlKind::Combo => spec.build_combo(&config).map_err(&fail)?,
            ControlKind::Tree => spec.build_tree(&config).map_err(&fail)?,
            ControlKind::Toggle => spec.build_toggle(&config).map_err(&fail)?,
            ControlKind::TimeDelta => spec.build_timedelta(&config, units).map_err(&fail)?,
        }

        spec.build_common(&config).map_err(&fail)?;

        tracing::debug!(
            "Built specifier `{}` ({}) with {} state identifier(s)",
            spec.identifier,
            spec.kind,
            spec.state_ids.len()
        );

        Ok(spec)
    }

    fn build_scale(&mut self, config: &RawConfig) -> Result<(), ValidateError> {
        let bounds = BoundSet::from_config(config, 1, 0.0, 100.0)?;
        let default = bounds.lowest_legal_values()[0];
        let initial = validate_param(
            config,
            "initialValue",
            &ParamRule::optional(ParamKind::Float, default),
        )?
        .as_f64()
        .unwrap_or(default);

        let slot = bounds.slot(0).copied().expect("one slot");
        if !slot.contains(initial) {
            return Err(ValidateError::OutOfBounds {
                parameter: "initialValue".to_string(),
                value: initial,
                min: slot.min,
                max: slot.max,
            });
        }

        self.initial_values = vec![initial];
        self.bounds = Some(bounds);
        Ok(())
    }

    fn build_range(&mut self, config: &RawConfig) -> Result<(), ValidateError> {
        let slot_count = self.state_ids.len();
        let bounds = BoundSet::from_config(config, slot_count, 0.0, 100.0)?;

        let initial = match config.get("initialValue") {
            None => bounds.lowest_legal_values(),
            Some(raw) => {
                let Some(items) = raw.as_list() else {
                    return Err(ValidateError::WrongType {
                        parameter: "initialValue".to_string(),
                        expected: "list of floats",
                        found: raw.clone(),
                    });
                };
                if items.len() != slot_count {
                    return Err(ValidateError::Malformed {
                        parameter: "initialValue".to_string(),
                        reason: format!(
                            "expected {} entries, found {}",
                            slot_count,
                            items.len()
                        ),
                    });
                }
                items
                    .iter()
                    .map(|item| {
                        item.as_f64().ok_or_else(|| ValidateError::WrongType {
                            parameter: "initialValue".to_string(),
                            expected: "float",
                            found: item.clone(),
                        })
                    })
                    .collect::<Result<Vec<_>, _>>()?
            }
        };

        for (index, (&value, slot)) in initial.iter().zip(bounds.slots()).enumerate() {
            if !slot.contains(value) {
                return Err(ValidateError::OutOfBounds {
                    parameter: "initialValue".to_string(),
                    value,
                    min: slot.min,
                    max: slot.max,
                });
            }
            if index > 0 && value - initial[index - 1] < bounds.min_interval() {
                return Err(ValidateError::Malformed {
                    parameter: "initialValue".to_string(),
                    reason: format!(
                        "entries {} and {} violate the minimum interval {}",
                        index - 1,
                        index,
                        bounds.min_interval()
                    ),
                });
            }
        }

        self.initial_values = initial;
        self.bounds = Some(bounds);
        Ok(())
    }

    fn build_select(&mut self, config: &RawConfig) -> Result<(), ValidateError> {
        let raw = validate_param(config, "choices", &ParamRule::required(ParamKind::List))?;
        let choices = ChoiceList::new(parse_choice_list("choices", &raw)?);

        let Some(first) = choices.names().next().map(str::to_string) else {
            return Err(ValidateError::Malformed {
                parameter: "choices".to_string(),
                reason: "a closed choice list needs at least one choice".to_string(),
            });
        };

        let initial = validate_param(
            config,
            "initial",
            &ParamRule::optional(ParamKind::Text, first.as_str()),
        )?
        .as_str()
        .unwrap_or_default()
        .to_string();

        choices.validate_selection("initial", &initial)?;

        self.initial_selection = Some(initial);
        self.choices = Some(choices);
        Ok(())
    }

    fn build_combo(&mut self, config: &RawConfig) -> Result<(), ValidateError> {
        let seeds = match config.get("choices") {
            None => Vec::new(),
            Some(raw) => parse_choice_list("choices", raw)?,
        };
        let open = OpenChoiceList::new(seeds);

        // Open lists never reject novel names, so any text initial is legal.
        let initial = match config.get("initial") {
            None => open.names().next().map(str::to_string),
            Some(raw) => {
                open.validate_entry("initial", raw)?;
                raw.as_str().map(str::to_string)
            }
        };

        self.initial_selection = initial;
        self.properties.insert(
            "choices".to_string(),
            ConfigValue::List(open.names().map(ConfigValue::from).collect()),
        );
        self.open_choices = Some(open);
        Ok(())
    }

    fn build_tree(&mut self, config: &RawConfig) -> Result<(), ValidateError> {
        let raw = validate_param(config, "choices", &ParamRule::required(ParamKind::List))?;
        let tree = ChoiceTree::new(parse_choice_tree("choices", &raw)?);

        let initial = match config.get("initial") {
            None => None,
            Some(raw) => {
                let Some(name) = raw.as_str() else {
                    return Err(ValidateError::WrongType {
                        parameter: "initial".to_string(),
                        expected: "text",
                        found: raw.clone(),
                    });
                };
                if !tree.contains_identifier(name) {
                    return Err(ValidateError::UnknownChoice {
                        parameter: "initial".to_string(),
                        name: name.to_string(),
                    });
                }
                Some(name.to_string())
            }
        };

        self.initial_selection = initial;
        self.tree = Some(tree);
        Ok(())
    }

    fn build_toggle(&mut self, config: &RawConfig) -> Result<(), ValidateError> {
        self.initial_toggle = validate_param(
            config,
            "initialValue",
            &ParamRule::optional(ParamKind::Bool, false),
        )?
        .as_bool()
        .unwrap_or(false);
        Ok(())
    }

    /// Time deltas are canonically in seconds; the configured unit names the
    /// entry/display vocabulary and drives textual parsing.
    fn build_timedelta(
        &mut self,
        config: &RawConfig,
        units: &UnitRegistry,
    ) -> Result<(), ValidateError> {
        let unit_name = validate_param(
            config,
            "units",
            &ParamRule::optional(ParamKind::Text, "seconds"),
        )?
        .as_str()
        .unwrap_or("seconds")
        .to_string();
        let factor = units.resolve("units", &unit_name)?;

        let bounds = BoundSet::from_config(config, 1, 0.0, DELTA_CEILING_SECONDS)?;
        let slot = bounds.slot(0).copied().expect("one slot");

        let initial = match config.get("initialValue") {
            None => bounds.lowest_legal_values()[0],
            Some(raw) => {
                if let Some(value) = raw.as_f64() {
                    value
                } else if let Some(text) = raw.as_str() {
                    units.parse_delta("initialValue", text)?
                } else {
                    return Err(ValidateError::WrongType {
                        parameter: "initialValue".to_string(),
                        expected: "float or delta text",
                        found: raw.clone(),
                    });
                }
            }
        };

        if !slot.contains(initial) {
            return Err(ValidateError::OutOfBounds {
                parameter: "initialValue".to_string(),
                value: initial,
                min: slot.min,
                max: slot.max,
            });
        }

        self.initial_values = vec![initial];
        self.bounds = Some(bounds);
        self.unit = Some((unit_name, factor));
        Ok(())
    }

    fn build_common(&mut self, config: &RawConfig) -> Result<(), ValidateError> {
        self.scrollable = validate_param(
            config,
            "scrollable",
            &ParamRule::optional(ParamKind::Bool, false),
        )?
        .as_bool()
        .unwrap_or(false);

        self.send_every_change = validate_param(
            config,
            "sendEveryStateChange",
            &ParamRule::optional(ParamKind::Bool, true),
        )?
        .as_bool()
        .unwrap_or(true);

        let label = validate_param(
            config,
            "label",
            &ParamRule::optional(ParamKind::Text, self.identifier.as_str()),
        )?;
        self.properties.insert("label".to_string(), label);

        for name in ["enabled", "visible"] {
            let value =
                validate_param(config, name, &ParamRule::optional(ParamKind::Bool, true))?;
            self.properties.insert(name.to_string(), value);
        }

        Ok(())
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn kind(&self) -> ControlKind {
        self.kind
    }

    /// State identifiers, in ascending slot order. A single-state control
    /// has one entry equal to its identifier.
    pub fn state_ids(&self) -> &[String] {
        &self.state_ids
    }

    pub fn bounds(&self) -> Option<&BoundSet> {
        self.bounds.as_ref()
    }

    pub fn choices(&self) -> Option<&ChoiceList> {
        self.choices.as_ref()
    }

    pub fn open_choices(&self) -> Option<&OpenChoiceList> {
        self.open_choices.as_ref()
    }

    pub fn choice_tree(&self) -> Option<&ChoiceTree> {
        self.tree.as_ref()
    }

    /// Initial numeric values, one per state identifier (numeric kinds).
    pub fn initial_values(&self) -> &[f64] {
        &self.initial_values
    }

    pub fn initial_selection(&self) -> Option<&str> {
        self.initial_selection.as_deref()
    }

    pub fn initial_toggle(&self) -> bool {
        self.initial_toggle
    }

    /// Configured unit name and its length in seconds (timedelta only).
    pub fn unit(&self) -> Option<(&str, f64)> {
        self.unit.as_ref().map(|(name, factor)| (name.as_str(), *factor))
    }

    pub fn scrollable(&self) -> bool {
        self.scrollable
    }

    pub fn send_every_change(&self) -> bool {
        self.send_every_change
    }

    /// Names of the declared mutable properties.
    pub fn mutable_properties(&self) -> impl Iterator<Item = &str> {
        self.properties.keys().map(String::as_str)
    }

    /// Snapshot of the current property values.
    pub fn property_snapshot(&self) -> IndexMap<String, ConfigValue> {
        self.properties.clone()
    }

    pub fn get_property(&self, name: &str) -> Result<&ConfigValue, PropertyError> {
        self.properties
            .get(name)
            .ok_or_else(|| PropertyError::Unknown {
                control: self.identifier.clone(),
                property: name.to_string(),
            })
    }

    /// Set a declared mutable property. Returns whether the stored value
    /// actually changed. Undeclared names and values failing the property's
    /// own validation are rejected; the stored value is untouched on error.
    pub fn set_property(
        &mut self,
        name: &str,
        value: ConfigValue,
    ) -> Result<bool, PropertyError> {
        if !self.properties.contains_key(name) {
            return Err(PropertyError::Unknown {
                control: self.identifier.clone(),
                property: name.to_string(),
            });
        }

        self.check_property_value(name, &value)?;

        if name == "choices" {
            // Combo only (the property is declared only there): keep the
            // open choice list in step with the property value.
            let names: Vec<String> = value
                .as_list()
                .unwrap_or_default()
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect();
            if let Some(open) = self.open_choices.as_mut() {
                open.replace(names);
            }
        }

        let previous = self.properties.insert(name.to_string(), value);
        Ok(previous != self.properties.get(name).cloned())
    }

    fn check_property_value(
        &self,
        name: &str,
        value: &ConfigValue,
    ) -> Result<(), PropertyError> {
        let invalid = |reason: &str| PropertyError::Invalid {
            control: self.identifier.clone(),
            property: name.to_string(),
            value: value.clone(),
            reason: reason.to_string(),
        };

        match name {
            "label" => value.as_str().map(|_| ()).ok_or_else(|| invalid("expected text")),
            "enabled" | "visible" => value
                .as_bool()
                .map(|_| ())
                .ok_or_else(|| invalid("expected boolean")),
            "choices" => {
                let items = value.as_list().ok_or_else(|| invalid("expected a list"))?;
                if items.iter().all(|item| item.as_str().is_some()) {
                    Ok(())
                } else {
                    Err(invalid("expected a list of text entries"))
                }
            }
            // Declared properties are covered above; this arm is for
            // properties added by future kinds.
            _ => Ok(()),
        }
    }

    /// Admit a novel choice name at runtime (open choice lists only).
    /// Returns whether the name was new.
    pub fn add_choice(&mut self, name: &str) -> Result<bool, PropertyError> {
        let Some(open) = self.open_choices.as_mut() else {
            return Err(PropertyError::Unknown {
                control: self.identifier.clone(),
                property: "choices".to_string(),
            });
        };

        let inserted = open.insert(name);
        if inserted {
            let names = ConfigValue::List(open.names().map(ConfigValue::from).collect());
            self.properties.insert("choices".to_string(), names);
        }
        Ok(inserted)
    }
}

fn parse_header(config: &RawConfig) -> Result<(String, ControlKind), SpecError> {
    let identifier = match validate_param(
        config,
        "identifier",
        &ParamRule::required(ParamKind::Text),
    ) {
        Ok(value) => value.as_str().unwrap_or_default().to_string(),
        Err(e) => return Err(SpecError::new("<unnamed>", None, e)),
    };

    let tag = validate_param(config, "type", &ParamRule::required(ParamKind::Text))
        .map_err(|e| SpecError::new(identifier.as_str(), None, e))?;
    let tag = tag.as_str().unwrap_or_default().to_string();

    let kind = ControlKind::parse(&tag).ok_or_else(|| {
        SpecError::new(
            identifier.as_str(),
            None,
            ValidateError::Malformed {
                parameter: "type".to_string(),
                reason: format!("unknown control kind `{}`", tag),
            },
        )
    })?;

    Ok((identifier, kind))
}

/// Split a control identifier into its state identifiers and check the
/// shape against the kind: multi-state identifiers (`low:high`) are the
/// range family's; every other kind takes exactly one.
fn parse_state_ids(identifier: &str, kind: ControlKind) -> Result<Vec<String>, ValidateError> {
    let parts: Vec<String> = identifier.split(':').map(str::to_string).collect();

    if parts.iter().any(String::is_empty) {
        return Err(ValidateError::Malformed {
            parameter: "identifier".to_string(),
            reason: format!("`{}` contains an empty state identifier", identifier),
        });
    }

    for (i, part) in parts.iter().enumerate() {
        if parts[..i].contains(part) {
            return Err(ValidateError::Malformed {
                parameter: "identifier".to_string(),
                reason: format!("state identifier `{}` appears twice", part),
            });
        }
    }

    match kind {
        ControlKind::Range => {
            if parts.len() < 2 {
                return Err(ValidateError::Malformed {
                    parameter: "identifier".to_string(),
                    reason: "a range needs at least two `:`-separated state identifiers"
                        .to_string(),
                });
            }
        }
        _ => {
            if parts.len() != 1 {
                return Err(ValidateError::Malformed {
                    parameter: "identifier".to_string(),
                    reason: format!("a {} control takes a single state identifier", kind),
                });
            }
        }
    }

    Ok(parts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;

    fn config(entries: &[(&str, ConfigValue)]) -> RawConfig {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect::<IndexMap<_, _>>()
    }

    fn units() -> UnitRegistry {
        UnitRegistry::standard()
    }

    #[test]
    fn test_scale_defaults() {
        let cfg = config(&[
            ("identifier", "volume".into()),
            ("type", "scale".into()),
        ]);

        let spec = ControlSpec::build(cfg, &units()).unwrap();
        assert_eq!(spec.kind(), ControlKind::Scale);
        assert_eq!(spec.state_ids(), &["volume".to_string()]);
        assert_eq!(spec.initial_values(), &[0.0]);
        assert!(spec.send_every_change());
        assert!(!spec.scrollable());
        assert_eq!(
            spec.get_property("label").unwrap(),
            &ConfigValue::from("volume")
        );
    }

    #[test]
    fn test_scale_rejects_multi_state_identifier() {
        let cfg = config(&[
            ("identifier", "low:high".into()),
            ("type", "scale".into()),
        ]);

        let err = ControlSpec::build(cfg, &units()).unwrap_err();
        assert_eq!(err.parameter(), "identifier");
    }

    #[test]
    fn test_scale_out_of_bounds_initial() {
        let cfg = config(&[
            ("identifier", "volume".into()),
            ("type", "scale".into()),
            ("maxValue", ConfigValue::Int(10)),
            ("initialValue", ConfigValue::Int(11)),
        ]);

        let err = ControlSpec::build(cfg, &units()).unwrap_err();
        assert!(matches!(
            err.source,
            ValidateError::OutOfBounds { value, .. } if value == 11.0
        ));
    }

    #[test]
    fn test_range_two_state_identifier() {
        let cfg = config(&[
            ("identifier", "low:high".into()),
            ("type", "range".into()),
            ("minInterval", ConfigValue::Int(5)),
        ]);

        let spec = ControlSpec::build(cfg, &units()).unwrap();
        assert_eq!(spec.state_ids(), &["low".to_string(), "high".to_string()]);
        // Default initial: lowest legal ascending assignment.
        assert_eq!(spec.initial_values(), &[0.0, 5.0]);
    }

    #[test]
    fn test_range_requires_two_states() {
        let cfg = config(&[
            ("identifier", "only".into()),
            ("type", "range".into()),
        ]);

        let err = ControlSpec::build(cfg, &units()).unwrap_err();
        assert_eq!(err.parameter(), "identifier");
    }

    #[test]
    fn test_range_duplicate_state_identifier() {
        let cfg = config(&[
            ("identifier", "a:a".into()),
            ("type", "range".into()),
        ]);

        let err = ControlSpec::build(cfg, &units()).unwrap_err();
        assert!(matches!(err.source, ValidateError::Malformed { .. }));
    }

    #[test]
    fn test_range_initial_interval_checked() {
        let cfg = config(&[
            ("identifier", "low:high".into()),
            ("type", "range".into()),
            ("minInterval", ConfigValue::Int(10)),
            (
                "initialValue",
                ConfigValue::List(vec![ConfigValue::Int(20), ConfigValue::Int(25)]),
            ),
        ]);

        let err = ControlSpec::build(cfg, &units()).unwrap_err();
        assert_eq!(err.parameter(), "initialValue");
    }

    #[test]
    fn test_select_membership_and_default() {
        let cfg = config(&[
            ("identifier", "mode".into()),
            ("type", "select".into()),
            (
                "choices",
                ConfigValue::List(vec!["fast".into(), "slow".into()]),
            ),
        ]);

        let spec = ControlSpec::build(cfg, &units()).unwrap();
        assert_eq!(spec.initial_selection(), Some("fast"));
        assert!(spec.choices().unwrap().get("slow").is_some());
    }

    #[test]
    fn test_select_rejects_unknown_initial() {
        let cfg = config(&[
            ("identifier", "mode".into()),
            ("type", "select".into()),
            ("choices", ConfigValue::List(vec!["fast".into()])),
            ("initial", "warp".into()),
        ]);

        let err = ControlSpec::build(cfg, &units()).unwrap_err();
        assert!(matches!(err.source, ValidateError::UnknownChoice { .. }));
    }

    #[test]
    fn test_combo_accepts_novel_initial() {
        let cfg = config(&[
            ("identifier", "font".into()),
            ("type", "combo".into()),
            ("choices", ConfigValue::List(vec!["mono".into()])),
            ("initial", "custom".into()),
        ]);

        let spec = ControlSpec::build(cfg, &units()).unwrap();
        assert_eq!(spec.initial_selection(), Some("custom"));
    }

    #[test]
    fn test_combo_add_choice_updates_property() {
        let cfg = config(&[
            ("identifier", "font".into()),
            ("type", "combo".into()),
            ("choices", ConfigValue::List(vec!["mono".into()])),
        ]);

        let mut spec = ControlSpec::build(cfg, &units()).unwrap();
        assert!(spec.add_choice("serif").unwrap());
        assert!(!spec.add_choice("serif").unwrap());

        let prop = spec.get_property("choices").unwrap();
        assert_eq!(
            prop,
            &ConfigValue::List(vec!["mono".into(), "serif".into()])
        );
    }

    #[test]
    fn test_add_choice_rejected_for_closed_kinds() {
        let cfg = config(&[
            ("identifier", "mode".into()),
            ("type", "select".into()),
            ("choices", ConfigValue::List(vec!["fast".into()])),
        ]);

        let mut spec = ControlSpec::build(cfg, &units()).unwrap();
        assert!(matches!(
            spec.add_choice("slow"),
            Err(PropertyError::Unknown { .. })
        ));
    }

    #[test]
    fn test_tree_initial_resolved_anywhere() {
        let choices = ConfigValue::List(vec![ConfigValue::Map(
            [
                ("name".to_string(), ConfigValue::from("root")),
                (
                    "choices".to_string(),
                    ConfigValue::List(vec!["deep".into()]),
                ),
            ]
            .into_iter()
            .collect(),
        )]);
        let cfg = config(&[
            ("identifier", "section".into()),
            ("type", "tree".into()),
            ("choices", choices),
            ("initial", "deep".into()),
        ]);

        let spec = ControlSpec::build(cfg, &units()).unwrap();
        assert_eq!(spec.initial_selection(), Some("deep"));
        assert!(spec.choice_tree().unwrap().contains_identifier("deep"));
    }

    #[test]
    fn test_toggle_initial() {
        let cfg = config(&[
            ("identifier", "mute".into()),
            ("type", "toggle".into()),
            ("initialValue", ConfigValue::Bool(true)),
        ]);

        let spec = ControlSpec::build(cfg, &units()).unwrap();
        assert!(spec.initial_toggle());
        assert!(spec.bounds().is_none());
    }

    #[test]
    fn test_timedelta_units_and_text_initial() {
        let cfg = config(&[
            ("identifier", "timeout".into()),
            ("type", "timedelta".into()),
            ("units", "minutes".into()),
            ("initialValue", "1h 30m".into()),
        ]);

        let spec = ControlSpec::build(cfg, &units()).unwrap();
        assert_eq!(spec.unit(), Some(("minutes", 60.0)));
        assert_eq!(spec.initial_values(), &[5_400.0]);
    }

    #[test]
    fn test_timedelta_unknown_unit() {
        let cfg = config(&[
            ("identifier", "timeout".into()),
            ("type", "timedelta".into()),
            ("units", "lightyears".into()),
        ]);

        let err = ControlSpec::build(cfg, &units()).unwrap_err();
        assert!(matches!(err.source, ValidateError::UnknownUnit { .. }));
    }

    #[test]
    fn test_unknown_kind() {
        let cfg = config(&[
            ("identifier", "x".into()),
            ("type", "calendar".into()),
        ]);

        let err = ControlSpec::build(cfg, &units()).unwrap_err();
        assert_eq!(err.parameter(), "type");
        assert!(err.kind.is_none());
    }

    #[test]
    fn test_missing_identifier() {
        let cfg = config(&[("type", "scale".into())]);

        let err = ControlSpec::build(cfg, &units()).unwrap_err();
        assert_eq!(err.control, "<unnamed>");
        assert!(matches!(err.source, ValidateError::MissingRequired { .. }));
    }

    #[test]
    fn test_unrecognized_keys_ignored() {
        let cfg = config(&[
            ("identifier", "volume".into()),
            ("type", "scale".into()),
            ("colour", "red".into()),
        ]);

        assert!(ControlSpec::build(cfg, &units()).is_ok());
    }

    #[test]
    fn test_property_access() {
        let cfg = config(&[
            ("identifier", "volume".into()),
            ("type", "scale".into()),
        ]);
        let mut spec = ControlSpec::build(cfg, &units()).unwrap();

        assert!(spec
            .set_property("enabled", ConfigValue::Bool(false))
            .unwrap());
        assert_eq!(
            spec.get_property("enabled").unwrap(),
            &ConfigValue::Bool(false)
        );

        // Same value again: no change.
        assert!(!spec
            .set_property("enabled", ConfigValue::Bool(false))
            .unwrap());

        let err = spec.get_property("weight").unwrap_err();
        assert!(matches!(err, PropertyError::Unknown { .. }));

        let err = spec
            .set_property("enabled", ConfigValue::from("yes"))
            .unwrap_err();
        assert!(matches!(err, PropertyError::Invalid { .. }));
        // Stored value untouched after a rejected set.
        assert_eq!(
            spec.get_property("enabled").unwrap(),
            &ConfigValue::Bool(false)
        );
    }
}
