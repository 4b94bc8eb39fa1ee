//! Integration tests for specifier construction
//!
//! These tests drive ControlSpec::build with configurations shaped like real
//! panel definition files (loaded through serde_yaml_ng, exactly as
//! PanelLoader produces them) and verify:
//! - Fail-fast construction with fully annotated errors
//! - Per-kind capability composition (bounds, choices, units)
//! - The declared mutable-property surface and its validation

use formkit::models::{ConfigValue, RawConfig};
use formkit::spec::{ControlKind, ControlSpec, PropertyError, UnitRegistry};
use formkit::validate::ValidateError;

fn from_yaml(yaml: &str) -> RawConfig {
    serde_yaml_ng::from_str(yaml).expect("test YAML parses")
}

fn build(yaml: &str) -> Result<ControlSpec, formkit::SpecError> {
    ControlSpec::build(from_yaml(yaml), &UnitRegistry::standard())
}

#[test]
fn test_scale_from_yaml() {
    let spec = build(
        "identifier: brightness\n\
         type: scale\n\
         minValue: 10\n\
         maxValue: 90\n\
         initialValue: 40\n\
         precision: 1\n\
         scrollable: true\n",
    )
    .unwrap();

    assert_eq!(spec.kind(), ControlKind::Scale);
    assert_eq!(spec.initial_values(), &[40.0]);
    assert!(spec.scrollable());
    assert_eq!(spec.bounds().unwrap().precision(), 1);
}

#[test]
fn test_range_colon_identifier_builds_two_slots() {
    let spec = build(
        "identifier: \"low:high\"\n\
         type: range\n\
         minValue: 0\n\
         maxValue: 100\n\
         minInterval: 5\n\
         initialValue: [20, 60]\n\
         sendEveryStateChange: false\n",
    )
    .unwrap();

    assert_eq!(spec.state_ids(), &["low".to_string(), "high".to_string()]);
    assert_eq!(spec.initial_values(), &[20.0, 60.0]);
    assert!(!spec.send_every_change());
}

#[test]
fn test_construction_errors_carry_full_identity() {
    // Initial value outside the declared bounds.
    let err = build(
        "identifier: brightness\n\
         type: scale\n\
         maxValue: 50\n\
         initialValue: 70\n",
    )
    .unwrap_err();

    assert_eq!(err.control, "brightness");
    assert_eq!(err.kind, Some(ControlKind::Scale));
    assert_eq!(err.parameter(), "initialValue");
    assert_eq!(err.offending_value(), Some(ConfigValue::Float(70.0)));
    // Human-readable reason names the control, the kind, and the violation.
    let text = err.to_string();
    assert!(text.contains("brightness"));
    assert!(text.contains("scale"));
    assert!(text.contains("70"));
}

#[test]
fn test_incompatible_range_bounds_fail_fast() {
    let err = build(
        "identifier: \"a:b\"\n\
         type: range\n\
         minValue: [50, 0]\n\
         maxValue: [100, 40]\n\
         minInterval: 5\n",
    )
    .unwrap_err();

    assert!(matches!(err.source, ValidateError::IncompatibleBounds { .. }));
}

#[test]
fn test_select_closed_universe() {
    let yaml = r#"
identifier: theme
type: select
choices:
  - name: Light
    identifier: light
  - name: Dark
    identifier: dark
initial: Dark
"#;
    let spec = build(yaml).unwrap();

    let choices = spec.choices().unwrap();
    assert_eq!(choices.get("Dark").unwrap().identifier, "dark");
    assert!(choices.validate_selection("state", "Sepia").is_err());
}

#[test]
fn test_tree_with_details() {
    let yaml = r#"
identifier: alert
type: tree
choices:
  - name: threshold
    choices:
      - name: custom
        details:
          - identifier: amount
            type: scale
  - name: disabled
"#;
    let spec = build(yaml).unwrap();

    let tree = spec.choice_tree().unwrap();
    assert!(tree.contains_identifier("custom"));

    // The detail sub-configuration is carried through as a raw map and
    // builds into its own specifier.
    let custom = &tree.roots()[0].children[0];
    assert_eq!(custom.details.len(), 1);
    let detail =
        ControlSpec::build(custom.details[0].clone(), &UnitRegistry::standard()).unwrap();
    assert_eq!(detail.identifier(), "amount");
    assert_eq!(detail.kind(), ControlKind::Scale);
}

#[test]
fn test_timedelta_with_custom_registry() {
    let mut units = UnitRegistry::standard();
    units.register("shifts", 8.0 * 3_600.0).unwrap();

    let config = from_yaml(
        "identifier: rotation\n\
         type: timedelta\n\
         units: shifts\n\
         initialValue: \"2 shifts\"\n",
    );

    let spec = ControlSpec::build(config, &units).unwrap();
    assert_eq!(spec.unit(), Some(("shifts", 28_800.0)));
    assert_eq!(spec.initial_values(), &[57_600.0]);
}

#[test]
fn test_unknown_keys_are_ignored() {
    let spec = build(
        "identifier: brightness\n\
         type: scale\n\
         tooltip: unused by this layer\n\
         renderHint: 3\n",
    )
    .unwrap();
    assert_eq!(spec.identifier(), "brightness");
}

#[test]
fn test_recognized_but_malformed_key_fails() {
    let err = build(
        "identifier: brightness\n\
         type: scale\n\
         scrollable: sometimes\n",
    )
    .unwrap_err();
    assert_eq!(err.parameter(), "scrollable");
    assert!(matches!(err.source, ValidateError::WrongType { .. }));
}

#[test]
fn test_mutable_property_surface() {
    let mut spec = build(
        "identifier: font\n\
         type: combo\n\
         choices: [mono, serif]\n\
         label: Font family\n",
    )
    .unwrap();

    let declared: Vec<&str> = spec.mutable_properties().collect();
    assert!(declared.contains(&"label"));
    assert!(declared.contains(&"enabled"));
    assert!(declared.contains(&"visible"));
    assert!(declared.contains(&"choices"));

    // The open list is runtime-extensible, and the property mirrors it.
    assert!(spec.add_choice("cursive").unwrap());
    assert_eq!(
        spec.get_property("choices").unwrap(),
        &ConfigValue::List(vec!["mono".into(), "serif".into(), "cursive".into()])
    );

    // Replacing the property value resynchronizes the open list.
    spec.set_property(
        "choices",
        ConfigValue::List(vec!["mono".into()]),
    )
    .unwrap();
    assert_eq!(spec.open_choices().unwrap().names().count(), 1);

    // Undeclared property name: rejected, nothing stored.
    assert!(matches!(
        spec.set_property("weight", ConfigValue::Int(700)),
        Err(PropertyError::Unknown { .. })
    ));
}

#[test]
fn test_two_state_controls_are_ranges_only() {
    for kind in ["scale", "select", "combo", "tree", "toggle", "timedelta"] {
        let yaml = format!(
            "identifier: \"a:b\"\ntype: {}\nchoices: [x]\n",
            kind
        );
        let err = build(&yaml).unwrap_err();
        assert_eq!(err.parameter(), "identifier", "kind {}", kind);
    }
}
