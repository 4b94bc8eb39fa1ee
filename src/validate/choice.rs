//! Choice validators: closed lists, open lists, and hierarchical universes.
//!
//! All three share the same configuration shape for the `choices` parameter:
//! an ordered list whose entries are either bare strings (a name-only leaf)
//! or mappings with `name`, optional `identifier` (defaults to the name),
//! optional nested `choices` children, and optional `details` - a list of raw
//! sub-configurations a panel builder may turn into detail control
//! specifiers.

use crate::models::{Choice, ConfigValue, Selection};
use crate::validate::ValidateError;

/// Sibling-group label used when reporting duplicates among root choices.
const ROOT_GROUP: &str = "<root>";

/// Parse a flat choice list (for the closed and open list validators).
///
/// Nested children are rejected: hierarchy is the tree validator's shape.
/// Sibling names must be unique.
pub fn parse_choice_list(
    parameter: &str,
    value: &ConfigValue,
) -> Result<Vec<Choice>, ValidateError> {
    let choices = parse_siblings(parameter, value, ROOT_GROUP, false)?;
    Ok(choices)
}

/// Parse a hierarchical choice universe of arbitrary depth.
///
/// Recurses depth-first, checking name uniqueness among each node's
/// immediate children; root choices form one sibling group. Identical names
/// in different branches or at different depths are accepted.
pub fn parse_choice_tree(
    parameter: &str,
    value: &ConfigValue,
) -> Result<Vec<Choice>, ValidateError> {
    parse_siblings(parameter, value, ROOT_GROUP, true)
}

fn parse_siblings(
    parameter: &str,
    value: &ConfigValue,
    parent: &str,
    allow_children: bool,
) -> Result<Vec<Choice>, ValidateError> {
    let Some(entries) = value.as_list() else {
        return Err(ValidateError::WrongType {
            parameter: parameter.to_string(),
            expected: "list",
            found: value.clone(),
        });
    };

    let mut choices = Vec::with_capacity(entries.len());
    for entry in entries {
        choices.push(parse_entry(parameter, entry, allow_children)?);
    }

    // Uniqueness is per sibling group only.
    for (i, choice) in choices.iter().enumerate() {
        if choices[..i].iter().any(|c| c.name == choice.name) {
            return Err(ValidateError::DuplicateChoiceName {
                name: choice.name.clone(),
                parent: parent.to_string(),
            });
        }
    }

    Ok(choices)
}

fn parse_entry(
    parameter: &str,
    entry: &ConfigValue,
    allow_children: bool,
) -> Result<Choice, ValidateError> {
    if let Some(name) = entry.as_str() {
        return Ok(Choice::leaf(name));
    }

    let Some(map) = entry.as_map() else {
        return Err(ValidateError::Malformed {
            parameter: parameter.to_string(),
            reason: format!(
                "choice entries must be names or mappings, found {}",
                entry.type_name()
            ),
        });
    };

    let name = map
        .get("name")
        .and_then(ConfigValue::as_str)
        .ok_or_else(|| ValidateError::Malformed {
            parameter: parameter.to_string(),
            reason: "choice mapping is missing a text `name`".to_string(),
        })?
        .to_string();

    let identifier = match map.get("identifier") {
        None => name.clone(),
        Some(value) => value
            .as_str()
            .ok_or_else(|| ValidateError::WrongType {
                parameter: parameter.to_string(),
                expected: "text",
                found: value.clone(),
            })?
            .to_string(),
    };

    let children = match map.get("choices") {
        None => Vec::new(),
        Some(_) if !allow_children => {
            return Err(ValidateError::Malformed {
                parameter: parameter.to_string(),
                reason: format!("choice `{}` nests children in a flat choice list", name),
            });
        }
        Some(value) => parse_siblings(parameter, value, &name, true)?,
    };

    let details = match map.get("details") {
        None => Vec::new(),
        Some(value) => {
            let Some(items) = value.as_list() else {
                return Err(ValidateError::WrongType {
                    parameter: parameter.to_string(),
                    expected: "list of mappings",
                    found: value.clone(),
                });
            };
            let mut details = Vec::with_capacity(items.len());
            for item in items {
                let Some(map) = item.as_map() else {
                    return Err(ValidateError::Malformed {
                        parameter: parameter.to_string(),
                        reason: format!(
                            "detail entries of `{}` must be mappings, found {}",
                            name,
                            item.type_name()
                        ),
                    });
                };
                details.push(map.clone());
            }
            details
        }
    };

    Ok(Choice {
        name,
        identifier,
        children,
        details,
    })
}

/// Bounded choice validator: the configured list is the full universe.
#[derive(Debug, Clone, PartialEq)]
pub struct ChoiceList {
    choices: Vec<Choice>,
}

impl ChoiceList {
    pub fn new(choices: Vec<Choice>) -> Self {
        Self { choices }
    }

    pub fn choices(&self) -> &[Choice] {
        &self.choices
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.choices.iter().map(|c| c.name.as_str())
    }

    pub fn get(&self, name: &str) -> Option<&Choice> {
        self.choices.iter().find(|c| c.name == name)
    }

    /// A state value naming a choice outside the closed set is rejected.
    pub fn validate_selection(&self, parameter: &str, name: &str) -> Result<(), ValidateError> {
        if self.get(name).is_some() {
            Ok(())
        } else {
            Err(ValidateError::UnknownChoice {
                parameter: parameter.to_string(),
                name: name.to_string(),
            })
        }
    }
}

/// Unbounded choice validator: seeded from configuration, extensible at
/// runtime. Validation rejects only malformed entries, never novel names.
#[derive(Debug, Clone, PartialEq)]
pub struct OpenChoiceList {
    choices: Vec<Choice>,
}

impl OpenChoiceList {
    pub fn new(choices: Vec<Choice>) -> Self {
        Self { choices }
    }

    pub fn choices(&self) -> &[Choice] {
        &self.choices
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.choices.iter().map(|c| c.name.as_str())
    }

    /// Admit a novel name at runtime. Returns `false` when the name was
    /// already present (sibling names stay unique).
    pub fn insert(&mut self, name: &str) -> bool {
        if self.choices.iter().any(|c| c.name == name) {
            return false;
        }
        self.choices.push(Choice::leaf(name));
        true
    }

    /// Replace the whole seed list, keeping first occurrence of each name.
    pub fn replace(&mut self, names: impl IntoIterator<Item = String>) {
        self.choices.clear();
        for name in names {
            self.insert(&name);
        }
    }

    /// Open lists accept any text value; only a wrong type is an error.
    pub fn validate_entry(&self, parameter: &str, value: &ConfigValue) -> Result<(), ValidateError> {
        if value.as_str().is_some() {
            Ok(())
        } else {
            Err(ValidateError::WrongType {
                parameter: parameter.to_string(),
                expected: "text",
                found: value.clone(),
            })
        }
    }
}

/// Hierarchical choice validator: a tree-shaped universe whose accepted
/// state is a structural subset of the tree.
#[derive(Debug, Clone, PartialEq)]
pub struct ChoiceTree {
    roots: Vec<Choice>,
}

impl ChoiceTree {
    pub fn new(roots: Vec<Choice>) -> Self {
        Self { roots }
    }

    pub fn roots(&self) -> &[Choice] {
        &self.roots
    }

    /// Whether any node anywhere in the universe carries this identifier.
    pub fn contains_identifier(&self, identifier: &str) -> bool {
        fn walk(nodes: &[Choice], identifier: &str) -> bool {
            nodes.iter().any(|node| {
                node.identifier == identifier || walk(&node.children, identifier)
            })
        }
        walk(&self.roots, identifier)
    }

    /// Validate that a selection forest is a structural subset of the
    /// universe: each selection node must resolve by identifier among the
    /// sibling group its position corresponds to, and its children recurse
    /// into that choice's children. Selecting a branch selects that node
    /// alone; descendants are selected independently.
    pub fn validate_selection(
        &self,
        parameter: &str,
        selection: &[Selection],
    ) -> Result<(), ValidateError> {
        validate_level(parameter, &self.roots, selection)
    }
}

fn validate_level(
    parameter: &str,
    universe: &[Choice],
    selection: &[Selection],
) -> Result<(), ValidateError> {
    for selected in selection {
        let Some(node) = universe.iter().find(|c| c.identifier == selected.identifier) else {
            return Err(ValidateError::UnknownChoice {
                parameter: parameter.to_string(),
                name: selected.identifier.clone(),
            });
        };
        validate_level(parameter, &node.children, &selected.children)?;
    }
    Ok(())
}
