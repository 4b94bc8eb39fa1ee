use crate::models::value::RawConfig;

/// One node in a choice universe.
///
/// A choice has a display name, an identifier (defaulting to the name when
/// the configuration omits it), optional children for hierarchical
/// universes, and an optional list of detail sub-configurations - raw
/// configuration maps a panel builder may turn into detail control
/// specifiers attached to this choice.
///
/// Names must be unique among siblings; the same name may recur in other
/// branches or at other depths. Uniqueness is enforced by the choice
/// validators at construction time, not here.
#[derive(Debug, Clone, PartialEq)]
pub struct Choice {
    pub name: String,
    pub identifier: String,
    pub children: Vec<Choice>,
    pub details: Vec<RawConfig>,
}

impl Choice {
    /// A leaf choice whose identifier equals its name.
    pub fn leaf(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            identifier: name.clone(),
            name,
            children: Vec::new(),
            details: Vec::new(),
        }
    }

    /// A branch choice with the given children.
    pub fn branch(name: impl Into<String>, children: Vec<Choice>) -> Self {
        Self {
            children,
            ..Self::leaf(name)
        }
    }

    pub fn is_branch(&self) -> bool {
        !self.children.is_empty()
    }
}

/// A selected subtree of a hierarchical choice universe.
///
/// Selection nodes name choices by identifier. A selection is legal only if
/// it is a structural subset of the universe: every node must resolve among
/// the sibling group its position corresponds to, and its children must
/// resolve among that choice's children. Selecting a branch selects that
/// node alone - descendants are selected independently and explicitly.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub identifier: String,
    pub children: Vec<Selection>,
}

impl Selection {
    pub fn leaf(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            children: Vec::new(),
        }
    }

    pub fn branch(identifier: impl Into<String>, children: Vec<Selection>) -> Self {
        Self {
            identifier: identifier.into(),
            children,
        }
    }
}
