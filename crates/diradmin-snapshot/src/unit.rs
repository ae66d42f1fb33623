//! The import unit tree.
//!
//! A snapshot is presented to the operator as a tree of [`ImportUnit`]s. Leaves carry a payload
//! that the importer can apply; containers only group leaves. Every node has its own `active`
//! flag, and a container's flag never propagates to its children.

use serde_json::Value;
use std::fmt;

/// Kind of an applicable (leaf) unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnitKind {
    /// Global settings
    MainConfig,
    /// Server certificate bundle
    Certificates,
    /// Settings of one server profile
    ServerProfile,
    /// All account templates of one profile
    AccountProfile,
}

/// Kind of a grouping (container) unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContainerKind {
    /// Groups [`UnitKind::ServerProfile`] leaves
    ServerProfiles,
    /// Groups [`UnitKind::AccountProfile`] leaves
    AccountProfiles,
}

impl ContainerKind {
    /// Display label of the container.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::ServerProfiles => "Server profiles",
            Self::AccountProfiles => "Account profiles",
        }
    }
}

/// Structured reference to the configuration a leaf unit writes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum UnitIdentity {
    /// Global settings
    MainConfig,
    /// Server certificate bundle
    Certificates,
    /// Settings of the named profile
    ServerProfile {
        /// Profile name
        profile: String,
    },
    /// Account templates of the named profile
    AccountProfile {
        /// Profile name
        profile: String,
    },
}

impl UnitIdentity {
    /// Identity of a server profile leaf.
    #[must_use]
    pub fn server_profile(profile: impl Into<String>) -> Self {
        Self::ServerProfile {
            profile: profile.into(),
        }
    }

    /// Identity of an account profile leaf.
    #[must_use]
    pub fn account_profile(profile: impl Into<String>) -> Self {
        Self::AccountProfile {
            profile: profile.into(),
        }
    }

    /// The kind of unit this identity addresses.
    #[must_use]
    pub const fn kind(&self) -> UnitKind {
        match self {
            Self::MainConfig => UnitKind::MainConfig,
            Self::Certificates => UnitKind::Certificates,
            Self::ServerProfile { .. } => UnitKind::ServerProfile,
            Self::AccountProfile { .. } => UnitKind::AccountProfile,
        }
    }

    /// Profile name for per-profile identities.
    #[must_use]
    pub fn profile(&self) -> Option<&str> {
        match self {
            Self::ServerProfile { profile } | Self::AccountProfile { profile } => Some(profile),
            Self::MainConfig | Self::Certificates => None,
        }
    }

    fn default_label(&self) -> String {
        match self {
            Self::MainConfig => "Main configuration".to_string(),
            Self::Certificates => "Certificates".to_string(),
            Self::ServerProfile { profile } | Self::AccountProfile { profile } => profile.clone(),
        }
    }
}

impl fmt::Display for UnitIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MainConfig => write!(f, "mainConfig"),
            Self::Certificates => write!(f, "certificates"),
            Self::ServerProfile { profile } => write!(f, "serverProfile:{profile}"),
            Self::AccountProfile { profile } => write!(f, "accountProfile:{profile}"),
        }
    }
}

/// Content of a unit: an applicable leaf or a grouping container.
#[derive(Debug, Clone, PartialEq)]
pub enum UnitNode {
    /// Applicable unit
    Leaf {
        /// What the payload is written to
        identity: UnitIdentity,
        /// Section or sub-section data from the snapshot
        payload: Value,
    },
    /// Organizational parent; never applied itself
    Container {
        /// What the children are
        kind: ContainerKind,
        /// Child units in document order
        children: Vec<ImportUnit>,
    },
}

/// One node of the import tree.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportUnit {
    label: String,
    active: bool,
    node: UnitNode,
}

impl ImportUnit {
    /// Creates an inactive leaf.
    #[must_use]
    pub fn leaf(identity: UnitIdentity, payload: Value) -> Self {
        Self {
            label: identity.default_label(),
            active: false,
            node: UnitNode::Leaf { identity, payload },
        }
    }

    /// Creates an inactive container.
    #[must_use]
    pub fn container(kind: ContainerKind, children: Vec<ImportUnit>) -> Self {
        Self {
            label: kind.label().to_string(),
            active: false,
            node: UnitNode::Container { kind, children },
        }
    }

    /// Human-readable label.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Whether the operator selected this unit.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.active
    }

    /// Selects or deselects this node only.
    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    /// The node content.
    #[must_use]
    pub const fn node(&self) -> &UnitNode {
        &self.node
    }

    /// Returns true for grouping units.
    #[must_use]
    pub const fn is_container(&self) -> bool {
        matches!(self.node, UnitNode::Container { .. })
    }

    /// Identity of a leaf; `None` for containers.
    #[must_use]
    pub const fn identity(&self) -> Option<&UnitIdentity> {
        match &self.node {
            UnitNode::Leaf { identity, .. } => Some(identity),
            UnitNode::Container { .. } => None,
        }
    }

    /// Payload of a leaf; `None` for containers.
    #[must_use]
    pub const fn payload(&self) -> Option<&Value> {
        match &self.node {
            UnitNode::Leaf { payload, .. } => Some(payload),
            UnitNode::Container { .. } => None,
        }
    }

    /// Children of a container; empty for leaves.
    #[must_use]
    pub fn children(&self) -> &[ImportUnit] {
        match &self.node {
            UnitNode::Container { children, .. } => children,
            UnitNode::Leaf { .. } => &[],
        }
    }

    /// Depth-first, pre-order traversal of this node and its descendants.
    pub fn iter(&self) -> UnitIter<'_> {
        UnitIter { stack: vec![self] }
    }

    /// Finds the leaf with `identity` in this subtree.
    pub fn find_mut(&mut self, identity: &UnitIdentity) -> Option<&mut ImportUnit> {
        if self.identity() == Some(identity) {
            return Some(self);
        }
        match &mut self.node {
            UnitNode::Container { children, .. } => find_unit_mut(children, identity),
            UnitNode::Leaf { .. } => None,
        }
    }

    fn set_active_recursive(&mut self, active: bool) {
        self.active = active;
        if let UnitNode::Container { children, .. } = &mut self.node {
            for child in children {
                child.set_active_recursive(active);
            }
        }
    }
}

/// Depth-first iterator over an [`ImportUnit`] subtree.
#[derive(Debug)]
pub struct UnitIter<'a> {
    stack: Vec<&'a ImportUnit>,
}

impl<'a> Iterator for UnitIter<'a> {
    type Item = &'a ImportUnit;

    fn next(&mut self) -> Option<Self::Item> {
        let unit = self.stack.pop()?;
        self.stack.extend(unit.children().iter().rev());
        Some(unit)
    }
}

/// Finds the leaf with `identity` anywhere in `units`.
pub fn find_unit_mut<'a>(
    units: &'a mut [ImportUnit],
    identity: &UnitIdentity,
) -> Option<&'a mut ImportUnit> {
    units.iter_mut().find_map(|unit| unit.find_mut(identity))
}

/// Activates a single leaf by identity, returning false if no such leaf exists.
pub fn activate(units: &mut [ImportUnit], identity: &UnitIdentity) -> bool {
    match find_unit_mut(units, identity) {
        Some(unit) => {
            unit.set_active(true);
            true
        }
        None => false,
    }
}

/// Activates every node of every tree.
pub fn activate_all(units: &mut [ImportUnit]) {
    for unit in units {
        unit.set_active_recursive(true);
    }
}

/// Iterates every leaf of every tree in depth-first order.
pub fn leaves(units: &[ImportUnit]) -> impl Iterator<Item = &ImportUnit> + '_ {
    units
        .iter()
        .flat_map(ImportUnit::iter)
        .filter(|unit| !unit.is_container())
}
