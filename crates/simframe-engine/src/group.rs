//! Groups: ordered, named collections of children.

use indexmap::IndexMap;
use simframe_core::{Child, GroupId};

use crate::updater::{HookFn, UpdateRule};

/// A named, ordered collection of child fields and groups.
///
/// Children keep their registration order. A group updates according to
/// its [`UpdateRule`]; by default it does nothing.
#[derive(Debug)]
pub struct Group {
    pub(crate) name: String,
    pub(crate) description: String,
    pub(crate) parent: Option<GroupId>,
    pub(crate) children: IndexMap<String, Child>,
    pub(crate) updater: UpdateRule<HookFn>,
}

impl Group {
    pub(crate) fn new(name: String, parent: Option<GroupId>) -> Self {
        Self {
            name,
            description: String::new(),
            parent,
            children: IndexMap::new(),
            updater: UpdateRule::NoOp,
        }
    }

    /// The group's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Free-form description.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Sets the description.
    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = description.into();
    }

    /// The enclosing group; `None` for the root.
    pub fn parent(&self) -> Option<GroupId> {
        self.parent
    }

    /// Looks up a direct child by name.
    pub fn child(&self, name: &str) -> Option<Child> {
        self.children.get(name).copied()
    }

    /// Direct children in registration order.
    pub fn children(&self) -> impl Iterator<Item = (&str, Child)> {
        self.children.iter().map(|(name, child)| (name.as_str(), *child))
    }

    /// Number of direct children.
    pub fn len(&self) -> usize {
        self.children.len()
    }

    /// Whether the group has no children.
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Sets what [`Frame::update_group`](crate::Frame::update_group) does.
    ///
    /// To update children by name, build the rule with
    /// [`Frame::resolve_order`](crate::Frame::resolve_order) or use
    /// [`Frame::set_update_order`](crate::Frame::set_update_order).
    pub fn set_updater(&mut self, rule: impl Into<UpdateRule<HookFn>>) {
        self.updater = rule.into();
    }

    /// The child names this group updates, if it updates by order.
    pub fn update_order(&self) -> Option<Vec<&str>> {
        self.updater
            .update_order()
            .map(|order| order.names().collect())
    }
}
