//! Strongly-typed handles into a frame's field, group, and control-variable
//! arenas.

use std::fmt;

/// Identifies a field within a frame.
///
/// Fields are registered through the frame and assigned sequential IDs.
/// `FieldId(n)` is the n-th field registered, including integration
/// variables (which are fields too).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldId(pub u32);

impl fmt::Display for FieldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for FieldId {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

/// Identifies a group within a frame.
///
/// `GroupId(0)` is always the frame's root group.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupId(pub u32);

impl GroupId {
    /// The root group every frame starts with.
    pub const ROOT: GroupId = GroupId(0);
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for GroupId {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

/// Identifies an integration variable (the control variable) within a frame.
///
/// Every integration variable is backed by a regular field holding its
/// current value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IntVarId(pub u32);

impl fmt::Display for IntVarId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for IntVarId {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

/// A registered child of a group.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Child {
    /// A field (or integration variable) child.
    Field(FieldId),
    /// A nested group child.
    Group(GroupId),
}

impl Child {
    /// The field handle, if this child is a field.
    pub fn as_field(self) -> Option<FieldId> {
        match self {
            Self::Field(id) => Some(id),
            Self::Group(_) => None,
        }
    }

    /// The group handle, if this child is a group.
    pub fn as_group(self) -> Option<GroupId> {
        match self {
            Self::Group(id) => Some(id),
            Self::Field(_) => None,
        }
    }
}

impl From<FieldId> for Child {
    fn from(id: FieldId) -> Self {
        Self::Field(id)
    }
}

impl From<GroupId> for Child {
    fn from(id: GroupId) -> Self {
        Self::Group(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn child_accessors_discriminate() {
        let f = Child::from(FieldId(3));
        let g = Child::from(GroupId(1));
        assert_eq!(f.as_field(), Some(FieldId(3)));
        assert_eq!(f.as_group(), None);
        assert_eq!(g.as_group(), Some(GroupId(1)));
        assert_eq!(g.as_field(), None);
    }

    #[test]
    fn root_group_is_zero() {
        assert_eq!(GroupId::ROOT, GroupId(0));
        assert_eq!(GroupId::ROOT.to_string(), "0");
    }
}
