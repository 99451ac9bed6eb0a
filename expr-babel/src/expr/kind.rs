//! Node kinds and their document tags.
//!
//! Every [`NodeKind`] has exactly one tag, derived from its name in
//! kebab-case (`AddAssignChecked` → `add-assign-checked`). Both directions of
//! the mapping are computed once on first use and never change afterwards.

use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::fmt;

macro_rules! node_kinds {
    ($($kind:ident),* $(,)?) => {
        /// Discriminator of an expression node.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum NodeKind {
            $($kind),*
        }

        impl NodeKind {
            /// Every kind, in declaration order.
            pub const ALL: &'static [NodeKind] = &[$(NodeKind::$kind),*];

            /// The kind's name (`AddChecked`).
            pub fn name(self) -> &'static str {
                match self {
                    $(NodeKind::$kind => stringify!($kind)),*
                }
            }
        }
    };
}

node_kinds! {
    Add,
    AddChecked,
    And,
    AndAlso,
    ArrayLength,
    ArrayIndex,
    Call,
    Coalesce,
    Conditional,
    Constant,
    Convert,
    ConvertChecked,
    Divide,
    Equal,
    ExclusiveOr,
    GreaterThan,
    GreaterThanOrEqual,
    Invoke,
    Lambda,
    LeftShift,
    LessThan,
    LessThanOrEqual,
    ListInit,
    MemberAccess,
    MemberInit,
    Modulo,
    Multiply,
    MultiplyChecked,
    Negate,
    UnaryPlus,
    NegateChecked,
    New,
    NewArrayInit,
    NewArrayBounds,
    Not,
    NotEqual,
    Or,
    OrElse,
    Parameter,
    Power,
    Quote,
    RightShift,
    Subtract,
    SubtractChecked,
    TypeAs,
    TypeIs,
    Assign,
    Block,
    DebugInfo,
    Decrement,
    Dynamic,
    Default,
    Extension,
    Goto,
    Increment,
    Index,
    Label,
    RuntimeVariables,
    Loop,
    Switch,
    Throw,
    Try,
    Unbox,
    AddAssign,
    AndAssign,
    DivideAssign,
    ExclusiveOrAssign,
    LeftShiftAssign,
    ModuloAssign,
    MultiplyAssign,
    OrAssign,
    PowerAssign,
    RightShiftAssign,
    SubtractAssign,
    AddAssignChecked,
    MultiplyAssignChecked,
    SubtractAssignChecked,
    PreIncrementAssign,
    PreDecrementAssign,
    PostIncrementAssign,
    PostDecrementAssign,
    TypeEqual,
    OnesComplement,
    IsTrue,
    IsFalse,
}

/// Structural family of a node kind: which node struct carries it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeFamily {
    Binary,
    Unary,
    TypeBinary,
    NewArray,
    /// A kind with its own dedicated node struct.
    Single,
}

/// Convert a node kind name to a tag name (e.g., "TextLine" → "text-line")
fn to_tag_name(node_type: &str) -> String {
    let mut tag = String::new();
    for (i, c) in node_type.chars().enumerate() {
        if i > 0 && c.is_uppercase() {
            tag.push('-');
        }
        tag.extend(c.to_lowercase());
    }
    tag
}

static TAGS: Lazy<Vec<String>> =
    Lazy::new(|| NodeKind::ALL.iter().map(|kind| to_tag_name(kind.name())).collect());

static KINDS_BY_TAG: Lazy<HashMap<&'static str, NodeKind>> =
    Lazy::new(|| NodeKind::ALL.iter().map(|kind| (kind.tag(), *kind)).collect());

impl NodeKind {
    /// Document tag of this kind.
    pub fn tag(self) -> &'static str {
        TAGS[self as usize].as_str()
    }

    pub fn from_tag(tag: &str) -> Option<NodeKind> {
        KINDS_BY_TAG.get(tag).copied()
    }

    pub fn family(self) -> NodeFamily {
        use NodeKind::*;
        match self {
            Add | AddChecked | And | AndAlso | ArrayIndex | Coalesce | Divide | Equal
            | ExclusiveOr | GreaterThan | GreaterThanOrEqual | LeftShift | LessThan
            | LessThanOrEqual | Modulo | Multiply | MultiplyChecked | NotEqual | Or | OrElse
            | Power | RightShift | Subtract | SubtractChecked | Assign | AddAssign | AndAssign
            | DivideAssign | ExclusiveOrAssign | LeftShiftAssign | ModuloAssign
            | MultiplyAssign | OrAssign | PowerAssign | RightShiftAssign | SubtractAssign
            | AddAssignChecked | MultiplyAssignChecked | SubtractAssignChecked => NodeFamily::Binary,
            ArrayLength | Convert | ConvertChecked | Negate | UnaryPlus | NegateChecked | Not
            | Quote | TypeAs | Decrement | Increment | Throw | Unbox | PreIncrementAssign
            | PreDecrementAssign | PostIncrementAssign | PostDecrementAssign | OnesComplement
            | IsTrue | IsFalse => NodeFamily::Unary,
            TypeIs | TypeEqual => NodeFamily::TypeBinary,
            NewArrayInit | NewArrayBounds => NodeFamily::NewArray,
            _ => NodeFamily::Single,
        }
    }

    /// Comparison operators produce `bool` regardless of operand type.
    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            NodeKind::Equal
                | NodeKind::NotEqual
                | NodeKind::LessThan
                | NodeKind::LessThanOrEqual
                | NodeKind::GreaterThan
                | NodeKind::GreaterThanOrEqual
        )
    }

    /// Kinds the engine refuses to encode or decode.
    pub fn is_supported(self) -> bool {
        !matches!(
            self,
            NodeKind::DebugInfo | NodeKind::Dynamic | NodeKind::Extension | NodeKind::RuntimeVariables
        )
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_tag_name() {
        assert_eq!(to_tag_name("Add"), "add");
        assert_eq!(to_tag_name("MemberAccess"), "member-access");
        assert_eq!(to_tag_name("AddAssignChecked"), "add-assign-checked");
    }

    #[test]
    fn test_tags_are_unique_and_reversible() {
        assert_eq!(NodeKind::ALL.len(), 85);
        assert_eq!(KINDS_BY_TAG.len(), NodeKind::ALL.len());
        for kind in NodeKind::ALL {
            assert_eq!(NodeKind::from_tag(kind.tag()), Some(*kind));
        }
    }

    #[test]
    fn test_unknown_tag() {
        assert_eq!(NodeKind::from_tag("add-checked"), Some(NodeKind::AddChecked));
        assert_eq!(NodeKind::from_tag("AddChecked"), None);
        assert_eq!(NodeKind::from_tag("bogus"), None);
    }

    #[test]
    fn test_families() {
        assert_eq!(NodeKind::SubtractAssignChecked.family(), NodeFamily::Binary);
        assert_eq!(NodeKind::PostDecrementAssign.family(), NodeFamily::Unary);
        assert_eq!(NodeKind::TypeEqual.family(), NodeFamily::TypeBinary);
        assert_eq!(NodeKind::NewArrayBounds.family(), NodeFamily::NewArray);
        assert_eq!(NodeKind::Lambda.family(), NodeFamily::Single);
        assert!(!NodeKind::Dynamic.is_supported());
    }
}
