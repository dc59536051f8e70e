//! Member ordering according to the GDScript style guide.
//!
//! The official ordering is:
//! 1. @tool, @icon, @static_unload
//! 2. class_name
//! 3. extends
//! 4. ## doc comment
//! 5. signals
//! 6. enums
//! 7. constants
//! 8. static variables
//! 9. @export variables
//! 10. remaining regular variables
//! 11. @onready variables
//! 12. _static_init()
//! 13. remaining static methods
//! 14. virtual methods (_init, _enter_tree, _ready, _process, _physics_process, others)
//! 15. overridden custom methods
//! 16. remaining methods
//! 17. subclasses

use std::cmp::Ordering;

use super::node::SortNode;
use super::options::SortOptions;

/// Ordering policy over the siblings of one container.
///
/// Implementations must be consistent and transitive for all children of the same
/// container. Sorting is stable, so returning `Equal` keeps source order.
pub trait MemberComparator {
    fn compare(&self, a: &SortNode, b: &SortNode) -> Ordering;
}

impl<F> MemberComparator for F
where
    F: Fn(&SortNode, &SortNode) -> Ordering,
{
    fn compare(&self, a: &SortNode, b: &SortNode) -> Ordering {
        self(a, b)
    }
}

/// Classification of class members for reordering.
/// The order of variants determines sort priority (lower = earlier in file).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MemberKind {
    // 01. File-level annotations
    Tool,
    Icon,
    StaticUnload,

    // 02. class_name
    ClassName,

    // 03. extends
    Extends,

    // 04. Doc comment (## comments at class level)
    DocComment,

    // 05. signals
    Signal,

    // 06. enums
    Enum,

    // 07. constants
    Const,

    // 08. static variables
    StaticVar,

    // 09. @export variables
    ExportVar,

    // 10. regular variables
    Var,

    // 11. @onready variables
    OnreadyVar,

    // 12. _static_init()
    StaticInit,

    // 13. remaining static methods
    StaticMethod,

    // 14. Virtual methods in specific order
    VirtualInit,
    VirtualEnterTree,
    VirtualReady,
    VirtualProcess,
    VirtualPhysicsProcess,
    VirtualOther,

    // 15. Overridden custom methods (private methods not in virtual list)
    OverriddenCustomMethod,

    // 16. Regular methods
    Method,

    // 17. Inner classes
    InnerClass,
}

impl MemberKind {
    /// Check if this is a header kind (no blank lines between these).
    pub fn is_header(&self) -> bool {
        matches!(
            self,
            MemberKind::Tool
                | MemberKind::Icon
                | MemberKind::StaticUnload
                | MemberKind::ClassName
                | MemberKind::Extends
        )
    }

    /// Check if this is a function-like kind (2 blank lines around these).
    pub fn is_function_like(&self) -> bool {
        matches!(
            self,
            MemberKind::StaticInit
                | MemberKind::StaticMethod
                | MemberKind::VirtualInit
                | MemberKind::VirtualEnterTree
                | MemberKind::VirtualReady
                | MemberKind::VirtualProcess
                | MemberKind::VirtualPhysicsProcess
                | MemberKind::VirtualOther
                | MemberKind::OverriddenCustomMethod
                | MemberKind::Method
                | MemberKind::InnerClass
        )
    }

    pub fn name(&self) -> &'static str {
        match self {
            MemberKind::Tool => "@tool",
            MemberKind::Icon => "@icon",
            MemberKind::StaticUnload => "@static_unload",
            MemberKind::ClassName => "class_name",
            MemberKind::Extends => "extends",
            MemberKind::DocComment => "doc comment",
            MemberKind::Signal => "signal",
            MemberKind::Enum => "enum",
            MemberKind::Const => "const",
            MemberKind::StaticVar => "static var",
            MemberKind::ExportVar => "@export var",
            MemberKind::Var => "var",
            MemberKind::OnreadyVar => "@onready var",
            MemberKind::StaticInit => "_static_init",
            MemberKind::StaticMethod => "static method",
            MemberKind::VirtualInit => "_init",
            MemberKind::VirtualEnterTree => "_enter_tree",
            MemberKind::VirtualReady => "_ready",
            MemberKind::VirtualProcess => "_process",
            MemberKind::VirtualPhysicsProcess => "_physics_process",
            MemberKind::VirtualOther => "virtual method",
            MemberKind::OverriddenCustomMethod => "overridden method",
            MemberKind::Method => "method",
            MemberKind::InnerClass => "inner class",
        }
    }
}

/// Classify a non-static function by name.
pub fn classify_virtual_method(name: &str) -> MemberKind {
    match name {
        "_init" => MemberKind::VirtualInit,
        "_enter_tree" => MemberKind::VirtualEnterTree,
        "_ready" => MemberKind::VirtualReady,
        "_process" => MemberKind::VirtualProcess,
        "_physics_process" => MemberKind::VirtualPhysicsProcess,
        "_exit_tree" | "_input" | "_unhandled_input" | "_notification" | "_draw" | "_gui_input"
        | "_unhandled_key_input" | "_shortcut_input" | "_get_configuration_warnings"
        | "_get_configuration_warning" => MemberKind::VirtualOther,
        name if name.starts_with('_') => MemberKind::OverriddenCustomMethod,
        _ => MemberKind::Method,
    }
}

/// Orders members by [`MemberKind`], optionally by name within a kind.
#[derive(Debug, Clone, Copy, Default)]
pub struct StyleGuideComparator {
    pub alphabetize: bool,
}

impl StyleGuideComparator {
    pub fn new(alphabetize: bool) -> Self {
        Self { alphabetize }
    }
}

impl From<&SortOptions> for StyleGuideComparator {
    fn from(options: &SortOptions) -> Self {
        Self::new(options.alphabetize)
    }
}

impl MemberComparator for StyleGuideComparator {
    fn compare(&self, a: &SortNode, b: &SortNode) -> Ordering {
        let by_kind = match (a.signature.member, b.signature.member) {
            (Some(x), Some(y)) => x.cmp(&y),
            // Unclassified members go last.
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        };
        if by_kind != Ordering::Equal || !self.alphabetize {
            return by_kind;
        }
        // Header and doc comment positions are not a matter of naming.
        if a.signature.member.is_some_and(|m| m.is_header() || m == MemberKind::DocComment) {
            return Ordering::Equal;
        }
        match (a.name(), b.name()) {
            (Some(x), Some(y)) => x.to_lowercase().cmp(&y.to_lowercase()),
            _ => Ordering::Equal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sort::node::{Kind, Signature};

    fn member(kind: MemberKind, name: &str) -> SortNode {
        SortNode::new(Kind::Field, 0, 0).with_signature(Signature::named(name).with_member(kind))
    }

    #[test]
    fn test_member_kind_ordering() {
        assert!(MemberKind::Tool < MemberKind::ClassName);
        assert!(MemberKind::ClassName < MemberKind::Extends);
        assert!(MemberKind::Extends < MemberKind::Signal);
        assert!(MemberKind::Signal < MemberKind::Enum);
        assert!(MemberKind::Enum < MemberKind::Const);
        assert!(MemberKind::Const < MemberKind::StaticVar);
        assert!(MemberKind::StaticVar < MemberKind::ExportVar);
        assert!(MemberKind::ExportVar < MemberKind::Var);
        assert!(MemberKind::Var < MemberKind::OnreadyVar);
        assert!(MemberKind::OnreadyVar < MemberKind::StaticInit);
        assert!(MemberKind::StaticInit < MemberKind::StaticMethod);
        assert!(MemberKind::StaticMethod < MemberKind::VirtualInit);
        assert!(MemberKind::VirtualPhysicsProcess < MemberKind::VirtualOther);
        assert!(MemberKind::OverriddenCustomMethod < MemberKind::Method);
        assert!(MemberKind::Method < MemberKind::InnerClass);
    }

    #[test]
    fn test_classify_virtual_method() {
        assert_eq!(classify_virtual_method("_init"), MemberKind::VirtualInit);
        assert_eq!(classify_virtual_method("_ready"), MemberKind::VirtualReady);
        assert_eq!(
            classify_virtual_method("_physics_process"),
            MemberKind::VirtualPhysicsProcess
        );
        assert_eq!(classify_virtual_method("_draw"), MemberKind::VirtualOther);
        assert_eq!(
            classify_virtual_method("_custom"),
            MemberKind::OverriddenCustomMethod
        );
        assert_eq!(classify_virtual_method("foo"), MemberKind::Method);
    }

    #[test]
    fn test_compare_by_kind_ignores_names_by_default() {
        let cmp = StyleGuideComparator::default();
        let a = member(MemberKind::Var, "zeta");
        let b = member(MemberKind::Var, "alpha");
        let c = member(MemberKind::Const, "omega");
        assert_eq!(cmp.compare(&a, &b), Ordering::Equal);
        assert_eq!(cmp.compare(&a, &c), Ordering::Greater);
    }

    #[test]
    fn test_alphabetize_breaks_ties_case_insensitively() {
        let cmp = StyleGuideComparator::new(true);
        let a = member(MemberKind::Method, "Zed");
        let b = member(MemberKind::Method, "apple");
        assert_eq!(cmp.compare(&a, &b), Ordering::Greater);
        assert_eq!(cmp.compare(&b, &a), Ordering::Less);
    }

    #[test]
    fn test_alphabetize_leaves_header_alone() {
        let cmp = StyleGuideComparator::new(true);
        let a = member(MemberKind::DocComment, "b");
        let b = member(MemberKind::DocComment, "a");
        assert_eq!(cmp.compare(&a, &b), Ordering::Equal);
    }

    #[test]
    fn test_unclassified_sorts_last() {
        let cmp = StyleGuideComparator::default();
        let known = member(MemberKind::InnerClass, "Inner");
        let unknown = SortNode::new(Kind::Field, 0, 0);
        assert_eq!(cmp.compare(&known, &unknown), Ordering::Less);
    }

    #[test]
    fn test_closure_comparator() {
        let by_start = |a: &SortNode, b: &SortNode| b.source_start.cmp(&a.source_start);
        let x = SortNode::new(Kind::Field, 1, 2);
        let y = SortNode::new(Kind::Field, 3, 4);
        assert_eq!(MemberComparator::compare(&by_start, &x, &y), Ordering::Greater);
    }
}
