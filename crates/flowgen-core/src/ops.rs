//! Operator vocabulary shared by member references and operator nodes.
//!
//! Host reflection exposes user-defined operators as static methods with
//! well-known names (`op_Addition`, `op_Equality`, ...). The emitter turns
//! those into native infix/prefix syntax instead of call syntax, so the same
//! [`OperatorKind`] is reachable both from a reflected method name and from an
//! operator node authored directly in the graph.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Operator kinds
// ---------------------------------------------------------------------------

/// Every operator the emitter can render natively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperatorKind {
    // -- Arithmetic --
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulus,

    // -- Comparison --
    Equality,
    Inequality,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,

    // -- Bitwise / logic --
    BitwiseAnd,
    BitwiseOr,
    ExclusiveOr,
    LeftShift,
    RightShift,
    LogicalAnd,
    LogicalOr,

    // -- Unary --
    UnaryNegation,
    UnaryPlus,
    LogicalNot,
    OnesComplement,
    Increment,
    Decrement,

    // -- Conversions --
    /// `(T)value`, rendered identically for implicit and explicit operators.
    Implicit,
    Explicit,
}

/// How many operands an operator takes and where its symbol goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorShape {
    Infix,
    Prefix,
    Conversion,
}

impl OperatorKind {
    /// Maps a reflected operator method name to its kind.
    pub fn from_method_name(name: &str) -> Option<Self> {
        let kind = match name {
            "op_Addition" => OperatorKind::Add,
            "op_Subtraction" => OperatorKind::Subtract,
            "op_Multiply" => OperatorKind::Multiply,
            "op_Division" => OperatorKind::Divide,
            "op_Modulus" => OperatorKind::Modulus,
            "op_Equality" => OperatorKind::Equality,
            "op_Inequality" => OperatorKind::Inequality,
            "op_LessThan" => OperatorKind::LessThan,
            "op_LessThanOrEqual" => OperatorKind::LessThanOrEqual,
            "op_GreaterThan" => OperatorKind::GreaterThan,
            "op_GreaterThanOrEqual" => OperatorKind::GreaterThanOrEqual,
            "op_BitwiseAnd" => OperatorKind::BitwiseAnd,
            "op_BitwiseOr" => OperatorKind::BitwiseOr,
            "op_ExclusiveOr" => OperatorKind::ExclusiveOr,
            "op_LeftShift" => OperatorKind::LeftShift,
            "op_RightShift" => OperatorKind::RightShift,
            "op_LogicalAnd" => OperatorKind::LogicalAnd,
            "op_LogicalOr" => OperatorKind::LogicalOr,
            "op_UnaryNegation" => OperatorKind::UnaryNegation,
            "op_UnaryPlus" => OperatorKind::UnaryPlus,
            "op_LogicalNot" => OperatorKind::LogicalNot,
            "op_OnesComplement" => OperatorKind::OnesComplement,
            "op_Increment" => OperatorKind::Increment,
            "op_Decrement" => OperatorKind::Decrement,
            "op_Implicit" => OperatorKind::Implicit,
            "op_Explicit" => OperatorKind::Explicit,
            _ => return None,
        };
        Some(kind)
    }

    /// The reflected method name for this operator.
    pub fn method_name(self) -> &'static str {
        match self {
            OperatorKind::Add => "op_Addition",
            OperatorKind::Subtract => "op_Subtraction",
            OperatorKind::Multiply => "op_Multiply",
            OperatorKind::Divide => "op_Division",
            OperatorKind::Modulus => "op_Modulus",
            OperatorKind::Equality => "op_Equality",
            OperatorKind::Inequality => "op_Inequality",
            OperatorKind::LessThan => "op_LessThan",
            OperatorKind::LessThanOrEqual => "op_LessThanOrEqual",
            OperatorKind::GreaterThan => "op_GreaterThan",
            OperatorKind::GreaterThanOrEqual => "op_GreaterThanOrEqual",
            OperatorKind::BitwiseAnd => "op_BitwiseAnd",
            OperatorKind::BitwiseOr => "op_BitwiseOr",
            OperatorKind::ExclusiveOr => "op_ExclusiveOr",
            OperatorKind::LeftShift => "op_LeftShift",
            OperatorKind::RightShift => "op_RightShift",
            OperatorKind::LogicalAnd => "op_LogicalAnd",
            OperatorKind::LogicalOr => "op_LogicalOr",
            OperatorKind::UnaryNegation => "op_UnaryNegation",
            OperatorKind::UnaryPlus => "op_UnaryPlus",
            OperatorKind::LogicalNot => "op_LogicalNot",
            OperatorKind::OnesComplement => "op_OnesComplement",
            OperatorKind::Increment => "op_Increment",
            OperatorKind::Decrement => "op_Decrement",
            OperatorKind::Implicit => "op_Implicit",
            OperatorKind::Explicit => "op_Explicit",
        }
    }

    /// Native symbol. Conversions have none; their text is the cast syntax.
    pub fn symbol(self) -> &'static str {
        match self {
            OperatorKind::Add | OperatorKind::UnaryPlus => "+",
            OperatorKind::Subtract | OperatorKind::UnaryNegation => "-",
            OperatorKind::Multiply => "*",
            OperatorKind::Divide => "/",
            OperatorKind::Modulus => "%",
            OperatorKind::Equality => "==",
            OperatorKind::Inequality => "!=",
            OperatorKind::LessThan => "<",
            OperatorKind::LessThanOrEqual => "<=",
            OperatorKind::GreaterThan => ">",
            OperatorKind::GreaterThanOrEqual => ">=",
            OperatorKind::BitwiseAnd => "&",
            OperatorKind::BitwiseOr => "|",
            OperatorKind::ExclusiveOr => "^",
            OperatorKind::LeftShift => "<<",
            OperatorKind::RightShift => ">>",
            OperatorKind::LogicalAnd => "&&",
            OperatorKind::LogicalOr => "||",
            OperatorKind::LogicalNot => "!",
            OperatorKind::OnesComplement => "~",
            OperatorKind::Increment => "++",
            OperatorKind::Decrement => "--",
            OperatorKind::Implicit | OperatorKind::Explicit => "",
        }
    }

    pub fn shape(self) -> OperatorShape {
        match self {
            OperatorKind::UnaryNegation
            | OperatorKind::UnaryPlus
            | OperatorKind::LogicalNot
            | OperatorKind::OnesComplement
            | OperatorKind::Increment
            | OperatorKind::Decrement => OperatorShape::Prefix,
            OperatorKind::Implicit | OperatorKind::Explicit => OperatorShape::Conversion,
            _ => OperatorShape::Infix,
        }
    }

    /// Number of operands the rendered syntax consumes.
    pub fn arity(self) -> usize {
        match self.shape() {
            OperatorShape::Infix => 2,
            OperatorShape::Prefix | OperatorShape::Conversion => 1,
        }
    }

    /// Returns `true` if the operator produces a `bool`.
    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            OperatorKind::Equality
                | OperatorKind::Inequality
                | OperatorKind::LessThan
                | OperatorKind::LessThanOrEqual
                | OperatorKind::GreaterThan
                | OperatorKind::GreaterThanOrEqual
        )
    }
}

// ---------------------------------------------------------------------------
// Assignment operators
// ---------------------------------------------------------------------------

/// Assignment flavour used by set nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SetOp {
    #[default]
    Assign,
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulus,
}

impl SetOp {
    pub fn symbol(self) -> &'static str {
        match self {
            SetOp::Assign => "=",
            SetOp::Add => "+=",
            SetOp::Subtract => "-=",
            SetOp::Multiply => "*=",
            SetOp::Divide => "/=",
            SetOp::Modulus => "%=",
        }
    }

    /// The binary operator a compound assignment expands to when it has to be
    /// rewritten as `x = x op y`.
    pub fn binary(self) -> Option<OperatorKind> {
        match self {
            SetOp::Assign => None,
            SetOp::Add => Some(OperatorKind::Add),
            SetOp::Subtract => Some(OperatorKind::Subtract),
            SetOp::Multiply => Some(OperatorKind::Multiply),
            SetOp::Divide => Some(OperatorKind::Divide),
            SetOp::Modulus => Some(OperatorKind::Modulus),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_names_roundtrip() {
        for kind in [
            OperatorKind::Add,
            OperatorKind::Equality,
            OperatorKind::LogicalNot,
            OperatorKind::Explicit,
            OperatorKind::RightShift,
        ] {
            assert_eq!(OperatorKind::from_method_name(kind.method_name()), Some(kind));
        }
    }

    #[test]
    fn unknown_method_is_not_an_operator() {
        assert_eq!(OperatorKind::from_method_name("Add"), None);
        assert_eq!(OperatorKind::from_method_name("op_Custom"), None);
    }

    #[test]
    fn shapes_and_arity() {
        assert_eq!(OperatorKind::Add.shape(), OperatorShape::Infix);
        assert_eq!(OperatorKind::UnaryNegation.arity(), 1);
        assert_eq!(OperatorKind::Implicit.shape(), OperatorShape::Conversion);
        assert_eq!(OperatorKind::GreaterThan.arity(), 2);
    }

    #[test]
    fn comparisons() {
        assert!(OperatorKind::LessThan.is_comparison());
        assert!(!OperatorKind::Add.is_comparison());
    }

    #[test]
    fn compound_assignment_expansion() {
        assert_eq!(SetOp::Add.binary(), Some(OperatorKind::Add));
        assert_eq!(SetOp::Assign.binary(), None);
        assert_eq!(SetOp::Modulus.symbol(), "%=");
    }
}
