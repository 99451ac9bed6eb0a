//! The expression tree.
//!
//! [`Expr`] is a closed enum over node families. Operator families (binary,
//! unary, type tests, array creation) carry their [`NodeKind`]; every other
//! family has exactly one kind. Nodes own their children. Parameters and
//! label targets are shared through an `Arc`, which is their identity: two
//! uses of the same binding are two clones of one [`ParameterExpr`].
//!
//! Equality on nodes is structural. Use [`ParameterExpr::same_symbol`] and
//! [`LabelTarget::same_symbol`] to ask whether two bindings are one.

pub mod kind;
pub mod outline;

use crate::types::{MemberRef, TypeRef};
use crate::value::Value;
use std::fmt;
use std::sync::Arc;

pub use kind::{NodeFamily, NodeKind};
pub use outline::outline;

#[derive(Debug, PartialEq)]
struct SymbolData {
    name: String,
    ty: TypeRef,
    by_ref: bool,
}

/// A parameter or local variable binding.
#[derive(Clone, PartialEq)]
pub struct ParameterExpr(Arc<SymbolData>);

impl ParameterExpr {
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Self {
        ParameterExpr(Arc::new(SymbolData {
            name: name.into(),
            ty,
            by_ref: false,
        }))
    }

    pub fn by_ref(name: impl Into<String>, ty: TypeRef) -> Self {
        ParameterExpr(Arc::new(SymbolData {
            name: name.into(),
            ty,
            by_ref: true,
        }))
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn ty(&self) -> &TypeRef {
        &self.0.ty
    }

    pub fn is_by_ref(&self) -> bool {
        self.0.by_ref
    }

    /// Whether both handles denote the same binding.
    pub fn same_symbol(&self, other: &ParameterExpr) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    pub(crate) fn identity(&self) -> usize {
        Arc::as_ptr(&self.0) as usize
    }
}

impl fmt::Debug for ParameterExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name(), self.ty())?;
        if self.is_by_ref() {
            f.write_str(" (ref)")?;
        }
        Ok(())
    }
}

/// A jump target shared by gotos, labels and loops.
#[derive(Clone, PartialEq)]
pub struct LabelTarget(Arc<SymbolData>);

impl LabelTarget {
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Self {
        LabelTarget(Arc::new(SymbolData {
            name: name.into(),
            ty,
            by_ref: false,
        }))
    }

    /// An unnamed target carrying no value.
    pub fn void() -> Self {
        Self::new("", TypeRef::VOID)
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn ty(&self) -> &TypeRef {
        &self.0.ty
    }

    pub fn same_symbol(&self, other: &LabelTarget) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    pub(crate) fn identity(&self) -> usize {
        Arc::as_ptr(&self.0) as usize
    }
}

impl fmt::Debug for LabelTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "label {:?}: {}", self.name(), self.ty())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BinaryExpr {
    pub kind: NodeKind,
    pub left: Box<Expr>,
    pub right: Box<Expr>,
    pub ty: TypeRef,
    /// User-defined operator implementation.
    pub method: Option<MemberRef>,
    pub lifted_to_null: bool,
    /// Conversion applied to the left operand of coalescing and compound
    /// assignments.
    pub conversion: Option<Box<LambdaExpr>>,
}

impl BinaryExpr {
    pub fn new(kind: NodeKind, left: Expr, right: Expr, ty: TypeRef) -> Self {
        BinaryExpr {
            kind,
            left: Box::new(left),
            right: Box::new(right),
            ty,
            method: None,
            lifted_to_null: false,
            conversion: None,
        }
    }

    pub fn with_method(mut self, method: MemberRef) -> Self {
        self.method = Some(method);
        self
    }

    pub fn lifted_to_null(mut self) -> Self {
        self.lifted_to_null = true;
        self
    }

    pub fn with_conversion(mut self, conversion: LambdaExpr) -> Self {
        self.conversion = Some(Box::new(conversion));
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnaryExpr {
    pub kind: NodeKind,
    /// Absent only for a rethrowing `Throw`.
    pub operand: Option<Box<Expr>>,
    pub ty: TypeRef,
    pub method: Option<MemberRef>,
}

impl UnaryExpr {
    pub fn new(kind: NodeKind, operand: Expr, ty: TypeRef) -> Self {
        UnaryExpr {
            kind,
            operand: Some(Box::new(operand)),
            ty,
            method: None,
        }
    }

    pub fn rethrow(ty: TypeRef) -> Self {
        UnaryExpr {
            kind: NodeKind::Throw,
            operand: None,
            ty,
            method: None,
        }
    }

    pub fn with_method(mut self, method: MemberRef) -> Self {
        self.method = Some(method);
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConstantExpr {
    pub value: Value,
    pub ty: TypeRef,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LambdaExpr {
    pub name: Option<String>,
    pub parameters: Vec<ParameterExpr>,
    pub body: Box<Expr>,
    /// Delegate type.
    pub ty: TypeRef,
    pub tail_call: bool,
}

impl LambdaExpr {
    /// A lambda whose delegate type follows from its parameters and body.
    pub fn new(parameters: Vec<ParameterExpr>, body: Expr) -> Self {
        let ty = TypeRef::delegate_for(
            parameters.iter().map(|p| p.ty().clone()).collect(),
            body.ty(),
        );
        LambdaExpr {
            name: None,
            parameters,
            body: Box::new(body),
            ty,
            tail_call: false,
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_type(mut self, ty: TypeRef) -> Self {
        self.ty = ty;
        self
    }

    pub fn tail_call(mut self) -> Self {
        self.tail_call = true;
        self
    }

    pub fn return_type(&self) -> TypeRef {
        self.body.ty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BlockExpr {
    pub variables: Vec<ParameterExpr>,
    pub expressions: Vec<Expr>,
    pub ty: TypeRef,
}

impl BlockExpr {
    /// A block typed by its last expression.
    pub fn new(variables: Vec<ParameterExpr>, expressions: Vec<Expr>) -> Self {
        let ty = expressions.last().map(Expr::ty).unwrap_or(TypeRef::VOID);
        BlockExpr {
            variables,
            expressions,
            ty,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConditionalExpr {
    pub test: Box<Expr>,
    pub if_true: Box<Expr>,
    pub if_false: Box<Expr>,
    pub ty: TypeRef,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CallExpr {
    /// Receiver; absent for static methods.
    pub instance: Option<Box<Expr>>,
    pub method: MemberRef,
    pub arguments: Vec<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InvokeExpr {
    pub expression: Box<Expr>,
    pub arguments: Vec<Expr>,
    pub ty: TypeRef,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MemberAccessExpr {
    /// Receiver; absent for static members.
    pub expression: Option<Box<Expr>>,
    pub member: MemberRef,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewExpr {
    /// Absent for the implicit default constructor of value types.
    pub constructor: Option<MemberRef>,
    pub arguments: Vec<Expr>,
    /// Members initialized by each argument, for anonymous types.
    pub members: Vec<MemberRef>,
    pub ty: TypeRef,
}

impl NewExpr {
    pub fn new(constructor: MemberRef, arguments: Vec<Expr>) -> Self {
        let ty = constructor.declaring_type.clone();
        NewExpr {
            constructor: Some(constructor),
            arguments,
            members: Vec::new(),
            ty,
        }
    }

    pub fn default_value(ty: TypeRef) -> Self {
        NewExpr {
            constructor: None,
            arguments: Vec::new(),
            members: Vec::new(),
            ty,
        }
    }

    pub fn with_members(mut self, members: Vec<MemberRef>) -> Self {
        self.members = members;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewArrayExpr {
    /// `NewArrayInit` or `NewArrayBounds`.
    pub kind: NodeKind,
    pub element_type: TypeRef,
    /// Elements for `NewArrayInit`, dimension sizes for `NewArrayBounds`.
    pub expressions: Vec<Expr>,
}

impl NewArrayExpr {
    /// Array type of the result. Each bound adds one array rank.
    pub fn ty(&self) -> TypeRef {
        let ranks = match self.kind {
            NodeKind::NewArrayBounds => self.expressions.len().max(1),
            _ => 1,
        };
        (0..ranks).fold(self.element_type.clone(), |ty, _| TypeRef::array(ty))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ElementInit {
    pub add_method: MemberRef,
    pub arguments: Vec<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MemberBinding {
    Assignment {
        member: MemberRef,
        expression: Expr,
    },
    /// Initializes members of a member.
    MemberMember {
        member: MemberRef,
        bindings: Vec<MemberBinding>,
    },
    /// Adds elements to a collection-valued member.
    List {
        member: MemberRef,
        initializers: Vec<ElementInit>,
    },
}

impl MemberBinding {
    pub fn member(&self) -> &MemberRef {
        match self {
            MemberBinding::Assignment { member, .. }
            | MemberBinding::MemberMember { member, .. }
            | MemberBinding::List { member, .. } => member,
        }
    }

    pub fn tag(&self) -> &'static str {
        match self {
            MemberBinding::Assignment { .. } => "member-assignment",
            MemberBinding::MemberMember { .. } => "member-member-binding",
            MemberBinding::List { .. } => "member-list-binding",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MemberInitExpr {
    pub new: NewExpr,
    pub bindings: Vec<MemberBinding>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ListInitExpr {
    pub new: NewExpr,
    pub initializers: Vec<ElementInit>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypeBinaryExpr {
    /// `TypeIs` or `TypeEqual`.
    pub kind: NodeKind,
    pub expression: Box<Expr>,
    pub type_operand: TypeRef,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GotoKind {
    Goto,
    Return,
    Break,
    Continue,
}

impl GotoKind {
    pub fn as_str(self) -> &'static str {
        match self {
            GotoKind::Goto => "goto",
            GotoKind::Return => "return",
            GotoKind::Break => "break",
            GotoKind::Continue => "continue",
        }
    }

    pub fn parse(text: &str) -> Option<Self> {
        match text {
            "goto" => Some(GotoKind::Goto),
            "return" => Some(GotoKind::Return),
            "break" => Some(GotoKind::Break),
            "continue" => Some(GotoKind::Continue),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GotoExpr {
    pub kind: GotoKind,
    pub target: LabelTarget,
    pub value: Option<Box<Expr>>,
    pub ty: TypeRef,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LabelExpr {
    pub target: LabelTarget,
    /// Value of the label when reached by falling through.
    pub default_value: Option<Box<Expr>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoopExpr {
    pub body: Box<Expr>,
    pub break_label: Option<LabelTarget>,
    pub continue_label: Option<LabelTarget>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SwitchCase {
    pub test_values: Vec<Expr>,
    pub body: Expr,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SwitchExpr {
    pub switch_value: Box<Expr>,
    pub cases: Vec<SwitchCase>,
    pub default_body: Option<Box<Expr>>,
    /// Equality method used to compare the value with each test value.
    pub comparison: Option<MemberRef>,
    pub ty: TypeRef,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CatchBlock {
    /// Exception type caught.
    pub test: TypeRef,
    pub variable: Option<ParameterExpr>,
    pub filter: Option<Expr>,
    pub body: Expr,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TryExpr {
    pub body: Box<Expr>,
    pub handlers: Vec<CatchBlock>,
    pub finally: Option<Box<Expr>>,
    pub fault: Option<Box<Expr>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndexExpr {
    pub object: Box<Expr>,
    /// Indexed property; absent for array element access.
    pub indexer: Option<MemberRef>,
    pub arguments: Vec<Expr>,
    pub ty: TypeRef,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DebugInfoExpr {
    pub document: String,
    pub start_line: u32,
    pub end_line: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DynamicExpr {
    pub binder: String,
    pub arguments: Vec<Expr>,
    pub ty: TypeRef,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExtensionExpr {
    pub name: String,
    pub ty: TypeRef,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeVariablesExpr {
    pub variables: Vec<ParameterExpr>,
}

/// An expression node.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Binary(BinaryExpr),
    Unary(UnaryExpr),
    Constant(ConstantExpr),
    Parameter(ParameterExpr),
    Lambda(LambdaExpr),
    Block(BlockExpr),
    Conditional(ConditionalExpr),
    Call(CallExpr),
    Invoke(InvokeExpr),
    MemberAccess(MemberAccessExpr),
    New(NewExpr),
    NewArray(NewArrayExpr),
    MemberInit(MemberInitExpr),
    ListInit(ListInitExpr),
    TypeBinary(TypeBinaryExpr),
    Default(TypeRef),
    Goto(GotoExpr),
    Label(LabelExpr),
    Loop(LoopExpr),
    Switch(SwitchExpr),
    Try(TryExpr),
    Index(IndexExpr),
    DebugInfo(DebugInfoExpr),
    Dynamic(DynamicExpr),
    Extension(ExtensionExpr),
    RuntimeVariables(RuntimeVariablesExpr),
}

impl Expr {
    pub fn kind(&self) -> NodeKind {
        match self {
            Expr::Binary(e) => e.kind,
            Expr::Unary(e) => e.kind,
            Expr::Constant(_) => NodeKind::Constant,
            Expr::Parameter(_) => NodeKind::Parameter,
            Expr::Lambda(_) => NodeKind::Lambda,
            Expr::Block(_) => NodeKind::Block,
            Expr::Conditional(_) => NodeKind::Conditional,
            Expr::Call(_) => NodeKind::Call,
            Expr::Invoke(_) => NodeKind::Invoke,
            Expr::MemberAccess(_) => NodeKind::MemberAccess,
            Expr::New(_) => NodeKind::New,
            Expr::NewArray(e) => e.kind,
            Expr::MemberInit(_) => NodeKind::MemberInit,
            Expr::ListInit(_) => NodeKind::ListInit,
            Expr::TypeBinary(e) => e.kind,
            Expr::Default(_) => NodeKind::Default,
            Expr::Goto(_) => NodeKind::Goto,
            Expr::Label(_) => NodeKind::Label,
            Expr::Loop(_) => NodeKind::Loop,
            Expr::Switch(_) => NodeKind::Switch,
            Expr::Try(_) => NodeKind::Try,
            Expr::Index(_) => NodeKind::Index,
            Expr::DebugInfo(_) => NodeKind::DebugInfo,
            Expr::Dynamic(_) => NodeKind::Dynamic,
            Expr::Extension(_) => NodeKind::Extension,
            Expr::RuntimeVariables(_) => NodeKind::RuntimeVariables,
        }
    }

    /// Static type of the node's value.
    pub fn ty(&self) -> TypeRef {
        match self {
            Expr::Binary(e) => e.ty.clone(),
            Expr::Unary(e) => e.ty.clone(),
            Expr::Constant(e) => e.ty.clone(),
            Expr::Parameter(p) => p.ty().clone(),
            Expr::Lambda(e) => e.ty.clone(),
            Expr::Block(e) => e.ty.clone(),
            Expr::Conditional(e) => e.ty.clone(),
            Expr::Call(e) => e.method.value_type().clone(),
            Expr::Invoke(e) => e.ty.clone(),
            Expr::MemberAccess(e) => e.member.value_type().clone(),
            Expr::New(e) => e.ty.clone(),
            Expr::NewArray(e) => e.ty(),
            Expr::MemberInit(e) => e.new.ty.clone(),
            Expr::ListInit(e) => e.new.ty.clone(),
            Expr::TypeBinary(_) => TypeRef::BOOL,
            Expr::Default(ty) => ty.clone(),
            Expr::Goto(e) => e.ty.clone(),
            Expr::Label(e) => e.target.ty().clone(),
            Expr::Loop(e) => e
                .break_label
                .as_ref()
                .map(|label| label.ty().clone())
                .unwrap_or(TypeRef::VOID),
            Expr::Switch(e) => e.ty.clone(),
            Expr::Try(e) => e.body.ty(),
            Expr::Index(e) => e.ty.clone(),
            Expr::DebugInfo(_) => TypeRef::VOID,
            Expr::Dynamic(e) => e.ty.clone(),
            Expr::Extension(e) => e.ty.clone(),
            Expr::RuntimeVariables(_) => TypeRef::OBJECT,
        }
    }

    pub fn constant(value: impl Into<Value>, ty: TypeRef) -> Expr {
        Expr::Constant(ConstantExpr {
            value: value.into(),
            ty,
        })
    }

    /// A constant typed by its value (`5` is `int32`, `"a"` is `string`).
    pub fn literal(value: impl Into<Value>) -> Expr {
        let value = value.into();
        let ty = value.natural_type().unwrap_or(TypeRef::OBJECT);
        Expr::Constant(ConstantExpr { value, ty })
    }

    pub fn null(ty: TypeRef) -> Expr {
        Expr::Constant(ConstantExpr {
            value: Value::Null,
            ty,
        })
    }

    pub fn parameter(parameter: &ParameterExpr) -> Expr {
        Expr::Parameter(parameter.clone())
    }

    /// A binary operator typed by the usual rules: comparisons are `bool`,
    /// array indexing yields the element type, coalescing the right operand
    /// type, anything else the left operand type.
    pub fn binary(kind: NodeKind, left: Expr, right: Expr) -> Expr {
        let ty = if kind.is_comparison() {
            TypeRef::BOOL
        } else {
            match kind {
                NodeKind::ArrayIndex => left
                    .ty()
                    .element_type()
                    .cloned()
                    .unwrap_or(TypeRef::OBJECT),
                NodeKind::Coalesce => right.ty(),
                _ => left.ty(),
            }
        };
        Expr::Binary(BinaryExpr::new(kind, left, right, ty))
    }

    pub fn add(left: Expr, right: Expr) -> Expr {
        Self::binary(NodeKind::Add, left, right)
    }

    pub fn assign(target: Expr, value: Expr) -> Expr {
        Self::binary(NodeKind::Assign, target, value)
    }

    pub fn unary(kind: NodeKind, operand: Expr, ty: TypeRef) -> Expr {
        Expr::Unary(UnaryExpr::new(kind, operand, ty))
    }

    pub fn convert(operand: Expr, ty: TypeRef) -> Expr {
        Self::unary(NodeKind::Convert, operand, ty)
    }

    pub fn lambda(parameters: Vec<ParameterExpr>, body: Expr) -> Expr {
        Expr::Lambda(LambdaExpr::new(parameters, body))
    }

    pub fn block(variables: Vec<ParameterExpr>, expressions: Vec<Expr>) -> Expr {
        Expr::Block(BlockExpr::new(variables, expressions))
    }

    pub fn condition(test: Expr, if_true: Expr, if_false: Expr) -> Expr {
        let ty = if_true.ty();
        Expr::Conditional(ConditionalExpr {
            test: Box::new(test),
            if_true: Box::new(if_true),
            if_false: Box::new(if_false),
            ty,
        })
    }

    pub fn call(instance: Option<Expr>, method: MemberRef, arguments: Vec<Expr>) -> Expr {
        Expr::Call(CallExpr {
            instance: instance.map(Box::new),
            method,
            arguments,
        })
    }

    pub fn invoke(expression: Expr, arguments: Vec<Expr>) -> Expr {
        let ty = expression.ty().delegate_result().unwrap_or(TypeRef::OBJECT);
        Expr::Invoke(InvokeExpr {
            expression: Box::new(expression),
            arguments,
            ty,
        })
    }

    pub fn member(expression: Option<Expr>, member: MemberRef) -> Expr {
        Expr::MemberAccess(MemberAccessExpr {
            expression: expression.map(Box::new),
            member,
        })
    }

    pub fn type_is(expression: Expr, type_operand: TypeRef) -> Expr {
        Expr::TypeBinary(TypeBinaryExpr {
            kind: NodeKind::TypeIs,
            expression: Box::new(expression),
            type_operand,
        })
    }

    pub fn goto(kind: GotoKind, target: &LabelTarget, value: Option<Expr>) -> Expr {
        Expr::Goto(GotoExpr {
            kind,
            target: target.clone(),
            value: value.map(Box::new),
            ty: TypeRef::VOID,
        })
    }

    pub fn label(target: &LabelTarget, default_value: Option<Expr>) -> Expr {
        Expr::Label(LabelExpr {
            target: target.clone(),
            default_value: default_value.map(Box::new),
        })
    }

    pub fn loop_with(
        body: Expr,
        break_label: Option<&LabelTarget>,
        continue_label: Option<&LabelTarget>,
    ) -> Expr {
        Expr::Loop(LoopExpr {
            body: Box::new(body),
            break_label: break_label.cloned(),
            continue_label: continue_label.cloned(),
        })
    }
}

macro_rules! into_expr {
    ($($node:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$node> for Expr {
                fn from(node: $node) -> Self {
                    Expr::$variant(node)
                }
            }
        )*
    };
}

into_expr! {
    BinaryExpr => Binary,
    UnaryExpr => Unary,
    ConstantExpr => Constant,
    ParameterExpr => Parameter,
    LambdaExpr => Lambda,
    BlockExpr => Block,
    ConditionalExpr => Conditional,
    CallExpr => Call,
    InvokeExpr => Invoke,
    MemberAccessExpr => MemberAccess,
    NewExpr => New,
    NewArrayExpr => NewArray,
    MemberInitExpr => MemberInit,
    ListInitExpr => ListInit,
    TypeBinaryExpr => TypeBinary,
    GotoExpr => Goto,
    LabelExpr => Label,
    LoopExpr => Loop,
    SwitchExpr => Switch,
    TryExpr => Try,
    IndexExpr => Index,
}
