//! Expression tree → document.
//!
//! The walk is iterative. A work stack holds three kinds of task:
//!
//! - `Visit(item)` pushes `Build(item, arity)` followed by the item's child
//!   tasks in reverse, so children run first and in document order.
//! - `Declare(scope)` mints ids for a binding scope and leaves its
//!   definition fragment. Scopes are declared before the body they cover.
//! - `Build(item, arity)` pops the `arity` fragments its children left on
//!   the output stack and assembles the item's element from them.
//!
//! Every task leaves exactly one fragment, so the output stack holds the
//! root element when the work stack drains. Label targets and free
//! parameters are defined where they first occur in document order.

use super::literal::LiteralCodec;
use super::members::encode_member;
use super::symbols::SymbolTable;
use crate::document::{Document, Element};
use crate::error::{Result, TransformError};
use crate::expr::{
    CatchBlock, ElementInit, Expr, LabelTarget, LambdaExpr, MemberBinding, NodeFamily, NodeKind,
    ParameterExpr, SwitchCase,
};
use crate::types::{encode_type_name, MemberRef, NamingConvention, TypeRef};

#[derive(Clone, Copy)]
enum Item<'e> {
    Expr(&'e Expr),
    Lambda(&'e LambdaExpr),
    Label(&'e LabelTarget),
    Case(&'e SwitchCase),
    Catch(&'e CatchBlock),
    Binding(&'e MemberBinding),
    ElementInit(&'e ElementInit),
}

#[derive(Clone, Copy)]
enum Scope<'e> {
    Parameters(&'e [ParameterExpr]),
    Variables(&'e [ParameterExpr]),
    CatchVariable(&'e ParameterExpr),
}

enum Task<'e> {
    Visit(Item<'e>),
    Declare(Scope<'e>),
    Build(Item<'e>, usize),
}

pub struct Encoder<'a> {
    literals: &'a LiteralCodec<'a>,
    convention: NamingConvention,
    symbols: &'a mut SymbolTable,
}

impl<'a> Encoder<'a> {
    pub fn new(
        literals: &'a LiteralCodec<'a>,
        convention: NamingConvention,
        symbols: &'a mut SymbolTable,
    ) -> Self {
        Encoder {
            literals,
            convention,
            symbols,
        }
    }

    /// Encode `expr` as a complete document.
    pub fn encode(&mut self, expr: &Expr) -> Result<Document> {
        self.symbols.reset();
        Ok(Document::wrap(self.encode_node(expr)?))
    }

    /// Encode `expr` as a single node element.
    pub fn encode_node(&mut self, expr: &Expr) -> Result<Element> {
        let mut work = vec![visit(expr)];
        let mut output: Vec<Element> = Vec::new();

        while let Some(task) = work.pop() {
            match task {
                Task::Visit(item) => {
                    let tasks = children(item)?;
                    work.push(Task::Build(item, tasks.len()));
                    work.extend(tasks.into_iter().rev());
                }
                Task::Declare(scope) => {
                    let fragment = self.declare(scope)?;
                    output.push(fragment);
                }
                Task::Build(item, arity) => {
                    if output.len() < arity {
                        return Err(TransformError::Internal(format!(
                            "output stack underflow: need {arity}, have {}",
                            output.len()
                        )));
                    }
                    let fragments = output.split_off(output.len() - arity);
                    let element = self.build(item, Fragments::new(fragments))?;
                    output.push(element);
                }
            }
        }

        match (output.pop(), output.is_empty()) {
            (Some(root), true) => Ok(root),
            _ => Err(TransformError::Internal(
                "walk did not leave exactly one fragment".to_string(),
            )),
        }
    }

    fn type_name(&self, ty: &TypeRef) -> String {
        encode_type_name(ty, self.convention)
    }

    fn node(&self, tag: &str, ty: &TypeRef) -> Element {
        Element::new(tag).with_attr("type", self.type_name(ty))
    }

    fn member(&self, member: &MemberRef) -> Element {
        encode_member(member, self.convention)
    }

    fn declare(&mut self, scope: Scope<'_>) -> Result<Element> {
        match scope {
            Scope::Parameters(parameters) => {
                Ok(Element::new("parameters").with_children(self.define_all(parameters)?))
            }
            Scope::Variables(variables) => {
                Ok(Element::new("variables").with_children(self.define_all(variables)?))
            }
            Scope::CatchVariable(variable) => self.define(variable),
        }
    }

    /// Every binding of the scope gets its id before any definition is written.
    fn define_all(&mut self, parameters: &[ParameterExpr]) -> Result<Vec<Element>> {
        let ids = self.symbols.declare_all(parameters)?;
        Ok(parameters
            .iter()
            .zip(ids)
            .map(|(parameter, id)| self.definition(parameter, id))
            .collect())
    }

    fn define(&mut self, parameter: &ParameterExpr) -> Result<Element> {
        let id = self.symbols.declare_parameter(parameter)?;
        Ok(self.definition(parameter, id))
    }

    fn definition(&self, parameter: &ParameterExpr, id: String) -> Element {
        Element::new("parameter-definition")
            .with_attr("id", id)
            .with_attr("name", parameter.name())
            .with_attr("type", self.type_name(parameter.ty()))
            .with_flag("by-ref", parameter.is_by_ref())
    }

    fn parameter(&mut self, parameter: &ParameterExpr) -> Result<Element> {
        match self.symbols.reference_parameter(parameter) {
            Some(id) => Ok(Element::new("parameter-reference").with_attr("idref", id)),
            None => self.define(parameter),
        }
    }

    fn label(&mut self, target: &LabelTarget) -> Result<Element> {
        if let Some(id) = self.symbols.reference_label(target) {
            return Ok(Element::new("label-reference").with_attr("idref", id));
        }
        let id = self.symbols.declare_label(target)?;
        let mut element = Element::new("label-definition").with_attr("id", id);
        if !target.name().is_empty() {
            element.set_attr("name", target.name());
        }
        Ok(element.with_attr("type", self.type_name(target.ty())))
    }

    fn build(&mut self, item: Item<'_>, mut parts: Fragments) -> Result<Element> {
        let element = match item {
            Item::Expr(expr) => return self.build_expr(expr, parts),
            Item::Lambda(lambda) => {
                let mut element = self.node("lambda", &lambda.ty);
                if let Some(name) = &lambda.name {
                    element.set_attr("name", name.as_str());
                }
                element
                    .with_flag("tail-call", lambda.tail_call)
                    .with_child(parts.next()?)
                    .with_child(Element::new("body").with_child(parts.next()?))
            }
            Item::Label(target) => self.label(target)?,
            Item::Case(case) => {
                let values = parts.take(case.test_values.len())?;
                Element::new("case")
                    .with_child(Element::new("case-values").with_children(values))
                    .with_child(Element::new("body").with_child(parts.next()?))
            }
            Item::Catch(handler) => {
                let mut element = Element::new("catch")
                    .with_attr("test-type", self.type_name(&handler.test));
                if handler.variable.is_some() {
                    element.push(parts.next()?);
                }
                if handler.filter.is_some() {
                    element.push(Element::new("filter").with_child(parts.next()?));
                }
                element.with_child(Element::new("body").with_child(parts.next()?))
            }
            Item::Binding(binding) => {
                let element = Element::new(binding.tag()).with_child(self.member(binding.member()));
                match binding {
                    MemberBinding::Assignment { .. } => element.with_child(parts.next()?),
                    MemberBinding::MemberMember { bindings, .. } => element.with_child(
                        Element::new("bindings").with_children(parts.take(bindings.len())?),
                    ),
                    MemberBinding::List { initializers, .. } => element.with_child(
                        Element::new("initializers").with_children(parts.take(initializers.len())?),
                    ),
                }
            }
            Item::ElementInit(init) => Element::new("element-init")
                .with_child(self.member(&init.add_method))
                .with_child(Element::new("arguments").with_children(parts.rest())),
        };
        parts.finish()?;
        Ok(element)
    }

    fn build_expr(&mut self, expr: &Expr, mut parts: Fragments) -> Result<Element> {
        let ty = expr.ty();
        let element = match expr {
            Expr::Binary(e) => {
                let mut element = self
                    .node(e.kind.tag(), &ty)
                    .with_flag("lifted-to-null", e.lifted_to_null)
                    .with_child(parts.next()?)
                    .with_child(parts.next()?);
                if let Some(method) = &e.method {
                    element.push(self.member(method));
                }
                if e.conversion.is_some() {
                    element.push(Element::new("conversion").with_child(parts.next()?));
                }
                element
            }
            Expr::Unary(e) => {
                let mut element = self.node(e.kind.tag(), &ty);
                if e.operand.is_some() {
                    element.push(parts.next()?);
                }
                if let Some(method) = &e.method {
                    element.push(self.member(method));
                }
                element
            }
            Expr::Constant(c) => self.literals.encode(&c.value, &c.ty)?,
            Expr::Parameter(p) => self.parameter(p)?,
            Expr::Block(_) => self
                .node("block", &ty)
                .with_child(parts.next()?)
                .with_child(Element::new("expressions").with_children(parts.rest())),
            Expr::Conditional(_) => self
                .node("conditional", &ty)
                .with_children(parts.take(3)?),
            Expr::Call(e) => {
                let mut element = self.node("call", &ty).with_child(self.member(&e.method));
                if e.instance.is_some() {
                    element.push(Element::new("instance").with_child(parts.next()?));
                }
                element.with_child(Element::new("arguments").with_children(parts.rest()))
            }
            Expr::Invoke(_) => self
                .node("invoke", &ty)
                .with_child(parts.next()?)
                .with_child(Element::new("arguments").with_children(parts.rest())),
            Expr::MemberAccess(e) => {
                let mut element = self
                    .node("member-access", &ty)
                    .with_child(self.member(&e.member));
                if e.expression.is_some() {
                    element.push(Element::new("instance").with_child(parts.next()?));
                }
                element
            }
            Expr::New(e) => {
                let arguments = parts.take(e.arguments.len())?;
                self.new_element(e, arguments)
            }
            Expr::NewArray(e) => {
                let section = match e.kind {
                    NodeKind::NewArrayInit => "array-elements",
                    _ => "bounds",
                };
                self.node(e.kind.tag(), &ty)
                    .with_attr("element-type", self.type_name(&e.element_type))
                    .with_child(Element::new(section).with_children(parts.rest()))
            }
            Expr::MemberInit(e) => {
                let new = self.new_element(&e.new, parts.take(e.new.arguments.len())?);
                self.node("member-init", &ty)
                    .with_child(new)
                    .with_child(Element::new("bindings").with_children(parts.rest()))
            }
            Expr::ListInit(e) => {
                let new = self.new_element(&e.new, parts.take(e.new.arguments.len())?);
                self.node("list-init", &ty)
                    .with_child(new)
                    .with_child(Element::new("initializers").with_children(parts.rest()))
            }
            Expr::TypeBinary(e) => self
                .node(e.kind.tag(), &ty)
                .with_attr("type-operand", self.type_name(&e.type_operand))
                .with_child(parts.next()?),
            Expr::Default(_) => self.node("default", &ty),
            Expr::Goto(e) => self
                .node("goto", &ty)
                .with_attr("goto-kind", e.kind.as_str())
                .with_children(parts.rest()),
            Expr::Label(_) => self.node("label", &ty).with_children(parts.rest()),
            Expr::Loop(e) => {
                let mut element = self.node("loop", &ty);
                if e.break_label.is_some() {
                    element.push(Element::new("break-label").with_child(parts.next()?));
                }
                if e.continue_label.is_some() {
                    element.push(Element::new("continue-label").with_child(parts.next()?));
                }
                element.with_child(Element::new("body").with_child(parts.next()?))
            }
            Expr::Switch(e) => {
                let mut element = self.node("switch", &ty);
                if let Some(comparison) = &e.comparison {
                    element.push(self.member(comparison));
                }
                element.push(parts.next()?);
                element.push(Element::new("cases").with_children(parts.take(e.cases.len())?));
                if e.default_body.is_some() {
                    element.push(Element::new("default-body").with_child(parts.next()?));
                }
                element
            }
            Expr::Try(e) => {
                let mut element = self
                    .node("try", &ty)
                    .with_child(Element::new("body").with_child(parts.next()?))
                    .with_children(parts.take(e.handlers.len())?);
                if e.finally.is_some() {
                    element.push(Element::new("finally").with_child(parts.next()?));
                }
                if e.fault.is_some() {
                    element.push(Element::new("fault").with_child(parts.next()?));
                }
                element
            }
            Expr::Index(e) => {
                let mut element = self.node("index", &ty);
                if let Some(indexer) = &e.indexer {
                    element.push(self.member(indexer));
                }
                element
                    .with_child(Element::new("instance").with_child(parts.next()?))
                    .with_child(Element::new("indexes").with_children(parts.rest()))
            }
            Expr::Lambda(_)
            | Expr::DebugInfo(_)
            | Expr::Dynamic(_)
            | Expr::Extension(_)
            | Expr::RuntimeVariables(_) => {
                return Err(TransformError::UnsupportedNodeKind {
                    kind: expr.kind().name().to_string(),
                })
            }
        };
        parts.finish()?;
        Ok(element)
    }

    fn new_element(&self, new: &crate::expr::NewExpr, arguments: Vec<Element>) -> Element {
        let mut element = self.node("new", &new.ty);
        if let Some(constructor) = &new.constructor {
            element.push(self.member(constructor));
        }
        element.push(Element::new("arguments").with_children(arguments));
        if !new.members.is_empty() {
            element.push(
                Element::new("members")
                    .with_children(new.members.iter().map(|member| self.member(member))),
            );
        }
        element
    }
}

/// Child fragments of one item, consumed front to back.
struct Fragments(std::vec::IntoIter<Element>);

impl Fragments {
    fn new(fragments: Vec<Element>) -> Self {
        Fragments(fragments.into_iter())
    }

    fn next(&mut self) -> Result<Element> {
        self.0
            .next()
            .ok_or_else(|| TransformError::Internal("missing child fragment".to_string()))
    }

    fn take(&mut self, count: usize) -> Result<Vec<Element>> {
        (0..count).map(|_| self.next()).collect()
    }

    fn rest(&mut self) -> Vec<Element> {
        self.0.by_ref().collect()
    }

    fn finish(mut self) -> Result<()> {
        match self.0.next() {
            None => Ok(()),
            Some(extra) => Err(TransformError::Internal(format!(
                "unconsumed child fragment <{}>",
                extra.name
            ))),
        }
    }
}

fn visit(expr: &Expr) -> Task<'_> {
    match expr {
        Expr::Lambda(lambda) => Task::Visit(Item::Lambda(lambda)),
        other => Task::Visit(Item::Expr(other)),
    }
}

fn visit_all(exprs: &[Expr]) -> impl Iterator<Item = Task<'_>> {
    exprs.iter().map(visit)
}

fn check_family(kind: NodeKind, family: NodeFamily) -> Result<()> {
    if kind.family() != family {
        return Err(TransformError::UnsupportedNodeKind {
            kind: kind.name().to_string(),
        });
    }
    Ok(())
}

/// Child tasks of `item`, in document order.
fn children(item: Item<'_>) -> Result<Vec<Task<'_>>> {
    let mut tasks = Vec::new();
    match item {
        Item::Expr(expr) => return expr_children(expr),
        Item::Lambda(lambda) => {
            tasks.push(Task::Declare(Scope::Parameters(&lambda.parameters)));
            tasks.push(visit(&lambda.body));
        }
        Item::Label(_) => {}
        Item::Case(case) => {
            tasks.extend(visit_all(&case.test_values));
            tasks.push(visit(&case.body));
        }
        Item::Catch(handler) => {
            if let Some(variable) = &handler.variable {
                tasks.push(Task::Declare(Scope::CatchVariable(variable)));
            }
            if let Some(filter) = &handler.filter {
                tasks.push(visit(filter));
            }
            tasks.push(visit(&handler.body));
        }
        Item::Binding(binding) => match binding {
            MemberBinding::Assignment { expression, .. } => tasks.push(visit(expression)),
            MemberBinding::MemberMember { bindings, .. } => tasks.extend(
                bindings
                    .iter()
                    .map(|nested| Task::Visit(Item::Binding(nested))),
            ),
            MemberBinding::List { initializers, .. } => tasks.extend(
                initializers
                    .iter()
                    .map(|init| Task::Visit(Item::ElementInit(init))),
            ),
        },
        Item::ElementInit(init) => tasks.extend(visit_all(&init.arguments)),
    }
    Ok(tasks)
}

fn expr_children(expr: &Expr) -> Result<Vec<Task<'_>>> {
    let mut tasks = Vec::new();
    match expr {
        Expr::Binary(e) => {
            check_family(e.kind, NodeFamily::Binary)?;
            tasks.push(visit(&e.left));
            tasks.push(visit(&e.right));
            if let Some(conversion) = &e.conversion {
                tasks.push(Task::Visit(Item::Lambda(conversion)));
            }
        }
        Expr::Unary(e) => {
            check_family(e.kind, NodeFamily::Unary)?;
            match &e.operand {
                Some(operand) => tasks.push(visit(operand)),
                None if e.kind == NodeKind::Throw => {}
                None => {
                    return Err(TransformError::Internal(format!(
                        "{} node without an operand",
                        e.kind
                    )))
                }
            }
        }
        Expr::Constant(_) | Expr::Parameter(_) | Expr::Default(_) => {}
        Expr::Lambda(lambda) => return children(Item::Lambda(lambda)),
        Expr::Block(e) => {
            tasks.push(Task::Declare(Scope::Variables(&e.variables)));
            tasks.extend(visit_all(&e.expressions));
        }
        Expr::Conditional(e) => {
            tasks.push(visit(&e.test));
            tasks.push(visit(&e.if_true));
            tasks.push(visit(&e.if_false));
        }
        Expr::Call(e) => {
            if let Some(instance) = &e.instance {
                tasks.push(visit(instance));
            }
            tasks.extend(visit_all(&e.arguments));
        }
        Expr::Invoke(e) => {
            tasks.push(visit(&e.expression));
            tasks.extend(visit_all(&e.arguments));
        }
        Expr::MemberAccess(e) => {
            if let Some(instance) = &e.expression {
                tasks.push(visit(instance));
            }
        }
        Expr::New(e) => tasks.extend(visit_all(&e.arguments)),
        Expr::NewArray(e) => {
            check_family(e.kind, NodeFamily::NewArray)?;
            tasks.extend(visit_all(&e.expressions));
        }
        Expr::MemberInit(e) => {
            tasks.extend(visit_all(&e.new.arguments));
            tasks.extend(
                e.bindings
                    .iter()
                    .map(|binding| Task::Visit(Item::Binding(binding))),
            );
        }
        Expr::ListInit(e) => {
            tasks.extend(visit_all(&e.new.arguments));
            tasks.extend(
                e.initializers
                    .iter()
                    .map(|init| Task::Visit(Item::ElementInit(init))),
            );
        }
        Expr::TypeBinary(e) => {
            check_family(e.kind, NodeFamily::TypeBinary)?;
            tasks.push(visit(&e.expression));
        }
        Expr::Goto(e) => {
            tasks.push(Task::Visit(Item::Label(&e.target)));
            if let Some(value) = &e.value {
                tasks.push(visit(value));
            }
        }
        Expr::Label(e) => {
            tasks.push(Task::Visit(Item::Label(&e.target)));
            if let Some(value) = &e.default_value {
                tasks.push(visit(value));
            }
        }
        Expr::Loop(e) => {
            if let Some(label) = &e.break_label {
                tasks.push(Task::Visit(Item::Label(label)));
            }
            if let Some(label) = &e.continue_label {
                tasks.push(Task::Visit(Item::Label(label)));
            }
            tasks.push(visit(&e.body));
        }
        Expr::Switch(e) => {
            tasks.push(visit(&e.switch_value));
            tasks.extend(e.cases.iter().map(|case| Task::Visit(Item::Case(case))));
            if let Some(default) = &e.default_body {
                tasks.push(visit(default));
            }
        }
        Expr::Try(e) => {
            tasks.push(visit(&e.body));
            tasks.extend(
                e.handlers
                    .iter()
                    .map(|handler| Task::Visit(Item::Catch(handler))),
            );
            if let Some(finally) = &e.finally {
                tasks.push(visit(finally));
            }
            if let Some(fault) = &e.fault {
                tasks.push(visit(fault));
            }
        }
        Expr::Index(e) => {
            tasks.push(visit(&e.object));
            tasks.extend(visit_all(&e.arguments));
        }
        Expr::DebugInfo(_) | Expr::Dynamic(_) | Expr::Extension(_) | Expr::RuntimeVariables(_) => {
            return Err(TransformError::UnsupportedNodeKind {
                kind: expr.kind().name().to_string(),
            })
        }
    }
    Ok(tasks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::opaque::JsonOpaqueSerializer;
    use crate::expr::{BinaryExpr, DebugInfoExpr, GotoKind, UnaryExpr};
    use crate::types::TypeRegistry;

    fn encode(expr: &Expr) -> Result<Element> {
        let registry = TypeRegistry::empty();
        let literals = LiteralCodec::new(&registry, NamingConvention::Short, &JsonOpaqueSerializer);
        let mut symbols = SymbolTable::new();
        let mut encoder = Encoder::new(&literals, NamingConvention::Short, &mut symbols);
        encoder.encode(expr).map(|document| document.root)
    }

    #[test]
    fn test_lambda_layout() {
        let a = ParameterExpr::new("a", TypeRef::INT32);
        let b = ParameterExpr::new("b", TypeRef::INT32);
        let lambda = Expr::lambda(
            vec![a.clone(), b.clone()],
            Expr::add(Expr::parameter(&a), Expr::parameter(&b)),
        );
        let root = encode(&lambda).unwrap();
        let lambda = root.single_element().unwrap();
        assert_eq!(lambda.name, "lambda");
        assert_eq!(lambda.attr("type"), Some("Func<int32, int32, int32>"));

        let ids: Vec<&str> = lambda
            .required_child("parameters")
            .unwrap()
            .elements()
            .filter_map(|p| p.attr("id"))
            .collect();
        assert_eq!(ids, vec!["P1", "P2"]);

        let add = lambda.required_child("body").unwrap().single_element().unwrap();
        assert_eq!(add.name, "add");
        let refs: Vec<&str> = add.elements().filter_map(|p| p.attr("idref")).collect();
        assert_eq!(refs, vec!["P1", "P2"]);
    }

    #[test]
    fn test_free_parameter_defined_inline_once() {
        let x = ParameterExpr::new("x", TypeRef::INT32);
        let expr = Expr::add(Expr::parameter(&x), Expr::parameter(&x));
        let root = encode(&expr).unwrap();
        let add = root.single_element().unwrap();
        let tags: Vec<&str> = add.elements().map(|e| e.name.as_str()).collect();
        assert_eq!(tags, vec!["parameter-definition", "parameter-reference"]);
    }

    #[test]
    fn test_labels_defined_at_first_occurrence() {
        let exit = LabelTarget::new("exit", TypeRef::VOID);
        let body = Expr::block(
            vec![],
            vec![
                Expr::goto(GotoKind::Break, &exit, None),
                Expr::label(&exit, None),
            ],
        );
        let root = encode(&body).unwrap();
        let block = root.single_element().unwrap();
        let statements: Vec<&Element> = block
            .required_child("expressions")
            .unwrap()
            .elements()
            .collect();
        assert_eq!(statements[0].attr("goto-kind"), Some("break"));
        assert_eq!(statements[0].single_element().unwrap().name, "label-definition");
        assert_eq!(statements[1].single_element().unwrap().name, "label-reference");
    }

    #[test]
    fn test_unsupported_kinds() {
        let debug = Expr::DebugInfo(DebugInfoExpr {
            document: "a.cs".to_string(),
            start_line: 1,
            end_line: 2,
        });
        assert_eq!(
            encode(&debug).unwrap_err(),
            TransformError::UnsupportedNodeKind {
                kind: "DebugInfo".to_string()
            }
        );

        let wrong_family = Expr::Binary(BinaryExpr::new(
            NodeKind::Negate,
            Expr::literal(1),
            Expr::literal(2),
            TypeRef::INT32,
        ));
        assert!(matches!(
            encode(&wrong_family),
            Err(TransformError::UnsupportedNodeKind { .. })
        ));
    }

    #[test]
    fn test_rethrow_has_no_operand() {
        let rethrow = Expr::Unary(UnaryExpr::rethrow(TypeRef::VOID));
        let root = encode(&rethrow).unwrap();
        let throw = root.single_element().unwrap();
        assert_eq!(throw.name, "throw");
        assert_eq!(throw.elements().count(), 0);
    }

    #[test]
    fn test_left_deep_chain() {
        let mut expr = Expr::literal(0);
        for i in 1..2_000 {
            expr = Expr::add(expr, Expr::literal(i));
        }
        let root = encode(&expr).unwrap();
        let mut depth = 0;
        let mut node = root.single_element().unwrap();
        while node.name == "add" {
            depth += 1;
            node = node.elements().next().unwrap();
        }
        assert_eq!(depth, 1_999);
        assert_eq!(node.text(), "0");
    }

    #[test]
    fn test_block_variables_declared_before_body() {
        let x = ParameterExpr::new("x", TypeRef::INT32);
        let y = ParameterExpr::new("y", TypeRef::INT32);
        let block = Expr::block(
            vec![x.clone(), y.clone()],
            vec![Expr::assign(Expr::parameter(&y), Expr::parameter(&x))],
        );
        let root = encode(&block).unwrap();
        let block = root.single_element().unwrap();
        let definitions: Vec<(&str, &str)> = block
            .required_child("variables")
            .unwrap()
            .elements()
            .map(|d| (d.attr("id").unwrap(), d.attr("name").unwrap()))
            .collect();
        assert_eq!(definitions, vec![("P1", "x"), ("P2", "y")]);

        let twice = Expr::block(vec![x.clone(), x.clone()], vec![Expr::parameter(&x)]);
        assert!(matches!(encode(&twice), Err(TransformError::Internal(_))));
    }

    #[test]
    fn test_root_lambda_is_encoded() {
        let lambda = Expr::lambda(vec![], Expr::literal(true));
        let root = encode(&lambda).unwrap();
        assert_eq!(root.single_element().unwrap().name, "lambda");
    }
}
