//! Document → expression tree.
//!
//! The walk is iterative and mirrors the encoder. A work stack holds four
//! kinds of task:
//!
//! - `Visit(item)` checks the item's layout, then pushes `Build(item, arity)`
//!   followed by the child tasks in reverse, so children run first and in
//!   document order.
//! - `Define(element)` binds a `parameter-definition` of a scope section.
//! - `Target(element)` binds or resolves a label definition or reference.
//! - `Build(item, arity)` pops the `arity` parts its children left on the
//!   output stack and assembles the item from them.
//!
//! Definitions run in document order, so every `idref` resolves against the
//! symbol table filled so far. Each node tag maps to one rule: a layout
//! function that lists the child tasks and a builder that assembles the
//! node. The table is built once on first use from the node-kind registry
//! and the literal tag set.

use super::literal::{literal_tags, LiteralCodec};
use super::members::{decode_member, is_member_tag};
use super::symbols::SymbolTable;
use crate::document::{Document, Element, ROOT_TAG};
use crate::error::{Result, TransformError};
use crate::expr::{
    BinaryExpr, BlockExpr, CallExpr, CatchBlock, ConditionalExpr, ConstantExpr, ElementInit, Expr,
    GotoExpr, GotoKind, IndexExpr, InvokeExpr, LabelExpr, LabelTarget, LambdaExpr, ListInitExpr,
    LoopExpr, MemberAccessExpr, MemberBinding, MemberInitExpr, NewArrayExpr, NewExpr, NodeFamily,
    NodeKind, ParameterExpr, SwitchCase, SwitchExpr, TryExpr, TypeBinaryExpr, UnaryExpr,
};
use crate::types::{decode_type_name, MemberRef, TypeRef, TypeRegistry};
use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Child tasks of a node element, in document order.
type Layout = for<'e> fn(&'e Element) -> Result<Vec<Task<'e>>>;
type Builder = fn(&mut Decoder<'_>, &Element, &mut Parts) -> Result<Expr>;

struct Rule {
    layout: Layout,
    build: Builder,
}

impl Rule {
    fn new(layout: Layout, build: Builder) -> Self {
        Rule { layout, build }
    }
}

static RULES: Lazy<HashMap<&'static str, Rule>> = Lazy::new(|| {
    let mut table: HashMap<&'static str, Rule> = HashMap::new();
    for &kind in NodeKind::ALL {
        let rule = match kind.family() {
            NodeFamily::Binary => Rule::new(binary_layout, binary),
            NodeFamily::Unary => Rule::new(unary_layout, unary),
            NodeFamily::TypeBinary => Rule::new(type_binary_layout, type_binary),
            NodeFamily::NewArray => Rule::new(new_array_layout, new_array),
            NodeFamily::Single => match kind {
                NodeKind::Lambda => Rule::new(lambda_layout, lambda),
                NodeKind::Block => Rule::new(block_layout, block),
                NodeKind::Conditional => Rule::new(conditional_layout, conditional),
                NodeKind::Call => Rule::new(call_layout, call),
                NodeKind::Invoke => Rule::new(invoke_layout, invoke),
                NodeKind::MemberAccess => Rule::new(member_access_layout, member_access),
                NodeKind::New => Rule::new(new_layout, new),
                NodeKind::MemberInit => Rule::new(member_init_layout, member_init),
                NodeKind::ListInit => Rule::new(list_init_layout, list_init),
                NodeKind::Default => Rule::new(leaf, default),
                NodeKind::Goto => Rule::new(goto_layout, goto),
                NodeKind::Label => Rule::new(label_layout, label),
                NodeKind::Loop => Rule::new(loop_layout, loop_node),
                NodeKind::Switch => Rule::new(switch_layout, switch),
                NodeKind::Try => Rule::new(try_layout, try_node),
                NodeKind::Index => Rule::new(index_layout, index),
                NodeKind::DebugInfo
                | NodeKind::Dynamic
                | NodeKind::Extension
                | NodeKind::RuntimeVariables => Rule::new(unsupported_layout, unsupported),
                // Constants are written as bare literal fragments and
                // parameters as definitions or references.
                _ => continue,
            },
        };
        table.insert(kind.tag(), rule);
    }
    for tag in literal_tags() {
        table.insert(tag, Rule::new(leaf, constant));
    }
    table.insert("parameter-definition", Rule::new(leaf, parameter_definition));
    table.insert("parameter-reference", Rule::new(leaf, parameter_reference));
    table
});

fn rule(element: &Element) -> Result<&'static Rule> {
    RULES
        .get(element.name.as_str())
        .ok_or_else(|| TransformError::UnknownTag {
            tag: element.name.clone(),
            parent: "expression".to_string(),
        })
}

/// Element shapes the walk assembles. Only `Node` becomes an [`Expr`]; the
/// others are pieces of an enclosing node.
#[derive(Clone, Copy)]
enum Item<'e> {
    Node(&'e Element),
    New(&'e Element),
    Case(&'e Element),
    Catch(&'e Element),
    Binding(&'e Element),
    ElementInit(&'e Element),
}

enum Task<'e> {
    Visit(Item<'e>),
    Define(&'e Element),
    Target(&'e Element),
    Build(Item<'e>, usize),
}

/// What a finished task leaves on the output stack.
enum Part {
    Node(Expr),
    Parameter(ParameterExpr),
    Label(LabelTarget),
    New(NewExpr),
    Case(SwitchCase),
    Catch(CatchBlock),
    Binding(MemberBinding),
    ElementInit(ElementInit),
}

pub struct Decoder<'a> {
    registry: &'a TypeRegistry,
    literals: &'a LiteralCodec<'a>,
    symbols: &'a mut SymbolTable,
}

impl<'a> Decoder<'a> {
    pub fn new(
        registry: &'a TypeRegistry,
        literals: &'a LiteralCodec<'a>,
        symbols: &'a mut SymbolTable,
    ) -> Self {
        Decoder {
            registry,
            literals,
            symbols,
        }
    }

    pub fn decode(&mut self, document: &Document) -> Result<Expr> {
        self.symbols.reset();
        let root = &document.root;
        if root.name != ROOT_TAG {
            return Err(TransformError::UnknownTag {
                tag: root.name.clone(),
                parent: "document".to_string(),
            });
        }
        self.decode_node(root.single_element()?)
    }

    /// Decode one node element.
    pub fn decode_node(&mut self, element: &Element) -> Result<Expr> {
        let mut work = vec![visit(element)];
        let mut output: Vec<Part> = Vec::new();

        while let Some(task) = work.pop() {
            match task {
                Task::Visit(item) => {
                    let tasks = children(item)?;
                    work.push(Task::Build(item, tasks.len()));
                    work.extend(tasks.into_iter().rev());
                }
                Task::Define(definition) => {
                    let parameter = self.definition(definition)?;
                    output.push(Part::Parameter(parameter));
                }
                Task::Target(target) => {
                    let label = self.label_target(target)?;
                    output.push(Part::Label(label));
                }
                Task::Build(item, arity) => {
                    if output.len() < arity {
                        return Err(TransformError::Internal(format!(
                            "output stack underflow: need {arity}, have {}",
                            output.len()
                        )));
                    }
                    let parts = output.split_off(output.len() - arity);
                    let part = self.build(item, Parts::new(parts))?;
                    output.push(part);
                }
            }
        }

        match (output.pop(), output.is_empty()) {
            (Some(Part::Node(expr)), true) => Ok(expr),
            _ => Err(TransformError::Internal(
                "walk did not leave exactly one node".to_string(),
            )),
        }
    }

    fn ty(&self, element: &Element) -> Result<TypeRef> {
        self.type_attr(element, "type")
    }

    fn type_attr(&self, element: &Element, attribute: &str) -> Result<TypeRef> {
        decode_type_name(element.required_attr(attribute)?, self.registry)
    }

    fn member(&self, element: &Element) -> Result<MemberRef> {
        decode_member(element, self.registry)
    }

    /// The member descriptor among `element`'s children, if any.
    fn optional_member(&self, element: &Element) -> Result<Option<MemberRef>> {
        element
            .elements()
            .find(|child| is_member_tag(&child.name))
            .map(|child| self.member(child))
            .transpose()
    }

    fn required_member(&self, element: &Element) -> Result<MemberRef> {
        self.optional_member(element)?
            .ok_or_else(|| TransformError::missing_child(&element.name, "member"))
    }

    fn definition(&mut self, element: &Element) -> Result<ParameterExpr> {
        if element.name != "parameter-definition" {
            return Err(TransformError::UnknownTag {
                tag: element.name.clone(),
                parent: "definitions".to_string(),
            });
        }
        let ty = self.ty(element)?;
        self.symbols.define_parameter(
            element.required_attr("id")?,
            element.required_attr("name")?,
            ty,
            element.flag("by-ref")?,
        )
    }

    fn label_target(&mut self, element: &Element) -> Result<LabelTarget> {
        match element.name.as_str() {
            "label-definition" => {
                let ty = self.ty(element)?;
                self.symbols.define_label(
                    element.required_attr("id")?,
                    element.attr("name").unwrap_or_default(),
                    ty,
                )
            }
            "label-reference" => self.symbols.resolve_label(element.required_attr("idref")?),
            other => Err(TransformError::UnknownTag {
                tag: other.to_string(),
                parent: "label".to_string(),
            }),
        }
    }

    fn build(&mut self, item: Item<'_>, mut parts: Parts) -> Result<Part> {
        let part = match item {
            Item::Node(element) => Part::Node((rule(element)?.build)(self, element, &mut parts)?),
            Item::New(element) => {
                let arguments = parts.rest_nodes()?;
                Part::New(self.new_expr(element, arguments)?)
            }
            Item::Case(element) => {
                let values = element.required_child("case-values")?.elements().count();
                Part::Case(SwitchCase {
                    test_values: parts.nodes(values)?,
                    body: parts.node()?,
                })
            }
            Item::Catch(element) => {
                let test = self.type_attr(element, "test-type")?;
                let variable = match element.child("parameter-definition") {
                    Some(_) => Some(parts.parameter()?),
                    None => None,
                };
                let filter = match element.child("filter") {
                    Some(_) => Some(parts.node()?),
                    None => None,
                };
                Part::Catch(CatchBlock {
                    test,
                    variable,
                    filter,
                    body: parts.node()?,
                })
            }
            Item::Binding(element) => {
                let member = self.required_member(element)?;
                let binding = match element.name.as_str() {
                    "member-assignment" => MemberBinding::Assignment {
                        member,
                        expression: parts.node()?,
                    },
                    "member-member-binding" => MemberBinding::MemberMember {
                        member,
                        bindings: parts.rest(Parts::binding)?,
                    },
                    _ => MemberBinding::List {
                        member,
                        initializers: parts.rest(Parts::element_init)?,
                    },
                };
                Part::Binding(binding)
            }
            Item::ElementInit(element) => Part::ElementInit(ElementInit {
                add_method: self.required_member(element)?,
                arguments: parts.rest_nodes()?,
            }),
        };
        parts.finish()?;
        Ok(part)
    }
}

/// Child parts of one item, consumed front to back.
struct Parts(std::vec::IntoIter<Part>);

impl Parts {
    fn new(parts: Vec<Part>) -> Self {
        Parts(parts.into_iter())
    }

    fn is_empty(&self) -> bool {
        self.0.len() == 0
    }

    fn next_as<T>(&mut self, what: &str, pick: fn(Part) -> Option<T>) -> Result<T> {
        let part = self
            .0
            .next()
            .ok_or_else(|| TransformError::Internal(format!("missing {what} part")))?;
        pick(part).ok_or_else(|| TransformError::Internal(format!("expected a {what} part")))
    }

    fn node(&mut self) -> Result<Expr> {
        self.next_as("node", |part| match part {
            Part::Node(expr) => Some(expr),
            _ => None,
        })
    }

    fn nodes(&mut self, count: usize) -> Result<Vec<Expr>> {
        (0..count).map(|_| self.node()).collect()
    }

    fn rest_nodes(&mut self) -> Result<Vec<Expr>> {
        self.rest(Parts::node)
    }

    /// Everything left, each read with `one`.
    fn rest<T>(&mut self, one: fn(&mut Parts) -> Result<T>) -> Result<Vec<T>> {
        let mut out = Vec::with_capacity(self.0.len());
        while !self.is_empty() {
            out.push(one(self)?);
        }
        Ok(out)
    }

    fn lambda(&mut self) -> Result<LambdaExpr> {
        self.next_as("lambda", |part| match part {
            Part::Node(Expr::Lambda(lambda)) => Some(lambda),
            _ => None,
        })
    }

    fn parameter(&mut self) -> Result<ParameterExpr> {
        self.next_as("parameter", |part| match part {
            Part::Parameter(parameter) => Some(parameter),
            _ => None,
        })
    }

    fn parameters(&mut self, count: usize) -> Result<Vec<ParameterExpr>> {
        (0..count).map(|_| self.parameter()).collect()
    }

    fn label(&mut self) -> Result<LabelTarget> {
        self.next_as("label", |part| match part {
            Part::Label(label) => Some(label),
            _ => None,
        })
    }

    fn new_expr(&mut self) -> Result<NewExpr> {
        self.next_as("new", |part| match part {
            Part::New(new) => Some(new),
            _ => None,
        })
    }

    fn case(&mut self) -> Result<SwitchCase> {
        self.next_as("case", |part| match part {
            Part::Case(case) => Some(case),
            _ => None,
        })
    }

    fn catch(&mut self) -> Result<CatchBlock> {
        self.next_as("catch", |part| match part {
            Part::Catch(handler) => Some(handler),
            _ => None,
        })
    }

    fn binding(&mut self) -> Result<MemberBinding> {
        self.next_as("binding", |part| match part {
            Part::Binding(binding) => Some(binding),
            _ => None,
        })
    }

    fn element_init(&mut self) -> Result<ElementInit> {
        self.next_as("element-init", |part| match part {
            Part::ElementInit(init) => Some(init),
            _ => None,
        })
    }

    fn finish(mut self) -> Result<()> {
        match self.0.next() {
            None => Ok(()),
            Some(_) => Err(TransformError::Internal(
                "unconsumed child part".to_string(),
            )),
        }
    }
}

impl Decoder<'_> {
    fn new_expr(&self, element: &Element, arguments: Vec<Expr>) -> Result<NewExpr> {
        let members = match element.child("members") {
            Some(section) => section
                .elements()
                .map(|member| self.member(member))
                .collect::<Result<Vec<_>>>()?,
            None => Vec::new(),
        };
        Ok(NewExpr {
            constructor: self.optional_member(element)?,
            arguments,
            members,
            ty: self.ty(element)?,
        })
    }
}

fn visit(element: &Element) -> Task<'_> {
    Task::Visit(Item::Node(element))
}

/// Nodes inside a required wrapper (`<arguments>`).
fn visit_section<'e>(element: &'e Element, wrapper: &str) -> Result<Vec<Task<'e>>> {
    Ok(element.required_child(wrapper)?.elements().map(visit).collect())
}

/// The single node inside a required wrapper (`<body>`).
fn visit_wrapped<'e>(element: &'e Element, wrapper: &str) -> Result<Task<'e>> {
    Ok(visit(element.required_child(wrapper)?.single_element()?))
}

fn visit_optional<'e>(element: &'e Element, wrapper: &str) -> Result<Option<Task<'e>>> {
    element
        .child(wrapper)
        .map(|section| section.single_element().map(visit))
        .transpose()
}

fn initializers(element: &Element) -> Result<Vec<Task<'_>>> {
    Ok(element
        .required_child("initializers")?
        .elements()
        .map(|init| Task::Visit(Item::ElementInit(init)))
        .collect())
}

/// Child tasks of `item`, in document order.
fn children(item: Item<'_>) -> Result<Vec<Task<'_>>> {
    match item {
        Item::Node(element) => (rule(element)?.layout)(element),
        Item::New(element) => visit_section(element, "arguments"),
        Item::Case(element) => {
            if element.name != "case" {
                return Err(TransformError::UnknownTag {
                    tag: element.name.clone(),
                    parent: "cases".to_string(),
                });
            }
            let mut tasks = visit_section(element, "case-values")?;
            tasks.push(visit_wrapped(element, "body")?);
            Ok(tasks)
        }
        Item::Catch(element) => {
            let mut tasks = Vec::new();
            if let Some(definition) = element.child("parameter-definition") {
                tasks.push(Task::Define(definition));
            }
            tasks.extend(visit_optional(element, "filter")?);
            tasks.push(visit_wrapped(element, "body")?);
            Ok(tasks)
        }
        Item::Binding(element) => match element.name.as_str() {
            "member-assignment" => {
                let value = element
                    .elements()
                    .find(|child| !is_member_tag(&child.name))
                    .ok_or_else(|| TransformError::missing_child("member-assignment", "node"))?;
                Ok(vec![visit(value)])
            }
            "member-member-binding" => Ok(element
                .required_child("bindings")?
                .elements()
                .map(|nested| Task::Visit(Item::Binding(nested)))
                .collect()),
            "member-list-binding" => initializers(element),
            other => Err(TransformError::UnknownTag {
                tag: other.to_string(),
                parent: "bindings".to_string(),
            }),
        },
        Item::ElementInit(element) => {
            if element.name != "element-init" {
                return Err(TransformError::UnknownTag {
                    tag: element.name.clone(),
                    parent: "initializers".to_string(),
                });
            }
            visit_section(element, "arguments")
        }
    }
}

/// Operand elements: everything except member descriptors and the listed
/// wrappers.
fn operands<'e>(element: &'e Element, wrappers: &[&str]) -> Vec<&'e Element> {
    element
        .elements()
        .filter(|child| !is_member_tag(&child.name) && !wrappers.contains(&child.name.as_str()))
        .collect()
}

fn kind_of(element: &Element) -> Result<NodeKind> {
    NodeKind::from_tag(&element.name).ok_or_else(|| TransformError::UnknownTag {
        tag: element.name.clone(),
        parent: "expression".to_string(),
    })
}

fn exactly<'e>(element: &Element, found: Vec<&'e Element>, count: usize) -> Result<Vec<&'e Element>> {
    if found.len() < count {
        return Err(TransformError::missing_child(&element.name, "operand"));
    }
    if let Some(extra) = found.get(count) {
        return Err(TransformError::UnknownTag {
            tag: extra.name.clone(),
            parent: element.name.clone(),
        });
    }
    Ok(found)
}

fn leaf(_: &Element) -> Result<Vec<Task<'_>>> {
    Ok(Vec::new())
}

fn binary_layout(element: &Element) -> Result<Vec<Task<'_>>> {
    let found = exactly(element, operands(element, &["conversion"]), 2)?;
    let mut tasks = vec![visit(found[0]), visit(found[1])];
    if let Some(section) = element.child("conversion") {
        let conversion = section.single_element()?;
        if conversion.name != "lambda" {
            return Err(TransformError::UnknownTag {
                tag: conversion.name.clone(),
                parent: "conversion".to_string(),
            });
        }
        tasks.push(visit(conversion));
    }
    Ok(tasks)
}

fn binary(decoder: &mut Decoder<'_>, element: &Element, parts: &mut Parts) -> Result<Expr> {
    let left = parts.node()?;
    let right = parts.node()?;
    let conversion = match element.child("conversion") {
        Some(_) => Some(Box::new(parts.lambda()?)),
        None => None,
    };
    Ok(Expr::Binary(BinaryExpr {
        kind: kind_of(element)?,
        left: Box::new(left),
        right: Box::new(right),
        ty: decoder.ty(element)?,
        method: decoder.optional_member(element)?,
        lifted_to_null: element.flag("lifted-to-null")?,
        conversion,
    }))
}

fn unary_layout(element: &Element) -> Result<Vec<Task<'_>>> {
    let found = operands(element, &[]);
    if found.is_empty() && kind_of(element)? == NodeKind::Throw {
        return Ok(Vec::new());
    }
    let found = exactly(element, found, 1)?;
    Ok(vec![visit(found[0])])
}

fn unary(decoder: &mut Decoder<'_>, element: &Element, parts: &mut Parts) -> Result<Expr> {
    let operand = if parts.is_empty() {
        None
    } else {
        Some(Box::new(parts.node()?))
    };
    Ok(Expr::Unary(UnaryExpr {
        kind: kind_of(element)?,
        operand,
        ty: decoder.ty(element)?,
        method: decoder.optional_member(element)?,
    }))
}

fn constant(decoder: &mut Decoder<'_>, element: &Element, _: &mut Parts) -> Result<Expr> {
    let (value, ty) = decoder.literals.decode(element)?;
    Ok(Expr::Constant(ConstantExpr { value, ty }))
}

fn parameter_definition(decoder: &mut Decoder<'_>, element: &Element, _: &mut Parts) -> Result<Expr> {
    decoder.definition(element).map(Expr::Parameter)
}

fn parameter_reference(decoder: &mut Decoder<'_>, element: &Element, _: &mut Parts) -> Result<Expr> {
    decoder
        .symbols
        .resolve_parameter(element.required_attr("idref")?)
        .map(Expr::Parameter)
}

fn lambda_layout(element: &Element) -> Result<Vec<Task<'_>>> {
    let mut tasks: Vec<Task<'_>> = element
        .required_child("parameters")?
        .elements()
        .map(Task::Define)
        .collect();
    tasks.push(visit_wrapped(element, "body")?);
    Ok(tasks)
}

fn lambda(decoder: &mut Decoder<'_>, element: &Element, parts: &mut Parts) -> Result<Expr> {
    let count = element.required_child("parameters")?.elements().count();
    let parameters = parts.parameters(count)?;
    let body = parts.node()?;
    Ok(Expr::Lambda(LambdaExpr {
        name: element.attr("name").map(str::to_string),
        parameters,
        body: Box::new(body),
        ty: decoder.ty(element)?,
        tail_call: element.flag("tail-call")?,
    }))
}

fn block_layout(element: &Element) -> Result<Vec<Task<'_>>> {
    let mut tasks: Vec<Task<'_>> = match element.child("variables") {
        Some(section) => section.elements().map(Task::Define).collect(),
        None => Vec::new(),
    };
    tasks.extend(visit_section(element, "expressions")?);
    Ok(tasks)
}

fn block(decoder: &mut Decoder<'_>, element: &Element, parts: &mut Parts) -> Result<Expr> {
    let count = element
        .child("variables")
        .map_or(0, |section| section.elements().count());
    Ok(Expr::Block(BlockExpr {
        variables: parts.parameters(count)?,
        expressions: parts.rest_nodes()?,
        ty: decoder.ty(element)?,
    }))
}

fn conditional_layout(element: &Element) -> Result<Vec<Task<'_>>> {
    let found = exactly(element, operands(element, &[]), 3)?;
    Ok(found.into_iter().map(visit).collect())
}

fn conditional(decoder: &mut Decoder<'_>, element: &Element, parts: &mut Parts) -> Result<Expr> {
    Ok(Expr::Conditional(ConditionalExpr {
        test: Box::new(parts.node()?),
        if_true: Box::new(parts.node()?),
        if_false: Box::new(parts.node()?),
        ty: decoder.ty(element)?,
    }))
}

fn call_layout(element: &Element) -> Result<Vec<Task<'_>>> {
    let mut tasks: Vec<Task<'_>> = visit_optional(element, "instance")?.into_iter().collect();
    tasks.extend(visit_section(element, "arguments")?);
    Ok(tasks)
}

fn call(decoder: &mut Decoder<'_>, element: &Element, parts: &mut Parts) -> Result<Expr> {
    let method = decoder.required_member(element)?;
    let instance = match element.child("instance") {
        Some(_) => Some(Box::new(parts.node()?)),
        None => None,
    };
    Ok(Expr::Call(CallExpr {
        instance,
        method,
        arguments: parts.rest_nodes()?,
    }))
}

fn invoke_layout(element: &Element) -> Result<Vec<Task<'_>>> {
    let found = exactly(element, operands(element, &["arguments"]), 1)?;
    let mut tasks = vec![visit(found[0])];
    tasks.extend(visit_section(element, "arguments")?);
    Ok(tasks)
}

fn invoke(decoder: &mut Decoder<'_>, element: &Element, parts: &mut Parts) -> Result<Expr> {
    let expression = parts.node()?;
    Ok(Expr::Invoke(InvokeExpr {
        expression: Box::new(expression),
        arguments: parts.rest_nodes()?,
        ty: decoder.ty(element)?,
    }))
}

fn member_access_layout(element: &Element) -> Result<Vec<Task<'_>>> {
    Ok(visit_optional(element, "instance")?.into_iter().collect())
}

fn member_access(decoder: &mut Decoder<'_>, element: &Element, parts: &mut Parts) -> Result<Expr> {
    let member = decoder.required_member(element)?;
    let expression = match element.child("instance") {
        Some(_) => Some(Box::new(parts.node()?)),
        None => None,
    };
    Ok(Expr::MemberAccess(MemberAccessExpr { expression, member }))
}

fn new_layout(element: &Element) -> Result<Vec<Task<'_>>> {
    visit_section(element, "arguments")
}

fn new(decoder: &mut Decoder<'_>, element: &Element, parts: &mut Parts) -> Result<Expr> {
    let arguments = parts.rest_nodes()?;
    decoder.new_expr(element, arguments).map(Expr::New)
}

fn new_array_layout(element: &Element) -> Result<Vec<Task<'_>>> {
    let section = match kind_of(element)? {
        NodeKind::NewArrayInit => "array-elements",
        _ => "bounds",
    };
    visit_section(element, section)
}

fn new_array(decoder: &mut Decoder<'_>, element: &Element, parts: &mut Parts) -> Result<Expr> {
    Ok(Expr::NewArray(NewArrayExpr {
        kind: kind_of(element)?,
        element_type: decoder.type_attr(element, "element-type")?,
        expressions: parts.rest_nodes()?,
    }))
}

fn member_init_layout(element: &Element) -> Result<Vec<Task<'_>>> {
    let mut tasks = vec![Task::Visit(Item::New(element.required_child("new")?))];
    tasks.extend(
        element
            .required_child("bindings")?
            .elements()
            .map(|binding| Task::Visit(Item::Binding(binding))),
    );
    Ok(tasks)
}

fn member_init(_: &mut Decoder<'_>, _: &Element, parts: &mut Parts) -> Result<Expr> {
    Ok(Expr::MemberInit(MemberInitExpr {
        new: parts.new_expr()?,
        bindings: parts.rest(Parts::binding)?,
    }))
}

fn list_init_layout(element: &Element) -> Result<Vec<Task<'_>>> {
    let mut tasks = vec![Task::Visit(Item::New(element.required_child("new")?))];
    tasks.extend(initializers(element)?);
    Ok(tasks)
}

fn list_init(_: &mut Decoder<'_>, _: &Element, parts: &mut Parts) -> Result<Expr> {
    Ok(Expr::ListInit(ListInitExpr {
        new: parts.new_expr()?,
        initializers: parts.rest(Parts::element_init)?,
    }))
}

fn type_binary_layout(element: &Element) -> Result<Vec<Task<'_>>> {
    let found = exactly(element, operands(element, &[]), 1)?;
    Ok(vec![visit(found[0])])
}

fn type_binary(decoder: &mut Decoder<'_>, element: &Element, parts: &mut Parts) -> Result<Expr> {
    Ok(Expr::TypeBinary(TypeBinaryExpr {
        kind: kind_of(element)?,
        expression: Box::new(parts.node()?),
        type_operand: decoder.type_attr(element, "type-operand")?,
    }))
}

fn default(decoder: &mut Decoder<'_>, element: &Element, _: &mut Parts) -> Result<Expr> {
    decoder.ty(element).map(Expr::Default)
}

/// A label fragment followed by an optional value node.
fn targeted<'e>(element: &'e Element, first: &str) -> Result<Vec<Task<'e>>> {
    let mut children = element.elements();
    let target = children
        .next()
        .ok_or_else(|| TransformError::missing_child(&element.name, first))?;
    let mut tasks = vec![Task::Target(target)];
    tasks.extend(children.next().map(visit));
    Ok(tasks)
}

fn goto_layout(element: &Element) -> Result<Vec<Task<'_>>> {
    targeted(element, "label-reference")
}

fn goto(decoder: &mut Decoder<'_>, element: &Element, parts: &mut Parts) -> Result<Expr> {
    let text = element.required_attr("goto-kind")?;
    let kind = GotoKind::parse(text)
        .ok_or_else(|| TransformError::malformed("goto", format!("unknown goto kind '{text}'")))?;
    let target = parts.label()?;
    let value = if parts.is_empty() {
        None
    } else {
        Some(Box::new(parts.node()?))
    };
    Ok(Expr::Goto(GotoExpr {
        kind,
        target,
        value,
        ty: decoder.ty(element)?,
    }))
}

fn label_layout(element: &Element) -> Result<Vec<Task<'_>>> {
    targeted(element, "label-definition")
}

fn label(_: &mut Decoder<'_>, _: &Element, parts: &mut Parts) -> Result<Expr> {
    let target = parts.label()?;
    let default_value = if parts.is_empty() {
        None
    } else {
        Some(Box::new(parts.node()?))
    };
    Ok(Expr::Label(LabelExpr {
        target,
        default_value,
    }))
}

fn loop_layout(element: &Element) -> Result<Vec<Task<'_>>> {
    let mut tasks = Vec::new();
    for wrapper in ["break-label", "continue-label"] {
        if let Some(section) = element.child(wrapper) {
            tasks.push(Task::Target(section.single_element()?));
        }
    }
    tasks.push(visit_wrapped(element, "body")?);
    Ok(tasks)
}

fn loop_node(_: &mut Decoder<'_>, element: &Element, parts: &mut Parts) -> Result<Expr> {
    let mut target = |wrapper: &str| -> Result<Option<LabelTarget>> {
        match element.child(wrapper) {
            Some(_) => parts.label().map(Some),
            None => Ok(None),
        }
    };
    let break_label = target("break-label")?;
    let continue_label = target("continue-label")?;
    Ok(Expr::Loop(LoopExpr {
        body: Box::new(parts.node()?),
        break_label,
        continue_label,
    }))
}

fn switch_layout(element: &Element) -> Result<Vec<Task<'_>>> {
    let found = exactly(element, operands(element, &["cases", "default-body"]), 1)?;
    let mut tasks = vec![visit(found[0])];
    tasks.extend(
        element
            .required_child("cases")?
            .elements()
            .map(|case| Task::Visit(Item::Case(case))),
    );
    tasks.extend(visit_optional(element, "default-body")?);
    Ok(tasks)
}

fn switch(decoder: &mut Decoder<'_>, element: &Element, parts: &mut Parts) -> Result<Expr> {
    let switch_value = parts.node()?;
    let count = element.required_child("cases")?.elements().count();
    let cases = (0..count)
        .map(|_| parts.case())
        .collect::<Result<Vec<_>>>()?;
    let default_body = match element.child("default-body") {
        Some(_) => Some(Box::new(parts.node()?)),
        None => None,
    };
    Ok(Expr::Switch(SwitchExpr {
        switch_value: Box::new(switch_value),
        cases,
        default_body,
        comparison: decoder.optional_member(element)?,
        ty: decoder.ty(element)?,
    }))
}

fn try_layout(element: &Element) -> Result<Vec<Task<'_>>> {
    let mut tasks = vec![visit_wrapped(element, "body")?];
    tasks.extend(
        element
            .elements()
            .filter(|child| child.name == "catch")
            .map(|handler| Task::Visit(Item::Catch(handler))),
    );
    tasks.extend(visit_optional(element, "finally")?);
    tasks.extend(visit_optional(element, "fault")?);
    Ok(tasks)
}

fn try_node(_: &mut Decoder<'_>, element: &Element, parts: &mut Parts) -> Result<Expr> {
    let body = parts.node()?;
    let count = element
        .elements()
        .filter(|child| child.name == "catch")
        .count();
    let handlers = (0..count)
        .map(|_| parts.catch())
        .collect::<Result<Vec<_>>>()?;
    let mut optional = |wrapper: &str| -> Result<Option<Box<Expr>>> {
        match element.child(wrapper) {
            Some(_) => parts.node().map(|node| Some(Box::new(node))),
            None => Ok(None),
        }
    };
    let finally = optional("finally")?;
    let fault = optional("fault")?;
    Ok(Expr::Try(TryExpr {
        body: Box::new(body),
        handlers,
        finally,
        fault,
    }))
}

fn index_layout(element: &Element) -> Result<Vec<Task<'_>>> {
    let mut tasks = vec![visit_wrapped(element, "instance")?];
    tasks.extend(visit_section(element, "indexes")?);
    Ok(tasks)
}

fn index(decoder: &mut Decoder<'_>, element: &Element, parts: &mut Parts) -> Result<Expr> {
    let object = parts.node()?;
    Ok(Expr::Index(IndexExpr {
        object: Box::new(object),
        indexer: decoder.optional_member(element)?,
        arguments: parts.rest_nodes()?,
        ty: decoder.ty(element)?,
    }))
}

fn unsupported_error(element: &Element) -> TransformError {
    match kind_of(element) {
        Ok(kind) => TransformError::UnsupportedNodeKind {
            kind: kind.name().to_string(),
        },
        Err(error) => error,
    }
}

fn unsupported_layout(element: &Element) -> Result<Vec<Task<'_>>> {
    Err(unsupported_error(element))
}

fn unsupported(_: &mut Decoder<'_>, element: &Element, _: &mut Parts) -> Result<Expr> {
    Err(unsupported_error(element))
}
