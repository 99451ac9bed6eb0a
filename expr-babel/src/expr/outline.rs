//! Indented, human-readable outline of an expression tree.
//!
//! One line per node: kind, static type and the node's distinguishing detail
//! (parameter name, constant value, member name). Used by `exprx inspect`.

use super::{CatchBlock, ElementInit, Expr, MemberBinding, SwitchCase};
use std::fmt::Write;

pub fn outline(expr: &Expr) -> String {
    let mut out = String::new();
    write_node(&mut out, expr, 0);
    out
}

fn line(out: &mut String, depth: usize, text: &str) {
    let _ = writeln!(out, "{}{}", "  ".repeat(depth), text);
}

fn write_node(out: &mut String, expr: &Expr, depth: usize) {
    let detail = match expr {
        Expr::Parameter(p) => format!(" {}", p.name()),
        Expr::Constant(c) => format!(" {:?}", c.value),
        Expr::Call(c) => format!(" {}", c.method.name()),
        Expr::MemberAccess(m) => format!(" {}", m.member.name()),
        Expr::Goto(g) => format!(" {} {:?}", g.kind.as_str(), g.target.name()),
        Expr::Label(l) => format!(" {:?}", l.target.name()),
        Expr::TypeBinary(t) => format!(" {}", t.type_operand),
        Expr::Lambda(l) => {
            let names: Vec<&str> = l.parameters.iter().map(|p| p.name()).collect();
            format!(" ({})", names.join(", "))
        }
        Expr::Block(b) if !b.variables.is_empty() => {
            let names: Vec<&str> = b.variables.iter().map(|p| p.name()).collect();
            format!(" [{}]", names.join(", "))
        }
        _ => String::new(),
    };
    line(out, depth, &format!("{}: {}{}", expr.kind(), expr.ty(), detail));

    let depth = depth + 1;
    match expr {
        Expr::Binary(e) => {
            write_node(out, &e.left, depth);
            write_node(out, &e.right, depth);
        }
        Expr::Unary(e) => {
            if let Some(operand) = &e.operand {
                write_node(out, operand, depth);
            }
        }
        Expr::Lambda(e) => write_node(out, &e.body, depth),
        Expr::Block(e) => write_all(out, &e.expressions, depth),
        Expr::Conditional(e) => {
            write_node(out, &e.test, depth);
            write_node(out, &e.if_true, depth);
            write_node(out, &e.if_false, depth);
        }
        Expr::Call(e) => {
            if let Some(instance) = &e.instance {
                write_node(out, instance, depth);
            }
            write_all(out, &e.arguments, depth);
        }
        Expr::Invoke(e) => {
            write_node(out, &e.expression, depth);
            write_all(out, &e.arguments, depth);
        }
        Expr::MemberAccess(e) => {
            if let Some(instance) = &e.expression {
                write_node(out, instance, depth);
            }
        }
        Expr::New(e) => write_all(out, &e.arguments, depth),
        Expr::NewArray(e) => write_all(out, &e.expressions, depth),
        Expr::MemberInit(e) => {
            write_all(out, &e.new.arguments, depth);
            for binding in &e.bindings {
                write_binding(out, binding, depth);
            }
        }
        Expr::ListInit(e) => {
            write_all(out, &e.new.arguments, depth);
            for init in &e.initializers {
                write_element_init(out, init, depth);
            }
        }
        Expr::TypeBinary(e) => write_node(out, &e.expression, depth),
        Expr::Goto(e) => {
            if let Some(value) = &e.value {
                write_node(out, value, depth);
            }
        }
        Expr::Label(e) => {
            if let Some(value) = &e.default_value {
                write_node(out, value, depth);
            }
        }
        Expr::Loop(e) => write_node(out, &e.body, depth),
        Expr::Switch(e) => {
            write_node(out, &e.switch_value, depth);
            for case in &e.cases {
                write_case(out, case, depth);
            }
            if let Some(default) = &e.default_body {
                line(out, depth, "default");
                write_node(out, default, depth + 1);
            }
        }
        Expr::Try(e) => {
            write_node(out, &e.body, depth);
            for handler in &e.handlers {
                write_catch(out, handler, depth);
            }
            if let Some(finally) = &e.finally {
                line(out, depth, "finally");
                write_node(out, finally, depth + 1);
            }
            if let Some(fault) = &e.fault {
                line(out, depth, "fault");
                write_node(out, fault, depth + 1);
            }
        }
        Expr::Index(e) => {
            write_node(out, &e.object, depth);
            write_all(out, &e.arguments, depth);
        }
        Expr::Dynamic(e) => write_all(out, &e.arguments, depth),
        Expr::Constant(_)
        | Expr::Parameter(_)
        | Expr::Default(_)
        | Expr::DebugInfo(_)
        | Expr::Extension(_)
        | Expr::RuntimeVariables(_) => {}
    }
}

fn write_all(out: &mut String, exprs: &[Expr], depth: usize) {
    for expr in exprs {
        write_node(out, expr, depth);
    }
}

fn write_binding(out: &mut String, binding: &MemberBinding, depth: usize) {
    line(out, depth, &format!("{} {}", binding.tag(), binding.member().name()));
    match binding {
        MemberBinding::Assignment { expression, .. } => write_node(out, expression, depth + 1),
        MemberBinding::MemberMember { bindings, .. } => {
            for nested in bindings {
                write_binding(out, nested, depth + 1);
            }
        }
        MemberBinding::List { initializers, .. } => {
            for init in initializers {
                write_element_init(out, init, depth + 1);
            }
        }
    }
}

fn write_element_init(out: &mut String, init: &ElementInit, depth: usize) {
    line(out, depth, &format!("element-init {}", init.add_method.name()));
    write_all(out, &init.arguments, depth + 1);
}

fn write_case(out: &mut String, case: &SwitchCase, depth: usize) {
    line(out, depth, "case");
    write_all(out, &case.test_values, depth + 1);
    write_node(out, &case.body, depth + 1);
}

fn write_catch(out: &mut String, handler: &CatchBlock, depth: usize) {
    let variable = handler
        .variable
        .as_ref()
        .map(|v| format!(" {}", v.name()))
        .unwrap_or_default();
    line(out, depth, &format!("catch {}{}", handler.test, variable));
    if let Some(filter) = &handler.filter {
        write_node(out, filter, depth + 1);
    }
    write_node(out, &handler.body, depth + 1);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::ParameterExpr;
    use crate::types::TypeRef;

    #[test]
    fn test_outline_lambda() {
        let a = ParameterExpr::new("a", TypeRef::INT32);
        let b = ParameterExpr::new("b", TypeRef::INT32);
        let lambda = Expr::lambda(
            vec![a.clone(), b.clone()],
            Expr::add(Expr::parameter(&a), Expr::parameter(&b)),
        );
        let text = outline(&lambda);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Lambda: Func<int32, int32, int32> (a, b)");
        assert_eq!(lines[1], "  Add: int32");
        assert_eq!(lines[2], "    Parameter: int32 a");
        assert_eq!(lines[3], "    Parameter: int32 b");
    }
}
