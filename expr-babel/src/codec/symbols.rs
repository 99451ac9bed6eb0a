//! Per-call symbol table.
//!
//! On encode, each distinct binding gets one id the first time it is
//! declared (`P1`, `P2`, … for parameters and variables, `L1`, … for labels)
//! and every later reference reuses it. On decode, ids read from definition
//! fragments map back to freshly built bindings, so all references to one id
//! share one binding. The table is cleared at the start of every call.

use crate::error::{Result, TransformError};
use crate::expr::{LabelTarget, ParameterExpr};
use crate::types::TypeRef;
use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct SymbolTable {
    parameter_ids: HashMap<usize, String>,
    label_ids: HashMap<usize, String>,
    next_parameter: usize,
    next_label: usize,
    parameters: HashMap<String, ParameterExpr>,
    labels: HashMap<String, LabelTarget>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget everything; counters restart at 1.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Mint the id of a parameter or variable being defined.
    pub fn declare_parameter(&mut self, parameter: &ParameterExpr) -> Result<String> {
        if let Some(id) = self.parameter_ids.get(&parameter.identity()) {
            return Err(TransformError::Internal(format!(
                "parameter '{}' declared twice (already {id})",
                parameter.name()
            )));
        }
        self.next_parameter += 1;
        let id = format!("P{}", self.next_parameter);
        self.parameter_ids.insert(parameter.identity(), id.clone());
        Ok(id)
    }

    /// Declare every binding of a scope before its body is visited.
    pub fn declare_all(&mut self, parameters: &[ParameterExpr]) -> Result<Vec<String>> {
        parameters
            .iter()
            .map(|parameter| self.declare_parameter(parameter))
            .collect()
    }

    pub fn reference_parameter(&self, parameter: &ParameterExpr) -> Option<&str> {
        self.parameter_ids
            .get(&parameter.identity())
            .map(String::as_str)
    }

    pub fn declare_label(&mut self, label: &LabelTarget) -> Result<String> {
        if let Some(id) = self.label_ids.get(&label.identity()) {
            return Err(TransformError::Internal(format!(
                "label '{}' declared twice (already {id})",
                label.name()
            )));
        }
        self.next_label += 1;
        let id = format!("L{}", self.next_label);
        self.label_ids.insert(label.identity(), id.clone());
        Ok(id)
    }

    pub fn reference_label(&self, label: &LabelTarget) -> Option<&str> {
        self.label_ids.get(&label.identity()).map(String::as_str)
    }

    /// Build the binding defined by a `parameter-definition` fragment.
    pub fn define_parameter(
        &mut self,
        id: &str,
        name: &str,
        ty: TypeRef,
        by_ref: bool,
    ) -> Result<ParameterExpr> {
        if self.parameters.contains_key(id) {
            return Err(TransformError::DuplicateSymbol { id: id.to_string() });
        }
        let parameter = if by_ref {
            ParameterExpr::by_ref(name, ty)
        } else {
            ParameterExpr::new(name, ty)
        };
        self.parameters.insert(id.to_string(), parameter.clone());
        Ok(parameter)
    }

    pub fn resolve_parameter(&self, id: &str) -> Result<ParameterExpr> {
        self.parameters
            .get(id)
            .cloned()
            .ok_or_else(|| TransformError::UnresolvedSymbolReference { id: id.to_string() })
    }

    pub fn define_label(&mut self, id: &str, name: &str, ty: TypeRef) -> Result<LabelTarget> {
        if self.labels.contains_key(id) {
            return Err(TransformError::DuplicateSymbol { id: id.to_string() });
        }
        let label = LabelTarget::new(name, ty);
        self.labels.insert(id.to_string(), label.clone());
        Ok(label)
    }

    pub fn resolve_label(&self, id: &str) -> Result<LabelTarget> {
        self.labels
            .get(id)
            .cloned()
            .ok_or_else(|| TransformError::UnresolvedSymbolReference { id: id.to_string() })
    }
}
