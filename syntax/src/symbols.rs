//! Nested scopes produced by the checking pass.
//!
//! The table owns every scope in an arena; each scope links to its parent.
//! Consumers navigate with a [`Scope`] cursor, a `Copy` value that is
//! passed down the tree walk: entering a block yields a new cursor and
//! leaving it is simply going back to the one the caller still holds.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::Type;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize,
    Deserialize,
)]
#[serde(transparent)]
pub struct ScopeId(pub u32);

impl ScopeId {
    pub const GLOBAL: ScopeId = ScopeId(0);
}

impl fmt::Display for ScopeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableBinding {
    pub name: String,
    pub ty: Type,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionBinding {
    pub name: String,
    pub arg_types: Vec<Type>,
    pub return_type: Type,
    /// The function's own scope (parameters and locals).
    pub scope: ScopeId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Binding {
    Variable(VariableBinding),
    Function(FunctionBinding),
}

impl Binding {
    pub fn name(&self) -> &str {
        match self {
            Binding::Variable(v) => &v.name,
            Binding::Function(f) => &f.name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
struct ScopeData {
    parent: Option<ScopeId>,
    bindings: BTreeMap<String, Binding>,
}

/// A parent link that does not point at an enclosing scope.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScopeError {
    #[error("symbol table has no global scope")]
    NoGlobal,
    #[error("scope {child} names {parent} as parent, which does not enclose it")]
    BadParent { child: ScopeId, parent: ScopeId },
}

impl ScopeError {
    /// Scope whose link is broken.
    pub fn scope(&self) -> ScopeId {
        match self {
            ScopeError::NoGlobal => ScopeId::GLOBAL,
            ScopeError::BadParent { child, .. } => *child,
        }
    }
}

/// Every scope's parent has a smaller id, so parent chains always end at
/// the global scope. Deserialization rejects tables breaking this.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawSymbolTable")]
pub struct SymbolTable {
    scopes: Vec<ScopeData>,
}

#[derive(Deserialize)]
struct RawSymbolTable {
    scopes: Vec<ScopeData>,
}

impl TryFrom<RawSymbolTable> for SymbolTable {
    type Error = ScopeError;

    fn try_from(raw: RawSymbolTable) -> Result<Self, ScopeError> {
        let table = SymbolTable { scopes: raw.scopes };
        table.validate()?;
        Ok(table)
    }
}

impl SymbolTable {
    /// A table holding only the (empty) global scope.
    pub fn new() -> Self {
        Self {
            scopes: vec![ScopeData::default()],
        }
    }

    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }

    /// Check that every parent link points to an earlier scope.
    pub fn validate(&self) -> Result<(), ScopeError> {
        if self.scopes.is_empty() {
            return Err(ScopeError::NoGlobal);
        }
        for (idx, data) in self.scopes.iter().enumerate() {
            let child = ScopeId(idx as u32);
            if let Some(parent) = data.parent {
                if parent >= child {
                    return Err(ScopeError::BadParent { child, parent });
                }
            }
        }
        Ok(())
    }

    /// Open a new scope nested in `parent`, which should already exist.
    pub fn add_scope(&mut self, parent: ScopeId) -> ScopeId {
        let id = ScopeId(self.scopes.len() as u32);
        self.scopes.push(ScopeData {
            parent: Some(parent),
            bindings: BTreeMap::new(),
        });
        id
    }

    /// Bind a name in `scope`, replacing an earlier binding of that name.
    /// Returns `false` if the scope does not exist.
    pub fn define(&mut self, scope: ScopeId, binding: Binding) -> bool {
        match self.scopes.get_mut(scope.0 as usize) {
            Some(data) => {
                data.bindings.insert(binding.name().to_string(), binding);
                true
            }
            None => false,
        }
    }

    pub fn define_variable(
        &mut self,
        scope: ScopeId,
        name: impl Into<String>,
        ty: Type,
    ) -> bool {
        self.define(
            scope,
            Binding::Variable(VariableBinding {
                name: name.into(),
                ty,
            }),
        )
    }

    /// Declare a global function together with its own scope, in which the
    /// parameters are bound. Returns that scope.
    pub fn define_function(
        &mut self,
        name: impl Into<String>,
        args: &[(&str, Type)],
        return_type: Type,
    ) -> ScopeId {
        let scope = self.add_scope(ScopeId::GLOBAL);
        for (arg, ty) in args {
            self.define_variable(scope, *arg, ty.clone());
        }
        self.define(
            ScopeId::GLOBAL,
            Binding::Function(FunctionBinding {
                name: name.into(),
                arg_types: args.iter().map(|(_, ty)| ty.clone()).collect(),
                return_type,
                scope,
            }),
        );
        scope
    }

    pub fn global(&self) -> Scope<'_> {
        Scope {
            table: self,
            id: ScopeId::GLOBAL,
        }
    }

    pub fn scope(&self, id: ScopeId) -> Option<Scope<'_>> {
        self.data(id).map(|_| Scope { table: self, id })
    }

    fn data(&self, id: ScopeId) -> Option<&ScopeData> {
        self.scopes.get(id.0 as usize)
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

/// Cursor into a [`SymbolTable`]. Lookups walk outward through parents.
#[derive(Debug, Clone, Copy)]
pub struct Scope<'a> {
    table: &'a SymbolTable,
    id: ScopeId,
}

impl<'a> Scope<'a> {
    pub fn id(self) -> ScopeId {
        self.id
    }

    pub fn table(self) -> &'a SymbolTable {
        self.table
    }

    pub fn parent(self) -> Option<Scope<'a>> {
        let parent = self.table.data(self.id)?.parent?;
        self.table.scope(parent)
    }

    /// Cursor for a nested scope, or `None` if `child` is not in the table.
    pub fn enter(self, child: ScopeId) -> Option<Scope<'a>> {
        self.table.scope(child)
    }

    /// Binding of `name` in this scope only.
    pub fn lookup_local(self, name: &str) -> Option<&'a Binding> {
        self.table.data(self.id)?.bindings.get(name)
    }

    /// Innermost binding of `name` visible from this scope. The walk
    /// visits at most as many scopes as the table holds.
    pub fn lookup(self, name: &str) -> Option<&'a Binding> {
        let mut scope = Some(self);
        for _ in 0..self.table.len() {
            let current = scope?;
            if let Some(binding) = current.lookup_local(name) {
                return Some(binding);
            }
            scope = current.parent();
        }
        None
    }

    pub fn function(self, name: &str) -> Option<&'a FunctionBinding> {
        match self.lookup(name)? {
            Binding::Function(f) => Some(f),
            Binding::Variable(_) => None,
        }
    }

    pub fn variable(self, name: &str) -> Option<&'a VariableBinding> {
        match self.lookup(name)? {
            Binding::Variable(v) => Some(v),
            Binding::Function(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_walks_outward() {
        let mut table = SymbolTable::new();
        let f = table.define_function("f", &[("x", Type::Int)], Type::Int);
        let block = table.add_scope(f);
        table.define_variable(block, "y", Type::Bool);

        let scope = table.scope(block).unwrap();
        assert_eq!(scope.variable("y").unwrap().ty, Type::Bool);
        assert_eq!(scope.variable("x").unwrap().ty, Type::Int);
        assert_eq!(scope.function("f").unwrap().return_type, Type::Int);
        assert!(scope.lookup("z").is_none());

        let outer = scope.parent().unwrap();
        assert_eq!(outer.id(), f);
        assert!(outer.lookup("y").is_none());
    }

    #[test]
    fn inner_variable_shadows_function() {
        let mut table = SymbolTable::new();
        table.define_function("g", &[], Type::Void);
        let f = table.define_function("f", &[("g", Type::Int)], Type::Void);

        let scope = table.scope(f).unwrap();
        assert!(scope.function("g").is_none());
        assert!(scope.variable("g").is_some());
        assert!(table.global().function("g").is_some());
    }

    #[test]
    fn entering_unknown_scope_fails() {
        let table = SymbolTable::new();
        assert!(table.global().enter(ScopeId(7)).is_none());
        assert!(table.global().parent().is_none());
    }

    #[test]
    fn lookup_stops_on_a_parent_cycle() {
        let mut table = SymbolTable::new();
        let a = table.add_scope(ScopeId(2));
        let b = table.add_scope(a);
        assert_eq!(
            table.validate(),
            Err(ScopeError::BadParent {
                child: a,
                parent: ScopeId(2),
            })
        );
        let scope = table.scope(b).unwrap();
        assert!(scope.lookup("ghost").is_none());
    }

    #[test]
    fn json_with_self_parented_scope_is_rejected() {
        let mut table = SymbolTable::new();
        table.define_function("f", &[], Type::Void);
        let mut json = serde_json::to_value(&table).unwrap();
        json["scopes"][0]["parent"] = serde_json::json!(0);

        let err = serde_json::from_value::<SymbolTable>(json).unwrap_err();
        assert!(err.to_string().contains("does not enclose it"), "{err}");
    }

    #[test]
    fn json_with_forward_parent_is_rejected() {
        let mut table = SymbolTable::new();
        table.define_function("f", &[], Type::Void);
        let mut json = serde_json::to_value(&table).unwrap();
        json["scopes"][1]["parent"] = serde_json::json!(1);
        assert!(serde_json::from_value::<SymbolTable>(json).is_err());

        let json = serde_json::json!({ "scopes": [] });
        assert!(serde_json::from_value::<SymbolTable>(json).is_err());
    }

    #[test]
    fn survives_json() {
        let mut table = SymbolTable::new();
        table.define_function("f", &[("xs", Type::list(Type::Int))], Type::Void);
        let json = serde_json::to_string(&table).unwrap();
        let back: SymbolTable = serde_json::from_str(&json).unwrap();
        assert_eq!(back, table);
    }
}
