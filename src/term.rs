// SPDX-License-Identifier: Apache-2.0

//! Solver-independent boolean terms.
//!
//! A `TermStore` is an arena of term nodes addressed by `TermRef`. Terms are
//! built once per rectification request and then handed to as many oracle
//! contexts as needed; each context lowers the terms it is given into its own
//! representation. Structurally identical nodes are shared and constants are
//! folded as terms are built.

use std::collections::HashMap;
use std::fmt;

#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct TermRef {
    pub id: usize,
}

#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct VarId {
    pub id: usize,
}

/// Which part of the problem a variable belongs to. Variables from different
/// namespaces never alias, even when their names collide.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub enum Namespace {
    /// Primary inputs, shared by the implementation and the specification.
    Input,
    Impl,
    Spec,
    /// Truth-table rows of gates being synthesized.
    Param,
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Namespace::Input => "pi",
            Namespace::Impl => "impl",
            Namespace::Spec => "spec",
            Namespace::Param => "param",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, Hash, Eq, PartialEq)]
pub struct VarInfo {
    pub namespace: Namespace,
    pub name: String,
}

impl fmt::Display for VarInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.namespace, self.name)
    }
}

#[derive(Debug, Clone, Hash, Eq, PartialEq)]
pub enum TermNode {
    Const(bool),
    Var(VarId),
    Not(TermRef),
    And(Vec<TermRef>),
    Or(Vec<TermRef>),
    Ite {
        cond: TermRef,
        then: TermRef,
        else_: TermRef,
    },
    Iff(TermRef, TermRef),
}

impl TermNode {
    pub fn get_operands(&self) -> Vec<TermRef> {
        match self {
            TermNode::Const(_) | TermNode::Var(_) => vec![],
            TermNode::Not(t) => vec![*t],
            TermNode::And(ts) | TermNode::Or(ts) => ts.clone(),
            TermNode::Ite { cond, then, else_ } => vec![*cond, *then, *else_],
            TermNode::Iff(a, b) => vec![*a, *b],
        }
    }
}

#[derive(Clone)]
pub struct TermStore {
    nodes: Vec<TermNode>,
    vars: Vec<VarInfo>,
    var_terms: Vec<TermRef>,
    hasher: HashMap<TermNode, TermRef>,
    var_lookup: HashMap<VarInfo, VarId>,
}

impl Default for TermStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TermStore {
    pub fn new() -> Self {
        let mut store = TermStore {
            nodes: Vec::new(),
            vars: Vec::new(),
            var_terms: Vec::new(),
            hasher: HashMap::new(),
            var_lookup: HashMap::new(),
        };
        // Constants always live at ids 0 and 1.
        store.intern(TermNode::Const(false));
        store.intern(TermNode::Const(true));
        store
    }

    fn intern(&mut self, node: TermNode) -> TermRef {
        if let Some(existing) = self.hasher.get(&node) {
            return *existing;
        }
        let term = TermRef {
            id: self.nodes.len(),
        };
        self.nodes.push(node.clone());
        self.hasher.insert(node, term);
        term
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, term: TermRef) -> &TermNode {
        &self.nodes[term.id]
    }

    pub fn var_info(&self, var: VarId) -> &VarInfo {
        &self.vars[var.id]
    }

    /// Returns the variable if `term` is a bare variable.
    pub fn as_var(&self, term: TermRef) -> Option<VarId> {
        match self.get(term) {
            TermNode::Var(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_const(&self, term: TermRef) -> Option<bool> {
        match self.get(term) {
            TermNode::Const(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the existing variable with this namespace and name, creating
    /// it if needed.
    pub fn var(&mut self, namespace: Namespace, name: &str) -> TermRef {
        let info = VarInfo {
            namespace,
            name: name.to_string(),
        };
        if let Some(var) = self.var_lookup.get(&info) {
            return self.var_terms[var.id];
        }
        let var = VarId {
            id: self.vars.len(),
        };
        self.vars.push(info.clone());
        self.var_lookup.insert(info, var);
        let term = self.intern(TermNode::Var(var));
        self.var_terms.push(term);
        term
    }

    /// Creates a variable that is guaranteed not to exist yet; the name is
    /// suffixed if needed.
    pub fn fresh_var(&mut self, namespace: Namespace, name: &str) -> TermRef {
        let mut candidate = name.to_string();
        let mut suffix = 0usize;
        while self.var_lookup.contains_key(&VarInfo {
            namespace,
            name: candidate.clone(),
        }) {
            suffix += 1;
            candidate = format!("{}_{}", name, suffix);
        }
        self.var(namespace, &candidate)
    }

    pub fn constant(&mut self, value: bool) -> TermRef {
        TermRef {
            id: if value { 1 } else { 0 },
        }
    }

    pub fn not(&mut self, term: TermRef) -> TermRef {
        match self.get(term).clone() {
            TermNode::Const(v) => self.constant(!v),
            TermNode::Not(inner) => inner,
            _ => self.intern(TermNode::Not(term)),
        }
    }

    pub fn and(&mut self, terms: &[TermRef]) -> TermRef {
        let mut operands: Vec<TermRef> = Vec::with_capacity(terms.len());
        for term in terms {
            match self.as_const(*term) {
                Some(false) => return self.constant(false),
                Some(true) => continue,
                None => {
                    if !operands.contains(term) {
                        operands.push(*term);
                    }
                }
            }
        }
        match operands.len() {
            0 => self.constant(true),
            1 => operands[0],
            _ => self.intern(TermNode::And(operands)),
        }
    }

    pub fn or(&mut self, terms: &[TermRef]) -> TermRef {
        let mut operands: Vec<TermRef> = Vec::with_capacity(terms.len());
        for term in terms {
            match self.as_const(*term) {
                Some(true) => return self.constant(true),
                Some(false) => continue,
                None => {
                    if !operands.contains(term) {
                        operands.push(*term);
                    }
                }
            }
        }
        match operands.len() {
            0 => self.constant(false),
            1 => operands[0],
            _ => self.intern(TermNode::Or(operands)),
        }
    }

    pub fn ite(&mut self, cond: TermRef, then: TermRef, else_: TermRef) -> TermRef {
        if let Some(c) = self.as_const(cond) {
            return if c { then } else { else_ };
        }
        if then == else_ {
            return then;
        }
        self.intern(TermNode::Ite { cond, then, else_ })
    }

    pub fn iff(&mut self, a: TermRef, b: TermRef) -> TermRef {
        if a == b {
            return self.constant(true);
        }
        match (self.as_const(a), self.as_const(b)) {
            (Some(true), _) => b,
            (Some(false), _) => self.not(b),
            (_, Some(true)) => a,
            (_, Some(false)) => self.not(a),
            _ => {
                let (lo, hi) = if a < b { (a, b) } else { (b, a) };
                self.intern(TermNode::Iff(lo, hi))
            }
        }
    }

    /// Evaluates `term` with variable values supplied by `value_of`.
    pub fn eval(&self, term: TermRef, value_of: &mut impl FnMut(VarId) -> bool) -> bool {
        let mut cache: HashMap<TermRef, bool> = HashMap::new();
        let mut worklist = vec![term];
        // Operands always have smaller ids than the nodes using them, so a
        // simple revisit-after-dependencies walk terminates.
        while let Some(current) = worklist.pop() {
            if cache.contains_key(&current) {
                continue;
            }
            let node = self.get(current);
            let pending: Vec<TermRef> = node
                .get_operands()
                .into_iter()
                .filter(|op| !cache.contains_key(op))
                .collect();
            if !pending.is_empty() {
                worklist.push(current);
                worklist.extend(pending);
                continue;
            }
            let value = match node {
                TermNode::Const(v) => *v,
                TermNode::Var(var) => value_of(*var),
                TermNode::Not(t) => !cache[t],
                TermNode::And(ts) => ts.iter().all(|t| cache[t]),
                TermNode::Or(ts) => ts.iter().any(|t| cache[t]),
                TermNode::Ite { cond, then, else_ } => {
                    if cache[cond] {
                        cache[then]
                    } else {
                        cache[else_]
                    }
                }
                TermNode::Iff(a, b) => cache[a] == cache[b],
            };
            cache.insert(current, value);
        }
        cache[&term]
    }

    /// Variables reachable from `term`, in increasing id order.
    pub fn support(&self, term: TermRef) -> Vec<VarId> {
        let mut visited = vec![false; self.nodes.len()];
        let mut vars = Vec::new();
        let mut worklist = vec![term];
        while let Some(current) = worklist.pop() {
            if visited[current.id] {
                continue;
            }
            visited[current.id] = true;
            let node = self.get(current);
            if let TermNode::Var(v) = node {
                vars.push(*v);
            }
            worklist.extend(node.get_operands());
        }
        vars.sort();
        vars
    }

    pub fn display(&self, term: TermRef) -> String {
        match self.get(term) {
            TermNode::Const(v) => v.to_string(),
            TermNode::Var(v) => self.var_info(*v).to_string(),
            TermNode::Not(t) => format!("(not {})", self.display(*t)),
            TermNode::And(ts) => format!("(and {})", self.display_list(ts)),
            TermNode::Or(ts) => format!("(or {})", self.display_list(ts)),
            TermNode::Ite { cond, then, else_ } => format!(
                "(ite {} {} {})",
                self.display(*cond),
                self.display(*then),
                self.display(*else_)
            ),
            TermNode::Iff(a, b) => format!("(= {} {})", self.display(*a), self.display(*b)),
        }
    }

    fn display_list(&self, terms: &[TermRef]) -> String {
        terms
            .iter()
            .map(|t| self.display(*t))
            .collect::<Vec<String>>()
            .join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_consing_shares_nodes() {
        let mut store = TermStore::new();
        let a = store.var(Namespace::Input, "a");
        let b = store.var(Namespace::Input, "b");
        let x = store.and(&[a, b]);
        let y = store.and(&[a, b]);
        assert_eq!(x, y);
        assert_eq!(store.var(Namespace::Input, "a"), a);
    }

    #[test]
    fn test_namespaces_do_not_alias() {
        let mut store = TermStore::new();
        let impl_f = store.var(Namespace::Impl, "f");
        let spec_f = store.var(Namespace::Spec, "f");
        assert_ne!(impl_f, spec_f);
        let v = store.as_var(spec_f).unwrap();
        assert_eq!(store.var_info(v).to_string(), "spec::f");
    }

    #[test]
    fn test_fresh_var_never_reuses() {
        let mut store = TermStore::new();
        let p = store.var(Namespace::Param, "p");
        let q = store.fresh_var(Namespace::Param, "p");
        assert_ne!(p, q);
        let v = store.as_var(q).unwrap();
        assert_eq!(store.var_info(v).name, "p_1");
    }

    #[test]
    fn test_constant_folding() {
        let mut store = TermStore::new();
        let a = store.var(Namespace::Input, "a");
        let t = store.constant(true);
        let f = store.constant(false);
        assert_eq!(store.and(&[a, t]), a);
        assert_eq!(store.and(&[a, f]), f);
        assert_eq!(store.or(&[a, t]), t);
        assert_eq!(store.or(&[]), f);
        assert_eq!(store.and(&[]), t);
        let not_a = store.not(a);
        assert_eq!(store.not(not_a), a);
        assert_eq!(store.iff(a, f), not_a);
        assert_eq!(store.ite(t, a, f), a);
    }

    #[test]
    fn test_eval() {
        let mut store = TermStore::new();
        let a = store.var(Namespace::Input, "a");
        let b = store.var(Namespace::Input, "b");
        let c = store.var(Namespace::Input, "c");
        let ab = store.and(&[a, b]);
        let term = store.ite(c, ab, b);
        let va = store.as_var(a).unwrap();
        let vc = store.as_var(c).unwrap();
        for row in 0..8usize {
            let values = [row & 4 != 0, row & 2 != 0, row & 1 != 0];
            let mut value_of = |v: VarId| values[v.id];
            let want = if values[2] { values[0] && values[1] } else { values[1] };
            assert_eq!(store.eval(term, &mut value_of), want, "row {}", row);
        }
        assert_eq!(va.id, 0);
        assert_eq!(vc.id, 2);
    }

    #[test]
    fn test_support_and_display() {
        let mut store = TermStore::new();
        let a = store.var(Namespace::Input, "a");
        let p = store.var(Namespace::Param, "g[0]");
        let term = store.iff(a, p);
        let support = store.support(term);
        assert_eq!(support.len(), 2);
        assert_eq!(store.display(term), "(= pi::a param::g[0])");
    }
}
