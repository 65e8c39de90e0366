//! Scope tree.
//!
//! All scopes live in one arena. Each scope maps names to symbols and
//! points at its parent by index; the tree mirrors block nesting
//! (prelude, module, function, blocks).

use quill_ir::Name;
use rustc_hash::FxHashMap;

use crate::SymbolId;

#[derive(Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd, Debug)]
pub struct ScopeId(u32);

impl ScopeId {
    pub const PRELUDE: ScopeId = ScopeId(0);
    pub const MODULE: ScopeId = ScopeId(1);

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum ScopeKind {
    Prelude,
    Module,
    Function,
    Block,
}

#[derive(Clone, Debug)]
pub struct Scope {
    pub kind: ScopeKind,
    pub parent: Option<ScopeId>,
    pub children: Vec<ScopeId>,
    names: FxHashMap<Name, SymbolId>,
}

impl Scope {
    /// Symbol declared directly in this scope.
    pub fn get(&self, name: Name) -> Option<SymbolId> {
        self.names.get(&name).copied()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

#[derive(Clone, Debug)]
pub struct ScopeTree {
    scopes: Vec<Scope>,
}

impl ScopeTree {
    /// A tree with the prelude and module scopes.
    pub fn new() -> Self {
        let mut tree = ScopeTree { scopes: Vec::new() };
        tree.push_scope(None, ScopeKind::Prelude);
        tree.push_scope(Some(ScopeId::PRELUDE), ScopeKind::Module);
        tree
    }

    fn push_scope(&mut self, parent: Option<ScopeId>, kind: ScopeKind) -> ScopeId {
        let id = ScopeId(u32::try_from(self.scopes.len()).unwrap_or(u32::MAX));
        self.scopes.push(Scope {
            kind,
            parent,
            children: Vec::new(),
            names: FxHashMap::default(),
        });
        if let Some(parent) = parent {
            self.scopes[parent.index()].children.push(id);
        }
        id
    }

    /// Open a child scope of `parent`.
    pub fn add_child(&mut self, parent: ScopeId, kind: ScopeKind) -> ScopeId {
        self.push_scope(Some(parent), kind)
    }

    pub fn get(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.index()]
    }

    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }

    /// Declare `name` in `scope`. Returns the existing symbol if the name is
    /// already declared in that same scope.
    pub fn declare(&mut self, scope: ScopeId, name: Name, symbol: SymbolId) -> Result<(), SymbolId> {
        let names = &mut self.scopes[scope.index()].names;
        if let Some(&existing) = names.get(&name) {
            return Err(existing);
        }
        names.insert(name, symbol);
        Ok(())
    }

    /// Look `name` up from `scope` outward.
    pub fn lookup(&self, scope: ScopeId, name: Name) -> Option<SymbolId> {
        self.ancestors(scope).find_map(|s| self.get(s).get(name))
    }

    /// `scope`, its parent, and so on up to the prelude.
    pub fn ancestors(&self, scope: ScopeId) -> impl Iterator<Item = ScopeId> + '_ {
        std::iter::successors(Some(scope), |s| self.get(*s).parent)
    }

    /// Every name visible from `scope`, innermost first. Shadowed names
    /// appear more than once.
    pub fn visible_names(&self, scope: ScopeId) -> impl Iterator<Item = Name> + '_ {
        self.ancestors(scope)
            .flat_map(|s| self.get(s).names.keys().copied())
    }
}

impl Default for ScopeTree {
    fn default() -> Self {
        Self::new()
    }
}
