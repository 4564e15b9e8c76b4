//! The scope chain: which declarations the checker is currently inside.
//!
//! A reference is only meaningful if its target encloses the analysis
//! point -- a `break` needs its loop, a `return` its function, a variable
//! its declaring body. The chain records the declarations entered on the
//! current recursion path.
//!
//! The chain is an immutable copy-on-push linked list of stack-allocated
//! nodes, threaded by value through the recursion. There is no pop:
//! leaving a child call restores the parent chain automatically, on every
//! exit path, so sibling checks can never observe a corrupted stack.

use lark_ir::decl::{ClassId, DeclRef, EnumEntryId, FunctionId, LoopId};

/// One entry on the chain, compared by declaration identity.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ScopeItem {
    Function(FunctionId),
    Class(ClassId),
    Loop(LoopId),
    /// An enum entry whose initializer is being analyzed; guards against
    /// self-referential initializers.
    EnumEntry(EnumEntryId),
}

impl ScopeItem {
    /// The chain item corresponding to a declaration container, if that
    /// container can appear on the chain.
    pub fn from_decl(decl: DeclRef) -> Option<ScopeItem> {
        match decl {
            DeclRef::Function(f) => Some(ScopeItem::Function(f)),
            DeclRef::Class(c) => Some(ScopeItem::Class(c)),
            DeclRef::File => None,
        }
    }
}

/// A link in the chain. Lives on the checker's call stack; the chain
/// borrows it for the duration of the child recursion.
#[derive(Copy, Clone, Debug)]
pub struct ScopeNode<'a> {
    item: ScopeItem,
    parent: ScopeChain<'a>,
}

impl<'a> ScopeNode<'a> {
    /// The chain formed by this node and everything behind it.
    pub fn chain(&self) -> ScopeChain<'_> {
        ScopeChain {
            head: Some(self),
        }
    }
}

/// An immutable view of the entered scopes, cheap to copy.
#[derive(Copy, Clone, Debug, Default)]
pub struct ScopeChain<'a> {
    head: Option<&'a ScopeNode<'a>>,
}

impl<'a> ScopeChain<'a> {
    /// The empty chain.
    pub fn empty() -> ScopeChain<'static> {
        ScopeChain { head: None }
    }

    /// A new head node for this chain. Bind the node to a local, then use
    /// [`ScopeNode::chain`] for the extended chain.
    pub fn entered(self, item: ScopeItem) -> ScopeNode<'a> {
        ScopeNode { item, parent: self }
    }

    /// Whether `item` is on the chain.
    pub fn contains(&self, item: ScopeItem) -> bool {
        let mut current = self.head;
        while let Some(node) = current {
            if node.item == item {
                return true;
            }
            current = node.parent.head;
        }
        false
    }

    /// Whether the declaration container is on the chain. `File` is never
    /// on the chain.
    pub fn contains_decl(&self, decl: DeclRef) -> bool {
        ScopeItem::from_decl(decl).is_some_and(|item| self.contains(item))
    }

    /// Number of entries, for diagnostics and tests.
    pub fn depth(&self) -> usize {
        let mut depth = 0;
        let mut current = self.head;
        while let Some(node) = current {
            depth += 1;
            current = node.parent.head;
        }
        depth
    }
}
