//!
//! # Hierarchy Flattening
//!
//! Enumerates every root-to-leaf placement path through a [Library]'s reference hierarchy.
//!
//! A depth-first walk first produces a bracketed token sequence, in which each visited structure
//! opens before, and closes after, all structures it references.
//! Decoding that sequence with a push/pop stack yields one path per leaf,
//! i.e. per open token immediately followed by its own close.
//! Consecutive paths through identical structures merge into a single [HierarchyBranch].
//!

// Std-Lib
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

// Crates.io
use log::debug;
use serde::{Deserialize, Serialize};

// Local imports
use crate::error::{ErrorContext, LayoutError, LayoutResult};
use crate::library::Library;
use crate::utils::{DepOrder, DepOrderer, ErrorHelper};

///
/// # Access Code
///
/// How one level of a placement path is reached from its parent.
///
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AccessCode {
    /// The root structure, by index
    Root(usize),
    /// Single reference, by index into its parent's `srefs`
    Single(usize),
    /// Array reference, by index into its parent's `arefs`
    Array(usize),
}
impl AccessCode {
    /// Signed integer encoding: single references as `+(index + 1)`,
    /// array references as `-(index + 1)`, and the root as its own structure index.
    pub fn code(&self) -> i64 {
        match self {
            Self::Root(i) => *i as i64,
            Self::Single(i) => *i as i64 + 1,
            Self::Array(i) => -(*i as i64 + 1),
        }
    }
}

///
/// # Hierarchy Branch
///
/// Structure-index path from the root to a leaf,
/// and the access codes of each consecutive placement sharing it.
///
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HierarchyBranch {
    pub structures: Vec<usize>,
    pub access: Vec<Vec<AccessCode>>,
}
impl HierarchyBranch {
    /// Number of merged placement paths.
    /// An array reference is a single path; see [HierarchyBranch::element_count] for its elements.
    pub fn repeat(&self) -> usize {
        self.access.len()
    }
    /// Number of leaf placements, including every array element along each path
    pub fn element_count(&self, lib: &Library) -> LayoutResult<u64> {
        let mut total = 0;
        for path in self.access.iter() {
            let mut count = 1u64;
            for (level, code) in path.iter().enumerate().skip(1) {
                if let AccessCode::Array(i) = code {
                    let parent = &lib.structs[self.structures[level - 1]];
                    let aref = parent.arefs.get(*i).ok_or_else(|| {
                        LayoutError::input(format!("Invalid array reference index {}", i))
                            .context(ErrorContext::Structure(parent.name.clone()))
                    })?;
                    aref.validate()?;
                    count *= aref.cols as u64 * aref.rows as u64;
                }
            }
            total += count;
        }
        Ok(total)
    }
}

/// Structure node in the reference graph, compared by index alone
#[derive(Debug, Clone, Copy)]
struct Node<'g> {
    idx: usize,
    graph: &'g [Vec<(usize, AccessCode)>],
}
impl PartialEq for Node<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.idx == other.idx
    }
}
impl Eq for Node<'_> {}
impl Hash for Node<'_> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.idx.hash(state);
    }
}

/// Dependency ordering of the reference graph, failing with the index of a structure on any cycle
struct RefOrder<'g>(PhantomData<&'g ()>);
impl<'g> DepOrder for RefOrder<'g> {
    type Item = Node<'g>;
    type Error = usize;

    fn process(item: &Node<'g>, orderer: &mut DepOrderer<Self>) -> Result<(), usize> {
        for (child, _) in item.graph[item.idx].iter() {
            orderer.push(&Node {
                idx: *child,
                graph: item.graph,
            })?;
        }
        Ok(())
    }
    fn fail(item: &Node<'g>) -> usize {
        item.idx
    }
}

/// Bracketed traversal token
#[derive(Debug, Clone, Copy)]
enum Token {
    Open(usize, AccessCode),
    Close,
}

///
/// # Hierarchy Flattener
///
/// Resolves references by name, rejects undefined and cyclic references,
/// and enumerates the placement paths below a root structure.
///
pub struct Flattener<'lib> {
    lib: &'lib Library,
    /// Children of each structure: single references first, then arrays
    graph: Vec<Vec<(usize, AccessCode)>>,
    ctx: Vec<ErrorContext>,
}
impl<'lib> Flattener<'lib> {
    /// Resolve all references in `lib`. Fails on duplicate names or undefined references.
    pub fn new(lib: &'lib Library) -> LayoutResult<Self> {
        let mut this = Self {
            lib,
            graph: Vec::with_capacity(lib.structs.len()),
            ctx: vec![ErrorContext::Library(lib.name.clone())],
        };
        let index = lib.index()?;
        for s in lib.structs.iter() {
            this.ctx.push(ErrorContext::Structure(s.name.clone()));
            let mut children = Vec::with_capacity(s.srefs.len() + s.arefs.len());
            for (i, sref) in s.srefs.iter().enumerate() {
                this.ctx.push(ErrorContext::StructRef(sref.name.clone()));
                let idx = this.resolve(&index, &sref.name)?;
                children.push((idx, AccessCode::Single(i)));
                this.ctx.pop();
            }
            for (i, aref) in s.arefs.iter().enumerate() {
                this.ctx.push(ErrorContext::ArrayRef(aref.name.clone()));
                let idx = this.resolve(&index, &aref.name)?;
                children.push((idx, AccessCode::Array(i)));
                this.ctx.pop();
            }
            this.graph.push(children);
            this.ctx.pop();
        }
        Ok(this)
    }
    fn resolve(&self, index: &HashMap<&str, usize>, name: &str) -> LayoutResult<usize> {
        self.unwrap(
            index.get(name).copied(),
            format!("Reference to undefined structure {}", name),
        )
    }
    /// Enumerate the branches below the structure named `root`
    pub fn flatten(&mut self, root: &str) -> LayoutResult<Vec<HierarchyBranch>> {
        let root_idx = match self.lib.structs.iter().position(|s| s.name == root) {
            Some(idx) => idx,
            None => return self.fail(format!("Root structure {} not found", root)),
        };
        self.ctx.push(ErrorContext::Structure(root.to_string()));
        let root_node = Node {
            idx: root_idx,
            graph: &self.graph,
        };
        if let Err(idx) = RefOrder::order(&[root_node]) {
            let name = self.lib.structs[idx].name.clone();
            return self.fail(format!("Cyclic reference through structure {}", name));
        }
        let tokens = self.tokens(root_idx);
        let branches = decode(&tokens);
        self.ctx.pop();
        debug!(
            "Flattened {} into {} branches from {} tokens",
            root,
            branches.len(),
            tokens.len()
        );
        Ok(branches)
    }
    /// Bracketed depth-first token sequence below `root`
    fn tokens(&self, root: usize) -> Vec<Token> {
        let mut rv = Vec::new();
        let mut stack = vec![Token::Open(root, AccessCode::Root(root))];
        while let Some(tok) = stack.pop() {
            rv.push(tok);
            if let Token::Open(idx, _) = tok {
                stack.push(Token::Close);
                for (child, code) in self.graph[idx].iter().rev() {
                    stack.push(Token::Open(*child, *code));
                }
            }
        }
        rv
    }
}
impl ErrorHelper for Flattener<'_> {
    type Error = LayoutError;
    fn err(&self, msg: impl Into<String>) -> LayoutError {
        LayoutError::Input {
            message: msg.into(),
            stack: self.ctx.clone(),
        }
    }
}

/// Decode a bracketed token sequence into leaf paths, merging consecutive identical paths
fn decode(tokens: &[Token]) -> Vec<HierarchyBranch> {
    let mut rv: Vec<HierarchyBranch> = Vec::new();
    let mut structures = Vec::new();
    let mut access = Vec::new();
    let mut forward = false;
    for tok in tokens.iter() {
        match tok {
            Token::Open(idx, code) => {
                structures.push(*idx);
                access.push(*code);
                forward = true;
            }
            Token::Close => {
                if forward {
                    match rv.last_mut() {
                        Some(last) if last.structures == structures => {
                            last.access.push(access.clone());
                        }
                        _ => {
                            rv.push(HierarchyBranch {
                                structures: structures.clone(),
                                access: vec![access.clone()],
                            });
                        }
                    }
                }
                forward = false;
                structures.pop();
                access.pop();
            }
        }
    }
    rv
}

/// Enumerate the branches below structure `root` of `lib`
pub fn flatten(lib: &Library, root: &str) -> LayoutResult<Vec<HierarchyBranch>> {
    Flattener::new(lib)?.flatten(root)
}
