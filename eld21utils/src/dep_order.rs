//!
//! # Reference-Graph Ordering
//!
//! Layout libraries form a graph of structures referencing other structures.
//! Flattening requires that graph to be acyclic. [DepOrder] lists the graph's
//! nodes children-first, and reports the first node found to sit on a cycle.
//!

// Std-Lib
use std::collections::HashMap;
use std::hash::Hash;
use std::marker::PhantomData;

///
/// # Dependency-Ordering Trait
///
/// Implementers provide `process`, which pushes each direct dependency of `item`
/// onto the [DepOrderer], and `fail`, which builds the error reported when
/// `item` is reached again while its own dependencies are still being visited.
///
/// ```text
/// struct StructOrder;
/// impl DepOrder for StructOrder {
///     type Item = usize;
///     type Error = usize;
///     fn process(item: &usize, orderer: &mut DepOrderer<Self>) -> Result<(), usize> {
///         for child in children(*item) {
///             orderer.push(&child)?;
///         }
///         Ok(())
///     }
///     fn fail(item: &usize) -> usize {
///         *item
///     }
/// }
/// ```
///
pub trait DepOrder: Sized {
    /// Graph node, typically an index or key
    type Item: Clone + Eq + Hash;
    type Error;

    /// Order `items` and everything they depend on, dependencies first
    fn order(items: &[Self::Item]) -> Result<Vec<Self::Item>, Self::Error> {
        DepOrderer::<Self>::order(items)
    }
    /// Push each direct dependency of `item` onto `orderer`
    fn process(item: &Self::Item, orderer: &mut DepOrderer<Self>) -> Result<(), Self::Error>;
    /// Error for a cycle reaching `item`
    fn fail(item: &Self::Item) -> Self::Error;
}

/// Visit state of a node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    /// Dependencies are being visited
    Open,
    /// Node and its dependencies are ordered
    Done,
}

/// # Depth-First Ordering State
/// Passed to [DepOrder::process] implementations.
pub struct DepOrderer<P: DepOrder> {
    ordered: Vec<P::Item>,
    marks: HashMap<P::Item, Mark>,
    _order: PhantomData<P>,
}
impl<P: DepOrder> DepOrderer<P> {
    /// Order `items` and everything they depend on, dependencies first
    pub fn order(items: &[P::Item]) -> Result<Vec<P::Item>, P::Error> {
        let mut orderer = Self {
            ordered: Vec::with_capacity(items.len()),
            marks: HashMap::with_capacity(items.len()),
            _order: PhantomData,
        };
        items.iter().try_for_each(|item| orderer.push(item))?;
        Ok(orderer.ordered)
    }
    /// Visit `item`: order its dependencies, then append it
    pub fn push(&mut self, item: &P::Item) -> Result<(), P::Error> {
        match self.marks.get(item) {
            Some(Mark::Done) => return Ok(()),
            Some(Mark::Open) => return Err(P::fail(item)),
            None => (),
        }
        self.marks.insert(item.clone(), Mark::Open);
        P::process(item, self)?;
        self.marks.insert(item.clone(), Mark::Done);
        self.ordered.push(item.clone());
        Ok(())
    }
}
