//! Control-flow graph and dominator tree
//!
//! Edges come from block terminators and are recomputed on demand, never
//! cached in the blocks. Dominators use the iterative Cooper-Harvey-Kennedy
//! algorithm over reverse post-order.

use crate::function::FunctionData;
use crate::module::Module;
use crate::values::{BlockId, FuncId};

impl Module {
    /// Targets of `block`'s terminator, in operand order
    pub fn successors(&self, block: BlockId) -> Vec<BlockId> {
        self.function(block.func())
            .and_then(|func| func.terminator(block))
            .map(|term| term.kind().successors())
            .unwrap_or_default()
    }

    /// Blocks whose terminator targets `block`, in layout order, without duplicates
    pub fn predecessors(&self, block: BlockId) -> Vec<BlockId> {
        let Some(func) = self.function(block.func()) else {
            return Vec::new();
        };
        func.block_ids()
            .filter(|&pred| {
                func.terminator(pred)
                    .is_some_and(|term| term.kind().successors().contains(&block))
            })
            .collect()
    }
}

/// Successor and predecessor lists of one function, indexed by block position
#[derive(Debug, Clone)]
pub struct ControlFlowGraph {
    func: FuncId,
    succs: Vec<Vec<usize>>,
    preds: Vec<Vec<usize>>,
}

impl ControlFlowGraph {
    /// Build the graph; targets outside the function are ignored
    pub fn compute(func: &FunctionData) -> Self {
        let count = func.block_count();
        let mut succs = vec![Vec::new(); count];
        let mut preds = vec![Vec::new(); count];

        for block in func.block_ids() {
            let Some(term) = func.terminator(block) else { continue };
            for target in term.kind().successors() {
                if target.func() != func.id() || target.index() >= count {
                    continue;
                }
                let (from, to) = (block.index(), target.index());
                if !succs[from].contains(&to) {
                    succs[from].push(to);
                }
                if !preds[to].contains(&from) {
                    preds[to].push(from);
                }
            }
        }

        Self {
            func: func.id(),
            succs,
            preds,
        }
    }

    fn block_id(&self, index: usize) -> BlockId {
        BlockId {
            func: self.func,
            index: index as u32,
        }
    }

    pub fn len(&self) -> usize {
        self.succs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.succs.is_empty()
    }

    pub fn successors(&self, block: BlockId) -> Vec<BlockId> {
        self.succs
            .get(block.index())
            .map(|list| list.iter().map(|&i| self.block_id(i)).collect())
            .unwrap_or_default()
    }

    pub fn predecessors(&self, block: BlockId) -> Vec<BlockId> {
        self.preds
            .get(block.index())
            .map(|list| list.iter().map(|&i| self.block_id(i)).collect())
            .unwrap_or_default()
    }
}

/// Immediate dominators of the blocks reachable from the entry
#[derive(Debug, Clone)]
pub struct DominatorTree {
    cfg: ControlFlowGraph,
    rpo: Vec<usize>,
    rpo_index: Vec<Option<usize>>,
    idom: Vec<Option<usize>>,
}

impl DominatorTree {
    pub fn compute(cfg: ControlFlowGraph) -> Self {
        let count = cfg.len();
        let rpo = if count == 0 { Vec::new() } else { reverse_post_order(&cfg.succs, 0) };

        let mut rpo_index = vec![None; count];
        for (position, &block) in rpo.iter().enumerate() {
            rpo_index[block] = Some(position);
        }

        let mut idom = vec![None; count];
        if let Some(&entry) = rpo.first() {
            idom[entry] = Some(entry);
        }

        let mut changed = true;
        while changed {
            changed = false;
            for &block in rpo.iter().skip(1) {
                let mut new_idom = None;
                for &pred in &cfg.preds[block] {
                    if idom[pred].is_none() {
                        continue;
                    }
                    new_idom = Some(match new_idom {
                        None => pred,
                        Some(current) => intersect(pred, current, &idom, &rpo_index),
                    });
                }
                if new_idom.is_some() && idom[block] != new_idom {
                    idom[block] = new_idom;
                    changed = true;
                }
            }
        }

        Self {
            cfg,
            rpo,
            rpo_index,
            idom,
        }
    }

    pub fn cfg(&self) -> &ControlFlowGraph {
        &self.cfg
    }

    pub fn is_reachable(&self, block: BlockId) -> bool {
        self.rpo_index.get(block.index()).copied().flatten().is_some()
    }

    /// Reachable blocks in reverse post-order, entry first
    pub fn reverse_post_order(&self) -> Vec<BlockId> {
        self.rpo.iter().map(|&i| self.cfg.block_id(i)).collect()
    }

    /// Immediate dominator; the entry is its own idom
    pub fn idom(&self, block: BlockId) -> Option<BlockId> {
        self.idom
            .get(block.index())
            .copied()
            .flatten()
            .map(|i| self.cfg.block_id(i))
    }

    /// Whether every path from the entry to `block` passes through `dom`
    pub fn dominates(&self, dom: BlockId, block: BlockId) -> bool {
        if !self.is_reachable(dom) || !self.is_reachable(block) {
            return false;
        }
        let target = dom.index();
        let mut current = block.index();
        loop {
            if current == target {
                return true;
            }
            match self.idom[current] {
                Some(parent) if parent != current => current = parent,
                _ => return false,
            }
        }
    }
}

fn reverse_post_order(succs: &[Vec<usize>], root: usize) -> Vec<usize> {
    let mut order = Vec::with_capacity(succs.len());
    let mut seen = vec![false; succs.len()];
    let mut stack = vec![(root, false)];

    while let Some((block, expanded)) = stack.pop() {
        if expanded {
            order.push(block);
            continue;
        }
        if seen[block] {
            continue;
        }
        seen[block] = true;
        stack.push((block, true));
        // Reversed so the first successor is visited first
        for &child in succs[block].iter().rev() {
            if !seen[child] {
                stack.push((child, false));
            }
        }
    }

    order.reverse();
    order
}

fn intersect(mut lhs: usize, mut rhs: usize, idom: &[Option<usize>], rpo_index: &[Option<usize>]) -> usize {
    let position = |b: usize| rpo_index[b].unwrap_or(usize::MAX);
    while lhs != rhs {
        while position(lhs) > position(rhs) {
            match idom[lhs] {
                Some(parent) => lhs = parent,
                None => return rhs,
            }
        }
        while position(rhs) > position(lhs) {
            match idom[rhs] {
                Some(parent) => rhs = parent,
                None => return lhs,
            }
        }
    }
    lhs
}
