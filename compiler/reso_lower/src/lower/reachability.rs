//! Reachability: dead statements, return coverage and block sealing.
//!
//! The insertion point is *dead* once its block is terminated or cannot be
//! reached from the entry block. Lowering skips dead statements instead of
//! emitting into orphan blocks, so a function body never needs a separate
//! dead-code pass.

use reso_ir::Span;
use reso_llir::{BlockId, Function, IrBuilder};
use smallvec::SmallVec;
use tracing::{trace, warn};

use super::errors;
use super::Lowerer;

/// Blocks of `func` reachable from its entry block, in index order.
pub fn reachable_blocks(func: &Function) -> Vec<BlockId> {
    let successors: Vec<SmallVec<[BlockId; 2]>> = func
        .blocks
        .iter()
        .map(|b| b.terminator.map(|t| t.successors()).unwrap_or_default())
        .collect();
    let seen = reachable_set(&successors);
    func.block_ids().filter(|b| seen[b.index()]).collect()
}

/// Depth-first walk from the entry block over `successors`.
fn reachable_set(successors: &[SmallVec<[BlockId; 2]>]) -> Vec<bool> {
    let mut seen = vec![false; successors.len()];
    if successors.is_empty() {
        return seen;
    }
    let mut stack = vec![BlockId::ENTRY];
    seen[BlockId::ENTRY.index()] = true;
    while let Some(block) = stack.pop() {
        for &succ in &successors[block.index()] {
            if let Some(flag) = seen.get_mut(succ.index()) {
                if !*flag {
                    *flag = true;
                    stack.push(succ);
                }
            }
        }
    }
    seen
}

/// Reachable set of the function under construction.
///
/// Edges only appear when a terminator is set, so the set is recomputed
/// only after the builder's terminator count moves. Blocks created since
/// the last walk have no incoming edges yet and are unreachable.
#[derive(Default, Debug)]
pub(crate) struct ReachCache {
    terminators: Option<usize>,
    seen: Vec<bool>,
}

impl ReachCache {
    fn is_reachable(&mut self, builder: &IrBuilder<'_>, block: BlockId) -> bool {
        let count = builder.terminator_count();
        if self.terminators != Some(count) {
            self.seen = reachable_set(&builder.successor_lists());
            self.terminators = Some(count);
        }
        self.seen.get(block.index()).copied().unwrap_or(false)
    }
}

impl Lowerer<'_> {
    /// Whether code emitted now could never run.
    pub(crate) fn position_is_dead(&mut self) -> bool {
        let Some(block) = self.builder.current_block() else {
            return true;
        };
        if self.builder.block_has_terminator(block) {
            return true;
        }
        block != BlockId::ENTRY && !self.reach.is_reachable(&self.builder, block)
    }

    /// Close the body: synthesize the implicit unit return or report missing
    /// coverage, then seal every block still lacking a terminator.
    pub(crate) fn finish_body(&mut self, span: Span) {
        if !self.position_is_dead() {
            if self.ret_ty.is_unit() {
                self.builder.ret_void();
            } else {
                let ty = self.show(&self.ret_ty);
                self.report(errors::missing_return(span, self.fn_name, &ty));
                self.builder.unreachable();
            }
        }

        let seen = reachable_set(&self.builder.successor_lists());
        let func = self.builder.function_id();
        let blocks: Vec<BlockId> = self.builder.module().function(func).block_ids().collect();
        for block in blocks {
            if !self.builder.seal_unterminated(block) {
                continue;
            }
            if seen[block.index()] {
                warn!(function = self.fn_name, ?block, "sealed reachable block without terminator");
            } else {
                trace!(function = self.fn_name, ?block, "sealed dead block");
            }
        }
    }
}
