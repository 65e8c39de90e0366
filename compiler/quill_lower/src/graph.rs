//! CFG queries.

use crate::ir::{BlockId, IrFunction};

/// Blocks reachable from the entry, in block order.
///
/// Lowering leaves behind blocks nothing jumps to (code after a `return`,
/// the merge block of an `if` whose branches both return); code
/// generation skips them.
pub fn reachable_blocks(func: &IrFunction) -> Vec<BlockId> {
    let mut seen = vec![false; func.blocks.len()];
    let mut stack = vec![func.entry];
    while let Some(block) = stack.pop() {
        if std::mem::replace(&mut seen[block.index()], true) {
            continue;
        }
        stack.extend(func.block(block).terminator.successors());
    }
    seen.iter()
        .enumerate()
        .filter(|(_, &reached)| reached)
        .map(|(i, _)| BlockId::new(i as u32))
        .collect()
}

