//! Operand-stack depth analysis over a flat instruction sequence.
//!
//! Walks every reachable path, checking that no instruction underflows the
//! stack and that all paths reaching the same position agree on its depth.

use std::collections::HashMap;

use thiserror::Error;

use crate::instruction::{Instruction, Label};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StackError {
    #[error("stack underflow at instruction {at}")]
    Underflow { at: usize },
    #[error(
        "inconsistent stack depth at instruction {at}: {expected} vs {found}"
    )]
    Mismatch { at: usize, expected: u16, found: u16 },
    #[error("jump to undefined {0}")]
    UnknownLabel(Label),
    #[error("{0} is defined more than once")]
    DuplicateLabel(Label),
}

/// Result of [`analyze`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackProfile {
    /// Depth on entry to each instruction; `None` when unreachable.
    pub depths: Vec<Option<u16>>,
    /// Depth when control falls off the end of the sequence, if it can.
    pub exit_depth: Option<u16>,
    pub max_depth: u16,
}

/// `(pops, pushes)` of a single instruction.
pub fn effect(instruction: &Instruction) -> (u16, u16) {
    match instruction {
        Instruction::Aload { .. }
        | Instruction::Ldc(_)
        | Instruction::Iconst0
        | Instruction::New { .. }
        | Instruction::Getstatic(_) => (0, 1),
        Instruction::Astore { .. }
        | Instruction::Pop
        | Instruction::Ifeq(_)
        | Instruction::Ifne(_)
        | Instruction::Areturn => (1, 0),
        Instruction::Dup => (1, 2),
        Instruction::Swap => (2, 2),
        Instruction::Checkcast { .. } | Instruction::Ineg => (1, 1),
        Instruction::Iadd
        | Instruction::Isub
        | Instruction::Imul
        | Instruction::Idiv
        | Instruction::Irem
        | Instruction::Ixor => (2, 1),
        Instruction::IfIcmp { .. } | Instruction::IfAcmp { .. } => (2, 0),
        Instruction::Invokevirtual(m) | Instruction::Invokespecial(m) => {
            (m.arg_count() as u16 + 1, m.returns_value() as u16)
        }
        Instruction::Invokestatic(m) => {
            (m.arg_count() as u16, m.returns_value() as u16)
        }
        Instruction::Goto(_) | Instruction::Label(_) | Instruction::Return => {
            (0, 0)
        }
    }
}

/// Label definition sites, by position.
pub fn label_positions(
    code: &[Instruction],
) -> Result<HashMap<Label, usize>, StackError> {
    let mut positions = HashMap::new();
    for (idx, instruction) in code.iter().enumerate() {
        if let Instruction::Label(label) = instruction {
            if positions.insert(*label, idx).is_some() {
                return Err(StackError::DuplicateLabel(*label));
            }
        }
    }
    Ok(positions)
}

pub fn analyze(code: &[Instruction]) -> Result<StackProfile, StackError> {
    let labels = label_positions(code)?;
    let mut depths: Vec<Option<u16>> = vec![None; code.len() + 1];
    let mut worklist = vec![(0usize, 0u16)];
    let mut max_depth = 0;

    while let Some((at, depth)) = worklist.pop() {
        match depths[at] {
            Some(seen) if seen == depth => continue,
            Some(seen) => {
                return Err(StackError::Mismatch {
                    at,
                    expected: seen,
                    found: depth,
                });
            }
            None => depths[at] = Some(depth),
        }
        let Some(instruction) = code.get(at) else {
            continue;
        };

        let (pops, pushes) = effect(instruction);
        if depth < pops {
            return Err(StackError::Underflow { at });
        }
        let after = depth - pops + pushes;
        max_depth = max_depth.max(after).max(depth);

        if let Some(target) = instruction.branch_target() {
            let dest = *labels
                .get(&target)
                .ok_or(StackError::UnknownLabel(target))?;
            worklist.push((dest, after));
        }
        if !instruction.ends_block() {
            worklist.push((at + 1, after));
        }
    }

    let exit_depth = depths.pop().flatten();
    Ok(StackProfile {
        depths,
        exit_depth,
        max_depth,
    })
}
