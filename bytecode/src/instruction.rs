use core::fmt;
use std::borrow::Cow;

use crate::op::Op;

/// A symbolic jump target, rendered as `Label_<id>`.
///
/// Labels are plain tokens: uniqueness is the responsibility of whoever
/// hands them out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Label(u32);

impl Label {
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    pub const fn id(self) -> u32 {
        self.0
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Label_{}", self.0)
    }
}

/// Operand of `ldc`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Constant {
    Int(i32),
    String(String),
}

impl fmt::Display for Constant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constant::Int(value) => write!(f, "{value}"),
            Constant::String(text) => {
                f.write_str("\"")?;
                for ch in text.chars() {
                    match ch {
                        '"' => f.write_str("\\\"")?,
                        '\\' => f.write_str("\\\\")?,
                        '\n' => f.write_str("\\n")?,
                        '\t' => f.write_str("\\t")?,
                        '\r' => f.write_str("\\r")?,
                        c => write!(f, "{c}")?,
                    }
                }
                f.write_str("\"")
            }
        }
    }
}

/// Integer comparison used by `if_icmp<cond>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cond {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
}

impl Cond {
    pub const ALL: [Cond; 6] =
        [Cond::Eq, Cond::Ne, Cond::Gt, Cond::Ge, Cond::Lt, Cond::Le];

    /// Whether `lhs <cond> rhs` holds, `lhs` being the deeper operand.
    pub fn holds(self, lhs: i32, rhs: i32) -> bool {
        match self {
            Cond::Eq => lhs == rhs,
            Cond::Ne => lhs != rhs,
            Cond::Gt => lhs > rhs,
            Cond::Ge => lhs >= rhs,
            Cond::Lt => lhs < rhs,
            Cond::Le => lhs <= rhs,
        }
    }

    const fn op(self) -> Op {
        match self {
            Cond::Eq => Op::IfIcmpeq,
            Cond::Ne => Op::IfIcmpne,
            Cond::Gt => Op::IfIcmpgt,
            Cond::Ge => Op::IfIcmpge,
            Cond::Lt => Op::IfIcmplt,
            Cond::Le => Op::IfIcmple,
        }
    }
}

/// `class/name descriptor` of a method, as the assembler spells it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodRef {
    pub class: Cow<'static, str>,
    pub name: Cow<'static, str>,
    pub descriptor: Cow<'static, str>,
}

impl MethodRef {
    pub const fn builtin(
        class: &'static str,
        name: &'static str,
        descriptor: &'static str,
    ) -> Self {
        Self {
            class: Cow::Borrowed(class),
            name: Cow::Borrowed(name),
            descriptor: Cow::Borrowed(descriptor),
        }
    }

    pub fn new(
        class: impl Into<String>,
        name: impl Into<String>,
        descriptor: impl Into<String>,
    ) -> Self {
        Self {
            class: Cow::Owned(class.into()),
            name: Cow::Owned(name.into()),
            descriptor: Cow::Owned(descriptor.into()),
        }
    }

    /// Number of declared parameters (the receiver is not counted).
    pub fn arg_count(&self) -> usize {
        let params = self
            .descriptor
            .strip_prefix('(')
            .and_then(|rest| rest.split(')').next())
            .unwrap_or("");
        let mut count = 0;
        let mut chars = params.chars();
        while let Some(ch) = chars.next() {
            match ch {
                '[' => continue,
                'L' => {
                    for c in chars.by_ref() {
                        if c == ';' {
                            break;
                        }
                    }
                    count += 1;
                }
                _ => count += 1,
            }
        }
        count
    }

    /// `false` when the descriptor's return type is `V`.
    pub fn returns_value(&self) -> bool {
        !self.descriptor.ends_with(")V")
    }
}

impl fmt::Display for MethodRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}{}", self.class, self.name, self.descriptor)
    }
}

/// `class/name descriptor` of a static field.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldRef {
    pub class: Cow<'static, str>,
    pub name: Cow<'static, str>,
    pub descriptor: Cow<'static, str>,
}

impl FieldRef {
    pub const fn builtin(
        class: &'static str,
        name: &'static str,
        descriptor: &'static str,
    ) -> Self {
        Self {
            class: Cow::Borrowed(class),
            name: Cow::Borrowed(name),
            descriptor: Cow::Borrowed(descriptor),
        }
    }
}

impl fmt::Display for FieldRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{} {}", self.class, self.name, self.descriptor)
    }
}

/// One line of a method body: an instruction with its operands, or the
/// definition site of a [`Label`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instruction {
    Aload { slot: u16 },
    Astore { slot: u16 },
    Ldc(Constant),
    Iconst0,
    New { class: Cow<'static, str> },
    Dup,
    Pop,
    Swap,
    Checkcast { class: Cow<'static, str> },
    Getstatic(FieldRef),
    Invokevirtual(MethodRef),
    Invokespecial(MethodRef),
    Invokestatic(MethodRef),
    Iadd,
    Isub,
    Imul,
    Idiv,
    Irem,
    Ineg,
    Ixor,
    Goto(Label),
    Ifeq(Label),
    Ifne(Label),
    IfIcmp { cond: Cond, target: Label },
    IfAcmp { equal: bool, target: Label },
    /// Binds a label to the position of the next instruction.
    Label(Label),
    Return,
    Areturn,
}

impl Instruction {
    /// The opcode, or `None` for a label definition.
    pub fn op(&self) -> Option<Op> {
        let op = match self {
            Self::Aload { .. } => Op::Aload,
            Self::Astore { .. } => Op::Astore,
            Self::Ldc(_) => Op::Ldc,
            Self::Iconst0 => Op::Iconst0,
            Self::New { .. } => Op::New,
            Self::Dup => Op::Dup,
            Self::Pop => Op::Pop,
            Self::Swap => Op::Swap,
            Self::Checkcast { .. } => Op::Checkcast,
            Self::Getstatic(_) => Op::Getstatic,
            Self::Invokevirtual(_) => Op::Invokevirtual,
            Self::Invokespecial(_) => Op::Invokespecial,
            Self::Invokestatic(_) => Op::Invokestatic,
            Self::Iadd => Op::Iadd,
            Self::Isub => Op::Isub,
            Self::Imul => Op::Imul,
            Self::Idiv => Op::Idiv,
            Self::Irem => Op::Irem,
            Self::Ineg => Op::Ineg,
            Self::Ixor => Op::Ixor,
            Self::Goto(_) => Op::Goto,
            Self::Ifeq(_) => Op::Ifeq,
            Self::Ifne(_) => Op::Ifne,
            Self::IfIcmp { cond, .. } => cond.op(),
            Self::IfAcmp { equal: true, .. } => Op::IfAcmpeq,
            Self::IfAcmp { equal: false, .. } => Op::IfAcmpne,
            Self::Label(_) => return None,
            Self::Return => Op::Return,
            Self::Areturn => Op::Areturn,
        };
        Some(op)
    }

    pub fn is_return(&self) -> bool {
        self.op().is_some_and(Op::is_return)
    }

    /// Label referenced by a jump, if this is one.
    pub fn branch_target(&self) -> Option<Label> {
        match self {
            Self::Goto(target)
            | Self::Ifeq(target)
            | Self::Ifne(target)
            | Self::IfIcmp { target, .. }
            | Self::IfAcmp { target, .. } => Some(*target),
            _ => None,
        }
    }

    /// `true` if control never falls through to the next instruction.
    pub fn ends_block(&self) -> bool {
        matches!(self, Self::Goto(_) | Self::Return | Self::Areturn)
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mnemonic = self.op().map(Op::mnemonic).unwrap_or_default();
        match self {
            Self::Label(label) => write!(f, "{label}:"),
            Self::Aload { slot: 0 } => write!(f, "aload_0"),
            Self::Aload { slot } | Self::Astore { slot } => {
                write!(f, "{mnemonic} {slot}")
            }
            Self::Ldc(constant) => write!(f, "{mnemonic} {constant}"),
            Self::New { class } | Self::Checkcast { class } => {
                write!(f, "{mnemonic} {class}")
            }
            Self::Getstatic(field) => write!(f, "{mnemonic} {field}"),
            Self::Invokevirtual(method)
            | Self::Invokespecial(method)
            | Self::Invokestatic(method) => write!(f, "{mnemonic} {method}"),
            Self::Goto(target)
            | Self::Ifeq(target)
            | Self::Ifne(target)
            | Self::IfIcmp { target, .. }
            | Self::IfAcmp { target, .. } => write!(f, "{mnemonic} {target}"),
            _ => f.write_str(mnemonic),
        }
    }
}
