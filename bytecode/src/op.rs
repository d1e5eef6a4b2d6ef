/// Assembler mnemonics.
///
/// Only the subset that code generation emits is modelled. Operands live on
/// [`Instruction`](crate::Instruction); `Op` is the bare opcode and owns the
/// textual spelling expected by the downstream assembler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    /// Load a reference from a local slot.
    /// Operands: `slot`
    Aload,

    /// Store the reference on top of the stack into a local slot.
    /// Operands: `slot`
    Astore,

    /// Push a constant (integer or string) from the constant pool.
    /// Operands: `constant`
    Ldc,

    /// Push the raw integer `0`.
    Iconst0,

    /// Allocate an uninitialized object. Operands: `class`
    New,

    Dup,
    Pop,
    Swap,

    /// Downcast the reference on top of the stack, failing at runtime if it
    /// is not an instance of `class`.
    /// Operands: `class`
    Checkcast,

    /// Push a static field. Operands: `field`
    Getstatic,

    /// Operands: `method`
    Invokevirtual,

    /// Constructor call. Operands: `method`
    Invokespecial,

    /// Operands: `method`
    Invokestatic,

    Iadd,
    Isub,
    Imul,
    Idiv,
    Irem,
    Ineg,
    Ixor,

    /// Unconditional jump. Operands: `target`
    Goto,

    /// Pop one raw integer, jump if it is zero.
    Ifeq,
    /// Pop one raw integer, jump if it is non-zero.
    Ifne,

    /// Pop two raw integers and jump when the comparison holds.
    IfIcmpeq,
    IfIcmpne,
    IfIcmpgt,
    IfIcmpge,
    IfIcmplt,
    IfIcmple,

    /// Pop two references and jump on identity (in)equality.
    IfAcmpeq,
    IfAcmpne,

    /// Void return.
    Return,

    /// Return the reference on top of the stack.
    Areturn,
}

impl Op {
    pub const fn mnemonic(self) -> &'static str {
        match self {
            Op::Aload => "aload",
            Op::Astore => "astore",
            Op::Ldc => "ldc",
            Op::Iconst0 => "iconst_0",
            Op::New => "new",
            Op::Dup => "dup",
            Op::Pop => "pop",
            Op::Swap => "swap",
            Op::Checkcast => "checkcast",
            Op::Getstatic => "getstatic",
            Op::Invokevirtual => "invokevirtual",
            Op::Invokespecial => "invokespecial",
            Op::Invokestatic => "invokestatic",
            Op::Iadd => "iadd",
            Op::Isub => "isub",
            Op::Imul => "imul",
            Op::Idiv => "idiv",
            Op::Irem => "irem",
            Op::Ineg => "ineg",
            Op::Ixor => "ixor",
            Op::Goto => "goto",
            Op::Ifeq => "ifeq",
            Op::Ifne => "ifne",
            Op::IfIcmpeq => "if_icmpeq",
            Op::IfIcmpne => "if_icmpne",
            Op::IfIcmpgt => "if_icmpgt",
            Op::IfIcmpge => "if_icmpge",
            Op::IfIcmplt => "if_icmplt",
            Op::IfIcmple => "if_icmple",
            Op::IfAcmpeq => "if_acmpeq",
            Op::IfAcmpne => "if_acmpne",
            Op::Return => "return",
            Op::Areturn => "areturn",
        }
    }

    /// `true` for both void and value returns.
    pub const fn is_return(self) -> bool {
        matches!(self, Op::Return | Op::Areturn)
    }
}
