//! Names and descriptors of everything emitted code links against, and
//! the type-directed boxing helpers built on them.

use bytecode::{CodeBuilder, FieldRef, MethodRef};
use syntax::Type;

pub const OBJECT: &str = "java/lang/Object";
pub const INTEGER: &str = "java/lang/Integer";
pub const BOOLEAN: &str = "java/lang/Boolean";
pub const STRING: &str = "java/lang/String";
pub const ARRAY_LIST: &str = "java/util/ArrayList";
pub const LIST: &str = "List";
pub const FPTR: &str = "Fptr";

pub const OBJECT_INIT: MethodRef = MethodRef::builtin(OBJECT, "<init>", "()V");

pub const INTEGER_VALUE_OF: MethodRef =
    MethodRef::builtin(INTEGER, "valueOf", "(I)Ljava/lang/Integer;");
pub const BOOLEAN_VALUE_OF: MethodRef =
    MethodRef::builtin(BOOLEAN, "valueOf", "(Z)Ljava/lang/Boolean;");
pub const INT_VALUE: MethodRef = MethodRef::builtin(INTEGER, "intValue", "()I");
pub const BOOLEAN_VALUE: MethodRef =
    MethodRef::builtin(BOOLEAN, "booleanValue", "()Z");

pub const STRING_LENGTH: MethodRef = MethodRef::builtin(STRING, "length", "()I");
pub const STRING_SUBSTRING: MethodRef =
    MethodRef::builtin(STRING, "substring", "(II)Ljava/lang/String;");
pub const STRING_EQUALS: MethodRef =
    MethodRef::builtin(STRING, "equals", "(Ljava/lang/Object;)Z");

pub const ARRAY_LIST_INIT: MethodRef =
    MethodRef::builtin(ARRAY_LIST, "<init>", "()V");
pub const ARRAY_LIST_ADD: MethodRef =
    MethodRef::builtin(ARRAY_LIST, "add", "(Ljava/lang/Object;)Z");

pub const LIST_INIT: MethodRef =
    MethodRef::builtin(LIST, "<init>", "(Ljava/util/ArrayList;)V");
pub const LIST_COPY: MethodRef = MethodRef::builtin(LIST, "<init>", "(LList;)V");
pub const LIST_GET: MethodRef =
    MethodRef::builtin(LIST, "getElement", "(I)Ljava/lang/Object;");
pub const LIST_SET: MethodRef =
    MethodRef::builtin(LIST, "setElement", "(ILjava/lang/Object;)V");
pub const LIST_SIZE: MethodRef = MethodRef::builtin(LIST, "getSize", "()I");

pub const FPTR_INIT: MethodRef = MethodRef::builtin(
    FPTR,
    "<init>",
    "(Ljava/lang/Object;Ljava/lang/String;)V",
);
pub const FPTR_INVOKE: MethodRef = MethodRef::builtin(
    FPTR,
    "invoke",
    "(Ljava/util/ArrayList;)Ljava/lang/Object;",
);

pub const SYSTEM_OUT: FieldRef =
    FieldRef::builtin("java/lang/System", "out", "Ljava/io/PrintStream;");
pub const PRINTLN_INT: MethodRef =
    MethodRef::builtin("java/io/PrintStream", "println", "(I)V");
pub const PRINTLN_BOOL: MethodRef =
    MethodRef::builtin("java/io/PrintStream", "println", "(Z)V");
pub const PRINTLN_STRING: MethodRef = MethodRef::builtin(
    "java/io/PrintStream",
    "println",
    "(Ljava/lang/String;)V",
);
pub const PRINTLN_OBJECT: MethodRef = MethodRef::builtin(
    "java/io/PrintStream",
    "println",
    "(Ljava/lang/Object;)V",
);

/// Field descriptor of a value of type `ty`.
pub fn descriptor(ty: &Type) -> &'static str {
    match ty {
        Type::Int => "Ljava/lang/Integer;",
        Type::Bool => "Ljava/lang/Boolean;",
        Type::String => "Ljava/lang/String;",
        Type::List(_) => "LList;",
        Type::Fptr(_) => "LFptr;",
        Type::Void => "V",
    }
}

/// `(<args>)<ret>`.
pub fn method_descriptor(args: &[Type], ret: &Type) -> String {
    let mut out = String::from("(");
    for arg in args {
        out.push_str(descriptor(arg));
    }
    out.push(')');
    out.push_str(descriptor(ret));
    out
}

/// Class a boxed value of type `ty` is an instance of.
pub fn class_of(ty: &Type) -> Option<&'static str> {
    match ty {
        Type::Int => Some(INTEGER),
        Type::Bool => Some(BOOLEAN),
        Type::String => Some(STRING),
        Type::List(_) => Some(LIST),
        Type::Fptr(_) => Some(FPTR),
        Type::Void => None,
    }
}

/// Wrap the raw value on top of the stack.
pub fn box_raw(code: &mut CodeBuilder, ty: &Type) {
    match ty {
        Type::Int => code.invokestatic(INTEGER_VALUE_OF),
        Type::Bool => code.invokestatic(BOOLEAN_VALUE_OF),
        _ => {}
    }
}

/// Unwrap the boxed value on top of the stack. Reference types are left
/// as they are.
pub fn unbox(code: &mut CodeBuilder, ty: &Type) {
    match ty {
        Type::Int => code.invokevirtual(INT_VALUE),
        Type::Bool => code.invokevirtual(BOOLEAN_VALUE),
        _ => {}
    }
}

/// Assert the static type of the reference on top of the stack.
pub fn downcast(code: &mut CodeBuilder, ty: &Type) {
    if let Some(class) = class_of(ty) {
        code.checkcast(class);
    }
}

#[cfg(test)]
mod tests {
    use bytecode::Instruction;

    use super::*;

    #[test]
    fn descriptors() {
        let args = [Type::Int, Type::list(Type::Bool), Type::String];
        assert_eq!(
            method_descriptor(&args, &Type::Void),
            "(Ljava/lang/Integer;LList;Ljava/lang/String;)V"
        );
        let fptr = Type::fptr(vec![Type::Int], Type::Int);
        assert_eq!(method_descriptor(&[], &fptr), "()LFptr;");
    }

    #[test]
    fn boxing_is_type_directed() {
        let mut code = CodeBuilder::new();
        box_raw(&mut code, &Type::Bool);
        unbox(&mut code, &Type::Int);
        unbox(&mut code, &Type::String);
        downcast(&mut code, &Type::list(Type::Int));
        downcast(&mut code, &Type::Void);
        assert_eq!(
            code.into_code(),
            vec![
                Instruction::Invokestatic(BOOLEAN_VALUE_OF),
                Instruction::Invokevirtual(INT_VALUE),
                Instruction::Checkcast { class: LIST.into() },
            ]
        );
    }

    #[test]
    fn contract_arities() {
        assert_eq!(FPTR_INIT.arg_count(), 2);
        assert_eq!(LIST_SET.arg_count(), 2);
        assert!(!LIST_SET.returns_value());
        assert!(FPTR_INVOKE.returns_value());
    }
}
