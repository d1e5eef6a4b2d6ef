use std::io::Write;

use bytecode::writer::AssemblyWriter;
use bytecode::{Access, ClassFile, Instruction, Method, MethodRef};
use syntax::{CheckedProgram, Stmt, Type};

use crate::config::CodegenConfig;
use crate::error::{CodegenError, RefKind, Result};
use crate::labels::LabelAllocator;
use crate::lowering::{FunctionLowering, ReturnTypeTable};
use crate::runtime;
use crate::slots::{SlotAllocator, SlotKey};

/// Lowers a checked program into one class, a function at a time.
///
/// The label counter and return-type table live for the whole run; the
/// slot allocator is reset before every function.
pub struct UnitAssembler<'p> {
    checked: &'p CheckedProgram,
    config: CodegenConfig,
    labels: LabelAllocator,
    slots: SlotAllocator,
    returns: ReturnTypeTable,
}

impl<'p> UnitAssembler<'p> {
    pub fn new(checked: &'p CheckedProgram, config: CodegenConfig) -> Self {
        Self {
            checked,
            config,
            labels: LabelAllocator::new(),
            slots: SlotAllocator::new(),
            returns: ReturnTypeTable::new(),
        }
    }

    /// The class with, in order: the `main` trampoline, every reachable
    /// function, and the constructor running the entry unit.
    pub fn assemble(mut self) -> Result<ClassFile> {
        self.checked.symbols.validate().map_err(|err| {
            log::debug!("rejecting symbol table: {err}");
            CodegenError::unresolved(RefKind::Scope, err.scope().to_string())
        })?;

        let mut class =
            ClassFile::new(self.config.class_name.clone(), runtime::OBJECT);
        class.methods.push(self.trampoline());

        let checked = self.checked;
        for name in &checked.reachable {
            let method = self.function(name)?;
            class.methods.push(method);
        }
        class.methods.push(self.entry()?);

        log::debug!(
            "assembled {} with {} methods and {} labels",
            class.name,
            class.methods.len(),
            self.labels.issued()
        );
        Ok(class)
    }

    fn trampoline(&self) -> Method {
        let class = self.config.class_name.clone();
        let init = MethodRef::new(class.clone(), "<init>", "()V");
        let code = vec![
            Instruction::New {
                class: class.into(),
            },
            Instruction::Invokespecial(init),
            Instruction::Return,
        ];
        self.method(Access::PublicStatic, "main", "([Ljava/lang/String;)V", code)
    }

    fn function(&mut self, name: &str) -> Result<Method> {
        let checked = self.checked;
        let binding = checked
            .symbols
            .global()
            .function(name)
            .ok_or_else(|| CodegenError::unresolved(RefKind::Function, name))?;
        let decl = checked
            .program
            .function(name)
            .ok_or_else(|| CodegenError::unresolved(RefKind::Function, name))?;
        let scope = checked.symbols.scope(binding.scope).ok_or_else(|| {
            CodegenError::unresolved(RefKind::Scope, name)
        })?;

        self.returns.record(name, binding.return_type.clone());
        self.slots.reset();
        for arg in &decl.args {
            self.slots.slot(SlotKey::var(&arg.name));
        }

        let code = self.lower_body(name, &decl.body, scope, &binding.return_type)?;
        let descriptor =
            runtime::method_descriptor(&binding.arg_types, &binding.return_type);
        Ok(self.method(Access::Public, name, &descriptor, code))
    }

    fn entry(&mut self) -> Result<Method> {
        let checked = self.checked;
        let main = &checked.program.main;
        let scope = checked.symbols.scope(main.scope).unwrap_or_else(|| {
            log::debug!("entry scope {:?} missing, using globals", main.scope);
            checked.symbols.global()
        });
        self.slots.reset();

        let mut prologue = vec![
            Instruction::Aload { slot: 0 },
            Instruction::Invokespecial(runtime::OBJECT_INIT),
        ];
        let body = self.lower_body("<init>", &main.body, scope, &Type::Void)?;
        prologue.extend(body);
        Ok(self.method(Access::Public, "<init>", "()V", prologue))
    }

    /// Lower a body and append the implicit `return` a void unit needs when
    /// its code does not already end in one.
    fn lower_body(
        &mut self,
        name: &str,
        body: &[Stmt],
        scope: syntax::Scope<'_>,
        ret: &Type,
    ) -> Result<Vec<Instruction>> {
        let mut lowering =
            FunctionLowering::new(&mut self.labels, &mut self.slots, &self.returns);
        lowering.lower_block(body, scope)?;
        if ret.is_void() && !lowering.code().ends_with_return() {
            lowering.code.return_void();
        }
        let code = lowering.into_code();
        log::debug!(
            "lowered {name}: {} slots, {} instructions",
            self.slots.len(),
            code.len()
        );
        Ok(code)
    }

    fn method(
        &self,
        access: Access,
        name: &str,
        descriptor: &str,
        code: Vec<Instruction>,
    ) -> Method {
        Method {
            access,
            name: name.to_string(),
            descriptor: descriptor.to_string(),
            stack_limit: self.config.stack_limit,
            locals_limit: self.config.locals_limit,
            code,
        }
    }
}

/// Lower `checked` into a class.
pub fn assemble(
    checked: &CheckedProgram,
    config: CodegenConfig,
) -> Result<ClassFile> {
    UnitAssembler::new(checked, config).assemble()
}

/// Lower `checked` and write the assembly text to `out`.
pub fn write_program<W: Write>(
    checked: &CheckedProgram,
    config: CodegenConfig,
    out: W,
) -> Result<ClassFile> {
    let class = assemble(checked, config)?;
    let mut writer = AssemblyWriter::new(out);
    writer.class(&class)?;
    Ok(class)
}

#[cfg(test)]
mod tests {
    use std::io;

    use syntax::builder::*;
    use syntax::{BinaryOp, ScopeId, Type};

    use super::*;

    struct BrokenPipe;

    impl Write for BrokenPipe {
        fn write(&mut self, _: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn program() -> CheckedProgram {
        ProgramBuilder::new()
            .function(
                "add",
                &[("a", Type::Int), ("b", Type::Int)],
                Type::Int,
                vec![ret(Some(binary(
                    BinaryOp::Add,
                    ident("a", Type::Int),
                    ident("b", Type::Int),
                )))],
            )
            .function("hello", &[], Type::Void, vec![put(string("hi"))])
            .unreachable_function("unused", &[], Type::Void, vec![])
            .finish(vec![expr(call("hello", vec![], Type::Void))])
    }

    #[test]
    fn method_order_and_signatures() {
        let class = assemble(&program(), CodegenConfig::default()).unwrap();
        let names: Vec<_> = class.methods.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, ["main", "add", "hello", "<init>"]);
        let add = class.method("add").unwrap();
        assert_eq!(
            add.descriptor,
            "(Ljava/lang/Integer;Ljava/lang/Integer;)Ljava/lang/Integer;"
        );
        assert_eq!(add.stack_limit, 128);
        assert!(class.method("main").unwrap().is_static());
    }

    #[test]
    fn arguments_take_the_first_slots() {
        let class = assemble(&program(), CodegenConfig::default()).unwrap();
        let add = class.method("add").unwrap();
        assert_eq!(add.code[0], Instruction::Aload { slot: 1 });
        assert!(add.code.contains(&Instruction::Aload { slot: 2 }));
    }

    #[test]
    fn void_units_end_in_exactly_one_return() {
        let class = assemble(&program(), CodegenConfig::default()).unwrap();
        for name in ["hello", "<init>"] {
            let code = &class.method(name).unwrap().code;
            assert_eq!(code.last(), Some(&Instruction::Return), "{name}");
            let returns = code.iter().filter(|i| i.is_return()).count();
            assert_eq!(returns, 1, "{name}");
        }
    }

    #[test]
    fn writes_class_text() {
        let mut out = Vec::new();
        write_program(&program(), CodegenConfig::default(), &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with(".class public Main\n.super java/lang/Object\n"));
        assert!(text.contains(".method public static main([Ljava/lang/String;)V\n"));
        assert!(text.contains("\t\tinvokespecial Main/<init>()V\n"));
        assert!(text.contains(".method public hello()V\n"));
        assert!(!text.contains("unused"));
    }

    #[test]
    fn missing_function_is_unresolved() {
        let mut checked = program();
        checked.reachable.push("ghost".to_string());
        let err = assemble(&checked, CodegenConfig::default()).unwrap_err();
        assert!(matches!(
            err,
            CodegenError::Unresolved {
                kind: RefKind::Function,
                ..
            }
        ));
    }

    #[test]
    fn class_name_is_configurable() {
        let config = CodegenConfig {
            class_name: "Prog".to_string(),
            ..CodegenConfig::default()
        };
        let class = assemble(&program(), config).unwrap();
        assert_eq!(class.name, "Prog");
        let main = class.method("main").unwrap();
        assert_eq!(main.code[0], Instruction::New { class: "Prog".into() });
    }

    #[test]
    fn failed_write_is_an_io_error() {
        let config = CodegenConfig::default();
        let err = write_program(&program(), config, BrokenPipe).unwrap_err();
        match err {
            CodegenError::Io(err) => {
                assert_eq!(err.kind(), io::ErrorKind::BrokenPipe)
            }
            other => panic!("expected an io error, got {other}"),
        }
    }

    #[test]
    fn scope_cycle_is_rejected_before_lowering() {
        let mut checked = ProgramBuilder::new()
            .finish(vec![put(ident("ghost", Type::Int))]);
        let looped = checked.symbols.add_scope(ScopeId(7));
        for _ in 0..6 {
            checked.symbols.add_scope(looped);
        }
        checked.program.main.scope = looped;

        let err = assemble(&checked, CodegenConfig::default()).unwrap_err();
        assert!(matches!(
            err,
            CodegenError::Unresolved {
                kind: RefKind::Scope,
                ..
            }
        ));
    }

    #[test]
    fn self_parented_global_scope_fails_to_load() {
        let checked = ProgramBuilder::new()
            .finish(vec![put(ident("ghost", Type::Int))]);
        let mut json = serde_json::to_value(&checked).unwrap();
        json["symbols"]["scopes"][0]["parent"] = serde_json::json!(0);
        assert!(serde_json::from_value::<CheckedProgram>(json).is_err());
    }
}
