use bytecode::stack::label_positions;
use bytecode::{ClassFile, Constant, Instruction, Label, Method, MethodRef};

use crate::error::VmError;
use crate::primitives::{self, Primitive};
use crate::value::{Object, Value};

const MAX_FRAMES: usize = 1024;
const DEFAULT_STEP_LIMIT: u64 = 10_000_000;

/// State left behind by a finished code sequence.
#[derive(Debug, Clone)]
pub struct Outcome {
    /// Value popped by `areturn`.
    pub returned: Option<Value>,
    /// `true` if a return instruction ended execution, `false` if control
    /// fell off the end.
    pub exited: bool,
    pub stack: Vec<Value>,
    pub locals: Vec<Value>,
}

/// Executes the methods of one assembled class.
///
/// Instances of the class are plain [`Object::Instance`] values; calls to
/// anything outside it go to the native library in `primitives`.
pub struct VM<'c> {
    class: &'c ClassFile,
    output: Vec<String>,
    echo: bool,
    steps: u64,
    step_limit: u64,
    depth: usize,
}

impl<'c> VM<'c> {
    pub fn new(class: &'c ClassFile) -> Self {
        Self {
            class,
            output: Vec::new(),
            echo: false,
            steps: 0,
            step_limit: DEFAULT_STEP_LIMIT,
            depth: 0,
        }
    }

    pub fn with_step_limit(mut self, limit: u64) -> Self {
        self.step_limit = limit;
        self
    }

    /// Also write printed lines to the process's stdout.
    pub fn with_echo(mut self, echo: bool) -> Self {
        self.echo = echo;
        self
    }

    /// Lines printed so far.
    pub fn output(&self) -> &[String] {
        &self.output
    }

    pub fn into_output(self) -> Vec<String> {
        self.output
    }

    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Run `public static main([Ljava/lang/String;)V`.
    pub fn run_main(&mut self) -> Result<(), VmError> {
        let main = self
            .class
            .methods
            .iter()
            .find(|m| m.name == "main" && m.is_static())
            .ok_or(VmError::NoEntryPoint)?;
        log::debug!("running {}.main", self.class.name);
        self.call_method(main, None, vec![Value::Null])?;
        Ok(())
    }

    /// A fresh, already constructed instance of the class.
    pub fn instance(&self) -> Value {
        Value::object(Object::Instance(self.class.name.clone()))
    }

    /// Call the method `name` on `receiver` (ignored for static methods).
    pub fn invoke(
        &mut self,
        receiver: Value,
        name: &str,
        args: Vec<Value>,
    ) -> Result<Option<Value>, VmError> {
        let method = self.lookup(name)?;
        self.call_method(method, Some(receiver), args)
    }

    /// Execute a bare instruction sequence with the given locals, slot 0
    /// first. Used to observe what a fragment leaves on the stack.
    pub fn run_code(
        &mut self,
        code: &[Instruction],
        locals: Vec<Value>,
    ) -> Result<Outcome, VmError> {
        self.execute("<fragment>", code, locals)
    }

    fn lookup(&self, name: &str) -> Result<&'c Method, VmError> {
        self.class.method(name).ok_or_else(|| {
            VmError::UnknownMethod(format!("{}/{name}", self.class.name))
        })
    }

    fn call_method(
        &mut self,
        method: &'c Method,
        receiver: Option<Value>,
        args: Vec<Value>,
    ) -> Result<Option<Value>, VmError> {
        if self.depth >= MAX_FRAMES {
            return Err(VmError::StackOverflow(MAX_FRAMES));
        }
        let mut locals = Vec::with_capacity(method.locals_limit as usize);
        if !method.is_static() {
            locals.push(receiver.unwrap_or(Value::Null));
        }
        locals.extend(args);

        self.depth += 1;
        let outcome = self.execute(&method.name, &method.code, locals);
        self.depth -= 1;
        Ok(outcome?.returned)
    }

    fn execute(
        &mut self,
        name: &str,
        code: &[Instruction],
        mut locals: Vec<Value>,
    ) -> Result<Outcome, VmError> {
        let labels = label_positions(code)?;
        let jump = |target: Label| {
            labels
                .get(&target)
                .copied()
                .ok_or(VmError::UnknownLabel(target))
        };
        let mut stack: Vec<Value> = Vec::new();
        let mut pc = 0;

        while let Some(instruction) = code.get(pc) {
            self.tick()?;
            pc += 1;
            match instruction {
                Instruction::Label(_) => {}
                Instruction::Aload { slot } => {
                    let value = locals
                        .get(*slot as usize)
                        .cloned()
                        .unwrap_or(Value::Null);
                    stack.push(value);
                }
                Instruction::Astore { slot } => {
                    let value = pop(&mut stack, name)?;
                    store_local(&mut locals, *slot, value);
                }
                Instruction::Ldc(Constant::Int(v)) => stack.push(Value::Int(*v)),
                Instruction::Ldc(Constant::String(s)) => {
                    stack.push(Value::string(s))
                }
                Instruction::Iconst0 => stack.push(Value::Int(0)),
                Instruction::New { class } => {
                    stack.push(Value::object(Object::Uninit(class.to_string())))
                }
                Instruction::Dup => {
                    let top = pop(&mut stack, name)?;
                    stack.push(top.clone());
                    stack.push(top);
                }
                Instruction::Pop => {
                    pop(&mut stack, name)?;
                }
                Instruction::Swap => {
                    let a = pop(&mut stack, name)?;
                    let b = pop(&mut stack, name)?;
                    stack.push(a);
                    stack.push(b);
                }
                Instruction::Checkcast { class } => {
                    let top = stack.last().ok_or_else(|| underflow(name))?;
                    primitives::check_cast(class, top)?;
                }
                Instruction::Getstatic(field) => {
                    stack.push(primitives::get_static(field)?)
                }
                Instruction::Invokevirtual(method)
                | Instruction::Invokespecial(method) => {
                    let args = pop_args(&mut stack, method.arg_count(), name)?;
                    let receiver = pop(&mut stack, name)?;
                    if let Some(result) =
                        self.dispatch(method, Some(receiver), args)?
                    {
                        stack.push(result);
                    }
                }
                Instruction::Invokestatic(method) => {
                    let args = pop_args(&mut stack, method.arg_count(), name)?;
                    if let Some(result) = self.dispatch(method, None, args)? {
                        stack.push(result);
                    }
                }
                Instruction::Iadd
                | Instruction::Isub
                | Instruction::Imul
                | Instruction::Idiv
                | Instruction::Irem
                | Instruction::Ixor => {
                    let rhs = pop_int(&mut stack, name)?;
                    let lhs = pop_int(&mut stack, name)?;
                    stack.push(Value::Int(arithmetic(instruction, lhs, rhs)?));
                }
                Instruction::Ineg => {
                    let v = pop_int(&mut stack, name)?;
                    stack.push(Value::Int(v.wrapping_neg()));
                }
                Instruction::Goto(target) => pc = jump(*target)?,
                Instruction::Ifeq(target) => {
                    if pop_int(&mut stack, name)? == 0 {
                        pc = jump(*target)?;
                    }
                }
                Instruction::Ifne(target) => {
                    if pop_int(&mut stack, name)? != 0 {
                        pc = jump(*target)?;
                    }
                }
                Instruction::IfIcmp { cond, target } => {
                    let rhs = pop_int(&mut stack, name)?;
                    let lhs = pop_int(&mut stack, name)?;
                    if cond.holds(lhs, rhs) {
                        pc = jump(*target)?;
                    }
                }
                Instruction::IfAcmp { equal, target } => {
                    let rhs = pop(&mut stack, name)?;
                    let lhs = pop(&mut stack, name)?;
                    if lhs.same_ref(&rhs) == *equal {
                        pc = jump(*target)?;
                    }
                }
                Instruction::Return => {
                    return Ok(Outcome {
                        returned: None,
                        exited: true,
                        stack,
                        locals,
                    });
                }
                Instruction::Areturn => {
                    let value = pop(&mut stack, name)?;
                    return Ok(Outcome {
                        returned: Some(value),
                        exited: true,
                        stack,
                        locals,
                    });
                }
            }
        }

        Ok(Outcome {
            returned: None,
            exited: false,
            stack,
            locals,
        })
    }

    fn dispatch(
        &mut self,
        method: &MethodRef,
        receiver: Option<Value>,
        args: Vec<Value>,
    ) -> Result<Option<Value>, VmError> {
        if method.class == self.class.name.as_str() {
            let target = self.lookup(&method.name)?;
            if method.name == "<init>" {
                if let Some(this) = &receiver {
                    let object = Object::Instance(self.class.name.clone());
                    primitives::initialize(this, object)?;
                }
            }
            return self.call_method(target, receiver, args);
        }

        match primitives::call(method, receiver, args)? {
            Primitive::Return(result) => Ok(result),
            Primitive::Print(line) => {
                if self.echo {
                    println!("{line}");
                }
                self.output.push(line);
                Ok(None)
            }
            Primitive::Apply {
                receiver,
                name,
                args,
            } => {
                log::trace!("Fptr.invoke -> {name}");
                let target = self.lookup(&name)?;
                let result = self.call_method(target, Some(receiver), args)?;
                Ok(Some(result.unwrap_or(Value::Null)))
            }
        }
    }

    fn tick(&mut self) -> Result<(), VmError> {
        self.steps += 1;
        if self.steps > self.step_limit {
            return Err(VmError::StepLimit(self.step_limit));
        }
        Ok(())
    }
}

fn arithmetic(
    instruction: &Instruction,
    lhs: i32,
    rhs: i32,
) -> Result<i32, VmError> {
    let result = match instruction {
        Instruction::Iadd => lhs.wrapping_add(rhs),
        Instruction::Isub => lhs.wrapping_sub(rhs),
        Instruction::Imul => lhs.wrapping_mul(rhs),
        Instruction::Idiv | Instruction::Irem if rhs == 0 => {
            return Err(VmError::DivisionByZero);
        }
        Instruction::Idiv => lhs.wrapping_div(rhs),
        Instruction::Irem => lhs.wrapping_rem(rhs),
        _ => lhs ^ rhs,
    };
    Ok(result)
}

fn store_local(locals: &mut Vec<Value>, slot: u16, value: Value) {
    let idx = slot as usize;
    if idx >= locals.len() {
        locals.resize(idx + 1, Value::Null);
    }
    locals[idx] = value;
}

fn underflow(method: &str) -> VmError {
    VmError::StackUnderflow {
        method: method.to_string(),
    }
}

fn pop(stack: &mut Vec<Value>, method: &str) -> Result<Value, VmError> {
    stack.pop().ok_or_else(|| underflow(method))
}

fn pop_int(stack: &mut Vec<Value>, method: &str) -> Result<i32, VmError> {
    match pop(stack, method)? {
        Value::Int(v) => Ok(v),
        other => Err(VmError::TypeMismatch {
            expected: "int".to_string(),
            found: other.type_name(),
        }),
    }
}

fn pop_args(
    stack: &mut Vec<Value>,
    count: usize,
    method: &str,
) -> Result<Vec<Value>, VmError> {
    if stack.len() < count {
        return Err(underflow(method));
    }
    Ok(stack.split_off(stack.len() - count))
}
