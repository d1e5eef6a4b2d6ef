//! Native behaviour of the library classes generated code links against:
//! the boxed scalars, `String`, `System.out`, `ArrayList` and the two
//! runtime-support classes `List` and `Fptr`.

use std::cell::RefCell;
use std::rc::Rc;

use bytecode::{FieldRef, MethodRef};

use crate::error::VmError;
use crate::value::{Object, Value};

/// What a native call asks of the interpreter.
#[derive(Debug)]
pub(crate) enum Primitive {
    /// Finished, with a result for value-returning methods.
    Return(Option<Value>),
    /// A line written to standard output.
    Print(String),
    /// `Fptr.invoke`: call `name` on `receiver` and return its result.
    Apply {
        receiver: Value,
        name: String,
        args: Vec<Value>,
    },
}

pub(crate) fn call(
    method: &MethodRef,
    receiver: Option<Value>,
    args: Vec<Value>,
) -> Result<Primitive, VmError> {
    let class: &str = &method.class;
    let name: &str = &method.name;
    let descriptor: &str = &method.descriptor;
    let this = receiver.unwrap_or(Value::Null);
    let value = |v: Value| -> Result<Primitive, VmError> {
        Ok(Primitive::Return(Some(v)))
    };
    let done = || -> Result<Primitive, VmError> { Ok(Primitive::Return(None)) };

    match (class, name, descriptor) {
        ("java/lang/Object", "<init>", "()V") => done(),

        ("java/lang/Integer", "valueOf", "(I)Ljava/lang/Integer;") => {
            value(Value::Integer(int_arg(&args, 0)?))
        }
        ("java/lang/Boolean", "valueOf", "(Z)Ljava/lang/Boolean;") => {
            value(Value::Boolean(int_arg(&args, 0)? != 0))
        }
        ("java/lang/Integer", "intValue", "()I") => match this {
            Value::Integer(v) => value(Value::Int(v)),
            other => Err(mismatch("java/lang/Integer", &other)),
        },
        ("java/lang/Boolean", "booleanValue", "()Z") => match this {
            Value::Boolean(b) => value(Value::Int(b as i32)),
            other => Err(mismatch("java/lang/Boolean", &other)),
        },

        ("java/lang/String", "length", "()I") => {
            let text = string(&this)?;
            value(Value::Int(text.chars().count() as i32))
        }
        ("java/lang/String", "substring", "(II)Ljava/lang/String;") => {
            let text = string(&this)?;
            let begin = int_arg(&args, 0)?;
            let end = int_arg(&args, 1)?;
            let len = text.chars().count();
            if begin < 0 || end < begin || end as usize > len {
                return Err(VmError::StringIndex { begin, end, len });
            }
            let part: String = text
                .chars()
                .skip(begin as usize)
                .take((end - begin) as usize)
                .collect();
            value(Value::string(&part))
        }
        ("java/lang/String", "equals", "(Ljava/lang/Object;)Z") => {
            let text = string(&this)?;
            let equal = matches!(args.first(), Some(Value::Str(other)) if *other == text);
            value(Value::Int(equal as i32))
        }

        ("java/io/PrintStream", "println", _) => {
            let arg = args.first().cloned().unwrap_or(Value::Null);
            let line = match (descriptor, &arg) {
                ("(Z)V", Value::Int(v)) => (*v != 0).to_string(),
                ("(I)V", Value::Int(v)) => v.to_string(),
                ("(Z)V" | "(I)V", other) => {
                    return Err(mismatch("int", other));
                }
                _ => arg.to_string(),
            };
            Ok(Primitive::Print(line))
        }

        ("java/util/ArrayList", "<init>", "()V") => {
            initialize(&this, Object::ArrayList(Vec::new()))?;
            done()
        }
        ("java/util/ArrayList", "add", "(Ljava/lang/Object;)Z") => {
            let item = args.into_iter().next().unwrap_or(Value::Null);
            let array = heap(&this, "ArrayList.add")?;
            if let Object::ArrayList(items) = &mut *array.borrow_mut() {
                items.push(item);
                return value(Value::Int(1));
            }
            Err(mismatch("java/util/ArrayList", &this))
        }

        ("List", "<init>", "(Ljava/util/ArrayList;)V") => {
            let backing = args.into_iter().next().unwrap_or(Value::Null);
            match &backing {
                Value::Ref(obj)
                    if matches!(&*obj.borrow(), Object::ArrayList(_)) => {}
                other => return Err(mismatch("java/util/ArrayList", other)),
            }
            initialize(&this, Object::List(backing))?;
            done()
        }
        ("List", "<init>", "(LList;)V") => {
            let source = args.first().cloned().unwrap_or(Value::Null);
            let items = source
                .list_items()
                .ok_or_else(|| mismatch("List", &source))?;
            let copy = Value::object(Object::ArrayList(items));
            initialize(&this, Object::List(copy))?;
            done()
        }
        ("List", "getElement", "(I)Ljava/lang/Object;") => {
            let index = int_arg(&args, 0)?;
            let array = backing(&this)?;
            let array = array.borrow();
            let Object::ArrayList(items) = &*array else {
                return Err(mismatch("java/util/ArrayList", &this));
            };
            let item = element(items, index)?.clone();
            value(item)
        }
        ("List", "setElement", "(ILjava/lang/Object;)V") => {
            let index = int_arg(&args, 0)?;
            let item = args.get(1).cloned().unwrap_or(Value::Null);
            let array = backing(&this)?;
            let mut array = array.borrow_mut();
            let Object::ArrayList(items) = &mut *array else {
                return Err(mismatch("java/util/ArrayList", &this));
            };
            let len = items.len();
            match usize::try_from(index).ok().and_then(|i| items.get_mut(i)) {
                Some(slot) => *slot = item,
                None => return Err(VmError::IndexOutOfBounds { index, len }),
            }
            done()
        }
        ("List", "getSize", "()I") => {
            let items = this
                .list_items()
                .ok_or_else(|| mismatch("List", &this))?;
            value(Value::Int(items.len() as i32))
        }

        ("Fptr", "<init>", "(Ljava/lang/Object;Ljava/lang/String;)V") => {
            let receiver = args.first().cloned().unwrap_or(Value::Null);
            let name = match args.get(1) {
                Some(Value::Str(name)) => name.to_string(),
                Some(other) => return Err(mismatch("java/lang/String", other)),
                None => return Err(mismatch("java/lang/String", &Value::Null)),
            };
            initialize(&this, Object::Fptr { receiver, name })?;
            done()
        }
        ("Fptr", "invoke", "(Ljava/util/ArrayList;)Ljava/lang/Object;") => {
            let (receiver, name) = match &this {
                Value::Ref(obj) => match &*obj.borrow() {
                    Object::Fptr { receiver, name } => {
                        (receiver.clone(), name.clone())
                    }
                    _ => return Err(mismatch("Fptr", &this)),
                },
                other => return Err(mismatch("Fptr", other)),
            };
            let packed = args.first().cloned().unwrap_or(Value::Null);
            let args = packed
                .list_items()
                .ok_or_else(|| mismatch("java/util/ArrayList", &packed))?;
            Ok(Primitive::Apply {
                receiver,
                name,
                args,
            })
        }

        _ => Err(VmError::UnknownMethod(method.to_string())),
    }
}

pub(crate) fn get_static(field: &FieldRef) -> Result<Value, VmError> {
    match (&*field.class, &*field.name) {
        ("java/lang/System", "out") => Ok(Value::PrintStream),
        _ => Err(VmError::UnknownField(field.to_string())),
    }
}

/// `checkcast`: `null` passes any cast.
pub(crate) fn check_cast(class: &str, value: &Value) -> Result<(), VmError> {
    let ok = match (class, value) {
        (_, Value::Null) | ("java/lang/Object", _) => true,
        ("java/lang/Integer", Value::Integer(_)) => true,
        ("java/lang/Boolean", Value::Boolean(_)) => true,
        ("java/lang/String", Value::Str(_)) => true,
        (_, Value::Ref(_)) => value.type_name() == class,
        _ => false,
    };
    if ok {
        Ok(())
    } else {
        Err(VmError::ClassCast {
            class: class.to_string(),
            found: value.type_name(),
        })
    }
}

/// Run a constructor: an uninitialized object becomes `object` in place.
pub(crate) fn initialize(this: &Value, object: Object) -> Result<(), VmError> {
    let obj = heap(this, "<init>")?;
    if !matches!(&*obj.borrow(), Object::Uninit(_)) {
        return Err(mismatch("uninitialized object", this));
    }
    *obj.borrow_mut() = object;
    Ok(())
}

fn heap(value: &Value, site: &str) -> Result<Rc<RefCell<Object>>, VmError> {
    match value {
        Value::Ref(obj) => Ok(Rc::clone(obj)),
        Value::Null => Err(VmError::NullReference(site.to_string())),
        other => Err(mismatch("object reference", other)),
    }
}

/// The `ArrayList` behind a `List`.
fn backing(list: &Value) -> Result<Rc<RefCell<Object>>, VmError> {
    let obj = heap(list, "List")?;
    let inner = match &*obj.borrow() {
        Object::List(backing) => backing.clone(),
        _ => return Err(mismatch("List", list)),
    };
    heap(&inner, "List")
}

fn element(items: &[Value], index: i32) -> Result<&Value, VmError> {
    usize::try_from(index)
        .ok()
        .and_then(|i| items.get(i))
        .ok_or(VmError::IndexOutOfBounds {
            index,
            len: items.len(),
        })
}

fn int_arg(args: &[Value], at: usize) -> Result<i32, VmError> {
    match args.get(at) {
        Some(Value::Int(v)) => Ok(*v),
        Some(other) => Err(mismatch("int", other)),
        None => Err(mismatch("int", &Value::Null)),
    }
}

fn string(value: &Value) -> Result<Rc<str>, VmError> {
    match value {
        Value::Str(text) => Ok(Rc::clone(text)),
        Value::Null => Err(VmError::NullReference("String".to_string())),
        other => Err(mismatch("java/lang/String", other)),
    }
}

fn mismatch(expected: &str, found: &Value) -> VmError {
    VmError::TypeMismatch {
        expected: expected.to_string(),
        found: found.type_name(),
    }
}
