use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// A value on the operand stack or in a local slot.
///
/// Raw machine integers (`Int`, also used for booleans as 0/1) are kept
/// apart from their boxed counterparts so tests can tell a boxed `true`
/// from a bare `1`.
#[derive(Debug, Clone)]
pub enum Value {
    Null,
    /// Raw 32-bit machine value.
    Int(i32),
    /// `java/lang/Integer`
    Integer(i32),
    /// `java/lang/Boolean`
    Boolean(bool),
    /// `java/lang/String`
    Str(Rc<str>),
    /// `java/lang/System.out`
    PrintStream,
    /// Any heap object with identity.
    Ref(Rc<RefCell<Object>>),
}

/// Heap objects of the runtime-support contract.
#[derive(Debug, Clone)]
pub enum Object {
    /// Allocated by `new`, constructor not yet run.
    Uninit(String),
    /// `java/util/ArrayList`
    ArrayList(Vec<Value>),
    /// `List`: wrapper sharing the backing array it was built from.
    List(Value),
    /// `Fptr`: receiver plus the name of the method to call.
    Fptr { receiver: Value, name: String },
    /// Instance of a compiled program class.
    Instance(String),
}

impl Value {
    pub fn object(object: Object) -> Self {
        Value::Ref(Rc::new(RefCell::new(object)))
    }

    pub fn string(text: &str) -> Self {
        Value::Str(Rc::from(text))
    }

    /// A list wrapper over a fresh backing array.
    pub fn list(items: Vec<Value>) -> Self {
        Value::object(Object::List(Value::object(Object::ArrayList(items))))
    }

    /// Short type name used in error messages.
    pub fn type_name(&self) -> String {
        match self {
            Value::Null => "null".into(),
            Value::Int(_) => "int".into(),
            Value::Integer(_) => "java/lang/Integer".into(),
            Value::Boolean(_) => "java/lang/Boolean".into(),
            Value::Str(_) => "java/lang/String".into(),
            Value::PrintStream => "java/io/PrintStream".into(),
            Value::Ref(obj) => match &*obj.borrow() {
                Object::Uninit(class) => format!("uninitialized {class}"),
                Object::ArrayList(_) => "java/util/ArrayList".into(),
                Object::List(_) => "List".into(),
                Object::Fptr { .. } => "Fptr".into(),
                Object::Instance(class) => class.clone(),
            },
        }
    }

    /// Elements of a `List` or `ArrayList`, if this is one.
    pub fn list_items(&self) -> Option<Vec<Value>> {
        let Value::Ref(obj) = self else {
            return None;
        };
        match &*obj.borrow() {
            Object::ArrayList(items) => Some(items.clone()),
            Object::List(backing) => backing.list_items(),
            _ => None,
        }
    }

    /// Reference identity, as compared by `if_acmp`.
    pub fn same_ref(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Ref(a), Value::Ref(b)) => Rc::ptr_eq(a, b),
            (Value::Str(a), Value::Str(b)) => Rc::ptr_eq(a, b),
            (Value::PrintStream, Value::PrintStream) => true,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            _ => false,
        }
    }
}

/// Structural equality; heap objects compare by identity except lists,
/// which compare by contents.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Ref(a), Value::Ref(b)) => {
                if Rc::ptr_eq(a, b) {
                    return true;
                }
                match (self.list_items(), other.list_items()) {
                    (Some(x), Some(y)) => x == y,
                    _ => false,
                }
            }
            _ => self.same_ref(other),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Int(v) | Value::Integer(v) => write!(f, "{v}"),
            Value::Boolean(b) => write!(f, "{b}"),
            Value::Str(s) => f.write_str(s),
            Value::PrintStream => f.write_str("java.io.PrintStream"),
            Value::Ref(obj) => {
                if let Some(items) = self.list_items() {
                    f.write_str("[")?;
                    for (i, item) in items.iter().enumerate() {
                        if i > 0 {
                            f.write_str(", ")?;
                        }
                        write!(f, "{item}")?;
                    }
                    return f.write_str("]");
                }
                match &*obj.borrow() {
                    Object::Fptr { name, .. } => write!(f, "Fptr({name})"),
                    Object::Instance(class) => write!(f, "{class}@instance"),
                    Object::Uninit(class) => write!(f, "{class}@uninit"),
                    _ => f.write_str("?"),
                }
            }
        }
    }
}
