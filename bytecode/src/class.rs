use crate::instruction::Instruction;

/// Access modifiers a method may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Public,
    PublicStatic,
}

impl Access {
    pub const fn as_str(self) -> &'static str {
        match self {
            Access::Public => "public",
            Access::PublicStatic => "public static",
        }
    }
}

/// A single method: header, declared limits and its body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Method {
    pub access: Access,
    pub name: String,
    /// `(<params>)<return>`.
    pub descriptor: String,
    pub stack_limit: u16,
    pub locals_limit: u16,
    pub code: Vec<Instruction>,
}

impl Method {
    pub fn is_static(&self) -> bool {
        self.access == Access::PublicStatic
    }
}

/// One output unit: a class declaration and its methods, in emission order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassFile {
    pub name: String,
    pub super_name: String,
    pub methods: Vec<Method>,
}

impl ClassFile {
    pub fn new(name: impl Into<String>, super_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            super_name: super_name.into(),
            methods: Vec::new(),
        }
    }

    /// First method called `name`. Overloads are not emitted, so the name is
    /// enough.
    pub fn method(&self, name: &str) -> Option<&Method> {
        self.methods.iter().find(|m| m.name == name)
    }
}
