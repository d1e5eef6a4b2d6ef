//! Serialization of [`ClassFile`]s to assembler text.
//!
//! Layout rules expected by the assembler:
//! - unit-level directives (`.class`, `.method`, `.limit`, ...) start at
//!   column 0,
//! - label definitions are indented one tab,
//! - every other instruction is indented two tabs.

use std::io::{self, Write};

use crate::class::{ClassFile, Method};
use crate::instruction::Instruction;

pub struct AssemblyWriter<W: Write> {
    out: W,
}

impl<W: Write> AssemblyWriter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    pub fn directive(&mut self, text: &str) -> io::Result<()> {
        writeln!(self.out, "{text}")
    }

    pub fn instruction(&mut self, instruction: &Instruction) -> io::Result<()> {
        match instruction {
            Instruction::Label(_) => writeln!(self.out, "\t{instruction}"),
            _ => writeln!(self.out, "\t\t{instruction}"),
        }
    }

    pub fn class_header(
        &mut self,
        name: &str,
        super_name: &str,
    ) -> io::Result<()> {
        self.directive(&format!(".class public {name}"))?;
        self.directive(&format!(".super {super_name}"))?;
        writeln!(self.out)
    }

    pub fn method(&mut self, method: &Method) -> io::Result<()> {
        self.directive(&format!(
            ".method {} {}{}",
            method.access.as_str(),
            method.name,
            method.descriptor
        ))?;
        self.directive(&format!(".limit stack {}", method.stack_limit))?;
        self.directive(&format!(".limit locals {}", method.locals_limit))?;
        for instruction in &method.code {
            self.instruction(instruction)?;
        }
        self.directive(".end method")?;
        writeln!(self.out)
    }

    pub fn class(&mut self, class: &ClassFile) -> io::Result<()> {
        self.class_header(&class.name, &class.super_name)?;
        for method in &class.methods {
            self.method(method)?;
        }
        self.out.flush()
    }
}

/// Render a whole class to a string.
pub fn render(class: &ClassFile) -> io::Result<String> {
    let mut writer = AssemblyWriter::new(Vec::new());
    writer.class(class)?;
    String::from_utf8(writer.into_inner()).map_err(io::Error::other)
}
