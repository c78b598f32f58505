mod block;
mod export;
mod options;
mod postprocess;

#[cfg(test)]
mod tests;

use std::fmt::Write;

use thiserror::Error;

pub use export::*;
pub use options::*;

use crate::{
  disassembler::DisassembleError,
  script::{DataType, Script, Symbol, SymbolData},
  syntax::{
    Block, BuiltinType, ClassDecl, Decl, Declarations, Expression, FunctionDecl, InstanceDecl,
    PrototypeDecl, TypeRef, VariableArrayDecl, VariableDecl
  }
};

/// A decompilation session over one loaded script.
///
/// Construction walks the symbol table once and materializes a declaration
/// per symbol; bodies are decompiled lazily on demand and cached until the
/// options change.
pub struct Decompiler<'s> {
  script:  &'s Script,
  decls:   Declarations,
  options: DecompilerOptions
}

impl<'s> Decompiler<'s> {
  pub fn new(script: &'s Script) -> Result<Self, DecompileError> {
    let mut decompiler = Self {
      script,
      decls: Default::default(),
      options: Default::default()
    };

    for index in 0..script.symbols().len() {
      decompiler.ensure_declaration(index)?;
    }

    Ok(decompiler)
  }

  pub fn declarations(&self) -> &Declarations {
    &self.decls
  }

  /// The declarations that belong in a source file, in first-build order.
  pub fn top_level(&self) -> &[usize] {
    self.decls.top_level()
  }

  pub fn options(&self) -> DecompilerOptions {
    self.options
  }

  /// Replaces the postprocessing options and drops every cached body; the
  /// next [`Self::decompile`] call rebuilds it under the new options.
  pub fn set_options(&mut self, options: DecompilerOptions) {
    self.options = options;
    self.decls.clear_bodies();
  }

  /// The declaration for a symbol index, building it if required.
  pub fn decl_for(&mut self, index: usize) -> Result<&Decl, DecompileError> {
    let index = self.ensure_declaration(index)?;
    self
      .decls
      .get(index)
      .ok_or(DecompileError::UnresolvedSymbol { index })
  }

  /// Decompiles the body of a function, prototype or const instance.
  ///
  /// Returns `None` for externals and declarations without executable code.
  /// The result is cached; repeated calls with unchanged options return the
  /// identical tree.
  pub fn decompile(&mut self, index: usize) -> Result<Option<&Block>, DecompileError> {
    self.ensure_declaration(index)?;
    let sym = self
      .script
      .symbol_by_index(index)
      .ok_or(DecompileError::UnresolvedSymbol { index })?;

    if sym.flags.external {
      return Ok(None);
    }

    let plan = match self.decls.get(index) {
      Some(Decl::Function(function)) => {
        (function.body.is_none())
          .then_some((function.parameters.len(), function.return_type != TypeRef::Builtin(BuiltinType::Void)))
      }
      Some(Decl::Prototype(prototype)) => prototype.body.is_none().then_some((0, false)),
      Some(Decl::Instance(instance)) if sym.flags.constant => {
        instance.body.is_none().then_some((0, false))
      }
      Some(Decl::Instance(_)) => return Ok(None),
      _ => return Ok(None)
    };

    if let Some((parameter_count, returns_value)) = plan {
      let result = self.decompile_block(sym.address, u32::MAX, parameter_count, returns_value, true)?;
      let mut body = result.block;

      let scope = self.decls.scope_members(index);
      self.postprocess(&mut body, &scope);

      if let Some(decl) = self.decls.get_mut(index) {
        match decl {
          Decl::Function(function) => function.body = Some(body),
          Decl::Prototype(prototype) => prototype.body = Some(body),
          Decl::Instance(instance) => instance.body = Some(body),
          _ => {}
        }
      }
    }

    Ok(self.decls.get(index).and_then(Decl::body))
  }

  /// A flat metadata report for a symbol, one field per line.
  pub fn symbol_info(&self, index: usize) -> Option<String> {
    let sym = self.script.symbol_by_index(index)?;
    let mut out = String::new();

    let _ = writeln!(out, "Name: {}", sym.name);
    let _ = writeln!(out, "Index: {}", sym.index);
    let _ = writeln!(out, "Address: {}", sym.address);
    let _ = writeln!(out, "Size: {}", sym.size);
    let _ = writeln!(out, "Type: {}", sym.ty);
    let _ = writeln!(out, "Return Type: {}", sym.return_type);
    let _ = writeln!(out, "Flags:");
    let _ = writeln!(out, " Const: {}", sym.flags.constant);
    let _ = writeln!(out, " Member: {}", sym.flags.member);
    let _ = writeln!(out, " External: {}", sym.flags.external);
    let _ = writeln!(out, " Merged: {}", sym.flags.merged);
    let _ = writeln!(out, " Generated: {}", sym.flags.generated);
    let _ = writeln!(out, "Parent Index: {}", sym.parent.map(|p| p as i64).unwrap_or(-1));
    let _ = writeln!(out, "Member Offset: {}", sym.member_offset);
    let _ = writeln!(out, "Class Size: {}", sym.class_size);
    let _ = writeln!(out, "File Index: {}", sym.file_index);
    let _ = writeln!(out, "Line Start: {}", sym.line_start);
    let _ = writeln!(out, "Line Count: {}", sym.line_count);
    let _ = writeln!(out, "Char Start: {}", sym.char_start);
    let _ = writeln!(out, "Char Count: {}", sym.char_count);

    Some(out)
  }

  fn ensure_declaration(&mut self, index: usize) -> Result<usize, DecompileError> {
    let sym = self
      .script
      .symbol_by_index(index)
      .ok_or(DecompileError::UnresolvedSymbol { index })?;

    match sym.ty {
      DataType::Class => self.ensure_class(index),
      DataType::Prototype => self.ensure_prototype(index),
      DataType::Instance => self.ensure_instance(index),
      DataType::Function if sym.flags.constant => self.ensure_function(index),
      DataType::Float | DataType::Int | DataType::String | DataType::Function => {
        self.ensure_variable(index)
      }
      kind => Err(DecompileError::UnsupportedSymbolKind { index, kind })
    }
  }

  fn ensure_class(&mut self, index: usize) -> Result<usize, DecompileError> {
    if self.decls.contains(index) {
      return Ok(index);
    }

    let sym = self
      .script
      .symbol_by_index(index)
      .ok_or(DecompileError::UnresolvedSymbol { index })?;
    let name = sym.name.clone();

    // Cache the class before building members: a member may lead back to
    // the owning class, which must then hit the cache instead of recursing.
    self.decls.insert(
      index,
      Decl::Class(ClassDecl {
        symbol:  index,
        name:    name.clone(),
        members: Vec::new()
      })
    );
    self.decls.push_top_level(index);

    // Members are the directly following symbols named `<Class>.<member>`.
    let prefix = format!("{name}.");
    let mut members = Vec::new();
    let mut member = index + 1;
    while let Some(sym) = self.script.symbol_by_index(member) {
      if !sym.name.starts_with(&prefix) {
        break;
      }
      members.push(self.ensure_variable(member)?);
      member += 1;
    }

    if let Some(Decl::Class(class)) = self.decls.get_mut(index) {
      class.members = members;
    }

    Ok(index)
  }

  fn ensure_prototype(&mut self, index: usize) -> Result<usize, DecompileError> {
    if self.decls.contains(index) {
      return Ok(index);
    }

    let sym = self
      .script
      .symbol_by_index(index)
      .ok_or(DecompileError::UnresolvedSymbol { index })?;
    let name = short_name(&sym.name).1;

    let parent_index = sym
      .parent
      .ok_or(DecompileError::UnsupportedSymbolKind {
        index,
        kind: DataType::Prototype
      })?;
    let parent_sym = self
      .script
      .symbol_by_index(parent_index)
      .ok_or(DecompileError::UnresolvedSymbol {
        index: parent_index
      })?;
    if parent_sym.ty != DataType::Class {
      return Err(DecompileError::UnsupportedSymbolKind {
        index: parent_index,
        kind:  parent_sym.ty
      });
    }

    let parent = self.ensure_class(parent_index)?;
    self.decls.insert(
      index,
      Decl::Prototype(PrototypeDecl {
        symbol: index,
        name,
        parent,
        body: None
      })
    );
    self.decls.push_top_level(index);

    Ok(index)
  }

  fn ensure_instance(&mut self, index: usize) -> Result<usize, DecompileError> {
    if self.decls.contains(index) {
      return Ok(index);
    }

    let sym = self
      .script
      .symbol_by_index(index)
      .ok_or(DecompileError::UnresolvedSymbol { index })?;
    // Dotted instances are nested inside another declaration; they are
    // cached like everything else but never listed at the top level.
    let (top_level, name) = short_name(&sym.name);

    let parent = sym
      .parent
      .filter(|&parent| parent < self.script.symbols().len());
    let (parent_class, parent_prototype) = match parent {
      None => (None, None),
      Some(parent_index) => {
        let parent_sym = self
          .script
          .symbol_by_index(parent_index)
          .ok_or(DecompileError::UnresolvedSymbol {
            index: parent_index
          })?;
        match parent_sym.ty {
          DataType::Prototype => {
            let prototype = self.ensure_prototype(parent_index)?;
            let class = match self.decls.get(prototype) {
              Some(Decl::Prototype(decl)) => decl.parent,
              _ => return Err(DecompileError::UnresolvedSymbol { index: prototype })
            };
            (Some(class), Some(prototype))
          }
          DataType::Class => (Some(self.ensure_class(parent_index)?), None),
          kind => {
            return Err(DecompileError::UnsupportedSymbolKind {
              index: parent_index,
              kind
            })
          }
        }
      }
    };

    self.decls.insert(
      index,
      Decl::Instance(InstanceDecl {
        symbol: index,
        name,
        parent_class,
        parent_prototype,
        body: None
      })
    );
    if top_level {
      self.decls.push_top_level(index);
    }

    Ok(index)
  }

  fn ensure_function(&mut self, index: usize) -> Result<usize, DecompileError> {
    if self.decls.contains(index) {
      return Ok(index);
    }

    let sym = self
      .script
      .symbol_by_index(index)
      .ok_or(DecompileError::UnresolvedSymbol { index })?;
    let name = sym.name.clone();
    let parameter_count = sym.size as usize;
    let return_type = builtin_type(sym.return_type).ok_or(DecompileError::UnsupportedSymbolKind {
      index,
      kind: sym.return_type
    })?;

    // Parameters are laid out directly after the function symbol, locals
    // directly after the parameters; both rely on the compiler's layout.
    let mut parameters = Vec::with_capacity(parameter_count);
    for parameter in index + 1..index + 1 + parameter_count {
      parameters.push(self.ensure_variable(parameter)?);
    }

    let prefix = format!("{name}.");
    let mut locals = Vec::new();
    let mut local = index + 1 + parameter_count;
    while let Some(sym) = self.script.symbol_by_index(local) {
      if !sym.name.starts_with(&prefix) {
        break;
      }
      locals.push(self.ensure_variable(local)?);
      local += 1;
    }

    self.decls.insert(
      index,
      Decl::Function(FunctionDecl {
        symbol: index,
        name,
        return_type: TypeRef::Builtin(return_type),
        parameters,
        locals,
        body: None
      })
    );
    self.decls.push_top_level(index);

    Ok(index)
  }

  fn ensure_variable(&mut self, index: usize) -> Result<usize, DecompileError> {
    let sym = self
      .script
      .symbol_by_index(index)
      .ok_or(DecompileError::UnresolvedSymbol { index })?;

    if sym.ty == DataType::Instance {
      return self.ensure_instance(index);
    }

    if self.decls.contains(index) {
      return Ok(index);
    }

    let (top_level, name) = short_name(&sym.name);
    let builtin = match sym.ty {
      DataType::Float => BuiltinType::Float,
      DataType::Int => BuiltinType::Int,
      DataType::String => BuiltinType::String,
      DataType::Function => BuiltinType::Func,
      kind => return Err(DecompileError::UnsupportedSymbolKind { index, kind })
    };

    let value = variable_value(sym);
    let decl = if sym.size > 1 {
      Decl::VariableArray(VariableArrayDecl {
        symbol: index,
        name,
        ty: TypeRef::Builtin(builtin),
        element_count: Expression::Int(sym.size as i32),
        value
      })
    } else {
      Decl::Variable(VariableDecl {
        symbol: index,
        name,
        ty: TypeRef::Builtin(builtin),
        value
      })
    };

    self.decls.insert(index, decl);
    if top_level {
      self.decls.push_top_level(index);
    }

    Ok(index)
  }
}

/// The compile-time value of a const symbol, as a literal or array of
/// literals; `None` for runtime-mutable slots.
fn variable_value(sym: &Symbol) -> Option<Expression> {
  if !sym.flags.constant {
    return None;
  }

  let values: Vec<Expression> = match &sym.data {
    SymbolData::Ints(values) => values.iter().map(|&v| Expression::Int(v)).collect(),
    SymbolData::Floats(values) => values.iter().map(|&v| Expression::Float(v)).collect(),
    SymbolData::Strings(values) => {
      values
        .iter()
        .map(|v| Expression::String(v.clone()))
        .collect()
    }
    SymbolData::None => return None
  };

  if sym.size > 1 {
    Some(Expression::Array(values))
  } else {
    values.into_iter().next()
  }
}

fn builtin_type(ty: DataType) -> Option<BuiltinType> {
  match ty {
    DataType::Void => Some(BuiltinType::Void),
    DataType::Float => Some(BuiltinType::Float),
    DataType::Int => Some(BuiltinType::Int),
    DataType::String => Some(BuiltinType::String),
    DataType::Function => Some(BuiltinType::Func),
    DataType::Instance => Some(BuiltinType::Instance),
    DataType::Class | DataType::Prototype => None
  }
}

/// Strips the qualifying prefix of a dotted name. Returns whether the name
/// was unqualified, i.e. belongs to a top-level declaration.
fn short_name(name: &str) -> (bool, String) {
  match name.rfind('.') {
    Some(dot) => (false, name[dot + 1..].to_owned()),
    None => (true, name.to_owned())
  }
}

#[derive(Debug, Error)]
pub enum DecompileError {
  #[error("symbol index {index} is not part of the symbol table")]
  UnresolvedSymbol { index: usize },
  #[error("symbol {index} has kind {kind}, which cannot be decompiled here")]
  UnsupportedSymbolKind { index: usize, kind: DataType },
  #[error("call target {target:#x} does not resolve to a symbol")]
  UnresolvedCallTarget { target: i32 },
  #[error("call target symbol {index} is not a callable function")]
  InvalidCallTarget { index: usize },
  #[error("assignment at address {address} does not target a variable access")]
  MalformedAssignmentTarget { address: u32 },
  #[error("conditional at address {address} has an unsupported branch shape")]
  MalformedConditional { address: u32 },
  #[error(transparent)]
  Disassemble(#[from] DisassembleError)
}
