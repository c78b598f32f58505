use std::collections::HashMap;

use super::{Block, Expression};

/// A built-in Daedalus type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinType {
  Void,
  Float,
  Int,
  String,
  Func,
  Instance
}

impl BuiltinType {
  pub fn name(&self) -> &'static str {
    match self {
      Self::Void => "void",
      Self::Float => "float",
      Self::Int => "int",
      Self::String => "string",
      Self::Func => "func",
      Self::Instance => "instance"
    }
  }
}

/// A type position in a declaration: either a built-in or a user class,
/// the latter referenced by its symbol index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeRef {
  Builtin(BuiltinType),
  Class(usize)
}

/// A named program entity recovered from the symbol table.
///
/// All cross-references between declarations are symbol indices into the
/// [`Declarations`] arena, never owned copies, so every mention of a symbol
/// resolves to the same node.
#[derive(Debug, Clone, PartialEq)]
pub enum Decl {
  Class(ClassDecl),
  Prototype(PrototypeDecl),
  Instance(InstanceDecl),
  Function(FunctionDecl),
  Variable(VariableDecl),
  VariableArray(VariableArrayDecl)
}

impl Decl {
  pub fn symbol(&self) -> usize {
    match self {
      Self::Class(decl) => decl.symbol,
      Self::Prototype(decl) => decl.symbol,
      Self::Instance(decl) => decl.symbol,
      Self::Function(decl) => decl.symbol,
      Self::Variable(decl) => decl.symbol,
      Self::VariableArray(decl) => decl.symbol
    }
  }

  pub fn name(&self) -> &str {
    match self {
      Self::Class(decl) => &decl.name,
      Self::Prototype(decl) => &decl.name,
      Self::Instance(decl) => &decl.name,
      Self::Function(decl) => &decl.name,
      Self::Variable(decl) => &decl.name,
      Self::VariableArray(decl) => &decl.name
    }
  }

  /// The lazily built body, for the declaration kinds that carry one.
  pub fn body(&self) -> Option<&Block> {
    match self {
      Self::Prototype(decl) => decl.body.as_ref(),
      Self::Instance(decl) => decl.body.as_ref(),
      Self::Function(decl) => decl.body.as_ref(),
      _ => None
    }
  }

  pub fn clear_body(&mut self) {
    match self {
      Self::Prototype(decl) => decl.body = None,
      Self::Instance(decl) => decl.body = None,
      Self::Function(decl) => decl.body = None,
      _ => {}
    }
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassDecl {
  pub symbol:  usize,
  pub name:    String,
  pub members: Vec<usize>
}

#[derive(Debug, Clone, PartialEq)]
pub struct PrototypeDecl {
  pub symbol: usize,
  pub name:   String,
  /// The parent class symbol.
  pub parent: usize,
  pub body:   Option<Block>
}

#[derive(Debug, Clone, PartialEq)]
pub struct InstanceDecl {
  pub symbol:           usize,
  pub name:             String,
  pub parent_class:     Option<usize>,
  pub parent_prototype: Option<usize>,
  pub body:             Option<Block>
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDecl {
  pub symbol:      usize,
  pub name:        String,
  pub return_type: TypeRef,
  pub parameters:  Vec<usize>,
  pub locals:      Vec<usize>,
  pub body:        Option<Block>
}

#[derive(Debug, Clone, PartialEq)]
pub struct VariableDecl {
  pub symbol: usize,
  pub name:   String,
  pub ty:     TypeRef,
  /// The compile-time value, present only for const symbols.
  pub value:  Option<Expression>
}

#[derive(Debug, Clone, PartialEq)]
pub struct VariableArrayDecl {
  pub symbol:        usize,
  pub name:          String,
  pub ty:            TypeRef,
  pub element_count: Expression,
  pub value:         Option<Expression>
}

/// The declaration arena, keyed by symbol index.
///
/// At most one declaration exists per symbol index for the lifetime of a
/// decompilation session; `top_level` records first-build order.
#[derive(Debug, Default)]
pub struct Declarations {
  decls:     HashMap<usize, Decl>,
  top_level: Vec<usize>
}

impl Declarations {
  pub fn get(&self, index: usize) -> Option<&Decl> {
    self.decls.get(&index)
  }

  pub fn get_mut(&mut self, index: usize) -> Option<&mut Decl> {
    self.decls.get_mut(&index)
  }

  pub fn contains(&self, index: usize) -> bool {
    self.decls.contains_key(&index)
  }

  pub fn insert(&mut self, index: usize, decl: Decl) {
    self.decls.insert(index, decl);
  }

  pub fn push_top_level(&mut self, index: usize) {
    self.top_level.push(index);
  }

  pub fn top_level(&self) -> &[usize] {
    &self.top_level
  }

  pub fn is_top_level(&self, index: usize) -> bool {
    self.top_level.contains(&index)
  }

  pub fn clear_bodies(&mut self) {
    for decl in self.decls.values_mut() {
      decl.clear_body();
    }
  }

  /// The symbols that are "in scope" of a declaration: class members,
  /// function locals, or the members a (possibly prototype-derived) instance
  /// inherits from its class.
  pub fn scope_members(&self, index: usize) -> Vec<usize> {
    match self.get(index) {
      Some(Decl::Class(class)) => class.members.clone(),
      Some(Decl::Function(function)) => function.locals.clone(),
      Some(Decl::Instance(instance)) => {
        instance
          .parent_class
          .and_then(|parent| {
            match self.get(parent) {
              Some(Decl::Class(class)) => Some(class.members.clone()),
              _ => None
            }
          })
          .unwrap_or_default()
      }
      _ => Vec::new()
    }
  }

  /// The declared type of a variable-like declaration. Instances report
  /// their parent class, or the `instance` built-in when unparented.
  pub fn variable_type(&self, index: usize) -> Option<TypeRef> {
    match self.get(index) {
      Some(Decl::Variable(decl)) => Some(decl.ty),
      Some(Decl::VariableArray(decl)) => Some(decl.ty),
      Some(Decl::Instance(decl)) => {
        Some(
          decl
            .parent_class
            .map(TypeRef::Class)
            .unwrap_or(TypeRef::Builtin(BuiltinType::Instance))
        )
      }
      _ => None
    }
  }
}
