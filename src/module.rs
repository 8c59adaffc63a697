//! The `Module` table (spec.md §3 "Module").
//!
//! A module owns its parsed AST plus the four name spaces the checker
//! populates while registering declarations: imports, functions, types,
//! constants, and exports. Each named declaration slot carries a
//! `resolving` flag for cycle detection, set while the checker is actively
//! resolving that declaration's type.

use std::{collections::HashMap, path::PathBuf};

use crate::{
    parser::ast::{Constant, Function, Program, TypeDeclaration},
    typesys::Type,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportKind {
    Type,
    Function,
    Value,
    Namespace,
}

/// Where an alias bound in this module actually comes from.
#[derive(Debug, Clone)]
pub struct ImportBinding {
    pub module_path: PathBuf,
    pub exported_name: String,
}

#[derive(Debug, Clone)]
pub struct ExportBinding {
    pub local_name: String,
    pub kind: ExportKind,
}

/// Resolution state of a single declaration slot, shared by the type,
/// function, and constant namespaces (spec.md §3 "a `resolving` flag used
/// for cycle detection and, once checked, a resolved type").
#[derive(Debug, Clone, Default)]
pub struct DeclSlot {
    pub resolving: bool,
    pub resolved: Option<Type>,
}

pub struct Module {
    pub name: String,
    pub path: PathBuf,
    pub program: Program<()>,

    pub imports: HashMap<String, ImportBinding>,
    pub functions: HashMap<String, Function<()>>,
    pub types: HashMap<String, TypeDeclaration>,
    pub constants: HashMap<String, Constant<()>>,
    pub exports: HashMap<String, ExportBinding>,

    pub function_slots: HashMap<String, DeclSlot>,
    pub type_slots: HashMap<String, DeclSlot>,
    pub constant_slots: HashMap<String, DeclSlot>,
}

impl Module {
    pub fn new(name: String, path: PathBuf, program: Program<()>) -> Self {
        Self {
            name,
            path,
            program,
            imports: HashMap::new(),
            functions: HashMap::new(),
            types: HashMap::new(),
            constants: HashMap::new(),
            exports: HashMap::new(),
            function_slots: HashMap::new(),
            type_slots: HashMap::new(),
            constant_slots: HashMap::new(),
        }
    }

    /// Every name this module has bound locally, regardless of kind —
    /// used to detect clashes when registering a new declaration or import.
    pub fn local_names(&self) -> impl Iterator<Item = &str> {
        self.functions
            .keys()
            .chain(self.types.keys())
            .chain(self.constants.keys())
            .chain(self.imports.keys())
            .map(String::as_str)
    }
}

/// Modules keyed by their canonicalized absolute path, so cyclic imports
/// resolve to the same in-progress record instead of re-parsing.
pub type Modules = HashMap<PathBuf, Module>;
