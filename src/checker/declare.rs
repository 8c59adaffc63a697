//! Declaration registration (spec.md §4.3, steps 1-3), run once per module
//! before any type is resolved.

use std::path::{Path, PathBuf};

use crate::{
    lexer::Span,
    module::{DeclSlot, ExportBinding, ExportKind, ImportBinding, Module},
    parser::ast::{Export, ImportClause, TopLevelStatement},
};

use super::{
    error::{ExportClash, ExportNotFound, ModuleNotFound, NameClash, TypeCheckError},
    Checker,
};

impl Checker {
    /// Ensures `path`'s module is parsed, its imports transitively
    /// registered, and its own declarations/exports populated. Safe to call
    /// more than once per path (registration is cached, tolerating import
    /// cycles per spec.md §4.3 "recursively, with caching").
    pub fn register_module(&mut self, path: &Path) -> Result<(), TypeCheckError> {
        let path = path.to_path_buf();
        if self.registered.contains(&path) {
            return Ok(());
        }
        // Mark before recursing so a cyclic import sees a (partially)
        // registered module instead of registering it again.
        self.registered.insert(path.clone());

        let program = self.modules.get(&path).expect("module already parsed").program.clone();

        for top in &program {
            if let TopLevelStatement::Import(import) = top {
                let (target_path, target_source) =
                    match self.resolver.resolve(&path, &import.path) {
                        Ok(found) => found,
                        Err(e) => {
                            self.errors.push(TypeCheckError::ModuleNotFound(
                                ModuleNotFound {
                                    reference: import.path.clone(),
                                },
                                import.position.clone(),
                            ));
                            let _ = e;
                            continue;
                        }
                    };

                if !self.modules.contains_key(&target_path) {
                    match crate::parser::parse_program(&target_path.to_string_lossy(), &target_source) {
                        Ok(target_program) => {
                            let name = crate::lexer::file_stem(&target_path);
                            self.modules
                                .insert(target_path.clone(), Module::new(name, target_path.clone(), target_program));
                        }
                        Err(parse_error) => {
                            self.errors.push(TypeCheckError::ModuleNotFound(
                                ModuleNotFound {
                                    reference: format!("{} ({parse_error})", import.path),
                                },
                                import.position.clone(),
                            ));
                            continue;
                        }
                    }
                }

                self.register_module(&target_path)?;

                match &import.clause {
                    ImportClause::Whole(alias) => {
                        self.bind_import(&path, alias, &target_path, "*", import.position.clone());
                    }
                    ImportClause::Named(items) => {
                        for item in items {
                            let exported = self
                                .modules
                                .get(&target_path)
                                .and_then(|m| m.exports.get(&item.imported_name))
                                .is_some();
                            if !exported {
                                self.errors.push(TypeCheckError::ExportNotFound(
                                    ExportNotFound {
                                        module: import.path.clone(),
                                        name: item.imported_name.clone(),
                                    },
                                    item.position.clone(),
                                ));
                                continue;
                            }
                            self.bind_import(
                                &path,
                                &item.local_alias,
                                &target_path,
                                &item.imported_name,
                                item.position.clone(),
                            );
                        }
                    }
                }
            }
        }

        self.register_local_declarations(&path, &program);
        self.register_exports(&path, &program);

        Ok(())
    }

    fn bind_import(&mut self, path: &Path, alias: &str, target: &Path, exported_name: &str, position: Span) {
        let module = self.modules.get_mut(path).expect("module registered");
        if module.local_names().any(|n| n == alias) {
            self.errors
                .push(TypeCheckError::NameClash(NameClash { name: alias.to_owned() }, position));
            return;
        }
        module.imports.insert(
            alias.to_owned(),
            ImportBinding {
                module_path: target.to_path_buf(),
                exported_name: exported_name.to_owned(),
            },
        );
    }

    fn register_local_declarations(&mut self, path: &Path, program: &[TopLevelStatement<()>]) {
        for top in program {
            let decl = match top {
                TopLevelStatement::Function(_)
                | TopLevelStatement::TypeDeclaration(_)
                | TopLevelStatement::Constant(_) => top,
                TopLevelStatement::Export(Export::Inline(inner)) => inner.as_ref(),
                _ => continue,
            };
            self.register_one_declaration(path, decl);
        }
    }

    fn register_one_declaration(&mut self, path: &Path, decl: &TopLevelStatement<()>) {
        let module = self.modules.get_mut(path).expect("module registered");
        match decl {
            TopLevelStatement::Function(f) => {
                if module.local_names().any(|n| n == f.name) {
                    self.errors.push(TypeCheckError::NameClash(
                        NameClash { name: f.name.clone() },
                        f.position.clone(),
                    ));
                    return;
                }
                module.functions.insert(f.name.clone(), f.clone());
                module.function_slots.insert(f.name.clone(), DeclSlot::default());
            }
            TopLevelStatement::TypeDeclaration(t) => {
                if module.local_names().any(|n| n == t.name) {
                    self.errors.push(TypeCheckError::NameClash(
                        NameClash { name: t.name.clone() },
                        t.position.clone(),
                    ));
                    return;
                }
                module.types.insert(t.name.clone(), t.clone());
                module.type_slots.insert(t.name.clone(), DeclSlot::default());
            }
            TopLevelStatement::Constant(c) => {
                if module.local_names().any(|n| n == c.name) {
                    self.errors.push(TypeCheckError::NameClash(
                        NameClash { name: c.name.clone() },
                        c.position.clone(),
                    ));
                    return;
                }
                module.constants.insert(c.name.clone(), c.clone());
                module.constant_slots.insert(c.name.clone(), DeclSlot::default());
            }
            _ => {}
        }
    }

    fn register_exports(&mut self, path: &Path, program: &[TopLevelStatement<()>]) {
        for top in program {
            let (exported_name, local_name, kind, position) = match top {
                TopLevelStatement::Export(Export::Inline(inner)) => match inner.as_ref() {
                    TopLevelStatement::Function(f) => {
                        (f.name.clone(), f.name.clone(), ExportKind::Function, f.position.clone())
                    }
                    TopLevelStatement::TypeDeclaration(t) => {
                        (t.name.clone(), t.name.clone(), ExportKind::Type, t.position.clone())
                    }
                    TopLevelStatement::Constant(c) => {
                        (c.name.clone(), c.name.clone(), ExportKind::Value, c.position.clone())
                    }
                    _ => continue,
                },
                TopLevelStatement::Export(Export::Forward { name, position }) => {
                    let module = self.modules.get(path).expect("module registered");
                    let kind = if module.functions.contains_key(name) {
                        ExportKind::Function
                    } else if module.types.contains_key(name) {
                        ExportKind::Type
                    } else if module.constants.contains_key(name) {
                        ExportKind::Value
                    } else {
                        self.errors.push(TypeCheckError::ExportNotFound(
                            ExportNotFound {
                                module: path.to_string_lossy().into_owned(),
                                name: name.clone(),
                            },
                            position.clone(),
                        ));
                        continue;
                    };
                    (name.clone(), name.clone(), kind, position.clone())
                }
                TopLevelStatement::Namespace(ns) => {
                    (ns.name.clone(), ns.name.clone(), ExportKind::Namespace, ns.position.clone())
                }
                _ => continue,
            };

            let module = self.modules.get_mut(path).expect("module registered");
            if module.exports.contains_key(&exported_name) {
                self.errors.push(TypeCheckError::ExportClash(
                    ExportClash { name: exported_name },
                    position,
                ));
                continue;
            }
            module
                .exports
                .insert(exported_name, ExportBinding { local_name, kind });
        }
    }
}

pub fn parse_entry_module(path: &Path) -> Result<(PathBuf, Module), Box<dyn std::error::Error>> {
    let canonical = std::fs::canonicalize(path)?;
    let source = std::fs::read_to_string(&canonical)?;
    let program = crate::parser::parse_program(&canonical.to_string_lossy(), &source)?;
    let name = crate::lexer::file_stem(&canonical);
    Ok((canonical.clone(), Module::new(name, canonical, program)))
}
