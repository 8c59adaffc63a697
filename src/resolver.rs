//! The module resolver (spec.md §6): given a current module path and a
//! reference string, returns an absolute path and source text, or "not
//! found". Grounded in the teacher's `loader::convert_to_path` /
//! `load_module`, simplified to plain filesystem paths (no `@std`-style
//! package registry — out of scope per spec.md §1's non-goals around
//! separate compilation/linking).

use std::{fmt, fs, path::{Path, PathBuf}};

use log::trace;

#[derive(Debug, Clone)]
pub struct ResolveError {
    pub reference: String,
    pub reason: String,
}

impl fmt::Display for ResolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Module \"{}\" does not exist ({})", self.reference, self.reason)
    }
}

impl std::error::Error for ResolveError {}

pub trait ModuleResolver {
    /// Resolves `reference` (as written in an `import from "..."` clause)
    /// relative to `from`, the absolute path of the importing module.
    /// Returns the resolved absolute path and the module's source text.
    fn resolve(&self, from: &Path, reference: &str) -> Result<(PathBuf, String), ResolveError>;
}

/// A plain filesystem resolver: `.`/`..`-relative references resolve next
/// to the importing file; anything else is looked up in `search_paths` in
/// order (a minimal stand-in for a package registry). `.ren` is appended
/// when the reference has no extension.
pub struct FilesystemResolver {
    pub search_paths: Vec<PathBuf>,
}

impl FilesystemResolver {
    pub fn new(search_paths: Vec<PathBuf>) -> Self {
        Self { search_paths }
    }

    fn with_extension(path: PathBuf) -> PathBuf {
        if path.extension().is_some() {
            path
        } else {
            path.with_extension("ren")
        }
    }

    fn candidate_paths(&self, from: &Path, reference: &str) -> Vec<PathBuf> {
        if reference.starts_with('.') {
            let base = from.parent().unwrap_or_else(|| Path::new("."));
            return vec![Self::with_extension(base.join(reference))];
        }
        if Path::new(reference).is_absolute() {
            return vec![Self::with_extension(PathBuf::from(reference))];
        }
        self.search_paths
            .iter()
            .map(|root| Self::with_extension(root.join(reference)))
            .collect()
    }
}

impl ModuleResolver for FilesystemResolver {
    fn resolve(&self, from: &Path, reference: &str) -> Result<(PathBuf, String), ResolveError> {
        trace!("resolving import '{reference}' from '{}'", from.display());

        for candidate in self.candidate_paths(from, reference) {
            if let Ok(canonical) = fs::canonicalize(&candidate) {
                match fs::read_to_string(&canonical) {
                    Ok(source) => return Ok((canonical, source)),
                    Err(e) => {
                        return Err(ResolveError {
                            reference: reference.to_owned(),
                            reason: e.to_string(),
                        })
                    }
                }
            }
        }

        Err(ResolveError {
            reference: reference.to_owned(),
            reason: "no matching file on any search path".to_owned(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn resolves_relative_import() {
        let dir = std::env::temp_dir().join(format!("ren_resolver_test_{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let main = dir.join("main.ren");
        let lib = dir.join("lib.ren");
        fs::write(&lib, "const x = 1;").unwrap();
        let mut f = fs::File::create(&main).unwrap();
        writeln!(f, "import from \"./lib\": x").unwrap();

        let resolver = FilesystemResolver::new(vec![]);
        let (resolved_path, source) = resolver.resolve(&main, "./lib").expect("resolves");
        assert_eq!(resolved_path, fs::canonicalize(&lib).unwrap());
        assert_eq!(source, "const x = 1;");

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn missing_module_is_reported() {
        let resolver = FilesystemResolver::new(vec![]);
        let err = resolver
            .resolve(Path::new("/tmp/does/not/exist/main.ren"), "./missing")
            .unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }
}
