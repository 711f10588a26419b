//! Dynamic module loading.
//!
//! [`ModuleCache`] opens shared libraries and keeps them resident until it is
//! dropped. Any builder resolved from a library is only valid while the
//! cache holds it, so the cache must outlive every component it produced.

use std::path::{Path, PathBuf};

use libloading::Library;
use tracing::{debug, trace};

use engine_component::plugin::{self, EntryPoint};

/// Platform file name of the module implementing `kind`.
#[must_use]
pub fn module_file_name(kind: &str) -> String {
    format!(
        "{}{kind}{}",
        std::env::consts::DLL_PREFIX,
        std::env::consts::DLL_SUFFIX
    )
}

/// Candidate paths for a module, one per search directory:
/// `<dir>/<family>/<prefix><type><suffix>`.
#[must_use]
pub fn candidates(search_path: &[PathBuf], family: &str, kind: &str) -> Vec<PathBuf> {
    let file = module_file_name(kind);
    search_path
        .iter()
        .map(|dir| dir.join(family).join(&file))
        .collect()
}

/// Splits a comma-separated search path, dropping blank entries.
#[must_use]
pub fn parse_search_path(compath: &str) -> Vec<PathBuf> {
    compath
        .split(',')
        .map(str::trim)
        .filter(|dir| !dir.is_empty())
        .map(PathBuf::from)
        .collect()
}

struct LoadedModule {
    path: PathBuf,
    library: Library,
}

/// Keeps loaded modules resident. Opening a path twice reuses the handle.
#[derive(Default)]
pub struct ModuleCache {
    modules: Vec<LoadedModule>,
}

/// Handle to a module held by a [`ModuleCache`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModuleId(usize);

impl ModuleCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens the library at `path`, or returns the handle already open for it.
    ///
    /// # Errors
    ///
    /// The platform loader's error when the file is missing or not a
    /// loadable library.
    pub fn open(&mut self, path: &Path) -> Result<ModuleId, libloading::Error> {
        let key = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        if let Some(index) = self.modules.iter().position(|m| m.path == key) {
            trace!(path = %key.display(), "module already loaded");
            return Ok(ModuleId(index));
        }
        // SAFETY: loading runs the library's initialisers. Component modules
        // are trusted code built against the same component crate.
        let library = unsafe { Library::new(&key) }?;
        debug!(path = %key.display(), "module loaded");
        self.modules.push(LoadedModule { path: key, library });
        Ok(ModuleId(self.modules.len() - 1))
    }

    /// Resolves the factory for `kind`: `build_<kind>`, falling back to the
    /// generic `build`. Returns the symbol name with the entry point.
    #[must_use]
    pub fn entry(&self, id: ModuleId, kind: &str) -> Option<(String, EntryPoint)> {
        let module = self.modules.get(id.0)?;
        [plugin::entry_symbol(kind), plugin::GENERIC_ENTRY.to_string()]
            .into_iter()
            .find_map(|name| {
                // SAFETY: the symbol is declared by the module ABI as an
                // `EntryPoint`; the pointer stays valid while the module is
                // held here.
                let symbol = unsafe { module.library.get::<EntryPoint>(name.as_bytes()) }.ok()?;
                Some((name, *symbol))
            })
    }

    /// Unloads a module nothing was built from. Handles after it shift down.
    pub fn discard(&mut self, id: ModuleId) {
        if id.0 < self.modules.len() {
            let module = self.modules.remove(id.0);
            debug!(path = %module.path.display(), "module discarded");
        }
    }

    /// Path a module was loaded from.
    #[must_use]
    pub fn path(&self, id: ModuleId) -> Option<&Path> {
        self.modules.get(id.0).map(|m| m.path.as_path())
    }

    /// Returns `true` if `path` is loaded.
    #[must_use]
    pub fn is_loaded(&self, path: &Path) -> bool {
        let key = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        self.modules.iter().any(|m| m.path == key)
    }

    /// Number of resident modules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

impl std::fmt::Debug for ModuleCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.modules.iter().map(|m| m.path.display()))
            .finish()
    }
}
