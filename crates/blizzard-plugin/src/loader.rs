// SPDX-FileCopyrightText: 2026 Blizzard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Dynamic plugin loading using libloading.
//!
//! A plugin library exports `blizzard_plugin_register` and, optionally,
//! `blizzard_plugin_release`. The loader resolves both, calls the register
//! function, and turns its result into a validated [`PluginRegistration`].

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use blizzard_core::{BlizzardError, PluginRegistration, PluginSource};
use libloading::{Library, Symbol};

use crate::abi::{REGISTER_SYMBOL, RELEASE_SYMBOL, RegisterFn, ReleaseFn};
use crate::ffi::registration_from_raw;

/// A registration obtained from a plugin, together with where it came from.
pub struct LoadedPlugin {
    pub registration: PluginRegistration,
    pub source: PluginSource,
    /// Keeps the library mapped for as long as the plugin is registered.
    pub library: Option<Arc<Library>>,
}

impl std::fmt::Debug for LoadedPlugin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadedPlugin")
            .field("name", &self.registration.name())
            .field("source", &self.source)
            .field("elements", &self.registration.element_count())
            .finish()
    }
}

/// Plugin loader for shared libraries.
#[derive(Debug, Clone)]
pub struct PluginLoader {
    search_paths: Vec<PathBuf>,
}

impl PluginLoader {
    /// Create a loader with the default search paths.
    pub fn new() -> Self {
        Self {
            search_paths: vec![
                PathBuf::from("."),
                PathBuf::from("/usr/lib/blizzard/plugins"),
                PathBuf::from("/usr/local/lib/blizzard/plugins"),
            ],
        }
    }

    /// Create a loader that only searches `paths`.
    pub fn with_search_paths(paths: impl IntoIterator<Item = impl Into<PathBuf>>) -> Self {
        Self {
            search_paths: paths.into_iter().map(Into::into).collect(),
        }
    }

    pub fn add_search_path(&mut self, path: impl Into<PathBuf>) {
        self.search_paths.push(path.into());
    }

    pub fn search_paths(&self) -> &[PathBuf] {
        &self.search_paths
    }

    /// Load and register a plugin from a specific library path.
    ///
    /// # Safety
    ///
    /// Loading a library runs arbitrary code. The library must be trusted and
    /// implement the registration ABI faithfully.
    pub unsafe fn load_from_path(&self, path: impl AsRef<Path>) -> Result<LoadedPlugin, BlizzardError> {
        let path = path.as_ref();
        let shown = path.display().to_string();

        // SAFETY: Caller guarantees the library is trusted.
        let library = unsafe { Library::new(path) }.map_err(|e| BlizzardError::Load {
            path: shown.clone(),
            message: e.to_string(),
        })?;
        let library = Arc::new(library);

        // SAFETY: The symbol type matches the ABI's register signature.
        let register: RegisterFn = unsafe {
            let symbol: Symbol<RegisterFn> =
                library
                    .get(REGISTER_SYMBOL.as_bytes())
                    .map_err(|_| BlizzardError::MissingSymbol {
                        symbol: REGISTER_SYMBOL.to_string(),
                        path: shown.clone(),
                    })?;
            *symbol
        };
        // SAFETY: As above, for the optional release signature.
        let release: Option<ReleaseFn> = unsafe {
            library
                .get::<ReleaseFn>(RELEASE_SYMBOL.as_bytes())
                .ok()
                .map(|symbol| *symbol)
        };
        if release.is_none() {
            tracing::debug!(path = %shown, "plugin exports no release function");
        }

        // SAFETY: The function pointers stay valid because `library` travels
        // with the registration.
        let loaded = unsafe {
            self.load_from_entry_points(
                register,
                release,
                Some(library),
                PluginSource::Dynamic {
                    path: path.to_path_buf(),
                },
            )
        }?;
        tracing::info!(
            plugin = %loaded.registration.name(),
            path = %shown,
            elements = loaded.registration.element_count(),
            "plugin loaded"
        );
        Ok(loaded)
    }

    /// Register a plugin through raw entry points that are already resolved.
    ///
    /// Used for libraries opened elsewhere and for plugins linked into the
    /// host that expose the C ABI.
    ///
    /// # Safety
    ///
    /// `register` and `release` must follow the registration ABI and stay
    /// callable for as long as the returned registration (or any element
    /// handler cloned from it) is alive. If they live in `library`, pass it.
    pub unsafe fn load_from_entry_points(
        &self,
        register: RegisterFn,
        release: Option<ReleaseFn>,
        library: Option<Arc<Library>>,
        source: PluginSource,
    ) -> Result<LoadedPlugin, BlizzardError> {
        let origin = source.to_string();
        // SAFETY: Caller guarantees `register` follows the ABI.
        let raw = unsafe { register() };
        // SAFETY: `raw` came from `register`; `release` and `library` match it.
        let registration =
            unsafe { registration_from_raw(raw, release, library.clone(), &origin) }?;
        Ok(LoadedPlugin {
            registration,
            source,
            library,
        })
    }

    /// Load a plugin by name from the search paths.
    ///
    /// `thermostat` resolves to `libthermostat.so` on Linux and the platform's
    /// equivalent elsewhere.
    ///
    /// # Safety
    ///
    /// See [`PluginLoader::load_from_path`].
    pub unsafe fn load_by_name(&self, name: &str) -> Result<LoadedPlugin, BlizzardError> {
        let file_name = library_file_name(name);
        for search_path in &self.search_paths {
            let path = search_path.join(&file_name);
            if path.exists() {
                // SAFETY: Caller guarantees plugins on the search path are trusted.
                return unsafe { self.load_from_path(&path) };
            }
        }
        Err(BlizzardError::PluginNotFound(format!(
            "{name} ({file_name} not found in search paths)"
        )))
    }

    /// Load every shared library in `dir`, in file-name order.
    ///
    /// Each entry pairs the library path with its own result so one bad
    /// plugin does not hide the others. Fails only if `dir` cannot be read.
    ///
    /// # Safety
    ///
    /// See [`PluginLoader::load_from_path`].
    pub unsafe fn load_all_from_dir(
        &self,
        dir: impl AsRef<Path>,
    ) -> Result<Vec<(PathBuf, Result<LoadedPlugin, BlizzardError>)>, BlizzardError> {
        let dir = dir.as_ref();
        let entries = std::fs::read_dir(dir).map_err(|e| BlizzardError::Load {
            path: dir.display().to_string(),
            message: e.to_string(),
        })?;

        let mut paths: Vec<PathBuf> = entries
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| is_shared_library(path))
            .collect();
        paths.sort();
        tracing::debug!(dir = %dir.display(), candidates = paths.len(), "scanning plugin directory");

        Ok(paths
            .into_iter()
            .map(|path| {
                // SAFETY: Caller guarantees all plugins in the directory are trusted.
                let result = unsafe { self.load_from_path(&path) };
                (path, result)
            })
            .collect())
    }
}

impl Default for PluginLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Platform file name for a plugin library called `name`.
pub fn library_file_name(name: &str) -> String {
    format!(
        "{}{name}{}",
        std::env::consts::DLL_PREFIX,
        std::env::consts::DLL_SUFFIX
    )
}

fn is_shared_library(path: &Path) -> bool {
    path.is_file() && path.extension() == Some(OsStr::new(std::env::consts::DLL_EXTENSION))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abi::RawPluginRegistration;
    use crate::export::{export_registration, release_registration};
    use blizzard_core::PluginDescription;

    unsafe extern "C" fn register_empty() -> *const RawPluginRegistration {
        export_registration(Some(PluginRegistration::without_elements(
            PluginDescription::named("empty").with_version("0.1.0"),
        )))
    }

    unsafe extern "C" fn register_nothing() -> *const RawPluginRegistration {
        std::ptr::null()
    }

    unsafe extern "C" fn release(raw: *const RawPluginRegistration) {
        unsafe { release_registration(raw) }
    }

    #[test]
    fn default_search_paths() {
        let loader = PluginLoader::new();
        assert_eq!(loader.search_paths().len(), 3);
        assert_eq!(loader.search_paths()[0], PathBuf::from("."));
    }

    #[test]
    fn add_search_path_appends() {
        let mut loader = PluginLoader::with_search_paths(["/opt/a"]);
        loader.add_search_path("/opt/b");
        assert_eq!(
            loader.search_paths(),
            &[PathBuf::from("/opt/a"), PathBuf::from("/opt/b")]
        );
    }

    #[test]
    fn library_file_name_uses_platform_affixes() {
        let name = library_file_name("thermostat");
        assert!(name.contains("thermostat"));
        assert!(name.ends_with(std::env::consts::DLL_SUFFIX));
    }

    #[test]
    fn load_nonexistent_plugin_by_name() {
        let dir = tempfile::tempdir().unwrap();
        let loader = PluginLoader::with_search_paths([dir.path()]);
        let err = unsafe { loader.load_by_name("nonexistent_plugin_xyz") }.unwrap_err();
        assert!(matches!(err, BlizzardError::PluginNotFound(_)));
    }

    #[test]
    fn load_from_missing_path_is_a_load_error() {
        let loader = PluginLoader::new();
        let err = unsafe { loader.load_from_path("/definitely/not/here/libx.so") }.unwrap_err();
        assert!(matches!(err, BlizzardError::Load { .. }));
    }

    #[test]
    fn load_all_from_missing_dir_fails() {
        let loader = PluginLoader::new();
        let result = unsafe { loader.load_all_from_dir("/definitely/not/a/dir") };
        assert!(result.is_err());
    }

    #[test]
    fn load_all_from_dir_ignores_other_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("README.txt"), "not a plugin").unwrap();
        std::fs::write(dir.path().join("plugin.toml"), "[plugin]").unwrap();
        let loader = PluginLoader::new();
        let results = unsafe { loader.load_all_from_dir(dir.path()) }.unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn load_all_from_dir_reports_bad_libraries_individually() {
        let dir = tempfile::tempdir().unwrap();
        let bogus = dir.path().join(library_file_name("bogus"));
        std::fs::write(&bogus, b"not an object file").unwrap();
        let loader = PluginLoader::new();
        let results = unsafe { loader.load_all_from_dir(dir.path()) }.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].0, bogus);
        assert!(matches!(results[0].1, Err(BlizzardError::Load { .. })));
    }

    #[test]
    fn entry_points_produce_registration() {
        let loader = PluginLoader::new();
        let loaded = unsafe {
            loader.load_from_entry_points(register_empty, Some(release), None, PluginSource::Static)
        }
        .unwrap();
        assert_eq!(loaded.registration.name(), "empty");
        assert_eq!(loaded.registration.element_count(), 0);
        assert_eq!(loaded.source, PluginSource::Static);
    }

    #[test]
    fn null_entry_point_result_is_unavailable() {
        let loader = PluginLoader::new();
        let err = unsafe {
            loader.load_from_entry_points(register_nothing, None, None, PluginSource::Static)
        }
        .unwrap_err();
        assert!(matches!(err, BlizzardError::RegistrationUnavailable { plugin } if plugin == "static"));
    }
}
