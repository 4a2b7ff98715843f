// SPDX-FileCopyrightText: 2026 Blizzard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The plugin host: consumer of registrations.
//!
//! `PluginHost` stores one `PluginEntry` per registered plugin, keyed by the
//! name from its description, plus an index from data element name to owning
//! plugin. Registration is all-or-nothing: a plugin whose name or any element
//! name collides with an existing registration is rejected without side
//! effects. Bus operations are routed through the index to the element's
//! handler.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use blizzard_core::{
    BlizzardError, DataElement, DataElementList, ElementType, FailurePolicy, Plugin,
    PluginDescription, PluginSource, SubscribeAction, Value, schema,
};
use libloading::Library;
use serde::Serialize;

use crate::loader::{LoadedPlugin, PluginLoader};

/// A registered plugin.
pub struct PluginEntry {
    pub description: PluginDescription,
    pub source: PluginSource,
    pub elements: DataElementList,
    // Dropped after `elements`, so handlers release before the library unloads.
    _library: Option<Arc<Library>>,
}

impl PluginEntry {
    pub fn name(&self) -> &str {
        &self.description.name
    }
}

impl std::fmt::Debug for PluginEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginEntry")
            .field("name", &self.description.name)
            .field("source", &self.source)
            .field("elements", &self.elements.len())
            .finish()
    }
}

/// What to load at startup and how to react to failures.
#[derive(Debug, Clone, Default)]
pub struct LoadPlan {
    /// Directories scanned for shared libraries.
    pub directories: Vec<PathBuf>,
    /// Plugins loaded by name from the search paths.
    pub autoload: Vec<String>,
    pub policy: FailurePolicy,
}

/// A plugin that was left out by [`FailurePolicy::Skip`].
#[derive(Debug, Clone, Serialize)]
pub struct SkippedPlugin {
    /// Library path or plugin name.
    pub origin: String,
    pub reason: String,
}

/// Outcome of [`PluginHost::load_configured`].
#[derive(Debug, Clone, Default, Serialize)]
pub struct LoadReport {
    /// Names of the plugins that were registered.
    pub loaded: Vec<String>,
    pub skipped: Vec<SkippedPlugin>,
}

struct IndexedElement {
    plugin: String,
    element: DataElement,
}

/// Registry of plugins and router for their data elements.
pub struct PluginHost {
    plugins: BTreeMap<String, PluginEntry>,
    elements: BTreeMap<String, IndexedElement>,
    loader: PluginLoader,
}

impl PluginHost {
    /// Create an empty host with the default loader.
    pub fn new() -> Self {
        Self::with_loader(PluginLoader::new())
    }

    pub fn with_loader(loader: PluginLoader) -> Self {
        Self {
            plugins: BTreeMap::new(),
            elements: BTreeMap::new(),
            loader,
        }
    }

    pub fn loader(&self) -> &PluginLoader {
        &self.loader
    }

    /// Register a plugin compiled into the host.
    ///
    /// Returns the registered plugin's name.
    pub fn register_static(&mut self, plugin: &dyn Plugin) -> Result<String, BlizzardError> {
        let registration = plugin
            .register()
            .ok_or_else(|| BlizzardError::RegistrationUnavailable {
                plugin: PluginSource::Static.to_string(),
            })?;
        self.register_loaded(LoadedPlugin {
            registration,
            source: PluginSource::Static,
            library: None,
        })
    }

    /// Register a plugin that has already been loaded.
    ///
    /// The registration is validated again here since `LoadedPlugin` can be
    /// assembled by hand.
    pub fn register_loaded(&mut self, loaded: LoadedPlugin) -> Result<String, BlizzardError> {
        loaded.registration.validate()?;
        let LoadedPlugin {
            registration,
            source,
            library,
        } = loaded;
        let (elements, description) = registration.into_parts();
        let name = description.name.clone();

        if self.plugins.contains_key(&name) {
            return Err(BlizzardError::DuplicatePlugin(name));
        }
        for element in &elements {
            if let Some(existing) = self.elements.get(element.name()) {
                return Err(BlizzardError::DuplicateElement {
                    element: element.name().to_string(),
                    owner: existing.plugin.clone(),
                });
            }
        }

        for element in &elements {
            self.elements.insert(
                element.name().to_string(),
                IndexedElement {
                    plugin: name.clone(),
                    element: element.clone(),
                },
            );
        }
        tracing::info!(
            plugin = %name,
            source = %source,
            elements = elements.len(),
            "plugin registered"
        );
        self.plugins.insert(
            name.clone(),
            PluginEntry {
                description,
                source,
                elements,
                _library: library,
            },
        );
        Ok(name)
    }

    /// Load a shared library and register it.
    ///
    /// # Safety
    ///
    /// See [`PluginLoader::load_from_path`].
    pub unsafe fn load_path(&mut self, path: impl AsRef<Path>) -> Result<String, BlizzardError> {
        // SAFETY: Caller guarantees the library is trusted.
        let loaded = unsafe { self.loader.load_from_path(path) }?;
        self.register_loaded(loaded)
    }

    /// Load a plugin by name from the loader's search paths and register it.
    ///
    /// # Safety
    ///
    /// See [`PluginLoader::load_from_path`].
    pub unsafe fn load_named(&mut self, name: &str) -> Result<String, BlizzardError> {
        // SAFETY: Caller guarantees plugins on the search path are trusted.
        let loaded = unsafe { self.loader.load_by_name(name) }?;
        self.register_loaded(loaded)
    }

    /// Load everything named by `plan`, applying its failure policy.
    ///
    /// With [`FailurePolicy::Skip`] a plugin that fails to load or register is
    /// logged and recorded in the report. With [`FailurePolicy::Abort`] the
    /// first failure is returned; plugins registered before it stay registered.
    ///
    /// # Safety
    ///
    /// See [`PluginLoader::load_from_path`].
    pub unsafe fn load_configured(&mut self, plan: &LoadPlan) -> Result<LoadReport, BlizzardError> {
        let mut report = LoadReport::default();

        for dir in &plan.directories {
            // SAFETY: Caller guarantees the configured directories are trusted.
            let results = match unsafe { self.loader.load_all_from_dir(dir) } {
                Ok(results) => results,
                Err(e) => {
                    self.record_failure(&mut report, plan.policy, dir.display().to_string(), e)?;
                    continue;
                }
            };
            for (path, result) in results {
                let outcome = result.and_then(|loaded| self.register_loaded(loaded));
                self.record(&mut report, plan.policy, path.display().to_string(), outcome)?;
            }
        }

        for name in &plan.autoload {
            // SAFETY: As above.
            let outcome = unsafe { self.load_named(name) };
            self.record(&mut report, plan.policy, name.clone(), outcome)?;
        }

        tracing::info!(
            loaded = report.loaded.len(),
            skipped = report.skipped.len(),
            "plugin loading complete"
        );
        Ok(report)
    }

    fn record(
        &self,
        report: &mut LoadReport,
        policy: FailurePolicy,
        origin: String,
        outcome: Result<String, BlizzardError>,
    ) -> Result<(), BlizzardError> {
        match outcome {
            Ok(name) => {
                report.loaded.push(name);
                Ok(())
            }
            Err(e) => self.record_failure(report, policy, origin, e),
        }
    }

    fn record_failure(
        &self,
        report: &mut LoadReport,
        policy: FailurePolicy,
        origin: String,
        error: BlizzardError,
    ) -> Result<(), BlizzardError> {
        match policy {
            FailurePolicy::Abort => {
                tracing::error!(origin = %origin, error = %error, "plugin failed, aborting");
                Err(error)
            }
            FailurePolicy::Skip => {
                tracing::warn!(origin = %origin, error = %error, "skipping plugin");
                report.skipped.push(SkippedPlugin {
                    origin,
                    reason: error.to_string(),
                });
                Ok(())
            }
        }
    }

    /// Unregister a plugin and drop its element handlers.
    pub fn unload(&mut self, name: &str) -> Result<(), BlizzardError> {
        let entry = self
            .plugins
            .remove(name)
            .ok_or_else(|| BlizzardError::PluginNotFound(name.to_string()))?;
        for element in &entry.elements {
            self.elements.remove(element.name());
        }
        tracing::info!(plugin = %name, "plugin unloaded");
        Ok(())
    }

    pub fn plugin(&self, name: &str) -> Option<&PluginEntry> {
        self.plugins.get(name)
    }

    /// All registered plugins, sorted by name.
    pub fn list_plugins(&self) -> Vec<&PluginEntry> {
        self.plugins.values().collect()
    }

    /// All exposed data elements, sorted by name.
    pub fn list_elements(&self) -> Vec<&DataElement> {
        self.elements.values().map(|indexed| &indexed.element).collect()
    }

    pub fn element(&self, name: &str) -> Option<&DataElement> {
        self.elements.get(name).map(|indexed| &indexed.element)
    }

    /// Name of the plugin that exposes `element`.
    pub fn element_owner(&self, element: &str) -> Option<&str> {
        self.elements.get(element).map(|indexed| indexed.plugin.as_str())
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    fn element_of(&self, name: &str, expected: ElementType) -> Result<&DataElement, BlizzardError> {
        let element = self
            .element(name)
            .ok_or_else(|| BlizzardError::ElementNotFound(name.to_string()))?;
        if element.element_type() != expected {
            return Err(BlizzardError::unsupported(
                name,
                &format!("{expected} access on a {}", element.element_type()),
            ));
        }
        Ok(element)
    }

    pub fn get(&self, property: &str) -> Result<Value, BlizzardError> {
        tracing::debug!(element = %property, "get");
        self.element_of(property, ElementType::Property)?
            .handler()
            .get(property)
    }

    pub fn set(&self, property: &str, value: Value) -> Result<(), BlizzardError> {
        tracing::debug!(element = %property, kind = value.kind_name(), "set");
        self.element_of(property, ElementType::Property)?
            .handler()
            .set(property, value)
    }

    /// Add a row to `table`, returning the new instance number.
    pub fn add_row(&self, table: &str, alias: Option<&str>) -> Result<u32, BlizzardError> {
        tracing::debug!(element = %table, alias, "add_row");
        // Empty aliases cannot be told apart from "no alias" across the ABI.
        if alias == Some("") {
            return Err(BlizzardError::handler(table, "row alias must not be empty"));
        }
        self.element_of(table, ElementType::Table)?
            .handler()
            .add_row(table, alias)
    }

    /// Remove a row such as `Device.Schedule.2.` from the table that owns it.
    pub fn remove_row(&self, row: &str) -> Result<(), BlizzardError> {
        tracing::debug!(element = %row, "remove_row");
        let table = self
            .elements
            .values()
            .map(|indexed| &indexed.element)
            .filter(|element| element.element_type() == ElementType::Table)
            .filter(|element| owns_row(element.name(), row))
            .max_by_key(|element| element.name().len())
            .ok_or_else(|| BlizzardError::ElementNotFound(row.to_string()))?;
        table.handler().remove_row(row)
    }

    pub fn subscribe(&self, event: &str, action: SubscribeAction) -> Result<(), BlizzardError> {
        tracing::debug!(element = %event, %action, "subscribe");
        self.element_of(event, ElementType::Event)?
            .handler()
            .subscribe(event, action)
    }

    /// Invoke a method, checking parameters and result against the
    /// descriptors in the owning plugin's description.
    pub fn invoke(&self, method: &str, params: Value) -> Result<Value, BlizzardError> {
        tracing::debug!(element = %method, "invoke");
        let element = self.element_of(method, ElementType::Method)?;
        let described = self
            .element_owner(method)
            .and_then(|owner| self.plugins.get(owner))
            .and_then(|entry| entry.description.method(method));

        let (parameters, result) = match described {
            Some(described) => (
                described.parameters_descriptor()?,
                described.result_descriptor()?,
            ),
            None => (None, None),
        };
        if let Some(descriptor) = &parameters {
            schema::check(&params, descriptor, "params")?;
        }
        let output = element.handler().invoke(method, params)?;
        if let Some(descriptor) = &result {
            schema::check(&output, descriptor, "result")?;
        }
        Ok(output)
    }
}

/// Whether `row` names an instance of `table`, on a `.` segment boundary.
fn owns_row(table: &str, row: &str) -> bool {
    match row.strip_prefix(table) {
        Some(rest) if !rest.is_empty() => table.ends_with('.') || rest.starts_with('.'),
        _ => false,
    }
}

impl Default for PluginHost {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blizzard_core::{BasicType, Descriptor, ElementHandler, MethodDescription, PluginRegistration};
    use std::sync::Mutex;
    use tracing_test::traced_test;

    #[derive(Default)]
    struct Store {
        value: Mutex<Value>,
        rows: Mutex<Vec<String>>,
        subscribed: Mutex<bool>,
    }

    impl ElementHandler for Store {
        fn get(&self, _element: &str) -> Result<Value, BlizzardError> {
            Ok(self.value.lock().unwrap().clone())
        }

        fn set(&self, _element: &str, value: Value) -> Result<(), BlizzardError> {
            *self.value.lock().unwrap() = value;
            Ok(())
        }

        fn add_row(&self, table: &str, _alias: Option<&str>) -> Result<u32, BlizzardError> {
            let mut rows = self.rows.lock().unwrap();
            let instance = rows.len() as u32 + 1;
            rows.push(format!("{table}{instance}."));
            Ok(instance)
        }

        fn remove_row(&self, row: &str) -> Result<(), BlizzardError> {
            let mut rows = self.rows.lock().unwrap();
            let before = rows.len();
            rows.retain(|r| r != row);
            if rows.len() == before {
                return Err(BlizzardError::ElementNotFound(row.to_string()));
            }
            Ok(())
        }

        fn subscribe(&self, _event: &str, action: SubscribeAction) -> Result<(), BlizzardError> {
            *self.subscribed.lock().unwrap() = action == SubscribeAction::Subscribe;
            Ok(())
        }

        fn invoke(&self, _method: &str, params: Value) -> Result<Value, BlizzardError> {
            match params.get("count").and_then(Value::as_integer) {
                Some(-1) => Ok(Value::integer(0)),
                Some(n) => Ok(Value::string(format!("echo {n}"))),
                None => Ok(Value::string("no count")),
            }
        }
    }

    fn device_plugin(name: &str, prefix: &str) -> impl Plugin + use<> {
        let name = name.to_string();
        let prefix = prefix.to_string();
        move || {
            let store: Arc<dyn ElementHandler> = Arc::new(Store::default());
            let method = format!("{prefix}Echo()");
            Some(PluginRegistration::new(
                DataElementList::new(vec![
                    DataElement::property(format!("{prefix}Value"), Arc::clone(&store)),
                    DataElement::table(format!("{prefix}Rows."), Arc::clone(&store)),
                    DataElement::event(format!("{prefix}Changed!"), Arc::clone(&store)),
                    DataElement::method(method.clone(), store),
                ]),
                PluginDescription::named(name.clone()).with_method(
                    MethodDescription::new(method)
                        .with_parameters(&Descriptor::object([(
                            "count",
                            Descriptor::basic(BasicType::Integer),
                        )]))
                        .with_result(&Descriptor::basic(BasicType::String)),
                ),
            ))
        }
    }

    #[traced_test]
    #[test]
    fn register_static_indexes_elements() {
        let mut host = PluginHost::new();
        let name = host.register_static(&device_plugin("device", "Device.")).unwrap();
        assert_eq!(name, "device");
        assert_eq!(host.len(), 1);
        assert_eq!(host.list_elements().len(), 4);
        assert_eq!(host.element_owner("Device.Value"), Some("device"));
        assert_eq!(host.plugin("device").unwrap().source, PluginSource::Static);
        assert!(logs_contain("plugin registered"));
    }

    #[test]
    fn unavailable_static_plugin_is_rejected() {
        let mut host = PluginHost::new();
        let plugin = || -> Option<PluginRegistration> { None };
        let err = host.register_static(&plugin).unwrap_err();
        assert!(matches!(err, BlizzardError::RegistrationUnavailable { .. }));
        assert!(host.is_empty());
    }

    #[test]
    fn zero_element_plugin_registers() {
        let mut host = PluginHost::new();
        let plugin = || Some(PluginRegistration::without_elements(PluginDescription::named("quiet")));
        host.register_static(&plugin).unwrap();
        assert_eq!(host.plugin("quiet").unwrap().elements.len(), 0);
        assert!(host.list_elements().is_empty());
    }

    #[test]
    fn duplicate_plugin_name_is_rejected() {
        let mut host = PluginHost::new();
        host.register_static(&device_plugin("device", "A.")).unwrap();
        let err = host.register_static(&device_plugin("device", "B.")).unwrap_err();
        assert!(matches!(err, BlizzardError::DuplicatePlugin(name) if name == "device"));
        assert!(host.element("B.Value").is_none());
    }

    #[test]
    fn duplicate_element_leaves_host_unchanged() {
        let mut host = PluginHost::new();
        host.register_static(&device_plugin("first", "Device.")).unwrap();
        let err = host.register_static(&device_plugin("second", "Device.")).unwrap_err();
        assert!(matches!(
            err,
            BlizzardError::DuplicateElement { ref owner, .. } if owner == "first"
        ));
        assert_eq!(host.len(), 1);
        assert!(host.plugin("second").is_none());
    }

    #[test]
    fn property_get_and_set() {
        let mut host = PluginHost::new();
        host.register_static(&device_plugin("device", "Device.")).unwrap();
        host.set("Device.Value", Value::integer(7)).unwrap();
        assert_eq!(host.get("Device.Value").unwrap(), Value::integer(7));
    }

    #[test]
    fn wrong_element_type_is_unsupported() {
        let mut host = PluginHost::new();
        host.register_static(&device_plugin("device", "Device.")).unwrap();
        let err = host.get("Device.Changed!").unwrap_err();
        assert!(matches!(err, BlizzardError::Unsupported { .. }));
        let err = host.get("Device.Missing").unwrap_err();
        assert!(matches!(err, BlizzardError::ElementNotFound(_)));
    }

    #[test]
    fn rows_route_to_owning_table() {
        let mut host = PluginHost::new();
        host.register_static(&device_plugin("device", "Device.")).unwrap();
        assert_eq!(host.add_row("Device.Rows.", Some("first")).unwrap(), 1);
        assert_eq!(host.add_row("Device.Rows.", None).unwrap(), 2);
        host.remove_row("Device.Rows.1.").unwrap();
        assert!(matches!(
            host.remove_row("Other.Rows.1.").unwrap_err(),
            BlizzardError::ElementNotFound(_)
        ));
    }

    #[test]
    fn subscribe_reaches_event_handler() {
        let mut host = PluginHost::new();
        host.register_static(&device_plugin("device", "Device.")).unwrap();
        host.subscribe("Device.Changed!", SubscribeAction::Subscribe).unwrap();
        host.subscribe("Device.Changed!", SubscribeAction::Unsubscribe).unwrap();
        assert!(host.subscribe("Device.Value", SubscribeAction::Subscribe).is_err());
    }

    #[test]
    fn invoke_checks_parameters_and_result() {
        let mut host = PluginHost::new();
        host.register_static(&device_plugin("device", "Device.")).unwrap();

        let ok = host
            .invoke("Device.Echo()", Value::object([("count", Value::integer(3))]))
            .unwrap();
        assert_eq!(ok.as_str(), Some("echo 3"));

        let err = host
            .invoke("Device.Echo()", Value::object([("count", Value::string("3"))]))
            .unwrap_err();
        assert!(err.to_string().contains("params.count"), "{err}");

        let err = host
            .invoke("Device.Echo()", Value::object([("count", Value::integer(-1))]))
            .unwrap_err();
        assert!(err.to_string().contains("result"), "{err}");
    }

    #[traced_test]
    #[test]
    fn unload_removes_elements() {
        let mut host = PluginHost::new();
        host.register_static(&device_plugin("device", "Device.")).unwrap();
        host.unload("device").unwrap();
        assert!(host.is_empty());
        assert!(host.element("Device.Value").is_none());
        assert!(matches!(host.unload("device"), Err(BlizzardError::PluginNotFound(_))));
        assert!(logs_contain("plugin unloaded"));
    }

    #[traced_test]
    #[test]
    fn skip_policy_records_failures() {
        let dir = tempfile::tempdir().unwrap();
        let mut host = PluginHost::with_loader(PluginLoader::with_search_paths([dir.path()]));
        let plan = LoadPlan {
            directories: vec![dir.path().join("missing")],
            autoload: vec!["ghost".to_string()],
            policy: FailurePolicy::Skip,
        };
        let report = unsafe { host.load_configured(&plan) }.unwrap();
        assert!(report.loaded.is_empty());
        assert_eq!(report.skipped.len(), 2);
        assert_eq!(report.skipped[1].origin, "ghost");
        assert!(logs_contain("skipping plugin"));
    }

    #[test]
    fn abort_policy_stops_on_first_failure() {
        let dir = tempfile::tempdir().unwrap();
        let mut host = PluginHost::with_loader(PluginLoader::with_search_paths([dir.path()]));
        let plan = LoadPlan {
            directories: vec![],
            autoload: vec!["ghost".to_string()],
            policy: FailurePolicy::Abort,
        };
        let err = unsafe { host.load_configured(&plan) }.unwrap_err();
        assert!(matches!(err, BlizzardError::PluginNotFound(_)));
    }

    #[test]
    fn invalid_loaded_registration_is_rejected() {
        let store: Arc<dyn ElementHandler> = Arc::new(Store::default());
        let registration = PluginRegistration::new(
            DataElementList::new(vec![
                DataElement::property("Device.X", Arc::clone(&store)),
                DataElement::property("Device.X", Arc::clone(&store)),
                DataElement::property("Bad Name", store),
            ]),
            PluginDescription::named(""),
        );
        let mut host = PluginHost::new();
        let err = host
            .register_loaded(LoadedPlugin {
                registration,
                source: PluginSource::Static,
                library: None,
            })
            .unwrap_err();
        assert!(matches!(err, BlizzardError::InvalidRegistration(_)));
        assert!(host.is_empty());
        assert!(host.list_elements().is_empty());
    }

    #[test]
    fn duplicate_elements_within_one_plugin_are_rejected() {
        let store: Arc<dyn ElementHandler> = Arc::new(Store::default());
        let registration = PluginRegistration::new(
            DataElementList::new(vec![
                DataElement::property("Device.X", Arc::clone(&store)),
                DataElement::property("Device.X", store),
            ]),
            PluginDescription::named("twice"),
        );
        let mut host = PluginHost::new();
        let err = host
            .register_loaded(LoadedPlugin {
                registration,
                source: PluginSource::Static,
                library: None,
            })
            .unwrap_err();
        assert!(matches!(err, BlizzardError::InvalidRegistration(msg) if msg.contains("more than once")));
        assert!(host.plugin("twice").is_none());
    }

    #[test]
    fn row_removal_respects_segment_boundaries() {
        let store: Arc<dyn ElementHandler> = Arc::new(Store::default());
        let tab = PluginRegistration::new(
            DataElementList::new(vec![DataElement::table("Device.Tab", Arc::clone(&store))]),
            PluginDescription::named("tab"),
        );
        let mut host = PluginHost::new();
        host.register_loaded(LoadedPlugin {
            registration: tab,
            source: PluginSource::Static,
            library: None,
        })
        .unwrap();

        let err = host.remove_row("Device.Table2.1.").unwrap_err();
        assert!(matches!(err, BlizzardError::ElementNotFound(_)));

        host.add_row("Device.Tab", None).unwrap();
        host.remove_row("Device.Tab1.").unwrap_err();
        assert!(owns_row("Device.Tab", "Device.Tab.1."));
        assert!(owns_row("Device.Rows.", "Device.Rows.1."));
        assert!(!owns_row("Device.Rows.", "Device.Rows."));
    }

    #[test]
    fn empty_row_alias_is_rejected() {
        let mut host = PluginHost::new();
        host.register_static(&device_plugin("device", "Device.")).unwrap();
        let err = host.add_row("Device.Rows.", Some("")).unwrap_err();
        assert!(matches!(err, BlizzardError::Handler { ref message, .. } if message.contains("alias")));
        assert_eq!(host.add_row("Device.Rows.", Some("first")).unwrap(), 1);
    }
}
