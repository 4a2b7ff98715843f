// SPDX-FileCopyrightText: 2026 Blizzard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The registration value a plugin hands to the host.
//!
//! A [`PluginRegistration`] bundles the [`DataElementList`] a plugin exposes
//! on the bus with its [`PluginDescription`]. It is built once per load, never
//! mutated afterwards, and validated by the consumer before use.

use std::collections::HashSet;
use std::sync::Arc;

use crate::error::BlizzardError;
use crate::proto::PluginDescription;
use crate::traits::ElementHandler;
use crate::types::ElementType;

/// One named, typed endpoint a plugin exposes on the bus.
#[derive(Clone)]
pub struct DataElement {
    name: String,
    element_type: ElementType,
    handler: Arc<dyn ElementHandler>,
}

impl DataElement {
    pub fn new(
        name: impl Into<String>,
        element_type: ElementType,
        handler: Arc<dyn ElementHandler>,
    ) -> Self {
        Self {
            name: name.into(),
            element_type,
            handler,
        }
    }

    pub fn property(name: impl Into<String>, handler: Arc<dyn ElementHandler>) -> Self {
        Self::new(name, ElementType::Property, handler)
    }

    pub fn table(name: impl Into<String>, handler: Arc<dyn ElementHandler>) -> Self {
        Self::new(name, ElementType::Table, handler)
    }

    pub fn event(name: impl Into<String>, handler: Arc<dyn ElementHandler>) -> Self {
        Self::new(name, ElementType::Event, handler)
    }

    pub fn method(name: impl Into<String>, handler: Arc<dyn ElementHandler>) -> Self {
        Self::new(name, ElementType::Method, handler)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn element_type(&self) -> ElementType {
        self.element_type
    }

    pub fn handler(&self) -> &Arc<dyn ElementHandler> {
        &self.handler
    }
}

impl std::fmt::Debug for DataElement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataElement")
            .field("name", &self.name)
            .field("element_type", &self.element_type)
            .finish_non_exhaustive()
    }
}

/// Ordered, read-only list of the data elements a plugin exposes.
#[derive(Debug, Clone, Default)]
pub struct DataElementList {
    elements: Vec<DataElement>,
}

impl DataElementList {
    pub fn new(elements: Vec<DataElement>) -> Self {
        Self { elements }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&DataElement> {
        self.elements.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DataElement> {
        self.elements.iter()
    }

    pub fn find(&self, name: &str) -> Option<&DataElement> {
        self.elements.iter().find(|e| e.name == name)
    }

    pub fn as_slice(&self) -> &[DataElement] {
        &self.elements
    }
}

impl FromIterator<DataElement> for DataElementList {
    fn from_iter<T: IntoIterator<Item = DataElement>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a DataElementList {
    type Item = &'a DataElement;
    type IntoIter = std::slice::Iter<'a, DataElement>;

    fn into_iter(self) -> Self::IntoIter {
        self.elements.iter()
    }
}

/// The element list and description a plugin produces when registering.
#[derive(Debug, Clone)]
pub struct PluginRegistration {
    elements: DataElementList,
    description: PluginDescription,
}

impl PluginRegistration {
    pub fn new(elements: DataElementList, description: PluginDescription) -> Self {
        Self {
            elements,
            description,
        }
    }

    /// Registration that exposes no elements.
    pub fn without_elements(description: PluginDescription) -> Self {
        Self::new(DataElementList::empty(), description)
    }

    pub fn elements(&self) -> &DataElementList {
        &self.elements
    }

    pub fn element_count(&self) -> usize {
        self.elements.len()
    }

    pub fn description(&self) -> &PluginDescription {
        &self.description
    }

    pub fn name(&self) -> &str {
        &self.description.name
    }

    pub fn into_parts(self) -> (DataElementList, PluginDescription) {
        (self.elements, self.description)
    }

    /// Check the registration is internally consistent.
    ///
    /// The description must carry a name, element names must be well formed
    /// and unique, and every method the description declares must be backed by
    /// a `Method` element whose descriptors unpack.
    pub fn validate(&self) -> Result<(), BlizzardError> {
        if self.description.name.trim().is_empty() {
            return Err(BlizzardError::InvalidRegistration(
                "plugin description has no name".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for element in &self.elements {
            validate_element_name(element.name())?;
            if !seen.insert(element.name()) {
                return Err(BlizzardError::InvalidRegistration(format!(
                    "data element `{}` is listed more than once",
                    element.name()
                )));
            }
        }

        for method in &self.description.methods {
            match self.elements.find(&method.name) {
                Some(element) if element.element_type() == ElementType::Method => {}
                Some(element) => {
                    return Err(BlizzardError::InvalidRegistration(format!(
                        "method `{}` is registered as a {} element",
                        method.name,
                        element.element_type()
                    )));
                }
                None => {
                    return Err(BlizzardError::InvalidRegistration(format!(
                        "description declares method `{}` with no matching element",
                        method.name
                    )));
                }
            }
            method.parameters_descriptor()?;
            method.result_descriptor()?;
        }

        tracing::debug!(
            plugin = %self.description.name,
            elements = self.elements.len(),
            "registration validated"
        );
        Ok(())
    }
}

/// Element names are non-empty and free of whitespace and control characters.
pub fn validate_element_name(name: &str) -> Result<(), BlizzardError> {
    if name.is_empty() {
        return Err(BlizzardError::InvalidRegistration(
            "data element name must not be empty".to_string(),
        ));
    }
    if name.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(BlizzardError::InvalidRegistration(format!(
            "data element name `{}` contains whitespace or control characters",
            name.escape_debug()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proto::{BasicType, Descriptor, MethodDescription, Value};

    struct Fixed(i64);

    impl ElementHandler for Fixed {
        fn get(&self, _element: &str) -> Result<Value, BlizzardError> {
            Ok(Value::integer(self.0))
        }
    }

    fn handler() -> Arc<dyn ElementHandler> {
        Arc::new(Fixed(7))
    }

    #[test]
    fn element_count_matches_reachable_elements() {
        let registration = PluginRegistration::new(
            DataElementList::new(vec![
                DataElement::property("Device.Temp.Current", handler()),
                DataElement::event("Device.Temp.Alarm!", handler()),
            ]),
            PluginDescription::named("temp"),
        );
        assert_eq!(registration.element_count(), 2);
        assert_eq!(registration.elements().iter().count(), 2);
        assert!(registration.validate().is_ok());
    }

    #[test]
    fn zero_elements_with_identity_only_description_is_valid() {
        let registration = PluginRegistration::without_elements(PluginDescription::named("bare"));
        assert_eq!(registration.element_count(), 0);
        assert!(registration.validate().is_ok());
    }

    #[test]
    fn rejects_unnamed_description() {
        let registration = PluginRegistration::without_elements(PluginDescription::default());
        let err = registration.validate().unwrap_err();
        assert!(err.to_string().contains("no name"));
    }

    #[test]
    fn rejects_duplicate_element_names() {
        let registration = PluginRegistration::new(
            DataElementList::new(vec![
                DataElement::property("Device.X", handler()),
                DataElement::property("Device.X", handler()),
            ]),
            PluginDescription::named("dup"),
        );
        assert!(matches!(
            registration.validate(),
            Err(BlizzardError::InvalidRegistration(msg)) if msg.contains("more than once")
        ));
    }

    #[test]
    fn rejects_whitespace_in_element_name() {
        assert!(validate_element_name("Device.Bad Name").is_err());
        assert!(validate_element_name("").is_err());
        assert!(validate_element_name("Device.Good_Name.{i}.").is_ok());
    }

    #[test]
    fn described_method_must_be_a_method_element() {
        let description = PluginDescription::named("calc").with_method(
            MethodDescription::new("Device.Calc.Add()")
                .with_parameters(&Descriptor::basic(BasicType::Integer)),
        );

        let missing = PluginRegistration::without_elements(description.clone());
        assert!(missing.validate().is_err());

        let wrong_type = PluginRegistration::new(
            DataElementList::new(vec![DataElement::property("Device.Calc.Add()", handler())]),
            description.clone(),
        );
        let err = wrong_type.validate().unwrap_err();
        assert!(err.to_string().contains("property"));

        let ok = PluginRegistration::new(
            DataElementList::new(vec![DataElement::method("Device.Calc.Add()", handler())]),
            description,
        );
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn unsupported_callbacks_report_operation() {
        let err = handler().set("Device.Temp.Current", Value::integer(1)).unwrap_err();
        assert!(matches!(
            err,
            BlizzardError::Unsupported { ref operation, .. } if operation == "set"
        ));
    }
}
