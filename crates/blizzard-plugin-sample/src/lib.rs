// SPDX-FileCopyrightText: 2026 Blizzard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Sample thermostat plugin.
//!
//! Built as a `cdylib` it can be loaded by `blizzard load --dir`. Built as an
//! `rlib` its exported entry points can be called in-process.
//!
//! Exposed elements:
//!
//! | element                          | type     |
//! |----------------------------------|----------|
//! | `Device.Thermostat.Temperature`  | property (read-only) |
//! | `Device.Thermostat.Target`       | property |
//! | `Device.Thermostat.Alarm!`       | event    |
//! | `Device.Thermostat.Schedule.`    | table    |
//! | `Device.Thermostat.SetTarget()`  | method   |

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use blizzard_core::{
    BlizzardError, DataElement, DataElementList, ElementHandler, Plugin, PluginRegistration,
    SubscribeAction, Value,
};
use blizzard_plugin::parse_plugin_manifest;

pub const TEMPERATURE: &str = "Device.Thermostat.Temperature";
pub const TARGET: &str = "Device.Thermostat.Target";
pub const ALARM: &str = "Device.Thermostat.Alarm!";
pub const SCHEDULE: &str = "Device.Thermostat.Schedule.";
pub const SET_TARGET: &str = "Device.Thermostat.SetTarget()";

const MANIFEST: &str = include_str!("../plugin.toml");

/// Accepted target range in degrees Celsius.
const TARGET_RANGE: std::ops::RangeInclusive<i64> = 5..=35;

#[derive(Debug)]
struct State {
    temperature: i64,
    target: i64,
    alarm_subscribers: u32,
    schedule: BTreeMap<u32, Option<String>>,
    next_row: u32,
}

impl Default for State {
    fn default() -> Self {
        Self {
            temperature: 21,
            target: 20,
            alarm_subscribers: 0,
            schedule: BTreeMap::new(),
            next_row: 1,
        }
    }
}

/// Handler shared by all thermostat elements of one registration.
struct Thermostat {
    state: Mutex<State>,
}

impl Thermostat {
    fn lock(&self, element: &str) -> Result<MutexGuard<'_, State>, BlizzardError> {
        self.state
            .lock()
            .map_err(|_| BlizzardError::handler(element, "thermostat state is poisoned"))
    }

    fn set_target(&self, element: &str, celsius: i64) -> Result<(), BlizzardError> {
        if !TARGET_RANGE.contains(&celsius) {
            return Err(BlizzardError::handler(
                element,
                format!(
                    "target {celsius} is outside {}..={}",
                    TARGET_RANGE.start(),
                    TARGET_RANGE.end()
                ),
            ));
        }
        self.lock(element)?.target = celsius;
        tracing::debug!(target_celsius = celsius, "thermostat target changed");
        Ok(())
    }
}

impl ElementHandler for Thermostat {
    fn get(&self, element: &str) -> Result<Value, BlizzardError> {
        let state = self.lock(element)?;
        match element {
            TEMPERATURE => Ok(Value::integer(state.temperature)),
            TARGET => Ok(Value::integer(state.target)),
            _ => Err(BlizzardError::unsupported(element, "get")),
        }
    }

    fn set(&self, element: &str, value: Value) -> Result<(), BlizzardError> {
        if element != TARGET {
            return Err(BlizzardError::unsupported(element, "set"));
        }
        let celsius = value
            .as_integer()
            .ok_or_else(|| BlizzardError::Schema("Expected integer value".to_string()))?;
        self.set_target(element, celsius)
    }

    fn add_row(&self, table: &str, alias: Option<&str>) -> Result<u32, BlizzardError> {
        if table != SCHEDULE {
            return Err(BlizzardError::unsupported(table, "add_row"));
        }
        let mut state = self.lock(table)?;
        if let Some(alias) = alias
            && state.schedule.values().flatten().any(|a| a == alias)
        {
            return Err(BlizzardError::handler(
                table,
                format!("alias `{alias}` is already in use"),
            ));
        }
        let instance = state.next_row;
        state.next_row += 1;
        state.schedule.insert(instance, alias.map(str::to_string));
        Ok(instance)
    }

    fn remove_row(&self, row: &str) -> Result<(), BlizzardError> {
        let instance = row
            .strip_prefix(SCHEDULE)
            .map(|rest| rest.trim_end_matches('.'))
            .and_then(|rest| rest.parse::<u32>().ok())
            .ok_or_else(|| BlizzardError::ElementNotFound(row.to_string()))?;
        self.lock(row)?
            .schedule
            .remove(&instance)
            .map(drop)
            .ok_or_else(|| BlizzardError::ElementNotFound(row.to_string()))
    }

    fn subscribe(&self, event: &str, action: SubscribeAction) -> Result<(), BlizzardError> {
        if event != ALARM {
            return Err(BlizzardError::unsupported(event, "subscribe"));
        }
        let mut state = self.lock(event)?;
        state.alarm_subscribers = match action {
            SubscribeAction::Subscribe => state.alarm_subscribers.saturating_add(1),
            SubscribeAction::Unsubscribe => state.alarm_subscribers.saturating_sub(1),
        };
        Ok(())
    }

    fn invoke(&self, method: &str, params: Value) -> Result<Value, BlizzardError> {
        if method != SET_TARGET {
            return Err(BlizzardError::unsupported(method, "invoke"));
        }
        let celsius = params
            .get("celsius")
            .ok_or_else(|| BlizzardError::Schema("Missing property celsius".to_string()))?
            .as_integer()
            .ok_or_else(|| BlizzardError::Schema("Expected integer value".to_string()))?;
        self.set_target(method, celsius)?;

        let reason = params.get("reason").and_then(Value::as_str);
        Ok(Value::string(match reason {
            Some(reason) => format!("target set to {celsius} ({reason})"),
            None => format!("target set to {celsius}"),
        }))
    }
}

/// The thermostat plugin. Every registration gets fresh state.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThermostatPlugin;

impl Plugin for ThermostatPlugin {
    fn register(&self) -> Option<PluginRegistration> {
        let description = match parse_plugin_manifest(MANIFEST) {
            Ok(manifest) => manifest.into_description(),
            Err(e) => {
                tracing::error!(error = %e, "embedded thermostat manifest is invalid");
                return None;
            }
        };

        let handler: Arc<dyn ElementHandler> = Arc::new(Thermostat {
            state: Mutex::new(State::default()),
        });
        let elements = DataElementList::new(vec![
            DataElement::property(TEMPERATURE, Arc::clone(&handler)),
            DataElement::property(TARGET, Arc::clone(&handler)),
            DataElement::event(ALARM, Arc::clone(&handler)),
            DataElement::table(SCHEDULE, Arc::clone(&handler)),
            DataElement::method(SET_TARGET, handler),
        ]);
        Some(PluginRegistration::new(elements, description))
    }
}

blizzard_plugin::export_plugin!(ThermostatPlugin);

#[cfg(test)]
mod tests {
    use super::*;

    fn handler() -> Arc<dyn ElementHandler> {
        let registration = ThermostatPlugin.register().unwrap();
        Arc::clone(registration.elements().find(TARGET).unwrap().handler())
    }

    #[test]
    fn registration_is_valid() {
        let registration = ThermostatPlugin.register().unwrap();
        registration.validate().unwrap();
        assert_eq!(registration.name(), "thermostat");
        assert_eq!(registration.element_count(), 5);
        assert!(registration.description().method(SET_TARGET).is_some());
    }

    #[test]
    fn target_range_is_enforced() {
        let handler = handler();
        handler.set(TARGET, Value::integer(25)).unwrap();
        let err = handler.set(TARGET, Value::integer(90)).unwrap_err();
        assert!(err.to_string().contains("outside 5..=35"));
        assert_eq!(handler.get(TARGET).unwrap(), Value::integer(25));
    }

    #[test]
    fn temperature_is_read_only() {
        let handler = handler();
        assert_eq!(handler.get(TEMPERATURE).unwrap(), Value::integer(21));
        assert!(matches!(
            handler.set(TEMPERATURE, Value::integer(30)),
            Err(BlizzardError::Unsupported { .. })
        ));
    }

    #[test]
    fn schedule_rows_are_numbered_and_removable() {
        let handler = handler();
        assert_eq!(handler.add_row(SCHEDULE, Some("morning")).unwrap(), 1);
        assert_eq!(handler.add_row(SCHEDULE, None).unwrap(), 2);
        assert!(handler.add_row(SCHEDULE, Some("morning")).is_err());
        handler.remove_row("Device.Thermostat.Schedule.1.").unwrap();
        assert!(handler.remove_row("Device.Thermostat.Schedule.1.").is_err());
        assert_eq!(handler.add_row(SCHEDULE, Some("morning")).unwrap(), 3);
    }

    #[test]
    fn set_target_reports_reason() {
        let handler = handler();
        let result = handler
            .invoke(
                SET_TARGET,
                Value::object([
                    ("celsius", Value::integer(19)),
                    ("reason", Value::string("night")),
                ]),
            )
            .unwrap();
        assert_eq!(result.as_str(), Some("target set to 19 (night)"));
        assert_eq!(handler.get(TARGET).unwrap(), Value::integer(19));
    }

    #[test]
    fn set_target_requires_celsius() {
        let err = handler()
            .invoke(SET_TARGET, Value::object::<&str, _>([]))
            .unwrap_err();
        assert!(matches!(err, BlizzardError::Schema(msg) if msg == "Missing property celsius"));
    }
}
