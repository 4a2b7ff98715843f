// SPDX-FileCopyrightText: 2026 Blizzard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conformance checking of [`Value`]s against [`Descriptor`]s.
//!
//! Method parameters and results are checked against the descriptors the
//! plugin published in its description. Errors carry the dotted path of the
//! offending value, rooted at the name passed to [`check`].

use crate::error::BlizzardError;
use crate::proto::descriptor::descriptor::Kind as DescKind;
use crate::proto::value::value::Kind as ValueKind;
use crate::proto::{BasicType, Descriptor, Value};

/// Check `value` against `descriptor`. `root` names the value in errors.
///
/// Unset descriptors accept anything. Object values may carry properties the
/// descriptor does not mention.
pub fn check(value: &Value, descriptor: &Descriptor, root: &str) -> Result<(), BlizzardError> {
    check_at(value, descriptor, root)
}

fn check_at(value: &Value, descriptor: &Descriptor, path: &str) -> Result<(), BlizzardError> {
    let Some(kind) = &descriptor.kind else {
        return Ok(());
    };

    if let DescKind::Optional(optional) = kind {
        if value.is_absent() {
            return Ok(());
        }
        return match optional.item.as_deref() {
            Some(item) => check_at(value, item, path),
            None => Ok(()),
        };
    }

    if value.is_absent() {
        return Err(BlizzardError::Schema(format!("missing value at `{path}`")));
    }

    match kind {
        DescKind::Basic(raw) => {
            let basic = BasicType::try_from(*raw).map_err(|_| {
                BlizzardError::Schema(format!("unknown basic type {raw} at `{path}`"))
            })?;
            check_basic(value, basic, path)
        }
        DescKind::List(list) => {
            let Some(ValueKind::List(values)) = &value.kind else {
                return Err(mismatch("list", value, path));
            };
            let Some(items) = list.items.as_deref() else {
                return Ok(());
            };
            values
                .elements
                .iter()
                .enumerate()
                .try_for_each(|(i, element)| check_at(element, items, &format!("{path}[{i}]")))
        }
        DescKind::Object(object) => {
            if !matches!(value.kind, Some(ValueKind::Object(_))) {
                return Err(mismatch("object", value, path));
            }
            for (key, property) in &object.properties {
                let child_path = format!("{path}.{key}");
                match value.get(key) {
                    Some(child) => check_at(child, property, &child_path)?,
                    None if is_optional(property) => {}
                    None => {
                        return Err(BlizzardError::Schema(format!(
                            "missing property `{key}` at `{path}`"
                        )));
                    }
                }
            }
            Ok(())
        }
        DescKind::Optional(_) => Ok(()),
    }
}

fn check_basic(value: &Value, basic: BasicType, path: &str) -> Result<(), BlizzardError> {
    let ok = match (basic, &value.kind) {
        (BasicType::Unspecified, _) => true,
        (BasicType::Boolean, Some(ValueKind::Boolean(_))) => true,
        (BasicType::Integer, Some(ValueKind::Integer(_))) => true,
        (BasicType::Double, Some(ValueKind::Double(_))) => true,
        (BasicType::String, Some(ValueKind::String(_))) => true,
        (BasicType::Bytes, Some(ValueKind::Bytes(_))) => true,
        (BasicType::AnyObject, Some(ValueKind::Object(_))) => true,
        _ => false,
    };
    if ok {
        Ok(())
    } else {
        let expected = match basic {
            BasicType::AnyObject => "object",
            other => other.as_str(),
        };
        Err(mismatch(expected, value, path))
    }
}

fn is_optional(descriptor: &Descriptor) -> bool {
    matches!(descriptor.kind, Some(DescKind::Optional(_)) | None)
}

fn mismatch(expected: &str, found: &Value, path: &str) -> BlizzardError {
    BlizzardError::Schema(format!(
        "expected {expected} value at `{path}`, found {}",
        found.kind_name()
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn point() -> Descriptor {
        Descriptor::object([
            ("x", Descriptor::basic(BasicType::Integer)),
            ("y", Descriptor::basic(BasicType::Integer)),
            (
                "label",
                Descriptor::optional(Descriptor::basic(BasicType::String)),
            ),
        ])
    }

    #[test]
    fn accepts_object_with_optional_property_missing() {
        let value = Value::object([("x", Value::integer(1)), ("y", Value::integer(2))]);
        assert!(check(&value, &point(), "params").is_ok());
    }

    #[test]
    fn reports_missing_property_with_path() {
        let value = Value::object([("x", Value::integer(1))]);
        let err = check(&value, &point(), "params").unwrap_err();
        assert_eq!(
            err.to_string(),
            "schema mismatch: missing property `y` at `params`"
        );
    }

    #[test]
    fn reports_wrong_type_inside_list() {
        let desc = Descriptor::list(point());
        let value = Value::list([
            Value::object([("x", Value::integer(1)), ("y", Value::integer(2))]),
            Value::object([("x", Value::integer(1)), ("y", Value::string("two"))]),
        ]);
        let err = check(&value, &desc, "params").unwrap_err();
        assert_eq!(
            err.to_string(),
            "schema mismatch: expected integer value at `params[1].y`, found string"
        );
    }

    #[test]
    fn absent_value_fails_required_descriptor() {
        let err = check(
            &Value::default(),
            &Descriptor::basic(BasicType::String),
            "result",
        )
        .unwrap_err();
        assert!(err.to_string().contains("missing value at `result`"));
    }

    #[test]
    fn any_object_requires_an_object() {
        let desc = Descriptor::basic(BasicType::AnyObject);
        assert!(check(&Value::object([("k", Value::boolean(true))]), &desc, "v").is_ok());
        let err = check(&Value::integer(1), &desc, "v").unwrap_err();
        assert!(err.to_string().contains("expected object value"));
    }

    #[test]
    fn unset_descriptor_accepts_anything() {
        assert!(check(&Value::bytes(vec![1, 2]), &Descriptor::default(), "v").is_ok());
        assert!(check(&Value::default(), &Descriptor::default(), "v").is_ok());
    }

    proptest! {
        #[test]
        fn integer_lists_conform_to_list_of_integer(items in proptest::collection::vec(any::<i64>(), 0..32)) {
            let value = Value::list(items.into_iter().map(Value::integer));
            let desc = Descriptor::list(Descriptor::basic(BasicType::Integer));
            prop_assert!(check(&value, &desc, "v").is_ok());
        }

        #[test]
        fn strings_never_conform_to_integer(s in ".*") {
            let err = check(&Value::string(s), &Descriptor::basic(BasicType::Integer), "v");
            prop_assert!(err.is_err());
        }

        #[test]
        fn absent_conforms_to_any_optional(raw in 0i32..7) {
            let desc = Descriptor::optional(Descriptor {
                kind: Some(DescKind::Basic(raw)),
            });
            prop_assert!(check(&Value::default(), &desc, "v").is_ok());
        }
    }
}
