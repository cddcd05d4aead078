//! Form type registry
//!
//! Each persistable form type declares a stable type name and the list of
//! fields that survive a restart. The registry maps type names to factories
//! and field accessors, so restoring state never needs runtime reflection.

use std::any::TypeId;
use std::collections::HashMap;

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::container::StateValues;
use crate::form::{downcast_mut, downcast_ref, Form};
use formbot_core::prelude::*;

/// Prefix that keeps persisted field names apart from explicitly exported values
pub const FIELD_PREFIX: &str = "$";

/// A form type the state codec can save and rebuild.
pub trait FormType: Form + Default {
    /// Stable discriminator written into persisted entries
    const TYPE_NAME: &'static str;

    /// Sessions showing this form are never persisted
    const IGNORE_STATE: bool = false;

    /// Fields read on save and written back on restore
    fn persisted_fields() -> Vec<PersistedField<Self>> {
        Vec::new()
    }
}

/// Getter/setter pair for one persisted field of form `F`.
///
/// Usually built with [`persisted_field!`](crate::persisted_field).
pub struct PersistedField<F> {
    name: &'static str,
    get: fn(&F) -> serde_json::Result<serde_json::Value>,
    set: fn(&mut F, serde_json::Value) -> serde_json::Result<()>,
}

impl<F> PersistedField<F> {
    pub fn new(
        name: &'static str,
        get: fn(&F) -> serde_json::Result<serde_json::Value>,
        set: fn(&mut F, serde_json::Value) -> serde_json::Result<()>,
    ) -> Self {
        Self { name, get, set }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Name under which the field is stored in a [`StateEntry`](super::StateEntry)
    pub fn key(&self) -> String {
        format!("{}{}", FIELD_PREFIX, self.name)
    }
}

/// Serialize a field value for persistence
pub fn to_state_value<T: Serialize>(value: &T) -> serde_json::Result<serde_json::Value> {
    serde_json::to_value(value)
}

/// Deserialize a persisted value back into a field
pub fn from_state_value<T: DeserializeOwned>(value: serde_json::Value) -> serde_json::Result<T> {
    serde_json::from_value(value)
}

/// Declare a persisted field backed by a named struct field.
///
/// ```ignore
/// fn persisted_fields() -> Vec<PersistedField<Self>> {
///     vec![persisted_field!(CounterForm, count)]
/// }
/// ```
#[macro_export]
macro_rules! persisted_field {
    ($form:ty, $field:ident) => {
        $crate::state::PersistedField::<$form>::new(
            stringify!($field),
            |form: &$form| $crate::state::to_state_value(&form.$field),
            |form: &mut $form, value| {
                form.$field = $crate::state::from_state_value(value)?;
                Ok(())
            },
        )
    };
}

/// Type-erased view of a registered [`FormType`]
#[derive(Clone, Copy)]
pub struct FormDescriptor {
    type_name: &'static str,
    ignore_state: bool,
    create: fn() -> Box<dyn Form>,
    read: fn(&dyn Form) -> Result<StateValues>,
    apply: fn(&mut dyn Form, &StateValues) -> usize,
}

impl FormDescriptor {
    fn of<F: FormType>() -> Self {
        Self {
            type_name: F::TYPE_NAME,
            ignore_state: F::IGNORE_STATE,
            create: create_form::<F>,
            read: read_fields::<F>,
            apply: apply_fields::<F>,
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn ignores_state(&self) -> bool {
        self.ignore_state
    }

    /// Construct a default instance
    pub fn create(&self) -> Box<dyn Form> {
        (self.create)()
    }

    /// Read all persisted fields, keyed by their prefixed names
    pub fn read_fields(&self, form: &dyn Form) -> Result<StateValues> {
        (self.read)(form)
    }

    /// Write matching values back, skipping any that do not fit.
    /// Returns the number of fields applied.
    pub fn apply_fields(&self, form: &mut dyn Form, values: &StateValues) -> usize {
        (self.apply)(form, values)
    }
}

impl std::fmt::Debug for FormDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FormDescriptor")
            .field("type_name", &self.type_name)
            .field("ignore_state", &self.ignore_state)
            .finish()
    }
}

fn create_form<F: FormType>() -> Box<dyn Form> {
    Box::new(F::default())
}

fn read_fields<F: FormType>(form: &dyn Form) -> Result<StateValues> {
    let form = downcast_ref::<F>(form)
        .ok_or_else(|| Error::persistence(format!("form is not a {}", F::TYPE_NAME)))?;

    let mut values = StateValues::new();
    for field in F::persisted_fields() {
        let value = (field.get)(form).map_err(|e| Error::state_field(field.name, e.to_string()))?;
        values.insert(field.key(), value);
    }
    Ok(values)
}

fn apply_fields<F: FormType>(form: &mut dyn Form, values: &StateValues) -> usize {
    let Some(form) = downcast_mut::<F>(form) else {
        return 0;
    };

    let mut applied = 0;
    for field in F::persisted_fields() {
        let Some(value) = values.get(&field.key()) else {
            continue;
        };
        match (field.set)(form, value.clone()) {
            Ok(()) => applied += 1,
            Err(e) => debug!(
                "Skipping field {} of {}: {}",
                field.name,
                F::TYPE_NAME,
                e
            ),
        }
    }
    applied
}

/// Maps type discriminators to registered form types
#[derive(Debug, Default, Clone)]
pub struct FormRegistry {
    by_name: HashMap<&'static str, FormDescriptor>,
    by_type: HashMap<TypeId, &'static str>,
}

impl FormRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a form type. Registering the same name twice keeps the last one.
    pub fn register<F: FormType>(&mut self) -> &mut Self {
        if self.by_name.contains_key(F::TYPE_NAME) {
            warn!("Form type {} registered twice", F::TYPE_NAME);
        }
        self.by_name.insert(F::TYPE_NAME, FormDescriptor::of::<F>());
        self.by_type.insert(TypeId::of::<F>(), F::TYPE_NAME);
        self
    }

    /// Look up a form type by discriminator
    pub fn resolve(&self, type_name: &str) -> Option<&FormDescriptor> {
        self.by_name.get(type_name)
    }

    /// Look up the registration of a live form
    pub fn describe(&self, form: &dyn Form) -> Option<&FormDescriptor> {
        let type_id = form.as_any().type_id();
        self.by_type
            .get(&type_id)
            .and_then(|name| self.by_name.get(name))
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.by_name.contains_key(type_name)
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}
