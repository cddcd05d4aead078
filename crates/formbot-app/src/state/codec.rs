//! Conversion between live sessions and persisted entries

use super::container::{StateEntry, StateValues};
use super::registry::{FormRegistry, FIELD_PREFIX};
use crate::form::Form;
use crate::session::Session;
use formbot_core::prelude::*;

/// Snapshot a session's active form.
///
/// Returns `Ok(None)` when the form type opts out of persistence. Fails when
/// the form type is not registered or its state cannot be read; callers skip
/// that session and keep going.
pub fn capture_entry(session: &Session, registry: &FormRegistry) -> Result<Option<StateEntry>> {
    let form = session.form.as_ref();
    let descriptor = registry.describe(form).ok_or_else(|| {
        Error::persistence(format!(
            "form of session {} is not a registered form type",
            session.device_id
        ))
    })?;

    if descriptor.ignores_state() {
        return Ok(None);
    }

    let mut values: StateValues = form.export_state()?.unwrap_or_default();
    values.retain(|name, _| {
        let reserved = name.starts_with(FIELD_PREFIX);
        if reserved {
            warn!(
                "Dropping exported value {:?} of {}: the {:?} prefix is reserved for persisted fields",
                name,
                descriptor.type_name(),
                FIELD_PREFIX
            );
        }
        !reserved
    });
    values.extend(descriptor.read_fields(form)?);

    Ok(Some(StateEntry {
        device_id: session.device_id.clone(),
        title: session.title.clone(),
        form_type: descriptor.type_name().to_string(),
        values,
    }))
}

/// Rebuild the form described by `entry`.
///
/// Persisted fields are applied best-effort; values that no longer fit their
/// field are left at the default. The explicit import hook then receives the
/// whole value mapping.
pub fn restore_form(entry: &StateEntry, registry: &FormRegistry) -> Result<Box<dyn Form>> {
    let descriptor = registry
        .resolve(&entry.form_type)
        .ok_or_else(|| Error::unknown_form_type(&entry.form_type))?;

    let mut form = descriptor.create();
    let applied = descriptor.apply_fields(&mut *form, &entry.values);
    trace!(
        "Restored {} field(s) of {} for {}",
        applied,
        entry.form_type,
        entry.device_id
    );

    form.import_state(&entry.values)?;
    Ok(form)
}
