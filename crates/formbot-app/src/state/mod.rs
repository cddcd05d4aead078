//! Session state persistence
//!
//! - [`container`] - `StateEntry`/`StateContainer` snapshot format
//! - [`registry`] - form type registration and persisted field accessors
//! - [`codec`] - capture/restore between sessions and entries
//! - [`store`] - storage backends

pub mod codec;
pub mod container;
pub mod registry;
pub mod store;

pub use codec::{capture_entry, restore_form};
pub use container::{StateContainer, StateEntry, StateValues};
pub use registry::{
    from_state_value, to_state_value, FormDescriptor, FormRegistry, FormType, PersistedField,
    FIELD_PREFIX,
};
pub use store::{JsonStateStore, MemoryStateStore, StateStore};
