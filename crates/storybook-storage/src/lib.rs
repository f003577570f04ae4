//! Storybook Storage Library
//!
//! Guest-local persistence: data that must survive while no server session exists,
//! such as a guest's pending personalization (picked up after login or at checkout)
//! and the guest session id sent as `X-Session-Id`.
//!
//! # Slot key format
//!
//! Slots are flat names made of ASCII letters, digits, `-` and `_`
//! (e.g. `pendingPersonalization`). Key validation is centralized in the `keys`
//! module so all backends stay consistent.

pub mod factory;
pub(crate) mod keys;
pub mod local;
pub mod memory;
pub mod pending;
pub mod traits;

// Re-export commonly used types
pub use factory::create_guest_store;
pub use keys::{GUEST_SESSION_SLOT, PENDING_PERSONALIZATION_SLOT};
pub use local::FileGuestStore;
pub use memory::MemoryGuestStore;
pub use pending::{
    clear_pending_personalization, guest_session_id, load_pending_personalization,
    save_pending_personalization,
};
pub use traits::{GuestStore, StorageError, StorageResult};
