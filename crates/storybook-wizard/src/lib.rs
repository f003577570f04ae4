//! Personalization wizard
//!
//! A three-step flow (book, child info, preview) that turns the child-info form
//! into exactly one server-side personalization draft and then one cart item.
//! Guests fall back to the local guest store instead of creating drafts.
//!
//! The [`Wizard`] is written against [`StorefrontApi`](storybook_api_client::StorefrontApi),
//! the shared [`QueryClient`](storybook_query::QueryClient) and a
//! [`GuestStore`](storybook_storage::GuestStore), so it runs the same against the
//! real backend and against test fakes.

pub mod auth;
pub mod cart;
pub mod catalog;
pub mod form;
pub mod photo;
pub mod state;
pub mod wizard;

pub use auth::{AuthContext, AuthProvider, StaticAuth};
pub use cart::CartService;
pub use catalog::{debounce, Catalog, DEFAULT_SEARCH_DEBOUNCE};
pub use form::ChildInfoForm;
pub use photo::{PhotoArtifact, PhotoState, PreviewHandle, PreviewRegistry, UploadStatus};
pub use state::{Phase, Route, WizardStep};
pub use wizard::{SubmitOutcome, Wizard};
