//! Provider → PDF → Anchor domain cache and its persistence collaborator.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`model`] | Wire entities, derived counts, request shapes |
//! | [`validate`] | Anchor key / coordinate / page rule checks run before any remote call |
//! | [`remote`] | `Remote` trait and `RemoteError` |
//! | [`http`] | reqwest implementation of `Remote` |
//! | [`aggregate`] | `AnchorAggregateStore`: remote-first, mirror-second mutations |
//! | [`navigation`] | Transient tab and selection state, kept apart from domain data |

pub mod aggregate;
pub mod http;
pub mod model;
pub mod navigation;
pub mod remote;
pub mod validate;

#[cfg(test)]
#[path = "mock_test.rs"]
pub(crate) mod mock;

pub use aggregate::{AnchorAggregateStore, StoreError};
pub use http::{HttpRemote, HttpTimeouts};
pub use model::{Anchor, DeleteMode, Provider, ProviderPdf};
pub use navigation::{NavigationContext, Tab};
pub use remote::{Remote, RemoteError};
pub use validate::{AnchorDraft, AnchorKey, AnchorPatch, ValidationError};
