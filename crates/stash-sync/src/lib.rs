//! Client-side synchronization layer.
//!
//! - [`FilterPipeline`] turns raw filter input into settled [`FilterSnapshot`]s, with the
//!   free-text search debounced so a burst of keystrokes yields one list query.
//! - [`UploadCoordinator`] runs the single-file upload state machine, classifies the
//!   server's answer and invalidates every cached view the upload could have changed.
//! - [`QueryCache`] is a keyed read-through cache implementing the [`QueryInvalidator`]
//!   contract the coordinator depends on; [`CatalogView`] reads the catalog through it.
//!
//! [`FilterSnapshot`]: stash_core::FilterSnapshot

pub mod cache;
pub mod catalog;
pub mod debounce;
pub mod filter;
pub mod upload;

#[cfg(test)]
mod testing;

pub use cache::{QueryCache, QueryInvalidator};
pub use catalog::CatalogView;
pub use debounce::Debouncer;
pub use filter::FilterPipeline;
pub use upload::{UploadCoordinator, UploadPhase, UploadView};
