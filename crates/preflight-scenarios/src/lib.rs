//! Preflight Scenarios
//!
//! Image service benchmark scenarios described declaratively: each carries
//! its validators, argument conversions and default context, and is
//! registered in a [`Catalog`] that refuses scenarios whose rules do not
//! resolve.
//!
//! # Flow
//!
//! 1. [`Catalog::prepare`] validates the invocation and converts arguments
//! 2. [`GlanceImages::run`] executes the scenario body
//!
//! # Example
//!
//! ```rust,ignore
//! let registry = preflight_rules::default_registry()?;
//! let catalog = Catalog::builtin(registry)?;
//! match catalog.prepare(LIST_IMAGES, &config, &deployment, None, None)? {
//!     Ok(args) => GlanceImages::new(&image_service).run(LIST_IMAGES, &args)?,
//!     Err(outcome) => eprintln!("skipped: {outcome}"),
//! }
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod catalog;
pub mod convert;
pub mod error;
pub mod images;
pub mod services;

// Re-exports
pub use catalog::Catalog;
pub use convert::{convert_args, image_args, path_or_url};
pub use error::{ScenarioError, ScenarioResult};
pub use images::{
    GlanceImages, CREATE_AND_DELETE_IMAGE, CREATE_AND_GET_IMAGE, CREATE_AND_LIST_IMAGE,
    CREATE_AND_UPDATE_IMAGE, CREATE_IMAGE_AND_BOOT_INSTANCES, LIST_IMAGES,
};
pub use services::{BootRequest, ImageService, ImageSpec, ImageUpdate, Server, ServerService};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
