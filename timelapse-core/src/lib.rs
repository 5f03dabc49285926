//! Session and version-control proxy layer for the timelapse viewer.
//!
//! The viewer polls a [`session::Timelapse`] handle once per frame. The handle
//! owns a background [`worker`] thread that runs `hg` commands and hands
//! immutable results back over a channel; [`session::Timelapse::update`] is the
//! only place those results are applied to the [`store::RevisionStore`].

pub mod error;
pub mod hg;
pub mod runner;
pub mod session;
pub mod store;
pub mod types;
pub mod worker;

pub use error::{CommandError, SetupError};
pub use runner::{CommandRunner, ProcessCommandRunner};
pub use session::{FetchProgress, FetchState, Timelapse};
pub use types::{AnnotationLine, Revision, RevisionDetails};
