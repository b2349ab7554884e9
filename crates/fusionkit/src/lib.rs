//! # fusionkit
//!
//! Blocking client for the Pure Storage Fusion REST API.
//!
//! This crate provides:
//! - Wire types for the resources the CLI manages (volumes, storage
//!   endpoints) and the ones they reference (storage classes, placement
//!   groups, protection policies, host access policies, availability zones,
//!   network interface groups)
//! - The [`FusionApi`] trait, with an HTTP implementation and an in-memory
//!   mock for tests
//! - A [`Session`] that owns the API client for one invocation
//! - Operation polling: every mutating call returns an [`Operation`] that
//!   has to be awaited before the change can be reported as done
//!
//! ## Example
//!
//! ```no_run
//! use fusionkit::{Credentials, Session, VolumeId};
//!
//! let session = Session::open(&Credentials::new(
//!     "https://api.pure1.purestorage.com/fusion",
//!     "token",
//! ))
//! .expect("session");
//!
//! let id = VolumeId::new("tenant", "space", "db01");
//! match session.api().get_volume(&id).expect("lookup") {
//!     Some(volume) => println!("{} is {} bytes", volume.name, volume.size),
//!     None => println!("no such volume"),
//! }
//! ```

pub mod backend;
pub mod error;
pub mod operation;
pub mod session;
pub mod types;

pub use backend::http::{DEFAULT_API_HOST, HttpBackend};
pub use backend::{FusionApi, MockBackend, MockCall};
pub use error::{Error, ErrorCategory, Result};
pub use operation::{PollCallback, PollConfig, await_operation};
pub use session::{Credentials, Session};
pub use types::*;
