//! Async client for Machine Box services.
//!
//! Each box (Facebox, Tagbox, Classificationbox, ...) has a client in
//! [`boxes`]. They share one HTTP layer, [`client::BoxHttpClient`], which
//! applies the `{success, error}` response convention every box speaks and
//! reports failures as [`BoxError`].
//!
//! Boxes take time to start, so [`status`] provides a poller that waits
//! until a box reports `ready`:
//!
//! ```no_run
//! # async fn run() -> Result<(), machinebox::BoxError> {
//! use machinebox::{Facebox, StatusPoller};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! let facebox = Arc::new(Facebox::new("http://localhost:8080")?);
//! StatusPoller::default()
//!     .wait_for_ready_timeout(facebox.clone(), Duration::from_secs(60))
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod boxes;
pub mod client;
pub mod config;
pub mod envelope;
mod error;
pub mod features;
pub mod input;
pub mod status;

pub use boxes::{
    Classificationbox, Facebox, Fakebox, Nudebox, Objectbox, Suggestionbox, Tagbox, Textbox,
    Videobox,
};
pub use client::BoxHttpClient;
pub use config::ClientOptions;
pub use error::BoxError;
pub use features::Feature;
pub use input::Input;
pub use status::{is_ready, wait_for_ready, Info, InfoProvider, StatusPoller, StatusStream};
pub use tokio_util::sync::CancellationToken;
