//! One client per Machine Box service.
//!
//! Every box client is a thin wrapper over [`BoxHttpClient`] configured with
//! the box name used in error messages and its default timeout. All clients
//! are cheap to clone and can be shared between tasks.
//!
//! [`BoxHttpClient`]: crate::client::BoxHttpClient

/// Defines a box client struct with its constructors and `InfoProvider`
/// implementation.
macro_rules! box_client {
    ($(#[$meta:meta])* $name:ident, $box_name:expr, $timeout:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone)]
        pub struct $name {
            client: $crate::client::BoxHttpClient,
        }

        impl $name {
            /// Name used to prefix errors from this box.
            pub const BOX_NAME: &'static str = $box_name;

            /// Create a client for the box at `addr` (e.g. `http://localhost:8080`)
            /// with the default timeout for this box.
            pub fn new(addr: &str) -> Result<Self, $crate::error::BoxError> {
                let options = $crate::config::ClientOptions::default().with_timeout($timeout);
                Self::with_options(addr, &options)
            }

            /// Create a client for the box at `addr` using `options` for the
            /// HTTP transport.
            pub fn with_options(
                addr: &str,
                options: &$crate::config::ClientOptions,
            ) -> Result<Self, $crate::error::BoxError> {
                Ok(Self {
                    client: $crate::client::BoxHttpClient::new(Self::BOX_NAME, addr, options)?,
                })
            }

            /// Use `http` for all requests instead of the client built from
            /// the options.
            pub fn with_http_client(mut self, http: reqwest::Client) -> Self {
                self.client = self.client.with_http_client(http);
                self
            }

            /// The shared HTTP layer, for requests this client has no method for.
            pub fn client(&self) -> &$crate::client::BoxHttpClient {
                &self.client
            }

            /// Get the build and status information of the box.
            pub async fn info(&self) -> Result<$crate::status::Info, $crate::error::BoxError> {
                self.client.info().await
            }
        }

        #[async_trait::async_trait]
        impl $crate::status::InfoProvider for $name {
            async fn info(&self) -> Result<$crate::status::Info, $crate::error::BoxError> {
                self.client.info().await
            }
        }
    };
}

pub mod classificationbox;
pub mod facebox;
pub mod fakebox;
pub mod nudebox;
pub mod objectbox;
pub mod suggestionbox;
pub mod tagbox;
pub mod textbox;
pub mod videobox;

pub use classificationbox::Classificationbox;
pub use facebox::Facebox;
pub use fakebox::Fakebox;
pub use nudebox::Nudebox;
pub use objectbox::Objectbox;
pub use suggestionbox::Suggestionbox;
pub use tagbox::Tagbox;
pub use textbox::Textbox;
pub use videobox::Videobox;

use serde::{Deserialize, Serialize};

/// Location of a detected face or object, in pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rect {
    #[serde(default)]
    pub top: i64,
    #[serde(default)]
    pub left: i64,
    #[serde(default)]
    pub width: i64,
    #[serde(default)]
    pub height: i64,
}
