pub mod provider;

#[cfg(feature = "oauth2-client")]
pub mod oauth2_client;

pub use provider::*;

#[cfg(feature = "oauth2-client")]
pub use oauth2_client::*;
