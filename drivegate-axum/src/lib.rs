//! drivegate-axum: the HTTP side of drivegate.
//!
//! One GET/HEAD endpoint takes an encoded path, runs it through the
//! [`RequestHandler`] and either redirects to the file's download URL or
//! streams the file itself.

pub mod app;
pub mod delivery;
pub mod handler;
pub mod params;
pub mod state;
mod error;
pub use error::GateAxumError;
pub use state::GateState;

pub use app::{router, AxumGate};
pub use delivery::DeliveryPolicy;
pub use handler::{Failure, RequestHandler, Stage};
pub use params::FileAccessParams;
