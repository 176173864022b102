//! Client relay for a Surfer autonomous surface vehicle.
//!
//! A [`Surfer`] connects to a rosbridge server, caches the agent's inertial,
//! status and detection telemetry as it arrives, and publishes saturated
//! velocity, force and motor commands.
//!
//! ```no_run
//! use surfer_client::{Surfer, SurferConfig};
//!
//! # async fn demo() -> Result<(), surfer_client::SurferError> {
//! let surfer = Surfer::new(SurferConfig::default());
//! surfer.connect().await?;
//! surfer.set_velocity_command(0.5, 0.0, 0.1);
//! for detection in surfer.drain_detections() {
//!     println!("{} at {:?}", detection.class_id, detection.position);
//! }
//! surfer.disconnect();
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod relay;
pub mod session;
pub mod state;

#[cfg(test)]
mod mock;

pub use config::{Channels, SurferConfig};
pub use relay::{Surfer, COMMAND_LIMIT};
pub use session::SurferSession;
pub use state::TelemetrySnapshot;
pub use surfer_math::EulerAngles;
pub use surfer_types::{Detection, StatusSnapshot, SurferError};
