//! Transport layer: outbound sink abstraction plus the concrete adapters.

pub mod mock;
pub mod serial;
pub mod traits;

pub use mock::MockTransport;
pub use serial::SerialTransport;
pub use traits::{TransportError, TransportSink};
