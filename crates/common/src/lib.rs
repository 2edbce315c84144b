pub mod domain;
pub mod telemetry;

#[cfg(any(test, feature = "testing"))]
pub use domain::MockAttributeStore;
#[cfg(any(test, feature = "testing"))]
pub use domain::MockClock;
#[cfg(any(test, feature = "testing"))]
pub use domain::MockMessageHandler;
