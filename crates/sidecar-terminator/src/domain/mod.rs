//! Sidecar completion detection and shutdown dispatch.
//!
//! Everything here is a pure function of the current [`PodSnapshot`] except
//! the [`ShutdownDispatcher`], which talks to a [`CommandTransport`].

pub mod annotations;
pub mod classifier;
pub mod dispatcher;
pub mod handler;
#[cfg(test)]
pub(crate) mod mock;
pub mod predicate;
pub mod retry;
pub mod snapshot;

pub use annotations::SidecarAnnotation;
pub use classifier::ContainerSets;
pub use dispatcher::CommandTransport;
pub use dispatcher::ShutdownDispatcher;
pub use dispatcher::TransportError;
pub use handler::Evaluation;
pub use handler::SidecarShutdownHandler;
pub use predicate::Decision;
pub use retry::RetryPolicy;
pub use snapshot::PodRef;
pub use snapshot::PodSnapshot;
