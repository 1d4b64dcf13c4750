//! Kubernetes integration.
//!
//! - [`PodWatcher`]: watches Pods and forwards them as [`PodSnapshot`]s
//! - [`KubeExecTransport`]: runs commands in containers through the exec API
//!
//! [`PodSnapshot`]: crate::domain::PodSnapshot

pub mod conversion;
pub mod exec_transport;
pub mod pod_watcher;
pub mod types;

pub use exec_transport::KubeExecTransport;
pub use pod_watcher::get_pod_snapshot;
pub use pod_watcher::PodWatcher;
pub use pod_watcher::WatchScope;
pub use types::KubernetesError;
