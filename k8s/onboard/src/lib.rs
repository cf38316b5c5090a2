/// Ordered fan-out over the expected resources.
pub mod batch;
/// Constants, error handling and macros shared across the crate.
pub mod common;
/// Helm release store, chart rendering and the empty release bootstrap.
pub mod helm;
/// Kubernetes API access for the live objects and the release namespace.
pub mod kube_client;
/// The onboarding workflow.
pub mod onboard;
/// Rendered resource descriptors, existence checks and ownership patches.
pub mod resources;
/// Operator confirmation.
pub mod user_prompt;
