/// Bootstrap of the placeholder release.
pub mod bootstrap;
/// Tools to run helm commands.
pub mod client;
/// Renders the chart into resource descriptors.
pub mod render;
/// The release store seam, backed by helm and the release Secrets.
pub mod store;
