use crate::{
    common::error::Result,
    helm::client::HelmReleaseClient,
    kube_client::{release_secret_status, ApiStatus},
};
use async_trait::async_trait;
use k8s_openapi::api::core::v1::Secret;
use kube::Api;
use std::path::Path;

#[cfg(test)]
use mockall::automock;

/// Where release records live, and the operations which drive one through its lifecycle.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ReleaseStore {
    /// Render the chart for the release, returning the raw multi-document manifest.
    async fn render(&self, release_name: &str, chart: &str) -> Result<Vec<u8>>;

    /// Find out if a record of the release exists.
    async fn release_exists(&self, release_name: &str) -> ApiStatus;

    /// Scaffold a chart with no templates at `chart_dir`.
    async fn create_empty_chart(&self, chart_dir: &Path) -> Result<()>;

    /// Install the chart at `chart_dir` as the release.
    async fn install(&self, release_name: &str, chart_dir: &Path) -> Result<()>;

    /// Upgrade the release to the chart.
    async fn upgrade(&self, release_name: &str, chart: &str) -> Result<()>;
}

/// A ReleaseStore which drives the helm binary, and reads the helm v3 release Secrets to tell
/// if a release exists.
pub struct HelmReleaseStore {
    helm: HelmReleaseClient,
    secrets: Api<Secret>,
}

impl HelmReleaseStore {
    /// Creates a store from a helm client and the Secret api of the release namespace.
    pub fn new(helm: HelmReleaseClient, secrets: Api<Secret>) -> Self {
        Self { helm, secrets }
    }
}

#[async_trait]
impl ReleaseStore for HelmReleaseStore {
    async fn render(&self, release_name: &str, chart: &str) -> Result<Vec<u8>> {
        self.helm.template(release_name, chart)
    }

    async fn release_exists(&self, release_name: &str) -> ApiStatus {
        release_secret_status(&self.secrets, release_name).await
    }

    async fn create_empty_chart(&self, chart_dir: &Path) -> Result<()> {
        self.helm.create_empty(chart_dir)
    }

    async fn install(&self, release_name: &str, chart_dir: &Path) -> Result<()> {
        self.helm.install(release_name, chart_dir)
    }

    async fn upgrade(&self, release_name: &str, chart: &str) -> Result<()> {
        self.helm.upgrade(release_name, chart)
    }
}
