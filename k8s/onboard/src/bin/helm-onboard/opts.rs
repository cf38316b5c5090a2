use clap::Parser;
use onboard::onboard::ReleaseIdentity;

/// These are the supported cli configuration options for onboarding.
#[derive(Parser)]
#[command(name = "helm-onboard", version)]
#[command(
    about = "Onboard manually applied Kubernetes resources into a Helm release",
    long_about = None
)]
pub(crate) struct CliArgs {
    /// The helm release's namespace, e.g. default.
    namespace: String,

    /// The name of the helm release, e.g. release.
    release_name: String,

    /// The (directory) name of the helm chart to be installed.
    chart_name: String,
}

impl CliArgs {
    /// This returns the Kubernetes Namespace for the Helm release.
    pub(crate) fn namespace(&self) -> String {
        self.namespace.clone()
    }

    /// The release the resources are onboarded into.
    pub(crate) fn identity(&self) -> ReleaseIdentity {
        ReleaseIdentity {
            namespace: self.namespace.clone(),
            release_name: self.release_name.clone(),
            chart_name: self.chart_name.clone(),
        }
    }
}
