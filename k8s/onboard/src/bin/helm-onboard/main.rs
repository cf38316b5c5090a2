use clap::Parser;
use onboard::{
    common::{constants::PRODUCT, error::Result},
    helm::{client::HelmReleaseClient, store::HelmReleaseStore},
    kube_client::KubeClientSet,
    onboard::{Completion, Onboarding},
    user_prompt::StdinPrompt,
};
use opts::CliArgs;
use tracing::{error, info, level_filters::LevelFilter};
use tracing_subscriber::EnvFilter;

mod opts;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    init_logging();
    let opts = CliArgs::parse();

    match onboard(&opts).await {
        Ok(completion) => info!(?completion, "Done"),
        Err(error) => {
            error!(%error, "Failed to onboard resources into {PRODUCT}");
            console_logger::error(
                &format!("Failed to onboard resources into {PRODUCT}"),
                &error.to_string(),
            );
            std::process::exit(1);
        }
    }
}

/// Initialize logging components -- tracing. Logs go to stderr, so they don't mix with the
/// console output. Use RUST_LOG to raise the level.
fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::WARN.into())
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// Validates the tooling, then runs the onboarding workflow against the cluster of the current
/// kubeconfig context.
async fn onboard(opts: &CliArgs) -> Result<Completion> {
    let helm = HelmReleaseClient::builder()
        .with_namespace(opts.namespace())
        .build();
    let version = helm.validate_v3()?;
    info!(%version, "Found helm");

    let kube = KubeClientSet::builder()
        .with_namespace(opts.namespace())
        .build()
        .await?;
    let store = HelmReleaseStore::new(helm, kube.secrets_api());

    Onboarding::new(opts.identity(), kube, store, StdinPrompt)
        .run()
        .await
}
