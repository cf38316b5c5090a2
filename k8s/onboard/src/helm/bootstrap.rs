use crate::{
    common::{
        constants::EMPTY_CHART_NAME,
        error::{Bootstrap, Result, TempDirCreation},
    },
    helm::store::ReleaseStore,
};
use snafu::ResultExt;
use tracing::info;

/// Creates a release record which manages no resources yet: an empty chart is scaffolded in
/// a scratch directory and installed as the release. The scratch directory is removed when
/// this returns, whatever the outcome.
pub async fn bootstrap<S>(store: &S, release_name: &str) -> Result<()>
where
    S: ReleaseStore + Sync + ?Sized,
{
    async {
        let scratch = tempfile::tempdir().context(TempDirCreation)?;
        let chart_dir = scratch.path().join(EMPTY_CHART_NAME);

        console_logger::info("Creating empty helm chart");
        store.create_empty_chart(chart_dir.as_path()).await?;

        info!(release_name, chart_dir = %chart_dir.display(), "Installing empty chart");
        store.install(release_name, chart_dir.as_path()).await
    }
    .await
    .context(Bootstrap { release_name })
}
