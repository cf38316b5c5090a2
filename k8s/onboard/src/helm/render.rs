use crate::{
    common::error::{Render, Result},
    helm::store::ReleaseStore,
    resources::{parse_manifests, Resource},
};
use snafu::ResultExt;
use tracing::info;

/// Renders the chart as the named release and parses the manifests into resources. Both a
/// failed render and unparsable output are a Render error.
pub async fn render<S>(store: &S, release_name: &str, chart_name: &str) -> Result<Vec<Resource>>
where
    S: ReleaseStore + Sync + ?Sized,
{
    let resources = async {
        let rendered = store.render(release_name, chart_name).await?;
        parse_manifests(rendered.as_slice())
    }
    .await
    .context(Render { chart_name })?;

    info!(count = resources.len(), chart_name, "Rendered expected resources");
    Ok(resources)
}
