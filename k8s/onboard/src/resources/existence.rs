use crate::{
    kube_client::{ApiStatus, Cluster},
    resources::Resource,
};
use tracing::debug;

/// Looks the resource up in the live cluster and prints the finding for the operator. Any
/// status other than ApiStatus::Ok means the resource cannot be counted as live.
pub async fn check_resource<C>(cluster: &C, resource: &Resource) -> ApiStatus
where
    C: Cluster + Sync + ?Sized,
{
    console_logger::info(&format!("\tChecking for existence of {resource}"));

    let status = cluster.probe(resource).await;
    debug!(%resource, %status, "Existence check");

    match &status {
        ApiStatus::Ok => console_logger::info(&format!("\tFound {resource}\n")),
        ApiStatus::NotFound => console_logger::info(&format!("\tFailed to find {resource}\n")),
        other => console_logger::warn(
            &format!("\tCould not verify {resource}"),
            &other.to_string(),
        ),
    }

    status
}
