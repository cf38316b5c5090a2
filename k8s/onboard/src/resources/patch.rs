use crate::{
    common::constants::{
        MANAGED_BY_LABEL_KEY, MANAGED_BY_LABEL_VALUE, RELEASE_NAMESPACE_ANNOTATION_KEY,
        RELEASE_NAME_ANNOTATION_KEY,
    },
    kube_client::{ApiStatus, Cluster, MetadataField},
    resources::Resource,
};
use tracing::warn;

/// One metadata mutation which marks an object as owned by the release.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OwnershipMutation {
    field: MetadataField,
    key: &'static str,
    value: String,
}

impl OwnershipMutation {
    /// The annotation or label key which is set.
    pub fn key(&self) -> &'static str {
        self.key
    }

    /// Human readable description of the step, for the console.
    fn describe(&self, resource: &Resource) -> String {
        match self.field {
            MetadataField::Annotation => format!("Annotating {resource} with {}", self.key),
            MetadataField::Label => format!("Labelling {resource} with {}", self.key),
        }
    }
}

/// The three mutations, in the order they are applied: release name annotation, release
/// namespace annotation, managed-by label.
pub fn ownership_mutations(release_name: &str, namespace: &str) -> [OwnershipMutation; 3] {
    [
        OwnershipMutation {
            field: MetadataField::Annotation,
            key: RELEASE_NAME_ANNOTATION_KEY,
            value: release_name.to_string(),
        },
        OwnershipMutation {
            field: MetadataField::Annotation,
            key: RELEASE_NAMESPACE_ANNOTATION_KEY,
            value: namespace.to_string(),
        },
        OwnershipMutation {
            field: MetadataField::Label,
            key: MANAGED_BY_LABEL_KEY,
            value: MANAGED_BY_LABEL_VALUE.to_string(),
        },
    ]
}

/// Result of patching a single resource.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PatchOutcome {
    /// All mutations were applied.
    Patched,
    /// The object was not found when the first mutation was attempted. Nothing was applied.
    NotFound,
    /// A mutation failed. The `applied` mutations before it stay in place. `applied` is 0 when
    /// the first mutation failed for a reason other than a missing object, in which case the
    /// object's state is unknown rather than absent.
    Partial {
        applied: usize,
        failed_key: &'static str,
        status: ApiStatus,
    },
}

/// Applies the ownership mutations to the live object, in order. The first failing mutation
/// stops the rest. Mutations which already went through are not reverted.
pub async fn patch_resource<C>(
    cluster: &C,
    resource: &Resource,
    mutations: &[OwnershipMutation],
) -> PatchOutcome
where
    C: Cluster + Sync + ?Sized,
{
    for (applied, mutation) in mutations.iter().enumerate() {
        console_logger::info(&mutation.describe(resource));

        let status = cluster
            .set_metadata(
                resource,
                mutation.field,
                mutation.key,
                mutation.value.as_str(),
            )
            .await;

        match status {
            ApiStatus::Ok => continue,
            ApiStatus::NotFound if applied == 0 => {
                warn!(%resource, "Object not found, nothing was patched");
                return PatchOutcome::NotFound;
            }
            status => {
                warn!(%resource, key = mutation.key, %status, applied, "Patch step failed");
                return PatchOutcome::Partial {
                    applied,
                    failed_key: mutation.key,
                    status,
                };
            }
        }
    }

    PatchOutcome::Patched
}
