use crate::{
    batch::BatchStage,
    common::{
        constants::{CONTINUE_PROMPT, PRODUCT},
        error::{OperatorDeclined, ReleaseQuery, Result, Upgrade},
    },
    helm::{bootstrap::bootstrap, render::render, store::ReleaseStore},
    kube_client::{ApiStatus, Cluster},
    resources::{
        existence::check_resource,
        patch::{ownership_mutations, patch_resource, PatchOutcome},
        Resource,
    },
    user_prompt::{Prompt, MISSING_RESOURCES_WARNING},
};
use snafu::ResultExt;
use tracing::{info, warn};

/// The release the resources are adopted into. Fixed for the whole run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReleaseIdentity {
    pub namespace: String,
    pub release_name: String,
    pub chart_name: String,
}

/// How a successful run ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Completion {
    /// The placeholder release was created, the resources tagged and the release upgraded.
    Onboarded,
    /// The release was already there. Nothing was changed.
    ReleaseAlreadyExists,
}

/// The onboarding workflow: render, check, confirm, bootstrap, patch, upgrade.
pub struct Onboarding<C, S, P> {
    identity: ReleaseIdentity,
    cluster: C,
    store: S,
    prompt: P,
    batch: BatchStage,
}

impl<C, S, P> Onboarding<C, S, P>
where
    C: Cluster + Sync,
    S: ReleaseStore + Sync,
    P: Prompt,
{
    pub fn new(identity: ReleaseIdentity, cluster: C, store: S, prompt: P) -> Self {
        Self {
            identity,
            cluster,
            store,
            prompt,
            batch: BatchStage::default(),
        }
    }

    /// Replaces the batch stage used for existence checks and patches.
    #[must_use]
    pub fn with_batch(mut self, batch: BatchStage) -> Self {
        self.batch = batch;
        self
    }

    /// Runs the workflow to completion. Every error is fatal to the run; a partially patched
    /// resource is not an error.
    pub async fn run(&self) -> Result<Completion> {
        let ReleaseIdentity {
            namespace,
            release_name,
            chart_name,
        } = &self.identity;

        console_logger::info(&format!("Switching namespace to {namespace}"));
        self.cluster.ensure_namespace().await?;

        console_logger::info("Loading expected resources");
        let resources = render(&self.store, release_name, chart_name).await?;

        console_logger::info("Checking resources exist");
        self.confirm_missing(&resources).await?;

        console_logger::info("Checking if release already exists");
        match self.store.release_exists(release_name).await {
            ApiStatus::Ok => {
                console_logger::info("Release already exists. Nothing to do.");
                return Ok(Completion::ReleaseAlreadyExists);
            }
            ApiStatus::NotFound => {}
            status => {
                return ReleaseQuery {
                    release_name,
                    namespace,
                    status,
                }
                .fail()
            }
        }

        console_logger::info(&format!("Creating an empty {} release", PRODUCT.to_lowercase()));
        bootstrap(&self.store, release_name).await?;
        console_logger::success(&format!(
            "Successfully created empty {} release",
            PRODUCT.to_lowercase()
        ));

        console_logger::info(&format!(
            "Patching resources ready for {} upgrade",
            PRODUCT.to_lowercase()
        ));
        self.patch_all(&resources).await;

        self.store
            .upgrade(release_name, chart_name)
            .await
            .context(Upgrade {
                release_name,
                chart_name,
            })?;
        console_logger::success(&format!(
            "Successfully onboarded the {} chart {chart_name}",
            PRODUCT.to_lowercase()
        ));
        info!(%release_name, %chart_name, %namespace, "Onboarded");

        Ok(Completion::Onboarded)
    }

    /// Checks every resource, and asks the operator before going on if any of them could not
    /// be confirmed as live.
    async fn confirm_missing(&self, resources: &[Resource]) -> Result<()> {
        let statuses = self
            .batch
            .run(resources, |resource| check_resource(&self.cluster, resource))
            .await;

        if statuses.iter().all(ApiStatus::is_ok) {
            return Ok(());
        }

        console_logger::warn(MISSING_RESOURCES_WARNING, "");
        if self.prompt.confirm(CONTINUE_PROMPT)? {
            return Ok(());
        }
        OperatorDeclined.fail()
    }

    /// Patches every resource. Failures are reported and otherwise tolerated.
    async fn patch_all(&self, resources: &[Resource]) {
        let mutations = ownership_mutations(&self.identity.release_name, &self.identity.namespace);
        let outcomes = self
            .batch
            .run(resources, |resource| {
                patch_resource(&self.cluster, resource, &mutations)
            })
            .await;

        let mut failures = 0usize;
        for (resource, outcome) in resources.iter().zip(outcomes.iter()) {
            match outcome {
                PatchOutcome::Patched => {}
                PatchOutcome::NotFound => {
                    failures += 1;
                    console_logger::warn(
                        "Warning: failed to patch resource!",
                        &format!("{resource} was not found"),
                    );
                }
                PatchOutcome::Partial {
                    applied,
                    failed_key,
                    status,
                } => {
                    failures += 1;
                    console_logger::warn(
                        "Warning: failed to patch resource!",
                        &format!(
                            "{resource}: setting {failed_key} failed ({status}), {applied} of {} changes applied",
                            mutations.len()
                        ),
                    );
                }
            }
        }

        if failures == 0 {
            console_logger::success("Successfully patched all resources");
        } else {
            warn!(failures, total = resources.len(), "Some resources were not fully patched");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        common::error::{
            Error, GetNamespace, HelmInstallCommand, HelmTemplateCommand, HelmUpgradeCommand,
        },
        helm::store::MockReleaseStore,
        kube_client::{MetadataField, MockCluster},
        user_prompt::MockPrompt,
    };
    use kube::core::ErrorResponse;
    use snafu::IntoError;
    use std::num::NonZeroUsize;

    const TWO_RESOURCES: &[u8] = b"---
# Source: mychart/templates/deployment.yaml
apiVersion: apps/v1
kind: Deployment
metadata:
  name: web
---
# Source: mychart/templates/service.yaml
apiVersion: v1
kind: Service
metadata:
  name: web
";

    const THREE_RESOURCES: &[u8] = b"apiVersion: v1
kind: ConfigMap
metadata:
  name: one
---
apiVersion: v1
kind: ConfigMap
metadata:
  name: two
---
apiVersion: v1
kind: ConfigMap
metadata:
  name: three
";

    fn identity() -> ReleaseIdentity {
        ReleaseIdentity {
            namespace: "default".to_string(),
            release_name: "myrelease".to_string(),
            chart_name: "mychart".to_string(),
        }
    }

    fn cluster_in_namespace() -> MockCluster {
        let mut cluster = MockCluster::new();
        cluster
            .expect_ensure_namespace()
            .times(1)
            .returning(|| Ok(()));
        cluster
    }

    fn store_rendering(rendered: &'static [u8]) -> MockReleaseStore {
        let mut store = MockReleaseStore::new();
        store
            .expect_render()
            .withf(|release, chart| release == "myrelease" && chart == "mychart")
            .times(1)
            .returning(move |_, _| Ok(rendered.to_vec()));
        store
    }

    fn no_prompt() -> MockPrompt {
        let mut prompt = MockPrompt::new();
        prompt.expect_confirm().never();
        prompt
    }

    fn answering(answer: bool) -> MockPrompt {
        let mut prompt = MockPrompt::new();
        prompt
            .expect_confirm()
            .withf(|question| question == "Do you want to continue? [y/N]")
            .times(1)
            .returning(move |_| Ok(answer));
        prompt
    }

    fn expect_bootstrap(store: &mut MockReleaseStore) {
        store
            .expect_create_empty_chart()
            .times(1)
            .returning(|_| Ok(()));
        store
            .expect_install()
            .withf(|release, _| release == "myrelease")
            .times(1)
            .returning(|_, _| Ok(()));
    }

    fn expect_no_changes(store: &mut MockReleaseStore, cluster: &mut MockCluster) {
        store.expect_create_empty_chart().never();
        store.expect_install().never();
        store.expect_upgrade().never();
        cluster.expect_set_metadata().never();
    }

    #[tokio::test]
    async fn onboards_fully_applied_chart() {
        let mut cluster = cluster_in_namespace();
        cluster
            .expect_probe()
            .times(2)
            .returning(|_| ApiStatus::Ok);
        cluster
            .expect_set_metadata()
            .withf(|resource, field, key, value| {
                resource.name() == "web"
                    && match key {
                        "meta.helm.sh/release-name" => {
                            *field == MetadataField::Annotation && value == "myrelease"
                        }
                        "meta.helm.sh/release-namespace" => {
                            *field == MetadataField::Annotation && value == "default"
                        }
                        "app.kubernetes.io/managed-by" => {
                            *field == MetadataField::Label && value == "Helm"
                        }
                        _ => false,
                    }
            })
            .times(6)
            .returning(|_, _, _, _| ApiStatus::Ok);

        let mut store = store_rendering(TWO_RESOURCES);
        store
            .expect_release_exists()
            .withf(|release| release == "myrelease")
            .times(1)
            .returning(|_| ApiStatus::NotFound);
        expect_bootstrap(&mut store);
        store
            .expect_upgrade()
            .withf(|release, chart| release == "myrelease" && chart == "mychart")
            .times(1)
            .returning(|_, _| Ok(()));

        let completion = Onboarding::new(identity(), cluster, store, no_prompt())
            .run()
            .await
            .unwrap();
        assert_eq!(completion, Completion::Onboarded);
    }

    #[tokio::test]
    async fn existing_release_is_left_alone() {
        let mut cluster = cluster_in_namespace();
        cluster
            .expect_probe()
            .times(2)
            .returning(|_| ApiStatus::Ok);

        let mut store = store_rendering(TWO_RESOURCES);
        store
            .expect_release_exists()
            .times(1)
            .returning(|_| ApiStatus::Ok);
        expect_no_changes(&mut store, &mut cluster);

        let completion = Onboarding::new(identity(), cluster, store, no_prompt())
            .run()
            .await
            .unwrap();
        assert_eq!(completion, Completion::ReleaseAlreadyExists);
    }

    #[tokio::test]
    async fn existing_release_is_left_alone_after_confirmation() {
        let mut cluster = cluster_in_namespace();
        cluster
            .expect_probe()
            .times(3)
            .returning(|resource| match resource.name() {
                "two" => ApiStatus::NotFound,
                _ => ApiStatus::Ok,
            });

        let mut store = store_rendering(THREE_RESOURCES);
        store
            .expect_release_exists()
            .times(1)
            .returning(|_| ApiStatus::Ok);
        expect_no_changes(&mut store, &mut cluster);

        let completion = Onboarding::new(identity(), cluster, store, answering(true))
            .run()
            .await
            .unwrap();
        assert_eq!(completion, Completion::ReleaseAlreadyExists);
    }

    #[tokio::test]
    async fn declining_the_prompt_aborts_before_bootstrap() {
        let mut cluster = cluster_in_namespace();
        cluster
            .expect_probe()
            .times(3)
            .returning(|resource| match resource.name() {
                "one" => ApiStatus::Ok,
                _ => ApiStatus::NotFound,
            });

        let mut store = store_rendering(THREE_RESOURCES);
        store.expect_release_exists().never();
        expect_no_changes(&mut store, &mut cluster);

        let error = Onboarding::new(identity(), cluster, store, answering(false))
            .run()
            .await
            .unwrap_err();
        assert!(matches!(error, Error::OperatorDeclined));
    }

    #[tokio::test]
    async fn unverifiable_resources_also_need_confirmation() {
        let mut cluster = cluster_in_namespace();
        cluster
            .expect_probe()
            .times(2)
            .returning(|resource| match resource.kind() {
                "Service" => ApiStatus::Unavailable("connection refused".to_string()),
                _ => ApiStatus::Ok,
            });

        let mut store = store_rendering(TWO_RESOURCES);
        store.expect_release_exists().never();
        expect_no_changes(&mut store, &mut cluster);

        let error = Onboarding::new(identity(), cluster, store, answering(false))
            .run()
            .await
            .unwrap_err();
        assert!(matches!(error, Error::OperatorDeclined));
    }

    #[tokio::test]
    async fn render_failure_short_circuits() {
        let mut cluster = cluster_in_namespace();
        cluster.expect_probe().never();
        let mut store = MockReleaseStore::new();
        store.expect_render().times(1).returning(|_, _| {
            HelmTemplateCommand {
                command: "helm",
                args: vec!["template".to_string()],
                std_err: "Error: Chart.yaml file is missing",
            }
            .fail()
        });
        store.expect_release_exists().never();
        expect_no_changes(&mut store, &mut cluster);

        let error = Onboarding::new(identity(), cluster, store, no_prompt())
            .run()
            .await
            .unwrap_err();
        assert!(matches!(error, Error::Render { .. }));
    }

    #[tokio::test]
    async fn namespace_failure_short_circuits() {
        let mut cluster = MockCluster::new();
        cluster.expect_ensure_namespace().times(1).returning(|| {
            Err(GetNamespace { namespace: "default" }.into_error(kube::Error::Api(
                ErrorResponse {
                    status: "Failure".to_string(),
                    message: "namespaces \"default\" not found".to_string(),
                    reason: "NotFound".to_string(),
                    code: 404,
                },
            )))
        });
        cluster.expect_probe().never();
        let mut store = MockReleaseStore::new();
        store.expect_render().never();
        store.expect_release_exists().never();
        expect_no_changes(&mut store, &mut cluster);

        let error = Onboarding::new(identity(), cluster, store, no_prompt())
            .run()
            .await
            .unwrap_err();
        assert!(matches!(error, Error::GetNamespace { .. }));
    }

    #[tokio::test]
    async fn bootstrap_runs_only_for_absent_release() {
        for (status, bootstraps) in [(ApiStatus::NotFound, true), (ApiStatus::Ok, false)] {
            let mut cluster = cluster_in_namespace();
            cluster.expect_probe().returning(|_| ApiStatus::Ok);
            cluster
                .expect_set_metadata()
                .returning(|_, _, _, _| ApiStatus::Ok);

            let mut store = store_rendering(TWO_RESOURCES);
            store
                .expect_release_exists()
                .times(1)
                .return_const(status.clone());
            let times = usize::from(bootstraps);
            store
                .expect_create_empty_chart()
                .times(times)
                .returning(|_| Ok(()));
            store.expect_install().times(times).returning(|_, _| Ok(()));
            store.expect_upgrade().times(times).returning(|_, _| Ok(()));

            Onboarding::new(identity(), cluster, store, no_prompt())
                .run()
                .await
                .unwrap();
        }
    }

    #[tokio::test]
    async fn release_query_failure_is_fatal() {
        let mut cluster = cluster_in_namespace();
        cluster
            .expect_probe()
            .times(2)
            .returning(|_| ApiStatus::Ok);

        let mut store = store_rendering(TWO_RESOURCES);
        store
            .expect_release_exists()
            .times(1)
            .returning(|_| ApiStatus::Denied("secrets is forbidden".to_string()));
        expect_no_changes(&mut store, &mut cluster);

        let error = Onboarding::new(identity(), cluster, store, no_prompt())
            .run()
            .await
            .unwrap_err();
        assert!(matches!(
            error,
            Error::ReleaseQuery {
                status: ApiStatus::Denied(_),
                ..
            }
        ));
    }

    #[tokio::test]
    async fn bootstrap_failure_is_fatal() {
        let mut cluster = cluster_in_namespace();
        cluster
            .expect_probe()
            .times(2)
            .returning(|_| ApiStatus::Ok);
        cluster.expect_set_metadata().never();

        let mut store = store_rendering(TWO_RESOURCES);
        store
            .expect_release_exists()
            .returning(|_| ApiStatus::NotFound);
        store
            .expect_create_empty_chart()
            .times(1)
            .returning(|_| Ok(()));
        store.expect_install().times(1).returning(|_, _| {
            HelmInstallCommand {
                command: "helm",
                args: vec!["install".to_string()],
                std_err: "cannot re-use a name that is still in use",
            }
            .fail()
        });
        store.expect_upgrade().never();

        let error = Onboarding::new(identity(), cluster, store, no_prompt())
            .run()
            .await
            .unwrap_err();
        assert!(matches!(error, Error::Bootstrap { .. }));
    }

    #[tokio::test]
    async fn patch_failures_are_tolerated() {
        let mut cluster = cluster_in_namespace();
        cluster
            .expect_probe()
            .times(3)
            .returning(|_| ApiStatus::Ok);
        // "two" fails at its second mutation, so it gets two calls, the others three each.
        cluster
            .expect_set_metadata()
            .withf(|resource, _, _, _| resource.name() != "two")
            .times(6)
            .returning(|_, _, _, _| ApiStatus::Ok);
        cluster
            .expect_set_metadata()
            .withf(|resource, _, key, _| {
                resource.name() == "two" && key == "meta.helm.sh/release-name"
            })
            .times(1)
            .returning(|_, _, _, _| ApiStatus::Ok);
        cluster
            .expect_set_metadata()
            .withf(|resource, _, key, _| {
                resource.name() == "two" && key == "meta.helm.sh/release-namespace"
            })
            .times(1)
            .returning(|_, _, _, _| ApiStatus::Unavailable("timeout".to_string()));

        let mut store = store_rendering(THREE_RESOURCES);
        store
            .expect_release_exists()
            .returning(|_| ApiStatus::NotFound);
        expect_bootstrap(&mut store);
        store.expect_upgrade().times(1).returning(|_, _| Ok(()));

        let completion = Onboarding::new(identity(), cluster, store, no_prompt())
            .with_batch(BatchStage::with_concurrency(NonZeroUsize::new(2).unwrap()))
            .run()
            .await
            .unwrap();
        assert_eq!(completion, Completion::Onboarded);
    }

    #[tokio::test]
    async fn upgrade_failure_is_an_error() {
        let mut cluster = cluster_in_namespace();
        cluster.expect_probe().returning(|_| ApiStatus::Ok);
        cluster
            .expect_set_metadata()
            .returning(|_, _, _, _| ApiStatus::Ok);

        let mut store = store_rendering(TWO_RESOURCES);
        store
            .expect_release_exists()
            .returning(|_| ApiStatus::NotFound);
        expect_bootstrap(&mut store);
        store.expect_upgrade().times(1).returning(|_, _| {
            HelmUpgradeCommand {
                command: "helm",
                args: vec!["upgrade".to_string()],
                std_err: "rendered manifests contain a resource that already exists",
            }
            .fail()
        });

        let error = Onboarding::new(identity(), cluster, store, no_prompt())
            .run()
            .await
            .unwrap_err();
        assert!(
            matches!(error, Error::Upgrade { ref chart_name, .. } if chart_name == "mychart")
        );
    }
}
