use crate::{
    common::{
        constants::{CHART_TEMPLATES_DIR, HELM, HELM_V3_REGEX},
        error::{
            HelmCommand, HelmCreateCommand, HelmInstallCommand, HelmTemplateCommand,
            HelmUpgradeCommand, HelmVersion, HelmVersionCommand, RegexCompile,
            RemoveChartTemplates, Result, U8VectorToString,
        },
    },
    vec_to_strings,
};
use regex::Regex;
use snafu::{ensure, ResultExt};
use std::{
    fs,
    path::Path,
    process::{Command, Output},
    str,
};
use tracing::debug;

/// This is a builder for HelmReleaseClient.
#[derive(Default)]
pub struct HelmReleaseClientBuilder {
    namespace: Option<String>,
}

impl HelmReleaseClientBuilder {
    /// This is a builder option to add Namespace. Releases are always tied to a Namespace; if
    /// unset, helm falls back to the kubeconfig context's namespace.
    #[must_use]
    pub fn with_namespace<J>(mut self, ns: J) -> Self
    where
        J: ToString,
    {
        self.namespace = Some(ns.to_string());
        self
    }

    /// Build the HelmReleaseClient.
    pub fn build(self) -> HelmReleaseClient {
        HelmReleaseClient {
            namespace: self.namespace,
        }
    }
}

/// This type has functions which execute helm commands to render, create, install and
/// upgrade helm releases.
#[derive(Clone, Debug)]
pub struct HelmReleaseClient {
    namespace: Option<String>,
}

impl HelmReleaseClient {
    /// This creates an empty builder.
    pub fn builder() -> HelmReleaseClientBuilder {
        HelmReleaseClientBuilder::default()
    }

    /// The `-n <namespace>` arguments, if a namespace is set.
    fn namespace_args(&self) -> Vec<String> {
        match self.namespace.as_deref() {
            Some(ns) => vec_to_strings!["-n", ns],
            None => Vec::new(),
        }
    }

    /// Spawns helm with the args and waits for it to exit.
    fn execute(&self, args: &[String]) -> Result<Output> {
        let output = Command::new(HELM)
            .args(args)
            .output()
            .context(HelmCommand {
                command: HELM.to_string(),
                args: args.to_vec(),
            })?;

        debug!(
            stdout = %String::from_utf8_lossy(output.stdout.as_slice()),
            status = %output.status,
            "Helm command standard output"
        );
        Ok(output)
    }

    /// Runs command `helm version --short` and validates that it is helm v3.
    pub fn validate_v3(&self) -> Result<String> {
        let args: Vec<String> = vec_to_strings!["version", "--short"];
        debug!(command = %HELM, ?args, "Helm version command");

        let output = self.execute(&args)?;
        ensure!(
            output.status.success(),
            HelmVersionCommand {
                command: HELM.to_string(),
                args,
                std_err: stderr_of(&output)?,
            }
        );

        let version = str::from_utf8(output.stdout.as_slice())
            .context(U8VectorToString)?
            .trim()
            .to_string();
        ensure!(
            Regex::new(HELM_V3_REGEX)
                .context(RegexCompile {
                    expression: HELM_V3_REGEX.to_string(),
                })?
                .is_match(version.as_str()),
            HelmVersion { version }
        );

        Ok(version)
    }

    /// Runs command `helm template <release_name> <chart> -n <namespace>`, returning the
    /// rendered manifests.
    pub fn template<A, B>(&self, release_name: A, chart: B) -> Result<Vec<u8>>
    where
        A: ToString,
        B: ToString,
    {
        let mut args: Vec<String> = vec_to_strings!["template", release_name, chart];
        args.extend(self.namespace_args());
        debug!(command = %HELM, ?args, "Helm template command");

        let output = self.execute(&args)?;
        ensure!(
            output.status.success(),
            HelmTemplateCommand {
                command: HELM.to_string(),
                args,
                std_err: stderr_of(&output)?,
            }
        );

        Ok(output.stdout)
    }

    /// Runs command `helm create <chart_dir>` and removes the scaffolded templates, leaving a
    /// chart which renders no resources.
    pub fn create_empty<P>(&self, chart_dir: P) -> Result<()>
    where
        P: AsRef<Path>,
    {
        let chart_dir = chart_dir.as_ref();
        let args: Vec<String> = vec_to_strings!["create", chart_dir.to_string_lossy()];
        debug!(command = %HELM, ?args, "Helm create command");

        let output = self.execute(&args)?;
        ensure!(
            output.status.success(),
            HelmCreateCommand {
                command: HELM.to_string(),
                args,
                std_err: stderr_of(&output)?,
            }
        );

        let templates = chart_dir.join(CHART_TEMPLATES_DIR);
        fs::remove_dir_all(templates.as_path()).context(RemoveChartTemplates { path: templates })
    }

    /// Runs command `helm install <release_name> <chart_dir> -n <namespace>`.
    pub fn install<A, P>(&self, release_name: A, chart_dir: P) -> Result<()>
    where
        A: ToString,
        P: AsRef<Path>,
    {
        let mut args: Vec<String> =
            vec_to_strings!["install", release_name, chart_dir.as_ref().to_string_lossy()];
        args.extend(self.namespace_args());
        debug!(command = %HELM, ?args, "Helm install command");

        let output = self.execute(&args)?;
        ensure!(
            output.status.success(),
            HelmInstallCommand {
                command: HELM.to_string(),
                args,
                std_err: stderr_of(&output)?,
            }
        );

        Ok(())
    }

    /// Runs command `helm upgrade <release_name> <chart> -n <namespace>`.
    pub fn upgrade<A, B>(&self, release_name: A, chart: B) -> Result<()>
    where
        A: ToString,
        B: ToString,
    {
        let mut args: Vec<String> = vec_to_strings!["upgrade", release_name, chart];
        args.extend(self.namespace_args());
        debug!(command = %HELM, ?args, "Helm upgrade command");

        let output = self.execute(&args)?;
        ensure!(
            output.status.success(),
            HelmUpgradeCommand {
                command: HELM.to_string(),
                args,
                std_err: stderr_of(&output)?,
            }
        );

        Ok(())
    }
}

fn stderr_of(output: &Output) -> Result<String> {
    Ok(str::from_utf8(output.stderr.as_slice())
        .context(U8VectorToString)?
        .to_string())
}
