use crate::{common::constants::PRODUCT, kube_client::ApiStatus};
use snafu::Snafu;
use std::path::PathBuf;

/// For use with multiple fallible operations which may fail for different reasons, but are
/// defined withing the same scope and must return to the outer scope (calling scope) using
/// the try operator -- '?'.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
#[snafu(context(suffix(false)))]
pub enum Error {
    /// Error for when a Helm command cannot be spawned.
    #[snafu(display(
        "Failed to run Helm command,\ncommand: {},\nargs: {:?},\ncommand_error: {}",
        command,
        args,
        source
    ))]
    HelmCommand {
        source: std::io::Error,
        command: String,
        args: Vec<String>,
    },

    /// Error for when the `helm version` command exits with a non-zero status.
    #[snafu(display(
        "`helm version` command return an error,\ncommand: {},\nargs: {:?},\nstd_err: {}",
        command,
        args,
        std_err,
    ))]
    HelmVersionCommand {
        command: String,
        args: Vec<String>,
        std_err: String,
    },

    /// Error for when Helm v3.x.y is not present in $PATH.
    #[snafu(display("Helm version {} does not start with 'v3.x.y'", version))]
    HelmVersion { version: String },

    /// Error for when the `helm template` command exits with a non-zero status.
    #[snafu(display(
        "`helm template` command return an error,\ncommand: {},\nargs: {:?},\nstd_err: {}",
        command,
        args,
        std_err,
    ))]
    HelmTemplateCommand {
        command: String,
        args: Vec<String>,
        std_err: String,
    },

    /// Error for when the `helm create` command exits with a non-zero status.
    #[snafu(display(
        "`helm create` command return an error,\ncommand: {},\nargs: {:?},\nstd_err: {}",
        command,
        args,
        std_err,
    ))]
    HelmCreateCommand {
        command: String,
        args: Vec<String>,
        std_err: String,
    },

    /// Error for when the `helm install` command exits with a non-zero status.
    #[snafu(display(
        "`helm install` command return an error,\ncommand: {},\nargs: {:?},\nstd_err: {}",
        command,
        args,
        std_err,
    ))]
    HelmInstallCommand {
        command: String,
        args: Vec<String>,
        std_err: String,
    },

    /// Error for when the `helm upgrade` command exits with a non-zero status.
    #[snafu(display(
        "`helm upgrade` command return an error,\ncommand: {},\nargs: {:?},\nstd_err: {}",
        command,
        args,
        std_err,
    ))]
    HelmUpgradeCommand {
        command: String,
        args: Vec<String>,
        std_err: String,
    },

    /// Error for when a command's output is not valid UTF-8.
    #[snafu(display("Failed to convert Vec<u8> to UTF-8 formatted String: {}", source))]
    U8VectorToString { source: std::str::Utf8Error },

    /// Error for when regular expression parsing or compilation fails.
    #[snafu(display("Failed to compile regex {}: {}", expression, source))]
    RegexCompile {
        source: regex::Error,
        expression: String,
    },

    /// Error for when a rendered document is not valid YAML.
    #[snafu(display("Failed to parse rendered YAML document #{}: {}", index, source))]
    YamlParseFromSlice {
        source: serde_yaml::Error,
        index: usize,
    },

    /// Error for when a rendered document lacks the fields which identify a Kubernetes object.
    #[snafu(display(
        "Rendered document #{} is not a Kubernetes object (needs apiVersion, kind and metadata.name): {}",
        index,
        source
    ))]
    MalformedDescriptor {
        source: serde_yaml::Error,
        index: usize,
    },

    /// Error for when the chart could not be rendered into resources.
    #[snafu(display("Failed to template the chart {}: {}", chart_name, source))]
    Render {
        #[snafu(source(from(Error, Box::new)))]
        source: Box<Error>,
        chart_name: String,
    },

    /// Error for when the scratch directory for the empty chart cannot be created.
    #[snafu(display("Failed to create a temporary directory for the empty chart: {}", source))]
    TempDirCreation { source: std::io::Error },

    /// Error for when the templates of the scaffolded empty chart cannot be removed.
    #[snafu(display("Failed to remove chart templates at {}: {}", path.display(), source))]
    RemoveChartTemplates {
        source: std::io::Error,
        path: PathBuf,
    },

    /// Error for when the placeholder release cannot be created.
    #[snafu(display(
        "Failed to create empty {} release {}: {}",
        PRODUCT,
        release_name,
        source
    ))]
    Bootstrap {
        #[snafu(source(from(Error, Box::new)))]
        source: Box<Error>,
        release_name: String,
    },

    /// Error for when the placeholder release cannot be upgraded to the real chart.
    #[snafu(display(
        "Failed to upgrade the {} release {} with the chart {}: {}",
        PRODUCT,
        release_name,
        chart_name,
        source
    ))]
    Upgrade {
        #[snafu(source(from(Error, Box::new)))]
        source: Box<Error>,
        release_name: String,
        chart_name: String,
    },

    /// Error for when Kubernetes API client generation fails.
    #[snafu(display("Failed to generate kubernetes client: {}", source))]
    K8sClientGeneration { source: kube::Error },

    /// Error for a Kubernetes API GET request for a namespace resource fails.
    #[snafu(display("Failed to GET Kubernetes namespace {}: {}", namespace, source))]
    GetNamespace {
        source: kube::Error,
        namespace: String,
    },

    /// Error for when the release store cannot tell whether the release exists.
    #[snafu(display(
        "Failed to find out if {} release {} exists in namespace {}: {}",
        PRODUCT,
        release_name,
        namespace,
        status
    ))]
    ReleaseQuery {
        release_name: String,
        namespace: String,
        status: ApiStatus,
    },

    /// Error for when the operator does not confirm onboarding a partially applied chart.
    #[snafu(display("Onboarding was not confirmed, no changes were made"))]
    OperatorDeclined,

    /// Error for when the answer to the confirmation prompt cannot be read.
    #[snafu(display("Failed to read the answer to the confirmation prompt: {}", source))]
    ReadPromptInput { source: std::io::Error },
}

/// A wrapper type to remove repeated Result<T, Error> returns.
pub type Result<T, E = Error> = std::result::Result<T, E>;
