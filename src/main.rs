use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use podview_core::{AggregationService, ContextSelector, Response};
use podview_k8s::{ClusterGateway, ContextSource, KubeGateway, KubeconfigRegistry};

mod config;

use config::Config;

/// Podview - Read-only pod browser across every kubeconfig context
#[derive(Parser, Debug)]
#[command(name = "podview")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file (TOML)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Kubeconfig to use instead of KUBECONFIG or ~/.kube/config
    #[arg(long, global = true, value_name = "FILE")]
    kubeconfig: Option<PathBuf>,

    /// Pretty-print the JSON response
    #[arg(long, global = true)]
    pretty: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List configured contexts
    Contexts,

    /// List pods in one context, or in every context with `all`
    Pods {
        #[arg(value_name = "CONTEXT", default_value = "all")]
        context: String,
    },

    /// Print the current logs of a pod
    Logs {
        context: String,
        namespace: String,
        pod: String,
    },

    /// Show the full details of a pod, including its events
    Describe {
        context: String,
        namespace: String,
        pod: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = Config::load(args.config.as_deref())?.with_overrides(args.kubeconfig, args.pretty);

    // Logs go to stderr so stdout carries only the response
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let registry = match &config.kubeconfig {
        Some(path) => KubeconfigRegistry::with_path(path),
        None => KubeconfigRegistry::new(),
    };
    let service = AggregationService::new(registry.clone(), KubeGateway::new(registry));

    let response = run(&service, args.command).await;
    print_response(&response, config.pretty)
}

async fn run<R, G>(service: &AggregationService<R, G>, command: Command) -> Response
where
    R: ContextSource,
    G: ClusterGateway,
{
    match command {
        Command::Contexts => service.contexts_response(),
        Command::Pods { context } => {
            service
                .pods_response(&ContextSelector::from(context.as_str()))
                .await
        }
        Command::Logs {
            context,
            namespace,
            pod,
        } => service.logs_response(&context, &namespace, &pod).await,
        Command::Describe {
            context,
            namespace,
            pod,
        } => service.details_response(&context, &namespace, &pod).await,
    }
}

fn print_response(response: &Response, pretty: bool) -> Result<()> {
    let body = if pretty {
        serde_json::to_string_pretty(response)
    } else {
        serde_json::to_string(response)
    }
    .context("Failed to serialize response")?;

    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{}", body).context("Failed to write response")?;
    Ok(())
}
