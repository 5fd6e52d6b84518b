use annex_apiserver::admission::{
    AdmissionRequest, AdmissionResponse, AdmissionReviewer, JsonPatchOp,
};
use annex_apiserver::{ApiServer, Config, Registry, TlsMode};
use annex_tokens::MemorySecretStore;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Parser)]
#[command(name = "annex", about = "Annex Kubernetes API extension server")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the API extension server
    Serve {
        /// Address to listen on
        #[arg(long, default_value = "0.0.0.0:9443")]
        bind: String,
        /// Path to a PEM server certificate; plain HTTP when unset
        #[arg(long, requires = "tls_key")]
        tls_cert: Option<PathBuf>,
        /// Path to the matching PEM private key
        #[arg(long, requires = "tls_cert")]
        tls_key: Option<PathBuf>,
    },
}

/// Mutating reviewer marking every admitted object
struct AnnotatingReviewer;

impl AdmissionReviewer for AnnotatingReviewer {
    fn review(&self, request: &AdmissionRequest) -> AdmissionResponse {
        AdmissionResponse::patched(
            &request.uid,
            &[
                JsonPatchOp::add("/metadata/annotations/access", "granted"),
                JsonPatchOp::add("/metadata/annotations/reason", "not blocked"),
            ],
        )
    }
}

/// Validating reviewer refusing objects named "blocked"
struct NameBlockReviewer;

impl AdmissionReviewer for NameBlockReviewer {
    fn review(&self, request: &AdmissionRequest) -> AdmissionResponse {
        if request.name == "blocked" {
            AdmissionResponse::denied(&request.uid, "none shall pass!")
        } else {
            AdmissionResponse::allowed(&request.uid)
        }
    }
}

#[tokio::main]
async fn main() -> miette::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve {
            bind,
            tls_cert,
            tls_key,
        } => run_serve(&bind, tls_cert, tls_key).await,
    }
}

/// Run the API extension server
async fn run_serve(
    bind: &str,
    tls_cert: Option<PathBuf>,
    tls_key: Option<PathBuf>,
) -> miette::Result<()> {
    info!("Starting annex API extension server");

    let registry = Arc::new(Registry::new());
    let store = Arc::new(MemorySecretStore::new());

    annex_tokens::register(&registry, store)?;

    let tls = match (tls_cert, tls_key) {
        (Some(cert_path), Some(key_path)) => TlsMode::Provided {
            cert_path,
            key_path,
        },
        _ => TlsMode::Disabled,
    };

    let config = Config {
        listen_addr: bind
            .parse()
            .map_err(|e| miette::miette!("Invalid bind address '{}': {}", bind, e))?,
        tls,
    };

    let server = ApiServer::new(config, registry)
        .with_admission(Arc::new(AnnotatingReviewer), Arc::new(NameBlockReviewer));

    server.run().await
}
