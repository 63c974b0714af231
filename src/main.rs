use std::{path::Path, sync::Arc};

use api_envelope::{
    EnvelopeService, ExposureSerializer, ServiceRegistry,
    config::{EnvelopeConfig, EnvelopeConfigValidator, load_config, load_validated_config},
    envelope_router, metrics, tracing_setup,
};
use clap::Parser;
use color_eyre::{Result, eyre::Context};
use tower_http::trace::TraceLayer;

mod demo;

#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    #[clap(subcommand)]
    command: Option<Commands>,

    #[clap(short, long, default_value = "envelope.toml")]
    config: String,
}

#[derive(Parser, Debug)]
enum Commands {
    /// Validate configuration file
    Validate {
        /// Configuration file to validate
        #[clap(short, long, default_value = "envelope.toml")]
        config: String,
    },
    /// Initialize a new configuration file
    Init {
        /// Output path for the new config file
        #[clap(short, long, default_value = "envelope.toml")]
        config: String,
    },
    /// Serve the demo API behind the envelope pipeline (default)
    Serve {
        /// Configuration file to use
        #[clap(short, long, default_value = "envelope.toml")]
        config: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let args = Args::parse();

    match args.command {
        Some(Commands::Validate { config }) => validate_config_command(&config).await,
        Some(Commands::Init { config }) => init_config_command(&config).await,
        Some(Commands::Serve { config }) => serve_command(&config).await,
        None => serve_command(&args.config).await,
    }
}

async fn serve_command(config_path: &str) -> Result<()> {
    let config = load_validated_config(config_path)?;

    tracing_setup::init_tracing_with_config(&config.log)?;
    metrics::init_metrics();

    let registry =
        ServiceRegistry::new().with_external_serializer(Arc::new(ExposureSerializer::new()));
    let service = Arc::new(
        EnvelopeService::new(&config, registry).context("Failed to build envelope pipeline")?,
    );

    let app = envelope_router(demo::router(), service).layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(&config.listen_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.listen_addr))?;
    tracing::info!(addr = %config.listen_addr, debug = config.debug, "Serving demo API");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        return;
    }
    tracing::info!("Shutdown signal received");
}

/// Validate configuration file
async fn validate_config_command(config_path: &str) -> Result<()> {
    println!("🔍 Validating configuration file: {config_path}");

    if !Path::new(config_path).exists() {
        eprintln!("❌ Error: Configuration file '{config_path}' not found");
        std::process::exit(1);
    }

    let config: EnvelopeConfig = match load_config(config_path).await {
        Ok(config) => {
            println!("✅ Configuration parsing: OK");
            config
        }
        Err(e) => {
            eprintln!("❌ Configuration parsing failed:");
            eprintln!("   {e:#}");
            std::process::exit(1);
        }
    };

    if let Err(e) = EnvelopeConfigValidator::validate(&config) {
        eprintln!("❌ Configuration validation failed:");
        eprintln!("{e}");
        println!();
        println!("💡 Common fixes:");
        println!("   • Give every path rule a prefix or a pattern");
        println!("   • Start prefixes with '/'");
        println!("   • Verify listen address format (e.g., '127.0.0.1:8080')");
        std::process::exit(1);
    }

    // Serializer tokens can only be checked against the services this binary registers.
    let registry =
        ServiceRegistry::new().with_external_serializer(Arc::new(ExposureSerializer::new()));
    if let Err(e) = EnvelopeService::new(&config, registry) {
        eprintln!("❌ Serializer resolution failed:");
        eprintln!("{e}");
        std::process::exit(1);
    }

    println!("✅ Configuration validation: OK");
    println!();
    println!("📋 Configuration Summary:");
    println!("   • Listen Address: {}", config.listen_addr);
    println!("   • Default Serializer: {}", config.default_serializer);
    println!("   • Path Rules: {}", config.paths.len());
    println!("   • Debug: {}", config.debug);
    println!(
        "   • CORS: {}",
        config
            .defaults
            .cors_allow_origin_regex
            .as_ref()
            .map_or("disabled by default", |_| "enabled by default")
    );
    println!();
    println!("🎉 Configuration is valid and ready to use!");
    Ok(())
}

/// Initialize a new configuration file
async fn init_config_command(config_path: &str) -> Result<()> {
    let path = Path::new(config_path);
    if path.exists() {
        eprintln!("❌ Error: Configuration file '{config_path}' already exists");
        std::process::exit(1);
    }

    let default_config = r#"# api-envelope configuration

# Verbose titles for unexpected server errors; never enable in production
debug = false

# Serializer used when no rule names one:
# json_encode | json_group_encode | array | external
default_serializer = "json_encode"

# The address the demo server listens on
listen_addr = "127.0.0.1:8080"

[log]
level = "info"
json = true

# Applied to every request handled by the pipeline
[defaults]
cors_allow_origin_regex = "^https?://localhost(:[0-9]+)?$"
cors_allow_headers = ["Content-Type", "Authorization"]
cors_max_age = 3600

# Path rules, first match wins
[[paths]]
name = "api"
prefix = "/api"
serializer = "json_group_encode"
serialize_groups = ["relationships"]

# [[paths]]
# name = "versioned"
# pattern = "^/v[0-9]+/"
# serializer = "external"
"#;

    tokio::fs::write(path, default_config)
        .await
        .context("Failed to write config file")?;
    println!("✅ Created default configuration at: {config_path}");
    println!("   Run 'api-envelope serve --config {config_path}' to start the demo server");
    Ok(())
}
