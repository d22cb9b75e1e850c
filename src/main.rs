use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use pixel_guess::config::{DEFAULT_PROMPT, ServerConfig};
use pixel_guess::inference::VertexBackend;
use pixel_guess::server;
use pixel_guess::service::GuessService;

/// Upload a photo, shrink it step by step, and let a vision model guess
/// what it shows at each size.
#[derive(Parser, Debug)]
#[command(name = "pixel-guess")]
#[command(about = "🔍 How many pixels does a model need to recognise a picture?")]
struct Args {
    /// Listen host (empty for all interfaces)
    #[arg(long, env = "ADDR", default_value = "")]
    addr: String,

    /// Listen port
    #[arg(short, long, env = "PORT", default_value_t = 8080)]
    port: u16,

    /// Directory holding index.html, static/ and samples/
    #[arg(long, env = "CONTENT_ROOT", default_value = ".")]
    content_root: PathBuf,

    /// Uploaded images kept in memory before the oldest is evicted
    #[arg(long, env = "MAX_IMAGES", default_value_t = 20)]
    max_images: usize,

    /// JPEG quality of resized images (1-100)
    #[arg(long, env = "JPEG_QUALITY", default_value_t = 75)]
    jpeg_quality: u8,

    /// Largest accepted upload, in bytes
    #[arg(long, env = "MAX_UPLOAD_BYTES", default_value_t = 32 * 1024 * 1024)]
    max_upload_bytes: usize,

    /// Cloud project hosting the model
    #[arg(long, env = "GOOGLE_CLOUD_PROJECT", default_value = "")]
    project: String,

    /// Model region
    #[arg(long, env = "GOOGLE_CLOUD_LOCATION", default_value = "us-central1")]
    location: String,

    /// Model name
    #[arg(long, env = "MODEL_NAME", default_value = "gemini-1.5-flash")]
    model: String,

    /// Full generateContent URL, overriding project/location/model
    #[arg(long, env = "MODEL_ENDPOINT")]
    endpoint: Option<String>,

    /// Bearer token for the model endpoint
    #[arg(long, env = "GOOGLE_ACCESS_TOKEN", hide_env_values = true)]
    access_token: Option<String>,

    /// Sampling temperature
    #[arg(long, env = "MODEL_TEMPERATURE", default_value_t = 0.4)]
    temperature: f32,

    /// Instruction sent with every picture
    #[arg(long, env = "MODEL_PROMPT", default_value = DEFAULT_PROMPT)]
    prompt: String,

    /// Timeout of a single model call, in seconds
    #[arg(long, env = "MODEL_TIMEOUT_SECS", default_value_t = 30)]
    request_timeout_secs: u64,
}

impl From<Args> for ServerConfig {
    fn from(args: Args) -> Self {
        ServerConfig {
            addr: args.addr,
            port: args.port,
            max_images: args.max_images,
            jpeg_quality: args.jpeg_quality,
            max_upload_bytes: args.max_upload_bytes,
            content_root: args.content_root,
            project_id: args.project,
            location: args.location,
            model: args.model,
            endpoint: args.endpoint.filter(|url| !url.is_empty()),
            access_token: args.access_token.filter(|token| !token.is_empty()),
            temperature: args.temperature,
            prompt: args.prompt,
            request_timeout_secs: args.request_timeout_secs,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = ServerConfig::from(Args::parse());
    config.validate()?;

    info!(
        project = %config.project_id,
        model = %config.model,
        location = %config.location,
        "Starting server"
    );

    let backend = VertexBackend::connect(&config.vertex_settings()).await?;
    info!(
        endpoint = backend.url(),
        credentials = backend.credentials(),
        "Model endpoint"
    );
    let service = Arc::new(GuessService::from_config(&config, Arc::new(backend)));
    let app = server::router(service, &config);

    let addr = config.listen_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    server::serve(listener, app).await
}
