use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use colleged::{db, router, seed, AppState};

#[derive(Parser)]
#[command(name = "colleged", about = "College administration backend")]
struct Cli {
    /// Directory holding the database file and uploaded attachments.
    #[arg(long, env = "DATA_DIR", default_value = "colleged_data")]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server (the default).
    Serve {
        #[arg(long, env = "PORT", default_value_t = 8000)]
        port: u16,
        /// Public base URL embedded in generated file links.
        #[arg(long, env = "BASE_URL")]
        base_url: Option<String>,
    },
    /// Populate the fixture rows: admin, faculty roster, curriculum, students.
    Seed,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("colleged=info,tower_http=info")),
        )
        .init();

    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Command::Serve {
        port: 8000,
        base_url: None,
    });

    match command {
        Command::Seed => {
            let conn = db::open_db(&cli.data_dir)?;
            seed::run(&conn)?;
            info!("seeding complete");
        }
        Command::Serve { port, base_url } => {
            let conn = db::open_db(&cli.data_dir)?;
            let upload_dir = cli.data_dir.join("uploaded_files");
            std::fs::create_dir_all(&upload_dir)?;

            let base_url = base_url.unwrap_or_else(|| format!("http://localhost:{}", port));
            let state = Arc::new(AppState::new(conn, upload_dir, base_url));
            let app = router(state);

            let addr = SocketAddr::from(([0, 0, 0, 0], port));
            let listener = tokio::net::TcpListener::bind(addr).await?;
            info!("listening on http://{}", addr);
            axum::serve(listener, app)
                .with_graceful_shutdown(shutdown_signal())
                .await?;
        }
    }

    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}
