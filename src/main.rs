use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use worry_tree::api::{self, middleware::RateLimiter};
use worry_tree::comfort::ComfortClient;
use worry_tree::config::AppConfig;
use worry_tree::db;
use worry_tree::lifecycle::session::{TreeEvent, TreeSession};
use worry_tree::lifecycle::{LifecycleError, TreeController};
use worry_tree::share::{ShareCodec, Strategy};
use worry_tree::summary;

#[derive(Parser)]
#[command(name = "worry-tree")]
#[command(about = "Hang your worries on a tree, share it, and comfort them away")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the self-hosted blob store for short share links
    Serve {
        /// Port for HTTP API
        #[arg(short, long, default_value = "3000")]
        port: u16,
    },
    /// Hang worries on a new tree and print its share link
    Share {
        /// A worry to hang on the tree (repeatable)
        #[arg(short, long = "worry", required = true)]
        worries: Vec<String>,

        /// Share strategies to try, in order (remote_store, lz_string, deflate, base64)
        #[arg(short, long = "strategy", value_parser = parse_strategy)]
        strategies: Vec<Strategy>,

        /// Write the link's QR code to this PNG file
        #[arg(long)]
        qr: Option<PathBuf>,
    },
    /// List the worries carried by a share link
    Open {
        /// Share link (or just its query string)
        link: String,
    },
    /// Comfort every worry on a shared tree
    Comfort {
        /// Share link (or just its query string)
        link: String,

        /// Use this message instead of generating one per worry
        #[arg(short, long)]
        message: Option<String>,

        /// Export the summary (.json for JSON, anything else for text)
        #[arg(long)]
        export: Option<PathBuf>,
    },
}

fn parse_strategy(s: &str) -> Result<Strategy, String> {
    Strategy::from_str(s).ok_or_else(|| format!("unknown share strategy `{}`", s))
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "worry_tree=info,tower_http=debug".into()),
    );

    // stdout carries links and summaries, so logs go to stderr
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let config = AppConfig::load();

    match cli.command {
        Commands::Serve { port } => serve(&config, port).await?,
        Commands::Share {
            worries,
            strategies,
            qr,
        } => share(&config, &worries, strategies, qr).await?,
        Commands::Open { link } => open(&config, &link).await?,
        Commands::Comfort {
            link,
            message,
            export,
        } => comfort(&config, &link, message, export).await?,
    }

    Ok(())
}

async fn serve(config: &AppConfig, port: u16) -> anyhow::Result<()> {
    tracing::info!("Starting blob store on port {}", port);

    let db = db::Database::open_default()?;
    db.migrate()?;

    let limiter = config.rate_limit.map(RateLimiter::per_minute);
    let app = api::create_router_with_limit(db, limiter);

    let listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{}", port)).await?;
    tracing::info!("Blob store listening on http://127.0.0.1:{}/api/jsonBlob", port);

    axum::serve(listener, app).await?;
    Ok(())
}

async fn share(
    config: &AppConfig,
    worries: &[String],
    strategies: Vec<Strategy>,
    qr: Option<PathBuf>,
) -> anyhow::Result<()> {
    let mut tree = TreeController::new().with_fall_duration(config.fall_duration());
    for text in worries {
        match tree.add_worry(text) {
            Ok(_) | Err(LifecycleError::BlankText) => {}
            Err(e) => return Err(e.into()),
        }
    }

    let codec = ShareCodec::from_config(config).with_strategies(strategies);
    let link = match codec.share(tree.store()).await {
        Ok(link) => link,
        Err(e) => anyhow::bail!("공유 링크를 생성하는 중 문제가 발생했습니다. ({})", e),
    };

    println!("{}", link.url);
    if link.is_self_contained() && codec.strategies().contains(&Strategy::RemoteStore) {
        eprintln!("네트워크 상태로 인해 긴 주소가 생성되었지만 기능은 정상적으로 작동합니다.");
    }

    if let Some(path) = qr {
        // The link is already out; QR failure only warns
        match link.write_qr(&config.qr, &path) {
            Ok(()) => eprintln!("QR code written to {}", path.display()),
            Err(e) => tracing::warn!("QR code not written to {}: {}", path.display(), e),
        }
    }

    Ok(())
}

async fn open(config: &AppConfig, link: &str) -> anyhow::Result<()> {
    let codec = ShareCodec::from_config(config);
    let tree = match codec.open(link).await {
        Ok(tree) => tree,
        Err(e) => {
            eprintln!("공유된 걱정을 불러오지 못했습니다: {}", e);
            return Ok(());
        }
    };

    for worry in tree.store().iter() {
        println!(
            "{}\t{}\t{} {} {}\t{}",
            worry.id,
            worry.color,
            worry.position.top_css(),
            worry.position.left_css(),
            worry.position.transform_css(),
            worry.text
        );
    }
    Ok(())
}

async fn comfort(
    config: &AppConfig,
    link: &str,
    message: Option<String>,
    export: Option<PathBuf>,
) -> anyhow::Result<()> {
    let codec = ShareCodec::from_config(config);
    let tree = match codec.open(link).await {
        Ok(tree) => tree.with_fall_duration(config.fall_duration()),
        Err(e) => {
            // A broken link leaves an ordinary, empty tree
            eprintln!("공유된 걱정을 불러오지 못했습니다: {}", e);
            return Ok(());
        }
    };

    let generator = ComfortClient::from_config(config);
    let (session, mut events) = TreeSession::new(tree);

    let pending: Vec<_> = session
        .lock()
        .store()
        .pending()
        .map(|w| (w.id, w.text.clone()))
        .collect();

    let mut falls = Vec::with_capacity(pending.len());
    for (id, text) in pending {
        let reply = match &message {
            Some(m) => m.clone(),
            None => generator.comfort(&text).await,
        };
        println!("\"{}\"\n  → {}", text, reply);
        falls.push(session.confirm_comfort(id, &reply)?);
    }

    for fall in falls {
        fall.await?;
    }

    let mut cleared = false;
    while let Ok(event) = events.try_recv() {
        tracing::debug!(?event, "tree event");
        cleared |= event == TreeEvent::AllCleared;
    }
    if !cleared {
        anyhow::bail!("tree still has worries after comforting");
    }

    let mut tree = session.lock();
    let shared = tree.is_shared_view();
    println!("\n{}", summary::render_text(tree.resolved(), shared));
    if let Some(path) = export {
        summary::export(tree.resolved(), shared, &path)?;
        eprintln!("Summary written to {}", path.display());
    }
    tree.dismiss_summary()?;

    Ok(())
}
