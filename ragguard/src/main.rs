use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use futures::StreamExt;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ragguard::api::{ApiServer, ApiServerConfig};
use ragguard::{ChatPipeline, Settings};

#[derive(Parser)]
#[command(name = "ragguard")]
#[command(about = "Grounded insurance chatbot", long_about = None)]
struct Cli {
    /// Env file to load before reading configuration
    #[arg(long, global = true)]
    env_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive chat in the terminal
    Chat {
        /// Print answers as they are generated
        #[arg(long)]
        stream: bool,
    },

    /// Ask a single question
    Ask {
        question: String,

        #[arg(long)]
        stream: bool,
    },

    /// Start the HTTP API server
    Serve {
        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port to listen on
        #[arg(short, long, default_value = "8000")]
        port: u16,

        /// API key for the chat routes (defaults to API_KEY)
        #[arg(long)]
        api_key: Option<String>,
    },
}

const EXIT_WORDS: &[&str] = &["quit", "exit", "bye"];

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "ragguard=info,ragguard_cache=info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let settings = Settings::load(cli.env_file.as_deref())?;
    let pipeline = Arc::new(ChatPipeline::from_settings(&settings)?);

    match cli.command {
        Commands::Chat { stream } => {
            pipeline.spawn_prewarm();
            run_interactive(&pipeline, stream).await?;
            pipeline.close().await;
        }

        Commands::Ask { question, stream } => {
            answer(&pipeline, &question, stream).await?;
            pipeline.close().await;
        }

        Commands::Serve { host, port, api_key } => {
            pipeline.spawn_prewarm();
            pipeline.client().embedding_cache().spawn_auto_cleanup();
            let config = ApiServerConfig {
                host,
                port,
                api_key: api_key.or_else(|| settings.api_key.clone()),
            };
            ApiServer::new(config, pipeline).start().await?;
        }
    }

    Ok(())
}

async fn answer(pipeline: &Arc<ChatPipeline>, question: &str, stream: bool) -> Result<()> {
    if stream {
        let mut fragments = pipeline.chat_stream(question);
        let mut stdout = std::io::stdout();
        while let Some(fragment) = fragments.next().await {
            print!("{}", fragment);
            stdout.flush()?;
        }
        println!();
    } else {
        println!("{}", pipeline.chat(question).await);
    }
    Ok(())
}

async fn run_interactive(pipeline: &Arc<ChatPipeline>, stream: bool) -> Result<()> {
    println!("Chào anh/chị! Em là trợ lý tư vấn bảo hiểm FISS.");
    println!("Gõ 'quit', 'exit' hoặc 'bye' để kết thúc.\n");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("Anh/chị: ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let question = line.trim();

        if question.is_empty() {
            continue;
        }
        if EXIT_WORDS.contains(&question.to_lowercase().as_str()) {
            println!("Cảm ơn anh/chị! Nếu cần hỗ trợ thêm, hãy liên hệ hotline 0385 10 10 18 nhé!");
            break;
        }

        print!("Trợ lý: ");
        answer(pipeline, question, stream).await?;
        println!();
    }

    Ok(())
}
