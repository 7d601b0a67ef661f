use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "replay-cli")]
#[command(about = "Management CLI for the HAR replay server", long_about = None)]
struct Cli {
    /// Replay server base URL.
    #[arg(short, long, default_value = "http://localhost:8000")]
    url: String,

    /// Admin API base URL.
    #[arg(short, long, default_value = "http://localhost:8001")]
    admin_url: String,

    /// Admin API key.
    #[arg(short, long, default_value = "")]
    key: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load an archive from the server's archive directory
    Load {
        /// Archive file name, e.g. `shop.har`
        filename: String,
    },
    /// Check server status
    Status,
    /// Describe the active archive
    Archive,
    /// Re-read the active archive from disk
    Reload,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    let mut headers = HeaderMap::new();
    headers.insert(
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {}", cli.key))?,
    );

    match cli.command {
        Commands::Load { filename } => {
            let res = client
                .post(format!("{}/loadHAR", cli.url))
                .json(&json!({ "filename": filename }))
                .send()
                .await?;
            let status = res.status();
            let text = res.text().await?;
            if status.is_success() {
                println!("{}", text);
            } else {
                eprintln!("Error: load returned status {}", status);
                eprintln!("Response: {}", text);
            }
        }
        Commands::Status => {
            let res = client
                .get(format!("{}/admin/status", cli.admin_url))
                .headers(headers)
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Archive => {
            let res = client
                .get(format!("{}/admin/archive", cli.admin_url))
                .headers(headers)
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Reload => {
            let res = client
                .post(format!("{}/admin/reload", cli.admin_url))
                .headers(headers)
                .send()
                .await?;
            print_response(res).await?;
        }
    }

    Ok(())
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: Admin API returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
