use std::path::PathBuf;

use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};

use routegate::routex;

#[derive(Parser)]
#[command(name = "routegate-cli")]
#[command(about = "Management CLI for the routegate gateway", long_about = None)]
struct Cli {
    /// Admin API base URL (for the remote commands).
    #[arg(short, long, default_value = "http://localhost:8081")]
    url: String,

    /// Admin API key (Bearer token).
    #[arg(short, long, default_value = "admin-secret-key")]
    key: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a route file and report the first error, if any
    Check { file: PathBuf },
    /// Parse a route file and print it in canonical form
    Fmt {
        file: PathBuf,
        /// One filter per line, indented
        #[arg(long)]
        pretty: bool,
    },
    /// Fetch the live route table from the admin API
    Routes {
        #[arg(long)]
        pretty: bool,
    },
    /// Push a route file to the admin API, replacing the live table
    Push { file: PathBuf },
    /// Check gateway system status
    Status,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Check { file } => {
            let text = std::fs::read_to_string(&file)?;
            match routex::parse(&text) {
                Ok(routes) => println!("{}: {} route(s) OK", file.display(), routes.len()),
                Err(e) => {
                    eprintln!("{}: {}", file.display(), e);
                    std::process::exit(1);
                }
            }
        }
        Commands::Fmt { file, pretty } => {
            let text = std::fs::read_to_string(&file)?;
            let routes = routex::parse(&text).map_err(|e| format!("{}: {}", file.display(), e))?;
            println!("{}", routex::print_routes(&routes, pretty));
        }
        Commands::Routes { pretty } => {
            let url = if pretty {
                format!("{}/admin/routes?pretty=true", cli.url)
            } else {
                format!("{}/admin/routes", cli.url)
            };
            let res = client()?
                .get(url)
                .headers(auth_headers(&cli.key)?)
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Push { file } => {
            let text = std::fs::read_to_string(&file)?;
            // Validate locally first for a positional error message.
            routex::parse(&text).map_err(|e| format!("{}: {}", file.display(), e))?;
            let res = client()?
                .put(format!("{}/admin/routes", cli.url))
                .headers(auth_headers(&cli.key)?)
                .body(text)
                .send()
                .await?;
            if res.status().is_success() {
                println!("routes pushed");
            } else {
                eprintln!("Error: Admin API returned status {}", res.status());
                std::process::exit(1);
            }
        }
        Commands::Status => {
            let res = client()?
                .get(format!("{}/admin/status", cli.url))
                .headers(auth_headers(&cli.key)?)
                .send()
                .await?;
            print_response(res).await?;
        }
    }

    Ok(())
}

fn client() -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder().build()
}

fn auth_headers(key: &str) -> Result<HeaderMap, Box<dyn std::error::Error>> {
    let mut headers = HeaderMap::new();
    headers.insert(AUTHORIZATION, HeaderValue::from_str(&format!("Bearer {key}"))?);
    Ok(headers)
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: Admin API returned status {status}");
        if let Ok(text) = res.text().await {
            eprintln!("Response: {text}");
        }
        std::process::exit(1);
    }

    println!("{}", res.text().await?);
    Ok(())
}
