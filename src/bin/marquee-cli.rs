use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "marquee-cli")]
#[command(about = "Command-line client for the Marquee API", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:4000")]
    url: String,

    /// Authentication token sent as `Authorization: Bearer <token>`
    #[arg(short, long, env = "MARQUEE_TOKEN")]
    token: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check server status
    Health,
    /// Register a new user
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Activate a user with an activation token
    Activate {
        #[arg(long)]
        activation_token: String,
    },
    /// Obtain an authentication token
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// List movies
    Movies {
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        genres: Option<String>,
        #[arg(long)]
        page: Option<u64>,
        #[arg(long)]
        page_size: Option<u64>,
        #[arg(long)]
        sort: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    let mut headers = HeaderMap::new();
    if let Some(token) = &cli.token {
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", token))?,
        );
    }

    let res = match cli.command {
        Commands::Health => {
            client
                .get(format!("{}/v1/healthcheck", cli.url))
                .send()
                .await?
        }
        Commands::Register {
            name,
            email,
            password,
        } => {
            client
                .post(format!("{}/v1/users", cli.url))
                .json(&json!({"name": name, "email": email, "password": password}))
                .send()
                .await?
        }
        Commands::Activate { activation_token } => {
            client
                .put(format!("{}/v1/users/activated", cli.url))
                .json(&json!({"token": activation_token}))
                .send()
                .await?
        }
        Commands::Login { email, password } => {
            client
                .post(format!("{}/v1/tokens/authentication", cli.url))
                .json(&json!({"email": email, "password": password}))
                .send()
                .await?
        }
        Commands::Movies {
            title,
            genres,
            page,
            page_size,
            sort,
        } => {
            let mut query: Vec<(&str, String)> = Vec::new();
            if let Some(title) = title {
                query.push(("title", title));
            }
            if let Some(genres) = genres {
                query.push(("genres", genres));
            }
            if let Some(page) = page {
                query.push(("page", page.to_string()));
            }
            if let Some(page_size) = page_size {
                query.push(("page_size", page_size.to_string()));
            }
            if let Some(sort) = sort {
                query.push(("sort", sort));
            }
            client
                .get(format!("{}/v1/movies", cli.url))
                .headers(headers)
                .query(&query)
                .send()
                .await?
        }
    };

    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let text = res.text().await?;

    match serde_json::from_str::<Value>(&text) {
        Ok(json) if status.is_success() => println!("{}", serde_json::to_string_pretty(&json)?),
        Ok(json) => {
            eprintln!("Error: server returned status {}", status);
            eprintln!("{}", serde_json::to_string_pretty(&json)?);
        }
        Err(_) => {
            eprintln!("Error: server returned status {}", status);
            eprintln!("Response: {}", text);
        }
    }
    Ok(())
}
