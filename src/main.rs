use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;

use v2v::api::{ApiClient, DEFAULT_BASE_URL, FeedbackRequest, GalleryQuery, GenerateRequest};
use v2v::commands;
use v2v::http::ApiError;
use v2v::session::{FileSessionStore, SessionStore};

/// v2v - Voice2Vision client
///
/// Turn speech or text into AI-generated images through the Voice2Vision
/// backend. Log in once with `v2v login`; the session token is stored locally
/// and attached to authenticated requests until you log out.
#[derive(Parser, Debug)]
#[command(author, version = env!("V2V_VERSION"), about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Backend API base URL (also via V2V_API_URL)
    #[arg(
        long = "api-url",
        env = "V2V_API_URL",
        value_name = "URL",
        default_value = DEFAULT_BASE_URL,
        global = true
    )]
    api_url: String,

    /// Session token file (defaults to the user config directory)
    #[arg(
        long = "session-file",
        env = "V2V_SESSION_FILE",
        value_name = "PATH",
        global = true
    )]
    session_file: Option<PathBuf>,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Check backend health
    Health,

    /// Translate text into an English image prompt
    Text(TextArgs),

    /// Transcribe and translate a voice recording into an image prompt
    Voice(VoiceArgs),

    /// Generate an image from a prompt
    Generate(GenerateArgs),

    /// Browse your generated images
    Gallery(GalleryArgs),

    /// Send feedback about the service
    Feedback(FeedbackArgs),

    /// Show your usage statistics
    Stats,

    /// Show backend system status
    Status,

    /// Log in and store the session token
    Login(LoginArgs),

    /// Create an account
    Signup(SignupArgs),

    /// Show the currently logged-in user
    Me,

    /// Log out and clear the session token
    Logout,
}

#[derive(clap::Args, Debug)]
struct TextArgs {
    /// Text to turn into an image prompt (any language)
    #[arg(value_name = "TEXT")]
    text: String,
}

#[derive(clap::Args, Debug)]
struct VoiceArgs {
    /// Path to the audio recording to upload
    #[arg(value_name = "FILE")]
    file: PathBuf,
}

#[derive(clap::Args, Debug)]
struct GenerateArgs {
    /// Image prompt
    #[arg(value_name = "PROMPT")]
    prompt: String,

    /// Things the image should not contain
    #[arg(long = "negative-prompt", value_name = "TEXT")]
    negative_prompt: Option<String>,

    /// Art style (e.g. realistic, anime, fantasy)
    #[arg(long = "art-style", value_name = "STYLE", default_value = "realistic")]
    art_style: String,

    /// Output quality (e.g. standard, high)
    #[arg(long, value_name = "QUALITY", default_value = "standard")]
    quality: String,
}

#[derive(clap::Args, Debug)]
struct GalleryArgs {
    /// Page number
    #[arg(long)]
    page: Option<u32>,

    /// Images per page
    #[arg(long)]
    limit: Option<u32>,

    /// Filter by art style
    #[arg(long = "art-style", value_name = "STYLE")]
    art_style: Option<String>,

    /// Filter by quality
    #[arg(long, value_name = "QUALITY")]
    quality: Option<String>,

    /// Search prompts for a phrase
    #[arg(long, value_name = "PHRASE")]
    search: Option<String>,
}

#[derive(clap::Args, Debug)]
struct FeedbackArgs {
    /// Rating from 1 to 5
    #[arg(value_name = "RATING")]
    rating: u8,

    /// Feedback text
    #[arg(value_name = "MESSAGE")]
    message: String,

    /// Feedback category (e.g. quality, speed)
    #[arg(long, value_name = "CATEGORY")]
    category: Option<String>,
}

#[derive(clap::Args, Debug)]
struct LoginArgs {
    #[arg(value_name = "USERNAME")]
    username: String,

    #[arg(value_name = "PASSWORD")]
    password: String,
}

#[derive(clap::Args, Debug)]
struct SignupArgs {
    #[arg(value_name = "USERNAME")]
    username: String,

    #[arg(value_name = "PASSWORD")]
    password: String,

    /// Subscription plan
    #[arg(long, default_value = "Free")]
    plan: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    let session_path = match cli.session_file {
        Some(path) => path,
        None => FileSessionStore::default_path()?,
    };
    let session: Arc<dyn SessionStore> = Arc::new(FileSessionStore::new(session_path));
    let client = ApiClient::new(&cli.api_url, session)?;

    let result = match cli.command {
        Commands::Health => commands::system::health(&client).await,
        Commands::Text(args) => commands::prompt::text(&client, &args.text).await,
        Commands::Voice(args) => commands::prompt::voice(&client, &args.file).await,
        Commands::Generate(args) => {
            let request = GenerateRequest {
                prompt: args.prompt,
                negative_prompt: args.negative_prompt,
                art_style: args.art_style,
                quality: args.quality,
            };
            commands::generate::generate(&client, request).await
        }
        Commands::Gallery(args) => {
            let query = GalleryQuery {
                page: args.page,
                limit: args.limit,
                art_style: args.art_style,
                quality: args.quality,
                search: args.search,
            };
            commands::gallery::gallery(&client, query).await
        }
        Commands::Feedback(args) => {
            let request = FeedbackRequest {
                rating: args.rating,
                feedback: args.message,
                category: args.category,
            };
            commands::feedback::feedback(&client, request).await
        }
        Commands::Stats => commands::stats::stats(&client).await,
        Commands::Status => commands::system::status(&client).await,
        Commands::Login(args) => commands::auth::login(&client, &args.username, &args.password).await,
        Commands::Signup(args) => {
            commands::auth::signup(&client, &args.username, &args.password, &args.plan).await
        }
        Commands::Me => commands::auth::me(&client).await,
        Commands::Logout => commands::auth::logout(&client),
    };

    if let Err(err) = result {
        // API failures get the user-facing message; anything else bubbles up.
        if let Some(api_err) = err.downcast_ref::<ApiError>() {
            eprintln!("Error: {}", api_err.user_message());
            std::process::exit(1);
        }
        return Err(err);
    }
    Ok(())
}
