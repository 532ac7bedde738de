mod config;
mod error;
mod core {
    pub mod models;
    pub mod trace;
}
mod ai {
    pub mod agents;
    pub mod client;
    pub mod prompts;
    pub mod schema_utils;
}
mod frontend {
    pub mod console;
    pub mod report;
    pub mod session;
}
mod orchestrator;

use clap::{Parser, Subcommand};
use config::Settings;
use crate::core::models::{AnalysisData, DEFAULT_USER_PROMPT, PromptPair};
use crate::core::trace::Stage;
use dotenv::dotenv;
use error::PrompterError;
use frontend::console::{Console, interruptible};
use frontend::report;
use frontend::session::{MAX_RATING, MIN_RATING, Screen, Session};
use orchestrator::Orchestrator;
use std::process::ExitCode;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "prompter")]
#[command(about = "Analyze a prompt, optimize it, and score both outputs with an LLM", long_about = None)]
struct Cli {
    /// Model used for every stage
    #[arg(long, global = true)]
    model: Option<String>,

    /// Base URL of an OpenAI-compatible API
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Request timeout in seconds
    #[arg(long, global = true)]
    timeout_secs: Option<u64>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the pipeline once and print the report
    Run {
        /// System prompt to analyze and optimize
        #[arg(short, long)]
        system: Option<String>,

        /// User prompt (defaults to the eggs poem)
        #[arg(short, long)]
        user: Option<String>,

        /// Print the result as JSON instead of a report
        #[arg(long)]
        json: bool,
    },

    /// Blind evaluation game: rate both responses before seeing the verdict
    Play,
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenv().ok();
    env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    let cli = Cli::parse();

    match app(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(PrompterError::Interrupted) => {
            println!("\nProgram interrupted by user. Exiting gracefully...");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("\n❌ An error occurred: {e}");
            if e.is_transport() {
                eprintln!("   Check OPENAI_API_KEY, OPENAI_BASE_URL and your network connection.");
            }
            ExitCode::FAILURE
        }
    }
}

async fn app(cli: Cli) -> Result<(), PrompterError> {
    let settings = Settings::from_env()?.with_overrides(cli.model, cli.base_url, cli.timeout_secs);
    let client = ai::client::OpenAiClient::new(&settings)?;
    let orchestrator = Orchestrator::new(Arc::new(client), settings.model.clone());

    // Logged rather than printed so `run --json` stdout stays parseable.
    log::info!("🤖 PROMPTER ({})", settings.model);

    match cli.command {
        Some(Commands::Run { system, user, json }) => {
            let pair = PromptPair::new(system, user.unwrap_or_else(|| DEFAULT_USER_PROMPT.to_string()));
            let data = interruptible(orchestrator.generate_responses(&pair)).await?;
            let link = trace_link(&orchestrator, &settings);
            println!("{}", report::run_output(&data, json, link.as_deref())?);
            Ok(())
        }
        Some(Commands::Play) => play(&orchestrator, &settings).await,
        None => {
            let mut console = Console::stdin();
            let system = console.ask("Enter a system prompt (optional):").await?;
            let user = console
                .ask("Enter a user prompt:")
                .await?
                .unwrap_or_else(|| DEFAULT_USER_PROMPT.to_string());

            let pair = PromptPair::new(system, user);
            let data = interruptible(orchestrator.generate_responses(&pair)).await?;
            print_report(&orchestrator, &settings, &data);
            Ok(())
        }
    }
}

async fn play(orchestrator: &Orchestrator, settings: &Settings) -> Result<(), PrompterError> {
    let mut session = Session::new();
    let mut console = Console::stdin();

    println!("\n🥚 Is Prompt Engineering Dead?\n");

    loop {
        match session.screen() {
            Screen::Input => {
                let last = session.last_input().clone();
                let system = console
                    .ask(&system_prompt_question(last.system_prompt()))
                    .await?;
                let system = match system.as_deref() {
                    Some("-") => None,
                    Some(s) => Some(s.to_string()),
                    None => last.system_prompt().map(str::to_string),
                };
                let user = console
                    .ask("User prompt (blank keeps the previous one):")
                    .await?
                    .unwrap_or_else(|| last.user_prompt().to_string());
                let pair = PromptPair::new(system, user);

                println!("\n🪄 Working our magic...");
                match interruptible(orchestrator.generate_responses(&pair)).await {
                    Ok(data) => session.submit(pair, data)?,
                    Err(PrompterError::Interrupted) => return Err(PrompterError::Interrupted),
                    Err(e) => println!("\n❌ An error occurred: {e}\nTry again.\n"),
                }
            }
            Screen::Evaluate => {
                let (a, b) = session.blind_responses()?;
                println!("\nResponse A:\n{a}\n\nResponse B:\n{b}\n");

                let a = console.ask_number("Rate response A:", MIN_RATING, MAX_RATING).await?;
                let b = console.ask_number("Rate response B:", MIN_RATING, MAX_RATING).await?;
                let evaluation = session.rate(a, b)?;
                log::info!("user preferred: {:?}", evaluation.preferred);
                session.show_analysis()?;
            }
            Screen::Analysis => {
                if let Some(data) = session.analysis() {
                    print_report(orchestrator, settings, data);
                }
                let tally = session.tally();
                println!(
                    "Your picks so far: original {}, optimized {}, tie {}",
                    tally.original, tally.optimized, tally.tie
                );
                println!("\nThink you can write a better prompt?");
                if !console.confirm("Try again?").await? {
                    return Ok(());
                }
                session.try_again()?;
            }
        }
    }
}

fn system_prompt_question(previous: Option<&str>) -> String {
    match previous {
        Some(prompt) => format!("System prompt (blank keeps \"{prompt}\", '-' for none):"),
        None => "System prompt (optional):".to_string(),
    }
}

fn trace_link(orchestrator: &Orchestrator, settings: &Settings) -> Option<String> {
    log::debug!("{} traced calls so far", orchestrator.tracer().calls().len());
    settings
        .trace_url
        .as_deref()
        .and_then(|base| orchestrator.tracer().trace_link(base, Stage::Orchestrate))
}

fn print_report(orchestrator: &Orchestrator, settings: &Settings, data: &AnalysisData) {
    let link = trace_link(orchestrator, settings);
    println!("\n{}", report::render(data, link.as_deref()));
}
