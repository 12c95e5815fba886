use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use secrecy::SecretString;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::{
    self,
    error::{RecvError, TryRecvError},
};
use tracing_subscriber::EnvFilter;

use whoiswho::config::file::config_file_path;
use whoiswho::dialogue::query_with_retry;
use whoiswho::text;
use whoiswho::voice::{AlwaysOnline, Connectivity, HostCheck};
use whoiswho::{
    Config, ConsoleVoice, Controller, ControllerEvent, ControllerHandle, ControllerSettings,
    ConversationState, Dialogue, PandoraClient, PromptPurpose,
};

/// Who is who - think of a character, the bot asks and guesses
#[derive(Parser)]
#[command(name = "whoiswho", version, about)]
struct Cli {
    /// Config file (defaults to the platform config directory)
    #[arg(short, long, env = "WHOISWHO_CONFIG")]
    config: Option<PathBuf>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Dialogue service host
    #[arg(long, env = "WHOISWHO_HOST")]
    host: Option<String>,

    /// Application id issued by the dialogue service
    #[arg(long, env = "WHOISWHO_APP_ID")]
    app_id: Option<String>,

    /// User key issued by the dialogue service
    #[arg(long, env = "WHOISWHO_USER_KEY", hide_env_values = true)]
    user_key: Option<String>,

    /// Bot name within the application
    #[arg(long, env = "WHOISWHO_BOT_NAME")]
    bot_name: Option<String>,

    /// Start turns without checking that the host is reachable
    #[arg(long)]
    skip_connectivity_check: bool,

    /// Print the conversation transcript when the session ends
    #[arg(long)]
    history: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Play an interactive session in the terminal (default)
    Play,
    /// Send one question and print the bot's reply
    Ask {
        /// Question to ask
        text: String,
    },
    /// Print where the config file is read from
    ConfigPath,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 => "info,whoiswho=info",
        1 => "info,whoiswho=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = Config::load(cli.config.as_deref())?;

    if let Some(host) = cli.host {
        config.dialogue.host = host;
    }
    if let Some(app_id) = cli.app_id {
        config.dialogue.app_id = app_id;
    }
    if let Some(user_key) = cli.user_key {
        config.dialogue.user_key = SecretString::from(user_key);
    }
    if let Some(bot_name) = cli.bot_name {
        config.dialogue.bot_name = bot_name;
    }

    match cli.command.unwrap_or(Command::Play) {
        Command::Play => play(&config, cli.skip_connectivity_check, cli.history).await,
        Command::Ask { text } => ask(&config, &text).await,
        Command::ConfigPath => {
            match config_file_path() {
                Some(path) => println!("{}", path.display()),
                None => println!("no config directory available on this platform"),
            }
            Ok(())
        }
    }
}

/// Interactive session: typed lines stand in for speech
async fn play(config: &Config, skip_connectivity_check: bool, history: bool) -> anyhow::Result<()> {
    config.validate()?;

    let dialogue: Arc<dyn Dialogue> = Arc::new(PandoraClient::new(&config.dialogue)?);
    let connectivity: Box<dyn Connectivity> = if skip_connectivity_check {
        Box::new(AlwaysOnline)
    } else {
        Box::new(HostCheck::for_dialogue(&config.dialogue))
    };

    tracing::info!(
        host = %config.dialogue.host,
        bot = %config.dialogue.bot_name,
        locale = %config.voice.locale,
        "starting session"
    );

    let (handle, inbox) = ControllerHandle::channel();
    let voice = Arc::new(ConsoleVoice::new(handle.voice_sink()));
    let controller = Controller::new(
        ControllerSettings::from_config(config),
        Box::new(Arc::clone(&voice)),
        dialogue,
        connectivity,
        &handle,
    );

    let printer = tokio::spawn(print_events(handle.subscribe()));
    let mut turns = handle.subscribe();
    let session = tokio::spawn(controller.run(inbox));

    match &config.voice.greeting {
        Some(greeting) => handle.announce(greeting.clone(), PromptPurpose::QueryPrompt)?,
        None => handle.start_turn()?,
    }

    println!("Escribe tu pregunta y pulsa Intro. /historial muestra la conversación, /salir termina.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match line.trim() {
            "/salir" | "/quit" => break,
            "/historial" | "/history" => {
                for entry in handle.transcript().await? {
                    println!("{entry}");
                }
            }
            typed => {
                skip_pending(&mut turns);
                if !voice.submit(typed) {
                    handle.start_turn()?;
                }
                wait_for_turn_end(&mut turns).await;
            }
        }
    }

    handle.shutdown()?;
    let transcript = session.await?;
    printer.abort();

    if history {
        println!("--- Historial ---");
        for line in transcript.lines() {
            println!("{line}");
        }
    }

    Ok(())
}

/// One-shot question, printing the reply or the player-facing error
async fn ask(config: &Config, question: &str) -> anyhow::Result<()> {
    config.validate()?;

    let client = PandoraClient::new(&config.dialogue)?;
    let upstream = text::normalize(&text::capitalize_first(question.trim()));

    match query_with_retry(
        &client,
        &upstream,
        &config.dialogue.retry,
        config.dialogue.timeout,
    )
    .await
    {
        Ok(reply) => {
            println!("{}", text::strip_markup(&reply).trim());
            Ok(())
        }
        Err(e) => {
            println!("{}", e.user_message());
            Err(e.into())
        }
    }
}

/// Render controller notifications on the terminal
async fn print_events(mut events: broadcast::Receiver<ControllerEvent>) {
    loop {
        match events.recv().await {
            Ok(ControllerEvent::Heard(heard)) => println!("He entendido: {heard}"),
            Ok(ControllerEvent::RecognitionFailed { message, .. }) => println!("[{message}]"),
            Ok(ControllerEvent::Offline) => println!("[Sin conexión a internet]"),
            Ok(ControllerEvent::SpeechUnavailable(line)) => println!("Bot (sin voz): {line}"),
            Ok(ControllerEvent::ListeningStarted) => println!("(escuchando)"),
            Ok(_) => {}
            Err(RecvError::Lagged(skipped)) => {
                tracing::debug!(skipped, "event printer lagged");
            }
            Err(RecvError::Closed) => break,
        }
    }
}

/// Drop notifications from before the current line
fn skip_pending(events: &mut broadcast::Receiver<ControllerEvent>) {
    loop {
        match events.try_recv() {
            Ok(_) | Err(TryRecvError::Lagged(_)) => {}
            Err(TryRecvError::Empty | TryRecvError::Closed) => break,
        }
    }
}

/// Block until the controller settles after a typed line
///
/// A turn ends back in idle (a spoken question re-arms listening from
/// there), or never starts when offline.
async fn wait_for_turn_end(events: &mut broadcast::Receiver<ControllerEvent>) {
    loop {
        match events.recv().await {
            Ok(
                ControllerEvent::Offline
                | ControllerEvent::StateChanged {
                    to: ConversationState::Idle,
                    ..
                },
            )
            | Err(RecvError::Closed) => break,
            Ok(_) | Err(RecvError::Lagged(_)) => {}
        }
    }
}
