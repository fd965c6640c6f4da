//! `claimconduit chat` — Interactive or single-message chat mode.

use std::io::Write;
use std::path::PathBuf;

use clap::Args;
use claimconduit_config::AppConfig;
use claimconduit_core::{
    ClaimChat, ClaimField, Exchange, MetadataPolicy, OperatingMode, QuickStart, Role,
};

use super::ClaimArgs;
use crate::input;

#[derive(Args, Debug)]
pub struct ChatArgs {
    #[command(flatten)]
    pub claim: ClaimArgs,

    /// Send a single message instead of entering interactive mode
    #[arg(short, long)]
    pub message: Option<String>,

    /// Attach files to the first message
    #[arg(short, long = "attach", value_name = "FILE")]
    pub attach: Vec<PathBuf>,

    /// Re-open the session whenever claim details change
    #[arg(long)]
    pub refresh: bool,
}

pub async fn run(args: ChatArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    // Check for API key early — give a clear error
    if !config.has_api_key() {
        eprintln!();
        eprintln!("  ERROR: No API key configured!");
        eprintln!();
        eprintln!("  Set one of these environment variables:");
        eprintln!("    CLAIMCONDUIT_API_KEY=...");
        if let Some(var) = claimconduit_config::provider_key_var(&config.provider) {
            eprintln!("    {var}=...");
        }
        eprintln!("    API_KEY=...");
        eprintln!();
        eprintln!("  Or add it to your config file:");
        eprintln!("    {}", AppConfig::config_dir().join("config.toml").display());
        eprintln!();
        return Err("No API key found. See above for setup instructions.".into());
    }

    let policy = if args.refresh {
        MetadataPolicy::Refresh
    } else {
        config.metadata_policy
    };
    let mut chat = super::build_chat(&config, &args.claim, policy)?;

    if !args.attach.is_empty() {
        let count = chat.attach_paths(&args.attach).await?;
        eprintln!("  Attached {count} file(s)");
    }

    if let Some(msg) = args.message {
        // Single message mode
        let exchange = chat
            .send_pending(&msg)
            .await
            .ok_or("Nothing to send: message is empty and no files are attached")?;
        println!("{}", exchange.reply);
        if let Some(e) = exchange.failure {
            return Err(format!("{}: {e}", e.stage()).into());
        }
        return Ok(());
    }

    interactive(&config, &mut chat).await
}

async fn interactive(
    config: &AppConfig,
    chat: &mut ClaimChat,
) -> Result<(), Box<dyn std::error::Error>> {
    println!();
    println!("  ╔══════════════════════════════════════════════╗");
    println!("  ║      ClaimConduit — Claims Assistant         ║");
    println!("  ╚══════════════════════════════════════════════╝");
    println!();
    println!("  Provider:  {}", config.provider);
    println!("  Model:     {}", config.provider_model(&config.provider));
    println!("  Mode:      {}", chat.mode());
    println!("  Policy:    {:?}", chat.policy());
    println!();
    println!("  Type a message, or /help for commands.");
    println!("  Type 'exit' or Ctrl+C to quit.");
    println!();
    print_quick_starts();

    spawn_busy_indicator(chat);

    let mut rx = input::spawn_stdin_reader();
    let tty = input::stdin_is_terminal();
    prompt()?;

    while let Some(result) = rx.recv().await {
        let line = match result {
            Ok(line) => line,
            Err(e) => {
                eprintln!("  [Input Error] {e}");
                break;
            }
        };

        let remote = match parse_command(&line) {
            Ok(command) => {
                let remote = command.is_remote();
                execute(chat, command).await;
                remote
            }
            Err(usage) => {
                eprintln!("  {usage}");
                false
            }
        };

        if drops_typed_ahead(remote, tty) {
            let mut skipped = 0;
            while rx.try_recv().is_ok() {
                skipped += 1;
            }
            if skipped > 0 {
                eprintln!("  (ignored {skipped} line(s) typed while waiting)");
            }
        }

        prompt()?;
    }

    println!();
    println!("  Goodbye!");
    println!();
    Ok(())
}

fn prompt() -> std::io::Result<()> {
    print!("  You > ");
    std::io::stdout().flush()
}

/// Show a waiting marker while a call is outstanding.
fn spawn_busy_indicator(chat: &ClaimChat) {
    let mut busy = chat.busy();
    tokio::spawn(async move {
        while busy.changed().await.is_ok() {
            if *busy.borrow_and_update() {
                eprint!("  ...");
            } else {
                eprint!("\r     \r");
            }
        }
    });
}

/// One line of interactive input.
#[derive(Debug, PartialEq)]
enum Command {
    Say(String),
    Mode(OperatingMode),
    Set(ClaimField, String),
    Clear(ClaimField),
    Claim,
    Attach(Vec<PathBuf>),
    Detach(usize),
    Files,
    Quick(Option<usize>),
    Reinit,
    History,
    Help,
}

impl Command {
    /// Whether the command waits on the provider.
    fn is_remote(&self) -> bool {
        matches!(self, Self::Say(_) | Self::Quick(Some(_)) | Self::Reinit)
    }
}

/// Lines typed at a terminal while a call was outstanding are dropped;
/// piped input is a script and runs in full.
fn drops_typed_ahead(remote: bool, tty: bool) -> bool {
    remote && tty
}

fn parse_command(line: &str) -> Result<Command, String> {
    let line = line.trim();
    let Some(rest) = line.strip_prefix('/') else {
        return Ok(Command::Say(line.to_string()));
    };

    let (name, arg) = match rest.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (rest, ""),
    };

    match name {
        "mode" => arg
            .parse::<OperatingMode>()
            .map(Command::Mode)
            .map_err(|e| format!("{e}. Usage: /mode carrier|homeowner|document")),
        "set" => {
            let (field, value) = arg
                .split_once(char::is_whitespace)
                .ok_or("Usage: /set <field> <value>")?;
            let field: ClaimField = field.parse().map_err(|e| format!("{e}"))?;
            Ok(Command::Set(field, value.trim().to_string()))
        }
        "clear" => arg
            .parse::<ClaimField>()
            .map(Command::Clear)
            .map_err(|e| format!("{e}. Usage: /clear <field>")),
        "claim" => Ok(Command::Claim),
        "attach" => match split_paths(arg)? {
            paths if paths.is_empty() => Err("Usage: /attach <file> [file...]".into()),
            paths => Ok(Command::Attach(paths)),
        },
        "detach" => arg
            .parse::<usize>()
            .ok()
            .filter(|n| *n > 0)
            .map(|n| Command::Detach(n - 1))
            .ok_or_else(|| "Usage: /detach <number> (see /files)".into()),
        "files" => Ok(Command::Files),
        "quick" if arg.is_empty() => Ok(Command::Quick(None)),
        "quick" => arg
            .parse::<usize>()
            .ok()
            .filter(|n| (1..=QuickStart::ALL.len()).contains(n))
            .map(|n| Command::Quick(Some(n - 1)))
            .ok_or_else(|| format!("Usage: /quick <1-{}>", QuickStart::ALL.len())),
        "reinit" => Ok(Command::Reinit),
        "history" => Ok(Command::History),
        "help" => Ok(Command::Help),
        other => Err(format!("Unknown command: /{other} (try /help)")),
    }
}

/// Split on whitespace; single or double quotes keep spaces inside a path.
fn split_paths(arg: &str) -> Result<Vec<PathBuf>, String> {
    let mut paths = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;
    let mut in_word = false;

    for c in arg.chars() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), c) => current.push(c),
            (None, '"' | '\'') => {
                quote = Some(c);
                in_word = true;
            }
            (None, c) if c.is_whitespace() => {
                if in_word {
                    paths.push(PathBuf::from(std::mem::take(&mut current)));
                    in_word = false;
                }
            }
            (None, c) => {
                current.push(c);
                in_word = true;
            }
        }
    }

    if quote.is_some() {
        return Err("Unclosed quote in /attach".into());
    }
    if in_word {
        paths.push(PathBuf::from(current));
    }
    Ok(paths)
}

async fn execute(chat: &mut ClaimChat, command: Command) {
    match command {
        Command::Say(text) => {
            if let Some(exchange) = chat.send_pending(&text).await {
                print_reply(&exchange);
            }
        }
        Command::Mode(mode) => {
            chat.on_mode_change(mode);
            println!("  Mode: {mode}");
        }
        Command::Set(field, value) => {
            match chat.update_metadata(|m| m.set_field(field, &value)) {
                Ok(()) => println!("  {} = {}", field.name(), chat.metadata().field(field)),
                Err(e) => eprintln!("  {e}"),
            }
        }
        Command::Clear(field) => {
            chat.update_metadata(|m| m.clear_field(field));
            println!("  {} cleared", field.name());
        }
        Command::Claim => {
            println!("  Mode: {}", chat.mode());
            for field in ClaimField::ALL {
                let value = chat.metadata().field(field);
                println!(
                    "  {:<9} {}",
                    field.name(),
                    if value.is_empty() { "-" } else { value }
                );
            }
        }
        Command::Attach(paths) => match chat.attach_paths(&paths).await {
            Ok(count) => println!("  Attached {count} file(s)"),
            Err(e) => eprintln!("  {e}"),
        },
        Command::Detach(index) => match chat.detach(index) {
            Some(file) => println!("  Removed {}", file.name),
            None => eprintln!("  No file #{}", index + 1),
        },
        Command::Files => {
            if chat.pending().is_empty() {
                println!("  No files attached");
            }
            for (i, file) in chat.pending().iter().enumerate() {
                println!("  {}. {} ({} bytes)", i + 1, file.name, file.size_bytes());
            }
        }
        Command::Quick(None) => print_quick_starts(),
        Command::Quick(Some(index)) => {
            if let Some(exchange) = chat.quick_start(QuickStart::ALL[index]).await {
                print_reply(&exchange);
            }
        }
        Command::Reinit => match chat.reinitialize().await {
            Ok(()) => println!("  Session restarted with current claim details"),
            Err(e) => eprintln!("  [{}] {e}", e.stage()),
        },
        Command::History => {
            for message in chat.history().messages() {
                let who = match message.role {
                    Role::User => "You",
                    Role::Model => "Assistant",
                };
                println!("  [{}] {who}: {}", message.timestamp.format("%H:%M"), message.text);
                for name in &message.attachments {
                    println!("           📎 {name}");
                }
            }
        }
        Command::Help => print_help(),
    }
}

fn print_reply(exchange: &Exchange) {
    println!();
    for line in exchange.reply.lines() {
        println!("  Assistant > {line}");
    }
    if let Some(e) = &exchange.failure {
        eprintln!("  [{}] {e}", e.stage());
    }
    println!();
}

fn print_quick_starts() {
    println!("  Quick starts (/quick <n>):");
    for (i, starter) in QuickStart::ALL.iter().enumerate() {
        println!("    {}. {} — {}", i + 1, starter.title(), starter.description());
    }
    println!();
}

fn print_help() {
    println!("  /mode <carrier|homeowner|document>  Switch operating mode");
    println!("  /set <field> <value>                Set a claim field");
    println!("  /clear <field>                      Clear a claim field");
    println!("  /claim                              Show mode and claim details");
    println!("  /attach <file>...                   Attach files (quote paths with spaces)");
    println!("  /detach <n>                         Remove an attached file");
    println!("  /files                              List attached files");
    println!("  /quick [n]                          List or send a quick start");
    println!("  /reinit                             Restart the session with current details");
    println!("  /history                            Show the conversation");
    println!("  exit                                Quit");
    println!();
    let fields: Vec<&str> = ClaimField::ALL.iter().map(|f| f.name()).collect();
    println!("  Fields: {}", fields.join(", "));
}
