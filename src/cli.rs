use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{ArgAction, Args, CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use colored::Colorize;
use tokio::net::TcpListener;

use crate::browser::BrowserOpener;
use crate::command::dispatch;
use crate::config::ScribbleConfig;
use crate::server;
use crate::store::NoteStore;

#[derive(Debug, Parser)]
#[command(
    name = "scribble",
    version,
    about = "Jot down short notes from the terminal or the browser."
)]
pub struct Cli {
    #[arg(
        long = "file",
        global = true,
        value_name = "PATH",
        help = "Notes JSON file (defaults to the platform data dir)"
    )]
    file: Option<PathBuf>,

    #[arg(
        long = "config",
        global = true,
        value_name = "PATH",
        help = "Config file (defaults to the platform config dir)"
    )]
    config: Option<PathBuf>,

    #[arg(long, global = true, action = ArgAction::SetTrue, help = "Suppress decorative output")]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Add a new note.
    Add(NoteArgs),

    /// List all note titles.
    List,

    /// Print a note.
    Read(TitleArgs),

    /// Remove a note.
    Remove(TitleArgs),

    /// Remove every note.
    RemoveAll,

    /// Replace the body of a note.
    Edit(NoteArgs),

    /// Run a command line the same way the browser UI does.
    Run(RunCommand),

    /// Serve the JSON API and the browser UI.
    Serve(ServeCommand),

    /// Print shell completions.
    Completions(CompletionsCommand),
}

#[derive(Debug, Args)]
pub struct NoteArgs {
    #[arg(long, value_name = "TEXT", help = "Note title")]
    title: String,

    #[arg(long, value_name = "TEXT", help = "Note body")]
    body: String,
}

#[derive(Debug, Args)]
pub struct TitleArgs {
    #[arg(long, value_name = "TEXT", help = "Note title")]
    title: String,
}

#[derive(Debug, Args)]
pub struct RunCommand {
    #[arg(
        value_name = "COMMAND",
        help = "e.g. add --title=\"ideas\" --body=\"write it down\"",
        trailing_var_arg = true,
        allow_hyphen_values = true
    )]
    words: Vec<String>,
}

#[derive(Debug, Args)]
pub struct ServeCommand {
    #[arg(
        long,
        value_name = "HOST:PORT",
        help = "Bind address (defaults to $PORT or the config)"
    )]
    addr: Option<String>,

    #[arg(long, help = "Open the UI in a browser once listening")]
    open: bool,
}

#[derive(Debug, Args)]
pub struct CompletionsCommand {
    #[arg(value_enum, value_name = "SHELL")]
    shell: Shell,
}

pub async fn run() -> Result<()> {
    let cli = Cli::parse();
    match &cli.command {
        Commands::Add(cmd) => handle_add(&cli, cmd)?,
        Commands::List => handle_list(&cli)?,
        Commands::Read(cmd) => handle_read(&cli, cmd)?,
        Commands::Remove(cmd) => handle_remove(&cli, cmd)?,
        Commands::RemoveAll => handle_remove_all(&cli)?,
        Commands::Edit(cmd) => handle_edit(&cli, cmd)?,
        Commands::Run(cmd) => handle_run(&cli, cmd)?,
        Commands::Serve(cmd) => handle_serve(&cli, cmd).await?,
        Commands::Completions(cmd) => handle_completions(cmd),
    }
    Ok(())
}

fn load_config(cli: &Cli) -> Result<ScribbleConfig> {
    ScribbleConfig::discover(cli.config.as_deref())
}

fn open_store(cli: &Cli) -> Result<NoteStore> {
    let config = load_config(cli)?;
    Ok(NoteStore::new(config.notes_path(cli.file.as_deref())))
}

fn report(ok: bool, success: &str, failure: &str) {
    if ok {
        println!("{}", success.green());
    } else {
        println!("{}", failure.red());
    }
}

fn handle_add(cli: &Cli, cmd: &NoteArgs) -> Result<()> {
    let store = open_store(cli)?;
    let added = store.add(&cmd.title, &cmd.body)?;
    report(added, "Note added!", "Note title taken!");
    Ok(())
}

fn handle_list(cli: &Cli) -> Result<()> {
    let store = open_store(cli)?;
    let notes = store.get_all()?;
    if notes.is_empty() {
        println!("{}", "no notes found.".yellow());
        return Ok(());
    }
    println!("{}", "your notes:".blue());
    for note in notes {
        println!("- {}", note.title);
    }
    Ok(())
}

fn handle_read(cli: &Cli, cmd: &TitleArgs) -> Result<()> {
    let store = open_store(cli)?;
    match store.read(&cmd.title)? {
        Some(note) => {
            println!("{}", note.title.bold());
            println!("{}", note.body);
        }
        None => println!("{}", "Note not found!".red()),
    }
    Ok(())
}

fn handle_remove(cli: &Cli, cmd: &TitleArgs) -> Result<()> {
    let store = open_store(cli)?;
    let removed = store.remove(&cmd.title)?;
    report(removed, "Note removed!", "Note not found!");
    Ok(())
}

fn handle_remove_all(cli: &Cli) -> Result<()> {
    let store = open_store(cli)?;
    store.remove_all()?;
    println!("{}", "All notes removed!".green());
    Ok(())
}

fn handle_edit(cli: &Cli, cmd: &NoteArgs) -> Result<()> {
    let store = open_store(cli)?;
    let edited = store.edit(&cmd.title, &cmd.body)?;
    report(edited, "Note updated!", "Note not found!");
    Ok(())
}

fn handle_run(cli: &Cli, cmd: &RunCommand) -> Result<()> {
    let store = open_store(cli)?;
    let line = rejoin_words(&cmd.words);
    let response = dispatch(&store, &line)?;
    if response.applied {
        println!("{}", response.message.green());
    } else {
        println!("{}", response.message.red());
    }
    if response.note.is_none() {
        if let Some(notes) = &response.notes {
            for note in notes {
                println!("- {}", note.title);
            }
        }
    }
    Ok(())
}

/// Put back the quotes the shell stripped from `--flag="two words"`.
fn rejoin_words(words: &[String]) -> String {
    words
        .iter()
        .map(|word| {
            let needs_quotes = word.chars().any(char::is_whitespace) && !word.contains('"');
            match word.split_once('=') {
                Some((flag, value)) if needs_quotes && flag.starts_with("--") => {
                    format!("{flag}=\"{value}\"")
                }
                _ => word.clone(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

async fn handle_serve(cli: &Cli, cmd: &ServeCommand) -> Result<()> {
    let config = load_config(cli)?;
    let store = NoteStore::new(config.notes_path(cli.file.as_deref()));
    let addr = config.server_addr(cmd.addr.as_deref());
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    let url = format!("http://{}", listener.local_addr()?);

    if !cli.quiet {
        println!("{} Serving notes at {}", "›".bright_blue(), url);
        println!("{}  Notes file: {}", "›".dimmed(), store.path().display());
    }
    if cmd.open {
        if let Err(err) = BrowserOpener::open_url(&url) {
            println!("{} {}", "warning:".yellow(), err);
        }
    }

    server::serve(listener, store).await
}

fn handle_completions(cmd: &CompletionsCommand) {
    let mut command = Cli::command();
    clap_complete::generate(cmd.shell, &mut command, "scribble", &mut io::stdout());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejoin_requotes_spaced_values() {
        let words = vec![
            "add".to_string(),
            "--title=ideas".to_string(),
            "--body=build a node app".to_string(),
        ];
        assert_eq!(
            rejoin_words(&words),
            r#"add --title=ideas --body="build a node app""#
        );
    }

    #[test]
    fn test_rejoin_keeps_single_line_intact() {
        let words = vec![r#"add --title="a b" --body="c""#.to_string()];
        assert_eq!(rejoin_words(&words), words[0]);
    }

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }
}
