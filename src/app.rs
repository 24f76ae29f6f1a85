//! Command-line parsing and command routing.

use crate::commands::{self, PanelOptions};
use crate::logging;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use std::io;
use std::path::PathBuf;
use std::process;

/// Record voice messages and play them back from the terminal
#[derive(Parser, Debug)]
#[command(name = "voicenote")]
#[command(version)]
#[command(
    long_about = "Record voice messages and play them back from the terminal.\n\nDEFAULT COMMAND:\n    If no command is specified, 'panel' is used by default.\n    Panel options (--message, --output) can be used without saying 'panel'.\n\nKEYS:\n    r  record / resume      p  pause       s  stop (attach)    d  delete\n    1-9  select message     space  play    x  pause message    z  stop message\n    + / -  playback rate    v  play preview                   q  quit\n\nEXAMPLES:\n    $ voicenote\n    $ voicenote --message hello.ogg --message reply.webm\n    $ voicenote panel -o ~/voice-notes"
)]
#[command(
    after_help = "CONFIGURATION:\n    Config file:        ~/.config/voicenote/voicenote.toml\n    Logs:               ~/.local/state/voicenote/voicenote.log.*"
)]
struct Cli {
    #[command(flatten)]
    panel: PanelArgs,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(clap::Args, Debug, Default, Clone)]
struct PanelArgs {
    /// Audio message to list in the panel (repeatable)
    #[arg(short, long = "message", value_name = "SRC")]
    messages: Vec<String>,

    /// Directory attached recordings are saved to
    #[arg(short, long, value_name = "DIR")]
    output: Option<PathBuf>,
}

impl From<PanelArgs> for PanelOptions {
    fn from(args: PanelArgs) -> Self {
        PanelOptions {
            messages: args.messages,
            output: args.output,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Open the recorder/player panel (default)
    #[command(visible_alias = "p")]
    Panel {
        #[command(flatten)]
        args: PanelArgs,
    },

    /// Open configuration file in your preferred editor
    #[command(visible_alias = "c")]
    Config,

    /// List available audio input devices
    ///
    /// Shows the IDs and names accepted by `audio.device` in voicenote.toml.
    #[command(name = "list-devices")]
    ListDevices,

    /// Show the last 50 lines of the most recent log file
    Logs,

    /// Generate shell completion script
    ///
    /// Examples:
    ///   voicenote completions bash > voicenote.bash
    ///   voicenote completions zsh > _voicenote
    Completions {
        /// The shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Parses arguments and runs the selected command.
///
/// # Errors
/// - If logging initialization fails
/// - If the command fails
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Commands that print to the terminal run without logging
    match &cli.command {
        Some(Commands::Completions { shell }) => {
            generate(*shell, &mut Cli::command(), "voicenote", &mut io::stdout());
            return Ok(());
        }
        Some(Commands::ListDevices) => return exit_on_error(commands::handle_list_devices()),
        Some(Commands::Logs) => return exit_on_error(commands::handle_logs()),
        _ => {}
    }

    logging::init_logging()?;

    match cli.command {
        None => commands::handle_panel(cli.panel.into()).await?,
        Some(Commands::Panel { args }) => {
            // Explicit subcommand options win over top-level ones
            let args = if args.messages.is_empty() && args.output.is_none() {
                cli.panel
            } else {
                args
            };
            commands::handle_panel(args.into()).await?
        }
        Some(Commands::Config) => commands::handle_config()?,
        Some(Commands::Completions { .. }) | Some(Commands::ListDevices) | Some(Commands::Logs) => {
            unreachable!("These commands are handled earlier")
        }
    }

    Ok(())
}

fn exit_on_error(result: anyhow::Result<()>) -> anyhow::Result<()> {
    if let Err(e) = result {
        eprintln!("Error: {e}");
        process::exit(1);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_top_level_panel_options() {
        let cli = Cli::parse_from(["voicenote", "-m", "a.ogg", "--message", "b.webm", "-o", "/tmp/out"]);
        assert!(cli.command.is_none());
        assert_eq!(cli.panel.messages, vec!["a.ogg", "b.webm"]);
        assert_eq!(cli.panel.output, Some(PathBuf::from("/tmp/out")));
    }

    #[test]
    fn test_panel_subcommand_options() {
        let cli = Cli::parse_from(["voicenote", "panel", "--message", "a.ogg"]);
        match cli.command {
            Some(Commands::Panel { args }) => assert_eq!(args.messages, vec!["a.ogg"]),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_list_devices_subcommand() {
        let cli = Cli::parse_from(["voicenote", "list-devices"]);
        assert!(matches!(cli.command, Some(Commands::ListDevices)));
    }
}
