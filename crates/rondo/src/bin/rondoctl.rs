use clap::{CommandFactory, Parser, Subcommand};
use rondo::sys::server::SOCKET_PATH;
use std::io::{BufRead, BufReader, Write};
use std::os::unix::net::UnixStream;

#[derive(Parser, Debug)]
#[command(
    name = "rondoctl",
    version,
    about = "Control a running rondo carousel",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone)]
enum Commands {
    /// Turn to the next card, or show the next card in detail view
    Next,
    /// Turn to the previous card, or show the previous card in detail view
    Prev,
    /// Open card N in detail view
    Open { index: usize },
    /// Leave detail view
    Close,
    /// Print the ring's current state
    Status,
    /// Write the default config file if none exists and print its path
    InitConfig,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Next) => send_command("next"),
        Some(Commands::Prev) => send_command("prev"),
        Some(Commands::Open { index }) => send_command(&format!("open {index}")),
        Some(Commands::Close) => send_command("close"),
        Some(Commands::Status) => {
            let mut stream = connect()?;
            writeln!(stream, "status")?;
            let mut reply = String::new();
            BufReader::new(stream).read_line(&mut reply)?;
            print!("{reply}");
            Ok(())
        }
        Some(Commands::InitConfig) => {
            let path = rondo::config::write_default_config()?;
            println!("{}", path.display());
            Ok(())
        }
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    }
}

fn connect() -> anyhow::Result<UnixStream> {
    UnixStream::connect(SOCKET_PATH).map_err(|e| {
        anyhow::anyhow!(
            "Failed to connect to rondo at {}: {}. Is rondo running?",
            SOCKET_PATH,
            e
        )
    })
}

fn send_command(cmd: &str) -> anyhow::Result<()> {
    let mut stream = connect()?;
    writeln!(stream, "{}", cmd)?;
    log::debug!("sent '{}'", cmd);
    Ok(())
}
