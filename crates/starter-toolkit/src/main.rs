//! Starter Toolkit CLI - Generate starter projects with your favorite stack

mod logging;

use anyhow::Result;
use clap::{Parser, Subcommand};
use starter_core::tui::CreateArgs;
use starter_core::ProductConfig;
use std::path::PathBuf;

/// CLI version
pub const CLI_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Starter toolkit product configuration
#[derive(Clone)]
pub struct StarterConfig;

impl ProductConfig for StarterConfig {
    fn name(&self) -> &'static str {
        "starter-toolkit"
    }

    fn display_name(&self) -> &'static str {
        "Starter Toolkit"
    }

    fn template_owner(&self) -> &'static str {
        "starter-toolkit"
    }

    fn template_repo(&self) -> &'static str {
        "starter-toolkit"
    }

    fn template_repo_env(&self) -> &'static str {
        "STARTER_TEMPLATE_REPO"
    }

    fn api_url_env(&self) -> &'static str {
        "STARTER_API_URL"
    }

    fn cli_description(&self) -> &'static str {
        "Generate starter projects with your favorite stack"
    }

    fn upgrade_command(&self) -> &'static str {
        "cargo install starter-toolkit --force"
    }
}

#[derive(Parser, Debug)]
#[command(name = "starter-toolkit")]
#[command(about = "Generate starter projects with your favorite stack")]
#[command(version)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create a new project
    Create(CliCreateArgs),
    /// Pack a local templates directory into a tarball (for development use)
    Pack(PackArgs),
}

#[derive(Parser, Debug)]
pub struct CliCreateArgs {
    /// Name of the project directory to create
    pub project_name: String,

    /// Stack (template name) to use instead of prompting
    #[arg(short, long)]
    pub stack: Option<String>,

    /// Local directory to use for templates instead of fetching from remote (for development use)
    #[arg(long = "template-dir", conflicts_with = "archive")]
    pub template_dir: Option<PathBuf>,

    /// Prebuilt template tarball to use instead of fetching from remote
    #[arg(long)]
    pub archive: Option<PathBuf>,

    /// Auto-confirm all prompts (non-interactive mode)
    #[arg(short, long)]
    pub yes: bool,
}

impl From<CliCreateArgs> for CreateArgs {
    fn from(args: CliCreateArgs) -> Self {
        CreateArgs {
            project_name: args.project_name,
            template_dir: args.template_dir,
            archive: args.archive,
            stack: args.stack,
            yes: args.yes,
        }
    }
}

#[derive(Parser, Debug)]
pub struct PackArgs {
    /// Local directory containing `<name>/` template folders
    #[arg(long = "template-dir", default_value = "templates")]
    pub template_dir: PathBuf,

    /// Output tarball path
    #[arg(short, long, default_value = "templates.tar.gz")]
    pub output: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    logging::init();

    // Ensure terminal cursor is restored on panic
    let default_panic = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = console::Term::stderr().show_cursor();
        default_panic(info);
    }));

    // Handle Ctrl+C gracefully
    ctrlc::set_handler(move || {
        let _ = console::Term::stderr().show_cursor();
        std::process::exit(130);
    })
    .ok();

    let args = Args::parse();
    let config = StarterConfig;

    match args.command {
        Command::Create(create_args) => {
            let result = starter_core::run(&config, create_args.into(), CLI_VERSION).await;

            // Ensure cursor is visible on normal exit
            let _ = console::Term::stderr().show_cursor();

            result
        }
        Command::Pack(pack_args) => {
            starter_core::templates::build_archive(&pack_args.template_dir, &pack_args.output)
        }
    }
}
