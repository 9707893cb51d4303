mod scan;
mod watch;

use clap::{Args, Parser, Subcommand};
use dcf_core::DcfConfig;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(
    name = "dcf",
    version,
    about = "Surfaces unused functions and commented-out code from an external analyzer",
    long_about = "dcf runs an external dead-code analyzer over a workspace and reports its findings. \
                  As a language server it keeps editor diagnostics, code lenses and hovers in sync \
                  with the analyzer, re-running it shortly after files are saved."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the Language Server Protocol (LSP) server on stdio
    Lsp,
    /// Run the analyzer once and print its findings
    Scan {
        /// Workspace root to analyze. Defaults to the current directory.
        #[arg(value_name = "WORKSPACE")]
        path: Option<PathBuf>,
        /// Print the diagnostics as JSON instead of text
        #[arg(long)]
        json: bool,
        #[command(flatten)]
        analyzer: AnalyzerArgs,
    },
    /// Re-run the analyzer whenever files under the workspace change
    #[command(
        long_about = "Watches the workspace and re-runs the analyzer after changes settle, \
                      printing a summary of each pass. Press Ctrl+C to stop."
    )]
    Watch {
        /// Workspace root to watch. Defaults to the current directory.
        #[arg(value_name = "WORKSPACE")]
        path: Option<PathBuf>,
        /// Quiet period after the last change before re-running
        #[arg(long, value_name = "MS")]
        debounce_ms: Option<u64>,
        #[command(flatten)]
        analyzer: AnalyzerArgs,
    },
}

#[derive(Args, Debug, Default, Clone)]
pub struct AnalyzerArgs {
    /// Analyzer script or executable; skips candidate probing
    #[arg(long, value_name = "PATH")]
    pub analyzer: Option<PathBuf>,
    /// Directory the default analyzer candidates are resolved against
    #[arg(long, value_name = "DIR")]
    pub install_dir: Option<PathBuf>,
    /// Interpreter used to run the analyzer
    #[arg(long, value_name = "PROGRAM", conflicts_with = "no_runtime")]
    pub runtime: Option<String>,
    /// Execute the analyzer directly instead of through an interpreter
    #[arg(long)]
    pub no_runtime: bool,
    /// Seconds before the analyzer is killed
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,
    /// Leave the snippet out of commented-code messages
    #[arg(long)]
    pub no_snippets: bool,
}

impl AnalyzerArgs {
    pub fn apply(&self, config: &mut DcfConfig) {
        // Relative command-line paths are taken from the shell's cwd, not
        // the install directory.
        if let Some(path) = &self.analyzer {
            config.analyzer.path = Some(absolute_or_given(path));
        }
        if let Some(dir) = &self.install_dir {
            config.analyzer.install_dir = Some(absolute_or_given(dir));
        }
        if let Some(runtime) = &self.runtime {
            config.analyzer.runtime = Some(runtime.clone());
        }
        if self.no_runtime {
            config.analyzer.runtime = None;
        }
        if let Some(secs) = self.timeout {
            config.analyzer.timeout_secs = secs;
        }
        if self.no_snippets {
            config.diagnostics.include_comment_snippet = false;
        }
    }
}

fn absolute_or_given(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

fn workspace_or_cwd(path: Option<PathBuf>) -> PathBuf {
    let path = path
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));
    std::fs::canonicalize(&path).unwrap_or(path)
}

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let (component, to_stderr) = match &cli.command {
        Commands::Lsp => ("lsp", false),
        _ => ("cli", true),
    };
    let _guard = dcf_core::logging::init_logging(component, to_stderr);

    let rt = tokio::runtime::Runtime::new()?;

    match cli.command {
        Commands::Lsp => rt.block_on(dcf_lsp::run_server()),
        Commands::Scan {
            path,
            json,
            analyzer,
        } => {
            let mut config = DcfConfig::default();
            analyzer.apply(&mut config);
            rt.block_on(scan::run(workspace_or_cwd(path), config, json))
        }
        Commands::Watch {
            path,
            debounce_ms,
            analyzer,
        } => {
            let mut config = DcfConfig::default();
            analyzer.apply(&mut config);
            if let Some(ms) = debounce_ms {
                config.debounce_ms = ms;
            }
            rt.block_on(watch::run(workspace_or_cwd(path), config))
        }
    }
}
