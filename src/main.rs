use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use release_changelog::changelog::{format_output, ChangelogGenerator, OutputFormat};
use release_changelog::config::{ChangelogOptions, Config};
use release_changelog::server;

#[derive(Parser)]
#[command(name = "release-changelog")]
#[command(about = "Generate conventional-commit changelogs for GitHub repositories")]
struct Cli {
    /// GitHub token (can also be set via GITHUB_TOKEN env var)
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Config file (defaults to ./changelog.toml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate the changelog between two references
    Generate {
        #[command(flatten)]
        range: RangeArgs,

        /// Commit types whose section is left out (e.g. build,docs)
        #[arg(long, value_delimiter = ',')]
        exclude_types: Vec<String>,

        /// Scopes whose commits are left out
        #[arg(long, value_delimiter = ',')]
        exclude_scopes: Vec<String>,

        /// Only render sections for these commit types
        #[arg(long, value_delimiter = ',')]
        restrict_to_types: Vec<String>,

        /// Link #123 issue references
        #[arg(long)]
        include_ref_issues: bool,

        /// Leave out commits that are not conventional
        #[arg(long)]
        exclude_invalid_commits: bool,

        /// Prefix section headings with gitmoji icons
        #[arg(long)]
        gitmojis: bool,

        /// List entries in reverse order
        #[arg(long)]
        reverse: bool,

        /// Output format
        #[arg(short = 'f', long, default_value = "markdown")]
        format: OutputFormat,

        /// Output file path (stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show which references a changelog would be generated between
    Range {
        #[command(flatten)]
        range: RangeArgs,
    },

    /// Serve the changelog HTTP API
    Serve {
        #[arg(long)]
        host: Option<String>,

        #[arg(short, long)]
        port: Option<u16>,
    },
}

#[derive(Args)]
struct RangeArgs {
    /// Repository URL, e.g. https://github.com/owner/repo
    #[arg(short, long)]
    url: String,

    /// Base reference (defaults to the most recent tag)
    #[arg(long)]
    from: Option<String>,

    /// Head reference (defaults to the default branch)
    #[arg(long)]
    to: Option<String>,
}

impl RangeArgs {
    fn options(&self, config: &Config) -> ChangelogOptions {
        let mut options = config.defaults.options_for(self.url.clone());
        options.from_tag = self.from.clone();
        options.to_tag = self.to.clone();
        options
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Generate {
            range,
            exclude_types,
            exclude_scopes,
            restrict_to_types,
            include_ref_issues,
            exclude_invalid_commits,
            gitmojis,
            reverse,
            format,
            output,
        } => {
            let mut options = range.options(&config);
            if !exclude_types.is_empty() {
                options.exclude_types = exclude_types;
            }
            if !exclude_scopes.is_empty() {
                options.exclude_scopes = exclude_scopes;
            }
            if !restrict_to_types.is_empty() {
                options.restrict_to_types = restrict_to_types;
            }
            options.include_ref_issues |= include_ref_issues;
            options.include_invalid_commits &= !exclude_invalid_commits;
            options.use_gitmojis |= gitmojis;
            options.reverse_order |= reverse;

            let generator = ChangelogGenerator::from_config(cli.token, &config.github)?;
            let result = generator.generate(&options).await?;
            let content = format_output(&result, format)?;

            if let Some(output_path) = output {
                std::fs::write(&output_path, content)
                    .with_context(|| format!("Failed to write {}", output_path.display()))?;
                eprintln!(
                    "Changelog {}...{} written to {}",
                    result.from_tag,
                    result.to_tag,
                    output_path.display()
                );
            } else {
                print!("{}", content);
            }
        }
        Commands::Range { range } => {
            let generator = ChangelogGenerator::from_config(cli.token, &config.github)?;
            let pair = generator.resolve_range(&range.options(&config)).await?;
            println!("from: {}", pair.previous);
            println!("to:   {}", pair.latest);
        }
        Commands::Serve { host, port } => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            server::serve(config, cli.token).await?;
        }
    }

    Ok(())
}
