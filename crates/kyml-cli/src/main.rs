mod commands;

use clap::{Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use commands::{EXIT_FAILURE, EXIT_INPUT_ERROR, EXIT_RESOLVE_ERROR};
use kyml_core::{parse_assignment, Engine};
use kyml_schema::{load_project_config, MissingSnapshotPolicy};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "kyml",
    version,
    about = "Concatenate, test, template, and resolve Kubernetes YAML manifests"
)]
struct Cli {
    /// Enable verbose (debug) logging output. Must precede the subcommand.
    #[arg(short, long, default_value_t = false)]
    verbose: bool,

    /// Enable trace-level logging (more detailed than --verbose).
    #[arg(long, default_value_t = false, global = true)]
    trace: bool,

    /// Output reports as structured JSON.
    #[arg(long, default_value_t = false, global = true)]
    json: bool,

    /// Project configuration file. Defaults to ./kyml.toml when present.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Concatenate Kubernetes YAML files to stdout.
    ///
    /// Documents are parsed and reformatted, deduplicated (a later document
    /// for the same resource replaces the earlier one in place), and sorted
    /// by dependencies so namespaces come before deployments. Use `-` to read
    /// from stdin.
    Cat {
        /// Files to concatenate, in order.
        #[arg(required = true)]
        files: Vec<String>,
        /// Keep input order instead of sorting by dependencies.
        #[arg(long, default_value_t = false)]
        no_sort: bool,
    },
    /// Snapshot-test the diff between two environments.
    ///
    /// The main environment is read from stdin, the comparison environment is
    /// concatenated from files. On success the main environment is printed to
    /// stdout so it can be piped on.
    Test {
        /// Files of the comparison environment.
        #[arg(required = true)]
        files: Vec<String>,
        /// Name of the main environment read from stdin [default: main].
        #[arg(long)]
        name_main: Option<String>,
        /// Name of the comparison environment read from files [default: comparison].
        #[arg(long)]
        name_comparison: Option<String>,
        /// Snapshot file [default: kyml-snapshot.diff].
        #[arg(short = 's', long)]
        snapshot_file: Option<PathBuf>,
        /// Update the snapshot file and exit successfully on a mismatch.
        #[arg(short = 'u', long, default_value_t = false)]
        update: bool,
        /// What to do when the snapshot file does not exist [default: fail].
        #[arg(long, value_enum)]
        missing_snapshot: Option<MissingSnapshot>,
    },
    /// Template string values of the manifests read from stdin.
    ///
    /// Values use `{{ Name }}` syntax. Referencing a name that was not
    /// provided is an error.
    Tmpl {
        /// Add a key=value pair to the template context.
        #[arg(short = 'v', long = "value", value_parser = parse_assignment)]
        values: Vec<(String, String)>,
        /// Add an environment variable to the template context.
        #[arg(short = 'e', long = "env")]
        env: Vec<String>,
    },
    /// Pin image tags in manifests read from stdin to their content digest.
    Resolve,
    /// Generate shell completions for bash, zsh, fish, elvish, or powershell.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
    /// Print version information.
    Version,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum MissingSnapshot {
    Fail,
    Create,
}

impl From<MissingSnapshot> for MissingSnapshotPolicy {
    fn from(value: MissingSnapshot) -> Self {
        match value {
            MissingSnapshot::Fail => Self::Fail,
            MissingSnapshot::Create => Self::Create,
        }
    }
}

fn main() -> ExitCode {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let msg = info.to_string();
        if msg.contains("Broken pipe")
            || msg.contains("broken pipe")
            || msg.contains("os error 32")
            || msg.contains("failed printing to stdout")
        {
            std::process::exit(0);
        }
        default_hook(info);
    }));

    let cli = Cli::parse();

    let default_level = if cli.trace {
        "trace"
    } else if cli.verbose {
        "debug"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("KYML_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();

    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let config = match load_project_config(cli.config.as_deref(), &cwd) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::from(EXIT_INPUT_ERROR);
        }
    };

    let engine = Engine::os();
    let json_output = cli.json;

    let result = match cli.command {
        Commands::Cat { files, no_sort } => {
            let sort = !no_sort && config.cat.sort.unwrap_or(true);
            commands::cat::run(&engine, &files, sort)
        }
        Commands::Test {
            files,
            name_main,
            name_comparison,
            snapshot_file,
            update,
            missing_snapshot,
        } => commands::test::run(
            &engine,
            &files,
            commands::test::TestArgs {
                name_main,
                name_comparison,
                snapshot_file,
                update,
                missing_snapshot: missing_snapshot.map(Into::into),
            },
            &config,
            json_output,
        ),
        Commands::Tmpl { values, env } => commands::tmpl::run(&engine, &values, &env),
        Commands::Resolve => commands::resolve::run(&engine, &config.resolve),
        Commands::Completions { shell } => commands::completions::run::<Cli>(shell),
        Commands::Version => commands::version::run(json_output),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(msg) => {
            eprintln!("error: {msg}");
            let code = if msg.starts_with("manifest error:")
                || msg.starts_with("cannot read ")
                || msg.starts_with("template error")
            {
                EXIT_INPUT_ERROR
            } else if msg.starts_with("image resolution error:") {
                EXIT_RESOLVE_ERROR
            } else {
                EXIT_FAILURE
            };
            ExitCode::from(code)
        }
    }
}
