use clap::Parser;

use rolesweep::{
    config::SweepConfig,
    db::DbPool,
    observability::init_tracing,
    reaper::{Reaper, report},
};

/// CLI arguments for rolesweep.
#[derive(Parser, Debug)]
#[command(version, about = "Expired database credential reaper", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// Path to the config file
    #[arg(short, long, global = true, default_value = "rolesweep.toml")]
    config: String,
}

#[derive(clap::Subcommand, Debug)]
enum Command {
    /// Run one reap pass over the configured families (default)
    Run {
        /// Print the report as JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Initialize a new configuration file
    Init {
        /// Path to create the config file
        #[arg(short, long, default_value = "rolesweep.toml")]
        output: String,
        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    let code = match args.command.unwrap_or(Command::Run { json: false }) {
        Command::Init { output, force } => init_config(&output, force),
        Command::Run { json } => run_sweep(&args.config, json).await,
    };
    std::process::exit(code);
}

/// Exit codes: 0 for a clean run, 1 when the run completed but left
/// failures behind, 2 when the run could not start at all.
async fn run_sweep(config_path: &str, json: bool) -> i32 {
    let config = match SweepConfig::from_file(config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {e}");
            return 2;
        }
    };

    init_tracing(&config.logging);

    tracing::info!(
        config = config_path,
        families = config.reaper.families.len(),
        custodian = %config.reaper.custodian_role,
        "starting sweep"
    );

    let db = match DbPool::connect(&config.database, config.reaper.exclude_schemas.clone()).await
    {
        Ok(db) => db,
        Err(e) => {
            tracing::error!(error = %e, "failed to connect to database");
            return 2;
        }
    };

    let sweeper = Reaper::new(
        db.principals(),
        config.reaper.custodian_role.as_str(),
        config.reaper.progress_batch,
    );
    let run = sweeper.reap_all(&config.reaper.families).await;
    db.close().await;

    if json {
        match report::to_json(&run) {
            Ok(rendered) => println!("{rendered}"),
            Err(e) => {
                tracing::error!(error = %e, "failed to serialize report");
                return 2;
            }
        }
    } else {
        print!("{}", report::render_table(&run));
    }

    if run.has_failures() { 1 } else { 0 }
}

fn init_config(output: &str, force: bool) -> i32 {
    if std::path::Path::new(output).exists() && !force {
        eprintln!("error: {output} already exists (use --force to overwrite)");
        return 2;
    }
    match std::fs::write(output, DEFAULT_CONFIG_TOML) {
        Ok(()) => {
            println!("wrote {output}");
            0
        }
        Err(e) => {
            eprintln!("error: failed to write {output}: {e}");
            2
        }
    }
}

/// Default configuration for a first run.
const DEFAULT_CONFIG_TOML: &str = r#"# rolesweep configuration

[database]
# Admin connection to the database whose leased roles should be swept.
# The url may reference environment variables: url = "${DATABASE_URL}"
url = "postgres://postgres@localhost:5432/postgres"
max_connections = 5
statement_timeout_ms = 30000

[reaper]
# Naming-family LIKE patterns, one per service consuming leased credentials.
families = ["svc_user_%"]
# Pre-existing role that inherits objects still owned by an expired principal.
custodian_role = "object_custodian"
progress_batch = 10
# Schemas to skip during privilege revocation (system schemas are always skipped).
exclude_schemas = []

[logging]
level = "info"        # or e.g. "rolesweep=debug,sqlx=warn"
format = "pretty"     # pretty | compact | json
timestamps = true
"#;
