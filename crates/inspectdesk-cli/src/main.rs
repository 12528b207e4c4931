mod display;

use std::io::Read;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use inspectdesk_core::{DashboardConfig, EntityKind};
use inspectdesk_session::{Command, Outcome, Session, parse_line};
use inspectdesk_sync::ListClient;

#[derive(Parser)]
#[command(name = "inspectdesk", about = "Factory inspection dashboard")]
#[command(version)]
struct Cli {
    /// JSON config file (endpoints, page size)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// API base URL, overrides the config file
    #[arg(long, global = true, env = "INSPECTDESK_API_BASE")]
    api_base: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Pull the document, factory and user lists and print them
    Fetch,

    /// Pull the remote lists and write every collection as CSV
    Export {
        dir: PathBuf,
    },

    /// Read factories from a template-shaped CSV and print them
    ImportFactories {
        file: PathBuf,

        /// Also write the resulting factory list to this directory
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Scripted inspection and follow-up walk-through, no network
    Demo,

    /// Run dashboard commands, one per line, from a file or stdin
    Run {
        script: Option<PathBuf>,

        /// Load the remote lists before running
        #[arg(long)]
        fetch: bool,
    },
}

const DEMO_FACTORY: &str = r#"
open-create-form factory
set-field no F-001
set-field factoryname "រោងចក្រ សំបុកសត្វ"
set-field factoryname_en "Golden Nest Co"
set-field sector "Bird nest processing"
set-field village Trapeang
set-field province Kampot
submit-form
"#;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    tracing::info!("inspectdesk v{}", env!("CARGO_PKG_VERSION"));

    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => DashboardConfig::from_json_file(path)?,
        None => DashboardConfig::default(),
    };
    if let Some(api_base) = cli.api_base {
        config = config.with_api_base(api_base);
    }

    match cli.command {
        Commands::Fetch => {
            let mut session = Session::new(config);
            load(&mut session).await;
            for kind in [EntityKind::Document, EntityKind::Factory, EntityKind::User] {
                display::print_table(&session.table(kind, ""))?;
            }
        }
        Commands::Export { dir } => {
            let mut session = Session::new(config);
            load(&mut session).await;
            run_one(&mut session, Command::Export { kind: None, dir })?;
        }
        Commands::ImportFactories { file, out } => {
            let mut session = Session::new(config);
            run_one(&mut session, Command::ImportFactories(file))?;
            display::print_table(&session.table(EntityKind::Factory, ""))?;
            if let Some(dir) = out {
                run_one(
                    &mut session,
                    Command::Export {
                        kind: Some(EntityKind::Factory),
                        dir,
                    },
                )?;
            }
        }
        Commands::Demo => demo(config)?,
        Commands::Run { script, fetch } => {
            let text = match script {
                Some(path) => std::fs::read_to_string(&path)?,
                None => {
                    let mut buf = String::new();
                    std::io::stdin().read_to_string(&mut buf)?;
                    buf
                }
            };
            let mut session = Session::new(config);
            if fetch {
                load(&mut session).await;
            }
            run_script(&mut session, &text)?;
        }
    }
    Ok(())
}

async fn load(session: &mut Session) {
    let client = ListClient::new(&session.config().api_base);
    let report = session.load_remote(&client).await;
    for (kind, count) in &report.loaded {
        println!("loaded {count} {kind} records");
    }
    display::print_notices(&session.drain_notices());
}

fn run_one(session: &mut Session, command: Command) -> anyhow::Result<Outcome> {
    let outcome = session.dispatch(command);
    display::print_outcome(&outcome)?;
    display::print_notices(&session.drain_notices());
    Ok(outcome)
}

fn run_script(session: &mut Session, text: &str) -> anyhow::Result<()> {
    for (n, line) in text.lines().enumerate() {
        match parse_line(line) {
            Ok(Some(command)) => {
                run_one(session, command)?;
            }
            Ok(None) => {}
            Err(e) => println!("line {}: {e}", n + 1),
        }
    }
    Ok(())
}

fn demo(config: DashboardConfig) -> anyhow::Result<()> {
    let mut session = Session::new(config);
    run_script(&mut session, DEMO_FACTORY)?;
    let factory = session
        .factories()
        .list()
        .first()
        .map(|s| s.id.clone())
        .ok_or_else(|| anyhow::anyhow!("demo factory was not created"))?;

    run_script(
        &mut session,
        &format!(
            r#"
# an inspection that found problems, located from the factory record
open-create-form inspection
set-field no INS001
set-field group A
set-field inspection_date 2024-01-15
select-factory {factory}
set-field case_subject "Routine inspection"
toggle-penalty on
set-field penalty_format "Written warning"
set-field penalty_condition "Repair ventilation"
toggle-fine on
set-field fine_amount 500000
submit-form

# and one that did not
open-create-form inspection
set-field no INS002
set-field group B
set-field inspection_date 2024-02-01
set-field factory_name "Other Factory"
set-field sector Garment
set-field case_subject Complaint
submit-form

list inspection
"#
        ),
    )?;

    let ids: Vec<_> = session
        .inspections()
        .list()
        .iter()
        .map(|s| s.id.clone())
        .collect();
    let [with_penalty, without_penalty] = ids.as_slice() else {
        anyhow::bail!("demo inspections were not created");
    };

    println!("follow-up candidates:");
    for (id, label) in session.penalty_candidates() {
        println!("  {id:<16} {label}");
    }
    println!();

    run_script(
        &mut session,
        &format!(
            r#"
open-create-form followup
set-field no FLW001
select-original-inspection {with_penalty}
set-field followup_date 2024-03-01
toggle-followup-result not-implemented
set-field followup_condition "Ventilation still blocked"
set-field conclusion "Second warning issued"
submit-form

# refused: the original carries no penalty
open-create-form followup
set-field no FLW002
select-original-inspection {without_penalty}
set-field followup_date 2024-03-02
submit-form
cancel-form

# the snapshot outlives its original
confirm-delete inspection {with_penalty}
switch-tab followup
search followup kampot
"#
        ),
    )?;

    if let Some(followup) = session.followups().list().first() {
        let id = followup.id.clone();
        run_one(&mut session, Command::View(EntityKind::Followup, id))?;
    }
    Ok(())
}
