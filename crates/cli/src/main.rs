mod config;
mod error;

use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use access::{
    Action, Decision, Environment, PolicyTable, Resource, ResourceType, Role, Subject,
    get_user_from_role,
};
use audit::{AuditStore, DecisionRecord, Outcome};
use chrono::{Local, TimeZone};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use config::Config;
use error::{Error, Result};

const CONFIG_FILE: &str = "campus-access.toml";

#[derive(Parser)]
#[command(name = "campus-access")]
#[command(about = "Inspect and exercise the campus access policy", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file (defaults to ./campus-access.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decide a single request
    Check {
        /// Role label of the acting user (unknown labels act as guest)
        #[arg(short, long)]
        role: Option<String>,
        /// Resource type
        #[arg(long)]
        resource: String,
        /// Action to take
        #[arg(short, long)]
        action: String,
        /// Owner id of the resource
        #[arg(long)]
        owner: Option<String>,
        /// Department the resource belongs to
        #[arg(long)]
        department: Option<String>,
        /// Override the resolved subject's department
        #[arg(long)]
        subject_department: Option<String>,
        /// Mark the resource public
        #[arg(long)]
        public: bool,
        /// Network origin of the request
        #[arg(long)]
        origin: Option<IpAddr>,
    },
    /// List the active policy rules
    Rules,
    /// Show what a role may do on each resource type
    Matrix {
        #[arg(short, long)]
        role: Option<String>,
    },
    /// Show the subject a role label resolves to
    Whoami {
        #[arg(short, long)]
        role: Option<String>,
    },
    /// Show recorded decisions
    Audit {
        /// Show only the last N records
        #[arg(short, long, default_value = "20")]
        limit: usize,
        /// Only records for this subject id
        #[arg(short, long)]
        subject: Option<String>,
    },
}

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<ExitCode> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;
    init_logging(&config);

    match cli.command {
        Commands::Check {
            role,
            resource,
            action,
            owner,
            department,
            subject_department,
            public,
            origin,
        } => {
            let mut subject = get_user_from_role(role.as_deref());
            if let Some(department) = subject_department {
                subject.department = Some(department);
            }
            let attrs = Attributes {
                owner,
                department,
                public,
            };
            let env = Environment {
                origin,
                ..Environment::now()
            };
            cmd_check(&config, &subject, &resource, &action, attrs, &env)
        }
        Commands::Rules => cmd_rules(&config),
        Commands::Matrix { role } => cmd_matrix(&config, role.as_deref()),
        Commands::Whoami { role } => {
            cmd_whoami(role.as_deref());
            Ok(ExitCode::SUCCESS)
        }
        Commands::Audit { limit, subject } => cmd_audit(&config, limit, subject.as_deref()),
    }
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Ok(Config::load(path)?),
        None if Path::new(CONFIG_FILE).exists() => Ok(Config::load(CONFIG_FILE)?),
        None => Ok(Config::default()),
    }
}

fn init_logging(config: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log.filter))
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Resource attributes given on the command line.
struct Attributes {
    owner: Option<String>,
    department: Option<String>,
    public: bool,
}

/// Outcome of a `check` given as labels.
enum Checked {
    /// A label named no known resource type or action.
    Unknown(access::Error),
    Decided {
        resource: Resource,
        action: Action,
        decision: Decision,
    },
}

impl Checked {
    fn is_allowed(&self) -> bool {
        matches!(self, Checked::Decided { decision, .. } if decision.is_allowed())
    }
}

/// Decide a request given as labels. Unknown labels deny.
fn decide(
    table: &PolicyTable,
    subject: &Subject,
    resource: &str,
    action: &str,
    attrs: Attributes,
    env: &Environment,
) -> Checked {
    let parsed = resource
        .parse::<ResourceType>()
        .and_then(|kind| action.parse::<Action>().map(|action| (kind, action)));
    let (kind, action) = match parsed {
        Ok(parsed) => parsed,
        Err(e) => {
            tracing::warn!(error = %e, "request names an unknown label; denying");
            return Checked::Unknown(e);
        }
    };

    let mut resource = Resource::new(kind);
    resource.owner_id = attrs.owner;
    resource.department_id = attrs.department;
    if attrs.public {
        resource = resource.public(true);
    }

    let decision = table.evaluate(subject, &resource, action, Some(env));
    Checked::Decided {
        resource,
        action,
        decision,
    }
}

fn cmd_check(
    config: &Config,
    subject: &Subject,
    resource: &str,
    action: &str,
    attrs: Attributes,
    env: &Environment,
) -> Result<ExitCode> {
    let policy = config.policy()?;
    let checked = decide(policy.table(), subject, resource, action, attrs, env);

    let record = match &checked {
        Checked::Unknown(e) => {
            println!("deny: {e}");
            DecisionRecord::rejected(subject, resource, action, e.to_string())
        }
        Checked::Decided {
            resource,
            action,
            decision,
        } => {
            println!("{decision}");
            DecisionRecord::new(subject, resource, *action, decision)
        }
    };

    if config.audit.enabled {
        let store = open_audit(config, true)?;
        store.append(&record)?;
    }

    Ok(if checked.is_allowed() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(2)
    })
}

fn cmd_rules(config: &Config) -> Result<ExitCode> {
    let policy = config.policy()?;
    let table = policy.table();

    if table.is_empty() {
        println!("No rules: every request is denied.");
        return Ok(ExitCode::SUCCESS);
    }

    println!("{:<10}  {:<8}  {:<24}  CONDITION", "RESOURCE", "ACTION", "ROLES");
    println!("{}", "-".repeat(72));
    for rule in table.rules() {
        let roles: Vec<&str> = rule.roles.iter().map(Role::as_str).collect();
        println!(
            "{:<10}  {:<8}  {:<24}  {}",
            rule.resource,
            rule.action,
            roles.join(","),
            rule.condition.map(|c| c.as_str()).unwrap_or("-")
        );
    }
    Ok(ExitCode::SUCCESS)
}

fn cmd_matrix(config: &Config, role: Option<&str>) -> Result<ExitCode> {
    let policy = config.policy()?;
    let table = policy.table();
    let subject = get_user_from_role(role);

    println!("Subject: {} ({})\n", subject.id, subject.role);
    print!("{:<10}", "");
    for action in Action::ALL {
        print!("  {:<7}", action.as_str());
    }
    println!();

    for kind in ResourceType::ALL {
        print!("{:<10}", kind.as_str());
        for action in Action::ALL {
            print!("  {:<7}", matrix_cell(table, &subject, kind, action));
        }
        println!();
    }
    Ok(ExitCode::SUCCESS)
}

/// `yes` when granted outright, `cond` when only a conditional rule covers
/// the role, `-` when nothing does.
fn matrix_cell(
    table: &PolicyTable,
    subject: &Subject,
    kind: ResourceType,
    action: Action,
) -> &'static str {
    if table.check(subject, &Resource::new(kind), action, None) {
        return "yes";
    }
    let conditional = table
        .rules()
        .iter()
        .any(|rule| rule.condition.is_some() && rule.matches(subject.role, kind, action));
    if conditional { "cond" } else { "-" }
}

fn cmd_whoami(role: Option<&str>) {
    let subject = get_user_from_role(role);
    println!("id:         {}", subject.id);
    println!("role:       {}", subject.role);
    println!(
        "department: {}",
        subject.department.as_deref().unwrap_or("-")
    );
    println!("active:     {}", subject.active);
}

fn cmd_audit(config: &Config, limit: usize, subject: Option<&str>) -> Result<ExitCode> {
    let store = open_audit(config, false)?;
    let records = match subject {
        Some(id) => store.for_subject(id, limit)?,
        None => store.recent(limit)?,
    };

    if records.is_empty() {
        println!("No decisions recorded.");
        return Ok(ExitCode::SUCCESS);
    }

    for record in records {
        let time = Local
            .from_utc_datetime(&record.timestamp.naive_utc())
            .format("%Y-%m-%d %H:%M:%S");
        let outcome = match &record.outcome {
            Outcome::Allow => "allow".to_string(),
            Outcome::Deny { reason } => format!("deny ({reason})"),
        };
        println!(
            "[{time}] {} ({}) {} {}: {outcome}",
            record.subject_id, record.role, record.action, record.resource
        );
    }
    Ok(ExitCode::SUCCESS)
}

fn open_audit(config: &Config, create: bool) -> Result<AuditStore> {
    let path = match &config.audit.path {
        Some(path) => path.clone(),
        None => dirs_data_dir().ok_or(Error::NoDataDir)?.join("audit.db"),
    };
    if create {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
    } else if !path.exists() {
        return Err(Error::AuditLogNotFound { path });
    }
    Ok(AuditStore::open(&path)?)
}

fn dirs_data_dir() -> Option<PathBuf> {
    #[cfg(target_os = "macos")]
    {
        std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".local/share/campus-access"))
    }
    #[cfg(target_os = "linux")]
    {
        std::env::var_os("XDG_DATA_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".local/share")))
            .map(|p| p.join("campus-access"))
    }
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("APPDATA").map(|h| PathBuf::from(h).join("campus-access"))
    }
    #[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "windows")))]
    {
        None
    }
}
