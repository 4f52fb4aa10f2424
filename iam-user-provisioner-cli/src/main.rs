use std::io::{self, BufRead, Read, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use iam_user_provisioner_core::{
    dev_policy, lint_policy, qa_policy, DestroyRequest, PolicyDocument, ProvisionerConfig,
    ProvisionerError, ProvisionerService,
};
use log::{debug, info, LevelFilter};

mod output;

/// Exit code for refused or invalid input.
const EXIT_REFUSED: u8 = 2;

#[derive(Parser, Debug)]
#[command(
    name = "iam-user-provisioner",
    version,
    about = "Provision IAM users with a Dev or QA inline policy and an access key"
)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print a policy document as JSON
    Policy {
        #[arg(value_enum)]
        role: PolicyRole,

        /// Print on a single line
        #[arg(long)]
        compact: bool,
    },

    /// Show what apply would do, without touching IAM
    Plan {
        #[command(flatten)]
        args: ProvisionArgs,

        /// Run the plan against an in-memory backend and print the simulated result
        #[arg(long)]
        simulate: bool,
    },

    /// Create the user, its access key and its inline policy in IAM
    Apply {
        #[command(flatten)]
        args: ProvisionArgs,

        /// Apply without asking for confirmation
        #[arg(long, short = 'y')]
        yes: bool,
    },

    /// Check that the user's inline policy in IAM matches the plan
    Verify {
        #[command(flatten)]
        args: ProvisionArgs,
    },

    /// Delete the user, its access keys and its inline policies from IAM
    Destroy {
        #[command(flatten)]
        args: ProvisionArgs,

        /// Access key created by a previous apply (repeatable)
        #[arg(long = "access-key-id")]
        access_key_ids: Vec<String>,

        /// Destroy without asking for confirmation
        #[arg(long, short = 'y')]
        yes: bool,
    },

    /// Check a policy document file for structural problems ('-' reads stdin)
    Validate { file: PathBuf },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum PolicyRole {
    Dev,
    Qa,
}

#[derive(Args, Debug, Default)]
struct ProvisionArgs {
    /// TOML file with name, path, devuser, qauser, force_destroy, region, strict_role
    #[arg(long, env = "IAM_PROVISIONER_CONFIG")]
    config: Option<PathBuf>,

    /// IAM user name
    #[arg(long)]
    name: Option<String>,

    /// IAM path for the user (default "/")
    #[arg(long)]
    path: Option<String>,

    /// Attach the Dev policy
    #[arg(long)]
    devuser: bool,

    /// Attach the QA policy
    #[arg(long)]
    qauser: bool,

    /// Destroy the user even if it holds unmanaged keys or policies
    #[arg(long)]
    force_destroy: bool,

    /// Reject users with neither --devuser nor --qauser instead of defaulting to QA
    #[arg(long)]
    strict_role: bool,

    /// AWS region for the IAM client
    #[arg(long)]
    region: Option<String>,
}

impl ProvisionArgs {
    /// Config file (if any) overlaid with the flags given on the command line.
    fn resolve(&self) -> Result<ProvisionerConfig> {
        let base = match &self.config {
            Some(path) => ProvisionerConfig::load(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => ProvisionerConfig::default(),
        };
        let flags = ProvisionerConfig {
            name: self.name.clone(),
            path: self.path.clone(),
            force_destroy: self.force_destroy.then_some(true),
            devuser: self.devuser.then_some(true),
            qauser: self.qauser.then_some(true),
            region: self.region.clone(),
            strict_role: self.strict_role.then_some(true),
        };
        let config = base.overlay(flags);
        debug!("Resolved configuration: {config:?}");
        Ok(config)
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    let mut builder = env_logger::Builder::new();
    builder.filter_level(level).format_target(false);
    // RUST_LOG, when set, takes precedence over -v
    if let Ok(spec) = std::env::var("RUST_LOG") {
        builder.parse_filters(&spec);
    }
    builder.init();
}

/// Ask for confirmation on a TTY; refuse outright otherwise.
fn confirm(action: &str, yes: bool) -> Result<bool> {
    if yes {
        return Ok(true);
    }
    if !atty::is(atty::Stream::Stdin) {
        eprintln!(
            "Refusing to {action} without --yes; run interactively in a TTY or pass --yes"
        );
        return Ok(false);
    }
    eprint!("Proceed to {action}? [y/N] ");
    io::stderr().flush()?;
    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim(), "y" | "Y" | "yes"))
}

fn print_json<T: serde::Serialize>(value: &T, compact: bool) -> Result<()> {
    let json = if compact {
        serde_json::to_string(value)
    } else {
        serde_json::to_string_pretty(value)
    }
    .context("Failed to serialize output")?;
    println!("{json}");
    Ok(())
}

async fn run(cli: Cli) -> Result<ExitCode> {
    match cli.command {
        Commands::Policy { role, compact } => {
            let policy = match role {
                PolicyRole::Dev => dev_policy(),
                PolicyRole::Qa => qa_policy(),
            };
            print_json(policy, compact)?;
        }

        Commands::Plan { args, simulate } => {
            let config = args.resolve()?;
            let spec = config.user_spec()?;
            let service = ProvisionerService::simulated(config.selection_mode());
            let plan = service.plan(&spec)?;
            output::print_plan(&plan);
            if simulate {
                let user = service
                    .apply(&plan)
                    .await
                    .context("Simulated apply failed")?;
                print_json(&user, false)?;
            } else {
                print_json(&plan, false)?;
            }
        }

        Commands::Apply { args, yes } => {
            let config = args.resolve()?;
            let spec = config.user_spec()?;
            // Plan offline first so invalid input never reaches AWS
            let plan = ProvisionerService::simulated(config.selection_mode()).plan(&spec)?;
            output::print_plan(&plan);
            if !confirm("apply", yes)? {
                return Ok(ExitCode::from(EXIT_REFUSED));
            }

            info!("Applying in region {}", config.region());
            let service = ProvisionerService::aws(config.region(), config.selection_mode()).await;
            let user = service
                .apply(&plan)
                .await
                .with_context(|| format!("Failed to provision user '{}'", spec.name))?;
            output::print_provisioned(&user);
            print_json(&user, false)?;
        }

        Commands::Verify { args } => {
            let config = args.resolve()?;
            let spec = config.user_spec()?;
            let service = ProvisionerService::aws(config.region(), config.selection_mode()).await;
            let plan = service.plan(&spec)?;
            let report = service
                .verify(&plan)
                .await
                .context("Failed to read user state from IAM")?;
            output::print_verify(&report);
            print_json(&report, false)?;
            if !report.is_in_sync() {
                return Ok(ExitCode::from(EXIT_REFUSED));
            }
        }

        Commands::Destroy {
            args,
            access_key_ids,
            yes,
        } => {
            let config = args.resolve()?;
            let spec = config.user_spec()?;
            spec.validate()?;
            if !confirm(&format!("destroy user '{}'", spec.name), yes)? {
                return Ok(ExitCode::from(EXIT_REFUSED));
            }

            let service = ProvisionerService::aws(config.region(), config.selection_mode()).await;
            let report = service
                .destroy(&DestroyRequest {
                    name: spec.name.clone(),
                    force_destroy: spec.force_destroy,
                    known_access_keys: access_key_ids,
                })
                .await?;
            output::print_destroyed(&report);
            print_json(&report, false)?;
        }

        Commands::Validate { file } => {
            let raw = if file.as_os_str() == "-" {
                let mut buf = String::new();
                io::stdin()
                    .read_to_string(&mut buf)
                    .context("Failed to read policy from stdin")?;
                buf
            } else {
                std::fs::read_to_string(&file)
                    .with_context(|| format!("Failed to read {}", file.display()))?
            };

            let policy = match PolicyDocument::from_json(&raw) {
                Ok(policy) => policy,
                Err(e) => {
                    eprintln!("Not a policy document: {e}");
                    return Ok(ExitCode::from(EXIT_REFUSED));
                }
            };
            let issues = lint_policy(&policy);
            if !issues.is_empty() {
                output::print_issues(&issues);
                return Ok(ExitCode::from(EXIT_REFUSED));
            }
            eprintln!("Policy is valid ({} statement(s))", policy.statement.len());
        }
    }

    Ok(ExitCode::SUCCESS)
}

/// Input errors exit with 2, everything else with 1.
fn exit_code_for(error: &anyhow::Error) -> ExitCode {
    let refused = error.chain().any(|cause| {
        matches!(
            cause.downcast_ref::<ProvisionerError>(),
            Some(
                ProvisionerError::InvalidUserName { .. }
                    | ProvisionerError::InvalidPath { .. }
                    | ProvisionerError::NoRole(_)
                    | ProvisionerError::Config(_)
                    | ProvisionerError::DestroyBlocked { .. }
            )
        )
    });
    if refused {
        ExitCode::from(EXIT_REFUSED)
    } else {
        ExitCode::FAILURE
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            exit_code_for(&e)
        }
    }
}
