use crate::api::stacks::{self, ManualDeploymentRequest, StackFilter};
use crate::api::Client;
use crate::auth::GithubAuthenticator;
use crate::config::{PathResolver, SessionStore};
use crate::http::{Transport, UreqTransport};
use crate::manager::{SessionManager, CREDENTIAL_VAR};
use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use std::io::{self, Write};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "nelson", about = "Command line client for the Nelson deployment service")]
pub struct Args {
    #[arg(long, global = true, help = "Session file path (default: ~/.nelson/config.yml)")]
    pub config: Option<PathBuf>,

    #[arg(
        long,
        global = true,
        env = "GITHUB_TOKEN",
        hide_env_values = true,
        help = "GitHub token used to log in and to refresh expired sessions"
    )]
    pub github_token: Option<String>,

    #[arg(long, global = true, help = "Talk to Nelson over plain HTTP")]
    pub disable_tls: bool,

    #[arg(long, global = true, help = "Debug output (print HTTP details and session handling)")]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Authenticate against a Nelson host and store the session
    Login {
        #[arg(env = "NELSON_ADDR", help = "Nelson host, e.g. nelson.example.com")]
        host: String,
    },
    /// Work with deployed stacks
    Stacks {
        #[command(subcommand)]
        command: StackCommand,
    },
}

#[derive(Subcommand)]
pub enum StackCommand {
    /// List stacks
    List {
        #[arg(short = 'd', long, help = "Comma-delimited datacenters")]
        datacenters: Option<String>,
        #[arg(short = 'n', long, help = "Comma-delimited namespaces (default: dev,qa,prod)")]
        namespaces: Option<String>,
        #[arg(short = 's', long, help = "Comma-delimited statuses (default: ready,warming,deprecated)")]
        statuses: Option<String>,
    },
    /// Show details, dependencies and status history of a stack
    Inspect { guid: String },
    /// Ask Nelson to redeploy a stack
    Redeploy { guid: String },
    /// Print the workflow log of a stack
    Logs { guid: String },
    /// Register a stack deployed outside of Nelson
    Manual {
        #[arg(long)]
        datacenter: String,
        #[arg(long)]
        namespace: String,
        #[arg(long)]
        service_type: String,
        #[arg(long)]
        version: String,
        #[arg(long)]
        hash: String,
        #[arg(long)]
        description: String,
        #[arg(long)]
        port: i64,
    },
}

pub struct Context<T: Transport> {
    pub store: SessionStore,
    pub transport: T,
    pub github_token: Option<String>,
    pub disable_tls: bool,
}

impl Context<UreqTransport> {
    pub fn from_args(args: &Args) -> Result<Self> {
        let store = match &args.config {
            Some(path) => SessionStore::new(path),
            None => SessionStore::from_resolver(&PathResolver::from_home()?)?,
        };
        Ok(Self {
            store,
            transport: UreqTransport::new(),
            github_token: args.github_token.clone(),
            disable_tls: args.disable_tls,
        })
    }
}

pub fn run(args: Args) -> Result<()> {
    let ctx = Context::from_args(&args)?;
    let stdout = io::stdout();
    let mut out = stdout.lock();
    execute(&ctx, args.command, &mut out)
}

pub fn execute<T: Transport, W: Write>(ctx: &Context<T>, command: Command, out: &mut W) -> Result<()> {
    let auth = GithubAuthenticator::new(&ctx.transport, &ctx.store, ctx.disable_tls);

    match command {
        Command::Login { host } => {
            let token = ctx
                .github_token
                .as_deref()
                .filter(|t| !t.is_empty())
                .ok_or_else(|| anyhow!("Environment {} variable not defined", CREDENTIAL_VAR))?;
            let session = auth.login(token, &host)?;
            writeln!(out, "Successfully logged in to {}", session.endpoint)?;
            Ok(())
        }
        Command::Stacks { command } => {
            let session =
                SessionManager::new(&ctx.store, &auth, ctx.github_token.clone()).load_or_recover()?;
            let client = Client::new(&ctx.transport, &session);
            run_stack_command(&client, command, out)
        }
    }
}

fn run_stack_command<T: Transport, W: Write>(
    client: &Client<'_, T>,
    command: StackCommand,
    out: &mut W,
) -> Result<()> {
    match command {
        StackCommand::List {
            datacenters,
            namespaces,
            statuses,
        } => {
            let filter = StackFilter {
                datacenters,
                namespaces,
                statuses,
            };
            let list = client.list_stacks(&filter)?;
            stacks::print_stacks(out, &list)
        }
        StackCommand::Inspect { guid } => {
            let summary = client.inspect_stack(&guid)?;
            stacks::print_stack_summary(out, &summary)
        }
        StackCommand::Redeploy { guid } => {
            writeln!(out, "{}", client.redeploy(&guid)?)?;
            Ok(())
        }
        StackCommand::Logs { guid } => {
            let log = client.deployment_log(&guid)?;
            stacks::print_stack_log(out, &guid, &log)
        }
        StackCommand::Manual {
            datacenter,
            namespace,
            service_type,
            version,
            hash,
            description,
            port,
        } => {
            let req = ManualDeploymentRequest {
                datacenter,
                namespace,
                service_type,
                version,
                hash,
                port,
                description,
            };
            writeln!(out, "{}", client.register_manual_deployment(&req)?)?;
            Ok(())
        }
    }
}
