//! hyperform: command-line inspector for HAL + HAL-FORMS APIs.

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use rustyline::error::ReadlineError;
use serde_json::Map;

use hyperform::{
    categorize_template, collection_view, confirmation_message, expand_template, template_defaults, template_target,
    ColumnOrdering, HypermediaClient, InferenceOptions, Outcome, Resource, Submission,
};
use hyperform_cli::config::{
    build_client_config, parse_data, parse_param, resolve_base_url, resolve_token, TOKEN_ENV,
};
use hyperform_cli::render::{
    render_links, render_pagination, render_table, render_templates, render_validation_errors,
};

#[derive(Parser)]
#[command(
    name = "hyperform",
    about = "Inspect and operate HAL + HAL-FORMS APIs from the terminal",
    version
)]
struct Cli {
    /// API base URL. Also reads HYPERFORM_BASE_URL.
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Extra request header as NAME:VALUE (repeatable).
    #[arg(short = 'H', long = "header", global = true)]
    headers: Vec<String>,

    /// Bearer token. Also reads HYPERFORM_TOKEN.
    #[arg(long, global = true)]
    token: Option<String>,

    /// Request timeout in milliseconds.
    #[arg(long, global = true)]
    timeout_ms: Option<u64>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch a resource and pretty-print it.
    Get { path: String },

    /// List the link relations of a resource.
    Links { path: String },

    /// Render the embedded collection of a resource as a table.
    Table {
        path: String,

        /// Embedded key holding the items (auto-detected by default).
        #[arg(long)]
        key: Option<String>,

        /// Order columns by semantic importance instead of API order.
        #[arg(long)]
        semantic: bool,

        /// Number of items sampled for column inference.
        #[arg(long)]
        sample_size: Option<usize>,
    },

    /// List the templates of a resource with their categories.
    Templates { path: String },

    /// Validate and execute a template of a resource.
    Submit {
        path: String,

        /// Template key, e.g. `default` or `delete`.
        template: String,

        /// Submitted fields as a JSON object; merged over template defaults.
        #[arg(long)]
        data: Option<String>,

        /// Skip the confirmation prompt for action templates.
        #[arg(short, long)]
        yes: bool,
    },

    /// Expand a URI template offline.
    ///
    /// Example:
    ///   hyperform expand '/users/{id}{?fields}' --param id=7 --param fields=name,email
    Expand {
        template: String,

        /// Parameter as KEY=VALUE (repeatable).
        #[arg(short, long = "param")]
        params: Vec<String>,
    },

    /// Generate shell completion scripts.
    ///
    /// Examples:
    ///   hyperform completions bash > ~/.local/share/bash-completion/completions/hyperform
    ///   hyperform completions zsh > ~/.zfunc/_hyperform
    Completions {
        /// Shell type (bash, zsh, fish, powershell, elvish).
        shell: Shell,
    },
}

fn build_client(cli: &Cli) -> anyhow::Result<HypermediaClient> {
    let base_url = resolve_base_url(cli.base_url.as_deref())?;
    let token = resolve_token(cli.token.as_deref());
    let config = build_client_config(base_url, &cli.headers, cli.timeout_ms, token)?;
    tracing::debug!(base_url = %config.base_url, timeout_ms = config.timeout_ms, "client configured");

    Ok(HypermediaClient::new(config).with_auth_error_handler(|_| {
        eprintln!("Authentication required: pass --token or set {TOKEN_ENV}.");
    }))
}

fn settled(outcome: Outcome<Resource>) -> anyhow::Result<Resource> {
    outcome
        .ready()
        .ok_or_else(|| anyhow::anyhow!("request was redirected for authentication"))
}

fn print_resource(resource: &Resource) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(&resource.to_value())?);
    Ok(())
}

fn confirm(prompt: &str) -> anyhow::Result<bool> {
    let mut rl = rustyline::DefaultEditor::new()?;
    match rl.readline(&format!("{prompt} [y/N] ")) {
        Ok(line) => Ok(matches!(line.trim().to_ascii_lowercase().as_str(), "y" | "yes")),
        Err(ReadlineError::Interrupted | ReadlineError::Eof) => Ok(false),
        Err(err) => Err(err.into()),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match &cli.command {
        Commands::Get { path } => {
            let client = build_client(&cli)?;
            print_resource(&settled(client.fetch(path).await?)?)?;
        }

        Commands::Links { path } => {
            let client = build_client(&cli)?;
            let resource = settled(client.fetch(path).await?)?;
            println!("{}", render_links(&resource));
        }

        Commands::Table {
            path,
            key,
            semantic,
            sample_size,
        } => {
            let client = build_client(&cli)?;
            let resource = settled(client.fetch(path).await?)?;

            let mut options = InferenceOptions::default();
            if *semantic {
                options = options.with_ordering(ColumnOrdering::Semantic);
            }
            if let Some(n) = sample_size {
                options = options.with_sample_size(*n);
            }

            let view = collection_view(&resource, key.as_deref(), &options);
            println!("{}", render_table(&view));
            if let Some(pager) = render_pagination(view.pagination.as_ref(), &view.pages) {
                println!();
                println!("{pager}");
            }
        }

        Commands::Templates { path } => {
            let client = build_client(&cli)?;
            let resource = settled(client.fetch(path).await?)?;
            println!("{}", render_templates(&resource));
        }

        Commands::Submit {
            path,
            template: key,
            data,
            yes,
        } => {
            let client = build_client(&cli)?;
            let resource = settled(client.fetch(path).await?)?;

            let Some(template) = resource.template(key) else {
                let available: Vec<&str> = resource.templates.keys().map(String::as_str).collect();
                anyhow::bail!("no template {key:?} on {path} (available: {})", available.join(", "));
            };

            let Some(target) = template_target(&resource, template) else {
                anyhow::bail!("template {key:?} on {path} has no target and the resource has no self link");
            };

            let mut payload = template_defaults(template);
            payload.extend(parse_data(data.as_deref())?);

            let category = categorize_template(template);
            tracing::info!(template = %key, %category, %target, "submitting");
            if category.requires_confirmation() && !*yes && !confirm(&confirmation_message(key, template))? {
                eprintln!("Cancelled.");
                return Ok(());
            }

            match client.submit_named(&resource, key, &payload).await? {
                Submission::Invalid(errors) => {
                    eprintln!("Validation failed:");
                    eprintln!("{}", render_validation_errors(&errors));
                    std::process::exit(1);
                }
                Submission::Sent(outcome) => print_resource(&settled(outcome)?)?,
            }
        }

        Commands::Expand { template, params } => {
            let mut values = Map::new();
            for raw in params {
                let (key, value) = parse_param(raw)?;
                values.insert(key, value);
            }
            println!("{}", expand_template(template, &values));
        }

        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(*shell, &mut cmd, "hyperform", &mut std::io::stdout());
        }
    }

    Ok(())
}
