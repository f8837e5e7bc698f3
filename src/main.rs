use clap::{Parser, Subcommand, ValueEnum};
use palkkalaskuri::components::attendance::{HoursSheet, PayPeriod};
use palkkalaskuri::components::directory::{DirectoryHandle, Worker};
use palkkalaskuri::components::report::{export_pdf, ReportContext, ReportOptions, ReportTemplate};
use palkkalaskuri::components::salary::{calculate, split_payment, SalaryBreakdown, SalaryInput, TierRule, TierSplit};
use palkkalaskuri::components::store::{load_template, SalaryStore};
use palkkalaskuri::config::Config;
use palkkalaskuri::error::{AppResult, Error};
use palkkalaskuri::utils::money::format_amount;
use palkkalaskuri::utils::time::{now_in, parse_month};
use palkkalaskuri::{shutdown, startup};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{oneshot, RwLock};
use tracing::info;

#[derive(Parser)]
#[command(name = "palkka")]
#[command(about = "Salary calculator for workers paid through several companies")]
#[command(
    after_help = "Environment:\n  API_BASE_URL   Worker API base URL\n  REDIS_URL      Store for templates and tokens\n  RUST_LOG       Log filter"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Calculate a salary from an input file (TOML or JSON)
    Calculate {
        input: PathBuf,
        /// Fill hours from this worker's attendance calendar
        #[arg(long)]
        worker: Option<String>,
        /// Calculate for this month (YYYY-MM) instead of the input's period
        #[arg(long)]
        month: Option<String>,
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Split a total into payment-method tiers
    Split {
        total: f64,
        /// method:fixed:AMOUNT, method:percent:VALUE or method:remainder
        #[arg(long = "tier", required = true)]
        tiers: Vec<TierRule>,
    },
    /// Calculate a salary and export the report as PDF
    Export {
        input: PathBuf,
        #[arg(long, short)]
        output: PathBuf,
        /// Worker id in the worker API
        #[arg(long)]
        worker: Option<String>,
        /// Worker name when no API worker is given
        #[arg(long)]
        name: Option<String>,
        /// Calculate for this month (YYYY-MM) instead of the input's period
        #[arg(long)]
        month: Option<String>,
        #[arg(long, default_value = "default")]
        template: String,
        /// Overrides REPORT_LOCALE
        #[arg(long)]
        locale: Option<String>,
    },
    /// List workers from the worker API
    Workers,
    /// Sync companies from the worker API
    Sync {
        /// Keep syncing on the configured interval until interrupted
        #[arg(long, default_value_t = false)]
        watch: bool,
    },
    /// Manage report templates
    Template {
        #[command(subcommand)]
        command: TemplateCommand,
    },
    /// Enable or disable a component
    Component {
        name: String,
        #[arg(value_enum)]
        state: Toggle,
    },
}

#[derive(Subcommand)]
enum TemplateCommand {
    List,
    Show { name: String },
    Import { name: String, file: PathBuf },
    Delete { name: String },
}

#[derive(Clone, Copy, ValueEnum)]
enum Toggle {
    On,
    Off,
}

#[tokio::main]
async fn main() -> miette::Result<()> {
    startup::init_logging("warn,palkkalaskuri=info")?;
    let cli = Cli::parse();

    let config = startup::load_config().await?;

    match cli.command {
        Commands::Calculate {
            input,
            worker,
            month,
            json,
        } => {
            let mut input = read_input(&input, &config).await?;
            set_month(&mut input, month.as_deref())?;
            if let Some(worker_id) = worker {
                let store = startup::open_store(&config).await;
                let directory = DirectoryHandle::new(Arc::clone(&config), store);
                fill_hours(&directory, &worker_id, &mut input).await?;
                directory.shutdown().await?;
            }

            let breakdown = calculate(&input)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&breakdown).map_err(Error::from)?);
            } else {
                let currency = config.read().await.currency.clone();
                print_breakdown(&breakdown, &currency);
            }
        }
        Commands::Split { total, tiers } => {
            let split = split_payment(total, &tiers)?;
            let currency = config.read().await.currency.clone();
            print_split(&split, &currency);
        }
        Commands::Export {
            input,
            output,
            worker,
            name,
            month,
            template,
            locale,
        } => {
            let store = startup::open_store(&config).await;
            let mut input = read_input(&input, &config).await?;
            set_month(&mut input, month.as_deref())?;

            let worker = match worker {
                Some(worker_id) => {
                    let directory = DirectoryHandle::new(Arc::clone(&config), Arc::clone(&store));
                    fill_hours(&directory, &worker_id, &mut input).await?;
                    let worker = directory.get_worker(&worker_id).await?;
                    directory.shutdown().await?;
                    worker
                }
                None => local_worker(name.unwrap_or_default()),
            };

            let breakdown = calculate(&input)?;
            let template = load_template(store.as_ref(), &template).await?;
            let options = report_options(&config, locale).await?;
            let context = ReportContext::build(&worker, &input, &breakdown, &options);

            let bytes = export_pdf(&template, &context)?;
            fs::write(&output, bytes).map_err(Error::from)?;
            println!("Wrote {}", output.display());
        }
        Commands::Workers => {
            let store = startup::open_store(&config).await;
            let directory = DirectoryHandle::new(Arc::clone(&config), store);
            let workers = directory.list_workers().await?;
            for worker in &workers {
                println!(
                    "{}\t{}\t{}",
                    worker.id,
                    worker.full_name(),
                    worker.company_ids.join(",")
                );
            }
            directory.shutdown().await?;
        }
        Commands::Sync { watch } => {
            let store = startup::open_store(&config).await;
            if watch {
                run_sync_service(config, store).await?;
            } else {
                let directory = DirectoryHandle::new(Arc::clone(&config), store);
                let companies = directory.sync_companies().await?;
                for company in &companies {
                    println!("{}\t{}", company.id, company.name);
                }
                directory.shutdown().await?;
            }
        }
        Commands::Template { command } => {
            let store = startup::open_store(&config).await;
            run_template_command(store.as_ref(), command).await?;
        }
        Commands::Component { name, state } => {
            let enabled = matches!(state, Toggle::On);
            config.write().await.set_component_enabled(&name, enabled)?;
            println!(
                "Component {} {}",
                name,
                if enabled { "enabled" } else { "disabled" }
            );
        }
    }

    Ok(())
}

async fn read_input(path: &Path, config: &Arc<RwLock<Config>>) -> AppResult<SalaryInput> {
    let content = fs::read_to_string(path)?;
    let mut input: SalaryInput = match path.extension().and_then(|e| e.to_str()) {
        Some("json") => serde_json::from_str(&content)?,
        _ => toml::from_str(&content)?,
    };
    input.apply_defaults(&*config.read().await);
    input.validate()?;
    Ok(input)
}

fn set_month(input: &mut SalaryInput, month: Option<&str>) -> AppResult<()> {
    if let Some(month) = month {
        let (start, end) = parse_month(month)?;
        input.period = PayPeriod::new(start, end)?;
    }
    Ok(())
}

/// Replace the input hours with the worker's attendance
async fn fill_hours(
    directory: &DirectoryHandle,
    worker_id: &str,
    input: &mut SalaryInput,
) -> AppResult<()> {
    let calendar = directory.get_calendar(worker_id, input.period).await?;
    let company_ids: Vec<String> = input.companies.iter().map(|c| c.company_id.clone()).collect();
    let sheet = HoursSheet::from_calendar(&company_ids, &calendar, &input.period);

    info!(
        "Filled {:.2} hours for {} from the attendance calendar",
        sheet.total_hours(),
        worker_id
    );
    input.apply_hours(&sheet);
    Ok(())
}

fn local_worker(name: String) -> Worker {
    let mut parts = name.splitn(2, ' ');
    Worker {
        id: String::new(),
        first_name: parts.next().unwrap_or_default().to_string(),
        last_name: parts.next().unwrap_or_default().to_string(),
        document_id: None,
        email: None,
        company_ids: Vec::new(),
        hourly_rate: None,
        active: true,
    }
}

async fn report_options(
    config: &Arc<RwLock<Config>>,
    locale: Option<String>,
) -> AppResult<ReportOptions> {
    let config = config.read().await;
    Ok(ReportOptions {
        locale: locale.unwrap_or_else(|| config.report_locale.clone()),
        currency: config.currency.clone(),
        generated_at: now_in(config.tz()?),
    })
}

async fn run_sync_service(
    config: Arc<RwLock<Config>>,
    store: Arc<dyn SalaryStore>,
) -> miette::Result<()> {
    let component_manager = startup::start_components(config, store).await?;

    let (shutdown_send, shutdown_recv) = oneshot::channel();
    tokio::spawn(shutdown::handle_signals(shutdown_send, component_manager));

    info!("Company sync running, press Ctrl+C to stop");
    let _ = shutdown_recv.await;
    Ok(())
}

async fn run_template_command(store: &dyn SalaryStore, command: TemplateCommand) -> AppResult<()> {
    match command {
        TemplateCommand::List => {
            for name in store.list_templates().await? {
                println!("{}", name);
            }
        }
        TemplateCommand::Show { name } => {
            println!("{}", load_template(store, &name).await?.body);
        }
        TemplateCommand::Import { name, file } => {
            let body = fs::read_to_string(&file)?;
            store.set_template(&ReportTemplate::new(name.clone(), body)).await?;
            println!("Imported template {}", name);
        }
        TemplateCommand::Delete { name } => {
            if store.delete_template(&name).await? {
                println!("Deleted template {}", name);
            } else {
                println!("No template named {}", name);
            }
        }
    }
    Ok(())
}

fn print_breakdown(breakdown: &SalaryBreakdown, currency: &str) {
    let amount = |value: f64| format_amount(value, '.', currency);

    println!("Period:        {}", breakdown.period.format());
    println!("Base pay:      {}", amount(breakdown.base_pay));
    println!("Overtime pay:  {}", amount(breakdown.overtime_pay));
    println!("Bonuses:       {}", amount(breakdown.bonuses));
    println!("Deductions:    {}", amount(breakdown.deductions));
    println!("Gross:         {}", amount(breakdown.gross));
    println!("Other (net):   {}", amount(breakdown.other_payments_net));
    println!("Total:         {}", amount(breakdown.total));
    println!();

    for company in &breakdown.companies {
        let name = if company.company_name.is_empty() {
            &company.company_id
        } else {
            &company.company_name
        };
        println!(
            "{:<24} {:>8.2} h  {:>6.2} %  {}",
            name,
            company.hours + company.overtime_hours,
            company.weight * 100.0,
            amount(company.amount)
        );
    }

    if let Some(split) = &breakdown.tiers {
        println!();
        print_split(split, currency);
    }
}

fn print_split(split: &TierSplit, currency: &str) {
    for tier in &split.tiers {
        println!(
            "{:<16} {:<16} {}{}",
            tier.method.key(),
            tier.label.as_deref().unwrap_or(""),
            format_amount(tier.amount, '.', currency),
            if tier.is_remainder { " (remainder)" } else { "" }
        );
    }
    if split.unassigned > 0.0 {
        println!("Unassigned: {}", format_amount(split.unassigned, '.', currency));
    }
}
