use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing::{info, warn};

use inventory_list::config::Settings;
use inventory_list::domain::entities::dataset::Row;
use inventory_list::domain::entities::employee::{
    employee_priority_tier, EmployeeFilters, EmployeeMapping, EmployeeUiFilters,
    EMPLOYEE_ID_KEY, EMPLOYEE_STATUS_PRIORITY,
};
use inventory_list::domain::entities::exception::{
    ExceptionFilters, ExceptionMapping, ExceptionUiFilters, EXCEPTION_ID_KEY,
};
use inventory_list::domain::entities::filters::FilterMapping;
use inventory_list::domain::entities::query::{
    PaginationState, SortDescriptor, SortEntry, STATUS_PRIORITY_KEY,
};
use inventory_list::infra::import::csv::import_csv_to_sqlite;
use inventory_list::infra::sqlite::repo::SqlitePageSource;
use inventory_list::infra::sqlite::schema::init_db;
use inventory_list::logging::{init_logging, LogConfig};
use inventory_list::usecase::ports::fetch::PageFetcher;
use inventory_list::usecase::services::fetch_orchestrator::FetchOrchestrator;
use inventory_list::usecase::services::list_view::ListView;
use inventory_list::usecase::services::query_state::{QueryStateController, ResetTrigger};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Entity {
    Employees,
    Exceptions,
}

impl Entity {
    fn dataset(self) -> &'static str {
        match self {
            Entity::Employees => "employees",
            Entity::Exceptions => "exceptions",
        }
    }
}

/// Print one page of an inventory list from the local database.
#[derive(Debug, Parser)]
#[command(name = "inventory-browse", version)]
struct Cli {
    /// Inventory database (defaults to the configured or per-user location).
    #[arg(long)]
    db: Option<PathBuf>,

    /// CSV file imported into the entity's dataset before browsing.
    #[arg(long)]
    seed: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = Entity::Employees)]
    entity: Entity,

    #[arg(long, default_value = "")]
    search: String,

    /// Status label; empty or "All" means every status.
    #[arg(long, default_value = "")]
    status: String,

    /// One-based page number.
    #[arg(long, default_value_t = 1)]
    page: u32,

    #[arg(long)]
    page_size: Option<u32>,

    /// Sort column; replaces the entity's default ordering.
    #[arg(long)]
    sort: Option<String>,

    #[arg(long)]
    desc: bool,

    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings_result = Settings::load();
    let settings = settings_result.as_ref().cloned().unwrap_or_default();

    let mut log_config = LogConfig::from_verbosity(cli.verbose);
    log_config.format = settings.log.format;
    log_config.with_timestamps = settings.log.with_timestamps;
    init_logging(&log_config)?;
    if let Err(err) = &settings_result {
        warn!(error = %format!("{err:#}"), "using default settings");
    }

    let db_path = match &cli.db {
        Some(path) => path.clone(),
        None => settings.database_path()?,
    };
    init_db(&db_path)?;

    if let Some(seed) = &cli.seed {
        let imported = import_csv_to_sqlite(&db_path, seed, Some(cli.entity.dataset()))
            .with_context(|| format!("failed to seed from {}", seed.display()))?;
        info!(rows = imported.row_count, "seeded {}", cli.entity.dataset());
    }

    let page_size = cli.page_size.unwrap_or(settings.list.default_page_size);
    let pagination = PaginationState::first_page(page_size);
    let source = SqlitePageSource::new(&db_path, cli.entity.dataset());

    match cli.entity {
        Entity::Employees => {
            let source = source.with_priority_key(
                STATUS_PRIORITY_KEY,
                EmployeeFilters::STATUS,
                EMPLOYEE_STATUS_PRIORITY,
                EMPLOYEE_ID_KEY,
            );
            let ui = EmployeeUiFilters {
                search: cli.search.clone(),
                status: cli.status.clone(),
                ..Default::default()
            };
            let controller = QueryStateController::<EmployeeMapping>::new(pagination)
                .with_reset_triggers([
                    ResetTrigger::Filter(EmployeeFilters::SEARCH),
                    ResetTrigger::Filter(EmployeeFilters::STATUS),
                    ResetTrigger::Filter(EmployeeFilters::DEPARTMENT),
                ])
                .with_priority_tier(employee_priority_tier())
                .with_domain_filters(EmployeeMapping::densify(Some(&ui)));
            browse(controller, source, &cli, &settings).await
        }
        Entity::Exceptions => {
            let ui = ExceptionUiFilters {
                search: cli.search.clone(),
                status: cli.status.clone(),
                ..Default::default()
            };
            let controller = QueryStateController::<ExceptionMapping>::new(pagination)
                .with_reset_triggers([
                    ResetTrigger::Filter(ExceptionFilters::SEARCH),
                    ResetTrigger::Filter(ExceptionFilters::STATUS),
                    ResetTrigger::Filter(ExceptionFilters::SEVERITY),
                    ResetTrigger::Filter(ExceptionFilters::OWNER),
                ])
                .with_sorting(SortDescriptor::single(SortEntry::asc(EXCEPTION_ID_KEY)))
                .with_domain_filters(ExceptionMapping::densify(Some(&ui)));
            browse(controller, source, &cli, &settings).await
        }
    }
}

async fn browse<M: FilterMapping>(
    mut controller: QueryStateController<M>,
    source: SqlitePageSource,
    cli: &Cli,
    settings: &Settings,
) -> Result<()> {
    if let Some(key) = &cli.sort {
        let entry = if cli.desc {
            SortEntry::desc(key.clone())
        } else {
            SortEntry::asc(key.clone())
        };
        controller.set_sorting(SortDescriptor::single(entry));
    }
    controller.set_page_index(cli.page.max(1) - 1);

    let fetcher: Arc<dyn PageFetcher<Row = Row>> = Arc::new(source);
    let orchestrator = FetchOrchestrator::new(fetcher).with_timeout(settings.fetch_timeout());
    let mut view = ListView::with_orchestrator(controller, orchestrator);
    view.load();
    let state = view.settled().await;

    if state.is_error {
        anyhow::bail!(
            "{}",
            state
                .error_message
                .unwrap_or_else(|| "failed to load data".to_string())
        );
    }

    let pagination = view.controller().pagination();
    info!(
        page = pagination.page_index + 1,
        pages = view.controller().page_count(state.total_rows),
        total = state.total_rows,
        "loaded page"
    );
    print_rows(&state.rows);
    println!(
        "page {} of {} ({} rows)",
        pagination.page_index + 1,
        view.controller().page_count(state.total_rows),
        state.total_rows
    );
    Ok(())
}

fn print_rows(rows: &[Row]) {
    let Some(first) = rows.first() else {
        println!("(no rows)");
        return;
    };
    let header: Vec<&str> = first.fields().iter().map(|(name, _)| name.as_str()).collect();
    println!("{}", header.join("\t"));
    for row in rows {
        println!("{}", row.values().collect::<Vec<_>>().join("\t"));
    }
}
