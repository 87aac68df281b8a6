use clap::Parser;
use color_eyre::Result;
use color_eyre::eyre::eyre;
use organizer::{
    Config, Database, Profile, Repositories, bootstrap,
    cli::{self, Cli, Commands},
    logging,
};
use tracing::debug;

fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();

    // --dev keeps config and database apart from real data
    let profile = if cli.dev { Profile::Dev } else { Profile::Prod };

    let config = match &cli.config {
        Some(path) => Config::load_from(path, profile)?,
        None => Config::load_with_profile(profile)?,
    };

    logging::init_tracing(&config.log_level, cli.debug)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .max_blocking_threads(config.storage_workers)
        .build()?;

    runtime.block_on(run(cli, config))
}

async fn run(cli: Cli, config: Config) -> Result<()> {
    let db_path = config.get_database_path();
    let db_path = db_path
        .to_str()
        .ok_or_else(|| eyre!("Database path contains invalid UTF-8"))?;
    let db = Database::init(db_path, config.storage_workers)?;
    let repos = Repositories::new(&db);

    if config.seed_on_first_run {
        let seeded = bootstrap::seed_default_categories(&repos.categories).await?;
        debug!(seeded, "checked default categories");
    }

    let command = cli.command.unwrap_or(Commands::Tasks {
        completed: false,
        all: false,
        category: None,
        search: None,
    });

    match command {
        Commands::AddTask { title, due, category, priority, description } => {
            cli::handle_add_task(title, due, category, priority, description, &repos).await?;
        }
        Commands::Tasks { completed, all, category, search } => {
            cli::handle_tasks(completed, all, category, search, &repos).await?;
        }
        Commands::ToggleTask { id } => cli::handle_toggle_task(id, &repos).await?,
        Commands::DeleteTask { id } => cli::handle_delete_task(id, &repos).await?,
        Commands::Categories => cli::handle_categories(&repos).await?,
        Commands::AddProject { title, category, description, target } => {
            cli::handle_add_project(title, category, description, target, &repos).await?;
        }
        Commands::Projects { completed } => cli::handle_projects(completed, &repos).await?,
        Commands::AddTodo { project_id, title, priority, due } => {
            cli::handle_add_todo(project_id, title, priority, due, &repos).await?;
        }
        Commands::Todos { project_id } => cli::handle_todos(project_id, &repos).await?,
        Commands::ToggleTodo { id } => cli::handle_toggle_todo(id, &repos).await?,
        Commands::DeleteProject { id } => cli::handle_delete_project(id, &repos).await?,
        Commands::AddBook { title, author, pages, genre } => {
            cli::handle_add_book(title, author, pages, genre, &repos).await?;
        }
        Commands::Books { reading, completed } => cli::handle_books(reading, completed, &repos).await?,
        Commands::Read { id, pages, finished } => cli::handle_read(id, pages, finished, &repos).await?,
        Commands::AddJournal { content, title, tags, mood } => {
            cli::handle_add_journal(content, title, tags, mood, &repos).await?;
        }
        Commands::Journal { tag, mood } => cli::handle_journal(tag, mood, &repos).await?,
        Commands::AddNote { title, content, tags } => {
            cli::handle_add_note(title, content, tags, &repos).await?;
        }
        Commands::Notes { search } => cli::handle_notes(search, &repos).await?,
        Commands::Seed => cli::handle_seed(&repos).await?,
        Commands::WatchTasks => cli::handle_watch_tasks(&repos).await?,
    }

    Ok(())
}
