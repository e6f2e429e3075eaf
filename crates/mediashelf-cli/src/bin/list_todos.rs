use anyhow::{bail, Result};
use chrono::{DateTime, NaiveDate, Utc};
use clap::Parser;
use mediashelf_cli::{bootstrap, page_request, print_json, truncate_string, OutputFormat};
use mediashelf_core::models::Todo;
use mediashelf_core::Window;
use mediashelf_db::TodoRepository;

#[derive(Parser, Debug)]
#[command(name = "list_todos")]
#[command(about = "List open todos for a day, a window, or without a due date")]
struct Args {
    /// Todos touching this day (YYYY-MM-DD)
    #[arg(long, conflicts_with_all = ["from", "to", "without_due_date"])]
    date: Option<NaiveDate>,

    /// Window start (RFC 3339)
    #[arg(long, requires = "to")]
    from: Option<DateTime<Utc>>,

    /// Window end (RFC 3339)
    #[arg(long, requires = "from")]
    to: Option<DateTime<Utc>>,

    /// Open todos with no due date, newest first
    #[arg(long, conflicts_with_all = ["from", "to"])]
    without_due_date: bool,

    /// Page size for --without-due-date
    #[arg(long)]
    limit: Option<i64>,

    /// Offset for --without-due-date
    #[arg(long, default_value = "0")]
    offset: i64,

    #[arg(long, value_enum, default_value = "table")]
    format: OutputFormat,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let (config, pool) = bootstrap().await?;
    let repository = TodoRepository::new(pool);

    if args.without_due_date {
        let page = page_request(&config, args.offset, args.limit)?;
        let result = repository.find_without_due_date(page).await?;
        return match args.format {
            OutputFormat::Json => print_json(&result),
            OutputFormat::Table => {
                print_todo_table(&result.items);
                println!("Total without due date: {}", result.total_count);
                Ok(())
            }
        };
    }

    let todos = match (args.date, args.from, args.to) {
        (Some(date), _, _) => repository.find_by_date(date).await?,
        (None, Some(from), Some(to)) => {
            let window = Window::new(from, to)?;
            repository.find_by_date_range(&window).await?
        }
        (None, None, None) => repository.find_by_date(Utc::now().date_naive()).await?,
        _ => bail!("--from and --to must be given together"),
    };

    match args.format {
        OutputFormat::Json => print_json(&todos)?,
        OutputFormat::Table => print_todo_table(&todos),
    }

    Ok(())
}

fn format_date(value: Option<DateTime<Utc>>) -> String {
    value
        .map(|d| d.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".to_string())
}

fn print_todo_table(todos: &[Todo]) {
    if todos.is_empty() {
        println!("No todos found.");
        return;
    }

    println!(
        "{:<36}  {:<32}  {:<16}  {:<16}  {:<16}  {}",
        "ID", "TITLE", "START", "END", "DUE", "OVERDUE"
    );
    println!("{}", "-".repeat(132));

    for todo in todos {
        println!(
            "{:<36}  {:<32}  {:<16}  {:<16}  {:<16}  {}",
            todo.id,
            truncate_string(&todo.title, 32),
            format_date(todo.start_date),
            format_date(todo.end_date),
            format_date(todo.due_date),
            if todo.is_overdue() { "yes" } else { "" }
        );
    }
}
