use anyhow::Result;
use clap::Parser;
use mediashelf_cli::{bootstrap, page_request, print_json, truncate_string, OutputFormat};
use mediashelf_core::models::Media;
use mediashelf_core::Paged;
use mediashelf_db::{MediaFilter, MediaRepository};
use uuid::Uuid;

#[derive(Parser, Debug)]
#[command(name = "list_media")]
#[command(about = "List catalog media, newest first")]
struct Args {
    /// Case-insensitive title substring
    #[arg(long)]
    title: Option<String>,

    /// Only media carrying any of these tags (repeatable)
    #[arg(long = "tag", value_name = "UUID")]
    tags: Vec<Uuid>,

    /// Page size (default: configured default page size)
    #[arg(long)]
    limit: Option<i64>,

    /// Offset for pagination
    #[arg(long, default_value = "0")]
    offset: i64,

    #[arg(long, value_enum, default_value = "table")]
    format: OutputFormat,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let (config, pool) = bootstrap().await?;

    let page = page_request(&config, args.offset, args.limit)?;
    let storage = mediashelf_storage::create_storage(&config).await?;
    let repository = MediaRepository::new(pool, storage);

    let mut filter = MediaFilter::new().tags(args.tags);
    if let Some(title) = args.title {
        filter = filter.title(title);
    }

    let result = repository.find_all_filtered(page, &filter).await?;

    match args.format {
        OutputFormat::Json => print_json(&result)?,
        OutputFormat::Table => print_media_table(&result),
    }

    Ok(())
}

fn print_media_table(page: &Paged<Media>) {
    if page.items.is_empty() {
        println!("No media found.");
        return;
    }

    println!(
        "{:<36}  {:<6}  {:<30}  {:<24}  {}",
        "ID", "KIND", "TITLE", "TAGS", "LOCATION"
    );
    println!("{}", "-".repeat(130));

    for media in &page.items {
        let tags = media
            .tags
            .iter()
            .map(|t| t.name.as_str())
            .collect::<Vec<_>>()
            .join(",");
        let location = media
            .display_url
            .as_deref()
            .or(media.external_url.as_deref())
            .unwrap_or("-");
        println!(
            "{:<36}  {:<6}  {:<30}  {:<24}  {}",
            media.id,
            media.kind.to_string(),
            truncate_string(&media.title, 30),
            truncate_string(&tags, 24),
            location
        );
    }

    println!();
    println!(
        "Showing {}-{} of {}{}",
        page.offset + 1,
        page.offset + page.items.len() as i64,
        page.total_count,
        if page.has_more() { " (more available)" } else { "" }
    );
}
