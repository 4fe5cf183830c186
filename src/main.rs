use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use mongo_grid::{
    config::{ConfigLoader, LogFormat},
    logging, GridQueryBuilder, GridTableRequest, MongoConnect,
};
use mongodb::bson::{Bson, Document};
use std::io::Read;
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliLogFormat {
    Human,
    Json,
}

/// Translate an AG Grid request into a MongoDB aggregation pipeline
#[derive(Debug, Parser)]
#[command(name = "mongo-grid", version, about)]
struct Cli {
    /// Request payload (JSON file, `-` for stdin)
    #[arg(short, long)]
    request: PathBuf,

    /// Forced match conditions as a JSON object
    #[arg(long)]
    forced: Option<String>,

    /// Extra final projection as a JSON object
    #[arg(long)]
    projection: Option<String>,

    /// Configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the configured log format
    #[arg(long, value_enum)]
    log_format: Option<CliLogFormat>,

    /// Run the pipeline instead of printing it
    #[arg(long, requires_all = ["database", "collection"])]
    execute: bool,

    #[arg(long)]
    database: Option<String>,

    #[arg(long)]
    collection: Option<String>,
}

fn read_request(path: &PathBuf) -> Result<GridTableRequest> {
    let payload = if path.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read request {}", path.display()))?
    };
    Ok(GridTableRequest::from_json(&payload)?)
}

fn parse_document(label: &str, raw: &str) -> Result<Document> {
    let value: serde_json::Value =
        serde_json::from_str(raw).with_context(|| format!("--{} is not valid JSON", label))?;
    match Bson::try_from(value).with_context(|| format!("--{} is not valid BSON", label))? {
        Bson::Document(doc) => Ok(doc),
        _ => bail!("--{} must be a JSON object", label),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = ConfigLoader::new()
        .load_from_file(cli.config.as_deref())
        .load_from_env()
        .build()?;
    if let Some(format) = cli.log_format {
        config.logging.format = match format {
            CliLogFormat::Human => LogFormat::Human,
            CliLogFormat::Json => LogFormat::Json,
        };
    }
    logging::init_logging(&config.logging)?;

    let request = read_request(&cli.request)?;
    let mut builder = GridQueryBuilder::new(&request);
    if let Some(raw) = &cli.forced {
        builder = builder.forced_filters(parse_document("forced", raw)?);
    }
    if let Some(raw) = &cli.projection {
        builder = builder.additional_projection(parse_document("projection", raw)?);
    }
    let pipeline = builder.build()?;

    if !cli.execute {
        println!("{}", serde_json::to_string_pretty(&pipeline.to_relaxed_extjson())?);
        return Ok(());
    }

    let (Some(database), Some(collection)) = (&cli.database, &cli.collection) else {
        bail!("--execute needs --database and --collection");
    };
    let connect = MongoConnect::new(&config).await?;
    let rows = connect
        .collection(database, collection)
        .aggregate(pipeline, Default::default())
        .await?;
    info!(rows = rows.len(), "aggregate finished");

    for row in rows {
        println!("{}", Bson::Document(row).into_relaxed_extjson());
    }
    Ok(())
}
