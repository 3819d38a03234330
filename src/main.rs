use clap::{Parser, Subcommand};
use parquet_hive_check::engine::sql::SqlEngine;
use parquet_hive_check::runner::{TimestampUnit, VerifyArgsBuilder, run_verify};

#[derive(Parser, Clone)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Subcommand)]
enum Command {
    Verify {
        /// Query engine host
        #[arg(long, default_value = "hive-server")]
        engine_host: String,

        /// Query engine port
        #[arg(long, default_value = "10000")]
        engine_port: u16,

        /// Database username
        #[arg(short, long, default_value = "hive")]
        username: String,

        /// Database name
        #[arg(long, default_value = "default")]
        database: String,

        /// Store URL (hfs://..., file://..., or a directory path).
        /// A temporary directory is used if not specified.
        #[arg(short, long)]
        store_url: Option<String>,

        /// Dataset id the files are written under
        #[arg(short, long, default_value = "test")]
        dataset_id: String,

        /// External table name
        #[arg(short, long, default_value = "test")]
        table: String,

        /// Partition configuration (format: source[:string],source2)
        #[arg(short, long)]
        partition_on: Option<String>,

        /// Rows in the generated table
        #[arg(short, long, default_value = "100")]
        rows: usize,

        /// How many copies of the table to write
        #[arg(long, default_value = "1")]
        copies: usize,

        /// Unit of the integer timestamps the engine returns (s, ms, us, ns)
        #[arg(long, default_value = "us")]
        timestamp_unit: String,

        /// Column to sort both row sets on before comparison
        #[arg(long, default_value = "bytes")]
        sort_key: String,

        /// Include an unsigned 64-bit column (expected to fail fast)
        #[arg(long)]
        include_uint64: bool,

        /// Keep a temporary store directory when the run fails
        #[arg(long)]
        keep_data: bool,

        /// Print the report as JSON instead of a summary line
        #[arg(long)]
        json: bool,

        /// Quiet mode - minimal output, only show the result
        #[arg(short, long)]
        quiet: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    match args.command {
        Command::Verify {
            engine_host,
            engine_port,
            username,
            database,
            store_url,
            dataset_id,
            table,
            partition_on,
            rows,
            copies,
            timestamp_unit,
            sort_key,
            include_uint64,
            keep_data,
            json,
            quiet,
        } => {
            run_verifier(
                engine_host,
                engine_port,
                username,
                database,
                store_url,
                dataset_id,
                table,
                partition_on,
                rows,
                copies,
                timestamp_unit,
                sort_key,
                include_uint64,
                keep_data,
                json,
                quiet,
            )
            .await?;
        }
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
async fn run_verifier(
    engine_host: String,
    engine_port: u16,
    username: String,
    database: String,
    store_url: Option<String>,
    dataset_id: String,
    table: String,
    partition_on: Option<String>,
    rows: usize,
    copies: usize,
    timestamp_unit: String,
    sort_key: String,
    include_uint64: bool,
    keep_data: bool,
    json: bool,
    quiet: bool,
) -> anyhow::Result<()> {
    // Initialize tracing based on quiet mode
    use tracing_subscriber::{EnvFilter, FmtSubscriber};
    let filter = if quiet {
        EnvFilter::new("parquet_hive_check=warn,sqlx=off")
    } else {
        EnvFilter::new("parquet_hive_check=info,sqlx=off")
    };
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    let _ = tracing::subscriber::set_global_default(subscriber);

    if !quiet && !json {
        println!("Parquet/Hive Compatibility Check");
        println!("================================");
        println!("Engine: {}:{}", engine_host, engine_port);
        println!("Dataset: {}", dataset_id);
        println!("Table: {}", table);
        println!();
    }

    let partition_requests = if let Some(ref raw) = partition_on {
        cli::parse_partition_spec(raw).map_err(|e| {
            anyhow::anyhow!(
                "Failed to parse partition configuration: {}\n\
                 Example: --partition-on \"date_:string,int32\"",
                e
            )
        })?
    } else {
        Vec::new()
    };

    let unit = TimestampUnit::parse(&timestamp_unit)?;

    let verify_args = VerifyArgsBuilder::default()
        .dataset_id(dataset_id)
        .table_name(table)
        .store_url(store_url)
        .rows(rows)
        .copies(copies)
        .partition_on(partition_requests)
        .engine_timestamp_unit(unit)
        .sort_key(sort_key)
        .include_uint64(include_uint64)
        .keep_data_on_failure(keep_data)
        .build()?;

    let mut engine = SqlEngine::connect(&engine_host, engine_port, &username, &database).await?;
    let report = run_verify(verify_args, &mut engine).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!();
        println!("{}", report.summary());
        println!("Dataset root: {}", report.dataset_root);
        println!("Duration: {}ms", report.duration_ms);
    }

    Ok(())
}

/// CLI utility functions for parsing command-line arguments
mod cli {
    use parquet_hive_check::engine::HiveType;
    use parquet_hive_check::runner::PartitionRequest;

    /// Parse a partition configuration string "source[:TYPE],source2" into
    /// partition requests. The only supported type override is STRING, which
    /// casts the source values to text for partitioning.
    pub fn parse_partition_spec(raw: &str) -> anyhow::Result<Vec<PartitionRequest>> {
        let mut requests = Vec::new();

        for part in raw.split(',') {
            let part = part.trim();
            if part.is_empty() {
                anyhow::bail!("Empty partition entry in '{}'", raw);
            }

            match part.split_once(':') {
                None => requests.push(PartitionRequest {
                    source: part.to_string(),
                    cast_to_text: false,
                }),
                Some((source, type_name)) => {
                    let source = source.trim();
                    if source.is_empty() {
                        anyhow::bail!("Partition source cannot be empty in '{}'", part);
                    }
                    match HiveType::parse(type_name) {
                        Some(HiveType::String) => requests.push(PartitionRequest {
                            source: source.to_string(),
                            cast_to_text: true,
                        }),
                        Some(other) => anyhow::bail!(
                            "Unsupported partition type override '{}': only STRING is supported",
                            other.as_ddl()
                        ),
                        None => anyhow::bail!("Unknown DDL type '{}'", type_name.trim()),
                    }
                }
            }
        }

        Ok(requests)
    }

}
