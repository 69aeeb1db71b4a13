use clap::Parser;
use tracing_subscriber::EnvFilter;
use waystore_core::layout::ALL_BLOCKS;
use waystore_core::{populate, DataLayout, Storage, StorageConfig, BLOCK_NAMES};

/// Stage routing data into shared memory and hot-swap it under attached readers
#[derive(Parser, Debug)]
#[command(name = "waystore", version, about)]
struct Args {
    /// Base path of the dataset, e.g. /data/map for /data/map.names etc.
    base: std::path::PathBuf,

    /// Seconds to wait for the monitor mutex before forcibly resetting it;
    /// negative means wait forever
    #[arg(long, default_value_t = -1)]
    max_wait: i32,

    /// Print the planned layout instead of publishing
    #[arg(long)]
    list: bool,
}

fn main() -> std::process::ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let config = StorageConfig::new(args.base);

    if args.list {
        return list_layout(&config);
    }

    match Storage::new(config).run(args.max_wait) {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            std::process::ExitCode::FAILURE
        }
    }
}

fn list_layout(config: &StorageConfig) -> std::process::ExitCode {
    let mut layout = DataLayout::default();
    if let Err(e) = populate::populate_layout(config, &mut layout) {
        tracing::error!("{e}");
        return std::process::ExitCode::FAILURE;
    }

    for (index, id) in ALL_BLOCKS.iter().enumerate() {
        println!(
            "{:<34} {:>12} entries {:>14} bytes",
            BLOCK_NAMES[index],
            layout.entries(*id),
            layout.byte_size(*id)
        );
    }
    println!(
        "{:<34} {:>29} bytes",
        "TOTAL (header + frames)",
        DataLayout::HEADER_SIZE as u64 + layout.total_size()
    );
    std::process::ExitCode::SUCCESS
}
