use anyhow::Result;
use nemloader::{config::LoaderConfig, tracker::TrackerFile, Loader};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

const PREVIEW_ROWS: usize = 5;

fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_span_events(fmt::format::FmtSpan::CLOSE)
        .init();
    info!("startup");

    // ─── 2) load config ──────────────────────────────────────────────
    let config_path = std::env::var_os("NEMLOADER_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("nemloader.yaml"));
    let config = LoaderConfig::load(&config_path)?.with_env_overrides();
    config.validate()?;
    info!(
        data_dir = %config.data_dir.display(),
        tracker = %config.tracker.display(),
        "configured"
    );

    // ─── 3) refresh available files ──────────────────────────────────
    let extractor = TrackerFile::new(&config.tracker, &config.data_dir);
    let mut loader = Loader::new(extractor)
        .with_naming(config.naming())
        .with_split_options(config.split_options());
    loader.refresh()?;

    if let Some(range) = config.select.range_override(loader.time_range())? {
        info!(%range, "time range narrowed");
        loader.set_time_range(range);
    }

    // ─── 4) select + load ────────────────────────────────────────────
    let selected = loader.select(config.select.selection()).len();
    if selected == 0 {
        info!("nothing selected; exit");
        return Ok(());
    }
    info!(files = selected, "loading");
    let loaded = loader.load()?;

    // ─── 5) summary ──────────────────────────────────────────────────
    for (file, tables) in &loaded {
        for table in tables {
            info!(
                file = %file,
                table = %table.id,
                rows = table.num_rows(),
                columns = table.num_columns(),
                "table"
            );
            println!("{} / {}\n{}", file, table.id, table.preview(PREVIEW_ROWS)?);
        }
    }

    info!("all done");
    Ok(())
}
