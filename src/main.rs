use anyhow::{bail, Context};
use settings_scrub::{Cleaner, Config, CONFIG_FILE_NAME};
use std::path::PathBuf;

fn config_path() -> anyhow::Result<Option<PathBuf>> {
    let exe = std::env::current_exe().context("cannot locate executable")?;
    Ok(exe
        .parent()
        .map(|dir| dir.join(CONFIG_FILE_NAME))
        .filter(|path| path.is_file()))
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::new()
        .filter_module("settings_scrub", log::LevelFilter::Info)
        .parse_default_env()
        .target(env_logger::Target::Stderr)
        .format_timestamp(None)
        .format_module_path(false)
        .format_target(false)
        .init();

    let config = match config_path()? {
        Some(path) => {
            log::debug!("using {}", path.display());
            Config::load(&path).with_context(|| format!("loading {}", path.display()))?
        }
        None => Config::default(),
    };
    let cleaner = Cleaner::from_config(&config)?;
    let report = cleaner
        .run()
        .with_context(|| format!("cleaning {}", cleaner.base().display()))?;

    let failures = report.failures().count();
    if failures > 0 {
        for failure in report.failures() {
            log::error!("{}: {}", failure.path.display(), failure.error);
        }
        bail!("{} file(s) could not be cleaned", failures);
    }
    Ok(())
}
