use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};

/// Maps a level name to a filter. Unknown names mean `Info`.
pub fn parse_level(log_level: &str) -> log::LevelFilter {
    match log_level.to_lowercase().as_str() {
        "trace" => log::LevelFilter::Trace,
        "debug" => log::LevelFilter::Debug,
        "warn" => log::LevelFilter::Warn,
        "error" => log::LevelFilter::Error,
        "off" => log::LevelFilter::Off,
        _ => log::LevelFilter::Info,
    }
}

/// Installs the global logger: stdout plus, when `log_dir` is given, a
/// timestamped `<app_name>_<time>.log` file in that directory.
///
/// Older log files of the same application are removed so only the newest
/// one survives. Returns the path of the file being written, if any.
///
/// # Errors
/// Fails if the directory cannot be created, the file cannot be opened, or a
/// global logger is already installed.
pub fn setup_logging(app_name: &str, log_dir: Option<&Path>, log_level: &str) -> Result<Option<PathBuf>> {
    let mut dispatch = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{}[{}][{}] {}",
                chrono::Local::now().format("[%Y-%m-%d %H:%M:%S]"),
                record.target(),
                record.level(),
                message
            ))
        })
        .level(parse_level(log_level))
        .chain(std::io::stdout());

    let mut log_path = None;
    if let Some(log_dir) = log_dir {
        if !log_dir.exists() {
            fs::create_dir_all(log_dir)?;
        }

        let log_file_name = format!("{}_{}.log", app_name, chrono::Local::now().format("%Y-%m-%d_%H-%M-%S"));
        let path = log_dir.join(log_file_name);
        dispatch = dispatch.chain(fern::log_file(&path)?);

        // Clean up old log files, keeping only the one just opened
        rotate_logs(app_name, log_dir)?;
        log_path = Some(path);
    }

    dispatch.apply()?;
    Ok(log_path)
}

/// Deletes all but the newest `<app_name>_*.log` file in `log_dir`.
fn rotate_logs(app_name: &str, log_dir: &Path) -> Result<()> {
    let prefix = format!("{}_", app_name);
    let mut log_files: Vec<PathBuf> = fs::read_dir(log_dir)?
        .filter_map(|res| res.ok())
        .map(|e| e.path())
        .filter(|p| {
            p.extension().is_some_and(|ext| ext == "log")
                && p.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.starts_with(&prefix))
        })
        .collect();

    // Timestamped names sort chronologically; newest first.
    log_files.sort_by(|a, b| b.file_name().cmp(&a.file_name()));

    for old_file in log_files.iter().skip(1) {
        if let Err(e) = fs::remove_file(old_file) {
            eprintln!("Failed to delete old log file {}: {}", old_file.display(), e);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("DEBUG"), log::LevelFilter::Debug);
        assert_eq!(parse_level("warn"), log::LevelFilter::Warn);
        assert_eq!(parse_level("fatal"), log::LevelFilter::Info);
    }

    #[test]
    fn test_rotate_keeps_newest_of_same_app() {
        let dir = tempdir().expect("Failed to create temporary directory");
        for name in [
            "dict_2024-01-01_00-00-00.log",
            "dict_2024-03-01_00-00-00.log",
            "dict_2024-02-01_00-00-00.log",
            "other_2020-01-01_00-00-00.log",
            "dict_notes.txt",
        ] {
            fs::write(dir.path().join(name), "x").unwrap();
        }

        rotate_logs("dict", dir.path()).unwrap();

        let mut remaining: Vec<String> = fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect();
        remaining.sort();

        assert_eq!(
            remaining,
            vec![
                "dict_2024-03-01_00-00-00.log".to_string(),
                "dict_notes.txt".to_string(),
                "other_2020-01-01_00-00-00.log".to_string(),
            ]
        );
    }
}
