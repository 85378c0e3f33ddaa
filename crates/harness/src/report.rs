//! Metrics artifact I/O.

use crate::errors::{Result, SimulationError};
use crate::metrics::Metrics;
use serde::Serialize;
use std::fs;
use std::path::Path;
use tracing::info;

/// Write `metrics` as four-space indented JSON, creating parent directories.
pub fn write_metrics(path: &Path, metrics: &Metrics) -> Result<()> {
    let io_err = |source| SimulationError::Report {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_err)?;
    }

    let mut body = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut body, formatter);
    metrics.serialize(&mut serializer)?;

    fs::write(path, body).map_err(io_err)?;
    info!("metrics saved to {}", path.display());
    Ok(())
}

pub fn read_metrics(path: &Path) -> Result<Metrics> {
    let raw = fs::read(path).map_err(|source| SimulationError::Report {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(serde_json::from_slice(&raw)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::MetricsCollector;
    use tempfile::TempDir;

    #[test]
    fn test_write_then_read() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("metrics.json");
        let metrics = MetricsCollector::new(0, 10).finish(true);

        write_metrics(&path, &metrics).unwrap();
        let raw = fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\n    \"authorized_latencies\""));
        assert_eq!(read_metrics(&path).unwrap(), metrics);
    }
}
