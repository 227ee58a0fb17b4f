use std::io::Write;
use std::time::Duration;

use anyhow::{Context, Result};
use mason_layout::{CancelToken, GridConfig, LayoutResult, MeasureCache};
use mason_runtime::{ChangeReason, Coordinator};
use serde::Serialize;

use crate::cli::Input;
use crate::items::ItemSet;

fn load(input: &Input) -> Result<(GridConfig, ItemSet)> {
    let config = GridConfig::load(&input.config)
        .with_context(|| format!("Failed to load grid config {}", input.config.display()))?;
    let items = ItemSet::load(&input.items)?;
    Ok((config, items))
}

/// Pack once, synchronously.
pub fn pack(input: &Input, constraint: Option<f32>) -> Result<LayoutResult<String>> {
    let (config, items) = load(input)?;
    let mut request = items.request(&config);
    if let Some(extent) = constraint {
        request = request.constraint(extent);
    }
    Ok(request.pack(&MeasureCache::shared(), &CancelToken::new())?)
}

/// One line of `replay` output.
#[derive(Debug, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
enum ReplayLine<'a> {
    /// A render call and the layout it returned.
    Render { constraint: f32, lanes: Vec<f32> },
    /// Background work committed a new layout.
    Commit {
        generation: u64,
        constraint: f32,
        layout: &'a LayoutResult<String>,
    },
}

fn emit(out: &mut impl Write, line: &ReplayLine<'_>) -> Result<()> {
    serde_json::to_writer(&mut *out, line)?;
    writeln!(out)?;
    Ok(())
}

/// Render once per width, `interval` apart, printing every render and every
/// committed background re-pack. Stops once nothing has committed for `settle`.
pub async fn replay(
    input: &Input,
    widths: &[f32],
    interval: Duration,
    settle: Duration,
    out: &mut impl Write,
) -> Result<usize> {
    let (config, items) = load(input)?;
    let base = items.request(&config);
    let mut coordinator = Coordinator::new(config.tracking)?;
    let mut commits = 0;

    for &width in widths {
        let result = coordinator.on_render(base.with_constraint(width));
        emit(out, &ReplayLine::Render { constraint: width, lanes: result.lane_extents() })?;

        let pause = tokio::time::sleep(interval);
        tokio::pin!(pause);
        loop {
            tokio::select! {
                _ = &mut pause => break,
                change = coordinator.next_change() => match change {
                    Some(reason) => {
                        emit_commit(&coordinator, reason, out)?;
                        commits += 1;
                    }
                    None => break,
                },
            }
        }
    }

    while let Ok(Some(reason)) = tokio::time::timeout(settle, coordinator.next_change()).await {
        emit_commit(&coordinator, reason, out)?;
        commits += 1;
    }

    Ok(commits)
}

fn emit_commit(coordinator: &Coordinator<String>, reason: ChangeReason, out: &mut impl Write) -> Result<()> {
    let ChangeReason::Recomputed { generation, constraint } = reason else {
        return Ok(());
    };
    if let Some(layout) = coordinator.result() {
        emit(out, &ReplayLine::Commit { generation, constraint, layout: layout.as_ref() })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use tempfile::TempDir;

    fn write_input(dir: &Path, config: &str) -> Input {
        let config_path = dir.join("grid.json");
        let items_path = dir.join("items.json");
        std::fs::write(&config_path, config).unwrap();
        std::fs::write(
            &items_path,
            r#"[{"id":"a","extent":50},{"id":"b","extent":50},{"id":"c","extent":50},{"id":"d","extent":50},{"id":"e","extent":50}]"#,
        )
        .unwrap();
        Input { config: config_path, items: items_path }
    }

    fn lines(out: &[u8]) -> Vec<serde_json::Value> {
        std::str::from_utf8(out)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    #[test]
    fn test_pack_uses_config_and_override() {
        let dir = TempDir::new().unwrap();
        let input = write_input(dir.path(), r#"{"item_spacing":8.0,"constraint":120.0}"#);

        assert_eq!(pack(&input, None).unwrap().lane_extents(), vec![108.0, 108.0, 50.0]);
        assert_eq!(pack(&input, Some(300.0)).unwrap().lane_extents(), vec![282.0]);
    }

    #[test]
    fn test_pack_missing_config() {
        let dir = TempDir::new().unwrap();
        let mut input = write_input(dir.path(), "{}");
        input.config = dir.path().join("absent.json");

        let err = pack(&input, None).unwrap_err();
        assert!(err.to_string().starts_with("Failed to load grid config"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_replay_immediate_commits_nothing() {
        let dir = TempDir::new().unwrap();
        let input = write_input(dir.path(), r#"{"item_spacing":8.0,"tracking":{"mode":"immediate"}}"#);
        let mut out = Vec::new();

        let commits = replay(
            &input,
            &[120.0, 300.0],
            Duration::from_millis(10),
            Duration::from_millis(100),
            &mut out,
        )
        .await
        .unwrap();

        assert_eq!(commits, 0);
        let lines = lines(&out);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1]["event"], "render");
        assert_eq!(lines[1]["lanes"], serde_json::json!([282.0]));
    }

    #[tokio::test(start_paused = true)]
    async fn test_replay_debounce_commits_last_width() {
        let dir = TempDir::new().unwrap();
        let input = write_input(
            dir.path(),
            r#"{"item_spacing":8.0,"tracking":{"mode":"debounce","quiet_ms":300}}"#,
        );
        let mut out = Vec::new();

        let commits = replay(
            &input,
            &[300.0, 280.0, 250.0, 120.0],
            Duration::from_millis(50),
            Duration::from_secs(2),
            &mut out,
        )
        .await
        .unwrap();

        assert_eq!(commits, 1);
        let lines = lines(&out);
        let commit = lines.last().unwrap();
        assert_eq!(commit["event"], "commit");
        assert_eq!(commit["constraint"], 120.0);
        assert_eq!(commit["layout"]["kind"], "rows");
        assert_eq!(commit["layout"]["lanes"].as_array().unwrap().len(), 3);
    }
}
