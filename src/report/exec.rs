use crate::cli::ExportConfig;
use crate::git::GitRepo;
use crate::model::{BucketRef, TopManifest, SCHEMA_VERSION};
use crate::report::assemble::{assemble_window, report_flags};
use crate::window::{self, Resolution, TimeRange, WindowBucket, WindowSpec};
use anyhow::Context;
use chrono::NaiveDateTime;
use console::style;
use serde_json::json;
use std::path::{Path, PathBuf};

pub fn execute(cfg: ExportConfig) -> anyhow::Result<()> {
    let repo = GitRepo::open(cfg.repo.as_deref()).context("Failed to open git repository")?;
    let now = window::effective_now(window::parse_now_override(cfg.now_override.as_deref()));

    match window::resolve(&cfg.window, now)? {
        Resolution::Single(range) => run_single(&repo, &cfg, range, now),
        Resolution::Buckets(buckets) => run_multi(&repo, &cfg, buckets, now),
    }
}

fn run_single(
    repo: &GitRepo,
    cfg: &ExportConfig,
    range: TimeRange,
    now: NaiveDateTime,
) -> anyhow::Result<()> {
    let label = match &cfg.window {
        WindowSpec::Month(ym) => ym.clone(),
        _ => "window".to_string(),
    };

    if !cfg.full {
        let manifest = assemble_window(repo, cfg, &label, &range, None)?;
        let body = serde_json::to_string_pretty(&manifest)?;
        if cfg.out == "-" {
            println!("{body}");
        } else {
            let path = Path::new(&cfg.out);
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, body)?;
            eprintln!(
                "{} report for {} ({} commits) to {}",
                style("Wrote").green().bold(),
                label,
                manifest.count,
                cfg.out
            );
        }
        return Ok(());
    }

    let base = prepare_out_dir(&cfg.out, now)?;
    let manifest = assemble_window(repo, cfg, &label, &range, Some(&base))?;
    let file = format!("{label}/manifest-{label}.json");
    std::fs::write(base.join(&file), serde_json::to_string_pretty(&manifest)?)?;
    eprintln!(
        "{} {} commits for {}",
        style("Exported").green().bold(),
        manifest.count,
        label
    );
    println!(
        "{}",
        json!({ "dir": base.to_string_lossy(), "file": file })
    );
    Ok(())
}

fn run_multi(
    repo: &GitRepo,
    cfg: &ExportConfig,
    buckets: Vec<WindowBucket>,
    now: NaiveDateTime,
) -> anyhow::Result<()> {
    let base = prepare_out_dir(&cfg.out, now)?;
    eprintln!(
        "{} {} windows under {}",
        style("Exporting").green().bold(),
        buckets.len(),
        base.display()
    );

    let mut refs: Vec<BucketRef> = Vec::with_capacity(buckets.len());
    for bucket in &buckets {
        let label = &bucket.label;
        if cfg.full {
            let manifest = assemble_window(repo, cfg, label, &bucket.range, Some(&base))?;
            let file = format!("{label}/manifest-{label}.json");
            std::fs::write(base.join(&file), serde_json::to_string_pretty(&manifest)?)?;
            refs.push(BucketRef {
                label: label.clone(),
                range: manifest.range,
                file,
                dir: Some(label.clone()),
            });
        } else {
            let manifest = assemble_window(repo, cfg, label, &bucket.range, None)?;
            let file = format!("report-{label}.json");
            std::fs::write(base.join(&file), serde_json::to_string_pretty(&manifest)?)?;
            refs.push(BucketRef {
                label: label.clone(),
                range: manifest.range,
                file,
                dir: None,
            });
        }
    }

    let top = TopManifest {
        version: SCHEMA_VERSION,
        repo: repo.path().to_string_lossy().to_string(),
        generated_at: now.format("%Y-%m-%dT%H:%M:%S").to_string(),
        mode: if cfg.full { "full" } else { "simple" }.to_string(),
        flags: report_flags(cfg),
        buckets: refs,
    };
    std::fs::write(
        base.join("manifest.json"),
        serde_json::to_string_pretty(&top)?,
    )?;
    println!(
        "{}",
        json!({ "dir": base.to_string_lossy(), "manifest": "manifest.json" })
    );
    Ok(())
}

fn prepare_out_dir(out: &str, now: NaiveDateTime) -> anyhow::Result<PathBuf> {
    let base = if out == "-" {
        std::env::temp_dir().join(now.format("activity-%Y%m%d-%H%M%S").to_string())
    } else {
        PathBuf::from(out)
    };
    std::fs::create_dir_all(&base)
        .with_context(|| format!("Failed to create output directory {}", base.display()))?;
    Ok(base)
}
