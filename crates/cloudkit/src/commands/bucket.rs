use super::unsupported;
use cloudkit_core::render::{print_section, write_log};
use cloudkit_core::{target_buckets, CancellationToken, CloudProvider, Options};
use colored::Colorize;
use std::path::Path;

const USAGE: &str = "使い方: cloudkit bucket list <bucket|all> / cloudkit bucket total <bucket|all>";

pub async fn handle(
    provider: &dyn CloudProvider,
    options: &Options,
    save: bool,
    log_dir: &Path,
    cancel: &CancellationToken,
) -> anyhow::Result<()> {
    let (action, args) = options.metadata();
    let Some(name) = args.first() else {
        anyhow::bail!("バケット名を指定してください\n{}", USAGE);
    };
    if action != "list" && action != "total" {
        anyhow::bail!("不明なサブコマンド: '{}'\n{}", action, USAGE);
    }

    let admin = provider
        .bucket_admin()
        .ok_or_else(|| unsupported(provider, "bucket dump"))?;
    let buckets = target_buckets(provider, name, options.region(), cancel).await?;
    if buckets.is_empty() {
        println!("{}", "バケットが見つかりませんでした".dimmed());
        return Ok(());
    }

    if action == "list" {
        let mut objects = Vec::new();
        for bucket in &buckets {
            if cancel.is_cancelled() {
                break;
            }
            tracing::info!("List objects in {} ...", bucket.bucket_name);
            match admin.list_objects(bucket).await {
                Ok(found) => objects.extend(found),
                Err(e) => tracing::warn!("{}: {}", bucket.bucket_name, e),
            }
        }
        print_section("Objects", &objects);
        if save && !objects.is_empty() {
            let path = write_log(log_dir, provider.name(), "object", &objects)?;
            println!("{} {}", "✓ 保存しました:".green(), path.display());
        }
    } else {
        let mut totals = Vec::new();
        for bucket in &buckets {
            if cancel.is_cancelled() {
                break;
            }
            match admin.total_objects(bucket).await {
                Ok(total) => totals.push(total),
                Err(e) => tracing::warn!("{}: {}", bucket.bucket_name, e),
            }
        }
        print_section("Bucket totals", &totals);
        if save && !totals.is_empty() {
            let path = write_log(log_dir, provider.name(), "bucket_total", &totals)?;
            println!("{} {}", "✓ 保存しました:".green(), path.display());
        }
    }
    Ok(())
}
