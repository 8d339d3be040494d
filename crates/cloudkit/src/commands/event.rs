use super::unsupported;
use cloudkit_core::render::{print_section, write_log};
use cloudkit_core::{CancellationToken, CloudProvider, Options};
use colored::Colorize;
use std::path::Path;

const USAGE: &str = "使い方: cloudkit event dump / cloudkit event whitelist <event-id>...";

pub async fn handle(
    provider: &dyn CloudProvider,
    options: &Options,
    save: bool,
    log_dir: &Path,
    cancel: &CancellationToken,
) -> anyhow::Result<()> {
    let admin = provider
        .event_admin()
        .ok_or_else(|| unsupported(provider, "security events"))?;
    let (action, args) = options.metadata();

    match action.as_str() {
        "dump" => {
            let events = admin.dump_events(cancel).await?;
            if events.is_empty() {
                println!("{}", "イベントは見つかりませんでした".dimmed());
                return Ok(());
            }
            print_section("Events", &events);
            if save {
                let path = write_log(log_dir, provider.name(), "eventdump", &events)?;
                println!("{} {}", "✓ 保存しました:".green(), path.display());
            }
        }
        "whitelist" => {
            if args.is_empty() {
                anyhow::bail!("イベント ID を指定してください\n{}", USAGE);
            }
            admin.whitelist_events(&args).await?;
            println!(
                "{}",
                format!("✓ {} 件のイベントを誤検知として処理しました", args.len()).green()
            );
        }
        other => anyhow::bail!("不明なサブコマンド: '{}'\n{}", other, USAGE),
    }
    Ok(())
}
