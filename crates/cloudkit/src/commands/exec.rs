use super::unsupported;
use cloudkit_core::CloudProvider;
use colored::Colorize;

pub async fn handle(
    provider: &dyn CloudProvider,
    instance_id: &str,
    command: &str,
) -> anyhow::Result<()> {
    let runner = provider
        .command_runner()
        .ok_or_else(|| unsupported(provider, "exec-command"))?;

    println!("{}", format!("{} でコマンドを実行中...", instance_id).blue());
    println!("  {}", command.cyan());

    let output = runner.run_command(instance_id, command).await?;

    println!();
    println!("{}", "✓ 実行完了".green().bold());
    print!("{}", output);
    if !output.ends_with('\n') {
        println!();
    }
    Ok(())
}
