mod commands;
mod inventory;

use clap::{Args, Parser, Subcommand};
use cloudkit_config::Settings;
use cloudkit_core::{CancellationToken, CredentialCache};
use colored::Colorize;

#[derive(Parser)]
#[command(name = "cloudkit")]
#[command(about = "複数クラウドの資産を、ひとつのコマンドで棚卸しする。", long_about = None)]
struct Cli {
    #[command(flatten)]
    auth: AuthArgs,

    #[command(subcommand)]
    command: Commands,
}

/// 認証情報と対象リージョン
#[derive(Args, Debug, Clone)]
pub struct AuthArgs {
    /// プロバイダ (alibaba, aws)
    #[arg(short, long, global = true, env = "CLOUDKIT_PROVIDER")]
    pub provider: Option<String>,

    /// アクセスキー
    #[arg(long, global = true, env = "CLOUDKIT_ACCESS_KEY", hide_env_values = true)]
    pub access_key: Option<String>,

    /// シークレットキー
    #[arg(long, global = true, env = "CLOUDKIT_SECRET_KEY", hide_env_values = true)]
    pub secret_key: Option<String>,

    /// STS セキュリティトークン（一時クレデンシャル使用時）
    #[arg(
        long,
        global = true,
        env = "CLOUDKIT_SECURITY_TOKEN",
        hide_env_values = true
    )]
    pub security_token: Option<String>,

    /// 対象リージョン（省略時は all = 全リージョン）
    #[arg(short, long, global = true, env = "CLOUDKIT_REGION")]
    pub region: Option<String>,

    /// キャッシュ済みクレデンシャルのフィンガープリント
    /// （`cloudkit creds list` で確認）
    #[arg(long, global = true)]
    pub cred: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// クラウド資産を一覧表示
    Cloudlist {
        /// 列挙するリソース種別（カンマ区切り）
        /// balance, compute, storage, identity, database, dns, messaging
        #[arg(short, long, value_delimiter = ',')]
        kinds: Vec<String>,
        /// 結果をログファイルにも保存する
        #[arg(short, long)]
        save: bool,
    },
    /// インスタンス上でシェルコマンドを実行
    ExecCommand {
        /// インスタンス ID
        instance_id: String,
        /// 実行するコマンド
        #[arg(trailing_var_arg = true, required = true)]
        command: Vec<String>,
    },
    /// バケット内のオブジェクトを調査
    ///
    /// 例: cloudkit bucket list all / cloudkit bucket total my-bucket
    Bucket {
        /// list <bucket|all> または total <bucket|all>
        #[arg(trailing_var_arg = true, required = true)]
        metadata: Vec<String>,
        /// 結果をログファイルにも保存する
        #[arg(short, long)]
        save: bool,
    },
    /// ユーザー・ロールを管理
    ///
    /// 例: cloudkit user add <user> <password> / del <user> /
    /// shadow <role> <account-id> / delrole <role>
    User {
        /// add / del / shadow / delrole と引数
        #[arg(trailing_var_arg = true, required = true)]
        metadata: Vec<String>,
    },
    /// セキュリティイベントを取得・処理
    ///
    /// 例: cloudkit event dump / cloudkit event whitelist <id>...
    Event {
        /// dump または whitelist <id>...
        #[arg(trailing_var_arg = true, required = true)]
        metadata: Vec<String>,
        /// 結果をログファイルにも保存する
        #[arg(short, long)]
        save: bool,
    },
    /// キャッシュ済みクレデンシャルを管理
    #[command(subcommand)]
    Creds(CredsCommands),
    /// バージョン情報を表示
    Version,
}

#[derive(Subcommand)]
pub enum CredsCommands {
    /// キャッシュ済みクレデンシャルを一覧表示
    List,
    /// クレデンシャルにメモを付ける
    Note {
        /// フィンガープリント
        fingerprint: String,
        /// メモ
        note: String,
    },
    /// クレデンシャルをキャッシュから削除
    Delete {
        /// フィンガープリント
        fingerprint: String,
    },
}

/// Ctrl-C で cancel を発火させる
fn watch_interrupt(cancel: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!(
                "{}",
                "中断しました。現在のリージョンの処理が終わり次第停止します...".yellow()
            );
            cancel.cancel();
        }
    });
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // ログは stderr、結果表は stdout
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    // Versionコマンドは設定ファイル不要
    if matches!(cli.command, Commands::Version) {
        println!("cloudkit {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let config_dir = cloudkit_config::get_config_dir()?;
    let settings = Settings::load(&config_dir)?;
    let log_dir = settings.resolve_log_dir(&config_dir);
    let cache = CredentialCache::new(&config_dir);
    let mut store = cache.load().await?;

    // creds はクラウドに接続しない
    if let Commands::Creds(cmd) = cli.command {
        commands::creds::handle(cmd, &mut store)?;
        cache.save(&store).await?;
        return Ok(());
    }

    let cancel = CancellationToken::new();
    watch_interrupt(cancel.clone());

    let metadata = match &cli.command {
        Commands::Bucket { metadata, .. }
        | Commands::User { metadata }
        | Commands::Event { metadata, .. } => Some(metadata.join(" ")),
        _ => None,
    };
    let options = inventory::build_options(&cli.auth, &store, metadata)?;

    let provider = inventory::connect(&options, &mut store).await;
    // 接続に成功したクレデンシャルは、後続の処理が失敗しても保存する
    cache.save(&store).await?;
    let provider = provider?;

    match cli.command {
        Commands::Cloudlist { kinds, save } => {
            let kinds = if kinds.is_empty() {
                settings.kinds.clone()
            } else {
                kinds
            };
            let save = save || settings.save_output;
            commands::cloudlist::handle(provider.as_ref(), &kinds, save, &log_dir, &cancel)
                .await?;
        }
        Commands::ExecCommand {
            instance_id,
            command,
        } => {
            commands::exec::handle(provider.as_ref(), &instance_id, &command.join(" ")).await?;
        }
        Commands::Bucket { save, .. } => {
            let save = save || settings.save_output;
            commands::bucket::handle(provider.as_ref(), &options, save, &log_dir, &cancel)
                .await?;
        }
        Commands::User { .. } => {
            commands::user::handle(provider.as_ref(), &options).await?;
        }
        Commands::Event { save, .. } => {
            let save = save || settings.save_output;
            commands::event::handle(provider.as_ref(), &options, save, &log_dir, &cancel)
                .await?;
        }
        Commands::Creds(_) => {
            unreachable!("Creds is handled before connecting");
        }
        Commands::Version => {
            unreachable!("Version is handled before config loading");
        }
    }

    Ok(())
}
