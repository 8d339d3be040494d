use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("設定ディレクトリが見つかりません (CLOUDKIT_HOME で指定できます)")]
    ConfigDirNotFound,

    #[error("settings.yaml の読み込みに失敗しました: {0}")]
    InvalidSettings(#[from] serde_yaml::Error),

    #[error("IO エラー: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
