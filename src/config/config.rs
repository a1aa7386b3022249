use clap::Parser;

#[derive(Parser, Clone)]
#[command(
    name = "sjis_converter",
    about = "テキストファイルの文字コードをShift_JISに変換するツール",
    long_about = "テキストファイルの文字コードを検出し、Shift_JISに変換した新しいファイルを生成するツールです。\n対応文字コード: UTF-8、UTF-16、EUC-JP、ISO-2022-JPなど。対応ファイルはテキストベースのファイル（例: csv, txt, html）で、バイナリファイルは変換できません。\n変換後のファイルは元のファイルと同じフォルダに保存されます。\n通常変換:           元のファイル名_sjis.拡張子\n代替文字に置換あり: 元のファイル名_sjisx.拡張子\nShift_JISで表現できない文字（例: 一部の特殊記号、丸囲み数字など）は代替文字[？]に置換されることがあります。\n使用方法は `--help` を参照してください。",
    arg_required_else_help = true
)]
pub struct Cli {
    /// 変換対象のファイル（複数指定で一括処理）
    #[arg(required = true)]
    pub files: Vec<String>,
    #[arg(long, default_value_t = false)]
    pub no_progress: bool,
    #[arg(long, default_value = "info", value_parser = ["info", "warn", "error"])]
    pub log_level: String,
}

// 変換パイプライン全体で共有する不変の設定値
#[derive(Debug, Clone)]
pub struct ConverterConfig {
    pub max_file_size: u64,
    pub detection_sample_size: usize,
    pub chunk_size: usize,
    pub compat_check_size: usize,
    pub confidence_threshold: f32,
    pub sjis_suffix: &'static str,
    pub sjisx_suffix: &'static str,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        ConverterConfig {
            max_file_size: 100 * 1024 * 1024,
            detection_sample_size: 65536,
            chunk_size: 65536,
            compat_check_size: 1024,
            confidence_threshold: 0.8,
            sjis_suffix: "_sjis",
            sjisx_suffix: "_sjisx",
        }
    }
}
