use std::io;
use std::path::Path;

use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use log::error;

use crate::action::interactive::ConsoleConfirm;
use crate::config::config::{Cli, ConverterConfig};
use crate::core::detect::ChardetSniffer;
use crate::core::pipeline::{convert_to_sjis, format_result_message, ConversionResult};

pub fn process_args() -> io::Result<()> {
    let cli = Cli::parse();
    setup_logging(&cli.log_level);
    let config = ConverterConfig::default();
    run_batch(&cli.files, &config, cli.no_progress);
    Ok(())
}

pub fn setup_logging(log_level: &str) {
    let filter = match log_level {
        "warn" => log::LevelFilter::Warn,
        "error" => log::LevelFilter::Error,
        _ => log::LevelFilter::Info,
    };
    env_logger::Builder::new().filter_level(filter).init();
}

fn create_progress_bar(total: u64, no_progress: bool) -> ProgressBar {
    if no_progress {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{msg} [{bar:40}] {pos}/{len}")
            .unwrap()
            .progress_chars("##-"),
    );
    pb
}

// 1 パスにつき 1 回パイプラインを呼び、結果を集計して表示する。
// 個々のファイルの失敗はバッチ全体を止めない。
pub fn run_batch(files: &[String], config: &ConverterConfig, no_progress: bool) {
    let total = files.len();
    println!("変換処理を開始します...");
    println!("変換後のファイルは、変換前のフォルダに保存されます。\n");

    let pb = create_progress_bar(total as u64, no_progress);
    let sniffer = ChardetSniffer;
    let confirm = ConsoleConfirm::new(&pb);

    let mut results: Vec<(String, ConversionResult)> = Vec::with_capacity(total);
    for (i, filepath) in files.iter().enumerate() {
        let original_filename = Path::new(filepath)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| format!("ファイル{}", i + 1));
        pb.set_message(format!("処理中 ({}/{}): {}", i + 1, total, original_filename));

        let result = convert_to_sjis(filepath, config, &sniffer, &confirm);
        if !result.success && !result.skipped {
            error!("変換失敗: {} ({})", filepath, result.message);
        }
        results.push((original_filename, result));
        pb.inc(1);
    }
    pb.finish_and_clear();

    print_summary(&results, total);
}

fn print_summary(results: &[(String, ConversionResult)], total: usize) {
    let mut converted_count = 0;
    let mut skipped_count = 0;
    let mut failed_count = 0;
    for (_, result) in results {
        if result.skipped {
            skipped_count += 1;
        } else if result.success && result.converted {
            converted_count += 1;
        } else {
            failed_count += 1;
        }
    }

    println!("\n{}", "=".repeat(50));
    println!("=== 変換結果 ===");
    for (filename, result) in results {
        println!("{}", format_result_message(result, filename));
    }

    let mut parts = Vec::new();
    if converted_count > 0 {
        parts.push(format!("{}ファイル変換", converted_count));
    }
    if skipped_count > 0 {
        parts.push(format!("{}ファイルスキップ", skipped_count));
    }
    if failed_count > 0 {
        parts.push(format!("{}ファイル失敗", failed_count));
    }
    let summary = if parts.is_empty() {
        "処理対象なし".to_string()
    } else {
        parts.join("、")
    };

    println!("\n処理完了（{}ファイル中 {}）", total, summary);
    println!("{}", "=".repeat(50));
}
