use std::path::Path;

use log::info;

use crate::config::config::ConverterConfig;
use crate::config::ports::{CharsetSniffer, OverwritePort};
use crate::core::compat::check_sjis_compatibility_stream;
use crate::core::convert::convert_file_stream;
use crate::core::detect::{detect_encoding, DetectFailure, SourceEncoding};
use crate::core::naming::generate_output_filename;

// 1 ファイルの変換結果。{success & converted, success & skipped, 失敗}
// のいずれか 1 つだけが成り立つ。
#[derive(Debug, Clone, Default)]
pub struct ConversionResult {
    pub success: bool,
    pub message: String,
    pub original_encoding: String,
    pub has_incompatible_chars: bool,
    pub converted: bool,
    pub skipped: bool,
}

// 変換パイプラインの唯一の入口。パス検証 → 文字コード検出 →
// 互換性走査 → 出力名決定 → （衝突時は上書き確認）→ アトミック変換
// の順に 1 ファイルを処理し、失敗を呼び出し元へ伝播させない。
pub fn convert_to_sjis(
    filepath: &str,
    config: &ConverterConfig,
    sniffer: &dyn CharsetSniffer,
    overwrite: &dyn OverwritePort,
) -> ConversionResult {
    let mut result = ConversionResult::default();

    let path = Path::new(filepath);
    if !path.exists() {
        result.message = "ファイルが見つかりません".to_string();
        return result;
    }

    let abs = match std::path::absolute(path) {
        Ok(abs) => abs,
        Err(e) => {
            result.message = format!("予期しないエラー: {}", e);
            return result;
        }
    };
    if !abs.is_file() {
        result.message = "有効なファイルパスではありません".to_string();
        return result;
    }

    let encoding = match detect_encoding(&abs, config, sniffer) {
        Ok(encoding) => encoding,
        Err(DetectFailure::Empty) => {
            result.success = true;
            result.skipped = true;
            result.original_encoding = "N/A".to_string();
            result.message = "空ファイルのためスキップ".to_string();
            return result;
        }
        Err(failure) => {
            result.message = failure.to_string();
            return result;
        }
    };

    result.original_encoding = encoding.to_string();

    if encoding == SourceEncoding::ShiftJis {
        result.success = true;
        result.skipped = true;
        result.message = "SHIFT_JISのためスキップ".to_string();
        return result;
    }

    result.has_incompatible_chars = check_sjis_compatibility_stream(&abs, &encoding, config);

    let (new_filepath, new_filename) =
        match generate_output_filename(&abs, result.has_incompatible_chars, config) {
            Ok(named) => named,
            Err(e) => {
                result.message = format!("出力ファイル名の生成に失敗しました: {}", e);
                return result;
            }
        };

    if new_filepath.exists() {
        match overwrite.confirm(&new_filename) {
            Ok(true) => {}
            Ok(false) => {
                result.success = true;
                result.skipped = true;
                result.message = "変換をキャンセルしました (上書きせず)".to_string();
                return result;
            }
            Err(_) => {
                result.message = "ユーザーによりキャンセルされました".to_string();
                return result;
            }
        }
    }

    match convert_file_stream(&abs, &new_filepath, &encoding, config) {
        Ok(()) => {
            info!("変換完了: {} ({} → SHIFT_JIS)", new_filename, encoding);
            result.success = true;
            result.converted = true;
            result.message = new_filename;
        }
        Err(e) => {
            result.message = e.to_string();
        }
    }

    result
}

// 1 ファイル分の結果表示行を組み立てる
pub fn format_result_message(result: &ConversionResult, original_filename: &str) -> String {
    if !result.success && !result.skipped {
        return format!("{} → 変換失敗 ({})", original_filename, result.message);
    }

    if result.skipped {
        return format!("{} → {}", original_filename, result.message);
    }

    let mut message = format!(
        "{} ({}) → {} (SHIFT_JISへ変換",
        original_filename, result.original_encoding, result.message
    );
    if result.has_incompatible_chars {
        message.push_str("、代替文字に置換あり");
    }
    message.push(')');
    message
}
