use std::env;
use std::fmt;
use std::fs::{self, File};
use std::io::{self, BufReader, Read, Write};
use std::path::{Path, PathBuf};

use encoding_rs::SHIFT_JIS;
use log::{debug, warn};
use tempfile::Builder;

use crate::config::config::ConverterConfig;
use crate::core::detect::SourceEncoding;

#[derive(Debug, Clone, PartialEq)]
pub enum ConvertError {
    PermissionDenied,
    DiskFull,
    AlreadyExists,
    TempFile(String),
    Io(String),
}

impl fmt::Display for ConvertError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConvertError::PermissionDenied => write!(f, "ファイルの保存権限がありません"),
            ConvertError::DiskFull => write!(f, "ディスク容量が不足しています"),
            ConvertError::AlreadyExists => write!(f, "出力ファイルが既に存在します"),
            ConvertError::TempFile(message) => write!(f, "一時ファイルの作成に失敗: {}", message),
            ConvertError::Io(message) => write!(f, "ファイルの保存/OSエラー: {}", message),
        }
    }
}

fn map_io(e: io::Error) -> ConvertError {
    match e.kind() {
        io::ErrorKind::PermissionDenied => ConvertError::PermissionDenied,
        io::ErrorKind::StorageFull => ConvertError::DiskFull,
        _ => ConvertError::Io(e.to_string()),
    }
}

// Shift_JIS で表現できない文字を '?' に置換しながらエンコードする。
// encoding_rs の encode は数値文字参照に置換するため、置換が報告された
// チャンクのみ 1 文字ずつエンコードし直す。
fn encode_sjis_lossy(text: &str, out: &mut Vec<u8>) {
    let (encoded, _, had_unmappable) = SHIFT_JIS.encode(text);
    if !had_unmappable {
        out.extend_from_slice(&encoded);
        return;
    }
    let mut buf = [0u8; 4];
    for c in text.chars() {
        let s = c.encode_utf8(&mut buf);
        let (bytes, _, unmappable) = SHIFT_JIS.encode(s);
        if unmappable {
            out.push(b'?');
        } else {
            out.extend_from_slice(&bytes);
        }
    }
}

fn backup_path(output: &Path) -> PathBuf {
    let mut os = output.as_os_str().to_os_string();
    os.push(".backup");
    PathBuf::from(os)
}

// 入力をストリーム復号しながら Shift_JIS で一時ファイルに書き出し、
// 出力先へアトミックに昇格する。既存の出力は `.backup` に退避し、
// 一時ファイルは成功・失敗を問わずスコープ終了時に必ず片付く。
pub fn convert_file_stream(
    input: &Path,
    output: &Path,
    encoding: &SourceEncoding,
    config: &ConverterConfig,
) -> Result<(), ConvertError> {
    let output_dir = match output.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => env::current_dir().map_err(map_io)?,
    };
    if !output_dir.is_dir() {
        fs::create_dir_all(&output_dir).map_err(|e| ConvertError::TempFile(e.to_string()))?;
    }

    let mut temp = Builder::new()
        .prefix("sjis_conv_")
        .suffix(".tmp")
        .tempfile_in(&output_dir)
        .map_err(|e| ConvertError::TempFile(e.to_string()))?;

    let mut decoder = encoding
        .decoder()
        .ok_or_else(|| ConvertError::Io(format!("未対応の文字コードです: {}", encoding)))?;

    let mut reader = BufReader::new(File::open(input).map_err(map_io)?);
    let mut buf = vec![0u8; config.chunk_size];
    let mut text = String::new();
    let mut encoded = Vec::with_capacity(config.chunk_size);

    loop {
        let n = reader.read(&mut buf).map_err(map_io)?;
        let last = n == 0;

        text.clear();
        text.reserve(decoder.max_utf8_buffer_length(n).unwrap_or(n * 4 + 16));
        let _ = decoder.decode_to_string(&buf[..n], &mut text, last);

        encoded.clear();
        encode_sjis_lossy(&text, &mut encoded);
        temp.write_all(&encoded).map_err(map_io)?;

        if last {
            break;
        }
    }
    temp.flush().map_err(map_io)?;

    // 既存の出力を退避してから昇格する。退避中に元が消えていた場合は
    // 退避不要として続行する。
    if output.exists() {
        let backup = backup_path(output);
        if backup.exists() {
            if let Err(e) = fs::remove_file(&backup) {
                warn!("古いバックアップを削除できませんでした: {} ({})", backup.display(), e);
            }
        }
        match fs::rename(output, &backup) {
            Ok(()) => debug!("既存の出力を退避: {}", backup.display()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(map_io(e)),
        }
    }

    match temp.persist_noclobber(output) {
        Ok(_) => Ok(()),
        Err(e) => {
            // e.file の drop で一時ファイルは削除される
            if e.error.kind() == io::ErrorKind::AlreadyExists {
                Err(ConvertError::AlreadyExists)
            } else {
                Err(map_io(e.error))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ConverterConfig {
        ConverterConfig::default()
    }

    fn sjis(text: &str) -> Vec<u8> {
        SHIFT_JIS.encode(text).0.into_owned()
    }

    #[test]
    fn encodes_lossless_text_verbatim() {
        let mut out = Vec::new();
        encode_sjis_lossy("こんにちは、世界", &mut out);
        assert_eq!(out, sjis("こんにちは、世界"));
    }

    #[test]
    fn substitutes_question_mark_for_unmappable_chars() {
        let mut out = Vec::new();
        encode_sjis_lossy("あ😀い", &mut out);
        let mut expected = sjis("あ");
        expected.push(b'?');
        expected.extend_from_slice(&sjis("い"));
        assert_eq!(out, expected);
    }

    #[test]
    fn converts_utf8_to_sjis_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.txt");
        let output = dir.path().join("in_sjis.txt");
        fs::write(&input, "hello, 世界").unwrap();

        convert_file_stream(&input, &output, &SourceEncoding::Utf8, &config()).unwrap();
        assert_eq!(fs::read(&output).unwrap(), sjis("hello, 世界"));
        // 入力は変更されない
        assert_eq!(fs::read(&input).unwrap(), "hello, 世界".as_bytes());
    }

    #[test]
    fn converts_euc_jp_input() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.txt");
        let output = dir.path().join("in_sjis.txt");
        fs::write(&input, encoding_rs::EUC_JP.encode("日本語").0).unwrap();

        convert_file_stream(&input, &output, &SourceEncoding::EucJp, &config()).unwrap();
        assert_eq!(fs::read(&output).unwrap(), sjis("日本語"));
    }

    #[test]
    fn strips_utf8_bom_on_conversion() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.txt");
        let output = dir.path().join("in_sjis.txt");
        let mut bytes = vec![0xEF, 0xBB, 0xBF];
        bytes.extend_from_slice("テスト".as_bytes());
        fs::write(&input, bytes).unwrap();

        convert_file_stream(&input, &output, &SourceEncoding::Utf8Bom, &config()).unwrap();
        assert_eq!(fs::read(&output).unwrap(), sjis("テスト"));
    }

    #[test]
    fn existing_output_is_moved_to_backup() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.txt");
        let output = dir.path().join("in_sjis.txt");
        fs::write(&input, "new").unwrap();
        fs::write(&output, "old").unwrap();

        convert_file_stream(&input, &output, &SourceEncoding::Utf8, &config()).unwrap();
        assert_eq!(fs::read(&output).unwrap(), b"new");
        assert_eq!(fs::read(backup_path(&output)).unwrap(), b"old");
    }

    #[test]
    fn a_previous_backup_is_superseded() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.txt");
        let output = dir.path().join("in_sjis.txt");
        fs::write(&input, "newest").unwrap();
        fs::write(&output, "old").unwrap();
        fs::write(backup_path(&output), "older").unwrap();

        convert_file_stream(&input, &output, &SourceEncoding::Utf8, &config()).unwrap();
        assert_eq!(fs::read(backup_path(&output)).unwrap(), b"old");
    }

    #[test]
    fn missing_input_reports_an_error_and_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("missing.txt");
        let output = dir.path().join("missing_sjis.txt");

        let err = convert_file_stream(&input, &output, &SourceEncoding::Utf8, &config()).unwrap_err();
        assert!(matches!(err, ConvertError::Io(_)));
        assert!(!output.exists());
        // 一時ファイルが残っていないこと
        let leftovers: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn unknown_encoding_fails_without_output() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.txt");
        let output = dir.path().join("in_sjis.txt");
        fs::write(&input, "text").unwrap();

        let encoding = SourceEncoding::Other("X-UNKNOWN-CODEC".to_string());
        let err = convert_file_stream(&input, &output, &encoding, &config()).unwrap_err();
        assert!(matches!(err, ConvertError::Io(_)));
        assert!(!output.exists());
    }

    #[test]
    fn malformed_input_bytes_become_substitution() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.txt");
        let output = dir.path().join("in_sjis.txt");
        // 不正な UTF-8 列は U+FFFD に置換され、さらに '?' として書かれる
        fs::write(&input, b"ab\xFF\xFEcd").unwrap();

        convert_file_stream(&input, &output, &SourceEncoding::Utf8, &config()).unwrap();
        assert_eq!(fs::read(&output).unwrap(), b"ab??cd");
    }
}
