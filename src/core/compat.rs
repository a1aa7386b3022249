use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

use encoding_rs::SHIFT_JIS;

use crate::config::config::ConverterConfig;
use crate::core::detect::SourceEncoding;

// 1 文字が Shift_JIS を往復しても変化しないかを確認する。
// 表現できない文字（encode が置換を報告した場合）も非互換とみなす。
pub fn char_roundtrips_sjis(c: char) -> bool {
    let mut buf = [0u8; 4];
    let s = c.encode_utf8(&mut buf);
    let (encoded, _, had_unmappable) = SHIFT_JIS.encode(s);
    if had_unmappable {
        return false;
    }
    let (decoded, had_errors) = SHIFT_JIS.decode_without_bom_handling(&encoded);
    !had_errors && *decoded == *s
}

// ファイルを読み取り用デコーダでストリーム復号しながら、
// Shift_JIS で表現できない文字が 1 つでもあるかを調べる。
// 最初の非互換文字で打ち切る。I/O や復号の失敗は安全側に倒して
// 非互換あり（true）として返す。
pub fn check_sjis_compatibility_stream(
    path: &Path,
    encoding: &SourceEncoding,
    config: &ConverterConfig,
) -> bool {
    scan_stream(path, encoding, config).unwrap_or(true)
}

fn scan_stream(path: &Path, encoding: &SourceEncoding, config: &ConverterConfig) -> io::Result<bool> {
    let mut decoder = match encoding.decoder() {
        Some(decoder) => decoder,
        None => return Ok(true),
    };

    let mut reader = BufReader::new(File::open(path)?);
    let mut buf = vec![0u8; config.compat_check_size];
    let mut text = String::new();

    loop {
        let n = reader.read(&mut buf)?;
        let last = n == 0;

        text.clear();
        text.reserve(decoder.max_utf8_buffer_length(n).unwrap_or(n * 4 + 16));
        // 容量を確保済みのため 1 回の呼び出しで入力を消費しきる
        let _ = decoder.decode_to_string(&buf[..n], &mut text, last);

        for c in text.chars() {
            if !char_roundtrips_sjis(c) {
                return Ok(true);
            }
        }

        if last {
            return Ok(false);
        }
    }
}
