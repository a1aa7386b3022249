use std::env;
use std::io;
use std::path::{Path, PathBuf};

use crate::config::config::ConverterConfig;

// 出力先のパスとファイル名を決める。変換元と同じディレクトリに
// `<stem>_sjis.<ext>`（置換が発生する場合は `<stem>_sjisx.<ext>`）を置く。
// 元のディレクトリが消えている場合はカレントディレクトリに退避する。
pub fn generate_output_filename(
    path: &Path,
    has_incompatible_chars: bool,
    config: &ConverterConfig,
) -> io::Result<(PathBuf, String)> {
    let abs = std::path::absolute(path)?;

    let dir = match abs.parent() {
        Some(parent) if !parent.as_os_str().is_empty() && parent.is_dir() => parent.to_path_buf(),
        _ => env::current_dir()?,
    };

    let stem = abs
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "出力ファイル名の生成に失敗しました"))?;

    let suffix = if has_incompatible_chars {
        config.sjisx_suffix
    } else {
        config.sjis_suffix
    };

    let filename = match abs.extension().and_then(|e| e.to_str()) {
        Some(ext) => format!("{}{}.{}", stem, suffix, ext),
        None => format!("{}{}", stem, suffix),
    };

    Ok((dir.join(&filename), filename))
}
