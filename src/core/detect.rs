use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use encoding_rs::{Decoder, Encoding, EUC_JP, ISO_2022_JP, SHIFT_JIS, UTF_16BE, UTF_16LE, UTF_8, WINDOWS_1252};
use log::{debug, info};

use crate::config::config::ConverterConfig;
use crate::config::ports::{CharsetSniffer, SnifferGuess};
use crate::core::classify::is_binary_file;

// 検出対象の文字コード。閉じた集合に正規化し、集合外の名前は
// Other として大文字化したまま持ち回る。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceEncoding {
    Utf8,
    Utf8Bom,
    Utf16Le,
    Utf16Be,
    ShiftJis,
    EucJp,
    Iso2022Jp,
    Windows1252,
    Iso8859_1,
    Ascii,
    Other(String),
}

impl SourceEncoding {
    // 判定器が返す名前を大文字小文字を無視して正規化する
    pub fn from_detector_name(name: &str) -> SourceEncoding {
        match name.to_ascii_lowercase().as_str() {
            "utf-8" | "utf8" => SourceEncoding::Utf8,
            "utf-8-sig" | "utf8-sig" => SourceEncoding::Utf8Bom,
            "utf-16le" | "utf16le" => SourceEncoding::Utf16Le,
            "utf-16be" | "utf16be" => SourceEncoding::Utf16Be,
            "shift_jis" | "shift-jis" | "sjis" | "cp932" | "windows-31j" => SourceEncoding::ShiftJis,
            "euc-jp" | "eucjp" => SourceEncoding::EucJp,
            "iso-2022-jp" | "iso2022jp" => SourceEncoding::Iso2022Jp,
            "windows-1252" => SourceEncoding::Windows1252,
            "iso-8859-1" => SourceEncoding::Iso8859_1,
            "ascii" => SourceEncoding::Ascii,
            _ => SourceEncoding::Other(name.to_ascii_uppercase()),
        }
    }

    // 読み取り用デコーダ。Shift_JIS は encoding_rs の WHATWG 版
    // （windows-31j 相当の拡張表）で寛容に読む。BOM を剥がすのは
    // UTF-8-SIG のみで、その他は BOM を文字として扱う。
    pub fn decoder(&self) -> Option<Decoder> {
        match self {
            SourceEncoding::Utf8 | SourceEncoding::Ascii => Some(UTF_8.new_decoder_without_bom_handling()),
            SourceEncoding::Utf8Bom => Some(UTF_8.new_decoder_with_bom_removal()),
            SourceEncoding::Utf16Le => Some(UTF_16LE.new_decoder_without_bom_handling()),
            SourceEncoding::Utf16Be => Some(UTF_16BE.new_decoder_without_bom_handling()),
            SourceEncoding::ShiftJis => Some(SHIFT_JIS.new_decoder_without_bom_handling()),
            SourceEncoding::EucJp => Some(EUC_JP.new_decoder_without_bom_handling()),
            SourceEncoding::Iso2022Jp => Some(ISO_2022_JP.new_decoder_without_bom_handling()),
            SourceEncoding::Windows1252 | SourceEncoding::Iso8859_1 => {
                Some(WINDOWS_1252.new_decoder_without_bom_handling())
            }
            SourceEncoding::Other(name) => Encoding::for_label(name.to_ascii_lowercase().as_bytes())
                .map(|e| e.new_decoder_without_bom_handling()),
        }
    }
}

impl fmt::Display for SourceEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SourceEncoding::Utf8 => "UTF-8",
            SourceEncoding::Utf8Bom => "UTF-8-SIG（BOMあり）",
            SourceEncoding::Utf16Le => "UTF-16LE",
            SourceEncoding::Utf16Be => "UTF-16BE",
            SourceEncoding::ShiftJis => "SHIFT_JIS",
            SourceEncoding::EucJp => "EUC-JP",
            SourceEncoding::Iso2022Jp => "ISO-2022-JP",
            SourceEncoding::Windows1252 => "WINDOWS-1252",
            SourceEncoding::Iso8859_1 => "ISO-8859-1",
            SourceEncoding::Ascii => "ASCII",
            SourceEncoding::Other(name) => name,
        };
        f.write_str(label)
    }
}

// 検出が結果を返せなかった理由。Empty のみ呼び出し側で
// 正常なスキップとして扱われる。
#[derive(Debug, Clone, PartialEq)]
pub enum DetectFailure {
    Empty,
    TooLarge(u64),
    Binary,
    InvalidBom,
    Undetected,
    LowConfidence { name: String, confidence: f32 },
    PermissionDenied,
    Io(String),
}

impl fmt::Display for DetectFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DetectFailure::Empty => write!(f, "空ファイルです"),
            DetectFailure::TooLarge(size) => {
                write!(f, "ファイルサイズが大きすぎます（{}MB）", size / (1024 * 1024))
            }
            DetectFailure::Binary => write!(f, "バイナリファイルです"),
            DetectFailure::InvalidBom => write!(f, "UTF-8 BOMがありますが、内容が不正です"),
            DetectFailure::Undetected => write!(f, "文字コードを検出できませんでした"),
            DetectFailure::LowConfidence { name, confidence } => {
                write!(f, "文字コードの検出信頼性が低いです ({}, confidence={:.2})", name, confidence)
            }
            DetectFailure::PermissionDenied => write!(f, "ファイルにアクセスできません"),
            DetectFailure::Io(message) => write!(f, "エンコーディング検出エラー: {}", message),
        }
    }
}

fn io_failure(e: io::Error) -> DetectFailure {
    if e.kind() == io::ErrorKind::PermissionDenied {
        DetectFailure::PermissionDenied
    } else {
        DetectFailure::Io(e.to_string())
    }
}

// chardet（universalchardet 移植）を使う本番アダプタ
pub struct ChardetSniffer;

impl CharsetSniffer for ChardetSniffer {
    fn sniff(&self, sample: &[u8]) -> Option<SnifferGuess> {
        let (name, confidence, _language) = chardet::detect(sample);
        if name.is_empty() {
            return None;
        }
        Some(SnifferGuess { name, confidence })
    }
}

fn is_strict_utf8(bytes: &[u8]) -> bool {
    std::str::from_utf8(bytes).is_ok()
}

// ファイルの文字コードを判定する。サンプルは先頭の固定サイズのみで、
// ファイル全体は走査しない。BOM → バイナリ判定 → 統計的判定の順に
// 評価し、信頼度が閾値以下なら判定失敗として返す。
pub fn detect_encoding(
    path: &Path,
    config: &ConverterConfig,
    sniffer: &dyn CharsetSniffer,
) -> Result<SourceEncoding, DetectFailure> {
    let file_size = std::fs::metadata(path).map_err(io_failure)?.len();
    if file_size > config.max_file_size {
        return Err(DetectFailure::TooLarge(file_size));
    }
    if file_size == 0 {
        return Err(DetectFailure::Empty);
    }

    let sample_size = file_size.min(config.detection_sample_size as u64);
    let mut sample = Vec::with_capacity(sample_size as usize);
    File::open(path)
        .map_err(io_failure)?
        .take(sample_size)
        .read_to_end(&mut sample)
        .map_err(io_failure)?;
    if sample.is_empty() {
        return Err(DetectFailure::Empty);
    }

    if sample.starts_with(&[0xFF, 0xFE]) {
        return Ok(SourceEncoding::Utf16Le);
    }
    if sample.starts_with(&[0xFE, 0xFF]) {
        return Ok(SourceEncoding::Utf16Be);
    }

    if sample.starts_with(&[0xEF, 0xBB, 0xBF]) {
        return if is_strict_utf8(&sample[3..]) {
            Ok(SourceEncoding::Utf8Bom)
        } else {
            Err(DetectFailure::InvalidBom)
        };
    }

    if is_binary_file(path) {
        return Err(DetectFailure::Binary);
    }

    let guess = sniffer.sniff(&sample).ok_or(DetectFailure::Undetected)?;
    debug!("統計的判定: {} (confidence={:.2})", guess.name, guess.confidence);
    let normalized = SourceEncoding::from_detector_name(&guess.name);

    // ASCII は UTF-8 の部分集合のため常に UTF-8 に昇格する
    if matches!(normalized, SourceEncoding::Utf8 | SourceEncoding::Ascii) && is_strict_utf8(&sample) {
        return Ok(SourceEncoding::Utf8);
    }

    if guess.confidence > config.confidence_threshold {
        // Shift_JIS と判定されてもサンプルが厳密な UTF-8 として読める
        // 場合は UTF-8 を優先する（既知の曖昧さを解消する既存挙動）
        if normalized == SourceEncoding::ShiftJis && is_strict_utf8(&sample) {
            return Ok(SourceEncoding::Utf8);
        }
        info!("文字コードを検出: {} ({})", normalized, path.display());
        return Ok(normalized);
    }

    Err(DetectFailure::LowConfidence {
        name: guess.name,
        confidence: guess.confidence,
    })
}
