use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

fn read_head(path: &Path, limit: u64) -> io::Result<Vec<u8>> {
    let mut head = Vec::with_capacity(limit as usize);
    File::open(path)?.take(limit).read_to_end(&mut head)?;
    Ok(head)
}

// 先頭 1024 バイトにヌルバイトがあればバイナリと判定する。
// UTF-16 の BOM で始まるファイルは正当にヌルバイトを含むため除外。
// 読み取りに失敗した場合は安全側に倒してバイナリ扱いとする。
pub fn is_binary_file(path: &Path) -> bool {
    match read_head(path, 1024) {
        Ok(head) => {
            if head.is_empty() {
                return false;
            }
            if head.starts_with(&[0xFF, 0xFE]) || head.starts_with(&[0xFE, 0xFF]) {
                return false;
            }
            head.contains(&0x00)
        }
        Err(_) => true,
    }
}

pub fn has_utf8_bom(path: &Path) -> bool {
    match read_head(path, 3) {
        Ok(head) => head == [0xEF, 0xBB, 0xBF],
        Err(_) => false,
    }
}
