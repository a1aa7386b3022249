use std::io;

use dialoguer::Confirm;
use indicatif::ProgressBar;

use crate::config::ports::OverwritePort;

// 出力先が既に存在する場合の上書き確認。'n' と入力が得られない場合は
// 上書きしない。Ctrl-C による中断は Err(Interrupted) として返す。
pub fn prompt_overwrite(filename: &str) -> io::Result<bool> {
    match Confirm::new()
        .with_prompt(format!("ファイル '{}' は既に存在します。上書きしますか？", filename))
        .default(false)
        .interact()
    {
        Ok(answer) => Ok(answer),
        Err(dialoguer::Error::IO(e)) if e.kind() == io::ErrorKind::Interrupted => Err(e),
        Err(_) => Ok(false),
    }
}

// バッチ処理中はプログレスバーを一時停止してからプロンプトを出す
pub struct ConsoleConfirm<'a> {
    pb: &'a ProgressBar,
}

impl<'a> ConsoleConfirm<'a> {
    pub fn new(pb: &'a ProgressBar) -> Self {
        ConsoleConfirm { pb }
    }
}

impl OverwritePort for ConsoleConfirm<'_> {
    fn confirm(&self, filename: &str) -> io::Result<bool> {
        self.pb.suspend(|| prompt_overwrite(filename))
    }
}
