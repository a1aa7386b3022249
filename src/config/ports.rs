use std::io;

// 統計的文字コード判定器の推定結果
#[derive(Debug, Clone, PartialEq)]
pub struct SnifferGuess {
    pub name: String,
    pub confidence: f32,
}

// 統計的文字コード判定の Port。サンプルのバイト列から
// {文字コード名, 信頼度} を返す外部ヒューリスティックの境界。
pub trait CharsetSniffer {
    fn sniff(&self, sample: &[u8]) -> Option<SnifferGuess>;
}

// 上書き確認の Port。Err(Interrupted) はユーザーによる中断を表し、
// 入力が得られない場合は Ok(false)（上書きしない）を返す。
pub trait OverwritePort {
    fn confirm(&self, filename: &str) -> io::Result<bool>;
}
