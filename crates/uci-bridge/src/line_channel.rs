//! 行単位の入出力チャネル。

use std::io::{self, BufRead, BufWriter, Write};

/// エンジンの stdin 側。1 行書くたびに flush する。
pub struct LineWriter<W: Write> {
    inner: BufWriter<W>,
}

impl<W: Write> LineWriter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            inner: BufWriter::new(inner),
        }
    }

    pub fn write_line(&mut self, msg: &str) -> io::Result<()> {
        log::trace!("> {msg}");
        self.inner.write_all(msg.as_bytes())?;
        self.inner.write_all(b"\n")?;
        self.inner.flush()
    }

    pub fn get_ref(&self) -> &W {
        self.inner.get_ref()
    }
}

/// エンジンの stdout 側を行の列として読む。
///
/// 読み出しは遅延かつ一度きり（再開不可）。EOF か読み取りエラーで終わる。
pub fn received_lines<R: BufRead>(reader: R) -> impl Iterator<Item = String> {
    reader.lines().map_while(|line| match line {
        Ok(l) => Some(l),
        Err(e) => {
            log::debug!("engine output read error: {e}");
            None
        }
    })
}
