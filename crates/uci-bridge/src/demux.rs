//! エンジン出力を専用スレッドで吸い上げ、無制限キューへ流す。
//!
//! 読み手（ハンドシェイク／結果収集）のタイミングとストリームの読み取りを切り離す。
//! プロセス終了の検知はここでは行わない（EOF で黙って終わるだけ）。

use std::io::BufRead;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{Receiver, unbounded};

use crate::line_channel::received_lines;

/// `reader` を読み切るスレッドを起動し、受信側を返す。
///
/// 各行は前後の空白を落とし、空行は捨てる。順序は保たれ、重複・欠落はない。
pub fn spawn_output_reader<R>(
    reader: R,
    label: &str,
) -> std::io::Result<(Receiver<String>, JoinHandle<()>)>
where
    R: BufRead + Send + 'static,
{
    let (tx, rx) = unbounded::<String>();
    let thread_label = label.to_string();
    let handle = thread::Builder::new()
        .name(format!("{label}-stdout"))
        .spawn(move || {
            for line in received_lines(reader) {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                log::trace!("< {line}");
                if tx.send(line.to_string()).is_err() {
                    log::debug!("{thread_label}: output receiver dropped");
                    return;
                }
            }
            log::debug!("{thread_label}: engine output closed");
        })?;
    Ok((rx, handle))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn reader_trims_and_preserves_order() {
        let input = Cursor::new("  id name x  \n\n   \ninfo score cp 10\r\nbestmove e2e4\n");
        let (rx, handle) = spawn_output_reader(input, "test").unwrap();
        handle.join().unwrap();
        let lines: Vec<String> = rx.try_iter().collect();
        assert_eq!(lines, vec!["id name x", "info score cp 10", "bestmove e2e4"]);
    }

    #[test]
    fn channel_disconnects_after_eof() {
        let (rx, handle) = spawn_output_reader(Cursor::new("uciok\n"), "test").unwrap();
        handle.join().unwrap();
        assert_eq!(rx.recv().unwrap(), "uciok");
        assert!(rx.recv().is_err());
    }
}
