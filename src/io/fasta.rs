use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::error::{FinderError, Result};

#[derive(Debug, Clone)]
pub struct FastaRecord {
    pub id: String,
    pub desc: Option<String>,
    /// Uppercased, whitespace stripped.
    pub seq: Vec<u8>,
}

/// Streaming multi-FASTA reader. Lines before the first header are ignored.
pub struct FastaReader<R: BufRead> {
    reader: R,
    buf: String,
    done: bool,
    peek_header: Option<String>,
}

impl FastaReader<BufReader<File>> {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let fh = File::open(path).map_err(|e| {
            FinderError::Parse(format!("cannot open FASTA '{}': {}", path.display(), e))
        })?;
        Ok(Self::new(BufReader::new(fh)))
    }
}

impl<R: BufRead> FastaReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buf: String::new(),
            done: false,
            peek_header: None,
        }
    }

    fn read_line(&mut self) -> Result<bool> {
        self.buf.clear();
        let n = self.reader.read_line(&mut self.buf)?;
        if n == 0 {
            self.done = true;
        }
        Ok(n > 0)
    }

    /// 下一条记录的头行（去掉 `>`）；到达文件末尾时返回 None
    fn next_header(&mut self) -> Result<Option<String>> {
        if let Some(h) = self.peek_header.take() {
            return Ok(Some(h));
        }
        while !self.done {
            if !self.read_line()? {
                break;
            }
            if let Some(rest) = self.buf.strip_prefix('>') {
                return Ok(Some(rest.trim().to_string()));
            }
        }
        Ok(None)
    }

    /// 读到下一个头行为止；`keep` 为 false 时只跳过序列行，不做拷贝
    fn read_sequence(&mut self, keep: bool) -> Result<Vec<u8>> {
        let mut seq: Vec<u8> = Vec::new();
        while self.read_line()? {
            if let Some(rest) = self.buf.strip_prefix('>') {
                self.peek_header = Some(rest.trim().to_string());
                break;
            }
            if keep {
                seq.extend(
                    self.buf
                        .bytes()
                        .filter(|b| !b.is_ascii_whitespace())
                        .map(|b| b.to_ascii_uppercase()),
                );
            }
        }
        Ok(seq)
    }

    pub fn next_record(&mut self) -> Result<Option<FastaRecord>> {
        let header = match self.next_header()? {
            Some(h) => h,
            None => return Ok(None),
        };
        let (id, desc) = split_header(&header);
        let seq = self.read_sequence(true)?;
        Ok(Some(FastaRecord { id, desc, seq }))
    }

    /// Scan forward to the first record whose id is exactly `id`.
    /// Sequence lines of other records are skipped without being collected.
    pub fn find_record(&mut self, id: &str) -> Result<Option<FastaRecord>> {
        while let Some(header) = self.next_header()? {
            let (rec_id, desc) = split_header(&header);
            if rec_id == id {
                let seq = self.read_sequence(true)?;
                return Ok(Some(FastaRecord { id: rec_id, desc, seq }));
            }
            self.read_sequence(false)?;
        }
        Ok(None)
    }
}

fn split_header(header: &str) -> (String, Option<String>) {
    let mut parts = header.splitn(2, char::is_whitespace);
    let id = parts.next().unwrap_or("").to_string();
    let desc = parts
        .next()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());
    (id, desc)
}

impl<R: BufRead> Iterator for FastaReader<R> {
    type Item = Result<FastaRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_record().transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn parse_multi_record_fasta() {
        let data = b">NC_001416.1 Escherichia phage Lambda\nACgTNN\n>NC_001604.1\nAAA\n";
        let mut r = FastaReader::new(Cursor::new(&data[..]));

        let r1 = r.next_record().unwrap().unwrap();
        assert_eq!(r1.id, "NC_001416.1");
        assert_eq!(r1.desc.as_deref(), Some("Escherichia phage Lambda"));
        assert_eq!(r1.seq, b"ACGTNN");

        let r2 = r.next_record().unwrap().unwrap();
        assert_eq!(r2.id, "NC_001604.1");
        assert_eq!(r2.desc, None);
        assert_eq!(r2.seq, b"AAA");

        assert!(r.next_record().unwrap().is_none());
    }

    #[test]
    fn parse_crlf_and_leading_garbage() {
        let data = b"\n;comment\n>p1 desc\r\nAC g t n\r\n acgt\r\n>p2 \r\n N N N \r\n";
        let recs: Vec<FastaRecord> = FastaReader::new(Cursor::new(&data[..]))
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(recs.len(), 2);
        assert_eq!(recs[0].seq, b"ACGTNACGT");
        assert_eq!(recs[1].id, "p2");
        assert_eq!(recs[1].seq, b"NNN");
    }

    #[test]
    fn find_record_by_exact_id() {
        let data = b">a\nAAAA\n>ab\nCCCC\n>b\nGGGG\n";
        let mut r = FastaReader::new(Cursor::new(&data[..]));
        let rec = r.find_record("b").unwrap().unwrap();
        assert_eq!(rec.seq, b"GGGG");

        let mut r = FastaReader::new(Cursor::new(&data[..]));
        assert!(r.find_record("zz").unwrap().is_none());
    }

    #[test]
    fn find_record_skips_and_continues() {
        let data = b">a first
AAAA
AAAA
>b second
cc
cc
>c
GG
";
        let mut r = FastaReader::new(Cursor::new(&data[..]));
        let rec = r.find_record("b").unwrap().unwrap();
        assert_eq!(rec.desc.as_deref(), Some("second"));
        assert_eq!(rec.seq, b"CCCC");
        // 读取位置停在下一条记录的头行
        let next = r.next_record().unwrap().unwrap();
        assert_eq!(next.id, "c");
        assert_eq!(next.seq, b"GG");
        assert!(r.next_record().unwrap().is_none());
    }

    #[test]
    fn empty_record_at_eof() {
        let data = b">only\n";
        let mut r = FastaReader::new(Cursor::new(&data[..]));
        let rec = r.next_record().unwrap().unwrap();
        assert_eq!(rec.id, "only");
        assert!(rec.seq.is_empty());
        assert!(r.next_record().unwrap().is_none());
    }
}
