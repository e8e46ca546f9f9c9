//! Append-only log of generated test cases.
//!
//! Each record holds the input points and the locally computed hull in the
//! wire text format:
//!
//! ```text
//! POINTS: 3,-7 12,40 -5,5
//! HULL: -5,5 3,-7 12,40
//! ---
//! ```

use crate::geometry::Point;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

pub struct TestLog {
    path: PathBuf,
    writer: BufWriter<File>,
}

impl TestLog {
    /// Truncate `path` and start a new run.
    pub fn create(path: &Path) -> io::Result<Self> {
        let mut writer = BufWriter::new(File::create(path)?);
        writeln!(writer, "# run started {}", chrono::Local::now().to_rfc3339())?;
        writer.flush()?;

        Ok(TestLog {
            path: path.to_path_buf(),
            writer,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one test case.
    pub fn record(&mut self, points: &[Point], hull: &[Point]) -> io::Result<()> {
        write!(self.writer, "POINTS:")?;
        for p in points {
            write!(self.writer, " {}", p)?;
        }
        write!(self.writer, "\nHULL:")?;
        for p in hull {
            write!(self.writer, " {}", p)?;
        }
        write!(self.writer, "\n---\n")?;
        self.writer.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_cases() {
        let path = std::env::temp_dir().join(format!("jarvis-test-log-{}.log", std::process::id()));

        let mut log = TestLog::create(&path).unwrap();
        log.record(
            &[Point::new(0, 0), Point::new(2, 0), Point::new(0, 2)],
            &[Point::new(0, 0), Point::new(2, 0), Point::new(0, 2)],
        )
        .unwrap();
        log.record(&[Point::new(1, 1)], &[]).unwrap();

        let contents = std::fs::read_to_string(log.path()).unwrap();
        let body: Vec<&str> = contents.lines().skip(1).collect();
        assert!(contents.starts_with("# run started "));
        assert_eq!(
            body,
            vec![
                "POINTS: 0,0 2,0 0,2",
                "HULL: 0,0 2,0 0,2",
                "---",
                "POINTS: 1,1",
                "HULL:",
                "---",
            ]
        );

        // A new run starts from an empty file
        drop(log);
        TestLog::create(&path).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap().lines().count(), 1);

        std::fs::remove_file(&path).unwrap();
    }
}
