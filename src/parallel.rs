//! Parallel processing utilities using Rayon.
//!
//! Tokenizers share no state, so independent files parse fully in parallel:
//! each worker gets its own [`Tokenizer`](crate::tokenizer::Tokenizer)
//! instance and its own input handle.

use crate::reader::Result as CsvResult;
use rayon::prelude::*;
use std::path::PathBuf;

/// Minimum number of files before enabling parallelization. Below this
/// threshold, sequential processing is faster due to thread spawn overhead.
pub const PARALLEL_THRESHOLD: usize = 2;

/// Apply `op` to every file, in parallel, preserving input order.
///
/// Each invocation runs on its own worker with its own parser state; the
/// first error per file is returned in that file's slot.
pub fn map_files<F, T>(paths: &[PathBuf], op: F) -> Vec<CsvResult<T>>
where
    F: Fn(&PathBuf) -> CsvResult<T> + Sync + Send,
    T: Send,
{
    if paths.len() < PARALLEL_THRESHOLD {
        return paths.iter().map(op).collect();
    }
    paths.par_iter().map(op).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::read_rows;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_map_files_preserves_order() {
        let mut files = Vec::new();
        for i in 0..4 {
            let mut f = NamedTempFile::new().unwrap();
            writeln!(f, "file,{}", i).unwrap();
            files.push(f);
        }
        let paths: Vec<PathBuf> = files.iter().map(|f| f.path().to_path_buf()).collect();

        let results = map_files(&paths, |p| {
            let rows = read_rows(p)?;
            Ok(rows[0][1].clone())
        });

        let values: Vec<Vec<u8>> = results.into_iter().map(|r| r.unwrap()).collect();
        assert_eq!(values, vec![b"0".to_vec(), b"1".to_vec(), b"2".to_vec(), b"3".to_vec()]);
    }

    #[test]
    fn test_map_files_reports_per_file_errors() {
        let mut ok = NamedTempFile::new().unwrap();
        writeln!(ok, "a,b").unwrap();
        let paths = vec![
            ok.path().to_path_buf(),
            PathBuf::from("/nonexistent/sift-csv-test.csv"),
        ];

        let results = map_files(&paths, |p| read_rows(p));
        assert!(results[0].is_ok());
        assert!(results[1].is_err());
    }
}
