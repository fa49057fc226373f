//! Gene input from FASTA/FASTQ files
//!
//! Only the first record of a file is read, with transparent gzip
//! decompression. The gene is lowercased to match the generator's alphabet.

use crate::constants::NUCLEOTIDES;
use crate::gene::Gene;
use anyhow::{bail, Context, Result};
use needletail::parse_fastx_file;
use std::path::Path;

/// Read the first sequence of a FASTA/FASTQ file as a gene
///
/// # Errors
/// Returns error if:
/// - File cannot be opened or holds no record
/// - The first record is malformed
/// - The first record contains anything but A, C, G, T (either case)
pub fn read_gene<P: AsRef<Path>>(path: P) -> Result<Gene> {
    let path = path.as_ref();

    let mut reader = parse_fastx_file(path)
        .with_context(|| format!("Failed to open sequence file: {}", path.display()))?;
    let record = reader
        .next()
        .with_context(|| format!("No sequence found in {}", path.display()))?
        .with_context(|| format!("Failed to parse first record in {}", path.display()))?;

    let mut contents = record.seq().into_owned();
    contents.make_ascii_lowercase();
    if let Some(pos) = contents.iter().position(|b| !NUCLEOTIDES.contains(b)) {
        bail!(
            "Invalid DNA base '{}' at position {} in {}. Only A, C, G, T are allowed.",
            contents[pos] as char,
            pos,
            path.display()
        );
    }

    Ok(Gene::from_bytes(contents))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn fasta(contents: &str) -> Result<NamedTempFile> {
        let mut temp_file = NamedTempFile::new()?;
        write!(temp_file, "{contents}")?;
        temp_file.flush()?;
        Ok(temp_file)
    }

    #[test]
    fn test_read_gene_takes_first_record() -> Result<()> {
        let file = fasta(">gene1\nGATCGGCAGC\n>gene2\nTTTT\n")?;
        let gene = read_gene(file.path())?;
        assert_eq!(gene.as_bytes(), b"gatcggcagc");
        Ok(())
    }

    #[test]
    fn test_read_gene_ignores_later_records() -> Result<()> {
        let file = fasta(">gene1\nacgt\n>gene2\nNNNN\n")?;
        assert_eq!(read_gene(file.path())?.as_bytes(), b"acgt");
        Ok(())
    }

    #[test]
    fn test_read_gene_rejects_invalid_bases() -> Result<()> {
        let file = fasta(">gene1\nGATNNGCAGC\n")?;
        let err = read_gene(file.path()).unwrap_err();
        assert!(err.to_string().contains("position 3"));
        Ok(())
    }

    #[test]
    fn test_read_gene_missing_file() {
        assert!(read_gene("/nonexistent/gene.fa").is_err());
    }
}
