//! PDF loading for RAG ingestion.
//!
//! Every `*.pdf` file directly inside the source directory is read page by
//! page. A file that cannot be opened or parsed is skipped with a warning so
//! one bad document never aborts a batch.

use std::fs;
use std::path::{Path, PathBuf};

use lopdf::Document;
use thiserror::Error;

use super::models::{DocumentPage, PageMetadata};

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("Cannot read source directory {path:?}: {source}")]
    SourceDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed PDF {path:?}: {source}")]
    Pdf {
        path: PathBuf,
        #[source]
        source: lopdf::Error,
    },

    #[error("Text extraction failed for {path:?} page {page}: {source}")]
    Extract {
        path: PathBuf,
        page: u32,
        #[source]
        source: lopdf::Error,
    },
}

/// Pages loaded from a directory along with the files that were skipped.
#[derive(Debug, Default)]
pub struct LoaderReport {
    pub pages: Vec<DocumentPage>,
    pub files_loaded: usize,
    /// (path, reason) for every file that could not be read
    pub skipped: Vec<(PathBuf, String)>,
}

/// Load the pages of all PDFs in `dir`.
pub fn load_directory(dir: &Path) -> Result<Vec<DocumentPage>, LoaderError> {
    load_directory_with_report(dir).map(|report| report.pages)
}

/// Load the pages of all PDFs in `dir`, reporting skipped files.
///
/// Files are visited in path order; pages keep their in-file order.
pub fn load_directory_with_report(dir: &Path) -> Result<LoaderReport, LoaderError> {
    let mut report = LoaderReport::default();

    for path in list_pdf_files(dir)? {
        match load_pdf(&path) {
            Ok(pages) => {
                log::info!("Loaded {} page(s) from {:?}", pages.len(), path);
                report.files_loaded += 1;
                report.pages.extend(pages);
            }
            Err(e) => {
                log::warn!("Skipping unreadable PDF {:?}: {}", path, e);
                report.skipped.push((path, e.to_string()));
            }
        }
    }

    Ok(report)
}

/// Load every page of a single PDF.
pub fn load_pdf(path: &Path) -> Result<Vec<DocumentPage>, LoaderError> {
    let bytes = fs::read(path).map_err(|source| LoaderError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let document = Document::load_mem(&bytes).map_err(|source| LoaderError::Pdf {
        path: path.to_path_buf(),
        source,
    })?;

    // Page numbers are 1-based and the map iterates in page order
    let mut pages = Vec::new();
    for page_number in document.get_pages().into_keys() {
        let text = document
            .extract_text(&[page_number])
            .map_err(|source| LoaderError::Extract {
                path: path.to_path_buf(),
                page: page_number,
                source,
            })?;

        pages.push(DocumentPage::new(
            text,
            PageMetadata::new(path, page_number - 1),
        ));
    }

    Ok(pages)
}

/// Paths of the `*.pdf` files directly inside `dir`, sorted.
fn list_pdf_files(dir: &Path) -> Result<Vec<PathBuf>, LoaderError> {
    let entries = fs::read_dir(dir).map_err(|source| LoaderError::SourceDir {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                log::warn!("Error accessing entry in {:?}: {}", dir, e);
                continue;
            }
        };
        let path = entry.path();
        if path.is_file() && is_pdf(&path) {
            files.push(path);
        }
    }

    files.sort();
    Ok(files)
}

fn is_pdf(path: &Path) -> bool {
    path.extension()
        .map_or(false, |ext| ext.eq_ignore_ascii_case("pdf"))
}
