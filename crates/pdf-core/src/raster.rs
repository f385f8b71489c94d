//! Page rasterization through an external renderer

use crate::{PdfError, Result};
use std::path::{Path, PathBuf};
use std::process::Command;

/// Image encoding requested from the rasterizer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RasterFormat {
    #[default]
    Jpeg,
    Png,
}

impl RasterFormat {
    fn extension(self) -> &'static str {
        match self {
            RasterFormat::Jpeg => "jpg",
            RasterFormat::Png => "png",
        }
    }

    fn flag(self) -> &'static str {
        match self {
            RasterFormat::Jpeg => "-jpeg",
            RasterFormat::Png => "-png",
        }
    }
}

/// Renders every page of a PDF file to an encoded image
pub trait Rasterizer {
    /// Render all pages of `pdf` at `dpi`, returning JPEG or PNG bytes in page order
    fn rasterize(&self, pdf: &Path, dpi: u32) -> Result<Vec<Vec<u8>>>;
}

/// Poppler's `pdftoppm`
#[derive(Debug, Clone)]
pub struct Pdftoppm {
    program: PathBuf,
    format: RasterFormat,
}

impl Pdftoppm {
    /// Use the given `pdftoppm` executable
    pub fn new<P: Into<PathBuf>>(program: P) -> Self {
        Self {
            program: program.into(),
            format: RasterFormat::default(),
        }
    }

    /// Set the image encoding
    pub fn with_format(mut self, format: RasterFormat) -> Self {
        self.format = format;
        self
    }

    /// Find `pdftoppm` on `PATH`
    pub fn discover() -> Result<Self> {
        let candidate = Self::new("pdftoppm");
        if candidate.probe() {
            Ok(candidate)
        } else {
            Err(PdfError::RasterizerUnavailable(
                "pdftoppm not found on PATH - install poppler-utils or configure its path"
                    .to_string(),
            ))
        }
    }

    /// Use a configured program when given, otherwise discover one
    pub fn locate(program: Option<&Path>) -> Result<Self> {
        match program {
            Some(path) => {
                let candidate = Self::new(path);
                if candidate.probe() {
                    Ok(candidate)
                } else {
                    Err(PdfError::RasterizerUnavailable(format!(
                        "{} cannot be executed",
                        path.display()
                    )))
                }
            }
            None => Self::discover(),
        }
    }

    /// Path of the executable
    pub fn program(&self) -> &Path {
        &self.program
    }

    fn probe(&self) -> bool {
        let found = Command::new(&self.program).arg("-v").output().is_ok();
        if !found {
            log::debug!("{} not runnable", self.program.display());
        }
        found
    }
}

impl Rasterizer for Pdftoppm {
    fn rasterize(&self, pdf: &Path, dpi: u32) -> Result<Vec<Vec<u8>>> {
        let temp_dir = tempfile::tempdir()?;
        let prefix = temp_dir.path().join("page");

        log::debug!("Rasterizing {} at {} dpi", pdf.display(), dpi);
        let output = Command::new(&self.program)
            .arg(self.format.flag())
            .arg("-r")
            .arg(dpi.to_string())
            .arg(pdf)
            .arg(&prefix)
            .output()
            .map_err(|e| {
                PdfError::RasterizerUnavailable(format!("{}: {e}", self.program.display()))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(PdfError::RasterError(format!("pdftoppm failed: {}", stderr.trim())));
        }

        let mut pages: Vec<(u32, PathBuf)> = std::fs::read_dir(temp_dir.path())?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| {
                path.extension()
                    .map(|ext| ext == self.format.extension())
                    .unwrap_or(false)
            })
            .filter_map(|path| page_number(&path).map(|n| (n, path)))
            .collect();
        // Zero padding of the page suffix depends on the page count
        pages.sort_by_key(|(n, _)| *n);

        if pages.is_empty() {
            return Err(PdfError::RasterError("pdftoppm produced no images".to_string()));
        }

        pages
            .into_iter()
            .map(|(_, path)| std::fs::read(path).map_err(PdfError::from))
            .collect()
    }
}

/// Page number from a `page-<n>.<ext>` file name
fn page_number(path: &Path) -> Option<u32> {
    let stem = path.file_stem()?.to_str()?;
    stem.rsplit('-').next()?.parse().ok()
}
