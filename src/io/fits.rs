//! FITS access for uncertainty grids.
//!
//! A grid file carries the bin description (`MIN_COL`, `MAX_COL`, `NUM_COL`,
//! `MIN_MAG`, `MAX_MAG`, `NUM_MAG`) in the primary header and the
//! `(mag, color, sample)` cube as the first image extension. Card parsing,
//! `BITPIX` decoding and `BSCALE`/`BZERO` scaling are left to `fitsio`; this
//! module maps keywords and the image onto the crate's error type and adds the
//! size checks cfitsio does not make before allocating.

use std::path::{Path, PathBuf};

use fitsio::FitsFile;
use fitsio::errors::Error as FitsioError;
use fitsio::hdu::HduInfo;
use fitsio::images::{ImageDescription, ImageType};

use crate::domain::{GridHeader, SampleCube};
use crate::error::ModelError;

/// cfitsio status for a keyword that is not in the header.
const KEY_NO_EXIST: i32 = 202;

/// Extension name used when writing grids.
pub const GRID_EXTNAME: &str = "LN_SIGMA";

/// A keyword value written to a primary header.
#[derive(Debug, Clone, PartialEq)]
pub enum HeaderValue {
    Integer(i64),
    Float(f64),
    Text(String),
}

/// Ordered primary-header keywords.
pub type HeaderKeys = Vec<(String, HeaderValue)>;

/// Pixels of an image extension, converted to `f64`.
///
/// `shape` is slowest axis first (`NAXISn, ..., NAXIS1`); `data` is row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageData {
    pub shape: Vec<usize>,
    pub data: Vec<f64>,
}

fn fits_error(path: &Path, source: FitsioError) -> ModelError {
    ModelError::Fits {
        path: path.to_path_buf(),
        source,
    }
}

/// An open grid file. The cfitsio handle is closed when this is dropped,
/// including on error paths.
pub struct GridFits {
    path: PathBuf,
    file: FitsFile,
    /// On-disk size, bounds how many pixels the header may claim.
    file_len: u64,
}

impl GridFits {
    pub fn open(path: &Path) -> Result<Self, ModelError> {
        let file_len = std::fs::metadata(path)
            .map_err(|source| ModelError::Io {
                path: path.to_path_buf(),
                source,
            })?
            .len();
        let file = FitsFile::open(path).map_err(|e| fits_error(path, e))?;
        Ok(Self {
            path: path.to_path_buf(),
            file,
            file_len,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn key_error(&self, key: &str, err: FitsioError) -> ModelError {
        match err {
            FitsioError::Fits(e) if e.status == KEY_NO_EXIST => ModelError::MissingKey(key.to_string()),
            FitsioError::Fits(e) => ModelError::invalid_header(key, e.message),
            other => fits_error(&self.path, other),
        }
    }

    /// Primary-header keyword as a float. Integer cards convert.
    pub fn float_key(&mut self, key: &str) -> Result<f64, ModelError> {
        let primary = self.file.primary_hdu().map_err(|e| fits_error(&self.path, e))?;
        primary
            .read_key::<f64>(&mut self.file, key)
            .map_err(|e| self.key_error(key, e))
    }

    /// Primary-header keyword as an integer.
    pub fn integer_key(&mut self, key: &str) -> Result<i64, ModelError> {
        let primary = self.file.primary_hdu().map_err(|e| fits_error(&self.path, e))?;
        primary
            .read_key::<i64>(&mut self.file, key)
            .map_err(|e| self.key_error(key, e))
    }

    /// Read the first extension, which must be an image.
    pub fn read_first_image(&mut self) -> Result<ImageData, ModelError> {
        let hdu = self
            .file
            .hdu(1)
            .map_err(|e| ModelError::format(&self.path, format!("no extension after the primary HDU ({e})")))?;
        let shape = match &hdu.info {
            HduInfo::ImageInfo { shape, .. } => shape.clone(),
            _ => return Err(ModelError::format(&self.path, "first extension is not an image")),
        };

        let count = shape
            .iter()
            .try_fold(1usize, |acc, &n| acc.checked_mul(n))
            .ok_or_else(|| ModelError::format(&self.path, format!("image axes {shape:?} overflow the pixel count")))?;
        // Every pixel occupies at least one byte on disk.
        if count as u64 > self.file_len {
            return Err(ModelError::format(
                &self.path,
                format!(
                    "image axes {shape:?} claim {count} pixels but the file is {} bytes",
                    self.file_len
                ),
            ));
        }

        let data: Vec<f64> = hdu
            .read_image(&mut self.file)
            .map_err(|e| fits_error(&self.path, e))?;
        if data.len() != count {
            return Err(ModelError::format(
                &self.path,
                format!("read {} pixels, image axes {shape:?} need {count}", data.len()),
            ));
        }
        Ok(ImageData { shape, data })
    }
}

/// Write a file whose primary HDU carries `primary_keys` and whose first
/// extension is a `BITPIX = -64` image of `shape` (slowest axis first).
///
/// An existing file at `path` is replaced.
pub fn write_image_file(
    path: &Path,
    primary_keys: &[(String, HeaderValue)],
    shape: &[usize],
    data: &[f64],
) -> Result<(), ModelError> {
    let expected: usize = shape.iter().product();
    if expected != data.len() {
        return Err(ModelError::InvalidConfig(format!(
            "image data has {} values, shape {shape:?} needs {expected}",
            data.len()
        )));
    }

    if path.exists() {
        std::fs::remove_file(path).map_err(|source| ModelError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    }

    let fits = |e: FitsioError| fits_error(path, e);
    let mut file = FitsFile::create(path).open().map_err(fits)?;
    let primary = file.primary_hdu().map_err(fits)?;
    for (key, value) in primary_keys {
        match value {
            HeaderValue::Integer(v) => primary.write_key(&mut file, key, *v),
            HeaderValue::Float(v) => primary.write_key(&mut file, key, *v),
            HeaderValue::Text(v) => primary.write_key(&mut file, key, v.clone()),
        }
        .map_err(fits)?;
    }

    let description = ImageDescription {
        data_type: ImageType::Double,
        dimensions: shape,
    };
    let hdu = file.create_image(GRID_EXTNAME.to_string(), &description).map_err(fits)?;
    hdu.write_image(&mut file, data).map_err(fits)?;
    Ok(())
}

/// Primary-header keys describing `header`.
pub fn grid_header_keys(header: &GridHeader) -> HeaderKeys {
    vec![
        (GridHeader::KEY_MIN_COL.to_string(), HeaderValue::Float(header.min_col)),
        (GridHeader::KEY_MAX_COL.to_string(), HeaderValue::Float(header.max_col)),
        (GridHeader::KEY_NUM_COL.to_string(), HeaderValue::Integer(header.num_col as i64)),
        (GridHeader::KEY_MIN_MAG.to_string(), HeaderValue::Float(header.min_mag)),
        (GridHeader::KEY_MAX_MAG.to_string(), HeaderValue::Float(header.max_mag)),
        (GridHeader::KEY_NUM_MAG.to_string(), HeaderValue::Integer(header.num_mag as i64)),
    ]
}

/// Write an uncertainty grid file.
pub fn write_grid(path: &Path, header: &GridHeader, cube: &SampleCube) -> Result<(), ModelError> {
    write_image_file(path, &grid_header_keys(header), &cube.shape(), cube.as_slice())
}
