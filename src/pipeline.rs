//! Pipeline orchestration for jpeg-gray.
//!
//! Sequences decode, row transform and encode over one scanline buffer.
//! Every resource (input file, temporary output file, codec state, buffer)
//! is an owned value, so any early return releases everything opened so far.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use tempfile::NamedTempFile;

use crate::buffer::ScanlineBuffer;
use crate::codec::jpeg::DEFAULT_QUALITY;
use crate::codec::{
    ImageDescriptor, JpegScanlineDecoder, JpegScanlineEncoder, ScanlineDecoder, ScanlineEncoder,
};
use crate::decode::DecodeDriver;
use crate::encode::EncodeDriver;
use crate::error::{ErrorKind, GrayscaleError};
use crate::luminance::transform_rows;

/// Tunables for one conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransformOptions {
    /// JPEG quality, 1-100
    pub quality: u8,
    /// Spread the row transform across threads
    pub parallel: bool,
}

impl Default for TransformOptions {
    fn default() -> Self {
        Self {
            quality: DEFAULT_QUALITY,
            parallel: true,
        }
    }
}

/// Where a pipeline run currently is, or where it stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Unopened,
    InputOpened,
    OutputOpened,
    Decoding,
    Transforming,
    Encoding,
    Finished,
    InputOpenFailed,
    OutputOpenFailed,
    AllocationFailed,
    DecodeFailed,
    EncodeFailed,
}

impl PipelineState {
    pub fn is_failed(self) -> bool {
        matches!(
            self,
            PipelineState::InputOpenFailed
                | PipelineState::OutputOpenFailed
                | PipelineState::AllocationFailed
                | PipelineState::DecodeFailed
                | PipelineState::EncodeFailed
        )
    }
}

/// Outcome of a successful run.
#[derive(Debug, Clone, Copy)]
pub struct Summary {
    pub source: ImageDescriptor,
    pub destination: ImageDescriptor,
    pub elapsed: Duration,
}

/// One input-to-output conversion.
pub struct Pipeline {
    input: PathBuf,
    output: PathBuf,
    options: TransformOptions,
    state: PipelineState,
    visited: Vec<PipelineState>,
}

impl Pipeline {
    pub fn new(
        input: impl Into<PathBuf>,
        output: impl Into<PathBuf>,
        options: TransformOptions,
    ) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
            options,
            state: PipelineState::Unopened,
            visited: vec![PipelineState::Unopened],
        }
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Every state this pipeline has been in, oldest first.
    pub fn visited(&self) -> &[PipelineState] {
        &self.visited
    }

    /// Convert the input file and commit the result to the output path.
    ///
    /// The output is staged in a temporary file next to the destination and
    /// only renamed into place once encoding has finished, so a failed run
    /// never leaves a partial output file behind.
    pub fn run(&mut self) -> Result<Summary, GrayscaleError> {
        let started = Instant::now();

        let input = match File::open(&self.input) {
            Ok(file) => file,
            Err(source) => {
                return Err(self.fail(GrayscaleError::InputOpen {
                    path: self.input.clone(),
                    source,
                }))
            }
        };
        self.advance(PipelineState::InputOpened);

        let mut output = match PendingOutput::create(&self.output) {
            Ok(output) => output,
            Err(e) => return Err(self.fail(e)),
        };
        self.advance(PipelineState::OutputOpened);

        let (source, destination) = {
            let decoder = JpegScanlineDecoder::new(BufReader::new(input));
            let encoder =
                JpegScanlineEncoder::new(BufWriter::new(output.file_mut()), self.options.quality);
            self.run_stages(decoder, encoder)?
        };

        if let Err(e) = output.commit() {
            return Err(self.fail(e));
        }
        self.advance(PipelineState::Finished);

        let summary = Summary {
            source,
            destination,
            elapsed: started.elapsed(),
        };
        log::info!(
            "converted {} ({}x{}) to {} in {:?}",
            self.input.display(),
            source.width,
            source.height,
            self.output.display(),
            summary.elapsed
        );
        Ok(summary)
    }

    /// Run decode, transform and encode over an already-opened codec pair.
    pub fn run_with<D, E>(&mut self, decoder: D, encoder: E) -> Result<Summary, GrayscaleError>
    where
        D: ScanlineDecoder,
        E: ScanlineEncoder,
    {
        let started = Instant::now();
        self.advance(PipelineState::InputOpened);
        self.advance(PipelineState::OutputOpened);
        let (source, destination) = self.run_stages(decoder, encoder)?;
        self.advance(PipelineState::Finished);
        Ok(Summary {
            source,
            destination,
            elapsed: started.elapsed(),
        })
    }

    fn run_stages<D, E>(
        &mut self,
        decoder: D,
        encoder: E,
    ) -> Result<(ImageDescriptor, ImageDescriptor), GrayscaleError>
    where
        D: ScanlineDecoder,
        E: ScanlineEncoder,
    {
        self.advance(PipelineState::Decoding);
        let mut decode = DecodeDriver::new(decoder, &self.input);
        let source = match decode.read_header() {
            Ok(descriptor) => descriptor,
            Err(e) => return Err(self.fail(e)),
        };
        let mut buffer = match decode.layout().and_then(ScanlineBuffer::allocate) {
            Ok(buffer) => buffer,
            Err(e) => return Err(self.fail(e)),
        };
        if let Err(e) = decode.decode_into(&mut buffer) {
            return Err(self.fail(e));
        }
        drop(decode);

        self.advance(PipelineState::Transforming);
        if let Err(e) = transform_rows(&mut buffer, self.options.parallel) {
            return Err(self.fail(e));
        }

        self.advance(PipelineState::Encoding);
        let mut encode = EncodeDriver::new(encoder, &self.output);
        match encode.encode_from(&buffer, &source) {
            Ok(destination) => Ok((source, destination)),
            Err(e) => Err(self.fail(e)),
        }
    }

    fn advance(&mut self, next: PipelineState) {
        log::debug!("pipeline: {:?} -> {:?}", self.state, next);
        self.state = next;
        self.visited.push(next);
    }

    fn fail(&mut self, error: GrayscaleError) -> GrayscaleError {
        let failed = match error.kind() {
            ErrorKind::InputOpen => PipelineState::InputOpenFailed,
            ErrorKind::OutputOpen => PipelineState::OutputOpenFailed,
            ErrorKind::Allocation => PipelineState::AllocationFailed,
            ErrorKind::DecodeHeader | ErrorKind::DecodeRead => PipelineState::DecodeFailed,
            ErrorKind::EncodeWrite => PipelineState::EncodeFailed,
            ErrorKind::DimensionMismatch => match self.state {
                PipelineState::Encoding => PipelineState::EncodeFailed,
                _ => PipelineState::DecodeFailed,
            },
        };
        log::debug!("pipeline: {:?} -> {:?}: {}", self.state, failed, error);
        self.state = failed;
        self.visited.push(failed);
        error
    }
}

/// Temporary output file, renamed onto the destination by `commit`.
/// Dropping it uncommitted deletes the temporary file.
///
/// An existing destination is resolved through symlinks first, so the
/// rename replaces the link target and the link survives. The temporary
/// file takes the existing destination's permissions, or `0o666` minus
/// the process umask for a new file, matching a plain `File::create`.
struct PendingOutput {
    temp: NamedTempFile,
    path: PathBuf,
}

impl PendingOutput {
    fn create(path: &Path) -> Result<Self, GrayscaleError> {
        let open_error = |source| GrayscaleError::OutputOpen {
            path: path.to_path_buf(),
            source,
        };
        if path.is_dir() {
            return Err(open_error(std::io::Error::other("output path is a directory")));
        }
        let existing = fs::canonicalize(path)
            .and_then(|target| fs::metadata(&target).map(|meta| (target, meta)))
            .ok();
        let target = match &existing {
            Some((target, _)) => target.clone(),
            None => path.to_path_buf(),
        };

        let dir = target
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let mut builder = tempfile::Builder::new();
        builder.prefix(".jpeg-gray-").suffix(".tmp");
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            // masked by umask at creation
            builder.permissions(fs::Permissions::from_mode(0o666));
        }
        let temp = builder.tempfile_in(dir).map_err(open_error)?;

        if let Some((_, meta)) = existing {
            temp.as_file()
                .set_permissions(meta.permissions())
                .map_err(open_error)?;
        }

        Ok(Self { temp, path: target })
    }

    fn file_mut(&mut self) -> &mut File {
        self.temp.as_file_mut()
    }

    fn commit(self) -> Result<(), GrayscaleError> {
        let path = self.path;
        self.temp
            .persist(&path)
            .map_err(|e| GrayscaleError::EncodeWrite {
                path: path.clone(),
                source: Box::new(e.error),
            })?;
        Ok(())
    }
}
