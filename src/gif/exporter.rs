//! Frame capture and background export
//!
//! Frames are buffered on disk as raw RGB24 files (`gifFrame_<n>`) so a
//! long recording doesn't sit in memory. [`GifRecorder::export`] hands the
//! file list to a worker thread, which encodes the GIF, deletes each frame
//! once written, and reports back over a channel that the main loop polls.

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{Receiver, TryRecvError, channel};
use std::thread::{self, JoinHandle};

use crate::core::error::{GfmError, GfmResult};
use crate::gif::encoder::{GifEncoder, frame_delay};

/// Prefix of the temporary frame files
pub const FRAME_PREFIX: &str = "gifFrame_";

/// Text written to the comment extension
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GifInfo {
    pub version: String,
    pub organization: String,
    pub title: String,
}

/// Everything the worker thread owns
#[derive(Debug)]
struct ExportJob {
    output: PathBuf,
    frames: Vec<PathBuf>,
    width: u32,
    height: u32,
    delay_cs: u16,
    info: GifInfo,
}

impl ExportJob {
    fn run(self) -> GfmResult<()> {
        log::info!(
            "Exporting {} frame(s) to {}",
            self.frames.len(),
            self.output.display()
        );
        let file = BufWriter::new(File::create(&self.output)?);
        let mut encoder = GifEncoder::new(file, self.width, self.height)?;

        let header = format!("GIF made with GFraMe {}\n", self.info.version);
        let comment = [
            header.as_str(),
            self.info.organization.as_str(),
            self.info.title.as_str(),
        ];
        let comment: Vec<&str> = comment.into_iter().filter(|s| !s.is_empty()).collect();
        encoder.begin(self.frames.len() > 1, &comment)?;

        let mut result = Ok(());
        for path in &self.frames {
            if result.is_ok() {
                result = fs::read(path)
                    .map_err(GfmError::from)
                    .and_then(|rgb| encoder.write_frame(&rgb, self.delay_cs));
            }
            if let Err(err) = fs::remove_file(path) {
                log::warn!("Couldn't remove {}: {err}", path.display());
            }
        }
        result?;

        encoder.finish()?;
        log::info!("Finished exporting {}", self.output.display());
        Ok(())
    }
}

/// Handle on a running export
#[derive(Debug)]
struct Worker {
    handle: Option<JoinHandle<()>>,
    receiver: Receiver<GfmResult<()>>,
    result: Option<GfmResult<()>>,
}

impl Worker {
    fn poll(&mut self) -> Option<&GfmResult<()>> {
        if self.result.is_none() {
            match self.receiver.try_recv() {
                Ok(result) => self.result = Some(result),
                Err(TryRecvError::Empty) => {}
                Err(TryRecvError::Disconnected) => {
                    self.result = Some(Err(GfmError::Backend("GIF export thread died".into())));
                }
            }
        }
        self.result.as_ref()
    }

    fn wait(&mut self) -> GfmResult<()> {
        if self.result.is_none() {
            self.result = Some(
                self.receiver
                    .recv()
                    .unwrap_or_else(|_| Err(GfmError::Backend("GIF export thread died".into()))),
            );
        }
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::warn!("GIF export thread panicked");
            }
        }
        self.result.clone().unwrap_or(Ok(()))
    }
}

/// Records frames and exports them as a GIF in the background
#[derive(Debug)]
pub struct GifRecorder {
    temp_dir: PathBuf,
    width: u32,
    height: u32,
    max_frames: u32,
    frames: Vec<PathBuf>,
    recording: bool,
    output: Option<PathBuf>,
    worker: Option<Worker>,
}

impl GifRecorder {
    /// Recorder buffering frames under `temp_dir`
    #[must_use]
    pub fn new(temp_dir: impl Into<PathBuf>) -> Self {
        Self {
            temp_dir: temp_dir.into(),
            width: 0,
            height: 0,
            max_frames: u32::MAX,
            frames: Vec::new(),
            recording: false,
            output: None,
            worker: None,
        }
    }

    /// Where the next export is written
    pub fn set_output(&mut self, path: impl AsRef<Path>) {
        self.output = Some(path.as_ref().to_path_buf());
    }

    /// Start buffering `width`x`height` frames, at most `max_frames` of them
    pub fn start(&mut self, width: u32, height: u32, max_frames: u32) -> GfmResult<()> {
        if self.is_exporting() {
            return Err(GfmError::GifThreadRunning);
        }
        if self.recording {
            return Err(GfmError::AlreadyInitialized("GIF recording"));
        }
        if width == 0 || height == 0 || max_frames == 0 {
            return Err(GfmError::InvalidArgument(format!(
                "recording {max_frames} frame(s) of {width}x{height}"
            )));
        }
        if width > u32::from(u16::MAX) || height > u32::from(u16::MAX) {
            return Err(GfmError::GifImageTooLarge);
        }
        fs::create_dir_all(&self.temp_dir)?;
        self.width = width;
        self.height = height;
        self.max_frames = max_frames;
        self.frames.clear();
        self.worker = None;
        self.recording = true;
        log::info!("Recording up to {max_frames} GIF frame(s) of {width}x{height}");
        Ok(())
    }

    /// Buffer one RGB24 frame. Returns `false` once the frame limit is
    /// reached and the frame was dropped.
    pub fn store_frame(&mut self, rgb: &[u8]) -> GfmResult<bool> {
        if !self.recording {
            return Err(GfmError::NotInitialized("GIF recording"));
        }
        let expected = self.width as usize * self.height as usize * 3;
        if rgb.len() != expected {
            return Err(GfmError::InvalidArgument(format!(
                "frame of {} bytes, expected {expected}",
                rgb.len()
            )));
        }
        if self.frames.len() >= self.max_frames as usize {
            return Ok(false);
        }
        let path = self
            .temp_dir
            .join(format!("{FRAME_PREFIX}{}", self.frames.len()));
        fs::write(&path, rgb)?;
        self.frames.push(path);
        Ok(true)
    }

    #[must_use]
    pub const fn is_recording(&self) -> bool {
        self.recording
    }

    /// True once the frame limit was reached
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.frames.len() >= self.max_frames as usize
    }

    #[must_use]
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// Stop recording and encode the buffered frames on a worker thread.
    ///
    /// The frame delay is derived from `draws_per_second`. Fails with
    /// `GifPathNotSet` when no output was set and `GifThreadRunning` while
    /// a previous export is still going.
    pub fn export(&mut self, draws_per_second: f64, info: GifInfo) -> GfmResult<()> {
        if self.is_exporting() {
            return Err(GfmError::GifThreadRunning);
        }
        let Some(output) = self.output.clone() else {
            return Err(GfmError::GifPathNotSet);
        };
        if !self.recording {
            return Err(GfmError::NotInitialized("GIF recording"));
        }
        if self.frames.is_empty() {
            return Err(GfmError::InvalidArgument("no GIF frames recorded".into()));
        }

        let job = ExportJob {
            output,
            frames: std::mem::take(&mut self.frames),
            width: self.width,
            height: self.height,
            delay_cs: frame_delay(draws_per_second),
            info,
        };
        self.recording = false;

        let (sender, receiver) = channel();
        let handle = thread::Builder::new()
            .name("gif-export".into())
            .spawn(move || {
                let result = job.run();
                if let Err(err) = &result {
                    log::warn!("GIF export failed: {err}");
                }
                let _ = sender.send(result);
            })?;

        self.worker = Some(Worker {
            handle: Some(handle),
            receiver,
            result: None,
        });
        Ok(())
    }

    /// True while a worker is still encoding
    #[must_use]
    pub fn is_exporting(&self) -> bool {
        self.worker.as_ref().is_some_and(|w| {
            w.result.is_none() && w.handle.as_ref().is_some_and(|h| !h.is_finished())
        })
    }

    /// Poll the last export: `Ok(false)` while running, `Ok(true)` once it
    /// succeeded, or the error it failed with
    pub fn did_export(&mut self) -> GfmResult<bool> {
        let Some(worker) = self.worker.as_mut() else {
            return Err(GfmError::NotInitialized("GIF export"));
        };
        match worker.poll() {
            None => Ok(false),
            Some(Ok(())) => Ok(true),
            Some(Err(err)) => Err(err.clone()),
        }
    }

    /// Block until the last export finishes; returns immediately when none
    /// was started
    pub fn wait_export(&mut self) -> GfmResult<()> {
        match self.worker.as_mut() {
            Some(worker) => worker.wait(),
            None => Ok(()),
        }
    }

    /// Drop buffered frames without exporting them
    pub fn cancel(&mut self) {
        for path in self.frames.drain(..) {
            let _ = fs::remove_file(path);
        }
        self.recording = false;
    }
}

impl Drop for GifRecorder {
    fn drop(&mut self) {
        if let Err(err) = self.wait_export() {
            log::warn!("GIF export failed during shutdown: {err}");
        }
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info() -> GifInfo {
        GifInfo {
            version: "1.0".into(),
            organization: "org".into(),
            title: "test".into(),
        }
    }

    fn frame(color: [u8; 3]) -> Vec<u8> {
        color.iter().copied().cycle().take(4 * 4 * 3).collect()
    }

    #[test]
    fn test_record_and_export() {
        let dir = tempfile::tempdir().unwrap();
        let mut recorder = GifRecorder::new(dir.path().join("frames"));
        recorder.set_output(dir.path().join("out.gif"));

        recorder.start(4, 4, 10).unwrap();
        assert!(recorder.store_frame(&frame([0, 0, 0])).unwrap());
        assert!(recorder.store_frame(&frame([255, 0, 255])).unwrap());
        assert!(dir.path().join("frames/gifFrame_1").exists());

        recorder.export(60.0, info()).unwrap();
        recorder.wait_export().unwrap();
        assert!(recorder.did_export().unwrap());

        let out = std::fs::read(dir.path().join("out.gif")).unwrap();
        assert_eq!(&out[0..6], b"GIF89a");
        assert_eq!(*out.last().unwrap(), 0x3b);
        assert!(out.windows(11).any(|w| w == b"NETSCAPE2.0"));
        assert!(!dir.path().join("frames/gifFrame_0").exists());
    }

    #[test]
    fn test_single_frame_has_no_loop_block() {
        let dir = tempfile::tempdir().unwrap();
        let mut recorder = GifRecorder::new(dir.path());
        recorder.set_output(dir.path().join("still.gif"));
        recorder.start(4, 4, 1).unwrap();
        assert!(recorder.store_frame(&frame([1, 2, 3])).unwrap());
        assert!(!recorder.store_frame(&frame([1, 2, 3])).unwrap());
        assert!(recorder.is_full());

        recorder.export(30.0, info()).unwrap();
        recorder.wait_export().unwrap();
        let out = std::fs::read(dir.path().join("still.gif")).unwrap();
        assert!(!out.windows(11).any(|w| w == b"NETSCAPE2.0"));
        assert!(out.windows(24).any(|w| w == b"GIF made with GFraMe 1.0"));
    }

    #[test]
    fn test_export_errors() {
        let dir = tempfile::tempdir().unwrap();
        let mut recorder = GifRecorder::new(dir.path());
        assert!(recorder.did_export().is_err());
        assert!(recorder.store_frame(&frame([0, 0, 0])).is_err());

        recorder.start(4, 4, 5).unwrap();
        assert_eq!(
            recorder.export(60.0, info()),
            Err(GfmError::GifPathNotSet)
        );
        assert!(recorder.store_frame(&[0; 5]).is_err());
        assert!(matches!(
            recorder.start(4, 4, 5),
            Err(GfmError::AlreadyInitialized(_))
        ));
        assert_eq!(
            GifRecorder::new(dir.path()).start(70_000, 4, 1),
            Err(GfmError::GifImageTooLarge)
        );
    }

    #[test]
    fn test_too_many_colors_reported() {
        let dir = tempfile::tempdir().unwrap();
        let mut recorder = GifRecorder::new(dir.path());
        recorder.set_output(dir.path().join("bad.gif"));
        recorder.start(20, 20, 1).unwrap();
        let rgb: Vec<u8> = (0..400u32).flat_map(|i| [(i >> 8) as u8, i as u8, 7]).collect();
        recorder.store_frame(&rgb).unwrap();

        recorder.export(60.0, info()).unwrap();
        assert_eq!(recorder.wait_export(), Err(GfmError::GifTooManyColors));
        assert_eq!(recorder.did_export(), Err(GfmError::GifTooManyColors));
        assert!(!dir.path().join("gifFrame_0").exists());
    }
}
