//! Context facade and the main loop

use std::path::{Path, PathBuf};

use crate::core::config::ContextConfig;
use crate::core::error::{GfmError, GfmResult};
use crate::core::events::{Event, EventQueue, EventSource, TimerSource};
use crate::core::scheduler::{FpsCounter, FrameScheduler};
use crate::gif::{GifInfo, GifRecorder};
use crate::physics::{Collider, Quadtree};
use crate::renderer::{Camera, SoftwareBackend, Spriteset, TextureId, VideoBackend};

/// Game trait that users implement
pub trait Game {
    /// Called once before the first tick
    fn init(&mut self, _ctx: &mut Context) -> GfmResult<()> {
        Ok(())
    }

    /// Called once per update tick; the tick length is
    /// [`Context::delta_ms`], never wall time
    fn update(&mut self, ctx: &mut Context) -> GfmResult<()>;

    /// Called once per draw tick, after every pending update
    fn draw(&mut self, ctx: &mut Context) -> GfmResult<()>;

    /// Called when the host window is resized
    fn on_resize(&mut self, _ctx: &mut Context, _width: u32, _height: u32) {}

    /// Called when the loop stops
    fn shutdown(&mut self, _ctx: &mut Context) {}
}

/// Everything a game needs between ticks
pub struct Context {
    config: ContextConfig,
    /// Update/draw pacing
    pub scheduler: FrameScheduler,
    /// Wall-clock timings of each tick
    pub fps: FpsCounter,
    pub camera: Camera,
    /// Collision tree covering the camera's world
    pub quadtree: Quadtree<Collider>,
    video: Box<dyn VideoBackend>,
    events: Box<dyn EventSource>,
    queue: EventQueue,
    spritesets: Vec<Spriteset>,
    gif: GifRecorder,
    rgb: Vec<u8>,
    background: u32,
    should_quit: bool,
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("config", &self.config)
            .field("scheduler", &self.scheduler)
            .field("camera", &self.camera)
            .field("spritesets", &self.spritesets.len())
            .field("should_quit", &self.should_quit)
            .finish_non_exhaustive()
    }
}

impl Context {
    /// Build a context over the given backends.
    ///
    /// # Errors
    ///
    /// Fails if the config is invalid, if the backbuffer doesn't match the
    /// configured size, or with `FpsTooHigh` for rates above `max_rate`
    pub fn new(
        config: ContextConfig,
        video: Box<dyn VideoBackend>,
        events: Box<dyn EventSource>,
    ) -> GfmResult<Self> {
        config.validate()?;
        if video.backbuffer_size() != (config.width, config.height) {
            let (w, h) = video.backbuffer_size();
            return Err(GfmError::InvalidArgument(format!(
                "backbuffer is {w}x{h}, config asks for {}x{}",
                config.width, config.height
            )));
        }

        let mut scheduler = FrameScheduler::new(1, 1)?;
        scheduler.set_max_rate(config.max_rate)?;
        scheduler.set_fps(config.ups, config.dps)?;

        let (width, height) = (config.width as i32, config.height as i32);
        let camera = Camera::new(width, height)?;
        let quadtree = Quadtree::new(
            0,
            0,
            width,
            height,
            config.quadtree.max_depth,
            config.quadtree.max_nodes,
        )?;
        let temp_dir = config
            .gif_temp_dir
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join("gframe"));

        log::info!(
            "Starting {} {} ({}x{} @ {} ups / {} dps)",
            config.title,
            config.version,
            config.width,
            config.height,
            config.ups,
            config.dps
        );

        Ok(Self {
            config,
            scheduler,
            fps: FpsCounter::new(),
            camera,
            quadtree,
            video,
            events,
            queue: EventQueue::new(),
            spritesets: Vec::new(),
            gif: GifRecorder::new(temp_dir),
            rgb: Vec::new(),
            background: 0xff00_0000,
            should_quit: false,
        })
    }

    /// Context with an in-memory backbuffer paced by the wall clock
    pub fn headless(config: ContextConfig) -> GfmResult<Self> {
        let video = SoftwareBackend::new(config.width, config.height)?;
        Self::new(config, Box::new(video), Box::new(TimerSource::new()))
    }

    /// Route `log` output to stderr, filtered by `RUST_LOG`.
    ///
    /// Safe to call more than once.
    pub fn init_logging() {
        let _ = env_logger::try_init();
    }

    #[must_use]
    pub const fn config(&self) -> &ContextConfig {
        &self.config
    }

    /// Change both rates, keeping the configured maximum
    pub fn set_fps(&mut self, ups: u32, dps: u32) -> GfmResult<()> {
        self.scheduler.set_fps(ups, dps)?;
        self.config.ups = ups;
        self.config.dps = dps;
        Ok(())
    }

    /// Milliseconds simulated by each update tick
    #[must_use]
    pub const fn delta_ms(&self) -> u32 {
        self.scheduler.update_elapsed_ms()
    }

    /// Seconds simulated by each update tick
    #[must_use]
    pub fn delta_secs(&self) -> f64 {
        self.scheduler.update_elapsed_secs()
    }

    /// Color the backbuffer is cleared to before each draw (`0xRRGGBB`)
    pub fn set_background_color(&mut self, color: u32) {
        self.background = 0xff00_0000 | color;
    }

    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    #[must_use]
    pub const fn should_quit(&self) -> bool {
        self.should_quit
    }

    // ------------------------------------------------------------------------
    // Video
    // ------------------------------------------------------------------------

    #[must_use]
    pub fn video(&self) -> &dyn VideoBackend {
        self.video.as_ref()
    }

    pub fn video_mut(&mut self) -> &mut dyn VideoBackend {
        self.video.as_mut()
    }

    /// Backend and camera together, for the draw calls that need both
    pub fn draw_target(&mut self) -> (&mut dyn VideoBackend, &Camera) {
        (self.video.as_mut(), &self.camera)
    }

    /// Register a spriteset over an already loaded texture
    pub fn add_spriteset(
        &mut self,
        texture: TextureId,
        tile_width: i32,
        tile_height: i32,
    ) -> GfmResult<usize> {
        let Some((width, height)) = self.video.texture_size(texture) else {
            return Err(GfmError::InvalidArgument(format!(
                "unknown texture {}",
                texture.0
            )));
        };
        let spriteset = Spriteset::new(
            texture,
            width as i32,
            height as i32,
            tile_width,
            tile_height,
        )?;
        self.spritesets.push(spriteset);
        Ok(self.spritesets.len() - 1)
    }

    /// Load an image and slice it into a spriteset
    pub fn load_spriteset(
        &mut self,
        path: impl AsRef<Path>,
        key_color: Option<u32>,
        tile_width: i32,
        tile_height: i32,
    ) -> GfmResult<usize> {
        let texture = self.video.load_texture(path.as_ref(), key_color)?;
        self.add_spriteset(texture, tile_width, tile_height)
    }

    pub fn spriteset(&self, index: usize) -> GfmResult<&Spriteset> {
        self.spritesets.get(index).ok_or(GfmError::InvalidIndex {
            index,
            len: self.spritesets.len(),
        })
    }

    /// Rebuild the quadtree over the camera's world, emptying it
    pub fn reset_quadtree(&mut self) -> GfmResult<()> {
        let (width, height) = self.camera.world_size();
        self.quadtree.init(
            0,
            0,
            width,
            height,
            self.config.quadtree.max_depth,
            self.config.quadtree.max_nodes,
        )
    }

    /// Save the current backbuffer as a PNG
    pub fn snapshot(&mut self, path: impl AsRef<Path>) -> GfmResult<()> {
        let path = path.as_ref();
        self.video.read_backbuffer(&mut self.rgb)?;
        let (width, height) = self.video.backbuffer_size();
        let img = image::RgbImage::from_raw(width, height, self.rgb.clone())
            .ok_or_else(|| GfmError::Backend("backbuffer readback has the wrong size".into()))?;
        img.save(path)
            .map_err(|e| GfmError::Io(format!("{}: {e}", path.display())))?;
        log::info!("Saved snapshot to {}", path.display());
        Ok(())
    }

    // ------------------------------------------------------------------------
    // GIF
    // ------------------------------------------------------------------------

    /// Capture the next `frames` draw ticks and export them to `path` once
    /// done (or when [`Context::stop_gif`] is called)
    pub fn record_gif(&mut self, frames: u32, path: impl Into<PathBuf>) -> GfmResult<()> {
        let frames = frames.min(self.config.gif_max_frames);
        self.gif.set_output(path.into());
        let (width, height) = self.video.backbuffer_size();
        self.gif.start(width, height, frames)
    }

    #[must_use]
    pub const fn is_recording_gif(&self) -> bool {
        self.gif.is_recording()
    }

    /// Stop recording early and export what was captured
    pub fn stop_gif(&mut self) -> GfmResult<()> {
        let info = self.gif_info();
        self.gif.export(self.scheduler.draw_rate(), info)
    }

    /// `Ok(true)` once the last export finished, `Ok(false)` while it runs
    pub fn did_export_gif(&mut self) -> GfmResult<bool> {
        self.gif.did_export()
    }

    /// Block until the last export finishes
    pub fn wait_export_gif(&mut self) -> GfmResult<()> {
        self.gif.wait_export()
    }

    fn gif_info(&self) -> GifInfo {
        GifInfo {
            version: self.config.version.clone(),
            organization: self.config.organization.clone(),
            title: self.config.title.clone(),
        }
    }

    // ------------------------------------------------------------------------
    // Loop
    // ------------------------------------------------------------------------

    fn draw_begin(&mut self) -> GfmResult<()> {
        self.scheduler.draw_begin()?;
        self.fps.draw_begin();
        self.video.clear(self.background);
        Ok(())
    }

    fn draw_end(&mut self) -> GfmResult<()> {
        if self.gif.is_recording() {
            self.video.read_backbuffer(&mut self.rgb)?;
            if !self.gif.store_frame(&self.rgb)? {
                log::warn!("GIF frame limit reached, dropping capture");
            }
            if self.gif.is_full() {
                self.stop_gif()?;
            }
        }
        self.video.present()?;
        self.fps.draw_end();
        self.scheduler.draw_end()
    }

    /// Wait for the next event batch, then run every pending update
    /// followed by every pending draw
    pub fn step(&mut self, game: &mut impl Game) -> GfmResult<()> {
        let timeout = self.scheduler.delay();
        self.events.wait_event(timeout, &mut self.queue)?;
        self.queue.swap();

        let events: Vec<Event> = self.queue.drain().collect();
        for event in events {
            match event {
                Event::Timer { elapsed_ms } => self.scheduler.update_accumulators(elapsed_ms),
                Event::Quit => {
                    log::info!("Quit requested");
                    self.should_quit = true;
                }
                Event::Resize { width, height } => game.on_resize(self, width, height),
            }
        }

        while self.scheduler.is_updating() && !self.should_quit {
            self.scheduler.update_begin()?;
            self.fps.update_begin();
            game.update(self)?;
            self.fps.update_end();
            self.scheduler.update_end()?;
        }
        while self.scheduler.is_drawing() && !self.should_quit {
            self.draw_begin()?;
            game.draw(self)?;
            self.draw_end()?;
        }
        Ok(())
    }

    /// Run `game` until it (or the event source) asks to quit
    pub fn run(&mut self, game: &mut impl Game) -> GfmResult<()> {
        game.init(self)?;
        log::info!("Context initialized");

        let result = loop {
            if self.should_quit {
                break Ok(());
            }
            if let Err(err) = self.step(game) {
                break Err(err);
            }
        };

        game.shutdown(self);
        let flushed = self.flush_gif();
        log::info!("Shut down after {} draws", self.fps.total_draws());
        match (result, flushed) {
            (Err(err), Err(gif_err)) => {
                log::warn!("GIF export failed while stopping on error: {gif_err}");
                Err(err)
            }
            (Err(err), Ok(())) => Err(err),
            (Ok(()), flushed) => flushed,
        }
    }

    /// Export whatever is still being recorded and wait for the writer
    fn flush_gif(&mut self) -> GfmResult<()> {
        if self.gif.is_recording() && self.gif.frame_count() > 0 {
            self.stop_gif()?;
        }
        self.gif.wait_export()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::events::FixedStepSource;

    #[derive(Default)]
    struct Counter {
        inited: bool,
        updates: u32,
        draws: u32,
        quit_after: Option<u32>,
    }

    impl Game for Counter {
        fn init(&mut self, _ctx: &mut Context) -> GfmResult<()> {
            self.inited = true;
            Ok(())
        }

        fn update(&mut self, ctx: &mut Context) -> GfmResult<()> {
            assert_eq!(ctx.delta_ms(), 16);
            self.updates += 1;
            if self.quit_after == Some(self.updates) {
                ctx.quit();
            }
            Ok(())
        }

        fn draw(&mut self, ctx: &mut Context) -> GfmResult<()> {
            self.draws += 1;
            ctx.video_mut().fill_rect(0, 0, 2, 2, 0xffff_00ff)
        }
    }

    fn context(limit: u32) -> Context {
        let config = ContextConfig::default().with_size(8, 8);
        let video = SoftwareBackend::new(8, 8).unwrap();
        let source = FixedStepSource::new(50).with_limit(limit);
        Context::new(config, Box::new(video), Box::new(source)).unwrap()
    }

    #[test]
    fn test_run_until_source_quits() {
        let mut ctx = context(2);
        let mut game = Counter::default();
        ctx.run(&mut game).unwrap();

        assert!(game.inited);
        // 100ms at 60 Hz
        assert_eq!(game.updates, 6);
        assert_eq!(game.draws, 6);
        assert!(ctx.should_quit());
    }

    #[test]
    fn test_game_can_quit() {
        let mut ctx = context(100);
        let mut game = Counter {
            quit_after: Some(2),
            ..Counter::default()
        };
        ctx.run(&mut game).unwrap();
        assert_eq!(game.updates, 2);
        assert_eq!(game.draws, 0);
    }

    #[test]
    fn test_rejects_mismatched_backbuffer() {
        let config = ContextConfig::default().with_size(8, 8);
        let video = SoftwareBackend::new(4, 4).unwrap();
        let result = Context::new(config, Box::new(video), Box::new(TimerSource::new()));
        assert!(result.is_err());
    }

    #[test]
    fn test_rate_above_max_fails() {
        let config = ContextConfig::default().with_size(8, 8).with_fps(600, 60);
        assert_eq!(
            Context::headless(config).unwrap_err(),
            GfmError::FpsTooHigh(600)
        );
    }

    #[test]
    fn test_spritesets() {
        let mut ctx = context(1);
        let texture = ctx
            .video_mut()
            .add_texture(16, 8, vec![0xffff_ffff; 128])
            .unwrap();
        let index = ctx.add_spriteset(texture, 8, 8).unwrap();
        assert_eq!(ctx.spriteset(index).unwrap().tile_count(), 2);
        assert!(ctx.spriteset(5).is_err());
        assert!(ctx.add_spriteset(TextureId(9), 8, 8).is_err());
    }

    #[test]
    fn test_snapshot_png() {
        let dir = tempfile::tempdir().unwrap();
        let mut ctx = context(1);
        ctx.video_mut().fill_rect(0, 0, 8, 8, 0xff12_3456).unwrap();
        let path = dir.path().join("shot.png");
        ctx.snapshot(&path).unwrap();

        let img = image::open(&path).unwrap().to_rgb8();
        assert_eq!(img.dimensions(), (8, 8));
        assert_eq!(img.get_pixel(3, 3).0, [0x12, 0x34, 0x56]);
    }

    #[test]
    fn test_record_gif_during_run() {
        let dir = tempfile::tempdir().unwrap();
        let config = ContextConfig::default()
            .with_size(8, 8)
            .with_gif_temp_dir(dir.path().join("frames"));
        let video = SoftwareBackend::new(8, 8).unwrap();
        let source = FixedStepSource::new(50).with_limit(4);
        let mut ctx = Context::new(config, Box::new(video), Box::new(source)).unwrap();

        let out = dir.path().join("run.gif");
        ctx.record_gif(3, &out).unwrap();
        assert!(ctx.is_recording_gif());

        ctx.run(&mut Counter::default()).unwrap();
        assert!(!ctx.is_recording_gif());
        assert!(ctx.did_export_gif().unwrap());

        let bytes = std::fs::read(&out).unwrap();
        assert_eq!(&bytes[0..6], b"GIF89a");
        assert!(bytes.windows(11).any(|w| w == b"NETSCAPE2.0"));
    }

    struct BrokenDraw {
        draws: u32,
    }

    impl Game for BrokenDraw {
        fn update(&mut self, _ctx: &mut Context) -> GfmResult<()> {
            Ok(())
        }

        fn draw(&mut self, _ctx: &mut Context) -> GfmResult<()> {
            self.draws += 1;
            if self.draws == 2 {
                return Err(GfmError::InvalidArgument("broken draw".into()));
            }
            Ok(())
        }
    }

    #[test]
    fn test_run_keeps_game_error_over_gif_failure() {
        let dir = tempfile::tempdir().unwrap();
        let config = ContextConfig::default()
            .with_size(8, 8)
            .with_gif_temp_dir(dir.path().join("frames"));
        let video = SoftwareBackend::new(8, 8).unwrap();
        let source = FixedStepSource::new(50).with_limit(4);
        let mut ctx = Context::new(config, Box::new(video), Box::new(source)).unwrap();

        // The output directory doesn't exist, so the export itself fails
        let out = dir.path().join("missing").join("run.gif");
        ctx.record_gif(10, &out).unwrap();

        let result = ctx.run(&mut BrokenDraw { draws: 0 });
        assert_eq!(result, Err(GfmError::InvalidArgument("broken draw".into())));
        assert!(!out.exists());
    }
}
