//! Headless demo: a box drops into a walled tilemap while a fountain of
//! sparks bounces off the walls. Pass `--gif <path>` to record the run or
//! `--png <path>` to save the last frame.

use std::path::PathBuf;

use clap::Parser as CliParser;
use gframe::prelude::*;

const MAP: &str = "\
type wall 1
anim 2 200 3
anim 3 200 2
obj spawn 36 0 8 8 [color , red]
map 10 6
 0 0 0 0 0 0 0 0 0 0
 0 0 0 0 0 0 0 0 0 0
 1 0 0 0 0 0 0 0 0 1
 1 0 0 0 0 0 0 0 0 1
 1 0 2 3 0 0 0 0 0 1
 1 1 1 1 1 1 1 1 1 1
";

const WALL: TypeCode = types::RESERVED_2;
const PLAYER: TypeCode = types::RESERVED_2 + 1;
const SPARK: TypeCode = types::RESERVED_2 + 2;

/// Five 8x8 tiles: empty, wall, two water frames and a spark
fn build_texture() -> Vec<u32> {
    let colors = [0x0000_0000, 0xff80_8080, 0xff20_40c0, 0xff30_60e0, 0xffff_e040];
    let mut pixels = Vec::with_capacity(40 * 8);
    for row in 0..8 {
        for tile in colors {
            for col in 0..8 {
                // Sparks are a 2x2 dot in the tile's corner
                let color = if tile == 0xffff_e040 && (row >= 2 || col >= 2) {
                    0
                } else {
                    tile
                };
                pixels.push(color);
            }
        }
    }
    pixels
}

#[derive(CliParser)]
#[command(name = "gframe-demo")]
#[command(about = "Headless gframe demo run")]
struct Cli {
    /// Record the whole run into this GIF
    #[arg(long)]
    gif: Option<PathBuf>,
    /// Save the last frame into this PNG
    #[arg(long)]
    png: Option<PathBuf>,
    /// Simulated run length
    #[arg(long, default_value_t = 3)]
    seconds: u32,
}

struct Demo {
    map: Option<Tilemap>,
    sparks: Option<Group>,
    player: Object,
    spawn_timer: u32,
    spawned: u32,
}

impl Demo {
    fn new() -> GfmResult<Self> {
        let mut player = Object::new(0, 0, 8, 8)?;
        player.set_child(Collider::Object(0), PLAYER);
        player.set_acceleration(0.0, 500.0);
        Ok(Self {
            map: None,
            sparks: None,
            player,
            spawn_timer: 0,
            spawned: 0,
        })
    }

    fn emit_spark(&mut self) -> GfmResult<()> {
        let Some(sparks) = self.sparks.as_mut() else {
            return Ok(());
        };
        if sparks.recycle().is_err() {
            return Ok(());
        }
        self.spawned += 1;
        let spread = f64::from(self.spawned % 7) * 20.0 - 60.0;
        sparks.set_position(40, 30)?;
        sparks.set_velocity(spread, -120.0)?;
        sparks.set_frame(4)
    }

    fn collide(&mut self, ctx: &mut Context) -> GfmResult<()> {
        let (Some(map), Some(sparks)) = (self.map.as_ref(), self.sparks.as_mut()) else {
            return Ok(());
        };
        ctx.reset_quadtree()?;
        ctx.quadtree.populate_tilemap(map)?;

        let mut step = ctx.quadtree.collide_object(Collider::Object(0), &self.player)?;
        while let QuadtreeStep::Overlap { other, .. } = step {
            if let Some(area) = other.as_area() {
                self.player.collide_hitbox(&map.areas()[area])?;
            }
            step = ctx.quadtree.resume()?;
        }

        let mut step = ctx.quadtree.collide_group(sparks)?;
        while let QuadtreeStep::Overlap { object, other } = step {
            if let (Some(spark), Some(_)) = (object.as_sprite(), other.as_area()) {
                sparks.kill(spark.slot as usize)?;
            }
            step = ctx.quadtree.resume()?;
        }
        Ok(())
    }
}

impl Game for Demo {
    fn init(&mut self, ctx: &mut Context) -> GfmResult<()> {
        let texture = ctx.video_mut().add_texture(40, 8, build_texture())?;
        let set = ctx.add_spriteset(texture, 8, 8)?;
        let spriteset = *ctx.spriteset(set)?;

        let mut parser = Parser::new(MAP);
        let loaded = Tilemap::load(&mut parser, spriteset, &[("wall", WALL)])?;
        for record in &loaded.records {
            if let Record::Object { name, x, y, .. } = record {
                if name == "spawn" {
                    self.player.set_position(*x, *y);
                }
            }
        }
        let (width, height) = loaded.tilemap.dimensions();
        ctx.camera.set_world_dimensions(width, height)?;
        log::info!("Map has {} collision area(s)", loaded.tilemap.areas().len());
        self.map = Some(loaded.tilemap);

        let config = GroupConfig::default()
            .with_spriteset(spriteset)
            .with_dimensions(2, 2, 0, 0)
            .with_acceleration(0.0, 200.0)
            .with_type(SPARK)
            .with_ttl(Some(1500))
            .with_die_on_leave(true)
            .with_max_len(64)
            .with_draw_order(DrawOrder::NewestFirst);
        self.sparks = Some(Group::new(1, config)?);
        ctx.set_background_color(0x10_1018);
        Ok(())
    }

    fn update(&mut self, ctx: &mut Context) -> GfmResult<()> {
        let ms = ctx.delta_ms();
        self.player.update(ctx.delta_secs());
        if let Some(map) = self.map.as_mut() {
            map.update(ms);
        }

        self.spawn_timer += ms;
        while self.spawn_timer >= 100 {
            self.spawn_timer -= 100;
            self.emit_spark()?;
        }
        if let Some(sparks) = self.sparks.as_mut() {
            sparks.update(ms, &ctx.camera);
        }

        self.collide(ctx)?;
        if self.player.collision().contains(Collision::DOWN) {
            self.player.set_vertical_velocity(-180.0);
        }
        Ok(())
    }

    fn draw(&mut self, ctx: &mut Context) -> GfmResult<()> {
        let (video, camera) = ctx.draw_target();
        if let Some(map) = &self.map {
            map.draw(video, camera)?;
        }
        let (cx, cy) = camera.position();
        let (x, y) = self.player.position();
        video.fill_rect(x - cx, y - cy, 8, 8, 0xffe0_3030)?;
        if let Some(sparks) = self.sparks.as_mut() {
            sparks.draw(video, camera)?;
        }
        Ok(())
    }

    fn shutdown(&mut self, ctx: &mut Context) {
        log::info!("Demo done: {}", ctx.fps.format_stats(&ctx.scheduler));
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    Context::init_logging();

    let cli = Cli::parse();

    let config = ContextConfig::default()
        .with_title("gframe demo")
        .with_size(80, 48)
        .with_quadtree(4, 4);
    let step_ms = 16;
    let events = FixedStepSource::new(step_ms).with_limit(cli.seconds * 1000 / step_ms);
    let video = SoftwareBackend::new(config.width, config.height)?;
    let mut ctx = Context::new(config, Box::new(video), Box::new(events))?;

    if let Some(path) = &cli.gif {
        let frames = cli.seconds * ctx.config().dps;
        ctx.record_gif(frames, path.clone())?;
    }

    let mut demo = Demo::new()?;
    ctx.run(&mut demo)?;

    if let Some(path) = &cli.png {
        ctx.snapshot(path)?;
    }
    if let Some(path) = &cli.gif {
        log::info!("GIF written to {}", path.display());
    }
    Ok(())
}
