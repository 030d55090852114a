//! Frame-based sprite animation
//!
//! An animation is a list of tile indices played at a fixed rate. Looping
//! animations wrap to the first frame; one-shot animations stop on the last.

use crate::core::error::{GfmError, GfmResult};

/// A sequence of tiles played at a constant frame rate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Animation {
    frames: Vec<usize>,
    fps: u32,
    /// Milliseconds each frame stays on screen
    delay: u32,
    looped: bool,
    elapsed: u32,
    index: usize,
    loop_count: u32,
    just_changed_frame: bool,
    just_looped: bool,
}

impl Animation {
    /// # Errors
    ///
    /// Returns `InvalidArgument` for an empty frame list, or a zero frame
    /// rate on a multi-frame animation
    pub fn new(frames: Vec<usize>, fps: u32, looped: bool) -> GfmResult<Self> {
        if frames.is_empty() {
            return Err(GfmError::InvalidArgument("animation has no frames".into()));
        }
        if fps == 0 && frames.len() > 1 {
            return Err(GfmError::InvalidArgument(
                "multi-frame animation needs a frame rate".into(),
            ));
        }
        Ok(Self {
            frames,
            fps,
            delay: if fps == 0 { 0 } else { 1000 / fps },
            looped,
            elapsed: 0,
            index: 0,
            loop_count: 0,
            just_changed_frame: false,
            just_looped: false,
        })
    }

    /// Parse packed animation data.
    ///
    /// Each animation is `[frame_count, fps, looped, frames...]`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if the data is truncated or holds a
    /// negative value
    pub fn parse_template(data: &[i32]) -> GfmResult<Vec<Self>> {
        let mut animations = Vec::new();
        let mut rest = data;
        while !rest.is_empty() {
            let [count, fps, looped, tail @ ..] = rest else {
                return Err(GfmError::InvalidArgument(
                    "animation header is truncated".into(),
                ));
            };
            let count = usize::try_from(*count)
                .map_err(|_| GfmError::InvalidArgument(format!("bad frame count {count}")))?;
            let fps = u32::try_from(*fps)
                .map_err(|_| GfmError::InvalidArgument(format!("bad frame rate {fps}")))?;
            if tail.len() < count {
                return Err(GfmError::InvalidArgument(format!(
                    "animation expects {count} frames, found {}",
                    tail.len()
                )));
            }
            let frames = tail[..count]
                .iter()
                .map(|&f| usize::try_from(f))
                .collect::<Result<Vec<_>, _>>()
                .map_err(|_| GfmError::InvalidArgument("negative frame index".into()))?;
            animations.push(Self::new(frames, fps, *looped != 0)?);
            rest = &tail[count..];
        }
        Ok(animations)
    }

    /// Advance by `ms` milliseconds.
    ///
    /// # Errors
    ///
    /// Returns `AnimationAlreadyFinished` for a one-shot animation that
    /// already reached its end
    pub fn update(&mut self, ms: u32) -> GfmResult<()> {
        if self.did_finish() {
            return Err(GfmError::AnimationAlreadyFinished);
        }
        self.just_changed_frame = false;
        self.just_looped = false;
        self.elapsed += ms;

        while self.elapsed > self.delay {
            self.elapsed -= self.delay;
            self.index += 1;
            self.just_changed_frame = true;

            if self.index >= self.frames.len() {
                self.loop_count += 1;
                self.just_looped = true;
                if self.looped {
                    self.index = 0;
                } else {
                    self.index = self.frames.len() - 1;
                    break;
                }
            }
            if self.delay == 0 {
                break;
            }
        }
        Ok(())
    }

    /// Rewind to the first frame
    pub fn reset(&mut self) {
        self.elapsed = 0;
        self.index = 0;
        self.loop_count = 0;
        self.just_changed_frame = false;
        self.just_looped = false;
    }

    /// Tile of the current frame
    #[inline]
    #[must_use]
    pub fn frame(&self) -> usize {
        self.frames[self.index]
    }

    #[inline]
    #[must_use]
    pub const fn fps(&self) -> u32 {
        self.fps
    }

    #[inline]
    #[must_use]
    pub const fn is_looped(&self) -> bool {
        self.looped
    }

    #[must_use]
    pub const fn loop_count(&self) -> u32 {
        self.loop_count
    }

    /// Reached the end at least once
    #[must_use]
    pub const fn did_loop(&self) -> bool {
        self.loop_count > 0
    }

    #[must_use]
    pub const fn did_just_loop(&self) -> bool {
        self.just_looped
    }

    #[must_use]
    pub const fn did_just_change_frame(&self) -> bool {
        self.just_changed_frame
    }

    /// One-shot animation resting on its last frame
    #[must_use]
    pub const fn did_finish(&self) -> bool {
        !self.looped && self.loop_count > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frames_advance_after_delay() {
        // 10 fps: 100ms per frame
        let mut anim = Animation::new(vec![4, 5, 6], 10, true).unwrap();
        anim.update(100).unwrap();
        assert_eq!(anim.frame(), 4, "Frame changes only once the delay is exceeded");
        anim.update(1).unwrap();
        assert_eq!(anim.frame(), 5);
        assert!(anim.did_just_change_frame());
        anim.update(10).unwrap();
        assert!(!anim.did_just_change_frame());
    }

    #[test]
    fn test_looping() {
        let mut anim = Animation::new(vec![1, 2], 10, true).unwrap();
        anim.update(201).unwrap();
        assert_eq!(anim.frame(), 1);
        assert!(anim.did_just_loop());
        assert_eq!(anim.loop_count(), 1);
        anim.update(1).unwrap();
        assert!(!anim.did_just_loop());
        assert!(anim.did_loop());
    }

    #[test]
    fn test_one_shot_stops_on_last_frame() {
        let mut anim = Animation::new(vec![1, 2, 3], 10, false).unwrap();
        anim.update(1000).unwrap();
        assert_eq!(anim.frame(), 3);
        assert!(anim.did_finish());
        assert_eq!(anim.update(10), Err(GfmError::AnimationAlreadyFinished));

        anim.reset();
        assert_eq!(anim.frame(), 1);
        assert!(!anim.did_finish());
    }

    #[test]
    fn test_single_frame_without_rate() {
        let mut anim = Animation::new(vec![9], 0, true).unwrap();
        anim.update(16).unwrap();
        assert_eq!(anim.frame(), 9);
        assert!(Animation::new(vec![1, 2], 0, true).is_err());
        assert!(Animation::new(Vec::new(), 8, true).is_err());
    }

    #[test]
    fn test_parse_template() {
        let data = [2, 8, 1, 0, 1, 1, 0, 0, 5];
        let anims = Animation::parse_template(&data).unwrap();
        assert_eq!(anims.len(), 2);
        assert_eq!(anims[0].fps(), 8);
        assert!(anims[0].is_looped());
        assert_eq!(anims[1].frame(), 5);
        assert!(!anims[1].is_looped());

        assert!(Animation::parse_template(&[3, 8, 1, 0]).is_err());
        assert!(Animation::parse_template(&[1, 8]).is_err());
    }
}
