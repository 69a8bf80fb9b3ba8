use std::path::Path;
use std::time::{Duration, Instant};

use image::Rgba;
use uuid::Uuid;

use crate::assets::{EngineSettings, fallback_template};
use crate::canvas::{Bitmap, Point, WHITE};
use crate::components::history::HistoryManager;
use crate::io::{self, DecodeError, ProjectError, ProjectFileV1};
use crate::ops::boundary::BoundaryMasks;
use crate::ops::brush::{self, BrushMode};
use crate::ops::{edge_coat, fill};
use crate::{log_err, log_info, log_warn};

/// A drag in progress.
#[derive(Clone, Copy, Debug)]
struct ActiveStroke {
    mode: BrushMode,
    radius: u32,
    last: Point,
}

/// One editing session: a single live bitmap, the template it came from,
/// the template's boundary masks and the undo history.
///
/// Operations run to completion one at a time; sessions share nothing, so
/// independent sessions may live on different threads.
pub struct ColoringSession {
    pub id: Uuid,
    settings: EngineSettings,
    bitmap: Bitmap,
    /// Untouched template, the eraser's source of truth.
    template: Bitmap,
    masks: BoundaryMasks,
    history: HistoryManager,
    stroke: Option<ActiveStroke>,

    /// Last encoded image handed out by `current_image`.
    published: Option<Vec<u8>>,
    last_encode: Option<Instant>,

    /// True when edits happened since the last project save/load.
    pub is_dirty: bool,
}

impl ColoringSession {
    /// New session showing a blank white canvas of the fallback size.
    pub fn new(settings: EngineSettings) -> Self {
        let blank = Bitmap::new_filled(
            settings.fallback_width.max(1),
            settings.fallback_height.max(1),
            WHITE,
        );
        Self::with_template(settings, blank, None)
    }

    fn with_template(settings: EngineSettings, template: Bitmap, current: Option<Bitmap>) -> Self {
        let masks = BoundaryMasks::build(&template);
        let bitmap = current
            .filter(|c| c.same_size(&template))
            .unwrap_or_else(|| template.clone());
        let history = HistoryManager::new(bitmap.clone(), settings.max_undo_steps);
        let mut session = Self {
            id: Uuid::new_v4(),
            settings,
            bitmap,
            template,
            masks,
            history,
            stroke: None,
            published: None,
            last_encode: None,
            is_dirty: false,
        };
        session.publish();
        session
    }

    /// Replace the template. On decode failure a synthesised outline sized to
    /// the fallback viewport is installed instead, the error is logged and
    /// returned, and the session remains fully usable.
    pub fn load_template(&mut self, bytes: &[u8]) -> Result<(), DecodeError> {
        let (template, result) = match io::decode(bytes) {
            Ok(bmp) => {
                log_info!(
                    "session {}: loaded template {}x{}",
                    self.id,
                    bmp.width(),
                    bmp.height()
                );
                (bmp, Ok(()))
            }
            Err(e) => {
                log_warn!("session {}: template decode failed ({}), using fallback", self.id, e);
                let bmp = fallback_template(self.settings.fallback_width, self.settings.fallback_height);
                (bmp, Err(e))
            }
        };
        self.install_template(template, None);
        result
    }

    /// Set a new template (and optionally an already-edited image of the same size).
    fn install_template(&mut self, template: Bitmap, current: Option<Bitmap>) {
        self.masks = BoundaryMasks::build(&template);
        self.bitmap = current
            .filter(|c| c.same_size(&template))
            .unwrap_or_else(|| template.clone());
        self.template = template;
        self.history = HistoryManager::new(self.bitmap.clone(), self.settings.max_undo_steps);
        self.stroke = None;
        self.is_dirty = false;
        self.publish();
    }

    /// Tap-to-fill at `(x, y)`. Returns the number of pixels painted, counting
    /// the edge coat; zero means nothing changed and nothing was recorded.
    pub fn flood_fill(&mut self, x: i32, y: i32, color: Rgba<u8>) -> usize {
        if self.stroke.is_some() {
            self.end_stroke();
        }

        let mut outcome = fill::flood_fill(
            &mut self.bitmap,
            &self.masks.soft,
            Point::new(x, y),
            color,
            self.settings.fill_options(),
        );
        if outcome.count == 0 {
            log_info!("session {}: fill at ({}, {}) painted nothing", self.id, x, y);
            return 0;
        }

        let coated = edge_coat::refine(&mut self.bitmap, &mut outcome.filled, &self.masks.strict, color);
        let total = outcome.count + coated;
        log_info!(
            "session {}: fill at ({}, {}) painted {} px (+{} edge)",
            self.id,
            x,
            y,
            outcome.count,
            coated
        );

        self.history.commit(&self.bitmap);
        self.is_dirty = true;
        self.publish();
        total
    }

    /// Start a brush or eraser stroke with a single dab at `(x, y)`.
    pub fn begin_stroke(&mut self, x: i32, y: i32, mode: BrushMode, radius: u32) {
        if self.stroke.is_some() {
            self.end_stroke();
        }
        let radius = brush::effective_radius(&self.bitmap, radius);
        let p = brush::clamp_to_reach(&self.bitmap, Point::new(x, y), radius);
        brush::stamp_segment(&mut self.bitmap, &self.template, None, p, radius, mode);
        self.stroke = Some(ActiveStroke {
            mode,
            radius,
            last: p,
        });
        self.maybe_publish();
    }

    /// Continue the active stroke to `(x, y)`. Ignored when no stroke is active.
    pub fn extend_stroke(&mut self, x: i32, y: i32) {
        let Some(stroke) = self.stroke.as_mut() else {
            return;
        };
        let p = brush::clamp_to_reach(&self.bitmap, Point::new(x, y), stroke.radius);
        brush::stamp_segment(
            &mut self.bitmap,
            &self.template,
            Some(stroke.last),
            p,
            stroke.radius,
            stroke.mode,
        );
        stroke.last = p;
        self.maybe_publish();
    }

    /// Finish the active stroke: one history entry and a forced re-encode.
    pub fn end_stroke(&mut self) {
        let Some(stroke) = self.stroke.take() else {
            return;
        };
        self.history.commit(&self.bitmap);
        log_info!(
            "session {}: stroke ended at ({}, {}) {:?} r={}, history {} KiB",
            self.id,
            stroke.last.x,
            stroke.last.y,
            stroke.mode,
            stroke.radius,
            self.history.memory_usage() / 1024
        );
        self.is_dirty = true;
        self.publish();
    }

    pub fn is_stroking(&self) -> bool {
        self.stroke.is_some()
    }

    pub fn undo(&mut self) -> bool {
        if self.stroke.is_some() {
            self.end_stroke();
        }
        match self.history.undo() {
            Some(bmp) => {
                self.bitmap = bmp;
                self.is_dirty = true;
                log_info!("session {}: undo ({} left)", self.id, self.history.undo_count());
                self.publish();
                true
            }
            None => false,
        }
    }

    pub fn redo(&mut self) -> bool {
        if self.stroke.is_some() {
            self.end_stroke();
        }
        match self.history.redo() {
            Some(bmp) => {
                self.bitmap = bmp;
                self.is_dirty = true;
                log_info!("session {}: redo ({} left)", self.id, self.history.redo_count());
                self.publish();
                true
            }
            None => false,
        }
    }

    /// Discard all colouring: back to the untouched template with fresh history.
    pub fn clear(&mut self) {
        self.stroke = None;
        self.bitmap = self.template.clone();
        self.history.clear(&self.template);
        self.is_dirty = true;
        log_info!("session {}: cleared", self.id);
        self.publish();
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// The most recently published encoded image. During a drag this may lag
    /// the live bitmap by up to the encode throttle.
    pub fn current_image(&mut self) -> Vec<u8> {
        if self.published.is_none() {
            self.publish();
        }
        self.published.clone().unwrap_or_else(io::placeholder_image)
    }

    /// [`Self::current_image`] as a `data:image/png;base64,` URL.
    pub fn current_image_data_url(&mut self) -> String {
        io::to_data_url(&self.current_image())
    }

    pub fn bitmap(&self) -> &Bitmap {
        &self.bitmap
    }

    pub fn template(&self) -> &Bitmap {
        &self.template
    }

    pub fn masks(&self) -> &BoundaryMasks {
        &self.masks
    }

    pub fn history(&self) -> &HistoryManager {
        &self.history
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn set_encode_throttle(&mut self, throttle: Duration) {
        self.settings.encode_throttle_ms = throttle.as_millis().min(u64::MAX as u128) as u64;
    }

    // ------------------------------------------------------------------------
    // Publishing
    // ------------------------------------------------------------------------

    fn publish(&mut self) {
        let bytes = match io::encode_png(&self.bitmap) {
            Ok(b) => b,
            Err(e) => {
                log_err!("session {}: encode failed ({}), publishing placeholder", self.id, e);
                io::placeholder_image()
            }
        };
        self.published = Some(bytes);
        self.last_encode = Some(Instant::now());
    }

    /// Re-encode mid-drag only when the throttle interval has passed.
    fn maybe_publish(&mut self) {
        let due = match self.last_encode {
            Some(t) => t.elapsed() >= self.settings.encode_throttle(),
            None => true,
        };
        if due {
            self.publish();
        }
    }

    // ------------------------------------------------------------------------
    // Project files
    // ------------------------------------------------------------------------

    pub fn to_project(&self) -> Result<ProjectFileV1, ProjectError> {
        ProjectFileV1::new(&self.template, &self.bitmap)
    }

    pub fn save_project(&mut self, path: &Path) -> Result<(), ProjectError> {
        if self.stroke.is_some() {
            self.end_stroke();
        }
        io::write_project(&self.to_project()?, path)?;
        self.is_dirty = false;
        log_info!("session {}: saved project {}", self.id, path.display());
        Ok(())
    }

    /// Restore a saved project. History restarts at the saved image.
    pub fn load_project(&mut self, path: &Path) -> Result<(), ProjectError> {
        let (template, current) = io::read_project(path)?.into_bitmaps()?;
        self.install_template(template, Some(current));
        log_info!("session {}: loaded project {}", self.id, path.display());
        Ok(())
    }

    pub fn from_project(settings: EngineSettings, project: ProjectFileV1) -> Result<Self, ProjectError> {
        let (template, current) = project.into_bitmaps()?;
        Ok(Self::with_template(settings, template, Some(current)))
    }
}

impl Default for ColoringSession {
    fn default() -> Self {
        Self::new(EngineSettings::default())
    }
}
