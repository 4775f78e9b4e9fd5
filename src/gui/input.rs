//! Contrôleur d'entrées : traduit les événements souris/clavier en
//! opérations du `ViewportMapper` et en effets sur la fenêtre.
//!
//! Tout passe par le thread UI. Le minuteur du bouton secondaire n'est pas
//! un thread séparé : il produit des événements `Tick` dans la même boucle.

use std::time::{Duration, Instant};

use log::{debug, info};

use crate::fractal::params::ParameterBlock;
use crate::fractal::viewport::ViewportMapper;
use crate::gpu::dispatch::{DispatchGrid, DispatchPlanner};
use crate::gui::scheduler::RecomputeScheduler;

/// Taille minimale de la surface (points).
pub const MIN_SURFACE_SIZE: (u32, u32) = (500, 500);
/// Période du minuteur de dérive de l'équation.
pub const TICK_INTERVAL: Duration = Duration::from_millis(10);
/// Diviseur du delta maintenu par rapport au point d'ancrage.
const HELD_DELTA_DIVISOR: f32 = 100.0;
/// Au-delà de 50 lignes par événement le zoom deviendrait négatif.
const MAX_SCROLL_LINES: f32 = 45.0;
/// Ticks rattrapés au plus par frame après une frame longue.
const MAX_TICKS_PER_FRAME: u32 = 10;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum InputEvent {
    /// Glissement avec le bouton principal (delta incrémental).
    PrimaryDrag { dx: f32, dy: f32 },
    SecondaryPress { x: f32, y: f32 },
    /// Position absolue du pointeur pendant un glissement secondaire.
    SecondaryDrag { x: f32, y: f32 },
    SecondaryRelease,
    Tick,
    /// Molette, en lignes.
    Scroll { delta_y: f32 },
    RadialSymmetry { direction: f32 },
    ResetView,
    Screenshot,
    /// Nouvelle taille de la surface, en points.
    Resize { width: u32, height: u32 },
    Quit,
}

/// Effet à appliquer par l'hôte après un événement.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Effect {
    None,
    Quit,
    Screenshot,
    /// La surface a changé ; `grow_window` demande d'agrandir la fenêtre
    /// jusqu'à `width`×`height`.
    Resized {
        width: u32,
        height: u32,
        grow_window: bool,
    },
}

/// Delta maintenu par le bouton secondaire, relatif au point d'appui.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct HeldDelta {
    latch: Option<[f32; 2]>,
    delta: [f32; 2],
}

impl HeldDelta {
    pub fn press(&mut self, x: f32, y: f32) {
        self.latch = Some([x, y]);
        self.delta = [0.0, 0.0];
    }

    pub fn drag(&mut self, x: f32, y: f32) {
        if let Some([lx, ly]) = self.latch {
            self.delta = [(x - lx) / HELD_DELTA_DIVISOR, (y - ly) / HELD_DELTA_DIVISOR];
        }
    }

    pub fn release(&mut self) {
        self.latch = None;
        self.delta = [0.0, 0.0];
    }

    pub fn delta(&self) -> [f32; 2] {
        self.delta
    }

    pub fn is_active(&self) -> bool {
        self.delta != [0.0, 0.0]
    }
}

/// Horloge à pas fixe qui convertit le temps écoulé en nombre de ticks.
#[derive(Clone, Copy, Debug)]
pub struct TickClock {
    interval: Duration,
    last: Instant,
}

impl TickClock {
    pub fn new(interval: Duration, now: Instant) -> Self {
        Self { interval, last: now }
    }

    pub fn reset(&mut self, now: Instant) {
        self.last = now;
    }

    /// Nombre de périodes complètes écoulées depuis le dernier appel.
    pub fn due(&mut self, now: Instant) -> u32 {
        let elapsed = now.saturating_duration_since(self.last);
        let ticks = elapsed.as_nanos() / self.interval.as_nanos().max(1);
        if ticks >= MAX_TICKS_PER_FRAME as u128 {
            self.last = now;
            return MAX_TICKS_PER_FRAME;
        }
        let ticks = ticks as u32;
        self.last += self.interval * ticks;
        ticks
    }
}

pub struct InputController {
    planner: DispatchPlanner,
    grid: DispatchGrid,
    viewport: (u32, u32),
    held: HeldDelta,
    clock: TickClock,
}

impl InputController {
    pub fn new(planner: DispatchPlanner, now: Instant) -> Self {
        Self {
            planner,
            grid: planner.plan(0, 0),
            viewport: (0, 0),
            held: HeldDelta::default(),
            clock: TickClock::new(TICK_INTERVAL, now),
        }
    }

    pub fn grid(&self) -> &DispatchGrid {
        &self.grid
    }

    /// Taille courante de la surface, en points.
    pub fn viewport(&self) -> (u32, u32) {
        self.viewport
    }

    /// Taille de la grille de calcul (surface doublée).
    pub fn output_size(&self) -> (u32, u32) {
        self.planner.output_size(self.viewport.0, self.viewport.1)
    }

    pub fn held_delta(&self) -> [f32; 2] {
        self.held.delta()
    }

    pub fn is_holding(&self) -> bool {
        self.held.is_active()
    }

    /// Ticks du minuteur à injecter pour cette frame. Sans delta maintenu
    /// l'horloge est recalée pour éviter une rafale à la reprise.
    pub fn ticks_due(&mut self, now: Instant) -> u32 {
        if !self.held.is_active() {
            self.clock.reset(now);
            return 0;
        }
        self.clock.due(now)
    }

    pub fn handle(
        &mut self,
        event: InputEvent,
        params: &mut ParameterBlock,
        scheduler: &mut RecomputeScheduler,
    ) -> Effect {
        match event {
            InputEvent::PrimaryDrag { dx, dy } => {
                ViewportMapper::new(params, scheduler).pan(dx, dy);
            }
            InputEvent::SecondaryPress { x, y } => self.held.press(x, y),
            InputEvent::SecondaryDrag { x, y } => self.held.drag(x, y),
            InputEvent::SecondaryRelease => self.held.release(),
            InputEvent::Tick => {
                if self.held.is_active() {
                    let [dx, dy] = self.held.delta();
                    ViewportMapper::new(params, scheduler).adjust_equation(dx, dy);
                }
            }
            InputEvent::Scroll { delta_y } => {
                let delta_y = delta_y.clamp(-MAX_SCROLL_LINES, MAX_SCROLL_LINES);
                let (w, h) = self.viewport;
                ViewportMapper::new(params, scheduler).zoom_at(delta_y, w as f32, h as f32);
            }
            InputEvent::RadialSymmetry { direction } => {
                ViewportMapper::new(params, scheduler).adjust_radial_symmetry(direction);
            }
            InputEvent::ResetView => {
                *params = ParameterBlock {
                    output_width: params.output_width,
                    output_height: params.output_height,
                    color_cycle_offset: params.color_cycle_offset,
                    ..ParameterBlock::default()
                };
                scheduler.mark_dirty();
                debug!("vue réinitialisée");
            }
            InputEvent::Resize { width, height } => return self.resize(width, height, params, scheduler),
            InputEvent::Screenshot => return Effect::Screenshot,
            InputEvent::Quit => return Effect::Quit,
        }
        Effect::None
    }

    fn resize(
        &mut self,
        width: u32,
        height: u32,
        params: &mut ParameterBlock,
        scheduler: &mut RecomputeScheduler,
    ) -> Effect {
        // Surface nulle (fenêtre réduite) : pas de minimum à imposer.
        let (enforced_w, enforced_h) = if width == 0 || height == 0 {
            (0, 0)
        } else {
            (width.max(MIN_SURFACE_SIZE.0), height.max(MIN_SURFACE_SIZE.1))
        };
        let grow_window = (enforced_w, enforced_h) != (width, height);
        if grow_window {
            info!(
                "surface {}x{} sous le minimum, agrandie à {}x{}",
                width, height, enforced_w, enforced_h
            );
        }

        self.viewport = (enforced_w, enforced_h);
        self.grid = self.planner.plan(enforced_w, enforced_h);
        let (out_w, out_h) = self.output_size();
        params.output_width = out_w as i32;
        params.output_height = out_h as i32;
        debug_assert!(self.grid.covers(out_w, out_h));
        scheduler.mark_dirty();

        debug!(
            "surface {}x{} → grille {}x{}, groupes {:?}",
            enforced_w, enforced_h, out_w, out_h, self.grid.groups
        );
        Effect::Resized {
            width: enforced_w,
            height: enforced_h,
            grow_window,
        }
    }
}
