use num_complex::Complex32;

use crate::fractal::params::{ParameterBlock, RADIAL_MAX, RADIAL_MIN};
use crate::gui::scheduler::RecomputeScheduler;

/// Sensibilité du déplacement (bouton principal).
const PAN_SENSITIVITY: f32 = 5.0;
/// Sensibilité de la modification de l'équation (bouton secondaire).
const EQUATION_SENSITIVITY: f32 = 0.2;
/// Diviseur appliqué au delta de molette.
const SCROLL_DIVISOR: f32 = 50.0;
/// Pas de la distorsion radiale par appui.
const RADIAL_STEP: f32 = 0.01;

/// Traduit les deltas de la fenêtre en modifications du bloc de paramètres.
///
/// Toute opération marque le planificateur comme sale.
pub struct ViewportMapper<'a> {
    params: &'a mut ParameterBlock,
    scheduler: &'a mut RecomputeScheduler,
}

impl<'a> ViewportMapper<'a> {
    pub fn new(params: &'a mut ParameterBlock, scheduler: &'a mut RecomputeScheduler) -> Self {
        Self { params, scheduler }
    }

    fn top_left(&self) -> Complex32 {
        Complex32::new(self.params.top_left[0], self.params.top_left[1])
    }

    fn set_top_left(&mut self, z: Complex32) {
        self.params.top_left = [z.re, z.im];
    }

    /// Déplacement : vitesse inversement proportionnelle au zoom.
    pub fn pan(&mut self, delta_x: f32, delta_y: f32) {
        let scale = PAN_SENSITIVITY / self.params.zoom;
        let z = self.top_left() - Complex32::new(delta_x, delta_y) * scale;
        self.set_top_left(z);
        self.scheduler.mark_dirty();
    }

    pub fn adjust_equation(&mut self, delta_x: f32, delta_y: f32) {
        let scale = EQUATION_SENSITIVITY / self.params.zoom;
        self.params.imag_scale += delta_x * scale;
        self.params.real_scale += delta_y * scale;
        self.scheduler.mark_dirty();
    }

    /// Point complexe ancré par `zoom_at` : le coin opposé `(w, h) / zoom`,
    /// pas le centre (la grille de calcul étant doublée, il tombe au centre
    /// de l'image calculée).
    pub fn anchor(&self, viewport_width: f32, viewport_height: f32) -> Complex32 {
        self.top_left() + Complex32::new(viewport_width, viewport_height) / self.params.zoom
    }

    /// Zoom à la molette, le point d'ancrage restant fixe.
    pub fn zoom_at(&mut self, scroll_delta_y: f32, viewport_width: f32, viewport_height: f32) {
        let anchor = self.anchor(viewport_width, viewport_height);
        self.params.zoom *= 1.0 - scroll_delta_y / SCROLL_DIVISOR;
        let extent = Complex32::new(viewport_width, viewport_height) / self.params.zoom;
        self.set_top_left(anchor - extent);
        self.scheduler.mark_dirty();
    }

    /// `direction` vaut -1 ou +1 ; le résultat est borné à [0, 1.9].
    pub fn adjust_radial_symmetry(&mut self, direction: f32) {
        self.params.radial_amount =
            (self.params.radial_amount + direction * RADIAL_STEP).clamp(RADIAL_MIN, RADIAL_MAX);
        self.scheduler.mark_dirty();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clean_state() -> (ParameterBlock, RecomputeScheduler) {
        let mut scheduler = RecomputeScheduler::new();
        // Sortir de l'état sale initial
        let mut surface = NullSurface;
        let mut params = ParameterBlock::default();
        let grid = crate::gpu::dispatch::DispatchPlanner::new(32, 256).unwrap().plan(10, 10);
        scheduler.run_frame(&mut params, &grid, &mut surface);
        assert!(!scheduler.is_dirty());
        (params, scheduler)
    }

    struct NullSurface;

    impl crate::gui::scheduler::RenderTargetProvider for NullSurface {
        type Target = ();

        fn acquire(&mut self) -> Option<()> {
            Some(())
        }

        fn dispatch_and_present(
            &mut self,
            _target: (),
            _params: &ParameterBlock,
            _grid: &crate::gpu::dispatch::DispatchGrid,
        ) -> crate::error::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_pan_moves_only_top_left() {
        for zoom in [0.5f32, 1.0, 700.0, 12345.0] {
            for (dx, dy) in [(1.0f32, 0.0f32), (-3.5, 7.25), (120.0, -64.0)] {
                let (mut params, mut scheduler) = clean_state();
                params.zoom = zoom;
                let before = params;

                ViewportMapper::new(&mut params, &mut scheduler).pan(dx, dy);

                let expected_x = before.top_left[0] - dx * 5.0 / zoom;
                let expected_y = before.top_left[1] - dy * 5.0 / zoom;
                assert!((params.top_left[0] - expected_x).abs() <= 1e-5 * expected_x.abs().max(1.0));
                assert!((params.top_left[1] - expected_y).abs() <= 1e-5 * expected_y.abs().max(1.0));

                let mut rest = params;
                rest.top_left = before.top_left;
                assert_eq!(rest, before);
                assert!(scheduler.is_dirty());
            }
        }
    }

    #[test]
    fn test_adjust_equation() {
        let (mut params, mut scheduler) = clean_state();
        params.zoom = 100.0;
        ViewportMapper::new(&mut params, &mut scheduler).adjust_equation(3.0, 2.0);

        assert!((params.imag_scale - (0.6 + 3.0 * 0.002)).abs() < 1e-6);
        assert!((params.real_scale - (-0.4 + 2.0 * 0.002)).abs() < 1e-6);
        assert_eq!(params.top_left, crate::fractal::params::HOME_TOP_LEFT);
        assert!(scheduler.is_dirty());
    }

    #[test]
    fn test_zoom_at_keeps_anchor_fixed() {
        for scroll in [-40.0f32, -5.0, -0.5, 0.25, 3.0, 20.0, 45.0] {
            let (mut params, mut scheduler) = clean_state();
            let mut mapper = ViewportMapper::new(&mut params, &mut scheduler);
            let before = mapper.anchor(800.0, 600.0);

            mapper.zoom_at(scroll, 800.0, 600.0);

            let after = mapper.anchor(800.0, 600.0);
            assert!((before - after).norm() < 1e-4, "scroll {scroll}: {before} != {after}");
            assert!(scheduler.is_dirty());
        }
    }

    #[test]
    fn test_zoom_at_scales_zoom() {
        let (mut params, mut scheduler) = clean_state();
        ViewportMapper::new(&mut params, &mut scheduler).zoom_at(5.0, 500.0, 500.0);
        assert!((params.zoom - 700.0 * 0.9).abs() < 1e-3);
        assert!(params.zoom > 0.0);
    }

    #[test]
    fn test_radial_symmetry_is_clamped() {
        let (mut params, mut scheduler) = clean_state();
        let mut mapper = ViewportMapper::new(&mut params, &mut scheduler);
        for _ in 0..500 {
            mapper.adjust_radial_symmetry(1.0);
        }
        assert_eq!(params.radial_amount, 1.9);

        let mut mapper = ViewportMapper::new(&mut params, &mut scheduler);
        mapper.adjust_radial_symmetry(-1.0);
        assert!((params.radial_amount - 1.89).abs() < 1e-5);

        let mut mapper = ViewportMapper::new(&mut params, &mut scheduler);
        for _ in 0..500 {
            mapper.adjust_radial_symmetry(-1.0);
        }
        assert_eq!(params.radial_amount, 0.0);
        assert!(scheduler.is_dirty());
    }
}
