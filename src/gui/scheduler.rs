use log::{trace, warn};

use crate::error::Result;
use crate::fractal::params::{ParameterBlock, COLOR_CYCLE_MAX};
use crate::gpu::dispatch::DispatchGrid;

/// Fournisseur de cible de rendu (surface de présentation + file GPU).
pub trait RenderTargetProvider {
    type Target;

    /// Retourne une cible disponible, ou `None` si la surface n'en offre pas
    /// pour cette frame.
    fn acquire(&mut self) -> Option<Self::Target>;

    /// Copie les paramètres, lance le calcul sur `grid` puis présente `target`.
    fn dispatch_and_present(
        &mut self,
        target: Self::Target,
        params: &ParameterBlock,
        grid: &DispatchGrid,
    ) -> Result<()>;
}

/// Issue d'une opportunité de présentation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameOutcome {
    /// Rien n'a changé depuis le dernier calcul.
    Clean,
    /// Paramètres modifiés mais aucune cible disponible : nouvel essai plus tard.
    Deferred,
    /// Calcul lancé et présenté.
    Dispatched,
    /// La soumission a échoué ; l'état reste sale.
    Failed,
}

/// Décide une fois par frame s'il faut relancer le calcul.
///
/// L'état initial est sale pour forcer une première image.
#[derive(Debug)]
pub struct RecomputeScheduler {
    dirty: bool,
    dispatch_count: u64,
}

impl Default for RecomputeScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl RecomputeScheduler {
    pub fn new() -> Self {
        Self {
            dirty: true,
            dispatch_count: 0,
        }
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Nombre de calculs lancés avec succès depuis le démarrage.
    pub fn dispatch_count(&self) -> u64 {
        self.dispatch_count
    }

    pub fn run_frame<P: RenderTargetProvider>(
        &mut self,
        params: &mut ParameterBlock,
        grid: &DispatchGrid,
        provider: &mut P,
    ) -> FrameOutcome {
        if !self.dirty {
            return FrameOutcome::Clean;
        }
        let Some(target) = provider.acquire() else {
            trace!("aucune cible disponible, calcul reporté");
            return FrameOutcome::Deferred;
        };

        advance_color_cycle(params);

        match provider.dispatch_and_present(target, params, grid) {
            Ok(()) => {
                self.dirty = false;
                self.dispatch_count += 1;
                trace!(
                    "calcul #{} (cycle {}, grille {:?})",
                    self.dispatch_count,
                    params.color_cycle_offset,
                    grid.groups
                );
                FrameOutcome::Dispatched
            }
            Err(e) => {
                warn!("échec du calcul GPU: {e}");
                FrameOutcome::Failed
            }
        }
    }
}

/// Avance le cycle de couleurs : 0, 1, ..., 256, 0, ...
pub fn advance_color_cycle(params: &mut ParameterBlock) {
    params.color_cycle_offset += 1;
    if params.color_cycle_offset > COLOR_CYCLE_MAX {
        params.color_cycle_offset = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ViewerError;
    use crate::gpu::dispatch::DispatchPlanner;

    /// Surface factice qui compte les calculs.
    struct FakeSurface {
        available: bool,
        fail: bool,
        dispatched: Vec<i32>,
    }

    impl FakeSurface {
        fn new() -> Self {
            Self { available: true, fail: false, dispatched: Vec::new() }
        }
    }

    impl RenderTargetProvider for FakeSurface {
        type Target = ();

        fn acquire(&mut self) -> Option<()> {
            self.available.then_some(())
        }

        fn dispatch_and_present(
            &mut self,
            _target: (),
            params: &ParameterBlock,
            _grid: &DispatchGrid,
        ) -> Result<()> {
            if self.fail {
                return Err(ViewerError::NoOutput);
            }
            self.dispatched.push(params.color_cycle_offset);
            Ok(())
        }
    }

    fn grid() -> DispatchGrid {
        DispatchPlanner::new(32, 1024).unwrap().plan(512, 512)
    }

    #[test]
    fn test_initial_state_dispatches_once() {
        let mut scheduler = RecomputeScheduler::new();
        let mut params = ParameterBlock::default();
        let mut surface = FakeSurface::new();

        assert!(scheduler.is_dirty());
        assert_eq!(scheduler.run_frame(&mut params, &grid(), &mut surface), FrameOutcome::Dispatched);
        assert!(!scheduler.is_dirty());

        for _ in 0..10 {
            assert_eq!(scheduler.run_frame(&mut params, &grid(), &mut surface), FrameOutcome::Clean);
        }
        assert_eq!(surface.dispatched.len(), 1);

        scheduler.mark_dirty();
        scheduler.mark_dirty();
        assert_eq!(scheduler.run_frame(&mut params, &grid(), &mut surface), FrameOutcome::Dispatched);
        assert_eq!(scheduler.run_frame(&mut params, &grid(), &mut surface), FrameOutcome::Clean);
        assert_eq!(surface.dispatched.len(), 2);
        assert_eq!(scheduler.dispatch_count(), 2);
    }

    #[test]
    fn test_no_target_stays_dirty() {
        let mut scheduler = RecomputeScheduler::new();
        let mut params = ParameterBlock::default();
        let mut surface = FakeSurface::new();
        surface.available = false;

        for _ in 0..3 {
            assert_eq!(scheduler.run_frame(&mut params, &grid(), &mut surface), FrameOutcome::Deferred);
        }
        assert!(scheduler.is_dirty());
        // Le cycle n'avance pas sans calcul
        assert_eq!(params.color_cycle_offset, 0);

        surface.available = true;
        assert_eq!(scheduler.run_frame(&mut params, &grid(), &mut surface), FrameOutcome::Dispatched);
        assert_eq!(surface.dispatched, vec![1]);
    }

    #[test]
    fn test_failed_dispatch_stays_dirty() {
        let mut scheduler = RecomputeScheduler::new();
        let mut params = ParameterBlock::default();
        let mut surface = FakeSurface::new();
        surface.fail = true;

        assert_eq!(scheduler.run_frame(&mut params, &grid(), &mut surface), FrameOutcome::Failed);
        assert!(scheduler.is_dirty());
        assert_eq!(scheduler.dispatch_count(), 0);
    }

    #[test]
    fn test_color_cycle_wraps_after_256() {
        let mut scheduler = RecomputeScheduler::new();
        let mut params = ParameterBlock::default();
        let mut surface = FakeSurface::new();

        for _ in 0..600 {
            scheduler.mark_dirty();
            scheduler.run_frame(&mut params, &grid(), &mut surface);
        }

        let expected: Vec<i32> = (1..=600).map(|n| n % 257).collect();
        assert_eq!(surface.dispatched, expected);
        assert_eq!(surface.dispatched[255], 256);
        assert_eq!(surface.dispatched[256], 0);
        assert!(surface.dispatched.iter().all(|&c| (0..=256).contains(&c)));
    }
}
