//! Découpage de l'image de sortie en groupes de threads GPU.
//!
//! La grille de calcul est la surface affichée doublée sur chaque axe
//! (sur-échantillonnage fixe ×2). Le nombre de groupes est arrondi par
//! excès d'un groupe complet : le kernel ignore les invocations hors image.

use crate::error::{Result, ViewerError};

/// Facteur de sur-échantillonnage appliqué à la taille de la surface.
pub const SUPERSAMPLING: u32 = 2;

/// Grille de dispatch : nombre de groupes et threads par groupe (z = 1).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DispatchGrid {
    pub groups: [u32; 3],
    pub threads_per_group: [u32; 3],
}

impl DispatchGrid {
    /// Nombre d'invocations lancées sur chaque axe.
    pub fn invocations(&self) -> (u64, u64) {
        (
            self.groups[0] as u64 * self.threads_per_group[0] as u64,
            self.groups[1] as u64 * self.threads_per_group[1] as u64,
        )
    }

    /// Vrai si chaque pixel d'une image `width`×`height` reçoit une invocation.
    pub fn covers(&self, width: u32, height: u32) -> bool {
        let (x, y) = self.invocations();
        x >= width as u64 && y >= height as u64
    }
}

/// Calcule la grille à partir des constantes matérielles.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DispatchPlanner {
    execution_width: u32,
    max_threads_per_group: u32,
}

impl DispatchPlanner {
    pub fn new(execution_width: u32, max_threads_per_group: u32) -> Result<Self> {
        if execution_width == 0 || max_threads_per_group < execution_width {
            return Err(ViewerError::InvalidDispatchLimits {
                execution_width,
                max_threads_per_group,
            });
        }
        Ok(Self {
            execution_width,
            max_threads_per_group,
        })
    }

    /// Threads par groupe : `(largeur d'exécution, max / largeur, 1)`.
    pub fn threads_per_group(&self) -> [u32; 3] {
        [
            self.execution_width,
            self.max_threads_per_group / self.execution_width,
            1,
        ]
    }

    /// Taille de la grille de calcul pour une surface en points.
    pub fn output_size(&self, viewport_width: u32, viewport_height: u32) -> (u32, u32) {
        (
            viewport_width.saturating_mul(SUPERSAMPLING),
            viewport_height.saturating_mul(SUPERSAMPLING),
        )
    }

    pub fn plan(&self, viewport_width: u32, viewport_height: u32) -> DispatchGrid {
        let threads = self.threads_per_group();
        let (width, height) = self.output_size(viewport_width, viewport_height);
        DispatchGrid {
            groups: [1 + width / threads[0], 1 + height / threads[1], 1],
            threads_per_group: threads,
        }
    }
}
