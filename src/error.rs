use thiserror::Error;

/// Erreurs du visualiseur.
///
/// Les variantes d'initialisation (état wgpu absent, pipeline invalide,
/// limites de dispatch incohérentes) sont fatales : sans GPU de calcul
/// le visualiseur ne peut pas démarrer.
#[derive(Debug, Error)]
pub enum ViewerError {
    #[error("état de rendu wgpu indisponible (le visualiseur exige le renderer wgpu d'eframe)")]
    MissingRenderState,

    #[error("création du pipeline de calcul impossible: {0}")]
    Pipeline(String),

    #[error(
        "limites de dispatch invalides: largeur d'exécution {execution_width}, \
         threads max par groupe {max_threads_per_group}"
    )]
    InvalidDispatchLimits {
        execution_width: u32,
        max_threads_per_group: u32,
    },

    #[error("aucune texture de sortie à capturer")]
    NoOutput,

    #[error("lecture de la texture de sortie échouée: {0}")]
    Readback(#[from] wgpu::BufferAsyncError),

    #[error("écriture de l'image échouée: {0}")]
    Image(#[from] image::ImageError),

    #[error("erreur d'entrée/sortie: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ViewerError>;
