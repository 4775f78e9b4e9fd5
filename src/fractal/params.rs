use bytemuck::{Pod, Zeroable};

/// Coin supérieur gauche de la vue d'accueil (plan complexe).
pub const HOME_TOP_LEFT: [f32; 2] = [-0.152_718_6, -0.899_495_7];
/// Zoom d'accueil (pixels par unité).
pub const HOME_ZOOM: f32 = 700.0;
pub const HOME_REAL_SCALE: f32 = -0.4;
pub const HOME_IMAG_SCALE: f32 = 0.6;

/// Décalage maximal du cycle de couleurs (inclus).
pub const COLOR_CYCLE_MAX: i32 = 256;
/// Bornes de la distorsion radiale.
pub const RADIAL_MIN: f32 = 0.0;
pub const RADIAL_MAX: f32 = 1.9;

/// Bloc de paramètres copié tel quel dans le uniform buffer (binding 0).
///
/// L'ordre des champs et le padding explicite correspondent à la struct
/// `Params` de `julia.wgsl` : 48 octets, `top_left` à l'offset 16 (un
/// `vec2<f32>` WGSL est aligné sur 8), aucun padding implicite (exigé par `Pod`).
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct ParameterBlock {
    /// Largeur de la grille de calcul (doublée).
    pub output_width: i32,
    /// Hauteur de la grille de calcul (doublée).
    pub output_height: i32,
    /// Index dans la palette de 256 couleurs, dans [0, 256].
    pub color_cycle_offset: i32,
    pub _pad0: i32,
    /// Coordonnée complexe du pixel (0, 0).
    pub top_left: [f32; 2],
    /// Pixels par unité, toujours > 0.
    pub zoom: f32,
    pub real_scale: f32,
    pub imag_scale: f32,
    /// Distorsion radiale, dans [0, 1.9].
    pub radial_amount: f32,
    pub _pad1: [f32; 2],
}

impl Default for ParameterBlock {
    fn default() -> Self {
        Self {
            output_width: 0,
            output_height: 0,
            color_cycle_offset: 0,
            _pad0: 0,
            top_left: HOME_TOP_LEFT,
            zoom: HOME_ZOOM,
            real_scale: HOME_REAL_SCALE,
            imag_scale: HOME_IMAG_SCALE,
            radial_amount: 0.0,
            _pad1: [0.0; 2],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::mem::{align_of, size_of};

    #[test]
    fn test_layout_matches_kernel() {
        assert_eq!(size_of::<ParameterBlock>(), 48);
        assert_eq!(align_of::<ParameterBlock>(), 4);

        let block = ParameterBlock {
            output_width: 1,
            output_height: 2,
            color_cycle_offset: 3,
            top_left: [4.0, 5.0],
            zoom: 6.0,
            real_scale: 7.0,
            imag_scale: 8.0,
            radial_amount: 9.0,
            ..ParameterBlock::default()
        };
        let bytes = bytemuck::bytes_of(&block);
        let word = |offset: usize| -> [u8; 4] { bytes[offset..offset + 4].try_into().unwrap() };

        assert_eq!(i32::from_ne_bytes(word(0)), 1);
        assert_eq!(i32::from_ne_bytes(word(4)), 2);
        assert_eq!(i32::from_ne_bytes(word(8)), 3);
        // vec2<f32> aligné sur 8 dans WGSL
        assert_eq!(f32::from_ne_bytes(word(16)), 4.0);
        assert_eq!(f32::from_ne_bytes(word(20)), 5.0);
        assert_eq!(f32::from_ne_bytes(word(24)), 6.0);
        assert_eq!(f32::from_ne_bytes(word(28)), 7.0);
        assert_eq!(f32::from_ne_bytes(word(32)), 8.0);
        assert_eq!(f32::from_ne_bytes(word(36)), 9.0);
    }

    #[test]
    fn test_default_is_home_view() {
        let block = ParameterBlock::default();
        assert_eq!(block.top_left, HOME_TOP_LEFT);
        assert_eq!(block.zoom, 700.0);
        assert_eq!(block.real_scale, -0.4);
        assert_eq!(block.imag_scale, 0.6);
        assert_eq!(block.radial_amount, 0.0);
        assert_eq!(block.color_cycle_offset, 0);
    }
}
