use bytemuck::{Pod, Zeroable};

/// Nombre d'entrées de la table de couleurs (binding 1).
pub const PALETTE_SIZE: usize = 256;

/// Entrée de palette : `vec3<f32>` côté WGSL, soit un pas de 16 octets.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct PaletteEntry {
    pub rgb: [f32; 3],
    pub _pad: f32,
}

#[derive(Clone, Copy, Debug)]
struct GradientStop {
    position: f32, // [0.0, 1.0]
    r: u8,
    g: u8,
    b: u8,
}

// Dégradé cyclique : la dernière couleur rejoint la première pour que le
// défilement de la palette ne montre pas de coupure.
const CYCLE_STOPS: [GradientStop; 7] = [
    GradientStop { position: 0.00, r: 0, g: 7, b: 100 },     // Bleu nuit
    GradientStop { position: 0.16, r: 32, g: 107, b: 203 },  // Bleu
    GradientStop { position: 0.42, r: 237, g: 255, b: 255 }, // Blanc bleuté
    GradientStop { position: 0.64, r: 255, g: 170, b: 0 },   // Orange
    GradientStop { position: 0.80, r: 120, g: 20, b: 0 },    // Brun
    GradientStop { position: 0.92, r: 10, g: 2, b: 40 },     // Presque noir
    GradientStop { position: 1.00, r: 0, g: 7, b: 100 },     // Bleu nuit
];

fn gradient_interpolate(stops: &[GradientStop], t: f32) -> [f32; 3] {
    let t = t.clamp(0.0, 1.0);
    let to_rgb = |s: GradientStop| [s.r as f32 / 255.0, s.g as f32 / 255.0, s.b as f32 / 255.0];

    for w in stops.windows(2) {
        let (a, b) = (w[0], w[1]);
        if t >= a.position && t <= b.position {
            let denom = b.position - a.position;
            let factor = if denom.abs() < f32::EPSILON { 0.0 } else { (t - a.position) / denom };
            let (ca, cb) = (to_rgb(a), to_rgb(b));
            return [
                ca[0] + factor * (cb[0] - ca[0]),
                ca[1] + factor * (cb[1] - ca[1]),
                ca[2] + factor * (cb[2] - ca[2]),
            ];
        }
    }

    to_rgb(stops[stops.len() - 1])
}

/// Génère la table de 256 couleurs envoyée une seule fois au GPU.
pub fn color_table() -> Vec<PaletteEntry> {
    (0..PALETTE_SIZE)
        .map(|i| PaletteEntry {
            rgb: gradient_interpolate(&CYCLE_STOPS, i as f32 / PALETTE_SIZE as f32),
            _pad: 0.0,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_table_shape() {
        let table = color_table();
        assert_eq!(table.len(), 256);
        assert_eq!(std::mem::size_of::<PaletteEntry>(), 16);
        assert_eq!(bytemuck::cast_slice::<_, u8>(&table).len(), 256 * 16);
        for entry in &table {
            assert!(entry.rgb.iter().all(|c| (0.0..=1.0).contains(c)));
        }
    }

    #[test]
    fn test_color_table_is_cyclic() {
        let table = color_table();
        let first = table[0].rgb;
        let last = table[255].rgb;
        // La dernière entrée est proche de la première (dégradé fermé)
        for c in 0..3 {
            assert!((first[c] - last[c]).abs() < 0.05);
        }
    }

    #[test]
    fn test_gradient_endpoints() {
        let start = gradient_interpolate(&CYCLE_STOPS, 0.0);
        assert_eq!(start, [0.0, 7.0 / 255.0, 100.0 / 255.0]);
        let mid = gradient_interpolate(&CYCLE_STOPS, 0.42);
        assert!((mid[0] - 237.0 / 255.0).abs() < 1e-6);
    }
}
