use eframe::egui_wgpu::RenderState;
use egui::TextureId;

/// Enregistre la texture de sortie auprès du renderer egui, ou redirige
/// l'identifiant existant vers la nouvelle vue après un redimensionnement.
pub fn sync_output_texture(
    render_state: &RenderState,
    view: &wgpu::TextureView,
    current: Option<TextureId>,
) -> TextureId {
    let mut renderer = render_state.renderer.write();
    match current {
        Some(id) => {
            renderer.update_egui_texture_from_wgpu_texture(
                &render_state.device,
                view,
                wgpu::FilterMode::Linear,
                id,
            );
            id
        }
        None => renderer.register_native_texture(&render_state.device, view, wgpu::FilterMode::Linear),
    }
}

/// Libère la texture quand la surface n'a plus de cible (fenêtre réduite).
pub fn release_output_texture(render_state: &RenderState, id: TextureId) {
    render_state.renderer.write().free_texture(&id);
}
