use std::path::PathBuf;
use std::time::{Instant, SystemTime};

use eframe::egui_wgpu::RenderState;
use egui::{Color32, Context, Key, Pos2, Rect, TextureId};
use log::{error, info, trace};

use crate::error::{Result, ViewerError};
use crate::fractal::params::ParameterBlock;
use crate::gpu::{planner_for_device, JuliaCompute};
use crate::gui::input::{Effect, InputController, InputEvent, TICK_INTERVAL};
use crate::gui::scheduler::RecomputeScheduler;
use crate::gui::texture::{release_output_texture, sync_output_texture};
use crate::io::png::{save_png, screenshot_path};

/// egui convertit une ligne de molette en 50 points.
const POINTS_PER_SCROLL_LINE: f32 = 50.0;

const INSTRUCTIONS: &str = "Bouton gauche + glisser : déplacer\n\
    Bouton droit maintenu + glisser : faire dériver l'équation\n\
    Molette : zoom\n\
    Z / X : symétrie radiale -/+\n\
    Origine : vue d'accueil    S : capture    Échap : quitter";

/// Configuration passée par la ligne de commande.
#[derive(Clone, Debug)]
pub struct ViewerConfig {
    pub screenshot_dir: PathBuf,
}

/// Application eframe : boucle d'entrées, planification et affichage.
pub struct JuliaApp {
    params: ParameterBlock,
    scheduler: RecomputeScheduler,
    controller: InputController,
    compute: JuliaCompute,
    render_state: RenderState,
    texture_id: Option<TextureId>,
    last_surface: Option<(u32, u32)>,
    config: ViewerConfig,
}

impl JuliaApp {
    pub fn new(cc: &eframe::CreationContext<'_>, config: ViewerConfig) -> Result<Self> {
        let render_state = cc
            .wgpu_render_state
            .clone()
            .ok_or(ViewerError::MissingRenderState)?;

        let adapter_info = render_state.adapter.get_info();
        info!("adaptateur GPU: {} ({:?})", adapter_info.name, adapter_info.backend);

        let planner = planner_for_device(&render_state.device)?;
        let compute = JuliaCompute::new(
            render_state.device.clone(),
            render_state.queue.clone(),
            &planner,
        )?;

        Ok(Self {
            params: ParameterBlock::default(),
            scheduler: RecomputeScheduler::new(),
            controller: InputController::new(planner, Instant::now()),
            compute,
            render_state,
            texture_id: None,
            last_surface: None,
            config,
        })
    }

    /// Traduit l'entrée egui de la frame en événements du contrôleur.
    fn collect_events(&mut self, ctx: &Context) -> Vec<InputEvent> {
        let mut events = Vec::new();

        let surface = ctx.input(|i| {
            let size = i.screen_rect().size();
            (size.x.max(0.0).floor() as u32, size.y.max(0.0).floor() as u32)
        });
        if self.last_surface != Some(surface) {
            self.last_surface = Some(surface);
            events.push(InputEvent::Resize {
                width: surface.0,
                height: surface.1,
            });
        }

        ctx.input(|i| {
            let pointer = &i.pointer;
            let delta = pointer.delta();

            if pointer.primary_down() && delta != egui::Vec2::ZERO {
                events.push(InputEvent::PrimaryDrag {
                    dx: delta.x,
                    dy: delta.y,
                });
            }

            if pointer.secondary_pressed() {
                if let Some(pos) = pointer.interact_pos() {
                    events.push(InputEvent::SecondaryPress { x: pos.x, y: pos.y });
                }
            } else if pointer.secondary_down() && delta != egui::Vec2::ZERO {
                if let Some(pos) = pointer.latest_pos() {
                    events.push(InputEvent::SecondaryDrag { x: pos.x, y: pos.y });
                }
            }
            if pointer.secondary_released() {
                events.push(InputEvent::SecondaryRelease);
            }

            let scroll = i.raw_scroll_delta.y;
            if scroll != 0.0 {
                events.push(InputEvent::Scroll {
                    delta_y: scroll / POINTS_PER_SCROLL_LINE,
                });
            }

            if i.key_pressed(Key::Z) {
                events.push(InputEvent::RadialSymmetry { direction: -1.0 });
            }
            if i.key_pressed(Key::X) {
                events.push(InputEvent::RadialSymmetry { direction: 1.0 });
            }
            if i.key_pressed(Key::Home) {
                events.push(InputEvent::ResetView);
            }
            if i.key_pressed(Key::S) {
                events.push(InputEvent::Screenshot);
            }
            if i.key_pressed(Key::Escape) {
                events.push(InputEvent::Quit);
            }
        });

        // Minuteur du bouton secondaire, injecté dans la même file
        let ticks = self.controller.ticks_due(Instant::now());
        events.extend(std::iter::repeat(InputEvent::Tick).take(ticks as usize));

        events
    }

    fn apply_effect(&mut self, ctx: &Context, effect: Effect) {
        match effect {
            Effect::None => {}
            Effect::Quit => {
                info!("fermeture demandée");
                ctx.send_viewport_cmd(egui::ViewportCommand::Close);
            }
            Effect::Screenshot => self.save_screenshot(),
            Effect::Resized {
                width,
                height,
                grow_window,
            } => {
                if grow_window {
                    ctx.send_viewport_cmd(egui::ViewportCommand::InnerSize(egui::vec2(
                        width as f32,
                        height as f32,
                    )));
                }
                self.sync_output();
            }
        }
    }

    /// Recrée la texture de sortie à la taille de la grille et la relie à egui.
    fn sync_output(&mut self) {
        let (width, height) = self.controller.output_size();
        let Self {
            compute,
            render_state,
            texture_id,
            params,
            ..
        } = self;

        match compute.resize(width, height) {
            Some(output) => {
                // La texture peut être bornée par les limites du périphérique
                let (tex_w, tex_h) = output.size();
                params.output_width = tex_w as i32;
                params.output_height = tex_h as i32;
                *texture_id = Some(sync_output_texture(render_state, output.view(), *texture_id));
            }
            None => {
                if let Some(id) = texture_id.take() {
                    release_output_texture(render_state, id);
                }
            }
        }
    }

    fn save_screenshot(&self) {
        let path = screenshot_path(&self.config.screenshot_dir, SystemTime::now());
        match self.compute.read_output().and_then(|img| save_png(&img, &path)) {
            Ok(()) => info!("capture enregistrée: {}", path.display()),
            Err(e) => error!("capture impossible: {e}"),
        }
    }

    fn draw_overlays(&self, ctx: &Context) {
        let backdrop = egui::Frame::none()
            .fill(Color32::from_black_alpha(160))
            .inner_margin(6.0)
            .rounding(4.0);

        egui::Area::new(egui::Id::new("instructions"))
            .anchor(egui::Align2::LEFT_TOP, [8.0, 8.0])
            .interactable(false)
            .show(ctx, |ui| {
                backdrop.show(ui, |ui| {
                    ui.label(egui::RichText::new(INSTRUCTIONS).color(Color32::WHITE));
                });
            });

        let p = &self.params;
        let mut status = format!(
            "zoom {:.1}   coin ({:.6}, {:.6})   c = {:.5} {:+.5}i   radial {:.2}   cycle {}   calculs {}",
            p.zoom,
            p.top_left[0],
            p.top_left[1],
            p.real_scale,
            p.imag_scale,
            p.radial_amount,
            p.color_cycle_offset,
            self.scheduler.dispatch_count(),
        );
        if self.controller.is_holding() {
            let [dx, dy] = self.controller.held_delta();
            status.push_str(&format!("   dérive ({:+.2}, {:+.2})", dx, dy));
        }
        egui::Area::new(egui::Id::new("status"))
            .anchor(egui::Align2::LEFT_BOTTOM, [8.0, -8.0])
            .interactable(false)
            .show(ctx, |ui| {
                backdrop.show(ui, |ui| {
                    ui.label(egui::RichText::new(status).monospace().color(Color32::WHITE));
                });
            });
    }
}

impl eframe::App for JuliaApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        for event in self.collect_events(ctx) {
            trace!("événement {:?}", event);
            let effect = self.controller.handle(event, &mut self.params, &mut self.scheduler);
            self.apply_effect(ctx, effect);
        }

        let grid = *self.controller.grid();
        let outcome = self.scheduler.run_frame(&mut self.params, &grid, &mut self.compute);
        trace!("frame: {:?}", outcome);

        egui::CentralPanel::default()
            .frame(egui::Frame::none().fill(Color32::BLACK))
            .show(ctx, |ui| {
                if let Some(id) = self.texture_id {
                    // La grille doublée est affichée à la taille de la surface
                    let (w, h) = self.controller.viewport();
                    let rect = Rect::from_min_size(Pos2::ZERO, egui::vec2(w as f32, h as f32));
                    let uv = Rect::from_min_max(Pos2::ZERO, Pos2::new(1.0, 1.0));
                    ui.painter().image(id, rect, uv, Color32::WHITE);
                }
            });

        self.draw_overlays(ctx);

        if self.controller.is_holding() {
            ctx.request_repaint_after(TICK_INTERVAL);
        }
        if self.scheduler.is_dirty() {
            // Cible indisponible : nouvel essai à la prochaine frame
            ctx.request_repaint();
        }
    }
}
