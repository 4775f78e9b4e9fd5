pub mod dispatch;

use std::num::NonZeroU64;
use std::sync::Arc;

use image::RgbaImage;
use log::{debug, info, warn};
use rayon::prelude::*;
use wgpu::util::DeviceExt;

use crate::color::palette::{color_table, PaletteEntry, PALETTE_SIZE};
use crate::error::{Result, ViewerError};
use crate::fractal::params::ParameterBlock;
use crate::gui::scheduler::RenderTargetProvider;
use self::dispatch::{DispatchGrid, DispatchPlanner};

/// Largeur d'exécution visée (taille de SIMD courante). wgpu ne l'expose
/// pas ; elle est bornée par les limites du périphérique.
const EXECUTION_WIDTH: u32 = 32;
const OUTPUT_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

/// Texture de sortie du kernel et son bind group.
pub struct OutputTexture {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    bind_group: wgpu::BindGroup,
    width: u32,
    height: u32,
}

impl OutputTexture {
    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

/// Pipeline de calcul Julia partagé avec le renderer wgpu d'egui.
pub struct JuliaCompute {
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    pipeline: wgpu::ComputePipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    params_buffer: wgpu::Buffer,
    palette_buffer: wgpu::Buffer,
    output: Option<Arc<OutputTexture>>,
    max_texture_dimension: u32,
}

/// Planificateur construit depuis les limites du périphérique.
pub fn planner_for_device(device: &wgpu::Device) -> Result<DispatchPlanner> {
    let limits = device.limits();
    let execution_width = EXECUTION_WIDTH.min(limits.max_compute_workgroup_size_x);
    let max_threads = limits
        .max_compute_invocations_per_workgroup
        .min(execution_width.saturating_mul(limits.max_compute_workgroup_size_y));
    debug!(
        "limites de calcul: largeur {}, threads max {} (périphérique: {})",
        execution_width, max_threads, limits.max_compute_invocations_per_workgroup
    );
    DispatchPlanner::new(execution_width, max_threads)
}

impl JuliaCompute {
    pub fn new(
        device: Arc<wgpu::Device>,
        queue: Arc<wgpu::Queue>,
        planner: &DispatchPlanner,
    ) -> Result<Self> {
        let threads = planner.threads_per_group();

        device.push_error_scope(wgpu::ErrorFilter::Validation);

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("julia-bind-group-layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: NonZeroU64::new(std::mem::size_of::<ParameterBlock>() as u64),
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Storage { read_only: true },
                        has_dynamic_offset: false,
                        min_binding_size: NonZeroU64::new(
                            (PALETTE_SIZE * std::mem::size_of::<PaletteEntry>()) as u64,
                        ),
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::StorageTexture {
                        access: wgpu::StorageTextureAccess::WriteOnly,
                        format: OUTPUT_FORMAT,
                        view_dimension: wgpu::TextureViewDimension::D2,
                    },
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("julia-pipeline-layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        // La taille de groupe WGSL est une constante : on l'injecte dans le source.
        let source = include_str!("julia.wgsl")
            .replace("WORKGROUP_X", &threads[0].to_string())
            .replace("WORKGROUP_Y", &threads[1].to_string());

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("julia-shader"),
            source: wgpu::ShaderSource::Wgsl(source.into()),
        });

        let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("julia-pipeline"),
            layout: Some(&pipeline_layout),
            module: &shader,
            entry_point: "main",
        });

        if let Some(err) = pollster::block_on(device.pop_error_scope()) {
            return Err(ViewerError::Pipeline(err.to_string()));
        }

        let params_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("julia-params"),
            contents: bytemuck::bytes_of(&ParameterBlock::default()),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        // La palette est envoyée une seule fois et n'est plus modifiée.
        let palette_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("julia-palette"),
            contents: bytemuck::cast_slice(&color_table()),
            usage: wgpu::BufferUsages::STORAGE,
        });

        let max_texture_dimension = device.limits().max_texture_dimension_2d;
        info!(
            "pipeline Julia prêt (groupe {}x{}, texture max {})",
            threads[0], threads[1], max_texture_dimension
        );

        Ok(Self {
            device,
            queue,
            pipeline,
            bind_group_layout,
            params_buffer,
            palette_buffer,
            output: None,
            max_texture_dimension,
        })
    }

    /// Recrée la texture de sortie. Une taille nulle (fenêtre réduite)
    /// supprime la cible : le planificateur attend alors la suivante.
    pub fn resize(&mut self, width: u32, height: u32) -> Option<&Arc<OutputTexture>> {
        let width = width.min(self.max_texture_dimension);
        let height = height.min(self.max_texture_dimension);
        if width == 0 || height == 0 {
            self.output = None;
            return None;
        }
        if self.output.as_ref().map(|o| o.size()) == Some((width, height)) {
            return self.output.as_ref();
        }

        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("julia-output"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: OUTPUT_FORMAT,
            usage: wgpu::TextureUsages::STORAGE_BINDING
                | wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("julia-bind-group"),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: self.params_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: self.palette_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
            ],
        });

        debug!("texture de sortie {}x{}", width, height);
        self.output = Some(Arc::new(OutputTexture {
            texture,
            view,
            bind_group,
            width,
            height,
        }));
        self.output.as_ref()
    }

    /// Relit la texture de sortie (capture d'écran).
    pub fn read_output(&self) -> Result<RgbaImage> {
        let output = self.output.as_ref().ok_or(ViewerError::NoOutput)?;
        let (width, height) = output.size();

        // Les lignes copiées doivent être alignées sur 256 octets.
        let unpadded_row = width as usize * 4;
        let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT as usize;
        let padded_row = unpadded_row.div_ceil(align) * align;

        let readback_buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("julia-readback"),
            size: (padded_row * height as usize) as u64,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let mut encoder = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("julia-readback-encoder"),
        });
        encoder.copy_texture_to_buffer(
            wgpu::ImageCopyTexture {
                texture: &output.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::ImageCopyBuffer {
                buffer: &readback_buffer,
                layout: wgpu::ImageDataLayout {
                    offset: 0,
                    bytes_per_row: Some(padded_row as u32),
                    rows_per_image: Some(height),
                },
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );
        self.queue.submit(Some(encoder.finish()));

        let buffer_slice = readback_buffer.slice(..);
        let (sender, receiver) = std::sync::mpsc::channel();
        buffer_slice.map_async(wgpu::MapMode::Read, move |r| {
            let _ = sender.send(r);
        });
        let _ = self.device.poll(wgpu::Maintain::Wait);
        receiver
            .recv()
            .map_err(|_| ViewerError::Readback(wgpu::BufferAsyncError))??;

        let data = buffer_slice.get_mapped_range();
        let pixels = strip_row_padding(&data, unpadded_row, padded_row);
        drop(data);
        readback_buffer.unmap();

        RgbaImage::from_raw(width, height, pixels).ok_or_else(|| {
            ViewerError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                "taille du buffer relu incohérente",
            ))
        })
    }
}

/// Retire l'alignement des lignes d'une copie texture → buffer.
fn strip_row_padding(data: &[u8], unpadded_row: usize, padded_row: usize) -> Vec<u8> {
    data.par_chunks(padded_row)
        .flat_map_iter(|row| row[..unpadded_row].iter().copied())
        .collect()
}

impl RenderTargetProvider for JuliaCompute {
    type Target = Arc<OutputTexture>;

    fn acquire(&mut self) -> Option<Self::Target> {
        self.output.clone()
    }

    /// Soumet le calcul sur la file partagée avec egui. La présentation a
    /// lieu quand egui peint la texture enregistrée, après cette soumission.
    fn dispatch_and_present(
        &mut self,
        target: Self::Target,
        params: &ParameterBlock,
        grid: &DispatchGrid,
    ) -> Result<()> {
        if (params.output_width, params.output_height) != (target.width as i32, target.height as i32) {
            warn!(
                "taille de sortie {}x{} différente de la texture {}x{}",
                params.output_width, params.output_height, target.width, target.height
            );
        }

        self.queue
            .write_buffer(&self.params_buffer, 0, bytemuck::bytes_of(params));

        let mut encoder = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("julia-encoder"),
        });
        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("julia-pass"),
                timestamp_writes: None,
            });
            pass.set_pipeline(&self.pipeline);
            pass.set_bind_group(0, &target.bind_group, &[]);
            pass.dispatch_workgroups(grid.groups[0], grid.groups[1], grid.groups[2]);
        }
        self.queue.submit(Some(encoder.finish()));
        Ok(())
    }
}
