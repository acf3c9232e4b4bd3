//! Orb field WebGPU render pipeline
//!
//! Draws every orb in the fragment shader over a transparent background.
//! Buffers are uniforms so the WebGL2 fallback works unchanged.

use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

use super::visual::OrbVisual;
use crate::consts::MAX_RENDERED_ORBS;

// ============================================================================
// GPU DATA STRUCTURES (must match shader)
// ============================================================================

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct Globals {
    resolution: [f32; 2], // offset 0, CSS pixels
    time: f32,            // offset 8
    orb_count: u32,       // offset 12
    pixel_scale: f32,     // offset 16, backing pixels per CSS pixel
    srgb_encode: u32,     // offset 20, 1 when the target format is not sRGB
    _pad: [f32; 2],       // pad to 32 bytes
}

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct OrbGpu {
    center: [f32; 2],
    radius: f32,
    opacity: f32,
    color: [f32; 4], // offset 16, vec4 aligned
    glow: f32,
    inner_glow: f32,
    softness: f32,
    _pad: f32, // 48 bytes, a valid uniform array stride
}

impl OrbGpu {
    fn from_visual(v: &OrbVisual) -> Self {
        Self {
            center: v.center.to_array(),
            radius: v.diameter * 0.5,
            opacity: v.opacity,
            color: v.color,
            glow: v.glow,
            inner_glow: v.inner_glow,
            softness: v.blur,
            _pad: 0.0,
        }
    }
}

// ============================================================================
// ORB RENDER STATE
// ============================================================================

pub struct OrbRenderState {
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    pub pipeline: wgpu::RenderPipeline,

    globals_buffer: wgpu::Buffer,
    orbs_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,

    /// Backing size in device pixels
    pub size: (u32, u32),
    /// Backing pixels per CSS pixel
    pixel_scale: f32,
    /// The shader encodes linear colour itself (non-sRGB surface)
    srgb_encode: bool,
}

impl OrbRenderState {
    pub async fn new(
        surface: wgpu::Surface<'static>,
        adapter: &wgpu::Adapter,
        width: u32,
        height: u32,
        pixel_scale: f32,
    ) -> Result<Self, wgpu::RequestDeviceError> {
        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("orbfield-device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::downlevel_webgl2_defaults(),
                memory_hints: Default::default(),
                trace: Default::default(),
                experimental_features: Default::default(),
            })
            .await?;

        let surface_caps = surface.get_capabilities(adapter);
        log::debug!("Surface formats: {:?}", surface_caps.formats);
        log::debug!("Surface alpha modes: {:?}", surface_caps.alpha_modes);

        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .copied()
            .or_else(|| surface_caps.formats.first().copied())
            .unwrap_or(wgpu::TextureFormat::Bgra8Unorm);

        // The page shows through, so prefer premultiplied compositing
        let alpha_mode = if surface_caps
            .alpha_modes
            .contains(&wgpu::CompositeAlphaMode::PreMultiplied)
        {
            wgpu::CompositeAlphaMode::PreMultiplied
        } else {
            surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto)
        };

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: width.max(1),
            height: height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        log::info!(
            "Orb surface {}x{} ({:?}, alpha {:?})",
            config.width,
            config.height,
            surface_format,
            alpha_mode
        );
        surface.configure(&device, &config);

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("orb_shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("orb_shader.wgsl").into()),
        });

        let globals_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("globals"),
            contents: bytemuck::bytes_of(&Globals {
                resolution: [width as f32 / pixel_scale, height as f32 / pixel_scale],
                time: 0.0,
                orb_count: 0,
                pixel_scale,
                srgb_encode: u32::from(!surface_format.is_srgb()),
                _pad: [0.0; 2],
            }),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let orbs_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("orbs"),
            size: (std::mem::size_of::<OrbGpu>() * MAX_RENDERED_ORBS) as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let uniform_entry = |binding: u32| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        };

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("orb_bind_group_layout"),
            entries: &[uniform_entry(0), uniform_entry(1)],
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("orb_bind_group"),
            layout: &bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: globals_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: orbs_buffer.as_entire_binding(),
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("orb_pipeline_layout"),
            bind_group_layouts: &[&bind_group_layout],
            immediate_size: 0,
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("orb_pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[], // Fullscreen triangle
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: config.format,
                    blend: Some(wgpu::BlendState::PREMULTIPLIED_ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        Ok(Self {
            surface,
            device,
            queue,
            config,
            pipeline,
            globals_buffer,
            orbs_buffer,
            bind_group,
            size: (width, height),
            pixel_scale,
            srgb_encode: !surface_format.is_srgb(),
        })
    }

    pub fn resize(&mut self, new_width: u32, new_height: u32, pixel_scale: f32) {
        if new_width > 0 && new_height > 0 {
            self.size = (new_width, new_height);
            self.pixel_scale = pixel_scale;
            self.config.width = new_width;
            self.config.height = new_height;
            self.surface.configure(&self.device, &self.config);
        }
    }

    /// Reconfigure the surface at its current size
    pub fn reconfigure(&mut self) {
        self.surface.configure(&self.device, &self.config);
    }

    /// Upload the visuals and draw one frame
    pub fn render(&mut self, visuals: &[OrbVisual], time_s: f32) -> Result<(), wgpu::SurfaceError> {
        let count = visuals.len().min(MAX_RENDERED_ORBS);

        let mut orbs_data = [OrbGpu::zeroed(); MAX_RENDERED_ORBS];
        for (slot, visual) in orbs_data.iter_mut().zip(&visuals[..count]) {
            *slot = OrbGpu::from_visual(visual);
        }

        let globals = Globals {
            resolution: [
                self.size.0 as f32 / self.pixel_scale,
                self.size.1 as f32 / self.pixel_scale,
            ],
            time: time_s,
            orb_count: count as u32,
            pixel_scale: self.pixel_scale,
            srgb_encode: u32::from(self.srgb_encode),
            _pad: [0.0; 2],
        };
        self.queue
            .write_buffer(&self.globals_buffer, 0, bytemuck::bytes_of(&globals));
        self.queue
            .write_buffer(&self.orbs_buffer, 0, bytemuck::cast_slice(&orbs_data));

        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("orb_encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("orb_render_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });

            render_pass.set_pipeline(&self.pipeline);
            render_pass.set_bind_group(0, &self.bind_group, &[]);
            render_pass.draw(0..3, 0..1);
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;

    #[test]
    fn test_gpu_layouts() {
        assert_eq!(std::mem::size_of::<Globals>(), 32);
        assert_eq!(std::mem::size_of::<OrbGpu>(), 48);
    }

    #[test]
    fn test_orb_gpu_from_visual() {
        let v = OrbVisual {
            center: Vec2::new(100.0, 50.0),
            diameter: 80.0,
            color: [1.0, 0.5, 0.0, 1.0],
            opacity: 0.6,
            glow: 64.0,
            inner_glow: 32.0,
            blur: 40.0,
        };
        let gpu = OrbGpu::from_visual(&v);
        assert_eq!(gpu.center, [100.0, 50.0]);
        assert_eq!(gpu.radius, 40.0);
        assert_eq!(gpu.softness, 40.0);
    }
}
