use crate::renderer::{create_texture_bind_group, ActorRenderer, GpuVertex};
use actorstage::{
    Actor, ActorId, ContextOptions, DecodedImage, Error, Generation, RenderBackend,
    SkeletonRuntime, SurfaceSize,
};
use std::collections::HashMap;

/// Device, queue and target format for one context incarnation.
pub struct GpuHandles {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub color_format: wgpu::TextureFormat,
}

/// Produces GPU handles on demand. Called once at startup and again on every
/// context restore, with the same creation options each time. Hosts decide
/// what an incarnation is (a surface, a headless device, a test stub).
pub trait ContextProvider {
    fn acquire(&mut self, options: &ContextOptions) -> Result<GpuHandles, Error>;
}

struct ActorResources {
    generation: Generation,
    bind_groups: Vec<(String, wgpu::BindGroup)>,
    /// Pixel size of the first texture, used to size the actor's quad.
    base_size: (u32, u32),
}

struct RenderTarget {
    _texture: wgpu::Texture,
    view: wgpu::TextureView,
    size: SurfaceSize,
}

struct GpuState {
    handles: GpuHandles,
    renderer: ActorRenderer,
    target: Option<RenderTarget>,
    actors: HashMap<ActorId, ActorResources>,
    options: ContextOptions,
}

/// [`RenderBackend`] on top of wgpu. Renders into an internal color target
/// that the host presents or composites; each clear and draw submits its own
/// load-preserving pass, so the frame accumulates exactly as the engine
/// orders it.
pub struct WgpuBackend {
    provider: Box<dyn ContextProvider>,
    gpu: Option<GpuState>,
    surface_size: Option<SurfaceSize>,
}

impl WgpuBackend {
    pub fn new(provider: Box<dyn ContextProvider>) -> Self {
        Self {
            provider,
            gpu: None,
            surface_size: None,
        }
    }

    /// The current frame's color target, if the backend is initialized and
    /// sized. The host blits or samples this to put the frame on screen.
    pub fn target_view(&self) -> Option<&wgpu::TextureView> {
        self.gpu
            .as_ref()
            .and_then(|gpu| gpu.target.as_ref())
            .map(|t| &t.view)
    }

    fn rebuild_target(gpu: &mut GpuState, size: SurfaceSize) {
        let texture = gpu.handles.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("actorstage color target"),
            size: wgpu::Extent3d {
                width: size.width,
                height: size.height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: gpu.handles.color_format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        gpu.renderer.update_globals_ortho_centered(
            &gpu.handles.queue,
            size.width as f32,
            size.height as f32,
        );
        gpu.target = Some(RenderTarget {
            _texture: texture,
            view,
            size,
        });
    }
}

impl RenderBackend for WgpuBackend {
    fn initialize(&mut self, options: &ContextOptions) -> Result<(), Error> {
        let handles = self.provider.acquire(options)?;
        log::info!(
            "wgpu backend up (format {:?}, pma {})",
            handles.color_format,
            options.premultiplied_alpha
        );
        let renderer = ActorRenderer::new(&handles.device, handles.color_format);
        let mut gpu = GpuState {
            handles,
            renderer,
            target: None,
            // Resources from a previous incarnation die with the old device.
            actors: HashMap::new(),
            options: *options,
        };
        if let Some(size) = self.surface_size {
            Self::rebuild_target(&mut gpu, size);
        }
        self.gpu = Some(gpu);
        Ok(())
    }

    fn set_surface_size(&mut self, size: SurfaceSize) {
        self.surface_size = Some(size);
        let Some(gpu) = self.gpu.as_mut() else {
            return;
        };
        if gpu.target.as_ref().is_some_and(|t| t.size == size) {
            return;
        }
        Self::rebuild_target(gpu, size);
    }

    fn clear(&mut self) {
        let Some(gpu) = self.gpu.as_ref() else {
            return;
        };
        let Some(target) = gpu.target.as_ref() else {
            return;
        };
        let color = if gpu.options.alpha {
            wgpu::Color::TRANSPARENT
        } else {
            wgpu::Color::BLACK
        };
        let mut encoder = gpu
            .handles
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("actorstage clear"),
            });
        {
            let _pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("actorstage clear"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &target.view,
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(color),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
        }
        gpu.handles.queue.submit([encoder.finish()]);
    }

    fn upload_actor_textures(
        &mut self,
        actor: ActorId,
        generation: Generation,
        images: &[(String, DecodedImage)],
    ) -> Result<(), Error> {
        let gpu = self.gpu.as_mut().ok_or(Error::ContextLost)?;

        let mut bind_groups = Vec::with_capacity(images.len());
        let mut base_size = (1, 1);
        for (index, (url, image)) in images.iter().enumerate() {
            let texture = gpu.handles.device.create_texture(&wgpu::TextureDescriptor {
                label: Some("actorstage page texture"),
                size: wgpu::Extent3d {
                    width: image.width,
                    height: image.height,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: wgpu::TextureFormat::Rgba8UnormSrgb,
                usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            });
            gpu.handles.queue.write_texture(
                texture.as_image_copy(),
                &image.pixels,
                wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(4 * image.width),
                    rows_per_image: Some(image.height),
                },
                wgpu::Extent3d {
                    width: image.width,
                    height: image.height,
                    depth_or_array_layers: 1,
                },
            );
            let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
            let sampler = gpu.handles.device.create_sampler(&wgpu::SamplerDescriptor {
                label: Some("actorstage page sampler"),
                mag_filter: wgpu::FilterMode::Linear,
                min_filter: wgpu::FilterMode::Linear,
                address_mode_u: wgpu::AddressMode::ClampToEdge,
                address_mode_v: wgpu::AddressMode::ClampToEdge,
                ..Default::default()
            });
            let bind_group = create_texture_bind_group(
                &gpu.handles.device,
                gpu.renderer.texture_bind_group_layout(),
                &view,
                &sampler,
            );
            if index == 0 {
                base_size = (image.width, image.height);
            }
            bind_groups.push((url.clone(), bind_group));
        }

        gpu.actors.insert(
            actor,
            ActorResources {
                generation,
                bind_groups,
                base_size,
            },
        );
        Ok(())
    }

    fn draw_actor(&mut self, actor: &Actor, runtime: &SkeletonRuntime) -> Result<(), Error> {
        let gpu = self.gpu.as_ref().ok_or(Error::ContextLost)?;
        let Some(target) = gpu.target.as_ref() else {
            return Err(Error::Draw {
                message: "no render target; surface size was never set".to_string(),
            });
        };
        let resources = gpu.actors.get(&actor.id).ok_or_else(|| Error::Draw {
            message: format!("no GPU resources for {}", actor.id),
        })?;
        if resources.generation != runtime.generation {
            return Err(Error::Draw {
                message: format!("stale GPU resources for {}", actor.id),
            });
        }
        let Some((_, bind_group)) = resources.bind_groups.first() else {
            return Err(Error::Draw {
                message: format!("no textures uploaded for {}", actor.id),
            });
        };

        let t = runtime.transform;
        let half_w = resources.base_size.0 as f32 * t.scale * 0.5;
        let half_h = resources.base_size.1 as f32 * t.scale * 0.5;
        let vertices = [
            GpuVertex {
                position: [t.x - half_w, t.y + half_h],
                uv: [0.0, 0.0],
                color: [1.0; 4],
            },
            GpuVertex {
                position: [t.x + half_w, t.y + half_h],
                uv: [1.0, 0.0],
                color: [1.0; 4],
            },
            GpuVertex {
                position: [t.x + half_w, t.y - half_h],
                uv: [1.0, 1.0],
                color: [1.0; 4],
            },
            GpuVertex {
                position: [t.x - half_w, t.y - half_h],
                uv: [0.0, 1.0],
                color: [1.0; 4],
            },
        ];
        gpu.renderer.upload_quad(&gpu.handles.queue, &vertices);

        let mut encoder = gpu
            .handles
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("actorstage draw"),
            });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("actorstage draw"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &target.view,
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            gpu.renderer
                .draw_quad(&mut pass, bind_group, gpu.options.premultiplied_alpha);
        }
        gpu.handles.queue.submit([encoder.finish()]);
        Ok(())
    }

    fn drop_actor_resources(&mut self, actor: ActorId) {
        if let Some(gpu) = self.gpu.as_mut() {
            gpu.actors.remove(&actor);
        }
    }
}
