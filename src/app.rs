use anyhow::{anyhow, Context as _, Result};
use imgui::{Condition, ConfigFlags, FontConfig, FontSource, TextureId, Ui, WindowFlags};
use imgui_wgpu::{Renderer, RendererConfig, Texture, TextureConfig};
use imgui_winit_support::{HiDpiMode, WinitPlatform};
use log::{debug, info, warn};
use std::collections::HashMap;
use std::rc::Rc;
use std::time::Instant;
use theme_comparison::capture::CaptureHost;
use theme_comparison::config::AppConfig;
use theme_comparison::image_loader::{AcquireError, DropTracker, ImageResource, ResourceId, Slot};
use theme_comparison::layout::{
    cover_uv, fit_within, lerp, ComparisonScene, Rect, ReferenceMode, Size, ENTRANCE_SCALE,
    COMPARING_BACKGROUND_OPACITY, DARK_OVERLAY_OPACITY, GRIP_WIDTH, SETUP_BACKGROUND_OPACITY,
};
use theme_comparison::session::{Session, SessionMode};
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, Event, MouseButton, TouchPhase, WindowEvent};
use winit::window::{CursorIcon, Window};

const CLEAR_COLOR: wgpu::Color = wgpu::Color {
    r: 0.98,
    g: 0.98,
    b: 0.98,
    a: 1.0,
};
const WHITE: [f32; 4] = [1.0, 1.0, 1.0, 1.0];
const DIVIDER_SHADOW: [f32; 4] = [0.0, 0.0, 0.0, 0.18];
const SETUP_MAX_WIDTH: f32 = 760.0;
const SLOT_PANEL_HEIGHT: f32 = 230.0;
const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp", "bmp", "tif", "tiff", "ico"];

/// Resize cursor for as long as the divider is being dragged.
struct WindowCapture {
    window: Rc<Window>,
}

impl CaptureHost for WindowCapture {
    fn begin_capture(&self) {
        self.window.set_cursor_icon(CursorIcon::EwResize);
    }

    fn end_capture(&self) {
        self.window.set_cursor_icon(CursorIcon::Default);
    }
}

struct SlotTexture {
    resource: ResourceId,
    texture: TextureId,
    size: Size,
}

enum UiAction {
    Browse(Slot),
    Remove(Slot),
    Compare,
    Back,
}

pub struct AppState {
    window: Rc<Window>,
    capture_host: Rc<dyn CaptureHost>,
    surface: wgpu::Surface,
    device: wgpu::Device,
    queue: wgpu::Queue,
    surface_config: wgpu::SurfaceConfiguration,
    imgui: imgui::Context,
    platform: WinitPlatform,
    renderer: Renderer,
    session: Session,
    reference_mode: ReferenceMode,
    textures: HashMap<Slot, SlotTexture>,
    drop_zones: Vec<(Slot, Rect)>,
    drops: DropTracker,
    active_touch: Option<u64>,
    last_frame: Instant,
}

impl AppState {
    pub async fn new(window: Rc<Window>, config: AppConfig) -> Result<Self> {
        info!("Initializing AppState");
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = unsafe { instance.create_surface(window.as_ref()) }
            .context("Failed to create window surface")?;
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or_else(|| anyhow!("No suitable GPU adapter found"))?;
        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("comparison device"),
                    features: wgpu::Features::empty(),
                    limits: wgpu::Limits::default(),
                },
                None,
            )
            .await
            .context("Failed to open GPU device")?;

        let capabilities = surface.get_capabilities(&adapter);
        let format = capabilities
            .formats
            .iter()
            .copied()
            .find(|format| !format.is_srgb())
            .or_else(|| capabilities.formats.first().copied())
            .ok_or_else(|| anyhow!("Surface reports no texture formats"))?;
        let size = window.inner_size();
        let surface_config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: capabilities
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
        };
        surface.configure(&device, &surface_config);
        debug!("Surface configured as {:?} {}x{}", format, size.width, size.height);

        let mut imgui = imgui::Context::create();
        imgui.set_ini_filename(None);
        imgui.style_mut().use_light_colors();
        imgui.io_mut().config_flags |= ConfigFlags::NO_MOUSE_CURSOR_CHANGE;
        let mut platform = WinitPlatform::init(&mut imgui);
        platform.attach_window(imgui.io_mut(), &window, HiDpiMode::Default);

        let hidpi_factor = window.scale_factor();
        imgui.io_mut().font_global_scale = (1.0 / hidpi_factor) as f32;
        imgui.fonts().add_font(&[FontSource::DefaultFontData {
            config: Some(FontConfig {
                oversample_h: 1,
                pixel_snap_h: true,
                size_pixels: (16.0 * hidpi_factor) as f32,
                ..Default::default()
            }),
        }]);
        let renderer = Renderer::new(
            &mut imgui,
            &device,
            &queue,
            RendererConfig {
                texture_format: surface_config.format,
                ..Default::default()
            },
        );

        let now = Instant::now();
        let mut session = Session::new(config.reveal_delay, now);
        for (slot, path) in config.preloads() {
            if let Err(e) = session.slots_mut().submit_path(slot, &path) {
                warn!("Could not preload {} image: {}", slot, e);
            }
        }

        let capture_host: Rc<dyn CaptureHost> = Rc::new(WindowCapture {
            window: window.clone(),
        });
        let mut state = Self {
            window,
            capture_host,
            surface,
            device,
            queue,
            surface_config,
            imgui,
            platform,
            renderer,
            session,
            reference_mode: config.reference_mode,
            textures: HashMap::new(),
            drop_zones: Vec::new(),
            drops: DropTracker::new(),
            active_touch: None,
            last_frame: now,
        };
        state.sync_textures();
        info!("AppState initialized successfully");
        Ok(state)
    }

    pub fn handle_event(&mut self, event: &Event<()>) {
        self.platform
            .handle_event(self.imgui.io_mut(), &self.window, event);

        match event {
            Event::NewEvents(_) => {
                let now = Instant::now();
                self.imgui.io_mut().update_delta_time(now - self.last_frame);
                self.last_frame = now;
            }
            Event::WindowEvent { event, .. } => self.handle_window_event(event),
            _ => {}
        }
    }

    fn handle_window_event(&mut self, event: &WindowEvent) {
        match event {
            WindowEvent::Resized(size) => self.resize(*size),
            WindowEvent::ScaleFactorChanged { new_inner_size, .. } => self.resize(**new_inner_size),
            WindowEvent::CursorMoved { position, .. } => {
                let position = position.to_logical::<f32>(self.window.scale_factor());
                self.pointer_move([position.x, position.y]);
            }
            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => match state {
                ElementState::Pressed => {
                    if let Some(point) = self.drops.cursor() {
                        self.pointer_down(point);
                    }
                }
                ElementState::Released => self.session.release(),
            },
            WindowEvent::Touch(touch) => {
                let location = touch.location.to_logical::<f32>(self.window.scale_factor());
                let point = [location.x, location.y];
                match touch.phase {
                    TouchPhase::Started if self.active_touch.is_none() => {
                        self.active_touch = Some(touch.id);
                        self.drops.cursor_moved(point);
                        self.pointer_down(point);
                    }
                    TouchPhase::Moved if self.active_touch == Some(touch.id) => {
                        self.pointer_move(point);
                    }
                    TouchPhase::Ended | TouchPhase::Cancelled if self.active_touch == Some(touch.id) => {
                        self.active_touch = None;
                        self.session.release();
                    }
                    _ => {}
                }
            }
            WindowEvent::Focused(false) => {
                self.active_touch = None;
                self.session.release();
            }
            WindowEvent::CursorLeft { .. } => self.drops.cursor_left(),
            WindowEvent::HoveredFile(_) => self.drops.file_hovered(),
            WindowEvent::HoveredFileCancelled => self.drops.hover_cancelled(),
            WindowEvent::DroppedFile(path) => self.drops.file_dropped(path.clone()),
            _ => {}
        }
    }

    /// Escape leaves the comparison, or asks to quit from setup.
    pub fn escape(&mut self) -> bool {
        match self.session.mode() {
            SessionMode::Comparing => {
                self.session.reset(Instant::now());
                false
            }
            SessionMode::Setup => true,
        }
    }

    pub fn update(&mut self) {
        self.flush_drops();
        self.session.tick(Instant::now());
    }

    fn pointer_down(&mut self, point: [f32; 2]) {
        if self.session.mode() != SessionMode::Comparing || self.imgui.io().want_capture_mouse {
            return;
        }
        let scene = self.scene();
        if !scene.accepts_press(point) {
            return;
        }
        let target = scene.divider.hit(point);
        self.session
            .press(point[0], target, scene.span.reference(), self.capture_host.clone());
    }

    fn pointer_move(&mut self, point: [f32; 2]) {
        self.drops.cursor_moved(point);
        if self.session.slider().dragging {
            let reference = self.scene().span.reference();
            self.session.drag(point[0], reference);
        }
    }

    /// A gesture may drop several files; they arrive as consecutive events
    /// and are handled here as one batch.
    fn flush_drops(&mut self) {
        let paths = self.drops.take_batch();
        if paths.is_empty() || self.session.mode() != SessionMode::Setup {
            return;
        }
        if let Some(slot) = self.drops.target(&self.drop_zones, self.session.slots()) {
            if self.session.slots_mut().submit_drop(slot, &paths).is_some() {
                self.sync_textures();
            }
        }
    }

    fn viewport(&self) -> Size {
        let size = self
            .window
            .inner_size()
            .to_logical::<f32>(self.window.scale_factor());
        Size::new(size.width, size.height)
    }

    fn texture_size(&self, slot: Slot) -> Size {
        self.textures
            .get(&slot)
            .map(|texture| texture.size)
            .unwrap_or(Size::new(0.0, 0.0))
    }

    fn scene(&self) -> ComparisonScene {
        ComparisonScene::compute(
            self.viewport(),
            self.reference_mode,
            self.texture_size(Slot::Dark),
            self.texture_size(Slot::Light),
            self.session.slider().position,
        )
    }

    fn resize(&mut self, size: PhysicalSize<u32>) {
        if size.width == 0 || size.height == 0 {
            return;
        }
        self.surface_config.width = size.width;
        self.surface_config.height = size.height;
        self.surface.configure(&self.device, &self.surface_config);
    }

    /// Brings GPU textures in line with the slots: new resources are
    /// uploaded, replaced or removed ones are released.
    fn sync_textures(&mut self) {
        for slot in Slot::ALL {
            let current = self.session.slots().get(slot).map(ImageResource::id);
            let cached = self.textures.get(&slot).map(|texture| texture.resource);
            if current == cached {
                continue;
            }
            if let Some(old) = self.textures.remove(&slot) {
                self.renderer.textures.remove(old.texture);
                debug!("Released texture for {} slot", slot);
            }
            let Some(resource) = self.session.slots().get(slot) else {
                continue;
            };
            match upload_texture(&self.device, &self.queue, &mut self.renderer, resource) {
                Ok(texture) => {
                    self.textures.insert(slot, texture);
                }
                Err(e) => warn!("Cannot display {} image: {:#}", slot, e),
            }
        }
    }

    fn apply(&mut self, action: UiAction) {
        let now = Instant::now();
        match action {
            UiAction::Browse(slot) => self.browse(slot),
            UiAction::Remove(slot) => {
                self.session.slots_mut().remove(slot);
                self.sync_textures();
            }
            UiAction::Compare => {
                self.session.enter_comparison(now);
            }
            UiAction::Back => self.session.reset(now),
        }
    }

    fn browse(&mut self, slot: Slot) {
        let Some(path) = rfd::FileDialog::new()
            .set_title(slot.title())
            .add_filter("image files", IMAGE_EXTENSIONS)
            .pick_file()
        else {
            return;
        };
        match self.session.slots_mut().submit_path(slot, &path) {
            Ok(_) | Err(AcquireError::UnsupportedType { .. }) => {}
            Err(e) => warn!("{:#}", anyhow::Error::from(e)),
        }
        self.sync_textures();
    }

    pub fn render(&mut self) -> Result<()> {
        let now = Instant::now();
        let frame = match self.surface.get_current_texture() {
            Ok(frame) => frame,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                self.surface.configure(&self.device, &self.surface_config);
                return Ok(());
            }
            Err(e) => return Err(e).context("Failed to acquire next frame"),
        };
        let viewport = self.viewport();
        let progress = self.session.transition_progress(now);
        let scene = ComparisonScene::compute_scaled(
            viewport,
            self.reference_mode,
            self.texture_size(Slot::Dark),
            self.texture_size(Slot::Light),
            self.session.slider().position,
            lerp(ENTRANCE_SCALE, 1.0, progress),
        );
        let drop_target = self
            .drops
            .is_hovering()
            .then(|| self.drops.target(&self.drop_zones, self.session.slots()))
            .flatten();

        self.platform
            .prepare_frame(self.imgui.io_mut(), &self.window)
            .map_err(|e| anyhow!("Failed to prepare imgui frame: {}", e))?;
        let ui = self.imgui.new_frame();

        let mut actions = Vec::new();
        let mut zones = Vec::new();
        let mode = self.session.mode();
        draw_backdrop(ui, mode, &scene, &self.textures, viewport, progress);
        match mode {
            SessionMode::Setup => draw_setup(
                ui,
                &self.session,
                &self.textures,
                drop_target,
                viewport,
                &mut zones,
                &mut actions,
            ),
            SessionMode::Comparing => draw_comparison(ui, &scene, &self.textures, progress, &mut actions),
        }
        self.platform.prepare_render(ui, &self.window);
        let draw_data = self.imgui.render();

        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("comparison encoder"),
            });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("comparison pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(CLEAR_COLOR),
                        store: true,
                    },
                })],
                depth_stencil_attachment: None,
            });
            self.renderer
                .render(draw_data, &self.queue, &self.device, &mut pass)
                .map_err(|e| anyhow!("imgui render failed: {:?}", e))?;
        }
        self.queue.submit(Some(encoder.finish()));
        frame.present();

        self.drop_zones = zones;
        for action in actions {
            self.apply(action);
        }
        Ok(())
    }
}

fn upload_texture(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    renderer: &mut Renderer,
    resource: &ImageResource,
) -> Result<SlotTexture> {
    let decoded = resource.decode()?;
    let size = Size::new(decoded.width() as f32, decoded.height() as f32);

    // The GPU copy may be scaled down to fit the device; the slot keeps the
    // bytes it was given.
    let max_side = device.limits().max_texture_dimension_2d;
    let rgba = if decoded.width() > max_side || decoded.height() > max_side {
        let scale = max_side as f32 / decoded.width().max(decoded.height()) as f32;
        let width = ((decoded.width() as f32 * scale) as u32).clamp(1, max_side);
        let height = ((decoded.height() as f32 * scale) as u32).clamp(1, max_side);
        debug!(
            "Scaling '{}' from {}x{} to {}x{} for upload",
            resource.name(),
            decoded.width(),
            decoded.height(),
            width,
            height
        );
        image::imageops::resize(&decoded, width, height, image::imageops::FilterType::Triangle)
    } else {
        decoded
    };

    let (width, height) = rgba.dimensions();
    let texture = Texture::new(
        device,
        renderer,
        TextureConfig {
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            label: Some(resource.name()),
            format: Some(wgpu::TextureFormat::Rgba8Unorm),
            ..Default::default()
        },
    );
    texture.write(queue, rgba.as_raw(), width, height);
    let texture = renderer.textures.insert(texture);
    debug!("Uploaded '{}' as {}x{} texture", resource.name(), width, height);
    Ok(SlotTexture {
        resource: resource.id(),
        texture,
        size,
    })
}

/// Background photo across the whole window, plus the darkening veil left of
/// the divider while comparing.
fn draw_backdrop(
    ui: &Ui,
    mode: SessionMode,
    scene: &ComparisonScene,
    textures: &HashMap<Slot, SlotTexture>,
    viewport: Size,
    progress: f32,
) {
    let Some(background) = textures.get(&Slot::Background) else {
        return;
    };
    let opacity = match mode {
        SessionMode::Setup => lerp(COMPARING_BACKGROUND_OPACITY, SETUP_BACKGROUND_OPACITY, progress),
        SessionMode::Comparing => lerp(SETUP_BACKGROUND_OPACITY, COMPARING_BACKGROUND_OPACITY, progress),
    };
    let (uv_min, uv_max) = cover_uv(viewport, background.size);
    let draw_list = ui.get_background_draw_list();
    draw_list
        .add_image(background.texture, [0.0, 0.0], [viewport.w, viewport.h])
        .uv_min(uv_min)
        .uv_max(uv_max)
        .col([1.0, 1.0, 1.0, opacity])
        .build();
    if mode == SessionMode::Comparing {
        if let Some(overlay) = scene.overlay {
            draw_list
                .add_rect(overlay.min(), overlay.max(), [0.0, 0.0, 0.0, DARK_OVERLAY_OPACITY])
                .filled(true)
                .build();
        }
    }
}

fn draw_setup(
    ui: &Ui,
    session: &Session,
    textures: &HashMap<Slot, SlotTexture>,
    drop_target: Option<Slot>,
    viewport: Size,
    zones: &mut Vec<(Slot, Rect)>,
    actions: &mut Vec<UiAction>,
) {
    let width = (viewport.w * 0.9).min(SETUP_MAX_WIDTH);
    ui.window("Light / Dark Comparison")
        .position([viewport.w / 2.0, viewport.h / 2.0], Condition::Always)
        .position_pivot([0.5, 0.5])
        .flags(
            WindowFlags::NO_COLLAPSE
                | WindowFlags::NO_MOVE
                | WindowFlags::NO_RESIZE
                | WindowFlags::ALWAYS_AUTO_RESIZE
                | WindowFlags::NO_SAVED_SETTINGS,
        )
        .build(|| {
            ui.text_wrapped("Create interactive comparisons between your light and dark mode designs.");
            ui.separator();

            let spacing = ui.clone_style().item_spacing[0];
            let half = (width - spacing) / 2.0;
            draw_slot_panel(ui, Slot::Light, session, textures, drop_target, [half, SLOT_PANEL_HEIGHT], zones, actions);
            ui.same_line();
            draw_slot_panel(ui, Slot::Dark, session, textures, drop_target, [half, SLOT_PANEL_HEIGHT], zones, actions);
            draw_slot_panel(ui, Slot::Background, session, textures, drop_target, [width, SLOT_PANEL_HEIGHT], zones, actions);

            ui.spacing();
            ui.disabled(!session.can_compare(), || {
                if ui.button_with_size("Generate comparison", [width, 40.0]) {
                    actions.push(UiAction::Compare);
                }
            });
        });
}

#[allow(clippy::too_many_arguments)]
fn draw_slot_panel(
    ui: &Ui,
    slot: Slot,
    session: &Session,
    textures: &HashMap<Slot, SlotTexture>,
    drop_target: Option<Slot>,
    size: [f32; 2],
    zones: &mut Vec<(Slot, Rect)>,
    actions: &mut Vec<UiAction>,
) {
    ui.child_window(slot.key()).size(size).border(true).build(|| {
        let pos = ui.window_pos();
        let window_size = ui.window_size();
        zones.push((slot, Rect::new(pos[0], pos[1], window_size[0], window_size[1])));

        ui.text(slot.title());
        match (session.slots().get(slot), textures.get(&slot)) {
            (Some(resource), texture) => {
                let avail = ui.content_region_avail();
                let footer = ui.frame_height_with_spacing() * 2.0;
                if let Some(texture) = texture {
                    let area = Rect::new(0.0, 0.0, avail[0], (avail[1] - footer).max(1.0));
                    let thumb = fit_within(area, texture.size);
                    imgui::Image::new(texture.texture, [thumb.w.max(1.0), thumb.h.max(1.0)]).build(ui);
                } else {
                    ui.text_wrapped("This image could not be displayed.");
                }
                ui.text_disabled(resource.name());
                if ui.button(format!("Change##{}", slot.key())) {
                    actions.push(UiAction::Browse(slot));
                }
                ui.same_line();
                if ui.button(format!("Remove##{}", slot.key())) {
                    actions.push(UiAction::Remove(slot));
                }
            }
            (None, _) => {
                ui.text_disabled(if drop_target == Some(slot) {
                    "Release to drop the image"
                } else {
                    "Drag and drop an image, or browse"
                });
                if ui.button(format!("Browse##{}", slot.key())) {
                    actions.push(UiAction::Browse(slot));
                }
            }
        }
    });
}

/// Dark screenshot left of the divider, light screenshot right of it, the
/// divider with its grip, and the way back to setup.
fn draw_comparison(
    ui: &Ui,
    scene: &ComparisonScene,
    textures: &HashMap<Slot, SlotTexture>,
    progress: f32,
    actions: &mut Vec<UiAction>,
) {
    {
        let draw_list = ui.get_background_draw_list();
        let tint = [1.0, 1.0, 1.0, progress];
        for (slot, layer) in [(Slot::Dark, scene.dark), (Slot::Light, scene.light)] {
            if let (Some(texture), Some(layer)) = (textures.get(&slot), layer) {
                draw_list
                    .add_image(texture.texture, layer.rect.min(), layer.rect.max())
                    .uv_min(layer.uv_min)
                    .uv_max(layer.uv_max)
                    .col(tint)
                    .build();
            }
        }

        let divider = scene.divider;
        draw_list
            .add_rect(
                [divider.line.x - 2.0, divider.line.y],
                [divider.line.right() + 2.0, divider.line.bottom()],
                DIVIDER_SHADOW,
            )
            .filled(true)
            .build();
        draw_list
            .add_rect(divider.line.min(), divider.line.max(), WHITE)
            .filled(true)
            .build();
        draw_list
            .add_rect(divider.grip.min(), divider.grip.max(), WHITE)
            .filled(true)
            .rounding(GRIP_WIDTH / 2.0)
            .build();
    }

    ui.window("##back")
        .position([24.0, 24.0], Condition::Always)
        .bg_alpha(0.8)
        .flags(
            WindowFlags::NO_DECORATION
                | WindowFlags::NO_MOVE
                | WindowFlags::ALWAYS_AUTO_RESIZE
                | WindowFlags::NO_SAVED_SETTINGS,
        )
        .build(|| {
            if ui.button_with_size("<", [48.0, 48.0]) {
                actions.push(UiAction::Back);
            }
        });
}
