// main.rs: desktop tour viewer with menus, status bar and hotspot overlay

#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

mod i18n;
mod renderer;

use cube_panorama::{
    Controls, ElementId, FieldOfView, Key, Options, Panorama, PanoramaEvent, Pointer,
    RenderSurface, Tour, TourError, Viewport,
};
use renderer::Renderer;

use glam::DVec2;
use image::RgbaImage;
use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Arc;
use std::thread;
use std::time::Instant;
use winit::{
    dpi::LogicalSize,
    event::*,
    event_loop::{ControlFlow, EventLoop},
    window::{Fullscreen, Window, WindowBuilder},
};

/// Pointer travel, in pixels, below which a press and release count as a click.
const CLICK_SLOP: f64 = 4.0;

struct Cli {
    lang: Option<String>,
    tour: Option<PathBuf>,
}

fn parse_args(args: impl IntoIterator<Item = String>) -> Cli {
    let mut cli = Cli {
        lang: None,
        tour: None,
    };
    let mut it = args.into_iter();
    while let Some(a) = it.next() {
        if a == "--lang" {
            cli.lang = it.next();
        } else if cli.tour.is_none() {
            cli.tour = Some(PathBuf::from(a));
        }
    }
    cli
}

/// Results of background loading, handed back to the event loop.
enum Loaded {
    Tour(Result<Tour, TourError>),
    Faces {
        scene: String,
        faces: Result<Vec<RgbaImage>, TourError>,
    },
}

struct Viewer {
    panorama: Panorama,
    events: Rc<RefCell<Vec<PanoramaEvent>>>,
    controls: Controls,
    tour: Option<Tour>,
    loading: Option<String>,
    error: Option<String>,
    cursor: DVec2,
    press: Option<DVec2>,
    is_fullscreen: bool,
}

impl Viewer {
    fn new(options: Options, viewport: Viewport) -> Self {
        let events = Rc::new(RefCell::new(Vec::new()));
        Self {
            panorama: subscribed(options, viewport, &events),
            events,
            controls: Controls::new(),
            tour: None,
            loading: None,
            error: None,
            cursor: DVec2::ZERO,
            press: None,
            is_fullscreen: false,
        }
    }

    fn install_tour(&mut self, tour: Tour, tx: &Sender<Loaded>) {
        let viewport = self.panorama.viewport();
        self.panorama = subscribed(tour.options.clone(), viewport, &self.events);
        self.controls = Controls::new();
        self.error = None;
        let first = tour.default_scene().map(|(id, _)| id.to_owned());
        self.tour = Some(tour);
        if let Some(id) = first {
            self.request_scene(id, tx);
        }
    }

    fn request_scene(&mut self, id: String, tx: &Sender<Loaded>) {
        let Some(tour) = &self.tour else {
            return;
        };
        self.loading = Some(id.clone());
        start_load_faces(tour.clone(), id, tx.clone());
    }

    fn show_scene(&mut self, id: &str, faces: Vec<RgbaImage>, renderer: &mut Renderer) {
        let Some(tour) = &self.tour else {
            return;
        };
        match tour.scene(id).cloned() {
            Ok(scene) => {
                renderer.load_faces(faces);
                self.panorama.enter_scene(id, &scene);
            }
            Err(e) => self.fail(e),
        }
    }

    fn fail(&mut self, err: impl std::fmt::Display) {
        log::error!("{err}");
        self.error = Some(err.to_string());
    }

    /// Drains notifications raised since the last call.
    fn handle_events(&mut self, tx: &Sender<Loaded>) {
        let events: Vec<PanoramaEvent> = self.events.borrow_mut().drain(..).collect();
        for event in events {
            if let PanoramaEvent::Navigate { target } = event {
                self.request_scene(target, tx);
            }
        }
    }

    fn click(&mut self, at: DVec2) {
        if let Some(index) = self.panorama.live_hotspot_at(at) {
            self.panorama.navigate(index);
        }
    }

    /// Back to the configured orientation and FOV, discarding any zoom.
    fn reset_view(&mut self) {
        let options = self.panorama.options();
        let initial = options.initial_orientation();
        let transition = options.navigation_transition();
        let fov = FieldOfView::calculate(options.fov_input(), self.panorama.viewport());
        self.panorama.finish_zoom();
        self.panorama.zoom_to(fov.horizontal, transition);
        self.panorama.rotate(initial.pitch, initial.yaw, transition);
    }
}

fn subscribed(
    options: Options,
    viewport: Viewport,
    events: &Rc<RefCell<Vec<PanoramaEvent>>>,
) -> Panorama {
    let mut panorama = Panorama::new(options, viewport);
    let sink = events.clone();
    panorama.subscribe(move |e| sink.borrow_mut().push(e.clone()));
    panorama
}

fn key_of(code: VirtualKeyCode) -> Option<Key> {
    Some(match code {
        VirtualKeyCode::Up => Key::Up,
        VirtualKeyCode::Down => Key::Down,
        VirtualKeyCode::Left => Key::Left,
        VirtualKeyCode::Right => Key::Right,
        VirtualKeyCode::Space => Key::Space,
        VirtualKeyCode::Plus | VirtualKeyCode::Equals | VirtualKeyCode::NumpadAdd => Key::Plus,
        VirtualKeyCode::Minus | VirtualKeyCode::NumpadSubtract => Key::Minus,
        _ => return None,
    })
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let cli = parse_args(std::env::args().skip(1));
    i18n::init(i18n::resolve_lang(cli.lang.as_deref()));

    let event_loop = EventLoop::new();
    let window = Arc::new(
        WindowBuilder::new()
            .with_title(i18n::tr("app.title"))
            .with_inner_size(LogicalSize::new(1280, 720))
            .build(&event_loop)?,
    );

    let mut renderer = pollster::block_on(Renderer::new(window.clone()))?;
    let size = renderer.size;
    let mut viewer = Viewer::new(
        Options::default(),
        Viewport::new(size.width as f64, size.height as f64),
    );

    let (tx, rx): (Sender<Loaded>, Receiver<Loaded>) = channel();
    if let Some(path) = cli.tour {
        start_load_tour(path, tx.clone());
    }

    let mut last_tick = Instant::now();

    event_loop.run(move |event, _, control_flow| {
        *control_flow = ControlFlow::Poll;

        while let Ok(loaded) = rx.try_recv() {
            match loaded {
                Loaded::Tour(Ok(tour)) => viewer.install_tour(tour, &tx),
                Loaded::Tour(Err(e)) => viewer.fail(i18n::tr_with(
                    "error.load_tour",
                    &[("err", e.to_string())],
                )),
                Loaded::Faces { scene, faces } => {
                    viewer.loading = None;
                    match faces {
                        Ok(faces) => viewer.show_scene(&scene, faces, &mut renderer),
                        Err(e) => viewer.fail(i18n::tr_with(
                            "error.load_scene",
                            &[("scene", scene), ("err", e.to_string())],
                        )),
                    }
                }
            }
        }

        match event {
            Event::WindowEvent { event, .. } => {
                let response = renderer.egui_state.on_event(&renderer.egui_ctx, &event);
                if response.consumed {
                    return;
                }

                match event {
                    WindowEvent::CloseRequested => {
                        *control_flow = ControlFlow::Exit;
                    }

                    WindowEvent::Resized(new_size) => {
                        renderer.resize(new_size);
                        viewer
                            .panorama
                            .resize(new_size.width as f64, new_size.height as f64);
                    }

                    WindowEvent::Focused(false) => {
                        viewer.controls.release_all(&mut viewer.panorama);
                    }

                    WindowEvent::KeyboardInput { input, .. } => {
                        let Some(code) = input.virtual_keycode else {
                            return;
                        };
                        if code == VirtualKeyCode::F11 && input.state == ElementState::Pressed {
                            toggle_fullscreen(&mut viewer, &window);
                        } else if let Some(key) = key_of(code) {
                            match input.state {
                                ElementState::Pressed => {
                                    viewer.controls.key_down(&mut viewer.panorama, key);
                                }
                                ElementState::Released => {
                                    viewer.controls.key_up(&mut viewer.panorama, key);
                                }
                            }
                        }
                    }

                    WindowEvent::MouseInput {
                        state,
                        button: MouseButton::Left,
                        ..
                    } => match state {
                        ElementState::Pressed => {
                            viewer.press = Some(viewer.cursor);
                            viewer
                                .controls
                                .pointer_down(&viewer.panorama, Pointer::Mouse, viewer.cursor);
                        }
                        ElementState::Released => {
                            viewer.controls.pointer_up(Pointer::Mouse);
                            if let Some(start) = viewer.press.take() {
                                if start.distance(viewer.cursor) < CLICK_SLOP {
                                    viewer.click(viewer.cursor);
                                }
                            }
                        }
                    },

                    WindowEvent::CursorMoved { position, .. } => {
                        viewer.cursor = DVec2::new(position.x, position.y);
                        viewer
                            .controls
                            .pointer_move(&mut viewer.panorama, viewer.cursor);
                    }

                    WindowEvent::Touch(touch) => {
                        let at = DVec2::new(touch.location.x, touch.location.y);
                        match touch.phase {
                            TouchPhase::Started => {
                                viewer.press = Some(at);
                                viewer
                                    .controls
                                    .pointer_down(&viewer.panorama, Pointer::Touch, at);
                            }
                            TouchPhase::Moved => {
                                viewer.controls.pointer_move(&mut viewer.panorama, at);
                            }
                            TouchPhase::Ended => {
                                viewer.controls.pointer_up(Pointer::Touch);
                                if viewer.press.take().is_some_and(|s| s.distance(at) < CLICK_SLOP) {
                                    viewer.click(at);
                                }
                            }
                            TouchPhase::Cancelled => {
                                viewer.controls.pointer_up(Pointer::Touch);
                                viewer.press = None;
                            }
                        }
                    }

                    WindowEvent::MouseWheel { delta, .. } => {
                        let scroll = match delta {
                            MouseScrollDelta::LineDelta(_, y) => y as f64,
                            MouseScrollDelta::PixelDelta(pos) => pos.y,
                        };
                        viewer.controls.wheel(&mut viewer.panorama, scroll);
                    }

                    WindowEvent::DroppedFile(path) => {
                        start_load_tour(path, tx.clone());
                    }

                    _ => {}
                }
            }

            Event::RedrawRequested(_) => {
                let now = Instant::now();
                viewer.panorama.advance(now.duration_since(last_tick));
                last_tick = now;
                viewer.handle_events(&tx);

                let surface = viewer.panorama.surface();
                renderer.update_camera(
                    surface.live_transform(ElementId::Stage),
                    surface.live_transform(ElementId::Cube),
                );

                let face_size = renderer.face_size();
                let render_result = renderer.render_with_ui(&window, |ctx| {
                    draw_ui(ctx, &mut viewer, &window, face_size);
                });

                match render_result {
                    Ok(_) => {}
                    Err(wgpu::SurfaceError::Lost) => renderer.resize(renderer.size),
                    Err(wgpu::SurfaceError::OutOfMemory) => *control_flow = ControlFlow::Exit,
                    Err(e) => log::warn!("render error: {e:?}"),
                }
            }

            Event::MainEventsCleared => {
                window.request_redraw();
            }

            _ => {}
        }
    })
}

fn toggle_fullscreen(viewer: &mut Viewer, window: &Window) {
    viewer.is_fullscreen = !viewer.is_fullscreen;
    if viewer.is_fullscreen {
        window.set_fullscreen(Some(Fullscreen::Borderless(None)));
    } else {
        window.set_fullscreen(None);
    }
}

fn start_load_tour(path: PathBuf, tx: Sender<Loaded>) {
    thread::spawn(move || {
        log::info!(
            "{}",
            i18n::tr_with("log.loading_tour", &[("path", path.display().to_string())])
        );
        if tx.send(Loaded::Tour(Tour::load(&path))).is_err() {
            log::error!("{}", i18n::tr("error.send_to_main_failed"));
        }
    });
}

fn start_load_faces(tour: Tour, scene: String, tx: Sender<Loaded>) {
    thread::spawn(move || {
        log::info!(
            "{}",
            i18n::tr_with("log.loading_scene", &[("scene", scene.clone())])
        );
        let faces = tour.scene(&scene).and_then(|s| tour.load_faces(s));
        if tx.send(Loaded::Faces { scene, faces }).is_err() {
            log::error!("{}", i18n::tr("error.send_to_main_failed"));
        }
    });
}

fn draw_ui(
    ctx: &egui::Context,
    viewer: &mut Viewer,
    window: &Window,
    face_size: (u32, u32),
) {
    egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
        egui::menu::bar(ui, |ui| {
            ui.menu_button(i18n::tr("menu.file"), |ui| {
                if ui.button(i18n::tr("menu.exit")).clicked() {
                    std::process::exit(0);
                }
            });

            ui.menu_button(i18n::tr("menu.view"), |ui| {
                let mut auto_rotate = viewer.panorama.is_auto_rotating();
                if ui
                    .checkbox(&mut auto_rotate, i18n::tr("view.auto_rotate"))
                    .clicked()
                {
                    viewer.panorama.toggle_auto_rotate();
                    ui.close_menu();
                }

                if ui.button(i18n::tr("view.reset")).clicked() {
                    viewer.reset_view();
                    ui.close_menu();
                }

                let fullscreen_label = if viewer.is_fullscreen {
                    i18n::tr("view.fullscreen.exit")
                } else {
                    i18n::tr("view.fullscreen.enter")
                };
                if ui.button(fullscreen_label).clicked() {
                    toggle_fullscreen(viewer, window);
                    ui.close_menu();
                }
            });

            let scenes: Vec<String> = viewer
                .tour
                .as_ref()
                .map(|t| t.scenes.keys().cloned().collect())
                .unwrap_or_default();
            if !scenes.is_empty() {
                ui.menu_button(i18n::tr("menu.scene"), |ui| {
                    for id in scenes {
                        let current = viewer.panorama.scene() == Some(id.as_str());
                        if ui.radio(current, id.as_str()).clicked() {
                            // Scene loads go through the same path as hotspot navigation.
                            viewer.events.borrow_mut().push(PanoramaEvent::Navigate { target: id });
                            ui.close_menu();
                        }
                    }
                });
            }

            ui.menu_button(i18n::tr("menu.language"), |ui| {
                let current = i18n::current_lang();
                for (code, name) in i18n::LANGUAGES {
                    if ui.radio(current == code, name).clicked() {
                        i18n::init(code);
                        window.set_title(&i18n::tr("app.title"));
                        ui.close_menu();
                    }
                }
            });
        });
    });

    egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
        ui.horizontal(|ui| {
            if let Some(scene) = &viewer.loading {
                ui.label(
                    egui::RichText::new(i18n::tr_with("status.loading", &[("scene", scene.clone())]))
                        .color(egui::Color32::YELLOW),
                );
                ui.label("|");
            }
            if let Some(err) = &viewer.error {
                ui.label(egui::RichText::new(err).color(egui::Color32::RED));
                ui.label("|");
            }

            match viewer.panorama.scene() {
                Some(scene) => {
                    ui.label(i18n::tr_with("status.scene", &[("scene", scene.to_owned())]));
                    ui.label("|");
                    ui.label(format!("{}×{}", face_size.0, face_size.1));
                }
                None => {
                    ui.label(i18n::tr("status.no_tour"));
                }
            }

            let orientation = viewer.panorama.orientation();
            let fov = viewer.panorama.fov();
            ui.label("|");
            ui.label(format!("Yaw: {:.1}°", orientation.yaw.normalized().to_degrees()));
            ui.label("|");
            ui.label(format!("Pitch: {:.1}°", orientation.pitch.normalized().to_degrees()));
            ui.label("|");
            ui.label(format!(
                "FOV: {:.1}° × {:.1}°",
                fov.horizontal.to_degrees(),
                fov.vertical.to_degrees()
            ));
            ui.label("|");
            ui.label(format!(
                "{} {:.0}px",
                i18n::tr("status.perspective_prefix"),
                fov.perspective
            ));
        });
    });

    draw_hotspots(ctx, viewer);
}

/// Hotspot polygons are in physical pixels; egui paints in points.
fn draw_hotspots(ctx: &egui::Context, viewer: &Viewer) {
    let ppp = ctx.pixels_per_point() as f64;
    let to_pos = |p: DVec2| egui::pos2((p.x / ppp) as f32, (p.y / ppp) as f32);
    let hovered = viewer.panorama.live_hotspot_at(viewer.cursor);
    let painter = ctx.layer_painter(egui::LayerId::background());

    for (index, polygon) in viewer.panorama.live_polygons().into_iter().enumerate() {
        if polygon.is_empty() {
            continue;
        }
        let points: Vec<egui::Pos2> = polygon.into_iter().map(to_pos).collect();
        let fill = if hovered == Some(index) {
            egui::Color32::from_rgba_unmultiplied(255, 255, 255, 120)
        } else {
            egui::Color32::from_rgba_unmultiplied(255, 255, 255, 60)
        };
        painter.add(egui::Shape::convex_polygon(
            points,
            fill,
            egui::Stroke::new(2.0, egui::Color32::WHITE),
        ));
    }

    let tooltip = hovered
        .and_then(|i| viewer.panorama.hotspots().get(i))
        .and_then(|h| h.text());
    if let Some(text) = tooltip {
        egui::show_tooltip_at_pointer(ctx, egui::Id::new("hotspot_tooltip"), |ui| {
            ui.label(text);
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Cli {
        parse_args(list.iter().map(|s| s.to_string()))
    }

    #[test]
    fn parses_lang_and_tour_in_any_order() {
        let cli = args(&["--lang", "zh-Hans", "tour.json"]);
        assert_eq!(cli.lang.as_deref(), Some("zh-Hans"));
        assert_eq!(cli.tour, Some(PathBuf::from("tour.json")));

        let cli = args(&["tour.json", "--lang", "en"]);
        assert_eq!(cli.lang.as_deref(), Some("en"));
        assert_eq!(cli.tour, Some(PathBuf::from("tour.json")));
    }

    #[test]
    fn no_arguments_means_no_tour() {
        let cli = args(&[]);
        assert!(cli.lang.is_none() && cli.tour.is_none());
    }

    #[test]
    fn keys_map_onto_panorama_keys() {
        assert_eq!(key_of(VirtualKeyCode::Equals), Some(Key::Plus));
        assert_eq!(key_of(VirtualKeyCode::NumpadSubtract), Some(Key::Minus));
        assert_eq!(key_of(VirtualKeyCode::O), None);
    }
}
