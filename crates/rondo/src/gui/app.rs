use crate::config::{self, RenderConfig, WindowConfig};
use crate::events::AppEvent;
use crate::gui::media::Playback;
use crate::gui::ring::{self, Artwork, Stage};
use crate::gui::theme::{self, ThemeColors};
use crate::gui::window;
use crate::sys::server::{SharedStatus, Status};
use gtk::prelude::*;
use gtk4 as gtk;
use relm4::prelude::*;
use spindle::{
    CardDescriptor, Carousel, ClickOutcome, InteractionMode, Key, Point, Size, SourceUrl, Tuning,
    WheelOutcome,
};
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

/// Resizes closer together than this collapse into one recenter.
const RESIZE_DEBOUNCE: Duration = Duration::from_millis(100);
/// Longest step fed to the engine after a stalled frame.
const MAX_FRAME: Duration = Duration::from_millis(100);

pub struct AppInit {
    pub config: config::Config,
    pub cards: Vec<CardDescriptor>,
    pub artwork: Artwork,
    pub status: SharedStatus,
    pub rx: async_channel::Receiver<AppEvent>,
}

pub struct AppModel {
    /// Built on the first real allocation, which fixes the ring scale.
    ring: Rc<RefCell<Option<Carousel>>>,
    pending_cards: Option<Vec<CardDescriptor>>,
    playback: Playback,
    render: Rc<RefCell<RenderConfig>>,
    tuning: Tuning,
    window: WindowConfig,
    manifest: Option<std::path::PathBuf>,
    status: SharedStatus,
    drawing_area: gtk::DrawingArea,
    resize_debounce: Rc<RefCell<Option<glib::SourceId>>>,
}

#[derive(Debug)]
pub enum AppMsg {
    /// The wheel already reached the engine; only status and redraw remain.
    Wheeled,
    Key(Key),
    PointerDown(Point),
    PointerMove(Point),
    PointerUp,
    Click(Point),
    Resized(Size),
    Recenter(Size),
    Next,
    Prev,
    Open(usize),
    Close,
    ConfigReload,
    ManifestChanged,
}

impl From<AppEvent> for AppMsg {
    fn from(event: AppEvent) -> Self {
        match event {
            AppEvent::Next => AppMsg::Next,
            AppEvent::Prev => AppMsg::Prev,
            AppEvent::Open(i) => AppMsg::Open(i),
            AppEvent::Close => AppMsg::Close,
            AppEvent::ConfigReload => AppMsg::ConfigReload,
            AppEvent::ManifestChanged => AppMsg::ManifestChanged,
        }
    }
}

fn ring_key(key: gtk::gdk::Key) -> Option<Key> {
    use gtk::gdk::Key as K;
    match key {
        K::Left | K::KP_Left => Some(Key::Left),
        K::Right | K::KP_Right => Some(Key::Right),
        K::Escape => Some(Key::Escape),
        _ => None,
    }
}

/// Unconsumed wheel events bubble on to the rest of the window.
fn wheel_propagation(outcome: Option<WheelOutcome>) -> glib::Propagation {
    match outcome {
        None | Some(WheelOutcome::Ignored) => glib::Propagation::Proceed,
        Some(WheelOutcome::Blocked | WheelOutcome::Spun) => glib::Propagation::Stop,
    }
}

fn open_link(url: &SourceUrl) {
    log::info!("Opening {}", url);
    let mut child = match std::process::Command::new("xdg-open").arg(url.as_str()).spawn() {
        Ok(child) => child,
        Err(e) => {
            log::error!("Failed to open '{}': {}", url, e);
            return;
        }
    };
    let url = url.to_string();
    std::thread::spawn(move || match child.wait() {
        Ok(status) if !status.success() => log::warn!("xdg-open '{}' exited with {}", url, status),
        Ok(_) => {}
        Err(e) => log::warn!("Failed to wait for xdg-open '{}': {}", url, e),
    });
}

#[relm4::component(pub)]
impl SimpleComponent for AppModel {
    type Init = AppInit;
    type Input = AppMsg;
    type Output = ();

    view! {
        #[root]
        gtk::ApplicationWindow {
            set_title: Some("Rondo"),
            add_css_class: "rondo-window",
            set_decorated: false,

            add_controller = gtk::EventControllerKey {
                connect_key_pressed[sender] => move |_, key, _, _| {
                    match ring_key(key) {
                        Some(key) => {
                            sender.input(AppMsg::Key(key));
                            glib::Propagation::Stop
                        }
                        None => glib::Propagation::Proceed,
                    }
                }
            },

            #[name = "drawing_area"]
            gtk::DrawingArea {
                set_hexpand: true,
                set_vexpand: true,
                set_focusable: true,
                add_css_class: "rondo-stage",

                connect_resize[sender] => move |_, width, height| {
                    sender.input(AppMsg::Resized(Size::new(width as f64, height as f64)));
                },

                add_controller = gtk::GestureDrag {
                    connect_drag_begin[sender] => move |_, x, y| {
                        sender.input(AppMsg::PointerDown(Point::new(x, y)));
                    },
                    connect_drag_update[sender] => move |gesture, dx, dy| {
                        if let Some((x, y)) = gesture.start_point() {
                            sender.input(AppMsg::PointerMove(Point::new(x + dx, y + dy)));
                        }
                    },
                    connect_drag_end[sender] => move |_, _, _| {
                        sender.input(AppMsg::PointerUp);
                    },
                },

                add_controller = gtk::GestureClick {
                    connect_released[sender] => move |_, _, x, y| {
                        sender.input(AppMsg::Click(Point::new(x, y)));
                    }
                },
            }
        }
    }

    fn init(
        init: Self::Init,
        root: Self::Root,
        sender: ComponentSender<Self>,
    ) -> ComponentParts<Self> {
        let AppInit {
            config,
            cards,
            artwork,
            status,
            rx,
        } = init;

        theme::load_css();
        window::configure(&root, &config.window);

        let model = AppModel {
            ring: Rc::new(RefCell::new(None)),
            pending_cards: Some(cards),
            playback: Playback::new(),
            render: Rc::new(RefCell::new(config.render)),
            tuning: config.tuning,
            window: config.window,
            manifest: config.manifest,
            status,
            drawing_area: gtk::DrawingArea::default(),
            resize_debounce: Rc::default(),
        };

        let widgets = view_output!();

        let mut model = model;
        model.drawing_area = widgets.drawing_area.clone();

        let ring_draw = model.ring.clone();
        let playback_draw = model.playback.clone();
        let render_draw = model.render.clone();
        widgets
            .drawing_area
            .set_draw_func(move |drawing_area, cr, _, _| {
                let ring_state = ring_draw.borrow();
                let Some(carousel) = ring_state.as_ref() else {
                    return;
                };
                let colors = ThemeColors::from_context(&drawing_area.style_context());
                let stage = Stage {
                    scene: carousel.scene(),
                    cards: carousel.cards(),
                    artwork: &artwork,
                    playback: &playback_draw,
                    hints: carousel.hints(),
                    central: carousel.central(),
                    show_central: matches!(
                        carousel.mode(),
                        InteractionMode::Idle | InteractionMode::Dragging
                    ),
                    quality: render_draw.borrow().quality.filter(),
                };
                if let Err(e) = ring::draw(cr, &stage, &colors) {
                    log::error!("Drawing error: {}", e);
                }
            });

        // connected here so the handler can report whether the engine took the event
        let scroll = gtk::EventControllerScroll::new(gtk::EventControllerScrollFlags::VERTICAL);
        let ring_scroll = model.ring.clone();
        let render_scroll = model.render.clone();
        let sender_scroll = sender.clone();
        scroll.connect_scroll(move |_, _, dy| {
            let step = render_scroll.borrow().wheel_step_px;
            let outcome = ring_scroll
                .borrow_mut()
                .as_mut()
                .map(|carousel| carousel.wheel(dy * step));
            if outcome == Some(WheelOutcome::Spun) {
                sender_scroll.input(AppMsg::Wheeled);
            }
            wheel_propagation(outcome)
        });
        widgets.drawing_area.add_controller(scroll);

        let ring_tick = model.ring.clone();
        let playback_tick = model.playback.clone();
        let last_frame = Cell::new(None::<i64>);
        widgets
            .drawing_area
            .add_tick_callback(move |drawing_area, clock| {
                let now = clock.frame_time();
                let elapsed = last_frame
                    .replace(Some(now))
                    .map_or(0, |prev| (now - prev).max(0));
                let dt = Duration::from_micros(elapsed as u64).min(MAX_FRAME);
                let moved = ring_tick
                    .borrow_mut()
                    .as_mut()
                    .is_some_and(|carousel| carousel.tick(dt));
                if moved || playback_tick.is_playing() {
                    drawing_area.queue_draw();
                }
                glib::ControlFlow::Continue
            });

        let sender_clone = sender.clone();
        relm4::spawn(async move {
            while let Ok(event) = rx.recv().await {
                sender_clone.input(AppMsg::from(event));
            }
        });

        widgets.drawing_area.grab_focus();

        ComponentParts { model, widgets }
    }

    fn update(&mut self, msg: Self::Input, sender: ComponentSender<Self>) {
        match msg {
            AppMsg::Resized(size) => self.resized(size, &sender),
            AppMsg::Recenter(size) => {
                if let Some(carousel) = self.ring.borrow_mut().as_mut() {
                    carousel.recenter(size);
                }
            }
            AppMsg::ConfigReload => self.reload_config(),
            AppMsg::Wheeled => {}
            AppMsg::ManifestChanged => {
                log::warn!("Manifest changed on disk; the card set is fixed until restart");
            }
            input => {
                if let Some(url) = self.route_input(input) {
                    open_link(&url);
                }
            }
        }
        self.publish_status();
        self.drawing_area.queue_draw();
    }
}

impl AppModel {
    /// Hands an input to the engine. Returns a link the user asked to open.
    fn route_input(&mut self, msg: AppMsg) -> Option<SourceUrl> {
        let mut ring = self.ring.borrow_mut();
        let carousel = ring.as_mut()?;
        let outcome = match msg {
            AppMsg::Key(key) => {
                let consumed = carousel.key(key);
                if !consumed && key == Key::Escape {
                    relm4::main_application().quit();
                }
                None
            }
            AppMsg::PointerDown(at) => {
                carousel.pointer_down(at);
                None
            }
            AppMsg::PointerMove(at) => {
                carousel.pointer_move(at);
                None
            }
            AppMsg::PointerUp => {
                carousel.pointer_up();
                None
            }
            AppMsg::Click(at) => Some(carousel.click(at)),
            AppMsg::Next => {
                carousel.key(Key::Right);
                None
            }
            AppMsg::Prev => {
                carousel.key(Key::Left);
                None
            }
            AppMsg::Open(index) => match carousel.activate(index) {
                Ok(outcome) => Some(outcome),
                Err(e) => {
                    log::warn!("Ignoring open request: {}", e);
                    None
                }
            },
            AppMsg::Close => {
                carousel.close();
                None
            }
            _ => None,
        };
        match outcome {
            Some(ClickOutcome::OpenSource(url)) => Some(url),
            _ => None,
        }
    }

    fn resized(&mut self, size: Size, sender: &ComponentSender<Self>) {
        if size.is_degenerate() {
            return;
        }
        if self.ring.borrow().is_none() {
            self.build_ring(size);
            return;
        }
        if let Some(pending) = self.resize_debounce.borrow_mut().take() {
            pending.remove();
        }
        let slot = self.resize_debounce.clone();
        let sender = sender.clone();
        let id = glib::timeout_add_local_once(RESIZE_DEBOUNCE, move || {
            slot.borrow_mut().take();
            sender.input(AppMsg::Recenter(size));
        });
        *self.resize_debounce.borrow_mut() = Some(id);
    }

    fn build_ring(&mut self, viewport: Size) {
        let Some(cards) = self.pending_cards.take() else {
            return;
        };
        match Carousel::new(cards, viewport, self.tuning.clone()) {
            Ok(carousel) => {
                let mut carousel = carousel.with_media(Box::new(self.playback.clone()));
                carousel.begin_entry();
                *self.ring.borrow_mut() = Some(carousel);
            }
            Err(e) => log::error!("Failed to build the ring: {}", e),
        }
    }

    fn reload_config(&mut self) {
        let new_config = match config::load_config() {
            Ok(c) => c,
            Err(e) => {
                log::error!("Failed to reload config: {}", e);
                return;
            }
        };
        if new_config.window != self.window {
            log::warn!("Window settings apply on the next start");
        }
        if new_config.manifest != self.manifest {
            log::warn!("A different manifest applies on the next start");
        }
        self.tuning = new_config.tuning.clone();
        if let Some(carousel) = self.ring.borrow_mut().as_mut() {
            carousel.retune(new_config.tuning);
        }
        *self.render.borrow_mut() = new_config.render;
        log::info!("Configuration reloaded");
    }

    fn publish_status(&self) {
        let ring = self.ring.borrow();
        let Some(carousel) = ring.as_ref() else {
            return;
        };
        *self.status.write() = Status {
            mode: carousel.mode().to_string(),
            central: carousel.central(),
            cards: carousel.cards().len(),
            detail: carousel.detail_session().map(|s| s.active()),
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ring_keys() {
        assert_eq!(ring_key(gtk::gdk::Key::Left), Some(Key::Left));
        assert_eq!(ring_key(gtk::gdk::Key::KP_Right), Some(Key::Right));
        assert_eq!(ring_key(gtk::gdk::Key::Escape), Some(Key::Escape));
        assert_eq!(ring_key(gtk::gdk::Key::a), None);
    }

    #[test]
    fn test_only_ignored_wheel_events_propagate() {
        assert_eq!(
            wheel_propagation(Some(WheelOutcome::Ignored)),
            glib::Propagation::Proceed
        );
        assert_eq!(wheel_propagation(None), glib::Propagation::Proceed);
        assert_eq!(
            wheel_propagation(Some(WheelOutcome::Blocked)),
            glib::Propagation::Stop
        );
        assert_eq!(
            wheel_propagation(Some(WheelOutcome::Spun)),
            glib::Propagation::Stop
        );
    }

    #[test]
    fn test_socket_events_map_to_messages() {
        assert!(matches!(AppMsg::from(AppEvent::Open(4)), AppMsg::Open(4)));
        assert!(matches!(AppMsg::from(AppEvent::Next), AppMsg::Next));
        assert!(matches!(
            AppMsg::from(AppEvent::ManifestChanged),
            AppMsg::ManifestChanged
        ));
    }
}
