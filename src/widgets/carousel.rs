use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use futures::future::BoxFuture;
use tokio::time::Instant;
use tracing::{debug, warn};

use super::{Trigger, Widget};
use crate::browser::SharedContext;
use crate::dom::{Document, Element, Node};
use crate::events::SignalKind;
use crate::interaction::{ClickResponse, Interactions};

const CONTAINER: &str = ".hobby-carousel-container";
const SLIDE: &str = ".hobby-carousel-slide";
const DOTS: &str = ".carousel-dots";
const DOT: &str = ".carousel-dot";
const CONTROLS: &str = ".carousel-nav-prev, .carousel-nav-next, .carousel-dot";

const POSITION_CLASSES: [&str; 4] = [
    "carousel-slide-active",
    "carousel-slide-prev",
    "carousel-slide-next",
    "carousel-slide-hidden",
];

pub const ANIMATION_LOCK: Duration = Duration::from_millis(400);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Prev,
    Next,
}

#[derive(Debug, Default)]
struct CarouselState {
    current: usize,
    total: usize,
    locked_until: Option<Instant>,
}

impl CarouselState {
    fn is_animating(&self) -> bool {
        self.locked_until.is_some_and(|until| Instant::now() < until)
    }
}

/// 3D hobby carousel: one centered card with a neighbour on each side.
pub struct HobbyCarousel {
    context: SharedContext,
    state: Mutex<CarouselState>,
}

impl HobbyCarousel {
    pub fn new(context: SharedContext) -> Self {
        Self {
            context,
            state: Mutex::new(CarouselState::default()),
        }
    }

    pub fn current_index(&self) -> usize {
        self.lock().current
    }

    /// Step one slide; ignored while a previous move is still animating.
    pub fn navigate(&self, direction: Direction) -> bool {
        let mut state = self.lock();
        if state.total == 0 || state.is_animating() {
            return false;
        }
        state.current = match direction {
            Direction::Prev => (state.current + state.total - 1) % state.total,
            Direction::Next => (state.current + 1) % state.total,
        };
        self.render(&mut state);
        true
    }

    pub fn go_to(&self, index: usize) -> bool {
        let mut state = self.lock();
        if index >= state.total || state.is_animating() || index == state.current {
            return false;
        }
        state.current = index;
        self.render(&mut state);
        true
    }

    fn render(&self, state: &mut CarouselState) {
        let (current, total) = (state.current, state.total);
        self.context
            .with_document(|doc| apply_positions(doc, current, total));
        state.locked_until = Some(Instant::now() + ANIMATION_LOCK);
    }

    fn lock(&self) -> MutexGuard<'_, CarouselState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Widget for HobbyCarousel {
    fn name(&self) -> &'static str {
        "hobby-carousel"
    }

    fn subscriptions(&self) -> &'static [SignalKind] {
        &[SignalKind::PageContentLoaded]
    }

    fn install(self: Arc<Self>, interactions: &Interactions) {
        let carousel = Arc::clone(&self);
        let wired = interactions.on_click(CONTROLS, move |event| {
            let el = &event.element;
            if el.has_class("carousel-nav-prev") {
                carousel.navigate(Direction::Prev);
            } else if el.has_class("carousel-nav-next") {
                carousel.navigate(Direction::Next);
            } else if let Some(index) = el.attr("data-index").and_then(|i| i.parse().ok()) {
                carousel.go_to(index);
            }
            ClickResponse::done()
        });
        if let Err(e) = wired {
            warn!("Carousel controls not wired: {}", e);
        }

        interactions.on_key(move |key| {
            match key {
                "ArrowLeft" => self.navigate(Direction::Prev),
                "ArrowRight" => self.navigate(Direction::Next),
                _ => false,
            };
            None
        });
    }

    fn refresh(self: Arc<Self>, _trigger: Trigger<'_>) -> Option<BoxFuture<'static, ()>> {
        let mut state = self.lock();
        let slides = self.context.with_document(|doc| {
            if doc.first(CONTAINER).is_none() {
                return 0;
            }
            let slides = doc.select_paths(SLIDE).len();
            if slides > 0 {
                create_dots(doc, slides);
            }
            slides
        });

        *state = CarouselState {
            current: 0,
            total: slides,
            locked_until: None,
        };
        if slides == 0 {
            debug!("Hobby carousel not found on this page");
            return None;
        }

        self.render(&mut state);
        debug!("Hobby carousel initialized with {} slides", slides);
        None
    }
}

fn create_dots(document: &mut Document, slides: usize) {
    let Some(container) = document.first_mut(DOTS) else {
        return;
    };
    let dots = (0..slides)
        .map(|index| {
            Node::Element(
                Element::new("button")
                    .with_attr("class", "carousel-dot")
                    .with_attr("data-index", &index.to_string())
                    .with_attr("aria-label", &format!("Gehe zu Hobby {}", index + 1)),
            )
        })
        .collect();
    container.replace_children(dots);
}

/// Circular offset of `index` from `current`, folded into -total/2..=total/2.
fn relative_position(index: usize, current: usize, total: usize) -> i64 {
    let total = total as i64;
    let half = total / 2;
    let mut position = index as i64 - current as i64;
    if position < -half {
        position += total;
    }
    if position > half {
        position -= total;
    }
    position
}

fn apply_positions(document: &mut Document, current: usize, total: usize) {
    let mut index = 0;
    document.for_each_mut(SLIDE, |slide| {
        for class in POSITION_CLASSES {
            slide.remove_class(class);
        }
        let class = match relative_position(index, current, total) {
            0 => "carousel-slide-active",
            -1 => "carousel-slide-prev",
            1 => "carousel-slide-next",
            _ => "carousel-slide-hidden",
        };
        slide.add_class(class);
        index += 1;
    });

    let mut dot = 0;
    document.for_each_mut(DOT, |el| {
        el.toggle_class("active", dot == current);
        dot += 1;
    });
}
