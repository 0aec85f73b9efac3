//! Skills radar chart, drawn as inline SVG.

use std::fmt::Write as _;
use std::sync::Arc;

use futures::future::BoxFuture;
use tracing::debug;

use super::{Trigger, Widget};
use crate::browser::SharedContext;
use crate::events::{Signal, SignalKind};
use crate::i18n::{Language, LanguageView};

const CHART_ID: &str = "skillsRadarChart";

const SKILLS: [&str; 8] = [
    "HTML & CSS",
    "JavaScript",
    "Python",
    "SQL",
    "Git & GitHub",
    "UI/UX Design",
    "REST APIs",
    "Figma",
];

/// Proficiency (0-100) per skill, in `SKILLS` order.
pub const PROFICIENCY_LEVELS: [u8; 8] = [85, 75, 70, 65, 80, 75, 70, 70];

const SIZE: f64 = 400.0;
const RADIUS: f64 = 140.0;
const RING_STEP: u8 = 20;

pub struct SkillsChart {
    context: SharedContext,
    language: LanguageView,
}

impl SkillsChart {
    pub fn new(context: SharedContext, language: LanguageView) -> Self {
        Self { context, language }
    }
}

impl Widget for SkillsChart {
    fn name(&self) -> &'static str {
        "skills-chart"
    }

    fn subscriptions(&self) -> &'static [SignalKind] {
        &[SignalKind::PageContentLoaded, SignalKind::LanguageChanged]
    }

    fn refresh(self: Arc<Self>, trigger: Trigger<'_>) -> Option<BoxFuture<'static, ()>> {
        let language = match trigger {
            Trigger::Signal(Signal::LanguageChanged { language, .. }) => *language,
            // Until the first dictionary is applied, languageChanged draws it.
            _ if !self.language.is_ready() => return None,
            _ => self.language.current(),
        };

        self.context.with_document(|doc| {
            if let Some(chart) = doc.get_element_by_id_mut(CHART_ID) {
                chart.set_inner_html(&render_svg(language));
                debug!("Skills radar chart drawn ({})", language);
            }
        });
        None
    }
}

fn dataset_label(language: Language) -> &'static str {
    if language == Language::ENGLISH {
        "Proficiency Level"
    } else {
        "Kompetenzniveau"
    }
}

/// Point at `value` percent along the axis of skill `index`.
fn point(index: usize, value: f64) -> (f64, f64) {
    let angle = (index as f64 / SKILLS.len() as f64) * std::f64::consts::TAU - std::f64::consts::FRAC_PI_2;
    let r = RADIUS * value / 100.0;
    let center = SIZE / 2.0;
    (center + r * angle.cos(), center + r * angle.sin())
}

fn polygon(values: impl Iterator<Item = f64>) -> String {
    values
        .enumerate()
        .map(|(i, v)| {
            let (x, y) = point(i, v);
            format!("{x:.1},{y:.1}")
        })
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn render_svg(language: Language) -> String {
    let label = dataset_label(language);
    let mut svg = format!(
        r#"<svg class="skills-radar" viewBox="0 0 {SIZE} {SIZE}" role="img" aria-label="{label}">"#
    );

    for ring in (RING_STEP..=100).step_by(RING_STEP as usize) {
        let points = polygon(std::iter::repeat(f64::from(ring)).take(SKILLS.len()));
        let _ = write!(svg, r#"<polygon class="radar-grid" points="{points}"/>"#);
    }

    for (i, skill) in SKILLS.iter().enumerate() {
        let (x, y) = point(i, 100.0);
        let (lx, ly) = point(i, 115.0);
        let center = SIZE / 2.0;
        let _ = write!(
            svg,
            r#"<line class="radar-axis" x1="{center:.1}" y1="{center:.1}" x2="{x:.1}" y2="{y:.1}"/>"#
        );
        let skill = skill.replace('&', "&amp;");
        let _ = write!(
            svg,
            r#"<text class="radar-label" x="{lx:.1}" y="{ly:.1}" text-anchor="middle">{skill}</text>"#
        );
    }

    let data = polygon(PROFICIENCY_LEVELS.iter().map(|&v| f64::from(v)));
    let _ = write!(svg, r#"<polygon class="radar-data" points="{data}"><title>{label}</title></polygon>"#);
    for (i, level) in PROFICIENCY_LEVELS.iter().enumerate() {
        let (x, y) = point(i, f64::from(*level));
        let _ = write!(
            svg,
            r#"<circle class="radar-point" cx="{x:.1}" cy="{y:.1}" r="5"><title>{label}: {level}%</title></circle>"#
        );
    }
    let _ = write!(
        svg,
        r#"<text class="radar-legend" x="{:.1}" y="{:.1}" text-anchor="middle">{label}</text></svg>"#,
        SIZE / 2.0,
        SIZE - 6.0
    );
    svg
}
