// compositor.rs: deterministic software rendering surface
//
// Keeps the resting transform, transition and animation playback of each
// element on an explicit clock, so live values can be sampled at any time.

use crate::fov::Viewport;
use crate::surface::{
    AnimationRegistry, ElementId, ElementTransform, KeyframeRule, RenderSurface, Repeat, RuleName,
};
use glam::{DMat4, DVec2, DVec4};
use std::collections::HashMap;
use std::time::Duration;

#[derive(Debug, Clone)]
struct Transition {
    from: ElementTransform,
    started: Duration,
    duration: Duration,
}

#[derive(Debug, Clone)]
struct Playback {
    rule: RuleName,
    period: Duration,
    repeat: Repeat,
    started: Duration,
    paused_at: Option<Duration>,
}

#[derive(Debug, Clone)]
struct Track {
    resting: ElementTransform,
    transition: Option<Transition>,
    playback: Option<Playback>,
}

impl Track {
    fn new(resting: ElementTransform) -> Self {
        Self {
            resting,
            transition: None,
            playback: None,
        }
    }
}

pub struct Compositor {
    now: Duration,
    viewport: Viewport,
    stage: Track,
    cube: Track,
    rules: HashMap<RuleName, KeyframeRule>,
    next_rule: u64,
}

impl Compositor {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            now: Duration::ZERO,
            viewport,
            stage: Track::new(ElementTransform::stage(1.0, Default::default())),
            cube: Track::new(ElementTransform::cube(Default::default())),
            rules: HashMap::new(),
            next_rule: 0,
        }
    }

    pub fn now(&self) -> Duration {
        self.now
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    pub fn has_rule(&self, name: &RuleName) -> bool {
        self.rules.contains_key(name)
    }

    pub fn is_animating(&self, element: ElementId) -> bool {
        self.track(element).playback.is_some()
    }

    fn track(&self, element: ElementId) -> &Track {
        match element {
            ElementId::Stage => &self.stage,
            ElementId::Cube => &self.cube,
        }
    }

    fn track_mut(&mut self, element: ElementId) -> &mut Track {
        match element {
            ElementId::Stage => &mut self.stage,
            ElementId::Cube => &mut self.cube,
        }
    }

    fn sample(&self, track: &Track) -> ElementTransform {
        if let Some(playback) = &track.playback {
            if let Some(rule) = self.rules.get(&playback.rule) {
                let at = playback.paused_at.unwrap_or(self.now);
                let phase = phase(at.saturating_sub(playback.started), playback.period, playback.repeat);
                return rule.from.lerp(&rule.to, phase);
            }
        }
        if let Some(transition) = &track.transition {
            let elapsed = self.now.saturating_sub(transition.started);
            let t = if transition.duration.is_zero() {
                1.0
            } else {
                (elapsed.as_secs_f64() / transition.duration.as_secs_f64()).min(1.0)
            };
            return transition.from.lerp(&track.resting, t);
        }
        track.resting
    }
}

/// Animation progress in `[0, 1]`. A zero period never advances a repeating
/// animation and completes a one-shot immediately.
fn phase(elapsed: Duration, period: Duration, repeat: Repeat) -> f64 {
    if period.is_zero() {
        return match repeat {
            Repeat::Once => 1.0,
            Repeat::Infinite => 0.0,
        };
    }
    let cycles = elapsed.as_secs_f64() / period.as_secs_f64();
    match repeat {
        Repeat::Once => cycles.min(1.0),
        Repeat::Infinite => cycles.fract(),
    }
}

impl RenderSurface for Compositor {
    fn resize(&mut self, width: f64, height: f64) {
        self.viewport = Viewport::new(width, height);
    }

    fn apply(&mut self, element: ElementId, transform: ElementTransform, transition: Duration) {
        let from = self.sample(self.track(element));
        let now = self.now;
        let track = self.track_mut(element);
        track.resting = transform;
        track.transition = (!transition.is_zero()).then(|| Transition {
            from,
            started: now,
            duration: transition,
        });
    }

    fn live_transform(&self, element: ElementId) -> ElementTransform {
        self.sample(self.track(element))
    }

    fn locate(&self, local: DMat4) -> Option<DVec2> {
        let stage = self.live_transform(ElementId::Stage);
        let cube = self.live_transform(ElementId::Cube);
        let p = stage.rotation() * cube.rotation() * local * DVec4::new(0.0, 0.0, 0.0, 1.0);
        // Camera sits at the cube center looking down -z, y pointing down.
        let depth = -p.z;
        if !(depth > 0.0) {
            return None;
        }
        let perspective = stage.perspective.unwrap_or(stage.translate_z);
        let (cx, cy) = self.viewport.center();
        let scale = perspective / depth;
        Some(DVec2::new(cx + p.x * scale, cy + p.y * scale))
    }

    fn advance(&mut self, dt: Duration) -> Vec<ElementId> {
        self.now += dt;
        let now = self.now;
        let mut ended = Vec::new();
        for element in [ElementId::Stage, ElementId::Cube] {
            let track = self.track_mut(element);
            let done = track
                .transition
                .as_ref()
                .is_some_and(|t| now >= t.started + t.duration);
            if done {
                track.transition = None;
                ended.push(element);
            }
        }
        ended
    }
}

impl AnimationRegistry for Compositor {
    fn register(&mut self, rule: KeyframeRule) -> RuleName {
        self.next_rule += 1;
        let name = RuleName(format!("{}-{}", rule.prefix, self.next_rule));
        log::debug!("keyframes {name}: {} -> {}", rule.from, rule.to);
        self.rules.insert(name.clone(), rule);
        name
    }

    fn remove(&mut self, name: &RuleName) -> bool {
        self.rules.remove(name).is_some()
    }

    fn play(&mut self, element: ElementId, rule: &RuleName, period: Duration, repeat: Repeat) {
        let now = self.now;
        self.track_mut(element).playback = Some(Playback {
            rule: rule.clone(),
            period,
            repeat,
            started: now,
            paused_at: None,
        });
    }

    fn pause(&mut self, element: ElementId) {
        let now = self.now;
        if let Some(playback) = &mut self.track_mut(element).playback {
            playback.paused_at.get_or_insert(now);
        }
    }

    fn stop(&mut self, element: ElementId) {
        let track = self.track_mut(element);
        track.playback = None;
        // The resting transform shows immediately, like clearing a CSS animation.
        track.transition = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::angle::Angle;
    use approx::assert_abs_diff_eq;

    fn compositor() -> Compositor {
        Compositor::new(Viewport::new(800.0, 600.0))
    }

    fn spin(c: &mut Compositor, from: f64, to: f64) -> RuleName {
        c.register(KeyframeRule {
            prefix: "spin".into(),
            from: ElementTransform::cube(Angle::from_degrees(from)),
            to: ElementTransform::cube(Angle::from_degrees(to)),
        })
    }

    #[test]
    fn transition_interpolates_then_reports_end() {
        let mut c = compositor();
        c.apply(ElementId::Cube, ElementTransform::cube(Angle::from_degrees(90.0)), Duration::from_millis(100));
        assert!(c.advance(Duration::from_millis(50)).is_empty());
        assert_abs_diff_eq!(c.live_transform(ElementId::Cube).rotate_y, 45.0, epsilon = 1e-9);
        assert_eq!(c.advance(Duration::from_millis(50)), vec![ElementId::Cube]);
        assert_eq!(c.live_transform(ElementId::Cube).rotate_y, 90.0);
        assert!(c.advance(Duration::from_millis(50)).is_empty());
    }

    #[test]
    fn instant_apply_has_no_transition_end() {
        let mut c = compositor();
        c.apply(ElementId::Stage, ElementTransform::stage(500.0, Angle::from_degrees(10.0)), Duration::ZERO);
        assert_eq!(c.live_transform(ElementId::Stage).rotate_x, 10.0);
        assert!(c.advance(Duration::from_secs(1)).is_empty());
    }

    #[test]
    fn infinite_animation_wraps_and_overrides_resting() {
        let mut c = compositor();
        let rule = spin(&mut c, 0.0, 360.0);
        c.play(ElementId::Cube, &rule, Duration::from_secs(4), Repeat::Infinite);
        c.advance(Duration::from_secs(5));
        assert_abs_diff_eq!(c.live_transform(ElementId::Cube).rotate_y, 90.0, epsilon = 1e-9);
    }

    #[test]
    fn pause_freezes_and_stop_restores_resting() {
        let mut c = compositor();
        let rule = spin(&mut c, 0.0, 100.0);
        c.play(ElementId::Cube, &rule, Duration::from_secs(10), Repeat::Once);
        c.advance(Duration::from_secs(3));
        c.pause(ElementId::Cube);
        c.advance(Duration::from_secs(3));
        assert_abs_diff_eq!(c.live_transform(ElementId::Cube).rotate_y, 30.0, epsilon = 1e-9);
        c.stop(ElementId::Cube);
        assert_eq!(c.live_transform(ElementId::Cube).rotate_y, 0.0);
        assert!(c.remove(&rule));
        assert!(!c.remove(&rule));
    }

    #[test]
    fn one_shot_holds_last_frame() {
        let mut c = compositor();
        let rule = spin(&mut c, 0.0, 50.0);
        c.play(ElementId::Cube, &rule, Duration::from_secs(1), Repeat::Once);
        c.advance(Duration::from_secs(7));
        assert_eq!(c.live_transform(ElementId::Cube).rotate_y, 50.0);
    }

    #[test]
    fn rule_names_are_unique() {
        let mut c = compositor();
        let a = spin(&mut c, 0.0, 1.0);
        let b = spin(&mut c, 0.0, 1.0);
        assert_ne!(a, b);
        assert_eq!(c.rule_count(), 2);
    }

    #[test]
    fn locate_centers_the_forward_marker() {
        let mut c = compositor();
        c.apply(ElementId::Stage, ElementTransform::stage(400.0, Angle::ZERO), Duration::ZERO);
        let ahead = DMat4::from_translation(glam::DVec3::new(0.0, 0.0, -512.0));
        let p = c.locate(ahead).unwrap();
        assert_abs_diff_eq!(p.x, 400.0, epsilon = 1e-9);
        assert_abs_diff_eq!(p.y, 300.0, epsilon = 1e-9);

        let behind = DMat4::from_translation(glam::DVec3::new(0.0, 0.0, 512.0));
        assert!(c.locate(behind).is_none());
    }
}
