use approx::assert_abs_diff_eq;
use cube_panorama::{
    Angle, Axis, Compositor, Panorama, PanoramaBuilder, PanoramaEvent, ProjectorConfig, Tour,
    Viewport,
};
use glam::DVec2;
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

const TOUR: &str = r#"{
    "options": { "fov_h": 100, "navigation_transition_ms": 500 },
    "scenes": {
        "garden": {
            "sides": { "front": "g/f.jpg", "right": "g/r.jpg", "back": "g/b.jpg",
                       "left": "g/l.jpg", "up": "g/u.jpg", "down": "g/d.jpg" },
            "hotspots": [ { "target": "hall", "pitch": 0, "yaw": 20, "text": "Hall" } ]
        },
        "hall": {
            "default": true,
            "sides": { "front": "h/f.jpg", "right": "h/r.jpg", "back": "h/b.jpg",
                       "left": "h/l.jpg", "up": "h/u.jpg", "down": "h/d.jpg" },
            "hotspots": [
                { "target": "garden", "pitch": -10, "yaw": 0 },
                { "target": "garden", "pitch": 0, "yaw": 180 }
            ]
        }
    }
}"#;

fn recorder(p: &mut Panorama) -> Rc<RefCell<Vec<PanoramaEvent>>> {
    let events = Rc::new(RefCell::new(Vec::new()));
    let sink = events.clone();
    p.subscribe(move |e| sink.borrow_mut().push(e.clone()));
    events
}

fn targets(events: &[PanoramaEvent]) -> Vec<String> {
    events
        .iter()
        .filter_map(|e| match e {
            PanoramaEvent::Navigate { target } => Some(target.clone()),
            _ => None,
        })
        .collect()
}

#[test]
fn walks_from_the_default_scene_and_back() {
    let tour = Tour::from_json(TOUR).unwrap();
    let mut p = Panorama::new(tour.options.clone(), Viewport::new(1200.0, 800.0));
    let events = recorder(&mut p);

    let (id, scene) = tour.default_scene().unwrap();
    assert_eq!(id, "hall");
    p.enter_scene(id, scene);
    assert_abs_diff_eq!(p.fov().horizontal.to_degrees(), 100.0, epsilon = 1e-9);

    // Ahead is visible, behind is culled.
    assert!(p.hotspots()[0].is_visible());
    assert!(!p.hotspots()[1].is_visible());

    // Ten degrees down lands a little under the viewport center.
    let index = p.hotspot_at(DVec2::new(600.0, 489.0)).unwrap();
    assert_eq!(index, 0);
    assert!(p.navigate(index));
    p.advance(Duration::from_millis(500));
    assert_eq!(targets(&events.borrow()), vec!["garden".to_string()]);

    let garden = tour.scene("garden").unwrap();
    p.enter_scene("garden", garden);
    assert_eq!(p.scene(), Some("garden"));
    assert_eq!(p.hotspots().len(), 1);
    assert_eq!(p.hotspots()[0].text(), Some("Hall"));
    assert_eq!(p.orientation().yaw, Angle::ZERO);
}

#[test]
fn scene_change_cancels_a_pending_navigation() {
    let tour = Tour::from_json(TOUR).unwrap();
    let mut p = Panorama::new(tour.options.clone(), Viewport::new(1200.0, 800.0));
    let events = recorder(&mut p);
    p.enter_scene("hall", tour.scene("hall").unwrap());

    p.navigate(1);
    p.enter_scene("garden", tour.scene("garden").unwrap());
    p.advance(Duration::from_secs(2));
    assert!(targets(&events.borrow()).is_empty());
    assert!(!p.has_pending_tasks());
}

#[test]
fn spins_and_zoom_keep_hotspots_in_step() {
    let tour = Tour::from_json(TOUR).unwrap();
    let mut p = Panorama::new(tour.options.clone(), Viewport::new(1200.0, 800.0));
    p.enter_scene("hall", tour.scene("hall").unwrap());

    p.start_rotate(Axis::Yaw, Duration::from_secs(4), false);
    // Half a turn puts the rear hotspot in front.
    p.advance(Duration::from_secs(2));
    p.stop_rotate(Axis::Yaw);
    assert_abs_diff_eq!(p.orientation().yaw.to_degrees(), 180.0, epsilon = 1e-6);
    assert!(p.hotspots()[1].is_visible());
    assert!(!p.hotspots()[0].is_visible());

    let before = p.hotspots()[1].polygon().to_vec();
    p.start_zoom(false);
    p.advance(Duration::from_secs(1));
    p.stop_zoom();
    p.advance(p.options().zoom_settle());
    // A longer perspective spreads the corners further apart.
    let after = p.hotspots()[1].polygon();
    assert!((after[1].x - after[0].x) > (before[1].x - before[0].x));
}

#[test]
fn builder_runs_extensions_with_a_custom_projector() {
    let seen = Rc::new(RefCell::new(None));
    let probe = seen.clone();
    let p = PanoramaBuilder::new(Default::default(), Viewport::new(800.0, 600.0))
        .projector(ProjectorConfig {
            radius: 256.0,
            corner_extent: 10.0,
        })
        .extension(move |p: &mut Panorama| {
            *probe.borrow_mut() = Some(p.fov().perspective);
        })
        .build(Compositor::new(Viewport::new(800.0, 600.0)));
    assert_eq!(*seen.borrow(), Some(p.fov().perspective));
}
