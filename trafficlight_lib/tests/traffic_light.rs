extern crate trafficlight_lib;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use trafficlight_lib::config::LightConfig;
use trafficlight_lib::core::Phase;
use trafficlight_lib::error::LightError;
use trafficlight_lib::light::TrafficLight;

// generous bound for scheduler delays on busy machines
const SLACK: Duration = Duration::from_millis(100);

fn config(min_ms: u64, max_ms: u64, step_ms: u64) -> LightConfig {
    LightConfig::builder()
        .cycle_range(Duration::from_millis(min_ms), Duration::from_millis(max_ms))
        .cycle_step(Duration::from_millis(step_ms))
        .seed(2024)
        .build()
        .unwrap()
}

#[test]
fn test_phases_alternate_from_red() {
    let mut light = TrafficLight::with_config(config(15, 15, 15));
    assert_eq!(light.current_phase(), Phase::Red);
    light.start().unwrap();
    let mut expected = Phase::Red;
    for _ in 0..8 {
        expected = expected.toggled();
        assert_eq!(light.next_transition().unwrap(), expected);
    }
    light.stop();
}

#[test]
fn test_fixed_cycle_timing() {
    let cycle = Duration::from_millis(40);
    let mut light = TrafficLight::with_config(config(40, 40, 40));
    let start = Instant::now();
    light.start().unwrap();
    let n = 5;
    for _ in 0..n {
        light.next_transition().unwrap();
    }
    let elapsed = start.elapsed();
    assert!(elapsed >= cycle * n, "{:?} too short", elapsed);
    assert!(elapsed <= (cycle + SLACK) * n, "{:?} too long", elapsed);
    light.stop();
}

#[test]
fn test_random_cycles_stay_in_range() {
    let mut light = TrafficLight::with_config(config(20, 40, 10));
    let start = Instant::now();
    light.start().unwrap();
    let mut last = start;
    let n = 10;
    for _ in 0..n {
        light.next_transition().unwrap();
        let now = Instant::now();
        assert!(now - last <= Duration::from_millis(40) + SLACK, "gap {:?}", now - last);
        last = now;
    }
    // a late wake-up can shorten a single gap, but never the total
    assert!(last - start >= Duration::from_millis(20) * n);
    light.stop();
}

#[test]
fn test_wait_for_green_after_start() {
    let mut light = TrafficLight::with_config(config(200, 200, 200));
    light.start().unwrap();
    light.wait_for_green().unwrap();
    assert_eq!(light.current_phase(), Phase::Green);
    light.wait_for(Phase::Red).unwrap();
    assert_eq!(light.current_phase(), Phase::Red);
    light.stop();
}

#[test]
fn test_monitor_follows_light() {
    let mut light = TrafficLight::with_config(config(30, 50, 10));
    let monitor = light.monitor();
    let running = Arc::new(AtomicBool::new(true));
    let observer = {
        let running = running.clone();
        thread::spawn(move || {
            let mut seen_green = false;
            while running.load(Ordering::Acquire) {
                seen_green |= monitor.phase().is_green();
                thread::sleep(Duration::from_millis(1));
            }
            seen_green
        })
    };
    light.start().unwrap();
    light.wait_for_green().unwrap();
    light.wait_for(Phase::Red).unwrap();
    light.wait_for_green().unwrap();
    thread::sleep(Duration::from_millis(5));
    running.store(false, Ordering::Release);
    assert!(observer.join().unwrap());
    light.stop();
}

#[test]
fn test_stop_from_another_thread() {
    let mut light = TrafficLight::with_config(config(60_000, 60_000, 1_000));
    light.start().unwrap();
    let stop = light.stop_handle();
    let waiter = thread::spawn(move || {
        let result = light.wait_for_green();
        (result, light.current_phase())
    });
    thread::sleep(Duration::from_millis(50));
    stop.stop();
    let (result, phase) = waiter.join().unwrap();
    assert!(matches!(result, Err(LightError::Stopped)));
    assert_eq!(phase, Phase::Red);
}
