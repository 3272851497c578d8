use std::sync::mpsc;
use std::time::Duration;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use whirl::{
    app::App,
    clock::ManualClock,
    options::OptionStore,
    runtime::{ChannelEventSource, DeadlineWake, Runner, SpinEvent},
    spinner::{Phase, SpinScheduler},
};

fn key_event(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
}

fn key(code: KeyCode) -> SpinEvent {
    SpinEvent::Key(key_event(code))
}

// Headless integration using the internal runtime + App without a TTY.
// Each tick jumps the manual clock to the spin's next deadline.
#[test]
fn headless_spin_flow_completes() {
    let clock = ManualClock::new(0);
    let mut app = App::new(OptionStore::new(), SpinScheduler::with_seed(21), &clock);

    let (tx, rx) = mpsc::channel();
    for label in ["Sushi", "Pizza", "Tacos"] {
        for c in label.chars() {
            tx.send(key(KeyCode::Char(c))).unwrap();
        }
        tx.send(key(KeyCode::Enter)).unwrap();
    }
    // empty input + enter spins
    tx.send(key(KeyCode::Enter)).unwrap();

    let mut runner = Runner::new(
        ChannelEventSource::new(rx),
        DeadlineWake::new(Duration::from_millis(1)),
    );

    let mut finished = None;
    let mut saw_running = false;
    let mut ticks = 0u32;
    for _ in 0..1_000u32 {
        match runner.step(app.next_due_in()).unwrap() {
            SpinEvent::Tick => {
                ticks += 1;
                let wait = app.next_due_in().map_or(15, |d| d.as_millis() as u64);
                clock.advance(wait);
                if let Some(choice) = app.on_tick() {
                    finished = Some(choice);
                    break;
                }
            }
            SpinEvent::Resize => {}
            SpinEvent::Key(key) => app.handle_key(key),
        }
        saw_running |= app.spinner.phase() == Phase::Running;
    }

    assert!(saw_running, "spin should have started");
    // one wake-up per timer, not one per frame
    assert!(ticks < 60, "woke {} times", ticks);
    let choice = finished.expect("spin should have finished");
    assert!(["Sushi", "Pizza", "Tacos"].contains(&choice.as_str()));
    assert_eq!(app.spinner.phase(), Phase::Idle);
    assert_eq!(app.spinner.final_selection(), Some(choice.as_str()));
    assert!(!app.store.is_frozen());
}

#[test]
fn headless_add_during_spin_is_rejected() {
    let clock = ManualClock::new(0);
    let mut app = App::new(
        OptionStore::from_labels(["Sushi", "Pizza"]),
        SpinScheduler::with_seed(5),
        &clock,
    );

    app.handle_key(key_event(KeyCode::Tab));
    assert!(app.spinner.is_spinning());

    for c in "Ramen".chars() {
        app.handle_key(key_event(KeyCode::Char(c)));
    }
    app.handle_key(key_event(KeyCode::Enter));
    app.handle_key(key_event(KeyCode::Delete));
    assert_eq!(app.store.count(), 2);

    clock.advance(3_200);
    assert!(app.on_tick().is_some());

    // The typed text survived the rejection and can be added now.
    app.handle_key(key_event(KeyCode::Enter));
    assert_eq!(app.store.label_at(2), Some("Ramen"));
}

#[test]
fn headless_quit_mid_spin_tears_down() {
    let clock = ManualClock::new(0);
    let mut app = App::new(
        OptionStore::from_labels(["a", "b", "c"]),
        SpinScheduler::with_seed(8),
        &clock,
    );
    app.spin();
    clock.advance(1_000);
    app.on_tick();

    app.handle_key(key_event(KeyCode::Esc));
    assert!(app.should_quit);
    app.shutdown();

    assert_eq!(app.spinner.pending_timers(), 0);
    clock.advance(5_000);
    assert_eq!(app.on_tick(), None);
    assert_eq!(app.spinner.final_selection(), None);
}
