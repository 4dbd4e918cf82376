//! Listen to the global pointer stream and swallow right clicks.
//!
//! Run with: RUST_LOG=debug cargo run --example listen
//!
//! Note: On macOS, you need to grant Accessibility permissions to the terminal.

use inputkit::{ClickButton, Handlers, Listener};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

fn main() -> inputkit::Result<()> {
    env_logger::init();

    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();

    // Handle Ctrl+C
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
        println!("\nStopping...");
    })
    .expect("Error setting Ctrl-C handler");

    println!("inputkit listen example");
    println!("Right clicks are blocked. Press Ctrl+C to exit\n");

    let handlers = Handlers::new()
        .on_move(|position| println!("Mouse moved to ({:.0}, {:.0})", position.x, position.y))
        .on_click(|position, button, pressed| {
            let action = if pressed { "pressed" } else { "released" };
            println!(
                "Mouse {action}: {button} at ({:.0}, {:.0})",
                position.x, position.y
            );
            button != ClickButton::Right
        })
        .on_scroll(|_, dx, dy| println!("Wheel: dx={dx} dy={dy}"))
        .on_error(|failure| eprintln!("Handler error: {failure}"));

    let listener = Listener::system(handlers)?;
    listener.start()?;

    while running.load(Ordering::SeqCst) {
        std::thread::sleep(Duration::from_millis(100));
    }

    listener.stop()
}
