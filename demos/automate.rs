//! Keyboard and mouse injection example.
//!
//! Run with: cargo run --example automate
//!
//! WARNING: This will actually move your mouse and type keys!

use inputkit::{Button, KeyboardController, MouseController, NamedKey};
use std::thread::sleep;
use std::time::Duration;

fn main() -> inputkit::Result<()> {
    env_logger::init();

    println!("inputkit automation example");
    println!("===========================\n");
    println!("WARNING: This will move your mouse and simulate key presses!\n");
    println!("Starting in 3 seconds... (Press Ctrl+C to cancel)\n");

    sleep(Duration::from_secs(3));

    let mouse = MouseController::system()?;
    let keyboard = KeyboardController::system()?;

    let start = mouse.position()?;
    println!("1. Cursor is at ({:.0}, {:.0})", start.x, start.y);

    println!("2. Moving right by 200 in small steps...");
    mouse.move_by_with(200.0, 0.0, 20, Duration::from_millis(10))?;
    sleep(Duration::from_millis(500));

    println!("3. Double clicking...");
    mouse.click(Button::Left, 2)?;
    sleep(Duration::from_millis(500));

    println!("4. Dragging back to the start...");
    mouse.drag(-200.0, 0.0, Button::Left)?;
    sleep(Duration::from_millis(500));

    println!("5. Scrolling down...");
    mouse.scroll(0, -3)?;
    sleep(Duration::from_millis(500));

    println!("6. Typing text...");
    keyboard.type_text("Hello from inputkit! (1 + 1 = 2)")?;
    keyboard.tap(NamedKey::Return)?;

    println!("\nAutomation complete!");
    Ok(())
}
