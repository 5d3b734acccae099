//! # Notify — Audible Completion Alert
//!
//! Plays a short beep when a prime is found. macOS gets a real system beep
//! via AppleScript; everywhere else the terminal BEL character is emitted.
//! Best-effort only: a failed beep never affects the run.

use std::io::Write;

pub fn beep() {
    #[cfg(target_os = "macos")]
    {
        let played = std::process::Command::new("osascript")
            .args(["-e", "beep"])
            .status()
            .map(|s| s.success())
            .unwrap_or(false);
        if !played {
            bel();
        }
    }
    #[cfg(not(target_os = "macos"))]
    bel();
}

fn bel() {
    print!("\x07");
    let _ = std::io::stdout().flush();
}
