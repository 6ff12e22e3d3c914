// ABOUTME: Syntax-highlighting stylesheet generation via pygmentize
// ABOUTME: Degrades to no highlighting when the tool is missing or fails

use log::{info, warn};
use std::process::Command;

/// Stylesheet for the named Pygments style, or `None` when highlighting is
/// disabled (empty style) or the highlighter cannot be run.
pub fn pygments_css(command: &str, style: &str) -> Option<String> {
    if style.is_empty() {
        return None;
    }

    let program = match which::which(command) {
        Ok(program) => program,
        Err(_) => {
            warn!(
                "`{}` is not installed, code will not be highlighted. Install Pygments with `pip install pygments`",
                command
            );
            return None;
        }
    };

    info!("Generating {} highlighting stylesheet", style);
    let output = Command::new(&program)
        .args(["-S", style, "-f", "html", "-O", "bg=light"])
        .output();

    match output {
        Ok(output) if output.status.success() => {
            Some(String::from_utf8_lossy(&output.stdout).into_owned())
        }
        Ok(output) => {
            warn!(
                "`{}` failed for style {}: {}",
                command,
                style,
                String::from_utf8_lossy(&output.stderr).trim()
            );
            None
        }
        Err(e) => {
            warn!("Could not run `{}`: {}", command, e);
            None
        }
    }
}
