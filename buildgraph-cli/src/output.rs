// Output formatting helpers for CLI commands

/// Print a status message: "  Status message"
pub fn status(action: &str, message: &str) {
    eprintln!("\x1b[1;36m{:>12}\x1b[0m {}", action, message);
}

/// Print a warning message
pub fn warning(message: &str) {
    eprintln!("\x1b[33m  !\x1b[0m {}", message);
}

/// Print a pipeline header
pub fn pipeline_header(root: &str, rows: usize, columns: usize) {
    println!("\x1b[1m==> {}\x1b[0m ({} stages, {} lanes)", root, columns, rows);
}

/// Print a dim/muted message
pub fn dim(message: &str) {
    println!("\x1b[2m{}\x1b[0m", message);
}
