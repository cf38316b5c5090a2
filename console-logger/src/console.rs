use nu_ansi_term::Color::{Cyan, Green, Red, Yellow};

/// Print a progress line on the console.
pub fn info(message: &str) {
    println!("{}", Cyan.paint(message));
}

/// Print a completed step on the console.
pub fn success(message: &str) {
    println!("{}", Green.bold().paint(message));
}

/// Print a warning, followed by the data it refers to, on the console.
pub fn warn(message: &str, data: &str) {
    if data.is_empty() {
        println!("{}", Yellow.bold().paint(message));
        return;
    }
    println!(
        "{} \n {} ",
        Yellow.bold().paint(message),
        Red.italic().paint(data)
    );
}

/// Print a fatal error on the standard error stream.
pub fn error(message: &str, data: &str) {
    eprintln!(
        "{} \n {} ",
        Red.bold().paint(message),
        Red.italic().paint(data)
    );
}
