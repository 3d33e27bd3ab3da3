use std::thread;

use pretty_assertions::assert_eq;

use super::*;

#[test]
fn buffer_captures_lines_and_fragments() {
    let output = OutputHandler::buffer();
    output.print("[ok]");
    output.print(" ");
    output.println("suite");
    assert_eq!(output.get_output(), "[ok] suite\n");
}

#[test]
fn clear_empties_the_buffer() {
    let output = OutputHandler::buffer();
    output.println("a");
    output.clear();
    assert_eq!(output.get_output(), "");
}

#[test]
fn silent_and_stdout_capture_nothing() {
    let silent = OutputHandler::silent();
    silent.println("hidden");
    assert_eq!(silent.get_output(), "");
    assert_eq!(OutputHandler::stdout().get_output(), "");
}

#[test]
fn buffer_is_shared_between_threads() {
    let output = OutputHandler::buffer();
    let other = Arc::clone(&output);
    let writer = thread::spawn(move || {
        for _ in 0..50 {
            other.println("a");
        }
    });
    for _ in 0..50 {
        output.println("b");
    }
    writer.join().unwrap();
    assert_eq!(output.get_output().lines().count(), 100);
}
