use std::io::{self, BufRead, Write};

use crate::data::names::NameTable;

use super::console::Console;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Selection {
    Hotkey(String),
    Cancelled,
}

/// Numbered hotkey picker. The list is sorted by resolved name (stable, so
/// ties keep encounter order) and re-printed in full on every retry; only a
/// valid row number or "exit" leaves the loop. Input EOF counts as exit.
pub fn select_hotkey<R: BufRead, W: Write>(
    console: &mut Console<R, W>,
    candidates: &[String],
    names: &NameTable,
) -> io::Result<Selection> {
    let mut listed: Vec<(&str, &str)> = candidates
        .iter()
        .map(|h| (h.as_str(), names.display_name(h)))
        .collect();
    listed.sort_by(|a, b| names.sort_name(a.0).cmp(names.sort_name(b.0)));

    loop {
        console.line("Available hotkeys:")?;
        for (idx, (hotkey, name)) in listed.iter().enumerate() {
            console.line(&format!("{}. {} ({})", idx + 1, hotkey, name))?;
        }
        let choice = match console.prompt("Select a hotkey (number) or type 'exit' to quit: ")? {
            Some(line) => line,
            None => return Ok(Selection::Cancelled),
        };
        if choice.eq_ignore_ascii_case("exit") {
            return Ok(Selection::Cancelled);
        }
        match choice.parse::<i64>() {
            Ok(n) if n >= 1 && (n as usize) <= listed.len() => {
                return Ok(Selection::Hotkey(listed[n as usize - 1].0.to_string()));
            }
            Ok(_) => console.line("Invalid selection. Please try again.")?,
            Err(_) => console.line("Invalid input. Please enter a number.")?,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn names(pairs: &[(&str, &str)]) -> NameTable {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn run(input: &str, candidates: &[&str], names: &NameTable) -> (Selection, String) {
        let mut console = Console::new(Cursor::new(input.to_string()), Vec::new());
        let candidates: Vec<String> = candidates.iter().map(|s| s.to_string()).collect();
        let selection = select_hotkey(&mut console, &candidates, names).unwrap();
        (selection, String::from_utf8(console.into_output()).unwrap())
    }

    #[test]
    fn list_is_sorted_by_resolved_name() {
        let names = names(&[("H1", "Zoe"), ("H2", "Alice"), ("H3", "Mallory")]);
        let (selection, output) = run("1\n", &["H1", "H2", "H3"], &names);
        assert_eq!(selection, Selection::Hotkey("H2".to_string()));
        let alice = output.find("H2 (Alice)").unwrap();
        let mallory = output.find("H3 (Mallory)").unwrap();
        let zoe = output.find("H1 (Zoe)").unwrap();
        assert!(alice < mallory && mallory < zoe);
    }

    #[test]
    fn name_ties_keep_encounter_order() {
        let names = names(&[("H1", "Same"), ("H2", "Same")]);
        let (selection, _) = run("1\n", &["H1", "H2"], &names);
        assert_eq!(selection, Selection::Hotkey("H1".to_string()));
        let (selection, _) = run("2\n", &["H2", "H1"], &names);
        assert_eq!(selection, Selection::Hotkey("H1".to_string()));
    }

    #[test]
    fn exit_cancels_in_any_case() {
        let names = names(&[("H1", "Alice")]);
        for word in ["exit", "EXIT", "Exit"] {
            let (selection, _) = run(&format!("{}\n", word), &["H1"], &names);
            assert_eq!(selection, Selection::Cancelled);
        }
    }

    #[test]
    fn invalid_input_reprints_list_and_retries() {
        let names = names(&[("H1", "Alice"), ("H2", "Bob")]);
        let (selection, output) = run("7\nnope\n2\n", &["H1", "H2"], &names);
        assert_eq!(selection, Selection::Hotkey("H2".to_string()));
        assert_eq!(output.matches("Available hotkeys:").count(), 3);
        assert!(output.contains("Invalid selection. Please try again."));
        assert!(output.contains("Invalid input. Please enter a number."));
    }

    #[test]
    fn eof_is_treated_as_cancel() {
        let names = names(&[("H1", "Alice")]);
        let (selection, _) = run("", &["H1"], &names);
        assert_eq!(selection, Selection::Cancelled);
    }
}
